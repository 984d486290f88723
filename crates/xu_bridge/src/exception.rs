//! Host exception objects as seen by the bridge.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::errors::HandleError;
use crate::mapping::ErrorKind;
use crate::registry::{SharedObject, downcast};

/// One entry of an exception's call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl Frame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}", self.file, self.line, self.function)
    }
}

#[derive(Clone)]
pub(crate) struct ExceptionData {
    kind: ErrorKind,
    message: String,
    cause: Option<Exception>,
    context: Option<Exception>,
    traceback: Vec<Frame>,
}

/// A shared exception object.
///
/// Clones refer to the same object; [`Exception::ptr_eq`] is identity. The
/// `with_*` builders are meant for exceptions under construction: on an
/// exception that is already shared they produce a new object.
#[derive(Clone)]
pub struct Exception(Arc<ExceptionData>);

impl Exception {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self(Arc::new(ExceptionData {
            kind,
            message: message.into(),
            cause: None,
            context: None,
            traceback: Vec::new(),
        }))
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn cause(&self) -> Option<&Exception> {
        self.0.cause.as_ref()
    }

    pub fn context(&self) -> Option<&Exception> {
        self.0.context.as_ref()
    }

    pub fn traceback(&self) -> &[Frame] {
        &self.0.traceback
    }

    pub fn with_cause(mut self, cause: Exception) -> Self {
        Arc::make_mut(&mut self.0).cause = Some(cause);
        self
    }

    pub fn with_context(mut self, context: Exception) -> Self {
        Arc::make_mut(&mut self.0).context = Some(context);
        self
    }

    /// Raised from `cause`: sets both cause and context.
    pub fn caused_by(self, cause: Exception) -> Self {
        self.with_cause(cause.clone()).with_context(cause)
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        Arc::make_mut(&mut self.0).traceback.push(frame);
        self
    }

    #[inline]
    pub fn ptr_eq(a: &Exception, b: &Exception) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// This exception followed by each cause (or, lacking one, context).
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    pub(crate) fn into_object(self) -> SharedObject {
        self.0
    }

    pub(crate) fn from_object(object: SharedObject) -> Result<Exception, HandleError> {
        downcast::<ExceptionData>(object)
            .map(Exception)
            .map_err(|_| HandleError::TypeMismatch {
                expected: "Exception",
            })
    }
}

// Chains can be arbitrarily deep: unlink them with a work list so dropping
// the outermost link does not recurse once per link.
impl Drop for ExceptionData {
    fn drop(&mut self) {
        if self.cause.is_none() && self.context.is_none() {
            return;
        }
        let mut pending: Vec<Exception> = Vec::new();
        pending.extend(self.cause.take());
        pending.extend(self.context.take());
        while let Some(Exception(data)) = pending.pop() {
            // Shared links are only released here, not unlinked.
            if let Ok(mut data) = Arc::try_unwrap(data) {
                pending.extend(data.cause.take());
                pending.extend(data.context.take());
            }
        }
    }
}

pub struct Chain<'a> {
    next: Option<&'a Exception>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Exception;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause().or_else(|| current.context());
        Some(current)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            f.write_str(self.kind().name())
        } else {
            write!(f, "{}: {}", self.kind().name(), self.message())
        }
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Exception");
        s.field("kind", &self.kind()).field("message", &self.message());
        if !self.traceback().is_empty() {
            s.field("traceback", &self.traceback());
        }
        let links: Vec<String> = self.chain().skip(1).map(Exception::to_string).collect();
        if !links.is_empty() {
            s.field("chain", &links);
        }
        s.finish()
    }
}

impl Error for Exception {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause()
            .or_else(|| self.context())
            .map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        assert_eq!(Exception::new(ErrorKind::Type, "bad").to_string(), "TypeError: bad");
        assert_eq!(Exception::new(ErrorKind::Value, "").to_string(), "ValueError");
    }

    #[test]
    fn caused_by_sets_cause_and_context() {
        let inner = Exception::new(ErrorKind::Value, "inner");
        let outer = Exception::new(ErrorKind::Type, "outer").caused_by(inner.clone());
        assert!(Exception::ptr_eq(outer.cause().unwrap(), &inner));
        assert!(Exception::ptr_eq(outer.context().unwrap(), &inner));
        assert!(Exception::ptr_eq(
            outer.source().unwrap().downcast_ref::<Exception>().unwrap(),
            &inner
        ));
        assert_eq!(outer.depth(), 2);
    }

    #[test]
    fn chain_falls_back_to_context() {
        let a = Exception::new(ErrorKind::Value, "a");
        let b = Exception::new(ErrorKind::Generic, "b").with_context(a.clone());
        let kinds: Vec<_> = b.chain().map(Exception::kind).collect();
        assert_eq!(kinds, [ErrorKind::Generic, ErrorKind::Value]);
    }

    #[test]
    fn object_round_trip_keeps_identity() {
        let e = Exception::new(ErrorKind::Assertion, "x").with_frame(Frame::new("main", "a.xu", 3));
        let back = Exception::from_object(e.clone().into_object()).unwrap();
        assert!(Exception::ptr_eq(&e, &back));
        assert_eq!(back.traceback()[0].to_string(), "a.xu:3 in main");
    }

    #[test]
    fn deep_chain_drops_iteratively() {
        let mut e = Exception::new(ErrorKind::Value, "root");
        for _ in 0..100_000 {
            e = Exception::new(ErrorKind::Type, "hop").caused_by(e);
        }
        assert_eq!(e.depth(), 100_001);
        drop(e);
    }

    #[test]
    fn dropping_outer_keeps_shared_inner() {
        let inner = Exception::new(ErrorKind::Value, "inner")
            .caused_by(Exception::new(ErrorKind::Generic, "root"));
        let outer = Exception::new(ErrorKind::Type, "outer").caused_by(inner.clone());
        drop(outer);
        assert_eq!(inner.depth(), 2);
        assert_eq!(inner.cause().unwrap().message(), "root");
    }

    #[test]
    fn debug_lists_the_chain() {
        let e = Exception::new(ErrorKind::Type, "outer")
            .caused_by(Exception::new(ErrorKind::Value, "inner"));
        let text = format!("{e:?}");
        assert!(text.contains("chain: [\"ValueError: inner\"]"), "{text}");
    }

    #[test]
    fn foreign_object_is_rejected() {
        let obj: SharedObject = Arc::new(42u8);
        assert_eq!(
            Exception::from_object(obj).unwrap_err(),
            HandleError::TypeMismatch { expected: "Exception" }
        );
    }
}
