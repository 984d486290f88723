//! Explicit construction of "raised from" chains.

use smallvec::SmallVec;

use crate::exception::Exception;
use crate::mapping::ErrorKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub kind: ErrorKind,
    pub message: String,
    /// Index of the link this one was raised from.
    pub cause: Option<usize>,
}

/// Records links innermost first, each raised from the one before it.
#[derive(Clone, Debug, Default)]
pub struct ChainBuilder {
    links: SmallVec<[ChainLink; 4]>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the links of an existing exception, innermost first.
    pub fn from_exception(exception: &Exception) -> Self {
        let mut links: Vec<&Exception> = exception.chain().collect();
        links.reverse();
        let mut builder = Self::new();
        for e in links {
            builder.push(e.kind(), e.message());
        }
        builder
    }

    /// Adds a link raised from the previous one; returns its index.
    pub fn push(&mut self, kind: ErrorKind, message: impl Into<String>) -> usize {
        let cause = self.links.len().checked_sub(1);
        self.links.push(ChainLink {
            kind,
            message: message.into(),
            cause,
        });
        self.links.len() - 1
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Builds every link and returns the outermost one.
    pub fn materialize(&self) -> Option<Exception> {
        let mut built: SmallVec<[Exception; 4]> = SmallVec::with_capacity(self.links.len());
        for link in &self.links {
            let mut exception = Exception::new(link.kind, link.message.clone());
            if let Some(cause) = link.cause.and_then(|idx| built.get(idx)) {
                exception = exception.caused_by(cause.clone());
            }
            built.push(exception);
        }
        built.pop()
    }
}
