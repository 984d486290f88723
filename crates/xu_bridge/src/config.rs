//! Bridge configuration.

/// What to do when a recognized payload slot holds a token that does not
/// resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnresolvedToken {
    /// Report the `BridgeError`.
    Fail,
    /// Log it and raise from code and message alone.
    Fallback,
}

#[derive(Clone, Copy, Debug)]
pub struct BridgeConfig {
    pub on_unresolved_token: UnresolvedToken,
    /// Trim surrounding ASCII whitespace from status messages before they
    /// become exception messages.
    pub strip_message_whitespace: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            on_unresolved_token: UnresolvedToken::Fail,
            strip_message_whitespace: true,
        }
    }
}
