use crate::{trivia::SessionStore, urban_rivals::Token};

/// State which is lost across sessions
pub struct VolatileState {
    pub trivia: SessionStore,
    pub auth: PendingAuth,
}

/// The request token the owner was asked to authorize, waiting for its verifier
#[derive(Default)]
pub struct PendingAuth(Option<Token>);

impl VolatileState {
    pub fn new() -> Self {
        Self {
            trivia: SessionStore::new(),
            auth: PendingAuth::default(),
        }
    }
}

impl PendingAuth {
    /// Wait for the verifier of `request_token`, forgetting any earlier one.
    pub fn begin(&mut self, request_token: Token) {
        self.0 = Some(request_token);
    }

    pub fn pending(&self) -> Option<&Token> {
        self.0.as_ref()
    }

    /// Stop waiting, but only if `request_token` is still the one being waited on.
    pub fn finish(&mut self, request_token: &Token) {
        if self.0.as_ref() == Some(request_token) {
            self.0 = None;
        }
    }
}
