use std::fmt;

use serde::{Deserialize, Serialize};

/// A bearer token as the client holds it. Debug output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header of every protected call.
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Where the client keeps its credential between runs.
pub trait CredentialStore {
    fn load(&self) -> Option<Credential>;
    fn save(&mut self, credential: &Credential);
    fn clear(&mut self);
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Option<Credential>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        self.slot.clone()
    }

    fn save(&mut self, credential: &Credential) {
        self.slot = Some(credential.clone());
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}
