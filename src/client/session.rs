use serde::{Deserialize, Serialize};

use crate::auth::dto::{AuthResponse, PublicUser, UserProfile};
use crate::client::credentials::{Credential, CredentialStore};

/// Who the client believes it is signed in as. Email is only known once
/// the profile has been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

impl From<PublicUser> for SessionUser {
    fn from(u: PublicUser) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: None,
        }
    }
}

impl From<UserProfile> for SessionUser {
    fn from(u: UserProfile) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: Some(u.email),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated { error: Option<String> },
    /// A stored credential is being checked against `/auth/me`.
    Loading { credential: Credential },
    Authenticated {
        user: SessionUser,
        credential: Credential,
    },
}

#[derive(Debug, Clone)]
pub enum AuthEvent {
    LoginSucceeded(AuthResponse),
    RegisterSucceeded(AuthResponse),
    UserLoaded(UserProfile),
    LoginFailed(String),
    RegisterFailed(String),
    AuthError,
    Logout,
    ClearError,
}

impl AuthState {
    pub fn initial(stored: Option<Credential>) -> Self {
        match stored {
            Some(credential) => AuthState::Loading { credential },
            None => AuthState::Unauthenticated { error: None },
        }
    }

    /// Pure: the next state for `event`, with no storage side effects.
    pub fn transition(self, event: AuthEvent) -> Self {
        use AuthEvent::*;
        match (self, event) {
            (_, LoginSucceeded(res) | RegisterSucceeded(res)) => AuthState::Authenticated {
                user: res.user.into(),
                credential: Credential::new(res.token),
            },
            (
                AuthState::Loading { credential } | AuthState::Authenticated { credential, .. },
                UserLoaded(profile),
            ) => AuthState::Authenticated {
                user: profile.into(),
                credential,
            },
            (state @ AuthState::Unauthenticated { .. }, UserLoaded(_)) => state,
            (_, LoginFailed(msg) | RegisterFailed(msg)) => {
                AuthState::Unauthenticated { error: Some(msg) }
            }
            (_, AuthError | Logout) => AuthState::Unauthenticated { error: None },
            (AuthState::Unauthenticated { .. }, ClearError) => {
                AuthState::Unauthenticated { error: None }
            }
            (state, ClearError) => state,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            AuthState::Loading { credential } | AuthState::Authenticated { credential, .. } => {
                Some(credential)
            }
            AuthState::Unauthenticated { .. } => None,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthState::Unauthenticated { error } => error.as_deref(),
            _ => None,
        }
    }

    /// Authenticated persists the credential, Unauthenticated forgets it,
    /// Loading leaves storage alone.
    pub fn sync_credentials(&self, store: &mut dyn CredentialStore) {
        match self {
            AuthState::Authenticated { credential, .. } => store.save(credential),
            AuthState::Unauthenticated { .. } => store.clear(),
            AuthState::Loading { .. } => {}
        }
    }
}
