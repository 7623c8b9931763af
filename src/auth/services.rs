use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, UserProfile},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_decoy_blocking, verify_password_blocking},
    repo::{UserRepo, EMAIL_TAKEN},
    repo_types::NewUser,
};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 50;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register, login and identity lookup on top of the user store and the
/// token keys.
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserRepo>,
    keys: JwtKeys,
}

impl SessionService {
    pub fn new(users: Arc<dyn UserRepo>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        let username = req.username.trim().to_string();
        let email = normalize_email(&req.email);

        if username.is_empty() {
            return Err(AppError::invalid("Username is required"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::invalid(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if !is_valid_email(&email) {
            return Err(AppError::invalid("Please include a valid email"));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        let password_hash = hash_password_blocking(req.password).await?;
        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
            })
            .await?;

        let token = self.keys.issue(user.id)?;
        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email);
        if email.is_empty() || req.password.is_empty() {
            verify_decoy_blocking(req.password).await?;
            return Err(AppError::InvalidCredentials);
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_decoy_blocking(req.password).await?;
            warn!(%email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.keys.issue(user.id)?;
        info!(user_id = user.id, "user logged in");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    pub async fn current_user(&self, user_id: i64) -> AppResult<UserProfile> {
        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user.into()),
            None => {
                warn!(user_id, "token subject no longer resolves to a user");
                Err(AppError::NotFound("User"))
            }
        }
    }
}
