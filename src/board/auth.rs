//! Registration, login and session resolution.

use super::{Board, optional_text, required_text};
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::policy::Actor;
use crate::types::User;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

fn normalize_email(email: Option<&str>) -> ApiResult<String> {
    let email = required_text("email", email)?.to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::invalid_value("email", "email address is not valid"));
    }
    Ok(email)
}

impl Board {
    /// Create an account with the `member` role.
    pub fn register(&self, input: RegisterInput) -> ApiResult<User> {
        let email = normalize_email(input.email.as_deref())?;
        let password = input
            .password
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ApiError::missing_field("password"))?;
        let name = optional_text(input.name.as_deref());

        let hash = hash_password(&password)?;
        let user = self.db.create_user(&email, name.as_deref(), &hash)?;
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    pub fn login(&self, input: LoginInput) -> ApiResult<LoginResponse> {
        let rejected = || ApiError::new(ErrorCode::Unauthorized, "invalid email or password");

        let email = normalize_email(input.email.as_deref()).map_err(|_| rejected())?;
        let password = input.password.unwrap_or_default();

        let Some((user, hash)) = self.db.find_credentials(&email)? else {
            return Err(rejected());
        };
        if !verify_password(&password, &hash) {
            return Err(rejected());
        }

        let token = self.db.create_session(&user.id, self.session_ttl_ms)?;
        let purged = self.db.purge_expired_sessions()?;
        if purged > 0 {
            debug!(purged, "Removed expired sessions");
        }
        info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse { token, user })
    }

    pub fn logout(&self, token: &str) -> ApiResult<()> {
        self.db.delete_session(token)?;
        Ok(())
    }

    /// Resolve a session token to the acting user. The role is read fresh
    /// from the store so role changes apply to existing sessions.
    pub fn authenticate(&self, token: &str) -> ApiResult<Actor> {
        let user = self
            .db
            .session_user(token)?
            .ok_or_else(ApiError::unauthorized)?;
        Ok(Actor::new(user.id, user.role))
    }
}
