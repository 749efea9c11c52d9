use std::{collections::HashMap, sync::Mutex};

use lazy_static::lazy_static;
use tracing::{info, instrument, warn};

use crate::{
    auth::issue_token,
    config::AppConfig,
    error::AppError,
    models::{LoginRequest, LoginResponse, NewUser, PublicUser, SignupRequest},
    repository::{RepositoryError, RepositoryState},
    validation,
};

const EMAIL_TAKEN: &str = "Email already registered";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const DUMMY_PASSWORD: &str = "newsroom-dummy-password";

lazy_static! {
    // Dummy hash per bcrypt cost, verified when a login names an unknown email.
    static ref DUMMY_HASHES: Mutex<HashMap<u32, String>> = Mutex::new(HashMap::new());
}

/// AuthService
///
/// Signup and login. Passwords are hashed with bcrypt on the blocking pool.
#[derive(Clone)]
pub struct AuthService {
    repo: RepositoryState,
    config: AppConfig,
}

impl AuthService {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }

    /// Registers a user and returns its public fields.
    ///
    /// Both the pre-insert lookup and a unique violation raised by the insert itself
    /// (two concurrent signups for one email) end in the same `Conflict`.
    #[instrument(skip_all)]
    pub async fn signup(&self, req: &SignupRequest) -> Result<PublicUser, AppError> {
        let valid = validation::validate_signup(req)?;

        if self.repo.find_user_by_email(&valid.email).await?.is_some() {
            warn!("signup rejected: email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password(valid.password, self.config.bcrypt_cost).await?;

        let user = self
            .repo
            .create_user(NewUser {
                name: valid.name,
                email: valid.email,
                password_hash,
                role: valid.role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::UniqueViolation(_) => {
                    warn!("signup lost an insert race on email uniqueness");
                    AppError::Conflict(EMAIL_TAKEN.to_string())
                }
                other => other.into(),
            })?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user.into())
    }

    /// Verifies credentials and issues an access token.
    ///
    /// Unknown email and wrong password produce the identical error after the same
    /// amount of bcrypt work.
    #[instrument(skip_all)]
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AppError> {
        let email = validation::validate_login(req)?;

        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            // One bcrypt verification, as for a wrong password.
            let hash = dummy_hash(self.config.bcrypt_cost).await?;
            verify_password(req.password.clone(), hash).await?;
            warn!("login failed");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(req.password.clone(), user.password.clone()).await? {
            warn!(user_id = %user.id, "login failed");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = issue_token(user.id, user.role, &self.config)?;
        info!(user_id = %user.id, "user logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.jwt_expires_in_secs,
            user: user.into(),
        })
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal("hash task", e))?
        .map_err(|e| AppError::internal("hash password", e))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal("verify task", e))?
        .map_err(|e| AppError::internal("verify password", e))
}

fn cached_dummy_hash(cost: u32) -> Option<String> {
    DUMMY_HASHES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&cost)
        .cloned()
}

/// Hash of a fixed password at `cost`, computed on first use and then reused.
async fn dummy_hash(cost: u32) -> Result<String, AppError> {
    if let Some(hash) = cached_dummy_hash(cost) {
        return Ok(hash);
    }
    let hash = hash_password(DUMMY_PASSWORD.to_string(), cost).await?;
    Ok(DUMMY_HASHES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .entry(cost)
        .or_insert(hash)
        .clone())
}
