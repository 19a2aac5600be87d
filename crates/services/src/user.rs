//! # UserService
//!
//! Registration and credential checks. Hashing and token signing are delegated
//! to the [`AuthProvider`] port.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{Credentials, NewUser, User};
use domains::traits::{AuthProvider, KanbanStore, TokenPair};

pub(crate) const INVALID_CREDENTIALS: &str = "InvalidCredentials";

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn KanbanStore>,
    auth: Arc<dyn AuthProvider>,
}

impl UserService {
    pub fn new(store: Arc<dyn KanbanStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    pub async fn register(&self, input: NewUser) -> Result<Uuid> {
        let email = normalize_email(&input.email)?;
        let firstname = crate::guard::required("firstname", &input.firstname)?;
        let lastname = crate::guard::required("lastname", &input.lastname)?;
        check_password(&input.password)?;
        let password_hash = self.auth.hash_password(&input.password).await?;

        let mut uow = self.store.begin().await?;
        if uow.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::ValidationError(format!("email {email} is already registered")));
        }
        let user = User {
            id: Uuid::new_v4(),
            email,
            firstname,
            lastname,
            password_hash,
            created_at: Utc::now(),
        };
        uow.insert_user(&user).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    /// Unknown emails and wrong passwords fail the same way.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<TokenPair> {
        let email = credentials.email.trim().to_lowercase();
        let user = {
            let mut uow = self.store.begin().await?;
            uow.find_user_by_email(&email).await?
        };
        let Some(user) = user else {
            tracing::warn!("login attempt for unknown email");
            return Err(AppError::Forbidden(INVALID_CREDENTIALS));
        };
        if !self.auth.verify_password(&credentials.password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(AppError::Forbidden(INVALID_CREDENTIALS));
        }
        self.auth.issue_tokens(&user)
    }
}

fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(AppError::ValidationError(format!("invalid email {raw:?}")));
    }
    Ok(email)
}

/// At least eight characters mixing lowercase, uppercase, digits and symbols.
fn check_password(password: &str) -> Result<()> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let lower = password.chars().any(|c| c.is_lowercase());
    let upper = password.chars().any(|c| c.is_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if long_enough && lower && upper && digit && special {
        Ok(())
    } else {
        Err(AppError::ValidationError("password does not meet the strength policy".into()))
    }
}
