use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::{auth::Rights, id::ApiId},
    db::account::{Account, NewAccount},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A request to create an account. The password is in plaintext and never stored directly.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Email and password, received from a user logging in.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Reasons a signup request is refused before touching the database.
#[derive(Debug, PartialEq, Error)]
pub enum SignupError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    ShortPassword,
    #[error("password confirmation does not match")]
    ConfirmationMismatch,
    #[error("failed to hash password")]
    Hashing(#[from] argon2::Error),
}

impl SignupRequest {
    /// Check the request is well-formed, then hash the password into a new account.
    pub fn into_account(self, rights: Rights) -> Result<NewAccount, SignupError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SignupError::EmptyName);
        }
        let email = self.email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(SignupError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SignupError::ShortPassword);
        }
        if self.password != self.password_confirmation {
            return Err(SignupError::ConfirmationMismatch);
        }
        Ok(NewAccount::new(
            name.to_string(),
            email,
            &self.password,
            rights,
        )?)
    }
}

/// Something, an `@`, then something containing a dot.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// An API-friendly account description, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDescription {
    pub id: ApiId,
    pub name: String,
    pub email: String,
    pub rights: Rights,
}

impl From<Account> for AccountDescription {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.into(),
            name: account.account.name,
            email: account.account.email,
            rights: account.account.rights,
        }
    }
}
