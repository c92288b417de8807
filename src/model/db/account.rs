use std::ops::{Deref, DerefMut};

use argon2::{Config as Argon2Config, Error as Argon2Error};
use log::warn;
use mongodb::bson::doc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::Result,
    model::{
        api::auth::Rights,
        mongodb::{Coll, Id},
    },
};

/// Core account data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCore {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub rights: Rights,
}

impl AccountCore {
    /// Create a new account, hashing the given plaintext password.
    pub fn new(
        name: String,
        email: String,
        password: &str,
        rights: Rights,
    ) -> std::result::Result<Self, Argon2Error> {
        Ok(Self {
            name,
            email,
            password_hash: hash_password(password)?,
            rights,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// An account without an ID.
pub type NewAccount = AccountCore;

/// An account from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub account: AccountCore,
}

impl Deref for Account {
    type Target = AccountCore;

    fn deref(&self) -> &Self::Target {
        &self.account
    }
}

impl DerefMut for Account {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.account
    }
}

/// Hash a plaintext password with a fresh random salt.
fn hash_password(password: &str) -> std::result::Result<String, Argon2Error> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &Argon2Config::default())
}

/// Ensure that at least one administrator exists, creating the configured
/// bootstrap administrator if not.
pub async fn ensure_admin_exists(accounts: &Coll<NewAccount>, config: &Config) -> Result<()> {
    let admins = accounts
        .count_documents(doc! { "rights": Rights::Admin }, None)
        .await?;
    if admins == 0 {
        warn!(
            "No administrators found, creating bootstrap admin {}",
            config.admin_email()
        );
        let admin = NewAccount::new(
            "Administrator".to_string(),
            config.admin_email().to_string(),
            config.admin_password(),
            Rights::Admin,
        )?;
        accounts.insert_one(admin, None).await?;
    }
    Ok(())
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AccountCore {
        pub fn respondent_example() -> Self {
            Self::new(
                "Rita Respondent".to_string(),
                "rita@example.com".to_string(),
                "correct horse battery",
                Rights::Respondent,
            )
            .unwrap()
        }

        pub fn admin_example() -> Self {
            Self::new(
                "Adam Admin".to_string(),
                "adam@example.com".to_string(),
                "staple admin password",
                Rights::Admin,
            )
            .unwrap()
        }
    }
}
