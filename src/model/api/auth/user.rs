use std::fmt::Display;

use mongodb::bson::Bson;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// A kind of user of our application, having defined rights.
pub trait User {
    /// The rights needed to act as this user type.
    const RIGHTS: Rights;
}

/// Different privilege levels. Higher levels include everything lower ones may do.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Respondent = 0,
    Admin = 1,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Respondent => "respondent",
                Self::Admin => "admin",
            }
        )
    }
}

impl From<Rights> for Bson {
    fn from(rights: Rights) -> Self {
        Bson::Int32(rights as i32)
    }
}

/// Any signed-in account: everyone may answer surveys.
pub struct Respondent;

impl User for Respondent {
    const RIGHTS: Rights = Rights::Respondent;
}

/// An account that may manage surveys and other administrators.
pub struct Admin;

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;
}
