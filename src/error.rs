use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{debug, error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use thiserror::Error;

use crate::engine::{Rejection, RejectionKind};
use crate::model::api::{account::SignupError, survey::SurveySpecError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{1}")]
    Status(Status, String),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl Error {
    /// A 404 naming what could not be found.
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Argon2(_) => Status::BadRequest,
            Self::Status(status, _) => *status,
            Self::Rejected(rejection) => match rejection.kind {
                RejectionKind::ExpiredSurvey => Status::Forbidden,
                RejectionKind::InvalidPayload => Status::BadRequest,
            },
        }
    }
}

impl From<SignupError> for Error {
    fn from(err: SignupError) -> Self {
        match err {
            SignupError::Hashing(e) => Self::Argon2(e),
            other => Self::Status(Status::BadRequest, other.to_string()),
        }
    }
}

impl From<SurveySpecError> for Error {
    fn from(err: SurveySpecError) -> Self {
        Self::Status(Status::BadRequest, err.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        match self {
            Self::Rejected(rejection) => {
                warn!("Submission rejected: {rejection}");
                (status, Json(rejection)).respond_to(req)
            }
            other => {
                if status.code >= 500 {
                    error!("{other}");
                } else {
                    debug!("{other}");
                }
                Err(status)
            }
        }
    }
}
