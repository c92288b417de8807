//! Error code constants the mongodb crate doesn't expose.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;
pub const WRITE_CONFLICT: i32 = 112;

/// Return true if the given error is a duplicate key write error.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    has_write_error_code(err, DUPLICATE_KEY)
}

/// Return true if a transaction lost a race for a document to another writer.
pub fn is_write_conflict(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Command(ref e) => e.code == WRITE_CONFLICT,
        _ => has_write_error_code(err, WRITE_CONFLICT),
    }
}

fn has_write_error_code(err: &DbError, code: i32) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == code,
        ErrorKind::BulkWrite(ref failure) => failure
            .write_errors
            .iter()
            .flatten()
            .any(|e| e.code == code),
        _ => false,
    }
}
