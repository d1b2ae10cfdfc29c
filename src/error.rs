//! Error codes.
//!
//! This is the shared error vocabulary for the whole crate: verbs report
//! failures through the per-context sticky slot, fallible constructors
//! return them directly.

use thiserror::Error;

/// Error codes reported by API verbs.
///
/// A context stores the first code recorded since the last
/// [`get_error`](crate::context::Context::get_error); later codes are
/// dropped until the slot is read.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ErrorCode {
    #[error("no error")]
    NoError,
    #[error("invalid enum")]
    InvalidEnum,
    #[error("invalid value")]
    InvalidValue,
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("invalid operation")]
    InvalidOperation,
    #[error("out of memory")]
    OutOfMemory,
}

pub type Result<T> = std::result::Result<T, ErrorCode>;
