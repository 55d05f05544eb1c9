//! Error taxonomy.
//!
//! Every failure is classified at the outermost boundary as either an
//! invalid transaction (deterministic, caused by the payload/state
//! combination) or an internal error (IO/encoding). Inner layers carry
//! more precise types and convert upwards via `From`.

use primitive_types::H160;
use thiserror::Error;

/// Outcome classification reported back to the validator.
#[derive(Debug, Error)]
pub enum ApplyError {
	/// Deterministic rejection; the transaction is dropped from the
	/// block.
	#[error("invalid transaction: {0}")]
	InvalidTransaction(String),
	/// Implementation or IO failure; the validator may retry.
	#[error("internal error: {0}")]
	InternalError(String),
}

/// Failure raised by the borrowed validator context.
#[derive(Debug, Error)]
#[error("context error: {0}")]
pub struct ContextError(pub String);

/// Failure in the account state store.
#[derive(Debug, Error)]
pub enum StateError {
	#[error("account already exists: {0:?}")]
	AlreadyExists(H160),
	#[error("account not found: {0:?}")]
	NotFound(H160),
	#[error(transparent)]
	Context(#[from] ContextError),
	#[error("undecodable state entry at {address}: {message}")]
	Codec { address: String, message: String },
}

impl From<StateError> for ApplyError {
	fn from(err: StateError) -> Self {
		match err {
			StateError::AlreadyExists(_) | StateError::NotFound(_) => {
				ApplyError::InvalidTransaction(err.to_string())
			}
			StateError::Context(_) | StateError::Codec { .. } => {
				ApplyError::InternalError(err.to_string())
			}
		}
	}
}

/// Failure reported by the embedded interpreter, or by the state store
/// while servicing one of its callbacks. Surfaced to the validator as
/// an invalid transaction carrying the interpreter's message.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct VmError(pub String);

impl From<StateError> for VmError {
	fn from(err: StateError) -> Self {
		VmError(err.to_string())
	}
}
