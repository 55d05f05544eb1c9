//! Validator context boundary.
//!
//! The processor borrows a context for the duration of one `apply`
//! call and drives every state read, state write, event, and receipt
//! through it. The context must not be retained past the call.

mod memory;

pub use self::memory::{Event, MemoryContext};

use crate::error::ContextError;

/// Synchronous interface to the validator's state for one transaction.
pub trait StateContext {
	/// Read the entry at a state address.
	fn get_state_entry(&self, address: &str) -> Result<Option<Vec<u8>>, ContextError>;

	/// Create or overwrite the entry at a state address.
	fn set_state_entry(&mut self, address: String, data: Vec<u8>) -> Result<(), ContextError>;

	/// Remove the entry at a state address, reporting whether it
	/// existed.
	fn delete_state_entry(&mut self, address: &str) -> Result<bool, ContextError>;

	/// Emit a named event with string attributes and an opaque body.
	fn add_event(
		&mut self,
		event_type: String,
		attributes: Vec<(String, String)>,
		data: &[u8],
	) -> Result<(), ContextError>;

	/// Attach opaque receipt data to the transaction.
	fn add_receipt_data(&mut self, data: &[u8]) -> Result<(), ContextError>;
}
