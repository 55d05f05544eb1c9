//! In-memory validator context, storing all state in a `BTreeMap` and
//! recording events and receipts instead of forwarding them.

use std::collections::BTreeMap;

use super::StateContext;
use crate::error::ContextError;

/// Event captured by a [`MemoryContext`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
	pub event_type: String,
	pub attributes: Vec<(String, String)>,
	pub data: Vec<u8>,
}

/// Pure in-memory context for unit tests and local tooling.
#[derive(Clone, Debug, Default)]
pub struct MemoryContext {
	state: BTreeMap<String, Vec<u8>>,
	events: Vec<Event>,
	receipts: Vec<Vec<u8>>,
}

impl MemoryContext {
	/// Create an empty context.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The underlying `BTreeMap` storing the state.
	#[must_use]
	pub fn state(&self) -> &BTreeMap<String, Vec<u8>> {
		&self.state
	}

	/// Every event emitted so far, in order.
	#[must_use]
	pub fn events(&self) -> &[Event] {
		&self.events
	}

	/// Every receipt attached so far, in order.
	#[must_use]
	pub fn receipts(&self) -> &[Vec<u8>] {
		&self.receipts
	}
}

impl StateContext for MemoryContext {
	fn get_state_entry(&self, address: &str) -> Result<Option<Vec<u8>>, ContextError> {
		Ok(self.state.get(address).cloned())
	}

	fn set_state_entry(&mut self, address: String, data: Vec<u8>) -> Result<(), ContextError> {
		self.state.insert(address, data);
		Ok(())
	}

	fn delete_state_entry(&mut self, address: &str) -> Result<bool, ContextError> {
		Ok(self.state.remove(address).is_some())
	}

	fn add_event(
		&mut self,
		event_type: String,
		attributes: Vec<(String, String)>,
		data: &[u8],
	) -> Result<(), ContextError> {
		self.events.push(Event {
			event_type,
			attributes,
			data: data.to_vec(),
		});
		Ok(())
	}

	fn add_receipt_data(&mut self, data: &[u8]) -> Result<(), ContextError> {
		self.receipts.push(data.to_vec());
		Ok(())
	}
}
