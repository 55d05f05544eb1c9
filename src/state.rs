//! Account state store.
//!
//! A thin wrapper over the validator context holding one decoded
//! [`EvmEntry`] per EVM address. Reads are cached for the duration of
//! the transaction so the interpreter sees a stable snapshot; writes
//! are buffered and flushed only when the dispatcher commits a
//! successful outcome. There is no cache across transactions.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use codec::{Decode, Encode};
use log::debug;
use primitive_types::H160;

use crate::addresses::namespace_address;
use crate::context::StateContext;
use crate::error::StateError;
use crate::messages::{EvmEntry, EvmStateAccount};

#[derive(Clone, Debug)]
enum CacheSlot {
	Present { entry: EvmEntry, dirty: bool },
	Absent { deleted: bool },
}

/// Per-transaction view of the account state, keyed by EVM address.
pub struct StateManager<'a, C: StateContext> {
	context: &'a mut C,
	cache: BTreeMap<H160, CacheSlot>,
}

impl<'a, C: StateContext> StateManager<'a, C> {
	pub fn new(context: &'a mut C) -> Self {
		Self {
			context,
			cache: BTreeMap::new(),
		}
	}

	/// Shared access to the underlying context, for read-only loads
	/// outside the seth namespace.
	pub fn context(&self) -> &C {
		self.context
	}

	/// Forward an event to the context's event sink.
	pub fn add_event(
		&mut self,
		event_type: String,
		attributes: Vec<(String, String)>,
		data: &[u8],
	) -> Result<(), StateError> {
		self.context
			.add_event(event_type, attributes, data)
			.map_err(StateError::Context)
	}

	fn load(&mut self, addr: H160) -> Result<&mut CacheSlot, StateError> {
		match self.cache.entry(addr) {
			Entry::Occupied(slot) => Ok(slot.into_mut()),
			Entry::Vacant(slot) => {
				let address = namespace_address(addr);
				let loaded = match self.context.get_state_entry(&address)? {
					Some(bytes) => {
						let entry =
							EvmEntry::decode(&mut &bytes[..]).map_err(|err| StateError::Codec {
								address,
								message: err.what().into(),
							})?;
						CacheSlot::Present { entry, dirty: false }
					}
					None => {
						debug!("no account entry at {:?}", addr);
						CacheSlot::Absent { deleted: false }
					}
				};
				Ok(slot.insert(loaded))
			}
		}
	}

	/// Load the entry at `addr`, if one exists.
	pub fn get_account(&mut self, addr: H160) -> Result<Option<EvmEntry>, StateError> {
		match self.load(addr)? {
			CacheSlot::Present { entry, .. } => Ok(Some(entry.clone())),
			CacheSlot::Absent { .. } => Ok(None),
		}
	}

	/// Load the entry at `addr`, failing if it does not exist.
	pub fn must_get(&mut self, addr: H160) -> Result<EvmEntry, StateError> {
		self.get_account(addr)?.ok_or(StateError::NotFound(addr))
	}

	/// Create a fresh, empty entry at `addr`.
	pub fn new_account(&mut self, addr: H160) -> Result<EvmEntry, StateError> {
		if self.get_account(addr)?.is_some() {
			return Err(StateError::AlreadyExists(addr));
		}
		let entry = EvmEntry {
			account: EvmStateAccount {
				address: addr.as_bytes().to_vec(),
				..EvmStateAccount::default()
			},
			storage: Vec::new(),
		};
		self.cache.insert(
			addr,
			CacheSlot::Present {
				entry: entry.clone(),
				dirty: true,
			},
		);
		Ok(entry)
	}

	/// Persist `entry` at `addr`. Last write wins within the
	/// transaction.
	pub fn set_account(&mut self, addr: H160, entry: EvmEntry) {
		self.cache.insert(addr, CacheSlot::Present { entry, dirty: true });
	}

	/// Remove the entry at `addr`.
	pub fn del_account(&mut self, addr: H160) -> Result<(), StateError> {
		if self.get_account(addr)?.is_none() {
			return Err(StateError::NotFound(addr));
		}
		self.cache.insert(addr, CacheSlot::Absent { deleted: true });
		Ok(())
	}

	/// Write every buffered change out to the context. Called once by
	/// the dispatcher after the handler succeeds; a failed transaction
	/// never flushes, so the context keeps its pre-transaction state.
	pub fn flush(self) -> Result<(), StateError> {
		let StateManager { context, cache } = self;
		for (addr, slot) in cache {
			match slot {
				CacheSlot::Present { entry, dirty: true } => {
					context.set_state_entry(namespace_address(addr), entry.encode())?;
				}
				CacheSlot::Absent { deleted: true } => {
					// Tolerated: the entry may have been created and
					// destroyed within this same transaction.
					if !context.delete_state_entry(&namespace_address(addr))? {
						debug!("deleted entry was never persisted: {:?}", addr);
					}
				}
				_ => {}
			}
		}
		Ok(())
	}
}
