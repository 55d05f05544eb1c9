//! EVM adapter layer.
//!
//! The boundary between the account state store and the embedded EVM
//! interpreter: the callback surface the interpreter consumes, the
//! execution parameters handed to it per run, and the mapping of its
//! LOG entries onto validator events.

mod backend;

pub use self::backend::StateBackend;

use primitive_types::{H160, H256};

use crate::context::StateContext;
use crate::error::{StateError, VmError};
use crate::messages::EvmStateAccount;
use crate::state::StateManager;

/// Event type emitted for every LOG opcode the interpreter executes.
pub const LOG_EVENT_TYPE: &str = "seth_log_event";

/// A LOG entry reported by the interpreter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
	pub address: H160,
	/// Up to four indexed topics.
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// Execution parameters for one interpreter run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecConfig {
	pub block_height: u64,
	pub block_hash: H256,
	pub block_time: u64,
	/// Block gas limit; distinct from the per-transaction gas limit
	/// the run is seeded with.
	pub gas_limit: u64,
}

/// Result of a completed interpreter run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VmOutput {
	pub return_value: Vec<u8>,
	/// Gas left of the amount the run was seeded with.
	pub gas_remaining: u64,
}

/// The callback surface the embedded interpreter consumes.
///
/// An account entry exists exactly when the interpreter considers the
/// account to exist. Implementations must not retain state across
/// runs.
pub trait EvmBackend {
	/// Load the account at `addr`, if it exists.
	fn get_account(&mut self, addr: H160) -> Result<Option<EvmStateAccount>, VmError>;

	/// Write an account record back. Code is write-once: a stored
	/// non-empty code is never replaced.
	fn update_account(&mut self, account: &EvmStateAccount) -> Result<(), VmError>;

	/// Remove the account at `addr` (self-destruct).
	fn remove_account(&mut self, addr: H160) -> Result<(), VmError>;

	/// Create the account for a contract sub-creation: derive the new
	/// address from `creator`'s address and nonce, bump the creator's
	/// nonce in memory, and store an empty entry at the derived
	/// address. Persisting the mutated `creator` is the caller's job
	/// via [`EvmBackend::update_account`].
	fn create_account(&mut self, creator: &mut EvmStateAccount)
		-> Result<EvmStateAccount, VmError>;

	/// Read a storage word; zero when the key is unset.
	fn get_storage(&mut self, addr: H160, key: H256) -> Result<H256, VmError>;

	/// Write a storage word, overwriting an existing key in place.
	fn set_storage(&mut self, addr: H160, key: H256, value: H256) -> Result<(), VmError>;

	/// EVM-visible hash of block `block_num`; zero when the block-info
	/// family has no record of it.
	fn get_block_hash(&mut self, block_num: u64) -> Result<H256, VmError>;

	/// Record a LOG entry. Entries surface as validator events once
	/// the run succeeds. Call traces are not recorded.
	fn log(&mut self, entry: LogEntry) -> Result<(), VmError>;
}

/// The embedded EVM interpreter.
pub trait Evm {
	/// Run `code` on `input`, seeded with `gas_limit` gas, against the
	/// given backend.
	fn execute(
		&mut self,
		backend: &mut dyn EvmBackend,
		config: &ExecConfig,
		code: &[u8],
		input: &[u8],
		gas_limit: u64,
	) -> Result<VmOutput, VmError>;
}

/// Map a LOG entry onto a `seth_log_event` validator event: the
/// logging address twice (hex and 0x-prefixed), one `topicN` attribute
/// per topic counted from 1, and the raw data as the event body.
pub fn emit_log_event<C: StateContext>(
	state: &mut StateManager<'_, C>,
	entry: &LogEntry,
) -> Result<(), StateError> {
	let mut attributes = vec![
		("address".to_string(), hex::encode(entry.address)),
		("eventID".to_string(), format!("{:?}", entry.address)),
	];
	for (i, topic) in entry.topics.iter().enumerate() {
		attributes.push((format!("topic{}", i + 1), hex::encode(topic)));
	}
	state.add_event(LOG_EVENT_TYPE.to_string(), attributes, &entry.data)
}
