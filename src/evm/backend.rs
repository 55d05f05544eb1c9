//! State-store implementation of the interpreter callbacks.

use log::debug;
use primitive_types::{H160, H256};

use super::{EvmBackend, LogEntry};
use crate::addresses::{derive_contract_address, left_pad20, left_pad32};
use crate::block_info::{block_hash_from_signature, get_block_info};
use crate::context::StateContext;
use crate::error::{StateError, VmError};
use crate::messages::{EvmStateAccount, EvmStorage};
use crate::state::StateManager;

/// [`EvmBackend`] over the per-transaction state manager. LOG entries
/// are buffered here and drained by the handler after a successful
/// run.
pub struct StateBackend<'b, 'a, C: StateContext> {
	state: &'b mut StateManager<'a, C>,
	logs: Vec<LogEntry>,
}

impl<'b, 'a, C: StateContext> StateBackend<'b, 'a, C> {
	pub fn new(state: &'b mut StateManager<'a, C>) -> Self {
		Self {
			state,
			logs: Vec::new(),
		}
	}

	/// The LOG entries recorded during the run, in order.
	pub fn into_logs(self) -> Vec<LogEntry> {
		self.logs
	}
}

impl<'b, 'a, C: StateContext> EvmBackend for StateBackend<'b, 'a, C> {
	fn get_account(&mut self, addr: H160) -> Result<Option<EvmStateAccount>, VmError> {
		Ok(self.state.get_account(addr)?.map(|entry| entry.account))
	}

	fn update_account(&mut self, account: &EvmStateAccount) -> Result<(), VmError> {
		let addr = left_pad20(&account.address);
		let mut entry = match self.state.get_account(addr)? {
			Some(entry) => entry,
			None => self.state.new_account(addr)?,
		};
		if entry.account.code.is_empty() {
			entry.account.code = account.code.clone();
		}
		entry.account.balance = account.balance;
		entry.account.nonce = account.nonce;
		entry.account.permissions = account.permissions.clone();
		self.state.set_account(addr, entry);
		Ok(())
	}

	fn remove_account(&mut self, addr: H160) -> Result<(), VmError> {
		debug!("self-destruct of {:?}", addr);
		Ok(self.state.del_account(addr)?)
	}

	fn create_account(
		&mut self,
		creator: &mut EvmStateAccount,
	) -> Result<EvmStateAccount, VmError> {
		let creator_addr = left_pad20(&creator.address);
		let new_addr = derive_contract_address(creator_addr, creator.nonce);
		creator.nonce += 1;
		let mut entry = match self.state.new_account(new_addr) {
			Ok(entry) => entry,
			// Nonces plus the address hash rule this out; hitting it
			// means the state is corrupt.
			Err(StateError::AlreadyExists(_)) => {
				return Err(VmError(format!(
					"contract address collision at {:?}",
					new_addr
				)))
			}
			Err(err) => return Err(err.into()),
		};
		entry.account.permissions = creator.permissions.inherit();
		self.state.set_account(new_addr, entry.clone());
		debug!("created sub-contract account {:?}", new_addr);
		Ok(entry.account)
	}

	fn get_storage(&mut self, addr: H160, key: H256) -> Result<H256, VmError> {
		let entry = self.state.must_get(addr)?;
		Ok(lookup_storage(&entry.storage, key).unwrap_or_else(H256::zero))
	}

	fn set_storage(&mut self, addr: H160, key: H256, value: H256) -> Result<(), VmError> {
		let mut entry = self.state.must_get(addr)?;
		set_storage_pair(&mut entry.storage, key, value);
		self.state.set_account(addr, entry);
		Ok(())
	}

	fn get_block_hash(&mut self, block_num: u64) -> Result<H256, VmError> {
		match get_block_info(self.state.context(), block_num)? {
			Some(info) => Ok(block_hash_from_signature(&info.header_signature)),
			None => {
				debug!("no block info for block {}; returning zero hash", block_num);
				Ok(H256::zero())
			}
		}
	}

	fn log(&mut self, entry: LogEntry) -> Result<(), VmError> {
		self.logs.push(entry);
		Ok(())
	}
}

fn lookup_storage(storage: &[EvmStorage], key: H256) -> Option<H256> {
	storage
		.iter()
		.find(|pair| left_pad32(&pair.key) == key)
		.map(|pair| left_pad32(&pair.value))
}

/// Overwrite the pair with a matching padded key in place, or append a
/// new pair. Keys stay unique within an entry.
fn set_storage_pair(storage: &mut Vec<EvmStorage>, key: H256, value: H256) {
	for pair in storage.iter_mut() {
		if left_pad32(&pair.key) == key {
			pair.value = value.as_bytes().to_vec();
			return;
		}
	}
	storage.push(EvmStorage {
		key: key.as_bytes().to_vec(),
		value: value.as_bytes().to_vec(),
	});
}
