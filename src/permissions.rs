//! Bitmask permission model.
//!
//! Every account carries a pair of masks: `set_bit` marks the flags
//! the account governs itself, `perms` the governed values. A query
//! for a flag the account does not govern escalates to the global
//! permissions account at the reserved zero address; if neither
//! governs the flag, it is denied.

use log::info;
use primitive_types::H160;

use crate::context::StateContext;
use crate::error::StateError;
use crate::messages::EvmPermissions;
use crate::state::StateManager;

/// May change any account's permissions.
pub const PERM_ROOT: u64 = 1;
/// May transfer value from the account.
pub const PERM_SEND: u64 = 1 << 1;
/// May call contracts.
pub const PERM_CALL: u64 = 1 << 2;
/// May create contract accounts.
pub const PERM_CREATE_CONTRACT: u64 = 1 << 3;
/// May create external accounts.
pub const PERM_CREATE_ACCOUNT: u64 = 1 << 4;
/// Every flag the processor knows about.
pub const PERM_ALL: u64 =
	PERM_ROOT | PERM_SEND | PERM_CALL | PERM_CREATE_CONTRACT | PERM_CREATE_ACCOUNT;

/// Reserved address of the account whose bits answer permission
/// queries no local account governs.
pub const GLOBAL_PERMISSIONS_ADDRESS: H160 = H160([0; 20]);

impl EvmPermissions {
	/// Permissions with every flag governed and granted.
	pub fn all() -> Self {
		Self {
			perms: PERM_ALL,
			set_bit: PERM_ALL,
		}
	}

	/// Whether this account governs `flag` at all.
	pub fn governs(&self, flag: u64) -> bool {
		self.set_bit & flag != 0
	}

	/// Whether this account governs and grants `flag`.
	pub fn grants(&self, flag: u64) -> bool {
		self.governs(flag) && self.perms & flag != 0
	}

	/// Permissions a newly created account inherits from its creator:
	/// the creator's pair with Root cleared from both masks. Root
	/// stays answerable by the global permissions account until an
	/// administrator locks it down there.
	pub fn inherit(&self) -> Self {
		Self {
			perms: self.perms & !PERM_ROOT,
			set_bit: self.set_bit & !PERM_ROOT,
		}
	}
}

/// Answer a permission query for `addr`, escalating to the global
/// permissions account when the local account does not govern the
/// flag.
pub fn has_permission<C: StateContext>(
	state: &mut StateManager<'_, C>,
	addr: H160,
	flag: u64,
) -> Result<bool, StateError> {
	if let Some(entry) = state.get_account(addr)? {
		if entry.account.permissions.governs(flag) {
			return Ok(entry.account.permissions.grants(flag));
		}
	}
	if addr != GLOBAL_PERMISSIONS_ADDRESS {
		if let Some(global) = state.get_account(GLOBAL_PERMISSIONS_ADDRESS)? {
			if global.account.permissions.governs(flag) {
				return Ok(global.account.permissions.grants(flag));
			}
		}
	}
	Ok(false)
}

/// Create the global permissions account granting every flag, if it is
/// not already present. Idempotent; the only write the dispatcher
/// performs on its own.
pub fn ensure_global_permissions<C: StateContext>(
	state: &mut StateManager<'_, C>,
) -> Result<(), StateError> {
	if state.get_account(GLOBAL_PERMISSIONS_ADDRESS)?.is_some() {
		return Ok(());
	}
	info!("initializing global permissions account");
	let mut entry = state.new_account(GLOBAL_PERMISSIONS_ADDRESS)?;
	entry.account.permissions = EvmPermissions::all();
	state.set_account(GLOBAL_PERMISSIONS_ADDRESS, entry);
	Ok(())
}
