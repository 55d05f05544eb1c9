//! Transaction dispatcher and the four operation handlers.
//!
//! The dispatcher decodes the payload, resolves the sender from the
//! signer public key, bootstraps the global permissions account, and
//! routes to one handler. Handlers either fail before any write
//! reaches the context or complete every write; the buffered state
//! manager is flushed only on success, followed by exactly one
//! receipt.

use log::{debug, info};

use codec::{Decode, Encode};
use primitive_types::H160;

use crate::addresses::{derive_contract_address, evm_addr_from_public_key, seth_namespace};
use crate::block_info::exec_config;
use crate::context::StateContext;
use crate::error::ApplyError;
use crate::evm::{emit_log_event, Evm, StateBackend, VmOutput};
use crate::messages::{
	CreateContractAccountTxn, CreateExternalAccountTxn, EvmPermissions, EvmStateAccount,
	MessageCallTxn, SethTransaction, SethTransactionReceipt, SetPermissionsTxn,
};
use crate::permissions::{
	ensure_global_permissions, has_permission, GLOBAL_PERMISSIONS_ADDRESS, PERM_CALL,
	PERM_CREATE_ACCOUNT, PERM_CREATE_CONTRACT, PERM_ROOT,
};
use crate::state::StateManager;

/// Transaction family name.
pub const SETH_FAMILY_NAME: &str = "seth";
/// Transaction family version.
pub const SETH_FAMILY_VERSION: &str = "1.0";
/// Block gas limit seeded into the interpreter's execution parameters.
pub const GAS_LIMIT: u64 = 1 << 31;

/// The slice of a validator process request the dispatcher consumes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TxnRequest {
	/// Raw transaction payload.
	pub payload: Vec<u8>,
	/// Hex-encoded public key of the transaction signer.
	pub signer_public_key: String,
}

/// What a handler hands back to the dispatcher on success.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct TxnOutcome {
	gas_used: u64,
	return_value: Vec<u8>,
	contract_address: Option<H160>,
}

/// Transaction dispatcher for the seth family, generic over the
/// embedded interpreter.
pub struct SethTransactionHandler<V> {
	family_name: String,
	family_versions: Vec<String>,
	namespaces: Vec<String>,
	vm: V,
}

impl<V: Evm> SethTransactionHandler<V> {
	/// Create a dispatcher around an interpreter instance.
	pub fn new(vm: V) -> Self {
		Self {
			family_name: SETH_FAMILY_NAME.into(),
			family_versions: vec![SETH_FAMILY_VERSION.into()],
			namespaces: vec![seth_namespace().into()],
			vm,
		}
	}

	pub fn family_name(&self) -> &str {
		&self.family_name
	}

	pub fn family_versions(&self) -> &[String] {
		&self.family_versions
	}

	pub fn namespaces(&self) -> &[String] {
		&self.namespaces
	}

	/// Apply one transaction against the borrowed context.
	pub fn apply<C: StateContext>(
		&mut self,
		request: &TxnRequest,
		context: &mut C,
	) -> Result<(), ApplyError> {
		if request.payload.is_empty() {
			return Err(ApplyError::InvalidTransaction(
				"request must contain a payload".into(),
			));
		}
		let txn = SethTransaction::decode(&mut &request.payload[..]).map_err(|err| {
			ApplyError::InvalidTransaction(format!("malformed payload: {}", err.what()))
		})?;

		if request.signer_public_key.is_empty() {
			return Err(ApplyError::InvalidTransaction(
				"request must contain a signer public key".into(),
			));
		}
		let public_key = hex::decode(&request.signer_public_key).map_err(|err| {
			ApplyError::InvalidTransaction(format!("malformed signer public key: {}", err))
		})?;
		let sender = evm_addr_from_public_key(&public_key);
		debug!("applying transaction from {:?}", sender);

		let mut state = StateManager::new(context);
		ensure_global_permissions(&mut state)?;

		let outcome = match &txn {
			SethTransaction::CreateExternalAccount(txn) => {
				self.create_external_account(&mut state, sender, txn)?
			}
			SethTransaction::MessageCall(txn) => self.message_call(&mut state, sender, txn)?,
			SethTransaction::CreateContractAccount(txn) => {
				self.create_contract_account(&mut state, sender, txn)?
			}
			SethTransaction::SetPermissions(txn) => {
				self.set_permissions(&mut state, sender, txn)?
			}
		};

		state.flush()?;

		let receipt = SethTransactionReceipt {
			contract_address: outcome.contract_address,
			gas_used: outcome.gas_used,
			return_value: outcome.return_value,
		};
		context
			.add_receipt_data(&receipt.encode())
			.map_err(|err| ApplyError::InternalError(format!("failed to attach receipt: {}", err)))?;
		Ok(())
	}

	/// CreateExternalAccount: self-bootstrap when `to` is unset,
	/// creation on behalf of another key otherwise.
	fn create_external_account<C: StateContext>(
		&mut self,
		state: &mut StateManager<'_, C>,
		sender: H160,
		txn: &CreateExternalAccountTxn,
	) -> Result<TxnOutcome, ApplyError> {
		match txn.to {
			None => {
				if state.get_account(sender)?.is_some() {
					return Err(ApplyError::InvalidTransaction(format!(
						"account already exists: {:?}",
						sender
					)));
				}
				// A sender that does not exist yet has an implicit
				// nonce of zero.
				if txn.nonce != 0 {
					return Err(ApplyError::InvalidTransaction(format!(
						"nonce mismatch: expected 0, got {}",
						txn.nonce
					)));
				}
				if !has_permission(state, sender, PERM_CREATE_ACCOUNT)? {
					return Err(permission_denied(sender, "create accounts"));
				}
				let global = state.must_get(GLOBAL_PERMISSIONS_ADDRESS)?;
				let mut entry = state.new_account(sender)?;
				entry.account.nonce = 1;
				entry.account.permissions = global.account.permissions.inherit();
				state.set_account(sender, entry);
				info!("created external account {:?}", sender);
				Ok(TxnOutcome::default())
			}
			Some(to) => {
				let mut sender_entry = state.must_get(sender)?;
				check_nonce(txn.nonce, &sender_entry.account)?;
				if !has_permission(state, sender, PERM_CREATE_ACCOUNT)? {
					return Err(permission_denied(sender, "create accounts"));
				}
				if state.get_account(to)?.is_some() {
					return Err(ApplyError::InvalidTransaction(format!(
						"account already exists: {:?}",
						to
					)));
				}
				let permissions = new_account_permissions(
					state,
					sender,
					&sender_entry.account.permissions,
					txn.permissions.as_ref(),
				)?;
				let mut entry = state.new_account(to)?;
				entry.account.permissions = permissions;
				state.set_account(to, entry);

				sender_entry.account.nonce += 1;
				state.set_account(sender, sender_entry);
				info!("created external account {:?} on behalf of {:?}", to, sender);
				Ok(TxnOutcome::default())
			}
		}
	}

	/// CreateContractAccount: store an empty entry at the derived
	/// address, run the creation bytecode, and assign its return value
	/// as the contract's code.
	fn create_contract_account<C: StateContext>(
		&mut self,
		state: &mut StateManager<'_, C>,
		sender: H160,
		txn: &CreateContractAccountTxn,
	) -> Result<TxnOutcome, ApplyError> {
		let mut sender_entry = state.must_get(sender)?;
		check_nonce(txn.nonce, &sender_entry.account)?;
		if !has_permission(state, sender, PERM_CREATE_CONTRACT)? {
			return Err(permission_denied(sender, "create contracts"));
		}
		let permissions = new_account_permissions(
			state,
			sender,
			&sender_entry.account.permissions,
			txn.permissions.as_ref(),
		)?;

		// Derived from the pre-increment nonce.
		let contract_addr = derive_contract_address(sender, sender_entry.account.nonce);
		let mut contract_entry = state.new_account(contract_addr)?;
		contract_entry.account.permissions = permissions;
		state.set_account(contract_addr, contract_entry);

		sender_entry.account.nonce += 1;
		state.set_account(sender, sender_entry);

		let output =
			self.run_vm(state, &txn.init, &[], txn.gas_limit, "contract creation failed")?;

		// The run's return value is the contract's code, assigned
		// exactly once, at the entry under the derived address.
		let mut contract_entry = state.must_get(contract_addr)?;
		contract_entry.account.code = output.return_value.clone();
		state.set_account(contract_addr, contract_entry);
		info!("created contract account {:?}", contract_addr);

		Ok(TxnOutcome {
			gas_used: txn.gas_limit.saturating_sub(output.gas_remaining),
			return_value: output.return_value,
			contract_address: Some(contract_addr),
		})
	}

	/// MessageCall: run the receiver's code on the supplied input.
	fn message_call<C: StateContext>(
		&mut self,
		state: &mut StateManager<'_, C>,
		sender: H160,
		txn: &MessageCallTxn,
	) -> Result<TxnOutcome, ApplyError> {
		let mut sender_entry = state.must_get(sender)?;
		check_nonce(txn.nonce, &sender_entry.account)?;
		if !has_permission(state, sender, PERM_CALL)? {
			return Err(permission_denied(sender, "call contracts"));
		}
		let receiver = state.must_get(txn.to)?;

		sender_entry.account.nonce += 1;
		state.set_account(sender, sender_entry);

		let output = self.run_vm(
			state,
			&receiver.account.code,
			&txn.data,
			txn.gas_limit,
			"message call failed",
		)?;
		debug!(
			"message call to {:?} used {} gas",
			txn.to,
			txn.gas_limit.saturating_sub(output.gas_remaining)
		);

		Ok(TxnOutcome {
			gas_used: txn.gas_limit.saturating_sub(output.gas_remaining),
			return_value: output.return_value,
			contract_address: None,
		})
	}

	/// SetPermissions: overwrite the target's mask pair wholesale.
	fn set_permissions<C: StateContext>(
		&mut self,
		state: &mut StateManager<'_, C>,
		sender: H160,
		txn: &SetPermissionsTxn,
	) -> Result<TxnOutcome, ApplyError> {
		let mut sender_entry = state.must_get(sender)?;
		check_nonce(txn.nonce, &sender_entry.account)?;
		if !has_permission(state, sender, PERM_ROOT)? {
			return Err(permission_denied(sender, "change permissions"));
		}

		sender_entry.account.nonce += 1;
		state.set_account(sender, sender_entry);

		// A root account may re-create the global permissions account
		// even when state has lost it; every other target must exist.
		let mut target = match state.get_account(txn.to)? {
			Some(entry) => entry,
			None if txn.to == GLOBAL_PERMISSIONS_ADDRESS => state.new_account(txn.to)?,
			None => {
				return Err(ApplyError::InvalidTransaction(format!(
					"account does not exist: {:?}",
					txn.to
				)))
			}
		};
		target.account.permissions = txn.permissions.clone();
		state.set_account(txn.to, target);
		info!("set permissions on {:?}", txn.to);
		Ok(TxnOutcome::default())
	}

	/// Run the interpreter and drain its LOG entries into validator
	/// events. Events fire only after a successful run, so a failed
	/// run leaves no trace.
	fn run_vm<C: StateContext>(
		&mut self,
		state: &mut StateManager<'_, C>,
		code: &[u8],
		input: &[u8],
		gas_limit: u64,
		failure: &str,
	) -> Result<VmOutput, ApplyError> {
		let config = exec_config(state.context())?;
		let (output, logs) = {
			let mut backend = StateBackend::new(state);
			let output = self
				.vm
				.execute(&mut backend, &config, code, input, gas_limit)
				.map_err(|err| ApplyError::InvalidTransaction(format!("{}: {}", failure, err)))?;
			(output, backend.into_logs())
		};
		for entry in &logs {
			emit_log_event(state, entry)?;
		}
		Ok(output)
	}
}

fn check_nonce(txn_nonce: u64, account: &EvmStateAccount) -> Result<(), ApplyError> {
	if txn_nonce == account.nonce {
		Ok(())
	} else {
		Err(ApplyError::InvalidTransaction(format!(
			"nonce mismatch: expected {}, got {}",
			account.nonce, txn_nonce
		)))
	}
}

fn permission_denied(addr: H160, action: &str) -> ApplyError {
	ApplyError::InvalidTransaction(format!("{:?} is not permitted to {}", addr, action))
}

/// Permissions for an account being created by `sender`: the explicit
/// mask pair when one is supplied (the creator must hold Root), the
/// creator's inherited permissions otherwise.
fn new_account_permissions<C: StateContext>(
	state: &mut StateManager<'_, C>,
	sender: H160,
	sender_perms: &EvmPermissions,
	explicit: Option<&EvmPermissions>,
) -> Result<EvmPermissions, ApplyError> {
	match explicit {
		Some(perms) => {
			if !has_permission(state, sender, PERM_ROOT)? {
				return Err(permission_denied(sender, "set permissions on new accounts"));
			}
			Ok(perms.clone())
		}
		None => Ok(sender_perms.inherit()),
	}
}
