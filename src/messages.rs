//! Wire messages.
//!
//! The encoded forms here are the fixed format shared with the seth
//! client and RPC gateway; layouts must not change without a family
//! version bump. All messages round-trip through SCALE.

use codec::{Decode, Encode, Error as CodecError, Input, Output};
use primitive_types::H160;

/// Bitmask pair controlling what an account may do. `set_bit` marks
/// which flags the account governs; `perms` holds the governed values.
/// Flags not governed locally are answered by the global permissions
/// account.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvmPermissions {
	pub perms: u64,
	pub set_bit: u64,
}

/// The account record stored inside an [`EvmEntry`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvmStateAccount {
	/// 20-byte EVM address. Short values read back from state are
	/// left-padded with zeros.
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub address: Vec<u8>,
	pub balance: u64,
	/// Contract bytecode, empty for external accounts. Assigned once
	/// at creation and immutable afterwards.
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub code: Vec<u8>,
	pub nonce: u64,
	pub permissions: EvmPermissions,
}

/// One storage pair. Keys compare equal after left-padding to 32
/// bytes; an entry never holds two pairs with the same padded key.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvmStorage {
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub key: Vec<u8>,
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub value: Vec<u8>,
}

/// The single value stored at an account's state address: the account
/// record plus its full storage map.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvmEntry {
	pub account: EvmStateAccount,
	pub storage: Vec<EvmStorage>,
}

/// Block record written by the block-info family.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockInfo {
	pub block_num: u64,
	pub previous_block_id: String,
	pub signer_public_key: String,
	pub header_signature: String,
	pub timestamp: u64,
}

/// Config record written by the block-info family.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockInfoConfig {
	pub latest_block: u64,
	pub oldest_block: u64,
	pub target_count: u64,
	pub sync_tolerance: u64,
}

/// Body of a `CreateExternalAccount` transaction. An unset `to` is the
/// sender's own bootstrap.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreateExternalAccountTxn {
	pub to: Option<H160>,
	pub nonce: u64,
	pub permissions: Option<EvmPermissions>,
}

/// Body of a `CreateContractAccount` transaction.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreateContractAccountTxn {
	/// Contract creation bytecode; its return value becomes the new
	/// contract's code.
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub init: Vec<u8>,
	pub gas_limit: u64,
	pub nonce: u64,
	pub permissions: Option<EvmPermissions>,
}

/// Body of a `MessageCall` transaction.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageCallTxn {
	pub to: H160,
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub data: Vec<u8>,
	pub gas_limit: u64,
	pub nonce: u64,
}

/// Body of a `SetPermissions` transaction. The target's mask pair is
/// overwritten wholesale.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetPermissionsTxn {
	pub to: H160,
	pub permissions: EvmPermissions,
	pub nonce: u64,
}

/// A seth transaction, one of four operations.
///
/// The wire tag is part of the shared format: 1 = CreateExternalAccount,
/// 2 = MessageCall, 3 = CreateContractAccount, 4 = SetPermissions. Any
/// other tag is a decode error, never silently skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SethTransaction {
	CreateExternalAccount(CreateExternalAccountTxn),
	MessageCall(MessageCallTxn),
	CreateContractAccount(CreateContractAccountTxn),
	SetPermissions(SetPermissionsTxn),
}

impl Encode for SethTransaction {
	fn encode_to<T: Output>(&self, dest: &mut T) {
		match self {
			SethTransaction::CreateExternalAccount(txn) => {
				dest.push_byte(1);
				txn.encode_to(dest);
			}
			SethTransaction::MessageCall(txn) => {
				dest.push_byte(2);
				txn.encode_to(dest);
			}
			SethTransaction::CreateContractAccount(txn) => {
				dest.push_byte(3);
				txn.encode_to(dest);
			}
			SethTransaction::SetPermissions(txn) => {
				dest.push_byte(4);
				txn.encode_to(dest);
			}
		}
	}
}

impl Decode for SethTransaction {
	fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
		match input.read_byte()? {
			1 => Ok(SethTransaction::CreateExternalAccount(Decode::decode(input)?)),
			2 => Ok(SethTransaction::MessageCall(Decode::decode(input)?)),
			3 => Ok(SethTransaction::CreateContractAccount(Decode::decode(input)?)),
			4 => Ok(SethTransaction::SetPermissions(Decode::decode(input)?)),
			_ => Err("unknown seth transaction type".into()),
		}
	}
}

/// Receipt attached to every successful transaction.
#[derive(Clone, Debug, Default, Eq, PartialEq, Encode, Decode)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SethTransactionReceipt {
	/// Set only by contract creation.
	pub contract_address: Option<H160>,
	pub gas_used: u64,
	#[cfg_attr(feature = "with-serde", serde(with = "serde_bytes"))]
	pub return_value: Vec<u8>,
}
