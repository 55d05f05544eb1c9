//! Read-only view of the block-info transaction family.
//!
//! The block-info injector writes a config record and one record per
//! recent block into its own namespace. The processor consumes them to
//! populate the interpreter's execution parameters; when they are
//! missing, block-dependent opcodes degrade to zero values instead of
//! failing the transaction.

use codec::Decode;
use log::debug;
use primitive_types::H256;
use sha3::{Digest, Keccak256};

use crate::addresses::{block_info_address, BLOCK_INFO_CONFIG_ADDRESS};
use crate::context::StateContext;
use crate::error::StateError;
use crate::evm::ExecConfig;
use crate::handler::GAS_LIMIT;
use crate::messages::{BlockInfo, BlockInfoConfig};

fn decode_at<M: Decode>(address: &str, bytes: &[u8]) -> Result<M, StateError> {
	M::decode(&mut &bytes[..]).map_err(|err| StateError::Codec {
		address: address.into(),
		message: err.what().into(),
	})
}

/// Load the block-info family's config record, if it has written one.
pub fn get_block_info_config<C: StateContext>(
	context: &C,
) -> Result<Option<BlockInfoConfig>, StateError> {
	match context.get_state_entry(BLOCK_INFO_CONFIG_ADDRESS)? {
		Some(bytes) => Ok(Some(decode_at(BLOCK_INFO_CONFIG_ADDRESS, &bytes)?)),
		None => Ok(None),
	}
}

/// Load the block-info record for `block_num`, if present.
pub fn get_block_info<C: StateContext>(
	context: &C,
	block_num: u64,
) -> Result<Option<BlockInfo>, StateError> {
	let address = block_info_address(block_num);
	match context.get_state_entry(&address)? {
		Some(bytes) => Ok(Some(decode_at(&address, &bytes)?)),
		None => Ok(None),
	}
}

/// A block's EVM-visible hash: the Keccak-256 digest of its header
/// signature string.
pub fn block_hash_from_signature(header_signature: &str) -> H256 {
	H256::from_slice(Keccak256::digest(header_signature.as_bytes()).as_slice())
}

/// Execution parameters for one interpreter run, zero-initialized when
/// the block-info family has not populated state yet.
pub fn exec_config<C: StateContext>(context: &C) -> Result<ExecConfig, StateError> {
	let mut config = ExecConfig {
		block_height: 0,
		block_hash: H256::zero(),
		block_time: 0,
		gas_limit: GAS_LIMIT,
	};
	let info = match get_block_info_config(context)? {
		Some(block_config) => get_block_info(context, block_config.latest_block)?,
		None => None,
	};
	match info {
		Some(info) => {
			config.block_height = info.block_num;
			config.block_hash = block_hash_from_signature(&info.header_signature);
			config.block_time = info.timestamp;
		}
		None => debug!("no block info available; execution parameters zeroed"),
	}
	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::MemoryContext;
	use codec::Encode;

	#[test]
	fn missing_block_info_yields_zeroed_parameters() {
		let context = MemoryContext::new();
		let config = exec_config(&context).unwrap();
		assert_eq!(config.block_height, 0);
		assert_eq!(config.block_hash, H256::zero());
		assert_eq!(config.block_time, 0);
		assert_eq!(config.gas_limit, GAS_LIMIT);
	}

	#[test]
	fn present_block_info_populates_parameters() {
		let mut context = MemoryContext::new();
		context
			.set_state_entry(
				BLOCK_INFO_CONFIG_ADDRESS.into(),
				BlockInfoConfig {
					latest_block: 12,
					oldest_block: 1,
					target_count: 256,
					sync_tolerance: 5,
				}
				.encode(),
			)
			.unwrap();
		context
			.set_state_entry(
				block_info_address(12),
				BlockInfo {
					block_num: 12,
					previous_block_id: "prev".into(),
					signer_public_key: "key".into(),
					header_signature: "sig".into(),
					timestamp: 1_600_000_000,
				}
				.encode(),
			)
			.unwrap();

		let config = exec_config(&context).unwrap();
		assert_eq!(config.block_height, 12);
		assert_eq!(config.block_time, 1_600_000_000);
		assert_eq!(config.block_hash, block_hash_from_signature("sig"));
	}

	#[test]
	fn config_without_matching_block_yields_zeroed_parameters() {
		let mut context = MemoryContext::new();
		context
			.set_state_entry(
				BLOCK_INFO_CONFIG_ADDRESS.into(),
				BlockInfoConfig {
					latest_block: 99,
					oldest_block: 1,
					target_count: 256,
					sync_tolerance: 5,
				}
				.encode(),
			)
			.unwrap();
		let config = exec_config(&context).unwrap();
		assert_eq!(config.block_height, 0);
		assert_eq!(config.block_hash, H256::zero());
	}

	#[test]
	fn block_hash_is_deterministic_and_signature_bound() {
		assert_eq!(
			block_hash_from_signature("aabbcc"),
			block_hash_from_signature("aabbcc")
		);
		assert_ne!(
			block_hash_from_signature("aabbcc"),
			block_hash_from_signature("aabbcd")
		);
		assert_ne!(block_hash_from_signature("aabbcc"), H256::zero());
	}
}
