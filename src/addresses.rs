//! Address derivation and namespace layout.
//!
//! Maps 20-byte EVM addresses onto the validator's 70-character state
//! addresses and derives contract addresses from (creator, nonce).

use primitive_types::{H160, H256};
use rlp::RlpStream;
use sha2::Sha512;
use sha3::{Digest, Keccak256};

/// Hex characters in a transaction family namespace prefix.
const PREFIX_LEN: usize = 6;

/// Suffix padding a seth state address out to the full 70 characters.
const ADDRESS_TAIL: &str = "000000000000000000000000";

/// Namespace of the block-info transaction family, consumed read-only.
pub const BLOCK_INFO_NAMESPACE: &str = "00b10c";

/// State address of the block-info family's config record.
pub const BLOCK_INFO_CONFIG_ADDRESS: &str =
	"00b10c0100000000000000000000000000000000000000000000000000000000000000";

lazy_static! {
	static ref SETH_NAMESPACE: String =
		hex::encode(&Sha512::digest(b"seth").as_slice()[..PREFIX_LEN / 2]);
}

/// The seth namespace prefix, the first six hex characters of
/// `SHA-512("seth")`.
pub fn seth_namespace() -> &'static str {
	&SETH_NAMESPACE
}

/// The 70-character state address an account is stored under:
/// prefix, then the hex form of the EVM address, then zero padding.
pub fn namespace_address(addr: H160) -> String {
	format!("{}{}{}", seth_namespace(), hex::encode(addr), ADDRESS_TAIL)
}

/// EVM address of an external account: the last 20 bytes of the
/// Keccak-256 digest of its signer public key.
pub fn evm_addr_from_public_key(public_key: &[u8]) -> H160 {
	let hash = Keccak256::digest(public_key);
	H160::from_slice(&hash.as_slice()[12..])
}

/// Address a contract is created at:
/// `KECCAK256(RLP([creator, nonce]))[12..]`, with the creator's nonce
/// taken before its post-transaction increment.
pub fn derive_contract_address(creator: H160, nonce: u64) -> H160 {
	let mut stream = RlpStream::new_list(2);
	stream.append(&creator.as_bytes().to_vec());
	stream.append(&nonce);
	let hash = Keccak256::digest(&stream.out()[..]);
	H160::from_slice(&hash.as_slice()[12..])
}

/// State address of the block-info record for `block_num`.
pub fn block_info_address(block_num: u64) -> String {
	format!("{}00{:062x}", BLOCK_INFO_NAMESPACE, block_num)
}

/// Left-pad to a 20-byte address. Longer input keeps its trailing
/// bytes.
pub fn left_pad20(bytes: &[u8]) -> H160 {
	let mut out = H160::zero();
	let n = bytes.len().min(20);
	out.as_bytes_mut()[20 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
	out
}

/// Left-pad to a 32-byte word. Longer input keeps its trailing bytes.
pub fn left_pad32(bytes: &[u8]) -> H256 {
	let mut out = H256::zero();
	let n = bytes.len().min(32);
	out.as_bytes_mut()[32 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
	out
}
