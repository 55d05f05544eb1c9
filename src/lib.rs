//! Seth transaction processor core.
//!
//! The deterministic state-transition function behind the `seth`
//! transaction family: Ethereum-style accounts and contracts stored in
//! a Hyperledger Sawtooth validator's namespaced key/value state.
//!
//! The processor borrows a validator context for the duration of one
//! transaction, decodes the payload into one of four operations,
//! enforces nonce and permission invariants, and drives the embedded
//! EVM interpreter through the [`evm::EvmBackend`] callback surface.
//! Every validator replaying the same transaction sequence produces
//! bit-identical state.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
extern crate lazy_static;

pub mod addresses;
pub mod block_info;
pub mod context;
pub mod error;
pub mod evm;
pub mod handler;
pub mod messages;
pub mod permissions;
pub mod state;

pub use primitive_types::{H160, H256};

pub use crate::error::{ApplyError, ContextError, StateError, VmError};
pub use crate::handler::{
	SethTransactionHandler, TxnRequest, GAS_LIMIT, SETH_FAMILY_NAME, SETH_FAMILY_VERSION,
};
