//! Oracle Attestor - Charms App Entry Point
//!
//! Spends and re-creates the attestor state charm. The charm holds the
//! authority key, its version and the log of verified price hashes.
//!
//! ## Operations
//!
//! - **Initialize**: authority set once, signed by the initializing identity
//! - **VerifyPrice**: the output log gains the hash the authority signed
//! - **RotateAuthority**: new key, signed by the outgoing authority
//!
//! ## Reading Without Spending
//!
//! Apps that only need to know which key is trusted, or whether a hash was
//! attested, put the state charm in `refs` and decode it with
//! `oracle_attestor::charms::read_attestor_state_from_refs`.

use charms_sdk::data::{App, Data, Transaction};

/// Replays the witnessed call against the input state charm
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    oracle_attestor::charms::validate_attestor_operation(app, tx, x, w)
}

charms_sdk::main!(app_contract);
