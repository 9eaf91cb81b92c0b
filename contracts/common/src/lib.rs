//! Oracle Attestor Common Library
//!
//! Shared types, primitives and state machinery for the oracle attestor.
//!
//! ## Protocol Building Blocks
//!
//! - **Canonical Hasher**: ordered field elements to one field element
//! - **Signature Scheme**: Ed25519 verify/sign over field-element messages
//! - **Authorization Policy**: proof-or-signature gate producing write grants
//! - **Authority Cell**: versioned single-key state with compare-on-read
//! - **Staged Effects**: all-or-nothing commit of state writes and events
//! - **Event Log**: append-only record of verified facts
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec and String for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{string::String, vec::Vec};
#[cfg(feature = "std")]
pub use std::{string::String, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod hasher;
pub mod signature;
pub mod authorization;
pub mod state;
pub mod effects;
pub mod events;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use signature::*;
pub use authorization::*;
pub use state::*;
pub use effects::*;
pub use events::*;
