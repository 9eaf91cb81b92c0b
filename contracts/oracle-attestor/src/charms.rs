//! Charms SDK Integration for the Oracle Attestor
//!
//! Bridges Charms transactions to the attestor's prepare/apply logic.
//!
//! ## UTXO Transformation Model
//!
//! ```text
//! Initialize:
//!   IN:  (none)
//!   OUT: [Attestor state charm (authority set, version 1)]
//!
//! VerifyPrice:
//!   IN:  [Attestor state charm]
//!   OUT: [Attestor state charm (authority unchanged, log + verified hash)]
//!
//! RotateAuthority:
//!   IN:  [Attestor state charm]
//!   OUT: [Attestor state charm (new authority, version + 1)]
//! ```
//!
//! The input charm plays the role of the state snapshot: the transaction
//! only validates if the call replayed against the input state produces
//! exactly the output state. The state charm carries the event log, so a
//! verified fact is readable from the output of the transaction that
//! committed it.

use charms_data::{App, Data, Transaction};
use tracing::warn;

use crate::{AttestorConfig, AttestorState, OracleAttestor};
use attestor_common::{
    authorization::Credentials,
    signature::PrivateKey,
    types::{DataRecord, PublicKey, Signature},
};

// ============ Operation Codes ============

/// Operation codes for attestor actions (encoded in witness)
pub mod op {
    /// Set the authority for the first time
    pub const INITIALIZE: u8 = 0x00;
    /// Verify an oracle-signed record
    pub const VERIFY_PRICE: u8 = 0x40;
    /// Replace the authority key
    pub const ROTATE_AUTHORITY: u8 = 0x41;
}

// ============ Witness Structures ============

/// Witness data for attestor operations
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttestorWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Deployment config (for Initialize)
    pub config: Option<AttestorConfig>,
    /// Initializing identity (for Initialize)
    pub initial_authority: Option<PrivateKey>,
    /// Record to verify (for VerifyPrice)
    pub record: Option<DataRecord>,
    /// Oracle signature over the record hash (for VerifyPrice)
    pub signature: Option<Signature>,
    /// Replacement key (for RotateAuthority)
    pub new_authority: Option<PublicKey>,
    /// Credentials for state edits (Initialize, RotateAuthority)
    pub credentials: Option<Credentials>,
}

impl AttestorWitness {
    fn empty(op: u8) -> Self {
        Self {
            op,
            config: None,
            initial_authority: None,
            record: None,
            signature: None,
            new_authority: None,
            credentials: None,
        }
    }

    /// Create witness for initialization
    pub fn initialize(config: AttestorConfig, key: PrivateKey, credentials: Credentials) -> Self {
        Self {
            config: Some(config),
            initial_authority: Some(key),
            credentials: Some(credentials),
            ..Self::empty(op::INITIALIZE)
        }
    }

    /// Create witness for price verification
    pub fn verify_price(record: DataRecord, signature: Signature) -> Self {
        Self {
            record: Some(record),
            signature: Some(signature),
            ..Self::empty(op::VERIFY_PRICE)
        }
    }

    /// Create witness for authority rotation
    pub fn rotate_authority(new_authority: PublicKey, credentials: Credentials) -> Self {
        Self {
            new_authority: Some(new_authority),
            credentials: Some(credentials),
            ..Self::empty(op::ROTATE_AUTHORITY)
        }
    }
}

// ============ Main Validation Function ============

/// Validates an attestor operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The attestor app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (unused)
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn validate_attestor_operation(app: &App, tx: &Transaction, _x: &Data, w: &Data) -> bool {
    let witness = match parse_witness(w) {
        Some(w) => w,
        None => return false,
    };

    let output_state = match extract_output_state(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // Initialize has no input state
    if witness.op == op::INITIALIZE {
        return validate_initialize(&witness, &output_state);
    }

    let input_state = match extract_input_state(app, tx) {
        Some(s) => s,
        None => return false,
    };

    let mut attestor = OracleAttestor::from_state(input_state);

    let ok = match witness.op {
        op::VERIFY_PRICE => match (&witness.record, &witness.signature) {
            (Some(record), Some(signature)) => attestor.verify_price(record, signature).is_ok(),
            _ => false,
        },
        // current authority must sign; see `OracleAttestor::prepare_rotate_authority`
        op::ROTATE_AUTHORITY => match (&witness.new_authority, &witness.credentials) {
            (Some(key), Some(creds)) => attestor.rotate_authority(key, creds).is_ok(),
            _ => false,
        },
        other => {
            warn!(op = other, "unknown attestor operation");
            false
        }
    };

    ok && attestor.state() == output_state
}

/// Validate initialization of the attestor
fn validate_initialize(witness: &AttestorWitness, output: &AttestorState) -> bool {
    let (config, key, creds) = match (&witness.config, &witness.initial_authority, &witness.credentials) {
        (Some(config), Some(key), Some(creds)) => (config, key, creds),
        _ => return false,
    };

    let mut attestor = OracleAttestor::deploy(*config);
    if attestor.init(key, creds).is_err() {
        return false;
    }

    attestor.state() == *output
}

// ============ Parsing Functions ============

/// Parse witness data into AttestorWitness
fn parse_witness(w: &Data) -> Option<AttestorWitness> {
    w.value::<AttestorWitness>().ok()
}

// ============ State Extraction ============

/// Extract the attestor state being spent
fn extract_input_state(app: &App, tx: &Transaction) -> Option<AttestorState> {
    tx.ins.iter().find_map(|(_, charms)| {
        charms.get(app).and_then(|data| data.value::<AttestorState>().ok())
    })
}

/// Extract the attestor state being created
fn extract_output_state(app: &App, tx: &Transaction) -> Option<AttestorState> {
    tx.outs.iter().find_map(|charms| {
        charms.get(app).and_then(|data| data.value::<AttestorState>().ok())
    })
}

/// Read the attestor state from reference inputs
///
/// Lets other apps learn the current authority without spending the charm.
pub fn read_attestor_state_from_refs(tx: &Transaction, attestor_app: &App) -> Option<AttestorState> {
    for (_, charms) in tx.refs.iter() {
        if let Some(data) = charms.get(attestor_app) {
            if let Ok(state) = data.value::<AttestorState>() {
                return Some(state);
            }
        }
    }
    None
}

// ============ Tests ============
