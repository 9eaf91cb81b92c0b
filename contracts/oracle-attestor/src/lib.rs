//! Oracle Attestor Contract
//!
//! Holds the public key of a trusted price oracle and turns oracle-signed
//! data records into verified facts. A record is accepted only if its
//! signature verifies against the authority key in effect when the call
//! lands; accepted records append one event to the log, rejected ones leave
//! no trace.
//!
//! ## Call Lifecycle
//!
//! Every entry point runs in two phases:
//!
//! ```text
//! prepare_*  : read state snapshot, check credentials / signature,
//!              stage effects                  (no mutation, &self)
//! apply      : re-assert snapshot == live state, commit staged effects
//!                                             (all-or-nothing, &mut self)
//! ```
//!
//! `init`, `verify_price` and `rotate_authority` run both phases back to
//! back. Calls prepared concurrently against the same snapshot only commit
//! if nothing moved the authority state in between. A prepared call is only
//! accepted by an instance with the same configuration and primitives as
//! the one that prepared it.
//!
//! ## Authority Rotation
//!
//! Rotation passes the edit-state policy and, in addition, always needs a
//! direct signature from the current authority. A proof alone never moves
//! the trusted key.
//!
//! ## Charms Integration
//!
//! When compiled with the `charms` feature, this crate provides a Charms
//! app entry point via the `charms` module.

use core::marker::PhantomData;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[cfg(feature = "charms")]
pub mod charms;

use attestor_common::{
    authorization::{
        require_signature, AuthorizationPolicy, CallCommitment, Credentials,
        DigestProofVerifier, MethodId, ProofVerifier,
    },
    effects::{CommitReceipt, StagedEffects},
    errors::{AttestorError, AttestorResult},
    events::{EventLog, VerifiedFactEvent},
    signature::{Ed25519Scheme, PrivateKey, SignatureScheme},
    state::{AuthorityCell, Precondition},
    types::{DataRecord, FieldElement, PublicKey, Signature},
};


// ============ Configuration ============

/// How strictly `price` and `token` are tied to the signed hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum CommitmentBinding {
    /// The upstream collaborator is trusted to have hashed price and token
    /// into `data_hash`; they are carried for observability only
    #[default]
    Trusted,
    /// The hash must equal the canonical commitment to price and token
    RecordBound,
}

/// Deployment-time configuration, fixed for the lifetime of the instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AttestorConfig {
    pub policy: AuthorizationPolicy,
    pub binding: CommitmentBinding,
}

// ============ Persistent State ============

/// Everything that outlives a call
///
/// This is what a Charms state charm carries, so the verified facts of a
/// transaction are readable from its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AttestorState {
    pub config: AttestorConfig,
    pub authority: AuthorityCell,
    pub events: EventLog,
}

// ============ Prepared Calls ============

/// A checked call whose effects have not landed yet
///
/// Typed by the primitives it was checked with and stamped with the
/// configuration whose policy authorized it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall<S = Ed25519Scheme, P = DigestProofVerifier> {
    method: MethodId,
    config: AttestorConfig,
    precondition: Precondition,
    effects: StagedEffects,
    primitives: PhantomData<fn() -> (S, P)>,
}

impl<S, P> PreparedCall<S, P> {
    fn new(method: MethodId, config: AttestorConfig, precondition: Precondition, effects: StagedEffects) -> Self {
        Self { method, config, precondition, effects, primitives: PhantomData }
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    /// State the call expects to find when applied
    pub fn precondition(&self) -> &Precondition {
        &self.precondition
    }

    pub fn effects(&self) -> &StagedEffects {
        &self.effects
    }

    /// Configuration the call was authorized under
    pub fn config(&self) -> &AttestorConfig {
        &self.config
    }
}

// ============ Attestor ============

/// One deployed oracle attestor
#[derive(Debug, Clone)]
pub struct OracleAttestor<S = Ed25519Scheme, P = DigestProofVerifier> {
    authority: AuthorityCell,
    events: EventLog,
    config: AttestorConfig,
    scheme: S,
    proofs: P,
}

impl OracleAttestor {
    /// Deploy with the bundled Ed25519 scheme and digest proof verifier
    pub fn deploy(config: AttestorConfig) -> Self {
        Self::with_primitives(config, Ed25519Scheme, DigestProofVerifier)
    }

    /// Rebuild an instance from persisted state
    pub fn from_state(state: AttestorState) -> Self {
        Self {
            authority: state.authority,
            events: state.events,
            config: state.config,
            scheme: Ed25519Scheme,
            proofs: DigestProofVerifier,
        }
    }
}

impl<S: SignatureScheme, P: ProofVerifier> OracleAttestor<S, P> {
    /// Deploy with caller-supplied primitives
    pub fn with_primitives(config: AttestorConfig, scheme: S, proofs: P) -> Self {
        debug!(?config, "attestor deployed");
        Self {
            authority: AuthorityCell::new(),
            events: EventLog::new(),
            config,
            scheme,
            proofs,
        }
    }

    // ============ Initialization ============

    /// Stage the one-time authority initialization
    ///
    /// The write must pass the edit-state policy, and independently of the
    /// policy the initializing identity must sign the init call.
    ///
    /// # Errors
    /// - `AlreadyInitialized` if the authority is set
    /// - `Unauthorized` / `MissingSignature` / `MalformedSignature` on bad credentials
    pub fn prepare_init(
        &self,
        initial_authority: &PrivateKey,
        credentials: &Credentials,
    ) -> AttestorResult<PreparedCall<S, P>> {
        if self.authority.is_initialized() {
            return Err(AttestorError::AlreadyInitialized);
        }

        let key = initial_authority.public_key();
        let call = CallCommitment::init(&key);

        let grant = self.config.policy.authorize_edit_state(
            &call,
            credentials,
            &key,
            &self.scheme,
            &self.proofs,
        )?;
        require_signature(&call, credentials, &key, &self.scheme)?;

        let mut effects = StagedEffects::new();
        effects.write_authority(key, grant);

        Ok(PreparedCall::new(MethodId::Init, self.config, Precondition::Uninitialized, effects))
    }

    /// Initialize the authority to the key derived from `initial_authority`
    pub fn init(
        &mut self,
        initial_authority: &PrivateKey,
        credentials: &Credentials,
    ) -> AttestorResult<PublicKey> {
        let prepared = self
            .prepare_init(initial_authority, credentials)
            .map_err(|e| rejected(MethodId::Init, e))?;
        self.apply(prepared)?;

        let key = self.authority.get()?;
        info!(authority = %key, "authority initialized");
        Ok(key)
    }

    // ============ Verification ============

    /// Stage a price verification
    ///
    /// 1. Read the authority snapshot.
    /// 2. Assert the live state still equals it (repeated by [`apply`]).
    /// 3. Verify `signature` over `[data_hash]` under the snapshot key.
    /// 4. Reject on failure; nothing is staged.
    /// 5. Stage one verified-fact event for `data_hash`.
    ///
    /// # Errors
    /// - `MalformedSignature` before any other work
    /// - `UninitializedState` if no authority is set
    /// - `CommitmentMismatch` under [`CommitmentBinding::RecordBound`]
    /// - `InvalidSignature` if the signature does not verify
    ///
    /// [`apply`]: Self::apply
    pub fn prepare_verify_price(
        &self,
        record: &DataRecord,
        signature: &Signature,
    ) -> AttestorResult<PreparedCall<S, P>> {
        signature.check_well_formed()?;

        let expected = self.authority.snapshot()?;
        self.authority.assert_equals(&expected)?;

        if self.config.binding == CommitmentBinding::RecordBound && !record.is_bound() {
            return Err(AttestorError::CommitmentMismatch);
        }

        if !self.scheme.verify(&expected.key, &[record.data_hash], signature)? {
            return Err(AttestorError::InvalidSignature);
        }

        let mut effects = StagedEffects::new();
        effects.emit_fact(record.data_hash);

        Ok(PreparedCall::new(
            MethodId::VerifyPrice,
            self.config,
            Precondition::Matches(expected),
            effects,
        ))
    }

    /// Verify an oracle-signed record and log it as a verified fact
    pub fn verify_price(
        &mut self,
        record: &DataRecord,
        signature: &Signature,
    ) -> AttestorResult<VerifiedFactEvent> {
        let prepared = self
            .prepare_verify_price(record, signature)
            .map_err(|e| rejected(MethodId::VerifyPrice, e))?;
        let receipt = self.apply(prepared)?;

        let event = receipt.events.first().copied().ok_or(AttestorError::Internal {
            reason: "verification committed no event",
        })?;

        info!(
            token = %record.token,
            price = record.price.scaled(),
            hash = %event.hash,
            sequence = event.sequence,
            "price attestation verified"
        );
        Ok(event)
    }

    // ============ Authority Rotation ============

    /// Commitment a rotation to `new_key` must be authorized over
    pub fn rotation_call(&self, new_key: &PublicKey) -> AttestorResult<CallCommitment> {
        let current = self.authority.snapshot()?;
        Ok(CallCommitment::rotate(&current.key, new_key, current.version))
    }

    /// Stage a rotation of the authority key
    ///
    /// The write must pass the edit-state policy, and independently of the
    /// policy the current authority must sign the rotation call.
    ///
    /// # Errors
    /// - `InvalidPublicKey` if `new_key` is unusable
    /// - `UninitializedState` if no authority is set
    /// - `Unauthorized` / `MissingSignature` / `MalformedSignature` on bad credentials
    pub fn prepare_rotate_authority(
        &self,
        new_key: &PublicKey,
        credentials: &Credentials,
    ) -> AttestorResult<PreparedCall<S, P>> {
        self.scheme.validate_key(new_key)?;

        let current = self.authority.snapshot()?;
        let call = CallCommitment::rotate(&current.key, new_key, current.version);

        let grant = self.config.policy.authorize_edit_state(
            &call,
            credentials,
            &current.key,
            &self.scheme,
            &self.proofs,
        )?;
        require_signature(&call, credentials, &current.key, &self.scheme)?;

        let mut effects = StagedEffects::new();
        effects.write_authority(*new_key, grant);

        Ok(PreparedCall::new(
            MethodId::RotateAuthority,
            self.config,
            Precondition::Matches(current),
            effects,
        ))
    }

    /// Replace the authority key; returns the new state version
    pub fn rotate_authority(
        &mut self,
        new_key: &PublicKey,
        credentials: &Credentials,
    ) -> AttestorResult<u64> {
        let prepared = self
            .prepare_rotate_authority(new_key, credentials)
            .map_err(|e| rejected(MethodId::RotateAuthority, e))?;
        let receipt = self.apply(prepared)?;

        info!(authority = %new_key, version = receipt.version, "authority rotated");
        Ok(receipt.version)
    }

    // ============ Commit ============

    /// Re-check a prepared call's precondition and commit its effects
    ///
    /// # Errors
    /// - `StaleState` if the authority moved since the call was prepared
    /// - `AlreadyInitialized` if an init lost the race to another init
    /// - `ForeignCall` if the call was prepared under another configuration
    pub fn apply(&mut self, call: PreparedCall<S, P>) -> AttestorResult<CommitReceipt> {
        let method = call.method;
        if call.config != self.config {
            return Err(rejected(method, AttestorError::ForeignCall));
        }
        call.effects
            .commit(&call.precondition, &mut self.authority, &mut self.events)
            .map_err(|e| rejected(method, e))
    }

    // ============ Queries ============

    /// Current authority key
    pub fn authority(&self) -> AttestorResult<PublicKey> {
        self.authority.get()
    }

    /// Number of committed authority writes
    pub fn authority_version(&self) -> u64 {
        self.authority.version()
    }

    pub fn is_initialized(&self) -> bool {
        self.authority.is_initialized()
    }

    pub fn config(&self) -> &AttestorConfig {
        &self.config
    }

    /// Persistable snapshot of config, authority and verified facts
    pub fn state(&self) -> AttestorState {
        AttestorState {
            config: self.config,
            authority: self.authority.clone(),
            events: self.events.clone(),
        }
    }

    /// All verified facts, oldest first
    pub fn events(&self) -> &[VerifiedFactEvent] {
        self.events.events()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Facts with `sequence >= from`
    pub fn events_since(&self, from: u64) -> &[VerifiedFactEvent] {
        self.events.since(from)
    }

    /// True if `hash` was ever verified
    pub fn contains_fact(&self, hash: &FieldElement) -> bool {
        self.events.find(hash).is_some()
    }
}

fn rejected(method: MethodId, err: AttestorError) -> AttestorError {
    warn!(?method, code = err.code(), retryable = err.is_retryable(), "call rejected: {}", err);
    err
}

// ============ Tests ============
