//! Authorization Policy
//!
//! Gate evaluated before any authority state write. A call is authorized
//! either by a proof that the approved code path ran over exactly this call's
//! public input, or by a direct signature over the call commitment from the
//! identity that owns the state.
//!
//! The outcome of a successful check is an [`AuthorizationGrant`]. Grants can
//! only be minted by this module and [`AuthorityCell::set`] requires one, so
//! every write has passed some policy. Which policy is up to the caller: a
//! grant does not record the configuration that minted it.
//!
//! [`DigestProofVerifier`] stands in for a real proof system. Its "proofs"
//! can be computed by anyone from public data, so callers that must not be
//! overridden by a proof alone pair the policy with [`require_signature`].
//!
//! [`AuthorityCell::set`]: crate::state::AuthorityCell::set

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::domain;
use crate::errors::{AttestorError, AttestorResult};
use crate::hasher::hash_fields_with_domain;
use crate::signature::{PrivateKey, SignatureScheme};
use crate::types::{FieldElement, PublicKey, Signature};
use crate::Vec;

// ============================================================================
// Types
// ============================================================================

/// How a state-changing call proved it was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AuthorizationMode {
    /// A succinct proof that the approved code path executed
    ProofOfCorrectExecution,
    /// A signature from the identity that owns the state
    DirectSignature,
}

/// Required authorization for a class of state edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Permission {
    /// Only a proof of correct execution
    Proof,
    /// Only a direct signature
    Signature,
    /// Either mode
    #[default]
    ProofOrSignature,
    /// Nothing can authorize the edit
    Impossible,
}

impl Permission {
    /// Check whether `mode` satisfies this permission
    pub fn accepts(&self, mode: AuthorizationMode) -> bool {
        match (self, mode) {
            (Permission::ProofOrSignature, _) => true,
            (Permission::Proof, AuthorizationMode::ProofOfCorrectExecution) => true,
            (Permission::Signature, AuthorizationMode::DirectSignature) => true,
            _ => false,
        }
    }
}

/// State-changing entry points, bound into every call commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum MethodId {
    Init = 0x01,
    VerifyPrice = 0x02,
    RotateAuthority = 0x03,
}

impl MethodId {
    pub fn to_field(self) -> FieldElement {
        FieldElement::from_u64(self as u64)
    }
}

/// What a credential attests to: a method and its public input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CallCommitment {
    pub method: MethodId,
    pub public_input: Vec<FieldElement>,
}

impl CallCommitment {
    pub fn new(method: MethodId, public_input: Vec<FieldElement>) -> Self {
        Self { method, public_input }
    }

    /// Commitment for initializing the authority to `key`
    pub fn init(key: &PublicKey) -> Self {
        Self::new(MethodId::Init, [key.to_field()].to_vec())
    }

    /// Commitment for rotating `current` (at `version`) to `next`
    pub fn rotate(current: &PublicKey, next: &PublicKey, version: u64) -> Self {
        Self::new(
            MethodId::RotateAuthority,
            [current.to_field(), next.to_field(), FieldElement::from_u64(version)].to_vec(),
        )
    }

    /// Single-element digest, the message signed by a direct signature
    pub fn digest(&self) -> FieldElement {
        let mut fields = Vec::with_capacity(1 + self.public_input.len());
        fields.push(self.method.to_field());
        fields.extend_from_slice(&self.public_input);
        hash_fields_with_domain(domain::CALL_COMMITMENT, &fields)
    }
}

/// Opaque proof of correct execution
///
/// Internals of the proof system are out of scope; the attestor only sees
/// the method the proof claims to cover and a digest of its public input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ExecutionProof {
    pub method: MethodId,
    pub public_input_digest: FieldElement,
}

impl ExecutionProof {
    /// Produce the proof for `call` (proofs-disabled local mode)
    pub fn for_call(call: &CallCommitment) -> Self {
        Self { method: call.method, public_input_digest: call.digest() }
    }
}

/// Checks execution proofs against the call they claim to cover
pub trait ProofVerifier {
    fn verify(&self, proof: &ExecutionProof, call: &CallCommitment) -> bool;
}

/// Recomputes the call digest and compares it with the proof
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestProofVerifier;

impl ProofVerifier for DigestProofVerifier {
    fn verify(&self, proof: &ExecutionProof, call: &CallCommitment) -> bool {
        proof.method == call.method && proof.public_input_digest == call.digest()
    }
}

/// Credentials accompanying a state-changing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Credentials {
    pub proof: Option<ExecutionProof>,
    pub signature: Option<Signature>,
}

impl Credentials {
    /// No credentials at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Proof only
    pub fn proven(call: &CallCommitment) -> Self {
        Self { proof: Some(ExecutionProof::for_call(call)), signature: None }
    }

    /// Direct signature only
    pub fn signed(key: &PrivateKey, call: &CallCommitment) -> Self {
        Self { proof: None, signature: Some(key.sign(&[call.digest()])) }
    }

    /// Add a direct signature to existing credentials
    pub fn with_signature(mut self, key: &PrivateKey, call: &CallCommitment) -> Self {
        self.signature = Some(key.sign(&[call.digest()]));
        self
    }
}

/// Proof that a specific call passed the policy
///
/// Fields are private; only [`AuthorizationPolicy`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    mode: AuthorizationMode,
    method: MethodId,
}

impl AuthorizationGrant {
    pub fn mode(&self) -> AuthorizationMode {
        self.mode
    }

    pub fn method(&self) -> MethodId {
        self.method
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Authorization configuration, fixed at deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AuthorizationPolicy {
    /// Required to write the authority state
    pub edit_state: Permission,
}

impl AuthorizationPolicy {
    /// Proof-or-signature for state edits
    pub const fn proof_or_signature() -> Self {
        Self { edit_state: Permission::ProofOrSignature }
    }

    /// Authorize a write of the authority state
    ///
    /// Tries the proof first, then the direct signature, which must verify
    /// against `signer` over the call digest.
    ///
    /// # Errors
    /// - `Unauthorized` if no supplied credential satisfies `edit_state`
    /// - `MalformedSignature` if a supplied signature is structurally invalid
    pub fn authorize_edit_state<S, P>(
        &self,
        call: &CallCommitment,
        credentials: &Credentials,
        signer: &PublicKey,
        scheme: &S,
        proofs: &P,
    ) -> AttestorResult<AuthorizationGrant>
    where
        S: SignatureScheme,
        P: ProofVerifier,
    {
        let permission = self.edit_state;

        if permission.accepts(AuthorizationMode::ProofOfCorrectExecution) {
            if let Some(proof) = &credentials.proof {
                if proofs.verify(proof, call) {
                    debug!(method = ?call.method, "authorized by proof");
                    return Ok(AuthorizationGrant {
                        mode: AuthorizationMode::ProofOfCorrectExecution,
                        method: call.method,
                    });
                }
            }
        }

        if permission.accepts(AuthorizationMode::DirectSignature) {
            if let Some(signature) = &credentials.signature {
                if scheme.verify(signer, &[call.digest()], signature)? {
                    debug!(method = ?call.method, "authorized by signature");
                    return Ok(AuthorizationGrant {
                        mode: AuthorizationMode::DirectSignature,
                        method: call.method,
                    });
                }
            }
        }

        Err(AttestorError::Unauthorized { required: permission })
    }
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::proof_or_signature()
    }
}

/// Require a direct signature from `signer` regardless of policy
///
/// # Errors
/// - `MissingSignature` if none was supplied
/// - `Unauthorized` if it does not verify
pub fn require_signature<S: SignatureScheme>(
    call: &CallCommitment,
    credentials: &Credentials,
    signer: &PublicKey,
    scheme: &S,
) -> AttestorResult<()> {
    let signature = credentials.signature.as_ref().ok_or(AttestorError::MissingSignature)?;
    if !scheme.verify(signer, &[call.digest()], signature)? {
        return Err(AttestorError::Unauthorized { required: Permission::Signature });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Ed25519Scheme;

    fn owner() -> PrivateKey {
        PrivateKey::from_seed([1u8; 32])
    }

    fn stranger() -> PrivateKey {
        PrivateKey::from_seed([2u8; 32])
    }

    fn authorize(
        policy: AuthorizationPolicy,
        call: &CallCommitment,
        credentials: &Credentials,
    ) -> AttestorResult<AuthorizationGrant> {
        policy.authorize_edit_state(
            call,
            credentials,
            &owner().public_key(),
            &Ed25519Scheme,
            &DigestProofVerifier,
        )
    }

    #[test]
    fn test_permission_accepts() {
        use AuthorizationMode::*;
        assert!(Permission::ProofOrSignature.accepts(ProofOfCorrectExecution));
        assert!(Permission::ProofOrSignature.accepts(DirectSignature));
        assert!(Permission::Proof.accepts(ProofOfCorrectExecution));
        assert!(!Permission::Proof.accepts(DirectSignature));
        assert!(!Permission::Signature.accepts(ProofOfCorrectExecution));
        assert!(!Permission::Impossible.accepts(ProofOfCorrectExecution));
        assert!(!Permission::Impossible.accepts(DirectSignature));
    }

    #[test]
    fn test_proof_authorizes() {
        let call = CallCommitment::init(&owner().public_key());
        let grant = authorize(AuthorizationPolicy::default(), &call, &Credentials::proven(&call)).unwrap();
        assert_eq!(grant.mode(), AuthorizationMode::ProofOfCorrectExecution);
        assert_eq!(grant.method(), MethodId::Init);
    }

    #[test]
    fn test_signature_authorizes() {
        let call = CallCommitment::init(&owner().public_key());
        let grant = authorize(AuthorizationPolicy::default(), &call, &Credentials::signed(&owner(), &call)).unwrap();
        assert_eq!(grant.mode(), AuthorizationMode::DirectSignature);
    }

    #[test]
    fn test_no_credentials_rejected() {
        let call = CallCommitment::init(&owner().public_key());
        assert_eq!(
            authorize(AuthorizationPolicy::default(), &call, &Credentials::none()),
            Err(AttestorError::Unauthorized { required: Permission::ProofOrSignature })
        );
    }

    #[test]
    fn test_stranger_signature_rejected() {
        let call = CallCommitment::init(&owner().public_key());
        let result = authorize(AuthorizationPolicy::default(), &call, &Credentials::signed(&stranger(), &call));
        assert!(matches!(result, Err(AttestorError::Unauthorized { .. })));
    }

    #[test]
    fn test_proof_for_other_call_rejected() {
        let call = CallCommitment::init(&owner().public_key());
        let other = CallCommitment::init(&stranger().public_key());
        let result = authorize(AuthorizationPolicy::default(), &call, &Credentials::proven(&other));
        assert!(matches!(result, Err(AttestorError::Unauthorized { .. })));
    }

    #[test]
    fn test_proof_only_policy_ignores_signature() {
        let policy = AuthorizationPolicy { edit_state: Permission::Proof };
        let call = CallCommitment::init(&owner().public_key());
        let result = authorize(policy, &call, &Credentials::signed(&owner(), &call));
        assert_eq!(result, Err(AttestorError::Unauthorized { required: Permission::Proof }));
    }

    #[test]
    fn test_impossible_rejects_everything() {
        let policy = AuthorizationPolicy { edit_state: Permission::Impossible };
        let call = CallCommitment::init(&owner().public_key());
        let creds = Credentials::proven(&call).with_signature(&owner(), &call);
        assert!(authorize(policy, &call, &creds).is_err());
    }

    #[test]
    fn test_rotation_commitment_binds_version() {
        let a = owner().public_key();
        let b = stranger().public_key();
        assert_ne!(CallCommitment::rotate(&a, &b, 1).digest(), CallCommitment::rotate(&a, &b, 2).digest());
    }

    #[test]
    fn test_require_signature() {
        let call = CallCommitment::init(&owner().public_key());
        let signer = owner().public_key();

        assert_eq!(
            require_signature(&call, &Credentials::proven(&call), &signer, &Ed25519Scheme),
            Err(AttestorError::MissingSignature)
        );
        assert!(require_signature(&call, &Credentials::signed(&owner(), &call), &signer, &Ed25519Scheme).is_ok());
        assert!(require_signature(&call, &Credentials::signed(&stranger(), &call), &signer, &Ed25519Scheme).is_err());
    }

    #[test]
    fn test_digest_proof_needs_no_secret() {
        // anyone holding the public call can build a passing digest proof
        let call = CallCommitment::rotate(&owner().public_key(), &stranger().public_key(), 1);
        let forged = ExecutionProof { method: call.method, public_input_digest: call.digest() };
        let creds = Credentials { proof: Some(forged), signature: None };

        assert!(authorize(AuthorizationPolicy::default(), &call, &creds).is_ok());
        assert_eq!(
            require_signature(&call, &creds, &owner().public_key(), &Ed25519Scheme),
            Err(AttestorError::MissingSignature)
        );
    }
}
