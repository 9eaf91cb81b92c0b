//! Staged Effects
//!
//! A call collects the state write and event appends it intends to make in
//! a [`StagedEffects`] buffer. The buffer is committed only after the
//! precondition is re-checked against the live cell; dropping it discards
//! everything.

use tracing::debug;

use crate::authorization::AuthorizationGrant;
use crate::errors::AttestorResult;
use crate::events::{EventLog, VerifiedFactEvent};
use crate::state::{AuthorityCell, Precondition};
use crate::types::{FieldElement, PublicKey};
use crate::Vec;

/// Effects of one call, not yet applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedEffects {
    state_write: Option<(PublicKey, AuthorizationGrant)>,
    facts: Vec<FieldElement>,
}

/// What a commit actually did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Cell version after the commit
    pub version: u64,
    /// Events appended, in order
    pub events: Vec<VerifiedFactEvent>,
}

impl StagedEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an authority write; the grant travels with it
    pub fn write_authority(&mut self, key: PublicKey, grant: AuthorizationGrant) {
        self.state_write = Some((key, grant));
    }

    /// Stage a verified-fact event
    pub fn emit_fact(&mut self, hash: FieldElement) {
        self.facts.push(hash);
    }

    pub fn is_empty(&self) -> bool {
        self.state_write.is_none() && self.facts.is_empty()
    }

    /// Staged fact hashes, in emission order
    pub fn facts(&self) -> &[FieldElement] {
        &self.facts
    }

    /// Staged authority write, if any
    pub fn pending_authority(&self) -> Option<&PublicKey> {
        self.state_write.as_ref().map(|(key, _)| key)
    }

    /// Check `precondition` and apply everything, or nothing
    ///
    /// The only fallible steps (precondition, version bump) run before any
    /// event is appended.
    pub fn commit(
        self,
        precondition: &Precondition,
        cell: &mut AuthorityCell,
        log: &mut EventLog,
    ) -> AttestorResult<CommitReceipt> {
        cell.check(precondition)?;

        let version = match &self.state_write {
            Some((key, grant)) => cell.set(*key, grant)?,
            None => cell.version(),
        };

        let events: Vec<VerifiedFactEvent> =
            self.facts.into_iter().map(|hash| log.append(hash)).collect();

        debug!(version, appended = events.len(), "staged effects committed");
        Ok(CommitReceipt { version, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::{
        AuthorizationPolicy, CallCommitment, Credentials, DigestProofVerifier,
    };
    use crate::errors::AttestorError;
    use crate::signature::{Ed25519Scheme, PrivateKey};

    fn key(seed: u8) -> PublicKey {
        PrivateKey::from_seed([seed; 32]).public_key()
    }

    fn grant_for(value: &PublicKey) -> AuthorizationGrant {
        let call = CallCommitment::init(value);
        AuthorizationPolicy::default()
            .authorize_edit_state(&call, &Credentials::proven(&call), value, &Ed25519Scheme, &DigestProofVerifier)
            .unwrap()
    }

    fn initialized_cell() -> AuthorityCell {
        let mut cell = AuthorityCell::new();
        let k = key(1);
        cell.set(k, &grant_for(&k)).unwrap();
        cell
    }

    #[test]
    fn test_commit_applies_write_and_events() {
        let mut cell = AuthorityCell::new();
        let mut log = EventLog::new();
        let k = key(1);

        let mut effects = StagedEffects::new();
        effects.write_authority(k, grant_for(&k));
        effects.emit_fact(FieldElement::from_u64(5));

        let receipt = effects.commit(&Precondition::Uninitialized, &mut cell, &mut log).unwrap();
        assert_eq!(receipt.version, 1);
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(cell.get(), Ok(k));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_failed_precondition_discards_everything() {
        let mut cell = initialized_cell();
        let mut log = EventLog::new();
        let stale = cell.snapshot().unwrap();
        let k2 = key(2);
        cell.set(k2, &grant_for(&k2)).unwrap();

        let mut effects = StagedEffects::new();
        effects.emit_fact(FieldElement::from_u64(5));

        let result = effects.commit(&Precondition::Matches(stale), &mut cell, &mut log);
        assert!(matches!(result, Err(AttestorError::StaleState { .. })));
        assert!(log.is_empty());
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn test_events_only_commit_keeps_version() {
        let mut cell = initialized_cell();
        let mut log = EventLog::new();
        let snap = cell.snapshot().unwrap();

        let mut effects = StagedEffects::new();
        effects.emit_fact(FieldElement::from_u64(1));
        effects.emit_fact(FieldElement::from_u64(2));
        assert_eq!(effects.facts().len(), 2);
        assert!(effects.pending_authority().is_none());

        let receipt = effects.commit(&Precondition::Matches(snap), &mut cell, &mut log).unwrap();
        assert_eq!(receipt.version, 1);
        assert_eq!(receipt.events[1].sequence, 1);
    }
}
