//! Authority State Cell
//!
//! Holds the single trusted public key together with a version counter.
//! Reads hand out snapshots; writes require an [`AuthorizationGrant`] and
//! bump the version, so any snapshot taken before a write no longer matches.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::authorization::AuthorizationGrant;
use crate::errors::{AttestorError, AttestorResult};
use crate::types::PublicKey;

/// Value and version read together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StateSnapshot {
    pub key: PublicKey,
    pub version: u64,
}

/// What a staged call expects the cell to look like when it lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Precondition {
    /// Cell must still be empty
    Uninitialized,
    /// Cell must still hold exactly this snapshot
    Matches(StateSnapshot),
}

/// Versioned single-value cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AuthorityCell {
    value: Option<PublicKey>,
    version: u64,
}

impl AuthorityCell {
    /// Empty cell, version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed value
    ///
    /// # Errors
    /// - `UninitializedState` before the first write
    pub fn get(&self) -> AttestorResult<PublicKey> {
        self.value.ok_or(AttestorError::UninitializedState)
    }

    /// Number of writes so far
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    /// Read value and version together
    pub fn snapshot(&self) -> AttestorResult<StateSnapshot> {
        Ok(StateSnapshot { key: self.get()?, version: self.version })
    }

    /// Assert the cell still holds `snapshot`
    ///
    /// # Errors
    /// - `StaleState` if the value or version moved
    pub fn assert_equals(&self, snapshot: &StateSnapshot) -> AttestorResult<()> {
        if self.value != Some(snapshot.key) || self.version != snapshot.version {
            return Err(AttestorError::StaleState {
                expected_version: snapshot.version,
                actual_version: self.version,
            });
        }
        Ok(())
    }

    /// Assert a staged call's precondition against the live cell
    ///
    /// # Errors
    /// - `AlreadyInitialized` if an init finds the cell populated
    /// - `StaleState` if a snapshot no longer matches
    pub fn check(&self, precondition: &Precondition) -> AttestorResult<()> {
        match precondition {
            Precondition::Uninitialized if self.is_initialized() => {
                Err(AttestorError::AlreadyInitialized)
            }
            Precondition::Uninitialized => Ok(()),
            Precondition::Matches(snapshot) => self.assert_equals(snapshot),
        }
    }

    /// Overwrite the value; returns the new version
    ///
    /// Nothing is written if the version counter would overflow.
    pub fn set(&mut self, value: PublicKey, _grant: &AuthorizationGrant) -> AttestorResult<u64> {
        let version = self.version.checked_add(1).ok_or(AttestorError::InvalidInput {
            param: "version",
            reason: "counter exhausted",
        })?;
        self.value = Some(value);
        self.version = version;
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::{
        AuthorizationPolicy, CallCommitment, Credentials, DigestProofVerifier,
    };
    use crate::signature::Ed25519Scheme;

    fn key(seed: u8) -> PublicKey {
        crate::signature::PrivateKey::from_seed([seed; 32]).public_key()
    }

    fn grant_for(value: &PublicKey) -> AuthorizationGrant {
        let call = CallCommitment::init(value);
        AuthorizationPolicy::default()
            .authorize_edit_state(
                &call,
                &Credentials::proven(&call),
                value,
                &Ed25519Scheme,
                &DigestProofVerifier,
            )
            .unwrap()
    }

    #[test]
    fn test_get_before_init_fails() {
        let cell = AuthorityCell::new();
        assert_eq!(cell.get(), Err(AttestorError::UninitializedState));
        assert_eq!(cell.snapshot(), Err(AttestorError::UninitializedState));
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn test_set_bumps_version() {
        let mut cell = AuthorityCell::new();
        let k = key(1);
        assert_eq!(cell.set(k, &grant_for(&k)), Ok(1));
        assert_eq!(cell.get(), Ok(k));

        let k2 = key(2);
        assert_eq!(cell.set(k2, &grant_for(&k2)), Ok(2));
        assert_eq!(cell.get(), Ok(k2));
    }

    #[test]
    fn test_snapshot_goes_stale_after_set() {
        let mut cell = AuthorityCell::new();
        let k = key(1);
        cell.set(k, &grant_for(&k)).unwrap();
        let snap = cell.snapshot().unwrap();
        assert!(cell.assert_equals(&snap).is_ok());

        // same value rewritten still invalidates the snapshot
        cell.set(k, &grant_for(&k)).unwrap();
        assert_eq!(
            cell.assert_equals(&snap),
            Err(AttestorError::StaleState { expected_version: 1, actual_version: 2 })
        );
    }

    #[test]
    fn test_uninitialized_precondition() {
        let mut cell = AuthorityCell::new();
        assert!(cell.check(&Precondition::Uninitialized).is_ok());

        let k = key(1);
        cell.set(k, &grant_for(&k)).unwrap();
        assert_eq!(cell.check(&Precondition::Uninitialized), Err(AttestorError::AlreadyInitialized));
    }
}
