//! Verified-Fact Event Log
//!
//! Append-only, ordered record of every commitment hash that passed
//! verification. Observers can enumerate it freely; only committed staged
//! effects can append to it.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::FieldElement;
use crate::Vec;

/// One verified fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VerifiedFactEvent {
    /// Position in the log, starting at 0
    pub sequence: u64,
    /// The commitment hash whose signature verified
    pub hash: FieldElement,
}

impl VerifiedFactEvent {
    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Ordered log of verified facts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct EventLog {
    events: Vec<VerifiedFactEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub(crate) fn append(&mut self, hash: FieldElement) -> VerifiedFactEvent {
        let event = VerifiedFactEvent { sequence: self.events.len() as u64, hash };
        self.events.push(event);
        event
    }

    /// Get all events
    pub fn events(&self) -> &[VerifiedFactEvent] {
        &self.events
    }

    /// Events with `sequence >= from`
    pub fn since(&self, from: u64) -> &[VerifiedFactEvent] {
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(self.events.len());
        &self.events[start..]
    }

    /// Most recent event
    pub fn last(&self) -> Option<&VerifiedFactEvent> {
        self.events.last()
    }

    /// First event carrying `hash`
    pub fn find(&self, hash: &FieldElement) -> Option<&VerifiedFactEvent> {
        self.events.iter().find(|e| e.hash == *hash)
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_sequence() {
        let mut log = EventLog::new();
        let a = log.append(FieldElement::from_u64(10));
        let b = log.append(FieldElement::from_u64(11));

        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last(), Some(&b));
    }

    #[test]
    fn test_since_and_find() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.append(FieldElement::from_u64(i));
        }

        assert_eq!(log.since(3).len(), 2);
        assert_eq!(log.since(3)[0].sequence, 3);
        assert!(log.since(99).is_empty());
        assert_eq!(log.find(&FieldElement::from_u64(4)).map(|e| e.sequence), Some(4));
        assert!(log.find(&FieldElement::from_u64(42)).is_none());
    }

    #[test]
    fn test_event_serialization() {
        let event = VerifiedFactEvent { sequence: 7, hash: FieldElement::from_u64(99) };
        let restored = VerifiedFactEvent::from_bytes(&event.to_bytes()).unwrap();
        assert_eq!(event, restored);
    }
}
