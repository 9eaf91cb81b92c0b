//! Core Types for the Oracle Attestor
//!
//! Field elements, keys, signatures and the data records that flow
//! into the verification method.

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{keys, price, token};
use crate::errors::{AttestorError, AttestorResult};
use crate::hasher;
use crate::{String, Vec};

// ============ Field Elements ============

/// A 32-byte field element, the unit of hashing and signing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct FieldElement(pub [u8; 32]);

impl FieldElement {
    /// The zero element
    pub const ZERO: Self = Self([0u8; 32]);

    /// Encode an integer as a little-endian, zero-padded element
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ============ Keys ============

/// Compressed public key of an authority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct PublicKey(pub [u8; keys::PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Wrap raw key bytes. Point validity is checked by the signature scheme.
    pub const fn from_bytes(bytes: [u8; keys::PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; keys::PUBLIC_KEY_LEN] {
        &self.0
    }

    /// The key as a single field element, for use in call commitments
    pub fn to_field(&self) -> FieldElement {
        FieldElement(self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ============ Signatures ============

/// Two-scalar signature `(r, s)`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Signature {
    /// Commitment point, compressed
    pub r: [u8; keys::SIGNATURE_COMPONENT_LEN],
    /// Response scalar
    pub s: [u8; keys::SIGNATURE_COMPONENT_LEN],
}

impl Signature {
    /// Build from fixed-size components
    pub const fn from_components(
        r: [u8; keys::SIGNATURE_COMPONENT_LEN],
        s: [u8; keys::SIGNATURE_COMPONENT_LEN],
    ) -> Self {
        Self { r, s }
    }

    /// Decode from untrusted component slices
    ///
    /// # Errors
    /// - `MalformedSignature` if a component has the wrong length or `s` is not reduced
    pub fn from_slices(r: &[u8], s: &[u8]) -> AttestorResult<Self> {
        let r: [u8; keys::SIGNATURE_COMPONENT_LEN] = r
            .try_into()
            .map_err(|_| AttestorError::MalformedSignature { reason: "r must be 32 bytes" })?;
        let s: [u8; keys::SIGNATURE_COMPONENT_LEN] = s
            .try_into()
            .map_err(|_| AttestorError::MalformedSignature { reason: "s must be 32 bytes" })?;

        let signature = Self { r, s };
        signature.check_well_formed()?;
        Ok(signature)
    }

    /// Decode from the 64-byte `r || s` wire form
    pub fn from_bytes(bytes: &[u8]) -> AttestorResult<Self> {
        if bytes.len() != 2 * keys::SIGNATURE_COMPONENT_LEN {
            return Err(AttestorError::MalformedSignature { reason: "expected 64 bytes" });
        }
        let (r, s) = bytes.split_at(keys::SIGNATURE_COMPONENT_LEN);
        Self::from_slices(r, s)
    }

    /// `r || s`
    pub fn to_bytes(&self) -> [u8; 2 * keys::SIGNATURE_COMPONENT_LEN] {
        let mut out = [0u8; 2 * keys::SIGNATURE_COMPONENT_LEN];
        out[..keys::SIGNATURE_COMPONENT_LEN].copy_from_slice(&self.r);
        out[keys::SIGNATURE_COMPONENT_LEN..].copy_from_slice(&self.s);
        out
    }

    /// Structural check, no curve arithmetic
    pub fn check_well_formed(&self) -> AttestorResult<()> {
        if self.s[keys::SIGNATURE_COMPONENT_LEN - 1] & keys::SCALAR_HIGH_BITS_MASK != 0 {
            return Err(AttestorError::MalformedSignature { reason: "s is not a reduced scalar" });
        }
        Ok(())
    }
}

// ============ Data Record ============

/// Fixed-point price with five decimals
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Price(u64);

impl Price {
    /// Wrap an already scaled value
    pub const fn from_scaled(scaled: u64) -> Self {
        Self(scaled)
    }

    /// Scale a decimal feed value, truncating extra precision
    ///
    /// # Errors
    /// - `InvalidInput` for NaN, infinite, negative or overflowing values
    pub fn from_decimal(value: f64) -> AttestorResult<Self> {
        if !value.is_finite() {
            return Err(AttestorError::InvalidInput { param: "price", reason: "not finite" });
        }
        if value < 0.0 {
            return Err(AttestorError::InvalidInput { param: "price", reason: "negative" });
        }
        let scaled = value * price::SCALE as f64;
        if scaled >= u64::MAX as f64 {
            return Err(AttestorError::InvalidInput { param: "price", reason: "too large" });
        }
        // `as` truncates toward zero
        Ok(Self(scaled as u64))
    }

    /// Scaled integer value
    pub fn scaled(&self) -> u64 {
        self.0
    }

    /// Whole units, dropping the fractional part
    pub fn whole_units(&self) -> u64 {
        self.0 / price::SCALE
    }

    pub fn to_field(&self) -> FieldElement {
        FieldElement::from_u64(self.0)
    }
}

/// Short token identifier such as `OSMO`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct TokenSymbol(String);

impl TokenSymbol {
    /// Validate and wrap a symbol
    ///
    /// # Errors
    /// - `InvalidInput` if empty, longer than `MAX_SYMBOL_LEN` or not printable ASCII
    pub fn new(symbol: &str) -> AttestorResult<Self> {
        if symbol.is_empty() {
            return Err(AttestorError::InvalidInput { param: "token", reason: "empty" });
        }
        if symbol.len() > token::MAX_SYMBOL_LEN {
            return Err(AttestorError::InvalidInput { param: "token", reason: "too long" });
        }
        if !symbol.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(AttestorError::InvalidInput { param: "token", reason: "not printable ascii" });
        }
        Ok(Self(String::from(symbol)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical field encoding of the symbol
    pub fn to_fields(&self) -> Vec<FieldElement> {
        hasher::string_to_fields(&self.0)
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally supplied payload to be attested
#[derive(
    Debug, Clone, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct DataRecord {
    /// Scaled price
    pub price: Price,
    /// Token symbol
    pub token: TokenSymbol,
    /// Commitment hash computed upstream; this is what the oracle signs
    pub data_hash: FieldElement,
}

impl DataRecord {
    pub fn new(price: Price, token: TokenSymbol, data_hash: FieldElement) -> Self {
        Self { price, token, data_hash }
    }

    /// Build a record whose hash is the canonical commitment to price and token
    pub fn committed(price: Price, token: TokenSymbol) -> Self {
        let data_hash = hasher::record_commitment(price, &token);
        Self { price, token, data_hash }
    }

    /// Recompute the canonical commitment from price and token
    pub fn commitment(&self) -> FieldElement {
        hasher::record_commitment(self.price, &self.token)
    }

    /// True if `data_hash` commits to this record's price and token
    pub fn is_bound(&self) -> bool {
        self.commitment() == self.data_hash
    }
}
