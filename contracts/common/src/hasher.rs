//! Canonical Hasher
//!
//! Maps an ordered sequence of field elements to a single field element.
//! SHA-256 over a domain tag, the element count and every element in order,
//! so sequences of different lengths never collide by padding.

use sha2::{Digest, Sha256};

use crate::constants::{domain, field};
use crate::types::{FieldElement, Price, TokenSymbol};
use crate::Vec;

/// Hash an ordered sequence of field elements under a domain tag
pub fn hash_fields_with_domain(tag: &[u8], fields: &[FieldElement]) -> FieldElement {
    let mut hasher = Sha256::new();
    hasher.update((tag.len() as u64).to_le_bytes());
    hasher.update(tag);
    hasher.update((fields.len() as u64).to_le_bytes());
    for element in fields {
        hasher.update(element.as_bytes());
    }
    FieldElement(hasher.finalize().into())
}

/// Hash an ordered sequence of field elements
pub fn hash_fields(fields: &[FieldElement]) -> FieldElement {
    hash_fields_with_domain(domain::HASH_FIELDS, fields)
}

/// Encode a string as field elements
///
/// The first element is the byte length; the payload follows in 31-byte
/// chunks, each zero-padded into its own element. The empty string encodes
/// to a single zero element.
pub fn string_to_fields(s: &str) -> Vec<FieldElement> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(1 + bytes.len().div_ceil(field::STRING_CHUNK_LEN));
    out.push(FieldElement::from_u64(bytes.len() as u64));
    for chunk in bytes.chunks(field::STRING_CHUNK_LEN) {
        let mut element = [0u8; field::ELEMENT_LEN];
        element[..chunk.len()].copy_from_slice(chunk);
        out.push(FieldElement(element));
    }
    out
}

/// Canonical commitment to a price and token symbol
pub fn record_commitment(price: Price, token: &TokenSymbol) -> FieldElement {
    let mut fields = Vec::new();
    fields.push(price.to_field());
    fields.extend(token.to_fields());
    hash_fields_with_domain(domain::RECORD_COMMITMENT, &fields)
}
