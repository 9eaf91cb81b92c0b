//! Protocol Constants
//!
//! Fixed parameters of the attestor: encodings, limits and domain tags.

/// Price encoding
pub mod price {
    /// Prices are fixed-point integers with this many decimal places
    pub const DECIMALS: u8 = 5;
    /// One whole unit in scaled form (1.0 = 100_000)
    pub const SCALE: u64 = 100_000;
}

/// Token symbol limits
pub mod token {
    /// Maximum symbol length in bytes
    pub const MAX_SYMBOL_LEN: usize = 128;
}

/// Key and signature sizes
pub mod keys {
    /// Compressed public key length
    pub const PUBLIC_KEY_LEN: usize = 32;
    /// Private key seed length
    pub const PRIVATE_KEY_LEN: usize = 32;
    /// Length of each of the two signature scalars
    pub const SIGNATURE_COMPONENT_LEN: usize = 32;
    /// Mask of the bits that must be clear in the last byte of a reduced scalar
    pub const SCALAR_HIGH_BITS_MASK: u8 = 0b1110_0000;
}

/// Field element encoding
pub mod field {
    /// Bytes per field element
    pub const ELEMENT_LEN: usize = 32;
    /// Payload bytes packed into one element when encoding strings
    pub const STRING_CHUNK_LEN: usize = 31;
}

/// Domain separation tags
pub mod domain {
    /// Canonical field hash
    pub const HASH_FIELDS: &[u8] = b"oracle-attestor/hash-fields/v1";
    /// Signed message encoding
    pub const SIGNED_MESSAGE: &[u8] = b"oracle-attestor/signed-message/v1";
    /// Data record commitment
    pub const RECORD_COMMITMENT: &[u8] = b"oracle-attestor/record/v1";
    /// Authorized call commitment
    pub const CALL_COMMITMENT: &[u8] = b"oracle-attestor/call/v1";
}
