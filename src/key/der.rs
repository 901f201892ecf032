// src/key/der.rs

//! The handful of ASN.1 DER primitives needed to express an RSA
//! SubjectPublicKeyInfo.

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_SEQUENCE: u8 = 0x30;

/// `AlgorithmIdentifier { rsaEncryption (1.2.840.113549.1.1.1), NULL }`.
pub const RSA_ALGORITHM_IDENTIFIER: [u8; 15] = [
    0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01, 0x05, 0x00,
];

/// Encodes a DER length.
///
/// Lengths below 128 take a single byte. Longer lengths are written as
/// `0x80 | k` followed by the `k` big-endian bytes of the length.
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes = len.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    let significant = &bytes[first..];

    let mut out = Vec::with_capacity(1 + significant.len());
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// A single tag-length-value element. The value holds already encoded
/// content, so nodes nest by encoding children first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerNode {
    pub tag: u8,
    pub value: Vec<u8>,
}

impl DerNode {
    pub fn new(tag: u8, value: Vec<u8>) -> Self {
        Self { tag, value }
    }

    /// An unsigned big-endian integer. Leading zero bytes are dropped and a
    /// single `0x00` is put back when the high bit is set, so the value is
    /// read as positive.
    pub fn unsigned_integer(be_bytes: &[u8]) -> Self {
        let start = be_bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(be_bytes.len());
        let stripped = &be_bytes[start..];

        let mut value = Vec::with_capacity(stripped.len() + 1);
        match stripped.first() {
            Some(b) if *b >= 0x80 => value.push(0x00),
            // Zero still needs one content byte.
            None => value.push(0x00),
            _ => {}
        }
        value.extend_from_slice(stripped);
        Self::new(TAG_INTEGER, value)
    }

    /// A BIT STRING with zero unused bits.
    pub fn bit_string(payload: &[u8]) -> Self {
        let mut value = Vec::with_capacity(payload.len() + 1);
        value.push(0x00);
        value.extend_from_slice(payload);
        Self::new(TAG_BIT_STRING, value)
    }

    /// A SEQUENCE over already encoded elements.
    pub fn sequence<I, B>(encoded_children: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut value = Vec::new();
        for child in encoded_children {
            value.extend_from_slice(child.as_ref());
        }
        Self::new(TAG_SEQUENCE, value)
    }

    pub fn encode(&self) -> Vec<u8> {
        let length = encode_length(self.value.len());
        let mut out = Vec::with_capacity(1 + length.len() + self.value.len());
        out.push(self.tag);
        out.extend_from_slice(&length);
        out.extend_from_slice(&self.value);
        out
    }
}
