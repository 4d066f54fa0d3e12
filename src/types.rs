use derive_more::{Display, From, Into};

use crate::region::{ID_SIZE, NAME_SIZE};

/// Random number identifying one disk image
#[derive(Copy, Clone, Debug, Default, Display, From, Into, Eq, Hash, Ord, PartialOrd, PartialEq)]
pub struct Signature(i64);

impl Signature {
    pub(crate) fn random() -> Self {
        use rand::Rng;
        // Non-negative like the other int64 fields of the header
        Self(rand::thread_rng().gen_range(0..i64::MAX))
    }
}

pub type Name = heapless::String<NAME_SIZE>;
pub type MountID = heapless::String<ID_SIZE>;

/// Text up to the first NUL, surrounding whitespace trimmed
pub(crate) fn decode_text<const N: usize>(bytes: &[u8; N]) -> heapless::String<N> {
    let length = bytes.iter().position(|&b| b == 0).unwrap_or(N);
    let text = String::from_utf8_lossy(&bytes[..length]);
    let mut string = heapless::String::new();
    for ch in text.trim().chars() {
        if string.push(ch).is_err() {
            break;
        }
    }
    string
}

/// NUL padded, truncated to N bytes on a char boundary
pub(crate) fn encode_text<const N: usize>(text: &str) -> [u8; N] {
    let mut bytes = [0u8; N];
    let mut length = 0;
    for ch in text.chars() {
        let width = ch.len_utf8();
        if length + width > N {
            break;
        }
        ch.encode_utf8(&mut bytes[length..length + width]);
        length += width;
    }
    bytes
}
