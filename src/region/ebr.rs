// Extended chain node

use super::{END, NAME_SIZE, NODE_SIZE};
use crate::endian::{Reader, Writer};
use crate::error::IntegrityError;
use crate::region::mbr::{Fit, STATUS_ACTIVE};
use crate::types::{Name, decode_text, encode_text};

/// Describes one logical partition, payload follows the node right away
/// so `start` is always node offset + [`NODE_SIZE`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChainNode {
    pub mount: u8,
    pub fit: u8,
    pub start: i64,
    pub size: i64,
    pub next: i64,
    pub name: [u8; NAME_SIZE],
}

impl Default for ChainNode {
    fn default() -> Self {
        Self { mount: 0, fit: 0, start: 0, size: 0, next: END, name: [0; NAME_SIZE] }
    }
}

impl ChainNode {
    pub(crate) fn new(fit: Fit, start: i64, size: i64, name: &str, next: i64) -> Self {
        Self { mount: 0, fit: fit.code(), start, size, next, name: encode_text(name) }
    }

    pub fn decode(offset: u64, bytes: &[u8]) -> Result<Self, IntegrityError> {
        if bytes.len() < NODE_SIZE {
            let (expected, actual) = (NODE_SIZE, bytes.len());
            return Err(IntegrityError::MalformedNode { offset, expected, actual });
        }
        let mut reader = Reader::new(bytes);
        Ok(Self {
            mount: reader.u8(),
            fit: reader.u8(),
            start: reader.i64(),
            size: reader.i64(),
            next: reader.i64(),
            name: reader.bytes(),
        })
    }

    pub fn encode(&self) -> [u8; NODE_SIZE] {
        let mut bytes = [0u8; NODE_SIZE];
        let mut writer = Writer::new(&mut bytes);
        writer.put_u8(self.mount);
        writer.put_u8(self.fit);
        writer.put_i64(self.start);
        writer.put_i64(self.size);
        writer.put_i64(self.next);
        writer.put(&self.name);
        bytes
    }

    /// Unoccupied nodes stay linked, they are skipped rather than removed
    pub fn is_empty(&self) -> bool {
        self.size == 0 || self.name().is_empty()
    }

    pub fn is_mounted(&self) -> bool {
        self.mount == STATUS_ACTIVE
    }

    pub fn fit(&self) -> Option<Fit> {
        Fit::from_code(self.fit)
    }

    pub fn name(&self) -> Name {
        decode_text(&self.name)
    }

    pub fn has_next(&self) -> bool {
        self.next != END
    }

    pub fn end(&self) -> i64 {
        self.start.saturating_add(self.size)
    }
}
