// Partition table header

use chrono::{DateTime, Utc};
use derive_more::Display;

use super::{HEADER_SIZE, ID_SIZE, NAME_SIZE, NUM_PARTITIONS};
use crate::allocator::Extent;
use crate::endian::{Reader, Writer};
use crate::error::IntegrityError;
use crate::types::{MountID, Name, Signature, decode_text, encode_text};

pub const STATUS_INACTIVE: u8 = 0;
pub const STATUS_ACTIVE: u8 = 1;
pub const UNMOUNTED: i64 = -1;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Fit {
    #[display("best fit")]
    Best,
    #[display("first fit")]
    First,
    #[display("worst fit")]
    Worst,
}

impl Fit {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'B' => Some(Self::Best),
            b'F' => Some(Self::First),
            b'W' => Some(Self::Worst),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Best => b'B',
            Self::First => b'F',
            Self::Worst => b'W',
        }
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Kind {
    Primary,
    Extended,
    Logical,
}

impl Kind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'P' => Some(Self::Primary),
            b'E' => Some(Self::Extended),
            b'L' => Some(Self::Logical),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Primary => b'P',
            Self::Extended => b'E',
            Self::Logical => b'L',
        }
    }
}

/// One of the 4 table slots, codes are kept raw so that decoding never fails
/// on garbage and the validator can report it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionRecord {
    pub status: u8,
    pub kind: u8,
    pub fit: u8,
    pub start: i64,
    pub size: i64,
    pub name: [u8; NAME_SIZE],
    pub correlative: i64,
    pub id: [u8; ID_SIZE],
}

impl Default for PartitionRecord {
    fn default() -> Self {
        Self {
            status: STATUS_INACTIVE,
            kind: 0,
            fit: 0,
            start: 0,
            size: 0,
            name: [0; NAME_SIZE],
            correlative: UNMOUNTED,
            id: [0; ID_SIZE],
        }
    }
}

impl PartitionRecord {
    fn decode(reader: &mut Reader) -> Self {
        Self {
            status: reader.u8(),
            kind: reader.u8(),
            fit: reader.u8(),
            start: reader.i64(),
            size: reader.i64(),
            name: reader.bytes(),
            correlative: reader.i64(),
            id: reader.bytes(),
        }
    }

    fn encode(&self, writer: &mut Writer) {
        writer.put_u8(self.status);
        writer.put_u8(self.kind);
        writer.put_u8(self.fit);
        writer.put_i64(self.start);
        writer.put_i64(self.size);
        writer.put(&self.name);
        writer.put_i64(self.correlative);
        writer.put(&self.id);
    }

    pub(crate) fn new(kind: Kind, fit: Fit, start: i64, size: i64, name: &str) -> Self {
        Self {
            status: STATUS_ACTIVE,
            kind: kind.code(),
            fit: fit.code(),
            start,
            size,
            name: encode_text(name),
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn kind(&self) -> Option<Kind> {
        Kind::from_code(self.kind)
    }

    pub fn fit(&self) -> Option<Fit> {
        Fit::from_code(self.fit)
    }

    pub fn name(&self) -> Name {
        decode_text(&self.name)
    }

    pub fn id(&self) -> MountID {
        decode_text(&self.id)
    }

    pub fn is_mounted(&self) -> bool {
        self.correlative >= 1
    }

    pub(crate) fn set_mount(&mut self, correlative: i64, id: &str) {
        self.correlative = correlative;
        self.id = encode_text(id);
    }

    pub(crate) fn clear_mount(&mut self) {
        self.correlative = UNMOUNTED;
        self.id = [0; ID_SIZE];
    }

    pub fn end(&self) -> i64 {
        self.start + self.size
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.start, self.size)
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Difference {
    #[display("size {_0} vs {_1}")]
    Size(i64, i64),
    #[display("signature {_0} vs {_1}")]
    Signature(Signature, Signature),
    #[display("fit {_0} vs {_1}")]
    Fit(char, char),
    #[display("partition {_0} exists on one side only")]
    Presence(usize),
    #[display("partition {_0} name differs")]
    Name(usize),
    #[display("partition {index} size {left} vs {right}")]
    PartitionSize { index: usize, left: i64, right: i64 },
    #[display("partition {index} start {left} vs {right}")]
    PartitionStart { index: usize, left: i64, right: i64 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiskHeader {
    pub size: i64,
    pub created: i64,
    pub signature: Signature,
    pub fit: u8,
    pub partitions: [PartitionRecord; NUM_PARTITIONS],
}

impl DiskHeader {
    pub fn new(size: i64, fit: Fit) -> Self {
        Self {
            size,
            created: Utc::now().timestamp(),
            signature: Signature::random(),
            fit: fit.code(),
            partitions: [PartitionRecord::default(); NUM_PARTITIONS],
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, IntegrityError> {
        if bytes.len() < HEADER_SIZE {
            let (expected, actual) = (HEADER_SIZE, bytes.len());
            return Err(IntegrityError::MalformedHeader { expected, actual });
        }
        let mut reader = Reader::new(bytes);
        let size = reader.i64();
        let created = reader.i64();
        let signature = Signature::from(reader.i64());
        let fit = reader.u8();
        let mut partitions = [PartitionRecord::default(); NUM_PARTITIONS];
        for partition in partitions.iter_mut() {
            *partition = PartitionRecord::decode(&mut reader);
        }
        Ok(Self { size, created, signature, fit, partitions })
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let mut writer = Writer::new(&mut bytes);
        writer.put_i64(self.size);
        writer.put_i64(self.created);
        writer.put_i64(self.signature.into());
        writer.put_u8(self.fit);
        for partition in self.partitions.iter() {
            partition.encode(&mut writer);
        }
        bytes
    }

    pub fn fit(&self) -> Option<Fit> {
        Fit::from_code(self.fit)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    pub fn active(&self) -> impl Iterator<Item = (usize, &PartitionRecord)> {
        self.partitions.iter().enumerate().filter(|(_, p)| p.is_active())
    }

    pub fn count_active(&self) -> usize {
        self.active().count()
    }

    pub fn extended(&self) -> Option<(usize, &PartitionRecord)> {
        self.active().find(|(_, p)| p.kind() == Some(Kind::Extended))
    }

    pub fn find(&self, name: &str) -> Option<(usize, &PartitionRecord)> {
        self.active().find(|(_, p)| p.name().as_str() == name)
    }

    pub fn free_slot(&self) -> Option<usize> {
        self.partitions.iter().position(|p| !p.is_active())
    }

    pub fn differences(&self, other: &Self) -> Vec<Difference> {
        let mut differences = Vec::new();
        if self.size != other.size {
            differences.push(Difference::Size(self.size, other.size));
        }
        if self.signature != other.signature {
            differences.push(Difference::Signature(self.signature, other.signature));
        }
        if self.fit != other.fit {
            differences.push(Difference::Fit(self.fit as char, other.fit as char));
        }
        let pairs = self.partitions.iter().zip(other.partitions.iter());
        for (index, (left, right)) in pairs.enumerate() {
            match (left.is_active(), right.is_active()) {
                (false, false) => continue,
                (true, true) => (),
                _ => {
                    differences.push(Difference::Presence(index));
                    continue;
                }
            }
            if left.name != right.name {
                differences.push(Difference::Name(index));
            }
            if left.size != right.size {
                let (left, right) = (left.size, right.size);
                differences.push(Difference::PartitionSize { index, left, right });
            }
            if left.start != right.start {
                let (left, right) = (left.start, right.start);
                differences.push(Difference::PartitionStart { index, left, right });
            }
        }
        differences
    }
}
