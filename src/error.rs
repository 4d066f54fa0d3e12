use core::fmt::{Debug, Display, Formatter, Result};

use crate::region::{NAME_SIZE, mbr::Fit};

// Rejected before touching the disk, never worth retrying as-is
#[derive(Debug, displaydoc::Display, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    /// disk path must not be empty
    EmptyPath,
    /// partition name must not be empty
    EmptyName,
    /// size must be greater than zero, got {0}
    NonPositiveSize(i64),
    /// name `{0}` exceeds 16 bytes
    NameTooLong(String),
    /// name `{0}` has surrounding whitespace or a NUL byte
    InvalidName(String),
    /// unrecognized unit `{0}`
    UnknownUnit(String),
    /// unrecognized fit `{0}`
    UnknownFit(String),
    /// unrecognized partition type `{0}`
    UnknownKind(String),
    /// mount id suffix must be exactly 2 characters, got `{0}`
    BadSuffix(String),
    /// extended partition of {0} bytes cannot hold its head node
    ExtendedTooSmall(i64),
}

#[derive(Debug, displaydoc::Display, thiserror::Error, PartialEq, Eq)]
pub enum ConflictError {
    /// a partition named `{0}` already exists
    DuplicateName(String),
    /// extent {start}+{size} overlaps partition `{other}`
    Overlap { start: i64, size: i64, other: String },
    /// disk already holds 4 primary and extended partitions
    TooManyPartitions,
    /// disk already holds an extended partition
    ExtendedExists,
    /// no free partition slot
    NoFreeSlot,
    /// logical partitions require an extended partition
    NoExtended,
    /// partition `{name}` on `{path}` is already mounted
    AlreadyMounted { path: String, name: String },
    /// partition `{0}` is mounted
    Mounted(String),
    /// no mount id left for this disk
    IdExhausted,
}

#[derive(Debug, displaydoc::Display, thiserror::Error, PartialEq, Eq)]
pub enum AllocationError {
    /// no free extent of {size} bytes using {fit}
    NoSpace { size: i64, fit: Fit },
}

// Fatal for the targeted image, mutation must be refused
#[derive(Debug, displaydoc::Display, thiserror::Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// header needs {expected} bytes, got {actual}
    MalformedHeader { expected: usize, actual: usize },
    /// chain node at {offset} needs {expected} bytes, got {actual}
    MalformedNode { offset: u64, expected: usize, actual: usize },
    /// disk path is not a regular file
    NotRegularFile,
    /// file size {file} does not match header size {header}
    SizeMismatch { file: u64, header: i64 },
    /// invalid disk fit code {0}
    InvalidFit(u8),
    /// partition {index}: {reason}
    InvalidSlot { index: usize, reason: &'static str },
    /// partition {index} exceeds disk size
    SlotExceedsDisk { index: usize },
    /// partitions {0} and {1} overlap
    SlotsOverlap(usize, usize),
    /// chain node at {offset} links backwards to {next}
    ChainLink { offset: i64, next: i64 },
    /// chain exceeds {0} nodes without terminating
    ChainBound(usize),
    /// chain node at {offset} describes an invalid extent
    InvalidNode { offset: u64 },
}

#[derive(Debug, displaydoc::Display, thiserror::Error, PartialEq, Eq)]
pub enum OperationError {
    /// no mounted partition with id `{0}`
    NotFound(String),
    /// no partition named `{0}`
    PartitionNotFound(String),
    /// mounting logical partition `{0}` is not supported
    LogicalMount(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    InputValidation,
    StructuralConflict,
    AllocationFailure,
    IntegrityFailure,
    NotFound,
    IOFailure,
}

#[derive(Debug)]
pub enum Error<E> {
    IO(E),
    Input(InputError),
    Conflict(ConflictError),
    Allocation(AllocationError),
    Integrity(IntegrityError),
    Operation(OperationError),
}

impl<E> Error<E> {
    pub fn category(&self) -> Category {
        match self {
            Self::IO(_) => Category::IOFailure,
            Self::Input(_) => Category::InputValidation,
            Self::Conflict(_) => Category::StructuralConflict,
            Self::Allocation(_) => Category::AllocationFailure,
            Self::Integrity(_) => Category::IntegrityFailure,
            Self::Operation(OperationError::LogicalMount(_)) => Category::StructuralConflict,
            Self::Operation(_) => Category::NotFound,
        }
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::IO(e) => write!(f, "IO({})", e),
            Self::Input(e) => write!(f, "Invalid input: {}", e),
            Self::Conflict(e) => write!(f, "Conflict: {}", e),
            Self::Allocation(e) => write!(f, "Allocation failed: {}", e),
            Self::Integrity(e) => write!(f, "Integrity check failed: {}", e),
            Self::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<E: Debug + Display> std::error::Error for Error<E> {}

macro_rules! from {
    ($variant:ident, $type:ty) => {
        impl<E> From<$type> for Error<E> {
            fn from(e: $type) -> Self {
                Self::$variant(e)
            }
        }
    };
}

from!(Input, InputError);
from!(Conflict, ConflictError);
from!(Allocation, AllocationError);
from!(Integrity, IntegrityError);
from!(Operation, OperationError);

pub(crate) fn check_name<E>(name: &str) -> core::result::Result<(), Error<E>> {
    if name.is_empty() {
        return Err(InputError::EmptyName.into());
    }
    if name.len() > NAME_SIZE {
        return Err(InputError::NameTooLong(name.into()).into());
    }
    // Stored names are read back trimmed and cut at the first NUL
    if name.trim() != name || name.contains('\0') {
        return Err(InputError::InvalidName(name.into()).into());
    }
    Ok(())
}
