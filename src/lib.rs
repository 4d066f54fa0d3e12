#![doc = include_str!("../README.md")]

#[macro_use]
extern crate log;

pub mod allocator;
pub mod chain;
mod endian;
pub mod error;
pub mod info;
pub mod io;
pub mod mount;
mod partition;
pub mod region;
pub(crate) mod sync;
pub mod types;
pub mod validate;

use core::fmt::Debug;

pub use allocator::Extent;
pub use chain::ChainEntry;
use error::{Error, InputError};
pub use info::DiskInfo;
use io::Wrap;
pub use mount::{MountRecord, Registry};
use region::HEADER_SIZE;
pub use region::mbr::{DiskHeader, Fit, Kind, PartitionRecord};
pub use validate::validate_image;

/// One disk image, every call goes back to the store so nothing is cached
/// between operations
pub struct Disk<IO> {
    io: IO,
}

impl<E: Debug, IO: io::IO<Error = E>> Disk<IO> {
    pub fn new(io: IO) -> Self {
        Self { io }
    }

    /// Write a fresh header, creation time is now and the signature random
    pub fn format(io: IO, size: i64, fit: Fit) -> Result<Self, Error<E>> {
        if size <= 0 {
            return Err(InputError::NonPositiveSize(size).into());
        }
        let mut disk = Self::new(io);
        let header = DiskHeader::new(size, fit);
        disk.write_header(&header)?;
        info!("Formatted disk of {} bytes, signature {}, {}", size, header.signature, fit);
        Ok(disk)
    }

    /// Decoded header without any semantic check, see [`Disk::validate`]
    pub fn header(&mut self) -> Result<DiskHeader, Error<E>> {
        let bytes = (&mut self.io).wrap().read(0, HEADER_SIZE)?;
        let header = DiskHeader::decode(&bytes)?;
        debug!("Disk header size {} signature {}", header.size, header.signature);
        Ok(header)
    }

    pub(crate) fn write_header(&mut self, header: &DiskHeader) -> Result<(), Error<E>> {
        let mut io = (&mut self.io).wrap();
        io.write(0, &header.encode())?;
        io.flush()
    }

    pub fn backup(&mut self) -> Result<[u8; HEADER_SIZE], Error<E>> {
        Ok(self.header()?.encode())
    }

    /// Put a previously backed up header in place and check the image against it
    pub fn restore(&mut self, bytes: &[u8]) -> Result<DiskHeader, Error<E>> {
        let header = DiskHeader::decode(bytes)?;
        self.write_header(&header)?;
        info!("Restored header with signature {}", header.signature);
        self.validate()
    }

    /// Drop every partition, size, creation time, signature and fit stay
    pub fn clean(&mut self) -> Result<DiskHeader, Error<E>> {
        let header = self.validate()?;
        let cleaned = DiskHeader { partitions: Default::default(), ..header };
        self.write_header(&cleaned)?;
        info!("Cleaned {} partitions from disk {}", header.count_active(), header.signature);
        Ok(cleaned)
    }

    /// Occupied chain nodes of the extended partition, empty without one
    pub fn logical_partitions(&mut self) -> Result<Vec<ChainEntry>, Error<E>> {
        let header = self.header()?;
        match header.extended() {
            Some((_, extended)) => chain::read_extended(&mut self.io, extended.extent()),
            None => Ok(Vec::new()),
        }
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}
