use core::fmt::Debug;

use crate::Disk;
use crate::allocator::{Allocator, Extent};
use crate::chain::{self, ChainEntry};
use crate::error::{ConflictError, Error, InputError, IntegrityError, OperationError, check_name};
use crate::io;
use crate::region::ebr::ChainNode;
use crate::region::mbr::{DiskHeader, Fit, Kind, PartitionRecord};
use crate::region::{END, HEADER_SIZE, NODE_SIZE, NUM_PARTITIONS};
use crate::types::Name;

fn check_overlap<I>(extent: Extent, occupied: I) -> Result<(), ConflictError>
where
    I: Iterator<Item = (Name, Extent)>,
{
    for (name, other) in occupied {
        if extent.overlaps(&other) {
            let (start, size) = (extent.start, extent.size);
            return Err(ConflictError::Overlap { start, size, other: name.as_str().into() });
        }
    }
    Ok(())
}

impl<E: Debug, IO: io::IO<Error = E>> Disk<IO> {
    pub fn create_primary(
        &mut self,
        name: &str,
        size: i64,
        fit: Option<Fit>,
    ) -> Result<PartitionRecord, Error<E>> {
        self.create_slot(Kind::Primary, name, size, fit)
    }

    /// Also writes the empty head node of the chain at the start of the region
    pub fn create_extended(
        &mut self,
        name: &str,
        size: i64,
        fit: Option<Fit>,
    ) -> Result<PartitionRecord, Error<E>> {
        if size > 0 && size < NODE_SIZE as i64 {
            return Err(InputError::ExtendedTooSmall(size).into());
        }
        self.create_slot(Kind::Extended, name, size, fit)
    }

    /// Places node and payload inside the extended partition, falling back
    /// to the extended partition's fit
    pub fn create_logical(
        &mut self,
        name: &str,
        size: i64,
        fit: Option<Fit>,
    ) -> Result<ChainEntry, Error<E>> {
        let header = self.check_request(name, size)?;
        let extended = match header.extended() {
            Some((_, extended)) => *extended,
            None => return Err(ConflictError::NoExtended.into()),
        };
        let head = extended.start as u64;
        let entries = chain::read_extended(&mut self.io, extended.extent())?;
        let fit = match fit.or(extended.fit()) {
            Some(fit) => fit,
            None => return Err(IntegrityError::InvalidFit(extended.fit).into()),
        };

        let allocator = Allocator::within_extended(&extended, &entries);
        let offset = allocator.place(fit, size.saturating_add(NODE_SIZE as i64))?;
        let extent = Extent::new(offset, NODE_SIZE as i64 + size);
        let head_extent = (Name::new(), Extent::new(extended.start, NODE_SIZE as i64));
        let nodes = entries.iter().map(|e| {
            let extent = Extent::new(e.offset as i64, NODE_SIZE as i64 + e.node.size);
            (e.node.name(), extent)
        });
        check_overlap(extent, core::iter::once(head_extent).chain(nodes))?;

        let node = ChainNode::new(fit, offset + NODE_SIZE as i64, size, name, END);
        let entry = chain::splice(&mut self.io, head, offset as u64, node)?;
        let start = entry.node.start;
        info!("Created logical partition {} at {} of {} bytes using {}", name, start, size, fit);
        Ok(entry)
    }

    /// Convenience dispatch on [`Kind`], returns the payload extent
    pub fn create(
        &mut self,
        kind: Kind,
        name: &str,
        size: i64,
        fit: Option<Fit>,
    ) -> Result<Extent, Error<E>> {
        match kind {
            Kind::Primary => self.create_primary(name, size, fit).map(|p| p.extent()),
            Kind::Extended => self.create_extended(name, size, fit).map(|p| p.extent()),
            Kind::Logical => {
                let entry = self.create_logical(name, size, fit)?;
                Ok(Extent::new(entry.node.start, entry.node.size))
            }
        }
    }

    /// Occupied chain node carrying `name`, if any
    pub fn find_logical(&mut self, name: &str) -> Result<Option<ChainEntry>, Error<E>> {
        let header = self.header()?;
        match header.extended() {
            Some((_, extended)) => chain::find_node(&mut self.io, extended.start as u64, name),
            None => Ok(None),
        }
    }

    /// Payload bytes are left untouched, deleting the extended partition
    /// drops its whole chain with it
    pub fn delete(&mut self, name: &str) -> Result<Kind, Error<E>> {
        check_name(name)?;
        let mut header = self.validate()?;
        if let Some((index, slot)) = header.find(name).map(|(i, p)| (i, *p)) {
            if slot.is_mounted() {
                return Err(ConflictError::Mounted(name.into()).into());
            }
            header.partitions[index] = PartitionRecord::default();
            self.write_header(&header)?;
            let kind = slot.kind().unwrap_or(Kind::Primary);
            info!("Deleted {} partition {} from slot {}", kind, name, index);
            return Ok(kind);
        }

        let extended = match header.extended() {
            Some((_, extended)) => *extended,
            None => return Err(OperationError::PartitionNotFound(name.into()).into()),
        };
        let head = extended.start as u64;
        let entry = match chain::find_node(&mut self.io, head, name)? {
            Some(entry) => entry,
            None => return Err(OperationError::PartitionNotFound(name.into()).into()),
        };
        if entry.node.is_mounted() {
            return Err(ConflictError::Mounted(name.into()).into());
        }
        chain::unlink(&mut self.io, head, entry.offset)?;
        info!("Deleted logical partition {} at {}", name, entry.offset);
        Ok(Kind::Logical)
    }

    fn create_slot(
        &mut self,
        kind: Kind,
        name: &str,
        size: i64,
        fit: Option<Fit>,
    ) -> Result<PartitionRecord, Error<E>> {
        let mut header = self.check_request(name, size)?;
        if header.count_active() >= NUM_PARTITIONS {
            return Err(ConflictError::TooManyPartitions.into());
        }
        if kind == Kind::Extended && header.extended().is_some() {
            return Err(ConflictError::ExtendedExists.into());
        }
        let index = match header.free_slot() {
            Some(index) => index,
            None => return Err(ConflictError::NoFreeSlot.into()),
        };
        let fit = match fit.or(header.fit()) {
            Some(fit) => fit,
            None => return Err(IntegrityError::InvalidFit(header.fit).into()),
        };

        let start = Allocator::whole_disk(&header).place(fit, size)?;
        let record = PartitionRecord::new(kind, fit, start, size, name);
        let reserved = (Name::new(), Extent::new(0, HEADER_SIZE as i64));
        let slots = header.active().map(|(_, p)| (p.name(), p.extent()));
        check_overlap(record.extent(), core::iter::once(reserved).chain(slots))?;

        header.partitions[index] = record;
        self.write_header(&header)?;
        if kind == Kind::Extended {
            chain::write_node(&mut self.io, start as u64, &ChainNode::default())?;
        }
        info!("Created {} partition {} at {} of {} bytes using {}", kind, name, start, size, fit);
        Ok(record)
    }

    /// Validates the image and the request, returns the current header
    fn check_request(&mut self, name: &str, size: i64) -> Result<DiskHeader, Error<E>> {
        if size <= 0 {
            return Err(InputError::NonPositiveSize(size).into());
        }
        check_name(name)?;
        let header = self.validate()?;
        if header.find(name).is_some() {
            return Err(ConflictError::DuplicateName(name.into()).into());
        }
        if let Some((_, extended)) = header.extended() {
            if chain::find_node(&mut self.io, extended.start as u64, name)?.is_some() {
                return Err(ConflictError::DuplicateName(name.into()).into());
            }
        }
        Ok(header)
    }
}
