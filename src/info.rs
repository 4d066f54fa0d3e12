use core::fmt::Debug;

use chrono::{DateTime, Utc};

use crate::Disk;
use crate::allocator::{Allocator, Extent};
use crate::chain::{self, ChainEntry};
use crate::error::Error;
use crate::io;
use crate::region::mbr::{Fit, PartitionRecord};
use crate::region::{HEADER_SIZE, NUM_PARTITIONS};
use crate::types::Signature;

/// Snapshot of one validated image
#[derive(Clone, Debug)]
pub struct DiskInfo {
    pub size: i64,
    pub created: Option<DateTime<Utc>>,
    pub signature: Signature,
    pub fit: Fit,
    pub free_slots: usize,
    /// Sum of unallocated gaps, the header excluded
    pub free_space: i64,
    /// Sum of active partition sizes
    pub used_space: i64,
    pub free_extents: Vec<Extent>,
    pub partitions: Vec<(usize, PartitionRecord)>,
    pub logical: Vec<ChainEntry>,
}

impl DiskInfo {
    pub fn active(&self) -> usize {
        self.partitions.len()
    }

    pub fn usage_percent(&self) -> f64 {
        let usable = self.size - HEADER_SIZE as i64;
        if usable <= 0 {
            return 0.0;
        }
        self.used_space as f64 * 100.0 / usable as f64
    }
}

impl<E: Debug, IO: io::IO<Error = E>> Disk<IO> {
    pub fn info(&mut self) -> Result<DiskInfo, Error<E>> {
        let header = self.validate()?;
        let allocator = Allocator::whole_disk(&header);
        let partitions: Vec<_> = header.active().map(|(i, p)| (i, *p)).collect();
        let logical = match header.extended() {
            Some((_, extended)) => chain::read_extended(&mut self.io, extended.extent())?,
            None => Vec::new(),
        };
        let info = DiskInfo {
            size: header.size,
            created: header.created_at(),
            signature: header.signature,
            fit: header.fit().unwrap_or(Fit::First),
            free_slots: NUM_PARTITIONS - partitions.len(),
            free_space: allocator.free_space(),
            used_space: partitions.iter().map(|(_, p)| p.size).sum(),
            free_extents: allocator.free_extents(),
            partitions,
            logical,
        };
        debug!("Disk {} used {} free {}", info.signature, info.used_space, info.free_space);
        Ok(info)
    }
}

#[cfg(test)]
mod test {
    use crate::Disk;
    use crate::allocator::Extent;
    use crate::io::memory::MemoryIO;
    use crate::region::mbr::Fit;

    #[test]
    fn test_info() {
        let mut disk = Disk::format(MemoryIO::new(10213), 10213, Fit::Worst).unwrap();
        let info = disk.info().unwrap();
        assert_eq!(info.active(), 0);
        assert_eq!(info.free_slots, 4);
        assert_eq!(info.free_space, 10000);
        assert_eq!(info.usage_percent(), 0.0);

        disk.create_primary("P1", 2500, Some(Fit::First)).unwrap();
        disk.create_extended("Ext", 2500, Some(Fit::First)).unwrap();
        disk.create_logical("L1", 100, None).unwrap();
        let info = disk.info().unwrap();
        assert_eq!(info.fit, Fit::Worst);
        assert_eq!(info.active(), 2);
        assert_eq!(info.free_slots, 2);
        assert_eq!(info.used_space, 5000);
        assert_eq!(info.free_space, 5000);
        assert_eq!(info.free_extents, vec![Extent::new(5213, 5000)]);
        assert_eq!(info.usage_percent(), 50.0);
        assert_eq!(info.logical.len(), 1);
        assert_eq!(info.logical[0].node.name().as_str(), "L1");
    }
}
