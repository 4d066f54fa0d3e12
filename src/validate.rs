use core::fmt::Debug;
use std::fs;
use std::path::Path;

use crate::Disk;
use crate::error::{Error, IntegrityError};
use crate::io::{self, Wrap, std::FileIO};
use crate::region::mbr::{DiskHeader, Kind};

/// Structural checks of a decoded header against the store length
pub fn check(header: &DiskHeader, length: u64) -> Result<(), IntegrityError> {
    if header.size < 0 || length != header.size as u64 {
        return Err(IntegrityError::SizeMismatch { file: length, header: header.size });
    }
    if header.fit().is_none() {
        return Err(IntegrityError::InvalidFit(header.fit));
    }
    let mut extended = false;
    for (index, slot) in header.active() {
        let reason = match slot.kind() {
            None | Some(Kind::Logical) => Some("invalid kind"),
            Some(Kind::Extended) if extended => Some("second extended partition"),
            _ if slot.fit().is_none() => Some("invalid fit"),
            _ if slot.size <= 0 => Some("size must be positive"),
            _ if slot.start < 0 => Some("negative start"),
            _ if slot.name().is_empty() => Some("empty name"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(IntegrityError::InvalidSlot { index, reason });
        }
        extended |= slot.kind() == Some(Kind::Extended);
        match slot.start.checked_add(slot.size) {
            Some(end) if end <= header.size => (),
            _ => return Err(IntegrityError::SlotExceedsDisk { index }),
        }
    }
    for (index, slot) in header.active() {
        let mut later = header.active().filter(|(other, _)| *other > index);
        if let Some((other, _)) = later.find(|(_, o)| o.extent().overlaps(&slot.extent())) {
            return Err(IntegrityError::SlotsOverlap(index, other));
        }
    }
    Ok(())
}

impl<E: Debug, IO: io::IO<Error = E>> Disk<IO> {
    /// Header of an image fit for mutation, anything else fails with
    /// [`IntegrityError`]
    pub fn validate(&mut self) -> Result<DiskHeader, Error<E>> {
        let length = (&mut self.io).wrap().len()?;
        let header = self.header()?;
        if let Err(error) = check(&header, length) {
            warn!("Disk {} failed validation: {}", header.signature, error);
            return Err(error.into());
        }
        Ok(header)
    }
}

/// Open an image path, refusing anything but a regular file
pub fn open_image<P: AsRef<Path>>(path: P) -> Result<Disk<FileIO>, Error<std::io::Error>> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(Error::IO)?;
    if !metadata.is_file() {
        return Err(IntegrityError::NotRegularFile.into());
    }
    let io = FileIO::open(path).map_err(Error::IO)?;
    Ok(Disk::new(io))
}

pub fn validate_image<P: AsRef<Path>>(path: P) -> Result<DiskHeader, Error<std::io::Error>> {
    open_image(path)?.validate()
}

#[cfg(test)]
mod test {
    use super::{check, validate_image};
    use crate::Disk;
    use crate::error::{Error, IntegrityError};
    use crate::io::memory::MemoryIO;
    use crate::io::std::{create, remove, test::scratch};
    use crate::region::mbr::{DiskHeader, Fit, Kind, PartitionRecord};

    fn header() -> DiskHeader {
        let mut header = DiskHeader::new(10000, Fit::First);
        header.partitions[0] = PartitionRecord::new(Kind::Primary, Fit::First, 213, 1000, "P1");
        header.partitions[1] = PartitionRecord::new(Kind::Extended, Fit::Best, 2000, 3000, "E1");
        header
    }

    #[test]
    fn test_valid() {
        assert_eq!(check(&header(), 10000), Ok(()));
        assert_eq!(check(&DiskHeader::new(300, Fit::Worst), 300), Ok(()));
    }

    #[test]
    fn test_size_mismatch() {
        let expected = IntegrityError::SizeMismatch { file: 10001, header: 10000 };
        assert_eq!(check(&header(), 10001), Err(expected));
    }

    #[test]
    fn test_invalid_codes() {
        let mut header = header();
        header.fit = b'X';
        assert_eq!(check(&header, 10000), Err(IntegrityError::InvalidFit(b'X')));

        let mut header = self::header();
        header.partitions[0].kind = b'L';
        let expected = IntegrityError::InvalidSlot { index: 0, reason: "invalid kind" };
        assert_eq!(check(&header, 10000), Err(expected));

        let mut header = self::header();
        header.partitions[1].fit = 0;
        let expected = IntegrityError::InvalidSlot { index: 1, reason: "invalid fit" };
        assert_eq!(check(&header, 10000), Err(expected));

        let mut header = self::header();
        header.partitions[2] = PartitionRecord::new(Kind::Extended, Fit::Best, 6000, 100, "E2");
        let reason = "second extended partition";
        let expected = IntegrityError::InvalidSlot { index: 2, reason };
        assert_eq!(check(&header, 10000), Err(expected));
    }

    #[test]
    fn test_invalid_slot() {
        let mut header = header();
        header.partitions[1].size = 0;
        let expected = IntegrityError::InvalidSlot { index: 1, reason: "size must be positive" };
        assert_eq!(check(&header, 10000), Err(expected));

        let mut header = self::header();
        header.partitions[0].name = [0; 16];
        let expected = IntegrityError::InvalidSlot { index: 0, reason: "empty name" };
        assert_eq!(check(&header, 10000), Err(expected));

        let mut header = self::header();
        header.partitions[1].size = 9000;
        assert_eq!(check(&header, 10000), Err(IntegrityError::SlotExceedsDisk { index: 1 }));
    }

    #[test]
    fn test_slot_end_overflow() {
        let mut header = header();
        let start = i64::MAX - 10;
        header.partitions[3] = PartitionRecord::new(Kind::Primary, Fit::First, start, 100, "P2");
        assert_eq!(check(&header, 10000), Err(IntegrityError::SlotExceedsDisk { index: 3 }));
    }

    #[test]
    fn test_overlap() {
        let mut header = header();
        header.partitions[3] = PartitionRecord::new(Kind::Primary, Fit::First, 4999, 10, "P2");
        assert_eq!(check(&header, 10000), Err(IntegrityError::SlotsOverlap(1, 3)));
        header.partitions[3].start = 5000;
        assert_eq!(check(&header, 10000), Ok(()));
    }

    #[test]
    fn test_disk() {
        let mut disk = Disk::format(MemoryIO::new(4096), 4096, Fit::First).unwrap();
        assert_eq!(disk.validate().unwrap().size, 4096);
        let mut disk = Disk::format(MemoryIO::new(4096), 5000, Fit::First).unwrap();
        let expected = IntegrityError::SizeMismatch { file: 4096, header: 5000 };
        assert!(matches!(disk.validate(), Err(Error::Integrity(e)) if e == expected));
    }

    #[test]
    fn test_image() {
        let path = scratch("validate");
        assert!(matches!(validate_image(&path), Err(Error::IO(_))));
        let io = create(&path, 2048).unwrap();
        Disk::format(io, 2048, Fit::Worst).unwrap();
        assert_eq!(validate_image(&path).unwrap().size, 2048);

        std::fs::OpenOptions::new().append(true).open(&path).unwrap().set_len(2049).unwrap();
        let result = validate_image(&path);
        assert!(matches!(result, Err(Error::Integrity(IntegrityError::SizeMismatch { .. }))));
        remove(&path).unwrap();

        let result = validate_image(std::env::temp_dir());
        assert!(matches!(result, Err(Error::Integrity(IntegrityError::NotRegularFile))));
    }
}
