use std::path::Path;

use partdisk::error::InputError;
use partdisk::{Disk, Fit};

use crate::Error;
use crate::units::{self, Unit};

pub fn mkdisk(path: &Path, size: i64, unit: Unit, fit: Fit) -> Result<(), Error> {
    let path = units::path(path)?;
    if unit == Unit::Byte {
        return Err(InputError::UnknownUnit("B".into()).into());
    }
    let size = units::bytes(size, unit)?;
    let io = partdisk::io::std::create(path, size as u64)?;
    let mut disk = Disk::format(io, size, fit)?;
    let header = disk.header()?;
    let signature = header.signature;
    println!("Created {} of {} bytes, signature {}, {}", path.display(), size, signature, fit);
    Ok(())
}

pub fn rmdisk(path: &Path) -> Result<(), Error> {
    let path = units::path(path)?;
    partdisk::io::std::remove(path)?;
    println!("Removed {}", path.display());
    Ok(())
}
