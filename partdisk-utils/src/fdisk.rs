use std::path::Path;

use partdisk::validate::open_image;
use partdisk::{Fit, Kind};

use crate::Error;
use crate::units::{self, Unit};

pub fn create(
    path: &Path,
    kind: Kind,
    name: &str,
    size: i64,
    unit: Unit,
    fit: Option<Fit>,
) -> Result<(), Error> {
    let size = units::bytes(size, unit)?;
    let mut disk = open_image(units::path(path)?)?;
    let extent = disk.create(kind, name, size, fit)?;
    println!("Created {} partition {} at {} of {} bytes", kind, name, extent.start, extent.size);
    Ok(())
}

pub fn delete(path: &Path, name: &str) -> Result<(), Error> {
    let mut disk = open_image(units::path(path)?)?;
    let kind = disk.delete(name)?;
    println!("Deleted {} partition {}", kind, name);
    Ok(())
}
