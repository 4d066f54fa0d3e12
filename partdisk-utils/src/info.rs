use std::fs;
use std::path::Path;

use partdisk::validate::open_image;

use crate::Error;
use crate::units;

pub fn info(path: &Path) -> Result<(), Error> {
    let mut disk = open_image(units::path(path)?)?;
    let info = disk.info()?;
    let created = match info.created {
        Some(created) => {
            created.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string()
        }
        None => "-".into(),
    };
    println!(
        "Size {} bytes, created {}, signature {}, {}",
        info.size, created, info.signature, info.fit
    );
    print!("{} partitions, {} free slots", info.active(), info.free_slots);
    println!(", used {} free {} ({:.2}%)", info.used_space, info.free_space, info.usage_percent());
    for (index, partition) in info.partitions.iter() {
        let kind = partition.kind().map(|k| k.to_string()).unwrap_or_default();
        print!("{} {:8} {:16}", index, kind, partition.name());
        print!(" {:>12} {:>12}", partition.start, partition.size);
        if partition.is_mounted() {
            print!(" {}", partition.id());
        }
        println!();
    }
    for entry in info.logical.iter() {
        let node = &entry.node;
        println!("- {:8} {:16} {:>12} {:>12}", "Logical", node.name(), node.start, node.size);
    }
    for extent in info.free_extents.iter() {
        println!("  {:8} {:16} {:>12} {:>12}", "Free", "", extent.start, extent.size);
    }
    Ok(())
}

pub fn dump(path: &Path) -> Result<(), Error> {
    let mut disk = open_image(units::path(path)?)?;
    let bytes = disk.backup()?;
    println!("{}", pretty_hex::pretty_hex(&bytes));
    Ok(())
}

pub fn backup(path: &Path, output: &Path) -> Result<(), Error> {
    let mut disk = open_image(units::path(path)?)?;
    let bytes = disk.backup()?;
    fs::write(units::path(output)?, bytes)?;
    println!("Header of {} saved to {}", path.display(), output.display());
    Ok(())
}

pub fn restore(path: &Path, input: &Path) -> Result<(), Error> {
    let bytes = fs::read(units::path(input)?)?;
    let mut disk = open_image(units::path(path)?)?;
    let header = disk.restore(&bytes)?;
    println!("Restored {} partitions onto {}", header.count_active(), path.display());
    Ok(())
}

pub fn clean(path: &Path) -> Result<(), Error> {
    let mut disk = open_image(units::path(path)?)?;
    disk.clean()?;
    println!("Cleaned partition table of {}", path.display());
    Ok(())
}

pub fn compare(left: &Path, right: &Path) -> Result<(), Error> {
    let left_header = open_image(units::path(left)?)?.header()?;
    let right_header = open_image(units::path(right)?)?.header()?;
    let differences = left_header.differences(&right_header);
    if differences.is_empty() {
        println!("Headers are identical");
    }
    for difference in differences.iter() {
        println!("{}", difference);
    }
    Ok(())
}
