use partdisk::Registry;
use partdisk::mount::MountRecord;

use crate::Error;
use crate::units::Target;

fn print(records: &[MountRecord]) {
    println!(
        "{:4} {:16} {:8} {:>12} {:>3} {:20} {}",
        "ID", "NAME", "TYPE", "SIZE", "#", "MOUNTED", "PATH"
    );
    for record in records.iter() {
        print!("{:4} {:16} {:8}", record.id, record.name, record.kind);
        print!(" {:>12} {:>3}", record.size, record.correlative);
        let localtime = record.mounted_at.with_timezone(&chrono::Local);
        print!(" {:20}", localtime.format("%Y-%m-%d %H:%M:%S").to_string());
        println!(" {}", record.path.display());
    }
}

/// The registry lives as long as the process, so unless `keep` is set every
/// mount is undone before returning
pub fn mount(registry: &Registry, targets: &[Target], keep: bool) -> Result<(), Error> {
    let result = targets.iter().try_for_each(|target| {
        registry.mount(&target.path, &target.name).map(|_| ()).map_err(Error::from)
    });
    if result.is_ok() {
        print(&registry.list());
        let stats = registry.stats();
        let (mounted, disks) = (stats.total_mounted, stats.unique_disks);
        println!("{} mounted from {} disks, next letter {}", mounted, disks, stats.next_letter);
    }
    if !keep {
        for record in registry.list() {
            let report = registry.unmount(&record.id)?;
            if let Some(error) = report.disk_error {
                warn!("Unable to clear {} on disk: {}", record.id, error);
            }
        }
    }
    result
}
