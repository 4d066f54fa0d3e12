#[macro_use]
extern crate log;

mod fdisk;
mod info;
mod mkdisk;
mod mount;
mod units;

use std::path::PathBuf;

use clap::Parser;
use derive_more::Display;
use partdisk::error::InputError;
use partdisk::{Fit, Kind, Registry};
use thiserror::Error;

use units::{Target, Unit};

#[derive(Debug, Display, Error)]
pub enum Error {
    #[display("{_0}")]
    Disk(#[from] partdisk::error::Error<std::io::Error>),
    #[display("Invalid input: {_0}")]
    Input(#[from] InputError),
    #[display("IO({_0})")]
    IO(#[from] std::io::Error),
}

#[derive(Debug, clap::Args)]
struct Mkdisk {
    /// Size in units, must be positive
    #[clap(short, long)]
    size: i64,
    /// K or M
    #[clap(short, long, default_value = "M", value_parser = units::unit)]
    unit: Unit,
    /// BF, FF or WF
    #[clap(short, long, default_value = "FF", value_parser = units::fit)]
    fit: Fit,
    /// Image file to create, missing directories are created too
    #[clap(short, long)]
    path: PathBuf,
}

#[derive(Debug, clap::Args)]
struct Rmdisk {
    #[clap(short, long)]
    path: PathBuf,
}

#[derive(Debug, clap::Args)]
struct Fdisk {
    /// Size in units, required unless deleting
    #[clap(short, long, required_unless_present = "delete")]
    size: Option<i64>,
    /// B, K or M
    #[clap(short, long, default_value = "K", value_parser = units::unit)]
    unit: Unit,
    #[clap(short, long)]
    path: PathBuf,
    /// P, E or L
    #[clap(short = 't', long = "type", default_value = "P", value_parser = units::kind)]
    kind: Kind,
    /// BF, FF or WF, defaults to the disk fit or the extended partition fit
    #[clap(short, long, value_parser = units::fit)]
    fit: Option<Fit>,
    #[clap(short, long)]
    name: String,
    /// Delete the named partition instead of creating one
    #[clap(long)]
    delete: bool,
}

#[derive(Debug, clap::Args)]
struct Mount {
    /// PATH:NAME pairs
    #[clap(required = true, value_parser = units::target)]
    targets: Vec<Target>,
    /// Two character mount id prefix
    #[clap(long, default_value = partdisk::mount::DEFAULT_SUFFIX)]
    suffix: String,
    /// Leave partitions marked as mounted on disk
    #[clap(long)]
    keep: bool,
}

#[derive(Debug, clap::Args)]
struct Image {
    #[clap(short, long)]
    path: PathBuf,
}

#[derive(Debug, clap::Args)]
struct Backup {
    #[clap(short, long)]
    path: PathBuf,
    /// Header backup file
    #[clap(short, long)]
    file: PathBuf,
}

#[derive(Debug, clap::Args)]
struct Compare {
    left: PathBuf,
    right: PathBuf,
}

#[derive(Debug, clap::Subcommand)]
enum Action {
    /// Create a zero filled disk image with an empty partition table
    Mkdisk(Mkdisk),
    /// Remove a disk image
    Rmdisk(Rmdisk),
    /// Create or delete a primary, extended or logical partition
    Fdisk(Fdisk),
    /// Mount partitions and print the mount table
    Mount(Mount),
    /// Print partitions, logical partitions and free space
    Info(Image),
    /// Hex dump of the partition table header
    Dump(Image),
    /// Save the partition table header to a file
    Backup(Backup),
    /// Write a saved partition table header back
    Restore(Backup),
    /// Drop all partitions, keeping size, signature and fit
    Clean(Image),
    /// List differences between two partition table headers
    Compare(Compare),
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long)]
    quiet: bool,
    #[clap(short, action = clap::ArgAction::Count)]
    verbosity: u8,
    #[clap(subcommand)]
    action: Action,
}

fn run(action: Action) -> Result<(), Error> {
    match action {
        Action::Mkdisk(args) => mkdisk::mkdisk(&args.path, args.size, args.unit, args.fit),
        Action::Rmdisk(args) => mkdisk::rmdisk(&args.path),
        Action::Fdisk(args) if args.delete => fdisk::delete(&args.path, &args.name),
        Action::Fdisk(args) => {
            let size = args.size.unwrap_or(0);
            fdisk::create(&args.path, args.kind, &args.name, size, args.unit, args.fit)
        }
        Action::Mount(args) => {
            let registry = Registry::new(&args.suffix)?;
            mount::mount(&registry, &args.targets, args.keep)
        }
        Action::Info(args) => info::info(&args.path),
        Action::Dump(args) => info::dump(&args.path),
        Action::Backup(args) => info::backup(&args.path, &args.file),
        Action::Restore(args) => info::restore(&args.path, &args.file),
        Action::Clean(args) => info::clean(&args.path),
        Action::Compare(args) => info::compare(&args.left, &args.right),
    }
}

fn main() {
    let args = Args::parse();
    let level = match (args.quiet, args.verbosity) {
        (true, _) => log::LevelFilter::Off,
        (_, 0) => log::LevelFilter::Info,
        (_, 1) => log::LevelFilter::Debug,
        (_, _) => log::LevelFilter::Trace,
    };
    log::set_max_level(level);
    env_logger::builder().filter(None, level).target(env_logger::Target::Stdout).init();

    if let Some(error) = run(args.action).err() {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
