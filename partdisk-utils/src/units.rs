use std::path::{Path, PathBuf};

use partdisk::error::InputError;
use partdisk::{Fit, Kind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    Byte,
    Kilo,
    Mega,
}

impl Unit {
    pub fn bytes(self) -> i64 {
        match self {
            Self::Byte => 1,
            Self::Kilo => 1024,
            Self::Mega => 1024 * 1024,
        }
    }
}

pub fn unit(text: &str) -> Result<Unit, InputError> {
    match text.trim().to_ascii_uppercase().as_str() {
        "B" => Ok(Unit::Byte),
        "K" => Ok(Unit::Kilo),
        "M" => Ok(Unit::Mega),
        _ => Err(InputError::UnknownUnit(text.into())),
    }
}

pub fn fit(text: &str) -> Result<Fit, InputError> {
    match text.trim().to_ascii_uppercase().as_str() {
        "BF" | "B" => Ok(Fit::Best),
        "FF" | "F" => Ok(Fit::First),
        "WF" | "W" => Ok(Fit::Worst),
        _ => Err(InputError::UnknownFit(text.into())),
    }
}

pub fn kind(text: &str) -> Result<Kind, InputError> {
    match text.trim().to_ascii_uppercase().as_str() {
        "P" => Ok(Kind::Primary),
        "E" => Ok(Kind::Extended),
        "L" => Ok(Kind::Logical),
        _ => Err(InputError::UnknownKind(text.into())),
    }
}

/// Size in bytes, overflow saturates and is left to the allocator to reject
pub fn bytes(size: i64, unit: Unit) -> Result<i64, InputError> {
    if size <= 0 {
        return Err(InputError::NonPositiveSize(size));
    }
    Ok(size.saturating_mul(unit.bytes()))
}

pub fn path(path: &Path) -> Result<&Path, InputError> {
    if path.as_os_str().is_empty() {
        return Err(InputError::EmptyPath);
    }
    Ok(path)
}

/// `PATH:NAME`, the name being everything after the last colon
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub path: PathBuf,
    pub name: String,
}

pub fn target(text: &str) -> Result<Target, InputError> {
    let (path, name) = text.rsplit_once(':').unwrap_or((text, ""));
    if path.is_empty() {
        return Err(InputError::EmptyPath);
    }
    if name.is_empty() {
        return Err(InputError::EmptyName);
    }
    Ok(Target { path: path.into(), name: name.into() })
}
