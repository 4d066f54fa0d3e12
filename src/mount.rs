use core::fmt::Write;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{ConflictError, Error, InputError, OperationError, check_name};
use crate::region::mbr::Kind;
use crate::sync::{Shared, acquire, shared};
use crate::types::{MountID, Name, Signature};
use crate::validate::open_image;

pub const DEFAULT_SUFFIX: &str = "34";

/// Where the mounted partition is described on disk
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Slot(usize),
    Chain(u64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountRecord {
    pub id: MountID,
    pub name: Name,
    pub path: PathBuf,
    pub kind: Kind,
    pub size: i64,
    pub location: Location,
    pub correlative: i64,
    pub signature: Signature,
    pub mounted_at: DateTime<Utc>,
}

/// Unmount always deregisters, clearing the on-disk slot is best effort
#[derive(Debug)]
pub struct UnmountReport {
    pub record: MountRecord,
    pub disk_error: Option<Error<io::Error>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountStats {
    pub total_mounted: usize,
    pub unique_disks: usize,
    pub next_letter: char,
    pub suffix: String,
    pub per_disk: Vec<(Signature, usize)>,
    pub mounted: Vec<String>,
}

#[derive(Debug)]
struct State {
    records: BTreeMap<String, MountRecord>,
    per_disk: HashMap<Signature, usize>,
    // A disk keeps its letter after its last unmount, until reset
    letters: HashMap<Signature, char>,
    next_letter: char,
}

impl Default for State {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            per_disk: HashMap::new(),
            letters: HashMap::new(),
            next_letter: 'A',
        }
    }
}

impl State {
    /// Compose an ID without committing any counter
    fn next_id(
        &self,
        suffix: &str,
        signature: Signature,
    ) -> Result<(MountID, char), ConflictError> {
        let letter = self.letters.get(&signature).copied().unwrap_or(self.next_letter);
        let mut count = self.per_disk.get(&signature).copied().unwrap_or(0) + 1;
        loop {
            let mut id = MountID::new();
            write!(id, "{}{}{}", suffix, count, letter).map_err(|_| ConflictError::IdExhausted)?;
            if !self.records.contains_key(id.as_str()) {
                return Ok((id, letter));
            }
            trace!("Mount id {} in use", id);
            count += 1;
        }
    }

    fn commit(&mut self, record: MountRecord, letter: char) {
        *self.per_disk.entry(record.signature).or_insert(0) += 1;
        if !self.letters.contains_key(&record.signature) {
            self.letters.insert(record.signature, letter);
            self.next_letter = match letter {
                'Z' => 'A',
                letter => (letter as u8 + 1) as char,
            };
        }
        self.records.insert(record.id.as_str().into(), record);
    }

    fn release(&mut self, signature: Signature) {
        if let Some(count) = self.per_disk.get_mut(&signature) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.per_disk.remove(&signature);
            }
        }
    }
}

/// Mounted partitions of every disk the process touches, one instance is
/// meant to be shared by all callers
#[derive(Debug)]
pub struct Registry {
    suffix: String,
    state: Shared<State>,
}

impl Default for Registry {
    fn default() -> Self {
        Self { suffix: DEFAULT_SUFFIX.into(), state: shared(State::default()) }
    }
}

impl Registry {
    pub fn new(suffix: &str) -> Result<Self, InputError> {
        if suffix.len() != 2 || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InputError::BadSuffix(suffix.into()));
        }
        Ok(Self { suffix: suffix.into(), state: shared(State::default()) })
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Only primary and extended partitions can be mounted
    pub fn mount<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
    ) -> Result<MountRecord, Error<io::Error>> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(InputError::EmptyPath.into());
        }
        check_name(name)?;

        let mut state = acquire!(self.state, write);
        let mut disk = open_image(path)?;
        let mut header = disk.validate()?;
        let path = fs::canonicalize(path).map_err(Error::IO)?;

        let (index, mut slot) = match header.find(name) {
            Some((index, slot)) => (index, *slot),
            None if disk.find_logical(name)?.is_some() => {
                return Err(OperationError::LogicalMount(name.into()).into());
            }
            None => return Err(OperationError::PartitionNotFound(name.into()).into()),
        };
        if state.records.values().any(|r| r.path == path && r.name.as_str() == name) {
            let path = path.display().to_string();
            return Err(ConflictError::AlreadyMounted { path, name: name.into() }.into());
        }
        if slot.is_mounted() {
            debug!("Overwriting stale mount {} of {}", slot.id(), name);
        }

        let (id, letter) = state.next_id(&self.suffix, header.signature)?;
        let correlative = state.records.len() as i64 + 1;
        slot.set_mount(correlative, &id);
        header.partitions[index] = slot;
        disk.write_header(&header)?;

        let record = MountRecord {
            id,
            name: slot.name(),
            path,
            kind: slot.kind().unwrap_or(Kind::Primary),
            size: slot.size,
            location: Location::Slot(index),
            correlative,
            signature: header.signature,
            mounted_at: Utc::now(),
        };
        state.commit(record.clone(), letter);
        info!("Mounted {} of {} as {}", name, record.path.display(), record.id);
        Ok(record)
    }

    pub fn unmount(&self, id: &str) -> Result<UnmountReport, Error<io::Error>> {
        let mut state = acquire!(self.state, write);
        let record = match state.records.remove(id) {
            Some(record) => record,
            None => return Err(OperationError::NotFound(id.into()).into()),
        };
        state.release(record.signature);
        let disk_error = clear_mount(&record).err();
        if let Some(error) = disk_error.as_ref() {
            warn!("Unmounted {} but failed to clear it on disk: {}", id, error);
        }
        info!("Unmounted {} ({} of {})", id, record.name, record.path.display());
        Ok(UnmountReport { record, disk_error })
    }

    /// Sorted by ID
    pub fn list(&self) -> Vec<MountRecord> {
        acquire!(self.state, read).records.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Result<MountRecord, OperationError> {
        let state = acquire!(self.state, read);
        state.records.get(id).cloned().ok_or_else(|| OperationError::NotFound(id.into()))
    }

    pub fn stats(&self) -> MountStats {
        let state = acquire!(self.state, read);
        let mut per_disk: Vec<_> = state.per_disk.iter().map(|(s, c)| (*s, *c)).collect();
        per_disk.sort();
        MountStats {
            total_mounted: state.records.len(),
            unique_disks: per_disk.len(),
            next_letter: state.next_letter,
            suffix: self.suffix.clone(),
            per_disk,
            mounted: state.records.keys().cloned().collect(),
        }
    }

    /// Forget every mount, disks are not touched
    pub fn reset(&self) {
        let mut state = acquire!(self.state, write);
        let count = state.records.len();
        *state = State::default();
        info!("Registry reset, {} mounts dropped", count);
    }
}

fn clear_mount(record: &MountRecord) -> Result<(), Error<io::Error>> {
    let index = match record.location {
        Location::Slot(index) => index,
        Location::Chain(_) => return Ok(()),
    };
    let mut disk = open_image(&record.path)?;
    let mut header = disk.validate()?;
    let slot = &mut header.partitions[index];
    if header.signature != record.signature || slot.id().as_str() != record.id.as_str() {
        warn!("Slot {} of {} no longer holds {}", index, record.path.display(), record.id);
        return Ok(());
    }
    slot.clear_mount();
    disk.write_header(&header)
}
