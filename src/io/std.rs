use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Disk image file, opened and closed again on every single call so that no
/// handle outlives an operation
#[derive(Clone, Debug)]
pub struct FileIO {
    path: PathBuf,
}

impl FileIO {
    pub fn open<P: AsRef<Path>>(filepath: P) -> io::Result<Self> {
        let path = filepath.as_ref().to_path_buf();
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "Not a regular file"));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl super::IO for FileIO {
    type Error = io::Error;

    fn read(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, Self::Error> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::with_capacity(length);
        file.take(length as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), Self::Error> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn len(&mut self) -> Result<u64, Self::Error> {
        Ok(fs::metadata(&self.path)?.len())
    }
}

/// Create a zero filled image of `size` bytes, missing parent directories included
pub fn create<P: AsRef<Path>>(filepath: P, size: u64) -> io::Result<FileIO> {
    let path = filepath.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    file.set_len(size)?;
    debug!("Created image {} of {} bytes", path.display(), size);
    FileIO::open(path)
}

pub fn remove<P: AsRef<Path>>(filepath: P) -> io::Result<()> {
    let path = filepath.as_ref();
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "Is a directory"));
    }
    let extension = path.extension().map(|e| e.to_ascii_lowercase());
    if extension.as_ref().map(|e| e != "mia").unwrap_or(true) {
        warn!("Removing {} which lacks the .mia extension", path.display());
    }
    fs::remove_file(path)?;
    info!("Removed image {} of {} bytes", path.display(), metadata.len());
    Ok(())
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{FileIO, create, remove};
    use crate::io::IO;

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Unique image path under the system temp dir
    pub(crate) fn scratch(name: &str) -> PathBuf {
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        let file = format!("partdisk-{}-{}-{}.mia", std::process::id(), count, name);
        std::env::temp_dir().join(file)
    }

    #[test]
    fn test_file_io() {
        let path = scratch("file-io");
        let mut io = create(&path, 1024).unwrap();
        assert_eq!(io.len().unwrap(), 1024);
        assert_eq!(io.read(0, 16).unwrap(), vec![0u8; 16]);

        io.write(1000, b"hello").unwrap();
        assert_eq!(io.read(1000, 5).unwrap(), b"hello");
        assert_eq!(io.read(1020, 16).unwrap().len(), 4);
        assert_eq!(io.len().unwrap(), 1024);

        remove(&path).unwrap();
        assert!(io.read(0, 1).is_err());
        assert!(FileIO::open(&path).is_err());
    }

    #[test]
    fn test_reject_directory() {
        let dir = std::env::temp_dir();
        assert!(FileIO::open(&dir).is_err());
        assert!(remove(&dir).is_err());
    }
}
