use std::io;

/// Fixed size in-memory image, writes past the end fail like on a real file
/// that may not grow
#[derive(Clone, Debug, Default)]
pub struct MemoryIO(Vec<u8>);

impl MemoryIO {
    pub fn new(size: usize) -> Self {
        Self(vec![0u8; size])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for MemoryIO {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl super::IO for MemoryIO {
    type Error = io::Error;

    fn read(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, Self::Error> {
        let start = (offset as usize).min(self.0.len());
        let end = start.saturating_add(length).min(self.0.len());
        Ok(self.0[start..end].to_vec())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        match start.checked_add(data.len()) {
            Some(end) if end <= self.0.len() => {
                self.0[start..end].copy_from_slice(data);
                Ok(())
            }
            _ => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Write past end of image")),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn len(&mut self) -> Result<u64, Self::Error> {
        Ok(self.0.len() as u64)
    }
}
