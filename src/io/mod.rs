pub mod memory;
pub mod std;

use core::fmt::Debug;
use core::ops::DerefMut;

use crate::error::Error;

/// Byte addressed backing store of one disk image
pub trait IO {
    type Error: Debug;

    /// Returns fewer than `length` bytes only when the store ends first
    fn read(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, Self::Error>;
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
    /// Total size of the store in bytes
    fn len(&mut self) -> Result<u64, Self::Error>;
}

pub(crate) struct Wrapper<D>(D);

impl<E, T, D> Wrapper<D>
where
    T: IO<Error = E>,
    D: DerefMut<Target = T>,
{
    pub fn read(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, Error<E>> {
        trace!("Read {} bytes at {}", length, offset);
        self.0.read(offset, length).map_err(Error::IO)
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), Error<E>> {
        trace!("Write {} bytes at {}", data.len(), offset);
        self.0.write(offset, data).map_err(Error::IO)
    }

    pub fn flush(&mut self) -> Result<(), Error<E>> {
        self.0.flush().map_err(Error::IO)
    }

    pub fn len(&mut self) -> Result<u64, Error<E>> {
        self.0.len().map_err(Error::IO)
    }
}

pub(crate) trait Wrap {
    type Output;
    fn wrap(self) -> Self::Output;
}

impl<E, T, D> Wrap for D
where
    T: IO<Error = E>,
    D: DerefMut<Target = T>,
{
    type Output = Wrapper<D>;
    fn wrap(self) -> Self::Output {
        Wrapper(self)
    }
}
