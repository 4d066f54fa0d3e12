// Field-by-field little endian cursors, caller checks the length up front

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn u8(&mut self) -> u8 {
        let value = self.buf[self.offset];
        self.offset += 1;
        value
    }

    pub fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut array = [0u8; N];
        array.copy_from_slice(&self.buf[self.offset..self.offset + N]);
        self.offset += N;
        array
    }
}

pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf[self.offset] = value;
        self.offset += 1;
    }

    pub fn put(&mut self, bytes: &[u8]) {
        self.buf[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
    }
}

macro_rules! define {
    ($type:ty, $read:ident, $write:ident) => {
        impl<'a> Reader<'a> {
            #[inline]
            pub fn $read(&mut self) -> $type {
                <$type>::from_le_bytes(self.bytes())
            }
        }

        impl<'a> Writer<'a> {
            #[inline]
            pub fn $write(&mut self, value: $type) {
                self.put(&<$type>::to_le_bytes(value))
            }
        }
    };
}

define!(i64, i64, put_i64);
