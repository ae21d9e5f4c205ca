use crate::error::WireError;
use std::str;

/// Width of the unsigned byte count written in front of a length-prefixed
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    U8,
    U16,
    U32,
    U64,
}

impl LengthPrefix {
    /// Number of bytes the prefix itself occupies.
    pub fn width(self) -> usize {
        match self {
            LengthPrefix::U8 => 1,
            LengthPrefix::U16 => 2,
            LengthPrefix::U32 => 4,
            LengthPrefix::U64 => 8,
        }
    }

    /// Largest payload length the prefix can express.
    pub fn max_len(self) -> u64 {
        match self {
            LengthPrefix::U8 => u8::MAX as u64,
            LengthPrefix::U16 => u16::MAX as u64,
            LengthPrefix::U32 => u32::MAX as u64,
            LengthPrefix::U64 => u64::MAX,
        }
    }
}

/// A little-endian byte cursor meant for reading.
///
/// Every read advances the cursor by exactly the number of bytes consumed and
/// fails with [`WireError::BufferUnderflow`] instead of reading past the end.
///
/// ```
/// let mut bb = tbs_wire::ByteReader::new(&[0x34, 0x12, 1, 0x61, 0x62, 0, 0]);
/// assert_eq!(bb.read_u16(), Ok(0x1234));
/// assert_eq!(bb.read_bool(), Ok(true));
/// assert_eq!(bb.read_fixed_string(4), Ok("ab".to_owned()));
/// assert!(bb.is_empty());
/// ```
///
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a new ByteReader that wraps the provided byte slice. The
    /// lifetime of the returned ByteReader must not outlive the lifetime of the
    /// byte slice.
    pub fn new(data: &'a [u8]) -> ByteReader<'a> {
        ByteReader { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Try to read a boolean. Any nonzero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        Ok(i8::from_le_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// Try to read an IEEE-754 single precision float.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Try to read an IEEE-754 double precision float.
    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Try to read `len` raw bytes. The result aliases the underlying memory.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if len > self.remaining() {
            return Err(WireError::BufferUnderflow {
                needed: len,
                available: self.remaining(),
            });
        }
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    /// Try to read exactly `N` raw bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        self.take()
    }

    /// Consume everything that is left.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let value = &self.data[self.index..];
        self.index = self.data.len();
        value
    }

    /// Try to read a zero-padded string occupying exactly `size` bytes. The
    /// string ends at the first zero byte, or after `size` bytes if there is
    /// none.
    pub fn read_fixed_string(&mut self, size: usize) -> Result<String, WireError> {
        let bytes = self.read_bytes(size)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Try to read a byte count of the given width followed by that many bytes.
    pub fn read_length_prefixed(&mut self, prefix: LengthPrefix) -> Result<&'a [u8], WireError> {
        let len = match prefix {
            LengthPrefix::U8 => self.read_u8()? as u64,
            LengthPrefix::U16 => self.read_u16()? as u64,
            LengthPrefix::U32 => self.read_u32()? as u64,
            LengthPrefix::U64 => self.read_u64()?,
        };
        let len = usize::try_from(len).map_err(|_| WireError::BufferUnderflow {
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        self.read_bytes(len)
    }

    pub fn read_length_prefixed_string(&mut self, prefix: LengthPrefix) -> Result<String, WireError> {
        let bytes = self.read_length_prefixed(prefix)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn read_remaining_string(&mut self) -> String {
        String::from_utf8_lossy(self.read_remaining()).into_owned()
    }

    /// Decode items from a length-prefixed span until the span is exhausted.
    pub fn read_length_prefixed_items<T, F>(
        &mut self,
        prefix: LengthPrefix,
        read_item: F,
    ) -> Result<Vec<T>, WireError>
    where
        F: FnMut(&mut ByteReader<'a>) -> Result<T, WireError>,
    {
        let span = self.read_length_prefixed(prefix)?;
        ByteReader::new(span).read_items(read_item)
    }

    /// Decode items until this reader is exhausted.
    pub fn read_items<T, F>(&mut self, mut read_item: F) -> Result<Vec<T>, WireError>
    where
        F: FnMut(&mut ByteReader<'a>) -> Result<T, WireError>,
    {
        let mut items = Vec::new();
        while !self.is_empty() {
            let start = self.index;
            items.push(read_item(self)?);
            if self.index == start {
                return Err(WireError::EmptyItem {
                    remaining: self.remaining(),
                });
            }
        }
        Ok(items)
    }
}

#[test]
fn read_bool() {
    let read = |bytes: &[u8]| ByteReader::new(bytes).read_bool();
    assert_eq!(read(&[]), Err(WireError::BufferUnderflow { needed: 1, available: 0 }));
    assert_eq!(read(&[0]), Ok(false));
    assert_eq!(read(&[1]), Ok(true));
    assert_eq!(read(&[2]), Ok(true));
}

#[test]
fn read_u8() {
    let read = |bytes: &[u8]| ByteReader::new(bytes).read_u8();
    assert!(read(&[]).is_err());
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_integers_little_endian() {
    assert_eq!(ByteReader::new(&[0x34, 0x12]).read_u16(), Ok(0x1234));
    assert_eq!(ByteReader::new(&[0x78, 0x56, 0x34, 0x12]).read_u32(), Ok(0x1234_5678));
    assert_eq!(
        ByteReader::new(&[8, 7, 6, 5, 4, 3, 2, 1]).read_u64(),
        Ok(0x0102_0304_0506_0708)
    );
    assert_eq!(ByteReader::new(&[0xFF]).read_i8(), Ok(-1));
    assert_eq!(ByteReader::new(&[0xFE, 0xFF]).read_i16(), Ok(-2));
    assert_eq!(ByteReader::new(&[0, 0, 0, 0x80]).read_i32(), Ok(i32::MIN));
    assert_eq!(
        ByteReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]).read_i64(),
        Ok(i64::MAX)
    );
}

#[test]
fn read_floats() {
    assert_eq!(ByteReader::new(&[0, 0, 0x80, 0x3F]).read_f32(), Ok(1.0));
    assert_eq!(ByteReader::new(&[0, 0, 0, 0xC0]).read_f32(), Ok(-2.0));
    assert_eq!(
        ByteReader::new(&[0, 0, 0, 0, 0, 0, 0xF0, 0x3F]).read_f64(),
        Ok(1.0)
    );
    assert_eq!(
        ByteReader::new(&[0, 0, 0xC0, 0x7F]).read_f32().map(|f| f.is_nan()),
        Ok(true)
    );
}

#[test]
fn read_underflow_does_not_advance() {
    let mut bb = ByteReader::new(&[1, 2, 3]);
    assert_eq!(
        bb.read_u32(),
        Err(WireError::BufferUnderflow { needed: 4, available: 3 })
    );
    assert_eq!(bb.index(), 0);
    assert_eq!(bb.read_u16(), Ok(0x0201));
    assert_eq!(
        bb.read_u16(),
        Err(WireError::BufferUnderflow { needed: 2, available: 1 })
    );
}

#[test]
fn read_bytes() {
    assert_eq!(ByteReader::new(&[]).read_bytes(0), Ok(&[] as &[u8]));
    assert!(ByteReader::new(&[]).read_bytes(1).is_err());
    assert_eq!(ByteReader::new(&[0]).read_bytes(1), Ok(&[0u8] as &[u8]));
    assert!(ByteReader::new(&[0]).read_bytes(2).is_err());

    let mut bb = ByteReader::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(&[1u8, 2, 3] as &[u8]));
    assert_eq!(bb.read_array::<2>(), Ok([4, 5]));
    assert!(bb.read_bytes(1).is_err());
}

#[test]
fn read_fixed_string() {
    let read = |bytes: &[u8], size| ByteReader::new(bytes).read_fixed_string(size);
    assert_eq!(read(&[0x61, 0x62, 0, 0, 0, 0, 0, 0], 8), Ok("ab".to_owned()));
    assert_eq!(read(&[0x61, 0x62, 0x63], 3), Ok("abc".to_owned()));
    assert_eq!(read(&[0, 0x62], 2), Ok("".to_owned()));
    assert_eq!(read(&[240, 159, 141, 149], 4), Ok("🍕".to_owned()));
    assert!(read(&[0x61], 2).is_err());
}

#[test]
fn read_length_prefixed() {
    let mut data = vec![100, 0];
    data.extend(std::iter::repeat(7u8).take(100));
    let mut bb = ByteReader::new(&data);
    let payload = bb.read_length_prefixed(LengthPrefix::U16).unwrap();
    assert_eq!(payload.len(), 100);
    assert!(payload.iter().all(|&b| b == 7));
    assert!(bb.is_empty());

    assert_eq!(
        ByteReader::new(&[3, 1, 2]).read_length_prefixed(LengthPrefix::U8),
        Err(WireError::BufferUnderflow { needed: 3, available: 2 })
    );
    assert_eq!(
        ByteReader::new(&[2, 0, 0, 0, 0x68, 0x69]).read_length_prefixed_string(LengthPrefix::U32),
        Ok("hi".to_owned())
    );
}

#[test]
fn read_items() {
    let mut bb = ByteReader::new(&[4, 1, 0, 2, 0, 9]);
    let items = bb.read_length_prefixed_items(LengthPrefix::U8, |r| r.read_u16());
    assert_eq!(items, Ok(vec![1, 2]));
    assert_eq!(bb.read_items(|r| r.read_u8()), Ok(vec![9]));

    // A span that ends in the middle of an element is an underflow.
    let mut bb = ByteReader::new(&[3, 1, 0, 2]);
    assert!(bb.read_length_prefixed_items(LengthPrefix::U8, |r| r.read_u16()).is_err());
}

#[test]
fn read_items_rejects_empty_items() {
    let mut bb = ByteReader::new(&[1, 0xAA]);
    assert_eq!(
        bb.read_length_prefixed_items(LengthPrefix::U8, |_| Ok(())),
        Err(WireError::EmptyItem { remaining: 1 })
    );
    assert_eq!(ByteReader::new(&[]).read_items(|_| Ok(())), Ok(vec![]));
}

#[test]
fn read_remaining() {
    let mut bb = ByteReader::new(&[1, 0x68, 0x69]);
    assert_eq!(bb.read_u8(), Ok(1));
    assert_eq!(bb.read_remaining_string(), "hi");
    assert_eq!(bb.read_remaining(), &[] as &[u8]);
}

/// A little-endian byte cursor meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = tbs_wire::ByteWriter::new();
/// bb.write_u16(0x1234);
/// bb.write_fixed_string("ab", 4);
/// assert_eq!(bb.data(), [0x34, 0x12, 0x61, 0x62, 0, 0]);
/// ```
///
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty ByteWriter ready for writing.
    pub fn new() -> ByteWriter {
        ByteWriter { data: vec![] }
    }

    pub fn with_capacity(capacity: usize) -> ByteWriter {
        ByteWriter {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a boolean as a single 0 or 1 byte.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(if value { 1 } else { 0 });
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i8(&mut self, value: i8) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Write the IEEE-754 bit pattern of a single precision float.
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Write the IEEE-754 bit pattern of a double precision float.
    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Write exactly `size` bytes: `value` truncated or padded with zeros.
    pub fn write_fixed_bytes(&mut self, value: &[u8], size: usize) {
        let used = value.len().min(size);
        self.data.extend_from_slice(&value[..used]);
        self.data.resize(self.data.len() + (size - used), 0);
    }

    /// Write the UTF-8 bytes of `value` into exactly `size` bytes, truncating
    /// or padding with zeros.
    pub fn write_fixed_string(&mut self, value: &str, size: usize) {
        self.write_fixed_bytes(value.as_bytes(), size);
    }

    /// Write a byte count of the given width followed by the payload.
    pub fn write_length_prefixed(&mut self, prefix: LengthPrefix, value: &[u8]) -> Result<(), WireError> {
        let len = value.len();
        if len as u64 > prefix.max_len() {
            return Err(WireError::LengthOverflow {
                len,
                max: prefix.max_len(),
            });
        }
        match prefix {
            LengthPrefix::U8 => self.write_u8(len as u8),
            LengthPrefix::U16 => self.write_u16(len as u16),
            LengthPrefix::U32 => self.write_u32(len as u32),
            LengthPrefix::U64 => self.write_u64(len as u64),
        }
        self.write_bytes(value);
        Ok(())
    }

    /// Encode `items` into a scratch buffer and write it with a byte-count
    /// prefix.
    pub fn write_length_prefixed_items<T, F>(
        &mut self,
        prefix: LengthPrefix,
        items: &[T],
        write_item: F,
    ) -> Result<(), WireError>
    where
        F: FnMut(&mut ByteWriter, &T) -> Result<(), WireError>,
    {
        let mut scratch = ByteWriter::new();
        scratch.write_items(items, write_item)?;
        self.write_length_prefixed(prefix, &scratch.data)
    }

    /// Encode `items` back to back with no count in front.
    pub fn write_items<T, F>(&mut self, items: &[T], mut write_item: F) -> Result<(), WireError>
    where
        F: FnMut(&mut ByteWriter, &T) -> Result<(), WireError>,
    {
        for item in items {
            write_item(self, item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteWriter)) -> Vec<u8> {
    let mut bb = ByteWriter::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0]);
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
}

#[test]
fn write_integers_little_endian() {
    assert_eq!(write_once(|bb| bb.write_u8(255)), [255]);
    assert_eq!(write_once(|bb| bb.write_u16(0x1234)), [0x34, 0x12]);
    assert_eq!(write_once(|bb| bb.write_u32(0x1234_5678)), [0x78, 0x56, 0x34, 0x12]);
    assert_eq!(
        write_once(|bb| bb.write_u64(0x0102_0304_0506_0708)),
        [8, 7, 6, 5, 4, 3, 2, 1]
    );
    assert_eq!(write_once(|bb| bb.write_i8(-1)), [0xFF]);
    assert_eq!(write_once(|bb| bb.write_i16(-2)), [0xFE, 0xFF]);
    assert_eq!(write_once(|bb| bb.write_i32(i32::MIN)), [0, 0, 0, 0x80]);
    assert_eq!(write_once(|bb| bb.write_i64(-1)), [0xFF; 8]);
}

#[test]
fn write_floats() {
    assert_eq!(write_once(|bb| bb.write_f32(1.0)), [0, 0, 0x80, 0x3F]);
    assert_eq!(write_once(|bb| bb.write_f32(-2.0)), [0, 0, 0, 0xC0]);
    assert_eq!(write_once(|bb| bb.write_f64(1.0)), [0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
}

#[test]
fn write_fixed_string() {
    assert_eq!(
        write_once(|bb| bb.write_fixed_string("ab", 8)),
        [0x61, 0x62, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(write_once(|bb| bb.write_fixed_string("abcdef", 3)), [0x61, 0x62, 0x63]);
    assert_eq!(write_once(|bb| bb.write_fixed_string("", 2)), [0, 0]);
    assert_eq!(write_once(|bb| bb.write_fixed_bytes(&[9, 9], 3)), [9, 9, 0]);
}

#[test]
fn write_length_prefixed() {
    let payload = vec![7u8; 100];
    let mut bb = ByteWriter::new();
    bb.write_length_prefixed(LengthPrefix::U16, &payload).unwrap();
    let data = bb.data();
    assert_eq!(data.len(), 102);
    assert_eq!(&data[..2], &[100, 0]);
    assert_eq!(&data[2..], payload.as_slice());

    let mut bb = ByteWriter::new();
    assert_eq!(
        bb.write_length_prefixed(LengthPrefix::U8, &[0u8; 256]),
        Err(WireError::LengthOverflow { len: 256, max: 255 })
    );
    assert!(bb.is_empty());
}

#[test]
fn write_items() {
    let mut bb = ByteWriter::new();
    bb.write_length_prefixed_items(LengthPrefix::U8, &[1u16, 2], |w, item| {
        w.write_u16(*item);
        Ok(())
    })
    .unwrap();
    bb.write_items(&[true, false], |w, item| {
        w.write_bool(*item);
        Ok(())
    })
    .unwrap();
    assert_eq!(bb.data(), [4, 1, 0, 2, 0, 1, 0]);
}

#[test]
fn write_sequence() {
    let mut bb = ByteWriter::new();
    bb.write_f32(1.0);
    bb.write_fixed_string("🍕", 5);
    bb.write_length_prefixed(LengthPrefix::U32, b"hi").unwrap();
    let data = bb.data();
    assert_eq!(
        data,
        [0, 0, 0x80, 0x3F, 240, 159, 141, 149, 0, 2, 0, 0, 0, 0x68, 0x69]
    );

    let mut bb = ByteReader::new(&data);
    assert_eq!(bb.read_f32(), Ok(1.0));
    assert_eq!(bb.read_fixed_string(5), Ok("🍕".to_owned()));
    assert_eq!(bb.read_length_prefixed(LengthPrefix::U32), Ok(b"hi".as_slice()));
    assert!(bb.is_empty());
}
