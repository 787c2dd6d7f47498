//! Positioned view over a run of bytes read from the map file.

use std::io::Read;

use crate::geometry::Tag;
use crate::mapfile::MapFileError;

/// Decodes big-endian fixed-width integers, variable-length integers,
/// length-prefixed UTF-8 strings and raw byte runs from a buffered window.
/// Any read that would cross the window fails with
/// [`MapFileError::MalformedInput`].
pub struct ReadBuffer {
    data: Vec<u8>,
    position: usize,
}

impl ReadBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Fill a new buffer with exactly `length` bytes from the reader.
    pub fn from_reader(reader: &mut impl Read, length: usize) -> std::io::Result<Self> {
        let mut data = vec![0u8; length];
        reader.read_exact(&mut data)?;
        Ok(Self::new(data))
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn take(&mut self, count: usize) -> Result<&[u8], MapFileError> {
        if count > self.data.len() - self.position {
            return Err(MapFileError::MalformedInput(format!(
                "read of {} bytes at position {} crosses the buffered window of {} bytes",
                count,
                self.position,
                self.data.len()
            )));
        }
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), MapFileError> {
        self.take(count).map(|_| ())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8], MapFileError> {
        self.take(count)
    }

    pub fn read_byte(&mut self) -> Result<u8, MapFileError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_short(&mut self) -> Result<i16, MapFileError> {
        let bytes = self.take(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_int(&mut self) -> Result<i32, MapFileError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_long(&mut self) -> Result<i64, MapFileError> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Variable-length unsigned integer: 7 payload bits per byte, the most
    /// significant bit marks continuation, least significant group first.
    pub fn read_unsigned_int(&mut self) -> Result<u32, MapFileError> {
        let mut value: u64 = 0;
        let mut shift = 0;

        loop {
            let byte = self.read_byte()?;
            if shift > 28 {
                return Err(MapFileError::MalformedInput(
                    "variable-length integer overflows 32 bits".into(),
                ));
            }
            if byte & 0x80 != 0 {
                value |= ((byte & 0x7f) as u64) << shift;
                shift += 7;
            } else {
                value |= (byte as u64) << shift;
                return u32::try_from(value).map_err(|_| {
                    MapFileError::MalformedInput(
                        "variable-length integer overflows 32 bits".into(),
                    )
                });
            }
        }
    }

    /// Variable-length signed integer: like [`read_unsigned_int`], but the
    /// sixth bit of the terminating byte carries the sign.
    ///
    /// [`read_unsigned_int`]: ReadBuffer::read_unsigned_int
    pub fn read_signed_int(&mut self) -> Result<i32, MapFileError> {
        let mut value: i64 = 0;
        let mut shift = 0;

        loop {
            let byte = self.read_byte()?;
            if shift > 28 {
                return Err(MapFileError::MalformedInput(
                    "variable-length integer overflows 32 bits".into(),
                ));
            }
            if byte & 0x80 != 0 {
                value |= ((byte & 0x7f) as i64) << shift;
                shift += 7;
            } else {
                value |= ((byte & 0x3f) as i64) << shift;
                if byte & 0x40 != 0 {
                    value = -value;
                }
                return i32::try_from(value).map_err(|_| {
                    MapFileError::MalformedInput(
                        "variable-length integer overflows 32 bits".into(),
                    )
                });
            }
        }
    }

    /// Length-prefixed UTF-8 string; the length is a variable-length
    /// unsigned integer.
    pub fn read_utf8_encoded_string(&mut self) -> Result<String, MapFileError> {
        let length = self.read_unsigned_int()? as usize;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| MapFileError::MalformedInput("string is not valid UTF-8".into()))
    }

    /// Read a tag table index and resolve it against the table.
    pub fn read_tag(&mut self, table: &[Tag]) -> Result<Tag, MapFileError> {
        let id = self.read_unsigned_int()? as usize;
        table.get(id).cloned().ok_or_else(|| {
            MapFileError::MalformedInput(format!(
                "tag index {} exceeds the tag table of {} entries",
                id,
                table.len()
            ))
        })
    }
}
