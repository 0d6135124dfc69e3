//! Canonical binary encoding primitives
//!
//! All integers are little endian. Variable length integers use the
//! 0xFD / 0xFE / 0xFF prefixed form, and byte strings are prefixed by a
//! variable length integer holding their length.

use crate::errors::SerializationError;

pub fn write_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn write_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_i64(buf: &mut Vec<u8>, value: i64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_var_uint(buf: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        buf.push(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.push(0xFD);
        write_u16(buf, value as u16);
    } else if value <= u32::MAX as u64 {
        buf.push(0xFE);
        write_u32(buf, value as u32);
    } else {
        buf.push(0xFF);
        write_u64(buf, value);
    }
}

pub fn write_var_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_var_uint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

pub fn write_var_string(buf: &mut Vec<u8>, value: &str) {
    write_var_bytes(buf, value.as_bytes());
}

/// Cursor over a byte slice that reads the canonical encoding
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], SerializationError> {
        if self.remaining() < len {
            return Err(SerializationError::UnexpectedEof(what.to_string()));
        }
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], SerializationError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, what)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8, SerializationError> {
        Ok(self.read_bytes(1, what)?[0])
    }

    pub fn read_u16(&mut self, what: &str) -> Result<u16, SerializationError> {
        Ok(u16::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32, SerializationError> {
        Ok(u32::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_u64(&mut self, what: &str) -> Result<u64, SerializationError> {
        Ok(u64::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_i64(&mut self, what: &str) -> Result<i64, SerializationError> {
        Ok(i64::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_var_uint(&mut self, what: &str) -> Result<u64, SerializationError> {
        match self.read_u8(what)? {
            0xFD => Ok(self.read_u16(what)? as u64),
            0xFE => Ok(self.read_u32(what)? as u64),
            0xFF => self.read_u64(what),
            n => Ok(n as u64),
        }
    }

    pub fn read_var_bytes(&mut self, what: &str) -> Result<Vec<u8>, SerializationError> {
        let len = self.read_var_uint(what)?;
        if len > self.remaining() as u64 {
            return Err(SerializationError::UnexpectedEof(what.to_string()));
        }
        Ok(self.read_bytes(len as usize, what)?.to_vec())
    }

    pub fn read_var_string(&mut self, what: &str) -> Result<String, SerializationError> {
        let bytes = self.read_var_bytes(what)?;
        String::from_utf8(bytes).map_err(|e| SerializationError::InvalidValue {
            field: what.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_uint_boundaries() {
        let cases: [(u64, usize); 5] = [
            (0xFC, 1),
            (0xFD, 3),
            (u16::MAX as u64, 3),
            (u16::MAX as u64 + 1, 5),
            (u32::MAX as u64 + 1, 9),
        ];
        for (value, len) in cases {
            let mut buf = Vec::new();
            write_var_uint(&mut buf, value);
            assert_eq!(buf.len(), len, "encoded length for {value}");
            let mut reader = ByteReader::new(&buf);
            assert_eq!(reader.read_var_uint("test").unwrap(), value);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_var_bytes_length_past_end_fails() {
        let buf = vec![5u8, 1, 2];
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(
            reader.read_var_bytes("payload"),
            Err(SerializationError::UnexpectedEof(_))
        ));
    }
}
