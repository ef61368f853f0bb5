//! Low-level byte stream parser for container records and function bodies.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data parser
//! used by the container loader and by the bytecode decoder. It offers bounds-checked access to
//! binary data with support for little-endian primitives, compressed unsigned integers and
//! length-prefixed UTF-8 strings.
//!
//! Every read is bounds checked and fails with [`crate::Error::OutOfBounds`] instead of
//! panicking, so truncated sections surface as load errors. Counts read from the input are
//! checked against the remaining bytes before anything is allocated for them
//! ([`crate::file::parser::Parser::read_count`]).
//!
//! # Usage Examples
//!
//! ```rust
//! use abckit::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! let first = parser.read_le::<u32>()?;
//! assert_eq!(first, 0x04030201);
//!
//! parser.seek(6)?;
//! let last_bytes = parser.read_le::<u16>()?;
//! assert_eq!(last_bytes, 0x0807);
//! # Ok::<(), abckit::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, AbcIO},
    Result,
};

/// Cursor over a section or a function body.
///
/// # Examples
///
/// ```rust
/// use abckit::Parser;
///
/// // "abc" as a length-prefixed string followed by a compressed 300
/// let data = [0x03, b'a', b'b', b'c', 0x81, 0x2C];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_compressed_string_utf8()?, "abc");
/// assert_eq!(parser.read_compressed_uint()?, 300);
/// assert!(!parser.has_more_data());
/// # Ok::<(), abckit::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if there is more data to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move to a specific position in the data.
    ///
    /// Seeking to the very end is allowed and leaves the parser exhausted.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is beyond the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.position = self.calc_end_position(step)?;
        Ok(())
    }

    /// Get the current position of the parser within the data.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Read a type `T` from the current position in little-endian format and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes remaining.
    pub fn read_le<T: AbcIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a compressed unsigned integer.
    ///
    /// The first byte selects a 1, 2 or 4 byte encoding through its top bits (`0`, `10`,
    /// `110`); the remaining bits hold the value in big-endian order.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an invalid prefix.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use abckit::Parser;
    ///
    /// let data = [0x7F, 0x80, 0x80];
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_compressed_uint()?, 127);
    /// assert_eq!(parser.read_compressed_uint()?, 128);
    /// # Ok::<(), abckit::Error>(())
    /// ```
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed unsigned integer used as a count or arena index.
    ///
    /// # Errors
    /// Same as [`Parser::read_compressed_uint`].
    pub fn read_compressed_index(&mut self) -> Result<usize> {
        Ok(self.read_compressed_uint()? as usize)
    }

    /// Read a record count and check it against the bytes that are left.
    ///
    /// Every record occupies at least `min_record_size` bytes, so a count that could not
    /// possibly fit is rejected before anything is allocated for it.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the count can not fit into the remaining data.
    pub fn read_count(&mut self, min_record_size: usize) -> Result<usize> {
        let count = self.read_compressed_index()?;
        if count.saturating_mul(min_record_size.max(1)) > self.remaining() {
            return Err(malformed_error!(
                "Record count {} exceeds the remaining {} bytes",
                count,
                self.remaining()
            ));
        }
        Ok(count)
    }

    /// Read a UTF-8 string prefixed by its compressed byte length.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the string extends past the data or
    /// [`crate::Error::Malformed`] if it is not valid UTF-8.
    pub fn read_compressed_string_utf8(&mut self) -> Result<String> {
        let length = self.read_compressed_index()?;
        let start = self.position;
        let string_data = self.read_bytes(length)?;

        String::from_utf8(string_data.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                start + length,
                e.utf8_error()
            )
        })
    }

    /// Returns the number of bytes left after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Computes the position `length` bytes ahead, checking it stays inside the data.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on overflow or if the end lies past the data.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.len(), 4);
        assert!(parser.has_more_data());
        parser.advance_by(3).unwrap();
        assert_eq!(parser.pos(), 3);
        assert_eq!(parser.peek_byte().unwrap(), 0x04);
        assert!(parser.advance_by(2).is_err());
        assert_eq!(parser.pos(), 3);

        parser.seek(4).unwrap();
        assert!(!parser.has_more_data());
        assert!(parser.peek_byte().is_err());
        assert!(parser.seek(5).is_err());
    }

    #[test]
    fn compressed_uint_encodings() {
        let data = [0x05, 0xBF, 0xFF, 0xC0, 0x00, 0x40, 0x00];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_compressed_uint().unwrap(), 5);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x3FFF);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x4000);
    }

    #[test]
    fn compressed_uint_invalid_prefix() {
        let data = [0xE0, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn compressed_uint_truncated() {
        let data = [0xC0, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(crate::Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn strings() {
        let data = [0x02, b'h', b'i', 0x02, 0xFF, 0xFE, 0x09, b'x'];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_compressed_string_utf8().unwrap(), "hi");
        assert!(parser.read_compressed_string_utf8().is_err());

        let mut parser = Parser::new(&data[6..]);
        assert!(parser.read_compressed_string_utf8().is_err());
    }

    #[test]
    fn record_count_guard() {
        let data = [0x10, 0x00, 0x00];
        let mut parser = Parser::new(&data);
        assert!(parser.read_count(1).is_err());

        let data = [0x02, 0x00, 0x00];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_count(1).unwrap(), 2);
    }
}
