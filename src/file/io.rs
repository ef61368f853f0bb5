//! Low-level byte order and safe reading/writing utilities for the abc container.
//!
//! Every multi-byte field of the container and of function bodies is stored in little-endian
//! byte order. This module provides bounds-checked reading of primitives at an offset, in-place
//! patching of already emitted fields, and appending writers used by the serializers, together
//! with the compressed unsigned integer encoding that keeps record tables small.
//!
//! # Key Components
//!
//! - [`crate::file::io::AbcIO`] - Trait defining little-endian conversion for primitive types
//! - [`crate::file::io::read_le`] / [`crate::file::io::read_le_at`] - Bounds-checked reads
//! - [`crate::file::io::write_le_at`] - In-place patching of a previously reserved field
//! - [`crate::file::io::push_le`] - Appends a primitive to a growing buffer
//! - [`crate::file::io::write_compressed_uint`] - Appends a compressed unsigned integer
//!
//! # Compressed Integers
//!
//! | Range                  | Bytes | Prefix     |
//! |------------------------|-------|------------|
//! | `0x00..=0x7F`          | 1     | `0xxxxxxx` |
//! | `0x80..=0x3FFF`        | 2     | `10xxxxxx` |
//! | `0x4000..=0x1FFF_FFFF` | 4     | `110xxxxx` |
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use abckit::file::io::{push_le, read_le_at, write_compressed_uint};
//!
//! let mut buffer = Vec::new();
//! push_le(&mut buffer, 0x1234_u16);
//! write_compressed_uint(300, &mut buffer)?;
//!
//! let mut offset = 0;
//! let value: u16 = read_le_at(&buffer, &mut offset)?;
//! assert_eq!(value, 0x1234);
//! # Ok::<(), abckit::Error>(())
//! ```

use crate::Result;

/// Largest value representable by the compressed unsigned integer encoding.
pub const COMPRESSED_UINT_MAX: u32 = 0x1FFF_FFFF;

/// Trait for primitive types that can be read from and written to little-endian byte buffers.
///
/// The associated `Bytes` array type is the fixed-size representation used by the standard
/// library conversion functions.
pub trait AbcIO: Sized + Copy {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_abc_io {
    ($($ty:ty => $len:literal),* $(,)?) => {
        $(
            impl AbcIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_abc_io!(
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
);

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: AbcIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`.
///
/// The offset is advanced by the size of `T` on success and left untouched on failure.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
///
/// # Examples
///
/// ```rust,ignore
/// use abckit::file::io::read_le_at;
///
/// let data = [0x01, 0x00, 0x02, 0x00];
/// let mut offset = 0;
/// assert_eq!(read_le_at::<u16>(&data, &mut offset)?, 1);
/// assert_eq!(read_le_at::<u16>(&data, &mut offset)?, 2);
/// assert_eq!(offset, 4);
/// # Ok::<(), abckit::Error>(())
/// ```
pub fn read_le_at<T: AbcIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Overwrites a value of type `T` in little-endian byte order at `offset`.
///
/// Used to patch fields such as section offsets that are only known after the data they
/// describe has been emitted. The offset is advanced by the size of `T`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the field does not fit into `data`.
pub fn write_le_at<T: AbcIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;
    Ok(())
}

/// Appends a value of type `T` in little-endian byte order to `buffer`.
pub fn push_le<T: AbcIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}

/// Appends `value` using the compressed unsigned integer encoding.
///
/// # Errors
///
/// Returns [`crate::Error::BadArgument`] if `value` exceeds [`COMPRESSED_UINT_MAX`].
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    if value < 0x80 {
        #[allow(clippy::cast_possible_truncation)]
        buffer.push(value as u8);
    } else if value < 0x4000 {
        #[allow(clippy::cast_possible_truncation)]
        buffer.extend_from_slice(&[0x80 | (value >> 8) as u8, value as u8]);
    } else if value <= COMPRESSED_UINT_MAX {
        #[allow(clippy::cast_possible_truncation)]
        buffer.extend_from_slice(&[
            0xC0 | (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ]);
    } else {
        return Err(bad_argument!(
            "value {:#x} can not be stored as a compressed integer",
            value
        ));
    }
    Ok(())
}

/// Appends a `usize` count or index using the compressed unsigned integer encoding.
///
/// # Errors
///
/// Returns [`crate::Error::BadArgument`] if `value` exceeds [`COMPRESSED_UINT_MAX`].
pub fn write_compressed_usize(value: usize, buffer: &mut Vec<u8>) -> Result<()> {
    let Ok(value) = u32::try_from(value) else {
        return Err(bad_argument!("value {} is too large for the format", value));
    };
    write_compressed_uint(value, buffer)
}

/// Appends `value` as a compressed length followed by its UTF-8 bytes.
///
/// # Errors
///
/// Returns [`crate::Error::BadArgument`] if the string is longer than [`COMPRESSED_UINT_MAX`].
pub fn write_compressed_string_utf8(value: &str, buffer: &mut Vec<u8>) -> Result<()> {
    write_compressed_usize(value.len(), buffer)?;
    buffer.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Returns the number of bytes `value` occupies in compressed form.
#[must_use]
pub fn compressed_uint_size(value: u32) -> usize {
    if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else {
        4
    }
}
