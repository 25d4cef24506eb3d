//! Little-endian primitive reading and writing over byte slices.
//!
//! Every multi-byte value in a method body, a metadata token, a coded index or an import
//! lookup entry is stored little-endian. This module provides the bounds-checked primitives
//! the higher level codecs are built from:
//!
//! - [`crate::file::io::CilIO`] - conversion between primitive types and their byte arrays
//! - [`crate::file::io::read_le_at`] / [`crate::file::io::write_le_at`] - fixed-width access with
//!   an advancing offset
//! - [`crate::file::io::read_le_at_dyn`] / [`crate::file::io::write_le_at_dyn`] - 2 or 4 byte
//!   access, as used for heap and coded indices
//!
//! # Examples
//!
//! ```rust
//! use dotcil::file::io::{read_le_at, read_le_at_dyn, write_le_at_dyn};
//!
//! let mut data = [0u8; 6];
//! let mut offset = 0;
//! write_le_at_dyn(&mut data, &mut offset, 1, false)?;
//! write_le_at_dyn(&mut data, &mut offset, 2, true)?;
//! assert_eq!(offset, 6);
//!
//! offset = 0;
//! assert_eq!(read_le_at::<u16>(&data, &mut offset)?, 1);
//! assert_eq!(read_le_at_dyn(&data, &mut offset, true)?, 2);
//! # Ok::<(), dotcil::Error>(())
//! ```
//!
//! # Error Handling
//!
//! Reads and writes that would cross the end of the buffer fail with
//! [`crate::Error::TruncatedStream`], carrying the offset of the attempted access.

use crate::Result;

/// Conversion between a primitive value and its fixed-size byte representation.
///
/// Implemented for all integer and floating point types that appear in CIL operands and
/// metadata structures.
pub trait CilIO: Sized + Copy {
    /// The byte array holding one encoded value (e.g. `[u8; 4]` for `u32`)
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode `Self` from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Encode `Self` into little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

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

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Read a value from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a value at `offset` and advance `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len).filter(|end| *end <= data.len()) else {
        return Err(truncated_error!(*offset, type_len));
    };

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(truncated_error!(*offset, type_len));
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Read a 4 byte value if `is_large`, otherwise a 2 byte value widened to `u32`.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if the buffer is too short.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}

/// Write a value to the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if `data` is shorter than `T`.
pub fn write_le<T: CilIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_le_at(data, &mut offset, value)
}

/// Write a value at `offset` and advance `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if fewer than `size_of::<T>()` bytes remain.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len).filter(|end| *end <= data.len()) else {
        return Err(truncated_error!(*offset, type_len));
    };

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;

    Ok(())
}

/// Write `value` as 4 bytes if `is_large`, otherwise as 2 bytes.
///
/// The 2 byte form truncates; callers size the field so that `value` fits.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if the buffer is too short.
pub fn write_le_at_dyn(
    data: &mut [u8],
    offset: &mut usize,
    value: u32,
    is_large: bool,
) -> Result<()> {
    if is_large {
        write_le_at::<u32>(data, offset, value)?;
    } else {
        write_le_at::<u16>(data, offset, value as u16)?;
    }

    Ok(())
}
