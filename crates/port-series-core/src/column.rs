//! Zero-copy loader for raw fixed-width column files.
//!
//! A column file is `count` little-endian 8-byte elements with no header and
//! no self-describing length; the count always comes from the port's sidecar
//! count file. Loading maps the first `count * 8` bytes of the file read-only
//! and hands the mapping to Arrow as the array's value buffer:
//!
//! - No intermediate copy is made on little-endian targets. The mapping is
//!   owned by the Arrow buffer through an `Arc`, so it stays alive for as long
//!   as any array (or slice of one) references it and is unmapped when the
//!   last reference drops.
//! - Arrays carry no validity bitmap: every element is present.
//! - The recorded count is checked against the file length before mapping.
//!   Touching mapped pages past the end of a file faults the process, so a
//!   short file is reported as [`ColumnError::Truncated`] instead.

use std::{fs::File, io, mem::size_of, path::Path, ptr::NonNull, sync::Arc};

use arrow::{
    array::{ArrayRef, PrimitiveArray, TimestampNanosecondArray, UInt64Array},
    buffer::{Buffer, ScalarBuffer},
    datatypes::{ArrowPrimitiveType, DataType, TimeUnit, TimestampNanosecondType, UInt64Type},
};
use log::debug;
use memmap2::MmapOptions;
use snafu::prelude::*;

/// Width in bytes of every element in a column file.
pub const ELEMENT_WIDTH: usize = 8;

/// Errors raised while loading a column file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ColumnError {
    /// The column file does not exist.
    #[snafu(display("Column file not found: {path}"))]
    NotFound {
        /// Path of the missing file.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Opening or inspecting the column file failed.
    #[snafu(display("I/O error reading column file {path}: {source}"))]
    Io {
        /// Path of the file being read.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The file holds fewer bytes than the recorded count requires.
    #[snafu(display(
        "Column file {path} is truncated: count requires {expected_bytes} bytes, file has {actual_bytes}"
    ))]
    Truncated {
        /// Path of the short file.
        path: String,
        /// `count * 8`.
        expected_bytes: u64,
        /// Actual file length.
        actual_bytes: u64,
    },

    /// `count * 8` does not fit in the address space.
    #[snafu(display("Record count {count} is too large to map column file {path}"))]
    CountOverflow {
        /// Path of the file being loaded.
        path: String,
        /// The recorded count.
        count: u64,
    },

    /// Creating the read-only memory map failed.
    #[snafu(display("Failed to memory-map column file {path}: {source}"))]
    Map {
        /// Path of the file being mapped.
        path: String,
        /// Underlying I/O error from the mapping call.
        source: io::Error,
    },
}

/// Element interpretation of a column file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Signed 64-bit nanoseconds since the Unix epoch.
    TimestampNanos,
    /// Unsigned 64-bit integers.
    UInt64,
}

impl ColumnKind {
    /// Arrow data type produced for this kind.
    pub fn data_type(self) -> DataType {
        match self {
            ColumnKind::TimestampNanos => DataType::Timestamp(TimeUnit::Nanosecond, None),
            ColumnKind::UInt64 => DataType::UInt64,
        }
    }
}

/// Arrow primitive types that can be decoded from an 8-byte column file.
pub trait FixedWidthColumn: ArrowPrimitiveType {
    /// Decode one little-endian element.
    fn decode_le(bytes: [u8; ELEMENT_WIDTH]) -> Self::Native;
}

impl FixedWidthColumn for TimestampNanosecondType {
    fn decode_le(bytes: [u8; ELEMENT_WIDTH]) -> i64 {
        i64::from_le_bytes(bytes)
    }
}

impl FixedWidthColumn for UInt64Type {
    fn decode_le(bytes: [u8; ELEMENT_WIDTH]) -> u64 {
        u64::from_le_bytes(bytes)
    }
}

/// Load `count` elements of `kind` from the column file at `path`.
pub fn load_column(count: u64, kind: ColumnKind, path: &Path) -> Result<ArrayRef, ColumnError> {
    Ok(match kind {
        ColumnKind::TimestampNanos => Arc::new(load_timestamp_column(count, path)?),
        ColumnKind::UInt64 => Arc::new(load_u64_column(count, path)?),
    })
}

/// Load a nanosecond timestamp column.
pub fn load_timestamp_column(
    count: u64,
    path: &Path,
) -> Result<TimestampNanosecondArray, ColumnError> {
    load_primitive::<TimestampNanosecondType>(count, path)
}

/// Load an unsigned 64-bit value column.
pub fn load_u64_column(count: u64, path: &Path) -> Result<UInt64Array, ColumnError> {
    load_primitive::<UInt64Type>(count, path)
}

/// Load `count` elements of `T` from `path`.
pub fn load_primitive<T: FixedWidthColumn>(
    count: u64,
    path: &Path,
) -> Result<PrimitiveArray<T>, ColumnError> {
    debug_assert_eq!(size_of::<T::Native>(), ELEMENT_WIDTH);
    let path_str = || path.display().to_string();

    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ColumnError::NotFound {
                path: path_str(),
                source,
            }
        } else {
            ColumnError::Io {
                path: path_str(),
                source,
            }
        }
    })?;

    let len = usize::try_from(count)
        .ok()
        .filter(|n| n.checked_mul(ELEMENT_WIDTH).is_some())
        .context(CountOverflowSnafu {
            path: path_str(),
            count,
        })?;
    let byte_len = len * ELEMENT_WIDTH;

    let actual_bytes = file.metadata().context(IoSnafu { path: path_str() })?.len();
    let expected_bytes = byte_len as u64;
    ensure!(
        actual_bytes >= expected_bytes,
        TruncatedSnafu {
            path: path_str(),
            expected_bytes,
            actual_bytes,
        }
    );
    if actual_bytes > expected_bytes {
        // Writers pre-allocate column files in page-sized steps.
        debug!(
            "ignoring {} trailing bytes in {}",
            actual_bytes - expected_bytes,
            path.display()
        );
    }

    if len == 0 {
        return Ok(PrimitiveArray::<T>::new(ScalarBuffer::from(Vec::new()), None));
    }

    // SAFETY: the file is opened read-only and the mapping never outlives the
    // buffer that owns it. Files must not be truncated by a writer while a
    // reader holds the mapping.
    let mmap = unsafe { MmapOptions::new().len(byte_len).map(&file) }
        .context(MapSnafu { path: path_str() })?;

    let values = if cfg!(target_endian = "little") {
        let ptr = NonNull::from(&mmap[..]).cast::<u8>();
        // SAFETY: `ptr` points at `byte_len` readable bytes owned by `mmap`,
        // which is moved into the buffer and dropped only with it. Mappings
        // are page-aligned, satisfying the 8-byte alignment ScalarBuffer needs.
        let buffer = unsafe { Buffer::from_custom_allocation(ptr, byte_len, Arc::new(mmap)) };
        ScalarBuffer::new(buffer, 0, len)
    } else {
        mmap.chunks_exact(ELEMENT_WIDTH)
            .map(|chunk| {
                let mut bytes = [0u8; ELEMENT_WIDTH];
                bytes.copy_from_slice(chunk);
                T::decode_le(bytes)
            })
            .collect::<Vec<_>>()
            .into()
    };

    Ok(PrimitiveArray::<T>::new(values, None))
}
