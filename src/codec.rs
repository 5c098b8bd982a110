//! Fixed-size binary ellipse records.
//!
//! A record is exactly [`RECORD_LEN`] bytes: five big-endian IEEE-754
//! single-precision floats in the order `center_x, center_y, major_axis,
//! minor_axis, rotation_angle`. Records for image `i` live at
//! `{output_dir}/{i:05}.bin`. Other tools locate records by this name, so both
//! the layout and the naming rule are fixed.

use crate::error::{OvalError, Result};
use crate::types::EllipseDescriptor;
use std::path::{Path, PathBuf};

/// Size of one encoded record in bytes
pub const RECORD_LEN: usize = 20;

/// Extension of record files
pub const RECORD_EXTENSION: &str = "bin";

const FIELD_LEN: usize = 4;

/// Encode a descriptor into its 20-byte record
pub fn encode(descriptor: &EllipseDescriptor) -> Result<[u8; RECORD_LEN]> {
    if !descriptor.is_finite() {
        return Err(OvalError::format(format!(
            "cannot encode non-finite ellipse: {descriptor:?}"
        )));
    }

    let mut record = [0u8; RECORD_LEN];
    for (chunk, value) in record
        .chunks_exact_mut(FIELD_LEN)
        .zip(descriptor.to_array())
    {
        chunk.copy_from_slice(&value.to_be_bytes());
    }
    Ok(record)
}

/// Decode a descriptor from a record; `bytes` must be exactly 20 bytes long
pub fn decode(bytes: &[u8]) -> Result<EllipseDescriptor> {
    if bytes.len() != RECORD_LEN {
        return Err(OvalError::format(format!(
            "ellipse record must be {RECORD_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let mut values = [0f32; 5];
    for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(FIELD_LEN)) {
        let mut raw = [0u8; FIELD_LEN];
        raw.copy_from_slice(chunk);
        *value = f32::from_be_bytes(raw);
    }
    EllipseDescriptor::from_array(values)
}

/// Record file name for an image index, e.g. `00042.bin`
#[must_use]
pub fn record_file_name(index: usize) -> String {
    format!("{index:05}.{RECORD_EXTENSION}")
}

/// Record location for an image index under `output_dir`
#[must_use]
pub fn record_path<P: AsRef<Path>>(output_dir: P, index: usize) -> PathBuf {
    output_dir.as_ref().join(record_file_name(index))
}

/// Encode and write a record, replacing any existing file
pub fn save_record<P: AsRef<Path>>(path: P, descriptor: &EllipseDescriptor) -> Result<()> {
    let path = path.as_ref();
    let record = encode(descriptor)?;
    std::fs::write(path, record).map_err(|e| OvalError::file_io_error("write record", path, &e))
}

/// Read and decode a record
pub fn load_record<P: AsRef<Path>>(path: P) -> Result<EllipseDescriptor> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).map_err(|e| OvalError::file_io_error("read record", path, &e))?;
    decode(&bytes)
}
