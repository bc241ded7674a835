use crate::errors::CoreError;

use super::memory::MemoryStore;

/// Magic bytes identifying a PTLG (Portfolio Tracker Ledger) snapshot file.
pub const MAGIC: &[u8; 4] = b"PTLG";

/// Current snapshot format version. Any schema change bumps this and adds
/// an explicit migration in `read_snapshot`.
pub const CURRENT_VERSION: u16 = 1;

/// Header size in bytes: magic(4) + version(2) + payload_len(8) = 14
pub const HEADER_SIZE: usize = 14;

/// Serialize a ledger snapshot to bytes.
///
/// Layout:
/// ```text
/// [PTLG: 4B] [version: 2B LE] [payload_len: 8B LE] [bincode payload]
/// ```
pub fn write_snapshot(store: &MemoryStore) -> Result<Vec<u8>, CoreError> {
    let payload = bincode::serialize(store)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize ledger: {e}")))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Parse a ledger snapshot from raw file bytes.
pub fn read_snapshot(data: &[u8]) -> Result<MemoryStore, CoreError> {
    if data.len() < HEADER_SIZE {
        return Err(CoreError::InvalidFileFormat(
            "File too small to be a valid PTLG snapshot".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(CoreError::InvalidFileFormat(
            "Invalid magic bytes, not a PTLG snapshot".into(),
        ));
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let payload_len = u64::from_le_bytes(
        data[6..14]
            .try_into()
            .map_err(|_| CoreError::InvalidFileFormat("Failed to read payload length".into()))?,
    ) as usize;

    let expected_end = HEADER_SIZE + payload_len;
    if data.len() < expected_end {
        return Err(CoreError::InvalidFileFormat(format!(
            "File truncated: expected {} payload bytes, got {}",
            payload_len,
            data.len() - HEADER_SIZE
        )));
    }

    let store: MemoryStore = bincode::deserialize(&data[HEADER_SIZE..expected_end])
        .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize ledger: {e}")))?;

    Ok(store)
}
