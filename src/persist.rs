use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::Snapshot;
use crate::model::{Job, Ms, Technician};

const MAGIC: &[u8; 4] = b"DSPS";
pub const SCHEMA_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4;

/// The part of a snapshot that outlives the process. Maps are flattened to
/// arrays; [`crate::engine::Engine::restore`] re-keys them by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSchedule {
    pub technicians: Vec<Technician>,
    pub jobs: Vec<Job>,
    pub last_sync: Option<Ms>,
}

impl PersistedSchedule {
    /// Entities are written in id order so equal snapshots encode equally.
    pub fn from_snapshot(snap: &Snapshot) -> Self {
        let mut technicians: Vec<Technician> = snap.technicians.values().cloned().collect();
        technicians.sort_by(|a, b| a.id.cmp(&b.id));
        let mut jobs: Vec<Job> = snap.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            technicians,
            jobs,
            last_sync: snap.last_sync,
        }
    }
}

#[derive(Debug)]
pub enum PersistError {
    Io(io::Error),
    BadMagic,
    UnsupportedVersion(u16),
    Truncated,
    ChecksumMismatch { stored: u32, computed: u32 },
    Codec(String),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "io: {e}"),
            PersistError::BadMagic => write!(f, "not a persisted schedule"),
            PersistError::UnsupportedVersion(v) => {
                write!(f, "unsupported schema version {v} (expected {SCHEMA_VERSION})")
            }
            PersistError::Truncated => write!(f, "truncated file"),
            PersistError::ChecksumMismatch { stored, computed } => {
                write!(f, "checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")
            }
            PersistError::Codec(e) => write!(f, "codec: {e}"),
        }
    }
}

impl std::error::Error for PersistError {}

impl From<io::Error> for PersistError {
    fn from(e: io::Error) -> Self {
        PersistError::Io(e)
    }
}

/// `[magic "DSPS"][u16 version][u32 len][bincode payload][u32 crc32]`,
/// integers little-endian. The checksum covers the payload only.
pub fn encode(schedule: &PersistedSchedule) -> Result<Vec<u8>, PersistError> {
    let payload = bincode::serialize(schedule).map_err(|e| PersistError::Codec(e.to_string()))?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<PersistedSchedule, PersistError> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistError::Truncated);
    }
    if &bytes[0..4] != MAGIC {
        return Err(PersistError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != SCHEMA_VERSION {
        return Err(PersistError::UnsupportedVersion(version));
    }
    let len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let body = &bytes[HEADER_LEN..];
    if body.len() < len + 4 {
        return Err(PersistError::Truncated);
    }
    let payload = &body[..len];
    let stored = u32::from_le_bytes([body[len], body[len + 1], body[len + 2], body[len + 3]]);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(PersistError::ChecksumMismatch { stored, computed });
    }
    bincode::deserialize(payload).map_err(|e| PersistError::Codec(e.to_string()))
}

/// Write to a sibling temp file, fsync, then rename over `path`.
pub fn save(path: &Path, schedule: &PersistedSchedule) -> Result<(), PersistError> {
    let bytes = encode(schedule)?;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// `Ok(None)` when nothing has been saved yet.
pub fn load(path: &Path) -> Result<Option<PersistedSchedule>, PersistError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    decode(&bytes).map(Some)
}
