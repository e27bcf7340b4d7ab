//! Redaction manifest
//! Author: kartik4091
//!
//! A JSON record of what was redacted, with content hashes of the input and
//! output documents.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};
use crate::types::RedactionRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionManifest {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub input_sha256: String,
    pub output_sha256: Option<String>,
    /// Always true: text under an overlay is still in the content stream
    pub overlay_only: bool,
    pub records: Vec<RedactionRecord>,
}

impl RedactionManifest {
    /// Manifest for `input`; `output` is hashed when given
    pub fn new(input: &Path, output: Option<&Path>, records: Vec<RedactionRecord>) -> Result<Self> {
        Ok(Self {
            generated_at: Utc::now(),
            input: input.to_path_buf(),
            output: output.map(Path::to_path_buf),
            input_sha256: sha256_file(input)?,
            output_sha256: output.map(sha256_file).transpose()?,
            overlay_only: true,
            records,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::write)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    Ok(sha256_hex(&fs::read(path)?))
}

pub fn write_manifest(manifest: &RedactionManifest, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, manifest.to_json()?).map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))?;
    info!("📝 Manifest written to {}", path.display());
    Ok(())
}
