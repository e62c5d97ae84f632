// SPDX-License-Identifier: MIT

//! Durable output files

use super::Persister;
use crate::adk::error::BoxError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};

const MAX_STEM_CHARS: usize = 50;
const MAX_COLLISION_SUFFIX: u32 = 10_000;
const ARTIFACT_EXTENSION: &str = "txt";

/// Artifact base name from the document source and a creation time
///
/// `processed_<stem>_<YYYYMMDD_HHMMSS>`, where the stem keeps only
/// alphanumerics, space, `_` and `-`.
pub fn derive_artifact_name(source: &str, created: DateTime<Local>) -> String {
    let stem = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut stem: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .take(MAX_STEM_CHARS)
        .collect();
    if stem.trim().is_empty() {
        stem = "document".to_string();
    }
    format!("processed_{}_{}", stem, created.format("%Y%m%d_%H%M%S"))
}

/// Writes artifacts as text files under one directory
#[derive(Debug, Clone)]
pub struct FilePersister {
    dir: PathBuf,
}

impl FilePersister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidate(&self, name: &str, attempt: u32) -> PathBuf {
        let file = if attempt == 0 {
            format!("{}.{}", name, ARTIFACT_EXTENSION)
        } else {
            format!("{}_{}.{}", name, attempt, ARTIFACT_EXTENSION)
        };
        self.dir.join(file)
    }
}

#[async_trait]
impl Persister for FilePersister {
    async fn persist(&self, content: &str, derived_name: &str) -> Result<PathBuf, BoxError> {
        fs::create_dir_all(&self.dir).await?;

        for attempt in 0..MAX_COLLISION_SUFFIX {
            let path = self.candidate(derived_name, attempt);
            let file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_contents(file, content).await {
                // Do not leave a half-written artifact behind
                let _ = fs::remove_file(&path).await;
                return Err(e.into());
            }

            log::info!("Saved to {}", path.display());
            return Ok(path);
        }

        Err(format!("no free file name for '{}'", derived_name).into())
    }
}

// Write errors on a tokio file may only surface at flush
async fn write_contents<W>(mut writer: W, content: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(content.as_bytes()).await?;
    writer.flush().await
}
