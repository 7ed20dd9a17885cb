//! Scoped staging of uploaded reference audio.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use tts_core::{TtsError, TtsResult};

use crate::metrics::TtsMetrics;

/// A reference recording written to a private temporary file.
///
/// The file is removed when the guard is released or dropped, whichever
/// comes first. Removal failures are logged and never replace the outcome
/// of the request that staged the file.
#[derive(Debug)]
pub struct StagedAudio {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl StagedAudio {
    /// Write `bytes` to a uniquely named `.wav` file in `dir` (or the OS temp dir).
    pub fn stage(bytes: &[u8], dir: Option<&Path>, request_id: Uuid) -> TtsResult<Self> {
        let prefix = format!("ref-voice-{request_id}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".wav");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!(path = %path.display(), bytes = bytes.len(), "Staged reference audio");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// Location handed to the engine.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting any failure.
    pub fn release(mut self) -> TtsResult<()> {
        self.remove()
    }

    fn remove(&mut self) -> TtsResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        file.close().map_err(|source| TtsError::ResourceCleanup {
            path: self.path.clone(),
            source,
        })
    }
}

impl Drop for StagedAudio {
    fn drop(&mut self) {
        if let Err(err) = self.remove() {
            TtsMetrics.cleanup_failed();
            warn!(error = %err, "Temporary reference audio was not removed");
        }
    }
}
