//! Result artifact persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::error::Result;

/// Writes a result tree as pretty-printed UTF-8 JSON.
#[derive(Debug, Clone)]
pub struct JsonResultWriter {
    path: PathBuf,
}

impl JsonResultWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonResultWriter {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Warn when a previous artifact would be overwritten.
    pub fn warn_if_exists(&self) -> bool {
        let exists = self.path.exists();
        if exists {
            warn!("{} already exists and will be overwritten", self.path.display());
        }
        exists
    }

    /// Replace the artifact with `value`.
    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!("results written to {}", self.path.display());
        Ok(())
    }
}
