//! Output files: one per identifier, written whole.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ReviewRecord;

/// Header line of CSV output.
pub const CSV_HEADER: &str = "Author,Review Title,Review Rating,Review Date,Review Text";

/// Output file format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Header plus comma-joined lines, fields written verbatim.
    #[default]
    Csv,
    /// Pretty-printed array of records.
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize reviews: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes review records into an output directory.
#[derive(Debug, Clone)]
pub struct ReviewSink {
    dir: PathBuf,
    format: OutputFormat,
}

impl ReviewSink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Create the output directory (and parents) if missing.
    pub fn ensure_dir(&self) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Output file for an identifier: `<dir>/asin-<id>.<ext>`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!(
            "asin-{}.{}",
            sanitize_id(id),
            self.format.extension()
        ))
    }

    /// Serialize `records` in the sink's format.
    pub fn render(&self, records: &[ReviewRecord]) -> Result<String, SinkError> {
        match self.format {
            OutputFormat::Csv => Ok(render_csv(records)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        }
    }

    /// Write all records of one identifier, replacing any previous file.
    pub fn write(&self, id: &str, records: &[ReviewRecord]) -> Result<PathBuf, SinkError> {
        let contents = self.render(records)?;
        let path = self.path_for(id);
        std::fs::write(&path, contents).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Wrote {} reviews to {}", records.len(), path.display());
        Ok(path)
    }
}

/// Header plus one line per record; no quoting, no trailing newline.
pub fn render_csv(records: &[ReviewRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(records.iter().map(|r| r.fields().join(",")));
    lines.join("\n")
}

/// Replace characters that cannot appear in a file name.
fn sanitize_id(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}
