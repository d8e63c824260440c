use crate::frames::enriched_frame::EnrichedFrame;
use crate::sink::error::SinkError;
use crate::sink::Sink;
use crate::utils::is_plain_identifier;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Appends each frame as a new Snappy-compressed parquet part in a directory.
///
/// Parts are named `<table>-<NNNNN>.parquet` with an increasing sequence number. Each part
/// is written to a temporary file first and moved into place once complete, so readers
/// never observe a half-written part.
pub struct ParquetSink {
    dir: PathBuf,
    table: String,
}

impl ParquetSink {
    pub fn new(dir: impl Into<PathBuf>, table: &str) -> Result<Self, SinkError> {
        if !is_plain_identifier(table) {
            return Err(SinkError::InvalidTableName(table.to_string()));
        }
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| SinkError::DirCreation(dir.clone(), e))?;
        Ok(Self {
            dir,
            table: table.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn part_number(&self, path: &Path) -> Option<u32> {
        let name = path.file_name()?.to_str()?;
        let number = name
            .strip_prefix(self.table.as_str())?
            .strip_prefix('-')?
            .strip_suffix(".parquet")?;
        number.parse().ok()
    }

    /// Existing parts of this table, in write order.
    pub fn part_paths(&self) -> Result<Vec<PathBuf>, SinkError> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| SinkError::Io(self.dir.clone(), e))?;
        let mut parts = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SinkError::Io(self.dir.clone(), e))?.path();
            if let Some(number) = self.part_number(&path) {
                parts.push((number, path));
            }
        }
        parts.sort();
        Ok(parts.into_iter().map(|(_, path)| path).collect())
    }

    /// A lazy view over every part written so far.
    pub fn scan(&self) -> Result<LazyFrame, SinkError> {
        let frames = self
            .part_paths()?
            .iter()
            .map(|path| LazyFrame::scan_parquet(path, Default::default()))
            .collect::<PolarsResult<Vec<_>>>()?;
        if frames.is_empty() {
            return Err(SinkError::NoParts(self.dir.clone()));
        }
        Ok(concat(frames, UnionArgs::default())?)
    }

    fn next_part_path(&self) -> Result<PathBuf, SinkError> {
        let next = self
            .part_paths()?
            .last()
            .and_then(|path| self.part_number(path))
            .map_or(0, |n| n + 1);
        Ok(self.dir.join(format!("{}-{:05}.parquet", self.table, next)))
    }
}

impl Sink for ParquetSink {
    fn append(&mut self, frame: &EnrichedFrame) -> Result<usize, SinkError> {
        let path = self.next_part_path()?;
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| SinkError::Io(path.clone(), e))?;
        let mut df = frame.frame.clone();
        ParquetWriter::new(temp.as_file_mut())
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)?;
        temp.persist(&path)
            .map_err(|e| SinkError::Io(path.clone(), e.error))?;

        info!("Wrote {} rows to {:?}", df.height(), path);
        Ok(df.height())
    }
}
