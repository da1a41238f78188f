// src/store.rs

use crate::error::{FlareError, Result};
use crate::model::{BlameRecord, CommitStatRecord};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Column order of the blame CSV
pub const BLAME_FIELDNAMES: [&str; 13] = [
    "sha",
    "line_number",
    "author",
    "author-mail",
    "author-time",
    "author-tz",
    "committer",
    "committer-mail",
    "committer-time",
    "committer-tz",
    "summary",
    "file_path",
    "changed_line",
];

/// Column order of the commit CSV
pub const COMMIT_FIELDNAMES: [&str; 8] = [
    "filename",
    "insertions",
    "deletions",
    "lines",
    "author",
    "sha",
    "authored_date_timestamp",
    "authored_date",
];

/// Streams records into a fully quoted CSV file.
pub struct RecordWriter<W: Write> {
    inner: csv::Writer<W>,
    written: usize,
}

impl RecordWriter<File> {
    /// Creates `path` and its parent directories.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FlareError::io(format!("creating {}", parent.display()), e))?;
        }
        let file = File::create(path)
            .map_err(|e| FlareError::io(format!("creating {}", path.display()), e))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        let inner = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(writer);
        Self { inner, written: 0 }
    }

    pub fn write<R: Serialize>(&mut self, record: &R) -> Result<()> {
        self.inner.serialize(record)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a, R, I>(&mut self, records: I) -> Result<()>
    where
        R: Serialize + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Number of rows written so far, header excluded
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| FlareError::io("flushing csv", e.into_error()))
    }
}

/// Writes the header row explicitly so an empty file still carries it.
fn write_header<W: Write>(writer: &mut RecordWriter<W>, header: &[&str]) -> Result<()> {
    writer.inner.write_record(header)?;
    Ok(())
}

/// Opens a blame CSV for writing, header included.
pub fn blame_writer(path: &Path) -> Result<RecordWriter<File>> {
    let mut writer = RecordWriter::create(path)?;
    write_header(&mut writer, &BLAME_FIELDNAMES)?;
    Ok(writer)
}

/// Writes commit stats to `path`, header included.
pub fn write_commits(path: &Path, records: &[CommitStatRecord]) -> Result<usize> {
    let mut writer = RecordWriter::create(path)?;
    write_header(&mut writer, &COMMIT_FIELDNAMES)?;
    writer.write_all(records)?;
    let written = writer.written();
    writer.finish()?;
    Ok(written)
}

/// Loads every blame record of a CSV written by [`blame_writer`].
pub fn read_blames(path: &Path) -> Result<Vec<BlameRecord>> {
    let file = File::open(path)
        .map_err(|e| FlareError::io(format!("opening {}", path.display()), e))?;
    let mut reader = ReaderBuilder::new().from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
