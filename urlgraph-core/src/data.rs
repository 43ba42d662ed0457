//! JSON Lines input and output.
//!
//! Crawl output is read line by line. A line that does not parse, or that
//! parses into an invalid record, is skipped with a warning and reported back
//! to the caller so that one bad line never aborts a whole run.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::model::{PageContent, UrlRecord};

/// A line that was left out of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct JsonlBatch<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> JsonlBatch<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn parse_jsonl<T, R>(reader: R) -> std::io::Result<JsonlBatch<T>>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut items = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(trimmed) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping line {}: {}", idx + 1, e);
                skipped.push(SkippedLine {
                    line: idx + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(JsonlBatch { items, skipped })
}

pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<JsonlBatch<T>> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let batch = parse_jsonl(BufReader::new(file)).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "Read {} items from {} ({} skipped)",
        batch.items.len(),
        path.display(),
        batch.skipped.len()
    );
    Ok(batch)
}

pub fn load_records(path: &Path) -> Result<JsonlBatch<UrlRecord>> {
    read_jsonl(path)
}

pub fn load_pages(path: &Path) -> Result<JsonlBatch<PageContent>> {
    read_jsonl(path)
}

pub fn write_jsonl<'a, T, I>(items: I, path: &Path) -> Result<usize>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let file = File::create(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let mut count = 0;
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n").map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }

    writer.flush().map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(count)
}
