//! Disk Text Cache
//!
//! Stores each `(text_type, id)` as a gzip file at `<root>/<text_type>/<id>`.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::text::{validate_identifier, TextCache, TextCacheStats};

/// Directory under the root holding entries while they are being written.
const STAGING_DIR: &str = ".staging";

// == Disk Text Zip Cache ==
/// Gzip-compressed text files, one directory per text type.
///
/// Each get or put opens and closes its own file handle. Puts write a
/// staging file and rename it over the entry, so readers see either the old
/// text or the new text, never a partial file.
#[derive(Debug)]
pub struct DiskTextZipCache {
    root: PathBuf,
    stats: TextCacheStats,
}

impl DiskTextZipCache {
    // == Constructor ==
    /// Opens a cache rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
        info!("Text cache rooted at {}", root.display());
        Ok(Self {
            root,
            stats: TextCacheStats::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn type_dir(&self, text_type: &str) -> Result<PathBuf> {
        validate_identifier("text type", text_type)?;
        if text_type == STAGING_DIR {
            return Err(CacheError::InvalidTextType(format!(
                "text type '{}' is reserved",
                text_type
            )));
        }
        Ok(self.root.join(text_type))
    }

    fn entry_path(&self, text_type: &str, id: &str) -> Result<PathBuf> {
        validate_identifier("id", id)?;
        Ok(self.type_dir(text_type)?.join(id))
    }

    // == Age ==
    /// Time since the entry was last written, `None` if there is no entry.
    ///
    /// A modification time in the future is reported as `NegativeAge`.
    pub fn age(&self, text_type: &str, id: &str) -> Result<Option<Duration>> {
        let path = self.entry_path(text_type, id)?;
        let modified = match modified_time(&path)? {
            Some(modified) => modified,
            None => return Ok(None),
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => Ok(Some(age)),
            Err(ahead) => Err(CacheError::NegativeAge {
                path,
                ahead_ms: ahead.duration().as_millis(),
            }),
        }
    }

    /// Modification time of the entry.
    pub fn last_modified(&self, text_type: &str, id: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.entry_path(text_type, id)?;
        Ok(modified_time(&path)?.map(DateTime::<Utc>::from))
    }

    // == Remove ==
    /// Deletes one entry. Returns whether it existed.
    pub fn remove(&self, text_type: &str, id: &str) -> Result<bool> {
        let path = self.entry_path(text_type, id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    // == Listing ==
    /// Ids stored under `text_type`, sorted.
    pub fn ids(&self, text_type: &str) -> Result<Vec<String>> {
        let dir = self.type_dir(text_type)?;
        list_names(&dir, false)
    }

    /// Text types that have a directory, sorted.
    pub fn text_types(&self) -> Result<Vec<String>> {
        let mut types = list_names(&self.root, true)?;
        types.retain(|name| name != STAGING_DIR);
        Ok(types)
    }

    // == Clear ==
    /// Removes every entry of `text_type`, then its directory.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self, text_type: &str) -> Result<usize> {
        let dir = self.type_dir(text_type)?;
        let ids = list_names(&dir, false)?;
        for id in &ids {
            let path = dir.join(id);
            fs::remove_file(&path).map_err(|e| CacheError::io(path, e))?;
        }
        match fs::remove_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(dir, e)),
        }
        info!("Cleared {} entries of text type {}", ids.len(), text_type);
        Ok(ids.len())
    }

    /// Removes every text type. Returns the number of entries removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for text_type in self.text_types()? {
            removed += self.clear(&text_type)?;
        }
        Ok(removed)
    }
}

impl TextCache for DiskTextZipCache {
    fn primitive_get(&self, text_type: &str, id: &str) -> Result<Option<String>> {
        let path = self.entry_path(text_type, id)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let mut contents = String::new();
        GzDecoder::new(BufReader::new(file))
            .read_to_string(&mut contents)
            .map_err(|e| CacheError::io(&path, e))?;
        debug!("Read {} bytes from {}", contents.len(), path.display());
        Ok(Some(contents))
    }

    fn primitive_put(&self, text_type: &str, id: &str, contents: &str) -> Result<()> {
        let dir = self.type_dir(text_type)?;
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let staging = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging).map_err(|e| CacheError::io(&staging, e))?;

        let path = self.entry_path(text_type, id)?;
        write_gzip(&staging, &path, contents).map_err(|e| CacheError::io(&path, e))?;
        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }

    fn stats(&self) -> &TextCacheStats {
        &self.stats
    }
}

/// Compresses `contents` into a file in `staging`, then renames it to `path`.
fn write_gzip(staging: &Path, path: &Path, contents: &str) -> io::Result<()> {
    let file = NamedTempFile::new_in(staging)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    encoder.write_all(contents.as_bytes())?;
    let file = encoder
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn modified_time(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| CacheError::io(path, e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

/// File (or directory) names in `dir`, sorted. A missing directory is empty.
fn list_names(dir: &Path, directories: bool) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CacheError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| CacheError::io(entry.path(), e))?;
        if file_type.is_dir() == directories {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
