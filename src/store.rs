//! Flat-file line store.
//!
//! A collection is a text file holding one encoded record per line. Appends
//! go straight to the end of the file. Every other mutation goes through
//! [`FlatFile::rewrite_all`], which writes the complete new collection to a
//! side file and renames it over the original. A crash while the side file
//! is being written leaves the original collection intact.
//!
//! There is no locking: a single writer per collection is assumed.

use crate::error::{Result, RosterError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Suffix appended to a collection's file name to form its side file
pub const SIDE_SUFFIX: &str = ".tmp";

/// Encoding of one record as one line (without the trailing newline)
pub trait LineCodec {
    type Item;

    fn encode(item: &Self::Item) -> String;

    /// Returns None when the line is not a valid record
    fn decode(line: &str) -> Option<Self::Item>;
}

/// What a rewrite transform does with one stored record
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite<T> {
    /// Write the record back exactly as it was stored
    Keep(T),
    Replace(T),
    Delete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub kept: usize,
    pub replaced: usize,
    pub deleted: usize,
}

impl RewriteSummary {
    pub fn changed(&self) -> bool {
        self.replaced + self.deleted > 0
    }
}

/// True for an empty file or one whose last byte is a newline
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

pub fn side_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(SIDE_SUFFIX);
    PathBuf::from(name)
}

/// A durable collection of `C::Item` stored one per line
pub struct FlatFile<C> {
    path: PathBuf,
    side_path: PathBuf,
    _codec: PhantomData<C>,
}

impl<C: LineCodec> FlatFile<C> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let side_path = side_path_for(&path);
        Self {
            path,
            side_path,
            _codec: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Add one record at the end of the collection, creating the file if needed.
    /// A last line without its newline is terminated first.
    pub fn append(&self, item: &C::Item) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RosterError::unavailable(&self.path, e))?;

        let mut line = C::encode(item);
        line.push('\n');
        if !ends_with_newline(&mut file).map_err(|e| RosterError::unavailable(&self.path, e))? {
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| RosterError::unavailable(&self.path, e))
    }

    /// Create the collection holding exactly `items`.
    /// Written through the side file so a partial file is never visible.
    pub fn create_with(&self, items: &[C::Item]) -> Result<()> {
        let mut side = SideFile::create(&self.side_path)?;
        for item in items {
            side.write_line(&C::encode(item))?;
        }
        side.commit(&self.path)
    }

    /// Lazily iterate every stored record in storage order.
    ///
    /// A missing file is an empty collection. Each call reopens the file, so
    /// the sequence can be restarted by calling this again.
    pub fn list_all(&self) -> Result<Records<C>> {
        let lines = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(RosterError::unavailable(&self.path, e)),
        };

        Ok(Records {
            path: self.path.clone(),
            lines,
            line_no: 0,
            _codec: PhantomData,
        })
    }

    /// Replace the whole collection with the transformed set of records.
    ///
    /// Record order is preserved. The new collection is written to the side
    /// file, fsynced, then renamed over the original. If the transform
    /// changed nothing, or any step fails (including a panic in `transform`),
    /// the side file is removed and the original is left untouched.
    pub fn rewrite_all<F>(&self, mut transform: F) -> Result<RewriteSummary>
    where
        F: FnMut(C::Item) -> Rewrite<C::Item>,
    {
        let mut records = self.list_all()?;
        let mut side = SideFile::create(&self.side_path)?;
        let mut summary = RewriteSummary::default();

        while let Some(entry) = records.next_raw() {
            let (raw, item) = entry?;
            match transform(item) {
                Rewrite::Keep(_) => {
                    summary.kept += 1;
                    side.write_line(&raw)?;
                }
                Rewrite::Replace(item) => {
                    summary.replaced += 1;
                    side.write_line(&C::encode(&item))?;
                }
                Rewrite::Delete => summary.deleted += 1,
            }
        }

        if summary.changed() {
            side.commit(&self.path)?;
        }
        Ok(summary)
    }
}

/// Lazy sequence of records read from a collection file
pub struct Records<C> {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line_no: usize,
    _codec: PhantomData<C>,
}

impl<C: LineCodec> Records<C> {
    /// Next decoded record together with the line it was read from
    fn next_raw(&mut self) -> Option<Result<(String, C::Item)>> {
        let lines = self.lines.as_mut()?;
        loop {
            let line = match lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(RosterError::unavailable(&self.path, e))),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(match C::decode(&line) {
                Some(item) => Ok((line, item)),
                None => Err(RosterError::Corrupt {
                    path: self.path.clone(),
                    line: self.line_no,
                }),
            });
        }
    }
}

impl<C: LineCodec> Iterator for Records<C> {
    type Item = Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_raw().map(|entry| entry.map(|(_, item)| item))
    }
}

/// Side file being written. Removed on drop unless committed.
struct SideFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl SideFile {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| RosterError::unavailable(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writeln!(writer, "{}", line).map_err(|e| RosterError::unavailable(&self.path, e))
    }

    fn commit(mut self, target: &Path) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            let file = writer
                .into_inner()
                .map_err(|e| RosterError::unavailable(&self.path, e.into_error()))?;
            file.sync_all()
                .map_err(|e| RosterError::unavailable(&self.path, e))?;
        }

        fs::rename(&self.path, target).map_err(|e| RosterError::unavailable(target, e))?;

        // Renamed away; nothing left for drop to remove
        self.path = PathBuf::new();

        // The rename already happened; a failed directory sync only weakens
        // durability of the new name, so warn and carry on.
        if let Some(parent) = target.parent() {
            if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
                eprintln!("Warning: failed to sync {}: {}", parent.display(), e);
            }
        }
        Ok(())
    }
}

impl Drop for SideFile {
    fn drop(&mut self) {
        self.writer.take();
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}
