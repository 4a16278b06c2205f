//! Line-oriented list files.
//!
//! Lists are plain text with one token per line. Reading trims whitespace and
//! drops blank lines and `#` comments; writing emits one entry per line.
//!
//! File access goes through the [`FileSystem`] trait so commands can be tested
//! against a mock (generated with mockall in test builds).

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Filesystem operations needed by list files.
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents atomically.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Append to a file, creating it if it doesn't exist.
    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        // Temp file in the same directory so the rename stays on one filesystem
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents)?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(contents)
    }
}

static REAL_FS: RealFileSystem = RealFileSystem;

/// Get a reference to the global real filesystem instance.
pub fn real_fs() -> &'static RealFileSystem {
    &REAL_FS
}

/// How [`write_lines`] treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// Split list content into trimmed, non-empty, non-comment lines.
///
/// # Examples
/// ```
/// use iplists::listfile::parse_lines;
/// let lines = parse_lines("# feed\n 1.1.1.1 \n\n8.8.8.0/24\n");
/// assert_eq!(lines, vec!["1.1.1.1", "8.8.8.0/24"]);
/// ```
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read list entries from a file.
pub fn read_lines<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Vec<String>> {
    let content = fs
        .read_to_string(path)
        .with_context(|| format!("Failed to read list file: {:?}", path))?;
    Ok(parse_lines(&content))
}

/// Write entries to a file, one per line.
pub fn write_lines<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    lines: &[String],
    mode: WriteMode,
) -> Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }

    match mode {
        WriteMode::Overwrite => fs.write_atomic(path, content.as_bytes()),
        WriteMode::Append => fs.append(path, content.as_bytes()),
    }
    .with_context(|| format!("Failed to write list file: {:?}", path))
}
