//! The cursor-position cache at `~/.biminfo`.
//!
//! Record format: `>` + absolute path + space + 20-wide line number +
//! space + 20-wide column number + newline. Fixed widths let an existing
//! record be rewritten in place.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER: &str = "\
# This is a biminfo file.\n\
# It was generated by bim. Do not edit it by hand!\n\
# Cursor positions and other state are stored here.\n";

fn biminfo_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".biminfo"))
}

fn open_biminfo(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

fn format_record(path: &str, line_no: usize, col_no: usize) -> String {
    format!(">{path} {line_no:>20} {col_no:>20}\n")
}

/// Look up the remembered cursor position for an absolute path.
pub fn fetch(file: &Path) -> Option<(usize, usize)> {
    let abs = file.canonicalize().ok()?;
    fetch_in(&biminfo_path()?, &abs)
}

fn fetch_in(cache: &Path, abs: &Path) -> Option<(usize, usize)> {
    let mut content = String::new();
    File::open(cache).ok()?.read_to_string(&mut content).ok()?;
    let prefix = format!(">{} ", abs.display());
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix(&prefix) {
            let mut fields = rest.split_whitespace();
            let line_no = fields.next()?.parse().ok()?;
            let col_no = fields.next()?.parse().ok()?;
            return Some((line_no, col_no));
        }
    }
    None
}

/// Store the cursor position for an absolute path, rewriting an existing
/// record in place or appending a new one (with the header on first use).
pub fn update(file: &Path, line_no: usize, col_no: usize) -> io::Result<()> {
    let abs = file
        .canonicalize()
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "no absolute path"))?;
    let Some(cache) = biminfo_path() else {
        return Ok(());
    };
    update_in(&cache, &abs, line_no, col_no)
}

fn update_in(cache: &Path, abs: &Path, line_no: usize, col_no: usize) -> io::Result<()> {
    let mut f = open_biminfo(cache)?;
    let mut content = String::new();
    f.read_to_string(&mut content)?;

    let prefix = format!(">{} ", abs.display());
    let record = format_record(&abs.display().to_string(), line_no, col_no);

    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        if line.starts_with(&prefix) {
            // Fixed-width fields guarantee the rewrite fits exactly.
            f.seek(SeekFrom::Start(offset as u64))?;
            f.write_all(record.as_bytes())?;
            return Ok(());
        }
        offset += line.len();
    }

    f.seek(SeekFrom::End(0))?;
    if content.is_empty() {
        f.write_all(HEADER.as_bytes())?;
    }
    f.write_all(record.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_cache(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bim-test-info-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_record_is_fixed_width() {
        let a = format_record("/tmp/a", 1, 1);
        let b = format_record("/tmp/a", 123456, 99);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_append_and_fetch() {
        let cache = temp_cache("append");
        fs::remove_file(&cache).ok();
        update_in(&cache, Path::new("/tmp/some/file"), 12, 3).unwrap();
        let content = fs::read_to_string(&cache).unwrap();
        assert!(content.starts_with("# This is a biminfo file.\n"));
        assert_eq!(
            fetch_in(&cache, Path::new("/tmp/some/file")),
            Some((12, 3))
        );
        assert_eq!(fetch_in(&cache, Path::new("/tmp/other")), None);
        fs::remove_file(&cache).ok();
    }

    #[test]
    fn test_in_place_update() {
        let cache = temp_cache("update");
        fs::remove_file(&cache).ok();
        update_in(&cache, Path::new("/tmp/a"), 1, 1).unwrap();
        update_in(&cache, Path::new("/tmp/b"), 2, 2).unwrap();
        let before = fs::read_to_string(&cache).unwrap();
        update_in(&cache, Path::new("/tmp/a"), 500, 42).unwrap();
        let after = fs::read_to_string(&cache).unwrap();
        // Same shape, only the one record changed.
        assert_eq!(before.len(), after.len());
        assert_eq!(fetch_in(&cache, Path::new("/tmp/a")), Some((500, 42)));
        assert_eq!(fetch_in(&cache, Path::new("/tmp/b")), Some((2, 2)));
        fs::remove_file(&cache).ok();
    }
}
