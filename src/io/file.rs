//! Buffer load and save.
//!
//! Text moves as UTF-8. Loads decode byte-at-a-time through the DFA,
//! silently skipping invalid bytes; saves re-encode each line and append a
//! newline, with a lone NUL byte written for U+0000 cells.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use crate::buffer::{Buffer, RevStatus};
use crate::input::Utf8Decoder;

/// Streaming loader feeding decoded text into a buffer at its cursor.
pub struct Loader {
    decoder: Utf8Decoder,
}

impl Loader {
    /// A fresh loader.
    pub fn new() -> Self {
        Self {
            decoder: Utf8Decoder::new(),
        }
    }

    /// Decode a chunk of bytes into the buffer. The buffer's `loading` flag
    /// must be set so the line primitives skip history and cascades.
    pub fn feed(&mut self, buf: &mut Buffer, bytes: &[u8]) {
        for &byte in bytes {
            let Some(c) = self.decoder.push(byte) else {
                continue;
            };
            if c == '\n' {
                buf.add_line(buf.line_no);
                buf.col_no = 1;
                buf.line_no += 1;
            } else {
                let cell = buf.make_cell(c);
                let at = buf.col_no - 1;
                buf.line_insert(buf.line_no - 1, cell, at);
                buf.col_no += 1;
            }
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a whole stream into the buffer.
pub fn load_from_reader<R: Read>(buf: &mut Buffer, reader: &mut R) -> io::Result<()> {
    let mut loader = Loader::new();
    let mut block = [0u8; 8192];
    loop {
        let n = reader.read(&mut block)?;
        if n == 0 {
            break;
        }
        loader.feed(buf, &block[..n]);
    }
    Ok(())
}

/// Finish a load: drop the trailing blank line a final `\n` produced and
/// sniff tabs-vs-spaces from the indentation that was read.
pub fn finish_load(buf: &mut Buffer) {
    if buf.line_no > 0
        && buf.line_no <= buf.line_count()
        && buf.lines[buf.line_no - 1].is_empty()
        && buf.line_count() > 1
    {
        buf.remove_line(buf.line_no - 1);
    }
    let mut tabs = 0usize;
    let mut spaces = 0usize;
    for line in &buf.lines {
        if line.len() > 1 {
            if line.codepoint_at(0) == Some('\t') {
                tabs += 1;
            }
            if line.codepoint_at(0) == Some(' ') && line.codepoint_at(1) == Some(' ') {
                spaces += 1;
            }
        }
    }
    if spaces > tabs {
        buf.tabs = false;
    }
}

/// Write the buffer to a file, marking it clean on success.
pub fn write_file(buf: &mut Buffer, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut tmp = [0u8; 4];
    for line in &mut buf.lines {
        line.rev_status = RevStatus::Unchanged;
        for cell in line.cells() {
            let c = cell.codepoint();
            if c == '\0' {
                writer.write_all(&[0u8])?;
            } else {
                writer.write_all(c.encode_utf8(&mut tmp).as_bytes())?;
            }
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    buf.modified = false;
    buf.history.mark_saved();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("bim-test-{}-{}", std::process::id(), name))
    }

    fn load_bytes(bytes: &[u8]) -> Buffer {
        let mut buf = Buffer::new(true, true);
        buf.loading = true;
        let mut loader = Loader::new();
        loader.feed(&mut buf, bytes);
        finish_load(&mut buf);
        buf.loading = false;
        buf
    }

    #[test]
    fn test_load_strips_trailing_blank() {
        let buf = load_bytes(b"one\ntwo\n");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.lines[0].to_text(), "one");
        assert_eq!(buf.lines[1].to_text(), "two");
    }

    #[test]
    fn test_load_without_trailing_newline() {
        let buf = load_bytes(b"one\ntwo");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.lines[1].to_text(), "two");
    }

    #[test]
    fn test_load_skips_invalid_bytes() {
        let buf = load_bytes(b"a\x80b\n");
        assert_eq!(buf.lines[0].to_text(), "ab");
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("round-trip");
        let content = "héllo\n\tworld 日本\n";
        let mut buf = load_bytes(content.as_bytes());
        write_file(&mut buf, &path).unwrap();
        assert!(!buf.modified);
        let written = fs::read(&path).unwrap();
        assert_eq!(written, content.as_bytes());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_tabs_vs_spaces_sniffing() {
        let buf = load_bytes(b"  two\n  more\n\tone\n");
        assert!(!buf.tabs);
        let buf = load_bytes(b"\tone\n\ttwo\n  sp\n");
        assert!(buf.tabs);
    }

    #[test]
    fn test_nul_cell_saves_as_nul_byte() {
        let path = temp_path("nul");
        let mut buf = load_bytes(b"a\x00b\n");
        assert_eq!(buf.lines[0].len(), 3);
        write_file(&mut buf, &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"a\x00b\n");
        fs::remove_file(&path).ok();
    }
}
