//! Keyboard input: UTF-8 decoding, timeout reads, and pushback.

mod reader;

pub use reader::{InputReader, InputSource};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Default poll timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 200;
/// Short timeout used while a lazy redraw is pending.
pub const REDRAW_TIMEOUT_MS: u64 = 10;

/// Result of one timeout read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// One raw byte.
    Byte(u8),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The input stream is gone (scripted input exhausted, reader died).
    Eof,
}

/// Byte source with a one-element pushback slot.
pub struct KeySource {
    rx: Receiver<u8>,
    pushback: Option<u8>,
    _reader: Option<InputReader>,
}

impl KeySource {
    /// Wrap the reader thread's channel.
    pub fn new(reader: InputReader, rx: Receiver<u8>) -> Self {
        Self {
            rx,
            pushback: None,
            _reader: Some(reader),
        }
    }

    /// A scripted source for tests: yields the bytes, then `Eof`.
    pub fn from_bytes(script: &[u8]) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(script.len().max(1));
        for &b in script {
            let _ = tx.send(b);
        }
        drop(tx);
        Self {
            rx,
            pushback: None,
            _reader: None,
        }
    }

    /// Push one byte back; the next read returns it.
    pub fn unget(&mut self, byte: u8) {
        self.pushback = Some(byte);
    }

    /// Read one byte with an explicit timeout.
    pub fn getch_timeout(&mut self, timeout_ms: u64) -> Key {
        if let Some(byte) = self.pushback.take() {
            return Key::Byte(byte);
        }
        match self.rx.recv_timeout(Duration::from_millis(timeout_ms)) {
            Ok(byte) => Key::Byte(byte),
            Err(RecvTimeoutError::Timeout) => Key::Timeout,
            Err(RecvTimeoutError::Disconnected) => Key::Eof,
        }
    }

    /// Read one byte with the standard timeout.
    pub fn getch(&mut self) -> Key {
        self.getch_timeout(DEFAULT_TIMEOUT_MS)
    }

    /// Block until a byte arrives; `None` at end of input.
    pub fn getch_blocking(&mut self) -> Option<u8> {
        loop {
            match self.getch() {
                Key::Byte(b) => return Some(b),
                Key::Timeout => continue,
                Key::Eof => return None,
            }
        }
    }
}

/// Escape-sequence accumulator shared by the mode loops.
#[derive(Debug, Default)]
pub struct EscSeq {
    buf: [i32; 24],
    len: usize,
}

impl EscSeq {
    /// Whether an escape sequence is being collected.
    #[inline]
    pub fn pending(&self) -> bool {
        self.len > 0
    }

    /// Append one decoded code point.
    pub fn push(&mut self, c: i32) {
        if self.len < self.buf.len() {
            self.buf[self.len] = c;
            self.len += 1;
        }
    }

    /// Drop the collected sequence.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The most recently collected code point.
    pub fn last(&self) -> i32 {
        if self.len == 0 {
            -1
        } else {
            self.buf[self.len - 1]
        }
    }

    /// Code point at index `i`.
    pub fn at(&self, i: usize) -> i32 {
        if i < self.len {
            self.buf[i]
        } else {
            -1
        }
    }

    /// Number of collected code points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the pending sequence is a lone ESC awaiting its successor.
    pub fn awaiting_escape(&self) -> bool {
        self.len > 0 && self.last() == 0x1b
    }
}

const UTF8_ACCEPT: u32 = 0;
const UTF8_REJECT: u32 = 1;

/// Minimal UTF-8 DFA. Feed bytes one at a time; complete scalar values pop
/// out, invalid sequences reset silently.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    state: u32,
    codepoint: u32,
}

impl Utf8Decoder {
    /// A decoder in the accept state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a completed code point, if any.
    pub fn push(&mut self, byte: u8) -> Option<char> {
        #[rustfmt::skip]
        const STATE_TABLE: [u32; 32] = [
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0xxxxxxx
            1, 1, 1, 1, 1, 1, 1, 1,                         // 10xxxxxx
            2, 2, 2, 2,                                     // 110xxxxx
            3, 3,                                           // 1110xxxx
            4,                                              // 11110xxx
            1,                                              // 11111xxx
        ];
        #[rustfmt::skip]
        const MASK_BYTES: [u8; 32] = [
            0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F,
            0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x1F, 0x1F, 0x1F, 0x1F,
            0x0F, 0x0F,
            0x07,
            0x00,
        ];
        const NEXT: [u32; 5] = [0, 1, 0, 2, 3];

        let idx = (byte >> 3) as usize;
        if self.state == UTF8_ACCEPT {
            self.codepoint = u32::from(byte & MASK_BYTES[idx]);
            self.state = STATE_TABLE[idx];
        } else {
            self.codepoint = u32::from(byte & 0x3F) | (self.codepoint << 6);
            self.state = NEXT[self.state as usize];
        }
        match self.state {
            UTF8_ACCEPT => char::from_u32(self.codepoint),
            UTF8_REJECT => {
                self.state = UTF8_ACCEPT;
                None
            }
            _ => None,
        }
    }
}

/// Decode a whole string of bytes, skipping invalid sequences.
pub fn decode_string(bytes: &[u8]) -> Vec<char> {
    let mut decoder = Utf8Decoder::new();
    let mut out = Vec::new();
    for &b in bytes {
        if let Some(c) = decoder.push(b) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.push(b'a'), Some('a'));
        assert_eq!(d.push(b'\n'), Some('\n'));
    }

    #[test]
    fn test_decode_multibyte() {
        let mut d = Utf8Decoder::new();
        let bytes = "é".as_bytes();
        assert_eq!(d.push(bytes[0]), None);
        assert_eq!(d.push(bytes[1]), Some('é'));

        let bytes = "日".as_bytes();
        assert_eq!(d.push(bytes[0]), None);
        assert_eq!(d.push(bytes[1]), None);
        assert_eq!(d.push(bytes[2]), Some('日'));
    }

    #[test]
    fn test_reject_resets() {
        let mut d = Utf8Decoder::new();
        // A stray continuation byte rejects and resets.
        assert_eq!(d.push(0x80), None);
        assert_eq!(d.push(b'x'), Some('x'));
    }

    #[test]
    fn test_decode_string_skips_garbage() {
        let decoded = decode_string(b"a\x80b");
        assert_eq!(decoded, vec!['a', 'b']);
    }

    #[test]
    fn test_key_source_script() {
        let mut keys = KeySource::from_bytes(b"ab");
        assert_eq!(keys.getch_timeout(1), Key::Byte(b'a'));
        keys.unget(b'z');
        assert_eq!(keys.getch_timeout(1), Key::Byte(b'z'));
        assert_eq!(keys.getch_timeout(1), Key::Byte(b'b'));
        assert_eq!(keys.getch_timeout(1), Key::Eof);
    }

    #[test]
    fn test_esc_seq() {
        let mut esc = EscSeq::default();
        assert!(!esc.pending());
        esc.push(0x1b);
        assert!(esc.awaiting_escape());
        esc.push('[' as i32);
        assert!(!esc.awaiting_escape());
        assert_eq!(esc.at(0), 0x1b);
        assert_eq!(esc.last(), '[' as i32);
        esc.clear();
        assert!(esc.is_empty());
    }
}
