//! Cell: one styled code point.
//!
//! A cell is the atomic unit of buffer text: a Unicode scalar value, its
//! cached terminal display width, and a flag byte carrying the paint class
//! plus the selection/search marker bits.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

/// Paint class assigned by the syntax engine.
///
/// Stored in the low five bits of [`CellFlags`]. The two diff classes and
/// `Notice` are also used by non-syntax painters (gutter annotations and
/// search-adjacent highlights).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SyntaxClass {
    /// Plain text.
    #[default]
    None = 0,
    /// Language keyword.
    Keyword = 1,
    /// String literal.
    String = 2,
    /// Comment.
    Comment = 3,
    /// Type name.
    Type = 4,
    /// Preprocessor / pragma / decorator.
    Pragma = 5,
    /// Numeric literal (also character literals).
    Numeral = 6,
    /// Secondary string class.
    String2 = 7,
    /// Added line in a diff.
    DiffPlus = 8,
    /// Removed line in a diff.
    DiffMinus = 9,
    /// TODO/XXX/FIXME style notices.
    Notice = 10,
    /// Bold prose (markdown headings).
    Bold = 11,
    /// Hyperlink text.
    Link = 12,
    /// Escape sequence inside a string.
    Escape = 13,
}

impl SyntaxClass {
    const MASK: u8 = 0b0001_1111;

    fn from_bits(bits: u8) -> Self {
        match bits & Self::MASK {
            1 => Self::Keyword,
            2 => Self::String,
            3 => Self::Comment,
            4 => Self::Type,
            5 => Self::Pragma,
            6 => Self::Numeral,
            7 => Self::String2,
            8 => Self::DiffPlus,
            9 => Self::DiffMinus,
            10 => Self::Notice,
            11 => Self::Bold,
            12 => Self::Link,
            13 => Self::Escape,
            _ => Self::None,
        }
    }
}

bitflags! {
    /// Per-cell flag byte: paint class in the low five bits, marker bits above.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        /// Cell is part of the active selection (or a matched paren).
        const SELECT = 1 << 5;
        /// Cell is part of a search match.
        const SEARCH = 1 << 6;
        // Low bits carry the syntax class.
        const _ = 0b0001_1111;
    }
}

impl CellFlags {
    /// Flags carrying only a paint class.
    pub fn from_class(class: SyntaxClass) -> Self {
        Self::from_bits_retain(class as u8)
    }

    /// The paint class stored in the low bits.
    pub fn class(self) -> SyntaxClass {
        SyntaxClass::from_bits(self.bits())
    }

    /// Replace the paint class, preserving marker bits.
    pub fn set_class(&mut self, class: SyntaxClass) {
        *self = Self::from_bits_retain((self.bits() & !SyntaxClass::MASK) | class as u8);
    }
}

/// One styled code point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    codepoint: char,
    display_width: u8,
    flags: CellFlags,
}

impl Cell {
    /// Create a cell for a code point, caching its display width.
    pub fn new(codepoint: char) -> Self {
        Self {
            codepoint,
            display_width: codepoint_width(codepoint, true),
            flags: CellFlags::empty(),
        }
    }

    /// Create a cell with an explicit display width.
    ///
    /// Used for tabs (whose width depends on their column) and when the
    /// terminal cannot render Unicode.
    pub fn with_width(codepoint: char, display_width: u8) -> Self {
        Self {
            codepoint,
            display_width,
            flags: CellFlags::empty(),
        }
    }

    /// Create a cell carrying initial flags (used by auto-indent helpers).
    pub fn with_flags(codepoint: char, flags: CellFlags) -> Self {
        Self {
            codepoint,
            display_width: codepoint_width(codepoint, true),
            flags,
        }
    }

    /// The code point.
    #[inline]
    pub const fn codepoint(&self) -> char {
        self.codepoint
    }

    /// The cached display width in terminal cells.
    #[inline]
    pub const fn display_width(&self) -> u8 {
        self.display_width
    }

    /// Overwrite the cached width (tab recomputation).
    #[inline]
    pub fn set_display_width(&mut self, width: u8) {
        self.display_width = width;
    }

    /// The flag byte.
    #[inline]
    pub const fn flags(&self) -> CellFlags {
        self.flags
    }

    /// Mutable access to the flag byte.
    #[inline]
    pub fn flags_mut(&mut self) -> &mut CellFlags {
        &mut self.flags
    }

    /// Replace the flag byte entirely.
    #[inline]
    pub fn set_flags(&mut self, flags: CellFlags) {
        self.flags = flags;
    }
}

/// Presentation width of a code point.
///
/// Tabs report 1 here and are recomputed per-column against the tabstop.
/// Control bytes render as caret or bracket escapes with fixed widths;
/// high code points the renderer cannot place are shown as `[U+XXXX]` or
/// `[U+XXXXXX]`.
pub fn codepoint_width(codepoint: char, unicode_ok: bool) -> u8 {
    let cp = codepoint as u32;
    if codepoint == '\t' {
        return 1;
    }
    if cp < 32 || cp == 0x7f {
        // Rendered as ^@ .. ^_ and ^?
        return 2;
    }
    if cp > 0x7f && cp < 0xa0 {
        // Upper control bytes render as <xx>
        return 4;
    }
    if cp == 0xa0 {
        // Non-breaking space renders as _
        return 1;
    }
    if cp > 256 {
        if unicode_ok {
            if let Some(w) = codepoint.width() {
                if w >= 1 {
                    return w.min(15) as u8;
                }
            }
        }
        // Unrenderable: shown as [U+XXXX] or [U+XXXXXX]
        return if cp < 0x10000 { 8 } else { 10 };
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_round_trip() {
        let mut flags = CellFlags::from_class(SyntaxClass::Keyword);
        assert_eq!(flags.class(), SyntaxClass::Keyword);
        flags |= CellFlags::SELECT;
        assert_eq!(flags.class(), SyntaxClass::Keyword);
        assert!(flags.contains(CellFlags::SELECT));
        flags.set_class(SyntaxClass::String);
        assert_eq!(flags.class(), SyntaxClass::String);
        assert!(flags.contains(CellFlags::SELECT));
    }

    #[test]
    fn test_ascii_width() {
        assert_eq!(Cell::new('a').display_width(), 1);
        assert_eq!(Cell::new(' ').display_width(), 1);
    }

    #[test]
    fn test_cjk_width() {
        assert_eq!(Cell::new('日').display_width(), 2);
    }

    #[test]
    fn test_control_widths() {
        assert_eq!(codepoint_width('\u{1}', true), 2);
        assert_eq!(codepoint_width('\u{7f}', true), 2);
        assert_eq!(codepoint_width('\u{80}', true), 4);
        assert_eq!(codepoint_width('\u{a0}', true), 1);
    }

    #[test]
    fn test_tab_width_is_deferred() {
        assert_eq!(codepoint_width('\t', true), 1);
    }

    #[test]
    fn test_unrenderable_width() {
        // Combining marks report zero width and fall back to bracket form.
        assert_eq!(codepoint_width('\u{300}', true), 8);
        assert_eq!(codepoint_width('\u{10FFFF}', false), 10);
    }

    #[test]
    fn test_select_and_search_are_orthogonal() {
        let f = CellFlags::SELECT | CellFlags::SEARCH;
        assert_eq!(f.class(), SyntaxClass::None);
    }
}
