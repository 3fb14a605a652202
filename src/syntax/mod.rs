//! Incremental, line-oriented syntax highlighting.
//!
//! Each language exposes one `calculate` function that is called repeatedly
//! on a [`SyntaxState`] cursor. The return value is a small-integer protocol:
//! `0` means "continue on this line", `-1` means "done, the next line starts
//! clean", and any positive value is the state the next line inherits. The
//! engine paints by writing class bits into the cells it walks over.
//!
//! Languages with multi-line constructs encode them in the state integer:
//! block comments use `1` (or a nesting depth for Rust), Python triple-quoted
//! strings use `1`/`2`, XML uses a small tag/string/comment set, and the
//! shell highlighter stacks quoting contexts as base-10 digits. Markdown
//! composes the other lexers by reserving disjoint state ranges and
//! translating through [`nest`].

mod bash;
mod c;
mod conf;
mod diff;
mod java;
mod json;
mod make;
mod markdown;
mod python;
mod rust;
mod xml;

use crate::buffer::{CellFlags, Line, SyntaxClass};

/// Lexer cursor over one line.
pub struct SyntaxState<'a> {
    /// The line being painted.
    pub line: &'a mut Line,
    /// 0-based line number (a few lexers special-case the first lines).
    pub line_no: usize,
    /// State inherited from the previous line.
    pub state: i32,
    /// Current cell index.
    pub i: usize,
}

impl SyntaxState<'_> {
    /// Code point at the cursor, or -1 at end of line.
    #[inline]
    pub fn charat(&self) -> i32 {
        self.charrel(0)
    }

    /// Code point after the cursor, or -1.
    #[inline]
    pub fn nextchar(&self) -> i32 {
        self.charrel(1)
    }

    /// Code point before the cursor, or -1.
    #[inline]
    pub fn lastchar(&self) -> i32 {
        self.charrel(-1)
    }

    /// Code point at a relative offset, or -1 outside the line.
    pub fn charrel(&self, offset: isize) -> i32 {
        let idx = self.i as isize + offset;
        if idx < 0 {
            return -1;
        }
        match self.line.codepoint_at(idx as usize) {
            Some(c) => c as i32,
            None => -1,
        }
    }

    /// Paint `len` cells with `class` and advance.
    pub fn paint(&mut self, len: usize, class: SyntaxClass) {
        for _ in 0..len {
            if self.i >= self.line.len() {
                break;
            }
            self.line.cells_mut()[self.i].set_flags(CellFlags::from_class(class));
            self.i += 1;
        }
    }

    /// Advance one cell without painting.
    #[inline]
    pub fn skip(&mut self) {
        self.i += 1;
    }

    /// Whether the upcoming cells spell out `word` exactly to end of line.
    pub fn match_forward(&self, word: &str) -> bool {
        let mut k = 0isize;
        for ch in word.chars() {
            if self.charrel(k) != ch as i32 {
                return false;
            }
            k += 1;
        }
        self.charrel(k) == -1
    }

    /// If the previous char fails `qualifier` and the current word fully
    /// matches some entry of `keywords` with no qualifier char following,
    /// paint it and return true.
    pub fn find_keywords(
        &mut self,
        keywords: &[&str],
        class: SyntaxClass,
        qualifier: fn(i32) -> bool,
    ) -> bool {
        if qualifier(self.lastchar()) || !qualifier(self.charat()) {
            return false;
        }
        for keyword in keywords {
            let mut d = 0isize;
            let mut chars = keyword.chars();
            let matched = loop {
                match chars.next() {
                    None => break !qualifier(self.charrel(d)),
                    Some(kc) => {
                        if self.charrel(d) != kc as i32 {
                            break false;
                        }
                        d += 1;
                    }
                }
            };
            if matched {
                self.paint(keyword.chars().count(), class);
                return true;
            }
        }
        false
    }

    /// Match and paint a single keyword; usable as a prefix check.
    pub fn match_and_paint(
        &mut self,
        keyword: &str,
        class: SyntaxClass,
        qualifier: fn(i32) -> bool,
    ) -> bool {
        self.find_keywords(&[keyword], class, qualifier)
    }

    /// Paint a single-line comment to end of line, highlighting notices.
    pub fn paint_comment(&mut self) -> i32 {
        while self.charat() != -1 {
            if self.match_and_paint("TODO", SyntaxClass::Notice, c_keyword_qualifier)
                || self.match_and_paint("XXX", SyntaxClass::Notice, c_keyword_qualifier)
                || self.match_and_paint("FIXME", SyntaxClass::Notice, c_keyword_qualifier)
            {
                continue;
            }
            self.paint(1, SyntaxClass::Comment);
        }
        -1
    }

    /// Paint a block comment until `*/` or end of line.
    ///
    /// Returns 1 when the comment continues on the next line.
    pub fn paint_c_comment(&mut self) -> i32 {
        let mut last = -1;
        while self.charat() != -1 {
            if self.match_and_paint("TODO", SyntaxClass::Notice, c_keyword_qualifier)
                || self.match_and_paint("XXX", SyntaxClass::Notice, c_keyword_qualifier)
                || self.match_and_paint("FIXME", SyntaxClass::Notice, c_keyword_qualifier)
            {
                continue;
            }
            if last == '*' as i32 && self.charat() == '/' as i32 {
                self.paint(1, SyntaxClass::Comment);
                return 0;
            }
            last = self.charat();
            self.paint(1, SyntaxClass::Comment);
        }
        1
    }

    /// Paint a double-quoted string with no escape highlighting.
    pub fn paint_simple_string(&mut self) {
        // Assumes the caller checked for the opening quote.
        self.paint(1, SyntaxClass::String);
        let mut last = -1;
        while self.charat() != -1 {
            if last != '\\' as i32 && self.charat() == '"' as i32 {
                self.paint(1, SyntaxClass::String);
                return;
            }
            if last == '\\' as i32 && self.charat() == '\\' as i32 {
                self.paint(1, SyntaxClass::String);
                last = -1;
            } else {
                last = self.charat();
                self.paint(1, SyntaxClass::String);
            }
        }
    }

    /// Paint a C string with `\xHH`, `\NNN`, `\n`, `\r`, `\\` escapes in the
    /// escape class.
    pub fn paint_c_string(&mut self) {
        self.paint(1, SyntaxClass::String);
        let mut last = -1;
        while self.charat() != -1 {
            if last != '\\' as i32 && self.charat() == '"' as i32 {
                self.paint(1, SyntaxClass::String);
                return;
            }
            if self.charat() == '\\' as i32
                && (self.nextchar() == '\\' as i32
                    || self.nextchar() == 'n' as i32
                    || self.nextchar() == 'r' as i32)
            {
                self.paint(2, SyntaxClass::Escape);
                last = -1;
            } else if self.charat() == '\\' as i32 && is_octal(self.nextchar()) {
                self.paint(2, SyntaxClass::Escape);
                if is_octal(self.charat()) {
                    self.paint(1, SyntaxClass::Escape);
                    if is_octal(self.charat()) {
                        self.paint(1, SyntaxClass::Escape);
                    }
                }
                last = -1;
            } else if self.charat() == '\\' as i32 && self.nextchar() == 'x' as i32 {
                self.paint(2, SyntaxClass::Escape);
                while is_xdigit(self.charat()) {
                    self.paint(1, SyntaxClass::Escape);
                }
            } else {
                last = self.charat();
                self.paint(1, SyntaxClass::String);
            }
        }
    }

    /// Paint a single-quoted character literal (possibly multibyte).
    pub fn paint_c_char(&mut self) {
        self.paint(1, SyntaxClass::Numeral);
        let mut last = -1;
        while self.charat() != -1 {
            if last != '\\' as i32 && self.charat() == '\'' as i32 {
                self.paint(1, SyntaxClass::Numeral);
                return;
            }
            if last == '\\' as i32 && self.charat() == '\\' as i32 {
                self.paint(1, SyntaxClass::Numeral);
                last = -1;
            } else {
                last = self.charat();
                self.paint(1, SyntaxClass::Numeral);
            }
        }
    }

    /// Paint hex, octal, and decimal numerals with C suffixes.
    pub fn paint_c_numeral(&mut self) -> i32 {
        if self.charat() == '0' as i32
            && (self.nextchar() == 'x' as i32 || self.nextchar() == 'X' as i32)
        {
            self.paint(2, SyntaxClass::Numeral);
            while is_xdigit(self.charat()) {
                self.paint(1, SyntaxClass::Numeral);
            }
        } else if self.charat() == '0' as i32 && self.nextchar() == '.' as i32 {
            self.paint(2, SyntaxClass::Numeral);
            while is_digit(self.charat()) {
                self.paint(1, SyntaxClass::Numeral);
            }
            if self.charat() == 'f' as i32 {
                self.paint(1, SyntaxClass::Numeral);
            }
            return 0;
        } else if self.charat() == '0' as i32 {
            self.paint(1, SyntaxClass::Numeral);
            while is_octal(self.charat()) {
                self.paint(1, SyntaxClass::Numeral);
            }
        } else {
            while is_digit(self.charat()) {
                self.paint(1, SyntaxClass::Numeral);
            }
            if self.charat() == '.' as i32 {
                self.paint(1, SyntaxClass::Numeral);
                while is_digit(self.charat()) {
                    self.paint(1, SyntaxClass::Numeral);
                }
                if self.charat() == 'f' as i32 {
                    self.paint(1, SyntaxClass::Numeral);
                }
                return 0;
            }
        }
        loop {
            let c = self.charat();
            if c == 'u' as i32 || c == 'U' as i32 || c == 'l' as i32 || c == 'L' as i32 {
                self.paint(1, SyntaxClass::Numeral);
            } else {
                break;
            }
        }
        0
    }
}

/// The standard identifier-character qualifier.
pub fn c_keyword_qualifier(c: i32) -> bool {
    is_alnum(c) || c == '_' as i32
}

pub(crate) fn is_digit(c: i32) -> bool {
    (c >= '0' as i32) && (c <= '9' as i32)
}

pub(crate) fn is_octal(c: i32) -> bool {
    (c >= '0' as i32) && (c <= '7' as i32)
}

pub(crate) fn is_xdigit(c: i32) -> bool {
    is_digit(c)
        || (c >= 'a' as i32 && c <= 'f' as i32)
        || (c >= 'A' as i32 && c <= 'F' as i32)
}

pub(crate) fn is_alpha(c: i32) -> bool {
    (c >= 'a' as i32 && c <= 'z' as i32) || (c >= 'A' as i32 && c <= 'Z' as i32)
}

pub(crate) fn is_alnum(c: i32) -> bool {
    is_alpha(c) || is_digit(c)
}

pub(crate) fn is_space(c: i32) -> bool {
    c == ' ' as i32 || c == '\t' as i32
}

/// Run a nested lexer inside a reserved state range.
///
/// The outer state is translated down by `base` before the inner lexer runs
/// and back up afterwards; `base` itself means "inner lexer starts clean".
pub fn nest(state: &mut SyntaxState, inner: Syntax, base: i32) -> i32 {
    state.state = if state.state < 1 {
        0
    } else {
        state.state - base
    };
    loop {
        state.state = inner.calculate_raw(state);
        if state.state != 0 {
            break;
        }
    }
    if state.state == -1 {
        base
    } else {
        state.state + base
    }
}

/// The closed set of supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    C,
    Python,
    Java,
    Diff,
    Conf,
    Rust,
    Bimrc,
    Biminfo,
    GitCommit,
    GitRebase,
    Make,
    Markdown,
    Json,
    Xml,
    Bash,
}

/// Every syntax definition, in completion/version-listing order.
pub const SYNTAXES: &[Syntax] = &[
    Syntax::C,
    Syntax::Python,
    Syntax::Java,
    Syntax::Diff,
    Syntax::Conf,
    Syntax::Rust,
    Syntax::Bimrc,
    Syntax::Biminfo,
    Syntax::GitCommit,
    Syntax::GitRebase,
    Syntax::Make,
    Syntax::Markdown,
    Syntax::Json,
    Syntax::Xml,
    Syntax::Bash,
];

impl Syntax {
    /// Display name (status bar, `:syntax`, `--version`).
    pub fn name(self) -> &'static str {
        match self {
            Syntax::C => "c",
            Syntax::Python => "python",
            Syntax::Java => "java",
            Syntax::Diff => "diff",
            Syntax::Conf => "conf",
            Syntax::Rust => "rust",
            Syntax::Bimrc => "bimrc",
            Syntax::Biminfo => "biminfo",
            Syntax::GitCommit => "gitcommit",
            Syntax::GitRebase => "gitrebase",
            Syntax::Make => "make",
            Syntax::Markdown => "markdown",
            Syntax::Json => "json",
            Syntax::Xml => "xml",
            Syntax::Bash => "bash",
        }
    }

    /// File name suffixes (or whole names) that select this syntax.
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Syntax::C => &[".c", ".h", ".cpp", ".hpp", ".c++", ".h++", ".cc", ".hh"],
            Syntax::Python => &[".py"],
            Syntax::Java => &[".java"],
            Syntax::Diff => &[".patch", ".diff"],
            Syntax::Conf => &[".conf", ".ini", ".git/config"],
            Syntax::Rust => &[".rs"],
            Syntax::Bimrc => &[".bimrc"],
            Syntax::Biminfo => &[".biminfo"],
            Syntax::GitCommit => &["COMMIT_EDITMSG"],
            Syntax::GitRebase => &["git-rebase-todo"],
            Syntax::Make => &["Makefile", "makefile", "GNUmakefile", ".mak"],
            Syntax::Markdown => &[".md", ".markdown"],
            Syntax::Json => &[".json"],
            Syntax::Xml => &[".xml", ".htm", ".html"],
            Syntax::Bash => &[".sh", ".bash", ".bashrc"],
        }
    }

    /// Whether files in this language conventionally indent with spaces.
    pub fn prefers_spaces(self) -> bool {
        matches!(
            self,
            Syntax::Python
                | Syntax::Java
                | Syntax::Rust
                | Syntax::Markdown
                | Syntax::Json
                | Syntax::Xml
        )
    }

    /// Pick a syntax for a file name.
    pub fn match_name(file: &str) -> Option<Syntax> {
        for syntax in SYNTAXES {
            for ext in syntax.extensions() {
                if file.ends_with(ext) {
                    return Some(*syntax);
                }
            }
        }
        None
    }

    /// Look a syntax up by display name.
    pub fn by_name(name: &str) -> Option<Syntax> {
        SYNTAXES.iter().copied().find(|s| s.name() == name)
    }

    /// One step of the lexer; see the module docs for the return protocol.
    pub(crate) fn calculate_raw(self, state: &mut SyntaxState) -> i32 {
        match self {
            Syntax::C => c::calculate(state),
            Syntax::Python => python::calculate(state),
            Syntax::Java => java::calculate(state),
            Syntax::Diff => diff::calculate(state),
            Syntax::Conf => conf::calculate(state),
            Syntax::Rust => rust::calculate(state),
            Syntax::Bimrc => conf::calculate_bimrc(state),
            Syntax::Biminfo => conf::calculate_biminfo(state),
            Syntax::GitCommit => conf::calculate_gitcommit(state),
            Syntax::GitRebase => conf::calculate_gitrebase(state),
            Syntax::Make => make::calculate(state),
            Syntax::Markdown => markdown::calculate(state),
            Syntax::Json => json::calculate(state),
            Syntax::Xml => xml::calculate(state),
            Syntax::Bash => bash::calculate(state),
        }
    }

    /// Lex one full line from `istate`, painting its cells; returns the
    /// terminal state the next line inherits (-1 for "clean").
    pub fn lex_line(self, line: &mut Line, line_no: usize, istate: i32) -> i32 {
        let mut st = SyntaxState {
            line,
            line_no,
            state: istate,
            i: 0,
        };
        loop {
            let next = self.calculate_raw(&mut st);
            if next != 0 {
                return next;
            }
            st.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Cell;

    pub(super) fn line_of(text: &str) -> Line {
        Line::from_cells(text.chars().map(Cell::new).collect())
    }

    pub(super) fn class_at(line: &Line, idx: usize) -> SyntaxClass {
        line.cells()[idx].flags().class()
    }

    #[test]
    fn test_match_name() {
        assert_eq!(Syntax::match_name("foo.rs"), Some(Syntax::Rust));
        assert_eq!(Syntax::match_name("Makefile"), Some(Syntax::Make));
        assert_eq!(Syntax::match_name("a/b/test.cpp"), Some(Syntax::C));
        assert_eq!(Syntax::match_name("noext"), None);
    }

    #[test]
    fn test_find_keywords_requires_word_boundary() {
        let mut line = line_of("ifx if");
        let mut st = SyntaxState {
            line: &mut line,
            line_no: 0,
            state: 0,
            i: 0,
        };
        assert!(!st.find_keywords(&["if"], SyntaxClass::Keyword, c_keyword_qualifier));
        st.i = 4;
        assert!(st.find_keywords(&["if"], SyntaxClass::Keyword, c_keyword_qualifier));
        assert_eq!(st.i, 6);
    }

    #[test]
    fn test_paint_c_string_escapes() {
        let mut line = line_of(r#""a\n b""#);
        let mut st = SyntaxState {
            line: &mut line,
            line_no: 0,
            state: 0,
            i: 0,
        };
        st.paint_c_string();
        assert_eq!(class_at(&line, 0), SyntaxClass::String);
        assert_eq!(class_at(&line, 2), SyntaxClass::Escape);
        assert_eq!(class_at(&line, 3), SyntaxClass::Escape);
        assert_eq!(class_at(&line, 6), SyntaxClass::String);
    }

    #[test]
    fn test_match_forward_requires_eol() {
        let mut line = line_of("rust");
        let st = SyntaxState {
            line: &mut line,
            line_no: 0,
            state: 0,
            i: 0,
        };
        assert!(st.match_forward("rust"));
        assert!(!st.match_forward("ru"));
    }
}
