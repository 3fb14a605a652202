//! Search and substitution.
//!
//! Matching is literal with smart case. Incremental search repaints every
//! occurrence's SEARCH flags after each keystroke and moves the cursor to
//! the nearest match; ENTER commits the needle to the buffer, ESC restores
//! the cursor.

use super::Editor;
use crate::buffer::{Buffer, CellFlags};
use crate::input::{Key, Utf8Decoder};

impl Editor {
    /// Clear SEARCH flags, then repaint every occurrence of `needle`.
    pub fn draw_search_match(&mut self, needle: &[char], echo: Option<char>) {
        {
            let buf = self.buf_mut();
            for line in &mut buf.lines {
                for cell in line.cells_mut() {
                    cell.flags_mut().remove(CellFlags::SEARCH);
                }
            }
        }
        let ignorecase = Buffer::smart_case(needle, self.config.smart_case);
        let mut from = (1usize, 1usize);
        while let Some((line, col)) = {
            let buf = self.buf();
            buf.find_match(from.0, from.1, needle, ignorecase)
        } {
            let buf = self.buf_mut();
            for k in 0..needle.len() {
                if let Some(cell) = buf.lines[line - 1].cells_mut().get_mut(col - 1 + k) {
                    *cell.flags_mut() |= CellFlags::SEARCH;
                }
            }
            from = (line, col + 1);
        }
        self.redraw_text();
        self.place_cursor_actual();
        self.redraw_statusbar();
        self.redraw_commandline();
        if let Some(prompt) = echo {
            self.term.out().write_char(prompt);
            let text: String = needle.iter().collect();
            self.term.out().write_str(&text);
            let _ = self.term.flush();
        }
    }

    /// Jump to the next match of the committed needle, wrapping.
    pub fn search_next(&mut self) {
        let Some(needle) = self.buf().search.clone() else {
            return;
        };
        if self.buf().coffset != 0 {
            self.buf_mut().coffset = 0;
        }
        let ignorecase = Buffer::smart_case(&needle, self.config.smart_case);
        let from = (self.buf().line_no, self.buf().col_no + 1);
        let found = self
            .buf()
            .find_match(from.0, from.1, &needle, ignorecase)
            .or_else(|| self.buf().find_match(1, 1, &needle, ignorecase));
        let Some((line, col)) = found else { return };
        let buf = self.buf_mut();
        buf.col_no = col;
        buf.line_no = line;
        buf.set_preferred_column();
        self.draw_search_match(&needle, None);
    }

    /// Jump to the previous match of the committed needle, wrapping.
    pub fn search_prev(&mut self) {
        let Some(needle) = self.buf().search.clone() else {
            return;
        };
        if self.buf().coffset != 0 {
            self.buf_mut().coffset = 0;
        }
        let ignorecase = Buffer::smart_case(&needle, self.config.smart_case);
        let from = (self.buf().line_no, self.buf().col_no.saturating_sub(1));
        let found = self
            .buf()
            .find_match_backwards(from.0, from.1, &needle, ignorecase)
            .or_else(|| {
                let buf = self.buf();
                let last = buf.line_count();
                buf.find_match_backwards(last, buf.lines[last - 1].len(), &needle, ignorecase)
            });
        let Some((line, col)) = found else { return };
        let buf = self.buf_mut();
        buf.col_no = col;
        buf.line_no = line;
        buf.set_preferred_column();
        self.draw_search_match(&needle, None);
    }

    /// Populate the needle from the identifier under the cursor and search.
    pub fn search_under_cursor(&mut self) {
        let buf = self.buf();
        let line = buf.current_line();
        let qualifies =
            |c: Option<char>| matches!(c, Some(c) if c.is_alphanumeric() || c == '_');
        let mut before = 0usize;
        let mut i = buf.col_no;
        while i > 0 && qualifies(line.codepoint_at(i - 1)) {
            before += 1;
            i -= 1;
        }
        let mut after = 0usize;
        let mut i = buf.col_no + 1;
        while i < line.len() + 1 && qualifies(line.codepoint_at(i - 1)) {
            after += 1;
            i += 1;
        }
        if before == 0 && after == 0 {
            return;
        }
        let start = buf.col_no - before;
        let needle: Vec<char> = (0..before + after)
            .filter_map(|k| line.codepoint_at(start + k))
            .collect();
        self.buf_mut().search = Some(needle);
        self.search_next();
    }

    /// Incremental search prompt. `forward` selects `/` vs `?`.
    pub fn search_mode(&mut self, forward: bool) {
        let mut needle: Vec<char> = Vec::new();
        let prompt = if forward { '/' } else { '?' };

        let prev_line = self.buf().line_no;
        let prev_col = self.buf().col_no;
        let prev_coffset = self.buf().coffset;
        let prev_offset = self.buf().offset;

        self.redraw_commandline();
        self.term.out().write_char(prompt);
        if let Some(existing) = self.buf().search.clone() {
            // Ghost of the previous needle.
            self.term.save_cursor();
            let alt_fg = self.theme.alt_fg;
            let bg = self.theme.bg;
            self.term.set_colors(alt_fg, bg);
            let text: String = existing.iter().collect();
            self.term.out().write_str(&text);
            self.term.restore_cursor();
            let fg = self.theme.fg;
            self.term.set_colors(fg, bg);
        }
        self.term.show_cursor();
        let _ = self.term.flush();

        let mut decoder = Utf8Decoder::new();
        loop {
            let byte = match self.getch(crate::input::DEFAULT_TIMEOUT_MS) {
                Key::Byte(b) => b,
                Key::Timeout => continue,
                Key::Eof => break,
            };
            let Some(c) = decoder.push(byte) else {
                continue;
            };
            if c == '\x1b' {
                // Cancel: restore the cursor and clear the halos.
                let buf = self.buf_mut();
                buf.line_no = prev_line;
                buf.col_no = prev_col;
                for line in &mut buf.lines {
                    for cell in line.cells_mut() {
                        cell.flags_mut().remove(CellFlags::SEARCH);
                    }
                }
                self.redraw_all();
                break;
            } else if c == '\r' || c == '\n' {
                if needle.is_empty() {
                    if self.buf().search.is_some() {
                        self.search_next();
                    }
                    break;
                }
                self.buf_mut().search = Some(needle);
                break;
            } else if c == '\x08' || c == '\x7f' {
                if needle.is_empty() {
                    // Backspaced through the whole needle: cancel.
                    self.redraw_commandline();
                    let buf = self.buf_mut();
                    buf.coffset = prev_coffset;
                    buf.offset = prev_offset;
                    buf.col_no = prev_col;
                    buf.line_no = prev_line;
                    buf.set_preferred_column();
                    self.redraw_all();
                    break;
                }
                needle.pop();
                let ignorecase = Buffer::smart_case(&needle, self.config.smart_case);
                let found = if forward {
                    self.buf().find_match(prev_line, prev_col, &needle, ignorecase)
                } else {
                    self.buf()
                        .find_match_backwards(prev_line, prev_col, &needle, ignorecase)
                };
                if let Some((line, col)) = found {
                    let buf = self.buf_mut();
                    buf.col_no = col;
                    buf.line_no = line;
                    buf.set_preferred_column();
                }
                self.draw_search_match(&needle, Some(prompt));
            } else {
                needle.push(c);
                let ignorecase = Buffer::smart_case(&needle, self.config.smart_case);
                let found = if forward {
                    self.buf().find_match(prev_line, prev_col, &needle, ignorecase)
                } else {
                    self.buf()
                        .find_match_backwards(prev_line, prev_col, &needle, ignorecase)
                };
                match found {
                    Some((line, col)) => {
                        let buf = self.buf_mut();
                        buf.col_no = col;
                        buf.line_no = line;
                        buf.set_preferred_column();
                    }
                    None => {
                        let buf = self.buf_mut();
                        buf.coffset = prev_coffset;
                        buf.offset = prev_offset;
                        buf.col_no = prev_col;
                        buf.line_no = prev_line;
                        buf.set_preferred_column();
                    }
                }
                self.draw_search_match(&needle, Some(prompt));
            }
            self.term.show_cursor();
            let _ = self.term.flush();
        }
    }

    /// Replace the first occurrence of `needle` at or after `col` (0-based)
    /// on a line. Returns the column after the replacement, or `None`.
    pub fn perform_replacement(
        &mut self,
        line_no: usize,
        needle: &[char],
        replacement: &[char],
        col: usize,
        ignorecase: bool,
    ) -> Option<usize> {
        let found = {
            let buf = self.buf();
            buf.find_match(line_no, col + 1, needle, ignorecase)
                .filter(|(l, _)| *l == line_no)
        };
        let (_, at) = found?;
        let buf = self.buf_mut();
        for _ in 0..needle.len() {
            buf.line_delete(line_no - 1, at);
        }
        for (t, &c) in replacement.iter().enumerate() {
            let cell = buf.make_cell(c);
            buf.line_insert(line_no - 1, cell, at - 1 + t);
        }
        let after = at - 1 + replacement.len();
        self.set_modified();
        Some(after)
    }

    /// `:s/needle/repl/[g][i]` over a 1-based inclusive line range.
    pub fn substitute(&mut self, range: (usize, usize), expr: &str) {
        let mut parts = expr.chars();
        let Some(divider) = parts.next() else {
            self.render_error("expected substitution argument");
            return;
        };
        let rest: String = parts.collect();
        let mut fields = rest.split(divider);
        let needle: Vec<char> = match fields.next() {
            Some(n) if !n.is_empty() => n.chars().collect(),
            _ => {
                self.render_error("expected substitution argument");
                return;
            }
        };
        let Some(replacement) = fields.next() else {
            self.render_error("nothing to replace with");
            return;
        };
        let replacement: Vec<char> = replacement.chars().collect();
        let options = fields.next().unwrap_or("");
        let global = options.contains('g');
        let case_insensitive = options.contains('i');

        let mut replacements = 0usize;
        for line in range.0..=range.1.min(self.buf().line_count()) {
            let mut col = 0usize;
            while let Some(next) =
                self.perform_replacement(line, &needle, &replacement, col, case_insensitive)
            {
                replacements += 1;
                col = next;
                if !global {
                    break;
                }
            }
        }
        if replacements > 0 {
            let plural = if replacements == 1 { "" } else { "s" };
            let needle_text: String = needle.iter().collect();
            let msg = format!("replaced {replacements} instance{plural} of {needle_text}");
            self.render_status_message(&msg);
            self.buf_mut().set_history_break();
            self.redraw_text();
        } else {
            let needle_text: String = needle.iter().collect();
            let msg = format!("Pattern not found: {needle_text}");
            self.render_error(&msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::headless;

    #[test]
    fn test_substitute_is_case_sensitive_by_default() {
        let mut ed = headless(&["Hello hello HELLO"]);
        ed.substitute((1, 1), "/hello/hi/g");
        assert_eq!(ed.buf().lines[0].to_text(), "Hello hi HELLO");
        ed.substitute((1, 1), "/HELLO/bye/g");
        assert_eq!(ed.buf().lines[0].to_text(), "Hello hi bye");
    }

    #[test]
    fn test_substitute_ignorecase_option() {
        let mut ed = headless(&["Hello hello HELLO"]);
        ed.substitute((1, 1), "/hello/hi/gi");
        assert_eq!(ed.buf().lines[0].to_text(), "hi hi hi");
    }

    #[test]
    fn test_substitute_single_vs_global() {
        let mut ed = headless(&["aaa"]);
        ed.substitute((1, 1), "/a/b/");
        assert_eq!(ed.buf().lines[0].to_text(), "baa");
        let mut ed = headless(&["aaa"]);
        ed.substitute((1, 1), "/a/b/g");
        assert_eq!(ed.buf().lines[0].to_text(), "bbb");
    }

    #[test]
    fn test_substitute_no_infinite_loop_on_growing_replacement() {
        let mut ed = headless(&["x"]);
        ed.substitute((1, 1), "/x/xx/g");
        assert_eq!(ed.buf().lines[0].to_text(), "xx");
    }

    #[test]
    fn test_substitute_range() {
        let mut ed = headless(&["a", "a", "a"]);
        ed.substitute((2, 3), "/a/b/");
        let texts: Vec<String> = ed.buf().lines.iter().map(|l| l.to_text()).collect();
        assert_eq!(texts, vec!["a", "b", "b"]);
    }

    #[test]
    fn test_search_next_wraps() {
        let mut ed = headless(&["one", "two", "one"]);
        ed.buf_mut().search = Some("one".chars().collect());
        ed.search_next();
        assert_eq!(ed.buf().line_no, 3);
        ed.search_next();
        assert_eq!(ed.buf().line_no, 1);
    }

    #[test]
    fn test_search_under_cursor() {
        let mut ed = headless(&["foo bar", "bar foo"]);
        ed.buf_mut().col_no = 5;
        ed.search_under_cursor();
        assert_eq!(ed.buf().search.as_deref(), Some(&"bar".chars().collect::<Vec<_>>()[..]));
        assert_eq!(ed.buf().line_no, 2);
        assert_eq!(ed.buf().col_no, 1);
    }
}
