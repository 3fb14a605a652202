//! Buffer: one edited document.
//!
//! A buffer owns its lines, cursor, viewport, per-buffer options, search
//! needle, and history journal. The mutation primitives here are the only
//! way text changes: each one emits a history record (unless the buffer is
//! loading or history is disabled) and recomputes tab widths and syntax for
//! the affected lines before the next render.

use std::path::PathBuf;

use super::cell::{codepoint_width, Cell, CellFlags};
use super::line::{Line, RevStatus};
use crate::history::{History, Record};
use crate::syntax::Syntax;

/// Editor mode. Kept per buffer so tab switches restore the mode line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigation and operator keys.
    #[default]
    Normal,
    /// Text entry.
    Insert,
    /// Whole-line selection.
    LineSelection,
    /// Overwrite entry.
    Replace,
    /// Character-range selection.
    CharSelection,
    /// Column selection.
    ColSelection,
    /// Column insert (multi-line simultaneous entry).
    ColInsert,
}

/// One edited document with cursor, viewport, history, and options.
#[derive(Debug)]
pub struct Buffer {
    /// Suppresses history and syntax cascades during bulk loads and replay.
    pub loading: bool,
    /// Indent with tabs (false = spaces).
    pub tabs: bool,
    /// Buffer differs from the saved file.
    pub modified: bool,
    /// Rejects mutations from the mode handlers.
    pub readonly: bool,
    /// Auto-indent on line feed.
    pub indent: bool,
    /// A matched paren is currently highlighted.
    pub highlighting_paren: bool,
    /// Re-run the git annotation after each save.
    pub check_git_on_write: bool,
    /// Current mode.
    pub mode: Mode,
    /// Tab stop width.
    pub tabstop: usize,
    /// Backing file, if any.
    pub file_name: Option<PathBuf>,
    /// First visible line (0-based).
    pub offset: usize,
    /// Horizontal scroll in display cells.
    pub coffset: usize,
    /// Cursor line (1-based).
    pub line_no: usize,
    /// Cursor column (1-based).
    pub col_no: usize,
    /// Display column vertical movement aims for.
    pub preferred_column: usize,
    /// Current search needle.
    pub search: Option<Vec<char>>,
    /// Active syntax definition.
    pub syntax: Option<Syntax>,
    /// The text.
    pub lines: Vec<Line>,
    /// Undo/redo journal.
    pub history: History,
    /// Render width of this buffer's pane.
    pub width: usize,
    /// Left edge of this buffer's pane.
    pub left: usize,
    /// Selection anchor line (1-based).
    pub start_line: usize,
    /// Selection column for column modes (display cells).
    pub sel_col: usize,
    /// Whether mutations are journaled.
    pub history_enabled: bool,
    /// Whether the terminal renders Unicode (affects cached widths).
    pub unicode_ok: bool,
    /// Highest line index touched by the last syntax recalculation.
    pub last_cascade: usize,
}

impl Buffer {
    /// A fresh single-line buffer.
    pub fn new(history_enabled: bool, unicode_ok: bool) -> Self {
        Self {
            loading: false,
            tabs: true,
            modified: false,
            readonly: false,
            indent: true,
            highlighting_paren: false,
            check_git_on_write: false,
            mode: Mode::Normal,
            tabstop: 4,
            file_name: None,
            offset: 0,
            coffset: 0,
            line_no: 1,
            col_no: 1,
            preferred_column: 0,
            search: None,
            syntax: None,
            lines: vec![Line::new()],
            history: History::new(),
            width: 0,
            left: 0,
            start_line: 1,
            sel_col: 0,
            history_enabled,
            unicode_ok,
            last_cascade: 0,
        }
    }

    /// Build a cell honoring this buffer's Unicode capability.
    pub fn make_cell(&self, codepoint: char) -> Cell {
        Cell::with_width(codepoint, codepoint_width(codepoint, self.unicode_ok))
    }

    /// Number of lines (always at least 1).
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The cursor line.
    #[inline]
    pub fn current_line(&self) -> &Line {
        &self.lines[self.line_no - 1]
    }

    fn record(&mut self, record: Record) {
        if !self.loading && self.history_enabled {
            self.history.append(record);
        }
    }

    /// Insert a transaction boundary unless one is already at the head.
    pub fn set_history_break(&mut self) {
        if self.history_enabled {
            self.history.set_break();
        }
    }

    /// Insert a cell into a line. `line` is 0-based; `offset` in `[0, len]`.
    pub fn line_insert(&mut self, line: usize, cell: Cell, offset: usize) {
        self.record(Record::Insert {
            line,
            offset,
            cp: cell,
        });
        self.lines[line].insert_cell(offset, cell);
        if !self.loading {
            self.lines[line].rev_status = RevStatus::ModifiedUnsaved;
            self.lines[line].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(line);
        }
    }

    /// Remove the cell before `offset` (backspace semantics); no-op at 0.
    pub fn line_delete(&mut self, line: usize, offset: usize) {
        if offset == 0 {
            return;
        }
        let old = self.lines[line].cells()[offset - 1];
        self.record(Record::Delete { line, offset, old });
        self.lines[line].delete_cell(offset);
        self.lines[line].rev_status = RevStatus::ModifiedUnsaved;
        if !self.loading {
            self.lines[line].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(line);
        }
    }

    /// Overwrite the cell at `offset` (0-based).
    pub fn line_replace(&mut self, line: usize, offset: usize, cell: Cell) {
        let old = self.lines[line].cells()[offset];
        self.record(Record::Replace {
            line,
            offset,
            new: cell,
            old,
        });
        self.lines[line].replace_cell(offset, cell);
        if !self.loading {
            self.lines[line].rev_status = RevStatus::ModifiedUnsaved;
            self.lines[line].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(line);
        }
    }

    /// Remove a line; clearing it instead when it is the only one.
    pub fn remove_line(&mut self, offset: usize) {
        if self.lines.len() == 1 {
            while !self.lines[offset].is_empty() {
                let len = self.lines[offset].len();
                self.line_delete(offset, len);
            }
            return;
        }
        let old = self.lines[offset].snapshot();
        self.record(Record::RemoveLine { line: offset, old });
        self.lines.remove(offset);
    }

    /// Insert a new empty line at `offset` (0-based into an N+1 slot gap).
    pub fn add_line(&mut self, offset: usize) {
        if offset > self.lines.len() {
            return;
        }
        self.record(Record::AddLine { line: offset });
        self.lines.insert(offset, Line::new());
        if !self.loading {
            self.lines[offset].rev_status = RevStatus::ModifiedUnsaved;
            if offset > 0 {
                self.recalculate_syntax(offset - 1);
            }
        }
    }

    /// Clone other contents into the line at `offset`.
    pub fn replace_line(&mut self, offset: usize, replacement: &[Cell]) {
        let old = self.lines[offset].snapshot();
        self.record(Record::ReplaceLine {
            line: offset,
            old,
            new: replacement.to_vec(),
        });
        self.lines[offset].clone_from_cells(replacement);
        if !self.loading {
            self.lines[offset].rev_status = RevStatus::ModifiedUnsaved;
            self.lines[offset].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(offset);
        }
    }

    /// Concatenate line `lineb` onto `lineb - 1` and remove it.
    pub fn merge_lines(&mut self, lineb: usize) {
        let linea = lineb - 1;
        self.record(Record::MergeLines {
            line: lineb,
            col: self.lines[linea].len(),
        });
        let absorbed = std::mem::take(&mut self.lines[lineb]);
        self.lines[linea].extend_from(&absorbed);
        if !self.loading {
            self.lines[linea].rev_status = RevStatus::ModifiedUnsaved;
            self.lines[linea].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(linea);
        }
        self.lines.remove(lineb);
    }

    /// Split `line` at column `split` into `[0, split)` and `[split, len)`.
    /// Splitting at column 0 is the same as inserting a blank line above.
    pub fn split_line(&mut self, line: usize, split: usize) {
        if split == 0 {
            self.add_line(line);
            return;
        }
        self.record(Record::SplitLine { line, col: split });
        let tail = self.lines[line].split_off(split);
        self.lines.insert(line + 1, Line::from_cells(tail));
        if !self.loading {
            self.lines[line].rev_status = RevStatus::ModifiedUnsaved;
            self.lines[line + 1].rev_status = RevStatus::ModifiedUnsaved;
            self.lines[line].recalculate_tabs(self.tabstop);
            self.lines[line + 1].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(line);
            self.recalculate_syntax(line + 1);
        }
    }

    /// Recompute tab widths for one line (skipped while loading).
    pub fn recalculate_tabs_line(&mut self, line: usize) {
        if self.loading {
            return;
        }
        let tabstop = self.tabstop;
        self.lines[line].recalculate_tabs(tabstop);
    }

    /// Recompute syntax flags for a line, cascading to subsequent lines
    /// whose inherited state changes. Returns the last line recomputed; the
    /// caller widens its redraw when that exceeds the edited line.
    pub fn recalculate_syntax(&mut self, line_no: usize) -> usize {
        let Some(syntax) = self.syntax else {
            for cell in self.lines[line_no].cells_mut() {
                cell.set_flags(CellFlags::empty());
            }
            self.last_cascade = line_no;
            return line_no;
        };
        let mut ln = line_no;
        loop {
            let line = &mut self.lines[ln];
            for cell in line.cells_mut() {
                cell.set_flags(CellFlags::empty());
            }
            let istate = line.istate;
            let end_state = syntax.lex_line(line, ln, istate);
            if ln + 1 < self.lines.len() && self.lines[ln + 1].istate != end_state {
                self.lines[ln + 1].istate = end_state;
                if self.loading {
                    break;
                }
                ln += 1;
            } else {
                break;
            }
        }
        self.last_cascade = ln;
        ln
    }

    /// Reset every line's inherited state and re-lex the whole buffer.
    pub fn full_recalculate(&mut self) {
        for line in &mut self.lines {
            line.istate = 0;
        }
        let was_loading = self.loading;
        self.loading = true;
        for i in 0..self.lines.len() {
            self.lines[i].recalculate_tabs(self.tabstop);
            self.recalculate_syntax(i);
        }
        self.loading = was_loading;
    }

    /// Record the display column the cursor currently occupies so vertical
    /// movement can aim for it across shorter lines.
    pub fn set_preferred_column(&mut self) {
        let line = &self.lines[self.line_no - 1];
        let mut col = 0usize;
        for (i, cell) in line.cells().iter().enumerate() {
            if i >= self.col_no - 1 {
                break;
            }
            col += cell.display_width() as usize;
        }
        self.preferred_column = col;
    }

    /// Clamp the cursor into the valid range for NORMAL mode.
    pub fn clamp_cursor(&mut self) {
        if self.line_no > self.lines.len() {
            self.line_no = self.lines.len();
        }
        if self.line_no < 1 {
            self.line_no = 1;
        }
        let len = self.current_line().len();
        if self.col_no > len {
            self.col_no = len.max(1);
        }
        if self.col_no < 1 {
            self.col_no = 1;
        }
    }

    /// Undo one transaction, replaying inverse records through the same
    /// primitives under the loading flag. Returns (chars, lines) changed,
    /// or `None` when already at the oldest change.
    pub fn undo(&mut self) -> Option<(usize, usize)> {
        if !self.history_enabled || !self.history.can_undo() {
            return None;
        }
        self.loading = true;
        let records = self.history.walk_undo();
        let mut count_chars = 0;
        let mut count_lines = 0;
        for record in &records {
            match record {
                Record::Insert { line, offset, .. } => {
                    self.lines[*line].delete_cell(offset + 1);
                    self.line_no = line + 1;
                    self.col_no = offset + 1;
                    count_chars += 1;
                }
                Record::Delete { line, offset, old } => {
                    self.lines[*line].insert_cell(offset - 1, *old);
                    self.line_no = line + 1;
                    self.col_no = offset + 2;
                    count_chars += 1;
                }
                Record::Replace {
                    line, offset, old, ..
                } => {
                    self.lines[*line].replace_cell(*offset, *old);
                    self.line_no = line + 1;
                    self.col_no = offset + 1;
                    count_chars += 1;
                }
                Record::RemoveLine { line, old } => {
                    self.lines.insert(*line, Line::from_cells(old.clone()));
                    self.line_no = line + 2;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::AddLine { line } => {
                    if self.lines.len() == 1 {
                        self.lines[*line].clear();
                    } else {
                        self.lines.remove(*line);
                    }
                    self.line_no = line + 1;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::ReplaceLine { line, old, .. } => {
                    self.lines[*line].clone_from_cells(old);
                    self.line_no = line + 1;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::SplitLine { line, .. } => {
                    let absorbed = std::mem::take(&mut self.lines[line + 1]);
                    self.lines[*line].extend_from(&absorbed);
                    self.lines.remove(line + 1);
                    self.line_no = line + 2;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::MergeLines { line, col } => {
                    let tail = self.lines[line - 1].split_off(*col);
                    self.lines.insert(*line, Line::from_cells(tail));
                    self.line_no = line + 1;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::Sentinel | Record::Break => {}
            }
        }
        self.finish_replay();
        Some((count_chars, count_lines))
    }

    /// Redo one transaction. Returns (chars, lines) changed, or `None` when
    /// already at the newest change.
    pub fn redo(&mut self) -> Option<(usize, usize)> {
        if !self.history_enabled || !self.history.can_redo() {
            return None;
        }
        self.loading = true;
        let records = self.history.walk_redo();
        let mut count_chars = 0;
        let mut count_lines = 0;
        for record in &records {
            match record {
                Record::Insert { line, offset, cp } => {
                    self.lines[*line].insert_cell(*offset, *cp);
                    self.line_no = line + 1;
                    self.col_no = offset + 2;
                    count_chars += 1;
                }
                Record::Delete { line, offset, .. } => {
                    self.lines[*line].delete_cell(*offset);
                    self.line_no = line + 1;
                    self.col_no = offset + 1;
                    count_chars += 1;
                }
                Record::Replace {
                    line, offset, new, ..
                } => {
                    self.lines[*line].replace_cell(*offset, *new);
                    self.line_no = line + 1;
                    self.col_no = offset + 2;
                    count_chars += 1;
                }
                Record::AddLine { line } => {
                    self.lines.insert(*line, Line::new());
                    self.line_no = line + 2;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::RemoveLine { line, .. } => {
                    if self.lines.len() == 1 {
                        self.lines[*line].clear();
                    } else {
                        self.lines.remove(*line);
                    }
                    self.line_no = line + 1;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::ReplaceLine { line, new, .. } => {
                    self.lines[*line].clone_from_cells(new);
                    self.line_no = line + 2;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::MergeLines { line, .. } => {
                    let absorbed = std::mem::take(&mut self.lines[*line]);
                    self.lines[*line - 1].extend_from(&absorbed);
                    self.lines.remove(*line);
                    self.line_no = *line;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::SplitLine { line, col } => {
                    let tail = self.lines[*line].split_off(*col);
                    self.lines.insert(line + 1, Line::from_cells(tail));
                    self.line_no = line + 2;
                    self.col_no = 1;
                    count_lines += 1;
                }
                Record::Sentinel | Record::Break => {}
            }
        }
        self.finish_replay();
        Some((count_chars, count_lines))
    }

    /// Shared undo/redo epilogue: clamp the cursor, refresh the modified
    /// flag from the save marker, and re-derive widths and syntax.
    fn finish_replay(&mut self) {
        if self.line_no > self.lines.len() {
            self.line_no = self.lines.len();
        }
        if self.line_no < 1 {
            self.line_no = 1;
        }
        if self.col_no > self.current_line().len() {
            self.col_no = self.current_line().len().max(1);
        }
        self.modified = !self.history.at_save_point();
        self.full_recalculate();
        self.loading = false;
    }

    /// Whether the needle triggers case-insensitive matching: smart case
    /// means an all-lowercase needle ignores case.
    pub fn smart_case(needle: &[char], smart_case_enabled: bool) -> bool {
        if !smart_case_enabled {
            return false;
        }
        needle.iter().all(|c| !c.is_uppercase())
    }

    fn chars_match(a: char, b: char, ignorecase: bool) -> bool {
        if ignorecase {
            a.to_lowercase().eq(b.to_lowercase())
        } else {
            a == b
        }
    }

    /// Scan forward from (1-based) `from_line`, `from_col` for the needle.
    pub fn find_match(
        &self,
        from_line: usize,
        from_col: usize,
        needle: &[char],
        ignorecase: bool,
    ) -> Option<(usize, usize)> {
        if needle.is_empty() {
            return None;
        }
        let mut col = from_col;
        for i in from_line..=self.lines.len() {
            let line = &self.lines[i - 1];
            let mut j = col.saturating_sub(1);
            while j < line.len() + 1 {
                let mut k = j;
                let mut matched = true;
                for &want in needle {
                    match line.codepoint_at(k) {
                        Some(have) if Self::chars_match(want, have, ignorecase) => k += 1,
                        _ => {
                            matched = false;
                            break;
                        }
                    }
                }
                if matched {
                    return Some((i, j + 1));
                }
                j += 1;
            }
            col = 0;
        }
        None
    }

    /// Scan backward from (1-based) `from_line`, `from_col` for the needle.
    pub fn find_match_backwards(
        &self,
        from_line: usize,
        from_col: usize,
        needle: &[char],
        ignorecase: bool,
    ) -> Option<(usize, usize)> {
        if needle.is_empty() {
            return None;
        }
        let mut col = from_col as isize;
        for i in (1..=from_line).rev() {
            let line = &self.lines[i - 1];
            let mut j = col - 1;
            while j > -1 {
                let mut k = j as usize;
                let mut matched = true;
                for &want in needle {
                    match line.codepoint_at(k) {
                        Some(have) if Self::chars_match(want, have, ignorecase) => k += 1,
                        _ => {
                            matched = false;
                            break;
                        }
                    }
                }
                if matched {
                    return Some((i, j as usize + 1));
                }
                j -= 1;
            }
            col = if i > 1 { self.lines[i - 2].len() as isize } else { -1 };
        }
        None
    }

    /// The whole buffer as text (save paths, tests).
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_text());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(lines: &[&str]) -> Buffer {
        let mut buf = Buffer::new(true, true);
        buf.loading = true;
        buf.lines.clear();
        for text in lines {
            buf.lines
                .push(Line::from_cells(text.chars().map(Cell::new).collect()));
        }
        if buf.lines.is_empty() {
            buf.lines.push(Line::new());
        }
        buf.loading = false;
        buf
    }

    fn type_chars(buf: &mut Buffer, line: usize, start: usize, text: &str) {
        for (k, c) in text.chars().enumerate() {
            let cell = buf.make_cell(c);
            buf.line_insert(line, cell, start + k);
        }
    }

    #[test]
    fn test_insert_then_undo_restores_empty() {
        let mut buf = Buffer::new(true, true);
        type_chars(&mut buf, 0, 0, "hello");
        buf.set_history_break();
        assert_eq!(buf.lines[0].to_text(), "hello");
        let (chars, lines) = buf.undo().unwrap();
        assert_eq!(chars, 5);
        assert_eq!(lines, 0);
        assert_eq!(buf.lines.len(), 1);
        assert!(buf.lines[0].is_empty());
        assert!(!buf.modified);
    }

    #[test]
    fn test_undo_then_redo_round_trip() {
        let mut buf = Buffer::new(true, true);
        type_chars(&mut buf, 0, 0, "abc");
        buf.set_history_break();
        buf.undo().unwrap();
        assert!(buf.lines[0].is_empty());
        let (chars, _) = buf.redo().unwrap();
        assert_eq!(chars, 3);
        assert_eq!(buf.lines[0].to_text(), "abc");
    }

    #[test]
    fn test_split_merge_round_trip() {
        let mut buf = buffer_with(&["hello world"]);
        buf.split_line(0, 5);
        assert_eq!(buf.lines[0].to_text(), "hello");
        assert_eq!(buf.lines[1].to_text(), " world");
        buf.merge_lines(1);
        assert_eq!(buf.lines.len(), 1);
        assert_eq!(buf.lines[0].to_text(), "hello world");
    }

    #[test]
    fn test_split_at_zero_adds_blank_line() {
        let mut buf = buffer_with(&["text"]);
        buf.split_line(0, 0);
        assert_eq!(buf.lines.len(), 2);
        assert!(buf.lines[0].is_empty());
        assert_eq!(buf.lines[1].to_text(), "text");
    }

    #[test]
    fn test_remove_last_line_clears_instead() {
        let mut buf = buffer_with(&["only"]);
        buf.remove_line(0);
        assert_eq!(buf.lines.len(), 1);
        assert!(buf.lines[0].is_empty());
    }

    #[test]
    fn test_undo_across_merge() {
        let mut buf = buffer_with(&["foo", "bar"]);
        buf.line_no = 2;
        buf.col_no = 1;
        // Backspace at column 1 of line 2 merges the lines.
        buf.merge_lines(1);
        buf.line_no = 1;
        buf.col_no = 4;
        buf.set_history_break();
        assert_eq!(buf.lines[0].to_text(), "foobar");
        buf.undo().unwrap();
        assert_eq!(buf.lines.len(), 2);
        assert_eq!(buf.lines[0].to_text(), "foo");
        assert_eq!(buf.lines[1].to_text(), "bar");
        assert_eq!(buf.line_no, 2);
        assert_eq!(buf.col_no, 1);
    }

    #[test]
    fn test_modified_tracks_save_point() {
        let mut buf = Buffer::new(true, true);
        type_chars(&mut buf, 0, 0, "x");
        buf.set_history_break();
        buf.modified = true;
        buf.history.mark_saved();
        buf.modified = false;
        buf.undo().unwrap();
        assert!(buf.modified);
        buf.redo().unwrap();
        assert!(!buf.modified);
    }

    #[test]
    fn test_syntax_cascade_updates_istate() {
        let mut buf = buffer_with(&["int a; /* open", "int b;", "done */ int c;"]);
        buf.syntax = Some(Syntax::C);
        buf.full_recalculate();
        assert_eq!(buf.lines[1].istate, 1);
        assert_eq!(buf.lines[2].istate, 1);
        // Close the comment on the first line: cascade repaints the rest.
        let star = buf.make_cell('*');
        let slash = buf.make_cell('/');
        buf.line_insert(0, star, 14);
        buf.line_insert(0, slash, 15);
        assert_eq!(buf.lines[1].istate, -1);
        assert!(buf.last_cascade >= 2);
    }

    #[test]
    fn test_find_match_smart_case() {
        let buf = buffer_with(&["Hello hello HELLO"]);
        let needle: Vec<char> = "hello".chars().collect();
        let ignorecase = Buffer::smart_case(&needle, true);
        assert!(ignorecase);
        assert_eq!(buf.find_match(1, 1, &needle, ignorecase), Some((1, 1)));
        assert_eq!(buf.find_match(1, 2, &needle, ignorecase), Some((1, 7)));
        let upper: Vec<char> = "HELLO".chars().collect();
        assert!(!Buffer::smart_case(&upper, true));
        assert_eq!(buf.find_match(1, 1, &upper, false), Some((1, 13)));
    }

    #[test]
    fn test_find_match_backwards() {
        let buf = buffer_with(&["one two", "two one"]);
        let needle: Vec<char> = "two".chars().collect();
        assert_eq!(buf.find_match_backwards(2, 7, &needle, false), Some((2, 1)));
        assert_eq!(buf.find_match_backwards(1, 7, &needle, false), Some((1, 5)));
    }

    #[test]
    fn test_line_delete_records_history() {
        let mut buf = buffer_with(&["abc"]);
        buf.line_delete(0, 2);
        buf.set_history_break();
        assert_eq!(buf.lines[0].to_text(), "ac");
        buf.undo().unwrap();
        assert_eq!(buf.lines[0].to_text(), "abc");
    }
}
