//! Mode handlers: the state machine driving every key.
//!
//! Each mode runs its own read loop, mirroring the shared navigation set
//! where appropriate. ESC handling is explicit: a lone ESC (resolved by
//! timeout) leaves the mode, `ESC [` starts a CSI sequence handled by the
//! shared accumulator.

use super::{Editor, EscResult};
use crate::buffer::{Cell, CellFlags, Mode};
use crate::input::{EscSeq, Key, Utf8Decoder, DEFAULT_TIMEOUT_MS, REDRAW_TIMEOUT_MS};

const ESC: char = '\x1b';
const ENTER: char = '\r';
const LINE_FEED: char = '\n';
const BACKSPACE: char = '\x08';
const DEL: char = '\x7f';

impl Editor {
    /// Navigation shared by normal and the selection modes.
    pub fn handle_navigation(&mut self, c: char) {
        let page = self.config.term_height as isize - 6;
        match c {
            '\x02' => self.goto_line(self.buf().line_no as isize - page), // ^B
            '\x06' => self.goto_line(self.buf().line_no as isize + page), // ^F
            ':' => self.command_mode(),
            '/' => self.search_mode(true),
            '?' => self.search_mode(false),
            'n' => self.search_next(),
            'N' => self.search_prev(),
            'j' => self.cursor_down(),
            'k' => self.cursor_up(),
            'h' => self.cursor_left(),
            'l' => self.cursor_right(),
            'w' => self.word_right(),
            'G' => self.goto_line(self.buf().line_count() as isize),
            '*' => self.search_under_cursor(),
            ' ' => self.goto_line(self.buf().line_no as isize + page),
            '%' => {
                if matches!(self.buf().mode, Mode::LineSelection | Mode::CharSelection) {
                    // Selection modes borrow the SELECT flag; restore real
                    // syntax so the paren scan sees true classes.
                    self.buf_mut().full_recalculate();
                }
                if let Some((line, col)) = self.find_matching_paren(1) {
                    let buf = self.buf_mut();
                    buf.line_no = line;
                    buf.col_no = col;
                    buf.set_preferred_column();
                    self.place_cursor_actual();
                    self.redraw_statusbar();
                }
            }
            '{' => {
                self.buf_mut().col_no = 1;
                if self.buf().line_no > 1 {
                    loop {
                        self.buf_mut().line_no -= 1;
                        let buf = self.buf();
                        if buf.current_line().is_empty() || buf.line_no == 1 {
                            break;
                        }
                    }
                    self.buf_mut().set_preferred_column();
                }
                self.redraw_statusbar();
            }
            '}' => {
                self.buf_mut().col_no = 1;
                if self.buf().line_no < self.buf().line_count() {
                    loop {
                        self.buf_mut().line_no += 1;
                        let buf = self.buf();
                        if buf.current_line().is_empty() || buf.line_no == buf.line_count() {
                            break;
                        }
                    }
                    self.buf_mut().set_preferred_column();
                }
                self.redraw_statusbar();
            }
            '$' => self.cursor_end(),
            '^' | '0' => self.cursor_home(),
            _ => {}
        }
    }

    /// Leave insert/replace: pull the cursor back into range and close the
    /// transaction.
    pub fn leave_insert(&mut self) {
        let buf = self.buf_mut();
        if buf.col_no > buf.current_line().len() {
            buf.col_no = buf.current_line().len().max(1);
            buf.set_preferred_column();
        }
        buf.set_history_break();
        buf.mode = Mode::Normal;
        self.redraw_commandline();
    }

    /// NORMAL mode: the main loop.
    pub fn normal_mode(&mut self) {
        self.place_cursor_actual();
        let mut esc = EscSeq::default();
        loop {
            if !self.running {
                return;
            }
            let key = self.getch(DEFAULT_TIMEOUT_MS);
            let c = match key {
                Key::Byte(b) => b as char,
                Key::Timeout => continue,
                Key::Eof => {
                    if esc.awaiting_escape() {
                        esc.clear();
                    }
                    return;
                }
            };
            if esc.pending() {
                let _ = self.handle_escape(&mut esc, c as i32);
                self.place_cursor_actual();
                continue;
            }
            match c {
                ESC => esc.push(ESC as i32),
                BACKSPACE | DEL => {
                    if self.buf().line_no > 1 && self.buf().col_no == 1 {
                        let buf = self.buf_mut();
                        buf.line_no -= 1;
                        buf.col_no = buf.current_line().len().max(1);
                        buf.set_preferred_column();
                        self.place_cursor_actual();
                    } else {
                        self.cursor_left();
                    }
                }
                'V' => self.line_selection_mode(),
                'v' => self.char_selection_mode(),
                '\x16' => self.col_selection_mode(), // ^V
                'O' => {
                    if self.buf().readonly {
                        self.render_error("Buffer is read-only");
                        continue;
                    }
                    let at = self.buf().line_no - 1;
                    self.buf_mut().add_line(at);
                    self.buf_mut().col_no = 1;
                    let line_no = self.buf().line_no;
                    self.add_indent(line_no - 1, line_no, false);
                    self.redraw_text();
                    self.buf_mut().set_preferred_column();
                    self.set_modified();
                    self.place_cursor_actual();
                    self.enter_insert();
                }
                'o' => {
                    if self.buf().readonly {
                        self.render_error("Buffer is read-only");
                        continue;
                    }
                    let at = self.buf().line_no;
                    self.buf_mut().add_line(at);
                    self.buf_mut().col_no = 1;
                    self.buf_mut().line_no += 1;
                    let line_no = self.buf().line_no;
                    self.add_indent(line_no - 1, line_no - 2, false);
                    self.buf_mut().set_preferred_column();
                    let rows = self.config.text_height();
                    let buf = self.buf_mut();
                    if buf.line_no > buf.offset + rows {
                        buf.offset += 1;
                    }
                    self.redraw_text();
                    self.set_modified();
                    self.place_cursor_actual();
                    self.enter_insert();
                }
                'a' => {
                    if self.buf().col_no < self.buf().current_line().len() + 1 {
                        self.buf_mut().col_no += 1;
                    }
                    self.enter_insert();
                }
                'p' | 'P' => {
                    if self.buf().readonly {
                        self.render_error("Buffer is read-only");
                        continue;
                    }
                    if self.yanks.is_some() {
                        self.paste(c == 'p');
                    }
                }
                'r' => {
                    self.replace_one();
                    self.redraw_commandline();
                }
                'u' => self.undo_command(),
                '\x12' => self.redo_command(), // ^R
                '\x0c' => self.redraw_all(),   // ^L
                'i' => self.enter_insert(),
                'R' => {
                    if self.buf().readonly {
                        self.render_error("Buffer is read-only");
                        continue;
                    }
                    self.replace_mode();
                    self.redraw_statusbar();
                    self.redraw_commandline();
                }
                other => self.handle_navigation(other),
            }
            self.place_cursor_actual();
        }
    }

    fn enter_insert(&mut self) {
        if self.buf().readonly {
            self.render_error("Buffer is read-only");
            return;
        }
        self.insert_mode();
        self.redraw_statusbar();
        self.redraw_commandline();
    }

    /// Undo one transaction, reporting the change counts.
    pub fn undo_command(&mut self) {
        match self.buf_mut().undo() {
            None => self.render_commandline_message("Already at oldest change"),
            Some((chars, lines)) => {
                self.place_cursor_actual();
                self.update_title();
                self.redraw_all();
                let msg = format!(
                    "{} character{}, {} line{} changed",
                    chars,
                    if chars == 1 { "" } else { "s" },
                    lines,
                    if lines == 1 { "" } else { "s" }
                );
                self.render_commandline_message(&msg);
            }
        }
    }

    /// Redo one transaction, reporting the change counts.
    pub fn redo_command(&mut self) {
        match self.buf_mut().redo() {
            None => self.render_commandline_message("Already at newest change"),
            Some((chars, lines)) => {
                self.place_cursor_actual();
                self.update_title();
                self.redraw_all();
                let msg = format!(
                    "{} character{}, {} line{} changed",
                    chars,
                    if chars == 1 { "" } else { "s" },
                    lines,
                    if lines == 1 { "" } else { "s" }
                );
                self.render_commandline_message(&msg);
            }
        }
    }

    /// `r<c>`: replace the character under the cursor.
    pub fn replace_one(&mut self) {
        self.render_commandline_message("r");
        let mut decoder = Utf8Decoder::new();
        loop {
            let Some(byte) = self.input.getch_blocking() else {
                return;
            };
            let Some(c) = decoder.push(byte) else {
                continue;
            };
            if c == ESC {
                return;
            }
            if c == '\x16' {
                // ^V: take the next byte literally.
                self.render_commandline_message("r ^V");
                let Some(byte) = self.input.getch_blocking() else {
                    return;
                };
                self.replace_char(byte as char);
                return;
            }
            self.replace_char(c);
            return;
        }
    }

    /// INSERT mode.
    pub fn insert_mode(&mut self) {
        self.buf_mut().mode = Mode::Insert;
        self.redraw_commandline();
        self.place_cursor_actual();

        let mut esc = EscSeq::default();
        let mut decoder = Utf8Decoder::new();
        // Bit 0: redraw current line; bit 1: redraw whole text region.
        let mut redraw = 0u8;
        loop {
            let timeout = if redraw != 0 {
                REDRAW_TIMEOUT_MS
            } else {
                DEFAULT_TIMEOUT_MS
            };
            let key = self.getch(timeout);
            let byte = match key {
                Key::Byte(b) => b,
                Key::Timeout | Key::Eof => {
                    if redraw != 0 {
                        if redraw & 2 != 0 {
                            self.redraw_text();
                        } else {
                            let row = self.screen_row_of_cursor();
                            self.redraw_line(row, self.buf().line_no - 1);
                        }
                        self.redraw_statusbar();
                        self.place_cursor_actual();
                        redraw = 0;
                    }
                    if esc.awaiting_escape() {
                        self.leave_insert();
                        return;
                    }
                    esc.clear();
                    if key == Key::Eof {
                        self.leave_insert();
                        return;
                    }
                    continue;
                }
            };
            let Some(c) = decoder.push(byte) else {
                continue;
            };
            if esc.pending() {
                if self.handle_escape(&mut esc, c as i32) == EscResult::Unhandled {
                    self.leave_insert();
                    return;
                }
                continue;
            }
            match c {
                ESC => esc.push(ESC as i32),
                BACKSPACE | DEL => self.delete_at_cursor(),
                ENTER | LINE_FEED => {
                    if self.buf().indent {
                        // ` * ` continuation right before the break folds away.
                        let buf = self.buf();
                        let line = buf.current_line();
                        if buf.col_no > 3
                            && line
                                .cells()
                                .get(buf.col_no - 2)
                                .is_some_and(|c| c.codepoint() == ' ')
                            && line.codepoint_at(buf.col_no - 3) == Some('*')
                            && line.cells()[buf.col_no - 2].flags().class()
                                == crate::buffer::SyntaxClass::Comment
                        {
                            self.delete_at_cursor();
                        }
                    }
                    self.insert_line_feed();
                    redraw |= 2;
                }
                '\x16' => {
                    // ^V: insert the next byte raw.
                    self.render_commandline_message("^V");
                    self.place_cursor_actual();
                    if let Some(byte) = self.input.getch_blocking() {
                        self.insert_char(byte as char);
                    }
                    self.redraw_commandline();
                    redraw |= 1;
                }
                '\x17' => {
                    // ^W: delete word.
                    self.delete_word();
                    self.buf_mut().set_preferred_column();
                }
                '\t' => {
                    if self.buf().tabs {
                        self.insert_char('\t');
                    } else {
                        for _ in 0..self.buf().tabstop {
                            self.insert_char(' ');
                        }
                    }
                    redraw |= 1;
                    self.buf_mut().set_preferred_column();
                }
                '/' => {
                    let folds = self.buf().indent && {
                        let buf = self.buf();
                        let line = buf.current_line();
                        buf.col_no > 3
                            && line
                                .cells()
                                .get(buf.col_no - 2)
                                .is_some_and(|c| {
                                    c.codepoint() == ' '
                                        && c.flags().class()
                                            == crate::buffer::SyntaxClass::Comment
                                })
                            && line.codepoint_at(buf.col_no - 3) == Some('*')
                    };
                    if folds {
                        // ` *` + `/` collapses into a comment close.
                        self.buf_mut().col_no -= 1;
                        self.replace_char('/');
                        self.buf_mut().col_no += 1;
                        self.place_cursor_actual();
                    } else {
                        self.insert_char(c);
                        self.buf_mut().set_preferred_column();
                        redraw |= 1;
                    }
                }
                '}' => {
                    if self.buf().indent {
                        let was_whitespace = self.buf().current_line().is_blank();
                        self.insert_char('}');
                        if was_whitespace {
                            self.buf_mut().col_no -= 1;
                            if let Some((line, _)) = self.find_matching_paren(1) {
                                // Re-align to the matching open brace.
                                while !self.buf().current_line().is_empty() {
                                    let buf = self.buf_mut();
                                    let at = buf.line_no - 1;
                                    let len = buf.current_line().len();
                                    buf.line_delete(at, len);
                                }
                                let this = self.buf().line_no - 1;
                                self.buf_mut().col_no = 1;
                                self.add_indent(this, line - 1, true);
                                let buf = self.buf_mut();
                                buf.col_no = buf.current_line().len() + 1;
                                self.insert_char('}');
                            } else {
                                self.buf_mut().col_no += 1;
                            }
                        }
                        self.buf_mut().set_preferred_column();
                        redraw |= 1;
                    } else {
                        self.insert_char(c);
                        self.buf_mut().set_preferred_column();
                        redraw |= 1;
                    }
                }
                _ => {
                    self.insert_char(c);
                    self.buf_mut().set_preferred_column();
                    redraw |= 1;
                }
            }
            // Cascades past the current line force a full text redraw.
            if self.buf().last_cascade > self.buf().line_no.saturating_sub(1) {
                redraw |= 2;
            }
        }
    }

    /// REPLACE mode.
    pub fn replace_mode(&mut self) {
        self.buf_mut().mode = Mode::Replace;
        self.redraw_commandline();
        self.place_cursor_actual();

        let mut esc = EscSeq::default();
        let mut decoder = Utf8Decoder::new();
        loop {
            let key = self.getch(DEFAULT_TIMEOUT_MS);
            let byte = match key {
                Key::Byte(b) => b,
                Key::Timeout | Key::Eof => {
                    if esc.awaiting_escape() || key == Key::Eof {
                        self.leave_insert();
                        return;
                    }
                    esc.clear();
                    continue;
                }
            };
            let Some(c) = decoder.push(byte) else {
                continue;
            };
            if esc.pending() {
                if self.handle_escape(&mut esc, c as i32) == EscResult::Unhandled {
                    self.leave_insert();
                    return;
                }
                continue;
            }
            match c {
                ESC => esc.push(ESC as i32),
                BACKSPACE | DEL => {
                    if self.buf().line_no > 1 && self.buf().col_no == 1 {
                        let buf = self.buf_mut();
                        buf.line_no -= 1;
                        buf.col_no = buf.current_line().len().max(1);
                        buf.set_preferred_column();
                        self.place_cursor_actual();
                    } else {
                        self.cursor_left();
                    }
                }
                ENTER | LINE_FEED => {
                    self.insert_line_feed();
                    self.redraw_text();
                    self.set_modified();
                    self.redraw_statusbar();
                    self.place_cursor_actual();
                }
                _ => {
                    if self.buf().col_no <= self.buf().current_line().len() {
                        self.replace_char(c);
                        self.buf_mut().col_no += 1;
                    } else {
                        self.insert_char(c);
                        let row = self.screen_row_of_cursor();
                        self.redraw_line(row, self.buf().line_no - 1);
                    }
                    self.redraw_statusbar();
                    self.place_cursor_actual();
                }
            }
        }
    }

    /// Repaint one line of a line selection, flagging cells in the span.
    fn redraw_line_selection(&mut self, line: usize, force_start_line: bool) {
        if !force_start_line && line == self.buf().start_line {
            return;
        }
        let rows = self.config.text_height();
        let offset = self.buf().offset;
        if line > self.buf().line_count() + 1 {
            if line >= offset + 2 && line - offset - 1 < rows {
                self.draw_excess_line(line - offset - 1);
            }
            return;
        }
        if line > self.buf().line_count() {
            return;
        }
        let (lo, hi) = {
            let buf = self.buf();
            if buf.start_line < buf.line_no {
                (buf.start_line, buf.line_no)
            } else {
                (buf.line_no, buf.start_line)
            }
        };
        if line < lo || line > hi {
            self.buf_mut().recalculate_syntax(line - 1);
        } else {
            let buf = self.buf_mut();
            for cell in buf.lines[line - 1].cells_mut() {
                *cell.flags_mut() |= CellFlags::SELECT;
            }
        }
        if line > offset && line - offset - 1 < rows {
            self.redraw_line(line - offset - 1, line - 1);
        }
    }

    /// Indent or unindent the selected line range by one level.
    pub fn adjust_indent(&mut self, start_line: usize, direction: isize) {
        let (start_point, lines_to_cover) = {
            let buf = self.buf();
            if start_line <= buf.line_no {
                (start_line - 1, buf.line_no - start_line + 1)
            } else {
                (buf.line_no - 1, start_line - buf.line_no + 1)
            }
        };
        for i in 0..lines_to_cover {
            let idx = start_point + i;
            if direction == -1 {
                if self.buf().lines[idx].is_empty() {
                    continue;
                }
                if self.buf().tabs {
                    if self.buf().lines[idx].codepoint_at(0) == Some('\t') {
                        self.buf_mut().line_delete(idx, 1);
                        self.redraw_line_selection(idx + 1, true);
                    }
                } else {
                    let tabstop = self.buf().tabstop;
                    for _ in 0..tabstop {
                        if self.buf().lines[idx].codepoint_at(0) == Some(' ') {
                            self.buf_mut().line_delete(idx, 1);
                        }
                    }
                    self.redraw_line_selection(idx + 1, true);
                }
            } else if direction == 1 {
                if self.buf().tabs {
                    let tabstop = self.buf().tabstop;
                    let mut cell = Cell::with_width('\t', tabstop as u8);
                    cell.set_flags(CellFlags::SELECT);
                    self.buf_mut().line_insert(idx, cell, 0);
                } else {
                    let tabstop = self.buf().tabstop;
                    for _ in 0..tabstop {
                        let mut cell = self.buf().make_cell(' ');
                        cell.set_flags(CellFlags::SELECT);
                        self.buf_mut().line_insert(idx, cell, 0);
                    }
                }
                self.redraw_line_selection(idx + 1, true);
            }
        }
        let buf = self.buf_mut();
        if buf.col_no > buf.current_line().len() {
            buf.col_no = buf.current_line().len().max(1);
        }
        buf.set_preferred_column();
        self.set_modified();
    }

    /// LINE SELECTION mode.
    pub fn line_selection_mode(&mut self) {
        {
            let buf = self.buf_mut();
            buf.start_line = buf.line_no;
            buf.mode = Mode::LineSelection;
        }
        let mut prev_line = self.buf().start_line;
        self.redraw_commandline();

        {
            let buf = self.buf_mut();
            let line = buf.line_no - 1;
            for cell in buf.lines[line].cells_mut() {
                *cell.flags_mut() |= CellFlags::SELECT;
            }
        }
        let row = self.screen_row_of_cursor();
        self.redraw_line(row, self.buf().line_no - 1);

        let mut esc = EscSeq::default();
        loop {
            let key = self.getch(DEFAULT_TIMEOUT_MS);
            let c = match key {
                Key::Byte(b) => b as char,
                Key::Timeout => {
                    if esc.awaiting_escape() {
                        break;
                    }
                    esc.clear();
                    continue;
                }
                Key::Eof => break,
            };
            if esc.pending() {
                match self.handle_escape(&mut esc, c as i32) {
                    EscResult::Unhandled => break,
                    EscResult::ShiftTab => {
                        if self.buf().readonly {
                            self.render_error("Buffer is read-only");
                        } else {
                            let start = self.buf().start_line;
                            self.adjust_indent(start, -1);
                        }
                    }
                    EscResult::Handled => {}
                }
            } else {
                match c {
                    ESC => {
                        esc.push(ESC as i32);
                        continue;
                    }
                    BACKSPACE | DEL => self.cursor_left(),
                    '\t' => {
                        if self.buf().readonly {
                            self.render_error("Buffer is read-only");
                        } else {
                            let start = self.buf().start_line;
                            self.adjust_indent(start, 1);
                        }
                    }
                    'V' => break,
                    'y' => {
                        let (start, end) = (self.buf().start_line, self.buf().line_no);
                        self.yank_lines(start, end);
                        break;
                    }
                    'D' | 'd' => {
                        if self.buf().readonly {
                            self.render_error("Buffer is read-only");
                            continue;
                        }
                        let (start, end) = (self.buf().start_line, self.buf().line_no);
                        self.yank_lines(start, end);
                        let (lo, count) = if start <= end {
                            (start, end - start + 1)
                        } else {
                            (end, start - end + 1)
                        };
                        for _ in 0..count {
                            self.buf_mut().remove_line(lo - 1);
                        }
                        let buf = self.buf_mut();
                        buf.line_no = lo.min(buf.line_count());
                        if buf.col_no > buf.current_line().len() {
                            buf.col_no = buf.current_line().len().max(1);
                        }
                        buf.set_preferred_column();
                        self.set_modified();
                        break;
                    }
                    ':' => {
                        self.command_mode();
                        break;
                    }
                    other => self.handle_navigation(other),
                }
            }

            // Repaint the span the cursor moved through.
            let line_no = self.buf().line_no;
            self.redraw_line_selection(line_no, false);
            if prev_line < line_no {
                for i in prev_line..line_no {
                    self.redraw_line_selection(i, false);
                }
            } else if prev_line > line_no {
                for i in line_no + 1..=prev_line {
                    self.redraw_line_selection(i, false);
                }
            }
            prev_line = line_no;
            self.redraw_commandline();
            self.place_cursor_actual();
        }

        self.buf_mut().set_history_break();
        self.buf_mut().mode = Mode::Normal;
        self.buf_mut().full_recalculate();
        self.redraw_all();
    }

    /// CHAR SELECTION mode.
    pub fn char_selection_mode(&mut self) {
        let start_line = self.buf().line_no;
        let start_col = self.buf().col_no;
        let mut prev_line = start_line;
        {
            let buf = self.buf_mut();
            buf.start_line = buf.line_no;
            buf.mode = Mode::CharSelection;
        }
        self.redraw_commandline();

        {
            let buf = self.buf_mut();
            let (line, col) = (buf.line_no - 1, buf.col_no - 1);
            if let Some(cell) = buf.lines[line].cells_mut().get_mut(col) {
                *cell.flags_mut() |= CellFlags::SELECT;
            }
        }
        let row = self.screen_row_of_cursor();
        self.redraw_line(row, self.buf().line_no - 1);

        let mut esc = EscSeq::default();
        loop {
            let key = self.getch(DEFAULT_TIMEOUT_MS);
            let c = match key {
                Key::Byte(b) => b as char,
                Key::Timeout => {
                    if esc.awaiting_escape() {
                        break;
                    }
                    esc.clear();
                    continue;
                }
                Key::Eof => break,
            };
            if esc.pending() {
                if self.handle_escape(&mut esc, c as i32) == EscResult::Unhandled {
                    break;
                }
            } else {
                match c {
                    ESC => {
                        esc.push(ESC as i32);
                        continue;
                    }
                    BACKSPACE | DEL => self.cursor_left(),
                    'v' => break,
                    'y' => {
                        let (sl, sc, el, ec) = normalized_range(
                            start_line,
                            start_col,
                            self.buf().line_no,
                            self.buf().col_no,
                        );
                        self.yank_text(sl, sc, el, ec);
                        break;
                    }
                    'D' | 'd' => {
                        if self.buf().readonly {
                            self.render_error("Buffer is read-only");
                            continue;
                        }
                        let (sl, sc, el, ec) = normalized_range(
                            start_line,
                            start_col,
                            self.buf().line_no,
                            self.buf().col_no,
                        );
                        self.yank_text(sl, sc, el, ec);
                        if sl == el {
                            for _ in sc..=ec {
                                self.buf_mut().line_delete(sl - 1, sc);
                            }
                            self.buf_mut().col_no = sc;
                        } else {
                            for _ in sl + 1..el {
                                self.buf_mut().remove_line(sl);
                            }
                            let tail_len = self.buf().lines[sl - 1].len();
                            for _ in sc..=tail_len {
                                self.buf_mut().line_delete(sl - 1, sc);
                            }
                            for _ in 1..=ec.min(self.buf().lines[sl].len()) {
                                self.buf_mut().line_delete(sl, 1);
                            }
                            self.buf_mut().merge_lines(sl);
                            let buf = self.buf_mut();
                            buf.line_no = sl;
                            buf.col_no = sc;
                        }
                        let buf = self.buf_mut();
                        if buf.line_no > buf.line_count() {
                            buf.line_no = buf.line_count();
                        }
                        buf.set_preferred_column();
                        self.set_modified();
                        break;
                    }
                    ':' => {
                        self.command_mode();
                        break;
                    }
                    other => self.handle_navigation(other),
                }
            }

            let line_no = self.buf().line_no;
            self.redraw_line_char_selection(line_no, start_line, start_col, true);
            if prev_line < line_no {
                for i in prev_line..line_no {
                    self.redraw_line_char_selection(i, start_line, start_col, true);
                }
            } else if prev_line > line_no {
                for i in line_no + 1..=prev_line {
                    self.redraw_line_char_selection(i, start_line, start_col, true);
                }
            }
            prev_line = line_no;
            self.place_cursor_actual();
        }

        self.buf_mut().set_history_break();
        self.buf_mut().mode = Mode::Normal;
        self.buf_mut().full_recalculate();
        self.redraw_all();
    }

    /// Repaint one line of a character selection.
    fn redraw_line_char_selection(
        &mut self,
        line: usize,
        start_line: usize,
        start_col: usize,
        force_start_line: bool,
    ) {
        if !force_start_line && line == start_line {
            return;
        }
        let rows = self.config.text_height();
        let offset = self.buf().offset;
        if line > self.buf().line_count() {
            if line >= offset + 2 && line - offset - 1 < rows {
                self.draw_excess_line(line - offset - 1);
            }
            return;
        }
        let cursor_line = self.buf().line_no;
        let cursor_col = self.buf().col_no;
        let (lo, hi) = if cursor_line < start_line {
            (cursor_line, start_line)
        } else {
            (start_line, cursor_line)
        };
        if line < lo || line > hi {
            self.buf_mut().recalculate_syntax(line - 1);
        } else {
            if line == start_line || line == cursor_line {
                self.buf_mut().recalculate_syntax(line - 1);
            }
            let len = self.buf().lines[line - 1].len();
            for j in 0..len {
                if point_in_range(
                    start_line,
                    cursor_line,
                    start_col,
                    cursor_col,
                    line,
                    j + 1,
                ) {
                    let buf = self.buf_mut();
                    *buf.lines[line - 1].cells_mut()[j].flags_mut() |= CellFlags::SELECT;
                }
            }
        }
        if line > offset && line - offset - 1 < rows {
            self.redraw_line(line - offset - 1, line - 1);
        }
    }

    /// COL SELECTION mode.
    pub fn col_selection_mode(&mut self) {
        {
            let buf = self.buf_mut();
            buf.start_line = buf.line_no;
            buf.sel_col = buf.preferred_column;
            buf.mode = Mode::ColSelection;
        }
        let mut prev_line = self.buf().start_line;
        self.redraw_commandline();

        let mut esc = EscSeq::default();
        loop {
            let key = self.getch(DEFAULT_TIMEOUT_MS);
            let c = match key {
                Key::Byte(b) => b as char,
                Key::Timeout => {
                    if esc.awaiting_escape() {
                        break;
                    }
                    esc.clear();
                    continue;
                }
                Key::Eof => break,
            };
            if esc.pending() {
                if self.handle_escape(&mut esc, c as i32) == EscResult::Unhandled {
                    break;
                }
            } else {
                match c {
                    ESC => {
                        esc.push(ESC as i32);
                        continue;
                    }
                    'I' => {
                        if self.buf().readonly {
                            self.render_error("Buffer is read-only.");
                            continue;
                        }
                        self.col_insert_mode();
                        break;
                    }
                    'a' => {
                        if self.buf().readonly {
                            self.render_error("Buffer is read-only.");
                            continue;
                        }
                        self.buf_mut().sel_col += 1;
                        self.redraw_text();
                        self.col_insert_mode();
                        break;
                    }
                    ':' => {
                        self.command_mode();
                        break;
                    }
                    other => self.handle_navigation(other),
                }
            }

            // Repaint the span the cursor moved through.
            let line_no = self.buf().line_no;
            self.redraw_col_line(line_no);
            if prev_line < line_no {
                for i in prev_line..line_no {
                    self.redraw_col_line(i);
                }
            } else if prev_line > line_no {
                for i in line_no + 1..=prev_line {
                    self.redraw_col_line(i);
                }
            }
            prev_line = line_no;
            self.redraw_commandline();
            self.place_cursor_actual();
        }

        self.buf_mut().set_history_break();
        self.buf_mut().mode = Mode::Normal;
        self.redraw_all();
    }

    fn redraw_col_line(&mut self, line: usize) {
        let rows = self.config.text_height();
        let offset = self.buf().offset;
        if line > self.buf().line_count() {
            if line >= offset + 2 && line - offset - 1 < rows {
                self.draw_excess_line(line - offset - 1);
            }
            return;
        }
        if line > offset && line - offset - 1 < rows {
            self.redraw_line(line - offset - 1, line - 1);
        }
    }

    /// COL INSERT mode: simultaneous insertion at one display column of
    /// every selected line.
    pub fn col_insert_mode(&mut self) {
        {
            let buf = self.buf_mut();
            if buf.start_line < buf.line_no {
                std::mem::swap(&mut buf.start_line, &mut buf.line_no);
            }
            buf.mode = Mode::ColInsert;
        }
        self.redraw_commandline();
        self.place_cursor_actual();

        let mut esc = EscSeq::default();
        let mut decoder = Utf8Decoder::new();
        let mut redraw = false;
        loop {
            let timeout = if redraw {
                REDRAW_TIMEOUT_MS
            } else {
                DEFAULT_TIMEOUT_MS
            };
            let key = self.getch(timeout);
            let byte = match key {
                Key::Byte(b) => b,
                Key::Timeout | Key::Eof => {
                    if redraw {
                        self.redraw_text();
                        self.redraw_statusbar();
                        self.place_cursor_actual();
                        redraw = false;
                    }
                    if esc.awaiting_escape() || key == Key::Eof {
                        return;
                    }
                    esc.clear();
                    continue;
                }
            };
            let Some(c) = decoder.push(byte) else {
                continue;
            };
            if esc.pending() {
                // Navigation is not available while column-inserting.
                if self.handle_escape(&mut esc, c as i32) == EscResult::Unhandled {
                    return;
                }
                continue;
            }
            match c {
                ESC => esc.push(ESC as i32),
                BACKSPACE | DEL => {
                    if self.buf().sel_col > 0 {
                        let (lo, hi) = {
                            let buf = self.buf();
                            (buf.line_no, buf.start_line)
                        };
                        let mut prev_width = 0usize;
                        for i in lo..=hi {
                            let sel_col = self.buf().sel_col;
                            let (mut x, mut col) = (0usize, 1usize);
                            let mut j = 0usize;
                            let len = self.buf().lines[i - 1].len();
                            while j < len {
                                let w = self.buf().lines[i - 1].cells()[j].display_width()
                                    as usize;
                                x += w;
                                col = j + 1;
                                prev_width = w;
                                if x > sel_col {
                                    break;
                                }
                                j += 1;
                            }
                            if x == sel_col && j == len {
                                self.buf_mut().line_delete(i - 1, len);
                                self.set_modified();
                            } else if x > sel_col {
                                self.buf_mut().line_delete(i - 1, col - 1);
                                self.set_modified();
                            }
                        }
                        let buf = self.buf_mut();
                        buf.sel_col = buf.sel_col.saturating_sub(prev_width);
                        self.redraw_text();
                    }
                }
                ENTER | LINE_FEED => {}
                '\x17' => {}
                other => {
                    let c = if other == '\x16' {
                        // ^V literal.
                        self.render_commandline_message("^V");
                        let Some(byte) = self.input.getch_blocking() else {
                            return;
                        };
                        self.redraw_commandline();
                        byte as char
                    } else {
                        other
                    };
                    if c != '\0' {
                        let cell = self.buf().make_cell(c);
                        let (lo, hi) = {
                            let buf = self.buf();
                            (buf.line_no, buf.start_line)
                        };
                        for i in lo..=hi {
                            let sel_col = self.buf().sel_col;
                            let (mut x, mut col) = (0usize, 1usize);
                            let mut j = 0usize;
                            let len = self.buf().lines[i - 1].len();
                            while j < len {
                                let w = self.buf().lines[i - 1].cells()[j].display_width()
                                    as usize;
                                x += w;
                                col = j + 1;
                                if x > sel_col {
                                    break;
                                }
                                j += 1;
                            }
                            if x == sel_col && j == len {
                                x = sel_col + 1;
                                col = len + 1;
                            }
                            if x > sel_col {
                                self.buf_mut().line_insert(i - 1, cell, col - 1);
                                self.set_modified();
                            }
                        }
                        let buf = self.buf_mut();
                        buf.sel_col += cell.display_width() as usize;
                        redraw = true;
                    }
                }
            }
        }
    }
}

/// Normalize a two-point selection so start precedes end.
fn normalized_range(
    mut start_line: usize,
    mut start_col: usize,
    mut end_line: usize,
    mut end_col: usize,
) -> (usize, usize, usize, usize) {
    if start_line == end_line {
        if start_col > end_col {
            std::mem::swap(&mut start_col, &mut end_col);
        }
    } else if start_line > end_line {
        std::mem::swap(&mut start_line, &mut end_line);
        std::mem::swap(&mut start_col, &mut end_col);
    }
    (start_line, start_col, end_line, end_col)
}

/// Whether (line, col) falls inside the character selection bounded by the
/// anchor and the cursor.
fn point_in_range(
    start_line: usize,
    end_line: usize,
    start_col: usize,
    end_col: usize,
    line: usize,
    col: usize,
) -> bool {
    let (start_line, start_col, end_line, end_col) =
        normalized_range(start_line, start_col, end_line, end_col);
    if start_line == end_line {
        return line == start_line && col >= start_col && col <= end_col;
    }
    if line < start_line || line > end_line {
        return false;
    }
    if line == start_line {
        return col >= start_col;
    }
    if line == end_line {
        return col <= end_col;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::super::tests::headless;
    use super::*;

    #[test]
    fn test_point_in_range() {
        // Forward selection from (1,3) to (3,2).
        assert!(!point_in_range(1, 3, 3, 2, 1, 2));
        assert!(point_in_range(1, 3, 3, 2, 1, 3));
        assert!(point_in_range(1, 3, 3, 2, 2, 1));
        assert!(point_in_range(1, 3, 3, 2, 3, 2));
        assert!(!point_in_range(1, 3, 3, 2, 3, 3));
        // Backward selection normalizes.
        assert!(point_in_range(3, 1, 2, 4, 2, 3));
    }

    #[test]
    fn test_normalized_range_single_line() {
        assert_eq!(normalized_range(1, 7, 1, 3), (1, 3, 1, 7));
        assert_eq!(normalized_range(4, 2, 2, 9), (2, 9, 4, 2));
    }

    #[test]
    fn test_adjust_indent_with_spaces() {
        let mut ed = headless(&["one", "two"]);
        ed.buf_mut().tabs = false;
        ed.buf_mut().start_line = 1;
        ed.buf_mut().line_no = 2;
        ed.adjust_indent(1, 1);
        assert_eq!(ed.buf().lines[0].to_text(), "    one");
        assert_eq!(ed.buf().lines[1].to_text(), "    two");
        ed.adjust_indent(1, -1);
        assert_eq!(ed.buf().lines[0].to_text(), "one");
        assert_eq!(ed.buf().lines[1].to_text(), "two");
    }

    #[test]
    fn test_adjust_indent_with_tabs() {
        let mut ed = headless(&["x"]);
        ed.adjust_indent(1, 1);
        assert_eq!(ed.buf().lines[0].to_text(), "\tx");
        ed.adjust_indent(1, -1);
        assert_eq!(ed.buf().lines[0].to_text(), "x");
    }
}
