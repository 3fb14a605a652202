//! The editor context: every process-wide resource, threaded explicitly.
//!
//! One `Editor` owns the buffer registry, yank register, theme, terminal,
//! input source, and command history. The mode loops live in `modes`, the
//! renderer in `render`, the `:` interpreter in `command`, and search in
//! `search`; everything here is shared machinery.

mod command;
mod modes;
mod render;
mod search;

use std::io::Read;
use std::path::PathBuf;

use crate::buffer::{Buffer, Cell, CellFlags, Mode, SyntaxClass};
use crate::config::Config;
use crate::input::{EscSeq, InputReader, InputSource, Key, KeySource};
use crate::io::{biminfo, file, git};
use crate::registry::Registry;
use crate::syntax::Syntax;
use crate::terminal::{self, Terminal};
use crate::theme::Theme;

/// The process-global yank register.
#[derive(Debug, Clone)]
pub struct YankRegister {
    /// Yanked rows, flags cleared.
    pub lines: Vec<Vec<Cell>>,
    /// Whole lines (`V` yanks) vs a partial range (`v` yanks).
    pub full_lines: bool,
}

/// Outcome of feeding one key to the escape accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscResult {
    /// Sequence consumed (possibly performing navigation).
    Handled,
    /// A bare ESC was followed by a non-sequence byte: leave the mode and
    /// let the caller re-process the byte.
    Unhandled,
    /// Shift-tab, which only line selection consumes.
    ShiftTab,
}

/// The editor.
pub struct Editor {
    pub config: Config,
    pub theme: Theme,
    pub registry: Registry,
    pub term: Terminal,
    pub input: KeySource,
    pub yanks: Option<YankRegister>,
    pub command_history: Vec<String>,
    pub running: bool,
}

pub const PAREN_PAIRS: &str = "()[]{}<>";

impl Editor {
    /// Build an editor attached to the real terminal.
    pub fn attach(config: Config, theme: Theme, stdin_is_buffer: bool) -> std::io::Result<Self> {
        let source = if stdin_is_buffer {
            InputSource::StderrTty
        } else {
            InputSource::Stdin
        };
        let (reader, rx) = InputReader::spawn(source);
        let input = KeySource::new(reader, rx);
        let term = Terminal::attach(&config)?;
        terminal::install_signal_handlers();
        Ok(Self::with_parts(config, theme, term, input))
    }

    /// Build a headless editor from explicit parts (tests, dump modes).
    pub fn with_parts(
        mut config: Config,
        theme: Theme,
        term: Terminal,
        input: KeySource,
    ) -> Self {
        if config.term_width == 0 {
            let (w, h) = terminal::screen_size();
            config.term_width = w;
            config.term_height = h;
        }
        Self {
            config,
            theme,
            registry: Registry::new(),
            term,
            input,
            yanks: None,
            command_history: Vec::new(),
            running: true,
        }
    }

    /// The active buffer.
    #[inline]
    pub fn buf(&self) -> &Buffer {
        self.registry.active()
    }

    /// The active buffer, mutably.
    #[inline]
    pub fn buf_mut(&mut self) -> &mut Buffer {
        self.registry.active_mut()
    }

    /// A fresh buffer honoring the current configuration.
    pub fn new_buffer(&self) -> Buffer {
        let mut buf = Buffer::new(self.config.history_enabled, self.config.can_unicode);
        buf.width = self.config.term_width;
        buf
    }

    // ------------------------------------------------------------------
    // Files and buffers

    /// Open a file (or directory listing, or stdin) into a new buffer.
    pub fn open_file(&mut self, file: &str) {
        let mut buf = self.new_buffer();
        buf.loading = true;

        let mut init_line = None;
        let mut path_str = file.to_string();

        if file == "-" {
            let mut stdin = std::io::stdin();
            let _ = file::load_from_reader(&mut buf, &mut stdin);
            file::finish_load(&mut buf);
            buf.modified = true;
            buf.loading = false;
            self.registry.push_active(buf, self.config.term_width);
            return;
        }

        if let Some((head, tail)) = file.rsplit_once(':') {
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
                path_str = head.to_string();
                init_line = tail.parse::<usize>().ok();
            }
        }
        let path = PathBuf::from(&path_str);

        if path.is_dir() {
            // Load the directory listing read-only.
            let mut names: Vec<String> = match std::fs::read_dir(&path) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect(),
                Err(_) => Vec::new(),
            };
            names.sort();
            let mut loader = file::Loader::new();
            for name in names {
                loader.feed(&mut buf, name.as_bytes());
                loader.feed(&mut buf, b"\n");
            }
            buf.file_name = Some(path);
            buf.readonly = true;
            buf.loading = false;
            self.registry.push_active(buf, self.config.term_width);
            return;
        }

        buf.file_name = Some(path.clone());
        let opened = std::fs::File::open(&path);
        match opened {
            Err(_) => {
                // New file: empty buffer with that name, not modified.
                if self.config.hilight_on_open {
                    buf.syntax = Syntax::match_name(&path_str);
                }
                buf.loading = false;
                if let Some(syntax) = buf.syntax {
                    if syntax.prefers_spaces() {
                        buf.tabs = false;
                    }
                }
                self.registry.push_active(buf, self.config.term_width);
            }
            Ok(mut f) => {
                let mut block = [0u8; 8192];
                let mut loader = file::Loader::new();
                while let Ok(n) = f.read(&mut block) {
                    if n == 0 {
                        break;
                    }
                    loader.feed(&mut buf, &block[..n]);
                }
                file::finish_load(&mut buf);
                if self.config.hilight_on_open {
                    buf.syntax = Syntax::match_name(&path_str);
                }
                buf.loading = false;
                buf.full_recalculate();
                if self.config.check_git {
                    buf.check_git_on_write = true;
                    git::examine(&mut buf, &path);
                }
                buf.line_no = 1;
                buf.col_no = 1;
                if self.config.go_to_line {
                    if let Some(line) = init_line {
                        buf.line_no = line.clamp(1, buf.line_count());
                        buf.offset = buf.line_no - 1;
                    } else if let Some((line, col)) = biminfo::fetch(&path) {
                        buf.line_no = line.clamp(1, buf.line_count());
                        buf.col_no = col.max(1);
                        buf.clamp_cursor();
                    }
                }
                self.registry.push_active(buf, self.config.term_width);
            }
        }
    }

    /// Write the active buffer to `file` (or its own name).
    pub fn write_file(&mut self, file: Option<&str>) {
        let target: Option<PathBuf> = match file {
            Some(name) => Some(PathBuf::from(name)),
            None => self.buf().file_name.clone(),
        };
        let Some(path) = target else {
            self.render_error("Need a file to write to.");
            return;
        };
        let result = file::write_file(self.buf_mut(), &path);
        if result.is_err() {
            self.render_error("Failed to open file for writing.");
            return;
        }
        if self.buf().file_name.is_none() {
            self.buf_mut().file_name = Some(path.clone());
        }
        if self.buf().check_git_on_write {
            git::examine(self.buf_mut(), &path);
        }
        self.update_title();
        self.redraw_all();
    }

    /// Close the active buffer, persisting its cursor position. Exits the
    /// editor when it was the last one.
    pub fn close_buffer(&mut self) {
        let idx = self.registry.active_index();
        let (closed, alive) = self.registry.close(idx, self.config.term_width);
        if let Some(name) = &closed.file_name {
            let _ = biminfo::update(name, closed.line_no, closed.col_no);
        }
        if !alive {
            self.quit();
            return;
        }
        self.redraw_all();
    }

    /// Restore the terminal and stop the main loop.
    pub fn quit(&mut self) {
        self.term.restore();
        self.running = false;
    }

    /// Quit unless a buffer is modified.
    pub fn try_quit(&mut self) {
        let mut msg = None;
        for (i, buf) in self.registry.iter().enumerate() {
            if buf.modified {
                msg = Some(match &buf.file_name {
                    Some(name) => format!(
                        "Modifications made to file `{}` in tab {}. Aborting.",
                        name.display(),
                        i + 1
                    ),
                    None => format!("Unsaved new file in tab {}. Aborting.", i + 1),
                });
                break;
            }
        }
        if let Some(msg) = msg {
            self.render_error(&msg);
            return;
        }
        while !self.registry.is_empty() && self.running {
            let (closed, alive) = self.registry.close(0, self.config.term_width);
            if let Some(name) = &closed.file_name {
                let _ = biminfo::update(name, closed.line_no, closed.col_no);
            }
            if !alive {
                self.quit();
            }
        }
    }

    /// Update the terminal title from the active buffer.
    pub fn update_title(&mut self) {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let name = self
            .buf()
            .file_name
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "[No Name]".to_string());
        let title = format!(
            "{}{} ({}) - BIM",
            name,
            if self.buf().modified { " +" } else { "" },
            cwd.display()
        );
        self.term.update_title(&title);
    }

    /// Mark the active buffer modified and refresh the chrome.
    pub fn set_modified(&mut self) {
        if self.buf().modified {
            return;
        }
        self.buf_mut().modified = true;
        self.update_title();
        self.redraw_tabbar();
        self.redraw_statusbar();
    }

    // ------------------------------------------------------------------
    // Cursor movement

    /// Jump to a line, parking it at the top of the viewport.
    pub fn goto_line(&mut self, line: isize) {
        let line = line.clamp(1, self.buf().line_count() as isize) as usize;
        let buf = self.buf_mut();
        buf.coffset = 0;
        buf.offset = line - 1;
        buf.line_no = line;
        buf.col_no = 1;
        self.redraw_most();
    }

    /// Aim the column at the preferred display column of `line_no`.
    fn land_on_preferred_column(&mut self) {
        let insert = self.buf().mode == Mode::Insert;
        let buf = self.buf_mut();
        let line_idx = buf.line_no - 1;
        let len = buf.lines[line_idx].len();
        let mut x = 0usize;
        let mut col = buf.col_no;
        for i in 0..len {
            x += buf.lines[line_idx].cells()[i].display_width() as usize;
            col = i + 1;
            if x > buf.preferred_column {
                break;
            }
        }
        buf.col_no = col;
        if insert && x <= buf.preferred_column {
            buf.col_no = len + 1;
        }
        let limit = len + usize::from(insert);
        if buf.col_no > limit {
            buf.col_no = limit.max(1);
        }
    }

    /// Move the cursor down one line.
    pub fn cursor_down(&mut self) {
        if self.buf().line_no >= self.buf().line_count() {
            return;
        }
        self.buf_mut().line_no += 1;
        self.land_on_preferred_column();

        let mut redraw = false;
        if self.buf().coffset != 0 {
            self.buf_mut().coffset = 0;
            redraw = true;
        }

        let text_rows = self.config.text_height();
        let threshold = self.buf().offset + text_rows;
        if self.buf().line_no > threshold.saturating_sub(self.config.cursor_padding) {
            self.buf_mut().offset += 1;
            if self.config.can_scroll && self.registry.left.is_none() {
                self.term.shift_up();
                let l = text_rows;
                if self.buf().offset + l < self.buf().line_count() + 1 {
                    self.redraw_line(l - 1, self.buf().offset + l - 1);
                } else {
                    self.draw_excess_line(l - 1);
                }
            } else {
                self.redraw_text();
            }
            self.redraw_tabbar();
            self.redraw_statusbar();
            self.redraw_commandline();
            self.place_cursor_actual();
            return;
        } else if redraw {
            self.redraw_text();
        }
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    /// Move the cursor up one line.
    pub fn cursor_up(&mut self) {
        if self.buf().line_no <= 1 {
            return;
        }
        self.buf_mut().line_no -= 1;
        self.land_on_preferred_column();

        let mut redraw = false;
        if self.buf().coffset != 0 {
            self.buf_mut().coffset = 0;
            redraw = true;
        }

        let padding = if self.buf().offset > 0 {
            self.config.cursor_padding
        } else {
            0
        };
        if self.buf().line_no <= self.buf().offset + padding {
            let buf = self.buf_mut();
            if buf.offset > 0 {
                buf.offset -= 1;
            }
            if self.config.can_scroll && self.registry.left.is_none() {
                self.term.shift_down();
                self.redraw_line(0, self.buf().offset);
            } else {
                self.redraw_text();
            }
            self.redraw_tabbar();
            self.redraw_statusbar();
            self.redraw_commandline();
            self.place_cursor_actual();
            return;
        } else if redraw {
            self.redraw_text();
        }
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    /// Move the cursor one column left.
    pub fn cursor_left(&mut self) {
        if self.buf().col_no > 1 {
            self.buf_mut().col_no -= 1;
            self.redraw_statusbar();
            self.place_cursor_actual();
        }
        self.buf_mut().set_preferred_column();
    }

    /// Move the cursor one column right.
    pub fn cursor_right(&mut self) {
        let buf = self.buf();
        let limit = buf.current_line().len() + usize::from(buf.mode == Mode::Insert);
        if buf.col_no < limit {
            self.buf_mut().col_no += 1;
            self.redraw_statusbar();
            self.place_cursor_actual();
        }
        self.buf_mut().set_preferred_column();
    }

    /// Move the cursor to the first column.
    pub fn cursor_home(&mut self) {
        self.buf_mut().col_no = 1;
        self.buf_mut().set_preferred_column();
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    /// Move to the end of the line (one past it in insert mode).
    pub fn cursor_end(&mut self) {
        let buf = self.buf_mut();
        buf.col_no = buf.current_line().len() + usize::from(buf.mode == Mode::Insert);
        if buf.col_no == 0 {
            buf.col_no = 1;
        }
        buf.set_preferred_column();
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    /// Move to the start of the previous word.
    pub fn word_left(&mut self) {
        let buf = self.buf();
        let mut line_no = buf.line_no;
        let mut col_no = buf.col_no;
        loop {
            if col_no == 0 {
                break;
            }
            col_no -= 1;
            while col_no == 0 {
                if line_no == 1 {
                    self.goto_line(1);
                    self.buf_mut().set_preferred_column();
                    return;
                }
                line_no -= 1;
                col_no = self.buf().lines[line_no - 1].len();
            }
            let c = self.buf().lines[line_no - 1].codepoint_at(col_no - 1);
            if !matches!(c, Some(c) if c.is_whitespace()) {
                break;
            }
        }
        loop {
            if col_no <= 1 {
                col_no = 1;
                break;
            }
            let c = self.buf().lines[line_no - 1].codepoint_at(col_no - 2);
            if matches!(c, Some(c) if c.is_whitespace()) {
                break;
            }
            col_no -= 1;
        }
        let buf = self.buf_mut();
        buf.col_no = col_no;
        buf.line_no = line_no;
        buf.set_preferred_column();
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    /// Move to the start of the next word.
    pub fn word_right(&mut self) {
        let mut line_no = self.buf().line_no;
        let mut col_no = self.buf().col_no;
        // Skip the rest of the current word.
        loop {
            col_no += 1;
            if col_no > self.buf().lines[line_no - 1].len() {
                line_no += 1;
                if line_no > self.buf().line_count() {
                    let buf = self.buf_mut();
                    buf.line_no = buf.line_count();
                    buf.col_no = buf.lines[buf.line_no - 1].len().max(1);
                    buf.set_preferred_column();
                    self.redraw_statusbar();
                    self.place_cursor_actual();
                    return;
                }
                col_no = 0;
                break;
            }
            let c = self.buf().lines[line_no - 1].codepoint_at(col_no - 1);
            if matches!(c, Some(c) if c.is_whitespace()) {
                break;
            }
        }
        // Then skip whitespace to the next word start.
        loop {
            col_no += 1;
            while col_no > self.buf().lines[line_no - 1].len() {
                line_no += 1;
                if line_no >= self.buf().line_count() {
                    let buf = self.buf_mut();
                    buf.line_no = buf.line_count();
                    buf.col_no = buf.lines[buf.line_no - 1].len().max(1);
                    buf.set_preferred_column();
                    self.redraw_statusbar();
                    self.place_cursor_actual();
                    return;
                }
                col_no = 1;
            }
            let c = self.buf().lines[line_no - 1].codepoint_at(col_no - 1);
            if !matches!(c, Some(c) if c.is_whitespace()) {
                break;
            }
        }
        let buf = self.buf_mut();
        buf.col_no = col_no;
        buf.line_no = line_no;
        buf.set_preferred_column();
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    // ------------------------------------------------------------------
    // Editing helpers shared by the modes

    /// Insert a code point at the cursor.
    pub fn insert_char(&mut self, c: char) {
        if c == '\0' {
            self.render_error("Inserted nil byte?");
            return;
        }
        let cell = self.buf().make_cell(c);
        let buf = self.buf_mut();
        let line = buf.line_no - 1;
        let at = buf.col_no - 1;
        buf.line_insert(line, cell, at);
        buf.col_no += 1;
        self.set_modified();
    }

    /// Overwrite the code point under the cursor.
    pub fn replace_char(&mut self, c: char) {
        let buf = self.buf();
        if buf.col_no < 1 || buf.col_no > buf.current_line().len() {
            return;
        }
        let cell = buf.make_cell(c);
        let buf = self.buf_mut();
        let line = buf.line_no - 1;
        let at = buf.col_no - 1;
        buf.line_replace(line, at, cell);
        let row = self.screen_row_of_cursor();
        self.redraw_line(row, self.buf().line_no - 1);
        self.set_modified();
    }

    /// Backspace: delete before the cursor, merging lines at column 1.
    pub fn delete_at_cursor(&mut self) {
        if self.buf().col_no > 1 {
            let buf = self.buf_mut();
            let line = buf.line_no - 1;
            let at = buf.col_no - 1;
            buf.line_delete(line, at);
            buf.col_no -= 1;
            if buf.coffset > 0 {
                buf.coffset -= 1;
            }
            let row = self.screen_row_of_cursor();
            self.redraw_line(row, self.buf().line_no - 1);
            self.set_modified();
            self.redraw_statusbar();
            self.place_cursor_actual();
        } else if self.buf().line_no > 1 {
            let buf = self.buf_mut();
            let prev_len = buf.lines[buf.line_no - 2].len();
            let at = buf.line_no - 1;
            buf.merge_lines(at);
            buf.line_no -= 1;
            buf.col_no = prev_len + 1;
            buf.set_preferred_column();
            self.redraw_text();
            self.set_modified();
            self.redraw_statusbar();
            self.place_cursor_actual();
        }
    }

    /// Delete the word before the cursor.
    pub fn delete_word(&mut self) {
        fn is_normal(c: char) -> bool {
            c.is_alphanumeric() || c == '_'
        }
        fn is_ws(c: char) -> bool {
            c == ' ' || c == '\t'
        }
        if self.buf().col_no <= 1 {
            return;
        }
        let before = |buf: &Buffer| buf.lines[buf.line_no - 1].codepoint_at(buf.col_no - 2);
        while self.buf().col_no > 1 && matches!(before(self.buf()), Some(c) if is_ws(c)) {
            let buf = self.buf_mut();
            let line = buf.line_no - 1;
            let at = buf.col_no - 1;
            buf.line_delete(line, at);
            buf.col_no -= 1;
            if buf.coffset > 0 {
                buf.coffset -= 1;
            }
        }
        let special_start = matches!(before(self.buf()), Some(c) if !is_normal(c) && !is_ws(c));
        loop {
            if self.buf().col_no <= 1 {
                break;
            }
            let buf = self.buf_mut();
            let line = buf.line_no - 1;
            let at = buf.col_no - 1;
            buf.line_delete(line, at);
            buf.col_no -= 1;
            if buf.coffset > 0 {
                buf.coffset -= 1;
            }
            match before(self.buf()) {
                Some(c) if is_ws(c) => break,
                Some(c) if special_start && is_normal(c) => break,
                Some(c) if !special_start && !is_normal(c) && !is_ws(c) => break,
                None => break,
                _ => {}
            }
        }
        self.buf_mut().set_preferred_column();
        self.redraw_text();
        self.set_modified();
        self.redraw_statusbar();
        self.place_cursor_actual();
    }

    /// Break the line at the cursor, applying auto-indent.
    pub fn insert_line_feed(&mut self) {
        let buf = self.buf_mut();
        if buf.col_no == buf.current_line().len() + 1 {
            let at = buf.line_no;
            buf.add_line(at);
        } else {
            let line = buf.line_no - 1;
            let col = buf.col_no - 1;
            buf.split_line(line, col);
        }
        let buf = self.buf_mut();
        buf.col_no = 1;
        buf.line_no += 1;
        buf.set_preferred_column();
        self.add_indent(self.buf().line_no - 1, self.buf().line_no - 2, false);
        let text_rows = self.config.text_height();
        let buf = self.buf_mut();
        if buf.line_no > buf.offset + text_rows {
            buf.offset += 1;
        }
        self.set_modified();
    }

    /// Copy leading indentation (and comment prefixes) from `old_line` onto
    /// `new_line`, adding a level after `{`/`:` unless `ignore_brace`.
    pub fn add_indent(&mut self, new_line: usize, old_line: usize, ignore_brace: bool) {
        if !self.buf().indent {
            return;
        }
        let mut changed = false;
        let in_comment = old_line < new_line && self.line_is_comment(new_line);
        if in_comment {
            let mut i = 0usize;
            loop {
                let Some(c) = self.buf().lines[old_line].codepoint_at(i) else {
                    break;
                };
                let next = self.buf().lines[old_line].codepoint_at(i + 1);
                if c == '/' {
                    if next == Some('*') {
                        self.insert_comment_lead(new_line, i);
                    }
                    break;
                } else if c == ' ' && next == Some('*') {
                    self.insert_comment_lead(new_line, i);
                    break;
                } else if c == ' ' || c == '\t' || c == '*' {
                    let cell = self.buf().lines[old_line].cells()[i];
                    self.buf_mut().line_insert(new_line, cell, i);
                    self.buf_mut().col_no += 1;
                    changed = true;
                    i += 1;
                } else {
                    break;
                }
            }
        } else {
            let mut i = 0usize;
            loop {
                let line = &self.buf().lines[old_line];
                let Some(c) = line.codepoint_at(i) else { break };
                // Stop short of a trailing close of a block comment.
                if old_line < new_line
                    && line.len() >= 3
                    && i == line.len() - 3
                    && c == ' '
                    && line.codepoint_at(i + 1) == Some('*')
                    && line.codepoint_at(i + 2) == Some('/')
                {
                    break;
                }
                if c == ' ' || c == '\t' {
                    let cell = self.buf().lines[old_line].cells()[i];
                    self.buf_mut().line_insert(new_line, cell, i);
                    self.buf_mut().col_no += 1;
                    changed = true;
                    i += 1;
                } else {
                    break;
                }
            }
        }
        if old_line < new_line && !ignore_brace && self.line_ends_with_brace(old_line) {
            if self.buf().tabs {
                let tabstop = self.buf().tabstop;
                let cell = Cell::with_width('\t', tabstop as u8);
                let buf = self.buf_mut();
                let at = buf.col_no - 1;
                buf.line_insert(new_line, cell, at);
                buf.col_no += 1;
            } else {
                let tabstop = self.buf().tabstop;
                for _ in 0..tabstop {
                    let cell = self.buf().make_cell(' ');
                    let buf = self.buf_mut();
                    let at = buf.col_no - 1;
                    buf.line_insert(new_line, cell, at);
                    buf.col_no += 1;
                }
            }
            changed = true;
        }
        // A predecessor that was nothing but whitespace is emptied.
        if self.buf().lines[old_line].is_blank() && !self.buf().lines[old_line].is_empty() {
            while !self.buf().lines[old_line].is_empty() {
                let len = self.buf().lines[old_line].len();
                self.buf_mut().line_delete(old_line, len);
            }
        }
        if changed {
            self.buf_mut().recalculate_syntax(new_line);
        }
    }

    fn insert_comment_lead(&mut self, new_line: usize, at: usize) {
        let flags = CellFlags::from_class(SyntaxClass::Comment);
        for (k, c) in [' ', '*', ' '].into_iter().enumerate() {
            let cell = Cell::with_flags(c, flags);
            self.buf_mut().line_insert(new_line, cell, at + k);
        }
        self.buf_mut().col_no += 3;
    }

    /// Whether `line` ends (ignoring trailing comments/whitespace) in `{`
    /// or `:`.
    pub fn line_ends_with_brace(&self, line: usize) -> bool {
        let l = &self.buf().lines[line];
        let mut i = l.len() as isize - 1;
        while i >= 0 {
            let cell = l.cells()[i as usize];
            if cell.flags().class() == SyntaxClass::Comment || cell.codepoint() == ' ' {
                i -= 1;
            } else {
                break;
            }
        }
        if i < 0 {
            return false;
        }
        matches!(l.cells()[i as usize].codepoint(), '{' | ':')
    }

    /// Whether `line` starts inside a block comment for the active syntax.
    pub fn line_is_comment(&self, line: usize) -> bool {
        let Some(syntax) = self.buf().syntax else {
            return false;
        };
        let istate = self.buf().lines[line].istate;
        match syntax {
            Syntax::C | Syntax::Java => istate == 1,
            Syntax::Rust => istate > 0,
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Yank and paste

    /// Yank whole lines between `start` and `end` (either order, 1-based).
    pub fn yank_lines(&mut self, start: usize, end: usize) {
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let mut lines = Vec::with_capacity(hi - lo + 1);
        for i in lo..=hi {
            let mut cells = self.buf().lines[i - 1].snapshot();
            for cell in &mut cells {
                cell.set_flags(CellFlags::empty());
            }
            lines.push(cells);
        }
        self.yanks = Some(YankRegister {
            lines,
            full_lines: true,
        });
    }

    /// Yank a character range (1-based inclusive coordinates, normalized).
    pub fn yank_text(
        &mut self,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) {
        let mut lines = Vec::new();
        let snap = |cells: &[Cell]| -> Vec<Cell> {
            cells
                .iter()
                .map(|c| {
                    let mut c = *c;
                    c.set_flags(CellFlags::empty());
                    c
                })
                .collect()
        };
        if start_line == end_line {
            let line = &self.buf().lines[start_line - 1];
            let hi = end_col.min(line.len());
            lines.push(snap(&line.cells()[start_col - 1..hi]));
        } else {
            let first = &self.buf().lines[start_line - 1];
            lines.push(snap(&first.cells()[(start_col - 1).min(first.len())..]));
            for i in start_line + 1..end_line {
                lines.push(snap(self.buf().lines[i - 1].cells()));
            }
            let last = &self.buf().lines[end_line - 1];
            lines.push(snap(&last.cells()[..end_col.min(last.len())]));
        }
        self.yanks = Some(YankRegister {
            lines,
            full_lines: false,
        });
    }

    /// Paste the yank register before (`P`) or after (`p`) the cursor.
    pub fn paste(&mut self, after: bool) {
        let Some(yanks) = self.yanks.clone() else {
            return;
        };
        if !yanks.full_lines {
            let buf = self.buf();
            let mut target_column = if after { buf.col_no + 1 } else { buf.col_no };
            if target_column > buf.current_line().len() + 1 {
                target_column = buf.current_line().len() + 1;
            }
            if yanks.lines.len() > 1 {
                let line = self.buf().line_no - 1;
                self.buf_mut().split_line(line, target_column - 1);
            }
            // First yank row lands in the current line.
            let line = self.buf().line_no - 1;
            for (i, cell) in yanks.lines[0].iter().enumerate() {
                self.buf_mut()
                    .line_insert(line, *cell, target_column + i - 1);
            }
            if yanks.lines.len() > 1 {
                let base = self.buf().line_no;
                for _ in 1..yanks.lines.len() - 1 {
                    self.buf_mut().add_line(base);
                }
                for (i, row) in yanks.lines[1..yanks.lines.len() - 1].iter().enumerate() {
                    self.buf_mut().replace_line(base + i, row);
                }
                // The final yank row joins the split-off tail.
                let tail = self.buf().line_no + yanks.lines.len() - 2;
                let last = &yanks.lines[yanks.lines.len() - 1];
                for (i, cell) in last.iter().enumerate() {
                    self.buf_mut().line_insert(tail, *cell, i);
                }
            }
        } else {
            let at = self.buf().line_no - usize::from(!after);
            for _ in 0..yanks.lines.len() {
                self.buf_mut().add_line(at);
            }
            for (i, row) in yanks.lines.iter().enumerate() {
                self.buf_mut().replace_line(at + i, row);
            }
        }
        self.buf_mut().full_recalculate();
        if after {
            if yanks.full_lines {
                self.buf_mut().line_no += 1;
            } else if yanks.lines.len() == 1 {
                self.buf_mut().col_no += yanks.lines[0].len();
            } else {
                let buf = self.buf_mut();
                buf.line_no += yanks.lines.len() - 1;
                buf.col_no = yanks.lines[yanks.lines.len() - 1].len();
            }
        }
        self.buf_mut().clamp_cursor();
        self.buf_mut().set_history_break();
        self.set_modified();
        self.redraw_all();
    }

    // ------------------------------------------------------------------
    // Paren matching

    /// Find the match for the paren at (or just before) the cursor;
    /// `in_col` is 1 for "on the cursor" and 2 for "just before it".
    pub fn find_matching_paren(&mut self, in_col: usize) -> Option<(usize, usize)> {
        let buf = self.buf();
        if buf.col_no + 1 < in_col + 1
            || buf.col_no - in_col + 1 > buf.current_line().len()
        {
            return None;
        }
        let cell = buf.current_line().cells()[buf.col_no - in_col];
        let start = cell.codepoint();
        let class = cell.flags().class();

        let idx = PAREN_PAIRS.find(start)?;
        let (direction, matching): (isize, char) = if idx % 2 == 0 {
            (1, PAREN_PAIRS.as_bytes()[idx + 1] as char)
        } else {
            (-1, PAREN_PAIRS.as_bytes()[idx - 1] as char)
        };

        let mut count = 0isize;
        let mut line = buf.line_no as isize;
        let mut col = (buf.col_no - in_col + 1) as isize;
        loop {
            while col > 0 && col < self.buf().lines[line as usize - 1].len() as isize + 1 {
                let cell = self.buf().lines[line as usize - 1].cells()[col as usize - 1];
                if cell.flags().class() == class {
                    if cell.codepoint() == start {
                        count += 1;
                    }
                    if cell.codepoint() == matching {
                        count -= 1;
                        if count == 0 {
                            return Some((line as usize, col as usize));
                        }
                    }
                }
                col += direction;
            }
            line += direction;
            if line == 0 || line == self.buf().line_count() as isize + 1 {
                return None;
            }
            col = if direction > 0 {
                1
            } else {
                self.buf().lines[line as usize - 1].len() as isize
            };
        }
    }

    /// Paint the matching paren with the SELECT flag, clearing stale ones.
    pub fn highlight_matching_paren(&mut self) {
        if matches!(
            self.buf().mode,
            Mode::LineSelection | Mode::CharSelection
        ) {
            return;
        }
        if !self.config.highlight_parens {
            return;
        }
        let (on_cursor, before_cursor) = {
            let buf = self.buf();
            let paren_at = |col_off: usize| -> bool {
                buf.col_no >= col_off
                    && buf
                        .current_line()
                        .codepoint_at(buf.col_no - col_off)
                        .is_some_and(|c| PAREN_PAIRS.contains(c))
            };
            (
                buf.line_no <= buf.line_count()
                    && buf.col_no <= buf.current_line().len()
                    && paren_at(1),
                buf.col_no > 1 && paren_at(2),
            )
        };
        let mut found = None;
        if on_cursor {
            found = self.find_matching_paren(1);
        } else if before_cursor {
            found = self.find_matching_paren(2);
        }
        if found.is_some() {
            self.buf_mut().highlighting_paren = true;
        }
        if !self.buf().highlighting_paren {
            return;
        }
        let text_rows = self.config.text_height();
        for i in 0..self.buf().line_count() {
            let mut redraw = false;
            {
                let buf = self.buf_mut();
                let line = &mut buf.lines[i];
                for (j, cell) in line.cells_mut().iter_mut().enumerate() {
                    if let Some((ml, mc)) = found {
                        if i == ml - 1 && j == mc - 1 {
                            *cell.flags_mut() |= CellFlags::SELECT;
                            redraw = true;
                            continue;
                        }
                    }
                    if cell.flags().contains(CellFlags::SELECT) {
                        redraw = true;
                    }
                    cell.flags_mut().remove(CellFlags::SELECT);
                }
            }
            if redraw {
                let offset = self.buf().offset;
                if i >= offset && i < offset + text_rows {
                    self.redraw_line(i - offset, i);
                }
            }
        }
        if found.is_none() {
            self.buf_mut().highlighting_paren = false;
        }
    }

    // ------------------------------------------------------------------
    // Split focus

    /// Focus the left pane (parking the right viewport of a self-split).
    pub fn use_left_buffer(&mut self) {
        let Some(left) = self.registry.left else {
            return;
        };
        if self.registry.self_split() && self.buf().left != 0 {
            let offset = self.buf().offset;
            self.registry.view_right_offset = offset;
            let restore = self.registry.view_left_offset;
            let buf = self.buf_mut();
            buf.width = buf.left;
            buf.left = 0;
            buf.offset = restore;
        }
        self.registry.set_active(left);
    }

    /// Focus the right pane (parking the left viewport of a self-split).
    pub fn use_right_buffer(&mut self) {
        let Some(right) = self.registry.right else {
            return;
        };
        if self.registry.self_split() && self.buf().left == 0 {
            let offset = self.buf().offset;
            self.registry.view_left_offset = offset;
            let restore = self.registry.view_right_offset;
            let term_width = self.config.term_width;
            let buf = self.buf_mut();
            buf.left = buf.width;
            buf.width = term_width - buf.width;
            buf.offset = restore;
        }
        self.registry.set_active(right);
    }

    // ------------------------------------------------------------------
    // Escape sequences and mouse

    /// Shared escape/CSI accumulator. Mirrors the navigation dispatch used
    /// by every mode.
    pub fn handle_escape(&mut self, esc: &mut EscSeq, c: i32) -> EscResult {
        if esc.len() >= 1 && esc.last() == 0x1b && c == 0x1b {
            esc.clear();
            self.input.unget(0x1b);
            return EscResult::Unhandled;
        }
        if esc.len() >= 1 && esc.last() == 0x1b && c != '[' as i32 {
            esc.clear();
            if (0..=255).contains(&c) {
                self.input.unget(c as u8);
            }
            return EscResult::Unhandled;
        }
        if esc.len() >= 1 && esc.last() == 0x1b && c == '[' as i32 {
            esc.clear();
            esc.push(0x1b);
            esc.push(c);
            return EscResult::Handled;
        }
        if esc.len() >= 2
            && esc.at(0) == 0x1b
            && esc.at(1) == '[' as i32
            && (c >= '0' as i32 && c <= '9' as i32 || c == ';' as i32)
        {
            esc.push(c);
            return EscResult::Handled;
        }
        if esc.len() >= 2 && esc.at(0) == 0x1b && esc.at(1) == '[' as i32 {
            let modifier = esc.last();
            esc.clear();
            match c as u8 {
                b'M' => self.handle_mouse(),
                b'A' => self.cursor_up(),
                b'B' => self.cursor_down(),
                b'C' => {
                    if modifier == '5' as i32 {
                        self.word_right();
                    } else if modifier == '3' as i32 {
                        self.config.split_percent += 1;
                        self.registry
                            .update_split_size(self.config.term_width, self.config.split_percent);
                        self.redraw_all();
                    } else if modifier == '4' as i32 {
                        self.use_right_buffer();
                        self.redraw_all();
                    } else {
                        self.cursor_right();
                    }
                }
                b'D' => {
                    if modifier == '5' as i32 {
                        self.word_left();
                    } else if modifier == '3' as i32 {
                        self.config.split_percent = self.config.split_percent.saturating_sub(1);
                        self.registry
                            .update_split_size(self.config.term_width, self.config.split_percent);
                        self.redraw_all();
                    } else if modifier == '4' as i32 {
                        self.use_left_buffer();
                        self.redraw_all();
                    } else {
                        self.cursor_left();
                    }
                }
                b'H' => self.cursor_home(),
                b'F' => self.cursor_end(),
                b'Z' => {
                    if self.buf().mode == Mode::LineSelection {
                        return EscResult::ShiftTab;
                    }
                }
                b'~' => match modifier as u8 {
                    b'1' => self.cursor_home(),
                    b'3' => self.forward_delete(),
                    b'4' => self.cursor_end(),
                    b'5' => {
                        self.goto_line(
                            self.buf().line_no as isize - (self.config.term_height as isize - 6),
                        );
                    }
                    b'6' => {
                        self.goto_line(
                            self.buf().line_no as isize + self.config.term_height as isize - 6,
                        );
                    }
                    _ => {}
                },
                other => {
                    let msg =
                        format!("Unrecognized escape sequence identifier: {}", other as char);
                    self.render_error(&msg);
                }
            }
            return EscResult::Handled;
        }
        esc.clear();
        EscResult::Handled
    }

    /// Forward delete (the delete key) in insert/replace modes.
    fn forward_delete(&mut self) {
        if !matches!(self.buf().mode, Mode::Insert | Mode::Replace) {
            return;
        }
        let buf = self.buf();
        if buf.col_no < buf.current_line().len() + 1 {
            let buf = self.buf_mut();
            let line = buf.line_no - 1;
            let at = buf.col_no;
            buf.line_delete(line, at);
            let row = self.screen_row_of_cursor();
            self.redraw_line(row, self.buf().line_no - 1);
            self.set_modified();
            self.redraw_statusbar();
            self.place_cursor_actual();
        } else if buf.line_no < buf.line_count() {
            let at = self.buf().line_no;
            self.buf_mut().merge_lines(at);
            self.redraw_text();
            self.set_modified();
            self.redraw_statusbar();
            self.place_cursor_actual();
        }
    }

    /// Handle a classical X10 mouse packet (three bytes follow `CSI M`).
    pub fn handle_mouse(&mut self) {
        let Some(b) = self.input.getch_blocking() else {
            return;
        };
        let buttons = b as i32 - 32;
        let Some(b) = self.input.getch_blocking() else {
            return;
        };
        let x = b as i32 - 32;
        let Some(b) = self.input.getch_blocking() else {
            return;
        };
        let y = b as i32 - 32;

        if buttons == 64 {
            // Wheel up.
            if self.config.shift_scrolling {
                let amount = self.config.scroll_amount;
                for _ in 0..amount {
                    if self.buf().offset > 0 {
                        self.buf_mut().offset -= 1;
                    }
                    let limit = self.buf().offset + self.config.text_height();
                    if self.buf().line_no > limit.saturating_sub(self.config.cursor_padding) {
                        self.cursor_up();
                    }
                }
                self.redraw_most();
            } else {
                for _ in 0..self.config.scroll_amount {
                    self.cursor_up();
                }
            }
            return;
        } else if buttons == 65 {
            // Wheel down.
            if self.config.shift_scrolling {
                let amount = self.config.scroll_amount;
                for _ in 0..amount {
                    if self.buf().offset < self.buf().line_count() - 1 {
                        self.buf_mut().offset += 1;
                    }
                    let e = if self.buf().offset == 0 {
                        0
                    } else {
                        self.buf().offset + self.config.cursor_padding
                    };
                    if self.buf().line_no <= e {
                        self.cursor_down();
                    }
                }
                self.redraw_most();
            } else {
                for _ in 0..self.config.scroll_amount {
                    self.cursor_down();
                }
            }
            return;
        } else if buttons == 3 {
            // Click.
            if x < 0 || y < 0 {
                return;
            }
            if y == 0 {
                return;
            }
            if y == 1 {
                // Tab bar: pick the tab under the click.
                let mut edge = 0i32;
                for i in 0..self.registry.len() {
                    edge += self.tab_title(self.registry.get(i)).chars().count() as i32;
                    if edge >= x {
                        self.registry.set_active(i);
                        self.redraw_all();
                        return;
                    }
                }
                return;
            }
            if matches!(self.buf().mode, Mode::Normal | Mode::Insert) {
                let mode = self.buf().mode;
                if (x as usize) < self.buf().left
                    && Some(self.registry.active_index()) == self.registry.right
                {
                    self.use_left_buffer();
                } else if (x as usize) > self.buf().width
                    && Some(self.registry.active_index()) == self.registry.left
                {
                    self.use_right_buffer();
                }
                self.buf_mut().mode = mode;
                self.redraw_all();
            }

            let mut x = x as usize;
            if self.buf().left > 0 {
                x = x.saturating_sub(self.buf().left);
            }

            let mut line_no = (y as usize) + self.buf().offset - 1;
            if line_no > self.buf().line_count() {
                line_no = self.buf().line_count();
            }
            if line_no == 0 {
                return;
            }

            let coffset = if line_no == self.buf().line_no {
                self.buf().coffset
            } else {
                0
            };
            let mut col_no = None;
            let mut edge = self.num_width() + 3 - coffset;
            for (i, cell) in self.buf().lines[line_no - 1].cells().iter().enumerate() {
                edge += cell.display_width() as usize;
                if edge > x.saturating_sub(1) {
                    col_no = Some(i + 1);
                    break;
                }
            }
            let len = self.buf().lines[line_no - 1].len();
            let col_no = col_no.unwrap_or(len).min(len).max(1);

            let buf = self.buf_mut();
            buf.line_no = line_no;
            buf.col_no = col_no;
            buf.set_preferred_column();
            self.place_cursor_actual();
        }
    }

    // ------------------------------------------------------------------
    // Signals

    /// Consume pending signal flags between input events.
    pub fn poll_signals(&mut self) {
        if terminal::take_sigwinch() {
            self.update_screen_size();
            self.redraw_all();
        }
        if terminal::take_sigtstp() {
            self.term.mouse_disable();
            self.term.reset();
            self.term.clear_screen();
            self.term.show_cursor();
            self.term.unset_alternate_screen();
            let _ = self.term.flush();
            self.term.set_buffered();
            terminal::suspend_self();
            // Resumed.
            self.term.set_alternate_screen();
            self.term.set_unbuffered();
            self.term.mouse_enable();
            self.redraw_all();
        }
        if terminal::take_sigcont() {
            self.term.set_alternate_screen();
            self.term.set_unbuffered();
            self.term.mouse_enable();
            self.redraw_all();
        }
    }

    /// Re-read the terminal size and fix pane geometry.
    pub fn update_screen_size(&mut self) {
        let (w, h) = terminal::screen_size();
        self.config.term_width = w;
        self.config.term_height = h;
        if self.registry.is_empty() {
            return;
        }
        if self.registry.left.is_some() {
            self.registry
                .update_split_size(w, self.config.split_percent);
        } else {
            self.buf_mut().width = w;
        }
    }

    /// One timeout read plus signal handling.
    pub fn getch(&mut self, timeout_ms: u64) -> Key {
        let key = self.input.getch_timeout(timeout_ms);
        self.poll_signals();
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Line;

    pub(crate) fn headless(lines: &[&str]) -> Editor {
        let mut config = Config::default();
        config.term_width = 80;
        config.term_height = 24;
        let theme = Theme::ansi(&config);
        let term = Terminal::with_sink(&config, Box::new(Vec::new()));
        let input = KeySource::from_bytes(b"");
        let mut ed = Editor::with_parts(config, theme, term, input);
        let mut buf = ed.new_buffer();
        if !lines.is_empty() {
            buf.lines.clear();
            for text in lines {
                buf.lines
                    .push(Line::from_cells(text.chars().map(Cell::new).collect()));
            }
        }
        ed.registry.push_active(buf, 80);
        ed
    }

    #[test]
    fn test_insert_and_delete_char() {
        let mut ed = headless(&[]);
        ed.insert_char('h');
        ed.insert_char('i');
        assert_eq!(ed.buf().lines[0].to_text(), "hi");
        assert_eq!(ed.buf().col_no, 3);
        assert!(ed.buf().modified);
        ed.delete_at_cursor();
        assert_eq!(ed.buf().lines[0].to_text(), "h");
    }

    #[test]
    fn test_backspace_merges_lines() {
        let mut ed = headless(&["foo", "bar"]);
        ed.buf_mut().line_no = 2;
        ed.buf_mut().col_no = 1;
        ed.delete_at_cursor();
        assert_eq!(ed.buf().lines[0].to_text(), "foobar");
        assert_eq!(ed.buf().line_no, 1);
        assert_eq!(ed.buf().col_no, 4);
    }

    #[test]
    fn test_line_yank_paste_after() {
        let mut ed = headless(&["A", "B", "C"]);
        ed.yank_lines(2, 3);
        ed.buf_mut().line_no = 3;
        ed.paste(true);
        let texts: Vec<String> = ed.buf().lines.iter().map(|l| l.to_text()).collect();
        assert_eq!(texts, vec!["A", "B", "C", "B", "C"]);
        assert_eq!(ed.buf().line_no, 4);
    }

    #[test]
    fn test_range_yank_paste_splices() {
        let mut ed = headless(&["hello world"]);
        ed.yank_text(1, 7, 1, 11);
        ed.buf_mut().col_no = 5;
        ed.paste(true);
        assert_eq!(ed.buf().lines[0].to_text(), "helloworld world");
    }

    #[test]
    fn test_paren_match_same_class() {
        let mut ed = headless(&["a(b)c"]);
        ed.buf_mut().col_no = 2;
        assert_eq!(ed.find_matching_paren(1), Some((1, 4)));
    }

    #[test]
    fn test_paren_match_across_lines() {
        let mut ed = headless(&["fn x() {", "  body();", "}"]);
        ed.buf_mut().col_no = 8;
        assert_eq!(ed.find_matching_paren(1), Some((3, 1)));
    }

    #[test]
    fn test_paren_match_respects_syntax_class() {
        let mut ed = headless(&["x = \"(\" + (1)"]);
        ed.buf_mut().syntax = Some(Syntax::Python);
        ed.buf_mut().full_recalculate();
        // The paren inside the string must not match the bare one.
        ed.buf_mut().col_no = 11;
        assert_eq!(ed.find_matching_paren(1), Some((1, 13)));
    }

    #[test]
    fn test_word_motions() {
        let mut ed = headless(&["one two three"]);
        ed.word_right();
        assert_eq!(ed.buf().col_no, 5);
        ed.word_right();
        assert_eq!(ed.buf().col_no, 9);
        ed.word_left();
        assert_eq!(ed.buf().col_no, 5);
    }

    #[test]
    fn test_insert_line_feed_auto_indent() {
        let mut ed = headless(&["    code {"]);
        ed.buf_mut().syntax = Some(Syntax::C);
        ed.buf_mut().full_recalculate();
        ed.buf_mut().tabs = false;
        ed.buf_mut().mode = Mode::Insert;
        ed.buf_mut().col_no = 11;
        ed.insert_line_feed();
        // Four copied spaces plus one tabstop of new indent.
        assert_eq!(ed.buf().lines[1].to_text(), "        ");
        assert_eq!(ed.buf().col_no, 9);
    }

    #[test]
    fn test_goto_line_clamps() {
        let mut ed = headless(&["a", "b", "c"]);
        ed.goto_line(100);
        assert_eq!(ed.buf().line_no, 3);
        ed.goto_line(-5);
        assert_eq!(ed.buf().line_no, 1);
    }
}
