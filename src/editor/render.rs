//! The renderer: tab bar, text area with gutter and line numbers, status
//! bar, command line, and cursor placement.
//!
//! Rendering is pull-based from buffer state. Redraws are scoped: cursor
//! movement repaints two lines, vertical scrolls use terminal shifts when
//! available, and everything funnels through the terminal's single output
//! buffer.

use super::Editor;
use crate::buffer::{Buffer, CellFlags, Line, Mode, RevStatus, SyntaxClass};
use crate::config::Config;
use crate::terminal::Terminal;
use crate::theme::Theme;

/// Order of magnitude of a line number, for gutter sizing.
fn log_base_10(v: usize) -> usize {
    let mut r = 0;
    let mut v = v;
    while v >= 10 {
        v /= 10;
        r += 1;
    }
    r
}

fn basename(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn draw_line_number(term: &mut Terminal, theme: &Theme, buf: &Buffer, x: usize) {
    if buf.lines[x].is_current {
        term.set_colors(theme.number_bg, theme.number_fg);
    } else {
        term.set_colors(theme.number_fg, theme.number_bg);
    }
    let num_size = num_width_of(buf);
    for _ in 0..num_size.saturating_sub(log_base_10(x + 1)) {
        term.out().write_char(' ');
    }
    term.out().write_fmt(format_args!("{}", x + 1));
    term.out().write_char(if x + 1 == buf.line_no && buf.coffset > 0 {
        '<'
    } else {
        ' '
    });
}

fn num_width_of(buf: &Buffer) -> usize {
    (log_base_10(buf.line_count()) + 1).max(2)
}

#[allow(clippy::too_many_arguments)]
fn render_line(
    term: &mut Terminal,
    theme: &Theme,
    config: &Config,
    buf: &Buffer,
    line: &Line,
    width: usize,
    offset: usize,
    line_no: usize,
) {
    if width == 0 {
        return;
    }
    let mut i = 0usize; // cell index
    let mut j = 0usize; // terminal cell offset

    let mut last_color: Option<&str> = None;
    let mut was_selecting = false;
    let mut was_searching = false;

    term.set_colors(theme.fg, if line.is_current { theme.alt_bg } else { theme.bg });

    // Leftover columns of a wide character that began off-screen.
    let mut remainder = 0usize;

    let col_range = |a: usize, b: usize| -> (usize, usize) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    };
    let (sel_lo, sel_hi) = col_range(buf.start_line, buf.line_no);
    let col_mode = matches!(buf.mode, Mode::ColSelection | Mode::ColInsert);

    while i < line.len() {
        if remainder > 0 {
            if j >= offset {
                term.set_colors(theme.alt_fg, theme.alt_bg);
                term.out().write_char('-');
                term.set_colors(theme.fg, theme.bg);
            }
            remainder -= 1;
            j += 1;
            if remainder == 0 {
                i += 1;
            }
            continue;
        }

        let c = line.cells()[i];
        if j >= offset {
            // Truncate with an overflow marker at the right edge.
            if j - offset + c.display_width() as usize >= width {
                term.set_colors(theme.alt_fg, theme.alt_bg);
                while j - offset < width - 1 {
                    term.out().write_char('-');
                    j += 1;
                }
                term.out().write_char('>');
                term.set_colors(theme.fg, theme.bg);
                return;
            }

            // Palette selection.
            let color = theme.class_color(c.flags().class());
            if c.flags().contains(CellFlags::SELECT) {
                term.set_colors(theme.select_fg, theme.select_bg);
                was_selecting = true;
            } else if c.flags().contains(CellFlags::SEARCH)
                || c.flags().class() == SyntaxClass::Notice
            {
                term.set_colors(theme.search_fg, theme.search_bg);
                was_searching = true;
            } else if was_selecting || was_searching {
                term.set_colors(
                    color,
                    if line.is_current { theme.alt_bg } else { theme.bg },
                );
                last_color = Some(color);
                was_selecting = false;
                was_searching = false;
            } else if last_color != Some(color) {
                term.set_fg_color(color);
                last_color = Some(color);
            }

            // Column modes paint the single selection column.
            if col_mode
                && line_no >= sel_lo
                && line_no <= sel_hi
                && (j == buf.sel_col
                    || (j < buf.sel_col && j + c.display_width() as usize > buf.sel_col))
            {
                term.set_colors(theme.select_fg, theme.select_bg);
                was_selecting = true;
            }

            let selected = c.flags().contains(CellFlags::SELECT) || was_selecting;
            let pre = |term: &mut Terminal| {
                if !selected {
                    term.set_colors(theme.alt_fg, theme.alt_bg);
                }
            };
            let post = |term: &mut Terminal, fg: &str| {
                if !selected {
                    term.set_colors(fg, if line.is_current { theme.alt_bg } else { theme.bg });
                }
            };

            let cp = c.codepoint() as u32;
            if c.codepoint() == '\t' {
                pre(term);
                if config.can_unicode {
                    term.out().write_char('»');
                    for _ in 1..c.display_width() {
                        term.out().write_char('·');
                    }
                } else {
                    term.out().write_char('>');
                    for _ in 1..c.display_width() {
                        term.out().write_char('-');
                    }
                }
                post(term, last_color.unwrap_or(theme.fg));
            } else if cp < 32 {
                pre(term);
                term.out().write_char('^');
                term.out()
                    .write_char(char::from_u32('@' as u32 + cp).unwrap_or('?'));
                post(term, last_color.unwrap_or(theme.fg));
            } else if cp == 0x7f {
                pre(term);
                term.out().write_str("^?");
                post(term, last_color.unwrap_or(theme.fg));
            } else if cp > 0x7f && cp < 0xa0 {
                pre(term);
                term.out().write_fmt(format_args!("<{cp:2x}>"));
                post(term, last_color.unwrap_or(theme.fg));
            } else if cp == 0xa0 {
                pre(term);
                term.out().write_char('_');
                post(term, last_color.unwrap_or(theme.fg));
            } else if c.display_width() == 8 {
                pre(term);
                term.out().write_fmt(format_args!("[U+{cp:04x}]"));
                post(term, last_color.unwrap_or(theme.fg));
            } else if c.display_width() == 10 {
                pre(term);
                term.out().write_fmt(format_args!("[U+{cp:06x}]"));
                post(term, last_color.unwrap_or(theme.fg));
            } else if c.codepoint() == ' ' && i == line.len() - 1 {
                // Trailing space.
                pre(term);
                if config.can_unicode {
                    term.out().write_char('·');
                } else {
                    term.out().write_char(' ');
                }
                post(term, theme.fg);
            } else {
                term.out().write_char(c.codepoint());
            }

            j += c.display_width() as usize;
            i += 1;
        } else if c.display_width() > 1 {
            // Wide character scrolled halfway off: fill with markers.
            remainder = c.display_width() as usize - 1;
            j += 1;
        } else {
            j += 1;
            i += 1;
        }
    }

    if buf.mode != Mode::LineSelection {
        if line.is_current {
            term.set_colors(theme.fg, theme.alt_bg);
        } else {
            term.set_colors(theme.fg, theme.bg);
        }
    } else if line.is_empty() {
        let (lo, hi) = col_range(buf.start_line, buf.line_no);
        if line_no >= lo && line_no <= hi {
            term.set_colors(theme.select_fg, theme.select_bg);
        }
    }

    // Column selection reaches beyond the end of short lines.
    if col_mode && line_no >= sel_lo && line_no <= sel_hi && j <= buf.sel_col && buf.sel_col < width
    {
        term.set_colors(theme.fg, theme.bg);
        while j < buf.sel_col {
            term.out().write_char(' ');
            j += 1;
        }
        term.set_colors(theme.select_fg, theme.select_bg);
        term.out().write_char(' ');
        j += 1;
        term.set_colors(theme.fg, theme.bg);
    }

    if buf.left + buf.width == config.term_width && term.can_bce() {
        term.clear_to_end();
    } else {
        while j.saturating_sub(offset) < width {
            term.out().write_char(' ');
            j += 1;
        }
    }
}

impl Editor {
    /// Width of the line number column for the active buffer.
    pub fn num_width(&self) -> usize {
        num_width_of(self.buf())
    }

    /// Screen row (0-based within the text area) of the cursor line.
    pub fn screen_row_of_cursor(&self) -> usize {
        let buf = self.buf();
        buf.line_no.saturating_sub(buf.offset).saturating_sub(1)
    }

    /// Tab bar segment text for a buffer.
    pub fn tab_title(&self, buf: &Buffer) -> String {
        let name = buf
            .file_name
            .as_ref()
            .map(|p| basename(p))
            .unwrap_or_else(|| "[No Name]".to_string());
        let name: String = name.chars().take(40).collect();
        format!("{} {} ", if buf.modified { " +" } else { "" }, name)
    }

    /// Redraw the tab bar (row 1).
    pub fn redraw_tabbar(&mut self) {
        self.term.hide_cursor();
        self.term.place_cursor(1, 1);
        let tabbar_bg = self.theme.tabbar_bg;
        let fg = self.theme.fg;
        self.term.paint_line(fg, tabbar_bg, self.config.term_width);

        let mut offset = 0usize;
        for i in 0..self.registry.len() {
            let active = i == self.registry.active_index();
            let title = self.tab_title(self.registry.get(i));
            if active {
                self.term.reset();
                self.term.set_colors(self.theme.fg, self.theme.bg);
                self.term.set_bold();
            } else {
                self.term.reset();
                self.term.set_colors(self.theme.fg, self.theme.tab_bg);
                self.term.set_underline();
            }
            let size = title.chars().count();
            if offset + size >= self.config.term_width {
                let remaining = self.config.term_width.saturating_sub(offset + 1);
                let clipped: String = title.chars().take(remaining).collect();
                self.term.out().write_str(&clipped);
                break;
            }
            self.term.out().write_str(&title);
            offset += size;
        }
        self.term.reset();
        self.term.set_colors(self.theme.fg, self.theme.tabbar_bg);
        self.term.clear_to_end();
    }

    /// Redraw one text row of a given buffer. `j` is the screen row within
    /// the text area, `x` the 0-based line index.
    pub fn redraw_line_of(&mut self, idx: usize, j: usize, x: usize) {
        if self.registry.get(idx).loading {
            return;
        }
        let Self {
            term,
            theme,
            config,
            registry,
            ..
        } = self;
        let buf = registry.get(idx);

        term.hide_cursor();
        term.place_cursor(1 + buf.left, 2 + j);

        // Gutter: one column encoding the revision status.
        match buf.lines[x].rev_status {
            RevStatus::Added => {
                term.set_colors(theme.number_fg, theme.green);
                term.out().write_char(' ');
            }
            RevStatus::ModifiedUnsaved => {
                let bg = if config.color_gutter {
                    theme.search_bg
                } else {
                    theme.alt_fg
                };
                term.set_colors(theme.number_fg, bg);
                term.out().write_char(' ');
            }
            RevStatus::ModifiedCommitted => {
                term.set_colors(theme.number_fg, theme.keyword);
                term.out().write_char(' ');
            }
            RevStatus::DeletedAbove => {
                term.set_colors(theme.alt_fg, theme.red);
                term.out().write_char('▆');
            }
            RevStatus::ModifiedAndDeletedAbove => {
                term.set_colors(theme.keyword, theme.red);
                term.out().write_char('▆');
            }
            RevStatus::Unchanged => {
                term.set_colors(theme.number_fg, theme.alt_fg);
                term.out().write_char(' ');
            }
        }

        draw_line_number(term, theme, buf, x);

        let width = buf.width.saturating_sub(3 + num_width_of(buf));
        let offset = if x + 1 == buf.line_no { buf.coffset } else { 0 };
        render_line(term, theme, config, buf, &buf.lines[x], width, offset, x + 1);
    }

    /// Redraw one text row of the active buffer.
    pub fn redraw_line(&mut self, j: usize, x: usize) {
        self.redraw_line_of(self.registry.active_index(), j, x);
    }

    /// Draw a `~` filler row below the end of the buffer.
    pub fn draw_excess_line(&mut self, j: usize) {
        self.draw_excess_line_of(self.registry.active_index(), j);
    }

    fn draw_excess_line_of(&mut self, idx: usize, j: usize) {
        let buf_left = self.registry.get(idx).left;
        let buf_width = self.registry.get(idx).width;
        self.term.place_cursor(1 + buf_left, 2 + j);
        let fg = self.theme.alt_fg;
        let bg = self.theme.alt_bg;
        self.term.paint_line(fg, bg, self.config.term_width);
        self.term.set_colors(fg, bg);
        self.term.out().write_char('~');
        if buf_left + buf_width == self.config.term_width && self.term.can_bce() {
            self.term.clear_to_end();
        } else {
            for _ in 1..buf_width {
                self.term.out().write_char(' ');
            }
        }
    }

    /// Redraw the whole text area of a given buffer.
    pub fn redraw_text_of(&mut self, idx: usize) {
        self.term.hide_cursor();
        let rows = self.config.text_height();
        let offset = self.registry.get(idx).offset;
        let line_count = self.registry.get(idx).line_count();
        let mut j = 0usize;
        let mut x = offset;
        while j < rows && x < line_count {
            self.redraw_line_of(idx, j, x);
            j += 1;
            x += 1;
        }
        while j < rows {
            self.draw_excess_line_of(idx, j);
            j += 1;
        }
    }

    /// Redraw the whole text area of the active buffer.
    pub fn redraw_text(&mut self) {
        self.redraw_text_of(self.registry.active_index());
    }

    /// Redraw the non-focused view: the other buffer of a split, or the
    /// opposite viewport of a self-split.
    pub fn redraw_alt_buffer(&mut self) {
        let active = self.registry.active_index();
        if self.registry.self_split() {
            // Temporarily put the buffer in the opposite pane's geometry.
            let split = self.config.term_width * self.config.split_percent / 100;
            let term_width = self.config.term_width;
            let (left, width, offset) = {
                let buf = self.buf();
                (buf.left, buf.width, buf.offset)
            };
            {
                let view_left = self.registry.view_left_offset;
                let view_right = self.registry.view_right_offset;
                let buf = self.registry.active_mut();
                if left == 0 {
                    buf.left = width;
                    buf.width = term_width - width;
                    buf.offset = view_right;
                } else {
                    buf.left = 0;
                    buf.width = split;
                    buf.offset = view_left;
                }
            }
            if left == 0 {
                self.registry.view_left_offset = offset;
            } else {
                self.registry.view_right_offset = offset;
            }
            self.redraw_text();
            let buf = self.registry.active_mut();
            buf.left = left;
            buf.width = width;
            buf.offset = offset;
        } else if let (Some(l), Some(r)) = (self.registry.left, self.registry.right) {
            let other = if l == active { r } else { l };
            self.redraw_text_of(other);
        }
    }

    /// Redraw the status bar (second row from the bottom).
    pub fn redraw_statusbar(&mut self) {
        let (status_bits, right_hand, file_display) = {
            let buf = self.buf();
            let mut status_bits = String::new();
            if let Some(syntax) = buf.syntax {
                status_bits.push_str(&format!("[{}]", syntax.name()));
            }
            if buf.modified {
                status_bits.push_str("[+]");
            }
            if buf.readonly {
                status_bits.push_str("[ro]");
            }
            status_bits.push(' ');
            if buf.tabs {
                status_bits.push_str("[tabs]");
            } else {
                status_bits.push_str(&format!("[spaces={}]", buf.tabstop));
            }
            if let Some(yanks) = &self.yanks {
                status_bits.push_str(&format!("[y:{}]", yanks.lines.len()));
            }
            if buf.indent {
                status_bits.push_str("[indent]");
            }

            let right_hand = format!(
                "Line {}/{} Col: {} ",
                buf.line_no,
                buf.line_count(),
                buf.col_no
            );

            // Long file names truncate from the left.
            let file_display = match &buf.file_name {
                Some(name) => {
                    let name = name.display().to_string();
                    let chars: Vec<char> = name.chars().collect();
                    let budget = self
                        .config
                        .term_width
                        .saturating_sub(right_hand.chars().count())
                        .saturating_sub(status_bits.chars().count())
                        .saturating_sub(5);
                    let mut skip = 0usize;
                    while chars.len() - skip > 5 && chars.len() - skip > budget {
                        skip += 1;
                    }
                    let shown: String = chars[skip..].iter().collect();
                    if skip > 0 {
                        format!("<{shown}")
                    } else {
                        shown
                    }
                }
                None => "[No Name]".to_string(),
            };
            (status_bits, right_hand, file_display)
        };

        self.term.hide_cursor();
        self.term.place_cursor(1, self.config.term_height - 1);
        let status_fg = self.theme.status_fg;
        let status_bg = self.theme.status_bg;
        self.term
            .paint_line(status_fg, status_bg, self.config.term_width);
        self.term.set_colors(status_fg, status_bg);
        self.term.out().write_str(&file_display);
        self.term.out().write_char(' ');
        self.term.out().write_str(&status_bits);
        self.term.clear_to_end();

        let col = self
            .config
            .term_width
            .saturating_sub(right_hand.chars().count());
        self.term.place_cursor(col, self.config.term_height - 1);
        self.term.out().write_str(&right_hand);
    }

    /// Redraw the command line (bottom row): the mode banner, or nothing.
    pub fn redraw_commandline(&mut self) {
        let (mode, lo, hi, sel_col) = {
            let buf = self.buf();
            let (lo, hi) = if buf.start_line < buf.line_no {
                (buf.start_line, buf.line_no)
            } else {
                (buf.line_no, buf.start_line)
            };
            (buf.mode, lo, hi, buf.sel_col)
        };

        self.term.hide_cursor();
        self.term.place_cursor(1, self.config.term_height);
        let fg = self.theme.fg;
        let bg = self.theme.bg;
        self.term.paint_line(fg, bg, self.config.term_width);
        self.term.set_colors(fg, bg);

        match mode {
            Mode::Insert => {
                self.term.set_bold();
                self.term.out().write_str("-- INSERT --");
                self.term.clear_to_end();
                self.term.unset_bold();
            }
            Mode::LineSelection => {
                self.term.set_bold();
                self.term
                    .out()
                    .write_fmt(format_args!("-- LINE SELECTION -- ({lo}:{hi})"));
                self.term.clear_to_end();
                self.term.unset_bold();
            }
            Mode::ColSelection => {
                self.term.set_bold();
                self.term
                    .out()
                    .write_fmt(format_args!("-- COL SELECTION -- ({lo}:{hi} {sel_col})"));
                self.term.clear_to_end();
                self.term.unset_bold();
            }
            Mode::ColInsert => {
                self.term.set_bold();
                self.term
                    .out()
                    .write_fmt(format_args!("-- COL INSERT -- ({lo}:{hi} {sel_col})"));
                self.term.clear_to_end();
                self.term.unset_bold();
            }
            Mode::Replace => {
                self.term.set_bold();
                self.term.out().write_str("-- REPLACE --");
                self.term.clear_to_end();
                self.term.unset_bold();
            }
            Mode::CharSelection => {
                self.term.set_bold();
                self.term.out().write_str("-- CHAR SELECTION -- ");
                self.term.clear_to_end();
                self.term.reset();
            }
            Mode::Normal => {
                self.term.clear_to_end();
            }
        }
        let _ = self.term.flush();
    }

    /// Show a transient message on the command line.
    pub fn render_commandline_message(&mut self, message: &str) {
        self.term.hide_cursor();
        self.term.place_cursor(1, self.config.term_height);
        let fg = self.theme.fg;
        let bg = self.theme.bg;
        self.term.paint_line(fg, bg, self.config.term_width);
        self.term.set_colors(fg, bg);
        self.term.out().write_str(message);
        self.term.clear_to_end();
        let _ = self.term.flush();
    }

    /// Show a transient message on the status line.
    pub fn render_status_message(&mut self, message: &str) {
        self.term.hide_cursor();
        self.term.place_cursor(1, self.config.term_height - 1);
        let fg = self.theme.status_fg;
        let bg = self.theme.status_bg;
        self.term.paint_line(fg, bg, self.config.term_width);
        self.term.set_colors(fg, bg);
        self.term.out().write_str(message);
        self.term.clear_to_end();
        let _ = self.term.flush();
    }

    /// Show an error on the command line in the error palette.
    pub fn render_error(&mut self, message: &str) {
        self.term.hide_cursor();
        self.term.place_cursor(1, self.config.term_height);
        let fg = self.theme.error_fg;
        let bg = self.theme.error_bg;
        self.term.set_colors(fg, bg);
        self.term.out().write_str(message);
        let _ = self.term.flush();
    }

    /// Move the current-line highlight, repainting only the two affected
    /// rows.
    pub fn recalculate_current_line(&mut self) {
        if !self.config.hilight_current_line {
            return;
        }
        let rows = self.config.text_height();
        for i in 0..self.buf().line_count() {
            let is_cursor = i == self.buf().line_no - 1;
            let was = self.buf().lines[i].is_current;
            if was && !is_cursor {
                self.buf_mut().lines[i].is_current = false;
            } else if is_cursor && !was {
                self.buf_mut().lines[i].is_current = true;
            } else {
                continue;
            }
            let offset = self.buf().offset;
            if i >= offset && i < offset + rows {
                self.redraw_line(i - offset, i);
            }
        }
    }

    /// Place the terminal cursor at the buffer cursor, scrolling the
    /// viewport as needed to honor the padding.
    pub fn place_cursor_actual(&mut self) {
        self.buf_mut().clamp_cursor();

        let num_size = (self.num_width() + 3) as isize;
        let (mut x, mut y) = {
            let buf = self.buf();
            let mut w = 0isize;
            for i in 0..buf.col_no - 1 {
                w += buf.lines[buf.line_no - 1].cells()[i].display_width() as isize;
            }
            (
                num_size + 1 - buf.coffset as isize + w,
                buf.line_no as isize - buf.offset as isize + 1,
            )
        };

        let mut needs_redraw = false;
        let padding = self.config.cursor_padding as isize;
        let text_bottom = (self.config.term_height - self.config.bottom_size) as isize;

        while y < 2 + padding && self.buf().offset > 0 {
            y += 1;
            self.buf_mut().offset -= 1;
            needs_redraw = true;
        }
        while y > text_bottom - padding {
            y -= 1;
            self.buf_mut().offset += 1;
            needs_redraw = true;
        }
        if needs_redraw {
            self.redraw_text();
            self.redraw_tabbar();
            self.redraw_statusbar();
            self.redraw_commandline();
        }

        // Horizontal scroll maintenance.
        let width = self.buf().width as isize;
        if x > width - 1 {
            let diff = x - (width - 1);
            self.buf_mut().coffset += diff as usize;
            x -= diff;
            self.redraw_text();
        }
        if x < num_size + 1 {
            let diff = num_size + 1 - x;
            let coffset = self.buf().coffset;
            self.buf_mut().coffset = coffset.saturating_sub(diff as usize);
            x += diff;
            self.redraw_text();
        }

        self.highlight_matching_paren();
        self.recalculate_current_line();

        let left = self.buf().left;
        self.term
            .place_cursor(x.max(1) as usize + left, y.max(1) as usize);
        self.term.show_cursor();
        let _ = self.term.flush();
    }

    /// Redraw everything, including the inactive split view.
    pub fn redraw_all(&mut self) {
        self.redraw_tabbar();
        self.redraw_text();
        if self.registry.left.is_some() {
            self.redraw_alt_buffer();
        }
        self.redraw_statusbar();
        self.redraw_commandline();
        let _ = self.term.flush();
    }

    /// Print the active buffer to the output sink with highlighting: the
    /// `-c`/`-C` dump modes.
    pub fn dump_buffer(&mut self, numbers: bool) {
        let count = self.buf().line_count();
        for i in 0..count {
            let Self {
                term,
                theme,
                config,
                registry,
                ..
            } = self;
            let buf = registry.active();
            if numbers {
                draw_line_number(term, theme, buf, i);
            }
            let width = 6 * (buf.lines[i].len() + 1);
            render_line(term, theme, config, buf, &buf.lines[i], width, 0, i + 1);
            term.reset();
            term.out().write_str("\n");
        }
        let _ = self.term.flush();
    }

    /// Redraw everything except the inactive split view.
    pub fn redraw_most(&mut self) {
        self.redraw_tabbar();
        self.redraw_text();
        self.redraw_statusbar();
        self.redraw_commandline();
        let _ = self.term.flush();
    }
}
