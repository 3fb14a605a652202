//! The `:` command line: prompt handling, history recall, tab completion,
//! and the command set itself.

use super::Editor;
use crate::buffer::Mode;
use crate::input::{Key, Utf8Decoder, DEFAULT_TIMEOUT_MS};
use crate::syntax::{Syntax, SYNTAXES};
use crate::theme::{Theme, THEME_NAMES};

const COMMAND_HISTORY_MAX: usize = 255;

const COMMAND_NAMES: &[&str] = &[
    "help",
    "recalc",
    "syntax",
    "tabn",
    "tabp",
    "tabnew",
    "theme",
    "tabs",
    "tabstop",
    "spaces",
    "noh",
    "clearyank",
    "indent",
    "noindent",
    "padding",
    "hlparen",
    "hlcurrent",
    "cursorcolumn",
    "smartcase",
    "split",
    "splitpercent",
    "unsplit",
    "git",
    "colorgutter",
];

impl Editor {
    /// Remember a command, most recent first, dropping duplicates.
    pub fn insert_command_history(&mut self, cmd: &str) {
        if let Some(pos) = self.command_history.iter().position(|c| c == cmd) {
            self.command_history.remove(pos);
        }
        self.command_history.insert(0, cmd.to_string());
        self.command_history.truncate(COMMAND_HISTORY_MAX);
    }

    /// The `:` prompt. Returns to normal mode when done.
    pub fn command_mode(&mut self) {
        let mut buffer = String::new();
        let mut history_point: Option<usize> = None;
        let mut decoder = Utf8Decoder::new();
        let mut esc_pending = false;
        let mut csi_pending = false;
        let mut csi_args: Vec<char> = Vec::new();

        self.redraw_commandline();
        self.term.out().write_char(':');
        self.term.show_cursor();
        let _ = self.term.flush();

        loop {
            let key = self.getch(DEFAULT_TIMEOUT_MS);
            let byte = match key {
                Key::Byte(b) => b,
                Key::Timeout => {
                    if esc_pending && !csi_pending {
                        return;
                    }
                    continue;
                }
                Key::Eof => return,
            };
            let Some(c) = decoder.push(byte) else {
                continue;
            };

            if esc_pending {
                if !csi_pending {
                    if c == '[' {
                        csi_pending = true;
                        csi_args.clear();
                        continue;
                    }
                    // Stray escape cancels the prompt.
                    if (c as u32) < 256 {
                        self.input.unget(c as u8);
                    }
                    return;
                }
                if c.is_ascii_digit() || c == ';' {
                    csi_args.push(c);
                    continue;
                }
                esc_pending = false;
                csi_pending = false;
                match c {
                    'M' => {
                        // Swallow the mouse packet; no pointing here.
                        for _ in 0..3 {
                            let _ = self.input.getch_blocking();
                        }
                    }
                    'A' => {
                        // Back through history.
                        let next = history_point.map_or(0, |p| p + 1);
                        if next < self.command_history.len() {
                            buffer = self.command_history[next].clone();
                            history_point = Some(next);
                        }
                        self.redraw_command_buffer(&buffer);
                    }
                    'B' => {
                        match history_point {
                            Some(0) | None => {
                                history_point = None;
                                buffer.clear();
                            }
                            Some(p) => {
                                history_point = Some(p - 1);
                                buffer = self.command_history[p - 1].clone();
                            }
                        }
                        self.redraw_command_buffer(&buffer);
                    }
                    'C' | 'D' | 'H' | 'F' => {
                        self.render_status_message(
                            "line editing not supported in command mode (sorry)",
                        );
                        self.redraw_command_buffer(&buffer);
                    }
                    _ => {}
                }
                self.term.show_cursor();
                let _ = self.term.flush();
                continue;
            }

            match c {
                '\x1b' => {
                    esc_pending = true;
                }
                '\r' | '\n' => {
                    self.process_command(&buffer);
                    return;
                }
                '\t' => {
                    self.command_tab_complete(&mut buffer);
                }
                '\x08' | '\x7f' => {
                    if buffer.pop().is_none() {
                        // Backspaced through the whole command.
                        self.redraw_commandline();
                        return;
                    }
                    self.redraw_command_buffer(&buffer);
                }
                '\x17' => {
                    // ^W: drop the last path/word component.
                    while buffer.ends_with(' ') || buffer.ends_with('/') {
                        buffer.pop();
                    }
                    while !buffer.is_empty()
                        && !buffer.ends_with(' ')
                        && !buffer.ends_with('/')
                    {
                        buffer.pop();
                    }
                    self.redraw_command_buffer(&buffer);
                }
                c => {
                    buffer.push(c);
                    self.term.out().write_char(c);
                }
            }
            self.term.show_cursor();
            let _ = self.term.flush();
        }
    }

    fn redraw_command_buffer(&mut self, buffer: &str) {
        self.redraw_commandline();
        self.term.out().write_char(':');
        self.term.out().write_str(buffer);
        self.term.show_cursor();
        let _ = self.term.flush();
    }

    /// Run one `:` command.
    pub fn process_command(&mut self, cmd: &str) {
        self.insert_command_history(cmd);

        if let Some(shell_cmd) = cmd.strip_prefix('!') {
            self.shell_out(shell_cmd);
            return;
        }

        // `:s/needle/repl/` attaches the expression directly to the command name;
        // recognize it before tokenizing so needles may contain spaces.
        {
            let (all_lines, rest) = match cmd.strip_prefix('%') {
                Some(r) => (true, r),
                None => (false, cmd),
            };
            if let Some(expr) = rest.strip_prefix('s') {
                let direct = expr
                    .chars()
                    .next()
                    .is_some_and(|c| !c.is_ascii_alphanumeric() && c != ' ' && c != '!');
                if direct {
                    let range = self.substitute_range(all_lines);
                    self.substitute(range, expr);
                    return;
                }
            }
        }

        let mut parts = cmd.splitn(2, ' ');
        let Some(mut name) = parts.next().filter(|n| !n.is_empty()) else {
            return;
        };
        let arg = parts.next().filter(|a| !a.is_empty());

        let mut all_lines = false;
        if let Some(stripped) = name.strip_prefix('%') {
            all_lines = true;
            name = stripped;
        }

        match name {
            "e" => {
                if let Some(file) = arg {
                    self.open_file(file);
                    self.update_title();
                    self.redraw_all();
                } else {
                    if self.buf().modified {
                        self.render_error("File is modified, can not reload.");
                        return;
                    }
                    let Some(file) = self.buf().file_name.clone() else {
                        return;
                    };
                    // Reload: load into a scratch buffer, graft its lines in.
                    let old_idx = self.registry.active_index();
                    self.open_file(&file.display().to_string());
                    let new_idx = self.registry.active_index();
                    if new_idx != old_idx {
                        let mut fresh_lines =
                            std::mem::take(&mut self.registry.get_mut(new_idx).lines);
                        let _ = self.registry.close(new_idx, self.config.term_width);
                        self.registry.set_active(old_idx);
                        if fresh_lines.is_empty() {
                            fresh_lines.push(crate::buffer::Line::new());
                        }
                        let target = self.buf_mut();
                        target.lines = fresh_lines;
                        target.clamp_cursor();
                        target.full_recalculate();
                    }
                    self.redraw_all();
                }
            }
            "s" => {
                let Some(expr) = arg else {
                    self.render_error("expected substitution argument");
                    return;
                };
                let range = self.substitute_range(all_lines);
                self.substitute(range, expr);
            }
            "tabnew" => {
                if let Some(file) = arg {
                    self.open_file(file);
                } else {
                    let buf = self.new_buffer();
                    self.registry.push_active(buf, self.config.term_width);
                }
                self.update_title();
                self.redraw_all();
            }
            "w" => self.write_file(arg),
            "wq" => {
                self.write_file(None);
                self.close_buffer();
            }
            "q" => {
                if self.registry.self_split() {
                    self.registry.unsplit(self.config.term_width);
                    self.redraw_all();
                    return;
                }
                if self.buf().modified {
                    self.render_error("No write since last change. Use :q! to force exit.");
                } else {
                    self.close_buffer();
                }
            }
            "q!" => self.close_buffer(),
            "qa" | "qall" => self.try_quit(),
            "qa!" => {
                while !self.registry.is_empty() && self.running {
                    let (_, alive) = self.registry.close(0, self.config.term_width);
                    if !alive {
                        self.quit();
                    }
                }
            }
            "tabp" => {
                self.registry.previous_tab();
                self.update_title();
                self.redraw_all();
            }
            "tabn" => {
                self.registry.next_tab();
                self.update_title();
                self.redraw_all();
            }
            "git" => match arg {
                None => {
                    let on = self.buf().check_git_on_write;
                    self.render_status_message(&format!("git={}", u8::from(on)));
                }
                Some(v) => {
                    let enable = v.trim().parse::<i64>().unwrap_or(0) != 0;
                    self.buf_mut().check_git_on_write = enable;
                    if enable && !self.buf().modified {
                        if let Some(file) = self.buf().file_name.clone() {
                            crate::io::git::examine(self.buf_mut(), &file);
                            self.redraw_text();
                        }
                    }
                }
            },
            "colorgutter" => match arg {
                None => {
                    let on = self.config.color_gutter;
                    self.render_status_message(&format!("colorgutter={}", u8::from(on)));
                }
                Some(v) => {
                    self.config.color_gutter = v.trim().parse::<i64>().unwrap_or(0) != 0;
                    self.redraw_text();
                }
            },
            "indent" => {
                self.buf_mut().indent = true;
                self.redraw_statusbar();
            }
            "noindent" => {
                self.buf_mut().indent = false;
                self.redraw_statusbar();
            }
            "cursorcolumn" => {
                let col = self.buf().preferred_column;
                self.render_status_message(&format!("cursorcolumn={col}"));
            }
            "noh" => {
                if self.buf_mut().search.take().is_some() {
                    self.buf_mut().full_recalculate();
                    self.redraw_text();
                }
            }
            "help" => self.show_help(),
            "history" => self.show_command_history(),
            "theme" => match arg {
                None => {
                    let name = self.theme.name;
                    self.render_status_message(&format!("theme={name}"));
                }
                Some(name) => {
                    if let Some(theme) = Theme::by_name(name.trim(), &self.config) {
                        self.theme = theme;
                        self.redraw_all();
                    }
                }
            },
            "splitpercent" => match arg {
                None => {
                    let pct = self.config.split_percent;
                    self.render_status_message(&format!("splitpercent={pct}"));
                }
                Some(v) => {
                    if let Ok(pct) = v.trim().parse::<usize>() {
                        self.config.split_percent = pct.clamp(1, 99);
                        if self.registry.left.is_some() {
                            self.registry.update_split_size(
                                self.config.term_width,
                                self.config.split_percent,
                            );
                            self.redraw_all();
                        }
                    }
                }
            },
            "split" => self.split_command(arg),
            "unsplit" => {
                self.registry.unsplit(self.config.term_width);
                self.redraw_all();
            }
            "syntax" => match arg {
                None => {
                    let name = self.buf().syntax.map_or("none", |s| s.name());
                    self.render_status_message(&format!("syntax={name}"));
                }
                Some("none") => {
                    self.buf_mut().syntax = None;
                    self.buf_mut().full_recalculate();
                    self.redraw_all();
                }
                Some(name) => match Syntax::by_name(name.trim()) {
                    Some(syntax) => {
                        self.buf_mut().syntax = Some(syntax);
                        self.buf_mut().full_recalculate();
                        self.redraw_all();
                    }
                    None => self.render_error("unrecognized syntax type"),
                },
            },
            "recalc" => {
                self.buf_mut().full_recalculate();
                self.redraw_all();
            }
            "tabs" => {
                self.buf_mut().tabs = true;
                self.redraw_statusbar();
            }
            "spaces" => {
                self.buf_mut().tabs = false;
                self.redraw_statusbar();
            }
            "tabstop" => match arg {
                None => {
                    let t = self.buf().tabstop;
                    self.render_status_message(&format!("tabstop={t}"));
                }
                Some(v) => match v.trim().parse::<usize>() {
                    Ok(t) if t > 0 && t < 32 => {
                        self.buf_mut().tabstop = t;
                        for i in 0..self.buf().line_count() {
                            self.buf_mut().recalculate_tabs_line(i);
                        }
                        self.redraw_all();
                    }
                    _ => self.render_error(&format!("Invalid tabstop: {v}")),
                },
            },
            "clearyank" => {
                if self.yanks.take().is_some() {
                    self.redraw_statusbar();
                }
            }
            "padding" => match arg {
                None => {
                    let p = self.config.cursor_padding;
                    self.render_status_message(&format!("padding={p}"));
                }
                Some(v) => {
                    if let Ok(p) = v.trim().parse::<usize>() {
                        self.config.cursor_padding = p;
                        self.place_cursor_actual();
                    }
                }
            },
            "smartcase" => match arg {
                None => {
                    let on = self.config.smart_case;
                    self.render_status_message(&format!("smartcase={}", u8::from(on)));
                }
                Some(v) => {
                    self.config.smart_case = v.trim().parse::<i64>().unwrap_or(0) != 0;
                    self.place_cursor_actual();
                }
            },
            "hlparen" => match arg {
                None => {
                    let on = self.config.highlight_parens;
                    self.render_status_message(&format!("hlparen={}", u8::from(on)));
                }
                Some(v) => {
                    self.config.highlight_parens = v.trim().parse::<i64>().unwrap_or(0) != 0;
                    self.buf_mut().full_recalculate();
                    self.redraw_text();
                    self.place_cursor_actual();
                }
            },
            "hlcurrent" => match arg {
                None => {
                    let on = self.config.hilight_current_line;
                    self.render_status_message(&format!("hlcurrent={}", u8::from(on)));
                }
                Some(v) => {
                    self.config.hilight_current_line =
                        v.trim().parse::<i64>().unwrap_or(0) != 0;
                    if !self.config.hilight_current_line {
                        for line in &mut self.buf_mut().lines {
                            line.is_current = false;
                        }
                    }
                    self.redraw_text();
                    self.place_cursor_actual();
                }
            },
            digits if digits.chars().all(|c| c.is_ascii_digit()) => {
                if let Ok(line) = digits.parse::<isize>() {
                    self.goto_line(line);
                }
            }
            other => {
                self.render_error(&format!("Not an editor command: {other}"));
            }
        }
    }

    /// Line range for `:s`: the line selection, the whole buffer for `%`,
    /// or just the cursor line.
    fn substitute_range(&self, all_lines: bool) -> (usize, usize) {
        let buf = self.buf();
        if buf.mode == Mode::LineSelection {
            if buf.start_line < buf.line_no {
                (buf.start_line, buf.line_no)
            } else {
                (buf.line_no, buf.start_line)
            }
        } else if all_lines {
            (1, buf.line_count())
        } else {
            (buf.line_no, buf.line_no)
        }
    }

    /// `:!cmd`: run a shell command with the terminal restored.
    fn shell_out(&mut self, cmd: &str) {
        self.term.reset();
        self.term.out().write_str("\r\n\r\n");
        let _ = self.term.flush();
        self.term.set_buffered();

        let _ = std::process::Command::new("sh").arg("-c").arg(cmd).status();

        self.term.set_unbuffered();
        self.term
            .out()
            .write_str("\r\n\r\nPress ENTER to continue.");
        let _ = self.term.flush();
        loop {
            match self.input.getch_blocking() {
                Some(b'\r') | Some(b'\n') | None => break,
                Some(_) => continue,
            }
        }
        self.redraw_all();
    }

    /// `:split [file]`.
    fn split_command(&mut self, arg: Option<&str>) {
        if arg.is_none() && self.registry.len() == 1 {
            // Self-split: same buffer, two viewports.
            self.registry.left = Some(0);
            self.registry.right = Some(0);
            self.registry
                .update_split_size(self.config.term_width, self.config.split_percent);
            self.redraw_all();
            return;
        }
        if (arg.is_none() && self.registry.len() != 2)
            || (arg.is_some() && self.registry.len() != 1)
        {
            self.render_error("(splits are experimental and only work with two buffers; sorry!)");
            return;
        }
        if let Some(file) = arg {
            self.open_file(file);
        }
        self.registry.left = Some(0);
        self.registry.right = Some(1);
        self.registry
            .update_split_size(self.config.term_width, self.config.split_percent);
        self.redraw_all();
    }

    /// `:history`: list remembered commands until a key is pressed.
    fn show_command_history(&mut self) {
        self.render_commandline_message("");
        // Entry 0 is the `:history` invocation itself.
        for (i, cmd) in self.command_history.iter().enumerate().skip(1).rev() {
            self.term.out().write_fmt(format_args!("{i}:{cmd}\r\n"));
        }
        let _ = self.term.flush();
        self.redraw_tabbar();
        self.redraw_commandline();
        if let Some(byte) = self.input.getch_blocking() {
            self.input.unget(byte);
        }
        self.redraw_all();
    }

    /// `:help`: a short command summary, shown until a key is pressed.
    fn show_help(&mut self) {
        self.render_commandline_message("");
        let lines = [
            "".to_string(),
            " \x1b[1mbim - a text editor\x1b[22m".to_string(),
            "".to_string(),
            " Available commands:".to_string(),
            "   Quit with \x1b[3m:q\x1b[23m, \x1b[3m:qa\x1b[23m, \x1b[3m:q!\x1b[23m, \x1b[3m:qa!\x1b[23m".to_string(),
            "   Write out with \x1b[3m:w \x1b[4mfile\x1b[24;23m".to_string(),
            "   Set syntax with \x1b[3m:syntax \x1b[4mlanguage\x1b[24;23m".to_string(),
            "   Open a new tab with \x1b[3m:e \x1b[4mpath/to/file\x1b[24;23m".to_string(),
            "   \x1b[3m:tabn\x1b[23m and \x1b[3m:tabp\x1b[23m can be used to switch tabs".to_string(),
            "   Set the color scheme with \x1b[3m:theme \x1b[4mtheme\x1b[24;23m".to_string(),
            "   Set the behavior of the tab key with \x1b[3m:tabs\x1b[23m or \x1b[3m:spaces\x1b[23m".to_string(),
            "   Set tabstop with \x1b[3m:tabstop \x1b[4mwidth\x1b[24;23m".to_string(),
            "".to_string(),
        ];
        for line in lines {
            self.term.out().write_str(&line);
            self.term.out().write_str("\r\n");
        }
        let _ = self.term.flush();
        self.redraw_tabbar();
        self.redraw_commandline();
        if let Some(byte) = self.input.getch_blocking() {
            self.input.unget(byte);
        }
        self.redraw_all();
    }

    /// TAB completion for the command prompt.
    pub fn command_tab_complete(&mut self, buffer: &mut String) {
        // Which argument are we completing, and what command owns it?
        let (arg_index, current, first_arg) = {
            let body = buffer.trim_start();
            let mut v: Vec<&str> = body.split(' ').filter(|s| !s.is_empty()).collect();
            if body.ends_with(' ') || v.is_empty() {
                v.push("");
            }
            (
                v.len() - 1,
                v[v.len() - 1].to_string(),
                v[0].to_string(),
            )
        };
        let current = current.as_str();

        let mut candidates: Vec<String> = Vec::new();
        let mut add_candidate = |candidate: &str| {
            if candidate.starts_with(current) {
                candidates.push(candidate.to_string());
            }
        };

        if arg_index == 0 {
            for name in COMMAND_NAMES {
                add_candidate(name);
            }
        } else if arg_index == 1 && first_arg == "syntax" {
            add_candidate("none");
            for syntax in SYNTAXES {
                add_candidate(syntax.name());
            }
        } else if arg_index == 1 && first_arg == "theme" {
            for name in THEME_NAMES {
                add_candidate(name);
            }
        } else if arg_index == 1 && matches!(first_arg.as_str(), "e" | "tabnew" | "split") {
            // Complete file paths from the deepest matching directory.
            let (dir, file_prefix) = match current.rfind('/') {
                Some(pos) => (&current[..pos.max(1)], &current[pos + 1..]),
                None => (".", current),
            };
            let dir_prefix = match current.rfind('/') {
                Some(pos) => &current[..=pos],
                None => "",
            };
            if let Ok(entries) = std::fs::read_dir(dir) {
                let mut names: Vec<(String, bool)> = entries
                    .flatten()
                    .map(|e| {
                        (
                            e.file_name().to_string_lossy().to_string(),
                            e.path().is_dir(),
                        )
                    })
                    .collect();
                names.sort();
                for (name, is_dir) in names {
                    if name.starts_with('.') && !file_prefix.starts_with('.') {
                        continue;
                    }
                    if !name.starts_with(file_prefix) {
                        continue;
                    }
                    let mut full = format!("{dir_prefix}{name}");
                    if is_dir {
                        full.push('/');
                    }
                    add_candidate(&full);
                }
            }
        }

        if candidates.is_empty() {
            self.redraw_statusbar();
            self.redraw_command_buffer(buffer);
            return;
        }

        let replace_tail = |buffer: &mut String, replacement: &str| {
            let keep = buffer.len() - current.len();
            buffer.truncate(keep);
            buffer.push_str(replacement);
        };

        if candidates.len() == 1 {
            self.redraw_statusbar();
            replace_tail(buffer, &candidates[0]);
        } else {
            // Show the candidates, complete to the longest common prefix.
            let mut listing = String::new();
            for candidate in &candidates {
                if listing.chars().count() + candidate.chars().count() + 1
                    > self.config.term_width.saturating_sub(5)
                {
                    listing.push_str("...");
                    break;
                }
                if !listing.is_empty() {
                    listing.push(' ');
                }
                listing.push_str(candidate);
            }
            self.render_status_message(&listing);

            let mut common = candidates[0].clone();
            for candidate in &candidates[1..] {
                let shared = common
                    .chars()
                    .zip(candidate.chars())
                    .take_while(|(a, b)| a == b)
                    .count();
                common = common.chars().take(shared).collect();
            }
            replace_tail(buffer, &common);
        }
        self.redraw_command_buffer(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::headless;

    #[test]
    fn test_command_history_dedup() {
        let mut ed = headless(&[]);
        ed.insert_command_history("w");
        ed.insert_command_history("q");
        ed.insert_command_history("w");
        assert_eq!(ed.command_history, vec!["w", "q"]);
    }

    #[test]
    fn test_goto_line_command() {
        let mut ed = headless(&["a", "b", "c", "d"]);
        ed.process_command("3");
        assert_eq!(ed.buf().line_no, 3);
    }

    #[test]
    fn test_substitute_command_whole_buffer() {
        let mut ed = headless(&["xa", "xb"]);
        ed.process_command("%s/x/y/");
        let texts: Vec<String> = ed.buf().lines.iter().map(|l| l.to_text()).collect();
        assert_eq!(texts, vec!["ya", "yb"]);
    }

    #[test]
    fn test_tabstop_command() {
        let mut ed = headless(&["\tx"]);
        ed.process_command("tabstop 8");
        assert_eq!(ed.buf().tabstop, 8);
        assert_eq!(ed.buf().lines[0].cells()[0].display_width(), 8);
    }

    #[test]
    fn test_tabs_and_spaces_commands() {
        let mut ed = headless(&[]);
        ed.process_command("spaces");
        assert!(!ed.buf().tabs);
        ed.process_command("tabs");
        assert!(ed.buf().tabs);
    }

    #[test]
    fn test_split_self() {
        let mut ed = headless(&["text"]);
        ed.process_command("split");
        assert!(ed.registry.self_split());
        assert_eq!(ed.buf().width, 40);
        ed.process_command("unsplit");
        assert_eq!(ed.buf().width, 80);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let mut ed = headless(&[]);
        ed.process_command("frobnicate");
        // Nothing changed; the buffer is intact.
        assert_eq!(ed.buf().line_count(), 1);
    }
}
