//! Editor-wide configuration: terminal capabilities, feature toggles, and
//! the `~/.bimrc` loader.

use std::env;
use std::fs;
use std::path::PathBuf;

/// Process-wide configuration and terminal capability set.
///
/// Threaded through operations as part of the editor context rather than
/// living in globals; the signal path reads it through the editor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Terminal width in columns.
    pub term_width: usize,
    /// Terminal height in rows.
    pub term_height: usize,
    /// Rows reserved below the text area (status + command line).
    pub bottom_size: usize,

    /// Path of the rc file (may start with `~`).
    pub bimrc_path: String,

    /// Highlight files on open.
    pub hilight_on_open: bool,
    /// `-R`: open the initial file read-only.
    pub initial_file_is_read_only: bool,
    /// Terminal supports scroll-shift escapes.
    pub can_scroll: bool,
    /// Terminal supports hiding/showing the cursor.
    pub can_hideshow: bool,
    /// Terminal supports the alternate screen.
    pub can_altscreen: bool,
    /// Terminal supports mouse reporting.
    pub can_mouse: bool,
    /// Terminal renders Unicode.
    pub can_unicode: bool,
    /// Terminal supports bright color variants.
    pub can_bright: bool,
    /// Terminal accepts title-setting escapes.
    pub can_title: bool,
    /// Terminal supports background color erase.
    pub can_bce: bool,
    /// Undo/redo journaling enabled.
    pub history_enabled: bool,
    /// Highlight matching parens on cursor movement.
    pub highlight_parens: bool,
    /// All-lowercase needles match case-insensitively.
    pub smart_case: bool,
    /// Terminal supports 24-bit color.
    pub can_24bit: bool,
    /// Terminal supports 256-color mode.
    pub can_256color: bool,
    /// Terminal supports italics.
    pub can_italic: bool,
    /// Jump to the remembered line when opening files.
    pub go_to_line: bool,
    /// Highlight the cursor line.
    pub hilight_current_line: bool,
    /// Mouse wheel shifts the view instead of moving the cursor.
    pub shift_scrolling: bool,
    /// Run git annotation on open and save.
    pub check_git: bool,
    /// Color the gutter for unsaved modified lines.
    pub color_gutter: bool,

    /// Rows kept between the cursor and the text-region edge.
    pub cursor_padding: usize,
    /// Left pane share of the terminal width, in percent.
    pub split_percent: usize,
    /// Lines moved per wheel click.
    pub scroll_amount: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            term_width: 0,
            term_height: 0,
            bottom_size: 2,
            bimrc_path: "~/.bimrc".to_string(),
            hilight_on_open: true,
            initial_file_is_read_only: false,
            can_scroll: true,
            can_hideshow: true,
            can_altscreen: true,
            can_mouse: true,
            can_unicode: true,
            can_bright: true,
            can_title: true,
            can_bce: true,
            history_enabled: true,
            highlight_parens: true,
            smart_case: true,
            can_24bit: true,
            can_256color: true,
            can_italic: true,
            go_to_line: true,
            hilight_current_line: true,
            shift_scrolling: true,
            check_git: false,
            color_gutter: true,
            cursor_padding: 4,
            split_percent: 50,
            scroll_amount: 5,
        }
    }
}

impl Config {
    /// Degrade capabilities for terminals with known quirks.
    pub fn detect_weird_terminals(&mut self) {
        let term = env::var("TERM").unwrap_or_default();
        if term == "linux" {
            // Console VTs cannot scroll.
            self.can_scroll = false;
        }
        if term == "cons25" {
            self.can_hideshow = false;
            self.can_altscreen = false;
            self.can_mouse = false;
            self.can_unicode = false;
            self.can_bright = false;
        }
        if term == "sortix" {
            // Spews title escapes to the screen.
            self.can_title = false;
        }
        if term.starts_with("tmux") {
            self.can_scroll = false;
            self.can_bce = false;
        }
        if term.starts_with("screen") {
            self.can_24bit = false;
            self.can_italic = false;
        }
        if term.starts_with("toaru-vga") {
            self.can_24bit = false;
            self.can_256color = false;
        }
    }

    /// Expand a leading `~` against `$HOME`.
    pub fn expand_home(path: &str) -> Option<PathBuf> {
        if let Some(rest) = path.strip_prefix('~') {
            let home = env::var("HOME").ok()?;
            Some(PathBuf::from(format!("{home}{rest}")))
        } else {
            Some(PathBuf::from(path))
        }
    }

    /// Load `~/.bimrc`: line-oriented `key[=value]`, `#` comments.
    ///
    /// Returns the requested theme name, if any; theme application needs
    /// the capability set, so the caller resolves it.
    pub fn load_bimrc(&mut self) -> Option<String> {
        let path = Self::expand_home(&self.bimrc_path)?;
        let content = fs::read_to_string(path).ok()?;
        let mut theme = None;
        for raw in content.lines() {
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let (key, value) = match raw.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (raw, None),
            };
            let int = |v: Option<&str>| v.and_then(|s| s.trim().parse::<i64>().ok());
            match key {
                "theme" => {
                    if let Some(v) = value {
                        theme = Some(v.trim().to_string());
                    }
                }
                "history" => self.history_enabled = int(value).unwrap_or(1) != 0,
                "padding" => {
                    if let Some(v) = int(value) {
                        self.cursor_padding = v.max(0) as usize;
                    }
                }
                "hlparen" => {
                    if let Some(v) = int(value) {
                        self.highlight_parens = v != 0;
                    }
                }
                "hlcurrent" => {
                    if let Some(v) = int(value) {
                        self.hilight_current_line = v != 0;
                    }
                }
                "splitpercent" => {
                    if let Some(v) = int(value) {
                        self.split_percent = v.clamp(1, 99) as usize;
                    }
                }
                "shiftscrolling" => self.shift_scrolling = int(value).unwrap_or(1) != 0,
                "scrollamount" => {
                    if let Some(v) = int(value) {
                        self.scroll_amount = v.max(1) as usize;
                    }
                }
                "git" => {
                    if let Some(v) = int(value) {
                        self.check_git = v != 0;
                    }
                }
                "colorgutter" => {
                    if let Some(v) = int(value) {
                        self.color_gutter = v != 0;
                    }
                }
                _ => {}
            }
        }
        theme
    }

    /// Apply a `-O` option string; `Err` carries the unrecognized name.
    pub fn apply_option(&mut self, opt: &str) -> Result<(), String> {
        match opt {
            "noaltscreen" => self.can_altscreen = false,
            "noscroll" => self.can_scroll = false,
            "nomouse" => self.can_mouse = false,
            "nounicode" => self.can_unicode = false,
            "nobright" => self.can_bright = false,
            "nohideshow" => self.can_hideshow = false,
            "nosyntax" => self.hilight_on_open = false,
            "nohistory" => self.history_enabled = false,
            "notitle" => self.can_title = false,
            "nobce" => self.can_bce = false,
            "history" => self.history_enabled = true,
            other => return Err(other.to_string()),
        }
        Ok(())
    }

    /// Height of the text region in rows.
    pub fn text_height(&self) -> usize {
        self.term_height
            .saturating_sub(self.bottom_size)
            .saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_option() {
        let mut config = Config::default();
        assert!(config.apply_option("nomouse").is_ok());
        assert!(!config.can_mouse);
        assert!(config.apply_option("history").is_ok());
        assert!(config.history_enabled);
        assert_eq!(
            config.apply_option("nosuchthing"),
            Err("nosuchthing".to_string())
        );
    }

    #[test]
    fn test_bimrc_parsing() {
        let dir = std::env::temp_dir().join(format!("bim-test-rc-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let rc = dir.join("bimrc");
        fs::write(
            &rc,
            "# comment\ntheme=wombat\npadding=2\nhistory\nscrollamount=3\ngit=1\n",
        )
        .unwrap();
        let mut config = Config {
            bimrc_path: rc.to_string_lossy().to_string(),
            ..Config::default()
        };
        let theme = config.load_bimrc();
        assert_eq!(theme.as_deref(), Some("wombat"));
        assert_eq!(config.cursor_padding, 2);
        assert!(config.history_enabled);
        assert_eq!(config.scroll_amount, 3);
        assert!(config.check_git);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_text_height() {
        let config = Config {
            term_height: 24,
            ..Config::default()
        };
        assert_eq!(config.text_height(), 21);
    }
}
