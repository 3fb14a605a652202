//! Terminal control: raw mode, escape emission, and signal flags.
//!
//! All escape sequences funnel through one [`OutputBuffer`] owned by the
//! [`Terminal`], flushed once per redraw batch.

mod output;

pub use output::OutputBuffer;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::terminal as ct;

use crate::config::Config;

static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);
static SIGTSTP_RECEIVED: AtomicBool = AtomicBool::new(false);
static SIGCONT_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigwinch(_: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

extern "C" fn on_sigtstp(_: libc::c_int) {
    SIGTSTP_RECEIVED.store(true, Ordering::Relaxed);
}

extern "C" fn on_sigcont(_: libc::c_int) {
    SIGCONT_RECEIVED.store(true, Ordering::Relaxed);
}

/// Install the resize/suspend/continue handlers. They only set flags; the
/// editor consumes them between input events.
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGWINCH, on_sigwinch as libc::sighandler_t);
        libc::signal(libc::SIGTSTP, on_sigtstp as libc::sighandler_t);
        libc::signal(libc::SIGCONT, on_sigcont as libc::sighandler_t);
    }
}

/// Consume the pending-resize flag.
pub fn take_sigwinch() -> bool {
    SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed)
}

/// Consume the pending-suspend flag.
pub fn take_sigtstp() -> bool {
    SIGTSTP_RECEIVED.swap(false, Ordering::Relaxed)
}

/// Consume the pending-continue flag.
pub fn take_sigcont() -> bool {
    SIGCONT_RECEIVED.swap(false, Ordering::Relaxed)
}

/// Re-raise SIGTSTP with the default disposition (actual suspension).
pub fn suspend_self() {
    unsafe {
        libc::signal(libc::SIGTSTP, libc::SIG_DFL);
        libc::raise(libc::SIGTSTP);
        // Execution resumes here after SIGCONT.
        libc::signal(libc::SIGTSTP, on_sigtstp as libc::sighandler_t);
    }
}

/// Current terminal size as (columns, rows).
pub fn screen_size() -> (usize, usize) {
    match ct::size() {
        Ok((w, h)) => (w as usize, h as usize),
        Err(_) => (80, 24),
    }
}

/// Capability snapshot the escape emitters consult.
#[derive(Debug, Clone, Copy)]
struct Caps {
    hideshow: bool,
    altscreen: bool,
    mouse: bool,
    bce: bool,
    title: bool,
}

/// The terminal: an output buffer, its sink, and the capability snapshot.
pub struct Terminal {
    out: OutputBuffer,
    sink: Box<dyn Write + Send>,
    caps: Caps,
    raw: bool,
}

impl Terminal {
    /// Attach to the real terminal: raw mode, alternate screen, mouse.
    pub fn attach(config: &Config) -> io::Result<Self> {
        ct::enable_raw_mode()?;
        let mut term = Self {
            out: OutputBuffer::new(),
            sink: Box::new(io::stdout()),
            caps: Caps {
                hideshow: config.can_hideshow,
                altscreen: config.can_altscreen,
                mouse: config.can_mouse,
                bce: config.can_bce,
                title: config.can_title,
            },
            raw: true,
        };
        term.set_alternate_screen();
        term.mouse_enable();
        term.flush()?;
        Ok(term)
    }

    /// A headless terminal writing into memory (tests, `-c` dumps go to a
    /// real stdout sink but skip raw mode).
    pub fn with_sink(config: &Config, sink: Box<dyn Write + Send>) -> Self {
        Self {
            out: OutputBuffer::new(),
            sink,
            caps: Caps {
                hideshow: config.can_hideshow,
                altscreen: config.can_altscreen,
                mouse: config.can_mouse,
                bce: config.can_bce,
                title: config.can_title,
            },
            raw: false,
        }
    }

    /// Flush everything accumulated so far.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush_to(&mut self.sink)
    }

    /// Direct access to the output buffer for text content.
    pub fn out(&mut self) -> &mut OutputBuffer {
        &mut self.out
    }

    /// Move the terminal cursor (1-based coordinates).
    pub fn place_cursor(&mut self, x: usize, y: usize) {
        self.out.write_fmt(format_args!("\x1b[{y};{x}H"));
    }

    /// Emit one themed color pair.
    ///
    /// `@N` colors translate to the classic 3x/4x (9x/10x for bright)
    /// parameters; anything else is a raw parameter tail.
    pub fn set_colors(&mut self, fg: &str, bg: &str) {
        self.out.write_str("\x1b[22;23;24;");
        if let Some(idx) = bg.strip_prefix('@') {
            let n: usize = idx.parse().unwrap_or(0);
            if n < 10 {
                self.out.write_fmt(format_args!("4{n};"));
            } else {
                self.out.write_fmt(format_args!("10{};", n - 10));
            }
        } else {
            self.out.write_fmt(format_args!("48;{bg};"));
        }
        if let Some(idx) = fg.strip_prefix('@') {
            let n: usize = idx.parse().unwrap_or(0);
            if n < 10 {
                self.out.write_fmt(format_args!("3{n}m"));
            } else {
                self.out.write_fmt(format_args!("9{}m", n - 10));
            }
        } else {
            self.out.write_fmt(format_args!("38;{fg}m"));
        }
    }

    /// Emit just the foreground color.
    pub fn set_fg_color(&mut self, fg: &str) {
        self.out.write_str("\x1b[22;23;24;");
        if let Some(idx) = fg.strip_prefix('@') {
            let n: usize = idx.parse().unwrap_or(0);
            if n < 10 {
                self.out.write_fmt(format_args!("3{n}m"));
            } else {
                self.out.write_fmt(format_args!("9{}m", n - 10));
            }
        } else {
            self.out.write_fmt(format_args!("38;{fg}m"));
        }
    }

    /// Erase to end of line, when background color erase is available.
    pub fn clear_to_end(&mut self) {
        if self.caps.bce {
            self.out.write_str("\x1b[K");
        }
    }

    /// Whether the terminal erases with the current background color.
    pub fn can_bce(&self) -> bool {
        self.caps.bce
    }

    /// For terminals without BCE: pre-paint a full line of background.
    pub fn paint_line(&mut self, fg: &str, bg: &str, width: usize) {
        if !self.caps.bce {
            self.set_colors(fg, bg);
            for _ in 0..width {
                self.out.write_char(' ');
            }
            self.out.write_char('\r');
        }
    }

    /// Enable bold.
    pub fn set_bold(&mut self) {
        self.out.write_str("\x1b[1m");
    }

    /// Disable bold.
    pub fn unset_bold(&mut self) {
        self.out.write_str("\x1b[22m");
    }

    /// Enable underline.
    pub fn set_underline(&mut self) {
        self.out.write_str("\x1b[4m");
    }

    /// Disable underline.
    pub fn unset_underline(&mut self) {
        self.out.write_str("\x1b[24m");
    }

    /// Reset all attributes.
    pub fn reset(&mut self) {
        self.out.write_str("\x1b[0m");
    }

    /// Clear the whole screen and home the cursor.
    pub fn clear_screen(&mut self) {
        self.out.write_str("\x1b[H\x1b[2J");
    }

    /// Hide the cursor while drawing.
    pub fn hide_cursor(&mut self) {
        if self.caps.hideshow {
            self.out.write_str("\x1b[?25l");
        }
    }

    /// Show the cursor again.
    pub fn show_cursor(&mut self) {
        if self.caps.hideshow {
            self.out.write_str("\x1b[?25h");
        }
    }

    /// Request classic X10 mouse reporting.
    pub fn mouse_enable(&mut self) {
        if self.caps.mouse {
            self.out.write_str("\x1b[?1000h");
        }
    }

    /// Stop mouse reporting.
    pub fn mouse_disable(&mut self) {
        if self.caps.mouse {
            self.out.write_str("\x1b[?1000l");
        }
    }

    /// Scroll the screen contents up one line.
    pub fn shift_up(&mut self) {
        self.out.write_str("\x1b[1S");
    }

    /// Scroll the screen contents down one line.
    pub fn shift_down(&mut self) {
        self.out.write_str("\x1b[1T");
    }

    /// Switch to the alternate screen.
    pub fn set_alternate_screen(&mut self) {
        if self.caps.altscreen {
            self.out.write_str("\x1b[?1049h");
        }
    }

    /// Restore the standard screen.
    pub fn unset_alternate_screen(&mut self) {
        if self.caps.altscreen {
            self.out.write_str("\x1b[?1049l");
        }
    }

    /// Save the cursor position (DEC).
    pub fn save_cursor(&mut self) {
        self.out.write_str("\x1b7");
    }

    /// Restore the saved cursor position (DEC).
    pub fn restore_cursor(&mut self) {
        self.out.write_str("\x1b8");
    }

    /// Update the terminal title.
    pub fn update_title(&mut self, title: &str) {
        if !self.caps.title {
            return;
        }
        for i in 1..3 {
            self.out
                .write_fmt(format_args!("\x1b]{i};{title}\x07"));
        }
    }

    /// Leave raw mode temporarily (shelling out, suspension).
    pub fn set_buffered(&mut self) {
        if self.raw {
            let _ = ct::disable_raw_mode();
        }
    }

    /// Return to raw mode.
    pub fn set_unbuffered(&mut self) {
        if self.raw {
            let _ = ct::enable_raw_mode();
        }
    }

    /// Restore the terminal completely: cooked mode, standard screen,
    /// visible cursor. Safe to call more than once.
    pub fn restore(&mut self) {
        self.mouse_disable();
        self.reset();
        self.clear_screen();
        self.show_cursor();
        self.unset_alternate_screen();
        let _ = self.flush();
        if self.raw {
            let _ = ct::disable_raw_mode();
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        // Best effort; never propagate restore errors on exit.
        if self.raw {
            let _ = ct::disable_raw_mode();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless() -> Terminal {
        Terminal::with_sink(&Config::default(), Box::new(Vec::new()))
    }

    #[test]
    fn test_ansi_index_colors() {
        let mut term = headless();
        term.set_colors("@17", "@9");
        assert_eq!(term.out().as_bytes(), b"\x1b[22;23;24;109;97m");
    }

    #[test]
    fn test_parameter_tail_colors() {
        let mut term = headless();
        term.set_colors("5;230", "2;31;31;31");
        assert_eq!(
            term.out().as_bytes(),
            b"\x1b[22;23;24;48;2;31;31;31;38;5;230m"
        );
    }

    #[test]
    fn test_low_index_colors() {
        let mut term = headless();
        term.set_fg_color("@7");
        assert_eq!(term.out().as_bytes(), b"\x1b[22;23;24;37m");
    }
}
