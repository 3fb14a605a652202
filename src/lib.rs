//! # bim
//!
//! A terminal-based modal text editor in the vi family.
//!
//! The crate is organized leaves-first:
//!
//! - **buffer**: styled code-point cells, lines, and the editable document
//!   with its mutation primitives
//! - **history**: the undo/redo journal of fine-grained edits grouped into
//!   transactions
//! - **syntax**: restartable line-oriented highlighters for a closed set of
//!   languages
//! - **registry**: the ordered buffer list and the two-pane split layout
//! - **terminal** / **input**: escape emission through a single buffered
//!   writer, and byte-level keyboard decoding fed by a reader thread
//! - **editor**: the context structure tying everything together, with the
//!   mode handlers, renderer, command interpreter, and search engine
//! - **io**: file load/save, the cursor-position cache, and the git diff
//!   consumer

pub mod buffer;
pub mod config;
pub mod editor;
pub mod history;
pub mod input;
pub mod io;
pub mod registry;
pub mod syntax;
pub mod terminal;
pub mod theme;

pub use buffer::{Buffer, Cell, CellFlags, Line, Mode, RevStatus, SyntaxClass};
pub use config::Config;
pub use editor::Editor;
pub use history::{History, Record};
pub use registry::Registry;
pub use syntax::Syntax;
pub use terminal::Terminal;
pub use theme::Theme;
