//! The line buffer model: styled cells, lines, and editable documents.

mod cell;
mod document;
mod line;

pub use cell::{codepoint_width, Cell, CellFlags, SyntaxClass};
pub use document::{Buffer, Mode};
pub use line::{Line, RevStatus};
