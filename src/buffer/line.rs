//! Line: a mutable sequence of cells with inherited lexer state.

use super::cell::Cell;

/// Revision status painted into the gutter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevStatus {
    /// Line matches the saved file.
    #[default]
    Unchanged,
    /// Line was added since the last commit.
    Added,
    /// Line was modified and not yet saved.
    ModifiedUnsaved,
    /// Line was modified relative to the last commit.
    ModifiedCommitted,
    /// One or more lines were deleted immediately above this line.
    DeletedAbove,
    /// Modified line that also follows a deletion.
    ModifiedAndDeletedAbove,
}

/// One line of buffer text.
///
/// `istate` is the lexer state inherited at the start of the line (0 = clean);
/// the syntax engine keeps the invariant that re-lexing line `i` from
/// `lines[i].istate` terminates in `lines[i+1].istate`.
#[derive(Debug, Clone, Default)]
pub struct Line {
    cells: Vec<Cell>,
    /// Lexer state inherited at the start of this line.
    pub istate: i32,
    /// Whether this is the cursor line (drives current-line highlight).
    pub is_current: bool,
    /// Gutter annotation.
    pub rev_status: RevStatus,
}

impl Line {
    /// An empty line.
    pub fn new() -> Self {
        Self {
            cells: Vec::with_capacity(8),
            istate: 0,
            is_current: false,
            rev_status: RevStatus::Unchanged,
        }
    }

    /// Build a line from existing cells (paste, history replay).
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            istate: 0,
            is_current: false,
            rev_status: RevStatus::Unchanged,
        }
    }

    /// Number of cells in the line.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the line has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cells.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access to the cells.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Code point at `idx`, or `None` past the end.
    #[inline]
    pub fn codepoint_at(&self, idx: usize) -> Option<char> {
        self.cells.get(idx).map(Cell::codepoint)
    }

    /// Insert a cell at `offset` (0 ..= len).
    pub fn insert_cell(&mut self, offset: usize, cell: Cell) {
        debug_assert!(offset <= self.cells.len());
        self.cells.insert(offset, cell);
    }

    /// Remove the cell *before* `offset` (backspace semantics).
    ///
    /// `offset == 0` is a no-op; `offset == len` removes the final cell.
    pub fn delete_cell(&mut self, offset: usize) {
        if offset == 0 || offset > self.cells.len() {
            return;
        }
        self.cells.remove(offset - 1);
    }

    /// Overwrite the cell at `offset`.
    pub fn replace_cell(&mut self, offset: usize, cell: Cell) {
        self.cells[offset] = cell;
    }

    /// Append the cells of `other` (line merge).
    pub fn extend_from(&mut self, other: &Line) {
        self.cells.extend_from_slice(&other.cells);
    }

    /// Split off the tail starting at `col`, leaving `[0, col)` behind.
    pub fn split_off(&mut self, col: usize) -> Vec<Cell> {
        self.cells.split_off(col)
    }

    /// Replace contents with a clone of `cells`.
    pub fn clone_from_cells(&mut self, cells: &[Cell]) {
        self.cells.clear();
        self.cells.extend_from_slice(cells);
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// A snapshot of the cells (history records, yanks).
    pub fn snapshot(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    /// The line's text as a `String` (tests, title bars).
    pub fn to_text(&self) -> String {
        self.cells.iter().map(|c| c.codepoint()).collect()
    }

    /// Recompute tab cell widths against a tabstop.
    ///
    /// Width of a tab depends on the display column it starts in, so a full
    /// left-to-right pass is required.
    pub fn recalculate_tabs(&mut self, tabstop: usize) {
        let mut col = 0usize;
        for cell in &mut self.cells {
            if cell.codepoint() == '\t' {
                cell.set_display_width((tabstop - (col % tabstop)) as u8);
            }
            col += cell.display_width() as usize;
        }
    }

    /// Whether the line contains only spaces and tabs (or nothing).
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.codepoint() == ' ' || c.codepoint() == '\t')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of(text: &str) -> Line {
        Line::from_cells(text.chars().map(Cell::new).collect())
    }

    #[test]
    fn test_insert_at_both_ends() {
        let mut line = line_of("bc");
        line.insert_cell(0, Cell::new('a'));
        line.insert_cell(3, Cell::new('d'));
        assert_eq!(line.to_text(), "abcd");
    }

    #[test]
    fn test_delete_before_offset() {
        let mut line = line_of("abc");
        line.delete_cell(2);
        assert_eq!(line.to_text(), "ac");
    }

    #[test]
    fn test_delete_at_zero_is_noop() {
        let mut line = line_of("abc");
        line.delete_cell(0);
        assert_eq!(line.to_text(), "abc");
    }

    #[test]
    fn test_delete_final_cell() {
        let mut line = line_of("abc");
        line.delete_cell(3);
        assert_eq!(line.to_text(), "ab");
    }

    #[test]
    fn test_split_and_merge_round_trip() {
        let mut line = line_of("hello world");
        let tail = line.split_off(5);
        assert_eq!(line.to_text(), "hello");
        let mut other = Line::from_cells(tail);
        assert_eq!(other.to_text(), " world");
        line.extend_from(&other);
        other.clear();
        assert_eq!(line.to_text(), "hello world");
    }

    #[test]
    fn test_tab_widths() {
        let mut line = line_of("\ta\tb");
        line.recalculate_tabs(4);
        let widths: Vec<u8> = line.cells().iter().map(Cell::display_width).collect();
        assert_eq!(widths, vec![4, 1, 3, 1]);
    }

    #[test]
    fn test_blank() {
        assert!(line_of(" \t ").is_blank());
        assert!(line_of("").is_blank());
        assert!(!line_of(" x").is_blank());
    }
}
