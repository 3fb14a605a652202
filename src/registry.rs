//! Buffer registry and split layout.
//!
//! The registry owns every open buffer; the two split slots are indices
//! into it. At most two side-by-side views exist: two distinct buffers, or
//! one buffer shown twice with independently parked viewport offsets.

use crate::buffer::Buffer;

/// Ordered buffer list plus the active index and split slots.
#[derive(Debug, Default)]
pub struct Registry {
    buffers: Vec<Buffer>,
    active: usize,
    /// Left pane buffer index, when split.
    pub left: Option<usize>,
    /// Right pane buffer index, when split.
    pub right: Option<usize>,
    /// Parked viewport offset for the inactive left view of a self-split.
    pub view_left_offset: usize,
    /// Parked viewport offset for the inactive right view of a self-split.
    pub view_right_offset: usize,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no buffers remain.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Index of the active buffer.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active buffer.
    pub fn active(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    /// The active buffer, mutably.
    pub fn active_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.active]
    }

    /// A buffer by index.
    pub fn get(&self, idx: usize) -> &Buffer {
        &self.buffers[idx]
    }

    /// A buffer by index, mutably.
    pub fn get_mut(&mut self, idx: usize) -> &mut Buffer {
        &mut self.buffers[idx]
    }

    /// Iterate buffers in tab order.
    pub fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter()
    }

    /// Append a buffer and make it active. Opening a new buffer collapses
    /// any split back to full width.
    pub fn push_active(&mut self, mut buffer: Buffer, term_width: usize) {
        if self.left.is_some() {
            for b in &mut self.buffers {
                b.left = 0;
                b.width = term_width;
            }
            self.left = None;
            self.right = None;
        }
        buffer.left = 0;
        buffer.width = term_width;
        self.buffers.push(buffer);
        self.active = self.buffers.len() - 1;
    }

    /// Switch the active buffer by index.
    pub fn set_active(&mut self, idx: usize) {
        if idx < self.buffers.len() {
            self.active = idx;
        }
    }

    /// Make the previous tab active, wrapping.
    pub fn previous_tab(&mut self) {
        if self.active == 0 {
            self.active = self.buffers.len() - 1;
        } else {
            self.active -= 1;
        }
    }

    /// Make the next tab active, wrapping.
    pub fn next_tab(&mut self) {
        self.active = (self.active + 1) % self.buffers.len();
    }

    /// Close a buffer by index, returning it for teardown bookkeeping.
    ///
    /// The new active buffer prefers the same index (the buffer that moved
    /// up), falling back to the new last when the last one closed. Split
    /// slots collapse. Returns `None` from the registry's point of view
    /// when no buffers remain and the editor should exit.
    pub fn close(&mut self, idx: usize, term_width: usize) -> (Buffer, bool) {
        let closed = self.buffers.remove(idx);

        // Collapse any split; index-based slots do not survive removal.
        if self.left.is_some() || self.right.is_some() {
            for b in &mut self.buffers {
                b.left = 0;
                b.width = term_width;
            }
            self.left = None;
            self.right = None;
        }

        if self.buffers.is_empty() {
            return (closed, false);
        }
        if idx >= self.buffers.len() {
            self.active = self.buffers.len() - 1;
        } else {
            self.active = idx;
        }
        (closed, true)
    }

    /// Whether the layout is a self-split (one buffer, two viewports).
    pub fn self_split(&self) -> bool {
        self.left.is_some() && self.left == self.right
    }

    /// Recompute pane geometry after a resize or `splitpercent` change.
    pub fn update_split_size(&mut self, term_width: usize, split_percent: usize) {
        let Some(left) = self.left else { return };
        let split = term_width * split_percent / 100;
        if self.self_split() {
            let buf = &mut self.buffers[left];
            if buf.left == 0 {
                buf.width = split;
            } else {
                buf.left = split;
                buf.width = term_width - split;
            }
            return;
        }
        let Some(right) = self.right else { return };
        self.buffers[left].left = 0;
        self.buffers[left].width = split;
        self.buffers[right].left = split;
        self.buffers[right].width = term_width - split;
    }

    /// Dissolve the split, restoring full-width panes.
    pub fn unsplit(&mut self, term_width: usize) {
        if let Some(i) = self.left.take() {
            self.buffers[i].left = 0;
            self.buffers[i].width = term_width;
        }
        if let Some(i) = self.right.take() {
            self.buffers[i].left = 0;
            self.buffers[i].width = term_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_of(n: usize) -> Registry {
        let mut registry = Registry::new();
        for _ in 0..n {
            registry.push_active(Buffer::new(true, true), 80);
        }
        registry
    }

    #[test]
    fn test_close_prefers_same_index() {
        let mut registry = registry_of(3);
        registry.set_active(1);
        let (_, alive) = registry.close(1, 80);
        assert!(alive);
        assert_eq!(registry.active_index(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_close_last_picks_new_last() {
        let mut registry = registry_of(3);
        registry.set_active(2);
        let (_, alive) = registry.close(2, 80);
        assert!(alive);
        assert_eq!(registry.active_index(), 1);
    }

    #[test]
    fn test_close_final_buffer_signals_exit() {
        let mut registry = registry_of(1);
        let (_, alive) = registry.close(0, 80);
        assert!(!alive);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_tab_wrapping() {
        let mut registry = registry_of(3);
        registry.set_active(2);
        registry.next_tab();
        assert_eq!(registry.active_index(), 0);
        registry.previous_tab();
        assert_eq!(registry.active_index(), 2);
    }

    #[test]
    fn test_split_geometry() {
        let mut registry = registry_of(2);
        registry.left = Some(0);
        registry.right = Some(1);
        registry.update_split_size(100, 50);
        assert_eq!(registry.get(0).left, 0);
        assert_eq!(registry.get(0).width, 50);
        assert_eq!(registry.get(1).left, 50);
        assert_eq!(registry.get(1).width, 50);
        registry.unsplit(100);
        assert_eq!(registry.get(1).left, 0);
        assert_eq!(registry.get(1).width, 100);
    }

    #[test]
    fn test_self_split_geometry() {
        let mut registry = registry_of(1);
        registry.left = Some(0);
        registry.right = Some(0);
        assert!(registry.self_split());
        registry.update_split_size(100, 40);
        assert_eq!(registry.get(0).width, 40);
    }
}
