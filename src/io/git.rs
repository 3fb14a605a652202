//! Git change-bar annotation.
//!
//! Runs `git diff -U0` against the saved file and parses only the
//! `@@ -from[,count] +to[,count] @@` hunk headers; the counts decide how
//! affected lines are annotated: added lines green, modified lines blue, a
//! red bar above the line following a pure deletion, and the combined mark
//! where a deletion meets a modification.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::buffer::{Buffer, RevStatus};

/// One parsed hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub from_line: usize,
    pub from_count: usize,
    pub to_line: usize,
    pub to_count: usize,
}

/// Extract hunk headers from unified diff output.
pub fn parse_hunks(diff: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    for line in diff.lines() {
        let Some(rest) = line.strip_prefix("@@ -") else {
            continue;
        };
        let Some(end) = rest.find(" @@") else { continue };
        let body = &rest[..end];
        let mut halves = body.split(" +");
        let (Some(from), Some(to)) = (halves.next(), halves.next()) else {
            continue;
        };
        let parse_pair = |s: &str| -> Option<(usize, usize)> {
            match s.split_once(',') {
                Some((a, b)) => Some((a.parse().ok()?, b.parse().ok()?)),
                None => Some((s.parse().ok()?, 1)),
            }
        };
        let (Some((from_line, from_count)), Some((to_line, to_count))) =
            (parse_pair(from), parse_pair(to))
        else {
            continue;
        };
        hunks.push(Hunk {
            from_line,
            from_count,
            to_line,
            to_count,
        });
    }
    hunks
}

/// Apply hunk annotations to a buffer's gutter statuses.
pub fn apply_hunks(buf: &mut Buffer, hunks: &[Hunk]) {
    for hunk in hunks {
        let (from_count, to_line, to_count) = (hunk.from_count, hunk.to_line, hunk.to_count);
        if to_line > buf.line_count() {
            continue;
        }
        if from_count == 0 && to_count > 0 {
            // Pure insertion.
            for i in 0..to_count {
                if let Some(line) = buf.lines.get_mut(to_line + i - 1) {
                    line.rev_status = RevStatus::Added;
                }
            }
        } else if from_count > 0 && to_count == 0 {
            // Pure deletion: bar above the following line.
            if to_line >= buf.line_count() {
                continue;
            }
            buf.lines[to_line].rev_status = RevStatus::DeletedAbove;
        } else if from_count == to_count {
            for i in 0..to_count {
                if let Some(line) = buf.lines.get_mut(to_line + i - 1) {
                    line.rev_status = RevStatus::ModifiedCommitted;
                }
            }
        } else if from_count < to_count {
            // Some modified, the remainder added.
            for i in 0..from_count {
                if let Some(line) = buf.lines.get_mut(to_line + i - 1) {
                    line.rev_status = RevStatus::ModifiedCommitted;
                }
            }
            for i in from_count..to_count {
                if let Some(line) = buf.lines.get_mut(to_line + i - 1) {
                    line.rev_status = RevStatus::Added;
                }
            }
        } else if to_count > 0 {
            // Deleted some lines and modified the rest.
            buf.lines[to_line - 1].rev_status = RevStatus::ModifiedAndDeletedAbove;
            for i in 1..to_count {
                if let Some(line) = buf.lines.get_mut(to_line + i - 1) {
                    line.rev_status = RevStatus::ModifiedCommitted;
                }
            }
        }
    }
}

/// Run the diff subprocess and annotate the buffer. Modified buffers are
/// skipped (line numbers would not correspond).
pub fn examine(buf: &mut Buffer, file: &Path) -> bool {
    if buf.modified {
        return false;
    }
    let output = Command::new("git")
        .args(["--no-pager", "diff", "-U0", "--no-color", "--"])
        .arg(file)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(out) => {
            let text = String::from_utf8_lossy(&out.stdout);
            apply_hunks(buf, &parse_hunks(&text));
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Buffer, Cell, Line};

    fn buffer_of(n: usize) -> Buffer {
        let mut buf = Buffer::new(true, true);
        buf.lines.clear();
        for i in 0..n {
            buf.lines.push(Line::from_cells(
                format!("line {i}").chars().map(Cell::new).collect(),
            ));
        }
        buf
    }

    #[test]
    fn test_parse_hunk_headers() {
        let diff = "\
diff --git a/x b/x\n\
--- a/x\n\
+++ b/x\n\
@@ -3,0 +4,2 @@ context\n\
@@ -10 +11 @@\n";
        let hunks = parse_hunks(diff);
        assert_eq!(
            hunks,
            vec![
                Hunk {
                    from_line: 3,
                    from_count: 0,
                    to_line: 4,
                    to_count: 2
                },
                Hunk {
                    from_line: 10,
                    from_count: 1,
                    to_line: 11,
                    to_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_added_lines_green() {
        let mut buf = buffer_of(6);
        apply_hunks(
            &mut buf,
            &[Hunk {
                from_line: 3,
                from_count: 0,
                to_line: 4,
                to_count: 2,
            }],
        );
        assert_eq!(buf.lines[3].rev_status, RevStatus::Added);
        assert_eq!(buf.lines[4].rev_status, RevStatus::Added);
        assert_eq!(buf.lines[5].rev_status, RevStatus::Unchanged);
    }

    #[test]
    fn test_deletion_marks_next_line() {
        let mut buf = buffer_of(5);
        apply_hunks(
            &mut buf,
            &[Hunk {
                from_line: 2,
                from_count: 2,
                to_line: 1,
                to_count: 0,
            }],
        );
        assert_eq!(buf.lines[1].rev_status, RevStatus::DeletedAbove);
    }

    #[test]
    fn test_modified_lines_blue() {
        let mut buf = buffer_of(4);
        apply_hunks(
            &mut buf,
            &[Hunk {
                from_line: 2,
                from_count: 2,
                to_line: 2,
                to_count: 2,
            }],
        );
        assert_eq!(buf.lines[1].rev_status, RevStatus::ModifiedCommitted);
        assert_eq!(buf.lines[2].rev_status, RevStatus::ModifiedCommitted);
    }

    #[test]
    fn test_delete_plus_modify_combines() {
        let mut buf = buffer_of(4);
        apply_hunks(
            &mut buf,
            &[Hunk {
                from_line: 2,
                from_count: 3,
                to_line: 2,
                to_count: 1,
            }],
        );
        assert_eq!(
            buf.lines[1].rev_status,
            RevStatus::ModifiedAndDeletedAbove
        );
    }
}
