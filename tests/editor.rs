//! End-to-end scenarios: a headless editor driven by scripted key bytes,
//! rendering into memory.

use bim::buffer::{Cell, Line, SyntaxClass};
use bim::config::Config;
use bim::editor::Editor;
use bim::input::KeySource;
use bim::syntax::Syntax;
use bim::terminal::Terminal;
use bim::theme::Theme;

fn editor_with(lines: &[&str], script: &[u8]) -> Editor {
    let mut config = Config::default();
    config.term_width = 80;
    config.term_height = 24;
    let theme = Theme::ansi(&config);
    let term = Terminal::with_sink(&config, Box::new(Vec::new()));
    let input = KeySource::from_bytes(script);
    let mut editor = Editor::with_parts(config, theme, term, input);
    let mut buffer = editor.new_buffer();
    if !lines.is_empty() {
        buffer.lines.clear();
        for text in lines {
            buffer
                .lines
                .push(Line::from_cells(text.chars().map(Cell::new).collect()));
        }
    }
    editor.registry.push_active(buffer, 80);
    editor
}

fn texts(editor: &Editor) -> Vec<String> {
    editor.buf().lines.iter().map(|l| l.to_text()).collect()
}

#[test]
fn test_insert_then_undo_leaves_empty_buffer() {
    let mut editor = editor_with(&[], b"ihello\x1bu");
    editor.normal_mode();
    assert_eq!(editor.buf().line_count(), 1);
    assert!(editor.buf().lines[0].is_empty());
    assert!(!editor.buf().modified);
    assert!(!editor.buf().history.can_undo());
}

#[test]
fn test_insert_survives_round_trip() {
    let mut editor = editor_with(&[], b"ihello\x1b");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["hello"]);
    assert!(editor.buf().modified);
    // Cursor clamped back into normal-mode range.
    assert_eq!(editor.buf().col_no, 5);
}

#[test]
fn test_line_yank_paste() {
    let mut editor = editor_with(&["A", "B", "C"], b"jVjyGp");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["A", "B", "C", "B", "C"]);
    assert_eq!(editor.buf().line_no, 4);
}

#[test]
fn test_substitute_via_command_mode() {
    let mut editor = editor_with(&["Hello hello HELLO"], b":s/hello/hi/g\r");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["Hello hi HELLO"]);
    let mut editor = editor_with(&["Hello hi HELLO"], b":%s/HELLO/bye/g\r");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["Hello hi bye"]);
}

#[test]
fn test_markdown_embedded_c() {
    let mut editor = editor_with(&["```c", "int x = 0x1F;", "```"], b"");
    editor.buf_mut().syntax = Some(Syntax::Markdown);
    editor.buf_mut().full_recalculate();
    let buf = editor.buf();
    // Fence backticks paint as strings.
    assert_eq!(buf.lines[0].cells()[0].flags().class(), SyntaxClass::String);
    assert_eq!(buf.lines[2].cells()[0].flags().class(), SyntaxClass::String);
    // The embedded C line gets real C classes.
    let mid = &buf.lines[1];
    assert_eq!(mid.cells()[0].flags().class(), SyntaxClass::Type);
    assert_eq!(mid.cells()[8].flags().class(), SyntaxClass::Numeral);
    assert_eq!(mid.cells()[11].flags().class(), SyntaxClass::Numeral);
}

#[test]
fn test_split_view_viewports_are_independent() {
    let mut editor = editor_with(
        &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"],
        b"",
    );
    editor.process_command("split");
    assert!(editor.registry.self_split());
    // Scroll the left view, then focus the right pane.
    editor.buf_mut().offset = 3;
    editor.use_right_buffer();
    assert_eq!(editor.registry.view_left_offset, 3);
    // The right viewport starts unscrolled and scrolls independently.
    assert_eq!(editor.buf().offset, 0);
    editor.buf_mut().offset = 6;
    editor.use_left_buffer();
    assert_eq!(editor.registry.view_right_offset, 6);
    assert_eq!(editor.buf().offset, 3);
}

#[test]
fn test_undo_across_line_merge() {
    // Backspace in insert mode at the start of line 2 merges the lines and
    // lands the cursor after "foo"; undo restores both lines.
    let mut editor = editor_with(&["foo", "bar"], b"ji\x7f\x1bu");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["foo", "bar"]);
    assert_eq!(editor.buf().line_no, 2);
    assert_eq!(editor.buf().col_no, 1);
}

#[test]
fn test_insert_backspace_merges_lines() {
    let mut editor = editor_with(&["foo", "bar"], b"ji\x7f\x1b");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["foobar"]);
    assert_eq!(editor.buf().col_no, 4);
}

#[test]
fn test_backspace_in_normal_mode_merges_nothing() {
    let mut editor = editor_with(&["foo", "bar"], b"j\x7f");
    editor.normal_mode();
    // In normal mode backspace at column 1 only moves up.
    assert_eq!(texts(&editor), vec!["foo", "bar"]);
    assert_eq!(editor.buf().line_no, 1);
}

#[test]
fn test_char_selection_delete() {
    // Select "ell" and delete it.
    let mut editor = editor_with(&["hello"], b"lvlld");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["ho"]);
}

#[test]
fn test_replace_mode_overwrites() {
    let mut editor = editor_with(&["abcd"], b"RXY\x1b");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["XYcd"]);
}

#[test]
fn test_replace_single_char() {
    let mut editor = editor_with(&["abc"], b"rZ");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["Zbc"]);
}

#[test]
fn test_line_selection_indent() {
    let mut editor = editor_with(&["a", "b"], b"Vj\t");
    editor.normal_mode();
    assert_eq!(texts(&editor), vec!["\ta", "\tb"]);
}

#[test]
fn test_invariants_after_scripted_session() {
    let mut editor = editor_with(
        &["fn main() {", "    body();", "}"],
        b"joinserted\x1bVyGpui0\x1b",
    );
    editor.normal_mode();
    let buf = editor.buf();
    assert!(buf.line_count() >= 1);
    assert!(buf.line_no >= 1 && buf.line_no <= buf.line_count());
    assert!(buf.col_no >= 1);
    assert!(buf.col_no <= buf.current_line().len().max(1));
}

#[test]
fn test_search_via_slash() {
    let mut editor = editor_with(&["alpha", "beta", "alpha beta"], b"/beta\r");
    editor.normal_mode();
    assert_eq!(editor.buf().line_no, 2);
    assert_eq!(editor.buf().col_no, 1);
    assert_eq!(
        editor.buf().search.as_deref(),
        Some(&"beta".chars().collect::<Vec<_>>()[..])
    );
}

#[test]
fn test_search_escape_restores_cursor() {
    let mut editor = editor_with(&["alpha", "beta"], b"/beta\x1b");
    editor.normal_mode();
    assert_eq!(editor.buf().line_no, 1);
    assert_eq!(editor.buf().col_no, 1);
    assert!(editor.buf().search.is_none());
}

#[test]
fn test_goto_line_via_command() {
    let mut editor = editor_with(&["a", "b", "c", "d", "e"], b":4\r");
    editor.normal_mode();
    assert_eq!(editor.buf().line_no, 4);
}

#[test]
fn test_paren_match_scales() {
    // A deep but single-line nest plus many lines in between must not
    // recurse; the scan is iterative.
    let mut lines: Vec<String> = vec!["{".to_string()];
    for _ in 0..10_000 {
        lines.push("x".to_string());
    }
    lines.push("}".to_string());
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let mut editor = editor_with(&refs, b"");
    editor.buf_mut().col_no = 1;
    let matched = editor.find_matching_paren(1);
    assert_eq!(matched, Some((10_002, 1)));
}
