//! C and C++ highlighting.
//!
//! State 1 is an open block comment, state 2 an unclosed preprocessor
//! statement (line ending in `\`).

use super::{c_keyword_qualifier, is_digit, is_space, SyntaxState};
use crate::buffer::SyntaxClass;

const KEYWORDS: &[&str] = &[
    "while", "if", "for", "continue", "return", "break", "switch", "case", "sizeof", "struct",
    "union", "typedef", "do", "default", "else", "goto", "alignas", "alignof", "offsetof", "asm",
    "__asm__", "public", "private", "class", "using", "namespace", "virtual", "override",
    "protected", "template", "typename", "static_cast", "throw",
];

const TYPES: &[&str] = &[
    "static", "int", "char", "short", "float", "double", "void", "unsigned", "volatile", "const",
    "register", "long", "inline", "restrict", "enum", "auto", "extern", "bool", "complex",
    "uint8_t", "uint16_t", "uint32_t", "uint64_t", "int8_t", "int16_t", "int32_t", "int64_t",
    "FILE", "ssize_t", "size_t", "uintptr_t", "intptr_t", "__volatile__", "constexpr",
];

const SPECIAL: &[&str] = &[
    "NULL",
    "stdin",
    "stdout",
    "stderr",
    "STDIN_FILENO",
    "STDOUT_FILENO",
    "STDERR_FILENO",
];

/// Paint a preprocessor statement; strings and character literals keep their
/// own classes. Returns 2 when the statement continues on the next line.
fn paint_pragma(state: &mut SyntaxState) -> i32 {
    while state.i < state.line.len() {
        if state.charat() == '"' as i32 {
            state.paint_c_string();
        } else if state.charat() == '\'' as i32 {
            state.paint_c_char();
        } else if state.charat() == '\\' as i32 && state.i == state.line.len() - 1 {
            state.paint(1, SyntaxClass::Pragma);
            return 2;
        } else if state.find_keywords(KEYWORDS, SyntaxClass::Keyword, c_keyword_qualifier)
            || state.find_keywords(TYPES, SyntaxClass::Type, c_keyword_qualifier)
        {
            continue;
        } else {
            state.paint(1, SyntaxClass::Pragma);
        }
    }
    0
}

pub fn calculate(state: &mut SyntaxState) -> i32 {
    match state.state {
        -1 | 0 => {
            if state.charat() == '#' as i32 {
                // Must be the first thing on the line, spaces allowed.
                for k in 0..state.i {
                    if !is_space(state.line.codepoint_at(k).map_or(-1, |c| c as i32)) {
                        state.skip();
                        return 0;
                    }
                }
                state.paint(1, SyntaxClass::Pragma);
                while state.charat() == ' ' as i32 {
                    state.paint(1, SyntaxClass::Pragma);
                }
                if state.match_and_paint("include", SyntaxClass::Pragma, c_keyword_qualifier) {
                    // Angle-bracket includes paint like strings.
                    while state.charat() == ' ' as i32 {
                        state.paint(1, SyntaxClass::Pragma);
                    }
                    if state.charat() == '<' as i32 {
                        state.paint(1, SyntaxClass::String);
                        while state.charat() != '>' as i32 && state.i < state.line.len() {
                            state.paint(1, SyntaxClass::String);
                        }
                        if state.charat() != -1 {
                            state.paint(1, SyntaxClass::String);
                        }
                    }
                } else if state.match_and_paint("if", SyntaxClass::Pragma, c_keyword_qualifier)
                    || state.match_and_paint("else", SyntaxClass::Pragma, c_keyword_qualifier)
                {
                    // Keep #if / #else out of the keyword class.
                }
                return paint_pragma(state);
            } else if state.charat() == '/' as i32 && state.nextchar() == '/' as i32 {
                state.paint_comment();
            } else if state.charat() == '/' as i32 && state.nextchar() == '*' as i32 {
                if state.paint_c_comment() == 1 {
                    return 1;
                }
                return 0;
            } else if state.find_keywords(KEYWORDS, SyntaxClass::Keyword, c_keyword_qualifier) {
                return 0;
            } else if state.find_keywords(TYPES, SyntaxClass::Type, c_keyword_qualifier) {
                return 0;
            } else if state.find_keywords(SPECIAL, SyntaxClass::Numeral, c_keyword_qualifier) {
                return 0;
            } else if state.charat() == '"' as i32 {
                state.paint_c_string();
                return 0;
            } else if state.charat() == '\'' as i32 {
                state.paint_c_char();
                return 0;
            } else if !c_keyword_qualifier(state.lastchar()) && is_digit(state.charat()) {
                state.paint_c_numeral();
                return 0;
            } else if state.charat() != -1 {
                state.skip();
                return 0;
            }
            -1
        }
        1 => {
            if state.paint_c_comment() == 1 {
                return 1;
            }
            0
        }
        2 => paint_pragma(state),
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{class_at, line_of};
    use super::*;
    use crate::syntax::Syntax;

    #[test]
    fn test_keywords_and_types() {
        let mut line = line_of("int x = 0x1F;");
        let end = Syntax::C.lex_line(&mut line, 0, 0);
        assert_eq!(end, -1);
        assert_eq!(class_at(&line, 0), SyntaxClass::Type);
        assert_eq!(class_at(&line, 4), SyntaxClass::None);
        assert_eq!(class_at(&line, 8), SyntaxClass::Numeral);
        assert_eq!(class_at(&line, 11), SyntaxClass::Numeral);
    }

    #[test]
    fn test_block_comment_continuation() {
        let mut line = line_of("int a; /* open");
        assert_eq!(Syntax::C.lex_line(&mut line, 0, 0), 1);
        let mut next = line_of("still comment */ int b;");
        assert_eq!(Syntax::C.lex_line(&mut next, 1, 1), -1);
        assert_eq!(class_at(&next, 0), SyntaxClass::Comment);
        assert_eq!(class_at(&next, 17), SyntaxClass::Type);
    }

    #[test]
    fn test_pragma_continuation() {
        let mut line = line_of("#define FOO \\");
        assert_eq!(Syntax::C.lex_line(&mut line, 0, 0), 2);
        assert_eq!(class_at(&line, 0), SyntaxClass::Pragma);
        let mut next = line_of("  bar");
        assert_eq!(Syntax::C.lex_line(&mut next, 1, 2), -1);
        assert_eq!(class_at(&next, 2), SyntaxClass::Pragma);
    }

    #[test]
    fn test_include_string() {
        let mut line = line_of("#include <stdio.h>");
        Syntax::C.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 9), SyntaxClass::String);
        assert_eq!(class_at(&line, 17), SyntaxClass::String);
    }

    #[test]
    fn test_notice_in_comment() {
        let mut line = line_of("// TODO fix");
        Syntax::C.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 3), SyntaxClass::Notice);
        assert_eq!(class_at(&line, 8), SyntaxClass::Comment);
    }
}
