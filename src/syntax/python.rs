//! Python highlighting.
//!
//! States 1 and 2 are open triple-quoted strings (`"""` and `'''`).

use super::{c_keyword_qualifier, is_digit, SyntaxState};
use crate::buffer::SyntaxClass;

const KEYWORDS: &[&str] = &[
    "class", "def", "return", "del", "if", "else", "elif", "for", "while", "continue", "break",
    "assert", "as", "and", "or", "except", "finally", "from", "global", "import", "in", "is",
    "lambda", "with", "nonlocal", "not", "pass", "raise", "try", "yield",
];

const TYPES: &[&str] = &["object", "set", "dict", "int", "str", "bytes"];

const SPECIAL: &[&str] = &["True", "False", "None"];

fn paint_triple_double(state: &mut SyntaxState) -> i32 {
    while state.charat() != -1 {
        if state.charat() == '"' as i32 {
            state.paint(1, SyntaxClass::String);
            if state.charat() == '"' as i32 && state.nextchar() == '"' as i32 {
                state.paint(2, SyntaxClass::String);
                return 0;
            }
        } else {
            state.paint(1, SyntaxClass::String);
        }
    }
    1
}

fn paint_triple_single(state: &mut SyntaxState) -> i32 {
    while state.charat() != -1 {
        if state.charat() == '\'' as i32 {
            state.paint(1, SyntaxClass::String);
            if state.charat() == '\'' as i32 && state.nextchar() == '\'' as i32 {
                state.paint(2, SyntaxClass::String);
                return 0;
            }
        } else {
            state.paint(1, SyntaxClass::String);
        }
    }
    2
}

fn paint_single_string(state: &mut SyntaxState) {
    state.paint(1, SyntaxClass::String);
    let mut last = -1;
    while state.charat() != -1 {
        if last != '\\' as i32 && state.charat() == '\'' as i32 {
            state.paint(1, SyntaxClass::String);
            return;
        }
        if last == '\\' as i32 && state.charat() == '\\' as i32 {
            state.paint(1, SyntaxClass::String);
            last = -1;
        } else {
            last = state.charat();
            state.paint(1, SyntaxClass::String);
        }
    }
}

fn paint_numeral(state: &mut SyntaxState) {
    if state.charat() == '0' as i32
        && (state.nextchar() == 'x' as i32 || state.nextchar() == 'X' as i32)
    {
        state.paint(2, SyntaxClass::Numeral);
        while super::is_xdigit(state.charat()) {
            state.paint(1, SyntaxClass::Numeral);
        }
        return;
    }
    while is_digit(state.charat()) {
        state.paint(1, SyntaxClass::Numeral);
    }
    if state.charat() == '.' as i32 {
        state.paint(1, SyntaxClass::Numeral);
        while is_digit(state.charat()) {
            state.paint(1, SyntaxClass::Numeral);
        }
    }
    if state.charat() == 'e' as i32 || state.charat() == 'E' as i32 {
        state.paint(1, SyntaxClass::Numeral);
        if state.charat() == '+' as i32 || state.charat() == '-' as i32 {
            state.paint(1, SyntaxClass::Numeral);
        }
        while is_digit(state.charat()) {
            state.paint(1, SyntaxClass::Numeral);
        }
    }
    if state.charat() == 'j' as i32 {
        state.paint(1, SyntaxClass::Numeral);
    }
    while state.charat() == 'l' as i32 || state.charat() == 'L' as i32 {
        state.paint(1, SyntaxClass::Numeral);
    }
}

pub fn calculate(state: &mut SyntaxState) -> i32 {
    match state.state {
        -1 | 0 => {
            if state.charat() == '#' as i32 {
                state.paint_comment();
            } else if state.i == 0
                && state.match_and_paint("import", SyntaxClass::Pragma, c_keyword_qualifier)
            {
                return 0;
            } else if state.charat() == '@' as i32 {
                state.paint(1, SyntaxClass::Pragma);
                while c_keyword_qualifier(state.charat()) {
                    state.paint(1, SyntaxClass::Pragma);
                }
                return 0;
            } else if state.charat() == '"' as i32 {
                if state.nextchar() == '"' as i32 && state.charrel(2) == '"' as i32 {
                    state.paint(3, SyntaxClass::String);
                    return paint_triple_double(state);
                }
                state.paint_simple_string();
                return 0;
            } else if state.find_keywords(KEYWORDS, SyntaxClass::Keyword, c_keyword_qualifier) {
                return 0;
            } else if state.find_keywords(TYPES, SyntaxClass::Type, c_keyword_qualifier) {
                return 0;
            } else if state.find_keywords(SPECIAL, SyntaxClass::Numeral, c_keyword_qualifier) {
                return 0;
            } else if state.charat() == '\'' as i32 {
                if state.nextchar() == '\'' as i32 && state.charrel(2) == '\'' as i32 {
                    state.paint(3, SyntaxClass::String);
                    return paint_triple_single(state);
                }
                paint_single_string(state);
                return 0;
            } else if !c_keyword_qualifier(state.lastchar()) && is_digit(state.charat()) {
                paint_numeral(state);
                return 0;
            } else if state.charat() != -1 {
                state.skip();
                return 0;
            }
            -1
        }
        1 => paint_triple_double(state),
        2 => paint_triple_single(state),
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{class_at, line_of};
    use super::*;
    use crate::syntax::Syntax;

    #[test]
    fn test_triple_string_spans_lines() {
        let mut line = line_of("x = \"\"\"start");
        assert_eq!(Syntax::Python.lex_line(&mut line, 0, 0), 1);
        let mut mid = line_of("middle");
        assert_eq!(Syntax::Python.lex_line(&mut mid, 1, 1), 1);
        assert_eq!(class_at(&mid, 0), SyntaxClass::String);
        let mut end = line_of("end\"\"\" + 1");
        assert_eq!(Syntax::Python.lex_line(&mut end, 2, 1), -1);
        assert_eq!(class_at(&end, 3), SyntaxClass::String);
        assert_eq!(class_at(&end, 9), SyntaxClass::Numeral);
    }

    #[test]
    fn test_decorator() {
        let mut line = line_of("@property");
        Syntax::Python.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Pragma);
        assert_eq!(class_at(&line, 8), SyntaxClass::Pragma);
    }

    #[test]
    fn test_keywords() {
        let mut line = line_of("def f(): return None");
        Syntax::Python.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 9), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 16), SyntaxClass::Numeral);
    }
}
