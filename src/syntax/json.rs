//! JSON highlighting. Stateless; object keys are repainted after the fact
//! when a colon follows the string.

use super::{c_keyword_qualifier, is_digit, SyntaxState};
use crate::buffer::SyntaxClass;

const KEYWORDS: &[&str] = &["true", "false", "null"];

pub fn calculate(state: &mut SyntaxState) -> i32 {
    while state.charat() != -1 {
        if state.charat() == '"' as i32 {
            let backtrack = state.i;
            state.paint_simple_string();
            let backtrack_end = state.i;
            while state.charat() == ' ' as i32 {
                state.skip();
            }
            if state.charat() == ':' as i32 {
                // It was a key: quotes in the escape class, body as keyword.
                state.i = backtrack;
                state.paint(1, SyntaxClass::Escape);
                while state.i < backtrack_end - 1 {
                    state.paint(1, SyntaxClass::Keyword);
                }
                if state.charat() == '"' as i32 {
                    state.paint(1, SyntaxClass::Escape);
                }
            }
            return 0;
        } else if state.charat() == '-' as i32 || is_digit(state.charat()) {
            if state.charat() == '-' as i32 {
                state.paint(1, SyntaxClass::Numeral);
            }
            if state.charat() == '0' as i32 {
                state.paint(1, SyntaxClass::Numeral);
            } else {
                while is_digit(state.charat()) {
                    state.paint(1, SyntaxClass::Numeral);
                }
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
        } else if state
            .find_keywords(KEYWORDS, SyntaxClass::Numeral, c_keyword_qualifier)
        {
            // painted
        } else {
            state.skip();
            return 0;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::super::tests::{class_at, line_of};
    use super::*;
    use crate::syntax::Syntax;

    #[test]
    fn test_key_vs_value_strings() {
        let mut line = line_of("\"key\": \"value\"");
        Syntax::Json.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Escape);
        assert_eq!(class_at(&line, 1), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 4), SyntaxClass::Escape);
        assert_eq!(class_at(&line, 7), SyntaxClass::String);
        assert_eq!(class_at(&line, 8), SyntaxClass::String);
    }

    #[test]
    fn test_numbers_and_literals() {
        let mut line = line_of("[-1.5e+3, true]");
        Syntax::Json.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 1), SyntaxClass::Numeral);
        assert_eq!(class_at(&line, 5), SyntaxClass::Numeral);
        assert_eq!(class_at(&line, 10), SyntaxClass::Numeral);
    }
}
