//! XML / HTML highlighting.
//!
//! States: 1 = inside an opening brace awaiting the tag name, 2 = inside a
//! tag, 3 = inside an attribute string, 4 = inside a comment.

use super::{is_alnum, SyntaxState};
use crate::buffer::SyntaxClass;

fn paint_in_tag(state: &mut SyntaxState) -> i32 {
    while state.charat() != -1 {
        if state.charat() == '>' as i32 {
            state.paint(1, SyntaxClass::Type);
            return 0;
        } else if state.charat() == '"' as i32 {
            state.paint_simple_string();
            if state.charat() == -1 && state.lastchar() != '"' as i32 {
                return 3;
            }
        } else {
            state.paint(1, SyntaxClass::Type);
        }
    }
    2
}

fn paint_comment(state: &mut SyntaxState) -> i32 {
    while state.charat() != -1 {
        if state.charat() == '-' as i32
            && state.nextchar() == '-' as i32
            && state.charrel(2) == '>' as i32
        {
            state.paint(3, SyntaxClass::Comment);
            return 0;
        }
        state.paint(1, SyntaxClass::Comment);
    }
    4
}

pub fn calculate(state: &mut SyntaxState) -> i32 {
    match state.state {
        -1 | 0 => {
            if state.charat() == -1 {
                return -1;
            }
            if state.charat() != '<' as i32 {
                state.skip();
                return 0;
            }
            if state.nextchar() == '!' as i32
                && state.charrel(2) == '-' as i32
                && state.charrel(3) == '-' as i32
            {
                state.paint(4, SyntaxClass::Comment);
                return paint_comment(state);
            }
            state.paint(1, SyntaxClass::Type);
            // Fall into the tag-name state.
            calculate_tag_name(state)
        }
        1 => calculate_tag_name(state),
        2 => paint_in_tag(state),
        3 => {
            // Still inside an attribute string.
            if state.charat() == '"' as i32 {
                state.paint(1, SyntaxClass::String);
                return 2;
            }
            state.paint_simple_string();
            if state.charat() == -1 && state.lastchar() != '"' as i32 {
                return 3;
            }
            2
        }
        4 => paint_comment(state),
        _ => -1,
    }
}

fn calculate_tag_name(state: &mut SyntaxState) -> i32 {
    while state.charat() != -1 {
        if state.charat() == '/' as i32 || state.charat() == '?' as i32 {
            state.paint(1, SyntaxClass::Type);
        }
        if state.charat() == ' ' as i32 || state.charat() == '\t' as i32 {
            state.skip();
        }
        if is_alnum(state.charat()) {
            while is_alnum(state.charat()) || state.charat() == '-' as i32 {
                state.paint(1, SyntaxClass::Keyword);
            }
            if state.charat() == -1 {
                return 2;
            }
            return paint_in_tag(state);
        }
        state.paint(1, SyntaxClass::Type);
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::super::tests::{class_at, line_of};
    use super::*;
    use crate::syntax::Syntax;

    #[test]
    fn test_simple_tag() {
        let mut line = line_of("<body class=\"x\">text");
        Syntax::Xml.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Type);
        assert_eq!(class_at(&line, 1), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 12), SyntaxClass::String);
        assert_eq!(class_at(&line, 15), SyntaxClass::Type);
        assert_eq!(class_at(&line, 16), SyntaxClass::None);
    }

    #[test]
    fn test_comment_spans_lines() {
        let mut line = line_of("<!-- open");
        assert_eq!(Syntax::Xml.lex_line(&mut line, 0, 0), 4);
        let mut next = line_of("still --> <a>");
        assert_eq!(Syntax::Xml.lex_line(&mut next, 1, 4), -1);
        assert_eq!(class_at(&next, 0), SyntaxClass::Comment);
        assert_eq!(class_at(&next, 11), SyntaxClass::Keyword);
    }

    #[test]
    fn test_unclosed_tag_continues() {
        let mut line = line_of("<div");
        assert_eq!(Syntax::Xml.lex_line(&mut line, 0, 0), 2);
    }
}
