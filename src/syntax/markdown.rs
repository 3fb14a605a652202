//! Markdown highlighting.
//!
//! State 1 is a generic fenced code block; the other nested languages each
//! reserve a disjoint state range and are entered through [`nest`], which
//! translates the outer state by the language's base before calling the
//! inner lexer: c = 2, python = 5, java = 8, json = 10, xml = 11, make = 16,
//! diff = 17, rust = 18 (rust is open-ended, using nesting depth).

use super::{nest, Syntax, SyntaxState};
use crate::buffer::SyntaxClass;

pub fn calculate(state: &mut SyntaxState) -> i32 {
    if state.state < 1 {
        while state.charat() != -1 {
            if state.i == 0 && state.charat() == '#' as i32 {
                while state.charat() == '#' as i32 {
                    state.paint(1, SyntaxClass::Keyword);
                }
                while state.charat() != -1 {
                    state.paint(1, SyntaxClass::Bold);
                }
                return -1;
            } else if state.i == 0 {
                while state.charat() == ' ' as i32 {
                    state.skip();
                }
                if state.charat() == '`' as i32
                    && state.nextchar() == '`' as i32
                    && state.charrel(2) == '`' as i32
                {
                    state.paint(3, SyntaxClass::String);
                    if state.match_forward("c") || state.match_forward("c++") {
                        return nest(state, Syntax::C, 2);
                    } else if state.match_forward("py") || state.match_forward("python") {
                        return nest(state, Syntax::Python, 5);
                    } else if state.match_forward("java") {
                        return nest(state, Syntax::Java, 8);
                    } else if state.match_forward("json") {
                        return nest(state, Syntax::Json, 10);
                    } else if state.match_forward("xml") || state.match_forward("html") {
                        return nest(state, Syntax::Xml, 11);
                    } else if state.match_forward("make") {
                        return nest(state, Syntax::Make, 16);
                    } else if state.match_forward("diff") {
                        return nest(state, Syntax::Diff, 17);
                    } else if state.match_forward("rust") {
                        return nest(state, Syntax::Rust, 18);
                    }
                    return 1;
                }
            }
            if state.charat() == ' ' as i32
                && state.charrel(1) == ' ' as i32
                && state.charrel(2) == ' ' as i32
                && state.charrel(3) == ' ' as i32
            {
                return -1;
            } else if state.charat() == '`' as i32 {
                state.paint(1, SyntaxClass::String);
                while state.charat() != -1 {
                    if state.charat() == '`' as i32 {
                        state.paint(1, SyntaxClass::String);
                        return 0;
                    }
                    state.paint(1, SyntaxClass::String);
                }
            } else if state.charat() == '[' as i32 {
                state.skip();
                while state.charat() != -1 && state.charat() != ']' as i32 {
                    state.paint(1, SyntaxClass::Link);
                }
                if state.charat() == ']' as i32 {
                    state.skip();
                }
                if state.charat() == '(' as i32 {
                    state.skip();
                    while state.charat() != -1 && state.charat() != ')' as i32 {
                        state.paint(1, SyntaxClass::Numeral);
                    }
                }
            } else {
                state.skip();
                return 0;
            }
        }
        -1
    } else {
        // Inside a fenced block: check for the closing fence first.
        if state.i == 0 {
            let mut count = 0isize;
            while state.charrel(count) == ' ' as i32 {
                count += 1;
            }
            if state.charrel(count) == '`' as i32
                && state.charrel(count + 1) == '`' as i32
                && state.charrel(count + 2) == '`' as i32
                && state.charrel(count + 3) == -1
            {
                state.paint(count as usize + 3, SyntaxClass::String);
                return -1;
            }
        }
        if state.state == 1 {
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::String);
            }
            1
        } else if state.state < 5 {
            nest(state, Syntax::C, 2)
        } else if state.state < 8 {
            nest(state, Syntax::Python, 5)
        } else if state.state < 10 {
            nest(state, Syntax::Java, 8)
        } else if state.state < 11 {
            nest(state, Syntax::Json, 10)
        } else if state.state < 16 {
            nest(state, Syntax::Xml, 11)
        } else if state.state < 17 {
            nest(state, Syntax::Make, 16)
        } else if state.state < 18 {
            nest(state, Syntax::Diff, 17)
        } else {
            nest(state, Syntax::Rust, 18)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{class_at, line_of};
    use super::*;
    use crate::syntax::Syntax;

    #[test]
    fn test_heading() {
        let mut line = line_of("## Title");
        Syntax::Markdown.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 4), SyntaxClass::Bold);
    }

    #[test]
    fn test_inline_code_and_link() {
        let mut line = line_of("see `code` and [text](url)");
        Syntax::Markdown.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 4), SyntaxClass::String);
        assert_eq!(class_at(&line, 6), SyntaxClass::String);
        assert_eq!(class_at(&line, 16), SyntaxClass::Link);
        assert_eq!(class_at(&line, 22), SyntaxClass::Numeral);
    }

    #[test]
    fn test_embedded_c_block() {
        let mut fence = line_of(" ```c ");
        // Trailing space keeps this from matching a known language; use the
        // exact form first.
        let mut open = line_of("```c");
        assert_eq!(Syntax::Markdown.lex_line(&mut open, 0, 0), 2);
        let mut body = line_of("int x = 0x1F;");
        let next = Syntax::Markdown.lex_line(&mut body, 1, 2);
        assert_eq!(next, 2);
        assert_eq!(class_at(&body, 0), SyntaxClass::Type);
        assert_eq!(class_at(&body, 8), SyntaxClass::Numeral);
        let mut close = line_of("```");
        assert_eq!(Syntax::Markdown.lex_line(&mut close, 2, 2), -1);
        assert_eq!(class_at(&close, 0), SyntaxClass::String);
        // Fences with leading indentation close the same way.
        assert_eq!(Syntax::Markdown.lex_line(&mut fence, 0, 0), 1);
    }

    #[test]
    fn test_embedded_rust_keeps_nesting() {
        let mut open = line_of("```rust");
        assert_eq!(Syntax::Markdown.lex_line(&mut open, 0, 0), 18);
        let mut body = line_of("/* outer /* inner");
        // Depth 2 inside the fence: 18 + 2.
        assert_eq!(Syntax::Markdown.lex_line(&mut body, 1, 18), 20);
        let mut more = line_of("*/ */ fn f() {}");
        assert_eq!(Syntax::Markdown.lex_line(&mut more, 2, 20), 18);
        assert_eq!(class_at(&more, 6), SyntaxClass::Keyword);
    }
}
