//! Unified diff highlighting. Stateless; the first column decides the line.

use crate::buffer::SyntaxClass;

use super::SyntaxState;

pub fn calculate(state: &mut SyntaxState) -> i32 {
    if state.i == 0 {
        let class = if state.charat() == '+' as i32 {
            SyntaxClass::DiffPlus
        } else if state.charat() == '-' as i32 {
            SyntaxClass::DiffMinus
        } else if state.charat() == '@' as i32 {
            SyntaxClass::Type
        } else if state.charat() != ' ' as i32 {
            SyntaxClass::Keyword
        } else {
            return -1;
        };
        while state.charat() != -1 {
            state.paint(1, class);
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
    fn test_line_classes() {
        let mut plus = line_of("+new line");
        Syntax::Diff.lex_line(&mut plus, 0, 0);
        assert_eq!(class_at(&plus, 0), SyntaxClass::DiffPlus);

        let mut minus = line_of("-old line");
        Syntax::Diff.lex_line(&mut minus, 0, 0);
        assert_eq!(class_at(&minus, 5), SyntaxClass::DiffMinus);

        let mut hunk = line_of("@@ -1,2 +3,4 @@");
        Syntax::Diff.lex_line(&mut hunk, 0, 0);
        assert_eq!(class_at(&hunk, 0), SyntaxClass::Type);

        let mut ctx = line_of(" unchanged");
        Syntax::Diff.lex_line(&mut ctx, 0, 0);
        assert_eq!(class_at(&ctx, 1), SyntaxClass::None);
    }
}
