//! Config-style highlighters: generic conf/ini, the editor's own rc and
//! cursor-cache files, and the two git editing buffers. All stateless.

use super::{c_keyword_qualifier, is_xdigit, SyntaxState};
use crate::buffer::SyntaxClass;
use crate::theme::THEME_NAMES;

pub fn calculate(state: &mut SyntaxState) -> i32 {
    if state.i == 0 {
        if state.charat() == ';' as i32 || state.charat() == '#' as i32 {
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::Comment);
            }
        } else if state.charat() == '[' as i32 {
            state.paint(1, SyntaxClass::Keyword);
            while state.charat() != ']' as i32 && state.charat() != -1 {
                state.paint(1, SyntaxClass::Keyword);
            }
            if state.charat() == ']' as i32 {
                state.paint(1, SyntaxClass::Keyword);
            }
        } else {
            while state.charat() != '=' as i32 && state.charat() != -1 {
                state.paint(1, SyntaxClass::Type);
            }
        }
    }
    -1
}

const RC_KEYWORDS: &[&str] = &[
    "history",
    "padding",
    "hlparen",
    "hlcurrent",
    "splitpercent",
    "shiftscrolling",
    "scrollamount",
    "git",
    "colorgutter",
];

pub fn calculate_bimrc(state: &mut SyntaxState) -> i32 {
    if state.i == 0 {
        if state.charat() == '#' as i32 {
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::Comment);
            }
        } else if state.match_and_paint("theme", SyntaxClass::Keyword, c_keyword_qualifier) {
            if state.charat() == '=' as i32 {
                state.skip();
                for name in THEME_NAMES {
                    if state.match_and_paint(name, SyntaxClass::Type, c_keyword_qualifier) {
                        break;
                    }
                }
            }
        } else if state.find_keywords(RC_KEYWORDS, SyntaxClass::Keyword, c_keyword_qualifier) {
            return -1;
        }
    }
    -1
}

pub fn calculate_biminfo(state: &mut SyntaxState) -> i32 {
    if state.i == 0 {
        if state.charat() == '#' as i32 {
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::Comment);
            }
        } else if state.charat() == '>' as i32 {
            state.paint(1, SyntaxClass::Keyword);
            while state.charat() != ' ' as i32 && state.charat() != -1 {
                state.paint(1, SyntaxClass::Type);
            }
            state.skip();
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::Numeral);
            }
        } else {
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::DiffMinus);
            }
        }
    }
    -1
}

pub fn calculate_gitcommit(state: &mut SyntaxState) -> i32 {
    if state.i == 0 && state.charat() == '#' as i32 {
        while state.charat() != -1 {
            state.paint(1, SyntaxClass::Comment);
        }
    } else if state.line_no == 0 {
        // Summary line: conventional 50-column budget.
        while state.charat() != -1 && state.i < 50 {
            state.paint(1, SyntaxClass::Keyword);
        }
        while state.charat() != -1 {
            state.paint(1, SyntaxClass::DiffMinus);
        }
    } else if state.line_no == 1 {
        // The second line should stay empty.
        while state.charat() != -1 {
            state.paint(1, SyntaxClass::DiffMinus);
        }
    } else if state.charat() != -1 {
        state.skip();
        return 0;
    }
    -1
}

const REBASE_COMMANDS: &[&str] = &[
    "p", "r", "e", "s", "f", "x", "d", "pick", "reword", "edit", "squash", "fixup", "exec",
    "drop",
];

pub fn calculate_gitrebase(state: &mut SyntaxState) -> i32 {
    if state.i == 0 && state.charat() == '#' as i32 {
        while state.charat() != -1 {
            state.paint(1, SyntaxClass::Comment);
        }
    } else if state.i == 0
        && state.find_keywords(REBASE_COMMANDS, SyntaxClass::Keyword, c_keyword_qualifier)
    {
        while state.charat() == ' ' as i32 {
            state.skip();
        }
        while is_xdigit(state.charat()) {
            state.paint(1, SyntaxClass::Numeral);
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
    fn test_conf_section_and_comment() {
        let mut line = line_of("[section]");
        Syntax::Conf.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Keyword);
        let mut c = line_of("# note");
        Syntax::Conf.lex_line(&mut c, 0, 0);
        assert_eq!(class_at(&c, 3), SyntaxClass::Comment);
    }

    #[test]
    fn test_bimrc_theme_value() {
        let mut line = line_of("theme=wombat");
        Syntax::Bimrc.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 6), SyntaxClass::Type);
    }

    #[test]
    fn test_gitcommit_overflow() {
        let text = "x".repeat(60);
        let mut line = line_of(&text);
        Syntax::GitCommit.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 49), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 50), SyntaxClass::DiffMinus);
    }

    #[test]
    fn test_gitrebase_hash() {
        let mut line = line_of("pick abc123 message");
        Syntax::GitRebase.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 5), SyntaxClass::Numeral);
        assert_eq!(class_at(&line, 12), SyntaxClass::None);
    }
}
