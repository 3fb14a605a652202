//! Makefile highlighting. Stateless; each line is classified as a recipe
//! (leading tab), a rule, a variable assignment, or a directive line.

use super::{c_keyword_qualifier, is_alnum, SyntaxState};
use crate::buffer::SyntaxClass;

fn command_qualifier(c: i32) -> bool {
    is_alnum(c) || c == '_' as i32 || c == '-' as i32 || c == '.' as i32
}

const COMMANDS: &[&str] = &[
    "define", "endef", "undefine", "ifdef", "ifndef", "ifeq", "ifneq", "else", "endif",
    "include", "sinclude", "override", "export", "unexport", "private", "vpath", "-include",
];

const FUNCTIONS: &[&str] = &[
    "subst",
    "patsubst",
    "findstring",
    "filter",
    "filter-out",
    "sort",
    "word",
    "words",
    "wordlist",
    "firstword",
    "lastword",
    "dir",
    "notdir",
    "suffix",
    "basename",
    "addsuffix",
    "addprefix",
    "join",
    "wildcard",
    "realpath",
    "abspath",
    "error",
    "warning",
    "shell",
    "origin",
    "flavor",
    "foreach",
    "if",
    "or",
    "and",
    "call",
    "eval",
    "file",
    "value",
];

const SPECIAL_TARGETS: &[&str] = &[
    "all",
    ".PHONY",
    ".SUFFIXES",
    ".DEFAULT",
    ".PRECIOUS",
    ".INTERMEDIATE",
    ".SECONDARY",
    ".SECONDEXPANSION",
    ".DELETE_ON_ERROR",
    ".IGNORE",
    ".LOW_RESOLUTION_TIME",
    ".SILENT",
    ".EXPORT_ALL_VARIABLES",
    ".NOTPARALLEL",
    ".ONESHELL",
    ".POSIX",
];

fn close_paren(state: &mut SyntaxState) {
    state.paint(2, SyntaxClass::Type);
    state.find_keywords(FUNCTIONS, SyntaxClass::Keyword, c_keyword_qualifier);
    let mut depth = 1;
    while state.charat() != -1 {
        if state.charat() == '(' as i32 {
            depth += 1;
        } else if state.charat() == ')' as i32 {
            depth -= 1;
            if depth == 0 {
                state.paint(1, SyntaxClass::Type);
                return;
            }
        } else if state.charat() == '"' as i32 {
            state.paint_simple_string();
        }
        state.paint(1, SyntaxClass::Type);
    }
}

fn close_brace(state: &mut SyntaxState) {
    state.paint(2, SyntaxClass::Type);
    while state.charat() != -1 {
        if state.charat() == '}' as i32 {
            state.paint(1, SyntaxClass::Type);
            return;
        }
        state.paint(1, SyntaxClass::Type);
    }
}

fn variable_or_comment(state: &mut SyntaxState, class: SyntaxClass) {
    while state.charat() != -1 {
        if state.charat() == '$' as i32 {
            match state.nextchar() as u8 as char {
                '(' => close_paren(state),
                '{' => close_brace(state),
                _ => state.paint(2, SyntaxClass::Type),
            }
        } else if state.charat() == '#' as i32 {
            while state.charat() != -1 {
                state.paint(1, SyntaxClass::Comment);
            }
        } else {
            state.paint(1, class);
        }
    }
}

pub fn calculate(state: &mut SyntaxState) -> i32 {
    if state.i == 0 && state.charat() == '\t' as i32 {
        // Recipe line.
        variable_or_comment(state, SyntaxClass::Numeral);
        return -1;
    }
    while state.charat() == ' ' as i32 {
        state.skip();
    }
    // Peek forward: rule, variable assignment, or neither.
    let mut what = 0;
    let mut k = 0isize;
    loop {
        let c = state.charrel(k);
        if c == -1 {
            break;
        }
        if c == ':' as i32 && state.charrel(k + 1) != '=' as i32 {
            what = 1;
            break;
        } else if c == '=' as i32 {
            what = 2;
            break;
        } else if c == '#' as i32 {
            break;
        }
        k += 1;
    }
    if what == 0 {
        while state.charat() != -1 {
            if state.charat() == '#' as i32 {
                while state.charat() != -1 {
                    state.paint(1, SyntaxClass::Comment);
                }
            } else if state.find_keywords(COMMANDS, SyntaxClass::Keyword, command_qualifier) {
                continue;
            } else if state.charat() == '$' as i32 {
                variable_or_comment(state, SyntaxClass::None);
            } else {
                state.skip();
            }
        }
    } else if what == 1 {
        // Rule.
        while state.charat() != -1 {
            if state.charat() == '#' as i32 {
                while state.charat() != -1 {
                    state.paint(1, SyntaxClass::Comment);
                }
            } else if state.charat() == ':' as i32 {
                state.paint(1, SyntaxClass::Type);
                variable_or_comment(state, SyntaxClass::None);
            } else if state.find_keywords(SPECIAL_TARGETS, SyntaxClass::Keyword, command_qualifier)
            {
                continue;
            } else {
                state.paint(1, SyntaxClass::Type);
            }
        }
    } else {
        // Variable assignment.
        state.match_and_paint("export", SyntaxClass::Keyword, c_keyword_qualifier);
        while state.charat() != -1
            && state.charat() != '+' as i32
            && state.charat() != '=' as i32
            && state.charat() != ':' as i32
            && state.charat() != '?' as i32
        {
            state.paint(1, SyntaxClass::Type);
        }
        while state.charat() != -1 && state.charat() != '=' as i32 {
            state.skip();
        }
        variable_or_comment(state, SyntaxClass::None);
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::super::tests::{class_at, line_of};
    use super::*;
    use crate::syntax::Syntax;

    #[test]
    fn test_rule_line() {
        let mut line = line_of("all: foo.o");
        Syntax::Make.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Keyword);
        assert_eq!(class_at(&line, 3), SyntaxClass::Type);
    }

    #[test]
    fn test_variable_assignment() {
        let mut line = line_of("CFLAGS := -O2 $(EXTRA)");
        Syntax::Make.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 0), SyntaxClass::Type);
        assert_eq!(class_at(&line, 14), SyntaxClass::Type);
    }

    #[test]
    fn test_recipe_line() {
        let mut line = line_of("\tcc -o $@ $<");
        Syntax::Make.lex_line(&mut line, 0, 0);
        assert_eq!(class_at(&line, 1), SyntaxClass::Numeral);
        assert_eq!(class_at(&line, 7), SyntaxClass::Type);
    }
}
