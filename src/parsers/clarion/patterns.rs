//! Ordered lexeme patterns
//!
//! Patterns are tried in table order at the scan cursor and the first one
//! that matches exactly there wins. The order resolves the grammar's
//! ambiguities: types before generic identifiers, keywords and structures
//! before call forms, call forms before bare directive names, and so on.
//!
//! Conditions that look past the lexeme (for example "`COLOR` only when a `(`
//! follows") are expressed as guards over the remaining line, since the
//! `regex` crate has no lookaround.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::token::TokenKind;

/// Extra condition on a candidate match: `(matched, rest_of_line) -> accept`
type Guard = fn(&str, &str) -> bool;

pub(crate) struct Pattern {
    pub kind: TokenKind,
    regex: Regex,
    guard: Option<Guard>,
}

impl Pattern {
    /// Byte length of the match starting exactly at `pos`, if any.
    ///
    /// `find_at` keeps the text before `pos` visible, so `\b` and `^` see the
    /// real line context rather than a sliced substring.
    pub fn match_at(&self, line: &str, pos: usize) -> Option<usize> {
        let found = self.regex.find_at(line, pos)?;
        if found.start() != pos || found.is_empty() {
            return None;
        }
        if let Some(guard) = self.guard {
            if !guard(found.as_str(), &line[found.end()..]) {
                return None;
            }
        }
        Some(found.len())
    }
}

static CALL_FOLLOWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\(").expect("valid regex"));
static NAMED_PARAMETER_FOLLOWS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+\w+\)").expect("valid regex"));

fn followed_by_call(_: &str, rest: &str) -> bool {
    CALL_FOLLOWS.is_match(rest)
}

/// `QUEUE name)` is a parameter annotation, not a structure opener
fn structure_guard(matched: &str, rest: &str) -> bool {
    !(matched.eq_ignore_ascii_case("QUEUE") && NAMED_PARAMETER_FOLLOWS.is_match(rest))
}

/// Leaves `Name$`, `Count#` and `Str"` to the implicit-variable pattern
fn variable_guard(_: &str, rest: &str) -> bool {
    !matches!(rest.chars().next(), Some('$' | '#' | '"'))
}

/// `Owner.Member` only counts as a class reference when whitespace follows it
fn followed_by_whitespace(_: &str, rest: &str) -> bool {
    rest.chars().next().is_some_and(char::is_whitespace)
}

fn number_guard(_: &str, rest: &str) -> bool {
    !rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

const LEXEME_PATTERNS: &[(TokenKind, &str, Option<Guard>)] = &[
    (TokenKind::Comment, r"!.*", None),
    (TokenKind::LineContinuation, r"&?\s*\|.*", None),
    (TokenKind::String, r"'(?:[^']|'')*'", None),
    (
        TokenKind::Type,
        r"\b(?:ANY|ASTRING|BFLOAT4|BFLOAT8|BLOB|MEMO|BOOL|BSTRING|BYTE|CSTRING|DATE|DECIMAL|DOUBLE|FLOAT4|LONG|LIKE|PDECIMAL|PSTRING|REAL|SHORT|SIGNED|SREAL|STRING|TIME|ULONG|UNSIGNED|USHORT|VARIANT)\b",
        None,
    ),
    (TokenKind::PointerParameter, r"\*\?\s*\b[A-Za-z_][A-Za-z0-9_]*\b", None),
    (TokenKind::FieldEquateLabel, r"\?[A-Za-z_][A-Za-z0-9_]*", None),
    (
        TokenKind::Property,
        r"\b(?:HVSCROLL|SEPARATOR|LIST|RESIZE|DEFAULT|CENTER|MAX|SYSTEM|IMM|DRIVER|PROP|PROPLIST|EVENT|CREATE|BRUSH|LEVEL|STD|CURSOR|BEEP|REJECT|CHARSET|PEN|LISTZONE|BUTTON|MSGMODE|TEXT|FREEZE|DDE|FF_|OCX|DOCK|MATCH|PAPER|DRIVEROP|DATATYPE|GradientTypes|ITEM|MDI|GRAY|HLP)\b",
        None,
    ),
    (
        TokenKind::PropertyFunction,
        r"\b(?:FORMAT|FONT|USE|ICON|STATUS|MSG|TIP|AT|PROJECT|FROM|NAME|DLL)\b",
        Some(followed_by_call),
    ),
    (
        TokenKind::Keyword,
        r"\b(?:RETURN|OF|ELSE|THEN|UNTIL|EXIT|NEW|END|PROCEDURE|FUNCTION|ROUTINE|PROC)\b",
        None,
    ),
    (
        TokenKind::Structure,
        r"\b(?:APPLICATION|CASE|CLASS|GROUP|IF|INTERFACE|FILE|JOIN|LOOP|MAP|MENU|MENUBAR|MODULE|QUEUE|RECORD|REPORT|SECTION|SHEET|TAB|TOOLBAR|VIEW|WINDOW|OPTION|ITEMIZE|EXECUTE|BEGIN|FORM|DETAIL|HEADER|FOOTER|BREAK|ACCEPT|OLE)\b",
        Some(structure_guard),
    ),
    (
        TokenKind::FunctionArgumentParameter,
        r"\b[A-Za-z_][A-Za-z0-9_]*\s*\([^)]*\)",
        None,
    ),
    (
        TokenKind::TypeAnnotation,
        r"\b(?:QUEUE|GROUP|RECORD|FILE|VIEW|REPORT|MODULE)\s+\w+\)",
        None,
    ),
    (TokenKind::Function, r"\b(?:COLOR|LINK|DLL)\b", Some(followed_by_call)),
    (
        TokenKind::Directive,
        r"\b(?:ASSERT|BEGIN|COMPILE|EQUATE|INCLUDE|ITEMIZE|OMIT|ONCE|SECTION|SIZE)\b",
        Some(followed_by_call),
    ),
    (
        TokenKind::Number,
        r"[+-]?(?:[0-9][0-9A-Fa-f]*[hH]|[0-7]+[oO]|[01]+[bB]|\d+\.\d+|\d+)",
        Some(number_guard),
    ),
    (TokenKind::Operator, r"[+\-*/=<>!&]", None),
    (
        TokenKind::Class,
        r"[A-Za-z_][A-Za-z0-9_:]*\.[A-Za-z_][A-Za-z0-9_:.]*",
        Some(followed_by_whitespace),
    ),
    (
        TokenKind::Attribute,
        r"\b(?:ABOVE|ABSOLUTE|AUTO|BINDABLE|CONST|DERIVED|DIM|EXTEND|EXTERNAL|GLOBALCLASS|IMM|IMPLEMENTS|INCLUDE|INS|LATE|MODULE|NOBAR|NOCASE|NOFRAME|NOMEMO|NOMERGE|NOSHEET|OPT|OVER|OVR|OWNER|PRE|PRIVATE|PROTECTED|PUBLIC|STATIC|THREAD|TYPE|VIRTUAL)\b",
        None,
    ),
    (TokenKind::Constant, r"\b(?:TRUE|FALSE|NULL)\b", None),
    (
        TokenKind::Variable,
        r"&?[A-Za-z_][A-Za-z0-9_]*",
        Some(variable_guard),
    ),
    (TokenKind::ImplicitVariable, r"\b[A-Za-z][A-Za-z0-9_]*[$#\x22]", None),
    (TokenKind::Delimiter, r"[,():.;]", None),
    (TokenKind::Unknown, r"\S", None),
];

/// The compiled pattern table, in priority order
pub(crate) static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    LEXEME_PATTERNS
        .iter()
        .map(|(kind, source, guard)| Pattern {
            kind: *kind,
            regex: Regex::new(&format!("(?i){}", source)).expect("lexeme patterns are valid"),
            guard: *guard,
        })
        .collect()
});

/// Heads of split call forms that name a structure property
pub(crate) const PROPERTY_HEADS: &[&str] = &["PRE"];

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str, pos: usize) -> Option<(TokenKind, usize)> {
        PATTERNS
            .iter()
            .find_map(|p| p.match_at(line, pos).map(|len| (p.kind, len)))
    }

    #[test]
    fn test_pattern_table_order_is_fixed() {
        let kinds: Vec<TokenKind> = PATTERNS.iter().map(|p| p.kind).collect();
        assert_eq!(kinds.first(), Some(&TokenKind::Comment));
        assert_eq!(kinds.last(), Some(&TokenKind::Unknown));
        let structure = kinds.iter().position(|k| *k == TokenKind::Structure);
        let variable = kinds.iter().position(|k| *k == TokenKind::Variable);
        assert!(structure < variable);
    }

    #[test]
    fn test_type_wins_over_call_form() {
        assert_eq!(classify("  Name STRING(30)", 7), Some((TokenKind::Type, 6)));
    }

    #[test]
    fn test_queue_followed_by_parameter_name() {
        let line = "Proc PROCEDURE(LONG a, QUEUE q)";
        assert_eq!(classify(line, 23), Some((TokenKind::TypeAnnotation, 8)));
        assert_eq!(classify("Q QUEUE,PRE(Q)", 2), Some((TokenKind::Structure, 5)));
    }

    #[test]
    fn test_function_requires_parenthesis() {
        assert_eq!(classify("COLOR(0FFh)", 0).map(|(k, _)| k), Some(TokenKind::FunctionArgumentParameter));
        assert_eq!(classify("x COLOR", 2), Some((TokenKind::Variable, 5)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(classify("0FFh", 0), Some((TokenKind::Number, 4)));
        assert_eq!(classify("1.25", 0), Some((TokenKind::Number, 4)));
        assert_eq!(classify("-7)", 0), Some((TokenKind::Number, 2)));
        assert_eq!(classify("101b", 0), Some((TokenKind::Number, 4)));
    }

    #[test]
    fn test_implicit_variable_not_shadowed() {
        assert_eq!(classify("Counter# = 1", 0), Some((TokenKind::ImplicitVariable, 8)));
        assert_eq!(classify("Title$", 0), Some((TokenKind::ImplicitVariable, 6)));
    }

    #[test]
    fn test_word_boundary_sees_left_context() {
        // `IF` inside `MYIF` must not match as a structure
        assert_eq!(classify("MYIF", 2), Some((TokenKind::Variable, 2)));
    }

    #[test]
    fn test_class_reference_at_cursor() {
        assert_eq!(classify("  SELF.Count = 0", 2), Some((TokenKind::Class, 10)));
        assert_eq!(classify("  ThisWindow.Init PROCEDURE", 2), Some((TokenKind::Class, 15)));
        // no whitespace after the member
        assert_eq!(classify("  SELF.Count=0", 2), Some((TokenKind::Variable, 4)));
    }

    #[test]
    fn test_unknown_is_single_character() {
        assert_eq!(classify("@x", 0), Some((TokenKind::Unknown, 1)));
    }
}
