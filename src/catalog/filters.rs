//! Naming rules that decide which grants are worth auditing.
//!
//! The same constants render the `WHERE` clause of the catalog query and
//! drive [`is_auditable_table`] / [`is_auditable_role`], so rows replayed from
//! a saved mapping are held to exactly the rules the server applies.

/// `sys.objects.type` of user tables.
pub const USER_TABLE_TYPE: &str = "U";

/// `LIKE` patterns of Esri delta/archive, system, and auxiliary tables.
pub const EXCLUDED_TABLE_PATTERNS: [&str; 9] = [
    // delta/archive
    "A[0-9]%",
    "D[0-9]%",
    "%_H[0-9]",
    "%_H",
    "N_[0-9]%",
    "ND_%",
    // system/internal
    "SDE[_]%",
    "GDB[_]%",
    // auxiliary T_#_xxx
    "T_[0-9]_%",
];

/// Every audited role mirrors an AD group under the `HRM` domain.
pub const ROLE_PREFIX_PATTERN: &str = "HRM%";

/// Roles that are never reported, spelled exactly as they exist in the catalog.
pub const EXCLUDED_ROLES: [&str; 4] = [
    r"HRM\GIS_HW_ARCGIS_HRMBASIC",
    "HRM_CITYWORKS_USER",
    "HRM_TRFSDY_USER",
    "HRM_REAL_ESTATE_USER",
];

/// Read-only role families.
pub const EXCLUDED_ROLE_PATTERNS: [&str; 2] = ["%READER%", "%VIEWER%"];

/// Whether `table` survives every table exclusion pattern.
pub fn is_auditable_table(table: &str) -> bool {
    !EXCLUDED_TABLE_PATTERNS
        .iter()
        .any(|pattern| like_matches(pattern, table))
}

/// Whether `role` carries the `HRM` prefix and is not excluded by name or family.
pub fn is_auditable_role(role: &str) -> bool {
    like_matches(ROLE_PREFIX_PATTERN, role)
        && !EXCLUDED_ROLES.contains(&role)
        && !EXCLUDED_ROLE_PATTERNS
            .iter()
            .any(|pattern| like_matches(pattern, role))
}

/// Evaluate a T-SQL `LIKE` pattern against `value`, case-sensitively.
///
/// Supports `%` (any run), `_` (any single character), and bracket classes
/// such as `[0-9]`, `[_]`, and `[^a-c]`. An unterminated `[` is literal.
pub fn like_matches(pattern: &str, value: &str) -> bool {
    let tokens = tokenize(pattern);
    let chars: Vec<char> = value.chars().collect();
    matches_from(&tokens, &chars)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    AnyRun,
    AnyChar,
    Literal(char),
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

impl Token {
    fn accepts(&self, ch: char) -> bool {
        match self {
            Token::AnyRun | Token::AnyChar => true,
            Token::Literal(expected) => *expected == ch,
            Token::Class { negated, ranges } => {
                let inside = ranges.iter().any(|&(lo, hi)| lo <= ch && ch <= hi);
                inside != *negated
            }
        }
    }
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' => tokens.push(Token::AnyRun),
            '_' => tokens.push(Token::AnyChar),
            '[' => {
                let mut body = Vec::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    body.push(inner);
                }
                if closed && !body.is_empty() {
                    tokens.push(class_token(&body));
                } else {
                    tokens.push(Token::Literal('['));
                    tokens.extend(body.into_iter().map(Token::Literal));
                    if closed {
                        tokens.push(Token::Literal(']'));
                    }
                }
            }
            other => tokens.push(Token::Literal(other)),
        }
    }
    tokens
}

fn class_token(body: &[char]) -> Token {
    let (negated, body) = match body.split_first() {
        Some(('^', rest)) if !rest.is_empty() => (true, rest),
        _ => (false, body),
    };

    let mut ranges = Vec::new();
    let mut index = 0;
    while index < body.len() {
        if index + 2 < body.len() && body[index + 1] == '-' {
            ranges.push((body[index], body[index + 2]));
            index += 3;
        } else {
            ranges.push((body[index], body[index]));
            index += 1;
        }
    }
    Token::Class { negated, ranges }
}

fn matches_from(tokens: &[Token], text: &[char]) -> bool {
    match tokens.split_first() {
        None => text.is_empty(),
        Some((Token::AnyRun, rest)) => (0..=text.len()).any(|skip| matches_from(rest, &text[skip..])),
        Some((token, rest)) => match text.split_first() {
            Some((&ch, remaining)) => token.accepts(ch) && matches_from(rest, remaining),
            None => false,
        },
    }
}
