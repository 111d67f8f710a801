//! Tokenizes query text into a flat stream (spec §4.4.1). A small
//! state machine tracks only enough context to know whether the next
//! characters are a category/clause token or a value — grammar
//! ordering beyond that is the parser's job (§4.4.2).
//!
//! Value tokens carry their raw text unclassified; whether a value
//! becomes a string or an instant depends on the category that
//! precedes it, which the parser resolves when it builds a
//! [`crate::domain::Statement`] (spec §4.4.1 "Values are classified
//! ... based on the category of the immediately preceding tokens").

use crate::domain::{Category, ClauseOp, Operator};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    ClauseStart,
    ClauseEnd,
    /// `true` when the caller wrote the `and`/`or` keyword themselves;
    /// `false` for an implicit default the lexer injected in its
    /// place. The parser only lets an infix occurrence override a
    /// clause's operator once, and that bit is what it keys on (§4.4.2).
    ClauseOp(ClauseOp, bool),
    Negate,
    Category(Category),
    Operator(Operator),
    Value(String),
    /// A word in category position that matched no known category or
    /// clause keyword (spec §4.4.1: "an unknown category yields an
    /// unknown token"). Left for the parser to reject.
    Unknown(String),
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Statement,
    Operator,
    Value,
}

const LONG_NAMES: &[(&str, Category)] = &[
    ("path", Category::Path),
    ("title", Category::Title),
    ("author", Category::Author),
    ("filetime", Category::FileTime),
    ("date", Category::Date),
    ("tags", Category::Tags),
    ("links", Category::Links),
    ("meta", Category::Meta),
];

/// Tokenizes `input`, injects an implicit `AND` after every bare `(`
/// that has no explicit clause operator, and wraps the whole stream
/// in an outermost `( AND … )` so the parser always starts from a
/// uniform shape, closing any of the caller's own dangling opens at
/// EOF along the way (spec §4.4.1).
pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = scan(input)?;
    inject_implicit_and(&mut tokens);

    let dangling = tokens.iter().fold(0i32, |depth, tok| match tok {
        Token::ClauseStart => depth + 1,
        Token::ClauseEnd => depth - 1,
        _ => depth,
    });

    let mut wrapped = Vec::with_capacity(tokens.len() + 3);
    wrapped.push(Token::ClauseStart);
    wrapped.push(Token::ClauseOp(ClauseOp::And, false));
    wrapped.append(&mut tokens);
    for _ in 0..dangling.max(0) {
        wrapped.push(Token::ClauseEnd);
    }
    wrapped.push(Token::ClauseEnd);

    Ok(wrapped)
}

/// Inserts a synthetic `ClauseOp::And` right after any `ClauseStart`
/// not already followed by an explicit clause operator.
fn inject_implicit_and(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == Token::ClauseStart
            && !matches!(tokens.get(i + 1), Some(Token::ClauseOp(_, _)))
        {
            tokens.insert(i + 1, Token::ClauseOp(ClauseOp::And, false));
        }
        i += 1;
    }
}

fn scan(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut state = State::Statement;

    loop {
        skip_ws(input, &mut pos);
        if pos >= input.len() {
            break;
        }
        let slice = &input[pos..];

        match state {
            State::Statement => {
                let mut chars = slice.chars();
                let first = chars.next().unwrap();
                if first == '(' {
                    tokens.push(Token::ClauseStart);
                    pos += 1;
                } else if first == ')' {
                    tokens.push(Token::ClauseEnd);
                    pos += 1;
                } else if first == '-' {
                    tokens.push(Token::Negate);
                    pos += 1;
                } else if let Some((op, len)) = match_clause_op(slice) {
                    tokens.push(Token::ClauseOp(op, true));
                    pos += len;
                } else if let Some((cat, len)) = match_category(slice) {
                    tokens.push(Token::Category(cat));
                    pos += len;
                    state = State::Operator;
                } else {
                    let (word, len) = scan_word(slice);
                    tokens.push(Token::Unknown(word));
                    pos += len;
                }
            }
            State::Operator => {
                let Some((op, len)) = match_operator(slice) else {
                    return Err(Error::LexUnknownToken { offset: pos });
                };
                tokens.push(Token::Operator(op));
                pos += len;
                state = State::Value;
            }
            State::Value => {
                let (value, len) = scan_value(slice);
                tokens.push(Token::Value(value));
                pos += len;
                state = State::Statement;
            }
        }
    }

    Ok(tokens)
}

fn skip_ws(s: &str, pos: &mut usize) {
    let trimmed = s[*pos..].trim_start();
    *pos = s.len() - trimmed.len();
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() || !s.is_char_boundary(prefix.len()) {
        return None;
    }
    if s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn word_boundary(rest: &str) -> bool {
    rest.chars().next().map_or(true, |c| !c.is_alphanumeric())
}

fn match_clause_op(s: &str) -> Option<(ClauseOp, usize)> {
    for (word, op) in [("and", ClauseOp::And), ("or", ClauseOp::Or)] {
        if let Some(rest) = strip_ci_prefix(s, word) {
            if word_boundary(rest) {
                return Some((op, word.len()));
            }
        }
    }
    None
}

fn match_category(s: &str) -> Option<(Category, usize)> {
    for (word, cat) in LONG_NAMES {
        if let Some(rest) = strip_ci_prefix(s, word) {
            if word_boundary(rest) {
                return Some((*cat, word.len()));
            }
        }
    }

    let mut chars = s.char_indices();
    let (_, first) = chars.next()?;
    let rest = match chars.next() {
        Some((idx, _)) => &s[idx..],
        None => "",
    };
    if !word_boundary(rest) {
        return None;
    }
    let cat = match first {
        'p' => Category::Path,
        'T' => Category::Title,
        'a' => Category::Author,
        'd' => Category::Date,
        'f' => Category::FileTime,
        't' => Category::Tags,
        'l' => Category::Links,
        'm' => Category::Meta,
        _ => return None,
    };
    Some((cat, first.len_utf8()))
}

fn match_operator(s: &str) -> Option<(Operator, usize)> {
    if s.starts_with("!re!") {
        return Some((Operator::Re, 4));
    }
    if s.starts_with("!=") {
        return Some((Operator::Ne, 2));
    }
    if s.starts_with("<=") {
        return Some((Operator::Le, 2));
    }
    if s.starts_with(">=") {
        return Some((Operator::Ge, 2));
    }
    match s.chars().next()? {
        '=' => Some((Operator::Eq, 1)),
        '<' => Some((Operator::Lt, 1)),
        '>' => Some((Operator::Gt, 1)),
        ':' => Some((Operator::Ap, 1)),
        '~' => Some((Operator::Ap, 1)),
        _ => None,
    }
}

/// A value is a quoted string (no escapes) or a bareword running up
/// to whitespace or `)` (spec §4.4.1).
fn scan_value(s: &str) -> (String, usize) {
    if let Some(stripped) = s.strip_prefix('"') {
        if let Some(end) = stripped.find('"') {
            return (stripped[..end].to_string(), end + 2);
        }
        return (stripped.to_string(), s.len());
    }
    let end = s.find(|c: char| c.is_whitespace() || c == ')').unwrap_or(s.len());
    (s[..end].to_string(), end)
}

fn scan_word(s: &str) -> (String, usize) {
    let end = s
        .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .unwrap_or(s.len());
    let end = if end == 0 {
        s.chars().next().map_or(1, char::len_utf8)
    } else {
        end
    };
    (s[..end].to_string(), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strips the synthetic outer `( and ... )` wrap every `lex()`
    /// call adds, to keep the assertions below focused on the
    /// interesting tokens.
    fn inner(tokens: Vec<Token>) -> Vec<Token> {
        tokens[2..tokens.len() - 1].to_vec()
    }

    #[test]
    fn tokenizes_simple_statement() {
        let tokens = inner(lex("t=a").unwrap());
        assert_eq!(
            tokens,
            vec![
                Token::Category(Category::Tags),
                Token::Operator(Operator::Eq),
                Token::Value("a".to_string()),
            ]
        );
    }

    #[test]
    fn distinguishes_title_and_tags_case() {
        let tokens = inner(lex("T=x t=y").unwrap());
        assert_eq!(tokens[0], Token::Category(Category::Title));
        assert_eq!(tokens[3], Token::Category(Category::Tags));
    }

    #[test]
    fn long_category_names() {
        let tokens = inner(lex("author=Turing").unwrap());
        assert_eq!(tokens[0], Token::Category(Category::Author));
    }

    #[test]
    fn negation_and_clause_nesting() {
        let tokens = lex("(and a=Turing -a=Turing)").unwrap();
        assert_eq!(tokens[0], Token::ClauseStart);
        assert_eq!(tokens[1], Token::ClauseOp(ClauseOp::And, false));
        assert_eq!(tokens[2], Token::ClauseStart);
        assert_eq!(tokens[3], Token::ClauseOp(ClauseOp::And, true));
        assert!(tokens.contains(&Token::Negate));
        assert_eq!(tokens[tokens.len() - 2], Token::ClauseEnd);
        assert_eq!(tokens[tokens.len() - 1], Token::ClauseEnd);
    }

    #[test]
    fn bare_paren_gets_implicit_and() {
        let tokens = lex("(t=a)").unwrap();
        // outer synthetic wrap, then the user's own bare "(" with And injected.
        assert_eq!(tokens[2], Token::ClauseStart);
        assert_eq!(tokens[3], Token::ClauseOp(ClauseOp::And, false));
    }

    #[test]
    fn dangling_open_is_closed_at_eof() {
        let tokens = lex("(t=a").unwrap();
        // one synthetic AND-injected user "(" plus the outer wrap: two closes at the end.
        assert_eq!(tokens[tokens.len() - 1], Token::ClauseEnd);
        assert_eq!(tokens[tokens.len() - 2], Token::ClauseEnd);
    }

    #[test]
    fn quoted_value_stops_at_closing_quote() {
        let tokens = inner(lex(r#"title="A title""#).unwrap());
        assert_eq!(tokens[2], Token::Value("A title".to_string()));
    }

    #[test]
    fn regex_operator_and_ap_aliases() {
        let tokens = inner(lex("title!re!^A tags:rust tags~rust").unwrap());
        assert_eq!(tokens[1], Token::Operator(Operator::Re));
        assert_eq!(tokens[4], Token::Operator(Operator::Ap));
        assert_eq!(tokens[7], Token::Operator(Operator::Ap));
    }

    #[test]
    fn unknown_category_word_is_tagged_unknown() {
        let tokens = inner(lex("bogus=1").unwrap());
        assert!(matches!(tokens[0], Token::Unknown(_)));
    }

    #[test]
    fn bareword_value_stops_before_close_paren() {
        let tokens = lex("(t=a)").unwrap();
        // [0]=outer(, [1]=outer AND, [2]=user(, [3]=injected AND, [4]=Category, [5]=Operator, [6]=Value, [7]=user), [8]=outer)
        assert_eq!(tokens[6], Token::Value("a".to_string()));
        assert_eq!(tokens[7], Token::ClauseEnd);
    }
}
