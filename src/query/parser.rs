//! Builds a clause tree from the lexer's token stream (spec §4.4.2):
//! an explicit stack of open [`Clause`]s, one push per `ClauseStart`
//! and one pop-and-attach per `ClauseEnd`. Ordering beyond what the
//! stack naturally enforces (operator must follow category, value
//! must follow operator, …) is checked inline as each token is
//! consumed.

use crate::dates;
use crate::domain::{Category, Clause, ClauseOp, Statement, Value};
use crate::error::{Error, Result};
use crate::query::lexer::Token;

const MAX_DEPTH: usize = 16;

/// One open clause on the parser's stack. `locked` tracks whether the
/// clause's operator has been pinned down by an explicit `and`/`or` —
/// either the one the lexer requires right after `ClauseStart`, when
/// the caller wrote it themselves, or the first bare infix occurrence
/// between statements — so a later, disagreeing occurrence is
/// rejected instead of silently overwriting it.
struct Frame {
    clause: Clause,
    locked: bool,
}

/// Builds the single top-level clause from `tokens` (the output of
/// [`crate::query::lexer::lex`], already wrapped in an outer
/// `( and … )`).
pub fn parse(tokens: Vec<Token>) -> Result<Clause> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut pending_negated = false;
    let mut i = 0usize;

    while i < tokens.len() {
        match &tokens[i] {
            Token::ClauseStart => {
                i += 1;
                let (op, locked) = match tokens.get(i) {
                    Some(Token::ClauseOp(op, explicit)) => {
                        i += 1;
                        (*op, *explicit)
                    }
                    _ => {
                        return Err(Error::ParseToken {
                            offset: i,
                            reason: "expected clause operator after '('".to_string(),
                        })
                    }
                };
                if stack.len() >= MAX_DEPTH {
                    return Err(Error::Compile {
                        reason: format!("clause nesting exceeds the maximum depth of {MAX_DEPTH}"),
                    });
                }
                stack.push(Frame { clause: Clause::new(op), locked });
            }

            Token::ClauseEnd => {
                let finished = stack.pop().ok_or_else(|| Error::ParseToken {
                    offset: i,
                    reason: "unmatched ')'".to_string(),
                })?;
                i += 1;
                match stack.last_mut() {
                    Some(parent) => parent.clause.children.push(finished.clause),
                    None => {
                        if i == tokens.len() {
                            return Ok(finished.clause);
                        }
                        return Err(Error::ParseToken {
                            offset: i,
                            reason: "trailing tokens after the top-level clause".to_string(),
                        });
                    }
                }
            }

            Token::Negate => {
                pending_negated = true;
                i += 1;
            }

            Token::Category(cat) => {
                let category = *cat;
                i += 1;

                let operator = match tokens.get(i) {
                    Some(Token::Operator(op)) => {
                        i += 1;
                        *op
                    }
                    _ => {
                        return Err(Error::ParseToken {
                            offset: i,
                            reason: "expected an operator after a category".to_string(),
                        })
                    }
                };

                let raw = match tokens.get(i) {
                    Some(Token::Value(v)) => {
                        i += 1;
                        v.clone()
                    }
                    _ => {
                        return Err(Error::ParseToken {
                            offset: i,
                            reason: "expected a value after an operator".to_string(),
                        })
                    }
                };

                let value = resolve_value(category, raw)?;
                let negated = pending_negated;
                pending_negated = false;

                let frame = stack.last_mut().ok_or_else(|| Error::ParseToken {
                    offset: i,
                    reason: "statement outside of any clause".to_string(),
                })?;
                frame.clause.statements.push(Statement::new(negated, category, operator, value));
            }

            // A bare `and`/`or` between statements at the current
            // nesting depth (not the lookahead `ClauseStart` consumes)
            // sets the enclosing clause's operator the first time it's
            // seen; a later occurrence that disagrees is a conflicting
            // operator within one clause, which the grammar does not
            // allow (§3, §9 "uniform operator per clause").
            Token::ClauseOp(op, _) => {
                let op = *op;
                let frame = stack.last_mut().ok_or_else(|| Error::ParseToken {
                    offset: i,
                    reason: "clause operator outside of any clause".to_string(),
                })?;
                if frame.locked && frame.clause.operator != op {
                    return Err(Error::ParseToken {
                        offset: i,
                        reason: "a clause may not mix 'and' and 'or'".to_string(),
                    });
                }
                frame.clause.operator = op;
                frame.locked = true;
                i += 1;
            }

            Token::Operator(_) => {
                return Err(Error::ParseToken {
                    offset: i,
                    reason: "operator may only follow a category".to_string(),
                })
            }

            Token::Value(_) => {
                return Err(Error::ParseToken {
                    offset: i,
                    reason: "value may only follow an operator".to_string(),
                })
            }

            Token::Unknown(word) => {
                return Err(Error::ParseToken {
                    offset: i,
                    reason: format!("unrecognized category or keyword {word:?}"),
                })
            }
        }
    }

    Err(Error::ParseToken { offset: i, reason: "unexpected end of query".to_string() })
}

/// Ordered categories parse their raw value as a datetime via the
/// same multi-format parser the header uses (spec §4.4.2); all
/// others keep the raw string.
fn resolve_value(category: Category, raw: String) -> Result<Value> {
    if category.is_ordered() {
        dates::parse_any(&raw)
            .map(Value::Instant)
            .ok_or(Error::DatetimeTokenParse { value: raw })
    } else {
        Ok(Value::Str(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Operator;
    use crate::query::lexer::lex;

    #[test]
    fn parses_single_statement_into_wrapped_and() {
        let clause = parse(lex("t=a").unwrap()).unwrap();
        assert_eq!(clause.operator, ClauseOp::And);
        assert_eq!(clause.statements.len(), 1);
        assert_eq!(clause.statements[0].category, Category::Tags);
        assert_eq!(clause.statements[0].operator, Operator::Eq);
    }

    #[test]
    fn parses_nested_clause() {
        let clause = parse(lex("(and a=Turing -a=Turing)").unwrap()).unwrap();
        assert_eq!(clause.children.len(), 1);
        let inner = &clause.children[0];
        assert_eq!(inner.statements.len(), 2);
        assert!(inner.statements[1].negated);
    }

    #[test]
    fn or_clause_parses() {
        let clause = parse(lex("t=a or t=c").unwrap()).unwrap();
        assert_eq!(clause.operator, ClauseOp::Or);
        assert_eq!(clause.statements.len(), 2);
    }

    #[test]
    fn mixed_infix_operators_in_one_clause_is_a_parse_error() {
        assert!(parse(lex("t=a or t=b and t=c").unwrap()).is_err());
    }

    #[test]
    fn unknown_category_is_a_parse_error() {
        assert!(parse(lex("bogus=1").unwrap()).is_err());
    }

    #[test]
    fn bad_datetime_value_is_a_parse_error() {
        assert!(matches!(
            parse(lex("d=not-a-date").unwrap()),
            Err(Error::DatetimeTokenParse { .. })
        ));
    }

    #[test]
    fn date_fuzzy_operator_parses_instant() {
        let clause = parse(lex("d:2025-06-14").unwrap()).unwrap();
        assert!(matches!(clause.statements[0].value, Value::Instant(_)));
    }
}
