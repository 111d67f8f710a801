//! Backend compiler (spec §4.5): clause tree → parameterized
//! `WHERE` body plus its argument vector, to be embedded into
//! `SELECT DISTINCT docId, path, title, date, fileTime, meta FROM
//! Search WHERE <whereBody>` (the `Search` view is defined in
//! `migrations/0001_init.sql`).

use crate::domain::{Category, Clause, ClauseOp, Operator, Statement, Value};
use crate::error::{Error, Result};
use crate::query::Artifact;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use std::collections::HashMap;

const MAX_DEPTH: usize = 16;

pub fn compile(clause: &Clause) -> Result<Artifact> {
    if clause.depth() > MAX_DEPTH {
        return Err(Error::Compile {
            reason: format!("clause depth exceeds the maximum of {MAX_DEPTH}"),
        });
    }

    let mut args = Vec::new();
    let where_body = compile_clause(clause, &mut args);
    Ok(Artifact { where_body, args })
}

fn compile_clause(clause: &Clause, args: &mut Vec<String>) -> String {
    let delim = match clause.operator {
        ClauseOp::And => " AND ",
        ClauseOp::Or => " OR ",
    };

    // Set-category EQ/NE statements sharing an operator are grouped
    // into one IN/NOT IN list (spec §4.5: "reduce plan size").
    let mut grouped: HashMap<(Category, Operator, bool), Vec<&Statement>> = HashMap::new();
    let mut singles = Vec::new();

    for s in &clause.statements {
        if s.category.is_set() && matches!(s.operator, Operator::Eq | Operator::Ne) {
            grouped.entry((s.category, s.operator, s.negated)).or_default().push(s);
        } else {
            singles.push(s);
        }
    }

    let mut items: Vec<String> = Vec::new();
    for ((category, operator, negated), stmts) in grouped {
        items.push(render_in_group(category, operator, negated, &stmts, args));
    }
    for s in singles {
        items.push(render_statement(s, args));
    }
    for child in &clause.children {
        items.push(format!("({})", compile_clause(child, args)));
    }

    if items.is_empty() {
        // An inert clause only arises from a contradiction surviving
        // to compile time (spec §8 scenario 5) — render it as always
        // false so the result set is empty.
        "1 = 0".to_string()
    } else {
        items.join(delim)
    }
}

fn render_in_group(
    category: Category,
    operator: Operator,
    negated: bool,
    stmts: &[&Statement],
    args: &mut Vec<String>,
) -> String {
    let column = category.column();
    let sql_op = match (operator, negated) {
        (Operator::Eq, false) | (Operator::Ne, true) => "IN",
        (Operator::Eq, true) | (Operator::Ne, false) => "NOT IN",
        _ => unreachable!("grouping only collects Eq/Ne statements"),
    };
    let placeholders = vec!["?"; stmts.len()].join(", ");
    for s in stmts {
        if let Some(v) = s.value.as_str() {
            args.push(v.to_string());
        }
    }
    format!("{column} {sql_op} ({placeholders})")
}

fn render_statement(stmt: &Statement, args: &mut Vec<String>) -> String {
    let simplified = stmt.simplify();
    let column = simplified.category.column();
    let set = simplified.category.is_set();
    let ordered = simplified.category.is_ordered();

    let rendered = match simplified.operator {
        Operator::Eq => eq_like(column, set, false, &simplified.value, args),
        Operator::Ne => eq_like(column, set, true, &simplified.value, args),
        Operator::Lt => cmp(column, "<", &simplified.value, args),
        Operator::Le => cmp(column, "<=", &simplified.value, args),
        Operator::Ge => cmp(column, ">=", &simplified.value, args),
        Operator::Gt => cmp(column, ">", &simplified.value, args),
        Operator::Re => regex_pred(column, &simplified.value, args),
        Operator::Ap if ordered => fuzz_pred(column, &simplified.value),
        Operator::Ap => like_pred(column, &simplified.value, args),
        // Reserved for external command integration; opaque to this
        // compiler (spec §3, §4.5) — always true.
        Operator::Pipe | Operator::Arg => "1 = 1".to_string(),
    };

    if simplified.negated {
        format!("NOT ({rendered})")
    } else {
        rendered
    }
}

fn eq_like(column: &str, set: bool, negate: bool, value: &Value, args: &mut Vec<String>) -> String {
    let op = match (set, negate) {
        (true, false) => "IN",
        (true, true) => "NOT IN",
        (false, false) => "=",
        (false, true) => "!=",
    };
    match value {
        Value::Str(s) => {
            args.push(s.clone());
            if set {
                format!("{column} {op} (?)")
            } else {
                format!("{column} {op} ?")
            }
        }
        Value::Instant(t) => format!("{column} {op} {}", t.and_utc().timestamp()),
    }
}

fn cmp(column: &str, op: &str, value: &Value, args: &mut Vec<String>) -> String {
    match value {
        Value::Str(s) => {
            args.push(s.clone());
            format!("{column} {op} ?")
        }
        Value::Instant(t) => format!("{column} {op} {}", t.and_utc().timestamp()),
    }
}

/// `RE` has no native SQLite operator; the store registers a
/// `REGEXP` application-defined function backed by the `regex` crate
/// (see `store::sqlite`) so this compiles to the syntax SQLite
/// resolves such functions with.
fn regex_pred(column: &str, value: &Value, args: &mut Vec<String>) -> String {
    let s = value.as_str().unwrap_or_default().to_string();
    args.push(s);
    format!("{column} REGEXP ?")
}

fn like_pred(column: &str, value: &Value, args: &mut Vec<String>) -> String {
    let s = value.as_str().unwrap_or_default();
    args.push(format!("%{s}%"));
    format!("{column} LIKE ?")
}

fn fuzz_pred(column: &str, value: &Value) -> String {
    let t = value.as_instant().unwrap_or_else(|| unreachable!("ordered category carries an instant"));
    let (start, stop) = fuzz_datetime(t);
    format!("{column} BETWEEN {} AND {}", start.and_utc().timestamp(), stop.and_utc().timestamp())
}

/// Symmetric window around `t` whose half-width depends on the
/// most-significant non-default field set on it (spec §4.5).
pub(crate) fn fuzz_datetime(t: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let half = if t.second() != 0 {
        Duration::minutes(5)
    } else if t.minute() != 0 {
        Duration::minutes(30)
    } else if t.hour() != 0 {
        Duration::hours(4)
    } else if t.day() != 1 {
        Duration::hours(84) // 3.5 days
    } else if t.month() != 1 {
        Duration::days(14)
    } else {
        Duration::days(182) // ~6 months
    };
    (t - half, t + half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{lexer::lex, parser::parse};

    fn compile_text(text: &str) -> Artifact {
        let clause = parse(lex(text).unwrap()).unwrap();
        compile(&clause).unwrap()
    }

    #[test]
    fn eq_on_scalar_uses_placeholder() {
        let artifact = compile_text("title=Foo");
        assert!(artifact.where_body.contains("title = ?"));
        assert_eq!(artifact.args, vec!["Foo".to_string()]);
    }

    #[test]
    fn eq_on_set_category_uses_in_list() {
        let artifact = compile_text("t=a or t=c");
        assert!(artifact.where_body.contains("tag IN (?, ?)"));
    }

    #[test]
    fn ap_on_ordered_expands_to_between_with_inline_literals() {
        let artifact = compile_text("d:2025-06-14");
        assert!(artifact.where_body.contains("BETWEEN"));
        assert!(artifact.args.is_empty());
    }

    #[test]
    fn ap_on_scalar_uses_like_placeholder() {
        let artifact = compile_text("title~partial");
        assert!(artifact.where_body.contains("title LIKE ?"));
        assert_eq!(artifact.args, vec!["%partial%".to_string()]);
    }

    /// Spec §8: `Compile(C)` and `Compile(Optimize(C))` describe the
    /// same relational query. Categories are listed here in the order
    /// `Compact`'s sort already puts them in, so a no-op optimize pass
    /// leaves the clause — and therefore the compiled artifact —
    /// byte-for-byte unchanged.
    #[test]
    fn compile_is_stable_under_optimize() {
        let text = "title=X and d>=2025-01-01 and t=a";
        let clause = parse(lex(text).unwrap()).unwrap();
        let direct = compile(&clause).unwrap();

        let optimized = crate::query::optimizer::optimize(clause, 16, 2).unwrap();
        let via_optimizer = compile(&optimized).unwrap();

        assert_eq!(direct.where_body, via_optimizer.where_body);
        assert_eq!(direct.args, via_optimizer.args);
    }

    #[test]
    fn fuzz_window_widens_with_coarser_precision() {
        let day = chrono::NaiveDate::from_ymd_opt(2025, 6, 14).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let (start, stop) = fuzz_datetime(day);
        assert_eq!((stop - start).num_hours(), 168);

        let month = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let (start, stop) = fuzz_datetime(month);
        assert_eq!((stop - start).num_days(), 28);
    }
}
