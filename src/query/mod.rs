//! The query pipeline (spec §4.4, §4.5): text → [`lexer`] → [`parser`]
//! → [`optimizer`] → [`compiler`] → artifact.

pub mod compiler;
pub mod lexer;
pub mod optimizer;
pub mod parser;

use crate::domain::Clause;
use crate::error::Result;

/// A compiled query: a relational WHERE body and its bound args
/// (spec §3 "Compilation artifact").
#[derive(Debug, Clone)]
pub struct Artifact {
    pub where_body: String,
    pub args: Vec<String>,
}

/// Runs the full text-to-artifact pipeline (spec §2 "Data flow for
/// queries: text → E → F → G → H").
pub fn compile(query_text: &str, optimize_level: usize, workers: usize) -> Result<Artifact> {
    let tokens = lexer::lex(query_text)?;
    let clause = parser::parse(tokens)?;
    let optimized = optimizer::optimize(clause, optimize_level, workers)?;
    compiler::compile(&optimized)
}

/// Evaluates a clause tree directly against a single document,
/// without going through the SQL compiler. Used by the optimizer's
/// round-trip tests (spec §8: "evaluate(C, d) = evaluate(Optimize(C),
/// d)") and is not part of the public operation surface.
#[cfg(test)]
pub(crate) fn evaluate(clause: &Clause, doc: &crate::domain::Document) -> bool {
    use crate::domain::{Category, ClauseOp, Operator, Value};

    let eval_statement = |s: &crate::domain::Statement| -> bool {
        let result = match s.category {
            Category::Path => eval_scalar(s.operator, &s.value, &doc.path),
            Category::Title => eval_scalar(s.operator, &s.value, &doc.title),
            Category::Meta => eval_scalar(s.operator, &s.value, &doc.other_meta),
            Category::Author => eval_set(s.operator, &s.value, &doc.authors),
            Category::Tags => eval_set(s.operator, &s.value, &doc.tags),
            Category::Links => eval_set(s.operator, &s.value, &doc.links),
            Category::Date => eval_ordered(s.operator, &s.value, doc.date),
            Category::FileTime => eval_ordered(s.operator, &s.value, Some(doc.file_time)),
        };
        if s.negated {
            !result
        } else {
            result
        }
    };

    fn eval_scalar(op: Operator, value: &Value, field: &str) -> bool {
        let Some(v) = value.as_str() else { return false };
        match op {
            Operator::Eq => field == v,
            Operator::Ne => field != v,
            Operator::Ap => field.contains(v),
            Operator::Re => regex::Regex::new(v).map(|re| re.is_match(field)).unwrap_or(false),
            Operator::Lt => field < v,
            Operator::Le => field <= v,
            Operator::Ge => field >= v,
            Operator::Gt => field > v,
            Operator::Pipe | Operator::Arg => true,
        }
    }

    fn eval_set(op: Operator, value: &Value, field: &[String]) -> bool {
        let Some(v) = value.as_str() else { return false };
        match op {
            Operator::Eq => field.iter().any(|x| x == v),
            Operator::Ne => !field.iter().any(|x| x == v),
            Operator::Ap => field.iter().any(|x| x.contains(v)),
            Operator::Re => regex::Regex::new(v)
                .map(|re| field.iter().any(|x| re.is_match(x)))
                .unwrap_or(false),
            _ => true,
        }
    }

    fn eval_ordered(op: Operator, value: &Value, field: Option<chrono::NaiveDateTime>) -> bool {
        let Some(field) = field else { return false };
        let Some(v) = value.as_instant() else { return false };
        match op {
            Operator::Eq => field == v,
            Operator::Ne => field != v,
            Operator::Lt => field < v,
            Operator::Le => field <= v,
            Operator::Ge => field >= v,
            Operator::Gt => field > v,
            Operator::Ap => {
                let (start, stop) = crate::query::compiler::fuzz_datetime(v);
                field >= start && field <= stop
            }
            _ => true,
        }
    }

    match clause.operator {
        ClauseOp::And => {
            clause.statements.iter().all(eval_statement)
                && clause.children.iter().all(|c| evaluate(c, doc))
        }
        ClauseOp::Or => {
            clause.statements.iter().any(eval_statement)
                || clause.children.iter().any(|c| evaluate(c, doc))
        }
    }
}
