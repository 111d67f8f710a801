//! Algebraic rewrites over the clause tree (spec §4.4.3). Passes 1-4
//! (Compact, StrictEquality, Tighten, Contradictions) touch only a
//! clause's own statement list and may run in parallel across
//! sibling clauses via `rayon`; Tidy and Flatten mutate child lists
//! and must run serially, bottom-up.

use crate::domain::{Category, Clause, ClauseOp, Operator, Statement};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use rayon::prelude::*;

const MAX_DEPTH: usize = 16;

/// Runs the fixed-order pass pipeline, repeating until depth stops
/// decreasing or `level` iterations have run, whichever comes first
/// (spec §4.4.3: "repeating up to the tree's depth or a
/// user-specified level; stop when depth does not decrease").
pub fn optimize(mut clause: Clause, level: usize, workers: usize) -> Result<Clause> {
    let iterations = level.min(clause.depth()).max(1);
    let mut prev_depth = clause.depth();

    for _ in 0..iterations {
        clause = run_pass(clause, workers);
        let depth = clause.depth();
        if depth >= prev_depth {
            break;
        }
        prev_depth = depth;
    }

    if clause.depth() > MAX_DEPTH {
        return Err(Error::Compile {
            reason: format!("clause depth exceeds the maximum of {MAX_DEPTH}"),
        });
    }

    Ok(clause)
}

fn run_pass(mut clause: Clause, workers: usize) -> Clause {
    non_restructuring(&mut clause, workers);
    tidy(&mut clause);
    flatten(&mut clause);
    clause
}

/// Compact, StrictEquality, Tighten and Contradictions: none of these
/// touch `children`'s structure, only `statements`, so sibling
/// clauses can be processed independently (spec §4.4.3 "Parallelism
/// rule").
fn non_restructuring(clause: &mut Clause, workers: usize) {
    simplify_statements(clause);
    compact(clause);
    strict_equality(clause);
    tighten(clause);
    contradictions(clause);

    if workers > 1 {
        clause.children.par_iter_mut().for_each(|c| non_restructuring(c, workers));
    } else {
        clause.children.iter_mut().for_each(|c| non_restructuring(c, workers));
    }
}

fn simplify_statements(clause: &mut Clause) {
    for s in &mut clause.statements {
        *s = s.simplify();
    }
}

fn stmt_cmp(a: &Statement, b: &Statement) -> std::cmp::Ordering {
    let (ac, ao, an, av) = a.sort_key();
    let (bc, bo, bn, bv) = b.sort_key();
    ac.cmp(&bc)
        .then(ao.cmp(&bo))
        .then(an.cmp(&bn))
        .then(av.partial_cmp(bv).unwrap_or(std::cmp::Ordering::Equal))
}

/// Sorts statements into the `(category, operator, negated, value)`
/// total order and removes adjacent duplicates (spec §4.4.3 pass 1).
fn compact(clause: &mut Clause) {
    clause.statements.sort_by(stmt_cmp);
    clause.statements.dedup_by(|a, b| stmt_cmp(a, b) == std::cmp::Ordering::Equal);
}

/// AND-only: an EQ statement makes weaker statements on the same
/// category redundant (spec §4.4.3 pass 2).
fn strict_equality(clause: &mut Clause) {
    if clause.operator != ClauseOp::And {
        return;
    }

    let categories: std::collections::HashSet<Category> =
        clause.statements.iter().map(|s| s.category).collect();
    let mut keep = vec![true; clause.statements.len()];

    for cat in categories {
        let idxs: Vec<usize> =
            (0..clause.statements.len()).filter(|&i| clause.statements[i].category == cat).collect();
        let eq_values: Vec<String> = idxs
            .iter()
            .filter(|&&i| clause.statements[i].operator == Operator::Eq)
            .filter_map(|&i| clause.statements[i].value.as_str().map(str::to_string))
            .collect();
        if eq_values.is_empty() {
            continue;
        }

        if cat.is_set() {
            for &i in &idxs {
                let s = &clause.statements[i];
                if s.operator == Operator::Ap {
                    if let Some(v) = s.value.as_str() {
                        if eq_values.iter().any(|eq| eq.contains(v) || v.contains(eq.as_str())) {
                            keep[i] = false;
                        }
                    }
                }
            }
        } else if !cat.is_ordered() {
            for &i in &idxs {
                if clause.statements[i].operator != Operator::Eq {
                    keep[i] = false;
                }
            }
        }
    }

    retain_by_mask(&mut clause.statements, &keep);
}

/// Per-category-partition bound tightening, only when a category has
/// two or more statements in this clause (spec §4.4.3 pass 3).
fn tighten(clause: &mut Clause) {
    let categories: std::collections::HashSet<Category> =
        clause.statements.iter().map(|s| s.category).collect();
    let mut keep = vec![true; clause.statements.len()];

    for cat in categories {
        let idxs: Vec<usize> =
            (0..clause.statements.len()).filter(|&i| clause.statements[i].category == cat).collect();
        if idxs.len() < 2 {
            continue;
        }

        if cat.is_ordered() {
            tighten_ordered(clause, &idxs, &mut keep);
        } else if !cat.is_set() {
            tighten_scalar(clause, &idxs, &mut keep);
        }
    }

    retain_by_mask(&mut clause.statements, &keep);
}

fn tighten_ordered(clause: &Clause, idxs: &[usize], keep: &mut [bool]) {
    let and_mode = clause.operator == ClauseOp::And;
    let mut lower: Option<usize> = None;
    let mut upper: Option<usize> = None;

    for &i in idxs {
        let s = &clause.statements[i];
        if s.value.as_instant().is_none() {
            continue;
        }
        match s.operator {
            Operator::Gt | Operator::Ge => lower = Some(pick_bound(clause, lower, i, and_mode, true)),
            Operator::Lt | Operator::Le => upper = Some(pick_bound(clause, upper, i, and_mode, false)),
            _ => {}
        }
    }

    for &i in idxs {
        let is_bound = matches!(clause.statements[i].operator, Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le);
        if is_bound && Some(i) != lower && Some(i) != upper {
            keep[i] = false;
        }
    }
}

/// Picks whichever of `current`/`candidate` is the better bound:
/// under AND the tightest (most restrictive) wins; under OR the
/// loosest (most inclusive, since it alone decides the branch) wins.
/// Ties between an exclusive (`Gt`/`Lt`) and inclusive (`Ge`/`Le`)
/// statement at the same instant favor exclusive under AND (it is
/// strictly tighter) and inclusive under OR (it is strictly looser).
fn pick_bound(clause: &Clause, current: Option<usize>, candidate: usize, and_mode: bool, is_lower: bool) -> usize {
    let Some(current) = current else { return candidate };
    let a = &clause.statements[current];
    let b = &clause.statements[candidate];
    let av: NaiveDateTime = a.value.as_instant().unwrap();
    let bv: NaiveDateTime = b.value.as_instant().unwrap();

    let b_wins_by_value = match (is_lower, and_mode) {
        (true, true) => bv > av,
        (true, false) => bv < av,
        (false, true) => bv < av,
        (false, false) => bv > av,
    };
    if b_wins_by_value {
        return candidate;
    }
    if av == bv {
        let b_exclusive = matches!(b.operator, Operator::Gt | Operator::Lt);
        let a_exclusive = matches!(a.operator, Operator::Gt | Operator::Lt);
        let b_wins_tie = if and_mode { b_exclusive && !a_exclusive } else { !b_exclusive && a_exclusive };
        if b_wins_tie {
            return candidate;
        }
    }
    current
}

/// AND drops the longer (superstring) `AP` value as redundant given
/// the shorter one already present; OR drops the shorter (substring)
/// value as redundant given the longer one already present (spec
/// §4.4.3 pass 3, SCALAR case — the quirky asymmetry is as
/// documented, not a bug).
fn tighten_scalar(clause: &mut Clause, idxs: &[usize], keep: &mut [bool]) {
    let and_mode = clause.operator == ClauseOp::And;
    for &i in idxs {
        if clause.statements[i].operator != Operator::Ap {
            continue;
        }
        let Some(vi) = clause.statements[i].value.as_str().map(str::to_string) else { continue };
        for &j in idxs {
            if i == j || clause.statements[j].operator != Operator::Ap {
                continue;
            }
            let Some(vj) = clause.statements[j].value.as_str() else { continue };
            if and_mode {
                if vi.len() > vj.len() && vi.contains(vj) {
                    keep[i] = false;
                }
            } else if vi.len() < vj.len() && vj.contains(vi.as_str()) {
                keep[i] = false;
            }
        }
    }
}

/// Detects contradictory statement pairs and reduces the clause to a
/// zero-statement placeholder when found (spec §4.4.3 pass 4). This
/// is purely informational (spec §7 `ContradictionWarning`): the
/// clause becoming inert is not an error, so it is logged rather than
/// surfaced as an `Err`.
fn contradictions(clause: &mut Clause) {
    let contradictory = match clause.operator {
        ClauseOp::And => has_and_contradiction(&clause.statements),
        ClauseOp::Or => has_inverse_pair(&clause.statements),
    };
    if contradictory {
        let categories: Vec<String> =
            clause.statements.iter().map(|s| s.category.to_string()).collect();
        tracing::warn!(categories = %categories.join(","), "clause is contradictory, dropping as inert");
        clause.statements.clear();
        clause.children.clear();
    }
}

fn has_and_contradiction(statements: &[Statement]) -> bool {
    for i in 0..statements.len() {
        for j in (i + 1)..statements.len() {
            let (a, b) = (&statements[i], &statements[j]);
            if a.category != b.category {
                continue;
            }
            let scalar = !a.category.is_ordered() && !a.category.is_set();
            if scalar && a.operator == Operator::Eq && b.operator == Operator::Eq && a.value != b.value {
                return true;
            }
            if is_inverse_of(a, b) {
                return true;
            }
        }
    }
    false
}

fn has_inverse_pair(statements: &[Statement]) -> bool {
    for i in 0..statements.len() {
        for j in (i + 1)..statements.len() {
            if is_inverse_of(&statements[i], &statements[j]) {
                return true;
            }
        }
    }
    false
}

fn is_inverse_of(a: &Statement, b: &Statement) -> bool {
    let inv = a.inverse();
    inv.category == b.category && inv.operator == b.operator && inv.negated == b.negated && inv.value == b.value
}

/// Removes zero-statement placeholders, propagating inertness upward:
/// an AND with any inert child is itself wholly inert; an OR simply
/// drops its inert children (spec §4.4.3 pass 5). Runs bottom-up.
fn tidy(clause: &mut Clause) {
    for child in &mut clause.children {
        tidy(child);
    }

    match clause.operator {
        ClauseOp::And => {
            if clause.children.iter().any(Clause::is_inert) {
                clause.statements.clear();
                clause.children.clear();
            } else {
                clause.children.retain(|c| !c.is_inert());
            }
        }
        ClauseOp::Or => clause.children.retain(|c| !c.is_inert()),
    }
}

/// Merges a child into its parent when they share an operator, or
/// when the child is a single-statement leaf (the boolean value of
/// one statement doesn't depend on AND vs OR); collapses a
/// statement-less parent with a single remaining child into that
/// child (spec §4.4.3 pass 6). Runs bottom-up.
fn flatten(clause: &mut Clause) {
    for child in &mut clause.children {
        flatten(child);
    }

    let mut kept_children = Vec::with_capacity(clause.children.len());
    for child in clause.children.drain(..) {
        let mergeable =
            child.operator == clause.operator || (child.children.is_empty() && child.statements.len() == 1);
        if mergeable {
            clause.statements.extend(child.statements);
            kept_children.extend(child.children);
        } else {
            kept_children.push(child);
        }
    }
    clause.children = kept_children;

    if clause.statements.is_empty() && clause.children.len() == 1 {
        *clause = clause.children.pop().unwrap();
    }
}

fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut it = keep.iter();
    items.retain(|_| *it.next().unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{evaluate, lexer::lex, parser::parse};
    use crate::domain::Document;

    fn compile_clause(text: &str) -> Clause {
        parse(lex(text).unwrap()).unwrap()
    }

    fn blank_doc() -> Document {
        Document {
            path: "a.md".to_string(),
            title: String::new(),
            date: None,
            file_time: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            authors: vec!["Turing".to_string()],
            tags: vec![],
            links: vec![],
            headings: String::new(),
            other_meta: String::new(),
        }
    }

    #[test]
    fn contradiction_becomes_inert() {
        let clause = compile_clause("(and a=Turing -a=Turing)");
        let optimized = optimize(clause, 16, 4).unwrap();
        assert!(optimized.is_inert() || optimized.children.iter().all(Clause::is_inert));
    }

    #[test]
    fn optimize_preserves_evaluation() {
        let doc = blank_doc();
        let clause = compile_clause("a=Turing a=Turing");
        let before = evaluate(&clause, &doc);
        let optimized = optimize(clause, 16, 1).unwrap();
        let after = evaluate(&optimized, &doc);
        assert_eq!(before, after);
    }

    #[test]
    fn optimize_does_not_increase_depth() {
        let clause = compile_clause("(and (and t=a))");
        let before_depth = clause.depth();
        let optimized = optimize(clause, 16, 2).unwrap();
        assert!(optimized.depth() <= before_depth);
    }

    /// Spec §8: `Optimize` is a fixpoint — running it again on its own
    /// output must reproduce the same tree rather than keep rewriting.
    #[test]
    fn optimize_is_idempotent() {
        let clause = compile_clause("(and (and t=a t=a) -a=Turing a=Turing title~x title=Exact)");
        let once = optimize(clause, 16, 2).unwrap();
        let twice = optimize(once.clone(), 16, 2).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn compact_drops_adjacent_duplicates() {
        let mut clause = compile_clause("t=a t=a");
        simplify_statements(&mut clause);
        compact(&mut clause);
        assert_eq!(clause.statements.len(), 1);
    }

    #[test]
    fn strict_equality_drops_non_eq_scalar_under_eq() {
        let mut clause = compile_clause("title=Exact title~partial");
        strict_equality(&mut clause);
        assert_eq!(clause.statements.len(), 1);
        assert_eq!(clause.statements[0].operator, Operator::Eq);
    }
}
