//! The clause tree: the query IR shared by the parser, optimizer and
//! backend compiler (spec §3, §9 Design Notes: "a tagged-union
//! `ClauseOp{And,Or}` with vectors of child Clause and Statement").

use chrono::NaiveDateTime;
use derive_more::Display;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseOp {
    And,
    Or,
}

/// A document attribute a [`Statement`] can test (spec §3). `Display`
/// renders the column name the backend compiler targets (§4.5) —
/// used in `tracing` events when the optimizer inerts a clause and in
/// [`crate::error::Error::Compile`] messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Category {
    #[display("path")]
    Path,
    #[display("title")]
    Title,
    #[display("author")]
    Author,
    #[display("date")]
    Date,
    #[display("fileTime")]
    FileTime,
    #[display("tags")]
    Tags,
    #[display("links")]
    Links,
    #[display("meta")]
    Meta,
}

impl Category {
    /// SET categories: EQ means set membership (spec §3, §9).
    pub fn is_set(self) -> bool {
        matches!(self, Category::Author | Category::Tags | Category::Links)
    }

    /// ORDERED categories: AP means a fuzzy window (spec §3).
    pub fn is_ordered(self) -> bool {
        matches!(self, Category::Date | Category::FileTime)
    }

    /// The column this category maps to in the `Search` view (§4.5).
    pub fn column(self) -> &'static str {
        match self {
            Category::Path => "path",
            Category::Title => "title",
            Category::Author => "author",
            Category::Date => "date",
            Category::FileTime => "fileTime",
            Category::Tags => "tag",
            Category::Links => "link",
            Category::Meta => "meta",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Ap,
    Lt,
    Le,
    Ge,
    Gt,
    Re,
    /// Reserved for external command integration; opaque to the
    /// compiler (spec §3, §4.5).
    Pipe,
    /// Reserved for external command integration; opaque to the
    /// compiler (spec §3, §4.5).
    Arg,
}

impl Operator {
    /// Flips an operator to its logical inverse, used by Simplify
    /// (§4.4.3) to push negation into the operator where possible.
    /// `Ap`, `Pipe` and `Arg` are left as negated statements, per
    /// spec.
    pub fn invert(self) -> Option<Operator> {
        match self {
            Operator::Eq => Some(Operator::Ne),
            Operator::Ne => Some(Operator::Eq),
            Operator::Lt => Some(Operator::Ge),
            Operator::Ge => Some(Operator::Lt),
            Operator::Le => Some(Operator::Gt),
            Operator::Gt => Some(Operator::Le),
            Operator::Ap | Operator::Re | Operator::Pipe | Operator::Arg => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Instant(NaiveDateTime),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Instant(_) => None,
        }
    }

    pub fn as_instant(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Instant(t) => Some(*t),
            Value::Str(_) => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Instant(a), Value::Instant(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// A single predicate: `[¬] category op value` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub negated: bool,
    pub category: Category,
    pub operator: Operator,
    pub value: Value,
}

impl Statement {
    pub fn new(negated: bool, category: Category, operator: Operator, value: Value) -> Self {
        Self { negated, category, operator, value }
    }

    /// The `(category, operator, negated, value)` total order used by
    /// Compact/equality checks (§4.4.3): "two statements are equal
    /// when all four components match after Simplify."
    pub fn sort_key(&self) -> (u8, u8, bool, &Value) {
        (self.category as u8, self.operator as u8, self.negated, &self.value)
    }

    /// Pushes negation into the operator where possible (Simplify,
    /// §4.4.3): `NE<->EQ`, `LT<->GE`, `LE<->GT`. `AP`, `PIPE`, `ARG`
    /// remain negated.
    pub fn simplify(&self) -> Statement {
        if self.negated {
            if let Some(inverted) = self.operator.invert() {
                return Statement {
                    negated: false,
                    category: self.category,
                    operator: inverted,
                    value: self.value.clone(),
                };
            }
        }
        self.clone()
    }

    /// The inverse statement — same category/value, opposite truth
    /// value — used by the Contradictions pass (§4.4.3).
    pub fn inverse(&self) -> Statement {
        let simplified = self.simplify();
        match simplified.operator.invert() {
            Some(inverted) => Statement {
                negated: false,
                category: simplified.category,
                operator: inverted,
                value: simplified.value,
            },
            None => Statement {
                negated: !simplified.negated,
                ..simplified
            },
        }
    }
}

/// A boolean combination of statements and sub-clauses (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub operator: ClauseOp,
    pub statements: Vec<Statement>,
    pub children: Vec<Clause>,
}

impl Clause {
    pub fn new(operator: ClauseOp) -> Self {
        Self { operator, statements: Vec::new(), children: Vec::new() }
    }

    /// True once Tidy (§4.4.3) has reduced this clause to no
    /// statements and no children — an inert placeholder that
    /// propagates upward.
    pub fn is_inert(&self) -> bool {
        self.statements.is_empty() && self.children.is_empty()
    }

    /// Maximum nesting depth, counting this clause as depth 1. Used
    /// to enforce the 16-deep compile limit (§4.4.3) and the
    /// `Depth(Optimize(C)) ≤ Depth(C)` invariant (§8).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Clause::depth).max().unwrap_or(0)
    }
}
