//! Filter predicate expressions and three-valued evaluation
//!
//! Predicates re-applied by the federation layer over merged streams use a
//! small expression form: constants, variable references, comparisons, the
//! logical connectives, and `Bound`.
//!
//! # Evaluation Semantics
//!
//! Evaluation is three-valued. A predicate yields:
//!
//! - `Ok(Some(true))` - defined true, the row passes
//! - `Ok(Some(false))` - defined false
//! - `Ok(None)` - undefined (an operand was unbound)
//! - `Err(TypeError)` - the operands cannot be compared
//!
//! The filter cursor keeps a row only for defined-true; false, undefined,
//! and type errors all drop it. Inside `And`/`Or` a type error behaves like
//! undefined, so `false && error` is still `false` and `true || error` is
//! still `true`.
//!
//! Evaluation reads rows through a [`ScopedRow`]: variables outside the
//! declared scope answer as unbound even when the underlying row binds them.

use meridian_core::term::Numeric;
use meridian_core::vocab::xsd;
use meridian_core::{Row, Term, VarId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;

/// Operand types that cannot be compared
///
/// Not an evaluation failure: the enclosing filter treats it as
/// "filtered out".
#[derive(Error, Debug, Clone, PartialEq)]
#[error("type error: {0}")]
pub struct TypeError(pub String);

/// Comparison operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A filter predicate expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A constant term
    Const(Term),
    /// A variable reference
    Var(VarId),
    /// Binary comparison
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    /// Logical conjunction
    And(Box<Expr>, Box<Expr>),
    /// Logical disjunction
    Or(Box<Expr>, Box<Expr>),
    /// Logical negation
    Not(Box<Expr>),
    /// Test whether a variable is bound
    Bound(VarId),
}

impl Expr {
    /// Shorthand for a comparison against two sub-expressions
    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Compare(op, Box::new(lhs), Box::new(rhs))
    }

    /// Collect the variables this expression mentions
    pub fn variables(&self, out: &mut BTreeSet<VarId>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(var) | Expr::Bound(var) => {
                out.insert(*var);
            }
            Expr::Compare(_, lhs, rhs) | Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                lhs.variables(out);
                rhs.variables(out);
            }
            Expr::Not(inner) => inner.variables(out),
        }
    }
}

/// A row restricted to a declared variable scope
///
/// The predicate evaluator sees only in-scope variables; everything else
/// reads as unbound. This is what lets a filter written against a
/// subquery's own variables work unchanged when the subquery is embedded in
/// a larger plan whose rows carry extra bindings.
#[derive(Clone, Copy, Debug)]
pub struct ScopedRow<'a> {
    row: &'a Row,
    scope: Option<&'a BTreeSet<VarId>>,
}

impl<'a> ScopedRow<'a> {
    /// View a row with every variable in scope
    pub fn full(row: &'a Row) -> Self {
        Self { row, scope: None }
    }

    /// View a row restricted to `scope`
    pub fn scoped(row: &'a Row, scope: &'a BTreeSet<VarId>) -> Self {
        Self {
            row,
            scope: Some(scope),
        }
    }

    /// Get the term bound to an in-scope variable
    pub fn get(&self, var: VarId) -> Option<&'a Term> {
        match self.scope {
            Some(scope) if !scope.contains(&var) => None,
            _ => self.row.get(var),
        }
    }
}

/// Evaluate a predicate against a (scoped) row
pub fn evaluate(expr: &Expr, row: &ScopedRow<'_>) -> Result<Option<bool>, TypeError> {
    match expr {
        Expr::Bound(var) => Ok(Some(row.get(*var).is_some())),
        Expr::Not(inner) => Ok(evaluate(inner, row)?.map(|b| !b)),
        Expr::And(lhs, rhs) => {
            let lhs = evaluate(lhs, row);
            let rhs = evaluate(rhs, row);
            connective(lhs, rhs, false)
        }
        Expr::Or(lhs, rhs) => {
            let lhs = evaluate(lhs, row);
            let rhs = evaluate(rhs, row);
            connective(lhs, rhs, true)
        }
        Expr::Compare(op, lhs, rhs) => {
            let (Some(lhs), Some(rhs)) = (eval_term(lhs, row)?, eval_term(rhs, row)?) else {
                return Ok(None);
            };
            compare_terms(*op, &lhs, &rhs).map(Some)
        }
        Expr::Const(_) | Expr::Var(_) => match eval_term(expr, row)? {
            Some(term) => effective_boolean(&term).map(Some),
            None => Ok(None),
        },
    }
}

/// Three-valued And/Or: `short` is the dominating value (false for And,
/// true for Or); a type error on one side behaves like undefined
fn connective(
    lhs: Result<Option<bool>, TypeError>,
    rhs: Result<Option<bool>, TypeError>,
    short: bool,
) -> Result<Option<bool>, TypeError> {
    if lhs == Ok(Some(short)) || rhs == Ok(Some(short)) {
        return Ok(Some(short));
    }
    match (lhs?, rhs?) {
        (Some(a), Some(b)) => Ok(Some(a && b || (a || b) && short)),
        _ => Ok(None),
    }
}

/// Evaluate an expression to a term; `None` means an operand was unbound
fn eval_term(expr: &Expr, row: &ScopedRow<'_>) -> Result<Option<Term>, TypeError> {
    match expr {
        Expr::Const(term) => Ok(Some(term.clone())),
        Expr::Var(var) => Ok(row.get(*var).cloned()),
        other => match evaluate(other, row)? {
            Some(value) => Ok(Some(Term::boolean(value))),
            None => Ok(None),
        },
    }
}

/// The effective boolean value of a term standing in boolean position
fn effective_boolean(term: &Term) -> Result<bool, TypeError> {
    match term {
        Term::Literal { datatype, .. } if datatype.as_ref() == xsd::BOOLEAN => term
            .as_boolean()
            .map_err(|_| TypeError(format!("malformed boolean literal {term}"))),
        Term::Literal { lexical, datatype, .. } if datatype.as_ref() == xsd::STRING => {
            Ok(!lexical.is_empty())
        }
        _ if term.is_numeric() => {
            let n = term
                .as_numeric()
                .map_err(|_| TypeError(format!("malformed numeric literal {term}")))?;
            Ok(match n {
                Numeric::Integer(i) => i != 0,
                Numeric::Double(d) => d != 0.0 && !d.is_nan(),
            })
        }
        _ => Err(TypeError(format!("{term} has no boolean value"))),
    }
}

/// Compare two concrete terms
fn compare_terms(op: CompareOp, lhs: &Term, rhs: &Term) -> Result<bool, TypeError> {
    if lhs.is_numeric() && rhs.is_numeric() {
        let (a, b) = (
            lhs.as_numeric()
                .map_err(|_| TypeError(format!("malformed numeric literal {lhs}")))?,
            rhs.as_numeric()
                .map_err(|_| TypeError(format!("malformed numeric literal {rhs}")))?,
        );
        return match a.partial_cmp(b) {
            Some(ordering) => Ok(apply(op, ordering)),
            // NaN: only (in)equality is defined.
            None => match op {
                CompareOp::Eq => Ok(false),
                CompareOp::Ne => Ok(true),
                _ => Err(TypeError("NaN is not ordered".to_string())),
            },
        };
    }

    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let equal = term_equal(lhs, rhs)?;
            Ok(if op == CompareOp::Eq { equal } else { !equal })
        }
        _ => {
            let ordering = term_order(lhs, rhs)?;
            Ok(apply(op, ordering))
        }
    }
}

fn apply(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

/// Term equality for the non-numeric cases
fn term_equal(lhs: &Term, rhs: &Term) -> Result<bool, TypeError> {
    match (lhs, rhs) {
        (Term::Iri { iri: a }, Term::Iri { iri: b }) => Ok(a == b),
        (Term::Blank { label: a }, Term::Blank { label: b }) => Ok(a == b),
        (
            Term::Literal {
                lexical: a,
                datatype: da,
                language: la,
            },
            Term::Literal {
                lexical: b,
                datatype: db,
                language: lb,
            },
        ) => {
            if da == db && la == lb {
                Ok(a == b)
            } else {
                Err(TypeError(format!("cannot compare {lhs} with {rhs}")))
            }
        }
        // Different term kinds are simply unequal.
        _ => Ok(false),
    }
}

/// Term ordering for the non-numeric cases: strings and booleans only
fn term_order(lhs: &Term, rhs: &Term) -> Result<Ordering, TypeError> {
    match (lhs, rhs) {
        (
            Term::Literal {
                lexical: a,
                datatype: da,
                language: None,
            },
            Term::Literal {
                lexical: b,
                datatype: db,
                language: None,
            },
        ) if da.as_ref() == xsd::STRING && db.as_ref() == xsd::STRING => Ok(a.cmp(b)),
        (Term::Literal { datatype: da, .. }, Term::Literal { datatype: db, .. })
            if da.as_ref() == xsd::BOOLEAN && db.as_ref() == xsd::BOOLEAN =>
        {
            let (a, b) = (
                lhs.as_boolean()
                    .map_err(|_| TypeError(format!("malformed boolean literal {lhs}")))?,
                rhs.as_boolean()
                    .map_err(|_| TypeError(format!("malformed boolean literal {rhs}")))?,
            );
            Ok(a.cmp(&b))
        }
        _ => Err(TypeError(format!("{lhs} and {rhs} are not ordered"))),
    }
}
