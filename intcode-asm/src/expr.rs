//! The symbolic arithmetic expressions assembled programs are built from.
//!
//! An [`Expression`] stays symbolic (it may reference a label that hasn't
//! been placed yet) until [`Expression::simplify`] folds it down against a
//! substitution table, at which point constant subtrees collapse via
//! ordinary integer arithmetic (floor division, per
//! `original_source/ic4/assembly/expressions.py`).

use std::collections::HashMap;
use std::fmt;

use num_integer::Integer;

/// Failure to fully reduce an [`Expression`] to a [`Constant`].
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum SimplifyFailure {
    #[error("reference {0:?} has no binding")]
    UnboundReference(Reference),
    #[error("division by zero")]
    DivisionByZero,
    #[error("indeterminate form 0 / 0")]
    IndeterminateDivision,
}

/// A named, not-yet-resolved position — a label or other symbolic slot.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Reference(pub String);

impl Reference {
    pub fn new(name: impl Into<String>) -> Reference {
        Reference(name.into())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A symbolic arithmetic expression.
///
/// `Sum` and `Multiply` compare and hash as unordered pairs (so `a+b == b+a`
/// as expression trees); `Subtract` and `Divide` are ordered, since they are
/// not commutative.
#[derive(Clone, Debug)]
pub enum Expression {
    Constant(i64),
    Reference(Reference),
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn reference(name: impl Into<String>) -> Expression {
        Expression::Reference(Reference::new(name))
    }

    pub fn sum(left: Expression, right: Expression) -> Expression {
        Expression::Sum(Box::new(left), Box::new(right))
    }

    pub fn subtract(left: Expression, right: Expression) -> Expression {
        Expression::Subtract(Box::new(left), Box::new(right))
    }

    pub fn multiply(left: Expression, right: Expression) -> Expression {
        Expression::Multiply(Box::new(left), Box::new(right))
    }

    pub fn divide(left: Expression, right: Expression) -> Expression {
        Expression::Divide(Box::new(left), Box::new(right))
    }

    /// The constant value, if this expression is already a bare `Constant`.
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Expression::Constant(value) => Some(*value),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.as_constant() == Some(0)
    }

    fn is_one(&self) -> bool {
        self.as_constant() == Some(1)
    }

    fn is_neg_one(&self) -> bool {
        self.as_constant() == Some(-1)
    }

    /// Reduces this expression, substituting any [`Reference`] found in
    /// `subs` (recursively — a substitution may itself contain references).
    ///
    /// If `full` is `true`, every reference must resolve to a constant and
    /// the result is always a `Constant`; an unresolved reference or an
    /// arithmetic failure (division by zero, `0/0`) is an error. If `full`
    /// is `false`, unresolved references are left in place and the partially
    /// reduced tree is returned.
    pub fn simplify(
        &self,
        subs: &HashMap<Reference, Expression>,
        full: bool,
    ) -> Result<Expression, SimplifyFailure> {
        match self {
            Expression::Constant(_) => Ok(self.clone()),

            Expression::Reference(r) => match subs.get(r) {
                Some(bound) => bound.simplify(subs, full),
                None if full => Err(SimplifyFailure::UnboundReference(r.clone())),
                None => Ok(self.clone()),
            },

            Expression::Sum(left, right) => {
                let left = left.simplify(subs, full)?;
                let right = right.simplify(subs, full)?;
                if left.is_zero() {
                    return Ok(right);
                }
                if right.is_zero() {
                    return Ok(left);
                }
                Ok(fold_constants(left, right, Expression::sum, |a, b| a + b))
            }

            Expression::Subtract(left, right) => {
                let left = left.simplify(subs, full)?;
                if left.is_zero() {
                    // 0 - x == x * -1
                    let right = right.simplify(subs, full)?;
                    return Expression::multiply(right, Expression::Constant(-1))
                        .simplify(subs, full);
                }
                let right = right.simplify(subs, full)?;
                if right.is_zero() {
                    return Ok(left);
                }
                Ok(fold_constants(left, right, Expression::subtract, |a, b| a - b))
            }

            Expression::Multiply(left, right) => {
                let left = left.simplify(subs, full)?;
                if left.is_zero() {
                    return Ok(Expression::Constant(0));
                }
                let right = right.simplify(subs, full)?;
                if right.is_zero() {
                    return Ok(Expression::Constant(0));
                }
                if left.is_one() {
                    return Ok(right);
                }
                if right.is_one() {
                    return Ok(left);
                }
                Ok(fold_constants(left, right, Expression::multiply, |a, b| a * b))
            }

            Expression::Divide(left, right) => {
                let right = right.simplify(subs, full)?;
                if right.is_one() {
                    return left.simplify(subs, full);
                }
                if right.is_neg_one() {
                    return Expression::multiply(
                        (**left).clone(),
                        Expression::Constant(-1),
                    )
                    .simplify(subs, full);
                }

                let left = left.simplify(subs, full)?;
                if left.is_zero() {
                    if right.is_zero() {
                        return Err(SimplifyFailure::IndeterminateDivision);
                    }
                    return Ok(Expression::Constant(0));
                }
                if left.as_constant().is_some() && right.is_zero() {
                    return Err(SimplifyFailure::DivisionByZero);
                }

                if let (Some(a), Some(b)) = (left.as_constant(), right.as_constant()) {
                    return Ok(Expression::Constant(a.div_floor(&b)));
                }
                Ok(Expression::divide(left, right))
            }
        }
    }
}

/// Folds two already-simplified operands via `op` if both are constants,
/// else builds the symbolic node via `build`.
fn fold_constants(
    left: Expression,
    right: Expression,
    build: fn(Expression, Expression) -> Expression,
    op: fn(i64, i64) -> i64,
) -> Expression {
    match (left.as_constant(), right.as_constant()) {
        (Some(a), Some(b)) => Expression::Constant(op(a, b)),
        _ => build(left, right),
    }
}

impl std::ops::Add<i64> for Expression {
    type Output = Expression;
    fn add(self, rhs: i64) -> Expression {
        Expression::sum(self, Expression::Constant(rhs))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Expression) -> bool {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => a == b,
            (Expression::Reference(a), Expression::Reference(b)) => a == b,
            (Expression::Sum(a1, a2), Expression::Sum(b1, b2)) => {
                unordered_eq(a1, a2, b1, b2)
            }
            (Expression::Multiply(a1, a2), Expression::Multiply(b1, b2)) => {
                unordered_eq(a1, a2, b1, b2)
            }
            (Expression::Subtract(a1, a2), Expression::Subtract(b1, b2)) => {
                a1 == b1 && a2 == b2
            }
            (Expression::Divide(a1, a2), Expression::Divide(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

fn unordered_eq(a1: &Expression, a2: &Expression, b1: &Expression, b2: &Expression) -> bool {
    (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
}

impl Eq for Expression {}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{}", value),
            Expression::Reference(r) => write!(f, "{}", r),
            Expression::Sum(l, r) => write!(f, "({}) + ({})", l, r),
            Expression::Subtract(l, r) => write!(f, "({}) - ({})", l, r),
            Expression::Multiply(l, r) => write!(f, "({}) * ({})", l, r),
            Expression::Divide(l, r) => write!(f, "({}) / ({})", l, r),
        }
    }
}


/// Property tests over randomly generated expression trees, backing the
/// algebraic laws a hand-picked unit test can only sample a few points of.
#[cfg(test)]
mod laws {
    use super::*;
    use quickcheck::{Arbitrary, Gen, TestResult};
    use quickcheck_macros::quickcheck;

    /// A depth-bounded, reference-free expression tree — constants only, so
    /// every law below can be checked against ordinary host arithmetic
    /// without needing a substitution table.
    #[derive(Clone, Debug)]
    struct IntTree(Expression);

    impl Arbitrary for IntTree {
        fn arbitrary<G: Gen>(g: &mut G) -> IntTree {
            let depth = g.size().min(4);
            IntTree(gen_tree(g, depth))
        }
    }

    fn gen_tree<G: Gen>(g: &mut G, depth: usize) -> Expression {
        if depth == 0 {
            return Expression::Constant(i8::arbitrary(g) as i64);
        }
        match u8::arbitrary(g) % 5 {
            0 => Expression::Constant(i8::arbitrary(g) as i64),
            1 => Expression::sum(gen_tree(g, depth - 1), gen_tree(g, depth - 1)),
            2 => Expression::subtract(gen_tree(g, depth - 1), gen_tree(g, depth - 1)),
            3 => Expression::multiply(gen_tree(g, depth - 1), gen_tree(g, depth - 1)),
            _ => Expression::divide(gen_tree(g, depth - 1), gen_tree(g, depth - 1)),
        }
    }

    /// Evaluates a reference-free tree with ordinary host arithmetic,
    /// `None` on division by zero or overflow — the same failure domain
    /// `simplify` itself refuses to cross.
    fn host_eval(e: &Expression) -> Option<i64> {
        match e {
            Expression::Constant(c) => Some(*c),
            Expression::Reference(_) => None,
            Expression::Sum(l, r) => host_eval(l)?.checked_add(host_eval(r)?),
            Expression::Subtract(l, r) => host_eval(l)?.checked_sub(host_eval(r)?),
            Expression::Multiply(l, r) => host_eval(l)?.checked_mul(host_eval(r)?),
            Expression::Divide(l, r) => {
                let (a, b) = (host_eval(l)?, host_eval(r)?);
                if b == 0 {
                    None
                } else {
                    Some(a.div_floor(&b))
                }
            }
        }
    }

    #[quickcheck]
    fn simplify_is_idempotent(tree: IntTree) -> TestResult {
        let once = match tree.0.simplify(&HashMap::new(), true) {
            Ok(v) => v,
            Err(_) => return TestResult::discard(),
        };
        let twice = once.simplify(&HashMap::new(), true).unwrap();
        TestResult::from_bool(once == twice)
    }

    #[quickcheck]
    fn constants_simplify_to_themselves(c: i64) -> bool {
        Expression::Constant(c).simplify(&HashMap::new(), true).unwrap() == Expression::Constant(c)
    }

    #[quickcheck]
    fn sum_and_multiply_commute(a: i64, b: i64) -> bool {
        let (a, b) = (Expression::Constant(a), Expression::Constant(b));
        Expression::sum(a.clone(), b.clone()) == Expression::sum(b.clone(), a.clone())
            && Expression::multiply(a.clone(), b.clone()) == Expression::multiply(b, a)
    }

    #[quickcheck]
    fn full_simplify_matches_host_arithmetic(tree: IntTree) -> TestResult {
        match (tree.0.simplify(&HashMap::new(), true), host_eval(&tree.0)) {
            (Ok(simplified), Some(expected)) => {
                TestResult::from_bool(simplified.as_constant() == Some(expected))
            }
            (Err(_), None) => TestResult::discard(),
            _ => TestResult::failed(),
        }
    }

    #[quickcheck]
    fn substitute_then_simplify_matches_direct_full_simplify(tree: IntTree, x: i64) -> TestResult {
        let mut subs = HashMap::new();
        subs.insert(Reference::new("x"), Expression::Constant(x));
        let with_ref = Expression::sum(tree.0.clone(), Expression::reference("x"));

        let direct = with_ref.simplify(&subs, true);
        let via_partial = match with_ref.simplify(&HashMap::new(), false) {
            Ok(partial) => partial.simplify(&subs, true),
            Err(_) => return TestResult::discard(),
        };
        match (direct, via_partial) {
            (Ok(a), Ok(b)) => TestResult::from_bool(a == b),
            (Err(_), Err(_)) => TestResult::discard(),
            _ => TestResult::failed(),
        }
    }
}
