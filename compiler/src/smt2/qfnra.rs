//! Constructors for QF_NRA programs: logic selection, real-valued
//! declarations, comparison assertions and arithmetic terms.

use super::sexpr::SExpr;

pub const DECLARE_FUN: &str = "declare-fun";
pub const ASSERT: &str = "assert";

/// SMT-LIB2 logics this backend can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmtLogic {
    /// Quantifier-free nonlinear real arithmetic
    QFNRA,
}

impl SmtLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmtLogic::QFNRA => "QF_NRA",
        }
    }
}

/// `(set-logic QF_NRA)`
pub fn use_qfnra() -> SExpr {
    SExpr::form("set-logic", [SExpr::symbol(SmtLogic::QFNRA.as_str())])
}

/// `(declare-fun <sym> () Real)`
pub fn declare_real_variable(symbol: SExpr) -> SExpr {
    SExpr::form(DECLARE_FUN, [symbol, SExpr::Nil, SExpr::symbol("Real")])
}

fn assert_compare(op: &str, left: SExpr, right: SExpr) -> SExpr {
    SExpr::form(ASSERT, [SExpr::form(op, [left, right])])
}

pub fn assert_equal(left: SExpr, right: SExpr) -> SExpr {
    assert_compare("=", left, right)
}

pub fn assert_greater(left: SExpr, right: SExpr) -> SExpr {
    assert_compare(">", left, right)
}

pub fn assert_greater_equal(left: SExpr, right: SExpr) -> SExpr {
    assert_compare(">=", left, right)
}

pub fn assert_less_than(left: SExpr, right: SExpr) -> SExpr {
    assert_compare("<", left, right)
}

pub fn assert_less_equal(left: SExpr, right: SExpr) -> SExpr {
    assert_compare("<=", left, right)
}

pub fn add(terms: Vec<SExpr>) -> SExpr {
    SExpr::form("+", terms)
}

/// Sum that stays well-formed for zero or one term: `0.0`, the term
/// itself, or `(+ terms...)`.
pub fn sum(mut terms: Vec<SExpr>) -> SExpr {
    match terms.len() {
        0 => SExpr::zero(),
        1 => terms.remove(0),
        _ => add(terms),
    }
}

pub fn sub(left: SExpr, right: SExpr) -> SExpr {
    SExpr::form("-", [left, right])
}

/// Unary minus, `(- term)`.
pub fn neg(term: SExpr) -> SExpr {
    SExpr::form("-", [term])
}

pub fn mul(left: SExpr, right: SExpr) -> SExpr {
    SExpr::form("*", [left, right])
}

pub fn div(left: SExpr, right: SExpr) -> SExpr {
    SExpr::form("/", [left, right])
}

pub fn square(term: SExpr) -> SExpr {
    mul(term.clone(), term)
}

pub fn check_sat() -> SExpr {
    SExpr::nullary("check-sat")
}

pub fn exit() -> SExpr {
    SExpr::nullary("exit")
}
