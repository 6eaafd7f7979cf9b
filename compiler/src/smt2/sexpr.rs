//! S-expression model for SMT-LIB2 programs.
//!
//! Terms are immutable values: symbols, finite real-valued decimals,
//! non-empty parenthesized lists and the empty list `()`. `Display` renders the solver's plain-text form.

use std::fmt;
use std::io::{self, Write};

use crate::error::{CodeGenerationError, Result};

/// Real-valued literal.
///
/// Only finite values can be represented. Rendering never uses exponent
/// notation and always carries a decimal point, so the text parses back to
/// the same `f64`. Negative values are rendered as `(- x)` since SMT-LIB2
/// has no signed decimal literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal(f64);

impl Decimal {
    pub const ZERO: Decimal = Decimal(0.0);
    pub const ONE: Decimal = Decimal(1.0);
    pub const PI: Decimal = Decimal(std::f64::consts::PI);

    /// `None` for NaN and the infinities.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Decimal(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

fn plain_decimal(value: f64) -> String {
    // f64's Display is the shortest round-trip representation without an exponent
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0.0 {
            write!(f, "(- {})", plain_decimal(-self.0))
        } else {
            // -0.0 lands here and renders as 0.0
            write!(f, "{}", plain_decimal(self.0.abs()))
        }
    }
}

/// Non-empty parenthesized list of expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParenList {
    exprs: Vec<SExpr>,
}

impl ParenList {
    pub fn new(head: SExpr, tail: impl IntoIterator<Item = SExpr>) -> Self {
        let mut exprs = vec![head];
        exprs.extend(tail);
        ParenList { exprs }
    }

    /// Returns `None` for an empty vector.
    pub fn from_vec(exprs: Vec<SExpr>) -> Option<Self> {
        if exprs.is_empty() {
            None
        } else {
            Some(ParenList { exprs })
        }
    }

    pub fn head(&self) -> &SExpr {
        &self.exprs[0]
    }

    pub fn exprs(&self) -> &[SExpr] {
        &self.exprs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Symbol(String),
    Decimal(Decimal),
    List(ParenList),
    /// `()`, as in the argument sorts of a nullary function.
    Nil,
}

impl SExpr {
    pub fn symbol(name: impl Into<String>) -> Self {
        SExpr::Symbol(name.into())
    }

    /// Real literal. Fails for values with no SMT-LIB2 literal.
    pub fn decimal(value: f64) -> Result<Self> {
        Decimal::new(value)
            .map(SExpr::Decimal)
            .ok_or(CodeGenerationError::NonFiniteLiteral(value))
    }

    pub fn zero() -> Self {
        SExpr::Decimal(Decimal::ZERO)
    }

    /// `(head tail...)`
    pub fn list(head: SExpr, tail: impl IntoIterator<Item = SExpr>) -> Self {
        SExpr::List(ParenList::new(head, tail))
    }

    /// `(op args...)` with `op` as a symbol.
    pub fn form(op: &str, args: impl IntoIterator<Item = SExpr>) -> Self {
        SExpr::list(SExpr::symbol(op), args)
    }

    /// `(op)`
    pub fn nullary(op: &str) -> Self {
        SExpr::List(ParenList {
            exprs: vec![SExpr::symbol(op)],
        })
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExpr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Name of the head symbol if this is a list headed by a symbol.
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            SExpr::List(list) => list.head().as_symbol(),
            _ => None,
        }
    }

    /// All symbol names occurring anywhere in this expression, in order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SExpr::Symbol(name) => out.push(name),
            SExpr::Decimal(_) | SExpr::Nil => {}
            SExpr::List(list) => {
                for expr in list.exprs() {
                    expr.collect_symbols(out);
                }
            }
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{}", self)
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Symbol(name) => write!(f, "{}", name),
            SExpr::Decimal(value) => write!(f, "{}", value),
            SExpr::List(list) => {
                write!(f, "(")?;
                for (i, expr) in list.exprs().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", expr)?;
                }
                write!(f, ")")
            }
            SExpr::Nil => write!(f, "()"),
        }
    }
}

impl From<Decimal> for SExpr {
    fn from(value: Decimal) -> Self {
        SExpr::Decimal(value)
    }
}

/// Writes one expression per line.
pub fn write_program<W: Write>(exprs: &[SExpr], writer: &mut W) -> io::Result<()> {
    for expr in exprs {
        expr.write_to(writer)?;
        writeln!(writer)?;
    }
    Ok(())
}
