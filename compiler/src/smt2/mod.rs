//! SMT-LIB2 program representation: expression model, symbol naming and
//! QF_NRA constructors.

pub mod naming;
pub mod qfnra;
pub mod sexpr;

pub use qfnra::SmtLogic;
pub use sexpr::{write_program, Decimal, ParenList, SExpr};
