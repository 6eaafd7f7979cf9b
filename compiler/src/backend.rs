//! Microfluidics backend: turns a schematic into a QF_NRA SMT-LIB2 program.
//!
//! # Pipeline
//!
//! ```text
//! Schematic ──▶ PrimitiveTypeTable ──▶ placement ─┐
//!                                      multi-phase ├──▶ sort_exprs ──▶ <name>.smt2
//!                                      pressure-flow ┘
//! ```
//!
//! The emitted program is `(set-logic QF_NRA)`, every declaration, every
//! assertion, anything else, then `(check-sat)` and `(exit)`.

use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{error, info, instrument};

use crate::error::{CodeGenerationError, Result};
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::smt2::naming;
use crate::smt2::qfnra::{self, ASSERT, DECLARE_FUN};
use crate::smt2::{write_program, Decimal, SExpr};
use crate::strategy::{multi_phase_strategy_set, placement_strategy_set, pressure_flow_strategy_set};
use crate::types::PrimitiveTypeTable;

pub struct MicrofluidicsBackend {
    process_params: ProcessParameters,
}

impl MicrofluidicsBackend {
    pub fn new(process_params: ProcessParameters) -> Self {
        Self { process_params }
    }

    pub fn backend_name(&self) -> &'static str {
        "microfluidics"
    }

    pub fn process_parameters(&self) -> &ProcessParameters {
        &self.process_params
    }

    /// Resolve and check the control-point hierarchy of the schematic.
    pub fn construct_type_table(schematic: &Schematic) -> Result<PrimitiveTypeTable> {
        PrimitiveTypeTable::build(schematic)
    }

    /// Produce the complete, ordered solver program without touching disk.
    pub fn translate(&self, schematic: &Schematic) -> Result<Vec<SExpr>> {
        self.translate_inner(schematic).map_err(abort)
    }

    /// Translate and write `<output_dir>/<schematic-name>.smt2`.
    ///
    /// The schematic name never contains a path separator, so the artifact
    /// always lands directly inside `output_dir`.
    ///
    /// The program is written to a temporary file next to the target and
    /// renamed into place only once complete.
    #[instrument(skip_all, fields(schematic = %schematic.name))]
    pub fn run(&self, schematic: &Schematic, output_dir: &Path) -> Result<PathBuf> {
        let exprs = self.translate(schematic)?;
        let path = output_dir.join(format!("{}.smt2", schematic.name));
        write_artifact(&exprs, output_dir, &path).map_err(abort)?;
        info!(path = %path.display(), forms = exprs.len(), "wrote solver program");
        Ok(path)
    }

    fn translate_inner(&self, schematic: &Schematic) -> Result<Vec<SExpr>> {
        schematic.validate()?;
        let types = Self::construct_type_table(schematic)?;
        info!(
            nodes = schematic.nodes.len(),
            connections = schematic.connections.len(),
            "translating schematic"
        );

        let mut unsorted = vec![
            qfnra::declare_real_variable(naming::constant_pi()),
            qfnra::assert_equal(naming::constant_pi(), SExpr::from(Decimal::PI)),
        ];

        for mut set in [
            placement_strategy_set(),
            multi_phase_strategy_set(),
            pressure_flow_strategy_set(),
        ] {
            unsorted.extend(set.translate(schematic, &self.process_params, &types)?);
        }

        let mut exprs = Vec::with_capacity(unsorted.len() + 3);
        exprs.push(qfnra::use_qfnra());
        exprs.extend(sort_exprs(unsorted));
        exprs.push(qfnra::check_sat());
        exprs.push(qfnra::exit());
        Ok(exprs)
    }
}

fn abort(err: CodeGenerationError) -> CodeGenerationError {
    error!("{}", err);
    error!("stopping code generation due to error");
    err
}

fn write_artifact(exprs: &[SExpr], output_dir: &Path, path: &Path) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(output_dir)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        write_program(exprs, &mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

enum FormKind {
    Declaration,
    Assertion,
    Other,
}

impl FormKind {
    fn of(expr: &SExpr) -> Self {
        match expr.head_symbol() {
            Some(DECLARE_FUN) => FormKind::Declaration,
            Some(ASSERT) => FormKind::Assertion,
            _ => FormKind::Other,
        }
    }
}

/// Stable partition into declarations, assertions and everything else, in
/// that order, so every symbol is declared before an assertion uses it.
///
/// A declaration identical to an earlier one is dropped; independent
/// strategies may declare the same symbol.
pub fn sort_exprs(unsorted: Vec<SExpr>) -> Vec<SExpr> {
    let mut decls = Vec::new();
    let mut asserts = Vec::new();
    let mut others = Vec::new();
    let mut declared = HashSet::new();

    for expr in unsorted {
        match FormKind::of(&expr) {
            FormKind::Declaration => {
                if declared.insert(expr.to_string()) {
                    decls.push(expr);
                }
            }
            FormKind::Assertion => asserts.push(expr),
            FormKind::Other => others.push(expr),
        }
    }

    decls.extend(asserts);
    decls.extend(others);
    decls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> SExpr {
        SExpr::symbol(name)
    }

    #[test]
    fn test_sort_exprs_partitions_stably() {
        let unsorted = vec![
            qfnra::assert_greater(sym("a"), SExpr::zero()),
            SExpr::form("define-fun", [sym("f")]),
            qfnra::declare_real_variable(sym("a")),
            qfnra::assert_less_than(sym("b"), SExpr::decimal(1.0).unwrap()),
            sym("bare"),
            qfnra::declare_real_variable(sym("b")),
        ];
        let rendered: Vec<String> = sort_exprs(unsorted).iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "(declare-fun a () Real)",
                "(declare-fun b () Real)",
                "(assert (> a 0.0))",
                "(assert (< b 1.0))",
                "(define-fun f)",
                "bare",
            ]
        );
    }

    #[test]
    fn test_sort_exprs_drops_duplicate_declarations() {
        let unsorted = vec![
            qfnra::declare_real_variable(sym("a")),
            qfnra::declare_real_variable(sym("a")),
        ];
        assert_eq!(sort_exprs(unsorted).len(), 1);
    }

    #[test]
    fn test_backend_name() {
        let params = ProcessParameters::new(1e-4, 1e-4, 0.04, 0.04, 0.087).unwrap();
        let backend = MicrofluidicsBackend::new(params);
        assert_eq!(backend.backend_name(), "microfluidics");
        assert_eq!(backend.process_parameters().maximum_chip_size_x(), 0.04);
    }
}
