//! Multi-phase flow strategies.
//!
//! Droplets of a dispersed phase are pinched off where it meets a
//! continuous phase at a T-junction. In the squeezing regime the droplet
//! length scales with the channel width and the flow-rate ratio:
//!
//! ```text
//! L / w = 1 + alpha * (Qd / Qc)
//! ```

use super::{channel_at_port, StrategySet, TranslationStrategy};
use crate::error::{CodeGenerationError, Result};
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::smt2::naming;
use crate::smt2::qfnra;
use crate::smt2::{Decimal, SExpr};
use crate::types::PrimitiveTypeTable;

pub const CONTINUOUS_PORT: &str = "continuous";
pub const DISPERSED_PORT: &str = "dispersed";
pub const OUTPUT_PORT: &str = "output";
pub const CHANNEL_WIDTH_ATTRIBUTE: &str = "channelWidth";
pub const ALPHA_ATTRIBUTE: &str = "alpha";

const DEFAULT_ALPHA: f64 = 1.0;

pub fn multi_phase_strategy_set() -> StrategySet {
    StrategySet::new("multi-phase").with_strategy(TJunctionDropletStrategy)
}

pub struct TJunctionDropletStrategy;

impl TJunctionDropletStrategy {
    /// Flow entering `node` through `port`, signed by the channel direction.
    fn inflow(schematic: &Schematic, node: &str, port: &str) -> Result<SExpr> {
        let (name, conn) = channel_at_port(schematic, node, port).ok_or_else(|| {
            CodeGenerationError::topology(format!(
                "T-junction '{}' has no channel attached to port '{}'",
                node, port
            ))
        })?;
        let flow = naming::channel_flow_rate(name);
        if conn.to.node == node && conn.to.port == port {
            Ok(flow)
        } else {
            Ok(qfnra::neg(flow))
        }
    }
}

impl TranslationStrategy for TJunctionDropletStrategy {
    fn name(&self) -> &'static str {
        "t-junction-droplet"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for (name, node) in &schematic.nodes {
            if !types.is_t_junction(&node.type_name) {
                continue;
            }
            for port in [CONTINUOUS_PORT, DISPERSED_PORT, OUTPUT_PORT] {
                if !node.has_port(port) {
                    return Err(CodeGenerationError::topology(format!(
                        "T-junction '{}' is missing port '{}'",
                        name, port
                    )));
                }
            }
            let width = node.attribute(CHANNEL_WIDTH_ATTRIBUTE).ok_or_else(|| {
                CodeGenerationError::topology(format!(
                    "T-junction '{}' has no '{}' attribute",
                    name, CHANNEL_WIDTH_ATTRIBUTE
                ))
            })?;
            let alpha = node.attribute(ALPHA_ATTRIBUTE).unwrap_or(DEFAULT_ALPHA);

            let q_continuous = Self::inflow(schematic, name, CONTINUOUS_PORT)?;
            let q_dispersed = Self::inflow(schematic, name, DISPERSED_PORT)?;
            // the output channel only has to exist; its flow is balanced elsewhere
            Self::inflow(schematic, name, OUTPUT_PORT)?;

            let droplet_length = naming::droplet_length(name);
            exprs.push(qfnra::declare_real_variable(droplet_length.clone()));
            exprs.push(qfnra::assert_greater(q_continuous.clone(), SExpr::zero()));
            exprs.push(qfnra::assert_greater(q_dispersed.clone(), SExpr::zero()));
            let ratio = qfnra::div(q_dispersed, q_continuous);
            exprs.push(qfnra::assert_equal(
                droplet_length,
                qfnra::mul(
                    SExpr::decimal(width)?,
                    qfnra::add(vec![
                        SExpr::from(Decimal::ONE),
                        qfnra::mul(SExpr::decimal(alpha)?, ratio),
                    ]),
                ),
            ));
        }
        Ok(exprs)
    }
}
