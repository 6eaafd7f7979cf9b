//! Pressure/flow network strategies.
//!
//! Channels behave as hydraulic resistors (`dP = Q * R`), every node has a
//! single pressure shared by its ports, flow is conserved at every node
//! that is not an externally actuated control point, and pressure control
//! points pin their node pressure to the configured boundary value.

use tracing::debug;

use super::{StrategySet, TranslationStrategy};
use crate::error::Result;
use crate::params::ProcessParameters;
use crate::schematic::{PortRef, Schematic};
use crate::smt2::naming;
use crate::smt2::qfnra;
use crate::smt2::SExpr;
use crate::types::PrimitiveTypeTable;

pub const PRESSURE_ATTRIBUTE: &str = "pressure";

pub fn pressure_flow_strategy_set() -> StrategySet {
    StrategySet::new("pressure-flow")
        .with_strategy(PressureFlowDeclarationStrategy)
        .with_strategy(NodePortPressureStrategy)
        .with_strategy(ChannelPressureDropStrategy)
        .with_strategy(FlowConservationStrategy)
        .with_strategy(ControlPointPressureStrategy)
}

fn port_refs<'s>(schematic: &'s Schematic) -> impl Iterator<Item = PortRef> + 's {
    schematic.nodes.iter().flat_map(|(name, node)| {
        node.ports
            .iter()
            .map(move |port| PortRef::new(name.clone(), port.clone()))
    })
}

/// Declares node and port pressures, channel flow rates and resistances.
pub struct PressureFlowDeclarationStrategy;

impl TranslationStrategy for PressureFlowDeclarationStrategy {
    fn name(&self) -> &'static str {
        "pressure-flow-declarations"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for name in schematic.nodes.keys() {
            exprs.push(qfnra::declare_real_variable(naming::node_pressure(name)));
        }
        for port in port_refs(schematic) {
            exprs.push(qfnra::declare_real_variable(naming::port_pressure(
                schematic, &port,
            )?));
        }
        for name in schematic.connections.keys() {
            exprs.push(qfnra::declare_real_variable(naming::channel_flow_rate(name)));
            exprs.push(qfnra::declare_real_variable(naming::channel_resistance(
                name,
            )));
        }
        Ok(exprs)
    }
}

/// Each port sits at the pressure of its node.
pub struct NodePortPressureStrategy;

impl TranslationStrategy for NodePortPressureStrategy {
    fn name(&self) -> &'static str {
        "node-port-pressure"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        port_refs(schematic)
            .map(|port| {
                Ok(qfnra::assert_equal(
                    naming::port_pressure(schematic, &port)?,
                    naming::node_pressure(&port.node),
                ))
            })
            .collect()
    }
}

/// Pressure drop along a channel equals flow rate times resistance, with
/// strictly positive resistance.
pub struct ChannelPressureDropStrategy;

impl TranslationStrategy for ChannelPressureDropStrategy {
    fn name(&self) -> &'static str {
        "channel-pressure-drop"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for (name, conn) in &schematic.connections {
            let resistance = naming::channel_resistance(name);
            exprs.push(qfnra::assert_greater(resistance.clone(), SExpr::zero()));
            exprs.push(qfnra::assert_equal(
                qfnra::sub(
                    naming::port_pressure(schematic, &conn.from)?,
                    naming::port_pressure(schematic, &conn.to)?,
                ),
                qfnra::mul(naming::channel_flow_rate(name), resistance),
            ));
        }
        Ok(exprs)
    }
}

/// Flow in equals flow out at every node that is not a control point.
pub struct FlowConservationStrategy;

impl TranslationStrategy for FlowConservationStrategy {
    fn name(&self) -> &'static str {
        "flow-conservation"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for (name, node) in &schematic.nodes {
            if types.is_control_point(&node.type_name) {
                continue;
            }
            let mut inflows = Vec::new();
            let mut outflows = Vec::new();
            for (conn_name, conn) in &schematic.connections {
                if &conn.to.node == name {
                    inflows.push(naming::channel_flow_rate(conn_name));
                }
                if &conn.from.node == name {
                    outflows.push(naming::channel_flow_rate(conn_name));
                }
            }
            if inflows.is_empty() && outflows.is_empty() {
                continue;
            }
            exprs.push(qfnra::assert_equal(
                qfnra::sum(inflows),
                qfnra::sum(outflows),
            ));
        }
        Ok(exprs)
    }
}

/// Pressure control points hold their node at the configured pressure.
pub struct ControlPointPressureStrategy;

impl TranslationStrategy for ControlPointPressureStrategy {
    fn name(&self) -> &'static str {
        "control-point-pressure"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for (name, node) in &schematic.nodes {
            if !types.is_pressure_control_point(&node.type_name) {
                continue;
            }
            match node.attribute(PRESSURE_ATTRIBUTE) {
                Some(pressure) => exprs.push(qfnra::assert_equal(
                    naming::node_pressure(name),
                    SExpr::decimal(pressure)?,
                )),
                None => debug!(node = %name, "pressure control point left unconstrained"),
            }
        }
        Ok(exprs)
    }
}
