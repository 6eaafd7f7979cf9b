//! Placement strategies: where nodes sit on the chip and how long the
//! channels between them are.

use super::{StrategySet, TranslationStrategy};
use crate::error::Result;
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::smt2::naming;
use crate::smt2::qfnra;
use crate::smt2::SExpr;
use crate::types::PrimitiveTypeTable;

pub fn placement_strategy_set() -> StrategySet {
    StrategySet::new("placement")
        .with_strategy(PlacementDeclarationStrategy)
        .with_strategy(FiniteChipAreaRuleStrategy)
        .with_strategy(MinimumChannelLengthStrategy)
        .with_strategy(MinimumNodeDistanceStrategy)
        .with_strategy(ChannelGeometryStrategy)
}

/// Declares the position of every node and the length of every channel.
pub struct PlacementDeclarationStrategy;

impl TranslationStrategy for PlacementDeclarationStrategy {
    fn name(&self) -> &'static str {
        "placement-declarations"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for name in schematic.nodes.keys() {
            exprs.push(qfnra::declare_real_variable(naming::node_x(name)));
            exprs.push(qfnra::declare_real_variable(naming::node_y(name)));
        }
        for name in schematic.connections.keys() {
            exprs.push(qfnra::declare_real_variable(naming::channel_length(name)));
        }
        Ok(exprs)
    }
}

/// Every node lies strictly inside the chip: `0 < x < max_x`, `0 < y < max_y`.
pub struct FiniteChipAreaRuleStrategy;

impl TranslationStrategy for FiniteChipAreaRuleStrategy {
    fn name(&self) -> &'static str {
        "finite-chip-area"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let max_x = SExpr::decimal(params.maximum_chip_size_x())?;
        let max_y = SExpr::decimal(params.maximum_chip_size_y())?;
        let mut exprs = Vec::new();
        for name in schematic.nodes.keys() {
            let node_x = naming::node_x(name);
            let node_y = naming::node_y(name);
            exprs.push(qfnra::assert_greater(node_x.clone(), SExpr::zero()));
            exprs.push(qfnra::assert_greater(node_y.clone(), SExpr::zero()));
            exprs.push(qfnra::assert_less_than(node_x, max_x.clone()));
            exprs.push(qfnra::assert_less_than(node_y, max_y.clone()));
        }
        Ok(exprs)
    }
}

/// Every channel is at least the minimum channel length.
pub struct MinimumChannelLengthStrategy;

impl TranslationStrategy for MinimumChannelLengthStrategy {
    fn name(&self) -> &'static str {
        "minimum-channel-length"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let minimum = SExpr::decimal(params.minimum_channel_length())?;
        Ok(schematic
            .connections
            .keys()
            .map(|name| qfnra::assert_greater_equal(naming::channel_length(name), minimum.clone()))
            .collect())
    }
}

fn squared_distance(a: &str, b: &str) -> SExpr {
    qfnra::add(vec![
        qfnra::square(qfnra::sub(naming::node_x(a), naming::node_x(b))),
        qfnra::square(qfnra::sub(naming::node_y(a), naming::node_y(b))),
    ])
}

/// Any two nodes are at least the minimum node distance apart, compared
/// in squared form to stay polynomial.
pub struct MinimumNodeDistanceStrategy;

impl TranslationStrategy for MinimumNodeDistanceStrategy {
    fn name(&self) -> &'static str {
        "minimum-node-distance"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let minimum = SExpr::decimal(params.minimum_node_distance_squared())?;
        let names: Vec<&String> = schematic.nodes.keys().collect();
        let mut exprs = Vec::new();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                exprs.push(qfnra::assert_greater_equal(
                    squared_distance(a, b),
                    minimum.clone(),
                ));
            }
        }
        Ok(exprs)
    }
}

/// A straight channel is exactly as long as the distance between the nodes
/// it joins. Channels looping back onto their own node are left free.
pub struct ChannelGeometryStrategy;

impl TranslationStrategy for ChannelGeometryStrategy {
    fn name(&self) -> &'static str {
        "channel-geometry"
    }

    fn translation_step(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        _types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for (name, conn) in &schematic.connections {
            if conn.from.node == conn.to.node {
                continue;
            }
            exprs.push(qfnra::assert_equal(
                qfnra::square(naming::channel_length(name)),
                squared_distance(&conn.from.node, &conn.to.node),
            ));
        }
        Ok(exprs)
    }
}
