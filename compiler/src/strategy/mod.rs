//! Translation strategies.
//!
//! A strategy turns one physical-domain view of the schematic into a list
//! of SMT-LIB2 forms. Strategies are grouped into ordered sets; the
//! orchestrator runs the sets and merges their output.
//!
//! ```text
//! StrategySet ──▶ CachedStrategy ──▶ TranslationStrategy::translation_step
//!                   │
//!                   └── StrategyCache: Uncached | Cached(Vec<SExpr>)
//! ```

pub mod multiphase;
pub mod placement;
pub mod pressure_flow;

use tracing::debug;

use crate::error::{CodeGenerationError, Result};
use crate::params::ProcessParameters;
use crate::schematic::{Connection, Schematic};
use crate::smt2::SExpr;
use crate::types::PrimitiveTypeTable;

pub use multiphase::multi_phase_strategy_set;
pub use placement::placement_strategy_set;
pub use pressure_flow::pressure_flow_strategy_set;

/// One physical-domain analysis over the schematic.
pub trait TranslationStrategy {
    fn name(&self) -> &'static str;

    /// Cache-oblivious translation; called through [`CachedStrategy`].
    fn translation_step(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>>;
}

/// Result cache owned by each strategy instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StrategyCache {
    #[default]
    Uncached,
    Cached(Vec<SExpr>),
}

/// A strategy together with the output of its most recent translation.
pub struct CachedStrategy {
    strategy: Box<dyn TranslationStrategy>,
    cache: StrategyCache,
}

impl CachedStrategy {
    pub fn new(strategy: impl TranslationStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
            cache: StrategyCache::Uncached,
        }
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Recompute the strategy output, replacing any earlier result.
    ///
    /// The cache stays invalid if the translation step fails.
    pub fn translate(
        &mut self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &PrimitiveTypeTable,
    ) -> Result<&[SExpr]> {
        self.invalidate_cache();
        let exprs = self.strategy.translation_step(schematic, params, types)?;
        debug!(strategy = self.name(), count = exprs.len(), "strategy translated");
        self.cache = StrategyCache::Cached(exprs);
        self.translated_exprs()
    }

    pub fn translated_exprs(&self) -> Result<&[SExpr]> {
        match &self.cache {
            StrategyCache::Cached(exprs) => Ok(exprs),
            StrategyCache::Uncached => Err(CodeGenerationError::State(format!(
                "cannot retrieve translated exprs of '{}' before translation is done \
                 (cache may have been invalidated after a previous run)",
                self.name()
            ))),
        }
    }

    pub fn invalidate_cache(&mut self) {
        self.cache = StrategyCache::Uncached;
    }

    pub fn cache(&self) -> &StrategyCache {
        &self.cache
    }
}

/// Ordered group of strategies whose outputs are concatenated.
pub struct StrategySet {
    name: &'static str,
    strategies: Vec<CachedStrategy>,
}

impl StrategySet {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl TranslationStrategy + 'static) -> Self {
        self.strategies.push(CachedStrategy::new(strategy));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn strategies(&self) -> &[CachedStrategy] {
        &self.strategies
    }

    /// Run every member in order and concatenate their output.
    pub fn translate(
        &mut self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &PrimitiveTypeTable,
    ) -> Result<Vec<SExpr>> {
        let mut exprs = Vec::new();
        for strategy in &mut self.strategies {
            exprs.extend_from_slice(strategy.translate(schematic, params, types)?);
        }
        debug!(set = self.name, count = exprs.len(), "strategy set translated");
        Ok(exprs)
    }
}

/// First connection joining a port of `n1` to a port of `n2`.
///
/// Connections are scanned in document order, then ports of `n1`, then
/// ports of `n2`. With `directed` only `n1 -> n2` matches; otherwise
/// `n2 -> n1` matches too. Parallel channels between the same nodes yield
/// the first one found.
pub fn connecting_channel<'s>(
    schematic: &'s Schematic,
    n1: &str,
    n2: &str,
    directed: bool,
) -> Option<(&'s str, &'s Connection)> {
    let node1 = schematic.node(n1)?;
    let node2 = schematic.node(n2)?;
    for (name, conn) in &schematic.connections {
        for p1 in &node1.ports {
            for p2 in &node2.ports {
                let forward = conn.from.node == n1
                    && &conn.from.port == p1
                    && conn.to.node == n2
                    && &conn.to.port == p2;
                if forward {
                    return Some((name.as_str(), conn));
                }
                let reverse = conn.from.node == n2
                    && &conn.from.port == p2
                    && conn.to.node == n1
                    && &conn.to.port == p1;
                if !directed && reverse {
                    return Some((name.as_str(), conn));
                }
            }
        }
    }
    None
}

/// Connection attached to the given port of a node, if any.
pub(crate) fn channel_at_port<'s>(
    schematic: &'s Schematic,
    node: &str,
    port: &str,
) -> Option<(&'s str, &'s Connection)> {
    schematic
        .connections
        .iter()
        .find(|(_, conn)| {
            (conn.from.node == node && conn.from.port == port)
                || (conn.to.node == node && conn.to.port == port)
        })
        .map(|(name, conn)| (name.as_str(), conn))
}
