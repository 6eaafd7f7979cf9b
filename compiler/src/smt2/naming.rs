//! Symbol names for schematic quantities.
//!
//! Every name is a pure function of the entity's name and the quantity, so
//! independent strategies referring to the same quantity agree on the
//! symbol. `Schematic::validate` rules out the name combinations that
//! could make two quantities collide.

use super::sexpr::SExpr;
use crate::error::{CodeGenerationError, Result};
use crate::schematic::{PortRef, Schematic};

/// Symbol holding the value of pi; not a solver built-in.
pub fn constant_pi() -> SExpr {
    SExpr::symbol("const_pi")
}

/// x-coordinate of a node's position.
pub fn node_x(node: &str) -> SExpr {
    SExpr::symbol(format!("{}_pos_x", node))
}

/// y-coordinate of a node's position.
pub fn node_y(node: &str) -> SExpr {
    SExpr::symbol(format!("{}_pos_y", node))
}

/// Pressure throughout a node, i.e. at every one of its ports.
pub fn node_pressure(node: &str) -> SExpr {
    SExpr::symbol(format!("{}_pressure", node))
}

/// Pressure at a single port.
///
/// The port must be registered on its parent node; anything else means the
/// schematic is malformed.
pub fn port_pressure(schematic: &Schematic, port: &PortRef) -> Result<SExpr> {
    let node = schematic.node(&port.node).ok_or_else(|| {
        CodeGenerationError::topology(format!(
            "port '{}' refers to unknown node '{}'",
            port.port, port.node
        ))
    })?;
    if !node.has_port(&port.port) {
        return Err(CodeGenerationError::topology(format!(
            "could not map port '{}' to a name on node '{}'",
            port.port, port.node
        )));
    }
    Ok(SExpr::symbol(format!(
        "{}_{}_pressure",
        port.node, port.port
    )))
}

/// Length of a channel.
///
/// Shares the `_pos_x` suffix with node positions; node and connection
/// names are disjoint so the two never collide.
pub fn channel_length(channel: &str) -> SExpr {
    SExpr::symbol(format!("{}_pos_x", channel))
}

/// Volumetric flow rate through a channel. Positive flow runs from the
/// channel's "from" port to its "to" port.
pub fn channel_flow_rate(channel: &str) -> SExpr {
    SExpr::symbol(format!("{}_flowrate", channel))
}

/// Hydrodynamic resistance of a channel.
pub fn channel_resistance(channel: &str) -> SExpr {
    SExpr::symbol(format!("{}_resistance", channel))
}

/// Length of the droplets produced at a T-junction.
pub fn droplet_length(junction: &str) -> SExpr {
    SExpr::symbol(format!("{}_droplet_length", junction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MICROFLUID_CHANNEL, PRESSURE_CONTROL_POINT, T_JUNCTION};
    use std::collections::HashSet;

    fn chip() -> Schematic {
        Schematic::with_core_types("chip")
            .with_node("n0", PRESSURE_CONTROL_POINT, &["out"])
            .with_node("n1", PRESSURE_CONTROL_POINT, &["in", "out"])
            .with_connection("c0", MICROFLUID_CHANNEL, ("n0", "out"), ("n1", "in"))
    }

    #[test]
    fn test_node_symbols() {
        assert_eq!(node_x("n0").to_string(), "n0_pos_x");
        assert_eq!(node_y("n0").to_string(), "n0_pos_y");
        assert_eq!(node_pressure("n0").to_string(), "n0_pressure");
    }

    #[test]
    fn test_channel_symbols() {
        assert_eq!(channel_length("c0").to_string(), "c0_pos_x");
        assert_eq!(channel_flow_rate("c0").to_string(), "c0_flowrate");
        assert_eq!(channel_resistance("c0").to_string(), "c0_resistance");
    }

    #[test]
    fn test_port_pressure() {
        let s = chip();
        let sym = port_pressure(&s, &PortRef::new("n1", "out")).unwrap();
        assert_eq!(sym.to_string(), "n1_out_pressure");
    }

    #[test]
    fn test_port_pressure_unregistered_port() {
        let s = chip();
        let err = port_pressure(&s, &PortRef::new("n0", "in")).unwrap_err();
        assert!(matches!(err, CodeGenerationError::Topology(_)));
        assert!(port_pressure(&s, &PortRef::new("ghost", "in")).is_err());
    }

    #[test]
    fn test_names_are_deterministic() {
        assert_eq!(node_x("n1"), node_x("n1"));
        assert_eq!(
            port_pressure(&chip(), &PortRef::new("n1", "in")).unwrap(),
            port_pressure(&chip(), &PortRef::new("n1", "in")).unwrap()
        );
    }

    /// Every symbol the strategies generate for `s`, one entry per quantity.
    fn generated_symbols(s: &Schematic) -> Vec<String> {
        let mut out = vec![constant_pi().to_string()];
        for (name, node) in &s.nodes {
            out.push(node_x(name).to_string());
            out.push(node_y(name).to_string());
            out.push(node_pressure(name).to_string());
            if node.type_name == T_JUNCTION {
                out.push(droplet_length(name).to_string());
            }
            for port in &node.ports {
                let port = PortRef::new(name.clone(), port.clone());
                out.push(port_pressure(s, &port).unwrap().to_string());
            }
        }
        for name in s.connections.keys() {
            out.push(channel_length(name).to_string());
            out.push(channel_flow_rate(name).to_string());
            out.push(channel_resistance(name).to_string());
        }
        out
    }

    fn has_duplicates(symbols: &[String]) -> bool {
        symbols.iter().collect::<HashSet<_>>().len() < symbols.len()
    }

    #[test]
    fn test_names_are_distinct_across_schematic() {
        assert!(!has_duplicates(&generated_symbols(&chip())));
    }

    #[test]
    fn test_validation_admits_only_collision_free_names() {
        let base = || Schematic::with_core_types("chip");
        let cases = vec![
            // underscore-joined node/port pairs
            base()
                .with_node("a", PRESSURE_CONTROL_POINT, &["b_c"])
                .with_node("a_b", PRESSURE_CONTROL_POINT, &["c"]),
            base()
                .with_node("a", PRESSURE_CONTROL_POINT, &["b"])
                .with_node("a_b", PRESSURE_CONTROL_POINT, &[]),
            // node and channel sharing a name
            base()
                .with_node("n", PRESSURE_CONTROL_POINT, &["p"])
                .with_node("m", PRESSURE_CONTROL_POINT, &["q"])
                .with_connection("n", MICROFLUID_CHANNEL, ("n", "p"), ("m", "q")),
            // entity names that spell other quantities
            base().with_node("const", PRESSURE_CONTROL_POINT, &["pi"]),
            base()
                .with_node("tj", T_JUNCTION, &["continuous"])
                .with_node("tj_droplet", PRESSURE_CONTROL_POINT, &["length"]),
            base()
                .with_node("c_flowrate", PRESSURE_CONTROL_POINT, &["out"])
                .with_node("sink", PRESSURE_CONTROL_POINT, &["in"])
                .with_connection("c", MICROFLUID_CHANNEL, ("c_flowrate", "out"), ("sink", "in")),
            chip(),
        ];

        let mut accepted = 0;
        for s in &cases {
            let symbols = generated_symbols(s);
            let collides = has_duplicates(&symbols);
            assert_eq!(
                s.validate().is_err(),
                collides,
                "nodes {:?}",
                s.nodes.keys().collect::<Vec<_>>()
            );
            if !collides {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 4);
    }
}
