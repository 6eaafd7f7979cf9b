//! Read-only schematic model.
//!
//! A schematic is a directed graph of named nodes (each exposing named
//! ports) and named connections joining a "from" port to a "to" port,
//! together with the node/connection/constraint types it declares. Node
//! types form a single-inheritance hierarchy through `supertype`.
//!
//! Iteration over nodes, ports and connections follows document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{CodeGenerationError, Result};
use crate::smt2::{naming, SExpr};
use crate::types::{
    CONTROL_POINT, MICROFLUID_CHANNEL, PRESSURE_CONTROL_POINT, T_JUNCTION, VOLTAGE_CONTROL_POINT,
};

/// A declared type, optionally refining a supertype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,
}

/// Reference to a port by parent node name and port name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortRef {
    pub node: String,
    pub port: String,
}

impl PortRef {
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ports: Vec<String>,
    /// Numeric per-instance values (boundary pressures, channel widths...).
    #[serde(default)]
    pub attributes: IndexMap<String, f64>,
}

impl Node {
    pub fn has_port(&self, port: &str) -> bool {
        self.ports.iter().any(|p| p == port)
    }

    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Connection {
    #[serde(rename = "type")]
    pub type_name: String,
    pub from: PortRef,
    pub to: PortRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Schematic {
    pub name: String,
    #[serde(default)]
    pub node_types: IndexMap<String, TypeDecl>,
    #[serde(default)]
    pub connection_types: IndexMap<String, TypeDecl>,
    #[serde(default)]
    pub constraint_types: IndexMap<String, TypeDecl>,
    #[serde(default)]
    pub nodes: IndexMap<String, Node>,
    #[serde(default)]
    pub connections: IndexMap<String, Connection>,
}

impl Schematic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_types: IndexMap::new(),
            connection_types: IndexMap::new(),
            constraint_types: IndexMap::new(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
        }
    }

    /// Empty schematic declaring the microfluidic type library: the
    /// control-point hierarchy, the T-junction node type and the channel
    /// connection type.
    pub fn with_core_types(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_node_type(CONTROL_POINT, None)
            .with_node_type(PRESSURE_CONTROL_POINT, Some(CONTROL_POINT))
            .with_node_type(VOLTAGE_CONTROL_POINT, Some(CONTROL_POINT))
            .with_node_type(T_JUNCTION, None)
            .with_connection_type(MICROFLUID_CHANNEL)
    }

    /// Load and validate a schematic from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let schematic: Schematic = serde_json::from_slice(&bytes)?;
        schematic.validate()?;
        Ok(schematic)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let schematic: Schematic = serde_json::from_str(text)?;
        schematic.validate()?;
        Ok(schematic)
    }

    pub fn with_node_type(mut self, name: &str, supertype: Option<&str>) -> Self {
        self.node_types.insert(
            name.to_string(),
            TypeDecl {
                supertype: supertype.map(str::to_string),
            },
        );
        self
    }

    pub fn with_connection_type(mut self, name: &str) -> Self {
        self.connection_types
            .insert(name.to_string(), TypeDecl::default());
        self
    }

    pub fn with_constraint_type(mut self, name: &str) -> Self {
        self.constraint_types
            .insert(name.to_string(), TypeDecl::default());
        self
    }

    pub fn with_node(mut self, name: &str, type_name: &str, ports: &[&str]) -> Self {
        self.nodes.insert(
            name.to_string(),
            Node {
                type_name: type_name.to_string(),
                ports: ports.iter().map(|p| p.to_string()).collect(),
                attributes: IndexMap::new(),
            },
        );
        self
    }

    /// Sets an attribute on an already added node; no-op for unknown nodes.
    pub fn with_node_attribute(mut self, node: &str, key: &str, value: f64) -> Self {
        if let Some(n) = self.nodes.get_mut(node) {
            n.attributes.insert(key.to_string(), value);
        }
        self
    }

    pub fn with_connection(
        mut self,
        name: &str,
        type_name: &str,
        from: (&str, &str),
        to: (&str, &str),
    ) -> Self {
        self.connections.insert(
            name.to_string(),
            Connection {
                type_name: type_name.to_string(),
                from: PortRef::new(from.0, from.1),
                to: PortRef::new(to.0, to.1),
            },
        );
        self
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn connection(&self, name: &str) -> Option<&Connection> {
        self.connections.get(name)
    }

    /// Whether node type `sub` equals `sup` or reaches it through declared
    /// supertypes.
    pub fn is_node_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut current = Some(sub);
        // a chain longer than the number of declared types is a cycle
        for _ in 0..=self.node_types.len() {
            match current {
                Some(name) if name == sup => return true,
                Some(name) => {
                    current = self
                        .node_types
                        .get(name)
                        .and_then(|decl| decl.supertype.as_deref())
                }
                None => return false,
            }
        }
        false
    }

    /// Structural validation; run on every loaded schematic and again
    /// before translation.
    pub fn validate(&self) -> Result<()> {
        if !is_artifact_stem(&self.name) {
            return Err(CodeGenerationError::topology(format!(
                "schematic name '{}' is not a valid identifier",
                self.name
            )));
        }

        for (name, decl) in &self.node_types {
            if let Some(sup) = &decl.supertype {
                if !self.node_types.contains_key(sup) {
                    return Err(CodeGenerationError::type_hierarchy(format!(
                        "node type '{}' refines undeclared type '{}'",
                        name, sup
                    )));
                }
            }
            if self.has_supertype_cycle(name) {
                return Err(CodeGenerationError::type_hierarchy(format!(
                    "node type '{}' is part of a supertype cycle",
                    name
                )));
            }
        }

        for (name, node) in &self.nodes {
            check_symbol("node", name)?;
            if !self.node_types.contains_key(&node.type_name) {
                return Err(CodeGenerationError::type_hierarchy(format!(
                    "node '{}' has undeclared type '{}'",
                    name, node.type_name
                )));
            }
            let mut seen = HashSet::new();
            for port in &node.ports {
                check_symbol("port", port)?;
                if !seen.insert(port.as_str()) {
                    return Err(CodeGenerationError::topology(format!(
                        "node '{}' declares port '{}' twice",
                        name, port
                    )));
                }
            }
            for (key, value) in &node.attributes {
                if !value.is_finite() {
                    return Err(CodeGenerationError::topology(format!(
                        "attribute '{}' of node '{}' is not finite: {}",
                        key, name, value
                    )));
                }
            }
        }

        for (name, conn) in &self.connections {
            check_symbol("connection", name)?;
            if self.nodes.contains_key(name) {
                return Err(CodeGenerationError::topology(format!(
                    "'{}' names both a node and a connection",
                    name
                )));
            }
            if !self.connection_types.contains_key(&conn.type_name) {
                return Err(CodeGenerationError::type_hierarchy(format!(
                    "connection '{}' has undeclared type '{}'",
                    name, conn.type_name
                )));
            }
            for end in [&conn.from, &conn.to] {
                let known = self
                    .nodes
                    .get(&end.node)
                    .map(|n| n.has_port(&end.port))
                    .unwrap_or(false);
                if !known {
                    return Err(CodeGenerationError::topology(format!(
                        "connection '{}' references unknown port '{}.{}'",
                        name, end.node, end.port
                    )));
                }
            }
        }

        self.check_symbol_collisions()
    }

    /// Every solver symbol generated for this schematic must name exactly
    /// one quantity.
    fn check_symbol_collisions(&self) -> Result<()> {
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut claim = |symbol: SExpr, owner: String| -> Result<()> {
            match owners.entry(symbol.to_string()) {
                Entry::Occupied(previous) => Err(CodeGenerationError::topology(format!(
                    "{} and {} would share the symbol '{}'",
                    previous.get(),
                    owner,
                    previous.key()
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(owner);
                    Ok(())
                }
            }
        };

        claim(naming::constant_pi(), "the constant pi".to_string())?;
        for (name, node) in &self.nodes {
            claim(naming::node_x(name), format!("x position of node '{}'", name))?;
            claim(naming::node_y(name), format!("y position of node '{}'", name))?;
            claim(naming::node_pressure(name), format!("pressure of node '{}'", name))?;
            if self.is_node_subtype(&node.type_name, T_JUNCTION) {
                claim(
                    naming::droplet_length(name),
                    format!("droplet length of junction '{}'", name),
                )?;
            }
            for port in &node.ports {
                let port_ref = PortRef::new(name.as_str(), port.as_str());
                claim(
                    naming::port_pressure(self, &port_ref)?,
                    format!("pressure of port '{}.{}'", name, port),
                )?;
            }
        }
        for name in self.connections.keys() {
            claim(naming::channel_length(name), format!("length of channel '{}'", name))?;
            claim(
                naming::channel_flow_rate(name),
                format!("flow rate of channel '{}'", name),
            )?;
            claim(
                naming::channel_resistance(name),
                format!("resistance of channel '{}'", name),
            )?;
        }
        Ok(())
    }

    fn has_supertype_cycle(&self, start: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(start);
        while let Some(name) = current {
            if !visited.insert(name) {
                return true;
            }
            current = self
                .node_types
                .get(name)
                .and_then(|decl| decl.supertype.as_deref());
        }
        false
    }
}

fn check_symbol(kind: &str, name: &str) -> Result<()> {
    if is_simple_symbol(name) {
        Ok(())
    } else {
        Err(CodeGenerationError::topology(format!(
            "{} name '{}' is not a valid SMT-LIB symbol",
            kind, name
        )))
    }
}

/// A simple symbol that is also safe as the file stem of the output
/// artifact: no path separators and no `.`/`..` components.
pub fn is_artifact_stem(name: &str) -> bool {
    is_simple_symbol(name) && !name.contains('/') && name != "." && name != ".."
}

/// SMT-LIB2 simple symbol: non-empty, no leading digit, letters, digits
/// and `~!@$%^&*_-+=<>.?/` only.
pub fn is_simple_symbol(name: &str) -> bool {
    const EXTRA: &str = "~!@$%^&*_-+=<>.?/";
    let mut chars = name.chars();
    match chars.next() {
        None => false,
        Some(c) if c.is_ascii_digit() => false,
        Some(c) => std::iter::once(c)
            .chain(chars)
            .all(|c| c.is_ascii_alphanumeric() || EXTRA.contains(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_chip() -> Schematic {
        Schematic::with_core_types("chip")
            .with_node("inlet", PRESSURE_CONTROL_POINT, &["out"])
            .with_node("outlet", PRESSURE_CONTROL_POINT, &["in"])
            .with_connection("c0", MICROFLUID_CHANNEL, ("inlet", "out"), ("outlet", "in"))
    }

    #[test]
    fn test_valid_schematic() {
        assert!(two_node_chip().validate().is_ok());
    }

    #[test]
    fn test_subtype_relation() {
        let s = two_node_chip().with_node_type("regulatedInlet", Some(PRESSURE_CONTROL_POINT));
        assert!(s.is_node_subtype(PRESSURE_CONTROL_POINT, CONTROL_POINT));
        assert!(s.is_node_subtype("regulatedInlet", CONTROL_POINT));
        assert!(s.is_node_subtype(CONTROL_POINT, CONTROL_POINT));
        assert!(!s.is_node_subtype(CONTROL_POINT, PRESSURE_CONTROL_POINT));
        assert!(!s.is_node_subtype(T_JUNCTION, CONTROL_POINT));
    }

    #[test]
    fn test_supertype_cycle_rejected() {
        let s = Schematic::new("chip")
            .with_node_type("a", Some("b"))
            .with_node_type("b", Some("a"));
        assert!(!s.is_node_subtype("a", "c"));
        let err = s.validate().unwrap_err();
        assert!(matches!(err, CodeGenerationError::TypeHierarchy(_)));
    }

    #[test]
    fn test_unknown_port_rejected() {
        let s = two_node_chip().with_connection(
            "c1",
            MICROFLUID_CHANNEL,
            ("inlet", "missing"),
            ("outlet", "in"),
        );
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("inlet.missing"));
    }

    #[test]
    fn test_node_connection_name_clash() {
        let s = two_node_chip().with_connection(
            "inlet",
            MICROFLUID_CHANNEL,
            ("inlet", "out"),
            ("outlet", "in"),
        );
        assert!(matches!(
            s.validate(),
            Err(CodeGenerationError::Topology(_))
        ));
    }

    #[test]
    fn test_node_port_name_clash() {
        let s = two_node_chip().with_node("inlet_out", PRESSURE_CONTROL_POINT, &[]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_port_port_name_clash() {
        let s = Schematic::with_core_types("chip")
            .with_node("a", PRESSURE_CONTROL_POINT, &["b_c"])
            .with_node("a_b", PRESSURE_CONTROL_POINT, &["c"]);
        let err = s.validate().unwrap_err();
        assert!(matches!(err, CodeGenerationError::Topology(_)));
        assert!(err.to_string().contains("a_b_c_pressure"));
    }

    #[test]
    fn test_path_like_schematic_name_rejected() {
        for name in ["../escaped", "nested/chip", "..", "."] {
            let s = Schematic::with_core_types(name);
            assert!(
                matches!(s.validate(), Err(CodeGenerationError::Topology(_))),
                "{} accepted",
                name
            );
        }
        assert!(is_artifact_stem("chip.v2"));
    }

    #[test]
    fn test_non_finite_attribute_rejected() {
        let s = two_node_chip().with_node_attribute("inlet", "pressure", f64::NAN);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("pressure"));
    }

    #[test]
    fn test_ports_are_a_list_of_names() {
        let listed = r#"{
            "name": "chip",
            "nodeTypes": {
                "controlPoint": {},
                "pressureControlPoint": {"supertype": "controlPoint"}
            },
            "connectionTypes": {"microfluidChannel": {}},
            "nodes": {
                "n1": {"type": "pressureControlPoint", "ports": ["out"], "attributes": {"pressure": 101325.0}},
                "n2": {"type": "pressureControlPoint", "ports": ["in"]}
            },
            "connections": {
                "c1": {"type": "microfluidChannel", "from": {"node": "n1", "port": "out"}, "to": {"node": "n2", "port": "in"}}
            }
        }"#;
        let s = Schematic::from_json_str(listed).unwrap();
        assert_eq!(s.node("n1").unwrap().ports, vec!["out".to_string()]);

        let mapped = listed.replace(r#"["out"]"#, r#"{"out": "microfluidPort"}"#);
        assert!(matches!(
            Schematic::from_json_str(&mapped),
            Err(CodeGenerationError::SchematicFormat(_))
        ));
    }

    #[test]
    fn test_simple_symbol() {
        assert!(is_simple_symbol("n1_pos_x"));
        assert!(is_simple_symbol("a.b-c"));
        assert!(!is_simple_symbol(""));
        assert!(!is_simple_symbol("1node"));
        assert!(!is_simple_symbol("has space"));
        assert!(!is_simple_symbol("paren("));
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let json = r#"{
            "name": "chip",
            "nodeTypes": {
                "controlPoint": {},
                "pressureControlPoint": {"supertype": "controlPoint"},
                "voltageControlPoint": {"supertype": "controlPoint"}
            },
            "connectionTypes": {"microfluidChannel": {}},
            "nodes": {
                "z": {"type": "pressureControlPoint", "ports": ["out"], "attributes": {"pressure": 2000.0}},
                "a": {"type": "pressureControlPoint", "ports": ["in"]}
            },
            "connections": {
                "c0": {"type": "microfluidChannel", "from": {"node": "z", "port": "out"}, "to": {"node": "a", "port": "in"}}
            }
        }"#;
        let s = Schematic::from_json_str(json).unwrap();
        let names: Vec<&str> = s.nodes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(s.node("z").unwrap().attribute("pressure"), Some(2000.0));
        assert_eq!(s.connection("c0").unwrap().to, PortRef::new("a", "in"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{"name": "chip", "bogus": 1}"#;
        assert!(matches!(
            Schematic::from_json_str(json),
            Err(CodeGenerationError::SchematicFormat(_))
        ));
    }
}
