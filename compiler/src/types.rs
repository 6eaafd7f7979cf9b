//! Primitive type table.
//!
//! Resolves the node types the translation depends on from the
//! schematic's declarations and indexes every declared subtype of them, so
//! strategies can classify a node by its type name alone.

use std::collections::HashSet;

use crate::error::{CodeGenerationError, Result};
use crate::schematic::Schematic;

pub const CONTROL_POINT: &str = "controlPoint";
pub const PRESSURE_CONTROL_POINT: &str = "pressureControlPoint";
pub const VOLTAGE_CONTROL_POINT: &str = "voltageControlPoint";
pub const T_JUNCTION: &str = "tJunction";
pub const MICROFLUID_CHANNEL: &str = "microfluidChannel";

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveTypeTable {
    control_point: String,
    pressure_control_point: String,
    voltage_control_point: String,
    derived_pressure_control_points: Vec<String>,
    derived_voltage_control_points: Vec<String>,
    /// Every node type that refines `controlPoint`, itself included.
    control_points: HashSet<String>,
    t_junction: Option<String>,
    derived_t_junctions: Vec<String>,
    constraint_types: Vec<String>,
    connection_types: Vec<String>,
}

impl PrimitiveTypeTable {
    /// Build the table for one translation run, failing on any violation
    /// of the control-point hierarchy.
    pub fn build(schematic: &Schematic) -> Result<Self> {
        let control_point = retrieve_node_type(schematic, CONTROL_POINT)?;
        let pressure_control_point = retrieve_node_type(schematic, PRESSURE_CONTROL_POINT)?;
        let voltage_control_point = retrieve_node_type(schematic, VOLTAGE_CONTROL_POINT)?;

        check_type_hierarchy(schematic, &pressure_control_point, &control_point)?;
        check_type_hierarchy(schematic, &voltage_control_point, &control_point)?;

        let derived_pressure_control_points =
            retrieve_derived_node_types(schematic, &pressure_control_point);
        let derived_voltage_control_points =
            retrieve_derived_node_types(schematic, &voltage_control_point);

        let mut control_points: HashSet<String> =
            retrieve_derived_node_types(schematic, &control_point)
                .into_iter()
                .collect();
        control_points.insert(control_point.clone());

        let t_junction = schematic
            .node_types
            .contains_key(T_JUNCTION)
            .then(|| T_JUNCTION.to_string());
        let derived_t_junctions = t_junction
            .as_deref()
            .map(|base| retrieve_derived_node_types(schematic, base))
            .unwrap_or_default();

        Ok(Self {
            control_point,
            pressure_control_point,
            voltage_control_point,
            derived_pressure_control_points,
            derived_voltage_control_points,
            control_points,
            t_junction,
            derived_t_junctions,
            constraint_types: schematic.constraint_types.keys().cloned().collect(),
            connection_types: schematic.connection_types.keys().cloned().collect(),
        })
    }

    pub fn control_point_node_type(&self) -> &str {
        &self.control_point
    }

    pub fn pressure_control_point_node_type(&self) -> &str {
        &self.pressure_control_point
    }

    pub fn voltage_control_point_node_type(&self) -> &str {
        &self.voltage_control_point
    }

    pub fn derived_pressure_control_point_node_types(&self) -> &[String] {
        &self.derived_pressure_control_points
    }

    pub fn derived_voltage_control_point_node_types(&self) -> &[String] {
        &self.derived_voltage_control_points
    }

    pub fn constraint_types(&self) -> &[String] {
        &self.constraint_types
    }

    pub fn connection_types(&self) -> &[String] {
        &self.connection_types
    }

    pub fn is_control_point(&self, type_name: &str) -> bool {
        self.control_points.contains(type_name)
    }

    pub fn is_pressure_control_point(&self, type_name: &str) -> bool {
        type_name == self.pressure_control_point
            || self
                .derived_pressure_control_points
                .iter()
                .any(|t| t == type_name)
    }

    pub fn is_voltage_control_point(&self, type_name: &str) -> bool {
        type_name == self.voltage_control_point
            || self
                .derived_voltage_control_points
                .iter()
                .any(|t| t == type_name)
    }

    /// False whenever the schematic does not declare a T-junction type.
    pub fn is_t_junction(&self, type_name: &str) -> bool {
        match &self.t_junction {
            Some(base) => type_name == base || self.derived_t_junctions.iter().any(|t| t == type_name),
            None => false,
        }
    }
}

fn retrieve_node_type(schematic: &Schematic, name: &str) -> Result<String> {
    if schematic.node_types.contains_key(name) {
        Ok(name.to_string())
    } else {
        Err(CodeGenerationError::type_hierarchy(format!(
            "schematic does not declare node type '{}'",
            name
        )))
    }
}

fn check_type_hierarchy(schematic: &Schematic, sub: &str, sup: &str) -> Result<()> {
    if schematic.is_node_subtype(sub, sup) {
        Ok(())
    } else {
        Err(CodeGenerationError::type_hierarchy(format!(
            "{} must be a subtype of {}",
            sub, sup
        )))
    }
}

/// Declared node types strictly below `base`, in declaration order.
fn retrieve_derived_node_types(schematic: &Schematic, base: &str) -> Vec<String> {
    schematic
        .node_types
        .keys()
        .filter(|name| name.as_str() != base && schematic.is_node_subtype(name, base))
        .cloned()
        .collect()
}
