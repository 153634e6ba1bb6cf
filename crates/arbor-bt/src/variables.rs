use std::collections::BTreeMap;

use arbor_core::{Handle, RuntimeBuffer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value of a tree variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    /// Three components, e.g. a direction or a target position.
    Vector([f32; 3]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VarKind {
    Bool,
    Int,
    Float,
    Vector,
}

impl VarValue {
    pub fn kind(self) -> VarKind {
        match self {
            VarValue::Bool(_) => VarKind::Bool,
            VarValue::Int(_) => VarKind::Int,
            VarValue::Float(_) => VarKind::Float,
            VarValue::Vector(_) => VarKind::Vector,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            VarValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i64> {
        match self {
            VarValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(self) -> Option<f32> {
        match self {
            VarValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector(self) -> Option<[f32; 3]> {
        match self {
            VarValue::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Int(value)
    }
}

impl From<f32> for VarValue {
    fn from(value: f32) -> Self {
        VarValue::Float(value)
    }
}

impl From<[f32; 3]> for VarValue {
    fn from(value: [f32; 3]) -> Self {
        VarValue::Vector(value)
    }
}

/// A named tree-level parameter and the value every runner starts with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableDef {
    pub name: String,
    pub default: VarValue,
}

/// Name lookup for the variables one runner registered in its buffer.
#[derive(Debug, Default)]
pub struct VariableTable {
    slots: BTreeMap<String, Handle<VarValue>>,
}

impl VariableTable {
    /// Registers every definition, in order, as one slot each.
    pub(crate) fn register(buffer: &mut RuntimeBuffer, defs: &[VariableDef]) -> Self {
        let slots = defs
            .iter()
            .map(|def| (def.name.clone(), buffer.register(def.default)))
            .collect();
        Self { slots }
    }

    pub fn handle(&self, name: &str) -> Option<Handle<VarValue>> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
