use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value attached to an entity by an external subsystem.
///
/// Relaxation rates, errors, frequency tables and similar per-entity
/// quantities are stored under string keys; this core treats them as opaque
/// payload that only participates in emptiness testing and deep cloning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Floats(Vec<f64>),
}

/// The open-ended attribute set carried by every entity.
pub type AttributeMap = BTreeMap<String, AttributeValue>;
