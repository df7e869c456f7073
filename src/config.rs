//! The `config.json` model.
//!
//! `config.json` is written by the exporter and handed back to the sink next to
//! the compiled document. A `Config` read with [`Config::from_json`] keeps the
//! document as read and hands that back verbatim; the typed fields are only
//! for compiling. Fields this crate does not interpret are also kept in
//! `extra` for configs built or deserialized some other way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::Axis;
use crate::error::{CompileError, Result};
use crate::units::{LengthUnit, convert};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    /// Declarative rules, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "ordered_rules")]
    pub transformations: Vec<(String, TransformRule)>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The JSON this config was read from.
    #[serde(skip)]
    raw: Option<Value>,
}

impl Config {
    /// Parse `config.json`, remembering the document as read.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let mut config: Config = serde_json::from_str(json)?;
        config.raw = Some(serde_json::from_str(json)?);
        Ok(config)
    }

    /// The JSON to persist next to a compiled document: the document as read
    /// when there is one, else the typed fields.
    pub fn to_json_value(&self) -> std::result::Result<Value, serde_json::Error> {
        match &self.raw {
            Some(raw) => Ok(raw.clone()),
            None => serde_json::to_value(self),
        }
    }
}

/// A tunable design parameter.
///
/// `initial_value` and `comparison_value` are in the parameter's own `units`;
/// when `units` is absent the model units apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub initial_value: f64,
    pub comparison_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The value domain of a parameter, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamValue {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    NumericRange,
}

impl ParamValue {
    pub fn range(min: f64, max: f64) -> Self {
        ParamValue { kind: "numeric::range".to_string(), min: Some(min), max: Some(max), extra: Map::new() }
    }

    pub fn value_kind(&self) -> Option<ValueKind> {
        match self.kind.as_str() {
            "numeric::range" => Some(ValueKind::NumericRange),
            _ => None,
        }
    }
}

impl Parameter {
    /// Check that the parameter's value type is one this crate understands.
    /// A parameter without a `value` block is accepted.
    pub fn validate(&self, key: &str) -> Result<()> {
        match &self.value {
            Some(value) if value.value_kind().is_none() => {
                Err(CompileError::UnsupportedValueType { param: key.to_string(), kind: value.kind.clone() })
            }
            _ => Ok(()),
        }
    }

    /// The unit `initial_value`/`comparison_value` are expressed in.
    pub fn units_or(&self, model_units: LengthUnit) -> Result<LengthUnit> {
        match &self.units {
            Some(units) => units.parse(),
            None => Ok(model_units),
        }
    }

    /// `comparison_value - initial_value`, both converted to `geometry_units`.
    ///
    /// Fails with [`CompileError::ZeroParameterDelta`] when the difference is
    /// zero, since every factor derived from it would divide by zero.
    pub fn delta(&self, key: &str, model_units: LengthUnit, geometry_units: LengthUnit) -> Result<f64> {
        let units = self.units_or(model_units)?;
        parameter_delta(key, self.initial_value, self.comparison_value, units, geometry_units)
    }

    /// Pick a comparison value for exporting the perturbed mesh.
    ///
    /// The nudge has to be small, so the exporter does not switch to a
    /// different tessellation and desynchronize the files line by line, yet
    /// large enough to survive the exporter's rounding. Aims for +/-2% of the
    /// initial value, falling back to the range bounds.
    pub fn suggested_comparison_value(&self, key: &str) -> Result<f64> {
        let unsupported = |kind: &str| CompileError::UnsupportedValueType { param: key.to_string(), kind: kind.into() };
        let value = self.value.as_ref().ok_or_else(|| unsupported("<missing>"))?;
        if value.value_kind() != Some(ValueKind::NumericRange) {
            return Err(unsupported(&value.kind));
        }

        let initial = self.initial_value;
        let min = value.min.unwrap_or(f64::NEG_INFINITY);
        let max = value.max.unwrap_or(f64::INFINITY);
        let two_percent_more = initial * 1.02;
        let two_percent_less = initial * 0.98;

        if two_percent_more < max && two_percent_more != initial {
            return Ok(two_percent_more);
        }
        if two_percent_less > min && two_percent_less != initial {
            return Ok(two_percent_less);
        }
        if initial < max && max.is_finite() {
            return Ok(max);
        }
        if min.is_finite() {
            return Ok(min);
        }
        Err(CompileError::ZeroParameterDelta { param: key.to_string(), value: initial })
    }
}

/// Difference between comparison and initial value in geometry units.
pub(crate) fn parameter_delta(
    key: &str,
    initial_value: f64,
    comparison_value: f64,
    units: LengthUnit,
    geometry_units: LengthUnit,
) -> Result<f64> {
    let delta = convert(comparison_value, units, geometry_units) - convert(initial_value, units, geometry_units);
    if delta == 0.0 || !delta.is_finite() {
        return Err(CompileError::ZeroParameterDelta { param: key.to_string(), value: initial_value });
    }
    Ok(delta)
}

// --- Declarative rules -------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformRule {
    #[serde(rename = "match", default)]
    pub matcher: RuleMatch,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Predicates of a rule. An empty predicate always matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Inclusive `[min, max]` per axis. Keys other than `x`, `y`, `z` are
    /// ignored.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "known_axes")]
    pub bounds: BTreeMap<Axis, [f64; 2]>,
    /// Case-sensitive glob patterns for the vertex's layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<String>,
}

fn known_axes<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Axis, [f64; 2]>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Map::<String, Value>::deserialize(deserializer)?;
    let mut bounds = BTreeMap::new();
    for (key, range) in raw {
        let Some(axis) = Axis::ALL.into_iter().find(|axis| axis.as_str() == key) else {
            warn!(axis = %key, "ignoring bounds on unknown axis");
            continue;
        };
        let range: [f64; 2] = serde_json::from_value(range).map_err(D::Error::custom)?;
        bounds.insert(axis, range);
    }
    Ok(bounds)
}

/// (De)serialize the rule map as an ordered list, keeping declaration order.
/// A repeated key keeps its first position and takes the last value.
mod ordered_rules {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::TransformRule;

    pub fn serialize<S: Serializer>(rules: &[(String, TransformRule)], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(rules.len()))?;
        for (key, rule) in rules {
            map.serialize_entry(key, rule)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, TransformRule)>, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = Vec<(String, TransformRule)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of transformation rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut rules: Vec<(String, TransformRule)> = Vec::new();
                while let Some((key, rule)) = access.next_entry::<String, TransformRule>()? {
                    match rules.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(slot) => slot.1 = rule,
                        None => rules.push((key, rule)),
                    }
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RulesVisitor)
    }
}
