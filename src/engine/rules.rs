//! Declarative transforms from `config.json` rules.
//!
//! Used when no parameter has a perturbed export. Each rule is compiled once
//! (layer globs into a `GlobSet`) and then tested against every vertex:
//!
//! - `layers`: the vertex must have a layer matching at least one pattern.
//! - `bounds`: every declared axis range must contain the coordinate
//!   (inclusive); checking stops at the first axis out of range.
//!
//! A matching rule copies its whole property bag into the vertex's
//! `transformations` under the rule's key. Rules are applied in declaration
//! order.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::{Map, Value};

use crate::config::TransformRule;
use crate::error::{CompileError, Result};
use crate::{Axis, MeshItem, Transformation, Vertex};

#[derive(Debug, Clone)]
struct CompiledRule {
    key: String,
    layers: Option<GlobSet>,
    bounds: Vec<(Axis, f64, f64)>,
    properties: Map<String, Value>,
}

impl CompiledRule {
    fn compile(key: &str, rule: &TransformRule) -> Result<Self> {
        let layers = if rule.matcher.layers.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &rule.matcher.layers {
                let glob = Glob::new(pattern).map_err(|e| CompileError::Config {
                    path: "config.json".into(),
                    reason: format!("rule `{key}` has an invalid layer pattern: {e}"),
                })?;
                builder.add(glob);
            }
            let set = builder.build().map_err(|e| CompileError::Config {
                path: "config.json".into(),
                reason: format!("rule `{key}`: {e}"),
            })?;
            Some(set)
        };

        let bounds = Axis::ALL
            .iter()
            .filter_map(|axis| rule.matcher.bounds.get(axis).map(|[min, max]| (*axis, *min, *max)))
            .collect();

        Ok(CompiledRule { key: key.to_string(), layers, bounds, properties: rule.properties.clone() })
    }

    fn matches(&self, vertex: &Vertex) -> bool {
        if let Some(globs) = &self.layers {
            match &vertex.layer {
                Some(layer) if globs.is_match(layer.as_str()) => {}
                _ => return false,
            }
        }
        self.bounds.iter().all(|&(axis, min, max)| {
            let value = vertex.geometry.get(axis);
            value >= min && value <= max
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleTransformer {
    rules: Vec<CompiledRule>,
}

impl RuleTransformer {
    pub fn new(rules: &[(String, TransformRule)]) -> Result<Self> {
        let rules = rules.iter().map(|(key, rule)| CompiledRule::compile(key, rule)).collect::<Result<Vec<_>>>()?;
        Ok(RuleTransformer { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule filters on layer names.
    pub fn matches_layers(&self) -> bool {
        self.rules.iter().any(|rule| rule.layers.is_some())
    }

    pub fn annotate(&self, mut item: MeshItem) -> MeshItem {
        if let MeshItem::Vertex(vertex) = &mut item {
            for rule in &self.rules {
                if rule.matches(vertex) {
                    let properties = Transformation::Properties(rule.properties.clone());
                    vertex.transformations.insert(rule.key.clone(), properties);
                }
            }
        }
        item
    }

    /// Annotate a stream of items; errors from upstream pass through.
    pub fn apply<'r, I>(&'r self, items: I) -> impl Iterator<Item = Result<MeshItem>> + 'r
    where
        I: Iterator<Item = Result<MeshItem>> + 'r,
    {
        items.map(move |item| item.map(|item| self.annotate(item)))
    }
}
