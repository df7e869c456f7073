//! Transform derivation from perturbed meshes.
//!
//! For every parameter with a perturbed export, the baseline vertex at item
//! position `i` is compared with the perturbed item at the same position. Each
//! axis whose coordinate moved gets a linear factor:
//!
//! ```text
//! delta  = comparison_value - initial_value      (geometry units)
//! factor = (perturbed - baseline) / delta
//! key    = "<axis>_by_<param>"  ->  {axis: {use: add, args: ["@", "$param", factor]}}
//! ```
//!
//! Coordinates are compared exactly. The precision of the exported numbers is
//! the comparison granularity, which is why the exporter nudges the parameter
//! by a few percent rather than by an epsilon. A vertex that did not move on
//! any axis gets nothing for that parameter. A factor that overflows (a tiny
//! delta against a large move) aborts the run rather than reaching the output.

use tracing::debug;

use crate::config::parameter_delta;
use crate::error::{CompileError, Result};
use crate::units::LengthUnit;
use crate::{Axis, AxisOp, MeshItem, Transformation};

/// A parameter's perturbed mesh, materialized for positional lookup, with its
/// delta already converted to geometry units.
#[derive(Debug, Clone)]
pub struct PerturbedSample {
    pub key: String,
    pub delta: f64,
    pub items: Vec<MeshItem>,
}

impl PerturbedSample {
    /// Fails with `ZeroParameterDelta` when both values convert to the same
    /// length.
    pub fn new(
        key: impl Into<String>,
        initial_value: f64,
        comparison_value: f64,
        units: LengthUnit,
        geometry_units: LengthUnit,
        items: Vec<MeshItem>,
    ) -> Result<Self> {
        let key = key.into();
        let delta = parameter_delta(&key, initial_value, comparison_value, units, geometry_units)?;
        Ok(PerturbedSample { key, delta, items })
    }
}

#[derive(Debug, Clone)]
pub struct TransformDeriver {
    samples: Vec<PerturbedSample>,
}

impl TransformDeriver {
    pub fn new(samples: Vec<PerturbedSample>) -> Self {
        debug!(params = ?samples.iter().map(|s| s.key.as_str()).collect::<Vec<_>>(), "derive transforms");
        TransformDeriver { samples }
    }

    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|s| s.key.as_str())
    }

    /// Annotate a stream of baseline items. Stops after the first error.
    pub fn derive<I>(&self, items: I) -> Derivation<'_, I>
    where
        I: Iterator<Item = Result<MeshItem>>,
    {
        Derivation { deriver: self, items, index: 0, done: false }
    }

    /// Annotate the baseline item at position `index`.
    pub fn annotate(&self, index: usize, mut item: MeshItem) -> Result<MeshItem> {
        let MeshItem::Vertex(vertex) = &mut item else {
            return Ok(item);
        };

        for sample in &self.samples {
            let perturbed = match sample.items.get(index) {
                Some(MeshItem::Vertex(v)) => v,
                Some(_) => {
                    return Err(CompileError::PerturbedMismatch {
                        param: sample.key.clone(),
                        line: index + 1,
                        reason: "expected a vertex record".to_string(),
                    });
                }
                None => {
                    return Err(CompileError::PerturbedMismatch {
                        param: sample.key.clone(),
                        line: index + 1,
                        reason: format!("perturbed mesh ends after {} lines", sample.items.len()),
                    });
                }
            };

            for axis in Axis::ALL {
                let base = vertex.geometry.get(axis);
                let moved = perturbed.geometry.get(axis);
                if base == moved {
                    continue;
                }
                let factor = (moved - base) / sample.delta;
                if !factor.is_finite() {
                    return Err(CompileError::NonFiniteFactor { param: sample.key.clone(), line: index + 1, axis });
                }
                let op = AxisOp { axis, param: sample.key.clone(), factor };
                vertex.transformations.insert(op.key(), Transformation::Axis(op));
            }
        }

        Ok(item)
    }
}

/// Iterator returned by [`TransformDeriver::derive`].
#[derive(Debug)]
pub struct Derivation<'d, I> {
    deriver: &'d TransformDeriver,
    items: I,
    index: usize,
    done: bool,
}

impl<I: Iterator<Item = Result<MeshItem>>> Iterator for Derivation<'_, I> {
    type Item = Result<MeshItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let result = self.items.next()?.and_then(|item| self.deriver.annotate(index, item));
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Geometry, Vertex};

    fn vertex(x: f64, y: f64, z: f64) -> MeshItem {
        MeshItem::Vertex(Vertex::new(Geometry::new(x, y, z), None))
    }

    fn sample(key: &str, initial: f64, comparison: f64, items: Vec<MeshItem>) -> PerturbedSample {
        PerturbedSample::new(key, initial, comparison, LengthUnit::Centimeter, LengthUnit::Centimeter, items).unwrap()
    }

    fn transforms(item: &MeshItem) -> Vec<String> {
        item.as_vertex().unwrap().transformations.keys().cloned().collect()
    }

    #[test]
    fn only_moved_axes_get_transforms() {
        let deriver = TransformDeriver::new(vec![sample("height", 3.0, 6.0, vec![vertex(1.0, 2.0, 6.0)])]);
        let item = deriver.annotate(0, vertex(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(transforms(&item), vec!["z_by_height"]);
        let Transformation::Axis(op) = &item.as_vertex().unwrap().transformations["z_by_height"] else {
            panic!("expected an axis op");
        };
        assert_eq!(op.factor, 1.0);
        assert_eq!(op.axis, Axis::Z);
    }

    #[test]
    fn factors_scale_with_delta_and_keep_sign() {
        let deriver = TransformDeriver::new(vec![sample("w", 10.0, 12.0, vec![vertex(-1.0, 5.0, 0.0)])]);
        let item = deriver.annotate(0, vertex(-2.0, 6.0, 0.0)).unwrap();
        let v = item.as_vertex().unwrap();
        let factor = |key: &str| match &v.transformations[key] {
            Transformation::Axis(op) => op.factor,
            Transformation::Properties(_) => panic!("expected an axis op"),
        };
        assert_eq!(factor("x_by_w"), 0.5);
        assert_eq!(factor("y_by_w"), -0.5);
        assert!(!v.transformations.contains_key("z_by_w"));
    }

    #[test]
    fn several_parameters_accumulate() {
        let deriver = TransformDeriver::new(vec![
            sample("depth", 1.0, 2.0, vec![vertex(0.0, 3.0, 0.0)]),
            sample("width", 1.0, 2.0, vec![vertex(4.0, 0.0, 0.0)]),
        ]);
        let item = deriver.annotate(0, vertex(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(transforms(&item), vec!["x_by_width", "y_by_depth"]);
    }

    #[test]
    fn unmoved_vertex_is_untouched() {
        let deriver = TransformDeriver::new(vec![sample("h", 1.0, 2.0, vec![vertex(1.0, 1.0, 1.0)])]);
        let item = deriver.annotate(0, vertex(1.0, 1.0, 1.0)).unwrap();
        assert!(item.as_vertex().unwrap().transformations.is_empty());
    }

    #[test]
    fn pass_items_are_not_compared() {
        let deriver = TransformDeriver::new(vec![sample("h", 1.0, 2.0, vec![])]);
        let pass = MeshItem::Pass { line: "solid x".into() };
        assert_eq!(deriver.annotate(5, pass.clone()).unwrap(), pass);
    }

    #[test]
    fn misaligned_perturbed_mesh_is_an_error() {
        let deriver = TransformDeriver::new(vec![sample("h", 1.0, 2.0, vec![MeshItem::Pass { line: "x".into() }])]);
        let at = |index| deriver.annotate(index, vertex(0.0, 0.0, 0.0));
        assert!(matches!(at(0), Err(CompileError::PerturbedMismatch { line: 1, .. })));
        assert!(matches!(at(1), Err(CompileError::PerturbedMismatch { line: 2, .. })));
    }

    #[test]
    fn zero_delta_sample_is_rejected() {
        let err =
            PerturbedSample::new("h", 3.0, 3.0, LengthUnit::Millimeter, LengthUnit::Centimeter, vec![]).unwrap_err();
        assert!(matches!(err, CompileError::ZeroParameterDelta { .. }));
    }

    #[test]
    fn delta_uses_geometry_units() {
        // 1 in -> 2 in is 2.54 cm; a 2.54 cm move is a factor of 1.
        let perturbed = vec![vertex(0.0, 0.0, 2.54)];
        let s = PerturbedSample::new("h", 1.0, 2.0, LengthUnit::Inch, LengthUnit::Centimeter, perturbed).unwrap();
        let deriver = TransformDeriver::new(vec![s]);
        let item = deriver.annotate(0, vertex(0.0, 0.0, 0.0)).unwrap();
        match &item.as_vertex().unwrap().transformations["z_by_h"] {
            Transformation::Axis(op) => assert_eq!(op.factor, 1.0),
            Transformation::Properties(_) => panic!("expected an axis op"),
        }
    }

    #[test]
    fn overflowing_factor_is_an_error() {
        let perturbed = vec![MeshItem::Pass { line: "# moved".into() }, vertex(0.0, 0.0, 1e10)];
        let s = sample("h", 0.0, 1e-300, perturbed);
        let deriver = TransformDeriver::new(vec![s]);
        let err = deriver.annotate(1, vertex(0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, CompileError::NonFiniteFactor { ref param, line: 2, axis: Axis::Z } if param == "h"));
    }
}
