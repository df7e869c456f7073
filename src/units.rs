//! Length unit conversion between millimeters, centimeters and inches.
//!
//! Every supported pair has its own direct factor; a conversion never chains
//! through a third unit, so `mm -> in` is one multiplication by `0.0393701`
//! rather than `mm -> cm -> in`.

use std::fmt;
use std::str::FromStr;

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthUnit {
    Millimeter,
    #[default]
    Centimeter,
    Inch,
}

/// Direct conversion factors, `(from, to, factor)`.
const CONVERSIONS: &[(LengthUnit, LengthUnit, f64)] = &[
    (LengthUnit::Millimeter, LengthUnit::Centimeter, 0.1),
    (LengthUnit::Millimeter, LengthUnit::Inch, 0.0393701),
    (LengthUnit::Centimeter, LengthUnit::Millimeter, 10.0),
    (LengthUnit::Centimeter, LengthUnit::Inch, 0.393701),
    (LengthUnit::Inch, LengthUnit::Centimeter, 2.54),
    (LengthUnit::Inch, LengthUnit::Millimeter, 25.4),
];

impl LengthUnit {
    /// Canonical short code, as written in `config.json`.
    pub fn code(self) -> &'static str {
        match self {
            LengthUnit::Millimeter => "mm",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Inch => "in",
        }
    }

    /// Factor that takes a value in `self` to a value in `to`.
    pub fn factor_to(self, to: LengthUnit) -> f64 {
        if self == to {
            return 1.0;
        }
        CONVERSIONS.iter().find(|(from, target, _)| *from == self && *target == to).map(|(_, _, f)| *f).unwrap_or(1.0)
    }
}

impl FromStr for LengthUnit {
    type Err = CompileError;

    /// Accepts the short codes plus the usual spellings. Anything starting
    /// with `in` is an inch (`in`, `inch`, `inches`).
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        if lower.starts_with("in") {
            return Ok(LengthUnit::Inch);
        }
        match lower.as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Ok(LengthUnit::Millimeter),
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Ok(LengthUnit::Centimeter),
            _ => Err(CompileError::UnsupportedUnit(s.to_string())),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Convert `value` from `from` to `to`.
pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    if from == to { value } else { value * from.factor_to(to) }
}

/// String-keyed variant of [`convert`] for units read straight from config.
///
/// Both unit names must be recognized, even when they are equal.
pub fn convert_str(value: f64, from: &str, to: &str) -> Result<f64> {
    let from: LengthUnit = from.parse()?;
    let to: LengthUnit = to.parse()?;
    Ok(convert(value, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [LengthUnit; 3] = [LengthUnit::Millimeter, LengthUnit::Centimeter, LengthUnit::Inch];

    #[test]
    fn same_unit_is_identity() {
        for unit in ALL {
            assert_eq!(convert(12.345, unit, unit), 12.345);
        }
    }

    #[test]
    fn direct_factors() {
        assert_eq!(convert(10.0, LengthUnit::Millimeter, LengthUnit::Centimeter), 1.0);
        assert_eq!(convert(1.0, LengthUnit::Centimeter, LengthUnit::Millimeter), 10.0);
        assert_eq!(convert(1.0, LengthUnit::Inch, LengthUnit::Millimeter), 25.4);
        assert_eq!(convert(1.0, LengthUnit::Inch, LengthUnit::Centimeter), 2.54);
        assert_eq!(convert(1.0, LengthUnit::Centimeter, LengthUnit::Inch), 0.393701);
        assert_eq!(convert(1.0, LengthUnit::Millimeter, LengthUnit::Inch), 0.0393701);
    }

    #[test]
    fn round_trip_is_symmetric_within_factor_precision() {
        for a in ALL {
            for b in ALL {
                for v in [0.0, 1.0, -3.5, 250.0, 1e-3] {
                    let back = convert(convert(v, a, b), b, a);
                    assert_relative_eq!(back, v, max_relative = 1e-6, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn aliases_normalize() {
        assert_eq!("inches".parse::<LengthUnit>().unwrap(), LengthUnit::Inch);
        assert_eq!("in".parse::<LengthUnit>().unwrap(), LengthUnit::Inch);
        assert_eq!("Millimetres".parse::<LengthUnit>().unwrap(), LengthUnit::Millimeter);
        assert_eq!(" cm ".parse::<LengthUnit>().unwrap(), LengthUnit::Centimeter);
    }

    #[test]
    fn unsupported_units_are_rejected() {
        assert!(matches!("ft".parse::<LengthUnit>(), Err(CompileError::UnsupportedUnit(u)) if u == "ft"));
        assert!(matches!(convert_str(1.0, "deg", "deg"), Err(CompileError::UnsupportedUnit(_))));
        assert_eq!(convert_str(2.0, "in", "cm").unwrap(), 5.08);
    }
}
