//! Variable values and the roles their columns play.

use core::fmt;

/// A recorded variable value: either a scalar or a fixed-length vector.
///
/// JSON has no NaN or infinity and `serde_json` writes them as `null`, so a
/// `null` reads back as NaN, alone or inside a vector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Scalar(Option<f64>),
            Vector(Vec<Option<f64>>),
        }

        Ok(match <Raw as serde::Deserialize>::deserialize(deserializer)? {
            Raw::Scalar(x) => Value::Scalar(x.unwrap_or(f64::NAN)),
            Raw::Vector(v) => {
                Value::Vector(v.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect())
            }
        })
    }
}

impl Value {
    /// Number of flattened columns this value occupies.
    pub fn width(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Vector(v) => v.len(),
        }
    }

    /// Flattened column names and values.
    ///
    /// A scalar, or a vector holding exactly one element, keeps the bare key.
    /// Longer vectors expand to `{key}_0 .. {key}_{L-1}`.
    pub fn flatten(&self, key: &str) -> Vec<(String, f64)> {
        match self {
            Value::Scalar(x) => vec![(key.to_string(), *x)],
            Value::Vector(v) if v.len() == 1 => vec![(key.to_string(), v[0])],
            Value::Vector(v) => v
                .iter()
                .enumerate()
                .map(|(i, x)| (format!("{key}_{i}"), *x))
                .collect(),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

/// What a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    DesignVar,
    Objective,
    Constraint,
    AbsoluteResidual,
    RelativeResidual,
    /// Bookkeeping counters such as episode number or local iteration.
    Counter,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::DesignVar => "design variable",
            Role::Objective => "objective",
            Role::Constraint => "constraint",
            Role::AbsoluteResidual => "absolute residual",
            Role::RelativeResidual => "relative residual",
            Role::Counter => "counter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
