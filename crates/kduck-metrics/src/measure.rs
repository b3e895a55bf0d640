//! Measures and measurements

use std::sync::Arc;

/// Unit for counts and other dimensionless values
pub const UNIT_DIMENSIONLESS: &str = "1";
pub const UNIT_BYTES: &str = "By";
pub const UNIT_MILLISECONDS: &str = "ms";
pub const UNIT_SECONDS: &str = "s";

/// Value type of a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Int64,
    Float64,
}

#[derive(Debug, PartialEq)]
struct MeasureDesc {
    name: String,
    description: String,
    unit: String,
    kind: MeasureKind,
}

/// A named quantity that can be recorded. Cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure(Arc<MeasureDesc>);

impl Measure {
    fn new(kind: MeasureKind, name: &str, description: &str, unit: &str) -> Self {
        Self(Arc::new(MeasureDesc {
            name: name.to_string(),
            description: description.to_string(),
            unit: unit.to_string(),
            kind,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn description(&self) -> &str {
        &self.0.description
    }

    pub fn unit(&self) -> &str {
        &self.0.unit
    }

    pub fn kind(&self) -> MeasureKind {
        self.0.kind
    }
}

/// Measure of integer values
#[derive(Debug, Clone, PartialEq)]
pub struct Int64Measure(Measure);

impl Int64Measure {
    pub fn new(name: &str, description: &str, unit: &str) -> Self {
        Self(Measure::new(MeasureKind::Int64, name, description, unit))
    }

    /// A measurement of `value`
    pub fn m(&self, value: i64) -> Measurement {
        Measurement {
            measure: self.0.clone(),
            value: value as f64,
        }
    }

    pub fn measure(&self) -> &Measure {
        &self.0
    }
}

/// Measure of floating point values
#[derive(Debug, Clone, PartialEq)]
pub struct Float64Measure(Measure);

impl Float64Measure {
    pub fn new(name: &str, description: &str, unit: &str) -> Self {
        Self(Measure::new(MeasureKind::Float64, name, description, unit))
    }

    /// A measurement of `value`
    pub fn m(&self, value: f64) -> Measurement {
        Measurement {
            measure: self.0.clone(),
            value,
        }
    }

    pub fn measure(&self) -> &Measure {
        &self.0
    }
}

/// A single value recorded against a measure
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    measure: Measure,
    value: f64,
}

impl Measurement {
    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
