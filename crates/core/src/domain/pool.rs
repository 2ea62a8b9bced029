use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolShape {
    Circle,
    RectangleRounded,
    RectangleSharp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlumbingType {
    Skimmer,
    Overflow,
}

/// Shape-dependent dimension variant, decimal meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolDimensions {
    Circle { diameter: Decimal, depth: Decimal },
    Rectangle { width: Decimal, length: Decimal, depth: Decimal },
}

/// A configured pool: shape, plumbing type and dimensions.
///
/// Constructed only through [`PoolDescriptor::new`], which enforces that the
/// dimension variant matches the shape and that every value stays inside the
/// catalog's fixed domain. Immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    shape: PoolShape,
    plumbing: PlumbingType,
    dimensions: PoolDimensions,
}

fn pi() -> Decimal {
    Decimal::new(3_141_592_653_589_793, 15)
}

fn min_plan_m() -> Decimal {
    Decimal::ONE
}

/// Largest plausible plan dimension (diameter, width, length) in meters.
pub fn max_plan_m() -> Decimal {
    Decimal::from(12)
}

fn min_depth_m() -> Decimal {
    Decimal::new(5, 1)
}

/// Largest plausible depth in meters.
pub fn max_depth_m() -> Decimal {
    Decimal::from(3)
}

fn check_range(field: &str, value: Decimal, min: Decimal, max: Decimal) -> Result<(), DomainError> {
    if value < min || value > max {
        return Err(DomainError::InvariantViolation(format!(
            "{field} {value} m outside allowed range {min}..={max} m"
        )));
    }
    Ok(())
}

impl PoolDescriptor {
    pub fn new(
        shape: PoolShape,
        plumbing: PlumbingType,
        dimensions: PoolDimensions,
    ) -> Result<Self, DomainError> {
        match (shape, &dimensions) {
            (PoolShape::Circle, PoolDimensions::Circle { diameter, depth }) => {
                check_range("diameter", *diameter, min_plan_m(), max_plan_m())?;
                check_range("depth", *depth, min_depth_m(), max_depth_m())?;
            }
            (
                PoolShape::RectangleRounded | PoolShape::RectangleSharp,
                PoolDimensions::Rectangle { width, length, depth },
            ) => {
                check_range("width", *width, min_plan_m(), max_plan_m())?;
                check_range("length", *length, min_plan_m(), max_plan_m())?;
                check_range("depth", *depth, min_depth_m(), max_depth_m())?;
            }
            _ => {
                return Err(DomainError::InvariantViolation(format!(
                    "dimension variant does not match pool shape {shape:?}"
                )));
            }
        }

        Ok(Self { shape, plumbing, dimensions })
    }

    pub fn shape(&self) -> PoolShape {
        self.shape
    }

    pub fn plumbing(&self) -> PlumbingType {
        self.plumbing
    }

    pub fn dimensions(&self) -> &PoolDimensions {
        &self.dimensions
    }

    pub fn depth_m(&self) -> Decimal {
        match self.dimensions {
            PoolDimensions::Circle { depth, .. } | PoolDimensions::Rectangle { depth, .. } => depth,
        }
    }

    /// Water surface area, used by per-`m2` coefficient pricing.
    pub fn surface_area_m2(&self) -> Decimal {
        match self.dimensions {
            PoolDimensions::Circle { diameter, .. } => {
                let radius = diameter / Decimal::TWO;
                pi() * radius * radius
            }
            PoolDimensions::Rectangle { width, length, .. } => width * length,
        }
    }

    /// Waterline perimeter, used by per-`m` coefficient pricing.
    pub fn perimeter_m(&self) -> Decimal {
        match self.dimensions {
            PoolDimensions::Circle { diameter, .. } => pi() * diameter,
            PoolDimensions::Rectangle { width, length, .. } => Decimal::TWO * (width + length),
        }
    }

    /// Water volume, used by per-`m3` coefficient pricing.
    pub fn volume_m3(&self) -> Decimal {
        self.surface_area_m2() * self.depth_m()
    }
}
