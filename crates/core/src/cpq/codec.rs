use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::pool::{
    max_depth_m, max_plan_m, PlumbingType, PoolDescriptor, PoolDimensions, PoolShape,
};
use crate::errors::CodecError;

const CODE_PREFIX: &str = "BAZ-";

const SHAPE_CIRCLE: &str = "KRU";
const SHAPE_RECTANGLE: &str = "OBD";
const SHAPE_SHARP_SUFFIX: &str = "O";

const TYPE_SKIMMER: &str = "SK";
const TYPE_OVERFLOW: &str = "PR";

/// Produces the catalog code `BAZ-{SHAPE}-{TYPE}-{DIMS}`. Dimension literals
/// are emitted verbatim, no unit conversion happens here.
pub fn encode(descriptor: &PoolDescriptor) -> String {
    let shape = match descriptor.shape() {
        PoolShape::Circle => SHAPE_CIRCLE.to_string(),
        PoolShape::RectangleRounded => SHAPE_RECTANGLE.to_string(),
        PoolShape::RectangleSharp => format!("{SHAPE_RECTANGLE}-{SHAPE_SHARP_SUFFIX}"),
    };
    let plumbing = match descriptor.plumbing() {
        PlumbingType::Skimmer => TYPE_SKIMMER,
        PlumbingType::Overflow => TYPE_OVERFLOW,
    };
    let dims = match descriptor.dimensions() {
        PoolDimensions::Circle { diameter, depth } => format!("{diameter}-{depth}"),
        PoolDimensions::Rectangle { width, length, depth } => {
            format!("{width}-{length}-{depth}")
        }
    };

    format!("{CODE_PREFIX}{shape}-{plumbing}-{dims}")
}

/// Parses a catalog code back into a descriptor. Case-insensitive, ignores
/// surrounding whitespace. Legacy codes carry decimeter literals without a
/// decimal point; any parsed value above the plausibility ceiling (12 m plan,
/// 3 m depth) is divided by 10 to recover them.
pub fn decode(code: &str) -> Result<PoolDescriptor, CodecError> {
    let trimmed = code.trim();
    let normalized = trimmed.to_ascii_uppercase();
    let rest = normalized
        .strip_prefix(CODE_PREFIX)
        .ok_or_else(|| CodecError::MalformedCode(trimmed.to_string()))?;

    let tokens: Vec<&str> = rest.split('-').collect();

    // The sharp-rectangle shape spans two tokens and must be checked before
    // the one-token rectangle form.
    let (shape, consumed) = match tokens.as_slice() {
        [SHAPE_RECTANGLE, SHAPE_SHARP_SUFFIX, ..] => (PoolShape::RectangleSharp, 2),
        [SHAPE_CIRCLE, ..] => (PoolShape::Circle, 1),
        [SHAPE_RECTANGLE, ..] => (PoolShape::RectangleRounded, 1),
        [other, ..] => return Err(CodecError::UnknownShape((*other).to_string())),
        [] => return Err(CodecError::MalformedCode(trimmed.to_string())),
    };

    let plumbing = match tokens.get(consumed) {
        Some(&TYPE_SKIMMER) => PlumbingType::Skimmer,
        Some(&TYPE_OVERFLOW) => PlumbingType::Overflow,
        Some(other) => return Err(CodecError::UnknownType((*other).to_string())),
        None => return Err(CodecError::MalformedCode(trimmed.to_string())),
    };

    let dims = &tokens[consumed + 1..];
    let dimensions = match shape {
        PoolShape::Circle => {
            let [diameter, depth] = dimension_values::<2>(dims)?;
            PoolDimensions::Circle {
                diameter: correct_decimeters(diameter, max_plan_m()),
                depth: correct_decimeters(depth, max_depth_m()),
            }
        }
        PoolShape::RectangleRounded | PoolShape::RectangleSharp => {
            let [width, length, depth] = dimension_values::<3>(dims)?;
            PoolDimensions::Rectangle {
                width: correct_decimeters(width, max_plan_m()),
                length: correct_decimeters(length, max_plan_m()),
                depth: correct_decimeters(depth, max_depth_m()),
            }
        }
    };

    PoolDescriptor::new(shape, plumbing, dimensions)
        .map_err(|error| CodecError::InvalidDimensions(error.to_string()))
}

fn dimension_values<const N: usize>(tokens: &[&str]) -> Result<[Decimal; N], CodecError> {
    if tokens.len() != N {
        return Err(CodecError::InvalidDimensions(format!(
            "expected {N} dimension values, found {}",
            tokens.len()
        )));
    }

    let mut values = [Decimal::ZERO; N];
    for (slot, token) in values.iter_mut().zip(tokens) {
        let value = Decimal::from_str(token).map_err(|_| {
            CodecError::InvalidDimensions(format!("`{token}` is not a decimal number"))
        })?;
        if value <= Decimal::ZERO {
            return Err(CodecError::InvalidDimensions(format!(
                "dimension value {value} must be positive"
            )));
        }
        *slot = value;
    }
    Ok(values)
}

fn correct_decimeters(value: Decimal, ceiling: Decimal) -> Decimal {
    if value > ceiling {
        value / Decimal::TEN
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{decode, encode};
    use crate::domain::pool::{PlumbingType, PoolDescriptor, PoolDimensions, PoolShape};
    use crate::errors::CodecError;

    fn circle(diameter: Decimal, depth: Decimal) -> PoolDescriptor {
        PoolDescriptor::new(
            PoolShape::Circle,
            PlumbingType::Skimmer,
            PoolDimensions::Circle { diameter, depth },
        )
        .expect("valid circle")
    }

    fn rectangle(shape: PoolShape, plumbing: PlumbingType) -> PoolDescriptor {
        PoolDescriptor::new(
            shape,
            plumbing,
            PoolDimensions::Rectangle {
                width: Decimal::new(30, 1),
                length: Decimal::new(60, 1),
                depth: Decimal::new(15, 1),
            },
        )
        .expect("valid rectangle")
    }

    #[test]
    fn encodes_circle_with_verbatim_literals() {
        let descriptor = circle(Decimal::new(35, 1), Decimal::new(12, 1));
        assert_eq!(encode(&descriptor), "BAZ-KRU-SK-3.5-1.2");
    }

    #[test]
    fn encodes_sharp_rectangle_with_two_token_shape() {
        let descriptor = rectangle(PoolShape::RectangleSharp, PlumbingType::Overflow);
        assert_eq!(encode(&descriptor), "BAZ-OBD-O-PR-3.0-6.0-1.5");
    }

    #[test]
    fn round_trips_descriptors_without_decimeter_ambiguity() {
        for descriptor in [
            circle(Decimal::new(35, 1), Decimal::new(12, 1)),
            rectangle(PoolShape::RectangleRounded, PlumbingType::Skimmer),
            rectangle(PoolShape::RectangleSharp, PlumbingType::Overflow),
        ] {
            let decoded = decode(&encode(&descriptor)).expect("round trip");
            assert_eq!(decoded, descriptor);
        }
    }

    #[test]
    fn decodes_case_insensitively_with_whitespace() {
        let decoded = decode("  baz-kru-sk-3.5-1.2 ").expect("lenient decode");
        assert_eq!(decoded.shape(), PoolShape::Circle);
        assert_eq!(decoded.plumbing(), PlumbingType::Skimmer);
    }

    #[test]
    fn corrects_decimeter_values_above_plausibility_ceiling() {
        let decoded = decode("BAZ-OBD-SK-30-60-15").expect("decimeter correction");
        assert_eq!(
            *decoded.dimensions(),
            PoolDimensions::Rectangle {
                width: Decimal::from(3),
                length: Decimal::from(6),
                depth: Decimal::new(15, 1),
            }
        );
    }

    #[test]
    fn rejects_code_without_prefix() {
        assert!(matches!(decode("POOL-KRU-SK-3-1.2"), Err(CodecError::MalformedCode(_))));
    }

    #[test]
    fn rejects_unknown_shape_and_type_tokens() {
        assert!(matches!(decode("BAZ-XYZ-SK-3-1.2"), Err(CodecError::UnknownShape(_))));
        assert!(matches!(decode("BAZ-KRU-XX-3-1.2"), Err(CodecError::UnknownType(_))));
    }

    #[test]
    fn rejects_non_numeric_and_missing_dimensions() {
        assert!(matches!(decode("BAZ-KRU-SK-abc-1.2"), Err(CodecError::InvalidDimensions(_))));
        assert!(matches!(decode("BAZ-KRU-SK-3.5"), Err(CodecError::InvalidDimensions(_))));
        assert!(matches!(decode("BAZ-OBD-SK-3-6"), Err(CodecError::InvalidDimensions(_))));
    }

    #[test]
    fn rejects_dimensions_out_of_domain_after_correction() {
        // 350 corrects to 35, still above the 12 m plan ceiling.
        assert!(matches!(decode("BAZ-KRU-SK-350-1.2"), Err(CodecError::InvalidDimensions(_))));
    }
}
