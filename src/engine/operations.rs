use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::error::EngineError;

/// Operaciones binarias elemento a elemento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairwiseOp {
    /// x + y
    Add,
    /// x - y
    Subtract,
    /// x * y
    Multiply,
    /// x / y
    Divide,
    /// y - x
    ReverseSubtract,
    /// y / x
    ReverseDivide,
    /// (x - y)^2
    SquaredSubtract,
    /// max(x, y)
    Max,
    /// min(x, y)
    Min,
    /// x ^ y
    Pow,
    /// atan2(y, x)
    Atan2,
    /// floor(x / y)
    FloorDiv,
    /// x mod y con el signo de y
    FloorMod,
    /// x - y * round(x / y)
    Remainder,
    /// z = y
    Copy,
    /// 1.0 si x == y, si no 0.0
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl PairwiseOp {
    pub const ALL: [PairwiseOp; 21] = [
        PairwiseOp::Add,
        PairwiseOp::Subtract,
        PairwiseOp::Multiply,
        PairwiseOp::Divide,
        PairwiseOp::ReverseSubtract,
        PairwiseOp::ReverseDivide,
        PairwiseOp::SquaredSubtract,
        PairwiseOp::Max,
        PairwiseOp::Min,
        PairwiseOp::Pow,
        PairwiseOp::Atan2,
        PairwiseOp::FloorDiv,
        PairwiseOp::FloorMod,
        PairwiseOp::Remainder,
        PairwiseOp::Copy,
        PairwiseOp::EqualTo,
        PairwiseOp::NotEqualTo,
        PairwiseOp::GreaterThan,
        PairwiseOp::GreaterThanOrEqual,
        PairwiseOp::LessThan,
        PairwiseOp::LessThanOrEqual,
    ];

    /// Stable numeric code, equal to the position in `ALL`.
    pub fn op_num(self) -> i32 {
        match self {
            PairwiseOp::Add => 0,
            PairwiseOp::Subtract => 1,
            PairwiseOp::Multiply => 2,
            PairwiseOp::Divide => 3,
            PairwiseOp::ReverseSubtract => 4,
            PairwiseOp::ReverseDivide => 5,
            PairwiseOp::SquaredSubtract => 6,
            PairwiseOp::Max => 7,
            PairwiseOp::Min => 8,
            PairwiseOp::Pow => 9,
            PairwiseOp::Atan2 => 10,
            PairwiseOp::FloorDiv => 11,
            PairwiseOp::FloorMod => 12,
            PairwiseOp::Remainder => 13,
            PairwiseOp::Copy => 14,
            PairwiseOp::EqualTo => 15,
            PairwiseOp::NotEqualTo => 16,
            PairwiseOp::GreaterThan => 17,
            PairwiseOp::GreaterThanOrEqual => 18,
            PairwiseOp::LessThan => 19,
            PairwiseOp::LessThanOrEqual => 20,
        }
    }

    pub fn from_op_num(num: i32) -> Result<Self, EngineError> {
        usize::try_from(num)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| EngineError::UnknownOp(num.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            PairwiseOp::Add => "add",
            PairwiseOp::Subtract => "subtract",
            PairwiseOp::Multiply => "multiply",
            PairwiseOp::Divide => "divide",
            PairwiseOp::ReverseSubtract => "reverse_subtract",
            PairwiseOp::ReverseDivide => "reverse_divide",
            PairwiseOp::SquaredSubtract => "squared_subtract",
            PairwiseOp::Max => "max",
            PairwiseOp::Min => "min",
            PairwiseOp::Pow => "pow",
            PairwiseOp::Atan2 => "atan2",
            PairwiseOp::FloorDiv => "floor_div",
            PairwiseOp::FloorMod => "floor_mod",
            PairwiseOp::Remainder => "remainder",
            PairwiseOp::Copy => "copy",
            PairwiseOp::EqualTo => "equal_to",
            PairwiseOp::NotEqualTo => "not_equal_to",
            PairwiseOp::GreaterThan => "greater_than",
            PairwiseOp::GreaterThanOrEqual => "greater_than_or_equal",
            PairwiseOp::LessThan => "less_than",
            PairwiseOp::LessThanOrEqual => "less_than_or_equal",
        }
    }

    /// Aplica la operación a un par de elementos. Sigue IEEE 754: x / 0 = inf.
    #[inline(always)]
    pub fn apply(self, x: f32, y: f32) -> f32 {
        match self {
            PairwiseOp::Add => x + y,
            PairwiseOp::Subtract => x - y,
            PairwiseOp::Multiply => x * y,
            PairwiseOp::Divide => x / y,
            PairwiseOp::ReverseSubtract => y - x,
            PairwiseOp::ReverseDivide => y / x,
            PairwiseOp::SquaredSubtract => {
                let d = x - y;
                d * d
            }
            PairwiseOp::Max => x.max(y),
            PairwiseOp::Min => x.min(y),
            PairwiseOp::Pow => x.powf(y),
            PairwiseOp::Atan2 => y.atan2(x),
            PairwiseOp::FloorDiv => (x / y).floor(),
            PairwiseOp::FloorMod => {
                let m = x % y;
                if m != 0.0 && (m < 0.0) != (y < 0.0) {
                    m + y
                } else {
                    m
                }
            }
            PairwiseOp::Remainder => x - y * (x / y).round(),
            PairwiseOp::Copy => y,
            PairwiseOp::EqualTo => bool_to_f32(x == y),
            PairwiseOp::NotEqualTo => bool_to_f32(x != y),
            PairwiseOp::GreaterThan => bool_to_f32(x > y),
            PairwiseOp::GreaterThanOrEqual => bool_to_f32(x >= y),
            PairwiseOp::LessThan => bool_to_f32(x < y),
            PairwiseOp::LessThanOrEqual => bool_to_f32(x <= y),
        }
    }
}

#[inline(always)]
fn bool_to_f32(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl fmt::Display for PairwiseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PairwiseOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('-', "_");
        let op = match lowered.as_str() {
            "add" => PairwiseOp::Add,
            "sub" | "subtract" => PairwiseOp::Subtract,
            "mul" | "multiply" => PairwiseOp::Multiply,
            "div" | "divide" => PairwiseOp::Divide,
            "rsub" => PairwiseOp::ReverseSubtract,
            "rdiv" => PairwiseOp::ReverseDivide,
            other => Self::ALL
                .iter()
                .copied()
                .find(|op| op.name() == other)
                .ok_or_else(|| EngineError::UnknownOp(s.to_string()))?,
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_num_is_stable_and_invertible() {
        assert_eq!(PairwiseOp::Add.op_num(), 0);
        assert_eq!(PairwiseOp::LessThanOrEqual.op_num(), 20);
        for op in PairwiseOp::ALL {
            assert_eq!(PairwiseOp::from_op_num(op.op_num()).unwrap(), op);
        }
        assert!(PairwiseOp::from_op_num(-1).is_err());
        assert!(PairwiseOp::from_op_num(21).is_err());
    }

    #[test]
    fn test_op_num_matches_position_in_all() {
        for (i, op) in PairwiseOp::ALL.iter().enumerate() {
            assert_eq!(op.op_num(), i as i32, "{}", op);
        }
    }

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("add".parse::<PairwiseOp>().unwrap(), PairwiseOp::Add);
        assert_eq!("SUB".parse::<PairwiseOp>().unwrap(), PairwiseOp::Subtract);
        assert_eq!(
            "greater-than".parse::<PairwiseOp>().unwrap(),
            PairwiseOp::GreaterThan
        );
        for op in PairwiseOp::ALL {
            assert_eq!(op.name().parse::<PairwiseOp>().unwrap(), op);
        }
        assert!(matches!(
            "bogus".parse::<PairwiseOp>(),
            Err(EngineError::UnknownOp(_))
        ));
    }

    #[test]
    fn test_apply_arithmetic() {
        assert_eq!(PairwiseOp::Add.apply(2.0, 3.0), 5.0);
        assert_eq!(PairwiseOp::ReverseSubtract.apply(2.0, 3.0), 1.0);
        assert_eq!(PairwiseOp::ReverseDivide.apply(2.0, 3.0), 1.5);
        assert_eq!(PairwiseOp::SquaredSubtract.apply(2.0, 5.0), 9.0);
        assert_eq!(PairwiseOp::FloorDiv.apply(7.0, 2.0), 3.0);
        assert_eq!(PairwiseOp::FloorMod.apply(-7.0, 3.0), 2.0);
        assert_eq!(PairwiseOp::Copy.apply(1.0, 9.0), 9.0);
        assert!(PairwiseOp::Divide.apply(1.0, 0.0).is_infinite());
    }

    #[test]
    fn test_apply_comparisons() {
        assert_eq!(PairwiseOp::EqualTo.apply(1.0, 1.0), 1.0);
        assert_eq!(PairwiseOp::NotEqualTo.apply(1.0, 1.0), 0.0);
        assert_eq!(PairwiseOp::GreaterThan.apply(2.0, 1.0), 1.0);
        assert_eq!(PairwiseOp::LessThanOrEqual.apply(2.0, 1.0), 0.0);
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&PairwiseOp::GreaterThanOrEqual).unwrap();
        assert_eq!(json, "\"greater_than_or_equal\"");
        assert_eq!(PairwiseOp::GreaterThanOrEqual.to_string(), "greater_than_or_equal");
    }
}
