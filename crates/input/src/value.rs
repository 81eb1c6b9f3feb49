use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::binding::ValueShape;

/// A resolved action value, shaped by the action's declaration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionValue {
    Vector(Vec2),
    Scalar(f32),
    Button(bool),
}

impl ActionValue {
    /// The released value for a shape.
    pub fn zero(shape: ValueShape) -> Self {
        match shape {
            ValueShape::Vector2 => Self::Vector(Vec2::ZERO),
            ValueShape::Scalar => Self::Scalar(0.0),
            ValueShape::Button => Self::Button(false),
        }
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Vector(_) => ValueShape::Vector2,
            Self::Scalar(_) => ValueShape::Scalar,
            Self::Button(_) => ValueShape::Button,
        }
    }

    /// Actuation magnitude used for edge detection.
    pub fn magnitude(&self) -> f32 {
        match *self {
            Self::Vector(v) => v.length(),
            Self::Scalar(s) => s.abs(),
            Self::Button(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Self::Vector(v) => v == Vec2::ZERO,
            Self::Scalar(s) => s == 0.0,
            Self::Button(b) => !b,
        }
    }

    /// Vector view; scalars land on X, buttons become `(1, 0)` when pressed.
    pub fn as_vec2(&self) -> Vec2 {
        match *self {
            Self::Vector(v) => v,
            Self::Scalar(s) => Vec2::new(s, 0.0),
            Self::Button(b) => Vec2::new(if b { 1.0 } else { 0.0 }, 0.0),
        }
    }

    /// Scalar view; vectors report their magnitude.
    pub fn as_scalar(&self) -> f32 {
        match *self {
            Self::Vector(v) => v.length(),
            Self::Scalar(s) => s,
            Self::Button(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_matches_shape() {
        for shape in [ValueShape::Vector2, ValueShape::Scalar, ValueShape::Button] {
            let z = ActionValue::zero(shape);
            assert!(z.is_zero());
            assert_eq!(z.shape(), shape);
            assert_eq!(z.magnitude(), 0.0);
        }
    }

    #[test]
    fn views() {
        let v = ActionValue::Vector(Vec2::new(3.0, 4.0));
        assert_eq!(v.as_scalar(), 5.0);
        assert_eq!(ActionValue::Scalar(-2.0).as_vec2(), Vec2::new(-2.0, 0.0));
        assert_eq!(ActionValue::Button(true).as_scalar(), 1.0);
        assert_eq!(ActionValue::Scalar(-2.0).magnitude(), 2.0);
    }
}
