//! Joint angle sets.

use std::fmt;
use std::ops::{Add, Index};

use serde::{Deserialize, Serialize};

use crate::round_to;

/// Six joint angles in degrees, J1 first.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Joints(pub [f64; 6]);

impl Joints {
    pub fn new(j1: f64, j2: f64, j3: f64, j4: f64, j5: f64, j6: f64) -> Self {
        Self([j1, j2, j3, j4, j5, j6])
    }

    pub fn values(&self) -> [f64; 6] {
        self.0
    }

    /// Joint angles converted to radians.
    pub fn to_radians(&self) -> [f64; 6] {
        self.0.map(f64::to_radians)
    }

    pub fn is_similar(&self, other: &Joints, epsilon: f64) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| (a - b).abs() < epsilon)
    }
}

impl Index<usize> for Joints {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl Add for Joints {
    type Output = Joints;

    fn add(self, rhs: Joints) -> Joints {
        let mut out = self.0;
        for (value, delta) in out.iter_mut().zip(rhs.0) {
            *value += delta;
        }
        Self(out)
    }
}

impl fmt::Display for Joints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| round_to(*v, 3).to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
