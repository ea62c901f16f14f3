//! Math types shared across starforge
//!
//! Small vector and transform types plus the fixed axis-convention change
//! between the authoring tool and the game client. The client expects
//! `(x, y, z) -> (-x, z, -y)`; the declared inverse is
//! `(x, y, z) -> (-x, -z, y)`, and the pair composes to the identity.

use serde::{Deserialize, Serialize};

/// 2D vector (UV coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Flip the vertical component (v -> 1 - v)
    pub fn flipped_v(self) -> Self {
        Self {
            x: self.x,
            y: 1.0 - self.y,
        }
    }
}

/// 3D vector (position, normal, delta)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Re-express an authoring-space vector in game axes: `(-x, z, -y)`
    pub fn to_game_axes(self) -> Self {
        Self {
            x: -self.x,
            y: self.z,
            z: -self.y,
        }
    }

    /// Inverse of [`Vec3::to_game_axes`]: `(-x, -z, y)`
    pub fn from_game_axes(self) -> Self {
        Self {
            x: -self.x,
            y: -self.z,
            z: self.y,
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Div<f32> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Change-of-basis matrix for [`Vec3::to_game_axes`]
const AXIS_MAP: [[f32; 3]; 3] = [[-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]];

/// Inverse change-of-basis matrix ([`Vec3::from_game_axes`])
const AXIS_MAP_INV: [[f32; 3]; 3] = [[-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];

fn mat3_mul(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Affine 3x4 transform (rotation/scale basis + translation), row-major.
///
/// Used for object world transforms and door hardpoints. Rows are
/// `[basis_x basis_y basis_z translation]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rows: [[f32; 4]; 3],
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, t.x],
                [0.0, 1.0, 0.0, t.y],
                [0.0, 0.0, 1.0, t.z],
            ],
        }
    }

    /// Get translation component
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.rows[0][3], self.rows[1][3], self.rows[2][3])
    }

    /// Transform a point (applies basis and translation)
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * p.x + r[0][1] * p.y + r[0][2] * p.z + r[0][3],
            r[1][0] * p.x + r[1][1] * p.y + r[1][2] * p.z + r[1][3],
            r[2][0] * p.x + r[2][1] * p.y + r[2][2] * p.z + r[2][3],
        )
    }

    /// Re-express the whole transform in game axes.
    ///
    /// The basis is conjugated (`C * B * C^-1`) so the transform keeps
    /// mapping local points to world points after both spaces change axes;
    /// the translation is mapped directly.
    pub fn to_game_axes(&self) -> Self {
        let basis = [
            [self.rows[0][0], self.rows[0][1], self.rows[0][2]],
            [self.rows[1][0], self.rows[1][1], self.rows[1][2]],
            [self.rows[2][0], self.rows[2][1], self.rows[2][2]],
        ];
        let converted = mat3_mul(&AXIS_MAP, &mat3_mul(&basis, &AXIS_MAP_INV));
        let t = self.translation().to_game_axes();

        Self {
            rows: [
                [converted[0][0], converted[0][1], converted[0][2], t.x],
                [converted[1][0], converted[1][1], converted[1][2], t.y],
                [converted[2][0], converted[2][1], converted[2][2], t.z],
            ],
        }
    }

    /// Flatten to the 12-float layout consumed by hardpoint chunks
    pub fn to_flat(&self) -> [f32; 12] {
        let r = &self.rows;
        [
            r[0][0], r[0][1], r[0][2], r[0][3], r[1][0], r[1][1], r[1][2], r[1][3], r[2][0],
            r[2][1], r[2][2], r[2][3],
        ]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
