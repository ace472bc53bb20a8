//! Fixed-size math aggregates that entities store as primitive fields.
//!
//! These are plain data carriers. Each one converts to and from a flat `f32` array in a
//! fixed component order, which is the order the codec writes them in.

use serde::{Deserialize, Serialize};

/// Two component vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn to_array(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    pub const fn from_array(values: [f32; 2]) -> Self {
        Self::new(values[0], values[1])
    }
}

/// Three component vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub const fn from_array(values: [f32; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

/// Four component vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub const fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// Rotation quaternion stored as (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub const fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Column-major 3x3 matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub cols: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        cols: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn from_cols(cols: [[f32; 3]; 3]) -> Self {
        Self { cols }
    }

    pub fn to_array(&self) -> [f32; 9] {
        let mut output = [0.0f32; 9];
        for (column_index, column) in self.cols.iter().enumerate() {
            output[column_index * 3..column_index * 3 + 3].copy_from_slice(column);
        }
        output
    }

    pub fn from_array(values: [f32; 9]) -> Self {
        let mut cols = [[0.0f32; 3]; 3];
        for (column_index, column) in cols.iter_mut().enumerate() {
            column.copy_from_slice(&values[column_index * 3..column_index * 3 + 3]);
        }
        Self { cols }
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Column-major 4x4 matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.cols[3] = [translation.x, translation.y, translation.z, 1.0];
        matrix
    }

    pub fn to_array(&self) -> [f32; 16] {
        let mut output = [0.0f32; 16];
        for (column_index, column) in self.cols.iter().enumerate() {
            output[column_index * 4..column_index * 4 + 4].copy_from_slice(column);
        }
        output
    }

    pub fn from_array(values: [f32; 16]) -> Self {
        let mut cols = [[0.0f32; 4]; 4];
        for (column_index, column) in cols.iter_mut().enumerate() {
            column.copy_from_slice(&values[column_index * 4..column_index * 4 + 4]);
        }
        Self { cols }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Translation, rotation, and scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Number of `f32` components in the flat representation
    pub const COMPONENT_COUNT: usize = 10;

    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Flattens as translation, rotation, scale
    pub const fn to_array(&self) -> [f32; 10] {
        [
            self.translation.x,
            self.translation.y,
            self.translation.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.rotation.w,
            self.scale.x,
            self.scale.y,
            self.scale.z,
        ]
    }

    pub const fn from_array(values: [f32; 10]) -> Self {
        Self {
            translation: Vec3::new(values[0], values[1], values[2]),
            rotation: Quat::new(values[3], values[4], values[5], values[6]),
            scale: Vec3::new(values[7], values[8], values[9]),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
