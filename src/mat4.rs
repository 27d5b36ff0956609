//! 4x4 rotation matrix
//!
//! A flat 16-element, column-major matrix. Only the upper-left 3x3 block is
//! meaningful to this crate; it is the shared primitive that every
//! Euler/Quaternion conversion routes through, so the trigonometric
//! derivation lives in exactly one place. The rotation block sits at
//! elements {0,1,2, 4,5,6, 8,9,10}:
//!
//! ```text
//! m11 = e[0]   m12 = e[4]   m13 = e[8]
//! m21 = e[1]   m22 = e[5]   m23 = e[9]
//! m31 = e[2]   m32 = e[6]   m33 = e[10]
//! ```

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::{Euler, Quaternion};

/// 4x4 matrix, column-major element order
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    pub elements: [f32; 16],
}

impl Mat4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Element at `(row, col)`, both in `0..4`
    #[inline]
    pub fn element(&self, row: usize, col: usize) -> f32 {
        self.elements[col * 4 + row]
    }

    /// Rotation matrix for a unit quaternion.
    ///
    /// The quaternion is assumed normalized; a non-unit input produces a
    /// scaled matrix.
    pub fn from_quaternion(q: &Quaternion) -> Self {
        let (x, y, z, w) = (q.x(), q.y(), q.z(), q.w());

        let x2 = x + x;
        let y2 = y + y;
        let z2 = z + z;
        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        let mut m = Self::IDENTITY;
        let e = &mut m.elements;

        e[0] = 1.0 - (yy + zz);
        e[1] = xy + wz;
        e[2] = xz - wy;

        e[4] = xy - wz;
        e[5] = 1.0 - (xx + zz);
        e[6] = yz + wx;

        e[8] = xz + wy;
        e[9] = yz - wx;
        e[10] = 1.0 - (xx + yy);

        m
    }

    /// Rotation matrix for an Euler triple.
    ///
    /// Derived through the quaternion closed form so the per-order
    /// trigonometry has a single source of truth.
    pub fn from_euler(e: &Euler) -> Self {
        let mut q = Quaternion::default();
        q.set_from_euler(e);
        Self::from_quaternion(&q)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
