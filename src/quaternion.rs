//! Quaternion rotation type
//!
//! Four components (x, y, z, w) representing a rotation when normalized.
//! The type does not enforce unit length; callers normalize after
//! operations that can drift (accumulated multiplication, slerp edge
//! cases).
//!
//! Methods follow a mutate-and-return-self convention so conversions and
//! compositions chain. Every mutation fires the registered change
//! callback, a single slot consumed by scene-graph code that mirrors
//! rotation state into other representations. Instances are not safe for
//! concurrent mutation; each one belongs to a single logical thread of
//! control.

use std::f32::consts::TAU;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Euler, EulerOrder, Mat4, Vec3};

type ChangeCallback = Box<dyn FnMut()>;

/// Quaternion with x, y, z (vector) and w (scalar) components
#[derive(Serialize, Deserialize)]
pub struct Quaternion {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
    #[serde(skip)]
    change_callback: Option<ChangeCallback>,
}

impl Quaternion {
    /// Create a new quaternion from components
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self {
            x,
            y,
            z,
            w,
            change_callback: None,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.z
    }

    #[inline]
    pub fn w(&self) -> f32 {
        self.w
    }

    pub fn set_x(&mut self, x: f32) -> &mut Self {
        self.x = x;
        self.notify();
        self
    }

    pub fn set_y(&mut self, y: f32) -> &mut Self {
        self.y = y;
        self.notify();
        self
    }

    pub fn set_z(&mut self, z: f32) -> &mut Self {
        self.z = z;
        self.notify();
        self
    }

    pub fn set_w(&mut self, w: f32) -> &mut Self {
        self.w = w;
        self.notify();
        self
    }

    /// Register the change callback. One slot only: a second registration
    /// replaces the first.
    pub fn on_change(&mut self, callback: impl FnMut() + 'static) -> &mut Self {
        self.change_callback = Some(Box::new(callback));
        self
    }

    fn notify(&mut self) {
        if let Some(callback) = self.change_callback.as_mut() {
            callback();
        }
    }

    /// Set all four components
    pub fn set(&mut self, x: f32, y: f32, z: f32, w: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.w = w;
        self.notify();
        self
    }

    /// Copy the components of another quaternion (the callback slot is
    /// left untouched)
    pub fn copy(&mut self, q: &Quaternion) -> &mut Self {
        self.x = q.x;
        self.y = q.y;
        self.z = q.z;
        self.w = q.w;
        self.notify();
        self
    }

    /// Set from an Euler triple using the closed-form half-angle
    /// derivation. Each rotation order combines the half-angle sines and
    /// cosines with its own sign pattern.
    pub fn set_from_euler(&mut self, euler: &Euler) -> &mut Self {
        let c1 = (euler.x() * 0.5).cos();
        let c2 = (euler.y() * 0.5).cos();
        let c3 = (euler.z() * 0.5).cos();
        let s1 = (euler.x() * 0.5).sin();
        let s2 = (euler.y() * 0.5).sin();
        let s3 = (euler.z() * 0.5).sin();

        match euler.order() {
            EulerOrder::Xyz => {
                self.x = s1 * c2 * c3 + c1 * s2 * s3;
                self.y = c1 * s2 * c3 - s1 * c2 * s3;
                self.z = c1 * c2 * s3 + s1 * s2 * c3;
                self.w = c1 * c2 * c3 - s1 * s2 * s3;
            }
            EulerOrder::Yxz => {
                self.x = s1 * c2 * c3 + c1 * s2 * s3;
                self.y = c1 * s2 * c3 - s1 * c2 * s3;
                self.z = c1 * c2 * s3 - s1 * s2 * c3;
                self.w = c1 * c2 * c3 + s1 * s2 * s3;
            }
            EulerOrder::Zxy => {
                self.x = s1 * c2 * c3 - c1 * s2 * s3;
                self.y = c1 * s2 * c3 + s1 * c2 * s3;
                self.z = c1 * c2 * s3 + s1 * s2 * c3;
                self.w = c1 * c2 * c3 - s1 * s2 * s3;
            }
            EulerOrder::Zyx => {
                self.x = s1 * c2 * c3 - c1 * s2 * s3;
                self.y = c1 * s2 * c3 + s1 * c2 * s3;
                self.z = c1 * c2 * s3 - s1 * s2 * c3;
                self.w = c1 * c2 * c3 + s1 * s2 * s3;
            }
            EulerOrder::Yzx => {
                self.x = s1 * c2 * c3 + c1 * s2 * s3;
                self.y = c1 * s2 * c3 + s1 * c2 * s3;
                self.z = c1 * c2 * s3 - s1 * s2 * c3;
                self.w = c1 * c2 * c3 - s1 * s2 * s3;
            }
            EulerOrder::Xzy => {
                self.x = s1 * c2 * c3 - c1 * s2 * s3;
                self.y = c1 * s2 * c3 - s1 * c2 * s3;
                self.z = c1 * c2 * s3 + s1 * s2 * c3;
                self.w = c1 * c2 * c3 + s1 * s2 * s3;
            }
        }

        self.notify();
        self
    }

    /// Set from a rotation axis and angle. The axis must be normalized.
    pub fn set_from_axis_angle(&mut self, axis: &Vec3, angle: f32) -> &mut Self {
        let half = angle * 0.5;
        let s = half.sin();

        self.x = axis.x * s;
        self.y = axis.y * s;
        self.z = axis.z * s;
        self.w = half.cos();

        self.notify();
        self
    }

    /// Set from a rotation matrix whose upper-left 3x3 block is a pure
    /// (unscaled) rotation.
    ///
    /// Trace-based branch selection: when the trace is non-positive, the
    /// largest diagonal element picks the branch so the divisor stays away
    /// from zero.
    pub fn set_from_rotation_matrix(&mut self, m: &Mat4) -> &mut Self {
        let te = &m.elements;

        let m11 = te[0];
        let m12 = te[4];
        let m13 = te[8];
        let m21 = te[1];
        let m22 = te[5];
        let m23 = te[9];
        let m31 = te[2];
        let m32 = te[6];
        let m33 = te[10];

        let trace = m11 + m22 + m33;

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();

            self.w = 0.25 / s;
            self.x = (m32 - m23) * s;
            self.y = (m13 - m31) * s;
            self.z = (m21 - m12) * s;
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();

            self.w = (m32 - m23) / s;
            self.x = 0.25 * s;
            self.y = (m12 + m21) / s;
            self.z = (m13 + m31) / s;
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();

            self.w = (m13 - m31) / s;
            self.x = (m12 + m21) / s;
            self.y = 0.25 * s;
            self.z = (m23 + m32) / s;
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();

            self.w = (m21 - m12) / s;
            self.x = (m13 + m31) / s;
            self.y = (m23 + m32) / s;
            self.z = 0.25 * s;
        }

        self.notify();
        self
    }

    /// Set to the rotation taking unit vector `from` to unit vector `to`.
    ///
    /// Near-antiparallel inputs would produce a degenerate cross product,
    /// so that case falls back to a perpendicular axis chosen by the
    /// larger of |from.x| and |from.z|.
    pub fn set_from_unit_vectors(&mut self, from: &Vec3, to: &Vec3) -> &mut Self {
        let r = from.dot(*to) + 1.0;

        if r < f32::EPSILON {
            if from.x.abs() > from.z.abs() {
                self.x = -from.y;
                self.y = from.x;
                self.z = 0.0;
                self.w = 0.0;
            } else {
                self.x = 0.0;
                self.y = -from.z;
                self.z = from.y;
                self.w = 0.0;
            }
        } else {
            let c = from.cross(*to);
            self.x = c.x;
            self.y = c.y;
            self.z = c.z;
            self.w = r;
        }

        self.normalize()
    }

    /// Angle to another quaternion, in radians. The absolute value of the
    /// dot product makes q and -q (the same rotation) give the same angle.
    pub fn angle_to(&self, q: &Quaternion) -> f32 {
        2.0 * self.dot(q).abs().clamp(-1.0, 1.0).acos()
    }

    /// Rotate toward `q` by at most `step` radians
    pub fn rotate_towards(&mut self, q: &Quaternion, step: f32) -> &mut Self {
        let angle = self.angle_to(q);

        if angle == 0.0 {
            return self;
        }

        let t = (step / angle).min(1.0);
        self.slerp(q, t)
    }

    /// Reset to the identity rotation (0, 0, 0, 1)
    pub fn identity(&mut self) -> &mut Self {
        self.set(0.0, 0.0, 0.0, 1.0)
    }

    /// Invert the rotation. Assumes unit length, where the conjugate is
    /// the exact inverse.
    pub fn invert(&mut self) -> &mut Self {
        self.conjugate()
    }

    /// Negate the vector part
    pub fn conjugate(&mut self) -> &mut Self {
        self.x = -self.x;
        self.y = -self.y;
        self.z = -self.z;
        self.notify();
        self
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, q: &Quaternion) -> f32 {
        self.x * q.x + self.y * q.y + self.z * q.z + self.w * q.w
    }

    /// Length squared
    #[inline]
    pub fn length_sq(&self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[inline]
    pub fn length(&self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Normalize to unit length. A zero-length quaternion resets to the
    /// identity rather than dividing through to NaN.
    pub fn normalize(&mut self) -> &mut Self {
        let len = self.length();

        if len == 0.0 {
            self.x = 0.0;
            self.y = 0.0;
            self.z = 0.0;
            self.w = 1.0;
        } else {
            let inv = 1.0 / len;
            self.x *= inv;
            self.y *= inv;
            self.z *= inv;
            self.w *= inv;
        }

        self.notify();
        self
    }

    /// Compose: self = self * q (applies q first, then self)
    pub fn multiply(&mut self, q: &Quaternion) -> &mut Self {
        let a = (self.x, self.y, self.z, self.w);
        let b = (q.x, q.y, q.z, q.w);
        self.hamilton_product(a, b)
    }

    /// Compose: self = q * self
    pub fn premultiply(&mut self, q: &Quaternion) -> &mut Self {
        let a = (q.x, q.y, q.z, q.w);
        let b = (self.x, self.y, self.z, self.w);
        self.hamilton_product(a, b)
    }

    /// Set to the Hamilton product a * b
    pub fn multiply_quaternions(&mut self, a: &Quaternion, b: &Quaternion) -> &mut Self {
        let a = (a.x, a.y, a.z, a.w);
        let b = (b.x, b.y, b.z, b.w);
        self.hamilton_product(a, b)
    }

    fn hamilton_product(&mut self, a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> &mut Self {
        let (qax, qay, qaz, qaw) = a;
        let (qbx, qby, qbz, qbw) = b;

        self.x = qax * qbw + qaw * qbx + qay * qbz - qaz * qby;
        self.y = qay * qbw + qaw * qby + qaz * qbx - qax * qbz;
        self.z = qaz * qbw + qaw * qbz + qax * qby - qay * qbx;
        self.w = qaw * qbw - qax * qbx - qay * qby - qaz * qbz;

        self.notify();
        self
    }

    /// Spherical linear interpolation toward `qb` by parameter `t`.
    ///
    /// Takes the shortest arc: when the dot product is negative the target
    /// is negated (q and -q are the same rotation). Nearly parallel inputs
    /// fall back to a linear blend plus renormalization, since the exact
    /// formula would divide by a vanishing sine.
    pub fn slerp(&mut self, qb: &Quaternion, t: f32) -> &mut Self {
        if t == 0.0 {
            return self;
        }
        if t == 1.0 {
            return self.copy(qb);
        }

        let (x, y, z, w) = (self.x, self.y, self.z, self.w);

        let mut cos_half_theta = w * qb.w + x * qb.x + y * qb.y + z * qb.z;

        if cos_half_theta < 0.0 {
            self.w = -qb.w;
            self.x = -qb.x;
            self.y = -qb.y;
            self.z = -qb.z;
            cos_half_theta = -cos_half_theta;
        } else {
            self.x = qb.x;
            self.y = qb.y;
            self.z = qb.z;
            self.w = qb.w;
        }

        if cos_half_theta >= 1.0 {
            self.w = w;
            self.x = x;
            self.y = y;
            self.z = z;
            return self;
        }

        let sqr_sin_half_theta = 1.0 - cos_half_theta * cos_half_theta;

        if sqr_sin_half_theta <= f32::EPSILON {
            let s = 1.0 - t;
            self.w = s * w + t * self.w;
            self.x = s * x + t * self.x;
            self.y = s * y + t * self.y;
            self.z = s * z + t * self.z;
            return self.normalize();
        }

        let sin_half_theta = sqr_sin_half_theta.sqrt();
        let half_theta = sin_half_theta.atan2(cos_half_theta);
        let ratio_a = ((1.0 - t) * half_theta).sin() / sin_half_theta;
        let ratio_b = (t * half_theta).sin() / sin_half_theta;

        self.w = w * ratio_a + self.w * ratio_b;
        self.x = x * ratio_a + self.x * ratio_b;
        self.y = y * ratio_a + self.y * ratio_b;
        self.z = z * ratio_a + self.z * ratio_b;

        self.notify();
        self
    }

    /// Set to the slerp of `qa` and `qb`; neither input is modified
    pub fn slerp_quaternions(&mut self, qa: &Quaternion, qb: &Quaternion, t: f32) -> &mut Self {
        self.copy(qa).slerp(qb, t)
    }

    /// Uniformly distributed random unit quaternion (Shoemake's
    /// subgroup-algorithm construction)
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    /// Uniformly distributed random unit quaternion from a caller-supplied
    /// generator
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let u1: f32 = rng.gen();
        let theta1 = TAU * rng.gen::<f32>();
        let theta2 = TAU * rng.gen::<f32>();

        let r1 = (1.0 - u1).sqrt();
        let r2 = u1.sqrt();

        Self::new(
            r1 * theta1.cos(),
            r2 * theta2.sin(),
            r2 * theta2.cos(),
            r1 * theta1.sin(),
        )
    }

    /// Set components from an array in (x, y, z, w) order
    pub fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// Components as an array in (x, y, z, w) order
    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl Clone for Quaternion {
    /// Clones the components only; the callback slot stays with the
    /// original.
    fn clone(&self) -> Self {
        Self::new(self.x, self.y, self.z, self.w)
    }
}

impl PartialEq for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z && self.w == other.w
    }
}

impl fmt::Debug for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quaternion")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("z", &self.z)
            .field("w", &self.w)
            .finish()
    }
}

impl From<Quaternion> for [f32; 4] {
    fn from(q: Quaternion) -> Self {
        q.to_array()
    }
}

impl From<[f32; 4]> for Quaternion {
    fn from(a: [f32; 4]) -> Self {
        Self::from_array(a)
    }
}

/// Slerp on flat buffers at the given element offsets.
///
/// Numerically identical to [`Quaternion::slerp`], for batches of
/// quaternions packed in one buffer without per-quaternion allocation.
/// Offsets out of range panic via slice indexing.
pub fn slerp_flat(
    dst: &mut [f32],
    dst_offset: usize,
    src0: &[f32],
    src_offset0: usize,
    src1: &[f32],
    src_offset1: usize,
    t: f32,
) {
    let mut x0 = src0[src_offset0];
    let mut y0 = src0[src_offset0 + 1];
    let mut z0 = src0[src_offset0 + 2];
    let mut w0 = src0[src_offset0 + 3];

    let x1 = src1[src_offset1];
    let y1 = src1[src_offset1 + 1];
    let z1 = src1[src_offset1 + 2];
    let w1 = src1[src_offset1 + 3];

    if t == 0.0 {
        dst[dst_offset] = x0;
        dst[dst_offset + 1] = y0;
        dst[dst_offset + 2] = z0;
        dst[dst_offset + 3] = w0;
        return;
    }

    if t == 1.0 {
        dst[dst_offset] = x1;
        dst[dst_offset + 1] = y1;
        dst[dst_offset + 2] = z1;
        dst[dst_offset + 3] = w1;
        return;
    }

    if w0 != w1 || x0 != x1 || y0 != y1 || z0 != z1 {
        let mut s = 1.0 - t;
        let mut t = t;

        let cos = x0 * x1 + y0 * y1 + z0 * z1 + w0 * w1;
        let dir = if cos >= 0.0 { 1.0 } else { -1.0 };
        let sqr_sin = 1.0 - cos * cos;

        if sqr_sin > f32::EPSILON {
            let sin = sqr_sin.sqrt();
            let len = sin.atan2(cos * dir);

            s = (s * len).sin() / sin;
            t = (t * len).sin() / sin;
        }

        let t_dir = t * dir;

        x0 = x0 * s + x1 * t_dir;
        y0 = y0 * s + y1 * t_dir;
        z0 = z0 * s + z1 * t_dir;
        w0 = w0 * s + w1 * t_dir;

        // s stays at 1 - t only when the sine branch was skipped, i.e. a
        // plain lerp ran and the result needs renormalizing.
        if s == 1.0 - t {
            let f = 1.0 / (x0 * x0 + y0 * y0 + z0 * z0 + w0 * w0).sqrt();

            x0 *= f;
            y0 *= f;
            z0 *= f;
            w0 *= f;
        }
    }

    dst[dst_offset] = x0;
    dst[dst_offset + 1] = y0;
    dst[dst_offset + 2] = z0;
    dst[dst_offset + 3] = w0;
}

/// Hamilton product on flat buffers at the given element offsets, writing
/// src0 * src1 into `dst`.
pub fn multiply_quaternions_flat(
    dst: &mut [f32],
    dst_offset: usize,
    src0: &[f32],
    src_offset0: usize,
    src1: &[f32],
    src_offset1: usize,
) {
    let x0 = src0[src_offset0];
    let y0 = src0[src_offset0 + 1];
    let z0 = src0[src_offset0 + 2];
    let w0 = src0[src_offset0 + 3];

    let x1 = src1[src_offset1];
    let y1 = src1[src_offset1 + 1];
    let z1 = src1[src_offset1 + 2];
    let w1 = src1[src_offset1 + 3];

    dst[dst_offset] = x0 * w1 + w0 * x1 + y0 * z1 - z0 * y1;
    dst[dst_offset + 1] = y0 * w1 + w0 * y1 + z0 * x1 - x0 * z1;
    dst[dst_offset + 2] = z0 * w1 + w0 * z1 + x0 * y1 - y0 * x1;
    dst[dst_offset + 3] = w0 * w1 - x0 * x1 - y0 * y1 - z0 * z1;
}
