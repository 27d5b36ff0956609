//! Euler angle rotation type
//!
//! Three angles in radians plus a rotation order. The order determines
//! which axis each angle applies to and in what sequence, so it is part of
//! the value: equality includes it and every conversion requires it.
//! Angles are unconstrained reals; nothing wraps them into a canonical
//! range.
//!
//! Conversions from quaternions route through the rotation matrix, so one
//! decomposition algorithm serves both entry points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseOrderError;
use crate::{Mat4, Quaternion, Vec3};

/// Beyond this magnitude of the asin operand the decomposition is inside
/// gimbal lock and the fallback branch runs.
const GIMBAL_LOCK_THRESHOLD: f32 = 0.999_999_9;

/// The six axis orders an Euler triple can apply its rotations in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EulerOrder {
    #[default]
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    Yxz,
    Zyx,
}

impl fmt::Display for EulerOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EulerOrder::Xyz => "XYZ",
            EulerOrder::Yzx => "YZX",
            EulerOrder::Zxy => "ZXY",
            EulerOrder::Xzy => "XZY",
            EulerOrder::Yxz => "YXZ",
            EulerOrder::Zyx => "ZYX",
        };
        f.write_str(s)
    }
}

impl FromStr for EulerOrder {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XYZ" => Ok(EulerOrder::Xyz),
            "YZX" => Ok(EulerOrder::Yzx),
            "ZXY" => Ok(EulerOrder::Zxy),
            "XZY" => Ok(EulerOrder::Xzy),
            "YXZ" => Ok(EulerOrder::Yxz),
            "ZYX" => Ok(EulerOrder::Zyx),
            other => Err(ParseOrderError(other.to_string())),
        }
    }
}

type ChangeCallback = Box<dyn FnMut()>;

/// Euler angles (radians) with an explicit rotation order
#[derive(Serialize, Deserialize)]
pub struct Euler {
    x: f32,
    y: f32,
    z: f32,
    order: EulerOrder,
    #[serde(skip)]
    change_callback: Option<ChangeCallback>,
}

impl Euler {
    /// Create a new Euler triple
    pub fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self {
            x,
            y,
            z,
            order,
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
    pub fn order(&self) -> EulerOrder {
        self.order
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

    pub fn set_order(&mut self, order: EulerOrder) -> &mut Self {
        self.order = order;
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

    /// Set all three angles and the order
    pub fn set(&mut self, x: f32, y: f32, z: f32, order: EulerOrder) -> &mut Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.order = order;
        self.notify();
        self
    }

    /// Copy another Euler triple (the callback slot is left untouched)
    pub fn copy(&mut self, e: &Euler) -> &mut Self {
        self.x = e.x;
        self.y = e.y;
        self.z = e.z;
        self.order = e.order;
        self.notify();
        self
    }

    /// Extract angles from a rotation matrix whose upper-left 3x3 block is
    /// a pure (unscaled) rotation. `None` keeps the current order.
    ///
    /// Each order reads one matrix element through a clamped asin and the
    /// other two angles from atan2 pairs. When the asin operand saturates
    /// the decomposition is under-determined (gimbal lock): one angle is
    /// recovered from an alternate atan2 pair and the third is pinned to
    /// zero.
    pub fn set_from_rotation_matrix(&mut self, m: &Mat4, order: Option<EulerOrder>) -> &mut Self {
        let order = order.unwrap_or(self.order);
        self.decompose_matrix(m, order);
        self.notify();
        self
    }

    /// Extract angles from a unit quaternion, via the matrix form.
    /// `None` keeps the current order.
    pub fn set_from_quaternion(&mut self, q: &Quaternion, order: Option<EulerOrder>) -> &mut Self {
        let m = Mat4::from_quaternion(q);
        self.set_from_rotation_matrix(&m, order)
    }

    /// Reinterpret a vector's components directly as angles (no
    /// conversion). `None` keeps the current order.
    pub fn set_from_vector3(&mut self, v: &Vec3, order: Option<EulerOrder>) -> &mut Self {
        let order = order.unwrap_or(self.order);
        self.set(v.x, v.y, v.z, order)
    }

    /// Re-express the same rotation in a different order.
    ///
    /// Lossy by round-tripping through a quaternion: any extra revolutions
    /// are discarded (370 degrees comes back as 10), and angles inside
    /// gimbal lock may redistribute. The rotation itself is preserved.
    pub fn reorder(&mut self, new_order: EulerOrder) -> &mut Self {
        let mut q = Quaternion::default();
        q.set_from_euler(self);
        self.set_from_quaternion(&q, Some(new_order))
    }

    /// Copy the angles into a vector, dropping the order
    pub fn to_vector3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Angles from an array in (x, y, z) order, with an explicit order tag
    pub fn from_array(a: [f32; 3], order: EulerOrder) -> Self {
        Self::new(a[0], a[1], a[2], order)
    }

    /// Angles as an array in (x, y, z) order; the order tag travels
    /// separately via [`Euler::order`]
    pub fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Matrix decomposition table. Writes angles and order without firing
    /// the change callback; public entry points notify once at the
    /// boundary.
    fn decompose_matrix(&mut self, m: &Mat4, order: EulerOrder) {
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

        match order {
            EulerOrder::Xyz => {
                self.y = m13.clamp(-1.0, 1.0).asin();

                if m13.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = (-m23).atan2(m33);
                    self.z = (-m12).atan2(m11);
                } else {
                    self.x = m32.atan2(m22);
                    self.z = 0.0;
                }
            }
            EulerOrder::Yxz => {
                self.x = (-m23.clamp(-1.0, 1.0)).asin();

                if m23.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.y = m13.atan2(m33);
                    self.z = m21.atan2(m22);
                } else {
                    self.y = (-m31).atan2(m11);
                    self.z = 0.0;
                }
            }
            EulerOrder::Zxy => {
                self.x = m32.clamp(-1.0, 1.0).asin();

                if m32.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.y = (-m31).atan2(m33);
                    self.z = (-m12).atan2(m22);
                } else {
                    self.y = 0.0;
                    self.z = m21.atan2(m11);
                }
            }
            EulerOrder::Zyx => {
                self.y = (-m31.clamp(-1.0, 1.0)).asin();

                if m31.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = m32.atan2(m33);
                    self.z = m21.atan2(m11);
                } else {
                    self.x = 0.0;
                    self.z = (-m12).atan2(m22);
                }
            }
            EulerOrder::Yzx => {
                self.z = m21.clamp(-1.0, 1.0).asin();

                if m21.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = (-m23).atan2(m22);
                    self.y = (-m31).atan2(m11);
                } else {
                    self.x = 0.0;
                    self.y = m13.atan2(m33);
                }
            }
            EulerOrder::Xzy => {
                self.z = (-m12.clamp(-1.0, 1.0)).asin();

                if m12.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = m32.atan2(m22);
                    self.y = m13.atan2(m11);
                } else {
                    self.x = (-m23).atan2(m33);
                    self.y = 0.0;
                }
            }
        }

        self.order = order;
    }
}

impl Default for Euler {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, EulerOrder::default())
    }
}

impl Clone for Euler {
    /// Clones angles and order only; the callback slot stays with the
    /// original.
    fn clone(&self) -> Self {
        Self::new(self.x, self.y, self.z, self.order)
    }
}

impl PartialEq for Euler {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z && self.order == other.order
    }
}

impl fmt::Debug for Euler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Euler")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("z", &self.z)
            .field("order", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::f32::consts::PI;
    use std::rc::Rc;

    const EPSILON: f32 = 0.0001;

    const ALL_ORDERS: [EulerOrder; 6] = [
        EulerOrder::Xyz,
        EulerOrder::Yzx,
        EulerOrder::Zxy,
        EulerOrder::Xzy,
        EulerOrder::Yxz,
        EulerOrder::Zyx,
    ];

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn quat_of(e: &Euler) -> Quaternion {
        let mut q = Quaternion::default();
        q.set_from_euler(e);
        q
    }

    /// Same rotation iff the quaternions agree up to sign.
    fn same_rotation(a: &Euler, b: &Euler) -> bool {
        quat_of(a).dot(&quat_of(b)).abs() > 1.0 - EPSILON
    }

    #[test]
    fn test_order_parse_round_trip() {
        for order in ALL_ORDERS {
            assert_eq!(order.to_string().parse::<EulerOrder>().unwrap(), order);
        }
    }

    #[test]
    fn test_order_parse_rejects() {
        let err = "XXY".parse::<EulerOrder>().unwrap_err();
        assert_eq!(err, ParseOrderError("XXY".to_string()));
        assert!("xyz".parse::<EulerOrder>().is_err());
    }

    #[test]
    fn test_matrix_round_trip_all_orders() {
        // Euler -> quaternion -> matrix -> Euler (same order) must come
        // back as the same rotation, though not necessarily the same
        // angles.
        let angles = [
            (0.3, -0.8, 1.2),
            (-1.0, 0.4, 0.0),
            (2.5, -2.5, 0.9),
            (0.0, 0.0, 0.0),
        ];

        for order in ALL_ORDERS {
            for (x, y, z) in angles {
                let source = Euler::new(x, y, z, order);
                let m = Mat4::from_quaternion(&quat_of(&source));

                let mut back = Euler::default();
                back.set_from_rotation_matrix(&m, Some(order));

                assert!(
                    same_rotation(&source, &back),
                    "order {:?}, angles ({}, {}, {})",
                    order,
                    x,
                    y,
                    z
                );
            }
        }
    }

    #[test]
    fn test_quaternion_round_trip_all_orders() {
        for order in ALL_ORDERS {
            let source = Euler::new(0.7, -0.2, 1.9, order);
            let q = quat_of(&source);

            let mut back = Euler::default();
            back.set_from_quaternion(&q, Some(order));

            assert!(same_rotation(&source, &back), "order {:?}", order);
        }
    }

    #[test]
    fn test_gimbal_lock_pins_third_angle() {
        // +90 degrees about Y is gimbal lock for XYZ: m13 saturates and
        // the fallback must run without panicking, pinning z to zero.
        let source = Euler::new(0.0, PI / 2.0, 0.0, EulerOrder::Xyz);
        let m = Mat4::from_quaternion(&quat_of(&source));

        let mut locked = Euler::default();
        locked.set_from_rotation_matrix(&m, Some(EulerOrder::Xyz));

        assert_eq!(locked.z(), 0.0);
        assert!(same_rotation(&source, &locked));
    }

    #[test]
    fn test_gimbal_lock_all_orders() {
        // A quarter turn about each order's middle axis saturates its asin
        // operand; the decomposition must still reproduce the rotation.
        let lock_angles = |order: EulerOrder| match order {
            EulerOrder::Xyz => (0.3, PI / 2.0, 0.1),
            EulerOrder::Yzx => (0.1, 0.3, PI / 2.0),
            EulerOrder::Zxy => (PI / 2.0, 0.3, 0.1),
            EulerOrder::Xzy => (0.3, 0.1, PI / 2.0),
            EulerOrder::Yxz => (PI / 2.0, 0.3, 0.1),
            EulerOrder::Zyx => (0.3, PI / 2.0, 0.1),
        };

        for order in ALL_ORDERS {
            let (x, y, z) = lock_angles(order);
            let source = Euler::new(x, y, z, order);
            let m = Mat4::from_quaternion(&quat_of(&source));

            let mut locked = Euler::default();
            locked.set_from_rotation_matrix(&m, Some(order));
            assert!(same_rotation(&source, &locked), "order {:?}", order);
        }
    }

    #[test]
    fn test_reorder_preserves_rotation() {
        let mut e = Euler::new(0.9, -0.4, 1.3, EulerOrder::Xyz);
        let original = e.clone();

        e.reorder(EulerOrder::Zyx);
        assert_eq!(e.order(), EulerOrder::Zyx);
        assert!(same_rotation(&original, &e));
    }

    #[test]
    fn test_reorder_discards_revolutions() {
        // 370 degrees is indistinguishable from 10 after the quaternion
        // round trip.
        let extra = Euler::new(370.0_f32.to_radians(), 0.0, 0.0, EulerOrder::Xyz);
        let plain = Euler::new(10.0_f32.to_radians(), 0.0, 0.0, EulerOrder::Xyz);

        let mut reordered = extra.clone();
        reordered.reorder(EulerOrder::Xyz);
        assert!(approx_eq(reordered.x(), plain.x()));
    }

    #[test]
    fn test_vector3_round_trip() {
        let mut e = Euler::default();
        e.set_from_vector3(&Vec3::new(0.1, 0.2, 0.3), Some(EulerOrder::Zxy));

        assert_eq!(e.order(), EulerOrder::Zxy);
        assert_eq!(e.to_vector3(), Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_equality_includes_order() {
        let a = Euler::new(0.1, 0.2, 0.3, EulerOrder::Xyz);
        let b = Euler::new(0.1, 0.2, 0.3, EulerOrder::Zyx);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_change_callback_fires() {
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);

        let mut e = Euler::default();
        e.on_change(move || seen.set(seen.get() + 1));

        e.set(0.1, 0.2, 0.3, EulerOrder::Zxy);
        assert_eq!(count.get(), 1);

        // Conversions notify exactly once at the public boundary.
        e.set_from_quaternion(&Quaternion::default(), None);
        assert_eq!(count.get(), 2);

        e.set_order(EulerOrder::Xyz);
        assert_eq!(count.get(), 3);
    }
}
