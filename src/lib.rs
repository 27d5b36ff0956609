//! Rotation and keyframe-interpolation math for real-time 3D
//!
//! This crate provides the rotation representations a renderer or
//! animation system blends and composes every frame, plus the keyframe
//! sampling engine that drives them from time-series data.
//!
//! ## Rotation Types
//!
//! - [`Quaternion`] - 4-component rotation, slerp, axis-angle and matrix
//!   conversions
//! - [`Euler`] - 3 angles plus a rotation order ([`EulerOrder`])
//! - [`Mat4`] - column-major 4x4 rotation matrix, the shared conversion
//!   primitive
//! - [`Vec3`] - minimal 3-vector collaborator
//!
//! Euler/Quaternion conversions route through the matrix form so the
//! trigonometric derivation exists once. Batch helpers [`slerp_flat`] and
//! [`multiply_quaternions_flat`] operate on packed flat buffers without
//! allocating.
//!
//! ## Keyframe Sampling
//!
//! - [`Interpolant`] - cached-interval evaluator over a flat sample table
//! - [`DiscreteInterpolant`], [`LinearInterpolant`], [`CubicInterpolant`] -
//!   the step, linear, and Hermite strategies, with [`Ending`] controlling
//!   cubic boundary behavior

mod cubic;
mod euler;
mod interpolant;
mod mat4;
mod quaternion;
mod vec3;

pub mod error;

pub use cubic::{Cubic, CubicInterpolant, Ending};
pub use euler::{Euler, EulerOrder};
pub use interpolant::{
    Discrete, DiscreteInterpolant, Interpolant, InterpolationKernel, Linear, LinearInterpolant,
};
pub use mat4::Mat4;
pub use quaternion::{multiply_quaternions_flat, slerp_flat, Quaternion};
pub use vec3::Vec3;
