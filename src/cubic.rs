//! Cubic Hermite keyframe kernel
//!
//! Interpolates over a 4-point stencil: the two bracketing samples plus
//! one outward neighbor on each side. Tangents are estimated from the
//! neighboring slopes, weighted by the actual parameter intervals
//! (Catmull-Rom-like, but correct for non-uniform keyframe spacing).
//!
//! At the first and last interval one stencil neighbor falls off the
//! table, so a virtual neighbor is synthesized according to the configured
//! [`Ending`]:
//!
//! - `ZeroSlope`: mirror the interval so the boundary tangent is zero.
//! - `WrapAround`: treat the track as cyclic and borrow the interval from
//!   the opposite end.
//! - `ZeroCurvature` (default): collapse the virtual neighbor onto the
//!   adjacent real sample, the natural-spline condition.

use serde::{Deserialize, Serialize};

use crate::interpolant::{Interpolant, InterpolationKernel};

/// Boundary behavior for the cubic stencil at the ends of the track
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ending {
    /// Zero tangent at the boundary
    ZeroSlope,
    /// Borrow the neighbor from the opposite end of the track
    WrapAround,
    /// Zero second derivative at the boundary (natural spline)
    #[default]
    ZeroCurvature,
}

/// Interval-weighted cubic Hermite kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct Cubic {
    ending_start: Ending,
    ending_end: Ending,

    // Stencil coefficients for the cached interval, recomputed only when
    // the bracketing interval changes.
    weight_prev: f32,
    weight_next: f32,
    offset_prev: usize,
    offset_next: usize,
}

impl Cubic {
    pub fn new(ending_start: Ending, ending_end: Ending) -> Self {
        Self {
            ending_start,
            ending_end,
            ..Self::default()
        }
    }
}

impl InterpolationKernel for Cubic {
    fn interval_changed(&mut self, positions: &[f32], stride: usize, i1: usize, t0: f32, t1: f32) {
        let len = positions.len();

        let (i_prev, t_prev) = if i1 >= 2 {
            (i1 - 2, positions[i1 - 2])
        } else {
            match self.ending_start {
                // Mirrored virtual position: the tangent through it is zero.
                Ending::ZeroSlope => (i1, 2.0 * t0 - t1),
                Ending::WrapAround => (len - 2, t0 + positions[len - 2] - positions[len - 1]),
                Ending::ZeroCurvature => (i1, t1),
            }
        };

        let (i_next, t_next) = if i1 + 1 < len {
            (i1 + 1, positions[i1 + 1])
        } else {
            match self.ending_end {
                Ending::ZeroSlope => (i1, 2.0 * t1 - t0),
                Ending::WrapAround => (1, t1 + positions[1] - positions[0]),
                Ending::ZeroCurvature => (i1 - 1, t0),
            }
        };

        let half_dt = (t1 - t0) * 0.5;

        self.weight_prev = half_dt / (t0 - t_prev);
        self.weight_next = half_dt / (t_next - t1);
        self.offset_prev = i_prev * stride;
        self.offset_next = i_next * stride;
    }

    fn interpolate(
        &self,
        values: &[f32],
        stride: usize,
        result: &mut [f32],
        i1: usize,
        t0: f32,
        t: f32,
        t1: f32,
    ) {
        let offset1 = i1 * stride;
        let offset0 = offset1 - stride;
        let offset_p = self.offset_prev;
        let offset_n = self.offset_next;

        let wp = self.weight_prev;
        let wn = self.weight_next;

        let p = (t - t0) / (t1 - t0);
        let pp = p * p;
        let ppp = pp * p;

        // The four Hermite basis polynomials, with the tangent weights
        // folded in.
        let s_p = -wp * ppp + 2.0 * wp * pp - wp * p;
        let s_0 = (1.0 + wp) * ppp + (-1.5 - 2.0 * wp) * pp + (-0.5 + wp) * p + 1.0;
        let s_1 = (-1.0 - wn) * ppp + (1.5 + wn) * pp + 0.5 * p;
        let s_n = wn * ppp - wn * pp;

        for i in 0..stride {
            result[i] = s_p * values[offset_p + i]
                + s_0 * values[offset0 + i]
                + s_1 * values[offset1 + i]
                + s_n * values[offset_n + i];
        }
    }
}

/// Cubic Hermite keyframe sampler
pub type CubicInterpolant = Interpolant<Cubic>;

impl CubicInterpolant {
    /// Natural-spline boundaries (zero curvature at both ends)
    pub fn new(positions: Vec<f32>, values: Vec<f32>, stride: usize) -> Self {
        Self::with_kernel(positions, values, stride, Cubic::default())
    }

    /// Explicit boundary behavior per end
    pub fn with_endings(
        positions: Vec<f32>,
        values: Vec<f32>,
        stride: usize,
        ending_start: Ending,
        ending_end: Ending,
    ) -> Self {
        Self::with_kernel(positions, values, stride, Cubic::new(ending_start, ending_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearInterpolant;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_passes_through_knots() {
        let positions = vec![0.0, 1.0, 3.0, 4.5];
        let values = vec![0.0, 2.0, -1.0, 5.0];
        let mut interp = CubicInterpolant::new(positions.clone(), values.clone(), 1);

        for (t, v) in positions.iter().zip(&values) {
            assert!(
                approx_eq(interp.evaluate(*t).unwrap()[0], *v),
                "knot at t = {}",
                t
            );
        }
    }

    #[test]
    fn test_two_samples_natural_reduces_to_linear() {
        // With a single interval the natural-spline condition forces zero
        // curvature everywhere: a straight line.
        let positions = vec![0.0, 2.0];
        let values = vec![1.0, 5.0];

        let mut cubic = CubicInterpolant::new(positions.clone(), values.clone(), 1);
        let mut linear = LinearInterpolant::new(positions, values, 1);

        for i in 0..=8 {
            let t = i as f32 * 0.25;
            let c = cubic.evaluate(t).unwrap()[0];
            let l = linear.evaluate(t).unwrap()[0];
            assert!(approx_eq(c, l), "t = {}", t);
        }
    }

    #[test]
    fn test_two_samples_zero_slope_is_smoothstep() {
        // Zero tangents at both ends of a single [0,1] -> [0,1] interval
        // produce exactly the smoothstep cubic 3p^2 - 2p^3.
        let mut interp = CubicInterpolant::with_endings(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            1,
            Ending::ZeroSlope,
            Ending::ZeroSlope,
        );

        for i in 0..=8 {
            let p = i as f32 * 0.125;
            let expected = 3.0 * p * p - 2.0 * p * p * p;
            assert!(
                approx_eq(interp.evaluate(p).unwrap()[0], expected),
                "p = {}",
                p
            );
        }
    }

    #[test]
    fn test_wrap_around_is_symmetric() {
        // A symmetric cyclic spike: the curve around the peak must mirror
        // the curve around the wrapped boundary.
        let positions = vec![0.0, 1.0, 2.0];
        let values = vec![0.0, 10.0, 0.0];
        let mut interp = CubicInterpolant::with_endings(
            positions,
            values,
            1,
            Ending::WrapAround,
            Ending::WrapAround,
        );

        let rising = interp.evaluate(0.5).unwrap()[0];
        let falling = interp.evaluate(1.5).unwrap()[0];
        assert!(approx_eq(rising, falling));
        assert!(approx_eq(rising, 5.0));
    }

    #[test]
    fn test_stride_components_independent() {
        // Two channels: one constant, one moving. The constant channel
        // must not pick up anything from its neighbor.
        let positions = vec![0.0, 1.0, 2.0, 3.0];
        let values = vec![
            0.0, 7.0, //
            1.0, 7.0, //
            4.0, 7.0, //
            9.0, 7.0,
        ];
        let mut interp = CubicInterpolant::new(positions, values, 2);

        for i in 0..=12 {
            let t = i as f32 * 0.25;
            let out = interp.evaluate(t).unwrap();
            assert!(approx_eq(out[1], 7.0), "t = {}", t);
        }
    }

    #[test]
    fn test_cursor_matches_fresh_lookups() {
        let positions: Vec<f32> = (0..16).map(|i| i as f32 * 0.5).collect();
        let values: Vec<f32> = (0..16).map(|i| ((i % 5) * 3) as f32).collect();

        let queries: Vec<f32> = (0..80)
            .map(|i| i as f32 * 0.1)
            .chain([7.1, 0.3, 5.5, 2.2])
            .collect();

        let mut warm = CubicInterpolant::new(positions.clone(), values.clone(), 1);
        for &t in &queries {
            let expected = {
                let mut cold = CubicInterpolant::new(positions.clone(), values.clone(), 1);
                cold.evaluate(t).unwrap()[0]
            };
            let got = warm.evaluate(t).unwrap()[0];
            assert!(approx_eq(got, expected), "t = {}", t);
        }
    }

    #[test]
    fn test_clamps_outside_range() {
        let mut interp = CubicInterpolant::new(vec![0.0, 1.0, 2.0], vec![1.0, 4.0, 2.0], 1);
        assert!(approx_eq(interp.evaluate(-3.0).unwrap()[0], 1.0));
        assert!(approx_eq(interp.evaluate(10.0).unwrap()[0], 2.0));
    }
}
