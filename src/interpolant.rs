//! Generic keyframe sampler
//!
//! An [`Interpolant`] evaluates a time-keyed sample table: ascending
//! parameter positions on one side, a flat value buffer (`stride` scalars
//! per sample) on the other. The bracketing interval found by one
//! `evaluate` call is cached for the next, which makes the dominant access
//! pattern (monotonically advancing playback time) a constant-time lookup.
//! A cache miss tries a short linear scan in the direction of travel
//! before giving up and binary-searching the whole table, so scrubbing and
//! loop resets stay `O(log N)` without taxing sequential playback.
//!
//! The interpolation strategy is a type parameter implementing
//! [`InterpolationKernel`]; [`Discrete`], [`Linear`], and the cubic kernel
//! in [`crate::cubic`] are the provided strategies.
//!
//! `evaluate` mutates the cursor and the shared result buffer, so an
//! instance must not be evaluated from two threads at once; `&mut self`
//! makes that a compile error. Concurrent consumers each take their own
//! Interpolant (the sample data can be cloned or rebuilt from shared
//! sources).

use log::warn;

use crate::error::SampleError;

/// Linear steps attempted from the cached interval before falling back to
/// binary search.
const MAX_SCAN_STEPS: usize = 3;

/// Interpolation strategy plugged into an [`Interpolant`].
///
/// `interval_changed` runs only when the bracketing interval moves, so
/// kernels can cache interval-dependent coefficients; `interpolate` runs
/// on every in-range evaluation and fills `result` (length `stride`).
/// `i1` is the right edge of the bracketing interval: the samples involved
/// are `i1 - 1` and `i1`, with parameter positions `t0` and `t1`.
pub trait InterpolationKernel {
    fn interval_changed(&mut self, _positions: &[f32], _stride: usize, _i1: usize, _t0: f32, _t1: f32) {
    }

    #[allow(clippy::too_many_arguments)]
    fn interpolate(
        &self,
        values: &[f32],
        stride: usize,
        result: &mut [f32],
        i1: usize,
        t0: f32,
        t: f32,
        t1: f32,
    );
}

/// Where the parameter landed relative to the sample range.
enum Bracket {
    /// Before the first sample; clamp to it.
    Before,
    /// At or after the last sample; clamp to it.
    After,
    /// Inside the table: positions[i1 - 1] <= t < positions[i1].
    Interval { i1: usize, changed: bool },
}

/// Cached-interval evaluator over a keyframe sample table
#[derive(Debug, Clone)]
pub struct Interpolant<K: InterpolationKernel> {
    positions: Vec<f32>,
    values: Vec<f32>,
    stride: usize,
    result: Vec<f32>,
    cached_index: usize,
    kernel: K,
}

impl<K: InterpolationKernel> Interpolant<K> {
    /// Build an interpolant from a sample table and a kernel.
    ///
    /// `positions` must be ascending; `values` holds `stride` scalars per
    /// sample, row-major by sample index. A length mismatch between the
    /// two is survivable bad data: the table is truncated to complete
    /// samples with a warning rather than aborting the frame.
    ///
    /// # Panics
    /// If `stride` is zero (a contract error, not data).
    pub fn with_kernel(
        mut positions: Vec<f32>,
        mut values: Vec<f32>,
        stride: usize,
        kernel: K,
    ) -> Self {
        assert!(stride > 0, "sample stride must be at least 1");

        if values.len() != positions.len() * stride {
            warn!(
                "keyframe table mismatch: {} positions vs {} values at stride {}, truncating",
                positions.len(),
                values.len(),
                stride
            );
            let n = positions.len().min(values.len() / stride);
            positions.truncate(n);
            values.truncate(n * stride);
        }

        Self {
            positions,
            values,
            stride,
            result: vec![0.0; stride],
            cached_index: 0,
            kernel,
        }
    }

    /// Number of samples in the table
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.positions.len()
    }

    /// Scalar components per sample
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Ascending sample times
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat sample values, `stride` scalars per sample
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sample the table at parameter `t`.
    ///
    /// Outside the sample range the first/last sample is returned
    /// unmodified (boundary extrapolation beyond clamping is a kernel
    /// concern, notably the cubic endings). The returned slice aliases an
    /// internal scratch buffer and is only valid until the next call;
    /// copy it out to retain it.
    pub fn evaluate(&mut self, t: f32) -> Result<&[f32], SampleError> {
        let len = self.positions.len();
        if len == 0 {
            return Err(SampleError::EmptyTrack);
        }

        match self.locate(t) {
            Bracket::Before => self.copy_sample(0),
            Bracket::After => self.copy_sample(len - 1),
            Bracket::Interval { i1, changed } => {
                let t0 = self.positions[i1 - 1];
                let t1 = self.positions[i1];

                if changed {
                    self.cached_index = i1;
                    self.kernel
                        .interval_changed(&self.positions, self.stride, i1, t0, t1);
                }

                self.kernel
                    .interpolate(&self.values, self.stride, &mut self.result, i1, t0, t, t1);
            }
        }

        Ok(&self.result)
    }

    /// Find the bracketing interval for `t`, preferring the cursor from
    /// the previous call.
    fn locate(&self, t: f32) -> Bracket {
        let p = &self.positions;
        let len = p.len();

        if t < p[0] {
            return Bracket::Before;
        }
        // Negated comparison so a NaN parameter clamps instead of walking
        // into the scan with no bracketing interval.
        if !(t < p[len - 1]) {
            return Bracket::After;
        }

        // Interior from here on: a bracketing interval exists.
        let cached = self.cached_index;
        let mut i1 = cached.clamp(1, len - 1);

        if t >= p[i1 - 1] {
            // Forward scan: playback and fast-forward land a step or two
            // ahead of the cursor.
            for _ in 0..=MAX_SCAN_STEPS {
                if t < p[i1] {
                    return Bracket::Interval {
                        i1,
                        changed: i1 != cached,
                    };
                }
                i1 += 1;
                if i1 >= len {
                    break;
                }
            }
        } else {
            // Backward scan: reverse playback.
            for _ in 0..MAX_SCAN_STEPS {
                if i1 <= 1 {
                    break;
                }
                i1 -= 1;
                // The previous probe established t < p[i1], so only the
                // left edge needs checking.
                if t >= p[i1 - 1] {
                    return Bracket::Interval {
                        i1,
                        changed: i1 != cached,
                    };
                }
            }
        }

        // Far jump: binary search the whole table. partition_point returns
        // the first index whose position exceeds t, which is exactly i1.
        let i1 = p.partition_point(|&x| x <= t).clamp(1, len - 1);
        Bracket::Interval {
            i1,
            changed: i1 != cached,
        }
    }

    fn copy_sample(&mut self, index: usize) {
        let offset = index * self.stride;
        self.result
            .copy_from_slice(&self.values[offset..offset + self.stride]);
    }
}

/// Step-function kernel: the sample at the left edge of the interval wins
/// until the next sample time is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discrete;

impl InterpolationKernel for Discrete {
    fn interpolate(
        &self,
        values: &[f32],
        stride: usize,
        result: &mut [f32],
        i1: usize,
        _t0: f32,
        _t: f32,
        _t1: f32,
    ) {
        let offset = (i1 - 1) * stride;
        result.copy_from_slice(&values[offset..offset + stride]);
    }
}

/// Componentwise linear blend of the two bracketing samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl InterpolationKernel for Linear {
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

        let weight1 = (t - t0) / (t1 - t0);
        let weight0 = 1.0 - weight1;

        for i in 0..stride {
            result[i] = values[offset0 + i] * weight0 + values[offset1 + i] * weight1;
        }
    }
}

/// Step-function keyframe sampler
pub type DiscreteInterpolant = Interpolant<Discrete>;

/// Piecewise-linear keyframe sampler
pub type LinearInterpolant = Interpolant<Linear>;

impl DiscreteInterpolant {
    pub fn new(positions: Vec<f32>, values: Vec<f32>, stride: usize) -> Self {
        Self::with_kernel(positions, values, stride, Discrete)
    }
}

impl LinearInterpolant {
    pub fn new(positions: Vec<f32>, values: Vec<f32>, stride: usize) -> Self {
        Self::with_kernel(positions, values, stride, Linear)
    }
}
