//! Bound handling for the unconstrained solver.
//!
//! Levenberg-Marquardt works on an unbounded parameter vector. Bounded
//! parameters are mapped to an internal coordinate `u` with the MINUIT
//! transforms, so every `u ∈ ℝ` maps back inside `[min, max]`:
//!
//! - two-sided: `x = min + (sin(u) + 1)·(max − min)/2`
//! - lower only: `x = min − 1 + sqrt(u² + 1)`
//! - upper only: `x = max + 1 − sqrt(u² + 1)`
//! - unbounded: `x = u`
//!
//! The derivative `dx/du` is used both to chain the Jacobian and to map the
//! covariance matrix back to external coordinates. It vanishes on a finite
//! bound, so [`Bound::start`] moves starting values off the bound first.

/// How far a starting value on a bound is moved inward: this fraction of
/// the range, or of `max(1, |bound|)` for one-sided bounds.
pub const START_NUDGE: f64 = 1e-3;

/// The bound shape of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Unbounded,
    Lower(f64),
    Upper(f64),
    Both(f64, f64),
}

impl Bound {
    pub fn new(min: f64, max: f64) -> Self {
        match (min.is_finite(), max.is_finite()) {
            (true, true) => Bound::Both(min, max),
            (true, false) => Bound::Lower(min),
            (false, true) => Bound::Upper(max),
            (false, false) => Bound::Unbounded,
        }
    }

    /// Internal starting coordinate for the initial value `x`.
    pub fn start(self, x: f64) -> f64 {
        let x = match self {
            Bound::Unbounded => x,
            Bound::Lower(min) => x.max(min + START_NUDGE * min.abs().max(1.0)),
            Bound::Upper(max) => x.min(max - START_NUDGE * max.abs().max(1.0)),
            Bound::Both(min, max) => {
                let step = START_NUDGE * (max - min);
                x.max(min + step).min(max - step)
            }
        };
        self.to_internal(x)
    }

    /// External value → internal coordinate.
    pub fn to_internal(self, x: f64) -> f64 {
        match self {
            Bound::Unbounded => x,
            Bound::Lower(min) => ((x - min + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            Bound::Upper(max) => ((max - x + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            Bound::Both(min, max) => {
                if max == min {
                    return 0.0;
                }
                (2.0 * (x - min) / (max - min) - 1.0).clamp(-1.0, 1.0).asin()
            }
        }
    }

    /// Internal coordinate → external value (always within bounds).
    pub fn to_external(self, u: f64) -> f64 {
        match self {
            Bound::Unbounded => u,
            Bound::Lower(min) => min - 1.0 + (u * u + 1.0).sqrt(),
            Bound::Upper(max) => max + 1.0 - (u * u + 1.0).sqrt(),
            Bound::Both(min, max) => min + (u.sin() + 1.0) * (max - min) / 2.0,
        }
    }

    /// `dx/du` at internal coordinate `u`.
    pub fn derivative(self, u: f64) -> f64 {
        match self {
            Bound::Unbounded => 1.0,
            Bound::Lower(_) => u / (u * u + 1.0).sqrt(),
            Bound::Upper(_) => -u / (u * u + 1.0).sqrt(),
            Bound::Both(min, max) => u.cos() * (max - min) / 2.0,
        }
    }
}
