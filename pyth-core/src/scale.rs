//! Piecewise-linear mappings from surface coordinates to tree parameters.

use thiserror::Error;

/// Reasons a [`LinearScale`] cannot be built.
#[derive(Debug, Error, PartialEq)]
pub enum ScaleError {
    #[error("scale needs at least two stops, got {0}")]
    TooFewStops(usize),

    #[error("domain has {domain} stops but range has {range}")]
    LengthMismatch { domain: usize, range: usize },

    #[error("domain must be strictly monotonic and finite")]
    NotMonotonic,
}

/// A polylinear scale: `domain[i] -> range[i]`, linear in between.
///
/// Inputs outside the domain are extrapolated from the nearest segment
/// instead of being clamped. The domain may be ascending or descending.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearScale {
    domain: Vec<f64>,
    range: Vec<f64>,
}

impl LinearScale {
    pub fn new(domain: Vec<f64>, range: Vec<f64>) -> Result<Self, ScaleError> {
        if domain.len() != range.len() {
            return Err(ScaleError::LengthMismatch {
                domain: domain.len(),
                range: range.len(),
            });
        }
        if domain.len() < 2 {
            return Err(ScaleError::TooFewStops(domain.len()));
        }
        if domain.iter().any(|d| !d.is_finite()) {
            return Err(ScaleError::NotMonotonic);
        }

        let ascending = domain.windows(2).all(|w| w[0] < w[1]);
        let descending = domain.windows(2).all(|w| w[0] > w[1]);
        if !ascending && !descending {
            return Err(ScaleError::NotMonotonic);
        }

        // Store ascending so segment lookup only has one direction to handle.
        let (domain, range) = if descending {
            (
                domain.into_iter().rev().collect(),
                range.into_iter().rev().collect(),
            )
        } else {
            (domain, range)
        };

        Ok(Self { domain, range })
    }

    /// Maps `x` through the scale.
    pub fn map(&self, x: f64) -> f64 {
        let last = self.domain.len() - 2;
        // First segment whose upper bound is above x, or the final one.
        let i = self.domain[1..=last]
            .iter()
            .position(|&d| x < d)
            .unwrap_or(last);

        let (d0, d1) = (self.domain[i], self.domain[i + 1]);
        let (r0, r1) = (self.range[i], self.range[i + 1]);
        let t = (x - d0) / (d1 - d0);
        r0 + t * (r1 - r0)
    }
}
