//! Radial lattice.
//!
//! Only what the integral engine consumes: the points `r[i]`, the
//! quadrature weights `dR[i] = dr/di`, and a derivative routine.

/// Exponential lattice `r[i] = r_min exp(h i)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    r_min: f64,
    h: f64,
    r: Vec<f64>,
    dr: Vec<f64>,
}

impl Lattice {
    pub fn exponential(num_points: usize, r_min: f64, h: f64) -> Self {
        assert!(r_min > 0.0 && h > 0.0, "lattice parameters must be positive");
        let r: Vec<f64> = (0 .. num_points)
            .map(|i| r_min * (h * i as f64).exp())
            .collect();
        let dr = r.iter().map(|r| r * h).collect();
        Self { r_min, h, r, dr }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.r.len()
    }

    #[inline]
    pub fn r(&self) -> &[f64] {
        &self.r
    }

    /// Quadrature weights.
    #[inline]
    pub fn dr(&self) -> &[f64] {
        &self.dr
    }

    #[inline]
    pub fn r_min(&self) -> f64 {
        self.r_min
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.h
    }

    /// Radial derivative of `f` (sampled on the first `f.len()` points).
    ///
    /// Second-order central differences in the lattice index, one-sided at
    /// the ends, divided by `dR`.
    pub fn derivative(&self, f: &[f64]) -> Vec<f64> {
        let n = f.len();
        assert!(n <= self.size(), "function extends beyond the lattice");
        let mut d = vec![0.0; n];
        if n < 3 {
            if n == 2 {
                let slope = f[1] - f[0];
                d[0] = slope / self.dr[0];
                d[1] = slope / self.dr[1];
            }
            return d;
        }
        d[0] = (-3.0 * f[0] + 4.0 * f[1] - f[2]) / 2.0 / self.dr[0];
        for i in 1 .. n - 1 {
            d[i] = (f[i + 1] - f[i - 1]) / 2.0 / self.dr[i];
        }
        d[n - 1] = (3.0 * f[n - 1] - 4.0 * f[n - 2] + f[n - 3])
            / 2.0 / self.dr[n - 1];
        d
    }
}
