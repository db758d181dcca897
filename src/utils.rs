use conv::ValueInto;

/// Shorthand for casting numbers.  Panics if out of range.
pub fn cast<T: ValueInto<U>, U>(x: T) -> U {
    x.value_into().expect("integer conversion failure")
}

/// Absolute and relative tolerances for comparing floating-point numbers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Toler {
    pub relerr: f64,
    pub abserr: f64,
}

/// `{ relerr: 1e-8, abserr: 1e-8 }`
impl Default for Toler {
    fn default() -> Self {
        Self {
            relerr: 1e-8,
            abserr: 1e-8,
        }
    }
}

impl Toler {
    /// Whether `|x − y| ≤ abserr + relerr × max(|x|, |y|)`.
    pub fn is_eq(&self, x: f64, y: f64) -> bool {
        (x - y).abs() <= self.abserr + self.relerr * x.abs().max(y.abs())
    }
}

/// Lattice quadrature `∑[i] x[i] y[i] dR[i]` over the common extent.
#[inline]
pub fn weighted_dot(x: &[f64], y: &[f64], dr: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .zip(dr)
        .map(|((x, y), dr)| x * y * dr)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toler() {
        let toler = Toler { relerr: 1e-3, abserr: 0.0 };
        assert!(toler.is_eq(1000.0, 1000.5));
        assert!(!toler.is_eq(1000.0, 1002.0));
        assert!(Toler { relerr: 0.0, abserr: 1e-12 }.is_eq(0.0, 1e-13));
    }

    #[test]
    fn test_weighted_dot_truncates() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 1.0];
        let dr = [0.5, 0.5, 0.5];
        assert_eq!(weighted_dot(&x, &y, &dr), 1.5);
    }
}
