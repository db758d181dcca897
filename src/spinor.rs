//! Two-component radial functions sampled on a lattice.
use std::cmp::max;
use std::ops::{AddAssign, MulAssign, SubAssign};
use super::lattice::Lattice;
use super::utils::weighted_dot;

/// Upper (`f`) and lower (`g`) radial components of a Dirac spinor together
/// with their radial derivatives.  All four arrays have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spinor {
    pub kappa: i32,
    pub f: Vec<f64>,
    pub g: Vec<f64>,
    pub dfdr: Vec<f64>,
    pub dgdr: Vec<f64>,
}

impl Spinor {
    /// Zero function of the given size.
    pub fn new(kappa: i32, size: usize) -> Self {
        Self {
            kappa,
            f: vec![0.0; size],
            g: vec![0.0; size],
            dfdr: vec![0.0; size],
            dgdr: vec![0.0; size],
        }
    }

    /// Build from components, computing the derivatives on the lattice.
    pub fn from_components(
        kappa: i32,
        f: Vec<f64>,
        g: Vec<f64>,
        lattice: &Lattice,
    ) -> Self {
        assert_eq!(f.len(), g.len(), "components must have equal lengths");
        let mut s = Self {
            kappa,
            dfdr: Vec::default(),
            dgdr: Vec::default(),
            f,
            g,
        };
        s.update_derivatives(lattice);
        s
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.f.len()
    }

    /// Zero-pads or truncates all components.
    pub fn resize(&mut self, size: usize) {
        self.f.resize(size, 0.0);
        self.g.resize(size, 0.0);
        self.dfdr.resize(size, 0.0);
        self.dgdr.resize(size, 0.0);
    }

    /// Recompute `dfdr` and `dgdr` from `f` and `g`.
    pub fn update_derivatives(&mut self, lattice: &Lattice) {
        self.dfdr = lattice.derivative(&self.f);
        self.dgdr = lattice.derivative(&self.g);
    }

    /// `∫ (f₁ f₂ + g₁ g₂) dr`
    pub fn overlap(&self, other: &Spinor, lattice: &Lattice) -> f64 {
        let dr = lattice.dr();
        weighted_dot(&self.f, &other.f, dr) + weighted_dot(&self.g, &other.g, dr)
    }

    fn zip_with<F: Fn(&mut f64, f64)>(&mut self, other: &Spinor, op: F) {
        let n = max(self.size(), other.size());
        self.resize(n);
        let pairs = self.f.iter_mut().zip(&other.f)
            .chain(self.g.iter_mut().zip(&other.g))
            .chain(self.dfdr.iter_mut().zip(&other.dfdr))
            .chain(self.dgdr.iter_mut().zip(&other.dgdr));
        for (x, &y) in pairs {
            op(x, y);
        }
    }
}

impl<'a> AddAssign<&'a Spinor> for Spinor {
    fn add_assign(&mut self, other: &'a Spinor) {
        self.zip_with(other, |x, y| *x += y);
    }
}

impl<'a> SubAssign<&'a Spinor> for Spinor {
    fn sub_assign(&mut self, other: &'a Spinor) {
        self.zip_with(other, |x, y| *x -= y);
    }
}

impl MulAssign<f64> for Spinor {
    fn mul_assign(&mut self, scale: f64) {
        for x in self.f.iter_mut()
            .chain(self.g.iter_mut())
            .chain(self.dfdr.iter_mut())
            .chain(self.dgdr.iter_mut())
        {
            *x *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_grows() {
        let mut a = Spinor::new(-1, 2);
        let mut b = Spinor::new(-1, 3);
        b.f = vec![1.0, 2.0, 3.0];
        a += &b;
        assert_eq!(a.f, vec![1.0, 2.0, 3.0]);
        a -= &b;
        a *= 2.0;
        assert_eq!(a.f, vec![0.0; 3]);
        assert_eq!(a.size(), 3);
    }
}
