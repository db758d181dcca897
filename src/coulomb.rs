//! Radial integration of the multipole Coulomb interaction.
//!
//! Integrals are evaluated in two stages: a density `ρ = f_a f_b + g_a g_b`
//! is turned into a multipole potential `y_k(r)`, which is then contracted
//! against any other pair of orbitals.  Keeping the stages separate lets one
//! potential serve every contraction in an outer loop.
use std::cmp::min;
use std::sync::Arc;
use super::lattice::Lattice;
use super::ode::SpinorOperator;
use super::orbital::l_of_kappa;
use super::spinor::Spinor;
use super::utils::weighted_dot;

#[derive(Clone, Debug)]
pub struct CoulombIntegrator {
    lattice: Arc<Lattice>,
}

impl CoulombIntegrator {
    pub fn new(lattice: Arc<Lattice>) -> Self {
        Self { lattice }
    }

    #[inline]
    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    /// `f_a f_b + g_a g_b` over the common extent of `a` and `b`.
    pub fn density(&self, a: &Spinor, b: &Spinor) -> Vec<f64> {
        let n = min(a.size(), b.size());
        (0 .. n).map(|i| a.f[i] * b.f[i] + a.g[i] * b.g[i]).collect()
    }

    /// Multipole potential
    ///
    /// ```text
    /// y_k(r) = ∫ r_<^k / r_>^(k + 1) ρ(r') dr'
    /// ```
    ///
    /// sampled on the first `size` lattice points.  The whole density
    /// contributes, including any part beyond `size`.
    ///
    /// Both partial integrals are accumulated as ratios `r_j / r_i`, which
    /// never exceed one, so high multipoles cannot overflow.
    pub fn potential(&self, density: &[f64], k: i32, size: usize)
                     -> Vec<f64> {
        let n = density.len().max(size);
        assert!(n <= self.lattice.size(), "density extends beyond the lattice");
        let r = &self.lattice.r()[.. n];
        let dr = &self.lattice.dr()[.. n];
        let rho = |i: usize| density.get(i).cloned().unwrap_or(0.0);
        let mut pot = vec![0.0; n];
        if n == 0 {
            return pot;
        }

        // inner part: r^-(k+1) ∫_0^r r'^k ρ dr'
        let mut acc = rho(0) * dr[0] / r[0];
        pot[0] = acc;
        for i in 1 .. n {
            acc = acc * (r[i - 1] / r[i]).powi(k + 1) + rho(i) * dr[i] / r[i];
            pot[i] = acc;
        }

        // outer part: r^k ∫_r^∞ r'^-(k+1) ρ dr'
        let mut acc = 0.0;
        for i in (0 .. n - 1).rev() {
            acc = (r[i] / r[i + 1]).powi(k)
                * (acc + rho(i + 1) * dr[i + 1] / r[i + 1]);
            pot[i] += acc;
        }

        pot.truncate(size);
        pot
    }

    /// `∑ y(r) (f_a f_b + g_a g_b) dR` over the common extent.
    pub fn contract(&self, pot: &[f64], a: &Spinor, b: &Spinor) -> f64 {
        let n = min(pot.len(), min(a.size(), b.size()));
        let dr = self.lattice.dr();
        (0 .. n)
            .map(|i| pot[i] * (a.f[i] * b.f[i] + a.g[i] * b.g[i]) * dr[i])
            .sum()
    }

    /// Slater integral `R_k(ij, lm)` with `i → l` and `j → m`.
    pub fn slater(
        &self,
        k: i32,
        i: &Spinor,
        j: &Spinor,
        l: &Spinor,
        m: &Spinor,
    ) -> f64 {
        let size = min(i.size(), l.size());
        let pot = self.potential(&self.density(j, m), k, size);
        self.contract(&pot, i, l)
    }

    /// `∫ (f_a f_b + g_a g_b) dr`
    pub fn overlap(&self, a: &Spinor, b: &Spinor) -> f64 {
        a.overlap(b, &self.lattice)
    }

    /// `<a|O|b>`, evaluated by applying `O` to `b`.
    pub fn matrix_element<O>(&self, op: &O, a: &Spinor, b: &Spinor) -> f64
        where O: SpinorOperator + ?Sized
    {
        let tb = op.apply_to(b);
        let dr = self.lattice.dr();
        weighted_dot(&a.f, &tb.f, dr) + weighted_dot(&a.g, &tb.g, dr)
    }

    /// Specific-mass-shift integral `<a|p|b>`.
    ///
    /// Nonzero only for `|l_a − l_b| = 1`.  Antisymmetric under `a ↔ b` up
    /// to the accuracy of the numerical derivative of `b`.
    pub fn isotope_shift_integral(&self, a: &Spinor, b: &Spinor) -> f64 {
        let la = l_of_kappa(a.kappa);
        let lb = l_of_kappa(b.kappa);
        let c = if la == lb - 1 {
            -lb
        } else if la == lb + 1 {
            lb + 1
        } else {
            return 0.0;
        };
        let n = min(a.size(), b.size());
        let r = self.lattice.r();
        let dr = self.lattice.dr();
        (0 .. n)
            .map(|i| a.f[i] * (b.dfdr[i] + c as f64 * b.f[i] / r[i]) * dr[i])
            .sum()
    }
}
