//! Second-order MBPT corrections to valence matrix elements.
//!
//! A single implementation serves both the Brillouin–Wigner ("valence")
//! and the fixed-denominator ("core") variants: they differ only in the
//! [`Denominators`](../denom/trait.Denominators.html) passed in.
//!
//! Energy denominators are regularized as `E_ref − E_intermediate + δ`.
//! Energy differences smaller than δ therefore cannot be resolved.
use std::io;
use serde_yaml;
use super::ang_mom::{k_range, phase, Recoupler};
use super::denom::Denominators;
use super::error::Result;
use super::half::Half;
use super::integrals::{OneBodyIntegrals, TwoBodyIntegrals};
use super::orbital::OrbitalKey;
use super::orbital_manager::OrbitalManager;
use super::parity::Parity;
use super::phys_consts::PhysConsts;
use super::state_index::MAX_MULTIPOLE;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// Denominator regularization (Hartree).
    pub delta: f64,
    /// Intermediate states with a lower principal quantum number are
    /// excluded from Q-space.
    pub q_space_min_pqn: i32,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            delta: 1e-6,
            q_space_min_pqn: 1,
        }
    }
}

impl Conf {
    pub fn from_yaml_reader<R: io::Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn parity_allowed(k: i32, a: OrbitalKey, b: OrbitalKey,
                  c: OrbitalKey, d: OrbitalKey) -> bool {
    let k = Parity::of(k);
    a.parity() + c.parity() == k && b.parity() + d.parity() == k
}

/// Hook called around each iteration of the outermost intermediate-state
/// loop of a diagram.
pub trait Observer {
    fn begin_outer(&self, diagram: &str, alpha: OrbitalKey);

    /// `partial` is the running total of the diagram after this iteration.
    fn end_outer(&self, diagram: &str, alpha: OrbitalKey, partial: f64);
}

/// Emits each iteration at `trace` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn begin_outer(&self, diagram: &str, alpha: OrbitalKey) {
        trace!("{}: begin {}", diagram, alpha);
    }

    fn end_outer(&self, diagram: &str, alpha: OrbitalKey, partial: f64) {
        trace!("{}: end {} partial = {:e}", diagram, alpha, partial);
    }
}

/// Second-order corrections for external valence lines.
///
/// `D` supplies reference energies, `I1` and `I2` the one- and two-body
/// radial integrals and `R` the angular coefficients.
pub struct MbptCalculator<'a, D, I1, I2, R> {
    orbitals: &'a OrbitalManager,
    denominators: D,
    one_body: I1,
    two_body: I2,
    recoupler: R,
    conf: Conf,
    consts: PhysConsts,
    observer: Box<dyn Observer + 'a>,
}

impl<'a, D, I1, I2, R> MbptCalculator<'a, D, I1, I2, R>
    where D: Denominators,
          I1: OneBodyIntegrals,
          I2: TwoBodyIntegrals,
          R: Recoupler,
{
    pub fn new(
        orbitals: &'a OrbitalManager,
        denominators: D,
        one_body: I1,
        two_body: I2,
        recoupler: R,
        conf: Conf,
    ) -> Self {
        Self {
            orbitals,
            denominators,
            one_body,
            two_body,
            recoupler,
            conf,
            consts: Default::default(),
            observer: Box::new(LogObserver),
        }
    }

    pub fn with_observer<T: Observer + 'a>(mut self, observer: T) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_consts(mut self, consts: PhysConsts) -> Self {
        self.consts = consts;
        self
    }

    #[inline]
    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    #[inline]
    pub fn denominators(&self) -> &D {
        &self.denominators
    }

    #[inline]
    pub fn denominators_mut(&mut self) -> &mut D {
        &mut self.denominators
    }

    #[inline]
    pub fn recoupler(&self) -> &R {
        &self.recoupler
    }

    /// Whether `key` may appear as a Q-space intermediate line.
    pub fn in_q_space(&self, key: OrbitalKey) -> bool {
        self.orbitals.high().contains(&key)
            && key.pqn() >= self.conf.q_space_min_pqn
    }

    fn energy(&self, key: OrbitalKey) -> Result<f64> {
        Ok(self.orbitals.get(key)?.energy)
    }

    fn report(&self, diagram: &str, value: f64) {
        debug!("{}: {:.6} cm^-1", diagram, self.consts.to_inv_cm(value));
    }

    /// ```text
    /// ∑[α ∈ Q, κ_α = κ_a] <a|H|α> <α|H|b> / (E_ref(a) − E_α + δ)
    /// ```
    ///
    /// Exactly zero if `a` and `b` have different κ.
    pub fn one_body_correction(&self, a: OrbitalKey, b: OrbitalKey)
                               -> Result<f64> {
        if a.kappa() != b.kappa() {
            return Ok(0.0);
        }
        let e_a = self.denominators.reference_energy(a)?;
        let mut energy = 0.0;
        for &alpha in self.orbitals.high() {
            if !self.in_q_space(alpha) || alpha.kappa() != a.kappa() {
                continue;
            }
            self.observer.begin_outer("one-body", alpha);
            let term = self.one_body.one_body(a, alpha)?
                * self.one_body.one_body(alpha, b)?;
            energy += term / (e_a - self.energy(alpha)? + self.conf.delta);
            self.observer.end_outer("one-body", alpha, energy);
        }
        self.report("one-body", energy);
        Ok(energy)
    }

    /// Two-body valence diagram for the multipole-`k` interaction
    /// `a → c`, `b → d`, summed over excited intermediate pairs `(α, β)`
    /// with at least one line in Q-space.
    ///
    /// Exactly zero if `(j_a j_c k; ½ −½ 0)` or `(j_b j_d k; ½ −½ 0)`
    /// vanishes or if `l_a + l_c + k` or `l_b + l_d + k` is odd.
    pub fn two_body_correction(
        &self,
        k: i32,
        a: OrbitalKey,
        b: OrbitalKey,
        c: OrbitalKey,
        d: OrbitalKey,
    ) -> Result<f64> {
        let r = &self.recoupler;
        let coeff_ac = r.electron_3j(a.j(), c.j(), k);
        let coeff_bd = r.electron_3j(b.j(), d.j(), k);
        if coeff_ac == 0.0 || coeff_bd == 0.0
            || !parity_allowed(k, a, b, c, d)
        {
            return Ok(0.0);
        }
        let e_ab = self.denominators.reference_energy(a)?
            + self.denominators.reference_energy(b)?;
        let two_j_abcd = a.two_j() + b.two_j() + c.two_j() + d.two_j();
        let k_half = Half::from(k);

        let mut energy = 0.0;
        for &alpha in self.orbitals.excited() {
            self.observer.begin_outer("two-body", alpha);
            let e_alpha = self.energy(alpha)?;
            for &beta in self.orbitals.excited() {
                if !(self.in_q_space(alpha) || self.in_q_space(beta)) {
                    continue;
                }
                if a.parity() + alpha.parity() != b.parity() + beta.parity()
                    || alpha.parity() + c.parity() != beta.parity() + d.parity()
                {
                    continue;
                }
                let mut coeff_alpha_beta = ((alpha.two_j() + 1)
                                            * (beta.two_j() + 1)
                                            * (2 * k + 1)) as f64;
                coeff_alpha_beta /= coeff_ac * coeff_bd;
                coeff_alpha_beta /= e_ab - e_alpha - self.energy(beta)?
                    + self.conf.delta;
                let exponent = (two_j_abcd + alpha.two_j() + beta.two_j()) / 2;
                coeff_alpha_beta *= phase(exponent + k + 1);

                // larger multipoles are never stored
                for k1 in k_range(a, alpha)
                    .take_while(|&k| k <= MAX_MULTIPOLE)
                {
                    let coeff_ab = r.electron_3j(a.j(), alpha.j(), k1)
                        * r.electron_3j(b.j(), beta.j(), k1);
                    if coeff_ab == 0.0 {
                        continue;
                    }
                    let r1 = self.two_body.two_body(k1, a, b, alpha, beta)?;
                    for k2 in k_range(alpha, c)
                        .take_while(|&k| k <= MAX_MULTIPOLE)
                    {
                        let mut coeff = r.electron_3j(alpha.j(), c.j(), k2)
                            * r.electron_3j(beta.j(), d.j(), k2);
                        if coeff != 0.0 {
                            coeff *= r.wigner_6j(c.j(), a.j(), k_half,
                                                 k1.into(), k2.into(), alpha.j())
                                * r.wigner_6j(d.j(), b.j(), k_half,
                                              k1.into(), k2.into(), beta.j());
                        }
                        if coeff == 0.0 {
                            continue;
                        }
                        coeff *= coeff_ab * coeff_alpha_beta * phase(k1 + k2);
                        let r2 = self.two_body.two_body(k2, alpha, beta, c, d)?;
                        energy += r1 * r2 * coeff;
                    }
                }
            }
            self.observer.end_outer("two-body", alpha, energy);
        }
        self.report("two-body", energy);
        Ok(energy)
    }

    /// Box diagram alone; identical to
    /// [`two_body_correction`](#method.two_body_correction).
    pub fn two_body_box(
        &self,
        k: i32,
        a: OrbitalKey,
        b: OrbitalKey,
        c: OrbitalKey,
        d: OrbitalKey,
    ) -> Result<f64> {
        self.two_body_correction(k, a, b, c, d)
    }

    /// Subtraction diagrams: a one-body insertion `<x|H|α>` on one external
    /// line `x` and the interaction `R_k` on the rest, summed over
    /// `α ∈ Q` with `κ_α = κ_x`.
    ///
    /// Exactly zero under the same selection rules as
    /// [`two_body_correction`](#method.two_body_correction).
    pub fn two_body_subtraction(
        &self,
        k: i32,
        a: OrbitalKey,
        b: OrbitalKey,
        c: OrbitalKey,
        d: OrbitalKey,
    ) -> Result<f64> {
        let r = &self.recoupler;
        if r.electron_3j(a.j(), c.j(), k) == 0.0
            || r.electron_3j(b.j(), d.j(), k) == 0.0
            || !parity_allowed(k, a, b, c, d)
        {
            return Ok(0.0);
        }
        let den = &self.denominators;
        let (e_a, e_b) = (den.reference_energy(a)?, den.reference_energy(b)?);
        let (e_c, e_d) = (den.reference_energy(c)?, den.reference_energy(d)?);
        let delta = self.conf.delta;
        let h = &self.one_body;
        let v = &self.two_body;

        let mut energy = 0.0;
        for &alpha in self.orbitals.high() {
            if !self.in_q_space(alpha) {
                continue;
            }
            self.observer.begin_outer("subtraction", alpha);
            let e_alpha = self.energy(alpha)?;
            let kappa = alpha.kappa();
            if kappa == a.kappa() {
                energy += v.two_body(k, alpha, b, c, d)? * h.one_body(a, alpha)?
                    / (e_a - e_alpha + delta);
            }
            if kappa == c.kappa() {
                energy += v.two_body(k, a, b, alpha, d)? * h.one_body(alpha, c)?
                    / (e_c - e_alpha + delta);
            }
            if kappa == b.kappa() {
                energy += v.two_body(k, a, alpha, c, d)? * h.one_body(b, alpha)?
                    / (e_b - e_alpha + delta);
            }
            if kappa == d.kappa() {
                energy += v.two_body(k, a, b, c, alpha)? * h.one_body(alpha, d)?
                    / (e_d - e_alpha + delta);
            }
            self.observer.end_outer("subtraction", alpha, energy);
        }
        self.report("subtraction", energy);
        Ok(energy)
    }

    /// Two-body valence plus subtraction diagrams.
    pub fn two_body_total(
        &self,
        k: i32,
        a: OrbitalKey,
        b: OrbitalKey,
        c: OrbitalKey,
        d: OrbitalKey,
    ) -> Result<f64> {
        Ok(self.two_body_correction(k, a, b, c, d)?
           + self.two_body_subtraction(k, a, b, c, d)?)
    }
}
