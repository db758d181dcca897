//! Brueckner orbitals: a converged sigma potential folded back into the
//! mean-field operator.
use std::collections::BTreeMap;
use std::sync::Arc;
use super::error::Result;
use super::lattice::Lattice;
use super::ode::{NonlocalTerms, OperatorModifier};
use super::orbital::Orbital;
use super::phys_consts::PhysConsts;
use super::sigma::{SigmaCalculator, SigmaPotential};
use super::spinor::Spinor;

/// File that holds the sigma potential of channel `kappa`.
pub fn sigma_path(identifier: &str, kappa: i32) -> String {
    format!("{}.{}.sigma", identifier, kappa)
}

/// Adds `X = −λ Σ ψ` to a mean-field operator, one sigma potential per κ.
///
/// Channels move from uncomputed to computed either through
/// [`calculate_sigma`](#method.calculate_sigma) or
/// [`read`](#method.read); once computed they are never recomputed.
///
/// The modifier never extends the lattice: the nonlocal term used by the
/// ODE is truncated to the operator's extent.
#[derive(Clone, Debug)]
pub struct BruecknerModifier {
    lattice: Arc<Lattice>,
    sigma_size: usize,
    sigmas: BTreeMap<i32, SigmaPotential>,
    lambda: f64,
    alpha: f64,
    use_fg: bool,
    use_gg: bool,
    extent: usize,
    current: Spinor,
}

impl BruecknerModifier {
    /// New sigma potentials cover `sigma_size` lattice points.
    pub fn new(lattice: Arc<Lattice>, sigma_size: usize, consts: &PhysConsts)
               -> Self {
        let extent = lattice.size();
        Self {
            lattice,
            sigma_size,
            sigmas: Default::default(),
            lambda: 1.0,
            alpha: consts.alpha,
            use_fg: false,
            use_gg: false,
            extent,
            current: Spinor::default(),
        }
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Whether newly computed sigmas carry the blocks involving the lower
    /// component.
    pub fn include_lower(mut self, use_fg: bool, use_gg: bool) -> Self {
        self.use_fg = use_fg;
        self.use_gg = use_gg;
        self
    }

    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn set_lambda(&mut self, lambda: f64) {
        self.lambda = lambda;
    }

    pub fn sigma(&self, kappa: i32) -> Option<&SigmaPotential> {
        self.sigmas.get(&kappa)
    }

    pub fn kappas<'a>(&'a self) -> impl Iterator<Item = i32> + 'a {
        self.sigmas.keys().cloned()
    }

    pub fn insert_sigma(&mut self, kappa: i32, sigma: SigmaPotential) {
        self.sigmas.insert(kappa, sigma);
    }

    /// Compute the sigma of channel `kappa` unless it is already present.
    pub fn calculate_sigma<C>(&mut self, kappa: i32, calculator: &C)
                              -> Result<()>
        where C: SigmaCalculator + ?Sized
    {
        if self.sigmas.contains_key(&kappa) {
            return Ok(());
        }
        let mut sigma = SigmaPotential::new(self.sigma_size);
        sigma.include_lower(self.use_fg, self.use_gg);
        calculator.second_order_sigma(kappa, &mut sigma)?;
        info!("computed sigma for kappa = {} ({} points)",
              kappa, sigma.size());
        self.sigmas.insert(kappa, sigma);
        Ok(())
    }

    /// Load `{identifier}.{kappa}.sigma`.  Returns whether it succeeded;
    /// on failure the channel is left as it was.
    pub fn read(&mut self, identifier: &str, kappa: i32) -> bool {
        let path = sigma_path(identifier, kappa);
        match SigmaPotential::read(&path) {
            Ok(sigma) => {
                debug!("read sigma from {}", path);
                self.sigmas.insert(kappa, sigma);
                true
            }
            Err(e) => {
                warn!("cannot read sigma from {}: {}", path, e);
                false
            }
        }
    }

    /// Save the sigma of channel `kappa`, if present.
    pub fn write(&self, identifier: &str, kappa: i32) -> Result<()> {
        if let Some(sigma) = self.sigmas.get(&kappa) {
            sigma.write(sigma_path(identifier, kappa))?;
        }
        Ok(())
    }

    pub fn write_all(&self, identifier: &str) -> Result<()> {
        for (&kappa, sigma) in &self.sigmas {
            sigma.write(sigma_path(identifier, kappa))?;
        }
        Ok(())
    }

    /// `X = −λ Σ s` for the channel of `s`, or an empty spinor if that
    /// channel has no sigma.
    pub fn extra_nonlocal(&self, s: &Spinor, include_derivative: bool)
                          -> Spinor {
        let sigma = match self.sigmas.get(&s.kappa) {
            Some(sigma) => sigma,
            None => return Spinor::new(s.kappa, 0),
        };
        let mut x = sigma.apply_to(s, &self.lattice);
        x *= -self.lambda;
        if include_derivative {
            x.update_derivatives(&self.lattice);
        }
        x
    }

    /// Nonlocal term currently used by the ODE.
    #[inline]
    pub fn current(&self) -> &Spinor {
        &self.current
    }
}

impl OperatorModifier for BruecknerModifier {
    fn set_ode_parameters(&mut self, approximation: &Orbital) {
        self.current = self.extra_nonlocal(&approximation.spinor, true);
        if self.current.size() > self.extent {
            self.current.resize(self.extent);
        }
    }

    fn contribute_nonlocal_terms(&self, point: usize, _: &Spinor,
                                 terms: &mut NonlocalTerms) {
        if point >= self.current.size() {
            return;
        }
        let x = &self.current;
        terms.w[0] += self.alpha * x.g[point];
        terms.w[1] -= self.alpha * x.f[point];
        terms.dwdr[0] += self.alpha * x.dgdr[point];
        terms.dwdr[1] -= self.alpha * x.dfdr[point];
    }

    fn contribute_exchange(&self, approximation: Option<&Orbital>,
                           exchange: &mut Spinor) {
        match approximation {
            Some(a) => *exchange += &self.extra_nonlocal(&a.spinor, true),
            None => *exchange += &self.current,
        }
    }

    fn apply(&self, a: &Spinor, ta: &mut Spinor) {
        *ta -= &self.extra_nonlocal(a, false);
    }

    fn alert(&mut self, size: usize) {
        self.extent = size;
        if self.current.size() > size {
            self.current.resize(size);
        }
    }
}
