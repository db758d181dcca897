//! Mean-field operators for the radial Dirac equation and the modifiers
//! that add extra potentials to them.
//!
//! The coupled equations are
//!
//! ```text
//! df/dr = w[0] = w_f[0] f + w_g[0] g + w_const[0]
//! dg/dr = w[1] = w_f[1] f + w_g[1] g + w_const[1]
//! ```
//!
//! where `w_const` collects the nonlocal terms.
use std::sync::Arc;
use super::lattice::Lattice;
use super::orbital::Orbital;
use super::phys_consts::PhysConsts;
use super::spinor::Spinor;

/// Linear coefficients of the ODE at a lattice point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OdeCoefficients {
    pub w_f: [f64; 2],
    pub w_g: [f64; 2],
    pub w_const: [f64; 2],
}

/// `jacobian[i] = [∂w[i]/∂f, ∂w[i]/∂g]` and `dwdr[i] = ∂w[i]/∂r`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OdeJacobian {
    pub jacobian: [[f64; 2]; 2],
    pub dwdr: [f64; 2],
}

/// Terms of a modifier that are proportional to `f` or `g`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalTerms {
    pub w_f: [f64; 2],
    pub w_g: [f64; 2],
}

/// Terms of a modifier that do not depend on `(f, g)` at the given point,
/// together with their radial derivatives.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NonlocalTerms {
    pub w: [f64; 2],
    pub dwdr: [f64; 2],
}

/// A one-body operator that defines the radial ODE and can act on spinors.
pub trait SpinorOperator {
    fn lattice(&self) -> &Arc<Lattice>;

    /// Number of lattice points over which the ODE is defined.
    fn size(&self) -> usize;

    /// Take κ, energy and any nonlocal potential from an approximation of
    /// the solution.
    fn set_ode_parameters(&mut self, approximation: &Orbital);

    /// Nonlocal potential acting on `approximation`, or on the approximation
    /// last passed to `set_ode_parameters` if `None`.
    fn exchange(&self, approximation: Option<&Orbital>) -> Spinor;

    /// Whether the ODE methods include the nonlocal (`w_const`) terms.
    fn include_nonlocal(&self) -> bool;

    fn set_include_nonlocal(&mut self, include: bool);

    /// `[df/dr, dg/dr]` at `point`.
    fn ode_function(&self, point: usize, fg: &Spinor) -> [f64; 2];

    fn ode_coefficients(&self, point: usize, fg: &Spinor) -> OdeCoefficients;

    fn ode_jacobian(&self, point: usize, fg: &Spinor) -> OdeJacobian;

    /// `O |a>`
    fn apply_to(&self, a: &Spinor) -> Spinor;
}

/// Dirac operator with a local potential energy `V(r)`, measured from the
/// electron rest energy.
#[derive(Clone, Debug)]
pub struct LocalOperator {
    lattice: Arc<Lattice>,
    potential: Vec<f64>,
    dvdr: Vec<f64>,
    alpha: f64,
    kappa: i32,
    energy: f64,
    include_nonlocal: bool,
}

impl LocalOperator {
    pub fn new(lattice: Arc<Lattice>, potential: Vec<f64>, consts: &PhysConsts)
               -> Self {
        assert!(potential.len() <= lattice.size(),
                "potential extends beyond the lattice");
        let dvdr = lattice.derivative(&potential);
        Self {
            lattice,
            potential,
            dvdr,
            alpha: consts.alpha,
            kappa: -1,
            energy: 0.0,
            include_nonlocal: true,
        }
    }

    /// Point-nucleus potential `−Z/r` over the whole lattice.
    pub fn nuclear(lattice: Arc<Lattice>, z: f64, consts: &PhysConsts)
                   -> Self {
        let potential = lattice.r().iter().map(|r| -z / r).collect();
        Self::new(lattice, potential, consts)
    }

    #[inline]
    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    /// Set κ and energy directly.
    pub fn set_kappa_energy(&mut self, kappa: i32, energy: f64) {
        self.kappa = kappa;
        self.energy = energy;
    }
}

impl SpinorOperator for LocalOperator {
    fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    fn size(&self) -> usize {
        self.potential.len()
    }

    fn set_ode_parameters(&mut self, approximation: &Orbital) {
        self.set_kappa_energy(approximation.key().kappa(),
                              approximation.energy);
    }

    fn exchange(&self, approximation: Option<&Orbital>) -> Spinor {
        let kappa = approximation.map(|a| a.key().kappa()).unwrap_or(self.kappa);
        Spinor::new(kappa, 0)
    }

    fn include_nonlocal(&self) -> bool {
        self.include_nonlocal
    }

    fn set_include_nonlocal(&mut self, include: bool) {
        self.include_nonlocal = include;
    }

    fn ode_function(&self, point: usize, fg: &Spinor) -> [f64; 2] {
        let c = self.ode_coefficients(point, fg);
        let (f, g) = (fg.f[point], fg.g[point]);
        [c.w_f[0] * f + c.w_g[0] * g + c.w_const[0],
         c.w_f[1] * f + c.w_g[1] * g + c.w_const[1]]
    }

    fn ode_coefficients(&self, point: usize, _: &Spinor) -> OdeCoefficients {
        let alpha = self.alpha;
        let r = self.lattice.r()[point];
        let kappa = self.kappa as f64;
        let e = self.energy - self.potential[point];
        OdeCoefficients {
            w_f: [-kappa / r, -alpha * e],
            w_g: [2.0 / alpha + alpha * e, kappa / r],
            w_const: [0.0, 0.0],
        }
    }

    fn ode_jacobian(&self, point: usize, fg: &Spinor) -> OdeJacobian {
        let c = self.ode_coefficients(point, fg);
        let alpha = self.alpha;
        let r = self.lattice.r()[point];
        let kappa = self.kappa as f64;
        let dvdr = self.dvdr[point];
        let (f, g) = (fg.f[point], fg.g[point]);
        OdeJacobian {
            jacobian: [[c.w_f[0], c.w_g[0]], [c.w_f[1], c.w_g[1]]],
            dwdr: [kappa / (r * r) * f - alpha * dvdr * g,
                   alpha * dvdr * f - kappa / (r * r) * g],
        }
    }

    fn apply_to(&self, a: &Spinor) -> Spinor {
        let n = a.size().min(self.potential.len());
        let r = self.lattice.r();
        let alpha = self.alpha;
        let kappa = a.kappa as f64;
        let mut ta = Spinor::new(a.kappa, n);
        for i in 0 .. n {
            let v = self.potential[i];
            ta.f[i] = v * a.f[i] - (a.dgdr[i] - kappa * a.g[i] / r[i]) / alpha;
            ta.g[i] = v * a.g[i] + (a.dfdr[i] + kappa * a.f[i] / r[i]) / alpha
                - 2.0 * a.g[i] / (alpha * alpha);
        }
        ta.update_derivatives(&self.lattice);
        ta
    }
}

/// An extra contribution to a mean-field operator.
///
/// All methods default to contributing nothing.
pub trait OperatorModifier {
    fn set_ode_parameters(&mut self, _approximation: &Orbital) {}

    fn contribute_local_terms(&self, _point: usize, _fg: &Spinor,
                              _terms: &mut LocalTerms) {}

    /// Only called while the operator includes nonlocal terms.
    fn contribute_nonlocal_terms(&self, _point: usize, _fg: &Spinor,
                                 _terms: &mut NonlocalTerms) {}

    /// Add this modifier's nonlocal potential to `exchange`.
    fn contribute_exchange(&self, _approximation: Option<&Orbital>,
                           _exchange: &mut Spinor) {}

    /// Add this modifier's action on `a` to `ta`.
    fn apply(&self, _a: &Spinor, _ta: &mut Spinor) {}

    /// The operator is now defined over `size` lattice points.
    fn alert(&mut self, _size: usize) {}
}

/// A base operator with an ordered list of modifiers.
///
/// Every `SpinorOperator` method first evaluates the base operator, then
/// lets each modifier add its terms in registration order.  The
/// `include_nonlocal` flag lives in the base operator and switches the
/// modifiers' nonlocal terms off as well.
pub struct DecoratedOperator<O> {
    base: O,
    modifiers: Vec<Box<dyn OperatorModifier>>,
}

impl<O: SpinorOperator> DecoratedOperator<O> {
    pub fn new(base: O) -> Self {
        Self { base, modifiers: Vec::new() }
    }

    pub fn with_modifier<M>(mut self, modifier: M) -> Self
        where M: OperatorModifier + 'static
    {
        self.push(Box::new(modifier));
        self
    }

    pub fn push(&mut self, mut modifier: Box<dyn OperatorModifier>) {
        modifier.alert(self.base.size());
        self.modifiers.push(modifier);
    }

    #[inline]
    pub fn base(&self) -> &O {
        &self.base
    }

    #[inline]
    pub fn modifiers(&self) -> &[Box<dyn OperatorModifier>] {
        &self.modifiers
    }

    /// Notify the modifiers that the base operator's extent has changed.
    pub fn alert(&mut self) {
        let size = self.base.size();
        for m in &mut self.modifiers {
            m.alert(size);
        }
    }

    pub fn into_parts(self) -> (O, Vec<Box<dyn OperatorModifier>>) {
        (self.base, self.modifiers)
    }

    fn local_terms(&self, point: usize, fg: &Spinor) -> LocalTerms {
        let mut terms = LocalTerms::default();
        for m in &self.modifiers {
            m.contribute_local_terms(point, fg, &mut terms);
        }
        terms
    }

    fn nonlocal_terms(&self, point: usize, fg: &Spinor) -> NonlocalTerms {
        let mut terms = NonlocalTerms::default();
        if !self.base.include_nonlocal() {
            return terms;
        }
        for m in &self.modifiers {
            m.contribute_nonlocal_terms(point, fg, &mut terms);
        }
        terms
    }
}

impl<O: SpinorOperator> SpinorOperator for DecoratedOperator<O> {
    fn lattice(&self) -> &Arc<Lattice> {
        self.base.lattice()
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn set_ode_parameters(&mut self, approximation: &Orbital) {
        self.base.set_ode_parameters(approximation);
        for m in &mut self.modifiers {
            m.set_ode_parameters(approximation);
        }
    }

    fn exchange(&self, approximation: Option<&Orbital>) -> Spinor {
        let mut exchange = self.base.exchange(approximation);
        for m in &self.modifiers {
            m.contribute_exchange(approximation, &mut exchange);
        }
        exchange
    }

    fn include_nonlocal(&self) -> bool {
        self.base.include_nonlocal()
    }

    fn set_include_nonlocal(&mut self, include: bool) {
        self.base.set_include_nonlocal(include);
    }

    fn ode_function(&self, point: usize, fg: &Spinor) -> [f64; 2] {
        let mut w = self.base.ode_function(point, fg);
        let local = self.local_terms(point, fg);
        let nonlocal = self.nonlocal_terms(point, fg);
        let (f, g) = (fg.f[point], fg.g[point]);
        for i in 0 .. 2 {
            w[i] += local.w_f[i] * f + local.w_g[i] * g + nonlocal.w[i];
        }
        w
    }

    fn ode_coefficients(&self, point: usize, fg: &Spinor) -> OdeCoefficients {
        let mut c = self.base.ode_coefficients(point, fg);
        let local = self.local_terms(point, fg);
        let nonlocal = self.nonlocal_terms(point, fg);
        for i in 0 .. 2 {
            c.w_f[i] += local.w_f[i];
            c.w_g[i] += local.w_g[i];
            c.w_const[i] += nonlocal.w[i];
        }
        c
    }

    fn ode_jacobian(&self, point: usize, fg: &Spinor) -> OdeJacobian {
        let mut j = self.base.ode_jacobian(point, fg);
        let local = self.local_terms(point, fg);
        let nonlocal = self.nonlocal_terms(point, fg);
        for i in 0 .. 2 {
            j.jacobian[i][0] += local.w_f[i];
            j.jacobian[i][1] += local.w_g[i];
            j.dwdr[i] += nonlocal.dwdr[i];
        }
        j
    }

    fn apply_to(&self, a: &Spinor) -> Spinor {
        let mut ta = self.base.apply_to(a);
        for m in &self.modifiers {
            m.apply(a, &mut ta);
        }
        ta
    }
}
