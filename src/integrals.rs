//! Radial integrals consumed by the MBPT engine.
//!
//! ```text
//! one-electron   <i|H|j>
//! SMS            <i|p|j>
//! two-electron   R_k(ij, lm) = ∫∫ ψ_i(r₁) ψ_l(r₁) r_<^k / r_>^(k+1)
//!                                ψ_j(r₂) ψ_m(r₂)       (i → l, j → m)
//! ```
use std::collections::BTreeSet;
use std::io;
use fnv::{FnvHashMap, FnvHashSet};
use serde_yaml;
use super::ang_mom::{k_allowed, k_range};
use super::coulomb::CoulombIntegrator;
use super::error::{Error, Result};
use super::ode::SpinorOperator;
use super::orbital::OrbitalKey;
use super::orbital_manager::OrbitalManager;
use super::parity::Parity;
use super::state_index::{MAX_MULTIPOLE, PairKey, QuadKey, StateIndex};

/// What to do when an integral is requested that was never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissPolicy {
    /// Return `Error::CacheMiss`.
    Fatal,
    /// Log a warning and use zero.  Hides desynchronization between the
    /// caller and the preceding update; not recommended.
    BestEffort,
}

impl Default for MissPolicy {
    fn default() -> Self {
        MissPolicy::Fatal
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// Add the scaled specific mass shift to `k = 1` two-electron integrals
    /// that involve no core state.
    pub include_valence_sms: bool,
    /// Electron mass over nuclear mass.  SMS integrals are only computed
    /// when this is nonzero.
    pub nuclear_inverse_mass: f64,
    pub miss_policy: MissPolicy,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            include_valence_sms: false,
            nuclear_inverse_mass: 0.0,
            miss_policy: Default::default(),
        }
    }
}

impl Conf {
    pub fn from_yaml_reader<R: io::Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Source of one-electron matrix elements `<a|H|b>`.
pub trait OneBodyIntegrals {
    fn one_body(&self, a: OrbitalKey, b: OrbitalKey) -> Result<f64>;
}

/// Source of two-electron integrals `R_k(ij, lm)`, including any SMS term.
pub trait TwoBodyIntegrals {
    fn two_body(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<f64>;
}

impl<'a, T: OneBodyIntegrals + ?Sized> OneBodyIntegrals for &'a T {
    fn one_body(&self, a: OrbitalKey, b: OrbitalKey) -> Result<f64> {
        (**self).one_body(a, b)
    }
}

impl<'a, T: TwoBodyIntegrals + ?Sized> TwoBodyIntegrals for &'a T {
    fn two_body(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<f64> {
        (**self).two_body(k, i, j, l, m)
    }
}

/// Number of distinct integrals of each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageSize {
    pub one_electron: usize,
    pub sms: usize,
    pub two_electron: usize,
}

impl StorageSize {
    pub fn total(&self) -> usize {
        self.one_electron + self.sms + self.two_electron
    }
}

/// One potential `y_k[jm]` and the pairs `(i, l)` it is contracted with.
struct PotentialTask {
    j: OrbitalKey,
    m: OrbitalKey,
    k: i32,
    partners: Vec<(OrbitalKey, OrbitalKey)>,
}

/// Integrals an update pass needs for the current orbital sets.
struct Plan {
    one_electron: Vec<(OrbitalKey, OrbitalKey)>,
    sms: Vec<(OrbitalKey, OrbitalKey)>,
    two_electron: Vec<PotentialTask>,
}

impl Plan {
    /// The valence engine reads
    ///
    ///   - `<v|H|α>` for `v` valence and `α` high with equal κ,
    ///   - `<a|p|b>` for `a`, `b` valence or excited with `|l_a − l_b| = 1`,
    ///   - `R_k(v₁v₂, e₁e₂)` for `v` valence, `e` excited and `k` allowed by
    ///     both pairs `(v₁, e₁)` and `(v₂, e₂)`.
    ///
    /// Since high and valence states are excited states, the last item also
    /// covers the `R_k(v₁v₂, v₃α)` integrals of the subtraction diagrams.
    fn new(orbitals: &OrbitalManager, conf: &Conf) -> Self {
        let valence = orbitals.valence();
        let excited = orbitals.excited();

        let one_electron = valence.iter()
            .flat_map(|&v| {
                orbitals.high().iter()
                    .filter(move |alpha| alpha.kappa() == v.kappa())
                    .map(move |&alpha| (v, alpha))
            })
            .collect();

        let mut sms = Vec::new();
        if conf.nuclear_inverse_mass != 0.0 {
            let states: Vec<_> = valence.union(excited).cloned().collect();
            for (n, &a) in states.iter().enumerate() {
                for &b in &states[n + 1 ..] {
                    if (a.l() - b.l()).abs() == 1 {
                        sms.push((a, b));
                    }
                }
            }
        }

        let mut two_electron = Vec::new();
        for &v2 in valence {
            for &e2 in excited {
                for k in k_range(v2, e2).take_while(|&k| k <= MAX_MULTIPOLE) {
                    let partners: Vec<_> = valence.iter()
                        .flat_map(move |&v1| excited.iter().map(move |&e1| (v1, e1)))
                        .filter(|&(v1, e1)| k_allowed(v1, e1, k))
                        .collect();
                    if !partners.is_empty() {
                        two_electron.push(PotentialTask { j: v2, m: e2, k, partners });
                    }
                }
            }
        }

        Plan { one_electron, sms, two_electron }
    }
}

/// Cache of radial integrals keyed by canonical state indices.
///
/// The cache only changes through [`update`](#method.update),
/// [`get_or_compute_two_electron`](#method.get_or_compute_two_electron)
/// and [`clear`](#method.clear).  Any change to the orbitals themselves
/// requires `clear` followed by `update`.
#[derive(Clone, Debug, Default)]
pub struct RadialIntegralCache {
    conf: Conf,
    index: StateIndex,
    core: BTreeSet<OrbitalKey>,
    one_electron: FnvHashMap<PairKey, f64>,
    sms: FnvHashMap<PairKey, f64>,
    two_electron: FnvHashMap<QuadKey, f64>,
}

impl RadialIntegralCache {
    pub fn new(conf: Conf) -> Self {
        Self { conf, ..Default::default() }
    }

    #[inline]
    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    pub fn set_include_valence_sms(&mut self, include: bool) {
        self.conf.include_valence_sms = include;
    }

    #[inline]
    pub fn index(&self) -> &StateIndex {
        &self.index
    }

    pub fn len_one_electron(&self) -> usize {
        self.one_electron.len()
    }

    pub fn len_sms(&self) -> usize {
        self.sms.len()
    }

    pub fn len_two_electron(&self) -> usize {
        self.two_electron.len()
    }

    /// Register the core and excited states of `orbitals`.  States already
    /// known keep their indices.
    pub fn register(&mut self, orbitals: &OrbitalManager) {
        self.index.extend(orbitals.core().iter().cloned());
        self.index.extend(orbitals.excited().iter().cloned());
        self.core.extend(orbitals.core().iter().cloned());
    }

    /// Drop every integral and the state registry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.core.clear();
        self.one_electron.clear();
        self.sms.clear();
        self.two_electron.clear();
    }

    /// Number of distinct integrals that [`update`](#method.update) would
    /// hold for `orbitals`.  Does not touch the cache.
    pub fn storage_size_estimate(&self, orbitals: &OrbitalManager)
                                 -> Result<StorageSize> {
        let mut index = self.index.clone();
        index.extend(orbitals.core().iter().cloned());
        index.extend(orbitals.excited().iter().cloned());
        let plan = Plan::new(orbitals, &self.conf);

        let mut pairs = FnvHashSet::default();
        for &(a, b) in &plan.one_electron {
            pairs.insert(index.canonical_pair(a, b)?.0);
        }
        let one_electron = pairs.len();

        pairs.clear();
        for &(a, b) in &plan.sms {
            pairs.insert(index.canonical_pair(a, b)?.0);
        }
        let sms = pairs.len();

        let mut quads = FnvHashSet::default();
        for task in &plan.two_electron {
            for &(i, l) in &task.partners {
                quads.insert(index.canonical_quad(task.k, i, task.j, l, task.m)?.0);
            }
        }

        Ok(StorageSize { one_electron, sms, two_electron: quads.len() })
    }

    /// Compute every integral the valence engine needs for the current
    /// orbital sets.  Integrals already stored are kept as they are, so
    /// repeating an update is a no-op and growing the excited set only adds
    /// entries.
    pub fn update<O>(&mut self, orbitals: &OrbitalManager, hamiltonian: &O)
                     -> Result<()>
        where O: SpinorOperator + ?Sized
    {
        self.register(orbitals);
        let plan = Plan::new(orbitals, &self.conf);
        let coulomb = CoulombIntegrator::new(orbitals.lattice().clone());
        let before = (self.len_one_electron(), self.len_sms(),
                      self.len_two_electron());

        for &(a, b) in &plan.one_electron {
            let (key, _) = self.index.canonical_pair(a, b)?;
            if self.one_electron.contains_key(&key) {
                continue;
            }
            let (x, y) = (self.key_at(key.i)?, self.key_at(key.j)?);
            let value = coulomb.matrix_element(hamiltonian,
                                               &orbitals.get(x)?.spinor,
                                               &orbitals.get(y)?.spinor);
            self.one_electron.insert(key, value);
        }

        for &(a, b) in &plan.sms {
            let (key, _) = self.index.canonical_pair(a, b)?;
            if self.sms.contains_key(&key) {
                continue;
            }
            let (x, y) = (self.key_at(key.i)?, self.key_at(key.j)?);
            let value = coulomb.isotope_shift_integral(&orbitals.get(x)?.spinor,
                                                       &orbitals.get(y)?.spinor);
            self.sms.insert(key, value);
        }

        for task in &plan.two_electron {
            let mut missing = Vec::new();
            for &(i, l) in &task.partners {
                let (key, _) = self.index.canonical_quad(task.k, i, task.j,
                                                         l, task.m)?;
                if !self.two_electron.contains_key(&key) {
                    missing.push((key, orbitals.get(i)?, orbitals.get(l)?));
                }
            }
            if missing.is_empty() {
                continue;
            }
            let size = missing.iter()
                .map(|&(_, i, l)| i.size().min(l.size()))
                .max()
                .unwrap_or(0);
            let density = coulomb.density(&orbitals.get(task.j)?.spinor,
                                          &orbitals.get(task.m)?.spinor);
            let pot = coulomb.potential(&density, task.k, size);
            for (key, i, l) in missing {
                // a later partner may share the canonical key
                if !self.two_electron.contains_key(&key) {
                    let value = coulomb.contract(&pot, &i.spinor, &l.spinor);
                    self.two_electron.insert(key, value);
                }
            }
        }

        info!("integral update: one-electron {} (+{}), SMS {} (+{}), \
               two-electron {} (+{})",
              self.len_one_electron(), self.len_one_electron() - before.0,
              self.len_sms(), self.len_sms() - before.1,
              self.len_two_electron(), self.len_two_electron() - before.2);
        Ok(())
    }

    /// Stored `<a|H|b>`, or `None` if it was never computed.
    pub fn lookup_one_electron(&self, a: OrbitalKey, b: OrbitalKey)
                               -> Result<Option<f64>> {
        let (key, _) = self.index.canonical_pair(a, b)?;
        Ok(self.one_electron.get(&key).cloned())
    }

    /// Stored Coulomb part of `R_k(ij, lm)`, or `None` if it was never
    /// computed.
    pub fn lookup_two_electron(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<Option<f64>> {
        let (key, _) = self.index.canonical_quad(k, i, j, l, m)?;
        Ok(self.two_electron.get(&key).cloned())
    }

    /// `<a|H|b>`
    pub fn get_one_electron(&self, a: OrbitalKey, b: OrbitalKey) -> Result<f64> {
        let (key, _) = self.index.canonical_pair(a, b)?;
        self.resolve(self.one_electron.get(&key).cloned(),
                     || format!("<{}|H|{}>", a, b))
    }

    /// `<a|p|b>`.  Zero unless `|l_a − l_b| = 1`.
    pub fn get_sms(&self, a: OrbitalKey, b: OrbitalKey) -> Result<f64> {
        let (key, sign) = self.index.canonical_pair(a, b)?;
        if (a.l() - b.l()).abs() != 1 {
            return Ok(0.0);
        }
        let value = self.resolve(self.sms.get(&key).cloned(),
                                 || format!("<{}|p|{}>", a, b))?;
        Ok(sign.sign_f64() * value)
    }

    /// `R_k(ij, lm)`, plus `−λ_N <i|p|l> <j|p|m>` for `k = 1` when the
    /// valence SMS is included.
    pub fn get_two_electron(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<f64> {
        let (key, sign) = self.index.canonical_quad(k, i, j, l, m)?;
        let value = self.resolve(
            self.two_electron.get(&key).cloned(),
            || format!("R_{}({}{}, {}{})", k, i, j, l, m),
        )?;
        Ok(value + self.sms_term(&key, sign)?)
    }

    /// Like [`get_two_electron`](#method.get_two_electron), but computes
    /// and stores the Coulomb part if it is missing.  The states must be
    /// registered.
    pub fn get_or_compute_two_electron(
        &mut self,
        orbitals: &OrbitalManager,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<f64> {
        let (key, sign) = self.index.canonical_quad(k, i, j, l, m)?;
        let value = match self.two_electron.get(&key) {
            Some(&value) => value,
            None => {
                let [i, j, l, m] = self.keys_of(key.states)?;
                let coulomb = CoulombIntegrator::new(orbitals.lattice().clone());
                let value = coulomb.slater(k,
                                           &orbitals.get(i)?.spinor,
                                           &orbitals.get(j)?.spinor,
                                           &orbitals.get(l)?.spinor,
                                           &orbitals.get(m)?.spinor);
                self.two_electron.insert(key, value);
                value
            }
        };
        Ok(value + self.sms_term(&key, sign)?)
    }

    fn sms_term(&self, key: &QuadKey, sign: Parity) -> Result<f64> {
        let lambda = self.conf.nuclear_inverse_mass;
        if !self.conf.include_valence_sms || lambda == 0.0 || key.k != 1 {
            return Ok(0.0);
        }
        // canonical quads have i ≤ l and j ≤ m
        let [i, j, l, m] = self.keys_of(key.states)?;
        // SMS integrals are only held between valence and excited states
        if [i, j, l, m].iter().any(|k| self.core.contains(k)) {
            return Ok(0.0);
        }
        let p_il = self.get_sms(i, l)?;
        let p_jm = self.get_sms(j, m)?;
        Ok(-lambda * sign.sign_f64() * p_il * p_jm)
    }

    fn key_at(&self, i: u32) -> Result<OrbitalKey> {
        self.index.key(i)
            .ok_or_else(|| Error::CacheMiss(format!("state index {}", i)))
    }

    fn keys_of(&self, states: [u32; 4]) -> Result<[OrbitalKey; 4]> {
        Ok([self.key_at(states[0])?, self.key_at(states[1])?,
            self.key_at(states[2])?, self.key_at(states[3])?])
    }

    fn resolve<F: FnOnce() -> String>(&self, value: Option<f64>, what: F)
                                      -> Result<f64> {
        match (value, self.conf.miss_policy) {
            (Some(value), _) => Ok(value),
            (None, MissPolicy::Fatal) => Err(Error::CacheMiss(what())),
            (None, MissPolicy::BestEffort) => {
                warn!("{} is not in the cache; using zero", what());
                Ok(0.0)
            }
        }
    }
}

impl OneBodyIntegrals for RadialIntegralCache {
    fn one_body(&self, a: OrbitalKey, b: OrbitalKey) -> Result<f64> {
        self.get_one_electron(a, b)
    }
}

impl TwoBodyIntegrals for RadialIntegralCache {
    fn two_body(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<f64> {
        self.get_two_electron(k, i, j, l, m)
    }
}

/// Integrals computed from the wavefunctions on every request.
pub struct DirectIntegrals<'a, O: ?Sized> {
    orbitals: &'a OrbitalManager,
    hamiltonian: &'a O,
    coulomb: CoulombIntegrator,
    nuclear_inverse_mass: f64,
}

impl<'a, O: SpinorOperator + ?Sized> DirectIntegrals<'a, O> {
    pub fn new(orbitals: &'a OrbitalManager, hamiltonian: &'a O,
               nuclear_inverse_mass: f64) -> Self {
        Self {
            orbitals,
            hamiltonian,
            coulomb: CoulombIntegrator::new(orbitals.lattice().clone()),
            nuclear_inverse_mass,
        }
    }
}

impl<'a, O: SpinorOperator + ?Sized> OneBodyIntegrals for DirectIntegrals<'a, O> {
    fn one_body(&self, a: OrbitalKey, b: OrbitalKey) -> Result<f64> {
        Ok(self.coulomb.matrix_element(self.hamiltonian,
                                       &self.orbitals.get(a)?.spinor,
                                       &self.orbitals.get(b)?.spinor))
    }
}

impl<'a, O: SpinorOperator + ?Sized> TwoBodyIntegrals for DirectIntegrals<'a, O> {
    fn two_body(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<f64> {
        let (si, sj) = (&self.orbitals.get(i)?.spinor, &self.orbitals.get(j)?.spinor);
        let (sl, sm) = (&self.orbitals.get(l)?.spinor, &self.orbitals.get(m)?.spinor);
        let mut value = self.coulomb.slater(k, si, sj, sl, sm);
        if self.nuclear_inverse_mass != 0.0 && k == 1 {
            value -= self.nuclear_inverse_mass
                * self.coulomb.isotope_shift_integral(si, sl)
                * self.coulomb.isotope_shift_integral(sj, sm);
        }
        Ok(value)
    }
}
