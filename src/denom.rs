//! Reference energies for perturbative denominators.
//!
//! Every denominator has the form `E_ref − E_intermediate + δ`.  The two
//! policies differ only in how `E_ref` is chosen for an external line.
use std::collections::BTreeMap;
use super::error::{Error, Result};
use super::orbital::OrbitalKey;
use super::orbital_manager::OrbitalManager;

pub trait Denominators {
    /// Reference energy of an external line.
    fn reference_energy(&self, key: OrbitalKey) -> Result<f64>;
}

impl<'a, D: Denominators + ?Sized> Denominators for &'a D {
    fn reference_energy(&self, key: OrbitalKey) -> Result<f64> {
        (**self).reference_energy(key)
    }
}

/// Brillouin–Wigner policy: one valence energy per κ, plus a common shift.
///
/// The valence energy of a channel is the energy of its lowest valence
/// orbital, or of its lowest excited orbital when the channel has no
/// valence orbital.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValenceDenominators {
    energies: BTreeMap<i32, f64>,
    shift: f64,
}

impl ValenceDenominators {
    pub fn new(orbitals: &OrbitalManager, shift: f64) -> Result<Self> {
        let mut d = Self { energies: Default::default(), shift };
        d.update(orbitals)?;
        Ok(d)
    }

    /// Rebuild the valence energies from the current orbital sets.
    pub fn update(&mut self, orbitals: &OrbitalManager) -> Result<()> {
        self.energies.clear();
        // sets iterate in (pqn, kappa) order, so the first hit is the lowest
        for &key in orbitals.valence().iter().chain(orbitals.excited()) {
            if !self.energies.contains_key(&key.kappa()) {
                let energy = orbitals.get(key)?.energy;
                self.energies.insert(key.kappa(), energy);
            }
        }
        debug!("valence energies: {:?}", self.energies);
        Ok(())
    }

    pub fn set_energy(&mut self, kappa: i32, energy: f64) {
        self.energies.insert(kappa, energy);
    }

    #[inline]
    pub fn shift(&self) -> f64 {
        self.shift
    }

    pub fn set_shift(&mut self, shift: f64) {
        self.shift = shift;
    }

    /// Valence energy of the channel including the shift.
    pub fn valence_energy(&self, kappa: i32) -> Result<f64> {
        self.energies.get(&kappa)
            .map(|e| e + self.shift)
            .ok_or(Error::MissingValenceEnergy(kappa))
    }
}

impl Denominators for ValenceDenominators {
    fn reference_energy(&self, key: OrbitalKey) -> Result<f64> {
        self.valence_energy(key.kappa())
    }
}

/// Fixed policy: each external line uses its own orbital energy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoreDenominators {
    energies: BTreeMap<OrbitalKey, f64>,
}

impl CoreDenominators {
    pub fn new(orbitals: &OrbitalManager) -> Result<Self> {
        let mut energies = BTreeMap::new();
        for key in orbitals.all() {
            energies.insert(key, orbitals.get(key)?.energy);
        }
        Ok(Self { energies })
    }
}

impl Denominators for CoreDenominators {
    fn reference_energy(&self, key: OrbitalKey) -> Result<f64> {
        self.energies.get(&key).cloned().ok_or(Error::MissingOrbital(key))
    }
}
