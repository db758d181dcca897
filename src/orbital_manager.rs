//! Orbital sets consumed by the integral engine.
//!
//! By convention the sets are:
//!
//!   - `core`: closed-shell core states,
//!   - `excited`: every virtual line available for summation,
//!   - `valence ⊆ excited`: external lines (the model space),
//!   - `high ⊆ excited`: Q-space lines for subtraction/correction terms.
//!
//! Any mutation invalidates integrals computed from the previous sets.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use super::error::{Error, Result};
use super::lattice::Lattice;
use super::orbital::{Orbital, OrbitalKey};

#[derive(Clone, Debug)]
pub struct OrbitalManager {
    lattice: Arc<Lattice>,
    orbitals: BTreeMap<OrbitalKey, Orbital>,
    core: BTreeSet<OrbitalKey>,
    excited: BTreeSet<OrbitalKey>,
    valence: BTreeSet<OrbitalKey>,
    high: BTreeSet<OrbitalKey>,
}

impl OrbitalManager {
    pub fn new(lattice: Arc<Lattice>) -> Self {
        Self {
            lattice,
            orbitals: Default::default(),
            core: Default::default(),
            excited: Default::default(),
            valence: Default::default(),
            high: Default::default(),
        }
    }

    #[inline]
    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    pub fn insert_core(&mut self, orbital: Orbital) {
        let key = orbital.key();
        self.excited.remove(&key);
        self.valence.remove(&key);
        self.high.remove(&key);
        self.core.insert(key);
        self.orbitals.insert(key, orbital);
    }

    pub fn insert_excited(&mut self, orbital: Orbital) {
        let key = orbital.key();
        self.core.remove(&key);
        self.excited.insert(key);
        self.orbitals.insert(key, orbital);
    }

    /// Valence states must already be excited states.
    pub fn set_valence<I>(&mut self, keys: I) -> Result<()>
        where I: IntoIterator<Item = OrbitalKey>
    {
        self.valence = self.subset_of_excited(keys, "valence")?;
        Ok(())
    }

    /// High (Q-space) states must already be excited states.
    pub fn set_high<I>(&mut self, keys: I) -> Result<()>
        where I: IntoIterator<Item = OrbitalKey>
    {
        self.high = self.subset_of_excited(keys, "high")?;
        Ok(())
    }

    /// Mark every excited state that is not valence as high.
    pub fn set_high_to_complement(&mut self) {
        self.high = self.excited.difference(&self.valence).cloned().collect();
    }

    fn subset_of_excited<I>(&self, keys: I, name: &str)
                            -> Result<BTreeSet<OrbitalKey>>
        where I: IntoIterator<Item = OrbitalKey>
    {
        let set: BTreeSet<_> = keys.into_iter().collect();
        if let Some(key) = set.iter().find(|&k| !self.excited.contains(k)) {
            return Err(Error::InvalidOrbitalSets(
                format!("{} state {} is not an excited state", name, key),
            ));
        }
        Ok(set)
    }

    pub fn get(&self, key: OrbitalKey) -> Result<&Orbital> {
        self.orbitals.get(&key).ok_or(Error::MissingOrbital(key))
    }

    #[inline]
    pub fn core(&self) -> &BTreeSet<OrbitalKey> {
        &self.core
    }

    #[inline]
    pub fn excited(&self) -> &BTreeSet<OrbitalKey> {
        &self.excited
    }

    #[inline]
    pub fn valence(&self) -> &BTreeSet<OrbitalKey> {
        &self.valence
    }

    #[inline]
    pub fn high(&self) -> &BTreeSet<OrbitalKey> {
        &self.high
    }

    /// Core followed by excited states.
    pub fn all(&self) -> impl Iterator<Item = OrbitalKey> + '_ {
        self.core.iter().chain(self.excited.iter()).cloned()
    }

    /// Largest wavefunction extent over the given keys.
    pub fn max_size<'a, I>(&self, keys: I) -> usize
        where I: IntoIterator<Item = &'a OrbitalKey>
    {
        keys.into_iter()
            .filter_map(|k| self.orbitals.get(k))
            .map(Orbital::size)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::spinor::Spinor;

    fn orbital(label: &str) -> Orbital {
        let key: OrbitalKey = label.parse().unwrap();
        Orbital::new(key, -0.1, Spinor::new(key.kappa(), 4))
    }

    #[test]
    fn test_sets() {
        let lattice = Arc::new(Lattice::exponential(4, 1e-3, 0.1));
        let mut m = OrbitalManager::new(lattice);
        m.insert_core(orbital("1s"));
        m.insert_excited(orbital("2s"));
        m.insert_excited(orbital("3s"));
        m.insert_excited(orbital("2p-"));
        m.set_valence(vec!["2s".parse().unwrap()]).unwrap();
        m.set_high_to_complement();
        assert_eq!(m.high().len(), 2);
        assert!(m.set_valence(vec!["1s".parse().unwrap()]).is_err());
        let all: Vec<_> = m.all().map(|k| k.to_string()).collect();
        assert_eq!(all, vec!["1s", "2s", "2p-", "3s"]);
    }
}
