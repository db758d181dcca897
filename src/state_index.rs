//! Dense state indices and canonical index orderings for stored integrals.
use std::collections::BTreeMap;
use super::error::{Error, Result};
use super::orbital::OrbitalKey;
use super::parity::{sort2, Parity};
use super::utils::cast;

/// Largest multipole order for which two-electron integrals are stored.
pub const MAX_MULTIPOLE: i32 = 12;

/// Largest number of registered states (indices are `u32`).
pub const MAX_STATES: u32 = u32::max_value();

/// Storage key of a one-electron integral `<i|O|j>` with `i ≤ j`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub i: u32,
    pub j: u32,
}

impl PairKey {
    /// Canonical key of `<i|O|j>`.  The parity is odd if the indices were
    /// swapped.
    #[inline]
    pub fn canonical(i: u32, j: u32) -> (Self, Parity) {
        let (p, i, j) = sort2(i, j);
        (PairKey { i, j }, p)
    }
}

/// Storage key of a two-electron integral `R_k(ij, lm)` (`i → l`, `j → m`).
///
/// `states` holds `[i, j, l, m]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadKey {
    pub k: i32,
    pub states: [u32; 4],
}

impl QuadKey {
    /// Canonical key of `R_k(ij, lm)`: the lexicographically smallest of the
    /// eight equivalent index tuples generated by `i ↔ l`, `j ↔ m` and
    /// `(i, l) ↔ (j, m)`.
    ///
    /// The parity is odd if exactly one of the in-pair swaps was applied.
    /// It is the sign picked up by a product of two antisymmetric one-body
    /// integrals `P(i, l) P(j, m)`.
    pub fn canonical(k: i32, states: [u32; 4]) -> (Self, Parity) {
        let [i0, j0, l0, m0] = states;
        let mut best = (states, Parity::Even);
        for &p1 in &[Parity::Even, Parity::Odd] {
            let (i, l) = if p1 == Parity::Odd { (l0, i0) } else { (i0, l0) };
            for &p2 in &[Parity::Even, Parity::Odd] {
                let (j, m) = if p2 == Parity::Odd { (m0, j0) } else { (j0, m0) };
                for &t in &[[i, j, l, m], [j, i, m, l]] {
                    if t < best.0 {
                        best = (t, p1 + p2);
                    }
                }
            }
        }
        (QuadKey { k, states: best.0 }, best.1)
    }
}

/// Registry that assigns each orbital a dense index.
///
/// On a fresh registry core states are registered first and excited states
/// after them, each group in `(pqn, kappa)` order.  Registration is
/// append-only: states added later receive indices after all existing ones,
/// so stored keys stay valid when the excited set grows.  A core state
/// added after excited states therefore comes after them; `clear` followed
/// by a new registration restores the core-first order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateIndex {
    indices: BTreeMap<OrbitalKey, u32>,
    keys: Vec<OrbitalKey>,
}

impl StateIndex {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registry over `core` followed by `excited`.
    pub fn from_sets<'a, I, J>(core: I, excited: J) -> Self
        where I: IntoIterator<Item = &'a OrbitalKey>,
              J: IntoIterator<Item = &'a OrbitalKey>,
    {
        let mut index = Self::new();
        index.extend(core.into_iter().cloned());
        index.extend(excited.into_iter().cloned());
        index
    }

    /// Register the states that are not yet known, in `(pqn, kappa)` order.
    /// Returns the number of newly registered states.
    pub fn extend<I: IntoIterator<Item = OrbitalKey>>(&mut self, keys: I)
                                                      -> usize {
        let mut new: Vec<_> = keys.into_iter()
            .filter(|k| !self.indices.contains_key(k))
            .collect();
        new.sort();
        new.dedup();
        for &key in &new {
            let index: u32 = cast(self.keys.len());
            assert!(index < MAX_STATES, "too many states");
            self.indices.insert(key, index);
            self.keys.push(key);
        }
        new.len()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.keys.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: OrbitalKey) -> bool {
        self.indices.contains_key(&key)
    }

    pub fn index(&self, key: OrbitalKey) -> Result<u32> {
        self.indices.get(&key).cloned().ok_or(Error::UnknownOrbital(key))
    }

    pub fn key(&self, index: u32) -> Option<OrbitalKey> {
        self.keys.get(index as usize).cloned()
    }

    pub fn canonical_pair(&self, i: OrbitalKey, j: OrbitalKey)
                          -> Result<(PairKey, Parity)> {
        Ok(PairKey::canonical(self.index(i)?, self.index(j)?))
    }

    pub fn canonical_quad(
        &self,
        k: i32,
        i: OrbitalKey,
        j: OrbitalKey,
        l: OrbitalKey,
        m: OrbitalKey,
    ) -> Result<(QuadKey, Parity)> {
        if k < 0 || k > MAX_MULTIPOLE {
            return Err(Error::MultipoleTooLarge(k));
        }
        let states = [self.index(i)?, self.index(j)?,
                      self.index(l)?, self.index(m)?];
        Ok(QuadKey::canonical(k, states))
    }
}
