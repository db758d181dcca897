//! Angular momentum coupling.
use std::cell::RefCell;
use fnv::FnvHashMap;
use wigner_symbols::{Wigner3jm, Wigner6j};
use super::half::Half;
use super::orbital::OrbitalKey;

/// Returns `(-1)^φ`
#[inline]
pub fn phase(phi: i32) -> f64 {
    if phi % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Multipoles `k` that can connect `a` and `b` through a Coulomb vertex:
/// `|ja − jb| ≤ k ≤ ja + jb` with `la + lb + k` even.
pub fn k_range(a: OrbitalKey, b: OrbitalKey) -> impl Iterator<Item = i32> {
    let parity = a.l() + b.l();
    let mut k_min = (a.two_j() - b.two_j()).abs() / 2;
    if (k_min + parity) % 2 != 0 {
        k_min += 1;
    }
    let mut k_max = (a.two_j() + b.two_j()) / 2;
    if (k_max + parity) % 2 != 0 {
        k_max -= 1;
    }
    (k_min ..= k_max).step_by(2)
}

/// Whether `k` is in [`k_range(a, b)`](fn.k_range.html).
pub fn k_allowed(a: OrbitalKey, b: OrbitalKey, k: i32) -> bool {
    k >= 0
        && (k + a.l() + b.l()) % 2 == 0
        && (a.two_j() - b.two_j()).abs() <= 2 * k
        && 2 * k <= a.two_j() + b.two_j()
}

/// Angular recoupling coefficients consumed by the summation engine.
///
/// Implementations must return exactly `0.0` when a selection rule forbids
/// the coupling: the engine tests for zero to skip whole inner loops.
pub trait Recoupler {
    /// `(j1 j2 k; 1/2 −1/2 0)`
    fn electron_3j(&self, j1: Half<i32>, j2: Half<i32>, k: i32) -> f64;

    /// `{j1 j2 j3; j4 j5 j6}`
    fn wigner_6j(
        &self,
        j1: Half<i32>,
        j2: Half<i32>,
        j3: Half<i32>,
        j4: Half<i32>,
        j5: Half<i32>,
        j6: Half<i32>,
    ) -> f64;
}

/// Memoizing recoupler backed by `wigner_symbols`.
///
/// Not `Sync`: each calculator owns its own context.
#[derive(Debug, Default)]
pub struct WignerCtx {
    w3j: RefCell<FnvHashMap<(i32, i32, i32), f64>>,
    w6j: RefCell<FnvHashMap<[i32; 6], f64>>,
}

impl WignerCtx {
    /// Number of memoized symbols.
    pub fn len(&self) -> usize {
        self.w3j.borrow().len() + self.w6j.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Recoupler for WignerCtx {
    fn electron_3j(&self, j1: Half<i32>, j2: Half<i32>, k: i32) -> f64 {
        if k < 0 || !j1.is_triangular(j2, Half::from(k)) {
            return 0.0;
        }
        let key = (j1.twice(), j2.twice(), k);
        if let Some(&v) = self.w3j.borrow().get(&key) {
            return v;
        }
        let v = f64::from(Wigner3jm {
            tj1: j1.twice(),
            tm1: 1,
            tj2: j2.twice(),
            tm2: -1,
            tj3: 2 * k,
            tm3: 0,
        }.value());
        self.w3j.borrow_mut().insert(key, v);
        v
    }

    fn wigner_6j(
        &self,
        j1: Half<i32>,
        j2: Half<i32>,
        j3: Half<i32>,
        j4: Half<i32>,
        j5: Half<i32>,
        j6: Half<i32>,
    ) -> f64 {
        if !(j1.is_triangular(j2, j3)
             && j1.is_triangular(j5, j6)
             && j4.is_triangular(j2, j6)
             && j4.is_triangular(j5, j3))
        {
            return 0.0;
        }
        let key = [j1.twice(), j2.twice(), j3.twice(),
                   j4.twice(), j5.twice(), j6.twice()];
        if let Some(&v) = self.w6j.borrow().get(&key) {
            return v;
        }
        let v = f64::from(Wigner6j {
            tj1: key[0],
            tj2: key[1],
            tj3: key[2],
            tj4: key[3],
            tj5: key[4],
            tj6: key[5],
        }.value());
        self.w6j.borrow_mut().insert(key, v);
        v
    }
}
