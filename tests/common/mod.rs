//! Toy atom shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use relmbpt::lattice::Lattice;
use relmbpt::orbital::{Orbital, OrbitalKey};
use relmbpt::orbital_manager::OrbitalManager;
use relmbpt::phys_consts::PhysConsts;
use relmbpt::spinor::Spinor;

pub fn key(label: &str) -> OrbitalKey {
    label.parse().unwrap()
}

pub fn lattice() -> Arc<Lattice> {
    Arc::new(Lattice::exponential(200, 1e-3, 0.05))
}

/// Normalized nodeless orbital `r^(l+1) exp(−2r/n)` with the small
/// component in the Pauli approximation.
pub fn orbital(lattice: &Lattice, label: &str, energy: f64) -> Orbital {
    let key = key(label);
    let n = key.pqn() as f64;
    let kappa = key.kappa() as f64;
    let alpha = PhysConsts::default().alpha;
    let f: Vec<f64> = lattice.r().iter()
        .map(|&r| r.powi(key.l() + 1) * (-2.0 * r / n).exp())
        .collect();
    let dfdr = lattice.derivative(&f);
    let g = f.iter().zip(&dfdr).zip(lattice.r())
        .map(|((f, df), r)| 0.5 * alpha * (df + kappa * f / r))
        .collect();
    let mut orbital = Orbital::new(
        key, energy, Spinor::from_components(key.kappa(), f, g, lattice));
    orbital.renormalise(lattice, 1.0);
    orbital
}

/// Core `1s`, valence `2s 2p-`, high `2p+ 3s 3p-`.
pub fn toy_atom() -> OrbitalManager {
    let lattice = lattice();
    let mut m = OrbitalManager::new(lattice.clone());
    m.insert_core(orbital(&lattice, "1s", -2.0));
    for &(label, energy) in &[("2s", -0.25), ("2p-", -0.20), ("2p+", -0.19),
                              ("3s", -0.10), ("3p-", -0.08)] {
        m.insert_excited(orbital(&lattice, label, energy));
    }
    m.set_valence(vec![key("2s"), key("2p-")]).unwrap();
    m.set_high_to_complement();
    m
}

/// Orbitals that only carry a label and an energy.
pub fn bare_orbital(label: &str, energy: f64) -> Orbital {
    let key = key(label);
    Orbital::new(key, energy, Spinor::new(key.kappa(), 4))
}
