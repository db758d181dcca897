//! Physical constants.
//!
//! Atomic units are used throughout (ħ = mₑ = e = 1).

/// Fine-structure constant α (CODATA 2018)
pub const ALPHA: f64 = 7.2973525693e-3;

/// Hartree energy /(cm⁻¹)
pub const HARTREE_INV_CM: f64 = 219474.6313632;

/// Constants handed to the engine explicitly, so that tests can inject their
/// own values (e.g. the nonrelativistic limit `alpha → 0`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysConsts {
    pub alpha: f64,
    pub hartree_inv_cm: f64,
}

impl Default for PhysConsts {
    fn default() -> Self {
        Self {
            alpha: ALPHA,
            hartree_inv_cm: HARTREE_INV_CM,
        }
    }
}

impl PhysConsts {
    /// Convert an energy in Hartree to cm⁻¹.
    #[inline]
    pub fn to_inv_cm(&self, energy: f64) -> f64 {
        energy * self.hartree_inv_cm
    }
}
