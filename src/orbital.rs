//! Single-particle orbital labels and data.
use std::{fmt, str};
use regex::Regex;
use super::error::{Error, Result};
use super::half::Half;
use super::lattice::Lattice;
use super::parity::Parity;
use super::spinor::Spinor;

/// Spectroscopic letters for the orbital angular momentum.
const ORB_ANG_LETTERS: &str = "spdfghiklmnoqrtuvwxyz";

/// Orbital angular momentum of the upper component for a given κ.
#[inline]
pub fn l_of_kappa(kappa: i32) -> i32 {
    if kappa > 0 {
        kappa
    } else {
        -kappa - 1
    }
}

/// Principal quantum number and relativistic angular quantum number κ.
///
/// The ordering is by `(pqn, kappa)` and is relied upon for map keys and
/// for the storage order of integrals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
         Serialize, Deserialize)]
pub struct OrbitalKey {
    pqn: i32,
    kappa: i32,
}

impl OrbitalKey {
    pub fn new(pqn: i32, kappa: i32) -> Result<Self> {
        let key = Self { pqn, kappa };
        if pqn < 1 || kappa == 0 || key.l() >= pqn {
            return Err(Error::InvalidOrbital(pqn, kappa));
        }
        Ok(key)
    }

    #[inline]
    pub fn pqn(self) -> i32 {
        self.pqn
    }

    #[inline]
    pub fn kappa(self) -> i32 {
        self.kappa
    }

    /// Orbital angular momentum of the upper component.
    #[inline]
    pub fn l(self) -> i32 {
        l_of_kappa(self.kappa)
    }

    /// Orbital angular momentum of the lower component.
    #[inline]
    pub fn l_prime(self) -> i32 {
        if self.kappa < 0 {
            -self.kappa
        } else {
            self.kappa - 1
        }
    }

    #[inline]
    pub fn j(self) -> Half<i32> {
        Half(self.two_j())
    }

    #[inline]
    pub fn two_j(self) -> i32 {
        2 * self.kappa.abs() - 1
    }

    #[inline]
    pub fn max_num_electrons(self) -> i32 {
        2 * self.kappa.abs()
    }

    #[inline]
    pub fn parity(self) -> Parity {
        Parity::of(self.l())
    }
}

/// Spectroscopic notation, e.g. `4s`, `4p-` (κ = 1), `4p+` (κ = −2).
impl fmt::Display for OrbitalKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let letter = ORB_ANG_LETTERS.chars().nth(self.l() as usize)
            .unwrap_or('?');
        write!(f, "{}{}", self.pqn, letter)?;
        if self.kappa > 0 {
            write!(f, "-")
        } else if self.kappa < -1 {
            write!(f, "+")
        } else {
            Ok(())
        }
    }
}

impl str::FromStr for OrbitalKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::ParseOrbital(s.to_owned());
        let m = re!(r"^(\d+)([a-z])([+-]?)$").captures(s.trim())
            .ok_or_else(bad)?;
        let pqn: i32 = m[1].parse().map_err(|_| bad())?;
        let letter = m[2].chars().next().ok_or_else(bad)?;
        let l = ORB_ANG_LETTERS.find(letter).ok_or_else(bad)? as i32;
        let kappa = match (&m[3], l) {
            ("", 0) => -1,
            ("-", l) if l > 0 => l,
            ("+", l) if l > 0 => -l - 1,
            _ => return Err(bad()),
        };
        OrbitalKey::new(pqn, kappa)
    }
}

/// An orbital: label, eigenvalue, occupancy and wavefunction.
///
/// The integral engine treats orbitals as immutable snapshots; replacing one
/// invalidates any integrals computed from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Orbital {
    key: OrbitalKey,
    pub energy: f64,
    pub occupancy: f64,
    pub spinor: Spinor,
}

impl Orbital {
    /// The occupancy defaults to a closed shell.
    pub fn new(key: OrbitalKey, energy: f64, spinor: Spinor) -> Self {
        assert_eq!(key.kappa(), spinor.kappa, "kappa mismatch");
        Self {
            key,
            energy,
            occupancy: key.max_num_electrons() as f64,
            spinor,
        }
    }

    #[inline]
    pub fn key(&self) -> OrbitalKey {
        self.key
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.spinor.size()
    }

    /// `∫ (f² + g²) dr`
    pub fn norm(&self, lattice: &Lattice) -> f64 {
        self.spinor.overlap(&self.spinor, lattice)
    }

    pub fn renormalise(&mut self, lattice: &Lattice, norm: f64) {
        let current = self.norm(lattice);
        if current > 0.0 {
            self.spinor *= (norm / current).sqrt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantum_numbers() {
        let s = OrbitalKey::new(4, -1).unwrap();
        assert_eq!((s.l(), s.l_prime(), s.two_j()), (0, 1, 1));
        let p1 = OrbitalKey::new(4, 1).unwrap();
        assert_eq!((p1.l(), p1.l_prime(), p1.two_j()), (1, 0, 1));
        let d5 = OrbitalKey::new(3, -3).unwrap();
        assert_eq!((d5.l(), d5.j(), d5.max_num_electrons()), (2, Half(5), 6));
        assert_eq!(d5.parity(), Parity::Even);
        assert!(OrbitalKey::new(1, 1).is_err());
        assert!(OrbitalKey::new(2, 0).is_err());
        assert!(OrbitalKey::new(0, -1).is_err());
    }

    #[test]
    fn test_ordering() {
        let a = OrbitalKey::new(3, -1).unwrap();
        let b = OrbitalKey::new(3, 1).unwrap();
        let c = OrbitalKey::new(4, -2).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_labels() {
        for &(label, pqn, kappa) in &[("4s", 4, -1), ("4p-", 4, 1),
                                       ("4p+", 4, -2), ("3d-", 3, 2),
                                       ("5f+", 5, -4)] {
            let key: OrbitalKey = label.parse().unwrap();
            assert_eq!(key, OrbitalKey::new(pqn, kappa).unwrap());
            assert_eq!(key.to_string(), label);
        }
        assert!("4s+".parse::<OrbitalKey>().is_err());
        assert!("2d-".parse::<OrbitalKey>().is_err());
        assert!("p".parse::<OrbitalKey>().is_err());
    }
}
