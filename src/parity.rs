//! Parity data type.
//!
//! Besides spatial parity of orbitals, `Parity` doubles as the sign of a
//! permutation: `Odd` means an odd number of transpositions.
use std::ops::{Add, Rem};
use num::{One, Zero};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    #[inline]
    pub fn of<T: Rem<Output = T> + Zero + One>(i: T) -> Self {
        if (i % (T::one() + T::one())).is_zero() {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// `+1` or `−1`.
    #[inline]
    pub fn sign_f64(self) -> f64 {
        match self {
            Parity::Even => 1.0,
            Parity::Odd => -1.0,
        }
    }
}

impl From<Parity> for i32 {
    #[inline]
    fn from(p: Parity) -> Self {
        match p {
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }
}

impl Add for Parity {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self::Output {
        let p1: i32 = self.into();
        let p2: i32 = other.into();
        Parity::of(p1 ^ p2)
    }
}

/// Sort two elements, returning the parity of the permutation applied.
#[inline]
pub fn sort2<T: Ord>(a: T, b: T) -> (Parity, T, T) {
    if b < a {
        (Parity::Odd, b, a)
    } else {
        (Parity::Even, a, b)
    }
}
