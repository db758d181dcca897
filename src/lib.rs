//! Radial integral engine for second-order many-body perturbation theory
//! of relativistic atoms.
//!
//! The pieces are:
//!
//!   - [`state_index`](state_index/index.html): dense indices and canonical
//!     orderings of stored integrals,
//!   - [`coulomb`](coulomb/index.html): radial Coulomb potentials and Slater
//!     integrals on a [`Lattice`](lattice/struct.Lattice.html),
//!   - [`integrals`](integrals/index.html): the cache of one- and
//!     two-electron radial integrals,
//!   - [`mbpt`](mbpt/index.html): second-order diagram summation,
//!   - [`ode`](ode/index.html) and [`brueckner`](brueckner/index.html):
//!     mean-field operators decorated with a sigma potential.
extern crate bincode;
extern crate byteorder;
extern crate conv;
extern crate fnv;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate num;
#[macro_use]
extern crate quick_error;
#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate rand_xorshift;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_yaml;
extern crate wigner_symbols;

#[macro_use]
mod macros;

pub mod ang_mom;
pub mod brueckner;
pub mod coulomb;
pub mod denom;
pub mod error;
pub mod half;
pub mod integrals;
pub mod io;
pub mod lattice;
pub mod mbpt;
pub mod ode;
pub mod orbital;
pub mod orbital_manager;
pub mod parity;
pub mod phys_consts;
pub mod sigma;
pub mod spinor;
pub mod state_index;
pub mod utils;

pub use error::{Error, Result};
