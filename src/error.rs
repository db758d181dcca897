//! Error type shared by the integral engine.
use std::{io, result};
use bincode;
use serde_yaml;
use super::orbital::OrbitalKey;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// Quantum numbers do not describe a bound Dirac orbital.
        InvalidOrbital(pqn: i32, kappa: i32) {
            display("invalid orbital: pqn = {}, kappa = {}", pqn, kappa)
        }
        /// Spectroscopic label could not be parsed.
        ParseOrbital(label: String) {
            display("cannot parse orbital label: {:?}", label)
        }
        /// Orbital is not in the registered state set.  Indicates that the
        /// caller and the integral store have gone out of sync.
        UnknownOrbital(key: OrbitalKey) {
            display("orbital {} is not registered", key)
        }
        /// No wavefunction data for an orbital that is listed in a set.
        MissingOrbital(key: OrbitalKey) {
            display("no wavefunction for orbital {}", key)
        }
        /// An integral was requested that the preceding update never stored.
        CacheMiss(what: String) {
            display("integral not in cache: {}", what)
        }
        MultipoleTooLarge(k: i32) {
            display("multipole k = {} is outside the supported range", k)
        }
        MissingValenceEnergy(kappa: i32) {
            display("no reference energy for kappa = {}", kappa)
        }
        InvalidOrbitalSets(what: String) {
            display("inconsistent orbital sets: {}", what)
        }
        BadSigmaFile(what: String) {
            display("malformed sigma file: {}", what)
        }
        Io(err: io::Error) {
            from()
            display("I/O error: {}", err)
            source(err)
        }
        Bincode(err: bincode::Error) {
            from()
            display("bincode error: {}", err)
        }
        Yaml(err: serde_yaml::Error) {
            from()
            display("YAML error: {}", err)
            source(err)
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
