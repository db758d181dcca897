#[macro_use]
extern crate relmbpt;

mod common;

use relmbpt::integrals::{Conf, DirectIntegrals, RadialIntegralCache,
                         TwoBodyIntegrals};
use relmbpt::ode::LocalOperator;
use relmbpt::orbital_manager::OrbitalManager;
use relmbpt::phys_consts::PhysConsts;
use relmbpt::utils::Toler;
use common::{key, orbital, toy_atom};

const TOLER: Toler = Toler { relerr: 1e-10, abserr: 1e-14 };

fn hamiltonian(m: &OrbitalManager) -> LocalOperator {
    LocalOperator::nuclear(m.lattice().clone(), 3.0, &PhysConsts::default())
}

#[test]
fn test_two_electron_symmetry_and_direct_agreement() {
    let m = toy_atom();
    let h = hamiltonian(&m);
    let mut cache = RadialIntegralCache::new(Conf::default());
    cache.update(&m, &h).unwrap();
    let direct = DirectIntegrals::new(&m, &h, 0.0);

    let quads = [
        (0, "2s", "2s", "3s", "3s"),
        (0, "2s", "2p-", "3s", "3p-"),
        (1, "2s", "2s", "2p-", "2p-"),
        (1, "2p-", "2s", "3s", "2p+"),
        (2, "2p-", "2p-", "2p+", "2p+"),
    ];
    for &(k, i, j, l, m_) in &quads {
        let (i, j, l, m_) = (key(i), key(j), key(l), key(m_));
        let value = cache.get_two_electron(k, i, j, l, m_).unwrap();
        for &(a, b, c, d) in &[(i, j, l, m_), (l, j, i, m_), (i, m_, l, j),
                               (l, m_, i, j), (j, i, m_, l), (m_, i, j, l),
                               (j, l, m_, i), (m_, l, j, i)] {
            assert_eq!(cache.get_two_electron(k, a, b, c, d).unwrap(), value);
        }
        toler_assert_eq!(TOLER, value,
                         direct.two_body(k, i, j, l, m_).unwrap());
    }
}

#[test]
fn test_update_is_idempotent() {
    let m = toy_atom();
    let h = hamiltonian(&m);
    let mut cache = RadialIntegralCache::new(Conf::default());
    cache.update(&m, &h).unwrap();
    let sizes = (cache.len_one_electron(), cache.len_two_electron());
    let (s2, s3) = (key("2s"), key("3s"));
    let h23 = cache.get_one_electron(s2, s3).unwrap();
    let r = cache.get_two_electron(0, s2, s2, s3, s3).unwrap();

    cache.update(&m, &h).unwrap();
    assert_eq!((cache.len_one_electron(), cache.len_two_electron()), sizes);
    assert_eq!(cache.get_one_electron(s3, s2).unwrap(), h23);
    assert_eq!(cache.get_two_electron(0, s2, s2, s3, s3).unwrap(), r);
}

#[test]
fn test_storage_size_estimate() {
    let m = toy_atom();
    let mut cache = RadialIntegralCache::new(Conf {
        nuclear_inverse_mass: 1e-3,
        ..Default::default()
    });
    let estimate = cache.storage_size_estimate(&m).unwrap();
    assert!(cache.index().is_empty());
    assert_eq!(cache.len_two_electron(), 0);

    cache.update(&m, &hamiltonian(&m)).unwrap();
    assert_eq!(estimate.one_electron, cache.len_one_electron());
    assert_eq!(estimate.sms, cache.len_sms());
    assert_eq!(estimate.two_electron, cache.len_two_electron());
    assert_eq!(estimate.total(), estimate.one_electron + estimate.sms
               + estimate.two_electron);
    assert!(estimate.two_electron > 0);
}

#[test]
fn test_extension_keeps_existing_values() {
    let lattice = common::lattice();
    let mut m = OrbitalManager::new(lattice.clone());
    m.insert_core(orbital(&lattice, "1s", -2.0));
    for &(label, energy) in &[("2s", -0.25), ("2p-", -0.20), ("3s", -0.10)] {
        m.insert_excited(orbital(&lattice, label, energy));
    }
    m.set_valence(vec![key("2s"), key("2p-")]).unwrap();
    m.set_high_to_complement();

    let h = hamiltonian(&m);
    let mut cache = RadialIntegralCache::new(Conf::default());
    cache.update(&m, &h).unwrap();
    let (s2, s3) = (key("2s"), key("3s"));
    let r = cache.get_two_electron(0, s2, s2, s3, s3).unwrap();
    let before = cache.len_two_electron();
    let index = cache.index().index(s3).unwrap();

    m.insert_excited(orbital(&lattice, "3p-", -0.08));
    m.set_high_to_complement();
    cache.update(&m, &h).unwrap();
    assert!(cache.len_two_electron() > before);
    assert_eq!(cache.get_two_electron(0, s2, s2, s3, s3).unwrap(), r);
    assert_eq!(cache.index().index(s3).unwrap(), index);
    assert!(cache.get_two_electron(1, s2, key("2p-"), key("3p-"), s2).is_ok());
}

#[test]
fn test_sms_antisymmetry_and_valence_term() {
    let m = toy_atom();
    let h = hamiltonian(&m);
    let lambda = 1e-3;
    let mut cache = RadialIntegralCache::new(Conf {
        nuclear_inverse_mass: lambda,
        ..Default::default()
    });
    cache.update(&m, &h).unwrap();
    let (s2, p2, s3) = (key("2s"), key("2p-"), key("3s"));
    let p = cache.get_sms(s2, p2).unwrap();
    assert!(p != 0.0);
    assert_eq!(cache.get_sms(p2, s2).unwrap(), -p);
    assert_eq!(cache.get_sms(s2, s3).unwrap(), 0.0);

    let coulomb = cache.get_two_electron(1, s2, p2, p2, s2).unwrap();
    cache.set_include_valence_sms(true);
    let full = cache.get_two_electron(1, s2, p2, p2, s2).unwrap();
    let term = -lambda * cache.get_sms(s2, p2).unwrap()
        * cache.get_sms(p2, s2).unwrap();
    toler_assert_eq!(Toler { relerr: 1e-10, abserr: 1e-18 },
                     full - coulomb, term);
    assert_eq!(cache.lookup_two_electron(1, s2, p2, p2, s2).unwrap(),
               Some(coulomb));
    // only dipole integrals carry the SMS
    assert_eq!(cache.get_two_electron(0, s2, s2, s3, s3).unwrap(),
               cache.lookup_two_electron(0, s2, s2, s3, s3).unwrap().unwrap());
}

#[test]
fn test_get_or_compute_fills_the_cache() {
    let m = toy_atom();
    let h = hamiltonian(&m);
    let mut cache = RadialIntegralCache::new(Conf::default());
    cache.register(&m);
    let (s1, s3) = (key("1s"), key("3s"));
    assert!(cache.get_two_electron(0, s1, s1, s3, s3).is_err());
    let value = cache.get_or_compute_two_electron(&m, 0, s3, s1, s3, s1)
        .unwrap();
    assert_eq!(cache.len_two_electron(), 1);
    assert_eq!(cache.get_two_electron(0, s1, s3, s1, s3).unwrap(), value);
    let direct = DirectIntegrals::new(&m, &h, 0.0);
    toler_assert_eq!(TOLER, value, direct.two_body(0, s1, s3, s1, s3).unwrap());
}

#[test]
fn test_storage_size_estimate_leaves_a_filled_cache_alone() {
    let m = toy_atom();
    let mut cache = RadialIntegralCache::new(Conf {
        nuclear_inverse_mass: 1e-3,
        ..Default::default()
    });
    cache.update(&m, &hamiltonian(&m)).unwrap();
    let index = cache.index().clone();
    let keys: Vec<_> = (0 .. index.len() as u32)
        .map(|i| index.key(i).unwrap())
        .collect();
    let snapshot = |cache: &RadialIntegralCache| {
        let mut values = Vec::new();
        for &a in &keys {
            for &b in &keys {
                values.push(cache.lookup_one_electron(a, b).unwrap());
                values.push(Some(cache.get_sms(a, b).unwrap_or(0.0)));
                for &c in &keys {
                    for &d in &keys {
                        for k in 0 .. 3 {
                            values.push(cache.lookup_two_electron(k, a, b, c, d)
                                        .unwrap());
                        }
                    }
                }
            }
        }
        values
    };
    let before = snapshot(&cache);
    let counts = (cache.len_one_electron(), cache.len_sms(),
                  cache.len_two_electron());

    for _ in 0 .. 2 {
        let estimate = cache.storage_size_estimate(&m).unwrap();
        assert_eq!((estimate.one_electron, estimate.sms, estimate.two_electron),
                   counts);
        assert_eq!((cache.len_one_electron(), cache.len_sms(),
                    cache.len_two_electron()), counts);
        assert_eq!(cache.index(), &index);
    }
    assert_eq!(snapshot(&cache), before);
}

#[test]
fn test_valence_sms_skips_core_states() {
    let m = toy_atom();
    let h = hamiltonian(&m);
    let mut cache = RadialIntegralCache::new(Conf {
        include_valence_sms: true,
        nuclear_inverse_mass: 1e-3,
        ..Default::default()
    });
    cache.update(&m, &h).unwrap();
    let (s1, s2, p2) = (key("1s"), key("2s"), key("2p-"));
    assert!(cache.get_sms(s1, p2).is_err());
    assert!(cache.get_sms(p2, s2).unwrap() != 0.0);

    let value = cache.get_or_compute_two_electron(&m, 1, s1, p2, p2, s2)
        .unwrap();
    let coulomb = cache.lookup_two_electron(1, s1, p2, p2, s2).unwrap();
    assert_eq!(Some(value), coulomb);
    assert_eq!(cache.get_two_electron(1, p2, s1, s2, p2).unwrap(), value);
}
