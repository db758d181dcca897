extern crate bincode;
extern crate env_logger;
#[macro_use]
extern crate relmbpt;

mod common;

use std::cell::Cell;
use std::env;
use std::fs::{self, File};
use relmbpt::ang_mom::{k_range, Recoupler, WignerCtx};
use relmbpt::brueckner::{sigma_path, BruecknerModifier};
use relmbpt::coulomb::CoulombIntegrator;
use relmbpt::denom::ValenceDenominators;
use relmbpt::error::Result;
use relmbpt::io::write_header;
use relmbpt::ode::{DecoratedOperator, LocalOperator, SpinorOperator};
use relmbpt::phys_consts::PhysConsts;
use relmbpt::sigma::{CorePolarizationSigma, SigmaCalculator, SigmaPotential};
use relmbpt::utils::Toler;
use common::{key, toy_atom};

const DELTA: f64 = 1e-6;

struct Counting<'a, C: 'a> {
    inner: &'a C,
    calls: Cell<usize>,
}

impl<'a, C: SigmaCalculator> SigmaCalculator for Counting<'a, C> {
    fn second_order_sigma(&self, kappa: i32, sigma: &mut SigmaPotential)
                          -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.inner.second_order_sigma(kappa, sigma)
    }
}

#[test]
fn test_core_polarization_matches_direct_sum() {
    let m = toy_atom();
    let lattice = m.lattice();
    let den = ValenceDenominators::new(&m, 0.0).unwrap();
    let calc = CorePolarizationSigma::new(&m, &den, WignerCtx::default(),
                                          DELTA);
    let mut sigma = SigmaPotential::new(lattice.size());
    sigma.include_lower(true, true);
    calc.second_order_sigma(-1, &mut sigma).unwrap();

    let v = m.get(key("2s")).unwrap();
    let e_v = den.valence_energy(-1).unwrap();
    let coulomb = CoulombIntegrator::new(lattice.clone());
    let w = WignerCtx::default();
    let mut expected = 0.0;
    for &n in m.core() {
        for &beta in m.excited() {
            for k in k_range(n, beta) {
                for &alpha in m.excited() {
                    if (v.key().l() + alpha.l() + k) % 2 != 0 {
                        continue;
                    }
                    let c = w.electron_3j(v.key().j(), alpha.j(), k)
                        * w.electron_3j(n.j(), beta.j(), k);
                    let (on, oa, ob) = (m.get(n).unwrap(), m.get(alpha).unwrap(),
                                        m.get(beta).unwrap());
                    let coeff = ((n.two_j() + 1) * (alpha.two_j() + 1)
                                 * (beta.two_j() + 1)) as f64
                        / (2 * k + 1) as f64 * c * c
                        / (e_v - oa.energy - ob.energy + on.energy + DELTA);
                    let r = coulomb.slater(k, &v.spinor, &on.spinor,
                                           &oa.spinor, &ob.spinor);
                    expected += coeff * r * r;
                }
            }
        }
    }
    assert!(expected < 0.0);
    toler_assert_eq!(Toler { relerr: 1e-9, abserr: 1e-16 },
                     sigma.matrix_element(&v.spinor, &v.spinor, lattice),
                     expected);
}

#[test]
fn test_sigma_is_computed_once_per_channel() {
    let _ = env_logger::builder().is_test(true).try_init();
    let m = toy_atom();
    let den = ValenceDenominators::new(&m, 0.0).unwrap();
    let inner = CorePolarizationSigma::new(&m, &den, WignerCtx::default(),
                                           DELTA);
    let calc = Counting { inner: &inner, calls: Cell::new(0) };
    let mut modifier = BruecknerModifier::new(m.lattice().clone(), 150,
                                              &PhysConsts::default());
    modifier.calculate_sigma(-1, &calc).unwrap();
    let first = modifier.sigma(-1).unwrap().clone();
    modifier.calculate_sigma(-1, &calc).unwrap();
    assert_eq!(calc.calls.get(), 1);
    assert_eq!(modifier.sigma(-1), Some(&first));
    assert_eq!(first.size(), 150);
}

#[test]
fn test_sigma_file_round_trip() {
    let m = toy_atom();
    let lattice = m.lattice();
    let consts = PhysConsts::default();
    let den = ValenceDenominators::new(&m, 0.0).unwrap();
    let calc = CorePolarizationSigma::new(&m, &den, WignerCtx::default(),
                                          DELTA);
    let identifier = env::temp_dir()
        .join(format!("relmbpt-round-trip-{}", std::process::id()));
    let identifier = identifier.to_str().unwrap();

    let mut written = BruecknerModifier::new(lattice.clone(), lattice.size(),
                                             &consts)
        .include_lower(true, false)
        .with_lambda(0.9);
    written.calculate_sigma(-1, &calc).unwrap();
    written.write(identifier, -1).unwrap();
    let mut read = BruecknerModifier::new(lattice.clone(), lattice.size(),
                                          &consts)
        .with_lambda(0.9);
    assert!(read.read(identifier, -1));
    assert!(!read.read(identifier, 1));
    fs::remove_file(sigma_path(identifier, -1)).unwrap();
    assert_eq!(read.sigma(-1), written.sigma(-1));

    let v = m.get(key("2s")).unwrap();
    let x = written.extra_nonlocal(&v.spinor, false);
    let base = LocalOperator::nuclear(lattice.clone(), 3.0, &consts);
    let mut a = DecoratedOperator::new(base.clone()).with_modifier(written);
    let mut b = DecoratedOperator::new(base.clone()).with_modifier(read);
    let mut base = base;
    a.set_ode_parameters(v);
    b.set_ode_parameters(v);
    base.set_ode_parameters(v);
    for &i in &[0, 13, 57, 120, 199] {
        assert_eq!(a.ode_function(i, &v.spinor), b.ode_function(i, &v.spinor));
        assert_eq!(a.ode_coefficients(i, &v.spinor),
                   b.ode_coefficients(i, &v.spinor));
        assert_eq!(a.ode_jacobian(i, &v.spinor), b.ode_jacobian(i, &v.spinor));
    }
    assert!(a.ode_function(57, &v.spinor) != base.ode_function(57, &v.spinor));

    let ta = a.apply_to(&v.spinor);
    let ta0 = base.apply_to(&v.spinor);
    for &i in &[5, 80, 150] {
        assert_eq!(ta.f[i], ta0.f[i] - x.f[i]);
        assert_eq!(ta.g[i], ta0.g[i] - x.g[i]);
    }
}

#[test]
fn test_sigma_file_with_huge_size_is_rejected() {
    let m = toy_atom();
    let identifier = env::temp_dir()
        .join(format!("relmbpt-huge-size-{}", std::process::id()));
    let identifier = identifier.to_str().unwrap();
    let path = sigma_path(identifier, -1);
    {
        let mut file = File::create(&path).unwrap();
        write_header(&mut file, b"RMBPTSIG", 1).unwrap();
        // size, ff, fg, gg
        let body: (u64, Vec<f64>, Option<Vec<f64>>, Option<Vec<f64>>) =
            (1 << 33, Vec::new(), None, None);
        bincode::serialize_into(&mut file, &body).unwrap();
    }
    let mut modifier = BruecknerModifier::new(m.lattice().clone(), 10,
                                              &PhysConsts::default());
    assert!(!modifier.read(identifier, -1));
    assert_eq!(modifier.sigma(-1), None);
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_sigma_enters_exchange_and_nonlocal_terms() {
    let m = toy_atom();
    let lattice = m.lattice();
    let consts = PhysConsts::default();
    let den = ValenceDenominators::new(&m, 0.0).unwrap();
    let calc = CorePolarizationSigma::new(&m, &den, WignerCtx::default(),
                                          DELTA);
    let mut modifier = BruecknerModifier::new(lattice.clone(), lattice.size(),
                                              &consts);
    modifier.calculate_sigma(-1, &calc).unwrap();
    let v = m.get(key("2s")).unwrap();
    let x = modifier.extra_nonlocal(&v.spinor, true);

    let mut base = LocalOperator::nuclear(lattice.clone(), 3.0, &consts);
    let mut op = DecoratedOperator::new(base.clone()).with_modifier(modifier);
    base.set_ode_parameters(v);
    op.set_ode_parameters(v);
    assert_eq!(op.exchange(None), x);
    assert_eq!(op.exchange(Some(v)), x);
    assert_eq!(base.exchange(None).size(), 0);

    let w0 = base.ode_function(57, &v.spinor);
    let w = op.ode_function(57, &v.spinor);
    assert_eq!(w[0], w0[0] + consts.alpha * x.g[57]);
    assert_eq!(w[1], w0[1] - consts.alpha * x.f[57]);

    // local-only solve: no sigma in the ODE, but still in the operator
    op.set_include_nonlocal(false);
    assert_eq!(op.ode_function(57, &v.spinor), w0);
    assert_eq!(op.ode_coefficients(57, &v.spinor),
               base.ode_coefficients(57, &v.spinor));
    assert_eq!(op.ode_jacobian(57, &v.spinor),
               base.ode_jacobian(57, &v.spinor));
    let ta = op.apply_to(&v.spinor);
    let ta0 = base.apply_to(&v.spinor);
    assert_eq!(ta.f[80], ta0.f[80] - x.f[80]);
}
