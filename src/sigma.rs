//! Nonlocal correlation ("sigma") potentials.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use bincode;
use super::ang_mom::{k_range, Recoupler};
use super::coulomb::CoulombIntegrator;
use super::denom::ValenceDenominators;
use super::error::{Error, Result};
use super::half::Half;
use super::io::{read_header, write_header};
use super::lattice::Lattice;
use super::orbital::l_of_kappa;
use super::orbital_manager::OrbitalManager;
use super::spinor::Spinor;

const SIGMA_MAGIC: &[u8; 8] = b"RMBPTSIG";
const SIGMA_VERSION: u32 = 1;

/// Nonlocal potential `Σ(r_i, r_j)` over the first `size` lattice points
/// of a single κ channel.
///
/// The upper–upper block is always present.  The upper–lower and
/// lower–lower blocks are optional; when absent they are treated as zero.
/// Blocks are stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigmaPotential {
    size: usize,
    ff: Vec<f64>,
    fg: Option<Vec<f64>>,
    gg: Option<Vec<f64>>,
}

impl SigmaPotential {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ff: vec![0.0; size * size],
            fg: None,
            gg: None,
        }
    }

    /// Allocate (or drop) the blocks that involve the lower component.
    pub fn include_lower(&mut self, use_fg: bool, use_gg: bool) {
        let n = self.size * self.size;
        match (use_fg, self.fg.is_some()) {
            (true, false) => self.fg = Some(vec![0.0; n]),
            (false, true) => self.fg = None,
            _ => {}
        }
        match (use_gg, self.gg.is_some()) {
            (true, false) => self.gg = Some(vec![0.0; n]),
            (false, true) => self.gg = None,
            _ => {}
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn ff(&self, i: usize, j: usize) -> f64 {
        self.ff[i * self.size + j]
    }

    #[inline]
    pub fn fg(&self, i: usize, j: usize) -> f64 {
        self.fg.as_ref().map(|m| m[i * self.size + j]).unwrap_or(0.0)
    }

    #[inline]
    pub fn gg(&self, i: usize, j: usize) -> f64 {
        self.gg.as_ref().map(|m| m[i * self.size + j]).unwrap_or(0.0)
    }

    /// `Σ += c |u><u|` for `u = (u_f, u_g)`; entries beyond `size` are
    /// ignored.
    pub fn add_product(&mut self, c: f64, u_f: &[f64], u_g: &[f64]) {
        let n = self.size;
        let nf = u_f.len().min(n);
        let ng = u_g.len().min(n);
        for i in 0 .. nf {
            let row = &mut self.ff[i * n .. i * n + nf];
            for (x, &uj) in row.iter_mut().zip(&u_f[.. nf]) {
                *x += c * u_f[i] * uj;
            }
        }
        if let Some(fg) = self.fg.as_mut() {
            for i in 0 .. nf {
                let row = &mut fg[i * n .. i * n + ng];
                for (x, &uj) in row.iter_mut().zip(&u_g[.. ng]) {
                    *x += c * u_f[i] * uj;
                }
            }
        }
        if let Some(gg) = self.gg.as_mut() {
            for i in 0 .. ng {
                let row = &mut gg[i * n .. i * n + ng];
                for (x, &uj) in row.iter_mut().zip(&u_g[.. ng]) {
                    *x += c * u_g[i] * uj;
                }
            }
        }
    }

    /// `Σ |s>`, sampled on `size` points.  Components of `s` beyond `size`
    /// are ignored and missing ones are treated as zero.  Derivatives of
    /// the result are left at zero.
    pub fn apply_to(&self, s: &Spinor, lattice: &Lattice) -> Spinor {
        let n = self.size;
        let m = n.min(s.size());
        let dr = lattice.dr();
        let wf: Vec<f64> = (0 .. m).map(|j| s.f[j] * dr[j]).collect();
        let wg: Vec<f64> = (0 .. m).map(|j| s.g[j] * dr[j]).collect();
        let mut out = Spinor::new(s.kappa, n);
        for i in 0 .. n {
            let row = &self.ff[i * n .. i * n + m];
            out.f[i] = row.iter().zip(&wf).map(|(a, b)| a * b).sum();
        }
        if let Some(fg) = self.fg.as_ref() {
            for i in 0 .. n {
                let row = &fg[i * n .. i * n + m];
                out.f[i] += row.iter().zip(&wg).map(|(a, b)| a * b).sum::<f64>();
            }
            // transposed block acts on f to give the lower component
            for j in 0 .. m {
                let row = &fg[j * n .. j * n + n];
                for (o, &x) in out.g.iter_mut().zip(row) {
                    *o += x * wf[j];
                }
            }
        }
        if let Some(gg) = self.gg.as_ref() {
            for i in 0 .. n {
                let row = &gg[i * n .. i * n + m];
                out.g[i] += row.iter().zip(&wg).map(|(a, b)| a * b).sum::<f64>();
            }
        }
        out
    }

    /// `<a|Σ|b>`
    pub fn matrix_element(&self, a: &Spinor, b: &Spinor, lattice: &Lattice)
                          -> f64 {
        a.overlap(&self.apply_to(b, lattice), lattice)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        write_header(&mut w, SIGMA_MAGIC, SIGMA_VERSION)?;
        bincode::serialize_into(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut r = BufReader::new(File::open(path)?);
        let version = read_header(&mut r, SIGMA_MAGIC)?;
        if version != SIGMA_VERSION {
            return Err(Error::BadSigmaFile(
                format!("unsupported version {}", version)));
        }
        let sigma: Self = bincode::deserialize_from(&mut r)?;
        let n = sigma.size.checked_mul(sigma.size).ok_or_else(|| {
            Error::BadSigmaFile(format!("size {} is too large", sigma.size))
        })?;
        let bad_block = |m: &Option<Vec<f64>>| {
            m.as_ref().map(|m| m.len() != n).unwrap_or(false)
        };
        if sigma.ff.len() != n || bad_block(&sigma.fg) || bad_block(&sigma.gg) {
            return Err(Error::BadSigmaFile(
                format!("block sizes do not match size {}", sigma.size)));
        }
        Ok(sigma)
    }
}

/// Something that can fill in the second-order sigma potential of a channel.
pub trait SigmaCalculator {
    fn second_order_sigma(&self, kappa: i32, sigma: &mut SigmaPotential)
                          -> Result<()>;
}

/// Direct second-order core-polarization diagram:
///
/// ```text
/// Σ(r₁, r₂) = ∑[n α β k] C ψ_α(r₁) y^k_nβ(r₁) ψ_α(r₂) y^k_nβ(r₂)
///                        / (E_v − E_α − E_β + E_n + δ)
///
/// C = (2 j_n + 1) (2 j_α + 1) (2 j_β + 1) / (2 k + 1)
///     × (j_v j_α k; ½ −½ 0)² (j_n j_β k; ½ −½ 0)²
/// ```
///
/// with `n` in the core, `α`, `β` excited and `E_v` the valence energy of
/// the channel.
pub struct CorePolarizationSigma<'a, R> {
    orbitals: &'a OrbitalManager,
    denominators: &'a ValenceDenominators,
    coulomb: CoulombIntegrator,
    recoupler: R,
    delta: f64,
}

impl<'a, R: Recoupler> CorePolarizationSigma<'a, R> {
    pub fn new(
        orbitals: &'a OrbitalManager,
        denominators: &'a ValenceDenominators,
        recoupler: R,
        delta: f64,
    ) -> Self {
        Self {
            orbitals,
            denominators,
            coulomb: CoulombIntegrator::new(orbitals.lattice().clone()),
            recoupler,
            delta,
        }
    }
}

impl<'a, R: Recoupler> SigmaCalculator for CorePolarizationSigma<'a, R> {
    fn second_order_sigma(&self, kappa: i32, sigma: &mut SigmaPotential)
                          -> Result<()> {
        let e_v = self.denominators.valence_energy(kappa)?;
        let j_v = Half(2 * kappa.abs() - 1);
        let l_v = l_of_kappa(kappa);
        let size = sigma.size();

        for &n in self.orbitals.core() {
            let orb_n = self.orbitals.get(n)?;
            for &beta in self.orbitals.excited() {
                let orb_beta = self.orbitals.get(beta)?;
                let density = self.coulomb.density(&orb_n.spinor,
                                                   &orb_beta.spinor);
                for k in k_range(n, beta) {
                    let c_nb = self.recoupler.electron_3j(n.j(), beta.j(), k);
                    if c_nb == 0.0 {
                        continue;
                    }
                    let pot = self.coulomb.potential(&density, k, size);
                    for &alpha in self.orbitals.excited() {
                        if (l_v + alpha.l() + k) % 2 != 0 {
                            continue;
                        }
                        let c_va = self.recoupler.electron_3j(j_v, alpha.j(), k);
                        if c_va == 0.0 {
                            continue;
                        }
                        let orb_alpha = self.orbitals.get(alpha)?;
                        let coeff = (n.two_j() + 1) as f64
                            * (alpha.two_j() + 1) as f64
                            * (beta.two_j() + 1) as f64
                            / (2 * k + 1) as f64
                            * (c_va * c_nb).powi(2)
                            / (e_v - orb_alpha.energy - orb_beta.energy
                               + orb_n.energy + self.delta);
                        let m = pot.len().min(orb_alpha.size());
                        let u_f: Vec<_> = (0 .. m)
                            .map(|i| orb_alpha.spinor.f[i] * pot[i])
                            .collect();
                        let u_g: Vec<_> = (0 .. m)
                            .map(|i| orb_alpha.spinor.g[i] * pot[i])
                            .collect();
                        sigma.add_product(coeff, &u_f, &u_g);
                    }
                }
            }
        }
        Ok(())
    }
}
