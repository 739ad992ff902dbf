//! Grating equation for a plane-grating monochromator in fixed-focus mode.
//!
//! Energies are in eV, lengths in mm, angles in degrees and groove density
//! coefficients in mm^-1 / mm^-2 / mm^-3 / mm^-4.
//!
//! These functions are the only place the optics are evaluated. Every state
//! update in [`crate::state`] reduces to calls into them.

use pgm_data::{GratingSpec, PgmConfig};

use crate::constants::{ANGSTROM_TO_MM, PLANCK_HC_ANGSTROM};
use crate::error::{PgmError, Result};

/// Photon wavelength in mm for an energy in eV.
pub fn wavelength(e_ph: f64) -> Result<f64> {
    if !e_ph.is_finite() || e_ph <= 0.0 {
        return Err(PgmError::domain(format!(
            "photon energy must be positive, got {e_ph} eV"
        )));
    }
    Ok(PLANCK_HC_ANGSTROM / e_ph * ANGSTROM_TO_MM)
}

/// Fixed-focus constant for a grating at a given photon energy.
///
/// $$c_{ff} = \sqrt{(B_0 + B_1)/B_2}$$
///
/// # Arguments
/// * `e_ph` - Photon energy in eV
/// * `grating` - Grating groove density coefficients
/// * `r1` - Input focal length in mm
/// * `r2` - Output focal length in mm
/// * `m` - Diffraction order
pub fn cff(e_ph: f64, grating: &GratingSpec, r1: f64, r2: f64, m: i32) -> Result<f64> {
    let lambda = wavelength(e_ph)?;
    let mf = m as f64;

    let a0 = mf * lambda * grating.a0;
    if a0 == 0.0 {
        return Err(PgmError::domain(format!(
            "grating '{}' has a zero first-order term (m = {m}, a0 = {})",
            grating.name, grating.a0
        )));
    }
    let a1 = -0.5 * mf * lambda * r2 * grating.a1;
    let ratio = r2 / r1;
    let k = a1 / a0;

    let b2 = -4.0 + a0 * a0 - 4.0 * a1 + 4.0 * k * k;
    let root_arg = (1.0 + ratio).powi(2) + 2.0 * a1 * (1.0 + ratio) - a0 * a0 * ratio;
    if root_arg < 0.0 {
        return Err(PgmError::domain(format!(
            "cff undefined for '{}' at {e_ph} eV: negative discriminant {root_arg}",
            grating.name
        )));
    }
    let b1 = -4.0 * k * root_arg.sqrt();
    let b0 = 2.0 * a1 + 4.0 * k * k + (4.0 + 2.0 * a1 - a0 * a0) * ratio;

    let cff_sq = (b0 + b1) / b2;
    if !cff_sq.is_finite() || cff_sq < 0.0 {
        return Err(PgmError::domain(format!(
            "cff undefined for '{}' at {e_ph} eV: (B0 + B1) / B2 = {cff_sq}",
            grating.name
        )));
    }
    Ok(cff_sq.sqrt())
}

fn checked_asin_deg(arg: f64, what: &str) -> Result<f64> {
    if !(-1.0..=1.0).contains(&arg) {
        return Err(PgmError::domain(format!(
            "{what} unreachable: arcsin argument {arg} outside [-1, 1]"
        )));
    }
    Ok(arg.asin().to_degrees())
}

/// M2 mirror and grating angles (degrees) that deliver `e_ph`.
///
/// When `cff_override` is `None` the fixed-focus constant is computed with
/// [`cff`]; otherwise the given value is used as is.
pub fn angles_from_energy(
    e_ph: f64,
    grating: &GratingSpec,
    config: &PgmConfig,
    cff_override: Option<f64>,
) -> Result<(f64, f64)> {
    let lambda = wavelength(e_ph)?;
    let c = match cff_override {
        Some(c) => c,
        None => cff(e_ph, grating, config.r1, config.r2, config.m)?,
    };
    let denom = c * c - 1.0;
    if !denom.is_finite() || denom == 0.0 {
        return Err(PgmError::domain(format!(
            "cff = {c} makes the grating equation singular"
        )));
    }

    let mla = config.m as f64 * grating.a0 * lambda;
    let alpha = checked_asin_deg(
        -mla / denom + (1.0 + (c * mla / denom).powi(2)).sqrt(),
        "incidence angle",
    )?;
    let beta = checked_asin_deg(mla - alpha.to_radians().sin(), "diffraction angle")?;

    let b = config.b.sign();
    let theta_m2 = (0.5 * (config.x_diff + config.x_inc + b * (180.0 - alpha + beta))).abs();
    let theta_gr = b * (90.0 + beta) + config.x_diff;
    Ok((theta_m2, theta_gr))
}

/// Incidence and diffraction angles (degrees) realised by a mechanical position.
fn grating_angles(theta_m2: f64, theta_gr: f64, config: &PgmConfig) -> (f64, f64) {
    let b = config.b.sign();
    let beta = -90.0 + b * (theta_gr - config.x_diff);
    let alpha = 180.0 + beta + b * (config.x_diff + config.x_inc - 2.0 * theta_m2);
    (alpha, beta)
}

/// Photon energy (eV) diffracted by `grating` at the given M2/grating angles.
pub fn energy_from_angles(
    theta_m2: f64,
    theta_gr: f64,
    grating: &GratingSpec,
    config: &PgmConfig,
) -> Result<f64> {
    let mla = config.m as f64 * grating.a0;
    if mla == 0.0 {
        return Err(PgmError::domain(format!(
            "grating '{}' has a zero first-order term (m = {})",
            grating.name, config.m
        )));
    }
    let (alpha, beta) = grating_angles(theta_m2, theta_gr, config);
    let lambda = (alpha.to_radians().sin() + beta.to_radians().sin()) / mla;
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(PgmError::domain(format!(
            "angles ({theta_m2}, {theta_gr}) give wavelength {lambda} mm on '{}'",
            grating.name
        )));
    }
    Ok(PLANCK_HC_ANGSTROM / lambda * ANGSTROM_TO_MM)
}

/// The fixed-focus constant cos(beta)/cos(alpha) realised by a mechanical position.
///
/// Equal to [`cff`] right after an energy move; differs from it after a
/// grating change, since the mirrors stay where they were.
pub fn implied_cff(theta_m2: f64, theta_gr: f64, config: &PgmConfig) -> Result<f64> {
    let (alpha, beta) = grating_angles(theta_m2, theta_gr, config);
    let cos_alpha = alpha.to_radians().cos();
    if cos_alpha == 0.0 {
        return Err(PgmError::domain(format!(
            "grazing incidence undefined at M2 = {theta_m2}, grating = {theta_gr}"
        )));
    }
    Ok(beta.to_radians().cos() / cos_alpha)
}

/// |a - b| / max(|a|, |b|), or 0 when both are zero.
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogVariant, GratingCatalog};

    #[test]
    fn test_wavelength_1kev() {
        // 1 keV ~ 12.398 Å = 1.2398e-6 mm
        let l = wavelength(1000.0).unwrap();
        assert!((l - 1.23984197e-6).abs() < 1e-15);
    }

    #[test]
    fn test_wavelength_rejects_non_positive() {
        assert!(matches!(wavelength(0.0), Err(PgmError::Domain(_))));
        assert!(matches!(wavelength(-1.0), Err(PgmError::Domain(_))));
        assert!(matches!(wavelength(f64::NAN), Err(PgmError::Domain(_))));
    }

    #[test]
    fn test_cff_high_r_250ev() {
        let cat = GratingCatalog::ari();
        let c = cff(250.0, cat.get("HighR").unwrap(), 32100.0, 11500.0, 1).unwrap();
        assert!((c - 1.755254).abs() < 1e-5, "cff = {c}");
    }

    #[test]
    fn test_zero_groove_density_is_domain_error() {
        let flat = GratingSpec::new("flat", 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            cff(250.0, &flat, 32100.0, 11500.0, 1),
            Err(PgmError::Domain(_))
        ));
        let config = CatalogVariant::Ari.default_geometry();
        assert!(matches!(
            energy_from_angles(92.0, 93.0, &flat, &config),
            Err(PgmError::Domain(_))
        ));
    }

    #[test]
    fn test_unit_cff_is_singular() {
        let cat = GratingCatalog::ari();
        let config = CatalogVariant::Ari.default_geometry();
        let r = angles_from_energy(250.0, cat.get("HighR").unwrap(), &config, Some(1.0));
        assert!(matches!(r, Err(PgmError::Domain(_))));
    }

    #[test]
    fn test_implied_cff_matches_formula_after_move() {
        let cat = GratingCatalog::ari();
        let grating = cat.get("HighR").unwrap();
        let config = CatalogVariant::Ari.default_geometry();
        let c = cff(250.0, grating, config.r1, config.r2, config.m).unwrap();
        let (m2, gr) = angles_from_energy(250.0, grating, &config, Some(c)).unwrap();
        let implied = implied_cff(m2, gr, &config).unwrap();
        assert!(relative_difference(c, implied) < 1e-9);
    }

    #[test]
    fn test_relative_difference() {
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
        assert!((relative_difference(100.0, 101.0) - 1.0 / 101.0).abs() < 1e-15);
    }
}
