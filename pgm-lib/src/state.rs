//! The monochromator state: energy, selected grating and the two angles.
//!
//! Two entry points mutate it. [`PgmState::set_energy`] moves the mechanics to
//! reach an energy with the current grating. [`PgmState::set_grating`] keeps
//! the mechanics where they are and recomputes the energy the new grating
//! diffracts there. Both stage every derived value before committing, so a
//! rejected update leaves the state exactly as it was.

use pgm_data::{GratingSpec, PgmConfig, PgmSnapshot};
use tracing::{debug, warn};

use crate::catalog::GratingCatalog;
use crate::constants::CONSISTENCY_TOLERANCE;
use crate::error::{PgmError, Result};
use crate::formulas::{
    angles_from_energy, cff, energy_from_angles, implied_cff, relative_difference,
};

/// Reject geometries the grating equation cannot be evaluated for.
pub fn validate_geometry(config: &PgmConfig) -> Result<()> {
    if config.m == 0 {
        return Err(PgmError::domain("diffraction order must be non-zero"));
    }
    for (name, r) in [("r1", config.r1), ("r2", config.r2)] {
        if !r.is_finite() || r <= 0.0 {
            return Err(PgmError::domain(format!(
                "focal length {name} must be positive, got {r} mm"
            )));
        }
    }
    if !config.x_inc.is_finite() || !config.x_diff.is_finite() {
        return Err(PgmError::domain("beam angles must be finite"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PgmState {
    config: PgmConfig,
    catalog: GratingCatalog,
    energy: f64,
    grating: GratingSpec,
    pre_mirror_angle: f64,
    grating_angle: f64,
    cff: f64,
    harmonic_number: u32,
}

impl PgmState {
    /// Start at `energy` with `grating`, driving the angles to match.
    pub fn from_energy(
        config: PgmConfig,
        catalog: GratingCatalog,
        grating: &str,
        energy: f64,
    ) -> Result<Self> {
        validate_geometry(&config)?;
        let spec = catalog.get(grating)?;
        let c = cff(energy, spec, config.r1, config.r2, config.m)?;
        let (pre_mirror_angle, grating_angle) = angles_from_energy(energy, spec, &config, Some(c))?;
        let grating = spec.clone();
        Ok(PgmState {
            config,
            catalog,
            energy,
            grating,
            pre_mirror_angle,
            grating_angle,
            cff: c,
            harmonic_number: 1,
        })
    }

    /// Start from a mechanical position; the energy is whatever `grating` diffracts there.
    pub fn from_angles(
        config: PgmConfig,
        catalog: GratingCatalog,
        grating: &str,
        pre_mirror_angle: f64,
        grating_angle: f64,
    ) -> Result<Self> {
        validate_geometry(&config)?;
        let spec = catalog.get(grating)?;
        let energy = energy_from_angles(pre_mirror_angle, grating_angle, spec, &config)?;
        let c = cff(energy, spec, config.r1, config.r2, config.m)?;
        let grating = spec.clone();
        Ok(PgmState {
            config,
            catalog,
            energy,
            grating,
            pre_mirror_angle,
            grating_angle,
            cff: c,
            harmonic_number: 1,
        })
    }

    /// Move M2 and the grating so the current grating delivers `new_energy`.
    pub fn set_energy(&mut self, new_energy: f64) -> Result<()> {
        let (c, pre_mirror_angle, grating_angle) =
            self.stage_energy(new_energy).inspect_err(|e| {
                warn!(energy = new_energy, grating = %self.grating.name, "energy rejected: {e}");
            })?;

        self.energy = new_energy;
        self.pre_mirror_angle = pre_mirror_angle;
        self.grating_angle = grating_angle;
        self.cff = c;
        debug!(
            energy = self.energy,
            pre_mirror_angle,
            grating_angle,
            cff = c,
            "pgm energy set"
        );
        Ok(())
    }

    fn stage_energy(&self, new_energy: f64) -> Result<(f64, f64, f64)> {
        if !new_energy.is_finite() || new_energy <= 0.0 {
            return Err(PgmError::domain(format!(
                "photon energy must be positive, got {new_energy} eV"
            )));
        }
        let spec = &self.grating;
        let c = cff(new_energy, spec, self.config.r1, self.config.r2, self.config.m)?;
        let (m2, gr) = angles_from_energy(new_energy, spec, &self.config, Some(c))?;
        Ok((c, m2, gr))
    }

    /// Select another grating without moving the mechanics.
    pub fn set_grating(&mut self, new_name: &str) -> Result<()> {
        let (spec, energy, c) = self.stage_grating(new_name).inspect_err(|e| {
            warn!(grating = new_name, "grating change rejected: {e}");
        })?;

        self.grating = spec;
        self.energy = energy;
        self.cff = c;
        debug!(grating = new_name, energy, cff = c, "pgm grating set");
        Ok(())
    }

    fn stage_grating(&self, new_name: &str) -> Result<(GratingSpec, f64, f64)> {
        let spec = self.catalog.get(new_name)?;
        let energy =
            energy_from_angles(self.pre_mirror_angle, self.grating_angle, spec, &self.config)?;
        let c = cff(energy, spec, self.config.r1, self.config.r2, self.config.m)?;
        Ok((spec.clone(), energy, c))
    }

    pub fn set_harmonic_number(&mut self, harmonic_number: u32) {
        self.harmonic_number = harmonic_number;
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn grating_name(&self) -> &str {
        &self.grating.name
    }

    pub fn pre_mirror_angle(&self) -> f64 {
        self.pre_mirror_angle
    }

    pub fn grating_angle(&self) -> f64 {
        self.grating_angle
    }

    /// Fixed-focus constant of the committed energy and grating.
    pub fn cff(&self) -> f64 {
        self.cff
    }

    pub fn harmonic_number(&self) -> u32 {
        self.harmonic_number
    }

    pub fn config(&self) -> &PgmConfig {
        &self.config
    }

    pub fn catalog(&self) -> &GratingCatalog {
        &self.catalog
    }

    pub fn grating(&self) -> &GratingSpec {
        &self.grating
    }

    pub fn get_state(&self) -> PgmSnapshot {
        PgmSnapshot {
            energy: self.energy,
            grating_name: self.grating.name.clone(),
            pre_mirror_angle: self.pre_mirror_angle,
            grating_angle: self.grating_angle,
            cff: self.cff,
            harmonic_number: self.harmonic_number,
        }
    }

    /// Recompute both directions of the grating equation from the stored fields.
    ///
    /// The angle direction uses the cff the current mechanics realise, which
    /// only matches [`Self::cff`] when the last update was an energy move.
    pub fn check_consistency(&self) -> Result<()> {
        let spec = &self.grating;
        let energy =
            energy_from_angles(self.pre_mirror_angle, self.grating_angle, spec, &self.config)?;
        if relative_difference(energy, self.energy) > CONSISTENCY_TOLERANCE {
            return Err(PgmError::ConsistencyViolation {
                quantity: "energy",
                stored: self.energy,
                recomputed: energy,
            });
        }

        let mechanical_cff = implied_cff(self.pre_mirror_angle, self.grating_angle, &self.config)?;
        let (m2, gr) = angles_from_energy(self.energy, spec, &self.config, Some(mechanical_cff))?;
        for (quantity, stored, recomputed) in [
            ("pre_mirror_angle", self.pre_mirror_angle, m2),
            ("grating_angle", self.grating_angle, gr),
        ] {
            if relative_difference(stored, recomputed) > CONSISTENCY_TOLERANCE {
                return Err(PgmError::ConsistencyViolation {
                    quantity,
                    stored,
                    recomputed,
                });
            }
        }
        Ok(())
    }
}
