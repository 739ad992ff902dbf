//! Installation configuration, read from TOML.
//!
//! ```toml
//! variant = "ari"
//! grating = "HighR"
//! energy = 250.0
//!
//! [geometry]
//! m = 1
//! r1 = 32100.0
//! r2 = 11500.0
//! x_inc = 90.0
//! x_diff = 90.0
//! b = "up"
//! ```
//!
//! `geometry` defaults to the branch geometry of `variant`. A non-empty
//! `[[gratings]]` list replaces the shipped catalog.

use std::path::Path;

use pgm_data::{GratingSpec, PgmConfig};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogVariant, GratingCatalog};
use crate::error::{PgmError, Result};
use crate::model::{ModelPaths, ModelStore};
use crate::state::PgmState;

fn default_harmonic_number() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamlineConfig {
    pub variant: CatalogVariant,
    #[serde(default)]
    pub grating: Option<String>,
    /// Initial photon energy (eV)
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default = "default_harmonic_number")]
    pub harmonic_number: u32,
    #[serde(default)]
    pub geometry: Option<PgmConfig>,
    #[serde(default)]
    pub gratings: Vec<GratingSpec>,
}

impl Default for BeamlineConfig {
    fn default() -> Self {
        BeamlineConfig {
            variant: CatalogVariant::Ari,
            grating: None,
            energy: Some(250.0),
            harmonic_number: default_harmonic_number(),
            geometry: None,
            gratings: Vec::new(),
        }
    }
}

impl BeamlineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PgmError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PgmError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn catalog(&self) -> Result<GratingCatalog> {
        if self.gratings.is_empty() {
            Ok(GratingCatalog::for_variant(self.variant))
        } else {
            GratingCatalog::from_specs(self.gratings.iter().cloned())
        }
    }

    pub fn geometry(&self) -> PgmConfig {
        self.geometry.unwrap_or_else(|| self.variant.default_geometry())
    }

    /// The configured grating, else the branch default, else the first custom grating.
    pub fn grating_name(&self) -> Result<String> {
        if let Some(name) = &self.grating {
            return Ok(name.clone());
        }
        if self.gratings.is_empty() {
            return Ok(self.variant.default_grating().to_string());
        }
        Ok(self.gratings[0].name.clone())
    }

    /// Build a state at the configured energy.
    pub fn build_state(&self) -> Result<PgmState> {
        let energy = self
            .energy
            .ok_or_else(|| PgmError::Config("no initial energy configured".to_string()))?;
        let mut state =
            PgmState::from_energy(self.geometry(), self.catalog()?, &self.grating_name()?, energy)?;
        state.set_harmonic_number(self.harmonic_number);
        Ok(state)
    }

    /// Build a state from the angles held by a simulation model.
    pub fn seed_state<S: ModelStore + ?Sized>(
        &self,
        store: &S,
        paths: &ModelPaths,
    ) -> Result<PgmState> {
        let mut state = PgmState::seed_from_model(
            store,
            paths,
            self.geometry(),
            self.catalog()?,
            &self.grating_name()?,
        )?;
        state.set_harmonic_number(self.harmonic_number);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgm_data::Bounce;

    #[test]
    fn test_minimal_config() {
        let cfg = BeamlineConfig::from_toml_str("variant = \"sxn\"\nenergy = 400.0\n").unwrap();
        assert_eq!(cfg.variant, CatalogVariant::Sxn);
        assert_eq!(cfg.grating_name().unwrap(), "MedE");
        assert_eq!(cfg.geometry().r2, 17500.0);
        let state = cfg.build_state().unwrap();
        assert_eq!(state.energy(), 400.0);
    }

    #[test]
    fn test_geometry_and_custom_gratings() {
        let text = r#"
            variant = "ari"
            energy = 300.0
            harmonic_number = 3

            [geometry]
            m = 1
            r1 = 30000.0
            r2 = 12000.0
            x_inc = 90.0
            x_diff = 90.0
            b = "down"

            [[gratings]]
            name = "Custom"
            a0 = 100.0
            a1 = 0.03
            a2 = 0.0
            a3 = 0.0
        "#;
        let cfg = BeamlineConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.geometry().b, Bounce::Down);
        assert_eq!(cfg.catalog().unwrap().names(), vec!["Custom"]);
        let state = cfg.build_state().unwrap();
        assert_eq!(state.grating_name(), "Custom");
        assert_eq!(state.harmonic_number(), 3);
        state.check_consistency().unwrap();
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        assert!(matches!(
            BeamlineConfig::from_toml_str("variant = \"nope\""),
            Err(PgmError::Config(_))
        ));
    }

    #[test]
    fn test_missing_energy() {
        let cfg = BeamlineConfig::from_toml_str("variant = \"ari\"").unwrap();
        assert!(matches!(cfg.build_state(), Err(PgmError::Config(_))));
    }
}
