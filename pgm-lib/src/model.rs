//! Link between the monochromator state and the simulation's live model.
//!
//! The simulation keeps its model as a JSON document. Grazing angles are
//! stored there in mrad measured from the surface normal; the state works in
//! degrees, so `deg = degrees(mrad * 1e-3) + 90`.

use pgm_data::{PgmConfig, PgmSnapshot};
use serde_json::{Map, Number, Value};
use tracing::{info, warn};

use crate::catalog::GratingCatalog;
use crate::constants::CONSISTENCY_TOLERANCE;
use crate::error::{PgmError, Result};
use crate::formulas::relative_difference;
use crate::scan::EnergyAxis;
use crate::state::PgmState;

/// Key-value access to a simulation model, addressed by slash-separated paths.
pub trait ModelStore {
    fn get(&self, path: &str) -> Result<f64>;
    fn set(&mut self, path: &str, value: f64) -> Result<()>;
}

/// Model store over an in-memory JSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonModelStore {
    data: Value,
}

impl JsonModelStore {
    pub fn from_value(data: Value) -> Self {
        JsonModelStore { data }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let data = serde_json::from_str(json)
            .map_err(|e| PgmError::ModelStore(format!("invalid model JSON: {e}")))?;
        Ok(JsonModelStore { data })
    }

    pub fn value(&self) -> &Value {
        &self.data
    }
}

fn pointer(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

impl ModelStore for JsonModelStore {
    fn get(&self, path: &str) -> Result<f64> {
        let value = self
            .data
            .pointer(&pointer(path))
            .ok_or_else(|| PgmError::ModelStore(format!("no value at '{path}'")))?;
        value
            .as_f64()
            .ok_or_else(|| PgmError::ModelStore(format!("value at '{path}' is not a number")))
    }

    fn set(&mut self, path: &str, value: f64) -> Result<()> {
        let number = Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| PgmError::ModelStore(format!("cannot store {value} at '{path}'")))?;

        let ptr = pointer(path);
        if let Some(slot) = self.data.pointer_mut(&ptr) {
            *slot = number;
            return Ok(());
        }

        let (parent, leaf) = ptr.rsplit_once('/').unwrap_or(("", ptr.as_str()));
        if parent.is_empty() && self.data.is_null() {
            self.data = Value::Object(Map::new());
        }
        let target = if parent.is_empty() {
            Some(&mut self.data)
        } else {
            self.data.pointer_mut(parent)
        };
        match target {
            Some(Value::Object(map)) => {
                map.insert(leaf.to_string(), number);
                Ok(())
            }
            _ => Err(PgmError::ModelStore(format!("no object to hold '{path}'"))),
        }
    }
}

/// Model grazing angle (mrad from normal) to a state angle (degrees).
pub fn mrad_to_degrees(mrad: f64) -> f64 {
    (mrad * 1.0e-3).to_degrees() + 90.0
}

/// State angle (degrees) to a model grazing angle (mrad from normal).
pub fn degrees_to_mrad(degrees: f64) -> f64 {
    (degrees - 90.0).to_radians() * 1.0e3
}

/// Where the monochromator's values live in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub photon_energy: String,
    pub pre_mirror_angle: String,
    pub grating_angle: String,
    /// Groove density coefficients a0..a3 of the selected grating
    pub groove_density: [String; 4],
}

impl Default for ModelPaths {
    fn default() -> Self {
        ModelPaths {
            photon_energy: "models/simulation/photonEnergy".to_string(),
            pre_mirror_angle: "models/m2/grazingAngle".to_string(),
            grating_angle: "models/grating/grazingAngle".to_string(),
            groove_density: std::array::from_fn(|i| format!("models/grating/grooveDensity{i}")),
        }
    }
}

impl PgmState {
    /// Seed the state from the angles currently in the model.
    ///
    /// The energy follows from the angles and `grating`. A photon energy
    /// stored in the model that disagrees is logged and otherwise ignored.
    pub fn seed_from_model<S: ModelStore + ?Sized>(
        store: &S,
        paths: &ModelPaths,
        config: PgmConfig,
        catalog: GratingCatalog,
        grating: &str,
    ) -> Result<Self> {
        let pre_mirror_angle = mrad_to_degrees(store.get(&paths.pre_mirror_angle)?);
        let grating_angle = mrad_to_degrees(store.get(&paths.grating_angle)?);
        let state =
            PgmState::from_angles(config, catalog, grating, pre_mirror_angle, grating_angle)?;

        if let Ok(model_energy) = store.get(&paths.photon_energy) {
            if relative_difference(model_energy, state.energy()) > CONSISTENCY_TOLERANCE {
                warn!(
                    model_energy,
                    derived_energy = state.energy(),
                    "model photon energy disagrees with its angles"
                );
            }
        }
        if let Ok(model_a0) = store.get(&paths.groove_density[0]) {
            if model_a0 != state.grating().a0 {
                warn!(
                    model_a0,
                    grating = state.grating_name(),
                    a0 = state.grating().a0,
                    "model groove density differs from the selected grating"
                );
            }
        }
        info!(
            energy = state.energy(),
            grating = state.grating_name(),
            pre_mirror_angle,
            grating_angle,
            "pgm seeded from model"
        );
        Ok(state)
    }
}

/// Write the grating's groove density, both angles and the energy of `state`
/// into the model.
///
/// Every value is checked before the first write. The photon energy is
/// written last, so a store that fails part way never holds an energy its
/// grating and angles do not deliver.
pub fn push_state<S: ModelStore + ?Sized>(
    store: &mut S,
    paths: &ModelPaths,
    state: &PgmState,
) -> Result<()> {
    let g = state.grating();
    let mut writes: Vec<(&str, f64)> = paths
        .groove_density
        .iter()
        .map(String::as_str)
        .zip([g.a0, g.a1, g.a2, g.a3])
        .collect();
    writes.push((paths.pre_mirror_angle.as_str(), degrees_to_mrad(state.pre_mirror_angle())));
    writes.push((paths.grating_angle.as_str(), degrees_to_mrad(state.grating_angle())));
    writes.push((paths.photon_energy.as_str(), state.energy()));

    if let Some((path, value)) = writes.iter().find(|(_, v)| !v.is_finite()) {
        return Err(PgmError::ModelStore(format!("cannot store {value} at '{path}'")));
    }
    for (path, value) in writes {
        store.set(path, value)?;
    }
    Ok(())
}

/// A monochromator whose every update is written through to a model store.
///
/// A failed write leaves the state update in place and returns the store error.
#[derive(Debug)]
pub struct SimulatedPgm<S: ModelStore> {
    state: PgmState,
    store: S,
    paths: ModelPaths,
}

impl<S: ModelStore> SimulatedPgm<S> {
    pub fn new(
        store: S,
        paths: ModelPaths,
        config: PgmConfig,
        catalog: GratingCatalog,
        grating: &str,
    ) -> Result<Self> {
        let state = PgmState::seed_from_model(&store, &paths, config, catalog, grating)?;
        Ok(SimulatedPgm {
            state,
            store,
            paths,
        })
    }

    pub fn set_energy(&mut self, energy: f64) -> Result<()> {
        self.state.set_energy(energy)?;
        push_state(&mut self.store, &self.paths, &self.state)
    }

    pub fn set_grating(&mut self, name: &str) -> Result<()> {
        self.state.set_grating(name)?;
        push_state(&mut self.store, &self.paths, &self.state)
    }

    /// Bookkeeping only; nothing is written to the model.
    pub fn set_harmonic_number(&mut self, harmonic_number: u32) {
        self.state.set_harmonic_number(harmonic_number);
    }

    pub fn state(&self) -> &PgmState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (PgmState, S) {
        (self.state, self.store)
    }
}

impl<S: ModelStore> EnergyAxis for SimulatedPgm<S> {
    fn set_grating(&mut self, name: &str) -> Result<()> {
        SimulatedPgm::set_grating(self, name)
    }

    fn set_energy(&mut self, energy: f64) -> Result<()> {
        SimulatedPgm::set_energy(self, energy)
    }

    fn snapshot(&self) -> PgmSnapshot {
        self.state.get_state()
    }
}
