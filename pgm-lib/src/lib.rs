pub mod catalog;
pub(crate) mod catalog_db;
pub mod config;
pub mod constants;
pub mod error;
pub mod formulas;
#[cfg(feature = "undulator")]
pub(crate) mod interp;
pub mod model;
pub mod scan;
pub mod state;
#[cfg(feature = "undulator")]
pub mod undulator;

pub use catalog::{CatalogVariant, GratingCatalog};
pub use config::BeamlineConfig;
pub use error::{PgmError, Result};
pub use model::{JsonModelStore, ModelPaths, ModelStore, SimulatedPgm};
pub use pgm_data;
pub use pgm_data::{Bounce, GratingSpec, PgmConfig, PgmSnapshot};
pub use scan::{Detector, EnergyAxis, EnergyScan, ScanEvent, ScanRecord};
pub use state::PgmState;
#[cfg(feature = "undulator")]
pub use undulator::{FieldTracker, HarmonicTable, Undulator};
