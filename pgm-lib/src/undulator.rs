//! Undulator (EPU) energy from the vertical magnetic field.
//!
//! Harmonic energies are tabulated against the field, one column per odd
//! harmonic, in the column-oriented JSON layout
//! `{"magn_field": {"0": 0.075, ...}, "harmonic1": {"0": 1050.2, ...}}`.
//! Missing peaks are written as `null`.
//!
//! Requires the `undulator` feature.

use std::collections::BTreeMap;

use pgm_data::PgmSnapshot;
use tracing::{debug, warn};

use crate::error::{PgmError, Result};
use crate::interp::quadratic_one;
use crate::scan::Detector;

const FIELD_COLUMN: &str = "magn_field";
const HARMONIC_PREFIX: &str = "harmonic";

/// A harmonic needs this many tabulated peaks to be interpolated.
const MIN_POINTS: usize = 3;

/// Field/energy pairs of one harmonic, sorted both ways for lookups.
#[derive(Debug, Clone, PartialEq)]
struct HarmonicCurve {
    by_field: (Vec<f64>, Vec<f64>),
    by_energy: (Vec<f64>, Vec<f64>),
}

impl HarmonicCurve {
    fn new(harmonic: u32, mut points: Vec<(f64, f64)>) -> Result<Self> {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let by_field: (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        points.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (energies, fields): (Vec<f64>, Vec<f64>) = points.iter().map(|&(f, e)| (e, f)).unzip();

        if !strictly_increasing(&by_field.0) || !strictly_increasing(&energies) {
            return Err(PgmError::domain(format!(
                "harmonic {harmonic} is not monotonic in field"
            )));
        }
        Ok(HarmonicCurve {
            by_field,
            by_energy: (energies, fields),
        })
    }
}

fn strictly_increasing(v: &[f64]) -> bool {
    v.windows(2).all(|w| w[0] < w[1])
}

/// Harmonic energies versus vertical field.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicTable {
    curves: BTreeMap<u32, HarmonicCurve>,
}

impl HarmonicTable {
    /// Build from rows of `(field, [(harmonic, energy)])`. `None` or NaN energies are skipped.
    ///
    /// Higher harmonics are often only partly resolved. A harmonic with fewer
    /// than three peaks is left out of the table; looking it up later gives
    /// [`PgmError::UnknownHarmonic`].
    pub fn from_rows(rows: &[(f64, Vec<(u32, Option<f64>)>)]) -> Result<Self> {
        let mut points: BTreeMap<u32, Vec<(f64, f64)>> = BTreeMap::new();
        for (field, energies) in rows {
            for &(harmonic, energy) in energies {
                let column = points.entry(harmonic).or_default();
                if let Some(e) = energy.filter(|e| e.is_finite()) {
                    if field.is_finite() {
                        column.push((*field, e));
                    }
                }
            }
        }

        let mut curves = BTreeMap::new();
        for (harmonic, column) in points {
            if column.len() < MIN_POINTS {
                warn!(harmonic, points = column.len(), "harmonic skipped, too few tabulated peaks");
                continue;
            }
            curves.insert(harmonic, HarmonicCurve::new(harmonic, column)?);
        }
        if curves.is_empty() {
            return Err(PgmError::Config(format!(
                "harmonics table has no harmonic with at least {MIN_POINTS} peaks"
            )));
        }
        Ok(HarmonicTable { curves })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let columns: BTreeMap<String, BTreeMap<String, Option<f64>>> = serde_json::from_str(json)
            .map_err(|e| PgmError::Config(format!("invalid harmonics JSON: {e}")))?;

        let fields = columns.get(FIELD_COLUMN).ok_or_else(|| {
            PgmError::Config(format!("harmonics table has no '{FIELD_COLUMN}' column"))
        })?;

        let mut harmonic_columns = Vec::new();
        for (name, column) in &columns {
            if let Some(suffix) = name.strip_prefix(HARMONIC_PREFIX) {
                let harmonic = suffix.parse::<u32>().map_err(|_| {
                    PgmError::Config(format!("bad harmonic column name '{name}'"))
                })?;
                harmonic_columns.push((harmonic, column));
            }
        }

        let mut rows = Vec::with_capacity(fields.len());
        for (row, field) in fields {
            let Some(field) = *field else { continue };
            let energies = harmonic_columns
                .iter()
                .map(|(h, column)| (*h, column.get(row).copied().flatten()))
                .collect();
            rows.push((field, energies));
        }
        Self::from_rows(&rows)
    }

    pub fn harmonics(&self) -> Vec<u32> {
        self.curves.keys().copied().collect()
    }

    fn curve(&self, harmonic: u32) -> Result<&HarmonicCurve> {
        self.curves
            .get(&harmonic)
            .ok_or(PgmError::UnknownHarmonic(harmonic))
    }

    /// Photon energy (eV) of `harmonic` at a vertical field (T).
    pub fn energy_at(&self, field: f64, harmonic: u32) -> Result<f64> {
        let (xp, fp) = &self.curve(harmonic)?.by_field;
        Ok(quadratic_one(field, xp, fp))
    }

    /// Vertical field (T) that puts `harmonic` at `energy` (eV).
    pub fn field_for(&self, energy: f64, harmonic: u32) -> Result<f64> {
        let (xp, fp) = &self.curve(harmonic)?.by_energy;
        Ok(quadratic_one(energy, xp, fp))
    }
}

/// An undulator whose energy follows its vertical field.
#[derive(Debug, Clone, PartialEq)]
pub struct Undulator {
    table: HarmonicTable,
    harmonic: u32,
    field: f64,
    energy: f64,
}

impl Undulator {
    pub fn new(table: HarmonicTable, harmonic: u32, field: f64) -> Result<Self> {
        let energy = table.energy_at(field, harmonic)?;
        Ok(Undulator {
            table,
            harmonic,
            field,
            energy,
        })
    }

    /// Move the field so the current harmonic sits at `energy`.
    pub fn set_energy(&mut self, energy: f64) -> Result<()> {
        if !energy.is_finite() || energy <= 0.0 {
            return Err(PgmError::domain(format!(
                "photon energy must be positive, got {energy} eV"
            )));
        }
        self.field = self.table.field_for(energy, self.harmonic)?;
        self.energy = energy;
        debug!(energy, field = self.field, "undulator energy set");
        Ok(())
    }

    pub fn set_field(&mut self, field: f64) -> Result<()> {
        self.energy = self.table.energy_at(field, self.harmonic)?;
        self.field = field;
        Ok(())
    }

    /// Switch harmonic at a fixed field.
    pub fn set_harmonic(&mut self, harmonic: u32) -> Result<()> {
        self.energy = self.table.energy_at(self.field, harmonic)?;
        self.harmonic = harmonic;
        Ok(())
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn field(&self) -> f64 {
        self.field
    }

    pub fn harmonic(&self) -> u32 {
        self.harmonic
    }
}

/// Scan detector that keeps the undulator on the monochromator energy and reports its field.
#[derive(Debug, Clone)]
pub struct FieldTracker {
    name: String,
    undulator: Undulator,
}

impl FieldTracker {
    pub fn new(name: &str, undulator: Undulator) -> Self {
        FieldTracker {
            name: name.to_string(),
            undulator,
        }
    }

    pub fn undulator(&self) -> &Undulator {
        &self.undulator
    }
}

impl Detector for FieldTracker {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&mut self, position: &PgmSnapshot) -> Result<()> {
        self.undulator.set_energy(position.energy)
    }

    fn read(&mut self) -> Result<f64> {
        Ok(self.undulator.field())
    }
}
