//! Energy scans: optionally select a grating, then step the energy through an
//! evenly spaced range and read every detector at each point.
//!
//! The scan owns nothing but its loop counter. All physics goes through the
//! [`EnergyAxis`] it is handed, and the first failing step aborts the scan.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use pgm_data::PgmSnapshot;
use tracing::{debug, info};

use crate::error::{PgmError, Result};
use crate::state::PgmState;

/// Something that can be driven to a photon energy.
pub trait EnergyAxis {
    fn set_grating(&mut self, name: &str) -> Result<()>;
    fn set_energy(&mut self, energy: f64) -> Result<()>;
    fn snapshot(&self) -> PgmSnapshot;
}

impl EnergyAxis for PgmState {
    fn set_grating(&mut self, name: &str) -> Result<()> {
        PgmState::set_grating(self, name)
    }

    fn set_energy(&mut self, energy: f64) -> Result<()> {
        PgmState::set_energy(self, energy)
    }

    fn snapshot(&self) -> PgmSnapshot {
        self.get_state()
    }
}

/// A detector read once per scan point.
pub trait Detector {
    fn name(&self) -> &str;

    /// Start an acquisition at the settled position.
    fn trigger(&mut self, position: &PgmSnapshot) -> Result<()>;

    fn read(&mut self) -> Result<f64>;
}

/// One settled scan point.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEvent {
    pub index: usize,
    pub snapshot: PgmSnapshot,
    /// Detector name -> value
    pub readings: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRecord {
    pub events: Vec<ScanEvent>,
}

impl ScanRecord {
    pub fn energies(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.snapshot.energy).collect()
    }

    /// Values read from one detector, in scan order.
    pub fn readings(&self, detector: &str) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| e.readings.get(detector).copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyScan {
    start: f64,
    stop: f64,
    num_points: usize,
    grating: Option<String>,
}

impl EnergyScan {
    pub fn new(start: f64, stop: f64, num_points: usize) -> Self {
        Self {
            start,
            stop,
            num_points,
            grating: None,
        }
    }

    /// Select `grating` once before the first point.
    pub fn with_grating(mut self, grating: &str) -> Self {
        self.grating = Some(grating.to_string());
        self
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    fn position_at(&self, point: usize) -> f64 {
        if self.num_points <= 1 {
            self.start
        } else if point + 1 == self.num_points {
            self.stop
        } else {
            let step = (self.stop - self.start) / (self.num_points - 1) as f64;
            self.start + step * point as f64
        }
    }

    /// Energies visited by the scan, `start` and `stop` included.
    pub fn positions(&self) -> Result<Vec<f64>> {
        if self.num_points == 0 {
            return Err(PgmError::Config("scan needs at least one point".to_string()));
        }
        Ok((0..self.num_points).map(|i| self.position_at(i)).collect())
    }

    pub fn run<A: EnergyAxis + ?Sized>(
        &self,
        axis: &mut A,
        detectors: &mut [&mut dyn Detector],
    ) -> Result<ScanRecord> {
        let never = AtomicBool::new(false);
        self.run_until(axis, detectors, &never)
    }

    /// Like [`Self::run`], but checks `abort` before every point.
    ///
    /// An abort leaves the axis at the last completed point.
    pub fn run_until<A: EnergyAxis + ?Sized>(
        &self,
        axis: &mut A,
        detectors: &mut [&mut dyn Detector],
        abort: &AtomicBool,
    ) -> Result<ScanRecord> {
        let positions = self.positions()?;
        info!(
            start = self.start,
            stop = self.stop,
            points = self.num_points,
            grating = self.grating.as_deref().unwrap_or("<current>"),
            "energy scan started"
        );

        if let Some(grating) = &self.grating {
            axis.set_grating(grating)?;
        }

        let mut record = ScanRecord::default();
        for (index, energy) in positions.into_iter().enumerate() {
            if abort.load(Ordering::SeqCst) {
                info!(completed = index, "energy scan aborted");
                return Err(PgmError::ScanAborted { completed: index });
            }

            axis.set_energy(energy)?;
            let snapshot = axis.snapshot();

            for det in detectors.iter_mut() {
                det.trigger(&snapshot)?;
            }
            let mut readings = BTreeMap::new();
            for det in detectors.iter_mut() {
                readings.insert(det.name().to_string(), det.read()?);
            }

            debug!(index, energy, ?readings, "scan point");
            record.events.push(ScanEvent {
                index,
                snapshot,
                readings,
            });
        }

        info!(points = record.events.len(), "energy scan finished");
        Ok(record)
    }
}
