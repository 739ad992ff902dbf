#![no_std]

extern crate alloc;

use alloc::string::String;
use serde::{Deserialize, Serialize};

/// A diffraction grating described by its groove density polynomial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GratingSpec {
    pub name: String,
    /// Central groove density (mm^-1)
    pub a0: f64,
    /// Linear groove density coefficient (mm^-2)
    pub a1: f64,
    /// Quadratic groove density coefficient (mm^-3)
    pub a2: f64,
    /// Cubic groove density coefficient (mm^-4)
    pub a3: f64,
}

impl GratingSpec {
    pub fn new(name: &str, a0: f64, a1: f64, a2: f64, a3: f64) -> Self {
        GratingSpec {
            name: String::from(name),
            a0,
            a1,
            a2,
            a3,
        }
    }
}

/// Direction in which the beam is deflected by the mirror/grating pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bounce {
    Up,
    Down,
}

impl Bounce {
    /// +1 for an upward bounce, -1 for a downward one.
    pub fn sign(self) -> f64 {
        match self {
            Bounce::Up => 1.0,
            Bounce::Down => -1.0,
        }
    }
}

/// Fixed geometry of a monochromator installation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PgmConfig {
    /// Diffraction order
    pub m: i32,
    /// Input focal length (mm)
    pub r1: f64,
    /// Output focal length (mm)
    pub r2: f64,
    /// Incident beam angle (degrees)
    pub x_inc: f64,
    /// Outgoing beam angle (degrees)
    pub x_diff: f64,
    pub b: Bounce,
}

/// A consistent view of the monochromator state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgmSnapshot {
    /// Photon energy (eV)
    pub energy: f64,
    pub grating_name: String,
    /// M2 mirror angle (degrees)
    pub pre_mirror_angle: f64,
    /// Grating angle (degrees)
    pub grating_angle: f64,
    pub cff: f64,
    pub harmonic_number: u32,
}
