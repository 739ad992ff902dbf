/// Planck's constant times speed of light (eV·Å)
pub const PLANCK_HC_ANGSTROM: f64 = 12398.4197;

/// Ångström to millimetre
pub const ANGSTROM_TO_MM: f64 = 1.0e-7;

/// Relative tolerance used when checking that stored state matches the formulas.
pub const CONSISTENCY_TOLERANCE: f64 = 1.0e-6;

/// Default diffraction order
pub const DEFAULT_ORDER: i32 = 1;

/// Incident and outgoing beam angle shared by both installations (degrees)
pub const DEFAULT_BEAM_ANGLE: f64 = 90.0;
