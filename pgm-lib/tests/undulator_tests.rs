#![cfg(feature = "undulator")]

use approx::assert_relative_eq;
use pgm::{
    CatalogVariant, Detector, EnergyScan, FieldTracker, GratingCatalog, HarmonicTable, PgmError,
    PgmState, Undulator,
};

/// First harmonic falls from 900 to 300 eV as the field rises from 0.2 to 0.8 T.
fn table() -> HarmonicTable {
    HarmonicTable::from_rows(&[
        (0.2, vec![(1, Some(900.0)), (3, Some(2700.0))]),
        (0.4, vec![(1, Some(600.0)), (3, Some(1800.0))]),
        (0.6, vec![(1, Some(400.0)), (3, Some(1200.0))]),
        (0.8, vec![(1, Some(300.0)), (3, None)]),
    ])
    .unwrap()
}

#[test]
fn test_field_tracks_scan_energy() {
    let mut pgm = PgmState::from_energy(
        CatalogVariant::Ari.default_geometry(),
        GratingCatalog::ari(),
        "HighR",
        250.0,
    )
    .unwrap();
    let mut tracker = FieldTracker::new("epu_field", Undulator::new(table(), 1, 0.8).unwrap());

    let mut detectors: [&mut dyn Detector; 1] = [&mut tracker];
    let record = EnergyScan::new(400.0, 600.0, 3)
        .run(&mut pgm, &mut detectors)
        .unwrap();

    let fields = record.readings("epu_field");
    assert_eq!(fields.len(), 3);
    assert_relative_eq!(fields[0], 0.6, epsilon = 1e-9);
    assert_relative_eq!(fields[2], 0.4, epsilon = 1e-9);
    // Higher energy needs a weaker field
    assert!(fields.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(tracker.undulator().energy(), 600.0);
}

#[test]
fn test_energy_between_knots() {
    let table = table();
    let e = table.energy_at(0.5, 1).unwrap();
    assert!(e < 600.0 && e > 400.0, "e = {e}");
    let field = table.field_for(e, 1).unwrap();
    assert_relative_eq!(field, 0.5, epsilon = 1e-2);
}

#[test]
fn test_tracker_rejects_unknown_harmonic() {
    assert_eq!(
        Undulator::new(table(), 5, 0.4).unwrap_err(),
        PgmError::UnknownHarmonic(5)
    );
}

#[test]
fn test_table_without_harmonics() {
    assert!(matches!(
        HarmonicTable::from_rows(&[(0.2, vec![])]),
        Err(PgmError::Config(_))
    ));
}

#[test]
fn test_set_field_moves_energy() {
    let mut epu = Undulator::new(table(), 1, 0.2).unwrap();
    epu.set_field(0.4).unwrap();
    assert_eq!(epu.field(), 0.4);
    assert_relative_eq!(epu.energy(), 600.0, epsilon = 1e-9);

    epu.set_harmonic(3).unwrap();
    assert_relative_eq!(epu.energy(), 1800.0, epsilon = 1e-9);
    assert_eq!(epu.harmonic(), 3);
}

#[test]
fn test_sparse_fifth_harmonic_keeps_first_usable() {
    let table = HarmonicTable::from_rows(&[
        (0.2, vec![(1, Some(900.0)), (5, Some(4500.0))]),
        (0.4, vec![(1, Some(600.0)), (5, Some(3000.0))]),
        (0.6, vec![(1, Some(400.0)), (5, None)]),
        (0.8, vec![(1, Some(300.0)), (5, None)]),
    ])
    .unwrap();
    assert_eq!(table.harmonics(), vec![1]);

    let mut epu = Undulator::new(table, 1, 0.8).unwrap();
    epu.set_energy(400.0).unwrap();
    assert_relative_eq!(epu.field(), 0.6, epsilon = 1e-9);
    assert_eq!(epu.set_harmonic(5), Err(PgmError::UnknownHarmonic(5)));
    assert_eq!(epu.harmonic(), 1);
}
