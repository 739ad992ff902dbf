use approx::assert_relative_eq;
use pgm::formulas::{angles_from_energy, cff, energy_from_angles, wavelength};
use pgm::{CatalogVariant, GratingCatalog, PgmError};

fn branches() -> Vec<(CatalogVariant, GratingCatalog)> {
    vec![
        (CatalogVariant::Ari, GratingCatalog::ari()),
        (CatalogVariant::Sxn, GratingCatalog::sxn()),
    ]
}

#[test]
fn test_roundtrip_every_grating() {
    let energies = [20.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 3000.0];
    for (variant, catalog) in branches() {
        let config = variant.default_geometry();
        for grating in catalog.iter() {
            for &e in &energies {
                let (m2, gr) = angles_from_energy(e, grating, &config, None).unwrap();
                let back = energy_from_angles(m2, gr, grating, &config).unwrap();
                assert_relative_eq!(back, e, max_relative = 1e-6);
            }
        }
    }
}

#[test]
fn test_high_r_250ev_scenario() {
    let catalog = GratingCatalog::ari();
    let grating = catalog.get("HighR").unwrap();
    let config = CatalogVariant::Ari.default_geometry();

    let c = cff(250.0, grating, config.r1, config.r2, config.m).unwrap();
    let (m2, gr) = angles_from_energy(250.0, grating, &config, Some(c)).unwrap();
    assert_relative_eq!(m2, 92.436797, epsilon = 1e-5);
    assert_relative_eq!(gr, 93.105130, epsilon = 1e-5);

    let e = energy_from_angles(m2, gr, grating, &config).unwrap();
    assert!((e - 250.0).abs() < 1e-6, "e = {e}");
}

#[test]
fn test_cff_override_is_used() {
    let catalog = GratingCatalog::ari();
    let grating = catalog.get("HighR").unwrap();
    let config = CatalogVariant::Ari.default_geometry();

    let computed = angles_from_energy(250.0, grating, &config, None).unwrap();
    let overridden = angles_from_energy(250.0, grating, &config, Some(2.0)).unwrap();
    assert_ne!(computed, overridden);
    // Any valid cff still satisfies the grating equation
    let e = energy_from_angles(overridden.0, overridden.1, grating, &config).unwrap();
    assert_relative_eq!(e, 250.0, max_relative = 1e-9);
}

#[test]
fn test_downward_bounce_roundtrip() {
    let catalog = GratingCatalog::ari();
    let grating = catalog.get("HighR").unwrap();
    let mut config = CatalogVariant::Ari.default_geometry();
    config.b = pgm::Bounce::Down;

    let (m2, gr) = angles_from_energy(250.0, grating, &config, None).unwrap();
    assert!(gr < 90.0);
    let e = energy_from_angles(m2, gr, grating, &config).unwrap();
    assert_relative_eq!(e, 250.0, max_relative = 1e-9);
}

#[test]
fn test_unreachable_energy_is_domain_error() {
    // 1 eV is beyond what the 350 l/mm SXN grating can diffract
    let catalog = GratingCatalog::sxn();
    let grating = catalog.get("MedE").unwrap();
    let config = CatalogVariant::Sxn.default_geometry();
    assert!(matches!(
        angles_from_energy(1.0, grating, &config, None),
        Err(PgmError::Domain(_))
    ));
}

#[test]
fn test_non_positive_energy_is_domain_error() {
    let catalog = GratingCatalog::ari();
    let grating = catalog.get("LowE").unwrap();
    let config = CatalogVariant::Ari.default_geometry();
    for e in [0.0, -5.0] {
        assert!(matches!(wavelength(e), Err(PgmError::Domain(_))));
        assert!(matches!(
            cff(e, grating, config.r1, config.r2, config.m),
            Err(PgmError::Domain(_))
        ));
        assert!(matches!(
            angles_from_energy(e, grating, &config, None),
            Err(PgmError::Domain(_))
        ));
    }
}

#[test]
fn test_zero_wavelength_angles_rejected() {
    // alpha = -beta gives sin(alpha) + sin(beta) = 0
    let catalog = GratingCatalog::ari();
    let grating = catalog.get("LowE").unwrap();
    let config = CatalogVariant::Ari.default_geometry();
    assert!(matches!(
        energy_from_angles(90.0, 90.0, grating, &config),
        Err(PgmError::Domain(_))
    ));
}
