use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pgm::formulas::{angles_from_energy, cff, energy_from_angles};
use pgm::{CatalogVariant, GratingCatalog, PgmState};

fn bench_formulas(c: &mut Criterion) {
    let catalog = GratingCatalog::ari();
    let grating = catalog.get("HighR").unwrap();
    let config = CatalogVariant::Ari.default_geometry();

    c.bench_function("cff_high_r", |b| {
        b.iter(|| {
            black_box(
                cff(
                    black_box(250.0),
                    grating,
                    config.r1,
                    config.r2,
                    config.m,
                )
                .unwrap(),
            );
        });
    });

    c.bench_function("angles_from_energy_high_r", |b| {
        b.iter(|| {
            black_box(angles_from_energy(black_box(250.0), grating, &config, None).unwrap());
        });
    });

    let (m2, gr) = angles_from_energy(250.0, grating, &config, None).unwrap();
    c.bench_function("energy_from_angles_high_r", |b| {
        b.iter(|| {
            black_box(energy_from_angles(black_box(m2), black_box(gr), grating, &config).unwrap());
        });
    });
}

fn bench_state_sweep(c: &mut Criterion) {
    let energies: Vec<f64> = (0..200).map(|i| 100.0 + i as f64 * 10.0).collect();

    c.bench_function("state_set_energy_sweep", |b| {
        let mut state = PgmState::from_energy(
            CatalogVariant::Ari.default_geometry(),
            GratingCatalog::ari(),
            "HighR",
            250.0,
        )
        .unwrap();
        b.iter(|| {
            for &e in &energies {
                state.set_energy(black_box(e)).unwrap();
            }
            black_box(state.get_state());
        });
    });

    c.bench_function("state_grating_cycle", |b| {
        let mut state = PgmState::from_energy(
            CatalogVariant::Ari.default_geometry(),
            GratingCatalog::ari(),
            "HighR",
            250.0,
        )
        .unwrap();
        b.iter(|| {
            for name in ["LowE", "HighE", "HighR"] {
                state.set_grating(black_box(name)).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_formulas, bench_state_sweep);
criterion_main!(benches);
