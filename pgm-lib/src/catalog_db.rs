/// Gratings installed on the ARI branch.
///
/// Each entry: (name, a0, a1, a2, a3)
pub(crate) const ARI_GRATINGS: &[(&str, f64, f64, f64, f64)] = &[
    ("LowE", 50.0, 0.01868, 1.95e-06, 4e-9),
    ("HighE", 50.0, 0.02986, 2.87e-06, 8e-9),
    ("HighR", 200.0, 0.05743, 6.38e-06, 1.5e-8),
];

/// Gratings installed on the SXN branch.
pub(crate) const SXN_GRATINGS: &[(&str, f64, f64, f64, f64)] = &[
    ("LowE", 150.0, 0.04341, 2.6e-06, 1.5e-8),
    ("MedE", 350.0, 0.0755, 4.95e-06, 2.5e-8),
    ("HighE", 350.0, 0.05739, 4.18e-06, 1.2e-8),
];

/// Focal lengths (r1, r2) in mm for each branch.
pub(crate) const ARI_FOCAL_LENGTHS: (f64, f64) = (32100.0, 11500.0);
pub(crate) const SXN_FOCAL_LENGTHS: (f64, f64) = (33000.0, 17500.0);
