use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use pgm_data::{Bounce, GratingSpec, PgmConfig};
use serde::{Deserialize, Serialize};

use crate::catalog_db::{ARI_FOCAL_LENGTHS, ARI_GRATINGS, SXN_FOCAL_LENGTHS, SXN_GRATINGS};
use crate::constants::{DEFAULT_BEAM_ANGLE, DEFAULT_ORDER};
use crate::error::{PgmError, Result};

/// Optics line an installation belongs to. Each ships its own grating set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogVariant {
    #[serde(alias = "ARI")]
    Ari,
    #[serde(alias = "SXN")]
    Sxn,
}

impl CatalogVariant {
    /// Geometry of the branch with first-order diffraction and an upward bounce.
    pub fn default_geometry(self) -> PgmConfig {
        let (r1, r2) = match self {
            Self::Ari => ARI_FOCAL_LENGTHS,
            Self::Sxn => SXN_FOCAL_LENGTHS,
        };
        PgmConfig {
            m: DEFAULT_ORDER,
            r1,
            r2,
            x_inc: DEFAULT_BEAM_ANGLE,
            x_diff: DEFAULT_BEAM_ANGLE,
            b: Bounce::Up,
        }
    }

    pub fn default_grating(self) -> &'static str {
        match self {
            Self::Ari => "HighR",
            Self::Sxn => "MedE",
        }
    }
}

impl FromStr for CatalogVariant {
    type Err = PgmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ari" => Ok(Self::Ari),
            "sxn" => Ok(Self::Sxn),
            _ => Err(PgmError::Config(format!(
                "unknown catalog variant '{s}', use ari or sxn"
            ))),
        }
    }
}

impl fmt::Display for CatalogVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ari => write!(f, "ari"),
            Self::Sxn => write!(f, "sxn"),
        }
    }
}

/// The set of gratings selectable on one monochromator.
///
/// Keeps insertion order for listing; lookups go through a name index.
#[derive(Debug, Clone, PartialEq)]
pub struct GratingCatalog {
    gratings: Vec<GratingSpec>,
    by_name: HashMap<String, usize>,
}

impl GratingCatalog {
    /// Build a catalog from grating records. Names must be unique.
    pub fn from_specs(specs: impl IntoIterator<Item = GratingSpec>) -> Result<Self> {
        let mut gratings = Vec::new();
        let mut by_name = HashMap::new();
        for spec in specs {
            if by_name.contains_key(&spec.name) {
                return Err(PgmError::Config(format!(
                    "duplicate grating name '{}'",
                    spec.name
                )));
            }
            by_name.insert(spec.name.clone(), gratings.len());
            gratings.push(spec);
        }
        Ok(GratingCatalog { gratings, by_name })
    }

    fn from_table(table: &[(&str, f64, f64, f64, f64)]) -> Self {
        let gratings: Vec<GratingSpec> = table
            .iter()
            .map(|&(name, a0, a1, a2, a3)| GratingSpec::new(name, a0, a1, a2, a3))
            .collect();
        let by_name = gratings
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), i))
            .collect();
        GratingCatalog { gratings, by_name }
    }

    pub fn ari() -> Self {
        Self::from_table(ARI_GRATINGS)
    }

    pub fn sxn() -> Self {
        Self::from_table(SXN_GRATINGS)
    }

    pub fn for_variant(variant: CatalogVariant) -> Self {
        match variant {
            CatalogVariant::Ari => Self::ari(),
            CatalogVariant::Sxn => Self::sxn(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&GratingSpec> {
        self.by_name
            .get(name)
            .map(|&i| &self.gratings[i])
            .ok_or_else(|| PgmError::UnknownGrating(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.gratings.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GratingSpec> {
        self.gratings.iter()
    }

    pub fn len(&self) -> usize {
        self.gratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gratings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_catalogs() {
        assert_eq!(GratingCatalog::ari().names(), vec!["LowE", "HighE", "HighR"]);
        assert_eq!(GratingCatalog::sxn().names(), vec!["LowE", "MedE", "HighE"]);
    }

    #[test]
    fn test_same_name_differs_between_branches() {
        let ari = GratingCatalog::ari();
        let sxn = GratingCatalog::sxn();
        assert_eq!(ari.get("LowE").unwrap().a0, 50.0);
        assert_eq!(sxn.get("LowE").unwrap().a0, 150.0);
        assert!(sxn.contains("MedE"));
        assert!(!ari.contains("MedE"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let specs = vec![
            GratingSpec::new("A", 100.0, 0.0, 0.0, 0.0),
            GratingSpec::new("A", 200.0, 0.0, 0.0, 0.0),
        ];
        assert!(matches!(
            GratingCatalog::from_specs(specs),
            Err(PgmError::Config(_))
        ));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("ARI".parse::<CatalogVariant>().unwrap(), CatalogVariant::Ari);
        assert_eq!("sxn".parse::<CatalogVariant>().unwrap(), CatalogVariant::Sxn);
        assert!("xyz".parse::<CatalogVariant>().is_err());
    }
}
