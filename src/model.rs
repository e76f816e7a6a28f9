use crate::features::{PropertyFeatures, NUMERIC_FIELDS};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path};

#[cfg(feature = "torch")]
mod torch;
#[cfg(feature = "torch")]
pub use torch::TorchRegressor;

/// Lowest price the service will ever report, in IDR.
pub const PRICE_FLOOR: f64 = 1_000_000.0;

/// Prefix of the one-hot location columns in `feat_list`.
pub const LOCATION_PREFIX: &str = "location=";

/// A loaded, read-only price model. Shared across requests behind an `Arc`.
pub trait Regressor: Send + Sync {
    /// Raw model output for one row, before clamping.
    fn predict(&self, row: &PropertyFeatures) -> Result<f64>;
}

/// Layout metadata shipped next to the model artifact.
#[derive(Deserialize, Debug, Clone)]
pub struct ModelMeta {
    pub feat_list: Vec<String>,
    pub in_dim: Option<usize>,
}

impl ModelMeta {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read meta at {}", path.display()))?;
        serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse meta at {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Numeric(&'static str),
    Location(String),
}

/// Input column order of the model, validated against the request record.
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    columns: Vec<Column>,
}

impl FeatureLayout {
    pub fn from_meta(meta: &ModelMeta) -> Result<Self> {
        if meta.feat_list.is_empty() {
            bail!("meta.feat_list is empty");
        }
        if let Some(in_dim) = meta.in_dim {
            if in_dim != meta.feat_list.len() {
                bail!(
                    "meta.in_dim ({}) != feat_list.len() ({})",
                    in_dim,
                    meta.feat_list.len()
                );
            }
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(meta.feat_list.len());
        for name in &meta.feat_list {
            if !seen.insert(name.as_str()) {
                bail!("duplicate column in feat_list: {}", name);
            }
            let col = if let Some(label) = name.strip_prefix(LOCATION_PREFIX) {
                Column::Location(label.to_owned())
            } else if let Some(f) = NUMERIC_FIELDS.iter().find(|f| **f == name.as_str()) {
                Column::Numeric(*f)
            } else {
                bail!("unknown column in feat_list: {}", name);
            };
            columns.push(col);
        }

        for f in NUMERIC_FIELDS {
            if !columns.contains(&Column::Numeric(f)) {
                bail!("feat_list is missing numeric column {}", f);
            }
        }

        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Location labels the model was trained on, in column order.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match c {
            Column::Location(l) => Some(l.as_str()),
            Column::Numeric(_) => None,
        })
    }

    /// Single-row input vector. A location the model never saw leaves every
    /// location column at zero.
    pub fn encode(&self, row: &PropertyFeatures) -> Vec<f32> {
        if !self.locations().any(|l| l == row.location) {
            tracing::debug!("unseen location {:?}; encoding as all-zero", row.location);
        }
        self.columns
            .iter()
            .map(|c| match c {
                Column::Numeric(f) => row.numeric(f).unwrap_or(0.0) as f32,
                Column::Location(l) => {
                    if *l == row.location {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
            .collect()
    }
}

/// Applies the price floor and rounds half-to-even to whole rupiah.
pub fn clamp_price(raw: f64) -> Result<i64> {
    // f64::max drops a NaN operand, so NaN lands on the floor
    let p = raw.max(PRICE_FLOOR).round_ties_even();
    if !p.is_finite() || p >= i64::MAX as f64 {
        bail!("model output {} cannot be represented as a price", raw);
    }
    Ok(p as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn meta(cols: &[&str]) -> ModelMeta {
        ModelMeta {
            feat_list: cols.iter().map(|s| s.to_string()).collect(),
            in_dim: None,
        }
    }

    fn row(location: &str) -> PropertyFeatures {
        PropertyFeatures {
            location: location.into(),
            bed: 3.0,
            bath: 2.0,
            carport: 1.0,
            surface_area: 120.0,
            building_area: 90.0,
        }
    }

    const COLS: [&str; 8] = [
        "bed",
        "bath",
        "carport",
        "surface_area",
        "building_area",
        "location=Bantul",
        "location=Sleman",
        "location=Yogyakarta",
    ];

    #[test]
    fn encodes_numeric_then_one_hot_in_meta_order() {
        let layout = FeatureLayout::from_meta(&meta(&COLS)).unwrap();
        assert_eq!(layout.len(), 8);
        assert_eq!(
            layout.encode(&row("Sleman")),
            vec![3.0, 2.0, 1.0, 120.0, 90.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(
            layout.locations().collect::<Vec<_>>(),
            vec!["Bantul", "Sleman", "Yogyakarta"]
        );
    }

    #[test]
    fn column_order_follows_meta_not_record() {
        let layout = FeatureLayout::from_meta(&meta(&[
            "location=Sleman",
            "building_area",
            "surface_area",
            "carport",
            "bath",
            "bed",
        ]))
        .unwrap();
        assert_eq!(
            layout.encode(&row("Sleman")),
            vec![1.0, 90.0, 120.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn unseen_location_encodes_as_zeros() {
        let layout = FeatureLayout::from_meta(&meta(&COLS)).unwrap();
        let v = layout.encode(&row("Gunungkidul"));
        assert_eq!(&v[5..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_bad_meta() {
        assert!(FeatureLayout::from_meta(&meta(&[])).is_err());
        assert!(FeatureLayout::from_meta(&meta(&["bed", "bath", "carport", "surface_area"])).is_err());
        assert!(FeatureLayout::from_meta(&meta(&[
            "bed", "bath", "carport", "surface_area", "building_area", "garden"
        ]))
        .is_err());
        assert!(FeatureLayout::from_meta(&meta(&[
            "bed", "bed", "bath", "carport", "surface_area", "building_area"
        ]))
        .is_err());

        let mut m = meta(&COLS);
        m.in_dim = Some(7);
        assert!(FeatureLayout::from_meta(&m).is_err());
        m.in_dim = Some(8);
        assert!(FeatureLayout::from_meta(&m).is_ok());
    }

    #[test]
    fn meta_loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"feat_list": ["bed","bath","carport","surface_area","building_area","location=Sleman"], "in_dim": 6}}"#
        )
        .unwrap();
        let m = ModelMeta::load(f.path()).unwrap();
        assert_eq!(m.in_dim, Some(6));
        assert_eq!(FeatureLayout::from_meta(&m).unwrap().len(), 6);
    }

    #[test]
    fn bundled_meta_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/yogyakarta_meta.json");
        let layout = FeatureLayout::from_meta(&ModelMeta::load(&path).unwrap()).unwrap();
        assert_eq!(layout.len(), 10);
        assert!(layout.locations().any(|l| l == "Sleman"));
    }

    #[test]
    fn missing_meta_file_names_the_path() {
        let err = ModelMeta::load(Path::new("/nonexistent/meta.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/meta.json"));
    }

    #[test]
    fn clamp_applies_floor_and_rounds() {
        assert_eq!(clamp_price(250.0).unwrap(), 1_000_000);
        assert_eq!(clamp_price(-3.0e9).unwrap(), 1_000_000);
        assert_eq!(clamp_price(f64::NAN).unwrap(), 1_000_000);
        assert_eq!(clamp_price(1_250_000.4).unwrap(), 1_250_000);
        assert_eq!(clamp_price(1_250_000.5).unwrap(), 1_250_000);
        assert_eq!(clamp_price(1_250_001.5).unwrap(), 1_250_002);
        assert_eq!(clamp_price(875_000_000.0).unwrap(), 875_000_000);
    }

    #[test]
    fn clamp_rejects_unrepresentable_output() {
        assert!(clamp_price(f64::INFINITY).is_err());
        assert!(clamp_price(1.0e30).is_err());
    }
}
