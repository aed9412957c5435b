//! Metro median-rent index.
//!
//! `MarketRents` is built once at startup and shared by reference. A file-backed index is
//! read on first use and kept for the life of the value; a missing or malformed file leaves
//! an empty index, so market comparison simply becomes unavailable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Serialize;
use thiserror::Error;

use crate::config::MarketRentsConfig;
use crate::core::RentRange;
use crate::core::format::format_currency;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Failed to read rent index {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Rent index {path} is not a metro -> rent JSON object: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    /// Metro median is below the safe range.
    Below,
    Within,
    Above,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketComparison {
    pub metro: String,
    pub median_rent: f64,
    pub position: MarketPosition,
    pub summary: String,
}

#[derive(Debug)]
pub struct MarketRents {
    source: Option<PathBuf>,
    index: OnceLock<HashMap<String, f64>>,
}

fn metro_key(metro: &str) -> String {
    metro.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn clean_index(raw: HashMap<String, f64>) -> HashMap<String, f64> {
    raw.into_iter()
        .filter(|(_, rent)| rent.is_finite() && *rent > 0.0)
        .map(|(metro, rent)| (metro_key(&metro), rent))
        .collect()
}

pub fn load_index(path: &Path) -> Result<HashMap<String, f64>, MarketDataError> {
    let text = std::fs::read_to_string(path).map_err(|source| MarketDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: HashMap<String, f64> =
        serde_json::from_str(&text).map_err(|source| MarketDataError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(clean_index(raw))
}

impl MarketRents {
    pub fn from_config(config: &MarketRentsConfig) -> Self {
        Self {
            source: config.index_path.clone(),
            index: OnceLock::new(),
        }
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let raw = entries
            .into_iter()
            .map(|(metro, rent)| (metro.to_string(), rent))
            .collect();
        Self {
            source: None,
            index: OnceLock::from(clean_index(raw)),
        }
    }

    fn index(&self) -> &HashMap<String, f64> {
        self.index.get_or_init(|| {
            let Some(path) = &self.source else {
                return HashMap::new();
            };
            match load_index(path) {
                Ok(index) => {
                    tracing::info!(
                        path = %path.display(),
                        metros = index.len(),
                        "loaded rent index"
                    );
                    index
                }
                Err(err) => {
                    tracing::warn!(error = %err, "rent index unavailable");
                    HashMap::new()
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index().is_empty()
    }

    pub fn median_rent(&self, metro: &str) -> Option<f64> {
        self.index().get(&metro_key(metro)).copied()
    }

    /// Where the metro median sits relative to a safe rent range. `None` for an unknown metro
    /// or an empty range.
    pub fn compare_to_market(&self, range: &RentRange, metro: &str) -> Option<MarketComparison> {
        if range.is_empty() {
            return None;
        }
        let median_rent = self.median_rent(metro)?;
        let position = if median_rent < range.low {
            MarketPosition::Below
        } else if median_rent > range.high {
            MarketPosition::Above
        } else {
            MarketPosition::Within
        };
        let median = format_currency(median_rent);
        let summary = match position {
            MarketPosition::Below => format!("Typical rent of {median} is below your safe range"),
            MarketPosition::Within => format!("Typical rent of {median} fits your safe range"),
            MarketPosition::Above => format!("Typical rent of {median} is above your safe range"),
        };
        Some(MarketComparison {
            metro: metro.trim().to_string(),
            median_rent,
            position,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculate_rent_range;
    use std::io::Write;

    fn sample() -> MarketRents {
        MarketRents::from_entries([
            ("Austin, TX", 1_650.0),
            ("San Francisco, CA", 3_300.0),
            ("Tulsa, OK", 1_050.0),
            ("Nowhere", -5.0),
        ])
    }

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let rents = sample();
        assert_eq!(rents.median_rent("  austin,   tx "), Some(1_650.0));
        assert_eq!(rents.median_rent("Boston, MA"), None);
        assert_eq!(rents.median_rent("Nowhere"), None);
        assert_eq!(rents.len(), 3);
    }

    #[test]
    fn comparison_positions() {
        let rents = sample();
        let range = calculate_rent_range(Some(5_000.0), None);

        let within = rents.compare_to_market(&range, "Austin, TX").expect("known metro");
        assert_eq!(within.position, MarketPosition::Within);
        assert_eq!(within.summary, "Typical rent of $1,650 fits your safe range");

        let above = rents.compare_to_market(&range, "San Francisco, CA").expect("known metro");
        assert_eq!(above.position, MarketPosition::Above);

        let below = rents.compare_to_market(&range, "Tulsa, OK").expect("known metro");
        assert_eq!(below.position, MarketPosition::Below);
    }

    #[test]
    fn empty_range_or_unknown_metro_has_no_comparison() {
        let rents = sample();
        assert!(rents.compare_to_market(&RentRange::empty(), "Austin, TX").is_none());
        let range = calculate_rent_range(Some(5_000.0), None);
        assert!(rents.compare_to_market(&range, "Boston, MA").is_none());
    }

    #[test]
    fn file_index_loads_once() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"Denver, CO": 1900, "Boise, ID": 1500}}"#).expect("write index");
        let rents = MarketRents::from_config(&MarketRentsConfig {
            index_path: Some(file.path().to_path_buf()),
        });
        assert_eq!(rents.median_rent("denver, co"), Some(1_900.0));

        // Later edits are not picked up.
        std::fs::write(file.path(), "{}").expect("rewrite index");
        assert_eq!(rents.len(), 2);
    }

    #[test]
    fn malformed_or_missing_index_is_empty() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[1, 2, 3]").expect("write index");
        assert!(matches!(
            load_index(file.path()),
            Err(MarketDataError::Parse { .. })
        ));
        let rents = MarketRents::from_config(&MarketRentsConfig {
            index_path: Some(file.path().to_path_buf()),
        });
        assert!(rents.is_empty());

        let missing = Path::new("/definitely/not/here.json");
        assert!(matches!(load_index(missing), Err(MarketDataError::Io { .. })));
        assert!(MarketRents::from_config(&MarketRentsConfig::default()).is_empty());
    }
}
