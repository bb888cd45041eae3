use std::path::PathBuf;

use foundation::Coordinate;
use foundation::math::parse_degrees;
use layers::{Category, MarkerId, MarkerRecord, coordinate_from_value};
use serde_json::{Map, Value};

use crate::BoxFuture;
use crate::dataset::{DatasetError, DatasetSource};

const ID_KEYS: [&str; 3] = ["id", "no", "index"];
const LABEL_KEYS: [&str; 4] = ["label", "name", "title", "ptNm"];
const LAT_KEYS: [&str; 3] = ["lat", "latitude", "mapY"];
const LON_KEYS: [&str; 4] = ["lon", "lng", "longitude", "mapX"];

#[derive(Debug, Clone)]
enum Origin {
    Text(String),
    File(PathBuf),
}

/// Dataset shipped with the app as a JSON array of loosely-typed objects.
#[derive(Debug, Clone)]
pub struct BundledDataset {
    category: Category,
    origin: Origin,
}

impl BundledDataset {
    pub fn from_json(category: Category, json: impl Into<String>) -> Self {
        Self {
            category,
            origin: Origin::Text(json.into()),
        }
    }

    pub fn from_file(category: Category, path: impl Into<PathBuf>) -> Self {
        Self {
            category,
            origin: Origin::File(path.into()),
        }
    }
}

impl DatasetSource for BundledDataset {
    fn category(&self) -> Category {
        self.category
    }

    fn load(&self) -> BoxFuture<'_, Result<Vec<MarkerRecord>, DatasetError>> {
        Box::pin(async move {
            match &self.origin {
                Origin::Text(text) => parse_records(text),
                Origin::File(path) => {
                    let text = tokio::fs::read_to_string(path).await?;
                    parse_records(&text)
                }
            }
        })
    }
}

/// Parse a JSON array of point-of-interest objects.
///
/// Field names vary between sources, so several spellings are accepted (see
/// the `*_KEYS` tables). Missing ids fall back to the array index; unusable
/// coordinates become `None`; non-object entries are skipped.
pub fn parse_records(json: &str) -> Result<Vec<MarkerRecord>, DatasetError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(DatasetError::Format("expected a JSON array".to_string()));
    };

    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.as_object().map(|obj| record_from_object(index, obj)))
        .collect())
}

fn record_from_object(index: usize, obj: &Map<String, Value>) -> MarkerRecord {
    let id = first_of(obj, &ID_KEYS)
        .and_then(scalar_text)
        .unwrap_or_else(|| index.to_string());
    let label = first_of(obj, &LABEL_KEYS)
        .and_then(scalar_text)
        .unwrap_or_default();

    let coordinate = match obj.get("coordinate") {
        Some(nested) => coordinate_from_value(nested),
        None => flat_coordinate(obj),
    };

    MarkerRecord {
        id: MarkerId(id),
        label,
        coordinate,
    }
}

fn flat_coordinate(obj: &Map<String, Value>) -> Option<Coordinate> {
    let lat = parse_degrees(first_of(obj, &LAT_KEYS)?)?;
    let lon = parse_degrees(first_of(obj, &LON_KEYS)?)?;
    Coordinate::new(lat, lon).ok()
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
