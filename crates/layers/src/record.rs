use foundation::Coordinate;
use foundation::math::parse_degrees;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Stable key of a record within its category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(s: &str) -> Self {
        MarkerId(s.to_string())
    }
}

/// A single point of interest.
///
/// `coordinate` is `None` when the source value was missing or unusable; such
/// records stay in the dataset but never render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub label: String,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub coordinate: Option<Coordinate>,
}

impl MarkerRecord {
    pub fn new(id: impl Into<String>, label: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: MarkerId(id.into()),
            label: label.into(),
            coordinate: Some(coordinate),
        }
    }

    pub fn without_coordinate(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: MarkerId(id.into()),
            label: label.into(),
            coordinate: None,
        }
    }
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coordinate_from_value))
}

/// Interpret `{"latitude": .., "longitude": ..}` with numeric or string values.
pub fn coordinate_from_value(value: &Value) -> Option<Coordinate> {
    let obj = value.as_object()?;
    let lat = parse_degrees(obj.get("latitude")?)?;
    let lon = parse_degrees(obj.get("longitude")?)?;
    Coordinate::new(lat, lon).ok()
}

#[cfg(test)]
mod tests {
    use super::{MarkerId, MarkerRecord};
    use foundation::Coordinate;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_valid_record() {
        let r: MarkerRecord = serde_json::from_str(
            r#"{"id":"rs-1","label":"Gapyeong","coordinate":{"latitude":37.8,"longitude":127.5}}"#,
        )
        .unwrap();
        assert_eq!(
            r,
            MarkerRecord::new("rs-1", "Gapyeong", Coordinate::new(37.8, 127.5).unwrap())
        );
    }

    #[test]
    fn malformed_coordinates_become_none() {
        for coord in [
            "null",
            r#"{"latitude":"abc","longitude":127.0}"#,
            r#"{"latitude":37.0}"#,
            r#"{"latitude":95.0,"longitude":127.0}"#,
            r#""37.0,127.0""#,
        ] {
            let text = format!(r#"{{"id":"x","label":"X","coordinate":{coord}}}"#);
            let r: MarkerRecord = serde_json::from_str(&text).unwrap();
            assert_eq!(r.coordinate, None, "input {coord}");
        }

        let missing: MarkerRecord = serde_json::from_str(r#"{"id":"x","label":"X"}"#).unwrap();
        assert_eq!(missing.coordinate, None);
    }

    #[test]
    fn accepts_numeric_strings() {
        let r: MarkerRecord = serde_json::from_str(
            r#"{"id":"x","label":"X","coordinate":{"latitude":"37.25","longitude":" 127.5"}}"#,
        )
        .unwrap();
        assert_eq!(r.coordinate, Some(Coordinate::new(37.25, 127.5).unwrap()));
        assert_eq!(r.id, MarkerId::from("x"));
    }
}
