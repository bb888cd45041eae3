//! Spring-water (yaksuteo) measuring points from the public water-quality service.
//!
//! The service answers with XML shaped like
//! `response/body/items/item`, where each item carries a name (`ptNm`) and a
//! position split into degrees/minutes/seconds (`latDgr`, `latMin`, `latSec`,
//! `lonDgr`, `lonMin`, `lonSec`).

use std::collections::HashMap;

use foundation::Coordinate;
use foundation::math::Dms;
use layers::{Category, MarkerId, MarkerRecord};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::BoxFuture;
use crate::dataset::{DatasetError, DatasetSource};

pub const DEFAULT_SPRING_WATER_URL: &str =
    "http://apis.data.go.kr/1480523/WaterQualityService/getWaterMeasuringList";

const ITEM_PATH: [&[u8]; 4] = [b"response", b"body", b"items", b"item"];

pub struct SpringWaterSource {
    client: reqwest::Client,
    url: String,
}

impl SpringWaterSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Build the request URL from the service base and an already URL-encoded key.
    pub fn with_service_key(client: reqwest::Client, base_url: &str, service_key: &str) -> Self {
        Self::new(
            client,
            format!("{base_url}?serviceKey={service_key}&resultType=xml"),
        )
    }

    async fn fetch(&self) -> Result<Vec<MarkerRecord>, DatasetError> {
        debug!("requesting spring water measuring points");
        let text = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_spring_water_xml(&text)
    }
}

impl DatasetSource for SpringWaterSource {
    fn category(&self) -> Category {
        Category::SpringWater
    }

    fn load(&self) -> BoxFuture<'_, Result<Vec<MarkerRecord>, DatasetError>> {
        Box::pin(self.fetch())
    }
}

/// Parse a measuring-list response into records.
///
/// Fails with [`DatasetError::Format`] when no `response/body/items/item`
/// element exists. Items whose DMS fields are missing or non-numeric keep
/// their name but get no coordinate.
pub fn parse_spring_water_xml(xml: &str) -> Result<Vec<MarkerRecord>, DatasetError> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut fields: HashMap<Vec<u8>, String> = HashMap::new();
    let mut records = Vec::new();
    let mut saw_item = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(e.local_name().as_ref().to_vec());
                if at_item(&path) {
                    saw_item = true;
                    fields.clear();
                }
            }
            Event::End(_) => {
                if at_item(&path) {
                    let index = records.len();
                    records.push(record_from_fields(index, &fields));
                }
                path.pop();
            }
            Event::Empty(e) => {
                path.push(e.local_name().as_ref().to_vec());
                if at_item(&path) {
                    saw_item = true;
                    records.push(MarkerRecord::without_coordinate(records.len().to_string(), ""));
                }
                path.pop();
            }
            Event::Text(e) => {
                let text = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                push_field_text(&path, &mut fields, text);
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                push_field_text(&path, &mut fields, text);
            }
            Event::GeneralRef(e) => {
                let name: &[u8] = e.as_ref();
                let resolved = match e.resolve_char_ref() {
                    Ok(Some(ch)) => Some(ch),
                    _ => match name {
                        b"amp" => Some('&'),
                        b"lt" => Some('<'),
                        b"gt" => Some('>'),
                        b"quot" => Some('"'),
                        b"apos" => Some('\''),
                        _ => None,
                    },
                };
                if let Some(ch) = resolved {
                    push_field_text(&path, &mut fields, ch.encode_utf8(&mut [0u8; 4]));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_item {
        return Err(DatasetError::Format(
            "response/body/items/item missing".to_string(),
        ));
    }
    Ok(records)
}

fn at_item(path: &[Vec<u8>]) -> bool {
    path.len() == ITEM_PATH.len() && path.iter().zip(ITEM_PATH).all(|(a, b)| a.as_slice() == b)
}

/// Append text belonging to a direct child of an item.
fn push_field_text(path: &[Vec<u8>], fields: &mut HashMap<Vec<u8>, String>, text: &str) {
    let Some((field, parent)) = path.split_last() else {
        return;
    };
    if !at_item(parent) {
        return;
    }
    fields.entry(field.clone()).or_default().push_str(text);
}

fn record_from_fields(index: usize, fields: &HashMap<Vec<u8>, String>) -> MarkerRecord {
    let text = |key: &str| fields.get(key.as_bytes()).map(|s| s.trim());
    let number = |key: &str| text(key).and_then(|s| s.parse::<f64>().ok());

    let label = text("ptNm").unwrap_or_default().to_string();
    let id = text("ptNo")
        .filter(|s| !s.is_empty())
        .map_or_else(|| index.to_string(), str::to_string);

    let dms = |prefix: &str| -> Option<Dms> {
        Some(Dms::new(
            number(&format!("{prefix}Dgr"))?,
            number(&format!("{prefix}Min"))?,
            number(&format!("{prefix}Sec"))?,
        ))
    };
    let coordinate = match (dms("lat"), dms("lon")) {
        (Some(lat), Some(lon)) => Coordinate::from_dms(lat, lon).ok(),
        _ => None,
    };

    MarkerRecord {
        id: MarkerId(id),
        label,
        coordinate,
    }
}
