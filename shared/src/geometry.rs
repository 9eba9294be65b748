use std::str::FromStr;

use geojson::GeoJson;
use serde_json::{Map, Value};

use crate::error::ChoroplethError;

/// Longitude/latitude pair in degrees. Extra ordinates (altitude) are dropped on parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl TryFrom<&[f64]> for Position {
    type Error = ChoroplethError;

    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        match value {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(ChoroplethError::ShortPosition(value.len())),
        }
    }
}

impl From<[f64; 2]> for Position {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self::new(lon, lat)
    }
}

pub type Ring = Vec<Position>;
pub type PolygonRings = Vec<Ring>;

/// Area geometries are drawn and hit-tested; anything else converts to `Other` and is ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon { coordinates: PolygonRings },
    MultiPolygon { coordinates: Vec<PolygonRings> },
    Other,
}

impl Geometry {
    pub fn polygons(&self) -> &[PolygonRings] {
        match self {
            Self::Polygon { coordinates } => std::slice::from_ref(coordinates),
            Self::MultiPolygon { coordinates } => coordinates,
            Self::Other => &[],
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.polygons().iter().flatten().flatten()
    }
}

fn convert_rings(rings: &[Vec<geojson::Position>]) -> Result<PolygonRings, ChoroplethError> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|p| Position::try_from(p.as_slice()))
                .collect::<Result<Ring, _>>()
        })
        .collect()
}

/// Polygons nested anywhere under `value`; collections are flattened.
fn collect_polygons(
    value: &geojson::Value,
    out: &mut Vec<PolygonRings>,
) -> Result<(), ChoroplethError> {
    match value {
        geojson::Value::Polygon(rings) => out.push(convert_rings(rings)?),
        geojson::Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(convert_rings(rings)?);
            }
        }
        geojson::Value::GeometryCollection(members) => {
            for member in members {
                collect_polygons(&member.value, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

impl TryFrom<&geojson::Geometry> for Geometry {
    type Error = ChoroplethError;

    fn try_from(geometry: &geojson::Geometry) -> Result<Self, Self::Error> {
        Ok(match &geometry.value {
            geojson::Value::Polygon(rings) => Self::Polygon {
                coordinates: convert_rings(rings)?,
            },
            value => {
                let mut polygons = Vec::new();
                collect_polygons(value, &mut polygons)?;
                if polygons.is_empty() {
                    Self::Other
                } else {
                    Self::MultiPolygon {
                        coordinates: polygons,
                    }
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .as_ref()
            .and_then(|props| props.get(key))
            .filter(|value| !value.is_null())
    }

    /// Identifier used to join this feature to data points: `properties[property_key]`,
    /// falling back to the top-level `id`.
    pub fn key(&self, property_key: &str) -> Option<String> {
        self.property(property_key)
            .or_else(|| self.id.as_ref().filter(|id| !id.is_null()))
            .and_then(key_from_value)
    }

    pub fn polygons(&self) -> &[PolygonRings] {
        self.geometry.as_ref().map(Geometry::polygons).unwrap_or(&[])
    }
}

impl TryFrom<geojson::Feature> for Feature {
    type Error = ChoroplethError;

    fn try_from(feature: geojson::Feature) -> Result<Self, Self::Error> {
        let id = feature.id.map(|id| match id {
            geojson::feature::Id::String(s) => Value::String(s),
            geojson::feature::Id::Number(n) => Value::Number(n),
        });
        let geometry = feature.geometry.as_ref().map(Geometry::try_from).transpose()?;
        Ok(Self {
            id,
            geometry,
            properties: feature.properties,
        })
    }
}

fn key_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(
            n.as_i64()
                .map(|i| i.to_string())
                .or_else(|| n.as_u64().map(|u| u.to_string()))
                .unwrap_or_else(|| n.as_f64().map(|f| f.to_string()).unwrap_or_default()),
        ),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parse a GeoJSON document. A lone `Feature` or `Geometry` becomes a one-feature collection.
    pub fn from_json(json: &str) -> Result<Self, ChoroplethError> {
        Self::try_from(GeoJson::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ChoroplethError> {
        Self::try_from(GeoJson::from_json_value(value)?)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(Geometry::positions)
    }
}

impl TryFrom<GeoJson> for FeatureCollection {
    type Error = ChoroplethError;

    fn try_from(geojson: GeoJson) -> Result<Self, Self::Error> {
        let features = match geojson {
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .map(Feature::try_from)
                .collect::<Result<_, _>>()?,
            GeoJson::Feature(feature) => vec![Feature::try_from(feature)?],
            GeoJson::Geometry(geometry) => vec![Feature {
                geometry: Some(Geometry::try_from(&geometry)?),
                ..Feature::default()
            }],
        };
        tracing::debug!(features = features.len(), "parsed GeoJSON");
        Ok(Self::new(features))
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_polygon_and_multipolygon_features() {
        let fc = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "A",
                    "properties": { "name": "Alpha" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0, 0], [0, 1], [1, 1, 30], [0, 0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "iso": 7 },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[0, 0], [0, 1], [1, 1], [0, 0]]],
                            [[[5, 5], [5, 6], [6, 6], [5, 5]]]
                        ]
                    }
                }
            ]
        }))
        .expect("collection should parse");

        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].polygons().len(), 1);
        assert_eq!(fc.features[0].polygons()[0][0][2], Position::new(1.0, 1.0));
        assert_eq!(fc.features[1].polygons().len(), 2);
        assert_eq!(fc.positions().count(), 12);
    }

    #[test]
    fn non_area_geometry_is_ignored() {
        let fc = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [1, 2] },
                    "properties": {}
                },
                { "type": "Feature", "geometry": null, "properties": null }
            ]
        }))
        .expect("collection should parse");

        assert_eq!(fc.features[0].geometry, Some(Geometry::Other));
        assert!(fc.features[0].polygons().is_empty());
        assert!(fc.features[1].polygons().is_empty());
    }

    #[test]
    fn short_positions_are_rejected() {
        let err = FeatureCollection::from_json(
            r#"{"type":"Feature","properties":null,
                "geometry":{"type":"Polygon","coordinates":[[[1]]]}}"#,
        )
        .expect_err("one-ordinate position must fail");
        assert!(matches!(
            err,
            ChoroplethError::ShortPosition(1) | ChoroplethError::InvalidGeoJson(_)
        ));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let err = FeatureCollection::from_json("{ nope").expect_err("not JSON");
        assert!(matches!(err, ChoroplethError::InvalidGeoJson(_)));

        let err = FeatureCollection::from_value(json!({ "type": "Atlas", "features": [] }))
            .expect_err("unknown GeoJSON type");
        assert!(matches!(err, ChoroplethError::InvalidGeoJson(_)));
    }

    #[test]
    fn lone_feature_and_geometry_collection() {
        let fc = FeatureCollection::from_value(json!({
            "type": "Feature",
            "id": 4,
            "properties": null,
            "geometry": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Point", "coordinates": [9, 9] },
                    { "type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1], [0, 0]]] },
                    { "type": "Polygon", "coordinates": [[[2, 2], [2, 3], [3, 3], [2, 2]]] }
                ]
            }
        }))
        .expect("feature should parse");

        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].key("id").as_deref(), Some("4"));
        assert_eq!(fc.features[0].polygons().len(), 2);

        let bare = FeatureCollection::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[0, 0], [0, 1], [1, 1], [0, 0]]]
        }))
        .expect("geometry should parse");
        assert_eq!(bare.len(), 1);
        assert_eq!(bare.features[0].key("id"), None);
        assert_eq!(bare.positions().count(), 4);
    }

    #[test]
    fn key_prefers_property_then_id() {
        let feature = Feature {
            id: Some(json!(840)),
            geometry: None,
            properties: Some(Map::from_iter([
                ("iso_a3".to_string(), json!("USA")),
                ("empty".to_string(), Value::Null),
            ])),
        };

        assert_eq!(feature.key("iso_a3").as_deref(), Some("USA"));
        assert_eq!(feature.key("empty").as_deref(), Some("840"));
        assert_eq!(feature.key("missing").as_deref(), Some("840"));
    }

    #[test]
    fn key_stringifies_numbers_like_display() {
        let float_id = Feature {
            id: Some(json!(4.5)),
            ..Feature::default()
        };
        let bool_prop = Feature {
            properties: Some(Map::from_iter([("flag".to_string(), json!(true))])),
            ..Feature::default()
        };

        assert_eq!(float_id.key("id").as_deref(), Some("4.5"));
        assert_eq!(bool_prop.key("flag").as_deref(), Some("true"));
        assert_eq!(Feature::default().key("id"), None);
    }
}
