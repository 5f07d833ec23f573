//! Country boundary table: GeoJSON territories and point-in-polygon lookup.
//!
//! Accepts a FeatureCollection of Polygon / MultiPolygon features. The alpha-2 code is read
//! from the first present property of `iso1A2`, `ISO_A2`, `iso_a2`. Features without a
//! valid code (Natural Earth uses `-99`) are skipped.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::country::{Coordinate, CountryCode, CountryLookup};

const CODE_PROPERTIES: [&str; 3] = ["iso1A2", "ISO_A2", "iso_a2"];

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

impl Geometry {
    /// Points, lines and collections carry no area; those yield `Ok(None)`.
    fn from_value(value: Value) -> Result<Option<Self>, serde_json::Error> {
        match value.get("type").and_then(Value::as_str) {
            Some("Polygon" | "MultiPolygon") => serde_json::from_value(value).map(Some),
            _ => Ok(None),
        }
    }
}

type Ring = Vec<[f64; 2]>;

struct Polygon {
    exterior: Ring,
    holes: Vec<Ring>,
}

impl Polygon {
    fn from_rings(rings: Vec<Vec<Vec<f64>>>) -> Option<Self> {
        let mut rings = rings.into_iter().map(to_ring);
        // A degenerate exterior drops the whole polygon; its holes must not stand in for it.
        let exterior = rings.next().filter(|r| r.len() >= 3)?;
        Some(Self {
            exterior,
            holes: rings.filter(|r| r.len() >= 3).collect(),
        })
    }

    fn contains(&self, p: [f64; 2]) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_area(h)).sum();
        (ring_area(&self.exterior) - holes).max(0.0)
    }
}

/// Bounding box: (min_lon, min_lat, max_lon, max_lat).
#[derive(Debug, Clone, Copy)]
struct BBox(f64, f64, f64, f64);

impl BBox {
    fn of(polygons: &[Polygon]) -> Self {
        let mut b = BBox(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for [lon, lat] in polygons.iter().flat_map(|p| p.exterior.iter().copied()) {
            b.0 = b.0.min(lon);
            b.1 = b.1.min(lat);
            b.2 = b.2.max(lon);
            b.3 = b.3.max(lat);
        }
        b
    }

    fn contains(&self, [lon, lat]: [f64; 2]) -> bool {
        lon >= self.0 && lon <= self.2 && lat >= self.1 && lat <= self.3
    }
}

struct Territory {
    code: CountryCode,
    polygons: Vec<Polygon>,
    bbox: BBox,
    area: f64,
}

/// Loaded boundary dataset. Lookup is pure and deterministic for a given table.
pub struct BoundaryTable {
    territories: Vec<Territory>,
}

impl BoundaryTable {
    /// Parse a GeoJSON FeatureCollection.
    pub fn from_geojson(text: &str) -> Result<Self, BoundaryError> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        let mut territories = Vec::new();
        for feature in collection.features {
            let Some(code) = feature.properties.as_ref().and_then(feature_code) else {
                continue;
            };
            let Some(geometry) = feature.geometry else {
                continue;
            };
            let polygons: Vec<Polygon> = match Geometry::from_value(geometry)? {
                Some(Geometry::Polygon { coordinates }) => {
                    Polygon::from_rings(coordinates).into_iter().collect()
                }
                Some(Geometry::MultiPolygon { coordinates }) => coordinates
                    .into_iter()
                    .filter_map(Polygon::from_rings)
                    .collect(),
                None => continue,
            };
            if polygons.is_empty() {
                continue;
            }
            let bbox = BBox::of(&polygons);
            let area = polygons.iter().map(Polygon::area).sum();
            territories.push(Territory {
                code,
                polygons,
                bbox,
                area,
            });
        }
        if territories.is_empty() {
            return Err(BoundaryError::Empty);
        }
        Ok(Self { territories })
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }
}

impl CountryLookup for BoundaryTable {
    /// Smallest matching territory wins, so enclaves resolve even when the enclosing
    /// country carries no hole for them.
    fn lookup(&self, coordinate: Coordinate) -> Option<CountryCode> {
        if !coordinate.is_valid() {
            return None;
        }
        let p = coordinate.as_lon_lat();
        self.territories
            .iter()
            .filter(|t| t.bbox.contains(p) && t.polygons.iter().any(|poly| poly.contains(p)))
            .min_by(|a, b| a.area.total_cmp(&b.area))
            .map(|t| t.code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    #[error("invalid boundary GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("boundary data contains no territories with an alpha-2 code")]
    Empty,
}

fn feature_code(props: &Map<String, Value>) -> Option<CountryCode> {
    CODE_PROPERTIES
        .iter()
        .find_map(|k| props.get(*k).and_then(Value::as_str))
        .and_then(|s| s.parse().ok())
}

fn to_ring(positions: Vec<Vec<f64>>) -> Ring {
    positions
        .into_iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

/// Even-odd ray cast. Closed or open rings both work.
fn ring_contains(ring: &[[f64; 2]], [x, y]: [f64; 2]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let mut sum = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        sum += (ring[j][0] + ring[i][0]) * (ring[j][1] - ring[i][1]);
        j = i;
    }
    (sum / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two square "countries", one with a hole holding an enclave, plus an island pair.
    const FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"iso1A2": "AA"},
             "geometry": {"type": "Polygon", "coordinates": [
                [[0,0],[10,0],[10,10],[0,10],[0,0]],
                [[4,4],[6,4],[6,6],[4,6],[4,4]]
             ]}},
            {"type": "Feature", "properties": {"iso1A2": "EN"},
             "geometry": {"type": "Polygon", "coordinates": [
                [[4,4],[6,4],[6,6],[4,6],[4,4]]
             ]}},
            {"type": "Feature", "properties": {"ISO_A2": "BB"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[20,0],[25,0],[25,5],[20,5],[20,0]]],
                [[[30,0],[32,0],[32,2,0],[30,2],[30,0]]]
             ]}},
            {"type": "Feature", "properties": {"ISO_A2": "-99"},
             "geometry": {"type": "Polygon", "coordinates": [[[50,50],[51,50],[51,51],[50,50]]]}},
            {"type": "Feature", "properties": {"iso1A2": "CC"},
             "geometry": {"type": "Point", "coordinates": [70, 70]}}
        ]
    }"#;

    fn code(s: &str) -> CountryCode {
        s.parse().unwrap()
    }

    #[test]
    fn loads_only_coded_polygons() {
        let table = BoundaryTable::from_geojson(FIXTURE).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn point_inside_polygon() {
        let table = BoundaryTable::from_geojson(FIXTURE).unwrap();
        assert_eq!(table.lookup(Coordinate::new(1.0, 1.0)), Some(code("AA")));
        assert_eq!(table.lookup(Coordinate::new(9.5, 2.0)), Some(code("AA")));
    }

    #[test]
    fn hole_resolves_to_enclave() {
        let table = BoundaryTable::from_geojson(FIXTURE).unwrap();
        assert_eq!(table.lookup(Coordinate::new(5.0, 5.0)), Some(code("EN")));
    }

    #[test]
    fn smaller_territory_wins_overlap() {
        let table = BoundaryTable::from_geojson(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"iso1A2": "BI"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
                {"type": "Feature", "properties": {"iso1A2": "SM"},
                 "geometry": {"type": "Polygon", "coordinates": [[[4,4],[6,4],[6,6],[4,6],[4,4]]]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.lookup(Coordinate::new(5.0, 5.0)), Some(code("SM")));
        assert_eq!(table.lookup(Coordinate::new(1.0, 1.0)), Some(code("BI")));
    }

    #[test]
    fn degenerate_exterior_drops_polygon() {
        let table = BoundaryTable::from_geojson(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"iso1A2": "AA"},
                 "geometry": {"type": "Polygon", "coordinates": [
                    [[0,0],[10,0]],
                    [[4,4],[6,4],[6,6],[4,6],[4,4]]
                 ]}},
                {"type": "Feature", "properties": {"iso1A2": "BB"},
                 "geometry": {"type": "Polygon", "coordinates": [[[20,0],[30,0],[30,10],[20,10],[20,0]]]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(Coordinate::new(5.0, 5.0)), None);
        assert_eq!(table.lookup(Coordinate::new(25.0, 5.0)), Some(code("BB")));
    }

    #[test]
    fn multipolygon_parts() {
        let table = BoundaryTable::from_geojson(FIXTURE).unwrap();
        assert_eq!(table.lookup(Coordinate::new(22.0, 2.0)), Some(code("BB")));
        assert_eq!(table.lookup(Coordinate::new(31.0, 1.0)), Some(code("BB")));
        assert_eq!(table.lookup(Coordinate::new(27.0, 1.0)), None);
    }

    #[test]
    fn open_sea_is_unset() {
        let table = BoundaryTable::from_geojson(FIXTURE).unwrap();
        assert_eq!(table.lookup(Coordinate::new(-30.0, -30.0)), None);
        assert_eq!(table.lookup(Coordinate::new(50.5, 50.2)), None);
        assert_eq!(table.lookup(Coordinate::new(f64::NAN, 1.0)), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            BoundaryTable::from_geojson("not json"),
            Err(BoundaryError::Parse(_))
        ));
        assert!(matches!(
            BoundaryTable::from_geojson(r#"{"type":"FeatureCollection","features":[]}"#),
            Err(BoundaryError::Empty)
        ));
    }
}
