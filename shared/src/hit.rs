use crate::geometry::{FeatureCollection, Position};
use crate::projection::Projection;
use crate::spherical::{feature_area, feature_contains};
use crate::zoom::ZoomTransform;

/// Spherical area of every feature, in feature order. Geometry-only, so computed once per
/// geometry change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaCache {
    areas: Vec<f64>,
}

impl AreaCache {
    pub fn build(geometry: &FeatureCollection) -> Self {
        Self {
            areas: geometry.features.iter().map(feature_area).collect(),
        }
    }

    pub fn area(&self, index: usize) -> Option<f64> {
        self.areas.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// Index of the feature under `point` (canvas CSS pixels).
///
/// The zoom transform is undone first, then the projection. Among containing features the
/// smallest wins, so an enclave beats the region around it. Features larger than `max_area`
/// are skipped: they are almost always rings wound the wrong way, covering the rest of the
/// globe.
pub fn feature_at_point(
    geometry: &FeatureCollection,
    areas: &AreaCache,
    projection: &Projection,
    transform: ZoomTransform,
    point: [f64; 2],
    max_area: f64,
) -> Option<usize> {
    let projected = transform.invert(point);
    let [lon, lat] = projection.inverse(projected)?;
    if !(lon.is_finite() && lat.is_finite()) {
        return None;
    }
    let position = Position::new(lon, lat);

    let mut best: Option<(usize, f64)> = None;
    for (index, feature) in geometry.features.iter().enumerate() {
        let area = areas
            .area(index)
            .unwrap_or_else(|| feature_area(feature));
        if !area.is_finite() || area > max_area {
            continue;
        }
        if best.is_some_and(|(_, best_area)| area >= best_area) {
            continue;
        }
        if feature_contains(feature, position) {
            best = Some((index, area));
        }
    }
    best.map(|(index, _)| index)
}
