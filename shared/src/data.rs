use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ChoroplethError;

/// One value keyed to a feature. `label` overrides the "Value" caption in tooltips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DataPoint {
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// id -> value at one instant.
pub type Snapshot = HashMap<String, f64>;

/// Value equality that treats two NaNs at the same id as equal.
pub fn snapshots_equal(a: &Snapshot, b: &Snapshot) -> bool {
    a.len() == b.len()
        && a.iter().all(|(id, va)| {
            b.get(id)
                .is_some_and(|vb| va == vb || (va.is_nan() && vb.is_nan()))
        })
}

/// Blend two snapshots; ids missing from `from` take the `to` value directly. Ids only in
/// `from` are dropped.
pub fn blend_snapshots(from: &Snapshot, to: &Snapshot, t: f64) -> Snapshot {
    to.iter()
        .map(|(id, &target)| {
            let value = match from.get(id) {
                Some(&prev) => prev + (target - prev) * t,
                None => target,
            };
            (id.clone(), value)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    /// Used when there is nothing finite to derive a domain from.
    pub const FALLBACK: Self = Self::new(0.0, 100.0);

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Min/max over the finite values, or [`Domain::FALLBACK`].
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, v| {
                Some(match acc {
                    Some(d) => Self::new(d.min.min(v), d.max.max(v)),
                    None => Self::new(v, v),
                })
            })
            .unwrap_or(Self::FALLBACK)
    }

    /// Explicit domain if configured, otherwise the extent of the snapshot.
    pub fn resolve(explicit: Option<Self>, snapshot: &Snapshot) -> Self {
        explicit.unwrap_or_else(|| Self::from_values(snapshot.values().copied()))
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn lerp(from: Self, to: Self, t: f64) -> Self {
        Self::new(
            from.min + (to.min - from.min) * t,
            from.max + (to.max - from.max) * t,
        )
    }
}

impl From<[f64; 2]> for Domain {
    fn from([min, max]: [f64; 2]) -> Self {
        Self::new(min, max)
    }
}

impl From<Domain> for [f64; 2] {
    fn from(d: Domain) -> Self {
        [d.min, d.max]
    }
}

/// Data points by id. Later points win over earlier ones with the same id.
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    points: HashMap<String, DataPoint>,
}

impl DataIndex {
    pub fn build(points: &[DataPoint]) -> Self {
        let mut map = HashMap::with_capacity(points.len());
        let mut duplicates: Vec<&str> = Vec::new();
        for point in points {
            if map.insert(point.id.clone(), point.clone()).is_some()
                && !duplicates.contains(&point.id.as_str())
            {
                duplicates.push(&point.id);
            }
        }
        if !duplicates.is_empty() {
            tracing::warn!(
                ids = ?duplicates,
                "duplicate data point ids; the last occurrence of each is used"
            );
        }
        Self { points: map }
    }

    pub fn get(&self, id: &str) -> Option<&DataPoint> {
        self.points.get(id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.points
            .iter()
            .map(|(id, point)| (id.clone(), point.value))
            .collect()
    }
}

/// Reject input with repeated ids instead of silently keeping the last one.
pub fn validate_unique_ids(points: &[DataPoint]) -> Result<(), ChoroplethError> {
    let mut seen = HashSet::with_capacity(points.len());
    for point in points {
        if !seen.insert(point.id.as_str()) {
            return Err(ChoroplethError::DuplicateDataId(point.id.clone()));
        }
    }
    Ok(())
}
