//! Geographic projections: lon/lat degrees to screen pixels and back.
//!
//! Each projection is a raw spherical projection (radians in, unit plane out) composed with
//! a three-axis rotation and a scale/translate that puts `center` at `translate`. AlbersUsa
//! is a composite of three conic insets selected by screen extent.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::{Deserialize, Serialize};

use crate::geometry::{FeatureCollection, Position};

const EPSILON: f64 = 1e-6;
/// Scale used while measuring geometry for a fit, before the real scale is known.
const FIT_REFERENCE_SCALE: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectionKind {
    Equirectangular,
    Orthographic,
    NaturalEarth1,
    Albers,
    AlbersUsa,
    ConicEqualArea,
    #[default]
    Mercator,
}

impl ProjectionKind {
    pub const ALL: [Self; 7] = [
        Self::Mercator,
        Self::Equirectangular,
        Self::NaturalEarth1,
        Self::Orthographic,
        Self::ConicEqualArea,
        Self::Albers,
        Self::AlbersUsa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Equirectangular => "equirectangular",
            Self::Orthographic => "orthographic",
            Self::NaturalEarth1 => "naturalEarth1",
            Self::Albers => "albers",
            Self::AlbersUsa => "albersUsa",
            Self::ConicEqualArea => "conicEqualArea",
            Self::Mercator => "mercator",
        }
    }

    /// Unknown names fall back to Mercator.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// Azimuthal projections never cut at the antimeridian.
    pub fn is_azimuthal(self) -> bool {
        matches!(self, Self::Orthographic)
    }
}

impl From<String> for ProjectionKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ProjectionKind> for String {
    fn from(kind: ProjectionKind) -> Self {
        kind.name().to_string()
    }
}

fn asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

/// Zero maps to zero, unlike `f64::signum`.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn wrap_lambda(lambda: f64) -> f64 {
    if lambda.abs() > PI {
        lambda - (lambda / TAU).round() * TAU
    } else {
        lambda
    }
}

/// Raw spherical projections on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Raw {
    Mercator,
    Equirectangular,
    Orthographic,
    NaturalEarth1,
    ConicEqualArea { n: f64, c: f64, r0: f64 },
    CylindricalEqualArea { cos_phi0: f64 },
}

impl Raw {
    fn conic_equal_area(parallels: [f64; 2]) -> Self {
        let [phi0, phi1] = parallels.map(f64::to_radians);
        let sy0 = phi0.sin();
        let n = (sy0 + phi1.sin()) / 2.0;
        if n.abs() < EPSILON {
            return Self::CylindricalEqualArea {
                cos_phi0: phi0.cos(),
            };
        }
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        Self::ConicEqualArea {
            n,
            c,
            r0: c.sqrt() / n,
        }
    }

    fn forward(self, lambda: f64, phi: f64) -> (f64, f64) {
        match self {
            Self::Mercator => (lambda, ((FRAC_PI_2 + phi) / 2.0).tan().ln()),
            Self::Equirectangular => (lambda, phi),
            Self::Orthographic => (phi.cos() * lambda.sin(), phi.sin()),
            Self::NaturalEarth1 => {
                let phi2 = phi * phi;
                let phi4 = phi2 * phi2;
                let poly = 0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4);
                (
                    lambda
                        * (0.8707 - 0.131979 * phi2
                            + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
                    phi * (1.007226 + phi2 * poly),
                )
            }
            Self::ConicEqualArea { n, c, r0 } => {
                let r = (c - 2.0 * n * phi.sin()).sqrt() / n;
                let x = lambda * n;
                (r * x.sin(), r0 - r * x.cos())
            }
            Self::CylindricalEqualArea { cos_phi0 } => (lambda * cos_phi0, phi.sin() / cos_phi0),
        }
    }

    fn inverse(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Mercator => (x, 2.0 * y.exp().atan() - FRAC_PI_2),
            Self::Equirectangular => (x, y),
            Self::Orthographic => {
                let z = x.hypot(y);
                // Off the disc: asin of z > 1 is NaN, which the caller reports as no point.
                let c = z.asin();
                let (sc, cc) = c.sin_cos();
                let phi = if z == 0.0 { 0.0 } else { asin(y * sc / z) };
                ((x * sc).atan2(z * cc), phi)
            }
            Self::NaturalEarth1 => {
                let mut phi = y;
                for _ in 0..25 {
                    let phi2 = phi * phi;
                    let phi4 = phi2 * phi2;
                    let poly = 0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4);
                    let delta = (phi * (1.007226 + phi2 * poly) - y)
                        / (1.007226
                            + phi2
                                * (0.015085 * 3.0
                                    + phi4
                                        * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2
                                            - 0.005916 * 11.0 * phi4)));
                    phi -= delta;
                    if delta.abs() <= EPSILON {
                        break;
                    }
                }
                let phi2 = phi * phi;
                let phi6 = phi2 * phi2 * phi2;
                let poly = -0.013791 + phi6 * (0.003971 - 0.001529 * phi2);
                (x / (0.8707 + phi2 * (-0.131979 + phi2 * poly)), phi)
            }
            Self::ConicEqualArea { n, c, r0 } => {
                let r0y = r0 - y;
                let mut l = x.atan2(r0y.abs()) * sign(r0y);
                if r0y * n < 0.0 {
                    l -= PI * sign(x) * sign(r0y);
                }
                (l / n, asin((c - (x * x + r0y * r0y) * n * n) / (2.0 * n)))
            }
            Self::CylindricalEqualArea { cos_phi0 } => (x / cos_phi0, asin(y * cos_phi0)),
        }
    }
}

/// Rotation of the sphere by yaw (lambda), pitch (phi) and roll (gamma), in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rotation {
    delta_lambda: f64,
    tilted: bool,
    cos_phi: f64,
    sin_phi: f64,
    cos_gamma: f64,
    sin_gamma: f64,
}

impl Rotation {
    fn from_degrees([lambda, phi, gamma]: [f64; 3]) -> Self {
        let delta_lambda = (lambda % 360.0).to_radians() % TAU;
        let delta_phi = (phi % 360.0).to_radians();
        let delta_gamma = (gamma % 360.0).to_radians();
        Self {
            delta_lambda,
            tilted: delta_phi != 0.0 || delta_gamma != 0.0,
            cos_phi: delta_phi.cos(),
            sin_phi: delta_phi.sin(),
            cos_gamma: delta_gamma.cos(),
            sin_gamma: delta_gamma.sin(),
        }
    }

    fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_lambda(lambda + self.delta_lambda);
        if !self.tilted {
            return (lambda, phi);
        }
        let cos_p = phi.cos();
        let x = lambda.cos() * cos_p;
        let y = lambda.sin() * cos_p;
        let z = phi.sin();
        let k = z * self.cos_phi + x * self.sin_phi;
        (
            (y * self.cos_gamma - k * self.sin_gamma).atan2(x * self.cos_phi - z * self.sin_phi),
            asin(k * self.cos_gamma + y * self.sin_gamma),
        )
    }

    fn inverse(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let (lambda, phi) = if self.tilted {
            let cos_p = phi.cos();
            let x = lambda.cos() * cos_p;
            let y = lambda.sin() * cos_p;
            let z = phi.sin();
            let k = z * self.cos_gamma - y * self.sin_gamma;
            let lambda = (y * self.cos_gamma + z * self.sin_gamma)
                .atan2(x * self.cos_phi + k * self.sin_phi);
            (lambda, asin(k * self.cos_phi - x * self.sin_phi))
        } else {
            (lambda, phi)
        };
        (wrap_lambda(lambda - self.delta_lambda), phi)
    }
}

/// A located point: its screen position plus what the renderer needs to decide whether the
/// pen may stay down between two consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Located {
    point: [f64; 2],
    lambda: f64,
    part: u8,
}

/// One rotated raw projection with its own scale/translate.
#[derive(Debug, Clone, PartialEq)]
struct Single {
    raw: Raw,
    rotate_deg: [f64; 3],
    rotation: Rotation,
    center_deg: [f64; 2],
    scale: f64,
    translate: [f64; 2],
    dx: f64,
    dy: f64,
    clip_hemisphere: bool,
}

impl Single {
    fn new(raw: Raw, center_deg: [f64; 2], rotate_deg: [f64; 3]) -> Self {
        let mut single = Self {
            raw,
            rotate_deg,
            rotation: Rotation::from_degrees(rotate_deg),
            center_deg,
            scale: FIT_REFERENCE_SCALE,
            translate: [0.0, 0.0],
            dx: 0.0,
            dy: 0.0,
            clip_hemisphere: matches!(raw, Raw::Orthographic),
        };
        single.recenter();
        single
    }

    fn recenter(&mut self) {
        let lambda = (self.center_deg[0] % 360.0).to_radians();
        let phi = (self.center_deg[1] % 360.0).to_radians();
        let (cx, cy) = self.raw.forward(lambda, phi);
        self.dx = self.translate[0] - self.scale * cx;
        self.dy = self.translate[1] + self.scale * cy;
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
        self.recenter();
    }

    fn set_translate(&mut self, translate: [f64; 2]) {
        self.translate = translate;
        self.recenter();
    }

    fn set_center(&mut self, center_deg: [f64; 2]) {
        self.center_deg = center_deg;
        self.recenter();
    }

    fn set_rotation(&mut self, rotate_deg: [f64; 3]) {
        self.rotate_deg = rotate_deg;
        self.rotation = Rotation::from_degrees(rotate_deg);
    }

    fn locate(&self, lon: f64, lat: f64) -> Option<Located> {
        let (lambda, phi) = self
            .rotation
            .forward(lon.to_radians(), lat.to_radians());
        if self.clip_hemisphere && lambda.cos() * phi.cos() <= 0.0 {
            return None;
        }
        let (x, y) = self.raw.forward(lambda, phi);
        let point = [self.dx + self.scale * x, self.dy - self.scale * y];
        point.iter().all(|v| v.is_finite()).then_some(Located {
            point,
            lambda,
            part: 0,
        })
    }

    fn inverse(&self, [x, y]: [f64; 2]) -> Option<[f64; 2]> {
        let (lambda, phi) = self
            .raw
            .inverse((x - self.dx) / self.scale, (self.dy - y) / self.scale);
        let (lambda, phi) = self.rotation.inverse(lambda, phi);
        let lonlat = [lambda.to_degrees(), phi.to_degrees()];
        lonlat.iter().all(|v| v.is_finite()).then_some(lonlat)
    }
}

/// Screen-space box an inset accepts points in, relative to the lower-48 translate in units
/// of the lower-48 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
struct InsetExtent {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl InsetExtent {
    const LOWER48: Self = Self::new(-0.455, -0.238, 0.455, 0.238);
    const ALASKA: Self = Self::new(-0.425, 0.120, -0.214, 0.234);
    const HAWAII: Self = Self::new(-0.214, 0.166, -0.115, 0.234);

    const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Screen containment; insets shrink their box by epsilon on each side.
    fn contains(&self, [x, y]: [f64; 2], translate: [f64; 2], k: f64, pad: f64) -> bool {
        let [tx, ty] = translate;
        x >= tx + self.x0 * k + pad
            && x <= tx + self.x1 * k - pad
            && y >= ty + self.y0 * k + pad
            && y <= ty + self.y1 * k - pad
    }

    /// Inverse-side selection on normalized coordinates, half-open like the forward side.
    fn selects(&self, x: f64, y: f64) -> bool {
        y >= self.y0 && y < self.y1 && x >= self.x0 && x < self.x1
    }
}

/// Lower 48 states plus Alaska and Hawaii insets.
#[derive(Debug, Clone, PartialEq)]
struct AlbersUsa {
    lower48: Single,
    alaska: Single,
    hawaii: Single,
}

impl AlbersUsa {
    fn new() -> Self {
        Self {
            lower48: albers(),
            alaska: Single::new(
                Raw::conic_equal_area([55.0, 65.0]),
                [-2.0, 58.5],
                [154.0, 0.0, 0.0],
            ),
            hawaii: Single::new(
                Raw::conic_equal_area([8.0, 18.0]),
                [-3.0, 19.9],
                [157.0, 0.0, 0.0],
            ),
        }
    }

    fn set_scale(&mut self, k: f64) {
        self.lower48.set_scale(k);
        self.alaska.set_scale(k * 0.35);
        self.hawaii.set_scale(k);
        self.set_translate(self.lower48.translate);
    }

    fn set_translate(&mut self, [x, y]: [f64; 2]) {
        let k = self.lower48.scale;
        self.lower48.set_translate([x, y]);
        self.alaska.set_translate([x - 0.307 * k, y + 0.201 * k]);
        self.hawaii.set_translate([x - 0.205 * k, y + 0.212 * k]);
    }

    fn locate(&self, lon: f64, lat: f64) -> Option<Located> {
        let k = self.lower48.scale;
        let t = self.lower48.translate;
        let candidates = [
            (&self.lower48, InsetExtent::LOWER48, 0.0),
            (&self.alaska, InsetExtent::ALASKA, EPSILON),
            (&self.hawaii, InsetExtent::HAWAII, EPSILON),
        ];
        candidates
            .into_iter()
            .zip(0u8..)
            .find_map(|((inset, extent, pad), part)| {
                inset
                    .locate(lon, lat)
                    .filter(|hit| extent.contains(hit.point, t, k, pad))
                    .map(|hit| Located { part, ..hit })
            })
    }

    fn inverse(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        let k = self.lower48.scale;
        let [tx, ty] = self.lower48.translate;
        let x = (point[0] - tx) / k;
        let y = (point[1] - ty) / k;
        let inset = if InsetExtent::ALASKA.selects(x, y) {
            &self.alaska
        } else if InsetExtent::HAWAII.selects(x, y) {
            &self.hawaii
        } else {
            &self.lower48
        };
        inset.inverse(point)
    }
}

fn albers() -> Single {
    Single::new(
        Raw::conic_equal_area([29.5, 45.5]),
        [-0.6, 38.7],
        [96.0, 0.0, 0.0],
    )
}

#[derive(Debug, Clone, PartialEq)]
enum Inner {
    Single(Single),
    Composite(Box<AlbersUsa>),
}

/// A projected ring segment drawn with the pen down. `closed` runs are whole rings.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRun {
    pub points: Vec<[f64; 2]>,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    kind: ProjectionKind,
    inner: Inner,
}

impl Projection {
    /// Translate is always the viewport centre. Without an explicit scale the projection uses
    /// `min(width, height) / 2 / π * 0.9`. Center and rotation are ignored for AlbersUsa.
    pub fn new(
        kind: ProjectionKind,
        width: f64,
        height: f64,
        center: Option<[f64; 2]>,
        scale: Option<f64>,
        rotation: Option<[f64; 3]>,
    ) -> Self {
        let inner = match kind {
            ProjectionKind::AlbersUsa => Inner::Composite(Box::new(AlbersUsa::new())),
            ProjectionKind::Albers => Inner::Single(albers()),
            ProjectionKind::ConicEqualArea => Inner::Single(Single::new(
                Raw::conic_equal_area([0.0, 60.0]),
                [0.0, 33.6442],
                [0.0; 3],
            )),
            ProjectionKind::Mercator => {
                Inner::Single(Single::new(Raw::Mercator, [0.0; 2], [0.0; 3]))
            }
            ProjectionKind::Equirectangular => {
                Inner::Single(Single::new(Raw::Equirectangular, [0.0; 2], [0.0; 3]))
            }
            ProjectionKind::Orthographic => {
                Inner::Single(Single::new(Raw::Orthographic, [0.0; 2], [0.0; 3]))
            }
            ProjectionKind::NaturalEarth1 => {
                Inner::Single(Single::new(Raw::NaturalEarth1, [0.0; 2], [0.0; 3]))
            }
        };
        let mut projection = Self { kind, inner };
        projection.set_translate([width / 2.0, height / 2.0]);
        projection.set_scale(scale.unwrap_or_else(|| auto_scale(width, height)));
        if let Inner::Single(single) = &mut projection.inner {
            if let Some(center) = center {
                single.set_center(center);
            }
            if let Some(rotation) = rotation {
                single.set_rotation(rotation);
            }
        }
        projection
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    fn primary(&self) -> &Single {
        match &self.inner {
            Inner::Single(single) => single,
            Inner::Composite(usa) => &usa.lower48,
        }
    }

    pub fn scale(&self) -> f64 {
        self.primary().scale
    }

    pub fn translate(&self) -> [f64; 2] {
        self.primary().translate
    }

    pub fn center(&self) -> [f64; 2] {
        self.primary().center_deg
    }

    pub fn rotation(&self) -> [f64; 3] {
        self.primary().rotate_deg
    }

    pub fn set_scale(&mut self, scale: f64) {
        match &mut self.inner {
            Inner::Single(single) => single.set_scale(scale),
            Inner::Composite(usa) => usa.set_scale(scale),
        }
    }

    pub fn set_translate(&mut self, translate: [f64; 2]) {
        match &mut self.inner {
            Inner::Single(single) => single.set_translate(translate),
            Inner::Composite(usa) => usa.set_translate(translate),
        }
    }

    fn locate(&self, position: Position) -> Option<Located> {
        match &self.inner {
            Inner::Single(single) => single.locate(position.lon, position.lat),
            Inner::Composite(usa) => usa.locate(position.lon, position.lat),
        }
    }

    /// `None` when the point is clipped (far hemisphere, outside every inset) or the result
    /// is not finite.
    pub fn forward(&self, lonlat: [f64; 2]) -> Option<[f64; 2]> {
        self.locate(lonlat.into()).map(|hit| hit.point)
    }

    /// `None` outside the projection's domain.
    pub fn inverse(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        match &self.inner {
            Inner::Single(single) => single.inverse(point),
            Inner::Composite(usa) => usa.inverse(point),
        }
    }

    /// Project a ring into pen-down runs. The pen lifts at clipped vertices, when switching
    /// insets, and on non-azimuthal projections when an edge crosses the rotated antimeridian.
    pub fn project_ring(&self, ring: &[Position]) -> Vec<PathRun> {
        let cuts_antimeridian = !self.kind.is_azimuthal();
        let mut runs: Vec<Vec<[f64; 2]>> = Vec::new();
        let mut current: Vec<[f64; 2]> = Vec::new();
        let mut previous: Option<Located> = None;
        let mut broken = false;

        for &position in ring {
            let located = self.locate(position);
            let continues = match (previous, located) {
                (Some(a), Some(b)) => {
                    a.part == b.part && !(cuts_antimeridian && (b.lambda - a.lambda).abs() > PI)
                }
                _ => false,
            };
            if !continues && !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            if previous.is_some() && !continues {
                broken = true;
            }
            if let Some(hit) = located {
                current.push(hit.point);
            } else {
                broken = true;
            }
            previous = located;
        }
        if !current.is_empty() {
            runs.push(current);
        }

        if !broken {
            return runs
                .into_iter()
                .map(|points| PathRun {
                    points,
                    closed: true,
                })
                .collect();
        }

        // A closed ring cut in the middle: the last run continues into the first.
        let closed_ring = ring.len() > 1 && ring.first() == ring.last();
        if closed_ring
            && runs.len() > 1
            && self.locate(ring[0]).is_some()
            && self.locate(ring[ring.len() - 1]).is_some()
        {
            let mut tail = runs.pop().unwrap_or_default();
            tail.pop();
            tail.append(&mut runs[0]);
            runs[0] = tail;
        }
        runs.into_iter()
            .map(|points| PathRun {
                points,
                closed: false,
            })
            .collect()
    }

    /// Projected bounding box of every visible vertex.
    fn projected_bounds(&self, geometry: &FeatureCollection) -> Option<[[f64; 2]; 2]> {
        geometry
            .positions()
            .filter_map(|&p| self.locate(p))
            .fold(None, |acc: Option<[[f64; 2]; 2]>, hit| {
                let [x, y] = hit.point;
                Some(match acc {
                    Some([[x0, y0], [x1, y1]]) => [[x0.min(x), y0.min(y)], [x1.max(x), y1.max(y)]],
                    None => [[x, y], [x, y]],
                })
            })
    }

    /// Rescale and translate so the projected geometry fills `extent`, centred. Leaves the
    /// projection untouched and returns false when there is nothing measurable to fit.
    pub fn fit_extent(&mut self, extent: [[f64; 2]; 2], geometry: &FeatureCollection) -> bool {
        let original = (self.scale(), self.translate());
        self.set_scale(FIT_REFERENCE_SCALE);
        self.set_translate([0.0, 0.0]);

        let Some([[bx0, by0], [bx1, by1]]) = self.projected_bounds(geometry) else {
            self.restore(original);
            return false;
        };
        let w = extent[1][0] - extent[0][0];
        let h = extent[1][1] - extent[0][1];
        let k = (w / (bx1 - bx0)).min(h / (by1 - by0));
        if !k.is_finite() || k <= 0.0 {
            self.restore(original);
            return false;
        }
        let x = extent[0][0] + (w - k * (bx1 + bx0)) / 2.0;
        let y = extent[0][1] + (h - k * (by1 + by0)) / 2.0;
        self.set_scale(FIT_REFERENCE_SCALE * k);
        self.set_translate([x, y]);
        tracing::debug!(
            kind = self.kind.name(),
            scale = self.scale(),
            tx = x,
            ty = y,
            "fitted projection to geometry"
        );
        true
    }

    pub fn fit_size(&mut self, size: [f64; 2], geometry: &FeatureCollection) -> bool {
        self.fit_extent([[0.0, 0.0], size], geometry)
    }

    fn restore(&mut self, (scale, translate): (f64, [f64; 2])) {
        self.set_scale(scale);
        self.set_translate(translate);
    }
}

pub fn auto_scale(width: f64, height: f64) -> f64 {
    width.min(height) / 2.0 / PI * 0.9
}
