use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::color::{Color, NamedScheme, rgb_basis};
use crate::data::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorSchemeKind {
    #[default]
    Sequential,
    Diverging,
    Categorical,
}

impl ColorSchemeKind {
    pub const ALL: [Self; 3] = [Self::Sequential, Self::Diverging, Self::Categorical];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Diverging => "diverging",
            Self::Categorical => "categorical",
        }
    }

    /// Unknown names fall back to sequential.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

impl From<String> for ColorSchemeKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ColorSchemeKind> for String {
    fn from(kind: ColorSchemeKind) -> Self {
        kind.name().to_string()
    }
}

/// `t ∈ [0, 1]` to color. Equality is identity: two interpolators are equal only when they
/// are clones of the same one, which is what keyed caches need.
#[derive(Clone)]
pub struct Interpolator(Arc<dyn Fn(f64) -> Color + Send + Sync>);

impl Interpolator {
    pub fn new(f: impl Fn(f64) -> Color + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// B-spline through the given stops.
    pub fn from_colors(colors: Vec<Color>) -> Self {
        Self::new(move |t| rgb_basis(&colors, t))
    }

    pub fn named(scheme: NamedScheme) -> Self {
        Self::from_colors(scheme.colors())
    }

    pub fn at(&self, t: f64) -> Color {
        (self.0)(t)
    }
}

impl PartialEq for Interpolator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interpolator(..)")
    }
}

/// Value to color mapping for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    Sequential {
        interpolator: Interpolator,
        domain: Domain,
    },
    Diverging {
        interpolator: Interpolator,
        domain: Domain,
        midpoint: f64,
    },
    Categorical {
        palette: Vec<Color>,
    },
}

impl ColorScale {
    /// Categorical needs a non-empty palette and diverging needs a midpoint; otherwise the
    /// scale is sequential over `domain`.
    pub fn new(
        kind: ColorSchemeKind,
        interpolator: Interpolator,
        domain: Domain,
        palette: Option<&[Color]>,
        midpoint: Option<f64>,
    ) -> Self {
        match (kind, palette, midpoint) {
            (ColorSchemeKind::Categorical, Some(palette), _) if !palette.is_empty() => {
                Self::Categorical {
                    palette: palette.to_vec(),
                }
            }
            (ColorSchemeKind::Diverging, _, Some(midpoint)) => Self::Diverging {
                interpolator,
                domain,
                midpoint,
            },
            _ => Self::Sequential {
                interpolator,
                domain,
            },
        }
    }

    /// The kind actually in effect after fallbacks.
    pub fn kind(&self) -> ColorSchemeKind {
        match self {
            Self::Sequential { .. } => ColorSchemeKind::Sequential,
            Self::Diverging { .. } => ColorSchemeKind::Diverging,
            Self::Categorical { .. } => ColorSchemeKind::Categorical,
        }
    }

    /// Clamped position of `value` along the ramp. `None` for NaN and for categorical scales.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let t = match self {
            Self::Sequential { domain, .. } => {
                let k = if domain.min == domain.max {
                    0.0
                } else {
                    1.0 / domain.span()
                };
                (value - domain.min) * k
            }
            Self::Diverging {
                domain, midpoint, ..
            } => {
                let (t0, t1, t2) = (domain.min, *midpoint, domain.max);
                let k10 = if t0 == t1 { 0.0 } else { 0.5 / (t1 - t0) };
                let k21 = if t1 == t2 { 0.0 } else { 0.5 / (t2 - t1) };
                let s = if t1 < t0 { -1.0 } else { 1.0 };
                0.5 + (value - t1) * if s * value < s * t1 { k10 } else { k21 }
            }
            Self::Categorical { .. } => return None,
        };
        Some(t.clamp(0.0, 1.0))
    }

    /// `None` means "no color": the caller uses its default fill.
    pub fn color(&self, value: f64) -> Option<Color> {
        match self {
            Self::Categorical { palette } => {
                if !value.is_finite() {
                    return None;
                }
                let len = palette.len() as f64;
                let index = value.floor().rem_euclid(len) as usize;
                palette.get(index).copied()
            }
            Self::Sequential { interpolator, .. } | Self::Diverging { interpolator, .. } => {
                self.normalize(value).map(|t| interpolator.at(t))
            }
        }
    }

    pub fn palette(&self) -> Option<&[Color]> {
        match self {
            Self::Categorical { palette } => Some(palette),
            _ => None,
        }
    }

    pub fn interpolator(&self) -> Option<&Interpolator> {
        match self {
            Self::Sequential { interpolator, .. } | Self::Diverging { interpolator, .. } => {
                Some(interpolator)
            }
            Self::Categorical { .. } => None,
        }
    }
}
