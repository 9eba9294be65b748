use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::color::{Color, NamedScheme};
use crate::data::Domain;
use crate::error::ChoroplethError;
use crate::interaction::TooltipMode;
use crate::legend::LegendPosition;
use crate::projection::ProjectionKind;
use crate::scale::{ColorSchemeKind, Interpolator};

pub const DEFAULT_PROPERTY_KEY: &str = "id";
pub const DEFAULT_STROKE_WIDTH: f64 = 0.5;
pub const DEFAULT_HIGHLIGHT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_DIM_OPACITY: f64 = 0.4;
pub const DEFAULT_ZOOM_EXTENT: [f64; 2] = [1.0, 8.0];
pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 1000.0;
pub const DEFAULT_THEME_HUE: &str = "blue";

// Legend
pub const DEFAULT_LEGEND_WIDTH: f64 = 200.0;
pub const DEFAULT_LEGEND_HEIGHT: f64 = 12.0;
pub const DEFAULT_LEGEND_TICKS: usize = 5;
pub const LEGEND_INSET_PX: f64 = 10.0;
pub const LEGEND_SWATCH_PX: f64 = 16.0;
pub const LEGEND_SWATCH_GAP_PX: f64 = 4.0;

/// Features whose spherical area exceeds this are inverted rings (the complement of the
/// intended shape) and never win a hit test.
pub const DEFAULT_MAX_FEATURE_AREA: f64 = TAU;

/// Used when the host container has not been laid out yet.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 400.0;
pub const FIT_VIEWPORT_FRACTION: f64 = 0.95;

// Gestures
pub const CLICK_DRAG_THRESHOLD_PX: f64 = 5.0;
pub const WHEEL_PIXEL_FACTOR: f64 = 0.002;
pub const WHEEL_LINE_FACTOR: f64 = 0.05;
pub const WHEEL_PAGE_FACTOR: f64 = 1.0;

/// Widget configuration. Every field has a default so hosts only spell out what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChoroplethOptions {
    /// Feature property joined against `DataPoint::id`.
    pub property_key: String,
    pub projection: ProjectionOptions,
    pub color: ColorOptions,
    pub style: StyleOptions,
    pub interaction: InteractionOptions,
    pub animation: AnimationOptions,
    pub legend: LegendOptions,
    pub hit_test: HitTestOptions,
}

impl Default for ChoroplethOptions {
    fn default() -> Self {
        Self {
            property_key: DEFAULT_PROPERTY_KEY.to_string(),
            projection: ProjectionOptions::default(),
            color: ColorOptions::default(),
            style: StyleOptions::default(),
            interaction: InteractionOptions::default(),
            animation: AnimationOptions::default(),
            legend: LegendOptions::default(),
            hit_test: HitTestOptions::default(),
        }
    }
}

impl ChoroplethOptions {
    pub fn from_json(json: &str) -> Result<Self, ChoroplethError> {
        let options: Self = serde_json::from_str(json).map_err(ChoroplethError::InvalidConfig)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ChoroplethError> {
        let invalid = |msg: String| Err(ChoroplethError::InvalidOption(msg));

        if let Some(scale) = self.projection.scale
            && !(scale.is_finite() && scale > 0.0)
        {
            return invalid(format!("projection scale must be positive, got {scale}"));
        }
        let [min_k, max_k] = self.interaction.zoom_extent;
        if !(min_k > 0.0 && min_k <= max_k && max_k.is_finite()) {
            return invalid(format!(
                "zoom extent [{min_k}, {max_k}] is not an increasing positive range"
            ));
        }
        if !(0.0..=1.0).contains(&self.style.dim_opacity) {
            return invalid(format!("dim opacity {} is outside [0, 1]", self.style.dim_opacity));
        }
        if self.style.stroke_width < 0.0 || self.style.highlight_stroke_width < 0.0 {
            return invalid("stroke widths must not be negative".to_string());
        }
        if self.animation.duration_ms < 0.0 {
            return invalid(format!(
                "animation duration {} ms is negative",
                self.animation.duration_ms
            ));
        }
        if self.legend.width <= 0.0 || self.legend.height <= 0.0 {
            return invalid(format!(
                "legend size {}x{} must be positive",
                self.legend.width, self.legend.height
            ));
        }
        if let Some(domain) = self.color.domain
            && !(domain.min.is_finite() && domain.max.is_finite())
        {
            return invalid("color domain must be finite".to_string());
        }
        if self.hit_test.max_feature_area <= 0.0 {
            return invalid("max feature area must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionOptions {
    #[serde(rename = "type")]
    pub kind: ProjectionKind,
    /// `[lon, lat]`. Setting either this or `scale` disables fitting to the geometry.
    pub center: Option<[f64; 2]>,
    pub scale: Option<f64>,
    /// `[lambda, phi, gamma]` in degrees.
    pub rotation: Option<[f64; 3]>,
}

impl ProjectionOptions {
    pub fn fits_geometry(&self) -> bool {
        self.center.is_none() && self.scale.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorOptions {
    pub scheme: ColorSchemeKind,
    pub ramp: NamedScheme,
    /// Custom interpolator. Only settable from code; wins over theme and ramp.
    #[serde(skip)]
    pub interpolator: Option<Interpolator>,
    pub categorical_colors: Option<Vec<Color>>,
    pub use_theme_colors: bool,
    pub theme_hue: String,
    pub domain: Option<Domain>,
    pub diverging_midpoint: Option<f64>,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            scheme: ColorSchemeKind::Sequential,
            ramp: NamedScheme::Blues,
            interpolator: None,
            categorical_colors: None,
            use_theme_colors: true,
            theme_hue: DEFAULT_THEME_HUE.to_string(),
            domain: None,
            diverging_midpoint: None,
        }
    }
}

/// `None` colors fall back to the theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOptions {
    pub default_fill: Option<Color>,
    pub stroke_color: Option<Color>,
    pub stroke_width: f64,
    pub highlight_stroke_color: Option<Color>,
    pub highlight_stroke_width: f64,
    pub dim_opacity: f64,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            default_fill: None,
            stroke_color: None,
            stroke_width: DEFAULT_STROKE_WIDTH,
            highlight_stroke_color: None,
            highlight_stroke_width: DEFAULT_HIGHLIGHT_STROKE_WIDTH,
            dim_opacity: DEFAULT_DIM_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionOptions {
    pub tooltip_mode: TooltipMode,
    pub zoom_enabled: bool,
    pub zoom_extent: [f64; 2],
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            tooltip_mode: TooltipMode::Combined,
            zoom_enabled: false,
            zoom_extent: DEFAULT_ZOOM_EXTENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationOptions {
    pub enabled: bool,
    pub duration_ms: f64,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: DEFAULT_ANIMATION_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegendOptions {
    pub show: bool,
    pub position: LegendPosition,
    pub title: Option<String>,
    pub width: f64,
    pub height: f64,
    pub ticks: usize,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            show: false,
            position: LegendPosition::BottomRight,
            title: None,
            width: DEFAULT_LEGEND_WIDTH,
            height: DEFAULT_LEGEND_HEIGHT,
            ticks: DEFAULT_LEGEND_TICKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HitTestOptions {
    /// Steradians.
    pub max_feature_area: f64,
}

impl Default for HitTestOptions {
    fn default() -> Self {
        Self {
            max_feature_area: DEFAULT_MAX_FEATURE_AREA,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let options = ChoroplethOptions::from_json("{}").expect("defaults parse");
        assert_eq!(options, ChoroplethOptions::default());
        assert_eq!(options.property_key, "id");
        assert_eq!(options.interaction.tooltip_mode, TooltipMode::Combined);
        assert!(options.animation.enabled);
        assert!(!options.legend.show);
        assert!(options.projection.fits_geometry());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let value = json!({
            "propertyKey": "iso_a3",
            "projection": { "type": "orthographic", "rotation": [-10.0, -20.0, 0.0] },
            "color": { "scheme": "diverging", "divergingMidpoint": 0.0, "domain": [-5.0, 5.0] },
            "style": { "strokeColor": "#ff0000" },
            "interaction": { "tooltipMode": "click", "zoomEnabled": true },
            "legend": { "show": true, "position": "top-left" }
        });
        let options = ChoroplethOptions::from_json(&value.to_string()).expect("parses");

        assert_eq!(options.property_key, "iso_a3");
        assert_eq!(options.projection.kind, ProjectionKind::Orthographic);
        assert_eq!(options.projection.rotation, Some([-10.0, -20.0, 0.0]));
        assert!(options.projection.fits_geometry());
        assert_eq!(options.color.scheme, ColorSchemeKind::Diverging);
        assert_eq!(options.color.domain, Some(Domain::new(-5.0, 5.0)));
        assert_eq!(options.style.stroke_color, Color::parse("#f00"));
        assert_eq!(options.style.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(options.interaction.tooltip_mode, TooltipMode::Click);
        assert_eq!(options.interaction.zoom_extent, DEFAULT_ZOOM_EXTENT);
        assert_eq!(options.legend.position, LegendPosition::TopLeft);
        assert_eq!(options.legend.ticks, DEFAULT_LEGEND_TICKS);
    }

    #[test]
    fn unknown_names_fall_back() {
        let value = json!({
            "projection": { "type": "dymaxion" },
            "color": { "scheme": "rainbow" }
        });
        let options = ChoroplethOptions::from_json(&value.to_string()).expect("parses");
        assert_eq!(options.projection.kind, ProjectionKind::Mercator);
        assert_eq!(options.color.scheme, ColorSchemeKind::Sequential);
    }

    #[test]
    fn malformed_json_is_invalid_config() {
        let err = ChoroplethOptions::from_json("{ nope").expect_err("rejects");
        assert!(matches!(err, ChoroplethError::InvalidConfig(_)));
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let mut options = ChoroplethOptions::default();
        options.interaction.zoom_extent = [8.0, 1.0];
        assert!(matches!(options.validate(), Err(ChoroplethError::InvalidOption(_))));

        let mut options = ChoroplethOptions::default();
        options.projection.scale = Some(0.0);
        assert!(options.validate().is_err());

        let mut options = ChoroplethOptions::default();
        options.legend.width = -1.0;
        assert!(options.validate().is_err());

        let mut options = ChoroplethOptions::default();
        options.style.dim_opacity = 1.5;
        assert!(options.validate().is_err());

        assert!(ChoroplethOptions::default().validate().is_ok());
    }

    #[test]
    fn options_round_trip_through_json() {
        let mut options = ChoroplethOptions::default();
        options.color.categorical_colors = Some(vec![Color::rgb(1, 2, 3)]);
        options.legend.title = Some("GDP".to_string());
        let json = serde_json::to_string(&options).expect("serializes");
        assert_eq!(ChoroplethOptions::from_json(&json).expect("parses"), options);
    }
}
