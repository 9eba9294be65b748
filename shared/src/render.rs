use crate::geometry::FeatureCollection;
use crate::projection::{PathRun, Projection};
use crate::scale::ColorScale;
use crate::surface::Surface;
use crate::theme::ThemeColors;
use crate::zoom::ZoomTransform;

/// Projected outline of one feature: every ring of every polygon, split into pen-down runs.
pub type FeaturePath = Vec<PathRun>;

/// Project all features. Depends only on projection and geometry, so the result can be
/// reused across frames and zoom changes.
pub fn project_features(geometry: &FeatureCollection, projection: &Projection) -> Vec<FeaturePath> {
    geometry
        .features
        .iter()
        .map(|feature| {
            feature
                .polygons()
                .iter()
                .flatten()
                .flat_map(|ring| projection.project_ring(ring))
                .collect()
        })
        .collect()
}

/// Feature keys in feature order.
pub fn feature_keys(geometry: &FeatureCollection, property_key: &str) -> Vec<Option<String>> {
    geometry
        .features
        .iter()
        .map(|feature| feature.key(property_key))
        .collect()
}

/// Everything one frame needs. `paths` and `keys` are parallel to the feature list.
pub struct FrameInput<'a> {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
    pub paths: &'a [FeaturePath],
    pub keys: &'a [Option<String>],
    pub transform: ZoomTransform,
    pub scale: &'a ColorScale,
    /// Value to color this frame (already tweened), by feature key.
    pub value_of: &'a dyn Fn(&str) -> Option<f64>,
    pub colors: ThemeColors,
    pub stroke_width: f64,
    pub highlight_stroke_width: f64,
    pub dim_opacity: f64,
    /// Key of the active feature; every feature sharing it is highlighted.
    pub active_key: Option<&'a str>,
}

fn trace_path(surface: &mut dyn Surface, path: &FeaturePath) {
    for run in path {
        let mut points = run.points.iter();
        let Some(&[x, y]) = points.next() else {
            continue;
        };
        surface.move_to(x, y);
        for &[x, y] in points {
            surface.line_to(x, y);
        }
        if run.closed {
            surface.close_path();
        }
    }
}

/// Draw one full frame. A zero-sized viewport draws nothing, not even a clear.
pub fn render_frame(surface: &mut dyn Surface, input: &FrameInput<'_>) {
    if input.width <= 0.0 || input.height <= 0.0 {
        return;
    }

    surface.reset(input.width, input.height, input.device_pixel_ratio);
    surface.save();
    surface.translate(input.transform.x, input.transform.y);
    surface.scale(input.transform.k, input.transform.k);

    let k = input.transform.k;
    for (path, key) in input.paths.iter().zip(input.keys) {
        let key = key.as_deref();
        let fill = key
            .and_then(|key| (input.value_of)(key))
            .and_then(|value| input.scale.color(value))
            .unwrap_or(input.colors.default_fill);
        let is_active = input.active_key.is_some() && key == input.active_key;
        let dimmed = input.active_key.is_some() && !is_active;

        surface.begin_path();
        trace_path(surface, path);

        surface.set_fill_style(fill);
        surface.set_global_alpha(if dimmed { input.dim_opacity } else { 1.0 });
        surface.fill();

        surface.set_stroke_style(if is_active {
            input.colors.highlight_stroke
        } else {
            input.colors.stroke
        });
        surface.set_line_width(
            if is_active {
                input.highlight_stroke_width
            } else {
                input.stroke_width
            } / k,
        );
        surface.set_global_alpha(1.0);
        surface.stroke();
    }

    surface.restore();
    tracing::trace!(features = input.paths.len(), k, "rendered frame");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::color::Color;
    use crate::data::Domain;
    use crate::geometry::fixtures::square_at;
    use crate::projection::ProjectionKind;
    use crate::scale::{ColorSchemeKind, Interpolator};
    use crate::surface::{DrawCommand, RecordingSurface};
    use crate::theme::ColorMode;

    struct Fixture {
        paths: Vec<FeaturePath>,
        keys: Vec<Option<String>>,
        scale: ColorScale,
        values: HashMap<String, f64>,
    }

    fn fixture() -> Fixture {
        let geometry = FeatureCollection::new(vec![
            square_at("a", 0.0, 0.0, 5.0),
            square_at("b", 20.0, 0.0, 5.0),
            square_at("c", 40.0, 0.0, 5.0),
        ]);
        let projection = Projection::new(
            ProjectionKind::Equirectangular,
            400.0,
            200.0,
            None,
            None,
            None,
        );
        Fixture {
            paths: project_features(&geometry, &projection),
            keys: feature_keys(&geometry, "id"),
            scale: ColorScale::new(
                ColorSchemeKind::Sequential,
                Interpolator::new(|t| Color::from_channels(255.0 * t, 0.0, 0.0)),
                Domain::new(0.0, 10.0),
                None,
                None,
            ),
            values: HashMap::from([("a".to_string(), 10.0), ("b".to_string(), f64::NAN)]),
        }
    }

    fn input<'a>(
        fx: &'a Fixture,
        value_of: &'a dyn Fn(&str) -> Option<f64>,
        active_key: Option<&'a str>,
        transform: ZoomTransform,
    ) -> FrameInput<'a> {
        FrameInput {
            width: 400.0,
            height: 200.0,
            device_pixel_ratio: 2.0,
            paths: &fx.paths,
            keys: &fx.keys,
            transform,
            scale: &fx.scale,
            value_of,
            colors: ThemeColors::for_mode(ColorMode::Light),
            stroke_width: 0.5,
            highlight_stroke_width: 2.0,
            dim_opacity: 0.4,
            active_key,
        }
    }

    #[test]
    fn zero_size_draws_nothing() {
        let fx = fixture();
        let lookup = |k: &str| fx.values.get(k).copied();
        let mut frame = input(&fx, &lookup, None, ZoomTransform::IDENTITY);
        frame.width = 0.0;
        let mut surface = RecordingSurface::new();
        render_frame(&mut surface, &frame);
        assert!(surface.is_empty());
    }

    #[test]
    fn fills_use_scale_or_default() {
        let fx = fixture();
        let lookup = |k: &str| fx.values.get(k).copied();
        let mut surface = RecordingSurface::new();
        render_frame(&mut surface, &input(&fx, &lookup, None, ZoomTransform::IDENTITY));

        let default_fill = ThemeColors::for_mode(ColorMode::Light).default_fill;
        let fills: Vec<Color> = surface.fills().iter().map(|p| p.color).collect();
        assert_eq!(fills, vec![Color::rgb(255, 0, 0), default_fill, default_fill]);
        assert!(surface.fills().iter().all(|p| p.alpha == 1.0));
        assert_eq!(
            surface.commands()[..4],
            [
                DrawCommand::Reset {
                    width: 400.0,
                    height: 200.0,
                    dpr: 2.0
                },
                DrawCommand::Save,
                DrawCommand::Translate(0.0, 0.0),
                DrawCommand::Scale(1.0, 1.0),
            ]
        );
        assert_eq!(surface.commands().last(), Some(&DrawCommand::Restore));
    }

    #[test]
    fn active_feature_is_highlighted_and_others_dimmed() {
        let fx = fixture();
        let lookup = |k: &str| fx.values.get(k).copied();
        let transform = ZoomTransform {
            x: 5.0,
            y: 5.0,
            k: 4.0,
        };
        let mut surface = RecordingSurface::new();
        render_frame(&mut surface, &input(&fx, &lookup, Some("b"), transform));

        let alphas: Vec<f64> = surface.fills().iter().map(|p| p.alpha).collect();
        assert_eq!(alphas, vec![0.4, 1.0, 0.4]);

        let colors = ThemeColors::for_mode(ColorMode::Light);
        let strokes = surface.strokes();
        assert_eq!(strokes[1].color, colors.highlight_stroke);
        assert_eq!(strokes[1].line_width, 0.5);
        assert_eq!(strokes[0].color, colors.stroke);
        assert_eq!(strokes[0].line_width, 0.125);
        assert!(strokes.iter().all(|p| p.alpha == 1.0), "strokes are never dimmed");
    }

    #[test]
    fn closed_rings_are_closed_paths() {
        let fx = fixture();
        assert_eq!(fx.paths.len(), 3);
        assert!(fx.paths.iter().all(|path| path.len() == 1 && path[0].closed));
        let lookup = |_: &str| None;
        let mut surface = RecordingSurface::new();
        render_frame(&mut surface, &input(&fx, &lookup, None, ZoomTransform::IDENTITY));
        let closes = surface
            .commands()
            .iter()
            .filter(|c| **c == DrawCommand::ClosePath)
            .count();
        assert_eq!(closes, 3);
    }
}
