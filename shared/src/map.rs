use std::sync::Arc;

use crate::animation::{AnimationDriver, FrameTick};
use crate::color::NamedScheme;
use crate::config::{
    ChoroplethOptions, ColorOptions, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH,
    FIT_VIEWPORT_FRACTION, ProjectionOptions,
};
use crate::data::{DataIndex, DataPoint, Domain};
use crate::error::ChoroplethError;
use crate::frame::FrameScheduler;
use crate::geometry::{Feature, FeatureCollection};
use crate::hit::{AreaCache, feature_at_point};
use crate::interaction::{InteractionCoordinator, RegionEvent};
use crate::legend::LegendModel;
use crate::memo::Memo;
use crate::projection::Projection;
use crate::render::{FeaturePath, FrameInput, feature_keys, project_features, render_frame};
use crate::scale::{ColorScale, Interpolator};
use crate::surface::Surface;
use crate::theme::{ColorMode, Hue, ThemeColors};
use crate::tooltip::TooltipContent;
use crate::zoom::{WheelDeltaMode, ZoomController, ZoomTransform};

/// Callback payloads, resolved to the feature and its data point.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionNotification {
    /// `feature` is `None` when the pointer left every region.
    Hover {
        feature: Option<Feature>,
        point: Option<DataPoint>,
    },
    Click {
        feature: Feature,
        point: Option<DataPoint>,
    },
}

/// Result of a pointer event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerUpdate {
    pub notifications: Vec<RegionNotification>,
    /// The active feature changed, so the highlight must be redrawn.
    pub redraw: bool,
}

/// Tooltip to show for the active feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTooltip {
    /// Client (viewport) coordinates of the anchoring pointer event.
    pub position: [f64; 2],
    pub feature: Feature,
    pub point: Option<DataPoint>,
    pub content: TooltipContent,
}

#[derive(Debug, Clone, PartialEq)]
struct ProjectionKey {
    generation: u64,
    size: [f64; 2],
    options: ProjectionOptions,
}

#[derive(Debug, Clone, PartialEq)]
struct InterpolatorKey {
    custom: Option<Interpolator>,
    use_theme_colors: bool,
    theme_hue: String,
    ramp: NamedScheme,
    mode: ColorMode,
}

impl InterpolatorKey {
    fn new(color: &ColorOptions, mode: ColorMode) -> Self {
        Self {
            custom: color.interpolator.clone(),
            use_theme_colors: color.use_theme_colors,
            theme_hue: color.theme_hue.clone(),
            ramp: color.ramp,
            mode,
        }
    }

    fn resolve(&self) -> Interpolator {
        if let Some(custom) = &self.custom {
            return custom.clone();
        }
        if self.use_theme_colors
            && let Some(hue) = Hue::from_name(&self.theme_hue)
        {
            return Interpolator::from_colors(hue.ramp(self.mode));
        }
        Interpolator::named(self.ramp)
    }
}

/// Derived values, each recomputed only when its inputs change.
#[derive(Debug, Default)]
struct Caches {
    projection: Memo<ProjectionKey, Projection>,
    paths: Memo<ProjectionKey, Vec<FeaturePath>>,
    keys: Memo<(u64, String), Vec<Option<String>>>,
    areas: Memo<u64, AreaCache>,
    interpolator: Memo<InterpolatorKey, Interpolator>,
}

struct Prepared<'a> {
    projection: &'a Projection,
    paths: &'a [FeaturePath],
    keys: &'a [Option<String>],
    areas: &'a AreaCache,
    interpolator: &'a Interpolator,
}

impl Caches {
    fn prepare(
        &mut self,
        geometry: &FeatureCollection,
        generation: u64,
        size: [f64; 2],
        options: &ChoroplethOptions,
        mode: ColorMode,
    ) -> Prepared<'_> {
        let key = ProjectionKey {
            generation,
            size,
            options: options.projection.clone(),
        };
        let projection = self
            .projection
            .get_or_compute(key.clone(), |key| build_projection(geometry, key));
        let paths = self.paths.get_or_compute(key, |_| {
            tracing::debug!(features = geometry.len(), "projecting feature outlines");
            project_features(geometry, projection)
        });
        let keys = self
            .keys
            .get_or_compute((generation, options.property_key.clone()), |(_, property_key)| {
                feature_keys(geometry, property_key)
            });
        let areas = self
            .areas
            .get_or_compute(generation, |_| AreaCache::build(geometry));
        let interpolator = self
            .interpolator
            .get_or_compute(InterpolatorKey::new(&options.color, mode), InterpolatorKey::resolve);
        Prepared {
            projection,
            paths,
            keys,
            areas,
            interpolator,
        }
    }

    fn interpolator(&mut self, color: &ColorOptions, mode: ColorMode) -> &Interpolator {
        self.interpolator
            .get_or_compute(InterpolatorKey::new(color, mode), InterpolatorKey::resolve)
    }
}

fn build_projection(geometry: &FeatureCollection, key: &ProjectionKey) -> Projection {
    let [width, height] = key.size;
    let options = &key.options;
    let mut projection = Projection::new(
        options.kind,
        width,
        height,
        options.center,
        options.scale,
        options.rotation,
    );
    if options.fits_geometry() {
        let mx = width * (1.0 - FIT_VIEWPORT_FRACTION) / 2.0;
        let my = height * (1.0 - FIT_VIEWPORT_FRACTION) / 2.0;
        projection.fit_extent([[mx, my], [width - mx, height - my]], geometry);
    }
    tracing::debug!(
        kind = options.kind.name(),
        width,
        height,
        scale = projection.scale(),
        "projection rebuilt"
    );
    projection
}

/// The whole widget minus the browser: options, geometry, data, animation, interaction and
/// zoom state, plus the caches that keep per-frame work small.
///
/// Hosts call the setters as their inputs change, forward pointer and gesture events, and
/// call [`ChoroplethMap::render`] whenever an operation reports that a redraw is needed.
#[derive(Debug)]
pub struct ChoroplethMap {
    options: ChoroplethOptions,
    color_mode: ColorMode,
    geometry: Option<Arc<FeatureCollection>>,
    generation: u64,
    data: DataIndex,
    size: [f64; 2],
    device_pixel_ratio: f64,
    driver: AnimationDriver,
    interaction: InteractionCoordinator,
    zoom: ZoomController,
    caches: Caches,
}

impl Default for ChoroplethMap {
    fn default() -> Self {
        Self::new(ChoroplethOptions::default())
    }
}

impl ChoroplethMap {
    /// Options that fail `validate` are replaced by the defaults.
    pub fn new(options: ChoroplethOptions) -> Self {
        let options = match options.validate() {
            Ok(()) => options,
            Err(e) => {
                tracing::warn!(error = %e, "rejected options; using defaults");
                ChoroplethOptions::default()
            }
        };
        Self {
            interaction: InteractionCoordinator::new(options.interaction.tooltip_mode),
            zoom: ZoomController::new(options.interaction.zoom_extent),
            options,
            color_mode: ColorMode::default(),
            geometry: None,
            generation: 0,
            data: DataIndex::default(),
            size: [DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT],
            device_pixel_ratio: 1.0,
            driver: AnimationDriver::new(),
            caches: Caches::default(),
        }
    }

    pub fn options(&self) -> &ChoroplethOptions {
        &self.options
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn geometry(&self) -> Option<&FeatureCollection> {
        self.geometry.as_deref()
    }

    pub fn size(&self) -> [f64; 2] {
        self.size
    }

    pub fn transform(&self) -> ZoomTransform {
        self.zoom.transform()
    }

    pub fn is_animating(&self) -> bool {
        self.driver.is_animating()
    }

    /// Replace the geometry. Hover and click state refer to feature indices, so both reset.
    pub fn set_geometry(&mut self, geometry: Option<Arc<FeatureCollection>>) {
        let same = match (&self.geometry, &geometry) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            features = geometry.as_ref().map_or(0, |g| g.len()),
            "geometry replaced"
        );
        self.geometry = geometry;
        self.interaction.reset();
    }

    /// Index the new data and start the value animation. Returns true when frames were
    /// requested; otherwise the caller should redraw once.
    pub fn set_data(&mut self, points: &[DataPoint], scheduler: &mut dyn FrameScheduler) -> bool {
        self.data = DataIndex::build(points);
        self.driver.update(
            self.data.snapshot(),
            self.options.animation.enabled,
            self.options.animation.duration_ms,
            scheduler,
        )
    }

    /// Apply new options. Invalid options are rejected and the previous ones stay in force.
    /// Turning animation off jumps a running tween to its target.
    pub fn set_options(
        &mut self,
        options: ChoroplethOptions,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<(), ChoroplethError> {
        if options == self.options {
            return Ok(());
        }
        options.validate()?;
        if !options.animation.enabled && self.driver.is_animating() {
            self.driver.finish(scheduler);
        }
        self.interaction.set_mode(options.interaction.tooltip_mode);
        self.zoom.set_extent(options.interaction.zoom_extent);
        self.options = options;
        Ok(())
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    /// CSS pixel size of the canvas. Zero sizes (not laid out yet) use the fallback size.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        let width = if width > 0.0 { width } else { DEFAULT_CANVAS_WIDTH };
        let height = if height > 0.0 { height } else { DEFAULT_CANVAS_HEIGHT };
        self.size = [width, height];
        self.device_pixel_ratio = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
    }

    /// Draw the current frame. Without geometry this draws nothing and returns false.
    pub fn render(&mut self, surface: &mut dyn Surface) -> bool {
        let Some(geometry) = self.geometry.as_deref() else {
            return false;
        };
        let prepared = self.caches.prepare(
            geometry,
            self.generation,
            self.size,
            &self.options,
            self.color_mode,
        );

        let color = &self.options.color;
        let domain = color.domain.unwrap_or_else(|| self.driver.frame_domain());
        let scale = ColorScale::new(
            color.scheme,
            prepared.interpolator.clone(),
            domain,
            color.categorical_colors.as_deref(),
            color.diverging_midpoint,
        );
        let active_key = self
            .interaction
            .active_feature()
            .and_then(|index| prepared.keys.get(index))
            .and_then(|key| key.as_deref());
        let style = &self.options.style;
        let driver = &self.driver;
        let value_of = |key: &str| driver.frame_value(key);

        render_frame(
            surface,
            &FrameInput {
                width: self.size[0],
                height: self.size[1],
                device_pixel_ratio: self.device_pixel_ratio,
                paths: prepared.paths,
                keys: prepared.keys,
                transform: self.zoom.transform(),
                scale: &scale,
                value_of: &value_of,
                colors: ThemeColors::resolve(
                    self.color_mode,
                    style.default_fill,
                    style.stroke_color,
                    style.highlight_stroke_color,
                ),
                stroke_width: style.stroke_width,
                highlight_stroke_width: style.highlight_stroke_width,
                dim_opacity: style.dim_opacity,
                active_key,
            },
        );
        true
    }

    /// Frame callback from the host scheduler. Redraw unless the tick is idle.
    pub fn on_frame(
        &mut self,
        timestamp_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> FrameTick {
        self.driver.on_frame(timestamp_ms, scheduler)
    }

    /// Teardown: drop any pending frame request.
    pub fn cancel(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.driver.cancel(scheduler);
    }

    /// Feature index under a canvas-local point.
    pub fn feature_at(&mut self, local: [f64; 2]) -> Option<usize> {
        let geometry = self.geometry.as_deref()?;
        let prepared = self.caches.prepare(
            geometry,
            self.generation,
            self.size,
            &self.options,
            self.color_mode,
        );
        feature_at_point(
            geometry,
            prepared.areas,
            prepared.projection,
            self.zoom.transform(),
            local,
            self.options.hit_test.max_feature_area,
        )
    }

    pub fn pointer_move(&mut self, local: [f64; 2], client: [f64; 2]) -> PointerUpdate {
        let hit = self.feature_at(local);
        self.track(|interaction| interaction.pointer_move(hit, client))
    }

    pub fn pointer_leave(&mut self) -> PointerUpdate {
        self.track(InteractionCoordinator::pointer_leave)
    }

    pub fn click(&mut self, local: [f64; 2], client: [f64; 2]) -> PointerUpdate {
        let hit = self.feature_at(local);
        self.track(|interaction| interaction.click(hit, client))
    }

    /// A press outside the widget. Returns true when a pinned feature was released.
    pub fn press_outside(&mut self) -> bool {
        self.interaction.press_outside()
    }

    fn track(
        &mut self,
        event: impl FnOnce(&mut InteractionCoordinator) -> Vec<RegionEvent>,
    ) -> PointerUpdate {
        let before = self.interaction.active_feature();
        let events = event(&mut self.interaction);
        PointerUpdate {
            notifications: events
                .into_iter()
                .filter_map(|event| self.notification(event))
                .collect(),
            redraw: self.interaction.active_feature() != before,
        }
    }

    fn notification(&self, event: RegionEvent) -> Option<RegionNotification> {
        Some(match event {
            RegionEvent::Hover(None) => RegionNotification::Hover {
                feature: None,
                point: None,
            },
            RegionEvent::Hover(Some(index)) => {
                let (feature, point) = self.resolve(index)?;
                RegionNotification::Hover {
                    feature: Some(feature),
                    point,
                }
            }
            RegionEvent::Click(index) => {
                let (feature, point) = self.resolve(index)?;
                RegionNotification::Click { feature, point }
            }
        })
    }

    fn resolve(&self, index: usize) -> Option<(Feature, Option<DataPoint>)> {
        let feature = self.geometry.as_deref()?.get(index)?;
        let point = self.data_point(feature).cloned();
        Some((feature.clone(), point))
    }

    /// Data point joined to `feature` through the property key.
    pub fn data_point(&self, feature: &Feature) -> Option<&DataPoint> {
        feature
            .key(&self.options.property_key)
            .and_then(|key| self.data.get(&key))
    }

    // Zoom gestures are ignored while zoom is disabled; each returns whether to redraw.

    pub fn wheel(
        &mut self,
        delta_y: f64,
        mode: WheelDeltaMode,
        ctrl: bool,
        anchor: [f64; 2],
    ) -> bool {
        self.options.interaction.zoom_enabled && self.zoom.wheel(delta_y, mode, ctrl, anchor)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        self.options.interaction.zoom_enabled && self.zoom.pan(dx, dy)
    }

    pub fn pinch(&mut self, distance_ratio: f64, previous_mid: [f64; 2], mid: [f64; 2]) -> bool {
        self.options.interaction.zoom_enabled && self.zoom.pinch(distance_ratio, previous_mid, mid)
    }

    pub fn double_click(&mut self, anchor: [f64; 2], shift: bool) -> bool {
        self.options.interaction.zoom_enabled && self.zoom.double_click(anchor, shift)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.zoom.reset()
    }

    /// Legend for the target data (not the tweened frame), when the legend is shown.
    pub fn legend(&mut self) -> Option<LegendModel> {
        if !self.options.legend.show {
            return None;
        }
        let color = &self.options.color;
        let domain = Domain::resolve(color.domain, self.driver.target());
        let interpolator = self.caches.interpolator(color, self.color_mode).clone();
        let scale = ColorScale::new(
            color.scheme,
            interpolator,
            domain,
            color.categorical_colors.as_deref(),
            color.diverging_midpoint,
        );
        Some(LegendModel::build(&scale, domain, &self.options.legend))
    }

    pub fn tooltip(&self) -> Option<ActiveTooltip> {
        if !self.interaction.show_tooltip() {
            return None;
        }
        let position = self.interaction.tooltip_position()?;
        let (feature, point) = self.resolve(self.interaction.active_feature()?)?;
        let content =
            TooltipContent::for_feature(&feature, &self.options.property_key, point.as_ref());
        Some(ActiveTooltip {
            position,
            feature,
            point,
            content,
        })
    }

    pub fn cursor(&self) -> &'static str {
        if self.interaction.hovered().is_some() {
            "pointer"
        } else {
            "default"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::DEFAULT_ZOOM_EXTENT;
    use crate::frame::ManualScheduler;
    use crate::geometry::fixtures::{square, square_at};
    use crate::interaction::TooltipMode;
    use crate::projection::ProjectionKind;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("choropleth_shared=debug")
            .with_test_writer()
            .try_init();
    }

    fn geometry() -> Arc<FeatureCollection> {
        Arc::new(FeatureCollection::new(vec![
            square("big", -40.0, 40.0),
            square_at("small", 10.0, 10.0, 4.0),
            square_at("nodata", -100.0, 0.0, 10.0),
        ]))
    }

    /// Equirectangular at one pixel per radian-degree, centred on a 360x180 canvas, so
    /// lon/lat maps to `[lon + 180, 90 - lat]`.
    fn options() -> ChoroplethOptions {
        let mut options = ChoroplethOptions::default();
        options.projection.kind = ProjectionKind::Equirectangular;
        options.projection.scale = Some(1.0_f64.to_degrees());
        options.animation.enabled = false;
        options
    }

    fn screen([lon, lat]: [f64; 2]) -> [f64; 2] {
        [lon + 180.0, 90.0 - lat]
    }

    fn engine(options: ChoroplethOptions) -> (ChoroplethMap, ManualScheduler) {
        init_tracing();
        let mut map = ChoroplethMap::new(options);
        map.resize(360.0, 180.0, 1.0);
        map.set_geometry(Some(geometry()));
        let mut scheduler = ManualScheduler::new();
        map.set_data(
            &[
                DataPoint::new("big", 0.0),
                DataPoint::new("small", 100.0).with_label("Score"),
            ],
            &mut scheduler,
        );
        (map, scheduler)
    }

    #[test]
    fn render_without_geometry_is_a_no_op() {
        let mut map = ChoroplethMap::default();
        let mut surface = RecordingSurface::new();
        assert!(!map.render(&mut surface));
        assert!(surface.is_empty());
        assert_eq!(map.feature_at([10.0, 10.0]), None);
        assert!(map.legend().is_none());
    }

    #[test]
    fn renders_every_feature_with_data_colors() {
        let (mut map, _) = engine(options());
        let mut surface = RecordingSurface::new();
        assert!(map.render(&mut surface));

        let fills = surface.fills();
        assert_eq!(fills.len(), 3);
        let ramp = Hue::Blue.ramp(ColorMode::Light);
        assert_eq!(fills[0].color, ramp[0], "domain minimum");
        assert_eq!(fills[1].color, ramp[4], "domain maximum");
        assert_eq!(fills[2].color, ThemeColors::for_mode(ColorMode::Light).default_fill);
    }

    #[test]
    fn theme_switch_changes_palette_and_defaults() {
        let (mut map, _) = engine(options());
        map.set_color_mode(ColorMode::Dark);
        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        let ramp = Hue::Blue.ramp(ColorMode::Dark);
        assert_eq!(surface.fills()[0].color, ramp[0]);
        assert_eq!(surface.fills()[2].color, ThemeColors::for_mode(ColorMode::Dark).default_fill);
    }

    #[test]
    fn unknown_hue_uses_named_ramp() {
        let mut options = options();
        options.color.theme_hue = "chartreuse".to_string();
        options.color.ramp = NamedScheme::Reds;
        let (mut map, _) = engine(options);
        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        assert_eq!(surface.fills()[1].color, NamedScheme::Reds.sample(1.0));
    }

    #[test]
    fn explicit_domain_and_custom_interpolator() {
        let mut options = options();
        options.color.domain = Some(Domain::new(0.0, 200.0));
        options.color.interpolator = Some(Interpolator::new(|t| {
            Color::from_channels(255.0 * t, 0.0, 0.0)
        }));
        let (mut map, _) = engine(options);
        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        assert_eq!(surface.fills()[1].color, Color::rgb(128, 0, 0));
    }

    #[test]
    fn hover_hits_smallest_feature_and_highlights_it() {
        let (mut map, _) = engine(options());
        let update = map.pointer_move(screen([10.0, 10.0]), [500.0, 300.0]);
        assert!(update.redraw);
        match &update.notifications[..] {
            [RegionNotification::Hover { feature: Some(feature), point: Some(point) }] => {
                assert_eq!(feature.key("id").as_deref(), Some("small"));
                assert_eq!(point.value, 100.0);
            }
            other => panic!("unexpected notifications {other:?}"),
        }
        assert_eq!(map.cursor(), "pointer");

        let tooltip = map.tooltip().expect("tooltip shown");
        assert_eq!(tooltip.position, [500.0, 300.0]);
        assert_eq!(tooltip.content.title, "SMALL");
        assert_eq!(tooltip.content.detail.as_deref(), Some("Score: 100"));

        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        let alphas: Vec<f64> = surface.fills().iter().map(|p| p.alpha).collect();
        assert_eq!(alphas, vec![0.4, 1.0, 0.4]);

        let update = map.pointer_leave();
        assert!(update.redraw);
        assert_eq!(
            update.notifications,
            vec![RegionNotification::Hover {
                feature: None,
                point: None
            }]
        );
        assert_eq!(map.cursor(), "default");
        assert!(map.tooltip().is_none());
    }

    #[test]
    fn hover_without_data_has_no_detail() {
        let (mut map, _) = engine(options());
        map.pointer_move(screen([-100.0, 0.0]), [1.0, 1.0]);
        let tooltip = map.tooltip().expect("tooltip shown");
        assert_eq!(tooltip.point, None);
        assert_eq!(tooltip.content.detail, None);
    }

    #[test]
    fn click_mode_toggles_and_outside_press_releases() {
        let mut options = options();
        options.interaction.tooltip_mode = TooltipMode::Click;
        let (mut map, _) = engine(options);

        let update = map.click(screen([0.0, 0.0]), [0.0, 0.0]);
        assert!(update.redraw);
        assert!(matches!(
            &update.notifications[..],
            [RegionNotification::Click { point: Some(_), .. }]
        ));
        assert!(map.tooltip().is_some());

        assert!(map.click(screen([0.0, 0.0]), [0.0, 0.0]).redraw);
        assert!(map.tooltip().is_none());

        map.click(screen([0.0, 0.0]), [0.0, 0.0]);
        assert!(map.press_outside());
        assert!(map.tooltip().is_none());
    }

    #[test]
    fn hit_test_follows_zoom() {
        let mut options = options();
        options.interaction.zoom_enabled = true;
        let (mut map, _) = engine(options);
        let anchor = screen([10.0, 10.0]);
        assert!(map.wheel(-500.0, WheelDeltaMode::Pixel, false, anchor));
        assert_eq!(map.transform().k, 2.0);
        assert_eq!(map.feature_at(anchor), Some(1));

        assert!(map.pan(-30.0, 0.0));
        assert_eq!(map.feature_at(anchor), Some(0), "the small square moved left");
        assert!(map.reset_zoom());
        assert_eq!(map.transform(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn zoom_gestures_ignored_when_disabled() {
        let (mut map, _) = engine(options());
        assert!(!map.wheel(-500.0, WheelDeltaMode::Pixel, false, [0.0, 0.0]));
        assert!(!map.double_click([0.0, 0.0], false));
        assert!(!map.pinch(2.0, [0.0, 0.0], [1.0, 1.0]));
        assert_eq!(map.transform(), ZoomTransform::IDENTITY);
        assert_eq!(DEFAULT_ZOOM_EXTENT, map.zoom.extent());
    }

    #[test]
    fn animated_data_tweens_fill_and_domain() {
        let mut options = options();
        options.animation.enabled = true;
        options.color.interpolator = Some(Interpolator::new(|t| {
            Color::from_channels(255.0 * t, 0.0, 0.0)
        }));
        let (mut map, mut scheduler) = engine(options);
        // Initial data has nothing to tween from; its frames just hold the values.
        assert!(scheduler.has_pending());
        scheduler.fire();
        assert_eq!(map.on_frame(0.0, &mut scheduler), FrameTick::Animating);
        scheduler.fire();
        assert_eq!(map.on_frame(1000.0, &mut scheduler), FrameTick::Converged);

        assert!(map.set_data(
            &[DataPoint::new("big", 0.0), DataPoint::new("small", 50.0)],
            &mut scheduler,
        ));
        scheduler.fire();
        assert_eq!(map.on_frame(1000.0, &mut scheduler), FrameTick::Animating);
        scheduler.fire();
        assert_eq!(map.on_frame(1500.0, &mut scheduler), FrameTick::Animating);
        assert!(map.is_animating());

        // Halfway in time is 87.5% eased: small is at 56.25 in a domain of [0, 56.25].
        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        assert_eq!(surface.fills()[1].color, Color::rgb(255, 0, 0));

        scheduler.fire();
        assert_eq!(map.on_frame(2000.0, &mut scheduler), FrameTick::Converged);
        assert!(!scheduler.has_pending());
        map.cancel(&mut scheduler);
    }

    #[test]
    fn disabling_animation_jumps_to_target() {
        let mut options = options();
        options.animation.enabled = true;
        let (mut map, mut scheduler) = engine(options.clone());
        scheduler.fire();
        map.on_frame(0.0, &mut scheduler);
        scheduler.fire();
        map.on_frame(1000.0, &mut scheduler);

        map.set_data(
            &[DataPoint::new("big", 0.0), DataPoint::new("small", 50.0)],
            &mut scheduler,
        );
        scheduler.fire();
        map.on_frame(1000.0, &mut scheduler);
        scheduler.fire();
        map.on_frame(1200.0, &mut scheduler);
        assert!(map.is_animating());

        options.animation.enabled = false;
        map.set_options(options, &mut scheduler).expect("valid options");
        assert!(!map.is_animating());
        assert!(!scheduler.has_pending());
        assert_eq!(map.driver.frame_value("small"), Some(50.0));
        assert_eq!(map.driver.frame_domain(), Domain::new(0.0, 50.0));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut inverted = options();
        inverted.interaction.zoom_enabled = true;
        inverted.interaction.zoom_extent = [8.0, 1.0];

        let map = ChoroplethMap::new(inverted.clone());
        assert_eq!(map.options(), &ChoroplethOptions::default());

        let (mut map, mut scheduler) = engine(options());
        let err = map.set_options(inverted, &mut scheduler).expect_err("inverted extent");
        assert!(matches!(err, ChoroplethError::InvalidOption(_)));
        assert_eq!(map.options(), &options());
        assert_eq!(map.zoom.extent(), DEFAULT_ZOOM_EXTENT);

        let mut zoomable = options();
        zoomable.interaction.zoom_enabled = true;
        map.set_options(zoomable, &mut scheduler).expect("valid options");
        assert!(map.wheel(-100.0, WheelDeltaMode::Pixel, false, [0.0, 0.0]));
        assert!(map.transform().k <= DEFAULT_ZOOM_EXTENT[1]);
    }

    #[test]
    fn legend_uses_target_domain() {
        let mut options = options();
        options.legend.show = true;
        let (mut map, _) = engine(options);
        let legend = map.legend().expect("legend shown");
        let labels: Vec<&str> = legend.ticks().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["0", "25", "50", "75", "100"]);
    }

    #[test]
    fn new_geometry_resets_interaction_and_caches() {
        let (mut map, _) = engine(options());
        map.pointer_move(screen([10.0, 10.0]), [0.0, 0.0]);
        assert!(map.tooltip().is_some());

        map.set_geometry(Some(Arc::new(FeatureCollection::new(vec![square("only", -5.0, 5.0)]))));
        assert!(map.tooltip().is_none());
        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        assert_eq!(surface.fills().len(), 1);
    }

    #[test]
    fn fit_keeps_geometry_inside_the_viewport() {
        let mut options = options();
        options.projection.scale = None;
        let (mut map, _) = engine(options);
        let mut surface = RecordingSurface::new();
        map.render(&mut surface);
        let inside = surface.commands().iter().all(|command| match command {
            DrawCommand::MoveTo(x, y) | DrawCommand::LineTo(x, y) => {
                (0.0..=360.0).contains(x) && (0.0..=180.0).contains(y)
            }
            _ => true,
        });
        assert!(inside);
        // Everything is offset from the edges by the fit margin.
        assert_eq!(map.feature_at([1.0, 1.0]), None);
    }
}
