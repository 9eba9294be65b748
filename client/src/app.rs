use std::sync::Arc;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use gloo_storage::Storage as _;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use choropleth_shared::config::{ChoroplethOptions, LegendOptions};
use choropleth_shared::data::DataPoint;
use choropleth_shared::geometry::{Feature, FeatureCollection};
use choropleth_shared::interaction::TooltipMode;
use choropleth_shared::legend::LegendPosition;
use choropleth_shared::projection::ProjectionKind;
use choropleth_shared::theme::{ColorMode, Hue, PanelColors};

use crate::map::ChoroplethMap;

const WORLD_GEOJSON_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_admin_0_countries.geojson";
const SETTINGS_KEY: &str = "choropleth_settings";
const DEMO_PROPERTY_KEY: &str = "NAME";
const DEMO_HUES: [Hue; 7] = [
    Hue::Blue,
    Hue::Green,
    Hue::Red,
    Hue::Orange,
    Hue::Violet,
    Hue::Cyan,
    Hue::Teal,
];
const TOOLTIP_MODES: [(TooltipMode, &str); 4] = [
    (TooltipMode::Combined, "Combined"),
    (TooltipMode::Hover, "Hover"),
    (TooltipMode::Click, "Click"),
    (TooltipMode::None, "None"),
];

/// Country names as they appear in Natural Earth's `NAME` property.
const DEMO_VALUES: [(&str, f64); 15] = [
    ("United States of America", 100.0),
    ("Germany", 80.0),
    ("France", 60.0),
    ("China", 95.0),
    ("Brazil", 45.0),
    ("Russia", 80.0),
    ("India", 55.0),
    ("Canada", 65.0),
    ("Australia", 50.0),
    ("Japan", 85.0),
    ("United Kingdom", 75.0),
    ("Italy", 58.0),
    ("Spain", 52.0),
    ("Mexico", 40.0),
    ("South Korea", 72.0),
];

fn demo_data() -> Vec<DataPoint> {
    DEMO_VALUES
        .iter()
        .map(|&(id, value)| DataPoint::new(id, value).with_label("GDP"))
        .collect()
}

fn randomized(data: &[DataPoint]) -> Vec<DataPoint> {
    data.iter()
        .map(|point| DataPoint {
            value: (js_sys::Math::random() * 100.0).round(),
            ..point.clone()
        })
        .collect()
}

fn feature_name(feature: &Feature) -> String {
    feature
        .property(DEMO_PROPERTY_KEY)
        .or_else(|| feature.property("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("?")
        .to_string()
}

/// Persisted demo controls.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    projection: ProjectionKind,
    hue: String,
    tooltip_mode: TooltipMode,
    zoom_enabled: bool,
    show_legend: bool,
    animated: bool,
    stroke_width: f64,
    color_mode: ColorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::NaturalEarth1,
            hue: Hue::Blue.name().to_string(),
            tooltip_mode: TooltipMode::Combined,
            zoom_enabled: true,
            show_legend: true,
            animated: true,
            stroke_width: 0.5,
            color_mode: ColorMode::Light,
        }
    }
}

impl Settings {
    fn options(&self) -> ChoroplethOptions {
        let mut options = ChoroplethOptions {
            property_key: DEMO_PROPERTY_KEY.to_string(),
            ..ChoroplethOptions::default()
        };
        options.projection.kind = self.projection;
        options.color.theme_hue = self.hue.clone();
        options.interaction.tooltip_mode = self.tooltip_mode;
        options.interaction.zoom_enabled = self.zoom_enabled;
        options.animation.enabled = self.animated;
        options.style.stroke_width = self.stroke_width;
        options.legend = LegendOptions {
            show: self.show_legend,
            position: LegendPosition::BottomRight,
            title: Some("GDP Index".to_string()),
            ticks: 5,
            ..LegendOptions::default()
        };
        options
    }
}

async fn fetch_world() -> Result<FeatureCollection, String> {
    let resp = gloo_net::http::Request::get(WORLD_GEOJSON_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let text = resp.text().await.map_err(|e| format!("read error: {e}"))?;
    FeatureCollection::from_json(&text).map_err(|e| format!("parse error: {e}"))
}

fn select_value(e: &web_sys::Event) -> Option<String> {
    let target = e.target()?;
    Some(target.dyn_into::<web_sys::HtmlSelectElement>().ok()?.value())
}

fn checkbox(
    label: &'static str,
    settings: RwSignal<Settings>,
    get: fn(&Settings) -> bool,
    set: fn(&mut Settings, bool),
) -> impl IntoView {
    view! {
        <label style="display: flex; align-items: center; gap: 6px; font-size: 0.85rem;">
            <input
                type="checkbox"
                prop:checked=move || settings.with(get)
                on:change=move |e| {
                    let checked = e
                        .target()
                        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                        .is_some_and(|input| input.checked());
                    settings.update(|s| set(s, checked));
                }
            />
            {label}
        </label>
    }
}

/// Demo page: world map with projection, color and interaction controls.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let settings: RwSignal<Settings> = RwSignal::new(saved);
    let geometry: RwSignal<Option<Arc<FeatureCollection>>> = RwSignal::new(None);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let data: RwSignal<Vec<DataPoint>> = RwSignal::new(demo_data());
    let status: RwSignal<String> = RwSignal::new(String::new());

    spawn_local(async move {
        match fetch_world().await {
            Ok(world) => geometry.set(Some(Arc::new(world))),
            Err(e) => {
                web_sys::console::warn_1(&format!("world geometry: {e}").into());
                load_error.set(Some(e));
            }
        }
    });

    Effect::new(move || {
        let settings = settings.get();
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    let options = Signal::derive(move || settings.with(Settings::options));
    let color_mode = Signal::derive(move || settings.with(|s| s.color_mode));

    let on_hover = Callback::new(move |(feature, point): (Option<Feature>, Option<DataPoint>)| {
        if let Some(feature) = feature {
            let value = point.map(|p| p.value.to_string()).unwrap_or_else(|| "no data".into());
            status.set(format!("Hovered: {} ({value})", feature_name(&feature)));
        }
    });
    let on_click = Callback::new(move |(feature, point): (Feature, Option<DataPoint>)| {
        let message = format!("Clicked: {} {:?}", feature_name(&feature), point);
        web_sys::console::log_1(&message.as_str().into());
        status.set(message);
    });

    let on_projection = move |e: web_sys::Event| {
        if let Some(value) = select_value(&e) {
            settings.update(|s| s.projection = ProjectionKind::from_name(&value));
        }
    };
    let on_hue = move |e: web_sys::Event| {
        if let Some(value) = select_value(&e) {
            settings.update(|s| s.hue = value);
        }
    };
    let on_stroke = move |e: web_sys::Event| {
        let width = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            .and_then(|input| input.value().parse::<f64>().ok());
        if let Some(width) = width {
            settings.update(|s| s.stroke_width = width);
        }
    };

    let page_style = move || {
        let colors = PanelColors::for_mode(color_mode.get());
        format!(
            "min-height: 100vh; padding: 24px; box-sizing: border-box; background: {}; color: {}; font-family: system-ui, sans-serif;",
            colors.background.to_css(),
            colors.text.to_css(),
        )
    };

    view! {
        <div style=page_style>
            <div style="max-width: 1200px; margin: 0 auto; display: flex; flex-direction: column; gap: 16px;">
                <div style="display: flex; justify-content: space-between; align-items: center;">
                    <h2 style="margin: 0;">"Choropleth Map"</h2>
                    <button
                        title="Toggle color scheme"
                        on:click=move |_| settings.update(|s| s.color_mode = s.color_mode.toggled())
                    >
                        {move || if color_mode.get().is_dark() { "Light" } else { "Dark" }}
                    </button>
                </div>

                <div style="display: flex; flex-wrap: wrap; gap: 16px; align-items: center;">
                    <label style="font-size: 0.85rem;">
                        "Projection "
                        <select on:change=on_projection>
                            {ProjectionKind::ALL
                                .into_iter()
                                .map(|kind| view! {
                                    <option
                                        value=kind.name()
                                        selected=move || settings.with(|s| s.projection == kind)
                                    >
                                        {kind.name()}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <label style="font-size: 0.85rem;">
                        "Color "
                        <select on:change=on_hue>
                            {DEMO_HUES
                                .into_iter()
                                .map(|hue| view! {
                                    <option
                                        value=hue.name()
                                        selected=move || settings.with(|s| s.hue == hue.name())
                                    >
                                        {hue.name()}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <div style="display: flex; gap: 4px; font-size: 0.85rem;">
                        "Tooltip "
                        {TOOLTIP_MODES
                            .into_iter()
                            .map(|(mode, label)| view! {
                                <button
                                    style:font-weight=move || {
                                        if settings.with(|s| s.tooltip_mode == mode) { "700" } else { "400" }
                                    }
                                    on:click=move |_| settings.update(|s| s.tooltip_mode = mode)
                                >
                                    {label}
                                </button>
                            })
                            .collect_view()}
                    </div>
                </div>

                <div style="display: flex; flex-wrap: wrap; gap: 16px; align-items: center;">
                    {checkbox("Enable zoom & pan", settings, |s| s.zoom_enabled, |s, v| s.zoom_enabled = v)}
                    {checkbox("Show legend", settings, |s| s.show_legend, |s, v| s.show_legend = v)}
                    {checkbox("Animated", settings, |s| s.animated, |s, v| s.animated = v)}
                    <label style="display: flex; align-items: center; gap: 6px; font-size: 0.85rem;">
                        {move || format!("Stroke width: {:.1}", settings.with(|s| s.stroke_width))}
                        <input
                            type="range"
                            min="0"
                            max="2"
                            step="0.1"
                            prop:value=move || settings.with(|s| s.stroke_width.to_string())
                            on:input=on_stroke
                        />
                    </label>
                    <button on:click=move |_| data.update(|d| *d = randomized(d))>"Randomize data"</button>
                    <button on:click=move |_| {
                        data.update(|d| {
                            for point in d.iter_mut().filter(|p| p.id == "Russia") {
                                point.value += 10.0;
                            }
                        })
                    }>"Increase Russia GDP"</button>
                </div>

                <div style="border: 1px solid rgba(128,128,128,0.3); border-radius: 4px; overflow: hidden;">
                    {move || match (geometry.get(), load_error.get()) {
                        (Some(world), _) => view! {
                            <ChoroplethMap
                                map_data=Signal::stored(Some(world))
                                data=data
                                options=options
                                color_mode=color_mode
                                on_region_hover=on_hover
                                on_region_click=on_click
                                height="500px"
                            />
                        }
                        .into_any(),
                        (None, Some(e)) => view! {
                            <div style="height: 500px; display: flex; align-items: center; justify-content: center;">
                                {format!("Failed to load map data: {e}")}
                            </div>
                        }
                        .into_any(),
                        (None, None) => view! {
                            <div style="height: 500px; display: flex; align-items: center; justify-content: center;">
                                "Loading map data..."
                            </div>
                        }
                        .into_any(),
                    }}
                </div>

                <div style="font-size: 0.8rem; opacity: 0.7; min-height: 1.2em;">{move || status.get()}</div>
            </div>
        </div>
    }
}
