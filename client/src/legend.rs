use leptos::prelude::*;

use choropleth_shared::config::{LEGEND_SWATCH_GAP_PX, LEGEND_SWATCH_PX};
use choropleth_shared::legend::{LegendModel, LegendPosition};
use choropleth_shared::theme::{ColorMode, PanelColors};

use crate::canvas_surface::CanvasSurface;

/// Gradient strip with tick labels, or swatches for categorical data, in a corner panel.
#[component]
pub fn MapLegend(
    #[prop(into)] model: Signal<Option<LegendModel>>,
    #[prop(into)] title: Signal<Option<String>>,
    #[prop(into)] position: Signal<LegendPosition>,
    #[prop(into)] color_mode: Signal<ColorMode>,
) -> impl IntoView {
    let gradient_ref = NodeRef::<leptos::html::Canvas>::new();

    Effect::new(move || {
        let Some(model) = model.get() else {
            return;
        };
        let Some(canvas) = gradient_ref.get() else {
            return;
        };
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        match CanvasSurface::new(canvas) {
            Ok(mut surface) => model.draw_gradient(&mut surface, dpr),
            Err(e) => web_sys::console::warn_1(&format!("legend canvas: {e}").into()),
        }
    });

    move || {
        let model = model.get()?;
        let colors = PanelColors::for_mode(color_mode.get());
        let panel_style = format!(
            "position: absolute; z-index: 10; {} padding: 8px; border-radius: 4px; box-shadow: 0 1px 3px rgba(0,0,0,0.2); background: {}; color: {}; font-family: system-ui, sans-serif; font-size: 0.72rem;",
            position.get().css(),
            colors.background.to_css(),
            colors.text.to_css(),
        );
        let heading = title
            .get()
            .map(|title| view! { <div style="font-weight: 500; margin-bottom: 4px;">{title}</div> });
        let body = match model {
            LegendModel::Swatches(palette) => view! {
                <div style=format!("display: flex; flex-wrap: wrap; gap: {LEGEND_SWATCH_GAP_PX}px;")>
                    {palette
                        .into_iter()
                        .map(|color| view! {
                            <div style=format!(
                                "width: {LEGEND_SWATCH_PX}px; height: {LEGEND_SWATCH_PX}px; border-radius: 2px; background: {};",
                                color.to_css()
                            ) />
                        })
                        .collect_view()}
                </div>
            }
            .into_any(),
            LegendModel::Gradient { columns, height, ticks } => view! {
                <canvas
                    node_ref=gradient_ref
                    style=format!("display: block; border-radius: 2px; width: {}px; height: {height}px;", columns.len())
                />
                <div style="display: flex; justify-content: space-between; margin-top: 4px;">
                    {ticks.into_iter().map(|tick| view! { <span>{tick.label}</span> }).collect_view()}
                </div>
            }
            .into_any(),
        };
        Some(view! {
            <div class="choropleth-legend" style=panel_style>
                {heading}
                {body}
            </div>
        })
    }
}
