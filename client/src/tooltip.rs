use leptos::prelude::*;

use choropleth_shared::data::DataPoint;
use choropleth_shared::geometry::Feature;
use choropleth_shared::map::ActiveTooltip;
use choropleth_shared::theme::{ColorMode, PanelColors};

/// Host-supplied tooltip body, replacing the default name and value lines.
pub type TooltipRenderer = Callback<(Feature, Option<DataPoint>), AnyView>;

/// Fixed-position tooltip anchored at the pointer that activated the feature.
#[component]
pub fn MapTooltip(
    #[prop(into)] tooltip: Signal<Option<ActiveTooltip>>,
    #[prop(into)] color_mode: Signal<ColorMode>,
    content: Option<TooltipRenderer>,
) -> impl IntoView {
    move || {
        let Some(active) = tooltip.get() else {
            return view! { <div style="display:none;" /> }.into_any();
        };
        let colors = PanelColors::for_mode(color_mode.get());
        let [x, y] = active.position;
        let body = match content {
            Some(render) => render.run((active.feature, active.point)),
            None => {
                let detail = active.content.detail.map(|detail| {
                    view! { <div style="font-size: 0.72rem; opacity: 0.7; margin-top: 2px;">{detail}</div> }
                });
                view! {
                    <div style="font-size: 0.82rem; font-weight: 500;">{active.content.title}</div>
                    {detail}
                }
                .into_any()
            }
        };
        view! {
            <div
                class="choropleth-tooltip"
                style:left=format!("{}px", x + 16.0)
                style:top=format!("{}px", y - 8.0)
                style:background=colors.background.to_css()
                style:color=colors.text.to_css()
                style:border-color=colors.border.to_css()
                style="position: fixed; pointer-events: none; z-index: 100; border: 1px solid; border-radius: 4px; padding: 6px 9px; box-shadow: 0 2px 8px rgba(0,0,0,0.25); font-family: system-ui, sans-serif; max-width: 240px;"
            >
                {body}
            </div>
        }
        .into_any()
    }
}
