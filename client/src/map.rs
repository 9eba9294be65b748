use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::MouseEvent;

use choropleth_shared::animation::FrameTick;
use choropleth_shared::config::ChoroplethOptions;
use choropleth_shared::data::DataPoint;
use choropleth_shared::geometry::{Feature, FeatureCollection};
use choropleth_shared::legend::LegendModel;
use choropleth_shared::map::{
    ActiveTooltip, ChoroplethMap as MapEngine, PointerUpdate, RegionNotification,
};
use choropleth_shared::theme::ColorMode;

use crate::canvas_surface::CanvasSurface;
use crate::legend::MapLegend;
use crate::listener::EventBinding;
use crate::render_loop::RenderLoop;
use crate::tooltip::{MapTooltip, TooltipRenderer};
use crate::zoom::ZoomBinding;

fn local_point(canvas: &web_sys::HtmlCanvasElement, e: &MouseEvent) -> ([f64; 2], [f64; 2]) {
    let rect = canvas.get_bounding_client_rect();
    let client = [e.client_x() as f64, e.client_y() as f64];
    ([client[0] - rect.left(), client[1] - rect.top()], client)
}

/// Canvas choropleth with tooltip and legend overlays.
///
/// The map fills its container; `width` and `height` are CSS lengths for that container.
#[component]
pub fn ChoroplethMap(
    #[prop(into)] map_data: Signal<Option<Arc<FeatureCollection>>>,
    #[prop(into)] data: Signal<Vec<DataPoint>>,
    #[prop(into)] options: Signal<ChoroplethOptions>,
    #[prop(into, default = Signal::stored(ColorMode::default()))] color_mode: Signal<ColorMode>,
    #[prop(optional)] on_region_hover: Option<Callback<(Option<Feature>, Option<DataPoint>)>>,
    #[prop(optional)] on_region_click: Option<Callback<(Feature, Option<DataPoint>)>>,
    #[prop(optional)] tooltip_content: Option<TooltipRenderer>,
    #[prop(into, default = "100%".to_string())] width: String,
    #[prop(into, default = "100%".to_string())] height: String,
) -> impl IntoView {
    let container_ref = NodeRef::<leptos::html::Div>::new();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let engine = Rc::new(RefCell::new(MapEngine::new(options.get_untracked())));
    let surface: Rc<RefCell<Option<CanvasSurface>>> = Rc::new(RefCell::new(None));
    let suppress_click = Rc::new(Cell::new(false));

    let tooltip = RwSignal::new(None::<ActiveTooltip>);
    let cursor = RwSignal::new("default");
    let legend = RwSignal::new(None::<LegendModel>);

    let redraw: Rc<dyn Fn()> = Rc::new({
        let engine = engine.clone();
        let surface = surface.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let mut slot = surface.borrow_mut();
            if slot.is_none() {
                match CanvasSurface::new(canvas) {
                    Ok(s) => *slot = Some(s),
                    Err(e) => {
                        web_sys::console::warn_1(&format!("choropleth canvas: {e}").into());
                        return;
                    }
                }
            }
            let Some(surface) = slot.as_mut() else {
                return;
            };
            let mut engine = engine.borrow_mut();
            if let Some(container) = container_ref.get_untracked() {
                let dpr = web_sys::window()
                    .map(|w| w.device_pixel_ratio())
                    .unwrap_or(1.0);
                engine.resize(
                    container.client_width() as f64,
                    container.client_height() as f64,
                    dpr,
                );
            }
            engine.render(surface);
        }
    });

    // Overlays read the engine after every change that can move them.
    let sync_overlays = {
        let engine = engine.clone();
        move || {
            let engine = engine.borrow();
            tooltip.set(engine.tooltip());
            cursor.set(engine.cursor());
        }
    };
    let sync_legend = {
        let engine = engine.clone();
        move || {
            let model = engine.borrow_mut().legend();
            legend.set(model);
        }
    };

    let render_loop = StoredValue::new_local(RenderLoop::new({
        let engine = engine.clone();
        let redraw = redraw.clone();
        move |timestamp, scheduler| {
            let tick = engine.borrow_mut().on_frame(timestamp, scheduler);
            if tick != FrameTick::Idle {
                redraw();
            }
        }
    }));

    Effect::new({
        let (engine, redraw, sync_overlays, sync_legend) =
            (engine.clone(), redraw.clone(), sync_overlays.clone(), sync_legend.clone());
        move || {
            let geometry = map_data.get();
            engine.borrow_mut().set_geometry(geometry);
            sync_overlays();
            sync_legend();
            redraw();
        }
    });

    Effect::new({
        let (engine, redraw, sync_legend) = (engine.clone(), redraw.clone(), sync_legend.clone());
        move || {
            let points = data.get();
            let mut scheduler = render_loop.with_value(RenderLoop::scheduler);
            engine.borrow_mut().set_data(&points, &mut scheduler);
            sync_legend();
            redraw();
        }
    });

    Effect::new({
        let (engine, redraw, sync_overlays, sync_legend) =
            (engine.clone(), redraw.clone(), sync_overlays.clone(), sync_legend.clone());
        move || {
            let options = options.get();
            let mut scheduler = render_loop.with_value(RenderLoop::scheduler);
            if let Err(e) = engine.borrow_mut().set_options(options, &mut scheduler) {
                web_sys::console::warn_1(&format!("choropleth options: {e}").into());
            }
            sync_overlays();
            sync_legend();
            redraw();
        }
    });

    Effect::new({
        let (engine, redraw, sync_legend) = (engine.clone(), redraw.clone(), sync_legend.clone());
        move || {
            engine.borrow_mut().set_color_mode(color_mode.get());
            sync_legend();
            redraw();
        }
    });

    // Zoom listeners exist only while zoom is enabled; the transform survives toggling.
    let zoom_enabled = Memo::new(move |_| options.with(|o| o.interaction.zoom_enabled));
    let zoom_binding = StoredValue::new_local(None::<ZoomBinding>);
    Effect::new({
        let (engine, redraw, suppress_click) =
            (engine.clone(), redraw.clone(), suppress_click.clone());
        move || {
            let enabled = zoom_enabled.get();
            let canvas = canvas_ref.get();
            let binding = match canvas {
                Some(canvas) if enabled => match ZoomBinding::attach(
                    canvas,
                    engine.clone(),
                    redraw.clone(),
                    suppress_click.clone(),
                ) {
                    Ok(binding) => Some(binding),
                    Err(e) => {
                        web_sys::console::warn_1(&format!("choropleth zoom: {e}").into());
                        None
                    }
                },
                _ => None,
            };
            zoom_binding.set_value(binding);
        }
    });

    // Window resizes and presses outside the container, bound for the component's lifetime.
    let window_bindings = StoredValue::new_local(Vec::<EventBinding>::new());
    Effect::new({
        let (engine, redraw, sync_overlays) =
            (engine.clone(), redraw.clone(), sync_overlays.clone());
        move || {
            let Some(container) = container_ref.get() else {
                return;
            };
            let Some(window) = web_sys::window() else {
                return;
            };
            let mut bindings = Vec::new();
            let resize = EventBinding::attach(&window, "resize", {
                let redraw = redraw.clone();
                move |_| redraw()
            });
            let outside = window.document().map(|document| {
                EventBinding::attach(&document, "mousedown", {
                    let (engine, redraw, sync_overlays) =
                        (engine.clone(), redraw.clone(), sync_overlays.clone());
                    move |event| {
                        let target = event
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::Node>().ok());
                        if container.contains(target.as_ref()) {
                            return;
                        }
                        if engine.borrow_mut().press_outside() {
                            sync_overlays();
                            redraw();
                        }
                    }
                })
            });
            for binding in [Some(resize), outside].into_iter().flatten() {
                match binding {
                    Ok(binding) => bindings.push(binding),
                    Err(e) => web_sys::console::warn_1(&format!("choropleth: {e}").into()),
                }
            }
            window_bindings.set_value(bindings);
        }
    });

    let apply = {
        let (redraw, sync_overlays) = (redraw.clone(), sync_overlays.clone());
        move |update: PointerUpdate| {
            for notification in update.notifications {
                match notification {
                    RegionNotification::Hover { feature, point } => {
                        if let Some(cb) = on_region_hover {
                            cb.run((feature, point));
                        }
                    }
                    RegionNotification::Click { feature, point } => {
                        if let Some(cb) = on_region_click {
                            cb.run((feature, point));
                        }
                    }
                }
            }
            sync_overlays();
            if update.redraw {
                redraw();
            }
        }
    };

    let on_mouse_move = {
        let (engine, apply) = (engine.clone(), apply.clone());
        move |e: MouseEvent| {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let (local, client) = local_point(&canvas, &e);
            let update = engine.borrow_mut().pointer_move(local, client);
            apply(update);
        }
    };

    let on_mouse_leave = {
        let (engine, apply) = (engine.clone(), apply.clone());
        move |_: MouseEvent| {
            let update = engine.borrow_mut().pointer_leave();
            apply(update);
        }
    };

    let on_click = {
        let (engine, apply) = (engine.clone(), apply.clone());
        move |e: MouseEvent| {
            // The click that ends a pan gesture.
            if suppress_click.replace(false) {
                return;
            }
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let (local, client) = local_point(&canvas, &e);
            let update = engine.borrow_mut().click(local, client);
            apply(update);
        }
    };

    let engine_handle = StoredValue::new_local(engine.clone());
    on_cleanup(move || {
        if let Some(mut scheduler) = render_loop.try_with_value(RenderLoop::scheduler) {
            let _ = engine_handle
                .try_with_value(|engine| engine.borrow_mut().cancel(&mut scheduler));
        }
        zoom_binding.set_value(None);
        window_bindings.set_value(Vec::new());
    });

    let legend_title = Signal::derive(move || options.with(|o| o.legend.title.clone()));
    let legend_position = Signal::derive(move || options.with(|o| o.legend.position));

    view! {
        <div
            node_ref=container_ref
            class="choropleth-map"
            style:width=width
            style:height=height
            style="position: relative; overflow: hidden;"
        >
            <canvas
                node_ref=canvas_ref
                style:cursor=move || cursor.get()
                style="display: block; width: 100%; height: 100%; touch-action: none;"
                on:mousemove=on_mouse_move
                on:mouseleave=on_mouse_leave
                on:click=on_click
            />
            <MapLegend
                model=legend
                title=legend_title
                position=legend_position
                color_mode=color_mode
            />
            <MapTooltip tooltip=tooltip color_mode=color_mode content=tooltip_content />
        </div>
    }
}
