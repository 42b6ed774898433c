use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::rc::Rc;

use backdrop_core::render::PointsRenderer;
use backdrop_core::theme::{NoTheme, ThemeSource};
use backdrop_core::Backdrop;
use log::LevelFilter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, HtmlCanvasElement, WebGl2RenderingContext, Window};

use crate::{drawing_buffer_size, logger, parse_options, CANVAS_STYLE};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Theme properties read from the root element's computed style.
struct ComputedStyle(CssStyleDeclaration);

impl ThemeSource for ComputedStyle {
    fn custom_property(&self, name: &str) -> Option<String> {
        self.0.get_property_value(name).ok()
    }
}

struct Mounted {
    backdrop: Backdrop,
    renderer: Option<PointsRenderer>,
    gl: glow::Context,
    canvas: HtmlCanvasElement,
    last_ms: Option<f64>,
}

impl Mounted {
    fn fit_to_viewport(&self, window: &Window) -> (u32, u32) {
        let css = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
        let dpr = self.backdrop.scene().dpr.clamp(window.device_pixel_ratio());
        let (w, h) = drawing_buffer_size(css(window.inner_width()), css(window.inner_height()), dpr);
        if self.canvas.width() != w {
            self.canvas.set_width(w);
        }
        if self.canvas.height() != h {
            self.canvas.set_height(h);
        }
        (w, h)
    }

    #[allow(unsafe_code)]
    fn tick(&mut self, window: &Window, now_ms: f64) {
        use glow::HasContext;

        let dt = self.last_ms.map_or(0.0, |last| (now_ms - last) / 1000.0);
        self.last_ms = Some(now_ms);
        self.backdrop.frame(dt, now_ms / 1000.0);

        let (w, h) = self.fit_to_viewport(window);
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if self.backdrop.take_needs_upload() {
            renderer.upload(&self.gl, self.backdrop.positions());
        }
        // SAFETY: clearing the default framebuffer of a live context.
        unsafe {
            self.gl.clear_color(0.0, 0.0, 0.0, 0.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
        renderer.draw(&self.gl, self.backdrop.scene(), w, h);
    }

    fn teardown(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.destroy(&self.gl);
        }
        self.canvas.remove();
    }
}

/// A mounted backdrop. Dropping the handle does not stop the animation;
/// call [`BackdropHandle::unmount`].
#[wasm_bindgen]
pub struct BackdropHandle {
    state: Rc<RefCell<Option<Mounted>>>,
    frame_id: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

#[wasm_bindgen]
impl BackdropHandle {
    /// Applies new options. Resolves to `false` when nothing changed.
    pub fn reconfigure(&self, options_json: &str) -> Result<bool, JsValue> {
        let config = parse_options(options_json).map_err(js_err)?;
        let mut state = self.state.borrow_mut();
        let mounted = state
            .as_mut()
            .ok_or_else(|| js_err("backdrop is unmounted"))?;
        mounted.backdrop.reconfigure(config).map_err(js_err)
    }

    #[wasm_bindgen(getter, js_name = particleCount)]
    pub fn particle_count(&self) -> usize {
        self.state
            .borrow()
            .as_ref()
            .map_or(0, |m| m.backdrop.store().len())
    }

    /// Cancels the pending frame, releases GL objects, and removes the
    /// canvas. Safe to call more than once.
    pub fn unmount(&self) {
        if let (Some(id), Some(window)) = (self.frame_id.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
        if let Some(mut mounted) = self.state.borrow_mut().take() {
            mounted.teardown();
            log::debug!("backdrop unmounted");
        }
        self.callback.borrow_mut().take();
    }
}

/// Mounts the backdrop behind page content.
///
/// `options_json` is a JSON object of camelCase options (`count`, `speed`,
/// `dotSize`, `glow`, `colorMode`, ...); an empty string uses defaults.
#[wasm_bindgen]
pub fn mount(options_json: &str) -> Result<BackdropHandle, JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    let config = parse_options(options_json).map_err(js_err)?;
    let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
    let document = window.document().ok_or_else(|| js_err("no document"))?;
    let body = document.body().ok_or_else(|| js_err("no body"))?;

    let style = match document.document_element() {
        Some(root) => window.get_computed_style(&root)?,
        None => None,
    };
    let placement_seed = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;
    let backdrop = match style {
        Some(style) => Backdrop::new(config, &ComputedStyle(style), placement_seed),
        None => Backdrop::new(config, &NoTheme, placement_seed),
    }
    .map_err(js_err)?;

    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_err("created element is not a canvas"))?;
    canvas.set_attribute("style", CANVAS_STYLE)?;
    canvas.set_attribute("aria-hidden", "true")?;

    let context = canvas
        .get_context("webgl2")?
        .ok_or_else(|| js_err("WebGL2 is not available"))?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| js_err("webgl2 context has an unexpected type"))?;
    let gl = glow::Context::from_webgl2_context(context);
    let renderer =
        PointsRenderer::new(&gl, backdrop.sprite(), backdrop.positions()).map_err(js_err)?;

    body.append_child(&canvas)?;

    let state = Rc::new(RefCell::new(Some(Mounted {
        backdrop,
        renderer: Some(renderer),
        gl,
        canvas,
        last_ms: None,
    })));
    let frame_id = Rc::new(Cell::new(None));
    let callback: FrameCallback = Rc::new(RefCell::new(None));

    let loop_state = state.clone();
    let loop_id = frame_id.clone();
    let loop_callback = callback.clone();
    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
        let Some(window) = web_sys::window() else {
            return;
        };
        match loop_state.borrow_mut().as_mut() {
            Some(mounted) => mounted.tick(&window, now_ms),
            None => return,
        }
        if let Some(cb) = loop_callback.borrow().as_ref() {
            match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => loop_id.set(Some(id)),
                Err(e) => log::error!("requestAnimationFrame failed: {e:?}"),
            }
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(cb) = callback.borrow().as_ref() {
        frame_id.set(Some(window.request_animation_frame(cb.as_ref().unchecked_ref())?));
    }
    log::debug!("backdrop mounted");

    Ok(BackdropHandle {
        state,
        frame_id,
        callback,
    })
}
