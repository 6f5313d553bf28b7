#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlCanvasElement, WebGl2RenderingContext};

use crate::config::SceneConfig;
use crate::frame::FrameDriver;
use crate::render::GlContext;
use crate::scene::{LightingScene, SetupError};
use crate::sink::ErrorSink;

pub const DEFAULT_CANVAS_ID: &str = "demo-canvas";
pub const ERROR_BOX_ID: &str = "error-box";

#[wasm_bindgen(start)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
}

/// Appends each report as a `<p>` to the `#error-box` element and mirrors it
/// to the browser console.
pub struct DomErrorSink {
    document: Option<Document>,
}

impl DomErrorSink {
    pub fn new() -> Self {
        Self {
            document: window().and_then(|window| window.document()),
        }
    }

    fn append(&self, text: &str) -> Option<()> {
        let document = self.document.as_ref()?;
        let error_box = document.get_element_by_id(ERROR_BOX_ID)?;
        let paragraph = document.create_element("p").ok()?;
        paragraph.set_text_content(Some(text));
        error_box.append_child(&paragraph).ok()?;
        Some(())
    }
}

impl Default for DomErrorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSink for DomErrorSink {
    fn report_error(&self, text: &str) {
        let _ = self.append(text);
        web_sys::console::error_1(&JsValue::from_str(text));
    }
}

#[wasm_bindgen]
pub struct WasmApp {
    inner: Rc<RefCell<AppState>>,
}

#[wasm_bindgen]
impl WasmApp {
    /// Acquires WebGL2 on the canvas and builds the scene. Failures are shown
    /// in the error box before being returned.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: Option<String>) -> Result<WasmApp, JsValue> {
        let sink = DomErrorSink::new();
        let canvas_id = canvas_id.as_deref().unwrap_or(DEFAULT_CANVAS_ID);
        let state = AppState::create(canvas_id, &sink).map_err(|err| {
            let message = err.to_string();
            // Scene setup failures were already reported by the scene itself.
            if err.downcast_ref::<SetupError>().is_none() {
                sink.report_error(&message);
            }
            JsValue::from_str(&message)
        })?;
        Ok(Self {
            inner: Rc::new(RefCell::new(state)),
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        start_animation_loop(Rc::clone(&self.inner))
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }
}

/// Builds the app on the default canvas and starts the animation loop.
#[wasm_bindgen]
pub fn run() -> Result<(), JsValue> {
    let app = WasmApp::new(None)?;
    app.start()
}

struct AppState {
    canvas: HtmlCanvasElement,
    ctx: GlContext,
    scene: LightingScene<GlContext>,
}

impl AppState {
    fn create(canvas_id: &str, sink: &DomErrorSink) -> Result<Self> {
        let document = window()
            .and_then(|window| window.document())
            .ok_or_else(|| anyhow!("document not available"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| {
                anyhow!(
                    "Could not find HTML canvas element - check for typos, or loading JavaScript file too early"
                )
            })?;
        let gl = acquire_webgl2(&document, &canvas)?;

        let ctx = GlContext::new(
            glow::Context::from_webgl2_context(gl),
            canvas.width(),
            canvas.height(),
        );
        let scene = LightingScene::new(&ctx, SceneConfig::default(), sink)?;
        Ok(Self {
            canvas,
            ctx,
            scene,
        })
    }

    fn render_frame(&mut self) -> Result<()> {
        let width = self.canvas.client_width().max(0) as u32;
        let height = self.canvas.client_height().max(0) as u32;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx.set_surface_size(width, height);

        let now = window()
            .and_then(|window| window.performance())
            .ok_or_else(|| anyhow!("performance timer not available"))?
            .now();
        let elapsed = Duration::from_secs_f64(now.max(0.0) / 1000.0);
        self.scene.frame(&self.ctx, elapsed);
        Ok(())
    }
}

fn acquire_webgl2(document: &Document, canvas: &HtmlCanvasElement) -> Result<WebGl2RenderingContext> {
    if let Ok(Some(context)) = canvas.get_context("webgl2") {
        return context
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| anyhow!("webgl2 context has an unexpected type"));
    }

    let webgl1_supported = document
        .create_element("canvas")
        .ok()
        .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
        .map(|scratch| matches!(scratch.get_context("webgl"), Ok(Some(_))))
        .unwrap_or(false);
    if webgl1_supported {
        Err(anyhow!(
            "WebGL 1 is supported, but not v2 - try using a different device or browser"
        ))
    } else {
        Err(anyhow!(
            "WebGL is not supported on this device - try using a different device or browser"
        ))
    }
}

/// Requests a frame whose callback renders and then requests the next one.
/// The callback keeps itself and the app alive for the lifetime of the page.
fn start_animation_loop(app: Rc<RefCell<AppState>>) -> Result<()> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);

    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if let Err(err) = app.borrow_mut().render_frame() {
            web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
        }
        if let Some(closure) = next.borrow().as_ref() {
            if let Err(err) = request_frame(closure) {
                web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
            }
        }
    }) as Box<dyn FnMut()>));

    let first = callback.borrow();
    match first.as_ref() {
        Some(closure) => request_frame(closure),
        None => Ok(()),
    }
}

fn request_frame(closure: &Closure<dyn FnMut()>) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}
