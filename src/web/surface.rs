//! Bindings to the three.js surface object created by the page.
//!
//! Data crosses the boundary as JSON strings; the JS side parses them.

use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine;
use futures_channel::oneshot;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::color::Color;
use crate::decal::DecalSpec;
use crate::error::{ConfiguratorError, Result};
use crate::form::Attachment;
use crate::material::BackdropSurface;
use crate::scene::{RenderablePart, SceneGraph};
use crate::surface::{ModelLoader, RenderSurface, SceneSettings};

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    pub type JsSurface;

    #[wasm_bindgen(method)]
    fn configure(this: &JsSurface, settings: &str);

    /// Calls exactly one of `on_load(partsJson)` / `on_error(err)`.
    #[wasm_bindgen(method, js_name = loadModel)]
    fn load_model(this: &JsSurface, path: &str, on_load: &JsValue, on_error: &JsValue);

    #[wasm_bindgen(method, js_name = applyPartColors)]
    fn apply_part_colors(this: &JsSurface, colors: &str);

    #[wasm_bindgen(method, js_name = setBackdrop)]
    fn set_backdrop(this: &JsSurface, backdrop: &str);

    #[wasm_bindgen(method, js_name = addDecal)]
    fn add_decal(this: &JsSurface, decal: &str);

    /// `canvas.toDataURL("image/png")` of the current frame.
    #[wasm_bindgen(method, catch, js_name = captureFrame)]
    fn capture_frame(this: &JsSurface) -> std::result::Result<String, JsValue>;
}

#[derive(Serialize)]
struct PartColor<'a> {
    name: &'a str,
    color: Color,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    serde_json::to_string(value)
        .map_err(|e| log::error!("cannot encode surface update: {e}"))
        .ok()
}

pub struct JsRenderSurface {
    handle: JsSurface,
}

impl JsRenderSurface {
    pub fn new(handle: JsSurface) -> Self {
        Self { handle }
    }
}

impl RenderSurface for JsRenderSurface {
    fn configure(&mut self, settings: &SceneSettings) {
        if let Some(json) = to_json(settings) {
            self.handle.configure(&json);
        }
    }

    fn apply_part_colors(&mut self, parts: &[RenderablePart]) {
        let colors: Vec<_> = parts
            .iter()
            .filter_map(|p| p.color.map(|color| PartColor { name: &p.name, color }))
            .collect();
        if let Some(json) = to_json(&colors) {
            self.handle.apply_part_colors(&json);
        }
    }

    fn set_backdrop(&mut self, surfaces: &[BackdropSurface]) {
        if let Some(json) = to_json(surfaces) {
            self.handle.set_backdrop(&json);
        }
    }

    fn add_decal(&mut self, decal: &DecalSpec) {
        if let Some(json) = to_json(decal) {
            self.handle.add_decal(&json);
        }
    }

    fn capture_frame(&self) -> Result<Attachment> {
        let data_url = self
            .handle
            .capture_frame()
            .map_err(|e| ConfiguratorError::Capture(format!("{e:?}")))?;
        let (_, encoded) = data_url
            .split_once(',')
            .ok_or_else(|| ConfiguratorError::Capture("not a data URL".into()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ConfiguratorError::Capture(format!("base64 decode error: {e}")))?;
        Ok(Attachment::png("screenshot.png", bytes))
    }
}

pub struct JsModelLoader {
    handle: JsSurface,
}

impl JsModelLoader {
    pub fn new(handle: JsSurface) -> Self {
        Self { handle }
    }
}

type LoadSender = Rc<RefCell<Option<oneshot::Sender<std::result::Result<String, String>>>>>;

fn settle(tx: &LoadSender, outcome: std::result::Result<String, String>) {
    if let Some(tx) = tx.borrow_mut().take() {
        // receiver gone means nobody waits for this load any more
        let _ = tx.send(outcome);
    }
}

impl ModelLoader for JsModelLoader {
    async fn load_model(&self, path: &str) -> Result<SceneGraph> {
        let (tx, rx) = oneshot::channel();
        let tx: LoadSender = Rc::new(RefCell::new(Some(tx)));

        let on_load = {
            let tx = tx.clone();
            Closure::once_into_js(move |parts: JsValue| {
                let outcome = parts.as_string().ok_or_else(|| "part list is not a string".to_owned());
                settle(&tx, outcome);
            })
        };
        let on_error = Closure::once_into_js(move |err: JsValue| {
            settle(&tx, Err(format!("{err:?}")));
        });

        self.handle.load_model(path, &on_load, &on_error);

        let parts = rx
            .await
            .map_err(|_| ConfiguratorError::AssetLoad("loader went away".into()))?
            .map_err(ConfiguratorError::AssetLoad)?;
        SceneGraph::from_json(&parts).map_err(|e| ConfiguratorError::AssetLoad(e.to_string()))
    }
}
