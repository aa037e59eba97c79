//! Browser entry point (wasm32).
//!
//! The page calls `mount(createSurface)` once. `createSurface` builds the
//! three.js renderer and is only invoked after the session check passed, so
//! an unauthenticated visit never starts any rendering work.

mod api;
mod dom;
mod surface;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlElement, HtmlInputElement};

use crate::app::{self, Configurator};
use api::HttpBagApi;
use dom::{by_id, js_err, DomForm, FormFields, LocationNavigator};
use surface::{JsModelLoader, JsRenderSurface, JsSurface};

type App = Configurator<JsRenderSurface, DomForm, LocationNavigator>;

#[wasm_bindgen]
pub async fn mount(create_surface: js_sys::Function) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    run(create_surface).await.map_err(|e| {
        log::error!("configurator failed to start: {e:#}");
        JsValue::from_str(&format!("{e:#}"))
    })
}

async fn run(create_surface: js_sys::Function) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let document = window.document().ok_or_else(|| anyhow!("no document"))?;

    let config = dom::read_config(&document)?;
    // already installed on a second mount
    console_log::init_with_level(config.log_level()).ok();

    let href = window.location().href().map_err(js_err)?;
    let started = app::start(&href, config, LocationNavigator::new(window), |_| -> Result<_> {
        let handle: JsSurface = create_surface.call0(&JsValue::NULL).map_err(js_err)?.unchecked_into();
        let form = DomForm::bind(&document)?;
        Ok((JsRenderSurface::new(handle.clone()), form, JsModelLoader::new(handle)))
    })?;
    let Some((configurator, loader)) = started else {
        return Ok(());
    };

    let fields = configurator.form().fields();
    let api = Rc::new(HttpBagApi::new(configurator.config().submit_timeout_ms));
    let loader = Rc::new(loader);
    let app = Rc::new(RefCell::new(configurator));

    wire_events(&document, &fields, &app, &loader, &api)?;
    app::load_model(&*app, &*loader).await;
    Ok(())
}

fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) -> Result<()> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(js_err)?;
    // listeners live as long as the page
    closure.forget();
    Ok(())
}

fn wire_events(
    document: &web_sys::Document,
    fields: &FormFields,
    app: &Rc<RefCell<App>>,
    loader: &Rc<JsModelLoader>,
    api: &Rc<HttpBagApi>,
) -> Result<()> {
    let color = fields.field("color").ok_or_else(|| anyhow!("form has no `color` input"))?;
    {
        let app = app.clone();
        listen(&color, "input", move |event| {
            if let Some(input) = event.target().and_then(|t| t.dyn_into::<HtmlInputElement>().ok()) {
                app.borrow_mut().set_color(&input.value());
            }
        })?;
    }

    let form: HtmlElement = by_id(document, "bag-form")?;
    {
        let (app, api, fields) = (app.clone(), api.clone(), fields.clone());
        listen(&form, "submit", move |event| {
            event.prevent_default();
            let (app, api, fields) = (app.clone(), api.clone(), fields.clone());
            wasm_bindgen_futures::spawn_local(async move {
                match fields.read().await {
                    Ok(raw) => {
                        app::submit(&*app, raw, &*api).await;
                    }
                    Err(e) => {
                        log::error!("could not read the form: {e:#}");
                        app.borrow_mut().notify_error("Could not read the form, please check the image file.");
                    }
                }
            });
        })?;
    }

    let reset: HtmlElement = by_id(document, "reset-button")?;
    {
        let app = app.clone();
        listen(&reset, "click", move |event| {
            event.prevent_default();
            app.borrow_mut().reset();
        })?;
    }

    let continue_button: HtmlElement = by_id(document, "continue-button")?;
    {
        let app = app.clone();
        listen(&continue_button, "click", move |_| app.borrow().continue_to_dashboard())?;
    }

    let retry: HtmlElement = by_id(document, "retry-button")?;
    {
        let (app, loader) = (app.clone(), loader.clone());
        listen(&retry, "click", move |_| {
            let (app, loader) = (app.clone(), loader.clone());
            wasm_bindgen_futures::spawn_local(async move {
                app::load_model(&*app, &*loader).await;
            });
        })?;
    }

    Ok(())
}
