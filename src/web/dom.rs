//! The HTML form, page chrome and navigation.
//!
//! Expected markup: a `#bag-form` containing inputs named `name`, `font`,
//! `color`, `flavours` and `image`; buttons `#submit-button`,
//! `#reset-button`, `#continue-button`; a `#status` line; and a
//! `#loading-overlay` holding `#loading-message` and `#retry-button`.

use anyhow::{anyhow, Context, Result};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, File, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, Window,
};

use crate::config::AppConfig;
use crate::form::{Attachment, FileField, RawForm};
use crate::ui::{FormSurface, Navigator, Notice, Overlay, UiState};

pub const CONFIG_ELEMENT_ID: &str = "configurator-config";

const TEXT_FIELDS: [&str; 4] = ["name", "font", "color", "flavours"];

pub fn js_err(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

/// Defaults, overridden by the page's JSON config block if there is one.
pub fn read_config(document: &Document) -> Result<AppConfig> {
    let text = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(AppConfig::default().normalized());
    }
    AppConfig::from_json(&text).context("reading #configurator-config")
}

pub fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("element #{id} not found"))?
        .dyn_into::<T>()
        .map_err(|_| anyhow!("element #{id} has an unexpected type"))
}

fn value_of(el: &Element) -> Option<String> {
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        Some(input.value())
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        Some(select.value())
    } else {
        el.dyn_ref::<HtmlTextAreaElement>().map(HtmlTextAreaElement::value)
    }
}

fn set_value_of(el: &Element, value: &str) {
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    }
}

async fn read_file(file: &File) -> Result<Attachment> {
    let buffer = JsFuture::from(file.array_buffer()).await.map_err(js_err)?;
    Ok(Attachment {
        filename: file.name(),
        mime: file.type_(),
        bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
    })
}

/// Read access to the form inputs. Cheap to clone into event handlers.
#[derive(Clone)]
pub struct FormFields {
    form: Element,
}

impl FormFields {
    pub fn new(form: Element) -> Self {
        Self { form }
    }

    pub fn field(&self, name: &str) -> Option<Element> {
        self.form.query_selector(&format!("[name=\"{name}\"]")).ok().flatten()
    }

    /// Snapshot of every field. The chosen image, if any, is read into memory.
    pub async fn read(&self) -> Result<RawForm> {
        let text = |name| self.field(name).as_ref().and_then(value_of);

        let image = match self.field("image") {
            None => FileField::Missing,
            Some(el) => {
                let input = el
                    .dyn_into::<HtmlInputElement>()
                    .map_err(|_| anyhow!("`image` is not an input"))?;
                match input.files().and_then(|files| files.get(0)) {
                    Some(file) => FileField::Selected(read_file(&file).await.context("reading the chosen image")?),
                    None => FileField::Empty,
                }
            }
        };

        Ok(RawForm {
            name: text("name"),
            font: text("font"),
            color: text("color"),
            flavours: text("flavours"),
            image,
        })
    }
}

pub struct DomForm {
    fields: FormFields,
    submit: HtmlButtonElement,
    continue_button: HtmlElement,
    status: HtmlElement,
    overlay: HtmlElement,
    overlay_message: HtmlElement,
    retry: HtmlElement,
}

impl DomForm {
    pub fn bind(document: &Document) -> Result<Self> {
        Ok(Self {
            fields: FormFields::new(by_id(document, "bag-form")?),
            submit: by_id(document, "submit-button")?,
            continue_button: by_id(document, "continue-button")?,
            status: by_id(document, "status")?,
            overlay: by_id(document, "loading-overlay")?,
            overlay_message: by_id(document, "loading-message")?,
            retry: by_id(document, "retry-button")?,
        })
    }

    pub fn fields(&self) -> FormFields {
        self.fields.clone()
    }
}

impl FormSurface for DomForm {
    fn clear(&mut self) {
        for name in TEXT_FIELDS.into_iter().chain(["image"]) {
            if let Some(el) = self.fields.field(name) {
                set_value_of(&el, "");
            }
        }
    }

    fn set_color_input(&mut self, hex: &str) {
        if let Some(el) = self.fields.field("color") {
            set_value_of(&el, hex);
        }
    }

    fn render(&mut self, ui: &UiState) {
        match &ui.overlay {
            Overlay::Loading => {
                self.overlay.set_hidden(false);
                self.overlay_message.set_text_content(Some("Loading…"));
                self.retry.set_hidden(true);
            }
            Overlay::Failed(message) => {
                self.overlay.set_hidden(false);
                self.overlay_message.set_text_content(Some(message));
                self.retry.set_hidden(false);
            }
            Overlay::Hidden => self.overlay.set_hidden(true),
        }

        self.submit.set_disabled(!ui.submit_enabled);
        self.continue_button.set_hidden(!ui.continue_visible);

        let (class, text) = match &ui.notice {
            None => ("status", ""),
            Some(Notice::Info(text)) => ("status status--info", text.as_str()),
            Some(Notice::Error(text)) => ("status status--error", text.as_str()),
        };
        self.status.set_class_name(class);
        self.status.set_text_content(Some(text));
    }
}

pub struct LocationNavigator {
    window: Window,
}

impl LocationNavigator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Navigator for LocationNavigator {
    fn navigate(&self, url: &str) {
        if let Err(e) = self.window.location().set_href(url) {
            log::error!("navigation to {url} failed: {e:?}");
        }
    }
}
