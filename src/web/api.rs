//! `POST /bags` over `fetch`, with a timeout that aborts the request.

use std::cell::Cell;
use std::rc::Rc;

use gloo_net::http::Request;
use js_sys::{Array, Uint8Array};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AbortController, Blob, BlobPropertyBag, FormData};

use crate::error::{ConfiguratorError, Result};
use crate::form::Attachment;
use crate::submission::{interpret_response, BagApi, BagRequest, MultipartForm, PartValue};

pub struct HttpBagApi {
    timeout_ms: u32,
}

impl HttpBagApi {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

fn network_err(e: impl core::fmt::Debug) -> ConfiguratorError {
    ConfiguratorError::SubmissionNetwork(format!("{e:?}"))
}

impl BagApi for HttpBagApi {
    async fn post_bag(&self, request: BagRequest) -> Result<Value> {
        let body = to_form_data(&request.form).map_err(network_err)?;
        let controller = AbortController::new().map_err(network_err)?;
        let timed_out = Rc::new(Cell::new(false));
        let timer = AbortTimer::arm(self.timeout_ms, controller.clone(), timed_out.clone()).map_err(network_err)?;

        let sent = Request::post(&request.url)
            .header("Authorization", &request.authorization)
            .abort_signal(Some(&controller.signal()))
            .body(body)
            .map_err(network_err)?
            .send()
            .await;
        drop(timer);

        let response = match sent {
            Ok(response) => response,
            Err(_) if timed_out.get() => {
                return Err(ConfiguratorError::SubmissionTimeout {
                    after_ms: self.timeout_ms,
                });
            }
            Err(e) => return Err(ConfiguratorError::SubmissionNetwork(e.to_string())),
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConfiguratorError::SubmissionParse(e.to_string()))?;
        interpret_response(status, &text)
    }
}

fn to_form_data(form: &MultipartForm) -> std::result::Result<FormData, JsValue> {
    let data = FormData::new()?;
    for part in form.parts() {
        match &part.value {
            PartValue::Text(text) => data.append_with_str(part.name, text)?,
            PartValue::File(file) => data.append_with_blob_and_filename(part.name, &to_blob(file)?, &file.filename)?,
        }
    }
    Ok(data)
}

fn to_blob(file: &Attachment) -> std::result::Result<Blob, JsValue> {
    let bytes = Uint8Array::from(file.bytes.as_slice());
    let options = BlobPropertyBag::new();
    options.set_type(&file.mime);
    Blob::new_with_u8_array_sequence_and_options(&Array::of1(&bytes), &options)
}

/// Aborts the fetch when it fires; cleared on drop.
struct AbortTimer {
    window: web_sys::Window,
    handle: i32,
    _on_timeout: Closure<dyn FnMut()>,
}

impl AbortTimer {
    fn arm(ms: u32, controller: AbortController, fired: Rc<Cell<bool>>) -> std::result::Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let on_timeout = Closure::<dyn FnMut()>::new(move || {
            log::warn!("submission still pending after {ms} ms, aborting");
            fired.set(true);
            controller.abort();
        });
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            on_timeout.as_ref().unchecked_ref(),
            i32::try_from(ms).unwrap_or(i32::MAX),
        )?;
        Ok(Self {
            window,
            handle,
            _on_timeout: on_timeout,
        })
    }
}

impl Drop for AbortTimer {
    fn drop(&mut self) {
        self.window.clear_timeout_with_handle(self.handle);
    }
}
