//! JavaScript collaborators.
//!
//! Adapts host callbacks to the expansion traits. Callbacks may return a
//! value or a promise; either way the result is awaited and decoded with
//! serde-wasm-bindgen. A thrown error or rejected promise becomes
//! [`GenerationError::Failed`] carrying the JS error message.

use async_trait::async_trait;
use js_sys::{Function, Promise};
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::GenerationError;
use crate::expansion::{ConfirmationGate, CreativeRenderer, GenerationContext, GenerationProvider};
use crate::graph::{CreativeConcept, NodeKind, NodePayload};

/// `generate(kind, context) => Promise<object[]>`.
///
/// The callback answers with plain data objects for the requested kind (a
/// persona array for `"persona"`, and so on); the kind tag is added here.
pub struct JsGenerationProvider {
    callback: Function,
}

impl JsGenerationProvider {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

#[async_trait(?Send)]
impl GenerationProvider for JsGenerationProvider {
    async fn generate(
        &self,
        kind: NodeKind,
        context: &GenerationContext,
    ) -> Result<Vec<NodePayload>, GenerationError> {
        let context = serde_wasm_bindgen::to_value(context)
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        let returned = self
            .callback
            .call2(&JsValue::NULL, &JsValue::from_str(kind.as_str()), &context)
            .map_err(js_failure)?;
        let value = settle(returned).await?;
        decode_payloads(kind, value)
    }
}

/// `render(concept) => Promise<string[]>`.
pub struct JsCreativeRenderer {
    callback: Function,
}

impl JsCreativeRenderer {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

#[async_trait(?Send)]
impl CreativeRenderer for JsCreativeRenderer {
    async fn render(&self, concept: &CreativeConcept) -> Result<Vec<String>, GenerationError> {
        let concept = serde_wasm_bindgen::to_value(concept)
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        let returned = self
            .callback
            .call1(&JsValue::NULL, &concept)
            .map_err(js_failure)?;
        decode(settle(returned).await?)
    }
}

/// Confirmation through `window.confirm`. Without a window nothing is
/// confirmed.
pub struct BrowserConfirm;

impl ConfirmationGate for BrowserConfirm {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|window| window.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

/// Await `value` if it is a promise, otherwise take it as is.
async fn settle(value: JsValue) -> Result<JsValue, GenerationError> {
    JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(js_failure)
}

pub(crate) fn js_failure(value: JsValue) -> GenerationError {
    let message = match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => value.as_string().unwrap_or_else(|| format!("{value:?}")),
    };
    GenerationError::Failed(message)
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, GenerationError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| GenerationError::Decode(e.to_string()))
}

fn decode_as<T: DeserializeOwned>(
    value: JsValue,
    wrap: impl Fn(T) -> NodePayload,
) -> Result<Vec<NodePayload>, GenerationError> {
    Ok(decode::<Vec<T>>(value)?.into_iter().map(wrap).collect())
}

fn decode_payloads(kind: NodeKind, value: JsValue) -> Result<Vec<NodePayload>, GenerationError> {
    match kind {
        NodeKind::RootBrief => decode_as(value, NodePayload::RootBrief),
        NodeKind::Persona => decode_as(value, NodePayload::Persona),
        NodeKind::PainOrDesire => decode_as(value, NodePayload::PainOrDesire),
        NodeKind::Objection => decode_as(value, NodePayload::Objection),
        NodeKind::Offer => decode_as(value, NodePayload::Offer),
        NodeKind::AwarenessStage => decode_as(value, NodePayload::AwarenessStage),
        NodeKind::Angle => decode_as(value, NodePayload::Angle),
        NodeKind::Trigger => decode_as(value, NodePayload::Trigger),
        NodeKind::Format => decode_as(value, NodePayload::Format),
        NodeKind::Placement => decode_as(value, NodePayload::Placement),
        NodeKind::CreativeResult => decode_as(value, |concept: CreativeConcept| concept.into()),
    }
}
