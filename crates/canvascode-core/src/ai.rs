//! External AI collaborator boundary.
//!
//! The engine never talks to a model directly; shells implement
//! [`AnalysisProvider`] / [`ChatProvider`] and feed results back in. Results
//! arrive asynchronously and may be stale, so every apply path tolerates a
//! target object that no longer exists.

use crate::object::{CanvasObject, ObjectId, ObjectKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("provider request failed: {0}")]
    Provider(String),
    #[error("editable layer payload is not a JSON array")]
    MalformedLayer,
    #[error("editable layer element {index} rejected: {reason}")]
    InvalidElement { index: usize, reason: String },
}

/// What kind of output the analysis should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    Code,
    Wireframe,
    DesignSystem,
    Style,
    UxAudit,
    EditableLayer,
}

/// Provider-independent request options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Structured analysis output. `code` carries generated markup, or for
/// [`AnalysisMode::EditableLayer`] the JSON element array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_guide: Option<String>,
}

/// One-shot image analysis.
pub trait AnalysisProvider {
    fn analyze(
        &self,
        image_png: Vec<u8>,
        prompt: String,
        settings: &AnalysisSettings,
        mode: AnalysisMode,
    ) -> BoxFuture<'_, Result<AnalysisResult, AnalysisError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// An image referenced from a chat message, e.g. via an `@Name` mention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAttachment {
    pub name: String,
    pub data_uri: String,
}

/// Multi-turn conversation about the canvas.
pub trait ChatProvider {
    fn chat(
        &self,
        history: &[ChatMessage],
        message: String,
        attachments: Vec<ChatAttachment>,
    ) -> BoxFuture<'_, Result<String, AnalysisError>>;
}

/// One synthesized element of an editable layer, positions relative to the
/// layer's top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerElement {
    pub kind: ObjectKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: i64,
}

/// Parse the `code` field of an editable-layer result.
///
/// Lenient by design: models fence their JSON, omit optional fields and emit
/// integers where reals are expected. Unknown element types are skipped with
/// a warning rather than failing the batch; structurally invalid geometry
/// fails it, since splicing half a layer is worse than splicing none.
pub fn parse_editable_layer(code: &str) -> Result<Vec<LayerElement>, AnalysisError> {
    let json = strip_code_fence(code);
    let value: Value = serde_json::from_str(json).map_err(|_| AnalysisError::MalformedLayer)?;
    let array = value.as_array().ok_or(AnalysisError::MalformedLayer)?;

    let mut elements = Vec::with_capacity(array.len());
    for (index, item) in array.iter().enumerate() {
        let ty = item.get("type").and_then(Value::as_str).unwrap_or("");
        let kind = match ty {
            "text" => ObjectKind::Text {
                content: item
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                font_size: num(item, "fontSize").filter(|f| *f > 0.0).unwrap_or(16.0),
            },
            "rectangle" => ObjectKind::Rectangle {
                background_color: item
                    .get("backgroundColor")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            "layout" => ObjectKind::Layout {
                background_color: item
                    .get("backgroundColor")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            other => {
                log::warn!("editable layer element {index}: skipping unknown type {other:?}");
                continue;
            }
        };

        let x = num(item, "x").unwrap_or(0.0);
        let y = num(item, "y").unwrap_or(0.0);
        let width = num(item, "width").unwrap_or(0.0);
        let height = num(item, "height").unwrap_or(0.0);
        if !x.is_finite() || !y.is_finite() {
            return Err(AnalysisError::InvalidElement {
                index,
                reason: "non-finite position".to_string(),
            });
        }
        if !(width.is_finite() && width > 0.0) || !(height.is_finite() && height > 0.0) {
            return Err(AnalysisError::InvalidElement {
                index,
                reason: "non-positive size".to_string(),
            });
        }

        elements.push(LayerElement {
            kind,
            x,
            y,
            width,
            height,
            z_index: num(item, "zIndex").map(|z| z as i64).unwrap_or(0),
        });
    }
    Ok(elements)
}

/// Materialize layer elements as canvas objects anchored at `(anchor_x,
/// anchor_y)` (the replaced selection's top-left), stacked above `base_z`.
pub fn synthesize_objects(
    elements: Vec<LayerElement>,
    anchor_x: f64,
    anchor_y: f64,
    base_z: i64,
) -> Vec<CanvasObject> {
    elements
        .into_iter()
        .map(|el| {
            let mut obj = CanvasObject::new(
                el.kind,
                anchor_x + el.x + el.width / 2.0,
                anchor_y + el.y + el.height / 2.0,
                el.width,
                el.height,
            );
            obj.z_index = base_z + 1 + el.z_index;
            obj
        })
        .collect()
}

/// Lookup key for `@Name` mentions: the nth image-bearing object.
pub fn image_source_at(objects: &[&CanvasObject], index: usize) -> Option<(ObjectId, String)> {
    let obj = objects.get(index)?;
    obj.image_src().map(|src| (obj.id.clone(), src.to_string()))
}

fn num(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn strip_code_fence(code: &str) -> &str {
    let trimmed = code.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
