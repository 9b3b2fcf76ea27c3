//! Face specification parser
//!
//! Turns the raw text a user supplies for a die into a validated face tree.
//! The raw text may be:
//! - a comma list: `"heads, tails"`
//! - JSON plus a JSONPath query: `'[{"face":"x"}]'` with `$[*]`
//! - a base64 wrapper: `base64://W3siZmFjZSI6IngifV0=` (or `base64:`)
//! - an `http(s)://` URL that serves JSON

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};
use serde_json_path::JsonPath;

use super::face::Face;
use super::fetch::JsonFetcher;
use crate::error::{DiceError, DiceResult};

/// Options recognized when parsing a face spec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceOptions {
    /// Target group qualifier (consumed by the dice service, not the parser)
    pub group: Option<String>,
    /// Items are face objects rather than plain labels
    pub object: bool,
    /// JSONPath query selecting the items from the payload
    pub jsonpath: Option<String>,
}

impl FaceOptions {
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn objects(mut self) -> Self {
        self.object = true;
        self
    }

    pub fn with_jsonpath(mut self, path: impl Into<String>) -> Self {
        self.jsonpath = Some(path.into());
        self
    }
}

/// Working payload after source resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

/// Where the raw spec points to
#[derive(Debug, Clone, PartialEq)]
enum Source {
    Remote(String),
    Inline(String),
}

/// Classify the raw input by prefix, unwrapping base64 on the way
fn classify(raw: &str) -> DiceResult<Source> {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Ok(Source::Remote(raw.to_string()));
    }

    let encoded = raw
        .strip_prefix("base64://")
        .or_else(|| raw.strip_prefix("base64:"));
    match encoded {
        Some(data) => {
            let bytes = BASE64
                .decode(data.trim())
                .map_err(|_| DiceError::FaceInvalid(raw.to_string()))?;
            let text =
                String::from_utf8(bytes).map_err(|_| DiceError::FaceInvalid(raw.to_string()))?;
            Ok(Source::Inline(text))
        }
        None => Ok(Source::Inline(raw.to_string())),
    }
}

/// Parser for face specs
#[derive(Debug, Clone)]
pub struct FaceParser {
    fetcher: JsonFetcher,
    max_depth: usize,
}

impl FaceParser {
    pub fn new(fetcher: JsonFetcher, max_depth: usize) -> Self {
        Self { fetcher, max_depth }
    }

    /// Resolve, extract and normalize a raw face spec
    pub async fn parse(&self, raw: &str, options: &FaceOptions) -> DiceResult<Vec<Face>> {
        let payload = match classify(raw)? {
            Source::Remote(url) => Payload::Json(self.fetcher.fetch_json(&url).await?),
            Source::Inline(text) => Payload::Text(text),
        };
        self.parse_payload(payload, options)
    }

    /// Extract and normalize an already resolved payload
    pub fn parse_payload(&self, payload: Payload, options: &FaceOptions) -> DiceResult<Vec<Face>> {
        let items = extract(payload, options.jsonpath.as_deref())?;
        if options.object {
            self.normalize_objects(&items, 1)
        } else {
            items.iter().map(flat_face).collect()
        }
    }

    fn normalize_objects(&self, items: &[Value], depth: usize) -> DiceResult<Vec<Face>> {
        if depth > self.max_depth {
            return Err(DiceError::FaceInvalid(format!(
                "subfaces nested deeper than {}",
                self.max_depth
            )));
        }
        let faces = items
            .iter()
            .map(|item| {
                let obj = item
                    .as_object()
                    .ok_or_else(|| DiceError::FaceMissingError("face".to_string()))?;
                self.normalize_object(obj, depth)
            })
            .collect::<DiceResult<Vec<Face>>>()?;

        // The roll engine scales a draw by the layer total
        let total: f64 = faces.iter().map(|f| f.weight).sum();
        if !total.is_finite() {
            let labels: Vec<&str> = faces.iter().map(|f| f.face.as_str()).collect();
            return Err(DiceError::FaceInvalid(labels.join(",")));
        }
        Ok(faces)
    }

    fn normalize_object(&self, obj: &Map<String, Value>, depth: usize) -> DiceResult<Face> {
        let label = obj
            .get("face")
            .or_else(|| obj.get("label"))
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| DiceError::FaceMissingError("face".to_string()))?;

        let visible = obj.get("visible").and_then(Value::as_bool).unwrap_or(true);

        let weight = match obj.get("weight") {
            Some(Value::Number(n)) => {
                let weight = n.as_f64().unwrap_or(0.0);
                if !(weight.is_finite() && weight > 0.0) {
                    return Err(DiceError::FaceInvalid(label));
                }
                weight
            }
            _ => 1.0,
        };

        let subfaces = match obj
            .get("subfaces")
            .or_else(|| obj.get("children"))
            .and_then(Value::as_array)
        {
            Some(children) => self.normalize_objects(children, depth + 1)?,
            None => Vec::new(),
        };

        Ok(Face {
            face: label,
            visible,
            weight,
            subfaces,
        })
    }
}

/// Pull the item list out of the payload
fn extract(payload: Payload, jsonpath: Option<&str>) -> DiceResult<Vec<Value>> {
    match (jsonpath, payload) {
        (Some(path), payload) => {
            let json = match payload {
                Payload::Text(text) => serde_json::from_str::<Value>(&text)
                    .map_err(|_| DiceError::JsonParseError(text.clone()))?,
                Payload::Json(value) => value,
            };
            let query =
                JsonPath::parse(path).map_err(|_| DiceError::JsonPathError(path.to_string()))?;
            Ok(query.query(&json).all().into_iter().cloned().collect())
        }
        (None, Payload::Text(text)) => Ok(text
            .split(',')
            .map(|s| Value::String(s.trim().to_string()))
            .collect()),
        (None, Payload::Json(value)) => Err(DiceError::FaceInvalid(value.to_string())),
    }
}

/// Leaf face from a flat item
fn flat_face(item: &Value) -> DiceResult<Face> {
    match item {
        Value::String(s) => Ok(Face::leaf(s.trim())),
        Value::Number(n) => Ok(Face::leaf(n.to_string())),
        Value::Bool(b) => Ok(Face::leaf(b.to_string())),
        other => Err(DiceError::FaceInvalid(other.to_string())),
    }
}
