//! Result payload resolution
//!
//! A completed job's `result` is either one object or a sequence of objects,
//! and the media locator can sit under several field names. [`ResultPayload`]
//! makes the shape explicit and [`LOCATOR_FIELDS`] lists the accepted names in
//! priority order; supporting a new alias is a one-line change to that table.

use crate::error::{Error, Result};
use crate::types::MediaReference;
use serde_json::{Map, Value};

/// One rule of the extractor table
///
/// Returns the locator when the rule matches the given object.
pub type Extractor = fn(&Map<String, Value>) -> Option<&str>;

/// Locator field names in priority order: generic, then video, then image
pub const LOCATOR_FIELDS: &[(&str, Extractor)] = &[
    ("mediaUrl", media_url),
    ("video", video),
    ("image", image),
];

fn media_url(obj: &Map<String, Value>) -> Option<&str> {
    non_empty_str(obj, "mediaUrl")
}

fn video(obj: &Map<String, Value>) -> Option<&str> {
    non_empty_str(obj, "video")
}

fn image(obj: &Map<String, Value>) -> Option<&str> {
    non_empty_str(obj, "image")
}

// null, non-string and empty values do not count as a match
fn non_empty_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Shape of a completed job's `result` field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultPayload<'a> {
    /// A single result object (or any non-sequence value)
    Single(&'a Value),
    /// An ordered sequence; only its head is considered
    Many(&'a [Value]),
}

impl<'a> ResultPayload<'a> {
    /// Classify a raw `result` field
    ///
    /// Absent and null fields yield `None`.
    pub fn from_field(result: Option<&'a Value>) -> Option<Self> {
        match result? {
            Value::Null => None,
            Value::Array(items) => Some(ResultPayload::Many(items)),
            other => Some(ResultPayload::Single(other)),
        }
    }

    /// The element that carries the locator
    pub fn head(&self) -> Option<&'a Value> {
        match self {
            ResultPayload::Single(value) => Some(value),
            ResultPayload::Many(items) => items.first(),
        }
    }
}

/// Resolve a completed job's `result` field into a media reference
///
/// # Errors
///
/// Returns [`Error::ResultResolution`] when the field is absent, null, an empty
/// sequence, or its first element exposes none of the recognized locator fields.
///
/// # Examples
///
/// ```
/// use effect_gen::resolve::resolve;
/// use effect_gen::types::MediaKind;
/// use serde_json::json;
///
/// let payload = json!([{ "video": "https://x/b.mp4" }]);
/// let media = resolve(Some(&payload)).unwrap();
/// assert_eq!(media.url, "https://x/b.mp4");
/// assert_eq!(media.kind, MediaKind::Video);
/// ```
pub fn resolve(result: Option<&Value>) -> Result<MediaReference> {
    let payload = ResultPayload::from_field(result)
        .ok_or_else(|| Error::ResultResolution("result field is missing".to_string()))?;

    let head = payload
        .head()
        .ok_or_else(|| Error::ResultResolution("result list is empty".to_string()))?;

    let object = head.as_object().ok_or_else(|| {
        Error::ResultResolution("first result entry is not an object".to_string())
    })?;

    for (field, extract) in LOCATOR_FIELDS {
        if let Some(url) = extract(object) {
            tracing::debug!(field, url, "resolved media locator");
            return Ok(MediaReference::from_url(url));
        }
    }

    let fields: Vec<&str> = LOCATOR_FIELDS.iter().map(|(name, _)| *name).collect();
    Err(Error::ResultResolution(format!(
        "none of {} present",
        fields.join(", ")
    )))
}
