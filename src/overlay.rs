//! Text overlay settings and boundary validation.
//!
//! An [`OverlaySpec`] describes the text a user wants drawn over their image
//! and how it is styled and positioned. Specs are validated once at the API
//! boundary and never mutated afterwards.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "text": "HELLO",
//!   "fontSize": 48,
//!   "color": "#FFFFFF",
//!   "fontWeight": "bold",
//!   "fontStyle": "normal",
//!   "textAlign": "center",
//!   "position": { "x": 50, "y": 50 },
//!   "rotation": 0
//! }
//! ```
//!
//! Validation never stops at the first problem: every invalid field is
//! collected into a single [`ValidationError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationError};

// =============================================================================
// Limits
// =============================================================================

pub const MIN_TEXT_CHARS: usize = 1;
pub const MAX_TEXT_CHARS: usize = 500;

pub const MIN_FONT_SIZE: i64 = 12;
pub const MAX_FONT_SIZE: i64 = 200;

pub const MIN_BLUR: i64 = 0;
pub const MAX_BLUR: i64 = 50;

/// Position is a percentage of the canvas on both axes.
pub const MIN_POSITION: i64 = 0;
pub const MAX_POSITION: i64 = 100;

pub const MIN_ROTATION: i64 = -180;
pub const MAX_ROTATION: i64 = 180;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Anchor point of the text, in percent of canvas width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 50, y: 50 }
    }
}

/// Text overlay settings for a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpec {
    pub text: String,

    /// Font size in pixels
    pub font_size: i64,

    /// `#RRGGBB` or `#RGB`
    pub color: String,

    #[serde(default)]
    pub font_weight: FontWeight,

    #[serde(default)]
    pub font_style: FontStyle,

    #[serde(default)]
    pub text_align: TextAlign,

    #[serde(default)]
    pub position: Position,

    /// Rotation in degrees
    #[serde(default)]
    pub rotation: i64,
}

impl Default for OverlaySpec {
    fn default() -> Self {
        Self {
            text: "Your text here".to_string(),
            font_size: 48,
            color: "#FFFFFF".to_string(),
            font_weight: FontWeight::Bold,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Center,
            position: Position::default(),
            rotation: 0,
        }
    }
}

impl OverlaySpec {
    /// Check every range constraint, reporting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        self.collect_errors("textOverlay", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(errors))
        }
    }

    fn collect_errors(&self, prefix: &str, errors: &mut Vec<FieldError>) {
        let chars = self.text.chars().count();
        if !(MIN_TEXT_CHARS..=MAX_TEXT_CHARS).contains(&chars) {
            errors.push(FieldError::new(
                format!("{prefix}.text"),
                "Text must be between 1 and 500 characters",
            ));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            errors.push(FieldError::new(
                format!("{prefix}.fontSize"),
                "Font size must be between 12 and 200",
            ));
        }
        if !is_hex_color(&self.color) {
            errors.push(FieldError::new(
                format!("{prefix}.color"),
                "Color must be a valid hex code",
            ));
        }
        if !(MIN_POSITION..=MAX_POSITION).contains(&self.position.x) {
            errors.push(FieldError::new(
                format!("{prefix}.position.x"),
                "Position x must be between 0 and 100",
            ));
        }
        if !(MIN_POSITION..=MAX_POSITION).contains(&self.position.y) {
            errors.push(FieldError::new(
                format!("{prefix}.position.y"),
                "Position y must be between 0 and 100",
            ));
        }
        if !(MIN_ROTATION..=MAX_ROTATION).contains(&self.rotation) {
            errors.push(FieldError::new(
                format!("{prefix}.rotation"),
                "Rotation must be between -180 and 180",
            ));
        }
    }
}

/// Whether `color` is `#` followed by exactly 3 or 6 hex digits.
pub fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(digits) => {
            (digits.len() == 3 || digits.len() == 6)
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

pub fn is_valid_blur(blur: i64) -> bool {
    (MIN_BLUR..=MAX_BLUR).contains(&blur)
}

// =============================================================================
// Process request parsing
// =============================================================================

/// A validated `POST /api/images/process` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    pub text_overlay: OverlaySpec,

    pub blur_intensity: i64,
}

impl ProcessRequest {
    /// Range-check an already typed request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        self.text_overlay.collect_errors("textOverlay", &mut errors);
        if !is_valid_blur(self.blur_intensity) {
            errors.push(blur_error());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(errors))
        }
    }
}

fn blur_error() -> FieldError {
    FieldError::new("blurIntensity", "Blur intensity must be between 0 and 50")
}

/// Parse and validate a raw JSON process body.
///
/// Type errors (a string where a number belongs) and range errors are
/// reported together. Empty strings for `imageData`/`imageUrl` count as
/// absent; whether either is present at all is left to the caller.
pub fn parse_process_body(body: &Value) -> Result<ProcessRequest, ValidationError> {
    let mut errors = Vec::new();
    let empty = Map::new();
    let root = body.as_object().unwrap_or(&empty);

    let image_data = optional_string(root, "imageData", "imageData", &mut errors);
    let image_url = optional_string(root, "imageUrl", "imageUrl", &mut errors);

    let overlay = match root.get("textOverlay") {
        Some(Value::Object(obj)) => Some(parse_overlay(obj, &mut errors)),
        Some(_) => {
            errors.push(FieldError::new("textOverlay", "Text overlay must be an object"));
            None
        }
        None => {
            errors.push(FieldError::new(
                "textOverlay.text",
                "Text must be between 1 and 500 characters",
            ));
            errors.push(FieldError::new(
                "textOverlay.fontSize",
                "Font size must be between 12 and 200",
            ));
            errors.push(FieldError::new(
                "textOverlay.color",
                "Color must be a valid hex code",
            ));
            None
        }
    };

    let blur = match int_value(root.get("blurIntensity")) {
        Some(blur) if is_valid_blur(blur) => Some(blur),
        _ => {
            errors.push(blur_error());
            None
        }
    };

    match (overlay, blur) {
        (Some(text_overlay), Some(blur_intensity)) if errors.is_empty() => Ok(ProcessRequest {
            image_data,
            image_url,
            text_overlay,
            blur_intensity,
        }),
        _ => Err(ValidationError(errors)),
    }
}

fn parse_overlay(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) -> OverlaySpec {
    let before = errors.len();

    let text = match obj.get("text") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            errors.push(FieldError::new(
                "textOverlay.text",
                "Text must be between 1 and 500 characters",
            ));
            String::new()
        }
    };

    let font_size = int_value(obj.get("fontSize")).unwrap_or_else(|| {
        errors.push(FieldError::new(
            "textOverlay.fontSize",
            "Font size must be between 12 and 200",
        ));
        MIN_FONT_SIZE
    });

    let color = match obj.get("color") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            errors.push(FieldError::new(
                "textOverlay.color",
                "Color must be a valid hex code",
            ));
            "#000".to_string()
        }
    };

    let font_weight = enum_field(obj, "fontWeight", "normal, bold", errors);
    let font_style = enum_field(obj, "fontStyle", "normal, italic", errors);
    let text_align = enum_field(obj, "textAlign", "left, center, right", errors);

    let position = match obj.get("position") {
        None | Some(Value::Null) => Position::default(),
        Some(Value::Object(pos)) => {
            let x = axis(pos, "x", errors);
            let y = axis(pos, "y", errors);
            Position { x, y }
        }
        Some(_) => {
            errors.push(FieldError::new(
                "textOverlay.position",
                "Position must be an object with x and y",
            ));
            Position::default()
        }
    };

    let rotation = match obj.get("rotation") {
        None | Some(Value::Null) => 0,
        value => int_value(value).unwrap_or_else(|| {
            errors.push(FieldError::new(
                "textOverlay.rotation",
                "Rotation must be between -180 and 180",
            ));
            0
        }),
    };

    let overlay = OverlaySpec {
        text,
        font_size,
        color,
        font_weight,
        font_style,
        text_align,
        position,
        rotation,
    };

    // Range checks only for fields that parsed; avoid duplicate entries.
    let mut range_errors = Vec::new();
    overlay.collect_errors("textOverlay", &mut range_errors);
    for err in range_errors {
        if !errors[before..].iter().any(|e| e.field == err.field) {
            errors.push(err);
        }
    }

    overlay
}

fn axis(pos: &Map<String, Value>, name: &str, errors: &mut Vec<FieldError>) -> i64 {
    match pos.get(name) {
        None | Some(Value::Null) => 50,
        value => int_value(value).unwrap_or_else(|| {
            errors.push(FieldError::new(
                format!("textOverlay.position.{name}"),
                format!("Position {name} must be between 0 and 100"),
            ));
            50
        }),
    }
}

fn enum_field<T>(
    obj: &Map<String, Value>,
    key: &str,
    allowed: &str,
    errors: &mut Vec<FieldError>,
) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    match obj.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|_| {
            errors.push(FieldError::new(
                format!("textOverlay.{key}"),
                format!("{key} must be one of: {allowed}"),
            ));
            T::default()
        }),
    }
}

fn optional_string(
    root: &Map<String, Value>,
    key: &str,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match root.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new(field, format!("{key} must be a string")));
            None
        }
    }
}

/// Accept JSON integers and integer-valued strings (`"15"`), as form
/// submissions often send numbers as text.
fn int_value(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
