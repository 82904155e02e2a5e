use crate::layers::kind::LayerKind;
use serde::{Deserialize, Serialize};

/// Plain RGBA color, convertible into whatever the front end paints with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> crate::Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            _ if !digits.is_ascii() => {
                return Err(crate::MapError::ParseError(format!("invalid color '{}'", hex)).into())
            }
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => {
                return Err(crate::MapError::ParseError(format!("invalid color '{}'", hex)).into())
            }
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|e| crate::MapError::ParseError(format!("invalid color '{}': {}", hex, e)))
        };

        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Same color with alpha scaled by `opacity`
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let alpha = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..*self }
    }
}

/// Path style applied to every feature of an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    /// Stroke color
    pub color: SerializableColor,
    /// Stroke width in pixels
    pub weight: f32,
    /// Stroke opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Dash pattern in pixels, empty for a solid line
    pub dash_array: Vec<f32>,
    /// Fill color
    pub fill_color: SerializableColor,
    /// Fill opacity (0.0 to 1.0)
    pub fill_opacity: f32,
}

impl PathStyle {
    fn outline(color: SerializableColor, weight: f32, dash: &str, fill_opacity: f32) -> Self {
        Self {
            color,
            weight,
            opacity: 1.0,
            dash_array: parse_dash_array(dash),
            fill_color: color,
            fill_opacity,
        }
    }

    /// Default style for a boundary layer
    pub fn for_kind(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Counties => Self::outline(SerializableColor::rgb(0xef, 0x44, 0x44), 1.0, "", 0.05),
            LayerKind::Precincts => Self::outline(SerializableColor::rgb(0x02, 0x84, 0xc7), 0.6, "", 0.04),
            LayerKind::House => Self::outline(SerializableColor::rgb(0x65, 0xa3, 0x0d), 1.0, "4 3", 0.03),
            LayerKind::Senate => Self::outline(SerializableColor::rgb(0xca, 0x8a, 0x04), 1.0, "4 3", 0.03),
            LayerKind::Congress => Self::outline(SerializableColor::rgb(0x7c, 0x3a, 0xed), 1.0, "4 3", 0.03),
        }
    }

    /// Returns this style with the set fields of `over` replaced
    pub fn with_override(&self, over: &StyleOverride) -> Self {
        let mut style = self.clone();
        if let Some(weight) = over.weight {
            style.weight = weight;
        }
        if let Some(fill_opacity) = over.fill_opacity {
            style.fill_opacity = fill_opacity;
        }
        if let Some(color) = over.color {
            style.color = color;
        }
        style
    }

    pub fn is_dashed(&self) -> bool {
        !self.dash_array.is_empty()
    }
}

/// Partial style layered over a [`PathStyle`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverride {
    pub color: Option<SerializableColor>,
    pub weight: Option<f32>,
    pub fill_opacity: Option<f32>,
}

impl StyleOverride {
    /// Shared highlight for the feature under the pointer
    pub fn hover() -> Self {
        Self {
            color: None,
            weight: Some(2.0),
            fill_opacity: Some(0.10),
        }
    }
}

/// Parses an SVG-style dash list such as `"4 3"` or `"4,3"`; invalid entries are skipped
pub fn parse_dash_array(dash: &str) -> Vec<f32> {
    dash.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse::<f32>().ok())
        .filter(|len| *len >= 0.0)
        .collect()
}
