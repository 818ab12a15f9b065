//! Graph View Style System
//!
//! Presentation defaults for containers, member cards and edges. Edges have
//! exactly two looks: the quiet neutral stroke every edge starts with, and the
//! focus stroke applied while a connected node is hovered.

use serde::{Deserialize, Serialize};
use umbra_core::NodeKind;

/// RGBA color, serialized as `#rrggbb` / `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    ArrowClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeMarker {
    pub kind: MarkerKind,
    pub color: Color,
}

/// Edge color and style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub stroke: Color,
    pub width: f32,
    pub opacity: f32,
    pub marker_end: EdgeMarker,
    pub z_index: i32,
    pub animated: bool,
}

impl EdgeStyle {
    pub fn neutral() -> Self {
        Self {
            stroke: COLOR_EDGE_NEUTRAL,
            width: 1.0,
            opacity: 0.15,
            marker_end: EdgeMarker {
                kind: MarkerKind::ArrowClosed,
                color: COLOR_EDGE_NEUTRAL,
            },
            z_index: Z_EDGE_NEUTRAL,
            animated: true,
        }
    }

    pub fn highlighted() -> Self {
        Self {
            stroke: COLOR_EDGE_FOCUS,
            width: 2.0,
            opacity: 1.0,
            marker_end: EdgeMarker {
                kind: MarkerKind::ArrowClosed,
                color: COLOR_EDGE_FOCUS,
            },
            z_index: Z_EDGE_FOCUS,
            animated: true,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.z_index == Z_EDGE_FOCUS
    }
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Complete style for a graph node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub fill: Color,
    pub border: Color,
    pub accent: Color,
    pub text: Color,
    pub corner_radius: f32,
    pub z_index: i32,
}

// Palette (zinc background with amber accents)
pub const COLOR_EDGE_NEUTRAL: Color = Color::rgb(0x71, 0x71, 0x7a);
pub const COLOR_EDGE_FOCUS: Color = Color::rgb(0xf5, 0x9e, 0x0b);

pub const COLOR_FILE_FILL: Color = Color::rgb(0x09, 0x09, 0x0b);
pub const COLOR_FILE_BORDER: Color = Color::rgb(0x27, 0x27, 0x2a);
pub const COLOR_FILE_ACCENT: Color = Color::rgb(0xd9, 0x77, 0x06);

pub const COLOR_MEMBER_FILL: Color = Color::rgb(0x13, 0x13, 0x15);
pub const COLOR_MEMBER_BORDER: Color = Color::rgb(0x27, 0x27, 0x2a);
pub const COLOR_MEMBER_ACCENT: Color = Color::rgb(0xf5, 0x9e, 0x0b);

pub const COLOR_TEXT: Color = Color::rgb(0xe4, 0xe4, 0xe7);

pub const Z_FILE: i32 = 0;
pub const Z_MEMBER: i32 = 10;
pub const Z_EDGE_NEUTRAL: i32 = 0;
pub const Z_EDGE_FOCUS: i32 = 999;

pub fn get_node_style(kind: NodeKind) -> NodeStyle {
    match kind {
        NodeKind::File => NodeStyle {
            fill: COLOR_FILE_FILL,
            border: COLOR_FILE_BORDER,
            accent: COLOR_FILE_ACCENT,
            text: COLOR_TEXT,
            corner_radius: 16.0,
            z_index: Z_FILE,
        },
        // Classes share the function card.
        NodeKind::Function | NodeKind::Class => NodeStyle {
            fill: COLOR_MEMBER_FILL,
            border: COLOR_MEMBER_BORDER,
            accent: COLOR_MEMBER_ACCENT,
            text: COLOR_TEXT,
            corner_radius: 8.0,
            z_index: Z_MEMBER,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(COLOR_EDGE_NEUTRAL.to_hex(), "#71717a");
        assert_eq!(Color::from_hex("#f59e0b"), Some(COLOR_EDGE_FOCUS));
        assert_eq!(
            Color::from_hex("#00000080"),
            Some(Color::rgba(0, 0, 0, 0x80))
        );
        assert_eq!(Color::from_hex("#xyz"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&COLOR_EDGE_FOCUS).unwrap();
        assert_eq!(json, "\"#f59e0b\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, COLOR_EDGE_FOCUS);
    }

    #[test]
    fn test_edge_styles() {
        let neutral = EdgeStyle::neutral();
        assert_eq!(neutral.width, 1.0);
        assert!(neutral.opacity < 0.5);
        assert_eq!(neutral.marker_end.kind, MarkerKind::ArrowClosed);
        assert!(!neutral.is_highlighted());

        let focus = EdgeStyle::highlighted();
        assert_eq!(focus.opacity, 1.0);
        assert!(focus.z_index > neutral.z_index);
        assert!(focus.is_highlighted());
    }

    #[test]
    fn test_class_is_a_visual_alias_of_function() {
        assert_eq!(get_node_style(NodeKind::Class), get_node_style(NodeKind::Function));
        assert_ne!(get_node_style(NodeKind::File), get_node_style(NodeKind::Function));
    }
}
