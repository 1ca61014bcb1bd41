//! # Color 模块
//!
//! 颜色解析：`#rgb`、`#rrggbb`、`#rrggbbaa` 与固定调色板。

use serde::Serialize;

use crate::error::RenderError;

/// RGBA 颜色（各分量 0.0 - 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// 解析颜色字符串（大小写不敏感，忽略首尾空白）
    pub fn parse(value: &str) -> Result<Self, RenderError> {
        let trimmed = value.trim();
        let invalid = || RenderError::InvalidColor {
            value: value.to_string(),
        };

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        named(&trimmed.to_ascii_lowercase()).ok_or_else(invalid)
    }

    /// 替换透明度
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// 按系数缩放透明度
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    /// 线性插值
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    // #rgb 每位重复一次
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);

    match hex.len() {
        3 => Some(Rgba::from_bytes(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        6 => Some(Rgba::from_bytes(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Rgba::from_bytes(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn named(name: &str) -> Option<Rgba> {
    let color = match name {
        // 无色气体/溶液仍需可见的淡色轮廓
        "colorless" | "clear" | "transparent" => Rgba::new(0.86, 0.92, 0.97, 0.35),
        "white" => Rgba::WHITE,
        "black" => Rgba::rgb(0.0, 0.0, 0.0),
        "red" => Rgba::rgb(0.86, 0.16, 0.16),
        "orange" => Rgba::rgb(1.0, 0.55, 0.1),
        "yellow" => Rgba::rgb(1.0, 0.87, 0.2),
        "green" => Rgba::rgb(0.2, 0.7, 0.3),
        "blue" => Rgba::rgb(0.2, 0.45, 0.9),
        "purple" | "violet" => Rgba::rgb(0.55, 0.3, 0.8),
        "pink" => Rgba::rgb(1.0, 0.6, 0.75),
        "brown" => Rgba::rgb(0.55, 0.35, 0.2),
        "gray" | "grey" => Rgba::rgb(0.6, 0.6, 0.6),
        "cyan" => Rgba::rgb(0.2, 0.8, 0.85),
        "silver" => Rgba::rgb(0.75, 0.76, 0.78),
        "gold" => Rgba::rgb(0.95, 0.75, 0.2),
        _ => return None,
    };
    Some(color)
}
