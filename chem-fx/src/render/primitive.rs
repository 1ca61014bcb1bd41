//! # Primitive 模块
//!
//! 渲染器输出的矢量图元。宿主负责把图元绘制到实际的画布上。

use serde::Serialize;

use super::color::Rgba;
use crate::geometry::Vec2;

/// 描边
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

/// 矢量图元
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// 实心圆
    Circle {
        center: Vec2,
        radius: f32,
        fill: Rgba,
    },
    /// 椭圆（可选描边）
    Ellipse {
        center: Vec2,
        radii: Vec2,
        fill: Rgba,
        stroke: Option<Stroke>,
    },
    /// 径向渐变（inner 在圆心，outer 在边缘）
    RadialGradient {
        center: Vec2,
        radius: f32,
        inner: Rgba,
        outer: Rgba,
    },
    /// 折线
    Polyline {
        points: Vec<Vec2>,
        color: Rgba,
        width: f32,
    },
    /// 文本标签
    Text {
        position: Vec2,
        text: String,
        color: Rgba,
        size: f32,
    },
}

impl Primitive {
    /// 图元名称
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Circle { .. } => "circle",
            Primitive::Ellipse { .. } => "ellipse",
            Primitive::RadialGradient { .. } => "radial_gradient",
            Primitive::Polyline { .. } => "polyline",
            Primitive::Text { .. } => "text",
        }
    }

    /// 图元的锚定位置
    pub fn position(&self) -> Vec2 {
        match self {
            Primitive::Circle { center, .. }
            | Primitive::Ellipse { center, .. }
            | Primitive::RadialGradient { center, .. } => *center,
            Primitive::Polyline { points, .. } => points.first().copied().unwrap_or_default(),
            Primitive::Text { position, .. } => *position,
        }
    }

    /// 最大不透明度
    pub fn max_alpha(&self) -> f32 {
        match self {
            Primitive::Circle { fill, .. } => fill.a,
            Primitive::Ellipse { fill, stroke, .. } => {
                stroke.map_or(fill.a, |stroke| fill.a.max(stroke.color.a))
            }
            Primitive::RadialGradient { inner, outer, .. } => inner.a.max(outer.a),
            Primitive::Polyline { color, .. } | Primitive::Text { color, .. } => color.a,
        }
    }
}
