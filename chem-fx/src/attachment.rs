//! # Attachment 模块
//!
//! 根据容器形状与像素尺寸计算效果锚点。
//!
//! 所有坐标都按宽高比例计算，同一形状可以在任意渲染尺寸下重新解析，
//! 调用方无需再做换算。
//!
//! ## 锚点布局
//!
//! | 形状 | 附加锚点 |
//! |------|----------|
//! | 所有形状 | `center` / `top` / `bottom` |
//! | `Beaker` | `rim` + 左右两侧 `side` |
//! | `TestTube` | 管口 `top` |
//! | `Flask` | 瓶颈 `top` + 左右两个球部 `side` |

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::geometry::{Size, Vec2};

/// 容器形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselShape {
    Beaker,
    TestTube,
    Flask,
    /// 未知形状，只有基础锚点
    #[default]
    #[serde(other)]
    Generic,
}

impl VesselShape {
    pub const ALL: [VesselShape; 4] = [
        VesselShape::Beaker,
        VesselShape::TestTube,
        VesselShape::Flask,
        VesselShape::Generic,
    ];
}

/// 锚点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    Top,
    Bottom,
    Side,
    Center,
    Rim,
}

/// 锚点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPoint {
    pub id: String,
    #[serde(rename = "type")]
    pub anchor_type: AnchorType,
    pub position: Vec2,
    /// 作用半径（像素）
    pub radius: f32,
    /// 优先级（越大越优先）
    pub priority: i32,
}

impl AttachmentPoint {
    fn at(
        id: &str,
        anchor_type: AnchorType,
        size: Size,
        fx: f32,
        fy: f32,
        radius_ratio: f32,
        priority: i32,
    ) -> Self {
        Self {
            id: id.to_string(),
            anchor_type,
            position: Vec2::new(size.width * fx, size.height * fy),
            radius: size.min_side() * radius_ratio,
            priority,
        }
    }

    /// 以几何中心构造的回退锚点
    pub fn geometric_center(center: Vec2, size: Size) -> Self {
        Self {
            id: "center".to_string(),
            anchor_type: AnchorType::Center,
            position: center,
            radius: size.min_side() * 0.3,
            priority: 0,
        }
    }
}

/// 解析容器锚点
///
/// 纯函数：相同输入永远得到相同输出。
/// 返回值按优先级降序排列（同优先级保持声明顺序）。
pub fn resolve(shape: VesselShape, width: f32, height: f32) -> Vec<AttachmentPoint> {
    let size = Size::new(width, height);
    let at = |id: &str, anchor_type, fx, fy, radius_ratio, priority| {
        AttachmentPoint::at(id, anchor_type, size, fx, fy, radius_ratio, priority)
    };

    let mut points = vec![
        at("center", AnchorType::Center, 0.5, 0.5, 0.3, 5),
        at("top", AnchorType::Top, 0.5, 0.1, 0.2, 4),
        at("bottom", AnchorType::Bottom, 0.5, 0.9, 0.25, 3),
    ];

    match shape {
        VesselShape::Beaker => {
            points.push(at("rim", AnchorType::Rim, 0.5, 0.15, 0.35, 8));
            points.push(at("side-left", AnchorType::Side, 0.15, 0.55, 0.1, 2));
            points.push(at("side-right", AnchorType::Side, 0.85, 0.55, 0.1, 2));
        }
        VesselShape::TestTube => {
            points.push(at("mouth", AnchorType::Top, 0.5, 0.05, 0.12, 8));
        }
        VesselShape::Flask => {
            points.push(at("neck", AnchorType::Top, 0.5, 0.2, 0.1, 8));
            points.push(at("bulb-left", AnchorType::Side, 0.3, 0.7, 0.2, 6));
            points.push(at("bulb-right", AnchorType::Side, 0.7, 0.7, 0.2, 6));
        }
        VesselShape::Generic => {}
    }

    // sort_by 是稳定排序
    points.sort_by(|a, b| b.priority.cmp(&a.priority));
    points
}

/// 按类型选择锚点
///
/// 1. 过滤出 `desired` 类型中优先级最高的锚点
/// 2. 否则选择优先级最高的锚点
/// 3. 否则（列表为空）返回几何中心
pub fn select(
    points: &[AttachmentPoint],
    desired: AnchorType,
    fallback_center: Vec2,
    size: Size,
) -> AttachmentPoint {
    points
        .iter()
        .filter(|p| p.anchor_type == desired)
        .min_by_key(|p| Reverse(p.priority))
        .or_else(|| points.iter().min_by_key(|p| Reverse(p.priority)))
        .cloned()
        .unwrap_or_else(|| AttachmentPoint::geometric_center(fallback_center, size))
}

/// 按 id 选择锚点，id 未知时退回类型规则
pub fn select_by_id(
    points: &[AttachmentPoint],
    id: &str,
    desired: AnchorType,
    fallback_center: Vec2,
    size: Size,
) -> AttachmentPoint {
    match points.iter().find(|p| p.id == id) {
        Some(point) => point.clone(),
        None => {
            tracing::debug!(id, "锚点 id 不存在，按类型选择");
            select(points, desired, fallback_center, size)
        }
    }
}
