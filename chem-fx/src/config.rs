//! # Config 模块
//!
//! 效果引擎配置。所有字段都有默认值，缺失字段按默认值补全。

use serde::{Deserialize, Serialize};

use crate::attachment::VesselShape;
use crate::geometry::{Size, Vec2};

/// 效果引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 减弱动态
    ///
    /// `None` 表示跟随平台偏好（挂载时读取一次）。
    #[serde(default)]
    pub reduce_motion: Option<bool>,

    /// 容器中心覆盖（同时移动 `center` 锚点和几何回退点）
    #[serde(default)]
    pub vessel_center: Option<Vec2>,

    /// 容器尺寸（像素）
    #[serde(default)]
    pub container_size: Size,

    /// 容器形状
    #[serde(default)]
    pub vessel_shape: VesselShape,

    /// 性能降级时自动降低细节
    #[serde(default = "default_auto_degrade")]
    pub auto_degrade: bool,

    /// 降级时的细节系数 (0.0 - 1.0)
    #[serde(default = "default_degraded_detail")]
    pub degraded_detail: f32,
}

fn default_auto_degrade() -> bool {
    true
}

fn default_degraded_detail() -> f32 {
    0.5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reduce_motion: None,
            vessel_center: None,
            container_size: Size::default(),
            vessel_shape: VesselShape::default(),
            auto_degrade: default_auto_degrade(),
            degraded_detail: default_degraded_detail(),
        }
    }
}

impl EngineConfig {
    /// 容器中心（覆盖值优先）
    pub fn center(&self) -> Vec2 {
        self.vessel_center
            .unwrap_or_else(|| self.container_size.center())
    }

    /// 实际生效的减弱动态设置
    pub fn effective_reduced_motion(&self, platform_prefers_reduced: bool) -> bool {
        self.reduce_motion.unwrap_or(platform_prefers_reduced)
    }
}
