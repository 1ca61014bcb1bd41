//! # Render 模块
//!
//! 每种效果类型一个程序化渲染策略，输出矢量图元。
//!
//! ## 约定
//!
//! - 渲染器是纯函数：时间只通过 `progress` 进入，不读取系统时钟
//! - 伪随机抖动由实例 ID 派生种子，同样的输入永远得到同样的图元
//! - 强度/密度/粘度钳制到 [0, 1] 后线性缩放透明度、数量或振幅
//! - 减弱动态模式输出静态或近似静态的表示，图元数量不超过完整模式
//!
//! ## 扩展
//!
//! 宿主可以通过实现 [`EffectRenderer`] 替换整个渲染器集合
//! （例如接入 GPU 粒子系统），引擎只依赖这个 trait。

mod color;
mod easing;
mod primitive;

mod foam;
mod gas;
mod light;
mod spill;
mod state_change;
mod temperature;
mod texture;
mod volume;

pub use color::Rgba;
pub use easing::Easing;
pub use primitive::{Primitive, Stroke};

use fastrand::Rng;

use crate::attachment::AttachmentPoint;
use crate::effect::{EnhancedKind, EnhancedVisualEffect};
use crate::error::RenderError;
use crate::geometry::Size;

/// 单次渲染的输入
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// 当前进度（0.0 - 1.0）
    pub progress: f32,
    /// 效果锚点
    pub anchor: &'a AttachmentPoint,
    /// 容器尺寸
    pub container: Size,
    /// 减弱动态
    pub reduced_motion: bool,
    /// 细节系数（1.0 完整，降级时更低），缩放粒子数量
    pub detail: f32,
    /// 抖动种子（实例 ID）
    pub seed: u64,
}

impl<'a> RenderContext<'a> {
    pub fn new(progress: f32, anchor: &'a AttachmentPoint, container: Size) -> Self {
        Self {
            progress: unit(progress),
            anchor,
            container,
            reduced_motion: false,
            detail: 1.0,
            seed: 0,
        }
    }

    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn with_detail(mut self, detail: f32) -> Self {
        self.detail = unit(detail);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 该实例的伪随机序列（种子为实例 ID）
    pub(crate) fn rng(&self) -> Rng {
        Rng::with_seed(self.seed)
    }

    /// 淡入淡出包络（前 10% 淡入，后 15% 淡出）
    pub(crate) fn envelope(&self) -> f32 {
        let fade_in = (self.progress / 0.1).min(1.0);
        let fade_out = ((1.0 - self.progress) / 0.15).min(1.0);
        unit(fade_in.min(fade_out))
    }
}

/// 效果渲染器
pub trait EffectRenderer {
    /// 渲染单个效果实例的当前帧
    fn render(
        &self,
        effect: &EnhancedVisualEffect,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<Primitive>, RenderError>;
}

/// 内置的程序化渲染器
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralRenderer;

impl EffectRenderer for ProceduralRenderer {
    fn render(
        &self,
        effect: &EnhancedVisualEffect,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<Primitive>, RenderError> {
        match &effect.kind {
            EnhancedKind::GasProduction { base, params } => gas::render(base, params, ctx),
            EnhancedKind::LightEmission { base, params } => {
                light::render(base, params, effect.duration(), ctx)
            }
            EnhancedKind::TemperatureChange { base, params } => {
                temperature::render(base, params, ctx)
            }
            EnhancedKind::FoamProduction { base, params } => foam::render(base, params, ctx),
            EnhancedKind::StateChange { base, params } => state_change::render(base, params, ctx),
            EnhancedKind::VolumeChange { base, params } => volume::render(base, params, ctx),
            EnhancedKind::Spill { base, params } => spill::render(base, params, ctx),
            EnhancedKind::TextureChange { base, params } => texture::render(base, params, ctx),
        }
    }
}

/// 钳制到 [0, 1]，NaN 视为 0
pub(crate) fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// 按强度与细节系数缩放粒子数量
pub(crate) fn scaled_count(base: u32, factor: f32, detail: f32) -> usize {
    (base as f32 * unit(factor) * unit(detail)).round() as usize
}

/// [min, max) 之间的随机值
pub(crate) fn between(rng: &mut Rng, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.f32()
}
