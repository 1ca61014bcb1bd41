//! # Effect Registry
//!
//! 各效果类型的默认参数、回退时长、首选锚点与默认层级。
//! 这是所有效果默认值的**唯一来源**。

use super::{EffectKind, VisualEffect};
use crate::attachment::AnchorType;

/// 各效果的默认次级参数
///
/// 任何需要默认值的地方都应使用这些常量，而非硬编码数字。
pub mod defaults {
    /// 气体：粒子数量（intensity = 1 时）
    pub const GAS_PARTICLE_COUNT: u32 = 40;
    /// 气体：粒子基础半径（像素）
    pub const GAS_PARTICLE_SIZE: f32 = 3.0;
    /// 气体：一次效果内粒子上升的循环次数
    pub const GAS_RISE_CYCLES: f32 = 3.0;
    /// 气体：水平扩散（相对锚点半径）
    pub const GAS_SPREAD: f32 = 0.6;

    /// 发光：光晕层数
    pub const LIGHT_GLOW_LAYERS: u32 = 3;
    /// 发光：脉动频率（Hz）
    pub const LIGHT_PULSE_FREQUENCY: f32 = 2.0;
    /// 发光：闪烁幅度（相对半径）
    pub const LIGHT_FLICKER: f32 = 0.15;

    /// 温度：热浪线条数量
    pub const TEMPERATURE_WAVE_COUNT: u32 = 3;
    /// 温度：热浪振幅（像素）
    pub const TEMPERATURE_SHIMMER_AMPLITUDE: f32 = 4.0;

    /// 泡沫：气泡数量（density = 1 时）
    pub const FOAM_BUBBLE_COUNT: u32 = 30;
    /// 泡沫：泡沫层最大高度（相对容器高度）
    pub const FOAM_RISE_HEIGHT: f32 = 0.25;
    /// 泡沫：气泡摆动幅度（像素）
    pub const FOAM_WOBBLE: f32 = 2.0;

    /// 物态变化：粒子数量
    pub const STATE_CHANGE_PARTICLE_COUNT: u32 = 24;

    /// 体积变化：涟漪环数量
    pub const VOLUME_RING_COUNT: u32 = 2;

    /// 溢出：液滴数量（amount = 1 时）
    pub const SPILL_DROPLET_COUNT: u32 = 16;

    /// 质地：颗粒数量
    pub const TEXTURE_GRAIN_COUNT: u32 = 60;
    /// 质地：波纹数量
    pub const TEXTURE_RIPPLE_COUNT: u32 = 4;
    /// 质地：波纹振幅（像素，viscosity = 0 时）
    pub const TEXTURE_RIPPLE_AMPLITUDE: f32 = 3.0;

    /// 粒子类数量上限（particle/bubble/droplet/grain）
    pub const MAX_PARTICLE_COUNT: u32 = 500;
    /// 层类数量上限（glow_layers/wave_count/ring_count）
    pub const MAX_LAYER_COUNT: u32 = 16;

    /// 物态变化：回退时长（秒）
    pub const STATE_CHANGE_DURATION: f32 = 3.0;
    /// 体积变化：回退时长（秒）
    pub const VOLUME_CHANGE_DURATION: f32 = 3.0;
    /// 溢出：回退时长（秒）
    pub const SPILL_DURATION: f32 = 2.5;
    /// 质地变化：回退时长（秒）
    pub const TEXTURE_CHANGE_DURATION: f32 = 2.0;
    /// 温度变化：最短时长（秒）
    pub const TEMPERATURE_MIN_DURATION: f32 = 1.5;
    /// 温度变化：最长时长（秒）
    pub const TEMPERATURE_MAX_DURATION: f32 = 6.0;
    /// 温度变化：每秒对应的温度变化量（°C）
    pub const TEMPERATURE_DEGREES_PER_SECOND: f32 = 25.0;
}

/// 不带显式时长字段的效果使用的时长
///
/// - 温度变化：由变化幅度推导，`1.5 + |delta| / 25`，限制在 [1.5, 6.0]
/// - 其余类型：枚举的固定回退值
///
/// 对带显式时长的类型返回其字段值。
pub fn fallback_duration(effect: &VisualEffect) -> f32 {
    match effect {
        VisualEffect::GasProduction(e) => e.duration,
        VisualEffect::LightEmission(e) => e.duration,
        VisualEffect::FoamProduction(e) => e.stability,
        VisualEffect::TemperatureChange(e) => (defaults::TEMPERATURE_MIN_DURATION
            + e.delta.abs() / defaults::TEMPERATURE_DEGREES_PER_SECOND)
            .clamp(
                defaults::TEMPERATURE_MIN_DURATION,
                defaults::TEMPERATURE_MAX_DURATION,
            ),
        VisualEffect::StateChange(_) => defaults::STATE_CHANGE_DURATION,
        VisualEffect::VolumeChange(_) => defaults::VOLUME_CHANGE_DURATION,
        VisualEffect::Spill(_) => defaults::SPILL_DURATION,
        VisualEffect::TextureChange(_) => defaults::TEXTURE_CHANGE_DURATION,
    }
}

/// 效果的首选锚点类型
///
/// | EffectKind | 锚点 | 说明 |
/// |------------|------|------|
/// | `GasProduction` | `Rim` | 气体从液面/容器口逸出 |
/// | `FoamProduction` | `Rim` | 泡沫在液面堆积 |
/// | `Spill` | `Bottom` | 溢出液体在容器底部扩散 |
/// | 其他 | `Center` | 作用于整个容器 |
pub fn preferred_anchor(kind: EffectKind) -> AnchorType {
    match kind {
        EffectKind::GasProduction | EffectKind::FoamProduction => AnchorType::Rim,
        EffectKind::Spill => AnchorType::Bottom,
        EffectKind::LightEmission
        | EffectKind::TemperatureChange
        | EffectKind::StateChange
        | EffectKind::VolumeChange
        | EffectKind::TextureChange => AnchorType::Center,
    }
}

/// 效果的默认绘制层级（越大越靠上）
pub fn default_z_index(kind: EffectKind) -> i32 {
    match kind {
        EffectKind::LightEmission => 0,
        EffectKind::TemperatureChange => 1,
        EffectKind::TextureChange => 2,
        EffectKind::StateChange | EffectKind::VolumeChange => 3,
        EffectKind::FoamProduction => 4,
        EffectKind::GasProduction => 5,
        EffectKind::Spill => 6,
    }
}
