//! # Effect Enhancer
//!
//! 将 `VisualEffect` 增强为 `EnhancedVisualEffect`。
//!
//! 这是 VisualEffect → EnhancedVisualEffect 的**唯一转换入口**。
//! 所有数值校验、默认值填充、调度元数据合并都在这里完成。
//!
//! ## 合并优先级
//!
//! 1. 描述中显式给出的字段（最高，永远不会被替换）
//! 2. 调用方覆盖项 [`EffectOverrides`]
//! 3. [`registry::defaults`](super::registry::defaults)（最低）

use serde::{Deserialize, Serialize};

use super::registry::{self, defaults};
use super::{
    EffectKind, FoamProduction, GasProduction, LightEmission, Spill, StateChange,
    TemperatureChange, TextureChange, VisualEffect, VolumeChange,
};
use crate::attachment::AnchorType;
use crate::error::EffectError;

/// 调用方提供的覆盖项
///
/// 调度元数据（id、延迟、循环等）与次级参数覆盖。
/// 次级参数只作用于拥有该参数的效果类型，其余类型忽略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOverrides {
    pub id: Option<String>,
    pub priority: Option<i32>,
    /// 延迟启动（秒）
    pub delay: Option<f32>,
    /// 时长覆盖（秒），仅作用于描述中没有时长字段的类型
    pub duration: Option<f32>,
    #[serde(rename = "loop")]
    pub looping: Option<bool>,
    /// 锚点 id 引用
    pub attachment_point: Option<String>,
    pub z_index: Option<i32>,

    pub particle_count: Option<u32>,
    pub glow_layers: Option<u32>,
    pub pulse_frequency: Option<f32>,
    pub wave_count: Option<u32>,
    pub bubble_count: Option<u32>,
    pub ring_count: Option<u32>,
    pub droplet_count: Option<u32>,
    pub grain_count: Option<u32>,
}

impl EffectOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_attachment_point(mut self, point_id: impl Into<String>) -> Self {
        self.attachment_point = Some(point_id.into());
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = Some(count);
        self
    }
}

/// 调度元数据（合并覆盖项后的结果）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleMeta {
    /// 调用方指定的 id（未指定时由调度器生成）
    pub id: Option<String>,
    pub priority: i32,
    /// 延迟启动（秒）
    pub delay: f32,
    /// 时长覆盖（原样保留）
    pub duration: Option<f32>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub attachment_point: Option<String>,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasParams {
    pub particle_count: u32,
    pub particle_size: f32,
    pub rise_cycles: f32,
    pub spread: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightParams {
    pub glow_layers: u32,
    pub pulse_frequency: f32,
    pub flicker: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureParams {
    pub wave_count: u32,
    pub shimmer_amplitude: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoamParams {
    pub bubble_count: u32,
    pub rise_height: f32,
    pub wobble: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChangeParams {
    pub particle_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeParams {
    pub ring_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpillParams {
    pub droplet_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureParams {
    pub grain_count: u32,
    pub ripple_count: u32,
    pub ripple_amplitude: f32,
}

/// 增强后的效果：与描述相同的标签，携带原始字段与次级参数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect_type", rename_all = "snake_case")]
pub enum EnhancedKind {
    GasProduction {
        base: GasProduction,
        params: GasParams,
    },
    LightEmission {
        base: LightEmission,
        params: LightParams,
    },
    TemperatureChange {
        base: TemperatureChange,
        params: TemperatureParams,
    },
    FoamProduction {
        base: FoamProduction,
        params: FoamParams,
    },
    StateChange {
        base: StateChange,
        params: StateChangeParams,
    },
    VolumeChange {
        base: VolumeChange,
        params: VolumeParams,
    },
    Spill {
        base: Spill,
        params: SpillParams,
    },
    TextureChange {
        base: TextureChange,
        params: TextureParams,
    },
}

/// 增强后的效果
///
/// 由 [`enhance`] 产生；时长在增强时确定，之后只读。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedVisualEffect {
    pub kind: EnhancedKind,
    pub schedule: ScheduleMeta,
    /// 生效时长（秒）
    duration: f32,
}

impl EnhancedVisualEffect {
    /// 效果类型
    pub fn effect_kind(&self) -> EffectKind {
        match &self.kind {
            EnhancedKind::GasProduction { .. } => EffectKind::GasProduction,
            EnhancedKind::LightEmission { .. } => EffectKind::LightEmission,
            EnhancedKind::TemperatureChange { .. } => EffectKind::TemperatureChange,
            EnhancedKind::FoamProduction { .. } => EffectKind::FoamProduction,
            EnhancedKind::StateChange { .. } => EffectKind::StateChange,
            EnhancedKind::VolumeChange { .. } => EffectKind::VolumeChange,
            EnhancedKind::Spill { .. } => EffectKind::Spill,
            EnhancedKind::TextureChange { .. } => EffectKind::TextureChange,
        }
    }

    /// 还原原始描述
    pub fn descriptor(&self) -> VisualEffect {
        match &self.kind {
            EnhancedKind::GasProduction { base, .. } => VisualEffect::GasProduction(base.clone()),
            EnhancedKind::LightEmission { base, .. } => VisualEffect::LightEmission(base.clone()),
            EnhancedKind::TemperatureChange { base, .. } => {
                VisualEffect::TemperatureChange(base.clone())
            }
            EnhancedKind::FoamProduction { base, .. } => {
                VisualEffect::FoamProduction(base.clone())
            }
            EnhancedKind::StateChange { base, .. } => VisualEffect::StateChange(base.clone()),
            EnhancedKind::VolumeChange { base, .. } => VisualEffect::VolumeChange(base.clone()),
            EnhancedKind::Spill { base, .. } => VisualEffect::Spill(base.clone()),
            EnhancedKind::TextureChange { base, .. } => VisualEffect::TextureChange(base.clone()),
        }
    }

    /// 生效时长（秒），≤ 0 表示瞬时效果
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 首选锚点类型
    pub fn preferred_anchor(&self) -> AnchorType {
        registry::preferred_anchor(self.effect_kind())
    }
}

/// 将 `VisualEffect` 增强为 `EnhancedVisualEffect`
///
/// 纯函数：不修改输入，不产生副作用。
///
/// # 错误
/// - 非有限数值（NaN / ∞）
/// - 负的时长、半径、延迟
/// - 非正的体积缩放系数
///
/// 强度类字段（intensity / density / viscosity / amount）超出 [0, 1] 不视为错误，
/// 由渲染器钳制。
pub fn enhance(
    effect: &VisualEffect,
    overrides: &EffectOverrides,
) -> Result<EnhancedVisualEffect, EffectError> {
    let kind = effect.kind();
    validate_descriptor(effect)?;
    validate_overrides(kind, overrides)?;

    let enhanced_kind = match effect {
        VisualEffect::GasProduction(base) => EnhancedKind::GasProduction {
            base: base.clone(),
            params: GasParams {
                particle_count: overrides
                    .particle_count
                    .unwrap_or(defaults::GAS_PARTICLE_COUNT),
                particle_size: defaults::GAS_PARTICLE_SIZE,
                rise_cycles: defaults::GAS_RISE_CYCLES,
                spread: defaults::GAS_SPREAD,
            },
        },
        VisualEffect::LightEmission(base) => EnhancedKind::LightEmission {
            base: base.clone(),
            params: LightParams {
                glow_layers: overrides.glow_layers.unwrap_or(defaults::LIGHT_GLOW_LAYERS),
                pulse_frequency: overrides
                    .pulse_frequency
                    .unwrap_or(defaults::LIGHT_PULSE_FREQUENCY),
                flicker: defaults::LIGHT_FLICKER,
            },
        },
        VisualEffect::TemperatureChange(base) => EnhancedKind::TemperatureChange {
            base: base.clone(),
            params: TemperatureParams {
                wave_count: overrides
                    .wave_count
                    .unwrap_or(defaults::TEMPERATURE_WAVE_COUNT),
                shimmer_amplitude: defaults::TEMPERATURE_SHIMMER_AMPLITUDE,
            },
        },
        VisualEffect::FoamProduction(base) => EnhancedKind::FoamProduction {
            base: base.clone(),
            params: FoamParams {
                bubble_count: overrides
                    .bubble_count
                    .unwrap_or(defaults::FOAM_BUBBLE_COUNT),
                rise_height: defaults::FOAM_RISE_HEIGHT,
                wobble: defaults::FOAM_WOBBLE,
            },
        },
        VisualEffect::StateChange(base) => EnhancedKind::StateChange {
            base: base.clone(),
            params: StateChangeParams {
                particle_count: overrides
                    .particle_count
                    .unwrap_or(defaults::STATE_CHANGE_PARTICLE_COUNT),
            },
        },
        VisualEffect::VolumeChange(base) => EnhancedKind::VolumeChange {
            base: base.clone(),
            params: VolumeParams {
                ring_count: overrides.ring_count.unwrap_or(defaults::VOLUME_RING_COUNT),
            },
        },
        VisualEffect::Spill(base) => EnhancedKind::Spill {
            base: base.clone(),
            params: SpillParams {
                droplet_count: overrides
                    .droplet_count
                    .unwrap_or(defaults::SPILL_DROPLET_COUNT),
            },
        },
        VisualEffect::TextureChange(base) => EnhancedKind::TextureChange {
            base: base.clone(),
            params: TextureParams {
                grain_count: overrides
                    .grain_count
                    .unwrap_or(defaults::TEXTURE_GRAIN_COUNT),
                ripple_count: defaults::TEXTURE_RIPPLE_COUNT,
                ripple_amplitude: defaults::TEXTURE_RIPPLE_AMPLITUDE,
            },
        },
    };

    // 显式时长 > 覆盖时长 > 回退时长
    let duration = effect
        .explicit_duration()
        .or(overrides.duration)
        .unwrap_or_else(|| registry::fallback_duration(effect));

    Ok(EnhancedVisualEffect {
        kind: enhanced_kind,
        schedule: ScheduleMeta {
            id: overrides.id.clone(),
            priority: overrides.priority.unwrap_or(0),
            delay: overrides.delay.unwrap_or(0.0),
            duration: overrides.duration,
            looping: overrides.looping.unwrap_or(false),
            attachment_point: overrides.attachment_point.clone(),
            z_index: overrides
                .z_index
                .unwrap_or_else(|| registry::default_z_index(kind)),
        },
        duration,
    })
}

fn finite(kind: EffectKind, field: &'static str, value: f32) -> Result<(), EffectError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EffectError::NonFinite { kind, field })
    }
}

fn non_negative(kind: EffectKind, field: &'static str, value: f32) -> Result<(), EffectError> {
    finite(kind, field, value)?;
    if value < 0.0 {
        return Err(EffectError::OutOfRange {
            kind,
            field,
            value,
            message: "不能为负",
        });
    }
    Ok(())
}

fn at_most(kind: EffectKind, field: &'static str, value: u32, max: u32) -> Result<(), EffectError> {
    if value > max {
        return Err(EffectError::OutOfRange {
            kind,
            field,
            value: value as f32,
            message: "超过数量上限",
        });
    }
    Ok(())
}

fn validate_descriptor(effect: &VisualEffect) -> Result<(), EffectError> {
    let kind = effect.kind();
    match effect {
        VisualEffect::GasProduction(e) => {
            finite(kind, "intensity", e.intensity)?;
            non_negative(kind, "duration", e.duration)
        }
        VisualEffect::LightEmission(e) => {
            finite(kind, "intensity", e.intensity)?;
            non_negative(kind, "radius", e.radius)?;
            non_negative(kind, "duration", e.duration)
        }
        VisualEffect::TemperatureChange(e) => finite(kind, "delta", e.delta),
        VisualEffect::FoamProduction(e) => {
            finite(kind, "density", e.density)?;
            non_negative(kind, "stability", e.stability)
        }
        VisualEffect::StateChange(_) => Ok(()),
        VisualEffect::VolumeChange(e) => {
            finite(kind, "scale_factor", e.scale_factor)?;
            if e.scale_factor <= 0.0 {
                return Err(EffectError::OutOfRange {
                    kind,
                    field: "scale_factor",
                    value: e.scale_factor,
                    message: "必须大于 0",
                });
            }
            Ok(())
        }
        VisualEffect::Spill(e) => {
            finite(kind, "amount", e.amount)?;
            non_negative(kind, "spread_radius", e.spread_radius)
        }
        VisualEffect::TextureChange(e) => finite(kind, "viscosity", e.viscosity),
    }
}

fn validate_overrides(kind: EffectKind, overrides: &EffectOverrides) -> Result<(), EffectError> {
    if let Some(delay) = overrides.delay {
        non_negative(kind, "delay", delay)?;
    }
    if let Some(duration) = overrides.duration {
        non_negative(kind, "duration", duration)?;
    }
    if let Some(frequency) = overrides.pulse_frequency {
        non_negative(kind, "pulse_frequency", frequency)?;
    }

    let particles = [
        ("particle_count", overrides.particle_count),
        ("bubble_count", overrides.bubble_count),
        ("droplet_count", overrides.droplet_count),
        ("grain_count", overrides.grain_count),
    ];
    for (field, value) in particles {
        if let Some(value) = value {
            at_most(kind, field, value, defaults::MAX_PARTICLE_COUNT)?;
        }
    }

    let layers = [
        ("glow_layers", overrides.glow_layers),
        ("wave_count", overrides.wave_count),
        ("ring_count", overrides.ring_count),
    ];
    for (field, value) in layers {
        if let Some(value) = value {
            at_most(kind, field, value, defaults::MAX_LAYER_COUNT)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{BubbleSize, MatterState, TextureKind};

    fn sample_effects() -> Vec<VisualEffect> {
        vec![
            VisualEffect::GasProduction(GasProduction {
                gas: "H2".to_string(),
                color: "colorless".to_string(),
                intensity: 0.8,
                duration: 4.0,
            }),
            VisualEffect::LightEmission(LightEmission {
                color: "#ffcc00".to_string(),
                intensity: 0.9,
                radius: 60.0,
                duration: 2.0,
            }),
            VisualEffect::TemperatureChange(TemperatureChange { delta: 35.0 }),
            VisualEffect::FoamProduction(FoamProduction {
                color: "white".to_string(),
                density: 0.6,
                bubble_size: BubbleSize::Large,
                stability: 5.0,
            }),
            VisualEffect::StateChange(StateChange {
                initial_state: MatterState::Liquid,
                final_state: MatterState::Solid,
            }),
            VisualEffect::VolumeChange(VolumeChange { scale_factor: 1.4 }),
            VisualEffect::Spill(Spill {
                amount: 0.3,
                spread_radius: 40.0,
            }),
            VisualEffect::TextureChange(TextureChange {
                texture: TextureKind::Gel,
                color: "#88cc88".to_string(),
                viscosity: 0.7,
            }),
        ]
    }

    // ========== 字段保留测试 ==========

    #[test]
    fn test_enhance_never_overwrites_descriptor_fields() {
        for effect in sample_effects() {
            let enhanced = enhance(&effect, &EffectOverrides::default()).unwrap();
            assert_eq!(enhanced.descriptor(), effect);
            assert_eq!(enhanced.effect_kind(), effect.kind());
        }
    }

    #[test]
    fn test_enhance_with_overrides_keeps_descriptor_fields() {
        let overrides = EffectOverrides::new()
            .with_id("fx-1")
            .with_delay(0.5)
            .with_duration(9.0)
            .with_particle_count(5);

        for effect in sample_effects() {
            let enhanced = enhance(&effect, &overrides).unwrap();
            assert_eq!(enhanced.descriptor(), effect);
        }
    }

    // ========== 默认值与覆盖测试 ==========

    #[test]
    fn test_defaults_filled_per_kind() {
        let effects = sample_effects();
        let gas = enhance(&effects[0], &EffectOverrides::default()).unwrap();
        match &gas.kind {
            EnhancedKind::GasProduction { params, .. } => {
                assert_eq!(params.particle_count, defaults::GAS_PARTICLE_COUNT);
            }
            other => panic!("Expected GasProduction, got {:?}", other),
        }

        let light = enhance(&effects[1], &EffectOverrides::default()).unwrap();
        match &light.kind {
            EnhancedKind::LightEmission { params, .. } => {
                assert_eq!(params.glow_layers, defaults::LIGHT_GLOW_LAYERS);
                assert_eq!(params.pulse_frequency, defaults::LIGHT_PULSE_FREQUENCY);
            }
            other => panic!("Expected LightEmission, got {:?}", other),
        }
    }

    #[test]
    fn test_override_wins_over_default() {
        let effects = sample_effects();
        let overrides = EffectOverrides::new().with_particle_count(7);
        let gas = enhance(&effects[0], &overrides).unwrap();
        match &gas.kind {
            EnhancedKind::GasProduction { params, .. } => assert_eq!(params.particle_count, 7),
            other => panic!("Expected GasProduction, got {:?}", other),
        }
    }

    #[test]
    fn test_schedule_defaults() {
        let enhanced = enhance(&sample_effects()[0], &EffectOverrides::default()).unwrap();
        assert_eq!(enhanced.schedule.id, None);
        assert_eq!(enhanced.schedule.delay, 0.0);
        assert!(!enhanced.schedule.looping);
        assert_eq!(
            enhanced.schedule.z_index,
            registry::default_z_index(EffectKind::GasProduction)
        );
    }

    // ========== 时长测试 ==========

    #[test]
    fn test_descriptor_duration_wins_over_override() {
        let gas = &sample_effects()[0];
        let enhanced = enhance(gas, &EffectOverrides::new().with_duration(10.0)).unwrap();

        assert_eq!(enhanced.duration(), 4.0);
        assert_eq!(enhanced.schedule.duration, Some(10.0));
    }

    #[test]
    fn test_override_duration_applies_without_descriptor_duration() {
        let state = &sample_effects()[4];
        let enhanced = enhance(state, &EffectOverrides::new().with_duration(1.25)).unwrap();
        assert_eq!(enhanced.duration(), 1.25);

        let fallback = enhance(state, &EffectOverrides::default()).unwrap();
        assert_eq!(fallback.duration(), defaults::STATE_CHANGE_DURATION);
    }

    #[test]
    fn test_foam_stability_is_duration() {
        let foam = enhance(&sample_effects()[3], &EffectOverrides::default()).unwrap();
        assert_eq!(foam.duration(), 5.0);
    }

    // ========== 校验测试 ==========

    #[test]
    fn test_nan_intensity_rejected() {
        let effect = VisualEffect::GasProduction(GasProduction {
            gas: "O2".to_string(),
            color: "colorless".to_string(),
            intensity: f32::NAN,
            duration: 2.0,
        });
        let result = enhance(&effect, &EffectOverrides::default());
        assert_eq!(
            result,
            Err(EffectError::NonFinite {
                kind: EffectKind::GasProduction,
                field: "intensity"
            })
        );
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let effect = VisualEffect::VolumeChange(VolumeChange { scale_factor: 0.0 });
        assert!(matches!(
            enhance(&effect, &EffectOverrides::default()),
            Err(EffectError::OutOfRange {
                field: "scale_factor",
                ..
            })
        ));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let result = enhance(&sample_effects()[0], &EffectOverrides::new().with_delay(-1.0));
        assert!(matches!(
            result,
            Err(EffectError::OutOfRange { field: "delay", .. })
        ));
    }

    #[test]
    fn test_oversized_counts_rejected() {
        let gas = &sample_effects()[0];
        let result = enhance(gas, &EffectOverrides::new().with_particle_count(u32::MAX));
        assert!(matches!(
            result,
            Err(EffectError::OutOfRange {
                field: "particle_count",
                ..
            })
        ));

        let layers = EffectOverrides {
            glow_layers: Some(defaults::MAX_LAYER_COUNT + 1),
            ..EffectOverrides::default()
        };
        assert!(matches!(
            enhance(&sample_effects()[1], &layers),
            Err(EffectError::OutOfRange {
                field: "glow_layers",
                ..
            })
        ));

        let at_limit = EffectOverrides::new().with_particle_count(defaults::MAX_PARTICLE_COUNT);
        assert!(enhance(gas, &at_limit).is_ok());
    }

    #[test]
    fn test_out_of_range_intensity_is_not_rejected() {
        let effect = VisualEffect::LightEmission(LightEmission {
            color: "white".to_string(),
            intensity: 3.0,
            radius: 20.0,
            duration: 1.0,
        });
        assert!(enhance(&effect, &EffectOverrides::default()).is_ok());
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides: EffectOverrides =
            serde_json::from_str(r#"{"id":"glow","loop":true,"delay":0.25,"z_index":9}"#).unwrap();
        let enhanced = enhance(&sample_effects()[1], &overrides).unwrap();

        assert_eq!(enhanced.schedule.id.as_deref(), Some("glow"));
        assert!(enhanced.schedule.looping);
        assert_eq!(enhanced.schedule.delay, 0.25);
        assert_eq!(enhanced.schedule.z_index, 9);
    }
}
