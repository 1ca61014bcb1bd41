//! # Effect 模块（反应效果描述与增强）
//!
//! 把反应预测协作方给出的"效果描述"收敛到一个统一入口。
//!
//! ## 核心组件
//!
//! - [`VisualEffect`]：效果描述（按 `effect_type` 区分的标签联合）
//! - [`EffectKind`]：效果类型（不带参数的标签）
//! - [`EnhancedVisualEffect`]：增强后的效果（默认次级参数 + 调度元数据）
//! - [`enhance`]：将 `VisualEffect` 增强为 `EnhancedVisualEffect`
//!
//! ## 使用流程
//!
//! ```text
//! JSON (from reaction prediction)
//!   → parse_effects() → Vec<VisualEffect>
//!   → enhance() → EnhancedVisualEffect
//!   → EffectScheduler.add()
//! ```
//!
//! ## 设计原则
//!
//! - **唯一来源**：各类型的默认参数、回退时长、首选锚点只在 [`registry`] 中定义
//! - **失败前置**：非法数值在解码/增强边界就被拒绝，永远不会进入调度器
//! - **描述只读**：增强不会覆盖描述中显式给出的任何字段

mod enhancer;
pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EffectError;

pub use enhancer::{
    EffectOverrides, EnhancedKind, EnhancedVisualEffect, FoamParams, GasParams, LightParams,
    ScheduleMeta, SpillParams, StateChangeParams, TemperatureParams, TextureParams, VolumeParams,
    enhance,
};

/// 效果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    GasProduction,
    LightEmission,
    TemperatureChange,
    FoamProduction,
    StateChange,
    VolumeChange,
    Spill,
    TextureChange,
}

impl EffectKind {
    /// 所有效果类型（按声明顺序）
    pub const ALL: [EffectKind; 8] = [
        EffectKind::GasProduction,
        EffectKind::LightEmission,
        EffectKind::TemperatureChange,
        EffectKind::FoamProduction,
        EffectKind::StateChange,
        EffectKind::VolumeChange,
        EffectKind::Spill,
        EffectKind::TextureChange,
    ];

    /// 与 `effect_type` 一致的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::GasProduction => "gas_production",
            EffectKind::LightEmission => "light_emission",
            EffectKind::TemperatureChange => "temperature_change",
            EffectKind::FoamProduction => "foam_production",
            EffectKind::StateChange => "state_change",
            EffectKind::VolumeChange => "volume_change",
            EffectKind::Spill => "spill",
            EffectKind::TextureChange => "texture_change",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 泡沫气泡尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleSize {
    Small,
    Medium,
    Large,
}

/// 物态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterState {
    Solid,
    Liquid,
    Gas,
}

/// 质地类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureKind {
    Smooth,
    Grainy,
    Gel,
    Crystalline,
    Powdery,
}

/// 气体生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasProduction {
    /// 气体名称（如 "CO2"）
    pub gas: String,
    pub color: String,
    /// 强度 (0.0 - 1.0)
    pub intensity: f32,
    /// 持续时间（秒）
    pub duration: f32,
}

/// 发光
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightEmission {
    pub color: String,
    /// 强度 (0.0 - 1.0)
    pub intensity: f32,
    /// 光晕半径（场景单位）
    pub radius: f32,
    /// 持续时间（秒）
    pub duration: f32,
}

/// 温度变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureChange {
    /// 温度变化量（°C，可为负）
    pub delta: f32,
}

/// 泡沫生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoamProduction {
    pub color: String,
    /// 密度 (0.0 - 1.0)
    pub density: f32,
    pub bubble_size: BubbleSize,
    /// 泡沫稳定时间（秒），同时作为持续时间
    pub stability: f32,
}

/// 物态变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub initial_state: MatterState,
    pub final_state: MatterState,
}

/// 体积变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeChange {
    /// 缩放系数（> 0）
    pub scale_factor: f32,
}

/// 溢出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spill {
    /// 溢出比例 (0.0 - 1.0)
    pub amount: f32,
    /// 扩散半径（像素）
    pub spread_radius: f32,
}

/// 质地变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureChange {
    pub texture: TextureKind,
    pub color: String,
    /// 粘度 (0.0 - 1.0)
    pub viscosity: f32,
}

/// 效果描述
///
/// 由反应预测协作方产生，引擎只读。JSON 形式以 `effect_type` 作为标签：
///
/// ```json
/// { "effect_type": "gas_production", "gas": "CO2", "color": "colorless",
///   "intensity": 0.7, "duration": 4.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect_type", rename_all = "snake_case")]
pub enum VisualEffect {
    GasProduction(GasProduction),
    LightEmission(LightEmission),
    TemperatureChange(TemperatureChange),
    FoamProduction(FoamProduction),
    StateChange(StateChange),
    VolumeChange(VolumeChange),
    Spill(Spill),
    TextureChange(TextureChange),
}

impl VisualEffect {
    /// 效果类型
    pub fn kind(&self) -> EffectKind {
        match self {
            VisualEffect::GasProduction(_) => EffectKind::GasProduction,
            VisualEffect::LightEmission(_) => EffectKind::LightEmission,
            VisualEffect::TemperatureChange(_) => EffectKind::TemperatureChange,
            VisualEffect::FoamProduction(_) => EffectKind::FoamProduction,
            VisualEffect::StateChange(_) => EffectKind::StateChange,
            VisualEffect::VolumeChange(_) => EffectKind::VolumeChange,
            VisualEffect::Spill(_) => EffectKind::Spill,
            VisualEffect::TextureChange(_) => EffectKind::TextureChange,
        }
    }

    /// 描述中显式给出的持续时间
    ///
    /// 只有 gas/light（`duration`）和 foam（`stability`）携带时长字段，
    /// 其余类型返回 `None`，由 [`registry::fallback_duration`] 提供。
    pub fn explicit_duration(&self) -> Option<f32> {
        match self {
            VisualEffect::GasProduction(e) => Some(e.duration),
            VisualEffect::LightEmission(e) => Some(e.duration),
            VisualEffect::FoamProduction(e) => Some(e.stability),
            VisualEffect::TemperatureChange(_)
            | VisualEffect::StateChange(_)
            | VisualEffect::VolumeChange(_)
            | VisualEffect::Spill(_)
            | VisualEffect::TextureChange(_) => None,
        }
    }

    /// 从 JSON 解码单个效果描述
    pub fn from_json(json: &str) -> Result<Self, EffectError> {
        serde_json::from_str(json).map_err(|e| EffectError::Decode {
            message: e.to_string(),
        })
    }
}

/// 从 JSON 数组解码效果描述列表（保持顺序）
///
/// 未知的 `effect_type` 或缺失字段都会在这里失败。
pub fn parse_effects(json: &str) -> Result<Vec<VisualEffect>, EffectError> {
    serde_json::from_str(json).map_err(|e| EffectError::Decode {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gas_production() {
        let effect = VisualEffect::from_json(
            r#"{"effect_type":"gas_production","gas":"CO2","color":"colorless","intensity":0.7,"duration":4.0}"#,
        )
        .unwrap();

        assert_eq!(effect.kind(), EffectKind::GasProduction);
        assert_eq!(effect.explicit_duration(), Some(4.0));
        match effect {
            VisualEffect::GasProduction(gas) => {
                assert_eq!(gas.gas, "CO2");
                assert_eq!(gas.intensity, 0.7);
            }
            other => panic!("Expected GasProduction, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_list_keeps_order() {
        let effects = parse_effects(
            r#"[
                {"effect_type":"state_change","initial_state":"liquid","final_state":"solid"},
                {"effect_type":"temperature_change","delta":-12.5},
                {"effect_type":"spill","amount":0.4,"spread_radius":30.0}
            ]"#,
        )
        .unwrap();

        let kinds: Vec<_> = effects.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EffectKind::StateChange,
                EffectKind::TemperatureChange,
                EffectKind::Spill
            ]
        );
    }

    #[test]
    fn test_decode_unknown_effect_type_fails() {
        let result = parse_effects(r#"[{"effect_type":"explosion","power":9000}]"#);
        assert!(matches!(result, Err(EffectError::Decode { .. })));
    }

    #[test]
    fn test_decode_unknown_enum_value_fails() {
        let result = VisualEffect::from_json(
            r#"{"effect_type":"foam_production","color":"white","density":0.5,"bubble_size":"huge","stability":3.0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_json_tag_roundtrip_uses_effect_type() {
        let effect = VisualEffect::VolumeChange(VolumeChange { scale_factor: 1.5 });
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["effect_type"], "volume_change");
        assert_eq!(json["scale_factor"], 1.5);
    }

    #[test]
    fn test_kind_names_match_tags() {
        for kind in EffectKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_explicit_duration_only_for_timed_kinds() {
        let foam = VisualEffect::FoamProduction(FoamProduction {
            color: "white".to_string(),
            density: 0.5,
            bubble_size: BubbleSize::Medium,
            stability: 6.0,
        });
        assert_eq!(foam.explicit_duration(), Some(6.0));

        let state = VisualEffect::StateChange(StateChange {
            initial_state: MatterState::Liquid,
            final_state: MatterState::Gas,
        });
        assert_eq!(state.explicit_duration(), None);
    }
}
