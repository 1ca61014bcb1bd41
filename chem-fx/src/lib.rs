//! # Chem FX
//!
//! 化学反应视觉效果引擎的核心库。
//!
//! ## 架构概述
//!
//! `chem-fx` 是纯逻辑核心，不依赖任何窗口或 GPU。
//! 宿主每帧调用一次 [`EffectEngine::frame`]，拿到按层级排列的矢量图元：
//!
//! ```text
//! 反应预测 ──► VisualEffect ──► enhance() ──► EffectScheduler
//!                                                  │ tick(now)
//!                         锚点 (attachment) ──► EffectRenderer ──► Frame
//!                                                  │
//!                                          PerformanceMonitor
//! ```
//!
//! ## 核心类型
//!
//! - [`VisualEffect`]：效果描述（8 种类型的标签联合）
//! - [`EnhancedVisualEffect`]：增强后的效果（默认次级参数 + 调度元数据）
//! - [`AttachmentPoint`]：容器锚点
//! - [`EffectScheduler`]：生命周期调度器
//! - [`EffectRenderer`]：渲染器 trait，[`ProceduralRenderer`] 为内置实现
//! - [`PerformanceMonitor`]：性能监控
//! - [`EffectEngine`]：把上述组件组合为一个挂载的效果层
//!
//! ## 使用示例
//!
//! ```ignore
//! use chem_fx::{EffectEngine, EngineConfig, parse_effects};
//!
//! let effects = parse_effects(json)?;
//! let mut engine = EffectEngine::new(EngineConfig::default(), false);
//! engine.on_effect_complete(|id| println!("{id} 完成"));
//! engine.set_effects(&effects)?;
//!
//! loop {
//!     let frame = engine.frame(clock.now());
//!     for layer in &frame.layers {
//!         canvas.draw(&layer.primitives);
//!     }
//!     if !engine.is_running() {
//!         break;
//!     }
//! }
//! ```

pub mod attachment;
pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod performance;
pub mod render;
pub mod scheduler;

// 重导出核心类型
pub use attachment::{AnchorType, AttachmentPoint, VesselShape};
pub use config::EngineConfig;
pub use effect::{
    BubbleSize, EffectKind, EffectOverrides, EnhancedKind, EnhancedVisualEffect, FoamProduction,
    GasProduction, LightEmission, MatterState, Spill, StateChange, TemperatureChange,
    TextureChange, TextureKind, VisualEffect, VolumeChange, enhance, parse_effects,
};
pub use engine::{EffectEngine, EffectLayer, EffectRequest, Frame};
pub use error::{EffectError, RenderError};
pub use geometry::{Size, Vec2};
pub use performance::{
    EffectSample, PerformanceMetrics, PerformanceMonitor, PerformanceStats, Recommendation,
    RecommendationCategory,
};
pub use render::{EffectRenderer, Primitive, ProceduralRenderer, RenderContext, Rgba};
pub use scheduler::{EffectEvent, EffectId, EffectScheduler, EffectState, EffectStatus};
