//! # Error 模块
//!
//! 定义 chem-fx 中使用的错误类型。
//!
//! - [`EffectError`]：输入契约违规（解码/增强边界），永远不会进入调度器
//! - [`RenderError`]：单个效果实例的渲染故障，只影响该实例

use thiserror::Error;

use crate::effect::EffectKind;

/// 效果描述错误（输入契约违规）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// 描述 JSON 无法解码（包括未知的 effect_type）
    #[error("效果描述解码失败: {message}")]
    Decode { message: String },

    /// 数值字段不是有限数
    #[error("{kind} 的字段 '{field}' 不是有限数值")]
    NonFinite { kind: EffectKind, field: &'static str },

    /// 数值字段超出合法范围
    #[error("{kind} 的字段 '{field}' 值无效: {value}（{message}）")]
    OutOfRange {
        kind: EffectKind,
        field: &'static str,
        value: f32,
        message: &'static str,
    },
}

/// 渲染错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// 无法识别的颜色值
    #[error("无法解析颜色 '{value}'")]
    InvalidColor { value: String },

    /// 渲染器拒绝渲染该效果
    #[error("{kind} 渲染失败: {message}")]
    Failed { kind: EffectKind, message: String },
}
