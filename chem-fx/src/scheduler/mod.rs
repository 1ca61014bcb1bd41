//! # Scheduler 模块
//!
//! 效果生命周期调度：实例状态表、状态机推进、完成/取消回调。
//!
//! ## 核心概念
//!
//! - `EffectId`: 调度器分配的实例 ID
//! - `EffectState`: 单个实例的状态（status / progress / 时间）
//! - `EffectScheduler`: 调度器，唯一拥有可变状态表
//! - `EffectEvent`: 一次 tick 中产生的生命周期事件
//!
//! 调度是单线程、协作式的：宿主每帧调用一次 `tick(now)`，
//! tick 内不阻塞，暂停点只存在于两次 tick 之间。

use serde::Serialize;

mod state;
mod system;

pub use state::{EffectId, EffectState, EffectStatus};
pub use system::EffectScheduler;

/// 生命周期事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectEvent {
    /// 延迟结束，开始播放
    Activated(EffectId),
    /// 循环效果进入下一周期
    ///
    /// 一次 tick 最多一个；`cycles` 是这次 tick 跨过的周期数。
    Looped { id: EffectId, cycles: u32 },
    /// 播放完成
    Completed(EffectId),
    /// 被取消
    Cancelled(EffectId),
    /// 渲染失败
    Failed { id: EffectId, reason: String },
}

impl EffectEvent {
    /// 事件对应的实例 ID
    pub fn id(&self) -> EffectId {
        match self {
            EffectEvent::Activated(id)
            | EffectEvent::Completed(id)
            | EffectEvent::Cancelled(id) => *id,
            EffectEvent::Looped { id, .. } | EffectEvent::Failed { id, .. } => *id,
        }
    }
}
