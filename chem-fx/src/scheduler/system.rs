//! # System 模块
//!
//! 效果生命周期调度器。
//!
//! 调度器是实例状态表的唯一所有者，由宿主每帧调用一次 [`EffectScheduler::tick`]：
//! ```rust,ignore
//! let mut scheduler = EffectScheduler::new();
//! scheduler.set_on_complete(|id| println!("{id} 完成"));
//! let id = scheduler.add(enhanced);
//! // 宿主帧回调
//! let events = scheduler.tick(now_seconds);
//! ```

use std::collections::BTreeMap;

use super::state::{EffectId, EffectState, EffectStatus};
use super::EffectEvent;
use crate::effect::EnhancedVisualEffect;

/// 已调度的效果
struct ScheduledEffect {
    effect: EnhancedVisualEffect,
    state: EffectState,
}

/// 完成回调
type CompleteCallback = Box<dyn FnMut(EffectId)>;

/// 效果调度器
///
/// ## 设计理念
///
/// 调度器只负责：
/// 1. 管理时间轴：按 `tick(now)` 推进每个实例的状态机
/// 2. 保证每个实例最多发生一次终止转换
/// 3. 不知道效果如何绘制：渲染由调用方根据 [`live`](Self::live) 完成
pub struct EffectScheduler {
    /// 实例表（按 id 顺序推进）
    entries: BTreeMap<EffectId, ScheduledEffect>,
    /// 下一个实例 ID
    next_id: u64,
    /// `cancel_all` 之后为 true，直到再次 `add`
    stopped: bool,
    /// 最近一次 tick 的时间
    last_tick: Option<f64>,
    /// 待处理的事件队列
    events: Vec<EffectEvent>,
    on_complete: Option<CompleteCallback>,
}

impl Default for EffectScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EffectScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectScheduler")
            .field("entries", &self.entries.len())
            .field("stopped", &self.stopped)
            .field("last_tick", &self.last_tick)
            .finish()
    }
}

impl EffectScheduler {
    /// 创建新的调度器
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
            stopped: false,
            last_tick: None,
            events: Vec::new(),
            on_complete: None,
        }
    }

    /// 设置完成回调
    ///
    /// 每个实例进入 `Completed` 的那一次 tick 中调用且只调用一次；
    /// 被取消或失败的实例永远不会触发。
    pub fn set_on_complete(&mut self, callback: impl FnMut(EffectId) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// 生成下一个实例 ID
    fn next_effect_id(&mut self) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        id
    }

    // ========== 实例管理 ==========

    /// 添加效果实例
    ///
    /// 不做去重：同一描述添加两次会得到两个独立推进的实例。
    /// 如果调度器之前被 `cancel_all` 停止，添加会重新启动 tick 循环。
    pub fn add(&mut self, effect: EnhancedVisualEffect) -> EffectId {
        let id = self.next_effect_id();
        let key = effect
            .schedule
            .id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", effect.effect_kind(), id.0));
        let state = EffectState::new(
            id,
            key,
            effect.schedule.delay,
            effect.duration(),
            effect.schedule.looping,
        );

        tracing::debug!(id = %id, key = %state.key, kind = %effect.effect_kind(), "效果已调度");
        self.entries.insert(id, ScheduledEffect { effect, state });
        self.stopped = false;
        id
    }

    /// 推进所有实例
    ///
    /// # 返回
    /// 返回自上次调用以来产生的事件列表（包括 `cancel_all` 等产生的事件）
    pub fn tick(&mut self, now: f64) -> Vec<EffectEvent> {
        if self.stopped {
            return self.take_events();
        }
        self.last_tick = Some(now);

        for (id, entry) in self.entries.iter_mut() {
            let outcome = entry.state.advance(now);

            if outcome.activated {
                self.events.push(EffectEvent::Activated(*id));
            }
            if outcome.looped > 0 {
                self.events.push(EffectEvent::Looped {
                    id: *id,
                    cycles: outcome.looped,
                });
            }
            if outcome.completed {
                tracing::debug!(id = %id, key = %entry.state.key, "效果完成");
                self.events.push(EffectEvent::Completed(*id));
                if let Some(callback) = self.on_complete.as_mut() {
                    callback(*id);
                }
            }
        }

        self.take_events()
    }

    /// 取消单个实例
    pub fn cancel(&mut self, id: EffectId) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        let cancelled = entry.state.cancel();
        if cancelled {
            self.events.push(EffectEvent::Cancelled(id));
        }
        cancelled
    }

    /// 取消所有未终止的实例并停止 tick 循环
    ///
    /// 卸载或替换效果列表时必须调用。
    pub fn cancel_all(&mut self) {
        let mut cancelled = 0usize;
        for (id, entry) in self.entries.iter_mut() {
            if entry.state.cancel() {
                self.events.push(EffectEvent::Cancelled(*id));
                cancelled += 1;
            }
        }
        self.stopped = true;
        if cancelled > 0 {
            tracing::debug!(cancelled, "已取消所有效果");
        }
    }

    /// 暂停实例（仅 Active）
    pub fn pause(&mut self, id: EffectId) -> bool {
        let at = self.last_tick.unwrap_or(0.0);
        self.entries
            .get_mut(&id)
            .is_some_and(|entry| entry.state.pause(at))
    }

    /// 恢复实例（仅 Paused）
    pub fn resume(&mut self, id: EffectId) -> bool {
        let at = self.last_tick.unwrap_or(0.0);
        self.entries
            .get_mut(&id)
            .is_some_and(|entry| entry.state.resume(at))
    }

    /// 标记实例渲染失败
    ///
    /// 失败的实例不再被推进和绘制，其他实例不受影响。
    pub fn fail(&mut self, id: EffectId, reason: impl Into<String>) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        let reason = reason.into();
        if !entry.state.fail(reason.clone()) {
            return false;
        }
        tracing::warn!(id = %id, key = %entry.state.key, error = %reason, "效果渲染失败，已隔离");
        self.events.push(EffectEvent::Failed { id, reason });
        true
    }

    /// 移除所有已终止的实例
    ///
    /// # 返回
    /// 移除的数量
    pub fn prune_finished(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.state.status.is_terminal());
        before - self.entries.len()
    }

    /// 取出并清空事件队列
    pub fn take_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.events)
    }

    // ========== 查询方法 ==========

    /// 获取实例状态
    pub fn state(&self, id: EffectId) -> Option<&EffectState> {
        self.entries.get(&id).map(|entry| &entry.state)
    }

    /// 获取实例对应的增强效果
    pub fn effect(&self, id: EffectId) -> Option<&EnhancedVisualEffect> {
        self.entries.get(&id).map(|entry| &entry.effect)
    }

    /// 所有实例状态（按 id 顺序）
    pub fn states(&self) -> impl Iterator<Item = &EffectState> {
        self.entries.values().map(|entry| &entry.state)
    }

    /// 需要绘制的实例（Active / Paused，按 id 顺序）
    pub fn live(&self) -> impl Iterator<Item = (&EnhancedVisualEffect, &EffectState)> {
        self.entries
            .values()
            .filter(|entry| entry.state.status.is_visible())
            .map(|entry| (&entry.effect, &entry.state))
    }

    /// 未终止的实例数量
    pub fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.state.status.is_terminal())
            .count()
    }

    /// 宿主是否需要继续请求帧
    pub fn is_running(&self) -> bool {
        !self.stopped && self.live_count() > 0
    }

    /// 实例总数（包括已终止但尚未清理的）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最近一次 tick 的时间
    pub fn last_tick(&self) -> Option<f64> {
        self.last_tick
    }

    /// 按状态统计实例数量
    pub fn count_status(&self, status: EffectStatus) -> usize {
        self.states().filter(|s| s.status == status).count()
    }
}
