//! # State 模块
//!
//! 单个效果实例的生命周期状态。
//!
//! ```text
//! Pending ──(delay 结束)──► Active ──(progress ≥ 1，非循环)──► Completed
//!    │                      │  ▲
//!    │                      ▼  │
//!    │                     Paused
//!    └──────────(cancel)──────────► Cancelled
//!                (渲染失败) ──────► Error
//! ```
//!
//! 终止状态（Completed / Cancelled / Error）不会再发生任何转换。

use std::fmt;

use serde::Serialize;

/// 效果实例 ID
///
/// 由 `EffectScheduler` 在 `add` 时分配，同一描述添加两次也会得到不同的 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EffectId(pub(crate) u64);

impl EffectId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fx#{}", self.0)
    }
}

/// 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStatus {
    /// 等待开始（有延迟，或尚未被任何 tick 观察到）
    #[default]
    Pending,
    /// 正在播放
    Active,
    /// 已暂停
    Paused,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
    /// 渲染失败
    Error,
}

impl EffectStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Error)
    }

    /// 是否需要绘制
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// 一次推进产生的转换
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StepOutcome {
    pub activated: bool,
    pub looped: u32,
    pub completed: bool,
}

/// 单个效果实例的状态
#[derive(Debug, Clone, Serialize)]
pub struct EffectState {
    pub id: EffectId,
    /// 调用方 id，未指定时为 `<kind>-<n>`
    pub key: String,
    pub status: EffectStatus,
    /// 当前进度（0.0 - 1.0）
    pub progress: f32,
    /// 首次被 tick 观察到的时间（秒）
    pub start_time: Option<f64>,
    /// 当前周期内已播放的时间（秒，不含延迟与暂停）
    pub elapsed_time: f64,
    /// 剩余时间（秒，Pending 时包含剩余延迟）
    pub remaining_time: f64,
    /// 已完成的循环次数
    pub cycles: u32,
    /// 失败原因（仅 Error 状态）
    pub error: Option<String>,
    #[serde(skip)]
    delay: f64,
    #[serde(skip)]
    duration: f64,
    #[serde(skip)]
    looping: bool,
    /// 已被完整循环消耗的播放时间
    #[serde(skip)]
    cycle_origin: f64,
    #[serde(skip)]
    paused_total: f64,
    #[serde(skip)]
    paused_at: Option<f64>,
}

impl EffectState {
    pub(crate) fn new(id: EffectId, key: String, delay: f32, duration: f32, looping: bool) -> Self {
        let delay = f64::from(delay.max(0.0));
        let duration = f64::from(duration.max(0.0));
        Self {
            id,
            key,
            status: EffectStatus::Pending,
            progress: 0.0,
            start_time: None,
            elapsed_time: 0.0,
            remaining_time: delay + duration,
            cycles: 0,
            error: None,
            delay,
            duration,
            looping,
            cycle_origin: 0.0,
            paused_total: 0.0,
            paused_at: None,
        }
    }

    /// 效果时长（秒）
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// 推进到 `now`
    pub(crate) fn advance(&mut self, now: f64) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.status.is_terminal() || self.status == EffectStatus::Paused {
            return outcome;
        }

        let start = *self.start_time.get_or_insert(now);
        let activation = start + self.delay;

        if self.status == EffectStatus::Pending {
            if now < activation {
                self.remaining_time = (activation - now) + self.duration;
                return outcome;
            }
            self.status = EffectStatus::Active;
            outcome.activated = true;
        }

        let played = (now - activation - self.paused_total).max(0.0);

        if self.duration <= 0.0 {
            self.finish();
            outcome.completed = true;
            return outcome;
        }

        let mut cycle_elapsed = played - self.cycle_origin;
        if cycle_elapsed >= self.duration {
            if !self.looping {
                self.elapsed_time = self.duration;
                self.finish();
                outcome.completed = true;
                return outcome;
            }
            let wraps = (cycle_elapsed / self.duration).floor();
            self.cycle_origin += wraps * self.duration;
            cycle_elapsed = played - self.cycle_origin;
            outcome.looped = wraps as u32;
            self.cycles = self.cycles.saturating_add(outcome.looped);
        }

        self.elapsed_time = cycle_elapsed;
        self.progress = (cycle_elapsed / self.duration).clamp(0.0, 1.0) as f32;
        self.remaining_time = (self.duration - cycle_elapsed).max(0.0);
        outcome
    }

    fn finish(&mut self) {
        self.progress = 1.0;
        self.remaining_time = 0.0;
        self.status = EffectStatus::Completed;
    }

    /// 暂停（仅 Active）
    pub(crate) fn pause(&mut self, at: f64) -> bool {
        if self.status != EffectStatus::Active {
            return false;
        }
        self.status = EffectStatus::Paused;
        self.paused_at = Some(at);
        true
    }

    /// 恢复（仅 Paused），暂停期间的时间不计入播放时间
    pub(crate) fn resume(&mut self, at: f64) -> bool {
        if self.status != EffectStatus::Paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += (at - paused_at).max(0.0);
        }
        self.status = EffectStatus::Active;
        true
    }

    /// 取消（非终止状态）
    pub(crate) fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = EffectStatus::Cancelled;
        true
    }

    /// 标记渲染失败（非终止状态）
    pub(crate) fn fail(&mut self, reason: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = EffectStatus::Error;
        self.error = Some(reason);
        true
    }
}
