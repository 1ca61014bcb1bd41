//! # Runner 模块
//!
//! 无窗口模拟：用固定步长的模拟时钟驱动 [`EffectEngine`]，
//! 直到所有效果结束或达到最长模拟时长，然后汇总结果与性能诊断。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chem_fx::{
    EffectEngine, EffectError, EffectEvent, EffectId, EffectKind, EffectRequest, EffectState,
    PerformanceStats, Recommendation, parse_effects,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;

/// 模拟运行错误
#[derive(Error, Debug)]
pub enum RunError {
    /// 效果文件读取失败
    #[error("无法读取效果文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 效果列表被拒绝
    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// 单个实例的最终结果
#[derive(Debug, Clone, Serialize)]
pub struct EffectOutcome {
    pub kind: EffectKind,
    #[serde(flatten)]
    pub state: EffectState,
}

/// 模拟报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 渲染的帧数
    pub frames: usize,
    /// 最后一帧的模拟时间（秒）
    pub simulated_seconds: f64,
    /// 达到最长模拟时长时仍有效果在播放（已被取消）
    pub truncated: bool,
    /// 单帧最多图元数
    pub peak_primitives: usize,
    /// 完成回调收到的实例（按完成顺序）
    pub completed: Vec<EffectId>,
    /// 每个实例的最终状态（按添加顺序）
    pub outcomes: Vec<EffectOutcome>,
    pub stats: PerformanceStats,
    pub recommendations: Vec<Recommendation>,
}

impl RunReport {
    /// 渲染失败的实例数
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state.error.is_some())
            .count()
    }
}

/// 解码效果文件内容
///
/// 接受两种形式：效果描述数组，或 `{ "effect": ..., "schedule": ... }` 请求数组。
/// 两者都失败时报告描述数组的解码错误。
pub fn load_requests(json: &str) -> Result<Vec<EffectRequest>, EffectError> {
    match parse_effects(json) {
        Ok(effects) => Ok(effects.into_iter().map(EffectRequest::from).collect()),
        Err(effect_error) => {
            serde_json::from_str::<Vec<EffectRequest>>(json).map_err(|_| effect_error)
        }
    }
}

/// 读取并解码效果文件
pub fn read_requests(path: &Path) -> Result<Vec<EffectRequest>, RunError> {
    let content = fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(load_requests(&content)?)
}

/// 运行一次模拟
pub fn run(config: &AppConfig, requests: &[EffectRequest]) -> Result<RunReport, RunError> {
    let mut engine = EffectEngine::new(
        config.engine.clone(),
        config.simulation.platform_reduced_motion,
    );

    let completed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&completed);
    engine.on_effect_complete(move |id| sink.borrow_mut().push(id));

    let ids = engine.set_requests(requests)?;
    tracing::info!(count = ids.len(), "效果列表已加载");

    let interval = config.frame_interval();
    let max_seconds = config.simulation.max_seconds;
    let mut finished: BTreeMap<EffectId, EffectOutcome> = BTreeMap::new();
    let mut frames = 0;
    let mut peak_primitives = 0;
    let mut now = 0.0;
    let mut truncated = false;

    loop {
        let frame = engine.frame(now);
        frames += 1;
        peak_primitives = peak_primitives.max(frame.primitive_count());
        for event in &frame.events {
            log_event(event);
        }

        collect_finished(&engine, &mut finished);
        if config.simulation.prune_finished {
            engine.prune_finished();
        }

        if !engine.is_running() {
            break;
        }
        if now >= max_seconds {
            truncated = true;
            tracing::warn!(seconds = max_seconds, "达到最长模拟时长，取消剩余效果");
            for event in &engine.unmount() {
                log_event(event);
            }
            collect_finished(&engine, &mut finished);
            break;
        }

        now = frames as f64 * interval;
    }

    let outcomes = ids
        .iter()
        .filter_map(|id| finished.remove(id))
        .collect::<Vec<_>>();
    let monitor = engine.monitor();
    let report = RunReport {
        frames,
        simulated_seconds: now,
        truncated,
        peak_primitives,
        completed: completed.borrow().clone(),
        outcomes,
        stats: monitor.performance_stats(),
        recommendations: monitor.performance_recommendations(),
    };

    tracing::info!(
        frames = report.frames,
        seconds = report.simulated_seconds,
        completed = report.completed.len(),
        failed = report.failed_count(),
        "模拟结束"
    );
    for recommendation in &report.recommendations {
        tracing::warn!("{}", recommendation.message);
    }

    Ok(report)
}

/// 记录已终止的实例（在清理之前）
fn collect_finished(engine: &EffectEngine, finished: &mut BTreeMap<EffectId, EffectOutcome>) {
    let scheduler = engine.scheduler();
    for state in scheduler.states() {
        if !state.status.is_terminal() || finished.contains_key(&state.id) {
            continue;
        }
        let Some(effect) = scheduler.effect(state.id) else {
            continue;
        };
        finished.insert(
            state.id,
            EffectOutcome {
                kind: effect.effect_kind(),
                state: state.clone(),
            },
        );
    }
}

fn log_event(event: &EffectEvent) {
    match event {
        EffectEvent::Activated(id) => tracing::debug!(%id, "效果开始播放"),
        EffectEvent::Looped { id, cycles } => {
            tracing::debug!(%id, cycles, "效果进入下一周期")
        }
        EffectEvent::Completed(id) => tracing::info!(%id, "效果完成"),
        EffectEvent::Cancelled(id) => tracing::info!(%id, "效果已取消"),
        EffectEvent::Failed { id, reason } => tracing::warn!(%id, %reason, "效果渲染失败"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chem_fx::{EffectStatus, VisualEffect};

    fn config(fps: u32, max_seconds: f64) -> AppConfig {
        let mut config = AppConfig::default();
        config.simulation.fps = fps;
        config.simulation.max_seconds = max_seconds;
        config.engine.auto_degrade = false;
        config
    }

    // ========== 解码 ==========

    #[test]
    fn test_load_plain_effect_list() {
        let requests =
            load_requests(r#"[{"effect_type":"temperature_change","delta":25.0}]"#).unwrap();
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            requests[0].effect,
            VisualEffect::TemperatureChange(_)
        ));
        assert_eq!(requests[0].schedule.duration, None);
    }

    #[test]
    fn test_load_request_list_with_schedule() {
        let requests = load_requests(
            r#"[{"effect":{"effect_type":"volume_change","scale_factor":1.4},
                 "schedule":{"delay":0.5,"z_index":7}}]"#,
        )
        .unwrap();
        assert_eq!(requests[0].schedule.delay, Some(0.5));
        assert_eq!(requests[0].schedule.z_index, Some(7));
    }

    #[test]
    fn test_load_reports_effect_decode_error() {
        let result = load_requests(r#"[{"effect_type":"sparkles"}]"#);
        assert!(matches!(result, Err(EffectError::Decode { .. })));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_requests(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(RunError::Io { .. })));
    }

    // ========== 模拟 ==========

    #[test]
    fn test_run_until_all_complete() {
        let requests = load_requests(
            r#"[
                {"effect_type":"light_emission","color":"yellow","intensity":0.8,"radius":20.0,"duration":1.0},
                {"effect_type":"temperature_change","delta":-8.0}
            ]"#,
        )
        .unwrap();

        let report = run(&config(10, 30.0), &requests).unwrap();

        assert!(!report.truncated);
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.outcomes.len(), 2);
        assert!(
            report
                .outcomes
                .iter()
                .all(|o| o.state.status == EffectStatus::Completed)
        );
        assert_eq!(report.outcomes[0].kind, EffectKind::LightEmission);
        assert!(report.peak_primitives > 0);
    }

    #[test]
    fn test_looping_effect_is_truncated() {
        let requests = load_requests(
            r#"[{"effect":{"effect_type":"spill","amount":0.5,"spread_radius":40.0},
                 "schedule":{"loop":true}}]"#,
        )
        .unwrap();

        let report = run(&config(20, 2.0), &requests).unwrap();

        assert!(report.truncated);
        assert!(report.completed.is_empty());
        assert_eq!(report.outcomes[0].state.status, EffectStatus::Cancelled);
        assert!(report.simulated_seconds >= 2.0);
    }

    #[test]
    fn test_empty_list_finishes_immediately() {
        let report = run(&config(60, 5.0), &[]).unwrap();
        assert_eq!(report.frames, 1);
        assert!(report.outcomes.is_empty());
        assert!(!report.truncated);
    }
}
