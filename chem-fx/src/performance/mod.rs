//! # Performance 模块
//!
//! 渲染性能监控：环形缓冲采样、滚动平均、降级判定与优化建议。
//!
//! ## 阈值
//!
//! | 指标 | 窗口 | 降级条件 |
//! |------|------|----------|
//! | 帧率 | 最近 20 帧 | < 30 fps |
//! | 渲染耗时 | 最近 20 帧 | > 16 ms |
//! | 内存 | 最近 20 帧 | > 100 MiB |
//! | 单类型渲染耗时 | 最近 10 次 | > 10 ms（仅产生建议） |
//!
//! 监控器从不 panic：非有限或负数输入在记录时被清洗
//! （渲染耗时 → 0，可选字段 → 缺失），空缓冲的平均值为 0。

mod ring_buffer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effect::EffectKind;

pub use ring_buffer::RingBuffer;

/// 全局采样缓冲容量
pub const METRICS_CAPACITY: usize = 100;
/// 单类型采样缓冲容量
pub const EFFECT_SAMPLES_CAPACITY: usize = 50;
/// 全局统计窗口
pub const METRICS_WINDOW: usize = 20;
/// 单类型统计窗口
pub const EFFECT_WINDOW: usize = 10;

pub const MIN_FRAME_RATE: f32 = 30.0;
pub const MAX_RENDER_TIME_MS: f32 = 16.0;
pub const MAX_MEMORY_BYTES: u64 = 100 * BYTES_PER_MB;
pub const MAX_EFFECT_RENDER_TIME_MS: f32 = 10.0;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 单帧性能采样
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 本帧渲染耗时（毫秒）
    pub render_time_ms: f32,
    /// 本帧渲染的效果数量
    pub effects_count: usize,
    /// 内存占用（字节）
    pub memory_usage: Option<u64>,
    /// 帧率
    pub frame_rate: Option<f32>,
    /// 采样时间（秒）
    pub timestamp: f64,
}

impl PerformanceMetrics {
    pub fn new(render_time_ms: f32, effects_count: usize) -> Self {
        Self {
            render_time_ms,
            effects_count,
            memory_usage: None,
            frame_rate: None,
            timestamp: 0.0,
        }
    }

    pub fn with_memory_usage(mut self, bytes: u64) -> Self {
        self.memory_usage = Some(bytes);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn sanitized(mut self) -> Self {
        self.render_time_ms = sanitize_duration(self.render_time_ms);
        self.frame_rate = self.frame_rate.filter(|fps| fps.is_finite() && *fps >= 0.0);
        if !self.timestamp.is_finite() {
            self.timestamp = 0.0;
        }
        self
    }
}

/// 单个效果实例的一次渲染采样
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSample {
    /// 渲染耗时（毫秒）
    pub render_time_ms: f32,
    /// 输出的图元数量
    pub primitive_count: usize,
    pub timestamp: f64,
}

impl EffectSample {
    pub fn new(render_time_ms: f32, primitive_count: usize, timestamp: f64) -> Self {
        Self {
            render_time_ms,
            primitive_count,
            timestamp,
        }
    }

    fn sanitized(mut self) -> Self {
        self.render_time_ms = sanitize_duration(self.render_time_ms);
        if !self.timestamp.is_finite() {
            self.timestamp = 0.0;
        }
        self
    }
}

fn sanitize_duration(value: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

/// 单类型统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectStats {
    pub samples: usize,
    pub average_render_time_ms: f32,
    pub average_primitives: f32,
}

/// 滚动统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    /// 全局缓冲中的采样数
    pub sample_count: usize,
    pub average_render_time_ms: f32,
    /// 只统计携带帧率的采样，没有则为 None
    pub average_frame_rate: Option<f32>,
    /// 只统计携带内存的采样，没有则为 None
    pub average_memory_bytes: Option<u64>,
    pub average_effects_count: f32,
    pub per_kind: BTreeMap<EffectKind, EffectStats>,
}

/// 建议类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    FrameRate,
    RenderTime,
    Memory,
    SlowEffect(EffectKind),
}

/// 优化建议
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub message: String,
}

/// 性能监控器
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    metrics: RingBuffer<PerformanceMetrics>,
    effect_samples: BTreeMap<EffectKind, RingBuffer<EffectSample>>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            metrics: RingBuffer::new(METRICS_CAPACITY),
            effect_samples: BTreeMap::new(),
        }
    }

    /// 记录一帧采样
    pub fn record_metric(&mut self, metrics: PerformanceMetrics) {
        self.metrics.push(metrics.sanitized());
    }

    /// 记录某类效果的一次渲染采样
    pub fn record_effect_performance(&mut self, kind: EffectKind, sample: EffectSample) {
        self.effect_samples
            .entry(kind)
            .or_insert_with(|| RingBuffer::new(EFFECT_SAMPLES_CAPACITY))
            .push(sample.sanitized());
    }

    /// 滚动统计
    pub fn performance_stats(&self) -> PerformanceStats {
        let window: Vec<&PerformanceMetrics> = self.metrics.recent(METRICS_WINDOW).collect();

        let frame_rates: Vec<f32> = window.iter().filter_map(|m| m.frame_rate).collect();
        let memory: Vec<u64> = window.iter().filter_map(|m| m.memory_usage).collect();

        let per_kind = self
            .effect_samples
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(kind, samples)| {
                let recent: Vec<&EffectSample> = samples.recent(EFFECT_WINDOW).collect();
                let stats = EffectStats {
                    samples: samples.len(),
                    average_render_time_ms: mean(recent.iter().map(|s| s.render_time_ms)),
                    average_primitives: mean(recent.iter().map(|s| s.primitive_count as f32)),
                };
                (*kind, stats)
            })
            .collect();

        PerformanceStats {
            sample_count: self.metrics.len(),
            average_render_time_ms: mean(window.iter().map(|m| m.render_time_ms)),
            average_frame_rate: (!frame_rates.is_empty())
                .then(|| mean(frame_rates.iter().copied())),
            average_memory_bytes: (!memory.is_empty()).then(|| {
                let total: u128 = memory.iter().map(|&bytes| u128::from(bytes)).sum();
                (total / memory.len() as u128) as u64
            }),
            average_effects_count: mean(window.iter().map(|m| m.effects_count as f32)),
            per_kind,
        }
    }

    /// 是否处于降级状态
    pub fn is_performance_degraded(&self) -> bool {
        let stats = self.performance_stats();
        frame_rate_low(&stats) || render_time_high(&stats) || memory_high(&stats)
    }

    /// 优化建议（帧率 → 渲染耗时 → 内存 → 各效果类型）
    pub fn performance_recommendations(&self) -> Vec<Recommendation> {
        let stats = self.performance_stats();
        let mut recommendations = Vec::new();

        if let Some(fps) = stats.average_frame_rate.filter(|_| frame_rate_low(&stats)) {
            recommendations.push(Recommendation {
                category: RecommendationCategory::FrameRate,
                message: format!(
                    "Average frame rate is {fps:.1} fps (below {MIN_FRAME_RATE} fps): \
                     reduce the number of concurrent effects or enable reduced motion"
                ),
            });
        }

        if render_time_high(&stats) {
            recommendations.push(Recommendation {
                category: RecommendationCategory::RenderTime,
                message: format!(
                    "Average render time is {:.1} ms (above {MAX_RENDER_TIME_MS} ms): \
                     rendering performance is degraded, lower particle counts or effect detail",
                    stats.average_render_time_ms
                ),
            });
        }

        if let Some(bytes) = stats.average_memory_bytes.filter(|_| memory_high(&stats)) {
            recommendations.push(Recommendation {
                category: RecommendationCategory::Memory,
                message: format!(
                    "Memory usage is {:.1} MB (above {} MB): release finished effects",
                    bytes as f64 / BYTES_PER_MB as f64,
                    MAX_MEMORY_BYTES / BYTES_PER_MB
                ),
            });
        }

        for (kind, effect) in &stats.per_kind {
            if effect.average_render_time_ms > MAX_EFFECT_RENDER_TIME_MS {
                recommendations.push(Recommendation {
                    category: RecommendationCategory::SlowEffect(*kind),
                    message: format!(
                        "{kind} takes {:.1} ms per render (above {MAX_EFFECT_RENDER_TIME_MS} ms): \
                         simplify or disable this effect type",
                        effect.average_render_time_ms
                    ),
                });
            }
        }

        recommendations
    }

    /// 清空所有缓冲
    pub fn reset(&mut self) {
        self.metrics.clear();
        self.effect_samples.clear();
    }

    /// 全局采样（按时间顺序）
    pub fn metrics(&self) -> impl Iterator<Item = &PerformanceMetrics> {
        self.metrics.iter()
    }

    /// 某类效果的采样数量
    pub fn effect_sample_count(&self, kind: EffectKind) -> usize {
        self.effect_samples.get(&kind).map_or(0, RingBuffer::len)
    }
}

fn frame_rate_low(stats: &PerformanceStats) -> bool {
    stats
        .average_frame_rate
        .is_some_and(|fps| fps < MIN_FRAME_RATE)
}

fn render_time_high(stats: &PerformanceStats) -> bool {
    stats.average_render_time_ms > MAX_RENDER_TIME_MS
}

fn memory_high(stats: &PerformanceStats) -> bool {
    stats
        .average_memory_bytes
        .is_some_and(|bytes| bytes > MAX_MEMORY_BYTES)
}

/// 平均值，空序列为 0
fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f64, 0usize), |(sum, count), v| {
        (sum + f64::from(v), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    // ========== 统计测试 ==========

    #[test]
    fn test_empty_monitor_averages_zero() {
        let monitor = PerformanceMonitor::new();
        let stats = monitor.performance_stats();

        assert_eq!(stats.average_render_time_ms, 0.0);
        assert!(!stats.average_render_time_ms.is_nan());
        assert_eq!(stats.average_frame_rate, None);
        assert_eq!(stats.sample_count, 0);
        assert!(!monitor.is_performance_degraded());
        assert!(monitor.performance_recommendations().is_empty());
    }

    #[test]
    fn test_single_heavy_metric_is_degraded() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_metric(PerformanceMetrics::new(50.0, 10).with_memory_usage(200 * MB));

        assert!(monitor.is_performance_degraded());
        let recommendations = monitor.performance_recommendations();
        assert!(
            recommendations
                .iter()
                .any(|r| r.message.contains("rendering performance"))
        );
        let categories: Vec<_> = recommendations.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                RecommendationCategory::RenderTime,
                RecommendationCategory::Memory
            ]
        );
    }

    #[test]
    fn test_average_uses_recent_window() {
        let mut monitor = PerformanceMonitor::new();
        for _ in 0..30 {
            monitor.record_metric(PerformanceMetrics::new(100.0, 1));
        }
        for _ in 0..METRICS_WINDOW {
            monitor.record_metric(PerformanceMetrics::new(2.0, 1));
        }

        let stats = monitor.performance_stats();
        assert_eq!(stats.average_render_time_ms, 2.0);
        assert_eq!(stats.sample_count, 50);
        assert!(!monitor.is_performance_degraded());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut monitor = PerformanceMonitor::new();
        for i in 0..250 {
            monitor.record_metric(PerformanceMetrics::new(1.0, i));
            monitor.record_effect_performance(EffectKind::Spill, EffectSample::new(1.0, i, 0.0));
        }
        assert_eq!(monitor.metrics().count(), METRICS_CAPACITY);
        assert_eq!(monitor.metrics().next().unwrap().effects_count, 150);
        assert_eq!(
            monitor.effect_sample_count(EffectKind::Spill),
            EFFECT_SAMPLES_CAPACITY
        );
    }

    #[test]
    fn test_frame_rate_only_counts_samples_that_carry_it() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_metric(PerformanceMetrics::new(1.0, 1));
        monitor.record_metric(PerformanceMetrics::new(1.0, 1).with_frame_rate(60.0));
        monitor.record_metric(PerformanceMetrics::new(1.0, 1).with_frame_rate(20.0));

        let stats = monitor.performance_stats();
        assert_eq!(stats.average_frame_rate, Some(40.0));
        assert!(!monitor.is_performance_degraded());

        monitor.record_metric(PerformanceMetrics::new(1.0, 1).with_frame_rate(5.0));
        assert!(monitor.is_performance_degraded());
        assert_eq!(
            monitor.performance_recommendations()[0].category,
            RecommendationCategory::FrameRate
        );
    }

    // ========== 输入清洗测试 ==========

    #[test]
    fn test_bad_numbers_are_sanitized() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_metric(
            PerformanceMetrics::new(f32::NAN, 1)
                .with_frame_rate(f32::INFINITY)
                .at(f64::NAN),
        );
        monitor.record_metric(PerformanceMetrics::new(-5.0, 1).with_frame_rate(-1.0));
        monitor.record_effect_performance(
            EffectKind::GasProduction,
            EffectSample::new(f32::NEG_INFINITY, 3, 0.0),
        );

        let stats = monitor.performance_stats();
        assert_eq!(stats.average_render_time_ms, 0.0);
        assert_eq!(stats.average_frame_rate, None);
        assert_eq!(stats.per_kind[&EffectKind::GasProduction].average_render_time_ms, 0.0);
        assert_eq!(monitor.metrics().next().unwrap().timestamp, 0.0);
        assert!(!monitor.is_performance_degraded());
    }

    // ========== 建议测试 ==========

    #[test]
    fn test_slow_effect_kinds_listed_last_in_kind_order() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_metric(PerformanceMetrics::new(40.0, 2).with_frame_rate(12.0));
        for _ in 0..5 {
            monitor.record_effect_performance(
                EffectKind::TextureChange,
                EffectSample::new(14.0, 80, 0.0),
            );
            monitor.record_effect_performance(
                EffectKind::GasProduction,
                EffectSample::new(25.0, 40, 0.0),
            );
            monitor.record_effect_performance(
                EffectKind::LightEmission,
                EffectSample::new(1.0, 4, 0.0),
            );
        }

        let text = monitor
            .performance_recommendations()
            .iter()
            .map(|r| r.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(text, @r"
        Average frame rate is 12.0 fps (below 30 fps): reduce the number of concurrent effects or enable reduced motion
        Average render time is 40.0 ms (above 16 ms): rendering performance is degraded, lower particle counts or effect detail
        gas_production takes 25.0 ms per render (above 10 ms): simplify or disable this effect type
        texture_change takes 14.0 ms per render (above 10 ms): simplify or disable this effect type
        ");
    }

    #[test]
    fn test_per_kind_window_is_last_ten() {
        let mut monitor = PerformanceMonitor::new();
        for _ in 0..20 {
            monitor.record_effect_performance(EffectKind::Spill, EffectSample::new(50.0, 1, 0.0));
        }
        for _ in 0..EFFECT_WINDOW {
            monitor.record_effect_performance(EffectKind::Spill, EffectSample::new(1.0, 1, 0.0));
        }

        let stats = monitor.performance_stats();
        assert_eq!(stats.per_kind[&EffectKind::Spill].average_render_time_ms, 1.0);
        assert_eq!(stats.per_kind[&EffectKind::Spill].samples, 30);
        assert!(monitor.performance_recommendations().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_metric(PerformanceMetrics::new(99.0, 1));
        monitor.record_effect_performance(EffectKind::Spill, EffectSample::new(99.0, 1, 0.0));
        assert!(monitor.is_performance_degraded());

        monitor.reset();
        assert!(!monitor.is_performance_degraded());
        assert_eq!(monitor.effect_sample_count(EffectKind::Spill), 0);
    }
}
