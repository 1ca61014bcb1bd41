//! # Engine 模块
//!
//! 效果引擎：一个"挂载的效果层"。
//!
//! 持有一个调度器、一个渲染器、一个性能监控器、已解析的锚点与配置。
//! 宿主只需要：
//! ```rust,ignore
//! let mut engine = EffectEngine::new(EngineConfig::default(), platform_reduced_motion);
//! engine.on_effect_complete(|id| println!("{id} 完成"));
//! engine.set_effects(&effects)?;
//! // 宿主帧回调
//! let frame = engine.frame(now_seconds);
//! draw(&frame.layers);
//! ```
//!
//! 单个实例渲染失败只会让该实例进入 `Error`，不会影响同一帧的其他实例。

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::attachment::{self, AttachmentPoint};
use crate::config::EngineConfig;
use crate::effect::{EffectKind, EffectOverrides, EnhancedVisualEffect, VisualEffect, enhance};
use crate::error::{EffectError, RenderError};
use crate::geometry::Size;
use crate::performance::{EffectSample, PerformanceMetrics, PerformanceMonitor};
use crate::render::{EffectRenderer, Primitive, ProceduralRenderer, RenderContext};
use crate::scheduler::{EffectEvent, EffectId, EffectScheduler};

/// 效果请求：描述 + 调度覆盖项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRequest {
    pub effect: VisualEffect,
    #[serde(default)]
    pub schedule: EffectOverrides,
}

impl From<VisualEffect> for EffectRequest {
    fn from(effect: VisualEffect) -> Self {
        Self {
            effect,
            schedule: EffectOverrides::default(),
        }
    }
}

/// 单个实例在一帧中的输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectLayer {
    pub id: EffectId,
    pub key: String,
    pub kind: EffectKind,
    pub z_index: i32,
    pub progress: f32,
    pub primitives: Vec<Primitive>,
}

/// 一帧的输出
#[derive(Debug, Clone, Default, Serialize)]
pub struct Frame {
    pub time: f64,
    /// 按 z_index 升序（同层按实例 ID）排列
    pub layers: Vec<EffectLayer>,
    /// 本帧产生的生命周期事件
    pub events: Vec<EffectEvent>,
    /// 本帧渲染耗时（毫秒）
    pub render_time_ms: f32,
}

impl Frame {
    /// 图元总数
    pub fn primitive_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.primitives.len()).sum()
    }
}

/// 效果引擎
pub struct EffectEngine {
    config: EngineConfig,
    reduced_motion: bool,
    anchors: Vec<AttachmentPoint>,
    scheduler: EffectScheduler,
    renderer: Box<dyn EffectRenderer>,
    monitor: PerformanceMonitor,
    /// 当前细节系数
    detail: f32,
    last_frame: Option<f64>,
    /// 宿主上报的内存占用（字节），附加到之后每帧的采样
    memory_usage: Option<u64>,
    mounted: bool,
}

impl std::fmt::Debug for EffectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectEngine")
            .field("config", &self.config)
            .field("reduced_motion", &self.reduced_motion)
            .field("scheduler", &self.scheduler)
            .field("detail", &self.detail)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl EffectEngine {
    /// 挂载引擎
    ///
    /// `platform_prefers_reduced` 是挂载时读取的平台偏好，
    /// 仅在配置没有显式指定 `reduce_motion` 时生效。
    pub fn new(config: EngineConfig, platform_prefers_reduced: bool) -> Self {
        let reduced_motion = config.effective_reduced_motion(platform_prefers_reduced);
        let anchors = resolve_anchors(&config);
        tracing::info!(
            shape = ?config.vessel_shape,
            width = config.container_size.width,
            height = config.container_size.height,
            reduced_motion,
            "效果引擎已挂载"
        );

        Self {
            config,
            reduced_motion,
            anchors,
            scheduler: EffectScheduler::new(),
            renderer: Box::new(ProceduralRenderer),
            monitor: PerformanceMonitor::new(),
            detail: 1.0,
            last_frame: None,
            memory_usage: None,
            mounted: true,
        }
    }

    /// 替换渲染器
    pub fn with_renderer(mut self, renderer: impl EffectRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// 设置完成回调
    pub fn on_effect_complete(&mut self, callback: impl FnMut(EffectId) + 'static) {
        self.scheduler.set_on_complete(callback);
    }

    // ========== 效果管理 ==========

    /// 替换全部效果（使用默认覆盖项）
    pub fn set_effects(
        &mut self,
        effects: &[VisualEffect],
    ) -> Result<Vec<EffectId>, EffectError> {
        let requests: Vec<EffectRequest> =
            effects.iter().cloned().map(EffectRequest::from).collect();
        self.set_requests(&requests)
    }

    /// 替换全部效果
    ///
    /// 先增强全部请求；任何一个失败都不会影响当前正在播放的效果。
    /// 成功后取消旧实例并按顺序添加新实例。
    pub fn set_requests(
        &mut self,
        requests: &[EffectRequest],
    ) -> Result<Vec<EffectId>, EffectError> {
        let enhanced = requests
            .iter()
            .map(|request| enhance(&request.effect, &request.schedule))
            .collect::<Result<Vec<EnhancedVisualEffect>, EffectError>>()
            .inspect_err(|e| tracing::warn!(error = %e, "效果列表被拒绝"))?;

        self.scheduler.cancel_all();
        self.scheduler.prune_finished();
        self.mounted = true;

        Ok(enhanced
            .into_iter()
            .map(|effect| self.scheduler.add(effect))
            .collect())
    }

    /// 追加单个效果
    pub fn add_effect(
        &mut self,
        effect: &VisualEffect,
        overrides: &EffectOverrides,
    ) -> Result<EffectId, EffectError> {
        let enhanced = enhance(effect, overrides)
            .inspect_err(|e| tracing::warn!(error = %e, "效果被拒绝"))?;
        self.mounted = true;
        Ok(self.scheduler.add(enhanced))
    }

    /// 取消单个效果
    pub fn cancel(&mut self, id: EffectId) -> bool {
        self.scheduler.cancel(id)
    }

    /// 移除已终止的实例
    pub fn prune_finished(&mut self) -> usize {
        self.scheduler.prune_finished()
    }

    // ========== 帧驱动 ==========

    /// 推进一帧并渲染所有可见实例
    pub fn frame(&mut self, now: f64) -> Frame {
        let mut events = self.scheduler.tick(now);
        if !self.mounted {
            return Frame {
                time: now,
                events,
                ..Frame::default()
            };
        }

        let frame_start = Instant::now();
        let size = self.config.container_size;
        let mut visible: Vec<_> = self.scheduler.live().collect();
        visible.sort_by_key(|(effect, state)| (effect.schedule.z_index, state.id));

        let mut layers = Vec::with_capacity(visible.len());
        let mut failures: Vec<(EffectId, RenderError)> = Vec::new();

        for (effect, state) in visible {
            let anchor = self.anchor_for(effect);
            let ctx = RenderContext::new(state.progress, &anchor, size)
                .with_reduced_motion(self.reduced_motion)
                .with_detail(self.detail)
                .with_seed(state.id.value());

            let started = Instant::now();
            let result = render_isolated(self.renderer.as_ref(), effect, &ctx);
            let elapsed_ms = started.elapsed().as_secs_f32() * 1000.0;

            match result {
                Ok(primitives) => {
                    self.monitor.record_effect_performance(
                        effect.effect_kind(),
                        EffectSample::new(elapsed_ms, primitives.len(), now),
                    );
                    layers.push(EffectLayer {
                        id: state.id,
                        key: state.key.clone(),
                        kind: effect.effect_kind(),
                        z_index: effect.schedule.z_index,
                        progress: state.progress,
                        primitives,
                    });
                }
                Err(error) => failures.push((state.id, error)),
            }
        }

        for (id, error) in failures {
            self.scheduler.fail(id, error.to_string());
        }
        events.extend(self.scheduler.take_events());

        let render_time_ms = frame_start.elapsed().as_secs_f32() * 1000.0;
        let mut metrics = PerformanceMetrics::new(render_time_ms, layers.len()).at(now);
        if let Some(previous) = self.last_frame {
            let delta = now - previous;
            if delta > 0.0 {
                metrics = metrics.with_frame_rate((1.0 / delta) as f32);
            }
        }
        if let Some(bytes) = self.memory_usage {
            metrics = metrics.with_memory_usage(bytes);
        }
        self.last_frame = Some(now);
        self.monitor.record_metric(metrics);
        self.update_detail();

        Frame {
            time: now,
            layers,
            events,
            render_time_ms,
        }
    }

    /// 根据性能状态调整细节系数
    fn update_detail(&mut self) {
        if !self.config.auto_degrade {
            return;
        }
        let target = if self.monitor.is_performance_degraded() {
            self.config.degraded_detail.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if target != self.detail {
            if target < self.detail {
                tracing::warn!(detail = target, "渲染性能下降，降低效果细节");
            } else {
                tracing::info!(detail = target, "渲染性能恢复，恢复完整细节");
            }
            self.detail = target;
        }
    }

    /// 选择实例的锚点：显式 id 引用优先，其次按类型
    fn anchor_for(&self, effect: &EnhancedVisualEffect) -> AttachmentPoint {
        let size = self.config.container_size;
        let center = self.config.center();
        match effect.schedule.attachment_point.as_deref() {
            Some(id) => attachment::select_by_id(
                &self.anchors,
                id,
                effect.preferred_anchor(),
                center,
                size,
            ),
            None => attachment::select(&self.anchors, effect.preferred_anchor(), center, size),
        }
    }

    // ========== 宿主事件 ==========

    /// 容器尺寸变化：重新解析锚点
    pub fn resize(&mut self, width: f32, height: f32) {
        self.config.container_size = Size::new(width.max(0.0), height.max(0.0));
        self.anchors = resolve_anchors(&self.config);
        tracing::debug!(width, height, "容器尺寸变化，锚点已重新解析");
    }

    /// 上报内存占用（字节）
    ///
    /// 引擎不测量进程内存；宿主按自己的方式采样后调用，
    /// `None` 表示停止附加内存数据。
    pub fn set_memory_usage(&mut self, bytes: Option<u64>) {
        self.memory_usage = bytes;
    }

    /// 切换减弱动态
    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.reduced_motion = reduced_motion;
    }

    /// 卸载：取消所有实例
    ///
    /// # 返回
    /// 取消事件
    pub fn unmount(&mut self) -> Vec<EffectEvent> {
        self.scheduler.cancel_all();
        self.mounted = false;
        tracing::info!("效果引擎已卸载");
        self.scheduler.take_events()
    }

    // ========== 查询方法 ==========

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn anchors(&self) -> &[AttachmentPoint] {
        &self.anchors
    }

    pub fn scheduler(&self) -> &EffectScheduler {
        &self.scheduler
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// 当前细节系数
    pub fn detail(&self) -> f32 {
        self.detail
    }

    /// 宿主是否需要继续请求帧
    pub fn is_running(&self) -> bool {
        self.mounted && self.scheduler.is_running()
    }
}

impl Drop for EffectEngine {
    fn drop(&mut self) {
        if self.mounted {
            self.scheduler.cancel_all();
        }
    }
}

/// 调用渲染器，把 panic 转换为该实例的渲染错误
fn render_isolated(
    renderer: &dyn EffectRenderer,
    effect: &EnhancedVisualEffect,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    panic::catch_unwind(AssertUnwindSafe(|| renderer.render(effect, ctx))).unwrap_or_else(
        |payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "renderer panicked".to_string());
            Err(RenderError::Failed {
                kind: effect.effect_kind(),
                message,
            })
        },
    )
}

/// 解析锚点并应用中心覆盖
fn resolve_anchors(config: &EngineConfig) -> Vec<AttachmentPoint> {
    let size = config.container_size;
    let mut anchors = attachment::resolve(config.vessel_shape, size.width, size.height);
    if let Some(center) = config.vessel_center {
        for point in anchors.iter_mut().filter(|p| p.id == "center") {
            point.position = center;
        }
    }
    anchors
}
