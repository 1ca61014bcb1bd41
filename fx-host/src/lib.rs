//! # FX Host
//!
//! `chem-fx` 的无窗口宿主：
//!
//! - [`config`]：宿主配置（引擎配置 + 模拟时钟）
//! - [`logging`]：tracing 初始化
//! - [`runner`]：模拟时钟驱动效果引擎，汇总结果与性能诊断

pub mod config;
pub mod logging;
pub mod runner;

pub use config::{AppConfig, ConfigError, SimulationConfig};
pub use runner::{EffectOutcome, RunError, RunReport, load_requests, read_requests, run};
