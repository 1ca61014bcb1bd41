//! # Config 模块
//!
//! 宿主配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (fx-host.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use chem_fx::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 宿主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 效果引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 模拟时钟配置
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// 模拟时钟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 模拟帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 最长模拟时长（秒），用于截断循环效果
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,

    /// 平台"减弱动态"偏好（引擎配置未显式指定时生效）
    #[serde(default)]
    pub platform_reduced_motion: bool,

    /// 每帧结束后移除已终止的实例
    #[serde(default = "default_prune_finished")]
    pub prune_finished: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            max_seconds: default_max_seconds(),
            platform_reduced_motion: false,
            prune_finished: default_prune_finished(),
        }
    }
}

// 默认值函数
fn default_fps() -> u32 {
    60
}

fn default_max_seconds() -> f64 {
    30.0
}

fn default_prune_finished() -> bool {
    true
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    tracing::warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 模拟步长（秒）
    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.simulation.fps.max(1))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.engine.container_size;
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            return Err(ConfigError::ValidationFailed(format!(
                "容器尺寸必须为正数: {}x{}",
                size.width, size.height
            )));
        }

        if let Some(center) = self.engine.vessel_center
            && !(center.x.is_finite() && center.y.is_finite())
        {
            return Err(ConfigError::ValidationFailed(
                "容器中心坐标必须是有限数值".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.engine.degraded_detail) {
            return Err(ConfigError::ValidationFailed(
                "降级细节系数必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if self.simulation.fps == 0 || self.simulation.fps > 240 {
            return Err(ConfigError::ValidationFailed(format!(
                "模拟帧率必须在 1 - 240 之间: {}",
                self.simulation.fps
            )));
        }

        if !self.simulation.max_seconds.is_finite() || self.simulation.max_seconds <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "最长模拟时长必须为正数".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chem_fx::{Size, VesselShape};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.simulation.fps, 60);
        assert_eq!(config.simulation.max_seconds, 30.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = AppConfig::default();
        config.engine.vessel_shape = VesselShape::TestTube;
        let json = serde_json::to_string_pretty(&config).unwrap();

        let loaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"simulation":{"fps":30}}"#).unwrap();
        assert_eq!(config.simulation.fps, 30);
        assert_eq!(config.simulation.max_seconds, 30.0);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("missing.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fx-host.json");

        let mut config = AppConfig::default();
        config.simulation.fps = 24;
        config.engine.reduce_motion = Some(true);
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path), config);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.engine.container_size = Size::new(0.0, 300.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));

        config.engine.container_size = Size::new(200.0, 300.0);
        config.engine.degraded_detail = 1.5;
        assert!(config.validate().is_err());

        config.engine.degraded_detail = 0.5;
        config.simulation.fps = 0;
        assert!(config.validate().is_err());

        config.simulation.fps = 60;
        config.simulation.max_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_interval() {
        let mut config = AppConfig::default();
        config.simulation.fps = 50;
        assert!((config.frame_interval() - 0.02).abs() < 1e-12);
    }
}
