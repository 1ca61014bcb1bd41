//! 日志初始化

use tracing::Level;

/// 初始化全局 tracing subscriber（输出到 stderr）
///
/// 重复调用时保留第一次的设置。
pub fn init(level: Level, ansi: bool) {
    let result = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .try_init();

    if result.is_err() {
        tracing::debug!("日志已初始化，忽略重复设置");
    }
}
