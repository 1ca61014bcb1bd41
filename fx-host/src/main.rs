//! # fx-host
//!
//! 化学反应视觉效果引擎的无窗口宿主。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p fx-host -- run reaction.json
//! cargo run -p fx-host -- run reaction.json --config fx-host.json --reduce-motion
//! cargo run -p fx-host -- run reaction.json --json > report.json
//! cargo run -p fx-host -- anchors beaker 320 480
//! cargo run -p fx-host -- init-config fx-host.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chem_fx::{VesselShape, attachment};
use clap::{Parser, Subcommand, ValueEnum};
use fx_host::{AppConfig, RunReport, logging};
use tracing::Level;

#[derive(Parser)]
#[command(name = "fx-host")]
#[command(about = "化学反应视觉效果引擎 - 无窗口宿主")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 日志级别（trace/debug/info/warn/error）
    #[arg(long, default_value = "info", global = true)]
    log_level: Level,

    /// 关闭彩色日志
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 用模拟时钟播放效果文件
    Run {
        /// 效果文件（效果描述数组或效果请求数组）
        effects: PathBuf,

        /// 配置文件（默认：fx-host.json）
        #[arg(short, long, default_value = "fx-host.json")]
        config: PathBuf,

        /// 强制减弱动态
        #[arg(long)]
        reduce_motion: bool,

        /// 覆盖模拟帧率
        #[arg(long)]
        fps: Option<u32>,

        /// 覆盖最长模拟时长（秒）
        #[arg(long)]
        max_seconds: Option<f64>,

        /// 以 JSON 输出完整报告
        #[arg(long)]
        json: bool,
    },

    /// 列出容器锚点
    Anchors {
        /// 容器形状
        #[arg(value_enum)]
        shape: ShapeArg,

        /// 容器宽度（像素）
        #[arg(default_value = "200")]
        width: f32,

        /// 容器高度（像素）
        #[arg(default_value = "300")]
        height: f32,
    },

    /// 写出默认配置文件
    InitConfig {
        /// 输出路径（默认：fx-host.json）
        #[arg(default_value = "fx-host.json")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShapeArg {
    Beaker,
    TestTube,
    Flask,
    Generic,
}

impl From<ShapeArg> for VesselShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Beaker => VesselShape::Beaker,
            ShapeArg::TestTube => VesselShape::TestTube,
            ShapeArg::Flask => VesselShape::Flask,
            ShapeArg::Generic => VesselShape::Generic,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level, !cli.no_color);

    if let Err(e) = real_main(cli.command) {
        eprintln!("❌ fx-host 错误: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            effects,
            config,
            reduce_motion,
            fps,
            max_seconds,
            json,
        } => {
            let mut app_config = AppConfig::load(&config);
            if reduce_motion {
                app_config.engine.reduce_motion = Some(true);
            }
            if let Some(fps) = fps {
                app_config.simulation.fps = fps;
            }
            if let Some(max_seconds) = max_seconds {
                app_config.simulation.max_seconds = max_seconds;
            }
            app_config.validate()?;

            let requests = fx_host::read_requests(&effects)?;
            let report = fx_host::run(&app_config, &requests)
                .with_context(|| format!("模拟失败: {}", effects.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Anchors {
            shape,
            width,
            height,
        } => {
            let shape = VesselShape::from(shape);
            println!("{shape:?} ({width}x{height})");
            for point in attachment::resolve(shape, width, height) {
                println!(
                    "  {:<12} {:<8} ({:>7.1}, {:>7.1})  r={:<6.1} priority={}",
                    point.id,
                    format!("{:?}", point.anchor_type),
                    point.position.x,
                    point.position.y,
                    point.radius,
                    point.priority
                );
            }
        }
        Commands::InitConfig { path } => {
            AppConfig::default()
                .save(&path)
                .with_context(|| format!("无法写入配置: {}", path.display()))?;
            println!("✅ 默认配置已写入: {}", path.display());
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("─────────────────────────────────────────────────────");
    println!(
        "模拟完成: {} 帧, {:.2} 秒, 单帧最多 {} 个图元",
        report.frames, report.simulated_seconds, report.peak_primitives
    );
    println!();

    for outcome in &report.outcomes {
        let state = &outcome.state;
        match &state.error {
            Some(error) => println!(
                "  [{}] {} {:?}: {}",
                state.id, outcome.kind, state.status, error
            ),
            None => println!(
                "  [{}] {} {:?} (循环 {} 次)",
                state.id, outcome.kind, state.status, state.cycles
            ),
        }
    }

    let stats = &report.stats;
    println!();
    println!("平均渲染耗时: {:.3} ms", stats.average_render_time_ms);
    if let Some(frame_rate) = stats.average_frame_rate {
        println!("平均帧率: {frame_rate:.1} fps");
    }
    for recommendation in &report.recommendations {
        println!("⚠️  {}", recommendation.message);
    }

    println!();
    if report.failed_count() > 0 {
        println!("❌ {} 个效果渲染失败", report.failed_count());
    } else if report.truncated {
        println!("⚠️  达到最长模拟时长，剩余效果已取消");
    } else {
        println!("✅ 所有效果播放完成");
    }
}
