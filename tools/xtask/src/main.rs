//! # xtask - 开发辅助工具
//!
//! ## 命令
//!
//! - `effects-check [path]`: 检查效果文件（解码、数值校验、颜色）
//! - `check-all`: 门禁检查（fmt、clippy、test），最后检查 demos 中的效果文件

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use chem_fx::{EffectRequest, Rgba, VisualEffect, enhance, parse_effects};
use walkdir::WalkDir;

/// `check-all` 依次执行的 cargo 步骤
const GATE_STEPS: &[&[&str]] = &[
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets"],
    &["test", "--workspace"],
];

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "effects-check" => {
            let path = args.next();
            effects_check(path.as_deref())?;
        }
        "check-all" => {
            for step in GATE_STEPS {
                cargo(step)?;
            }
            effects_check(None)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

/// 运行一个 cargo 子命令，失败即中止
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let step = format!("cargo {}", args.join(" "));
    eprintln!("\n==> {step}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  effects-check   检查效果文件
  check-all       运行 fmt、clippy、test，并检查 demos/effects

EFFECTS-CHECK:
  cargo xtask effects-check [path]

  不带参数：检查 demos/effects/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 解码（未知 effect_type、缺失字段）
    - 数值校验（与引擎增强阶段一致，包括数量上限）
    - 颜色值能否被渲染器识别

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo effects-check -> cargo xtask effects-check
"#
    );
}

//=============================================================================
// effects-check 命令实现
//=============================================================================

/// 默认效果目录（相对于 workspace root）
const DEFAULT_EFFECTS_DIR: &str = "demos/effects";

/// 检查结果
#[derive(Default)]
struct EffectsCheckResult {
    files_checked: usize,
    effects_checked: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// 执行效果文件检查
fn effects_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_EFFECTS_DIR));
    if !root.exists() {
        match path {
            Some(p) => anyhow::bail!("路径不存在: {}", p),
            None => anyhow::bail!(
                "默认效果目录不存在: {}\n请在 workspace 根目录运行，或指定效果文件路径",
                root.display()
            ),
        }
    }

    let files = collect_effect_files(&root);
    if files.is_empty() {
        eprintln!("未找到效果文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个效果文件...\n", files.len());

    let mut result = EffectsCheckResult::default();
    for file in &files {
        check_effect_file(file, &mut result);
    }

    print_check_result(&result);

    if !result.errors.is_empty() {
        anyhow::bail!("效果检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有效果文件
fn collect_effect_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个效果文件
fn check_effect_file(file: &Path, result: &mut EffectsCheckResult) {
    let file_id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            result.errors.push(format!("{}: 无法读取文件 - {}", file_id, e));
            return;
        }
    };

    let requests = match decode_requests(&content) {
        Ok(r) => r,
        Err(e) => {
            result.errors.push(format!("{}: {}", file_id, e));
            return;
        }
    };

    for (index, request) in requests.iter().enumerate() {
        result.effects_checked += 1;
        let kind = request.effect.kind();

        if let Err(e) = enhance(&request.effect, &request.schedule) {
            result
                .errors
                .push(format!("{}[{}] {}: {}", file_id, index, kind, e));
        }

        if let Some(color) = effect_color(&request.effect)
            && let Err(e) = Rgba::parse(color)
        {
            result
                .warnings
                .push(format!("{}[{}] {}: {}", file_id, index, kind, e));
        }
    }
}

/// 效果描述数组或效果请求数组
fn decode_requests(content: &str) -> anyhow::Result<Vec<EffectRequest>> {
    match parse_effects(content) {
        Ok(effects) => Ok(effects.into_iter().map(EffectRequest::from).collect()),
        Err(effect_error) => serde_json::from_str::<Vec<EffectRequest>>(content)
            .map_err(|_| anyhow::anyhow!(effect_error)),
    }
}

/// 效果描述中的颜色字段
fn effect_color(effect: &VisualEffect) -> Option<&str> {
    match effect {
        VisualEffect::GasProduction(e) => Some(&e.color),
        VisualEffect::LightEmission(e) => Some(&e.color),
        VisualEffect::FoamProduction(e) => Some(&e.color),
        VisualEffect::TextureChange(e) => Some(&e.color),
        VisualEffect::TemperatureChange(_)
        | VisualEffect::StateChange(_)
        | VisualEffect::VolumeChange(_)
        | VisualEffect::Spill(_) => None,
    }
}

/// 输出检查结果
fn print_check_result(result: &EffectsCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个文件, {} 个效果",
        result.files_checked, result.effects_checked
    );
    eprintln!();

    for error in &result.errors {
        eprintln!("[ERROR] {}", error);
    }
    for warning in &result.warnings {
        eprintln!("[WARN] {}", warning);
    }

    eprintln!();
    if !result.errors.is_empty() {
        eprintln!(
            "❌ {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        );
    } else if !result.warnings.is_empty() {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings.len());
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
