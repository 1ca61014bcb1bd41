//! 无窗口宿主集成测试：配置文件 + 效果文件 → 报告

use std::fs;

use chem_fx::{EffectKind, EffectStatus};
use fx_host::{AppConfig, RunError, read_requests, run};

const REACTION: &str = r#"[
    {"effect_type":"gas_production","gas":"CO2","color":"colorless","intensity":0.6,"duration":1.5},
    {"effect_type":"foam_production","color":"white","density":0.4,"bubble_size":"small","stability":1.0},
    {"effect_type":"temperature_change","delta":12.0}
]"#;

#[test]
fn test_config_and_effects_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("fx-host.json");
    let effects_path = dir.path().join("reaction.json");

    fs::write(
        &config_path,
        r#"{"engine":{"vessel_shape":"beaker","reduce_motion":true},"simulation":{"fps":20}}"#,
    )
    .unwrap();
    fs::write(&effects_path, REACTION).unwrap();

    let config = AppConfig::load(&config_path);
    assert!(config.validate().is_ok());
    assert_eq!(config.engine.reduce_motion, Some(true));

    let requests = read_requests(&effects_path).unwrap();
    let report = run(&config, &requests).unwrap();

    assert!(!report.truncated);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.completed.len(), 3);

    let kinds: Vec<_> = report.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EffectKind::GasProduction,
            EffectKind::FoamProduction,
            EffectKind::TemperatureChange
        ]
    );
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.state.status == EffectStatus::Completed)
    );
}

#[test]
fn test_invalid_effect_color_is_reported_not_fatal() {
    let requests = fx_host::load_requests(
        r#"[
            {"effect_type":"texture_change","texture":"gel","color":"octarine","viscosity":0.3},
            {"effect_type":"volume_change","scale_factor":0.8}
        ]"#,
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.simulation.fps = 10;
    let report = run(&config, &requests).unwrap();

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.outcomes[0].state.status, EffectStatus::Error);
    assert_eq!(report.outcomes[1].state.status, EffectStatus::Completed);
    assert_eq!(report.completed.len(), 1);
}

#[test]
fn test_rejected_list_is_an_error() {
    let requests = fx_host::load_requests(
        r#"[{"effect_type":"volume_change","scale_factor":-2.0}]"#,
    )
    .unwrap();

    let result = run(&AppConfig::default(), &requests);
    assert!(matches!(result, Err(RunError::Effect(_))));
}

#[test]
fn test_report_serializes_to_json() {
    let requests = fx_host::load_requests(REACTION).unwrap();
    let mut config = AppConfig::default();
    config.simulation.fps = 10;

    let report = run(&config, &requests).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["outcomes"][0]["kind"], "gas_production");
    assert_eq!(json["outcomes"][0]["status"], "completed");
    assert!(json["stats"]["sample_count"].as_u64().unwrap() > 0);
}
