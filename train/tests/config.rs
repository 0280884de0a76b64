use anyhow::Result;
use noisy_float::prelude::*;
use std::path::Path;
use train::config::{Config, LoadCheckpoint, ModelConfig, RemapConfig};

fn sample_config() -> Result<Config> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("train.json5");
    Config::open(path)
}

#[test]
fn sample_config_parses() -> Result<()> {
    let config = sample_config()?;

    assert!(matches!(
        config.model,
        ModelConfig::Darknet19 { num_classes: None }
    ));
    assert_eq!(config.dataset.input_dim.width, 448);
    assert_eq!(config.dataset.horizontal_flip_prob, Some(r64(0.5)));
    assert_eq!(config.training.batch_size.get(), 32);
    assert!(config.training.shuffle);
    assert!(matches!(
        config.training.load_checkpoint,
        LoadCheckpoint::FromRecent
    ));

    let multi_scale = config.multi_scale.as_ref().unwrap();
    assert_eq!(multi_scale.interval.get(), 10);
    assert_eq!(multi_scale.random_range, (10, 19));

    assert_eq!(config.params.len(), 2);
    assert!(config.params.contains_key("_verbose"));
    Ok(())
}

#[test]
fn yolt_remap_resolves() -> Result<()> {
    let config = sample_config()?;
    let export = config.export.as_ref().unwrap();
    let rules = export.remap.as_ref().unwrap().rules()?;

    assert!(matches!(export.remap, Some(RemapConfig::Yolt)));
    assert_eq!(
        rules.remap("layers.0.1_convbatch.conv.weight").as_deref(),
        Some("layers.0.1_convbatch.conv.weight")
    );
    assert_eq!(rules.remap("layers.1.24_conv.weight"), None);
    Ok(())
}

#[test]
fn minimal_config_uses_defaults() -> Result<()> {
    let text = r#"{
        model: { kind: "Darknet" },
        dataset: { dir: "data", input_dim: { width: 224, height: 224 } },
        logging: { dir: "logs" },
        training: {
            batch_size: 8,
            epochs: 1,
            num_workers: 1,
            lr_schedule: { type: "Constant", lr: 0.001 },
            momentum: 0.9,
            weight_decay: 0.0005,
            device: "cpu",
        },
    }"#;
    let config: Config = json5::from_str(text)?;

    assert!(config.multi_scale.is_none());
    assert!(config.export.is_none());
    assert!(config.params.is_empty());
    assert!(matches!(
        config.training.load_checkpoint,
        LoadCheckpoint::Disabled
    ));
    Ok(())
}
