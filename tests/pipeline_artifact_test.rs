use anyhow::Result;
use heart_risk_form::core::inference::InferenceInvoker;
use heart_risk_form::core::validator::validate;
use heart_risk_form::core::{InputRecord, RiskLabel};
use heart_risk_form::startup::build_app;
use heart_risk_form::utils::error::ErrorCategory;
use heart_risk_form::utils::validation::Validate;
use heart_risk_form::{LocalStorage, RiskPipeline, TomlConfig};
use std::sync::Arc;
use tempfile::TempDir;

fn sample_model_path() -> String {
    format!("{}/models/heart_pipeline.json", env!("CARGO_MANIFEST_DIR"))
}

fn input(pairs: &[(&str, &str)]) -> InputRecord {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

fn base_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("age", "45"),
        ("sex", "1"),
        ("cp", "2"),
        ("trestbps", "130"),
        ("chol", "250"),
        ("fbs", "0"),
        ("restecg", "1"),
        ("thalach", "150"),
        ("exang", "0"),
        ("oldpeak", "2.5"),
        ("slope", "1"),
        ("ca", "0"),
        ("thal", "2"),
    ]
}

#[tokio::test]
async fn test_sample_artifact_loads_and_predicts() -> Result<()> {
    let pipeline = RiskPipeline::load(&LocalStorage::default(), &sample_model_path()).await?;
    assert_eq!(pipeline.name(), "dt_heart_pipeline");
    assert_eq!(pipeline.model_kind(), "decision_tree");
    assert!(pipeline.supports_probability());

    let invoker = InferenceInvoker::new(Arc::new(pipeline));

    let record = validate(&input(&base_pairs())).expect("valid record");
    let prediction = invoker.run(&record)?;
    assert_eq!(prediction.label, RiskLabel::AtRisk);
    assert!((prediction.probability.unwrap() - 0.88).abs() < 1e-9);

    // 典型無症狀胸痛 + 無阻塞血管 + 高 ST 壓低
    let mut pairs = base_pairs();
    pairs[2] = ("cp", "0");
    let record = validate(&input(&pairs)).expect("valid record");
    let prediction = invoker.run(&record)?;
    assert_eq!(prediction.label, RiskLabel::NotAtRisk);
    let p = prediction.probability.unwrap();
    assert!((0.0..=1.0).contains(&p));
    Ok(())
}

#[tokio::test]
async fn test_every_valid_record_gets_binary_label_and_bounded_probability() -> Result<()> {
    let pipeline = RiskPipeline::load(&LocalStorage::default(), &sample_model_path()).await?;
    let invoker = InferenceInvoker::new(Arc::new(pipeline));

    for cp in ["0", "1", "2", "3"] {
        for ca in ["0", "1", "2", "3"] {
            for oldpeak in ["0", "0.5", "4.2", "10"] {
                let mut pairs = base_pairs();
                pairs[2] = ("cp", cp);
                pairs[9] = ("oldpeak", oldpeak);
                pairs[11] = ("ca", ca);
                let record = validate(&input(&pairs)).expect("valid record");
                let prediction = invoker.run(&record)?;
                assert!(matches!(prediction.label.code(), 0 | 1));
                let p = prediction.probability.unwrap();
                assert!((0.5..=1.0).contains(&p), "max-class probability {}", p);
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_malformed_artifacts_are_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    let cases = [
        ("not_json.json", "this is not json".to_string(), ErrorCategory::Artifact),
        (
            "bad_child.json",
            r#"{
                "format_version": 1,
                "name": "bad",
                "preprocessor": {"transformers": [{"kind": "passthrough", "columns": ["age"]}]},
                "model": {"kind": "decision_tree", "classes": [0, 1], "n_features": 1,
                          "nodes": [{"split": {"feature": 0, "threshold": 1.0, "left": 1, "right": 5}},
                                    {"leaf": {"class_counts": [1, 1]}}]}
            }"#
            .to_string(),
            ErrorCategory::Artifact,
        ),
        (
            "bad_width.json",
            r#"{
                "format_version": 1,
                "name": "bad",
                "preprocessor": {"transformers": [{"kind": "passthrough", "columns": ["age", "chol"]}]},
                "model": {"kind": "logistic_regression", "classes": [0, 1], "coef": [1.0], "intercept": 0.0}
            }"#
            .to_string(),
            ErrorCategory::Artifact,
        ),
        (
            "bad_classes.json",
            r#"{
                "format_version": 1,
                "name": "bad",
                "preprocessor": {"transformers": [{"kind": "passthrough", "columns": ["age"]}]},
                "model": {"kind": "linear_svc", "classes": [0, 3], "coef": [1.0], "intercept": 0.0}
            }"#
            .to_string(),
            ErrorCategory::Artifact,
        ),
    ];

    for (name, content, category) in cases {
        tokio::fs::write(temp_dir.path().join(name), content).await?;
        let err = RiskPipeline::load(&storage, name).await.unwrap_err();
        assert_eq!(err.category(), category, "case {}", name);
    }

    let missing = RiskPipeline::load(&storage, "missing.json").await.unwrap_err();
    assert_eq!(missing.category(), ErrorCategory::Io);
    Ok(())
}

#[tokio::test]
async fn test_build_app_from_toml_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("heart-risk.toml");
    let model_path = sample_model_path().replace('\\', "/");

    let config_content = format!(
        r#"
[server]
bind_address = "127.0.0.1:0"
request_timeout_secs = 5

[model]
path = "{}"
"#,
        model_path
    );
    tokio::fs::write(&config_path, config_content).await?;

    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;

    let (_router, addr) = build_app(&config).await?;
    assert_eq!(addr.port(), 0);
    Ok(())
}

#[tokio::test]
async fn test_build_app_fails_for_missing_model() -> Result<()> {
    let config = TomlConfig::from_toml_str("[model]\npath = \"/no/such/pipeline.json\"\n")?;
    let err = build_app(&config).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
    Ok(())
}
