use anyhow::Result;
use sigmos_launcher::config::{LauncherConfig, LogFormat};
use sigmos_launcher::domain::model::HandoffMode;
use sigmos_launcher::utils::validation::Validate;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_example_config_matches_defaults() -> Result<()> {
    let mut config = LauncherConfig::from_toml_str(include_str!("../launcher.example.toml"))?;
    config.validate()?;

    // handoff 預設值依平台而定
    config.server.handoff = HandoffMode::default();
    assert_eq!(config, LauncherConfig::default());
    Ok(())
}

#[tokio::test]
async fn test_load_config_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("launcher.toml");
    std::env::set_var("SIGMOS_LAUNCHER_FILE_TEST_ROOT", "/srv/sigmos");

    tokio::fs::write(
        &config_path,
        r#"
working_dir = "${SIGMOS_LAUNCHER_FILE_TEST_ROOT}"

[interpreter]
candidates = ["python3.11", "python3"]

[dependencies]
libraries = [{ module = "flask" }, { module = "soundfile", package = "SoundFile" }]
verify_after_install = false

[server]
entry_point = "app/server.py"
args = ["--port", "5000"]
handoff = "spawn"
env = { SIGMOS_MODEL = "v1" }

[logging]
format = "json"
"#,
    )
    .await?;

    let config = LauncherConfig::load(&config_path, true)?;
    config.validate()?;

    assert_eq!(config.working_dir, PathBuf::from("/srv/sigmos"));
    assert_eq!(config.interpreter.candidates, vec!["python3.11", "python3"]);
    assert_eq!(config.packages(), vec!["flask", "SoundFile"]);
    assert!(!config.dependencies.verify_after_install);
    assert_eq!(config.server.entry_point, PathBuf::from("app/server.py"));
    assert_eq!(config.server.args, vec!["--port", "5000"]);
    assert_eq!(config.server.handoff, HandoffMode::Spawn);
    assert_eq!(
        config.server.env.get("SIGMOS_MODEL").map(String::as_str),
        Some("v1")
    );
    assert_eq!(config.logging.format, LogFormat::Json);
    // 未指定的區段保留預設值
    assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
    Ok(())
}

#[test]
fn test_unknown_handoff_mode_is_rejected() {
    let result = LauncherConfig::from_toml_str("[server]\nhandoff = \"fork\"\n");
    assert!(result.is_err());
}
