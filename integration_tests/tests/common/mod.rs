#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use core_plan::CellRecord;

static INIT: Once = Once::new();

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture("test_planner_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test planner config at {}",
            config_path.display()
        );

        std::env::set_var("PLANNER_CONFIG_PATH", &config_path);

        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The 5x5 report table, label row and label column included.
pub fn report_table() -> anyhow::Result<Vec<Vec<CellRecord>>> {
    let contents = std::fs::read_to_string(fixture("report_5x5.json"))?;
    Ok(serde_json::from_str(&contents)?)
}
