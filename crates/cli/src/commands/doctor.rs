//! `learnmate doctor` — Diagnose configuration and store health.

use learnmate_config::AppConfig;
use learnmate_core::store::TurnStore;
use learnmate_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Learnmate Doctor — Diagnostics");
    println!("==============================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ok    Config file valid");
                Some(config)
            }
            Err(e) => {
                println!("  FAIL  Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  warn  No config file, using defaults (run `learnmate onboard`)");
        AppConfig::load().ok()
    };

    if let Some(config) = config {
        if config.has_api_key() {
            println!("  ok    API key configured");
        } else {
            println!("  warn  No API key (set GEMINI_API_KEY); chat will refuse to generate");
            issues += 1;
        }

        match config.store.backend.as_str() {
            "in_memory" => println!("  ok    Store backend: in_memory (turns not persisted)"),
            _ => {
                let path = config.store_path();
                match path.to_str() {
                    Some(p) => match SqliteStore::new(p).await {
                        Ok(store) => {
                            let count = store.count().await?;
                            println!("  ok    Turn store at {p} ({count} turns)");
                        }
                        Err(e) => {
                            println!("  FAIL  Turn store unavailable at {p}: {e}");
                            issues += 1;
                        }
                    },
                    None => {
                        println!("  FAIL  Store path is not valid UTF-8");
                        issues += 1;
                    }
                }
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
