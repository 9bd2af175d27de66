//! `learnmate chat` — Interactive or single-message chat mode.

use learnmate_config::AppConfig;
use learnmate_core::plan::StructuredPlan;
use learnmate_core::store::TurnStore;
use learnmate_core::turn::PrincipalId;
use learnmate_engine::{ChatEngine, ExchangeError};
use learnmate_store::{InMemoryStore, SqliteStore};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    message: Option<String>,
    user: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for the credential early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    export GEMINI_API_KEY='...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let store = build_store(&config).await?;
    let generator = learnmate_providers::from_config(&config);

    let mut engine = ChatEngine::new(generator, store)
        .with_temperature(config.provider.temperature)
        .with_timeout(Duration::from_secs(config.provider.timeout_secs));
    if let Some(max) = config.provider.max_output_tokens {
        engine = engine.with_max_output_tokens(max);
    }

    let principal = PrincipalId::new(user);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = engine.exchange(&principal, &msg).await;
        eprint!("\r             \r");
        print_outcome(result)?;
    } else {
        // Interactive mode
        println!();
        println!("  Learnmate — Interactive Mode");
        println!();
        println!("  Model:  {}", config.provider.model);
        println!("  Store:  {}", config.store.backend);
        println!("  User:   {}", principal);
        println!();
        println!("  Type your message and press Enter.");
        println!("  Type 'exit' or Ctrl+C to quit.");
        println!();

        let stdin = std::io::stdin();
        print!("  You > ");
        std::io::stdout().flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                print!("  You > ");
                std::io::stdout().flush()?;
                continue;
            }
            if line == "exit" || line == "quit" {
                break;
            }

            eprint!("  ...");
            let result = engine.exchange(&principal, line).await;
            eprint!("\r     \r");
            println!();
            if let Err(e) = print_outcome(result) {
                eprintln!("  [Error] {e}");
            }
            println!();

            print!("  You > ");
            std::io::stdout().flush()?;
        }

        println!();
        println!("  Goodbye!");
        println!();
    }

    Ok(())
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn TurnStore>, Box<dyn std::error::Error>> {
    match config.store.backend.as_str() {
        "in_memory" => Ok(Arc::new(InMemoryStore::new())),
        _ => {
            let path = config.store_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let path = path
                .to_str()
                .ok_or("store path is not valid UTF-8")?
                .to_string();
            let store = SqliteStore::new(&path)
                .await
                .map_err(|e| format!("Failed to open turn store at {path}: {e}"))?;
            Ok(Arc::new(store))
        }
    }
}

fn print_outcome(
    result: Result<StructuredPlan, ExchangeError>,
) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(plan) => {
            print_plan(&plan);
            Ok(())
        }
        Err(ExchangeError::NotConfigured(reason)) => {
            Err(format!("Generation backend not configured: {reason}").into())
        }
        Err(e) => Err(e.to_string().into()),
    }
}

/// Render a plan: the message first, then each non-empty section.
fn print_plan(plan: &StructuredPlan) {
    for line in plan.message.lines() {
        println!("  {line}");
    }

    let sections: [(&str, &[String]); 4] = [
        ("Checklist", &plan.checklist),
        ("Roadmap", &plan.roadmap),
        ("Schedule", &plan.schedule),
        ("Resources", &plan.resources),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("  {title}:");
        for item in items {
            println!("   - {item}");
        }
    }
}
