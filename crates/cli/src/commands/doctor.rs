//! `aurion doctor` — Diagnose the local setup.

use aurion_config::AppConfig;
use aurion_core::speech::SpeechRecognizer;
use aurion_memory::StoreState;
use aurion_voice::CommandRecognizer;

use super::CmdResult;

pub async fn run() -> CmdResult {
    println!("🩺 Aurion Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `aurion onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (model {}, role {})", config.model, config.default_role);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config file and run doctor again.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key: set GEMINI_API_KEY or api_key in config.toml");
        issues += 1;
    }

    let store_path = config.memory_path();
    match std::fs::read_to_string(&store_path) {
        Ok(content) => match serde_json::from_str::<StoreState>(&content) {
            Ok(state) => println!(
                "  ✅ Conversation store readable ({} conversations)",
                state.conversations.len()
            ),
            Err(e) => {
                println!("  ❌ Conversation store is corrupt ({e}); it will be reset on next write");
                issues += 1;
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("  ✅ Conversation store not created yet: {}", store_path.display());
        }
        Err(e) => {
            println!("  ❌ Conversation store unreadable: {e}");
            issues += 1;
        }
    }

    match CommandRecognizer::from_config(&config.voice) {
        Some(recognizer) if recognizer.is_available().await => {
            println!("  ✅ Voice command available: {}", recognizer.command());
        }
        Some(recognizer) => {
            println!("  ⚠️  Voice command not found: {}", recognizer.command());
            issues += 1;
        }
        None => println!("  ➖ Voice input not configured (optional)"),
    }

    if config.has_api_key() {
        match aurion_providers::build_from_config(&config) {
            Ok(engine) if engine.is_available().await => {
                println!("  ✅ Gemini reachable ({})", config.model);
            }
            Ok(_) => {
                println!("  ❌ Gemini not reachable with the configured key and model");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Engine setup failed: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
