//! `aurion onboard` — First-time setup.

use aurion_config::AppConfig;

use super::CmdResult;

pub async fn run() -> CmdResult {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();
    let data_dir = config_dir.join("data");

    println!("Aurion — First-Time Setup");
    println!("=========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        println!("✅ Created data directory: {}", data_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set GEMINI_API_KEY or add api_key to {}", config_path.display());
        println!("   2. Optionally set a speech command under [voice]");
        println!("   3. Run: aurion chat\n");
    }

    println!("🎉 Setup complete! Run `aurion chat` to start talking.\n");

    Ok(())
}
