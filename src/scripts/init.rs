// src/scripts/init.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{BoardConfig, BoardConfigFile, CONFIG_FILE_NAME};

const API_KEY_PLACEHOLDER: &str = "YOUR_TRELLO_API_KEY";
const API_TOKEN_PLACEHOLDER: &str = "YOUR_TRELLO_API_TOKEN";
const BOARD_ID_PLACEHOLDER: &str = "YOUR_BOARD_ID";

/// Printed whenever no configuration file can be found.
pub fn print_setup_instructions() {
    println!("❌ No sprint-points configuration found");
    println!("💡 Create one with your Trello credentials:");
    println!("   1. Get an API key at https://trello.com/app-key");
    println!("   2. Generate a token from the same page");
    println!("   3. Copy the board id from the board URL (https://trello.com/b/<board id>/...)");
    println!();
    println!("   sprint-points init --api-key <key> --api-token <token> --board-id <id>");
    println!("   sprint-points init --global ...        # Store in ~/.config/sprint-points/config.json");
    println!();
    println!("   Or write ./{} by hand:", CONFIG_FILE_NAME);
    println!("   {{ \"api_key\": \"...\", \"api_token\": \"...\", \"board_id\": \"...\" }}");
}

pub fn run(
    api_key: Option<String>,
    api_token: Option<String>,
    board_id: Option<String>,
    global: bool,
    force: bool,
) -> Result<()> {
    let path = if global {
        BoardConfig::global_path().context("Failed to determine the user config directory")?
    } else {
        BoardConfig::project_path()
    };

    let uses_placeholders = api_key.is_none() || api_token.is_none() || board_id.is_none();
    let file = BoardConfigFile {
        api_key: Some(api_key.unwrap_or_else(|| API_KEY_PLACEHOLDER.to_string())),
        api_token: Some(api_token.unwrap_or_else(|| API_TOKEN_PLACEHOLDER.to_string())),
        board_id: Some(board_id.unwrap_or_else(|| BOARD_ID_PLACEHOLDER.to_string())),
        ..Default::default()
    };

    if !write_config(&path, &file, force)? {
        println!("⚠️  {} already exists", path.display());
        println!("💡 Re-run with --force to overwrite it, or edit it by hand");
        return Ok(());
    }
    println!("✅ Created {}", path.display());

    if !global && ensure_gitignored(Path::new("."))? {
        println!("✅ Added {} to .gitignore", CONFIG_FILE_NAME);
    }

    if uses_placeholders {
        println!("⚠️  Some values are placeholders. Edit {} before running a report", path.display());
    }

    println!();
    println!("🎯 Next steps:");
    println!("   sprint-points status                 # Check Trello connectivity");
    println!("   sprint-points report <sprint>        # Sum points per label");
    Ok(())
}

/// Writes `file` to `path` unless it exists and `force` is off. Returns whether it was written.
pub fn write_config(path: &Path, file: &BoardConfigFile, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    file.write(path)?;
    log::info!("Wrote configuration to {}", path.display());
    Ok(true)
}

/// Appends the credentials file to an existing .gitignore in `dir`.
pub fn ensure_gitignored(dir: &Path) -> Result<bool> {
    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() {
        return Ok(false);
    }
    let mut content = fs::read_to_string(&gitignore_path)
        .context("Failed to read .gitignore")?;
    if content.lines().any(|line| line.trim() == CONFIG_FILE_NAME) {
        return Ok(false);
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format!("\n# sprint-points credentials\n{}\n", CONFIG_FILE_NAME));
    fs::write(&gitignore_path, content)
        .context("Failed to update .gitignore")?;
    Ok(true)
}
