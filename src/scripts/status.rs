// src/scripts/status.rs
use anyhow::{Context, Result};

use crate::config::{mask_secret, BoardConfig, LabelLookup};
use crate::scripts::init::print_setup_instructions;
use crate::trello::TrelloClient;

pub async fn run() -> Result<()> {
    let config = BoardConfig::load().context("Failed to load board configuration")?;
    if !config.any_exists() {
        print_setup_instructions();
        return Ok(());
    }

    let resolved = config.resolve()?;

    println!("📋 Board Configuration (resolved):");
    println!(
        "   Board:        {} (Source: {})",
        resolved.board_id,
        config.source_of(|f| f.board_id.clone()).describe()
    );
    println!(
        "   API key:      {} (Source: {})",
        mask_secret(&resolved.api_key),
        config.source_of(|f| f.api_key.clone()).describe()
    );
    println!(
        "   API token:    {} (Source: {})",
        mask_secret(&resolved.api_token),
        config.source_of(|f| f.api_token.clone()).describe()
    );
    println!(
        "   Base URL:     {} (Source: {})",
        resolved.base_url,
        config.source_of(|f| f.base_url.clone()).describe()
    );
    println!(
        "   Timeout:      {}ms (Source: {})",
        resolved.timeout_ms,
        config.source_of(|f| f.timeout_ms).describe()
    );
    let lookup = match resolved.label_lookup {
        LabelLookup::Board => "board label set",
        LabelLookup::PerLabel => "one request per label",
    };
    println!(
        "   Label lookup: {} (Source: {})",
        lookup,
        config.source_of(|f| f.label_lookup).describe()
    );

    let client = TrelloClient::new(&resolved)?;
    match client.check_status().await {
        Ok(()) => {
            println!("   Status: ✅ Connected to {}", resolved.base_url);
        }
        Err(e) => {
            println!("   Status: ❌ Connection failed");
            println!("   Error details: {}", e);
            println!();
            println!("💡 Troubleshooting tips:");
            println!("   1. Check the API key and token at https://trello.com/app-key");
            println!("   2. Tokens can expire or be revoked; generate a new one if needed");
            println!("   3. Verify network access to {}", resolved.base_url);
        }
    }

    Ok(())
}
