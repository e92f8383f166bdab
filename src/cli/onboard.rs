use crate::analyzer::Window;
use crate::config::{Config, default_db_path, expand_home};
use crate::db::Database;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

const WINDOWS: [Window; 4] = [Window::Day, Window::Week, Window::Month, Window::Year];

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to routine onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();

    println!("\n[1/4] Database location");
    let db_input: String = Input::with_theme(&theme)
        .with_prompt("  SQLite file for users and activities")
        .default(default_db_path().display().to_string())
        .interact_text()
        .context("Failed to read database path")?;
    let db_path = expand_home(db_input.trim());
    println!("  ✓ {}", db_path.display());

    println!("\n[2/4] Default insights window");
    let window_index = Select::with_theme(&theme)
        .with_prompt("  Window used when --window is omitted")
        .default(1)
        .items(&WINDOWS.map(|window| window.to_string()))
        .interact()
        .context("Failed to select default window")?;
    let default_window = WINDOWS.get(window_index).copied().unwrap_or(Window::Week);
    println!("  ✓ {default_window}");

    println!("\n[3/4] Week and month matching");
    println!("  By default week 11 of any year counts as this year's week 11.");
    let match_year = Confirm::with_theme(&theme)
        .with_prompt("  Only count records from the current year?")
        .default(false)
        .interact()
        .context("Failed to read year matching input")?;

    println!("\n[4/4] Local API port");
    let api_port: u16 = Input::with_theme(&theme)
        .with_prompt("  Port for `routine serve`")
        .default(Config::default().api_port)
        .interact_text()
        .context("Failed to read API port")?;

    let config = Config {
        db_path,
        default_window,
        match_year,
        api_port,
    };

    config.ensure_bootstrap_files()?;
    config.save()?;
    let _ = Database::open(&config.db_path)?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Add a user with: routine user add <USERNAME>");
    println!("──────────────────────────────────────────");

    Ok(config)
}
