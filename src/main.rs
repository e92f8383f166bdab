mod analyzer;
mod api;
mod cli;
mod config;
mod db;
mod error;

use crate::analyzer::{Window, YearScope, report};
use crate::cli::onboard::run_onboarding;
use crate::cli::{Cli, Commands, ConfigCommands, UserCommands, entry_from_args, prompt};
use crate::config::Config;
use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::User { command } => {
            let config = runtime_config(cli.db)?;
            handle_user_command(&config, command)
        }
        Commands::Log {
            user,
            date,
            workout,
            junk_food,
            yoga,
        } => {
            let config = runtime_config(cli.db)?;
            handle_log(&config, user, date, [workout, junk_food, yoga])
        }
        Commands::Insights {
            user,
            window,
            today,
            match_year,
            json,
        } => {
            let config = runtime_config(cli.db)?;
            handle_insights(&config, user, window, today, match_year, json)
        }
        Commands::Serve => {
            let config = runtime_config(cli.db)?;
            run_service(config).await
        }
        Commands::Status => {
            let config = runtime_config(cli.db)?;
            handle_status(&config)
        }
        Commands::Doctor => handle_doctor(),
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_user_command(config: &Config, command: UserCommands) -> Result<()> {
    let database = Database::open(&config.db_path)?;

    match command {
        UserCommands::Add { username } => {
            let username = db::normalize_username(&username)?;
            let id = database.add_user(username)?;
            info!(user = %username, id, "user added");
            println!("User {username} added successfully");
            Ok(())
        }
        UserCommands::List => {
            let usernames = database.list_usernames()?;
            if usernames.is_empty() {
                println!("No users yet");
            }
            usernames.iter().for_each(|name| println!("{name}"));
            Ok(())
        }
    }
}

fn handle_log(
    config: &Config,
    user: Option<String>,
    date: Option<String>,
    flags: [Option<bool>; 3],
) -> Result<()> {
    let database = Database::open(&config.db_path)?;
    let username = resolve_username(&database, user)?;
    let user_id = database.resolve_user_id(&username)?;

    let today = Local::now().date_naive();
    let date = date.as_deref().map(parse_date).transpose()?;
    let entry = match entry_from_args(date, flags, today) {
        Some(entry) => entry,
        None => prompt::complete_entry(date, flags, today)?,
    };

    let existing = database.count_activities_on(user_id, entry.date)?;
    if existing > 0 {
        warn!(
            user = %username,
            date = %entry.date,
            existing,
            "day already has a record; both will count in insights"
        );
    }

    let id = database.insert_activity(user_id, &entry)?;
    info!(user = %username, date = %entry.date, id, "activity logged");
    println!("Activity logged successfully");

    Ok(())
}

fn handle_insights(
    config: &Config,
    user: Option<String>,
    window: Option<Window>,
    today: Option<String>,
    match_year: Option<bool>,
    json: bool,
) -> Result<()> {
    let database = Database::open(&config.db_path)?;
    let username = resolve_username(&database, user)?;
    let user_id = database.resolve_user_id(&username)?;

    let window = window.unwrap_or(config.default_window);
    let today = parse_optional_date(today)?;
    let scope = match_year
        .map(YearScope::from_flag)
        .unwrap_or_else(|| config.year_scope());

    let records = database.fetch_activities(user_id)?;
    let summary = analyzer::summarize(&records, window, today, scope);
    if summary.is_empty() {
        info!(user = %username, %window, %today, "no records in window");
    }

    if json {
        let payload = serde_json::to_string_pretty(&report::to_json(&username, &summary))
            .context("Failed to serialize insights JSON")?;
        println!("{payload}");
    } else {
        print!("{}", report::render_text(&username, &summary));
    }

    Ok(())
}

fn handle_status(config: &Config) -> Result<()> {
    let database = Database::open(&config.db_path)?;

    println!("routine status");
    println!("- config: {}", Config::config_path().display());
    println!("- database: {}", config.db_path.display());
    println!("- users: {}", database.user_count()?);
    println!("- activity records: {}", database.activity_count()?);
    println!("- default window: {}", config.default_window);
    println!("- match year: {}", config.match_year);

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path();
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = Config::load().unwrap_or_else(|error| {
        if config_path.exists() {
            println!("[WARN] config.json unreadable, using defaults: {error:#}");
            issues.push("config unreadable".to_string());
        }
        Config::default()
    });

    match Database::open(&config.db_path) {
        Ok(database) => {
            println!("[OK] SQLite reachable: {}", config.db_path.display());
            match database.list_usernames() {
                Ok(names) if names.is_empty() => {
                    println!("[WARN] no users yet, add one with `routine user add`");
                    issues.push("no users".to_string());
                }
                Ok(names) => println!("[OK] {} user(s) registered", names.len()),
                Err(error) => {
                    println!("[WARN] failed to read users: {error}");
                    issues.push("users unreadable".to_string());
                }
            }
        }
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    if config.match_year {
        println!("[OK] week/month insights only count the current year");
    } else {
        println!("[OK] week/month insights match across years (set insights.match_year to change)");
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let _ = Database::open(&config.db_path)?;

    let shared_config = Arc::new(config);
    info!(db = %shared_config.db_path.display(), "routine service started");

    tokio::select! {
        api_result = api::run_server(Arc::clone(&shared_config)) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_username(database: &Database, user: Option<String>) -> Result<String> {
    match user {
        Some(name) => Ok(name),
        None => {
            let usernames = database.list_usernames()?;
            prompt::select_user(&ColorfulTheme::default(), &usernames)
        }
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {input}. Example: 2024-06-10"))
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    Ok(input
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Local::now().date_naive()))
}

fn runtime_config(db_override: Option<std::path::PathBuf>) -> Result<Config> {
    let mut config = load_or_default_config()?;
    if let Some(path) = db_override {
        config.db_path = path;
    }

    Ok(config)
}

fn load_or_default_config() -> Result<Config> {
    if Config::config_path().exists() {
        return Config::load();
    }

    let config = Config::default();
    config.ensure_bootstrap_files()?;
    config.save()?;
    Ok(config)
}
