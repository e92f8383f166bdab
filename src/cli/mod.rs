pub mod onboard;
pub mod prompt;

use crate::analyzer::Window;
use crate::db::NewActivity;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "routine",
    about = "Daily routine tracker for workout, junk food and yoga"
)]
pub struct Cli {
    /// Use this database file instead of the configured one
    #[arg(long, global = true, env = "ROUTINE_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Log the activities of one day; missing values are asked interactively
    Log {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_parser = parse_yes_no)]
        workout: Option<bool>,
        #[arg(long, value_parser = parse_yes_no)]
        junk_food: Option<bool>,
        #[arg(long, value_parser = parse_yes_no)]
        yoga: Option<bool>,
    },
    Insights {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, value_enum)]
        window: Option<Window>,
        /// Reference date for the window, defaults to today
        #[arg(long)]
        today: Option<String>,
        /// Require the year to match for week and month windows; `--match-year no`
        /// overrides a config that turns it on
        #[arg(long, num_args = 0..=1, default_missing_value = "yes", value_parser = parse_yes_no)]
        match_year: Option<bool>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Serve,
    Status,
    Doctor,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum UserCommands {
    Add { username: String },
    List,
}

pub fn parse_yes_no(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        _ => Err(format!("expected yes or no, got: {raw}")),
    }
}

/// Builds the entry straight from the command line when every flag was given.
/// A missing date means today.
pub fn entry_from_args(
    date: Option<NaiveDate>,
    flags: [Option<bool>; 3],
    today: NaiveDate,
) -> Option<NewActivity> {
    let [Some(workout), Some(junk_food), Some(yoga)] = flags else {
        return None;
    };

    Some(NewActivity {
        date: date.unwrap_or(today),
        workout,
        junk_food,
        yoga,
    })
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, entry_from_args, parse_yes_no};
    use crate::analyzer::Window;
    use chrono::NaiveDate;
    use clap::Parser;

    fn match_year_arg(args: &[&str]) -> Option<bool> {
        let cli = Cli::try_parse_from(args).expect("parse");
        match cli.command {
            Commands::Insights { match_year, .. } => match_year,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn yes_no_values() {
        assert_eq!(parse_yes_no("Yes"), Ok(true));
        assert_eq!(parse_yes_no("n"), Ok(false));
        assert!(parse_yes_no("sometimes").is_err());
    }

    #[test]
    fn parses_log_flags() {
        let cli = Cli::try_parse_from([
            "routine",
            "log",
            "--user",
            "alice",
            "--date",
            "2024-06-10",
            "--workout",
            "yes",
            "--junk-food",
            "no",
            "--yoga",
            "yes",
        ])
        .expect("parse");

        match cli.command {
            Commands::Log {
                user,
                date,
                workout,
                junk_food,
                yoga,
            } => {
                assert_eq!(user.as_deref(), Some("alice"));
                assert_eq!(date.as_deref(), Some("2024-06-10"));
                assert_eq!((workout, junk_food, yoga), (Some(true), Some(false), Some(true)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_insights_window() {
        let cli = Cli::try_parse_from(["routine", "insights", "--window", "month", "--json"])
            .expect("parse");

        match cli.command {
            Commands::Insights { window, json, .. } => {
                assert_eq!(window, Some(Window::Month));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn match_year_can_be_turned_on_or_off() {
        assert_eq!(match_year_arg(&["routine", "insights"]), None);
        assert_eq!(match_year_arg(&["routine", "insights", "--match-year"]), Some(true));
        assert_eq!(
            match_year_arg(&["routine", "insights", "--match-year", "no"]),
            Some(false)
        );
        assert_eq!(
            match_year_arg(&["routine", "insights", "--match-year", "--json"]),
            Some(true)
        );
    }

    #[test]
    fn complete_flags_build_an_entry_dated_today_by_default() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).expect("date");
        let earlier = NaiveDate::from_ymd_opt(2024, 6, 8).expect("date");

        let entry = entry_from_args(None, [Some(true), Some(false), Some(true)], today)
            .expect("all flags given");
        assert_eq!(entry.date, today);
        assert!(entry.workout);
        assert!(!entry.junk_food);
        assert!(entry.yoga);

        let entry = entry_from_args(Some(earlier), [Some(false), Some(false), Some(false)], today)
            .expect("all flags given");
        assert_eq!(entry.date, earlier);
    }

    #[test]
    fn missing_flag_needs_the_interactive_form() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).expect("date");

        assert!(entry_from_args(Some(today), [Some(true), None, Some(true)], today).is_none());
        assert!(entry_from_args(None, [None, None, None], today).is_none());
    }
}
