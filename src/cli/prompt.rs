use crate::db::{Activity, NewActivity};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use dialoguer::{Input, Select, theme::ColorfulTheme};

pub fn select_user(theme: &ColorfulTheme, usernames: &[String]) -> Result<String> {
    if usernames.is_empty() {
        bail!("No users yet. Add one with `routine user add <USERNAME>`.");
    }

    let index = Select::with_theme(theme)
        .with_prompt("Select user")
        .default(0)
        .items(usernames)
        .interact()
        .context("Failed to select user")?;

    usernames
        .get(index)
        .cloned()
        .context("Selected user is out of range")
}

pub fn prompt_date(theme: &ColorfulTheme, today: NaiveDate) -> Result<NaiveDate> {
    let raw: String = Input::with_theme(theme)
        .with_prompt("Date")
        .default(today.format("%Y-%m-%d").to_string())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| "Use YYYY-MM-DD format (example: 2024-06-10)")
        })
        .interact_text()
        .context("Failed to read date")?;

    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {raw}"))
}

pub fn prompt_flag(theme: &ColorfulTheme, activity: Activity) -> Result<bool> {
    let index = Select::with_theme(theme)
        .with_prompt(activity.label())
        .default(0)
        .items(&["Yes", "No"])
        .interact()
        .with_context(|| format!("Failed to read {} answer", activity.label()))?;

    Ok(index == 0)
}

/// Fills whatever the command line left out by asking on the terminal.
pub fn complete_entry(
    date: Option<NaiveDate>,
    flags: [Option<bool>; 3],
    today: NaiveDate,
) -> Result<NewActivity> {
    let theme = ColorfulTheme::default();

    let date = match date {
        Some(date) => date,
        None => prompt_date(&theme, today)?,
    };

    let mut answers = [false; 3];
    for ((answer, flag), activity) in answers.iter_mut().zip(flags).zip(Activity::ALL) {
        *answer = match flag {
            Some(value) => value,
            None => prompt_flag(&theme, activity)?,
        };
    }

    let [workout, junk_food, yoga] = answers;
    Ok(NewActivity {
        date,
        workout,
        junk_food,
        yoga,
    })
}
