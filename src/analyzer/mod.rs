pub mod report;

use crate::db::{Activity, ActivityRecord};
use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Day,
    Week,
    Month,
    Year,
}

impl Window {
    pub fn as_str(self) -> &'static str {
        match self {
            Window::Day => "day",
            Window::Week => "week",
            Window::Month => "month",
            Window::Year => "year",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Window {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "day" => Ok(Window::Day),
            "week" => Ok(Window::Week),
            "month" => Ok(Window::Month),
            "year" => Ok(Window::Year),
            _ => bail!("Unsupported window: {raw}. Use day, week, month or year"),
        }
    }
}

/// Whether week and month windows also require the year to match.
///
/// `Ignore` compares only the ISO week number or the month number, so a record
/// from week 11 of last year falls into this year's week 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearScope {
    #[default]
    Ignore,
    Match,
}

impl YearScope {
    pub fn from_flag(match_year: bool) -> Self {
        if match_year {
            YearScope::Match
        } else {
            YearScope::Ignore
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityStat {
    pub activity: Activity,
    pub label: String,
    pub count: u64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub window: Window,
    pub today: NaiveDate,
    pub records: u64,
    pub distinct_days: u64,
    pub activities: Vec<ActivityStat>,
}

impl ActivitySummary {
    /// Activity name to "Yes" count, the shape the bar chart consumes.
    pub fn counts(&self) -> BTreeMap<&'static str, u64> {
        self.activities
            .iter()
            .map(|stat| (stat.activity.key(), stat.count))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowSummary {
    Empty { window: Window },
    Data(ActivitySummary),
}

impl WindowSummary {
    pub fn is_empty(&self) -> bool {
        matches!(self, WindowSummary::Empty { .. })
    }
}

pub fn in_window(date: NaiveDate, window: Window, today: NaiveDate, scope: YearScope) -> bool {
    match (window, scope) {
        (Window::Day, _) => date == today,
        (Window::Week, YearScope::Ignore) => date.iso_week().week() == today.iso_week().week(),
        (Window::Week, YearScope::Match) => date.iso_week() == today.iso_week(),
        (Window::Month, YearScope::Ignore) => date.month() == today.month(),
        (Window::Month, YearScope::Match) => {
            date.month() == today.month() && date.year() == today.year()
        }
        (Window::Year, _) => date.year() == today.year(),
    }
}

pub fn summarize(
    records: &[ActivityRecord],
    window: Window,
    today: NaiveDate,
    scope: YearScope,
) -> WindowSummary {
    let filtered = records
        .iter()
        .filter(|record| in_window(record.date, window, today, scope))
        .collect::<Vec<_>>();

    if filtered.is_empty() {
        return WindowSummary::Empty { window };
    }

    let distinct_days = filtered
        .iter()
        .map(|record| record.date)
        .collect::<HashSet<_>>()
        .len() as u64;

    let activities = Activity::ALL
        .into_iter()
        .map(|activity| {
            let count = filtered
                .iter()
                .filter(|record| record.flag(activity))
                .count() as u64;

            ActivityStat {
                activity,
                label: activity.label().to_string(),
                count,
                ratio: count as f64 / distinct_days as f64,
            }
        })
        .collect::<Vec<_>>();

    WindowSummary::Data(ActivitySummary {
        window,
        today,
        records: filtered.len() as u64,
        distinct_days,
        activities,
    })
}
