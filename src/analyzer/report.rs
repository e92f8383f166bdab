use crate::analyzer::{ActivitySummary, WindowSummary};
use serde_json::{Value, json};

const BAR_WIDTH: u64 = 40;
pub const EMPTY_WINDOW_MESSAGE: &str = "No data available for the selected period";

pub fn render_text(username: &str, summary: &WindowSummary) -> String {
    match summary {
        WindowSummary::Empty { window } => {
            format!("Insights for {username} ({window})\n\n{EMPTY_WINDOW_MESSAGE}\n")
        }
        WindowSummary::Data(summary) => format!(
            "Insights for {username} ({} as of {})\n- Records: {}\n- Days logged: {}\n\n{}\n\n{}\n",
            summary.window,
            summary.today.format("%Y-%m-%d"),
            summary.records,
            summary.distinct_days,
            render_chart(summary),
            render_ratios(summary)
        ),
    }
}

/// One row per activity with a `#` bar scaled to the largest count.
pub fn render_chart(summary: &ActivitySummary) -> String {
    let max_count = summary
        .activities
        .iter()
        .map(|stat| stat.count)
        .max()
        .unwrap_or_default();
    let label_width = summary
        .activities
        .iter()
        .map(|stat| stat.label.len())
        .max()
        .unwrap_or_default();

    summary
        .activities
        .iter()
        .map(|stat| {
            let width = if max_count == 0 {
                0
            } else {
                (stat.count * BAR_WIDTH).div_ceil(max_count)
            };

            if width == 0 {
                format!("{:<label_width$} | {}", stat.label, stat.count)
            } else {
                format!(
                    "{:<label_width$} | {} {}",
                    stat.label,
                    "#".repeat(width as usize),
                    stat.count
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_ratios(summary: &ActivitySummary) -> String {
    summary
        .activities
        .iter()
        .map(|stat| {
            format!(
                "- {}: {}/{} days ({:.0}%)",
                stat.label,
                stat.count,
                summary.distinct_days,
                stat.ratio * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_json(username: &str, summary: &WindowSummary) -> Value {
    match summary {
        WindowSummary::Empty { window } => json!({
            "username": username,
            "window": window,
            "empty": true,
        }),
        WindowSummary::Data(summary) => json!({
            "username": username,
            "window": summary.window,
            "today": summary.today.format("%Y-%m-%d").to_string(),
            "empty": false,
            "records": summary.records,
            "distinct_days": summary.distinct_days,
            "counts": summary.counts(),
            "activities": summary.activities,
        }),
    }
}
