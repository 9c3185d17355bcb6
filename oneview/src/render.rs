//! Output rendering for the terminal, markdown and JSON.

use anyhow::Result;
use clap::ValueEnum;
use oneview_core::analytics::{FilterCriteria, LeaderboardMetric, MetricId};
use oneview_core::format::{format_currency, format_hours, format_number, format_percent, PLACEHOLDER};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Terminal,
    Md,
    Json,
}

pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Line-oriented printer for the terminal and markdown formats.
pub struct Printer {
    markdown: bool,
}

impl Printer {
    pub fn new(format: Format) -> Self {
        Self {
            markdown: format == Format::Md,
        }
    }

    pub fn title(&self, title: &str) {
        if self.markdown {
            println!("# {title}");
        } else {
            let width = title.chars().count().max(56) + 4;
            println!();
            println!("╭{}╮", "─".repeat(width));
            println!("│{}│", center(title, width));
            println!("╰{}╯", "─".repeat(width));
        }
        println!();
    }

    pub fn section(&self, name: &str) {
        if self.markdown {
            println!("## {name}");
            println!();
        } else {
            println!("{}", name.to_uppercase());
        }
    }

    /// Aligned `label: value` pairs.
    pub fn fields(&self, fields: &[(&str, String)]) {
        if self.markdown {
            for (label, value) in fields {
                println!("- **{label}:** {value}");
            }
        } else {
            let width = fields.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
            for (label, value) in fields {
                println!("   {}  {value}", pad(&format!("{label}:"), width + 1));
            }
        }
        println!();
    }

    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if rows.is_empty() {
            self.note("No rows.");
            return;
        }
        if self.markdown {
            println!("| {} |", headers.join(" | "));
            println!("|{}|", vec!["---"; headers.len()].join("|"));
            for row in rows {
                println!("| {} |", row.join(" | "));
            }
            println!();
            return;
        }

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }
        let line = |cells: Vec<String>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| pad(cell, *w))
                .collect();
            println!("   {}", padded.join("  ").trim_end());
        };
        line(headers.iter().map(|h| h.to_string()).collect());
        line(widths.iter().map(|w| "─".repeat(*w)).collect());
        for row in rows {
            line(row.clone());
        }
        println!();
    }

    pub fn note(&self, text: &str) {
        if self.markdown {
            println!("*{text}*");
        } else {
            println!("   {text}");
        }
        println!();
    }

    pub fn paragraph(&self, text: &str) {
        if self.markdown {
            println!("{text}");
        } else {
            for line in text.lines() {
                println!("   {line}");
            }
        }
        println!();
    }

    pub fn footer(&self) {
        if self.markdown {
            println!("---");
            println!("*Generated by oneview*");
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let left = width.saturating_sub(len) / 2;
    let right = width.saturating_sub(len + left);
    format!("{}{text}{}", " ".repeat(left), " ".repeat(right))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Display value of a KPI.
pub fn metric_value(id: MetricId, value: Option<f64>) -> String {
    match id {
        MetricId::RevenuePerRecruiter | MetricId::RevenuePerHour => format_currency(value),
        MetricId::TotalHours | MetricId::HoursPerHire => format_hours(value),
        MetricId::Utilization => format_percent(value, 1),
        MetricId::TimeToFill => match value {
            Some(days) => format!("{} days", format_number(Some(round1(days)))),
            None => PLACEHOLDER.to_string(),
        },
        MetricId::TotalCalls | MetricId::CallsPerPlacement => format_number(value.map(round1)),
    }
}

/// Display value of a leaderboard score or target.
pub fn leaderboard_value(metric: LeaderboardMetric, value: Option<f64>) -> String {
    match metric {
        LeaderboardMetric::Revenue => format_currency(value),
        LeaderboardMetric::Hours => format_hours(value),
        LeaderboardMetric::Calls | LeaderboardMetric::Placements => format_number(value.map(round1)),
    }
}

/// One-line summary such as `Last 30 days · recruiter mike-chen`.
pub fn describe_filters(filters: &FilterCriteria) -> String {
    let mut parts = vec![filters.effective_date_range().label().to_string()];
    if let Some(recruiter) = &filters.recruiter {
        parts.push(format!("recruiter {recruiter}"));
    }
    if let Some(client) = &filters.client {
        parts.push(format!("client {client}"));
    }
    if let Some(job) = &filters.job {
        parts.push(format!("job {job}"));
    }
    parts.join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneview_core::analytics::DateRange;

    #[test]
    fn test_metric_values() {
        assert_eq!(metric_value(MetricId::TimeToFill, Some(41.25)), "41.3 days");
        assert_eq!(metric_value(MetricId::TimeToFill, None), PLACEHOLDER);
        assert_eq!(metric_value(MetricId::RevenuePerHour, Some(120.4)), "$120");
        assert_eq!(metric_value(MetricId::TotalCalls, Some(1234.0)), "1,234");
    }

    #[test]
    fn test_describe_filters() {
        let filters = FilterCriteria::default()
            .with_date_range(DateRange::Last7Days)
            .with_recruiter("mike-chen");
        assert_eq!(describe_filters(&filters), "Last 7 days · recruiter mike-chen");
        assert_eq!(describe_filters(&FilterCriteria::default()), "Last 30 days");
    }

    #[test]
    fn test_pad_counts_chars() {
        assert_eq!(pad(PLACEHOLDER, 3), format!("{PLACEHOLDER}  "));
        assert_eq!(center("ab", 6), "  ab  ");
    }
}
