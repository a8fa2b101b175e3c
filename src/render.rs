//! Terminal rendering for chosei types.

use chosei_core::calendar::{CalendarDay, DateRangeSelector, WEEKDAY_LABELS};
use chosei_core::directory::DirectorySearch;
use chosei_core::schedule::{Availability, RowHighlight, ScheduleGrid};
use chrono::{Datelike, Weekday};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

fn color_weekday(text: &str, weekday: Weekday) -> String {
    match weekday {
        Weekday::Sun => text.red().to_string(),
        Weekday::Sat => text.blue().to_string(),
        _ => text.to_string(),
    }
}

fn render_cell(selector: &DateRangeSelector, day: &CalendarDay) -> String {
    let text = format!("{:>2}", day.day_number);

    if selector.is_in_range(&day.full_date) {
        return text.black().on_cyan().to_string();
    }
    if !day.is_current_month() {
        return text.dimmed().to_string();
    }

    let text = color_weekday(&text, day.full_date.weekday());
    if day.is_today {
        text.bold().underline().to_string()
    } else {
        text
    }
}

impl Render for DateRangeSelector {
    fn render(&self) -> String {
        let mut lines = vec![format!("   {}", self.visible_month().title().bold())];

        let header: Vec<String> = WEEKDAY_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| match i {
                0 => label.red().to_string(),
                6 => label.blue().to_string(),
                _ => label.to_string(),
            })
            .collect();
        lines.push(format!("  {}", header.join(" ")));

        let days = self.days();
        for week in days.chunks(7) {
            let cells: Vec<String> = week.iter().map(|day| render_cell(self, day)).collect();
            lines.push(format!("  {}", cells.join(" ")));
        }

        if let Some(range) = self.range().finalized() {
            lines.push(String::new());
            lines.push(format!(
                "  選択期間: {} ({}日間)",
                range.to_string().cyan(),
                range.days()
            ));
        }

        lines.join("\n")
    }
}

fn render_availability(availability: Availability) -> String {
    match availability {
        Availability::Available => availability.symbol().green().to_string(),
        _ => availability.symbol().red().to_string(),
    }
}

impl Render for ScheduleGrid {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        let names: Vec<String> = self
            .attendees
            .iter()
            .map(|a| a.label().bold().to_string())
            .collect();
        lines.push(format!("{:<6} {:<12} {}", "日付", "時間", names.join("  ")));

        for (i, slot) in self.slots.iter().enumerate() {
            // Date cells span consecutive rows of the same date.
            let date = match self.date_span(i) {
                Some(_) => slot.window.date.to_string(),
                None => String::new(),
            };
            let time = slot.window.time.to_string();

            let cells: Vec<String> = self
                .attendees
                .iter()
                .map(|a| {
                    let width = a.label().chars().count();
                    let pad = " ".repeat(width.saturating_sub(1));
                    format!("{}{}", render_availability(slot.availability_of(&a.email)), pad)
                })
                .collect();

            let row = format!("{:<12} {}", time, cells.join("  "));
            let row = match self.highlight(slot) {
                RowHighlight::Target => format!("{} {}", "★".yellow(), row.bold()),
                RowHighlight::EveryoneAvailable => format!("{} {}", "✓".green(), row),
                RowHighlight::None => format!("  {row}"),
            };
            lines.push(format!("{:<6}{}", date, row));
        }

        lines.join("\n")
    }
}

impl Render for DirectorySearch {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        if let Some(summary) = self.match_summary() {
            lines.push(summary.dimmed().to_string());
        }
        if let Some(empty) = self.empty_message() {
            lines.push(format!("   {}", empty.dimmed()));
            return lines.join("\n");
        }

        for user in self.filtered() {
            let mark = if self.is_selected(&user.id) {
                "●".green().to_string()
            } else {
                "○".dimmed().to_string()
            };
            lines.push(format!(
                "   {} {} {}",
                mark,
                user.display_name,
                user.user_principal_name.dimmed()
            ));
        }

        lines.join("\n")
    }
}
