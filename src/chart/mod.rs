//! Command usage bar chart for the terminal.
//!
//! Draws one horizontal bar per label. The scale starts at zero and its
//! ticks are whole numbers, so the longest bar always belongs to the largest
//! count and a zero count draws nothing.

use colored::Colorize;

use crate::client::CommandStats;
use crate::panel::escape_controls;

/// Chart title shown above the bars.
pub const TITLE: &str = "Command Usage";

const BAR: char = '█';

/// Render `stats` as a bar chart whose longest bar is `width` cells.
pub fn render_bar_chart(stats: &CommandStats, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", TITLE.bold().cyan()));

    let pairs: Vec<(String, f64)> = stats
        .pairs()
        .map(|(label, value)| (escape_controls(label), value))
        .collect();
    if pairs.is_empty() {
        out.push_str(&format!("  {}\n", "no command usage yet".dimmed()));
        return out;
    }

    let label_width = pairs
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    let scale_max = axis_max(pairs.iter().map(|(_, v)| *v));

    for (label, value) in &pairs {
        let cells = bar_cells(*value, scale_max, width);
        let bar: String = std::iter::repeat_n(BAR, cells).collect();
        out.push_str(&format!(
            "  {:<label_width$} │{} {}\n",
            label,
            bar.blue(),
            format_value(*value),
        ));
    }

    out.push_str(&format!(
        "  {:<label_width$} └{}\n",
        "",
        "─".repeat(width + 1)
    ));
    out.push_str(&format!(
        "  {:<label_width$}  0{:>w$}\n",
        "",
        format_value(scale_max),
        w = width,
    ));
    out
}

/// Top of the axis: the largest value rounded up to a whole step of 1.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    max.ceil().max(1.0)
}

/// Number of bar cells for `value` on a zero-based axis ending at `scale_max`.
fn bar_cells(value: f64, scale_max: f64, width: usize) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    ((value / scale_max) * width as f64).round() as usize
}

/// Whole numbers without a decimal point, everything else with one digit.
fn format_value(value: f64) -> String {
    if !value.is_finite() {
        "-".to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(items: &[(&str, f64)]) -> CommandStats {
        CommandStats {
            labels: items.iter().map(|(l, _)| l.to_string()).collect(),
            values: items.iter().map(|(_, v)| *v).collect(),
        }
    }

    #[test]
    fn bars_are_proportional_to_largest_value() {
        let chart = render_bar_chart(
            &stats(&[("Balance", 40.0), ("Transfer", 20.0), ("Call", 0.0)]),
            40,
        );
        assert!(chart.contains(TITLE));
        assert!(chart.contains(&BAR.to_string().repeat(40)));
        assert!(!chart.contains(&BAR.to_string().repeat(41)));
        assert!(chart.contains(&BAR.to_string().repeat(20)));
    }

    #[test]
    fn axis_starts_at_zero_with_whole_ticks() {
        assert_eq!(axis_max([4.2, 1.0].into_iter()), 5.0);
        assert_eq!(axis_max([0.0].into_iter()), 1.0);
        assert_eq!(axis_max(std::iter::empty()), 1.0);
    }

    #[test]
    fn invalid_values_draw_empty_bars() {
        assert_eq!(bar_cells(-3.0, 10.0, 20), 0);
        assert_eq!(bar_cells(f64::NAN, 10.0, 20), 0);
        assert_eq!(bar_cells(f64::INFINITY, 10.0, 20), 0);
        assert_eq!(bar_cells(5.0, 10.0, 20), 10);
    }

    #[test]
    fn labels_are_escaped() {
        let chart = render_bar_chart(&stats(&[("\x1b[2Jwipe", 3.0)]), 10);
        assert!(chart.contains("\\u{1b}[2Jwipe"));
        assert!(!chart.contains("\x1b[2J"));
    }

    #[test]
    fn empty_stats_render_placeholder() {
        let chart = render_bar_chart(&CommandStats::default(), 30);
        assert!(chart.contains("no command usage yet"));
    }

    #[test]
    fn format_value_drops_needless_decimals() {
        assert_eq!(format_value(45.0), "45");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(f64::NAN), "-");
    }
}
