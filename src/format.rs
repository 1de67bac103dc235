//! Display formatting for durations, counts and upload dates.

use chrono::NaiveDate;

/// `m:ss`, or `h:mm:ss` from one hour up. Negative input formats as zero.
pub fn format_duration(secs: f64) -> String {
  let total = if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 };
  let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// `532 views`, `12.5K views`, `1.2M views`.
pub fn format_views(views: u64) -> String {
  let noun = if views == 1 { "view" } else { "views" };
  format!("{} {}", compact(views), noun)
}

/// `500K subscribers`, `10.2M subscribers`.
pub fn format_subscribers(count: u64) -> String {
  let noun = if count == 1 { "subscriber" } else { "subscribers" };
  format!("{} {}", compact(count), noun)
}

fn compact(n: u64) -> String {
  match n {
    0..=999 => n.to_string(),
    1_000..=999_999 => scaled(n, 1_000.0, "K"),
    1_000_000..=999_999_999 => scaled(n, 1_000_000.0, "M"),
    _ => scaled(n, 1_000_000_000.0, "B"),
  }
}

fn scaled(n: u64, unit: f64, suffix: &str) -> String {
  let value = format!("{:.1}", n as f64 / unit);
  let value = value.strip_suffix(".0").unwrap_or(&value);
  format!("{}{}", value, suffix)
}

/// Age of `date` relative to `today`, e.g. `3 months ago`.
pub fn format_upload_date(date: NaiveDate, today: NaiveDate) -> String {
  let days = (today - date).num_days();
  let (n, unit) = match days {
    i64::MIN..=0 => return "today".to_string(),
    1 => return "yesterday".to_string(),
    2..=6 => (days, "day"),
    7..=29 => (days / 7, "week"),
    30..=364 => (days / 30, "month"),
    _ => (days / 365, "year"),
  };
  if n == 1 { format!("1 {} ago", unit) } else { format!("{} {}s ago", n, unit) }
}
