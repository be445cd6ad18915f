use chrono::{DateTime, Utc};

/// Compact Facebook-style relative timestamp: "now", "3m", "5h", "2d",
/// or the full date once a post is more than a week old.
pub fn time_ago(timestamp: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(timestamp);

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else if hours < 24 {
        format!("{}h", hours)
    } else if days < 7 {
        format!("{}d", days)
    } else {
        timestamp.format("%b %-d, %Y at %-I:%M %p").to_string()
    }
}

/// Verbose form for detail views: "Just now", "3 minutes ago", etc.
pub fn verbose_time_ago(timestamp: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(timestamp);

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        if minutes == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", minutes)
        }
    } else if hours < 24 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if days < 7 {
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else {
        timestamp.format("%b %-d, %Y at %-I:%M %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_timestamps_read_as_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now), "now");
        assert_eq!(verbose_time_ago(now), "Just now");
    }

    #[test]
    fn minutes_and_hours_use_compact_units() {
        assert_eq!(time_ago(Utc::now() - Duration::minutes(3)), "3m");
        assert_eq!(time_ago(Utc::now() - Duration::minutes(59)), "59m");
        assert_eq!(time_ago(Utc::now() - Duration::hours(5)), "5h");
        assert_eq!(time_ago(Utc::now() - Duration::days(2)), "2d");
    }

    #[test]
    fn verbose_singular_and_plural() {
        assert_eq!(
            verbose_time_ago(Utc::now() - Duration::minutes(1)),
            "1 minute ago"
        );
        assert_eq!(
            verbose_time_ago(Utc::now() - Duration::hours(5)),
            "5 hours ago"
        );
        assert_eq!(
            verbose_time_ago(Utc::now() - Duration::days(1)),
            "1 day ago"
        );
    }

    #[test]
    fn old_timestamps_fall_back_to_full_date() {
        let old = Utc::now() - Duration::days(30);
        let formatted = time_ago(old);
        assert!(formatted.contains("at"));
        assert!(formatted.contains(&old.format("%Y").to_string()));
    }
}
