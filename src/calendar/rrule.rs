/// iCalendar recurrence rules for habit events

use chrono::{DateTime, Utc};

use crate::domain::Day;

/// Build the RRULE for a habit repeating on `days`
///
/// No days, or all seven, repeat daily. Duplicate days are collapsed.
pub fn recurrence_rule(days: &[Day], repeat_until: Option<DateTime<Utc>>) -> String {
    let mut codes: Vec<&str> = Vec::with_capacity(days.len());
    for day in days {
        let code = day.rrule_code();
        if !codes.contains(&code) {
            codes.push(code);
        }
    }

    let mut rule = if codes.is_empty() || codes.len() == Day::ALL.len() {
        String::from("RRULE:FREQ=DAILY")
    } else {
        format!("RRULE:FREQ=WEEKLY;BYDAY={}", codes.join(","))
    };

    if let Some(until) = repeat_until {
        rule.push_str(&format!(";UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
    }

    rule
}
