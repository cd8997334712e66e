//! Quick-add text parser.
//!
//! Splits one line of French free text such as `Dentiste, jeudi 14h30` or
//! `appeler Paul demain soir` into a task label and an optional due date.
//!
//! # Invariants
//! - Deterministic for a given `now`; never reads the clock itself.
//! - Never panics on out-of-range dates or times; they yield no due date.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_HOUR: u32 = 12;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:à\s*)?([0-9]{1,2})[hH]([0-9]{0,2})").expect("valid time regex"));

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(lundi|mardi|mercredi|jeudi|vendredi|samedi|dimanche)")
        .expect("valid weekday regex")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([0-9]{1,2})\s*(jan|fév|mar|avr|mai|juin|juil|aoû|sep|oct|nov|déc)[^\s0-9]*(?:\s+([0-9]{4}))?",
    )
    .expect("valid date regex")
});

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)((?:la\s+)?semaine\s+prochaine|(?:l['’]|aujourd['’])?hui|demain|après\s*demain|ce\s*soir|cet\s*après\s*midi|midi)",
    )
    .expect("valid relative date regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Result of `parse_quick_add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub label: String,
    pub due: Option<NaiveDateTime>,
}

/// Extracts label and due date from quick-add text relative to `now`.
///
/// With a `", "` separator the left part is the label and only the right
/// part is scanned. Otherwise recognized fragments are stripped from the
/// label. Precedence: explicit date, weekday, relative word, bare time.
pub fn parse_quick_add(input: &str, now: NaiveDateTime) -> ParsedInput {
    let text = input.trim();
    let (label_part, date_part) = match text.split_once(", ") {
        Some((label, rest)) => (Some(label), rest),
        None => (None, text),
    };

    let time_match = TIME_RE.captures(date_part);
    let relative_word = RELATIVE_RE
        .captures(date_part)
        .map(|caps| normalize_spaces(&caps[1].to_lowercase()));

    let mut hour = time_match
        .as_ref()
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(DEFAULT_HOUR);
    let minute = time_match
        .as_ref()
        .and_then(|caps| caps.get(2))
        .filter(|m| !m.as_str().is_empty())
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);

    if time_match.is_none() {
        if let Some(word) = relative_word.as_deref() {
            if word.contains("soir") {
                hour = 18;
            }
            if word.contains("midi") {
                hour = 12;
            }
            if word.contains("après midi") {
                hour = 15;
            }
        }
    }

    let today = now.date();
    let due = NaiveTime::from_hms_opt(hour, minute, 0).and_then(|time| {
        if let Some(caps) = DATE_RE.captures(date_part) {
            explicit_date(&caps, today).map(|date| date.and_time(time))
        } else if let Some(caps) = WEEKDAY_RE.captures(date_part) {
            weekday_index(&caps[1].to_lowercase())
                .and_then(|target| upcoming_weekday(target, time, now))
        } else if let Some(word) = relative_word.as_deref() {
            relative_date(word, today).map(|date| date.and_time(time))
        } else if time_match.is_some() {
            Some(today.and_time(time))
        } else {
            None
        }
    });

    let label = match label_part {
        Some(label) => label.to_string(),
        None => strip_date_fragments(text, input),
    };

    ParsedInput { label, due }
}

fn strip_date_fragments(text: &str, original: &str) -> String {
    let mut cleaned = TIME_RE.replace_all(text, "").into_owned();
    for re in [&*WEEKDAY_RE, &*DATE_RE, &*RELATIVE_RE] {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    let cleaned = normalize_spaces(cleaned.trim());
    if cleaned.is_empty() {
        original.to_string()
    } else {
        cleaned
    }
}

fn normalize_spaces(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").into_owned()
}

fn explicit_date(caps: &regex::Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let day = caps[1].parse::<u32>().ok()?;
    let month = month_number(&caps[2].to_lowercase())?;
    let year = match caps.get(3) {
        Some(year) => year.as_str().parse::<i32>().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(prefix: &str) -> Option<u32> {
    let month = match prefix {
        "jan" => 1,
        "fév" => 2,
        "mar" => 3,
        "avr" => 4,
        "mai" => 5,
        "juin" => 6,
        "juil" => 7,
        "aoû" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "déc" => 12,
        _ => return None,
    };
    Some(month)
}

/// Monday = 0.
fn weekday_index(name: &str) -> Option<u32> {
    let index = match name {
        "lundi" => 0,
        "mardi" => 1,
        "mercredi" => 2,
        "jeudi" => 3,
        "vendredi" => 4,
        "samedi" => 5,
        "dimanche" => 6,
        _ => return None,
    };
    Some(index)
}

/// Next-or-same `target` weekday at `time`; a slot already past moves one
/// week ahead.
fn upcoming_weekday(target: u32, time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date();
    let current = today.weekday().num_days_from_monday();
    let ahead = (target + 7 - current) % 7;
    let candidate = today.checked_add_days(Days::new(u64::from(ahead)))?.and_time(time);
    if candidate < now {
        return candidate
            .date()
            .checked_add_days(Days::new(7))
            .map(|date| date.and_time(time));
    }
    Some(candidate)
}

fn relative_date(word: &str, today: NaiveDate) -> Option<NaiveDate> {
    let offset = if word.contains("après demain") {
        2
    } else if word.contains("demain") {
        1
    } else if word.contains("semaine prochaine") {
        7
    } else {
        0
    };
    today.checked_add_days(Days::new(offset))
}

#[cfg(test)]
mod tests {
    use super::parse_quick_add;
    use chrono::{NaiveDate, NaiveDateTime};

    /// Wednesday 2024-05-15 10:00.
    fn now() -> NaiveDateTime {
        at(2024, 5, 15, 10, 0)
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn plain_text_has_no_due_date() {
        let parsed = parse_quick_add("  acheter du pain  ", now());
        assert_eq!(parsed.label, "acheter du pain");
        assert_eq!(parsed.due, None);
    }

    #[test]
    fn comma_splits_label_from_date_part() {
        let parsed = parse_quick_add("Dentiste, jeudi 14h30", now());
        assert_eq!(parsed.label, "Dentiste");
        assert_eq!(parsed.due, Some(at(2024, 5, 16, 14, 30)));
    }

    #[test]
    fn relative_evening_sets_eighteen_hours() {
        let parsed = parse_quick_add("appeler Paul ce soir", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 15, 18, 0)));
        assert_eq!(parsed.label, "appeler Paul");
    }

    #[test]
    fn only_first_relative_word_counts() {
        let parsed = parse_quick_add("appeler Paul demain soir", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 16, 12, 0)));
        assert_eq!(parsed.label, "appeler Paul soir");
    }

    #[test]
    fn day_after_tomorrow_wins_over_tomorrow() {
        let parsed = parse_quick_add("réunion après demain à 9h", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 17, 9, 0)));
        assert_eq!(parsed.label, "réunion");
    }

    #[test]
    fn explicit_date_with_and_without_year() {
        let parsed = parse_quick_add("impôts 3 juin", now());
        assert_eq!(parsed.due, Some(at(2024, 6, 3, 12, 0)));
        assert_eq!(parsed.label, "impôts");

        let parsed = parse_quick_add("voyage, 2 janvier 2025 8h", now());
        assert_eq!(parsed.due, Some(at(2025, 1, 2, 8, 0)));
        assert_eq!(parsed.label, "voyage");
    }

    #[test]
    fn same_weekday_already_past_moves_one_week() {
        let parsed = parse_quick_add("sport mercredi 8h", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 22, 8, 0)));

        let parsed = parse_quick_add("sport mercredi 19h", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 15, 19, 0)));
    }

    #[test]
    fn bare_time_means_today() {
        let parsed = parse_quick_add("pause 16h", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 15, 16, 0)));
        assert_eq!(parsed.label, "pause");
    }

    #[test]
    fn next_week_and_afternoon() {
        let parsed = parse_quick_add("bilan, la semaine prochaine", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 22, 12, 0)));

        let parsed = parse_quick_add("courses cet après midi", now());
        assert_eq!(parsed.due, Some(at(2024, 5, 15, 15, 0)));
        assert_eq!(parsed.label, "courses");
    }

    #[test]
    fn invalid_calendar_values_yield_no_due_date() {
        assert_eq!(parse_quick_add("fête 31 fév", now()).due, None);
        assert_eq!(parse_quick_add("nuit 25h", now()).due, None);
    }

    #[test]
    fn label_falls_back_to_input_when_only_date_words() {
        let parsed = parse_quick_add("demain", now());
        assert_eq!(parsed.label, "demain");
        assert_eq!(parsed.due, Some(at(2024, 5, 16, 12, 0)));
    }
}
