//! Multi-format instant parser shared by the header parser (§4.2) and
//! the query lexer/parser (§4.4.2). Tries every layout in the fixed
//! order from §4.2, in order, keeping the *last* successful match —
//! reordering this list changes behavior on ambiguous input such as
//! "01/02/2006" (§9 design note), so new layouts must be appended, not
//! inserted.

use chrono::NaiveDateTime;

type Attempt = fn(&str) -> Option<NaiveDateTime>;

const LAYOUTS: &[Attempt] = &[
    jan_2_2006_comma,
    january_2_2006_comma,
    january_2_2006,
    jan_2_2006,
    year_january_2,
    iso_date,
    iso_datetime,
    ansi_c,
    unix_date,
    ruby_date,
    rfc_822,
    rfc_822z,
    rfc_850,
    rfc_1123,
    rfc_1123z,
    rfc_3339,
];

/// Parses `s` against every layout in the ordered list, returning the
/// last one that matches (not the first). Returns `None` if no layout
/// matches.
pub fn parse_any(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let mut result = None;
    for attempt in LAYOUTS {
        if let Some(dt) = attempt(s) {
            result = Some(dt);
        }
    }
    result
}

fn jan_2_2006_comma(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{} 00:00:00", s), "%b %e, %Y %H:%M:%S").ok()
        .or_else(|| chrono::NaiveDate::parse_from_str(s, "%b %e, %Y").ok().map(|d| d.and_hms_opt(0, 0, 0).unwrap()))
}

fn january_2_2006_comma(s: &str) -> Option<NaiveDateTime> {
    chrono::NaiveDate::parse_from_str(s, "%B %e, %Y")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
}

fn january_2_2006(s: &str) -> Option<NaiveDateTime> {
    chrono::NaiveDate::parse_from_str(s, "%B %e %Y")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
}

fn jan_2_2006(s: &str) -> Option<NaiveDateTime> {
    chrono::NaiveDate::parse_from_str(s, "%b %e %Y")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
}

fn year_january_2(s: &str) -> Option<NaiveDateTime> {
    chrono::NaiveDate::parse_from_str(s, "%Y %B %e")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
}

fn iso_date(s: &str) -> Option<NaiveDateTime> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
}

fn iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
}

fn ansi_c(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%a %b %e %H:%M:%S %Y").ok()
}

fn unix_date(s: &str) -> Option<NaiveDateTime> {
    // "Mon Jan _2 15:04:05 MST 2006" - chrono can't parse arbitrary
    // timezone abbreviations, so the zone token is stripped first.
    strip_tz_token(s).and_then(|stripped| {
        NaiveDateTime::parse_from_str(&stripped, "%a %b %e %H:%M:%S %Y").ok()
    })
}

fn ruby_date(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|dt| dt.naive_utc())
}

fn rfc_822(s: &str) -> Option<NaiveDateTime> {
    strip_tz_token(s).and_then(|stripped| {
        NaiveDateTime::parse_from_str(&stripped, "%d %b %y %H:%M").ok()
    })
}

fn rfc_822z(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_str(s, "%d %b %y %H:%M %z")
        .ok()
        .map(|dt| dt.naive_utc())
}

fn rfc_850(s: &str) -> Option<NaiveDateTime> {
    strip_tz_token(s).and_then(|stripped| {
        NaiveDateTime::parse_from_str(&stripped, "%A, %d-%b-%y %H:%M:%S").ok()
    })
}

fn rfc_1123(s: &str) -> Option<NaiveDateTime> {
    strip_tz_token(s).and_then(|stripped| {
        NaiveDateTime::parse_from_str(&stripped, "%a, %d %b %Y %H:%M:%S").ok()
    })
}

fn rfc_1123z(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.naive_utc())
}

fn rfc_3339(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Drops a trailing named-timezone token (e.g. "MST", "UTC", "GMT")
/// so the remaining layout can be parsed without chrono needing to
/// resolve the zone abbreviation to an offset.
fn strip_tz_token(s: &str) -> Option<String> {
    let trimmed = s.trim_end();
    let mut parts: Vec<&str> = trimmed.split_whitespace().collect();
    let last = *parts.last()?;
    if last.chars().all(|c| c.is_ascii_alphabetic()) && last.len() >= 2 && last.len() <= 5 {
        parts.pop();
        Some(parts.join(" "))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        let dt = parse_any("2025-06-14").unwrap();
        assert_eq!(dt.and_utc().timestamp(), chrono::NaiveDate::from_ymd_opt(2025, 6, 14).unwrap().and_hms_opt(0,0,0).unwrap().and_utc().timestamp());
    }

    #[test]
    fn parses_rfc3339() {
        assert!(parse_any("2025-06-14T10:20:30Z").is_some());
    }

    #[test]
    fn parses_long_month_name() {
        assert!(parse_any("June 14, 2025").is_some());
        assert!(parse_any("June 14 2025").is_some());
    }

    #[test]
    fn empty_is_none() {
        assert!(parse_any("").is_none());
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_any("not a date").is_none());
    }
}
