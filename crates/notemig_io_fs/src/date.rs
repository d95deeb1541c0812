//! Creation-date extraction from note content.
//!
//! Notes exported by the source system carry their properties as plain text
//! lines at the top of the body, e.g. `Created: June 5, 2023 10:00 AM`. The
//! first such line inside the leading window becomes the mtime of the
//! migrated file.

use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use filetime::{FileTime, set_file_times};
use regex::bytes::Regex as BytesRegex;

use crate::spec::{
    C_FORMAT_CREATED_DATE, C_MERIDIEMS, C_MONTH_NAMES, EnumCreatedDateError, MigrateError,
    N_BYTES_CREATED_DATE_WINDOW,
};

/// Timestamp derived for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCreatedDate {
    /// Parsed from a `Created:` line.
    Parsed(DateTime<Utc>),
    /// No `Created:` line; wall-clock time at derivation.
    Now(DateTime<Utc>),
}

impl EnumCreatedDate {
    /// The instant to apply as modification time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Parsed(v) | Self::Now(v) => *v,
        }
    }

    /// Whether the timestamp came from note content.
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Parse the text following `Created: `.
///
/// The layout is `January 2, 2006 3:04 PM`; the value carries no zone and is
/// taken as UTC. Surrounding whitespace (a trailing `\r` included) is ignored.
/// The month must be spelled out (any ASCII case) and the meridiem must be
/// `AM` or `PM`.
pub fn parse_created_date(text: &str) -> Result<DateTime<Utc>, EnumCreatedDateError> {
    let c_text = text.trim();
    let mut parts = c_text.split_whitespace();

    let c_month = parts.next().unwrap_or_default();
    if !C_MONTH_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(c_month))
    {
        return Err(EnumCreatedDateError::MonthName(c_month.to_string()));
    }
    let c_meridiem = parts.next_back().unwrap_or_default();
    if !C_MERIDIEMS.contains(&c_meridiem) {
        return Err(EnumCreatedDateError::Meridiem(c_meridiem.to_string()));
    }

    let date_naive = NaiveDateTime::parse_from_str(c_text, C_FORMAT_CREATED_DATE)?;
    Ok(date_naive.and_utc())
}

/// Find the `Created:` value inside the leading window of `content`.
pub fn find_created_date_text<'a>(
    content: &'a [u8],
    regex_created_date: &BytesRegex,
) -> Option<&'a [u8]> {
    let n_len_window = content.len().min(N_BYTES_CREATED_DATE_WINDOW);
    regex_created_date
        .captures(&content[..n_len_window])
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_bytes())
}

/// Derive the timestamp for the note at `path_src` from its `content`.
///
/// A matched line that fails to parse is an error for the whole run.
pub fn derive_created_date(
    path_src: &Path,
    content: &[u8],
    regex_created_date: &BytesRegex,
) -> Result<EnumCreatedDate, MigrateError> {
    let Some(raw_text) = find_created_date_text(content, regex_created_date) else {
        return Ok(EnumCreatedDate::Now(Utc::now()));
    };

    let c_text = String::from_utf8_lossy(raw_text);
    let date_created =
        parse_created_date(&c_text).map_err(|e| MigrateError::CreatedDateParse {
            path: path_src.to_path_buf(),
            text: c_text.to_string(),
            source: e,
        })?;
    tracing::info!(path = %path_src.display(), created = %date_created, "Parsed created date");
    Ok(EnumCreatedDate::Parsed(date_created))
}

/// Set mtime of `path_file_dst` to the derived date and atime to now.
pub fn apply_created_date(
    path_file_dst: &Path,
    date_created: &EnumCreatedDate,
) -> Result<(), io::Error> {
    let file_time_modify = FileTime::from_system_time(SystemTime::from(date_created.timestamp()));
    set_file_times(path_file_dst, FileTime::now(), file_time_modify)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::{TimeZone, Utc};
    use filetime::FileTime;

    use super::{
        EnumCreatedDate, apply_created_date, derive_created_date, find_created_date_text,
        parse_created_date,
    };
    use crate::spec::{EnumCreatedDateError, MigrateError, SpecMigratePatterns};
    use crate::test_util::TestDir;

    #[test]
    fn parses_reference_layout() {
        let date = parse_created_date("January 2, 2006 3:04 PM").expect("parse");
        assert_eq!(date, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 0).unwrap());

        let date = parse_created_date("June 5, 2023 10:00 AM\r").expect("parse");
        assert_eq!(date, Utc.with_ymd_and_hms(2023, 6, 5, 10, 0, 0).unwrap());

        let date = parse_created_date("December 31, 2021 12:30 AM").expect("parse");
        assert_eq!(date, Utc.with_ymd_and_hms(2021, 12, 31, 0, 30, 0).unwrap());
    }

    #[test]
    fn rejects_other_layouts() {
        assert!(parse_created_date("2023-06-05 10:00").is_err());
        assert!(parse_created_date("June 5, 2023").is_err());
        assert!(parse_created_date("").is_err());
    }

    #[test]
    fn rejects_abbreviated_month() {
        let err = parse_created_date("Jun 5, 2023 10:00 AM").expect_err("must fail");
        assert!(matches!(err, EnumCreatedDateError::MonthName(ref v) if v == "Jun"));

        let err = parse_created_date("Sept 5, 2023 10:00 AM").expect_err("must fail");
        assert!(matches!(err, EnumCreatedDateError::MonthName(_)));
    }

    #[test]
    fn rejects_lowercase_meridiem() {
        let err = parse_created_date("June 5, 2023 10:00 am").expect_err("must fail");
        assert!(matches!(err, EnumCreatedDateError::Meridiem(ref v) if v == "am"));

        assert!(parse_created_date("june 5, 2023 10:00 am").is_err());
        assert!(parse_created_date("June 5, 2023 10:00 Pm").is_err());
    }

    #[test]
    fn month_name_case_is_not_significant() {
        let date = parse_created_date("JUNE 5, 2023 10:00 PM").expect("parse");
        assert_eq!(date, Utc.with_ymd_and_hms(2023, 6, 5, 22, 0, 0).unwrap());
    }

    #[test]
    fn derives_exact_date_from_created_line() {
        let pats = SpecMigratePatterns::new().expect("patterns");
        let content = b"# Idea\n\nCreated: January 2, 2006 3:04 PM\nTags: misc\n\nbody";

        let date = derive_created_date(Path::new("n.md"), content, &pats.regex_created_date)
            .expect("derive");
        assert_eq!(
            date,
            EnumCreatedDate::Parsed(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 0).unwrap())
        );
        assert!(date.is_parsed());
    }

    #[test]
    fn short_content_without_line_defaults_to_now() {
        let pats = SpecMigratePatterns::new().expect("patterns");
        let before = Utc::now();
        let date = derive_created_date(Path::new("n.md"), b"# Tiny", &pats.regex_created_date)
            .expect("derive");

        assert!(!date.is_parsed());
        let n_secs_delta = (date.timestamp() - before).num_seconds().abs();
        assert!(n_secs_delta <= 5);
    }

    #[test]
    fn empty_content_defaults_to_now() {
        let pats = SpecMigratePatterns::new().expect("patterns");
        let date = derive_created_date(Path::new("n.md"), b"", &pats.regex_created_date)
            .expect("derive");
        assert!(matches!(date, EnumCreatedDate::Now(_)));
    }

    #[test]
    fn only_leading_window_is_searched() {
        let pats = SpecMigratePatterns::new().expect("patterns");
        let mut content = vec![b'x'; 300];
        content.extend_from_slice(b"\nCreated: January 2, 2006 3:04 PM\n");
        assert!(find_created_date_text(&content, &pats.regex_created_date).is_none());

        let mut content = vec![b'x'; 250];
        content.extend_from_slice(b"\nCreated: June 5, 2023 10:00 AM\n");
        assert_eq!(
            find_created_date_text(&content, &pats.regex_created_date),
            Some(&b"June 5, 2023 10:00 AM"[..])
        );
    }

    #[test]
    fn unparsable_created_line_is_fatal() {
        let pats = SpecMigratePatterns::new().expect("patterns");
        let err = derive_created_date(
            Path::new("n.md"),
            b"Created: yesterday-ish\n",
            &pats.regex_created_date,
        )
        .expect_err("must fail");
        assert!(matches!(err, MigrateError::CreatedDateParse { .. }));

        let err = derive_created_date(
            Path::new("n.md"),
            b"Created: Jun 5, 2023 10:00 am\n",
            &pats.regex_created_date,
        )
        .expect_err("must fail");
        assert!(matches!(
            err,
            MigrateError::CreatedDateParse {
                source: EnumCreatedDateError::MonthName(_),
                ..
            }
        ));
    }

    #[test]
    fn apply_sets_modification_time() {
        let tmp = TestDir::new();
        let path_file = tmp.path().join("n.md");
        std::fs::write(&path_file, "x").expect("write");

        let date = Utc.with_ymd_and_hms(2023, 6, 5, 10, 0, 0).unwrap();
        apply_created_date(&path_file, &EnumCreatedDate::Parsed(date)).expect("apply");

        let meta = std::fs::metadata(&path_file).expect("metadata");
        assert_eq!(
            FileTime::from_last_modification_time(&meta),
            FileTime::from_unix_time(date.timestamp(), 0)
        );
    }
}
