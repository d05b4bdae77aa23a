use chrono::{
  DateTime,
  Days,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Timelike,
  Utc
};
use tracing::trace;

use crate::error::InputError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M"
];

/// Parses a due date typed at the input
/// boundary. Naive forms are read as
/// UTC; a bare date is UTC midnight.
#[tracing::instrument(skip(now))]
pub fn parse_due(
  raw: &str,
  now: DateTime<Utc>
) -> Result<DateTime<Utc>, InputError> {
  let text = raw.trim();
  if text.is_empty() {
    return Err(InputError::InvalidDate(
      raw.to_string()
    ));
  }

  if let Some(dt) =
    parse_keyword(text, now)
  {
    trace!(input = %text, parsed = %dt, "parsed date keyword");
    return Ok(dt);
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(text)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  for fmt in DATETIME_FORMATS {
    if let Ok(naive) =
      NaiveDateTime::parse_from_str(
        text, fmt
      )
    {
      return Ok(naive.and_utc());
    }
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      text,
      DATE_FORMAT
    )
  {
    return Ok(start_of_day(date));
  }

  Err(InputError::InvalidDate(
    raw.to_string()
  ))
}

fn parse_keyword(
  text: &str,
  now: DateTime<Utc>
) -> Option<DateTime<Utc>> {
  let today = now.date_naive();
  match text
    .to_ascii_lowercase()
    .as_str()
  {
    | "now" => Some(now),
    | "today" => Some(start_of_day(today)),
    | "tomorrow" => today
      .checked_add_days(Days::new(1))
      .map(start_of_day),
    | "yesterday" => today
      .checked_sub_days(Days::new(1))
      .map(start_of_day),
    | _ => None
  }
}

fn start_of_day(
  date: NaiveDate
) -> DateTime<Utc> {
  date
    .and_time(NaiveTime::MIN)
    .and_utc()
}

/// Date only when the time is midnight,
/// otherwise date and minutes.
#[must_use]
pub fn format_due(
  dt: DateTime<Utc>
) -> String {
  if dt.num_seconds_from_midnight() == 0 {
    dt.format(DATE_FORMAT).to_string()
  } else {
    dt.format("%Y-%m-%d %H:%M")
      .to_string()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::{
    format_due,
    parse_due
  };
  use crate::error::InputError;

  fn now() -> chrono::DateTime<Utc> {
    Utc
      .with_ymd_and_hms(
        2026, 2, 17, 12, 30, 0
      )
      .single()
      .expect("valid now")
  }

  #[test]
  fn parses_bare_date_as_utc_midnight() {
    let parsed =
      parse_due("2024-01-01", now())
        .expect("parse date");
    assert_eq!(
      parsed.to_rfc3339(),
      "2024-01-01T00:00:00+00:00"
    );
  }

  #[test]
  fn parses_datetime_local_input() {
    let parsed = parse_due(
      "2024-03-05T09:15",
      now()
    )
    .expect("parse datetime");
    assert_eq!(
      format_due(parsed),
      "2024-03-05 09:15"
    );
  }

  #[test]
  fn parses_rfc3339_with_offset() {
    let parsed = parse_due(
      "2024-03-05T09:15:00+02:00",
      now()
    )
    .expect("parse rfc3339");
    assert_eq!(
      format_due(parsed),
      "2024-03-05 07:15"
    );
  }

  #[test]
  fn parses_relative_keywords() {
    assert_eq!(
      parse_due("now", now())
        .expect("now"),
      now()
    );
    assert_eq!(
      format_due(
        parse_due("Tomorrow", now())
          .expect("tomorrow")
      ),
      "2026-02-18"
    );
    assert_eq!(
      format_due(
        parse_due("yesterday", now())
          .expect("yesterday")
      ),
      "2026-02-16"
    );
  }

  #[test]
  fn rejects_garbage() {
    for raw in
      ["", "  ", "next tuesday", "2024-13-01"]
    {
      assert_eq!(
        parse_due(raw, now()),
        Err(InputError::InvalidDate(
          raw.to_string()
        ))
      );
    }
  }
}
