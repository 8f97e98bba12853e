//! Per-field derivations. Every function here is pure: the reference instant
//! is always passed in, never read from the clock.
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::ProjectionError;
use crate::lookup::BoardLookup;
use crate::model::{Card, CardStatus};

pub const ARCHIVE_LIST: &str = "Archive";
pub const COMMENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Timing of the first and last comment, computed together so the comment
/// list is parsed once per card.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommentTimes {
    pub to_first: Option<f64>,
    pub since_last: Option<f64>,
}

/// Absolute elapsed seconds between two instants, sign discarded.
pub fn elapsed_seconds(reference: DateTime<Utc>, event: DateTime<Utc>) -> f64 {
    to_seconds(reference.signed_duration_since(event)).abs()
}

fn to_seconds(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Closed cards are placed on the timeline at their last activity, open
/// cards at creation.
pub fn timestamp(card: &Card) -> DateTime<Utc> {
    match (card.closed, card.date_last_activity) {
        (true, Some(last)) => last,
        _ => card.created_date,
    }
}

pub fn list_name(card: &Card, lookup: &BoardLookup) -> Result<String, ProjectionError> {
    if card.closed {
        return Ok(ARCHIVE_LIST.to_string());
    }
    lookup.list_name(&card.id, &card.list_id).map(str::to_string)
}

pub fn last_activity_seconds(card: &Card, now: DateTime<Utc>) -> Option<f64> {
    card.date_last_activity
        .map(|last| elapsed_seconds(now, last))
}

pub fn age(card: &Card, now: DateTime<Utc>) -> f64 {
    elapsed_seconds(now, card.created_date)
}

pub fn time_active_seconds(card: &Card) -> Option<f64> {
    card.date_last_activity
        .map(|last| elapsed_seconds(last, card.created_date))
}

/// Cards archived together with their list never get their own closed flag,
/// so membership of a closed list also counts as closed.
pub fn status(card: &Card, lookup: &BoardLookup) -> CardStatus {
    if card.closed || lookup.is_closed_list(&card.list_id) {
        CardStatus::Closed
    } else {
        CardStatus::Open
    }
}

/// `%.f` alone would also accept a missing fraction or nanoseconds; the
/// format requires a dot followed by 1 to 6 digits.
fn has_micro_fraction(value: &str) -> bool {
    let Some((_, fraction)) = value
        .strip_suffix('Z')
        .and_then(|rest| rest.rsplit_once('.'))
    else {
        return false;
    };
    (1..=6).contains(&fraction.len()) && fraction.bytes().all(|b| b.is_ascii_digit())
}

pub fn parse_comment_datetime(
    card_id: &str,
    value: &str,
) -> Result<DateTime<Utc>, ProjectionError> {
    let invalid = || ProjectionError::CommentDate {
        card_id: card_id.to_string(),
        value: value.to_string(),
    };
    if !has_micro_fraction(value) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(value, COMMENT_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

pub fn comment_times(card: &Card, now: DateTime<Utc>) -> Result<CommentTimes, ProjectionError> {
    let (Some(first), Some(last)) = (card.comments.first(), card.comments.last()) else {
        return Ok(CommentTimes::default());
    };
    let first = parse_comment_datetime(&card.id, &first.date)?;
    let last = parse_comment_datetime(&card.id, &last.date)?;
    Ok(CommentTimes {
        to_first: Some(elapsed_seconds(now, first)),
        since_last: Some(elapsed_seconds(now, last)),
    })
}

pub fn last_comment(card: &Card) -> Option<&str> {
    card.comments.last().map(|c| c.text.as_str())
}

pub fn member_names(card: &Card, lookup: &BoardLookup) -> Result<Vec<String>, ProjectionError> {
    card.member_ids
        .iter()
        .map(|id| lookup.member_name(&card.id, id).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoardList, Comment, Member};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn card() -> Card {
        Card {
            id: "c1".into(),
            name: "Write docs".into(),
            closed: false,
            created_date: at(1_000),
            date_last_activity: None,
            list_id: "L1".into(),
            member_ids: vec![],
            labels: vec![],
            comments: vec![],
            short_url: "https://trello.com/c/abc".into(),
        }
    }

    fn lookup() -> BoardLookup {
        BoardLookup::build(
            &[
                Member {
                    id: "m1".into(),
                    username: "alice".into(),
                },
                Member {
                    id: "m2".into(),
                    username: "bob".into(),
                },
            ],
            &[BoardList {
                id: "L1".into(),
                name: "Backlog".into(),
            }],
            &[BoardList {
                id: "L2".into(),
                name: "Done".into(),
            }],
        )
    }

    #[test]
    fn elapsed_seconds_ignores_sign() {
        assert_eq!(elapsed_seconds(at(100), at(40)), 60.0);
        assert_eq!(elapsed_seconds(at(40), at(100)), 60.0);
        assert_eq!(elapsed_seconds(at(5), at(5)), 0.0);
    }

    #[test]
    fn age_is_absolute_for_future_creation() {
        let c = card();
        assert_eq!(age(&c, at(1_500)), 500.0);
        assert_eq!(age(&c, at(400)), 600.0);
    }

    #[test]
    fn last_activity_absent_without_activity() {
        let mut c = card();
        assert_eq!(last_activity_seconds(&c, at(2_000)), None);
        assert_eq!(time_active_seconds(&c), None);

        c.date_last_activity = Some(at(1_200));
        assert_eq!(last_activity_seconds(&c, at(2_000)), Some(800.0));
        assert_eq!(time_active_seconds(&c), Some(200.0));
    }

    #[test]
    fn timestamp_uses_last_activity_for_closed_cards() {
        let mut c = card();
        c.date_last_activity = Some(at(1_200));
        assert_eq!(timestamp(&c), at(1_000));

        c.closed = true;
        assert_eq!(timestamp(&c), at(1_200));

        c.date_last_activity = None;
        assert_eq!(timestamp(&c), at(1_000));
    }

    #[test]
    fn list_name_is_archive_for_closed_cards() {
        let lookup = lookup();
        let mut c = card();
        assert_eq!(list_name(&c, &lookup).unwrap(), "Backlog");

        c.closed = true;
        c.list_id = "missing".into();
        assert_eq!(list_name(&c, &lookup).unwrap(), ARCHIVE_LIST);

        c.closed = false;
        assert!(matches!(
            list_name(&c, &lookup),
            Err(ProjectionError::UnknownList { .. })
        ));
    }

    #[test]
    fn status_counts_closed_lists() {
        let lookup = lookup();
        let mut c = card();
        assert_eq!(status(&c, &lookup), CardStatus::Open);

        c.list_id = "L2".into();
        assert_eq!(status(&c, &lookup), CardStatus::Closed);

        c.list_id = "L1".into();
        c.closed = true;
        assert_eq!(status(&c, &lookup), CardStatus::Closed);
    }

    #[test]
    fn parse_comment_datetime_accepts_fractional_seconds() {
        let parsed = parse_comment_datetime("c1", "2022-09-28T10:15:30.123456Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2022-09-28T10:15:30.123456+00:00");

        let millis = parse_comment_datetime("c1", "2022-09-28T10:15:30.123Z").unwrap();
        assert_eq!(millis.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn parse_comment_datetime_rejects_other_formats() {
        for bad in [
            "2022-09-28 10:15:30",
            "yesterday",
            "2022-09-28T10:15:30+02:00",
            "2022-09-28T10:15:30Z",
            "2022-09-28T10:15:30.Z",
            "2022-09-28T10:15:30.123456789Z",
            "2022-09-28T10:15:30.12a4Z",
            "2022-09-28T10:15:30.123",
        ] {
            assert_eq!(
                parse_comment_datetime("c1", bad).unwrap_err(),
                ProjectionError::CommentDate {
                    card_id: "c1".into(),
                    value: bad.into()
                }
            );
        }
    }

    #[test]
    fn comment_times_absent_without_comments() {
        let c = card();
        assert_eq!(comment_times(&c, at(0)).unwrap(), CommentTimes::default());
        assert_eq!(last_comment(&c), None);
    }

    #[test]
    fn comment_times_use_first_and_last() {
        let mut c = card();
        c.comments = vec![
            Comment {
                date: "1970-01-01T00:01:40.000Z".into(),
                text: "a".into(),
            },
            Comment {
                date: "1970-01-01T00:03:20.000Z".into(),
                text: "b".into(),
            },
        ];
        let times = comment_times(&c, at(1_000)).unwrap();
        assert_eq!(times.to_first, Some(900.0));
        assert_eq!(times.since_last, Some(800.0));
        assert_eq!(last_comment(&c), Some("b"));
    }

    #[test]
    fn member_names_keep_card_order() {
        let lookup = lookup();
        let mut c = card();
        c.member_ids = vec!["m2".into(), "m1".into()];
        assert_eq!(member_names(&c, &lookup).unwrap(), vec!["bob", "alice"]);

        c.member_ids.push("ghost".into());
        assert_eq!(
            member_names(&c, &lookup).unwrap_err(),
            ProjectionError::UnknownMember {
                card_id: "c1".into(),
                member_id: "ghost".into(),
            }
        );
    }
}
