use chrono::Utc;
use uuid::Uuid;

/// Supplies ids for new tasks and lists.
pub trait IdSource: Send {
    fn next_id(&mut self) -> String;
}

/// Millisecond creation timestamps, bumped so that every id is strictly
/// greater than the previous one even when two records are created within
/// the same millisecond.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: i64,
}

impl IdSource for TimestampIds {
    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last = if now > self.last { now } else { self.last + 1 };
        self.last.to_string()
    }
}

#[derive(Debug, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `1`, `2`, `3`, ... Predictable ids for tests and scripted sessions.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        self.next.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ids_strictly_increase() {
        let mut ids = TimestampIds::default();
        let values: Vec<i64> = (0..50)
            .map(|_| ids.next_id().parse::<i64>().expect("numeric id"))
            .collect();
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
