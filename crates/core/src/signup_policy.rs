//! Advisory signup eligibility check.
//!
//! Decides whether a signup should be accepted given the event's state and
//! its current signup count. This mirrors what the signup form enforces: the
//! only constraint the data store enforces atomically is (event, email)
//! uniqueness. Capacity is a soft bound — two concurrent signups for the
//! last remaining slot can both succeed.

use chrono::NaiveDate;

/// The slice of an event that eligibility depends on.
#[derive(Debug, Clone)]
pub struct EventGate {
    /// `true` iff the event's lifecycle status is `published`.
    pub published: bool,
    /// The event's signup-enabled flag.
    pub signup_enabled: bool,
    /// Optional capacity; `None` means unlimited.
    pub capacity: Option<i32>,
    /// Calendar date of the event.
    pub date: NaiveDate,
}

/// Why a signup was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignupRefusal {
    #[error("This event is not open for signups.")]
    NotPublished,

    #[error("Signups are disabled for this event.")]
    SignupsDisabled,

    #[error("This event is at full capacity.")]
    Full,

    #[error("This event has already taken place.")]
    Past,
}

/// Check whether a signup is permitted.
///
/// Permitted iff the event is published, signups are enabled, the date is
/// not strictly before `today`, and capacity (if set) exceeds the current
/// count. Refusals are reported in that order.
pub fn can_sign_up(
    event: &EventGate,
    signup_count: i64,
    today: NaiveDate,
) -> Result<(), SignupRefusal> {
    if !event.published {
        return Err(SignupRefusal::NotPublished);
    }
    if !event.signup_enabled {
        return Err(SignupRefusal::SignupsDisabled);
    }
    if event.date < today {
        return Err(SignupRefusal::Past);
    }
    if let Some(capacity) = event.capacity {
        if signup_count >= i64::from(capacity) {
            return Err(SignupRefusal::Full);
        }
    }
    Ok(())
}

/// Remaining open slots, if the event has a capacity.
pub fn spots_left(capacity: Option<i32>, signup_count: i64) -> Option<i64> {
    capacity.map(|c| (i64::from(c) - signup_count).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> EventGate {
        EventGate {
            published: true,
            signup_enabled: true,
            capacity: None,
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    #[test]
    fn open_event_accepts() {
        assert_eq!(can_sign_up(&gate(), 0, today()), Ok(()));
    }

    #[test]
    fn draft_never_accepts_regardless_of_date() {
        let mut event = gate();
        event.published = false;
        assert_eq!(can_sign_up(&event, 0, today()), Err(SignupRefusal::NotPublished));

        // Past, present, and future draft events are all refused.
        event.date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(can_sign_up(&event, 0, today()), Err(SignupRefusal::NotPublished));
    }

    #[test]
    fn disabled_signups_refuse() {
        let mut event = gate();
        event.signup_enabled = false;
        assert_eq!(can_sign_up(&event, 0, today()), Err(SignupRefusal::SignupsDisabled));
    }

    #[test]
    fn capacity_two_with_two_signups_is_full() {
        let mut event = gate();
        event.capacity = Some(2);
        assert_eq!(can_sign_up(&event, 2, today()), Err(SignupRefusal::Full));
        assert_eq!(can_sign_up(&event, 1, today()), Ok(()));
    }

    #[test]
    fn unlimited_capacity_never_fills() {
        assert_eq!(can_sign_up(&gate(), 10_000, today()), Ok(()));
    }

    #[test]
    fn past_event_refuses_but_same_day_accepts() {
        let mut event = gate();
        event.date = today();
        assert_eq!(can_sign_up(&event, 0, today()), Ok(()));

        event.date = today().pred_opt().unwrap();
        assert_eq!(can_sign_up(&event, 0, today()), Err(SignupRefusal::Past));
    }

    #[test]
    fn spots_left_floors_at_zero() {
        assert_eq!(spots_left(Some(2), 3), Some(0));
        assert_eq!(spots_left(Some(5), 2), Some(3));
        assert_eq!(spots_left(None, 100), None);
    }
}
