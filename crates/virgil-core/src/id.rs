//! Message identifiers.
//!
//! Every Virgil message carries a 12-digit identifier in the form
//! `HHMMSSmmm###`: time of day down to the millisecond, then a 3-digit
//! sequence number that disambiguates messages sent within the same
//! millisecond. The wire carries no date, so parsing anchors the time to
//! local midnight of the current day; this is a protocol limitation, not a
//! decoding choice.
//!
//! Identifiers are unique only among those produced by one
//! [`MessageIdGenerator`]. Identifiers parsed from received messages carry
//! no uniqueness guarantee at all.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::error::{CodecError, CodecResult};

/// Wire width of an identifier, in ASCII digits.
pub const ID_DIGITS: usize = 12;

fn unset_instant() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

/// A unique message identifier: a wall-clock instant plus a sequence number.
///
/// The default value is the *unset* sentinel, meaning "not yet assigned";
/// encoders replace it with a freshly generated identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId {
    /// Local wall-clock instant the message was sent, millisecond precision.
    pub time: NaiveDateTime,
    /// Sequence number within the same millisecond.
    pub sequence: u16,
}

impl MessageId {
    /// Returns the unset sentinel (epoch instant, sequence 0).
    pub fn unset() -> Self {
        Self {
            time: unset_instant(),
            sequence: 0,
        }
    }

    /// Returns `true` unless this is the unset sentinel.
    pub fn is_set(&self) -> bool {
        self.time != unset_instant() || self.sequence != 0
    }

    /// Parses a 12-digit `HHMMSSmmm###` identifier.
    ///
    /// The time-of-day offset is anchored to local midnight of the current
    /// day. Hours are not range-checked beyond being digits; an offset past
    /// 24h simply lands on the following day.
    pub fn parse(text: &str) -> CodecResult<Self> {
        if text.len() != ID_DIGITS {
            return Err(CodecError::MalformedId {
                text: text.to_string(),
                detail: "identifier must be exactly 12 digits",
            });
        }
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::MalformedId {
                text: text.to_string(),
                detail: "identifier must contain only ASCII digits",
            });
        }

        let field = |range: std::ops::Range<usize>| -> i64 {
            text.as_bytes()[range]
                .iter()
                .fold(0, |acc, b| acc * 10 + i64::from(b - b'0'))
        };

        let offset = Duration::hours(field(0..2))
            + Duration::minutes(field(2..4))
            + Duration::seconds(field(4..6))
            + Duration::milliseconds(field(6..9));
        let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);

        Ok(Self {
            time: midnight + offset,
            sequence: field(9..12) as u16,
        })
    }

    /// Milliseconds elapsed since this identifier's own local midnight.
    fn millis_since_midnight(&self) -> i64 {
        let midnight = self.time.date().and_time(NaiveTime::MIN);
        (self.time - midnight).num_milliseconds()
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::unset()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ms = self.millis_since_midnight();
        let hour = ms / 3_600_000;
        ms %= 3_600_000;
        let minute = ms / 60_000;
        ms %= 60_000;
        let second = ms / 1_000;
        let millisecond = ms % 1_000;
        write!(
            f,
            "{hour:02}{minute:02}{second:02}{millisecond:03}{:03}",
            self.sequence
        )
    }
}

impl FromStr for MessageId {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        Self::parse(s)
    }
}

/// A source of the current local wall-clock time, millisecond precision.
///
/// Injected into [`MessageIdGenerator`] so tests can pin the clock.
pub trait Clock {
    /// Returns the current local time, truncated to the millisecond.
    fn now(&self) -> NaiveDateTime;
}

/// The real local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        truncate_to_millis(Local::now().naive_local())
    }
}

/// A fixed instant. Useful as a frozen clock in tests.
impl Clock for NaiveDateTime {
    fn now(&self) -> NaiveDateTime {
        truncate_to_millis(*self)
    }
}

fn truncate_to_millis(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(t.nanosecond() / 1_000_000 * 1_000_000)
        .expect("truncation keeps nanoseconds in range")
}

struct GeneratorState {
    last_instant: NaiveDateTime,
    last_sequence: u16,
}

/// Generates unique message identifiers from a clock and a counter.
///
/// Identifiers generated within the same millisecond get increasing
/// sequence numbers, wrapping after 999 so the wire form stays 12 digits;
/// a new millisecond resets the sequence to 0. The state sits behind a
/// mutex, so one generator can be shared across threads; uniqueness holds
/// only within a single generator, and only up to 1000 identifiers per
/// millisecond.
pub struct MessageIdGenerator<C: Clock = SystemClock> {
    clock: C,
    state: Mutex<GeneratorState>,
}

impl MessageIdGenerator<SystemClock> {
    /// Creates a generator driven by the local system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MessageIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MessageIdGenerator<C> {
    /// Creates a generator driven by the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(GeneratorState {
                last_instant: unset_instant(),
                last_sequence: 0,
            }),
        }
    }

    /// Generates the next identifier.
    pub fn generate(&self) -> MessageId {
        // The state has no invariant a panicking holder could break.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        if now == state.last_instant {
            // The wire gives the sequence 3 digits, so it wraps at 1000;
            // past that, uniqueness within the millisecond is lost.
            state.last_sequence = (state.last_sequence + 1) % 1000;
        } else {
            state.last_instant = now;
            state.last_sequence = 0;
        }
        MessageId {
            time: now,
            sequence: state.last_sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        Local::now()
            .date_naive()
            .and_time(NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap())
    }

    /// A clock that returns whatever instant the test last stored.
    struct StepClock(Cell<NaiveDateTime>);

    impl Clock for StepClock {
        fn now(&self) -> NaiveDateTime {
            self.0.get()
        }
    }

    #[test]
    fn parse_and_format_roundtrip() {
        for s in ["000000000000", "235959999999", "123456789012", "091205042007"] {
            let id = MessageId::parse(s).unwrap();
            assert_eq!(id.to_string(), s);
        }
    }

    #[test]
    fn parse_extracts_fields() {
        let id = MessageId::parse("134501250042").unwrap();
        assert_eq!(id.sequence, 42);
        assert_eq!(id.time, instant(13, 45, 1, 250));
        assert!(id.is_set());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        for s in ["", "12345678901", "1234567890123"] {
            assert!(matches!(
                MessageId::parse(s),
                Err(CodecError::MalformedId { .. })
            ));
        }
    }

    #[test]
    fn parse_rejects_non_digits() {
        assert!(matches!(
            MessageId::parse("12345678901a"),
            Err(CodecError::MalformedId { .. })
        ));
        assert!(matches!(
            MessageId::parse("1234 6789012"),
            Err(CodecError::MalformedId { .. })
        ));
    }

    #[test]
    fn from_str_delegates_to_parse() {
        let id: MessageId = "134501250042".parse().unwrap();
        assert_eq!(id.sequence, 42);
    }

    #[test]
    fn unset_sentinel() {
        assert!(!MessageId::unset().is_set());
        assert!(!MessageId::default().is_set());
        let set = MessageId::parse("000000001000").unwrap();
        assert!(set.is_set());
    }

    #[test]
    fn generator_increments_within_same_millisecond() {
        let clock = StepClock(Cell::new(instant(10, 0, 0, 500)));
        let generator = MessageIdGenerator::with_clock(clock);

        let a = generator.generate();
        let b = generator.generate();
        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
        assert_eq!(a.time, b.time);
    }

    #[test]
    fn generator_resets_sequence_on_new_millisecond() {
        let clock = StepClock(Cell::new(instant(10, 0, 0, 500)));
        let generator = MessageIdGenerator::with_clock(clock);

        generator.generate();
        generator.generate();
        generator.clock.0.set(instant(10, 0, 0, 501));
        let next = generator.generate();
        assert_eq!(next.sequence, 0);
        assert_eq!(next.time, instant(10, 0, 0, 501));
    }

    #[test]
    fn generator_sequence_wraps_after_three_digits() {
        let clock = StepClock(Cell::new(instant(10, 0, 0, 500)));
        let generator = MessageIdGenerator::with_clock(clock);

        for expected in 0..1000 {
            assert_eq!(generator.generate().sequence, expected);
        }
        let wrapped = generator.generate();
        assert_eq!(wrapped.sequence, 0);
        assert_eq!(wrapped.to_string().len(), ID_DIGITS);
    }

    #[test]
    fn generated_ids_format_to_twelve_digits() {
        let generator = MessageIdGenerator::new();
        let id = generator.generate();
        let text = id.to_string();
        assert_eq!(text.len(), 12);
        assert!(text.bytes().all(|b| b.is_ascii_digit()));
    }
}
