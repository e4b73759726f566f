//! Telemetry ring shared by the firmware and the emulator.
//!
//! The controller records noteworthy transitions (arming, countdown ticks,
//! overlays, hardware faults) into a fixed-capacity history. Consumers poll
//! [`TelemetryLog::after`] with the last id they handled to mirror new
//! records to defmt or a host transcript without draining the ring.

use core::fmt;

use heapless::HistoryBuf;

use crate::controller::ControllerError;
use crate::time::Millis;

/// Default number of records retained.
pub const TELEMETRY_CAPACITY: usize = 32;

/// Sequence number attached to every record.
pub type EventId = u32;

/// Transitions worth keeping a record of.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEvent {
    CountdownArmed { seconds: i32 },
    CountdownTick { remaining: i32 },
    GraceStarted { seconds: u32 },
    GraceTick { remaining: u32 },
    IntervalSelected { index: usize, minutes: u16 },
    WarningStarted { remaining: i32 },
    OverlayStarted { duration: Millis },
    OverlayExpired,
    Fault(ControllerError),
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEvent::CountdownArmed { seconds } => write!(f, "countdown-armed {seconds}s"),
            TelemetryEvent::CountdownTick { remaining } => {
                write!(f, "countdown-tick {remaining}s")
            }
            TelemetryEvent::GraceStarted { seconds } => write!(f, "grace-started {seconds}s"),
            TelemetryEvent::GraceTick { remaining } => write!(f, "grace-tick {remaining}s"),
            TelemetryEvent::IntervalSelected { index, minutes } => {
                write!(f, "interval-selected #{index} {minutes}min")
            }
            TelemetryEvent::WarningStarted { remaining } => {
                write!(f, "warning-started {remaining}s")
            }
            TelemetryEvent::OverlayStarted { duration } => {
                write!(f, "overlay-started {duration}ms")
            }
            TelemetryEvent::OverlayExpired => f.write_str("overlay-expired"),
            TelemetryEvent::Fault(error) => write!(f, "fault {error}"),
        }
    }
}

/// Entry stored in the ring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Millis,
    pub event: TelemetryEvent,
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} @{}ms {}", self.id, self.timestamp, self.event)
    }
}

/// Fixed-capacity history of telemetry records, oldest entries evicted first.
pub struct TelemetryLog<const N: usize = TELEMETRY_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord, N>,
    next_id: EventId,
}

impl<const N: usize> TelemetryLog<N> {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_id: 0,
        }
    }

    /// Appends an event and returns its id.
    pub fn record(&mut self, timestamp: Millis, event: TelemetryEvent) -> EventId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });
        id
    }

    /// Most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Records in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.ring.oldest_ordered()
    }

    /// Records newer than `last_seen`, oldest first.
    ///
    /// Passing `None` yields every retained record.
    pub fn after(&self, last_seen: Option<EventId>) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.oldest_first()
            .filter(move |record| last_seen.is_none_or(|seen| record.id > seen))
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const N: usize> Default for TelemetryLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_records_are_evicted() {
        let mut log = TelemetryLog::<2>::new();
        log.record(0, TelemetryEvent::CountdownArmed { seconds: 60 });
        log.record(1_000, TelemetryEvent::CountdownTick { remaining: 59 });
        log.record(2_000, TelemetryEvent::CountdownTick { remaining: 58 });

        assert_eq!(log.len(), 2);
        let first = log.oldest_first().next().unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(log.latest().unwrap().id, 2);
    }

    #[test]
    fn after_skips_records_already_seen() {
        let mut log = TelemetryLog::<8>::new();
        log.record(0, TelemetryEvent::OverlayStarted { duration: 1_500 });
        let seen = log.record(10, TelemetryEvent::OverlayExpired);
        log.record(20, TelemetryEvent::GraceStarted { seconds: 10 });

        let mut newer = log.after(Some(seen));
        assert_eq!(
            newer.next().unwrap().event,
            TelemetryEvent::GraceStarted { seconds: 10 }
        );
        assert!(newer.next().is_none());
        assert_eq!(log.after(None).count(), 3);
    }
}
