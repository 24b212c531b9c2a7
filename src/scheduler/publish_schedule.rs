// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Publishing state machine.
//!
//! ```text
//!          period = 0                       any trigger
//!   Idle ◄──────────── Reporting ◄── Sampling ◄───────── Idle / Armed
//!                         │                                  ▲
//!                         └──────── period > 0 ──────────────┘
//! ```
//!
//! Time is passed in, nothing here waits, so the transitions can be tested directly.

use crate::scheduler::TriggerSource;
use embassy_time::{Duration, Instant};

const MILLIS_PER_MINUTE: u64 = 60_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerPhase {
    Idle,
    Armed { deadline: Instant },
    Sampling,
    Reporting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PublishSchedule {
    phase: SchedulerPhase,
    is_polled: bool,
}

pub fn publish_interval(period_minutes: u8) -> Option<Duration> {
    match period_minutes {
        0 => None,
        minutes => Some(Duration::from_millis(minutes as u64 * MILLIS_PER_MINUTE)),
    }
}

impl PublishSchedule {
    pub fn new(period_minutes: u8, now: Instant) -> Self {
        let mut schedule = Self {
            phase: SchedulerPhase::Idle,
            is_polled: false,
        };
        schedule.reprogram(period_minutes, now);
        schedule
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn is_polled(&self) -> bool {
        self.is_polled
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            SchedulerPhase::Armed { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline(), Some(deadline) if now >= deadline)
    }

    /// Start an acquisition. Any pending deadline is dropped; only a remote poll marks the
    /// result as an acknowledgement.
    pub fn begin_sampling(&mut self, source: TriggerSource) {
        self.is_polled = source == TriggerSource::RemotePoll;
        self.phase = SchedulerPhase::Sampling;
    }

    /// Move to reporting and hand back the polled flag, which is cleared for the next cycle.
    pub fn begin_reporting(&mut self) -> bool {
        self.phase = SchedulerPhase::Reporting;
        core::mem::replace(&mut self.is_polled, false)
    }

    /// Finish a cycle: arm the next deadline, or go idle when periodic publishing is off.
    pub fn rearm(&mut self, period_minutes: u8, now: Instant) {
        self.is_polled = false;
        self.reprogram(period_minutes, now);
    }

    /// Restart the period from `now`, as done when the period is changed.
    pub fn reprogram(&mut self, period_minutes: u8, now: Instant) {
        self.phase = match publish_interval(period_minutes) {
            Some(interval) => SchedulerPhase::Armed {
                deadline: now + interval,
            },
            None => SchedulerPhase::Idle,
        };
    }
}
