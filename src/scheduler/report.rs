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

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

pub const WEIGHT_REPORT_LEN: usize = 10;

/// Second byte of every message sent to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataKind {
    Data = 0,
    Error = 1,
    Ok = 2,
}

/// Result of one completed publish cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeightReport {
    pub module_id: u8,
    pub weight: u32,
    pub raw: u32,
    /// Set when the report answers a remote poll.
    pub is_ack: bool,
}

impl WeightReport {
    /// `[module id, DATA, weight (LE u32), raw (LE u32)]`. The ack flag travels out of band.
    pub fn encode(&self) -> [u8; WEIGHT_REPORT_LEN] {
        let mut buf = [0u8; WEIGHT_REPORT_LEN];
        buf[0] = self.module_id;
        buf[1] = DataKind::Data as u8;
        buf[2..6].copy_from_slice(&self.weight.to_le_bytes());
        buf[6..10].copy_from_slice(&self.raw.to_le_bytes());
        buf
    }
}

/// Receives every completed acquisition that was not a synchronous query.
pub trait ReportSink {
    fn deliver(&mut self, report: WeightReport);
}

const CHANNEL_DEPTH: usize = 4;
const CHANNEL_SUBS: usize = 2;
const CHANNEL_PUBS: usize = 1;

pub type ReportChannel =
    PubSubChannel<CriticalSectionRawMutex, WeightReport, CHANNEL_DEPTH, CHANNEL_SUBS, CHANNEL_PUBS>;
pub type ReportChannelSubscriber<'a> =
    Subscriber<'a, CriticalSectionRawMutex, WeightReport, CHANNEL_DEPTH, CHANNEL_SUBS, CHANNEL_PUBS>;
pub type ReportChannelPublisher<'a> =
    Publisher<'a, CriticalSectionRawMutex, WeightReport, CHANNEL_DEPTH, CHANNEL_SUBS, CHANNEL_PUBS>;

impl ReportSink for ReportChannelPublisher<'_> {
    fn deliver(&mut self, report: WeightReport) {
        self.publish_immediate(report);
    }
}
