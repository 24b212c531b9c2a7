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

pub mod acquisition_manager;
pub mod publish_schedule;
pub mod report;

use crate::weight::calibration::{ScaleConfig, UnitsPerGram, WeightReading, ZeroPoint};
use crate::weight::{ScaleError, WeighingSystem};
use core::cell::Cell;
use embassy_sync::blocking_mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;

pub const TRIGGER_QUEUE_DEPTH: usize = 4;

/// What caused a publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerSource {
    Timer,
    /// Remote poll command. The report is sent as an acknowledgement.
    RemotePoll,
    /// Local `send` command.
    Send,
    /// Connect button.
    Button,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleRequest {
    Read,
    Zero,
    Calibrate(u32),
    SetPeriod(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleResponse {
    Reading(WeightReading),
    Zeroed(ZeroPoint),
    Calibrated(UnitsPerGram),
    PeriodSet(u8),
}

pub type TriggerChannel = Channel<CriticalSectionRawMutex, TriggerSource, TRIGGER_QUEUE_DEPTH>;
pub type RequestChannel = Channel<CriticalSectionRawMutex, ScaleRequest, 1>;
pub type ResponseChannel = Channel<CriticalSectionRawMutex, Result<ScaleResponse, ScaleError>, 1>;

/// Queues between the acquisition worker and everything that wants something from it.
/// Const constructible so it can live in a `static`.
pub struct ScaleChannels {
    pub(crate) triggers: TriggerChannel,
    pub(crate) requests: RequestChannel,
    pub(crate) responses: ResponseChannel,
    requester: Mutex<CriticalSectionRawMutex, ()>,
    config: blocking_mutex::Mutex<CriticalSectionRawMutex, Cell<ScaleConfig>>,
}

impl ScaleChannels {
    pub const fn new() -> Self {
        Self {
            triggers: Channel::new(),
            requests: Channel::new(),
            responses: Channel::new(),
            requester: Mutex::new(()),
            config: blocking_mutex::Mutex::new(Cell::new(ScaleConfig::DEFAULT)),
        }
    }

    pub fn client(&self) -> ScaleClient<'_> {
        ScaleClient { channels: self }
    }

    pub fn config(&self) -> ScaleConfig {
        self.config.lock(|c| c.get())
    }

    pub(crate) fn publish_config(&self, config: ScaleConfig) {
        self.config.lock(|c| c.set(config));
    }

    /// Queue a publish trigger. Dropped with a warning if the queue is full.
    pub fn trigger(&self, source: TriggerSource) -> bool {
        match self.triggers.try_send(source) {
            Ok(()) => true,
            Err(_) => {
                warn!("Trigger queue full, dropping {:?}", source);
                false
            }
        }
    }
}

impl Default for ScaleChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle used by console, remote commands and inputs. Cheap to copy.
#[derive(Clone, Copy)]
pub struct ScaleClient<'a> {
    channels: &'a ScaleChannels,
}

impl<'a> ScaleClient<'a> {
    async fn request(&self, request: ScaleRequest) -> Result<ScaleResponse, ScaleError> {
        let _requester = self.channels.requester.lock().await;
        // left over from a caller that was dropped while waiting
        while self.channels.responses.try_receive().is_ok() {}
        self.channels.requests.send(request).await;
        self.channels.responses.receive().await
    }
}

fn unexpected(response: ScaleResponse) -> ScaleError {
    error!("Unexpected response from acquisition task: {:?}", response);
    ScaleError::AcquisitionFailed
}

impl WeighingSystem for ScaleClient<'_> {
    async fn read_weight(&mut self) -> Result<WeightReading, ScaleError> {
        match self.request(ScaleRequest::Read).await? {
            ScaleResponse::Reading(reading) => Ok(reading),
            other => Err(unexpected(other)),
        }
    }

    async fn tare(&mut self) -> Result<ZeroPoint, ScaleError> {
        match self.request(ScaleRequest::Zero).await? {
            ScaleResponse::Zeroed(zero) => Ok(zero),
            other => Err(unexpected(other)),
        }
    }

    async fn calibrate(&mut self, known_weight_grams: u32) -> Result<UnitsPerGram, ScaleError> {
        if known_weight_grams == 0 {
            return Err(ScaleError::CalibrationDivideByZero);
        }
        match self.request(ScaleRequest::Calibrate(known_weight_grams)).await? {
            ScaleResponse::Calibrated(factor) => Ok(factor),
            other => Err(unexpected(other)),
        }
    }

    async fn set_publish_period(&mut self, minutes: u8) -> Result<(), ScaleError> {
        match self.request(ScaleRequest::SetPeriod(minutes)).await? {
            ScaleResponse::PeriodSet(_) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    fn request_publish(&mut self, source: TriggerSource) -> bool {
        self.channels.trigger(source)
    }

    fn current_config(&self) -> ScaleConfig {
        self.channels.config()
    }
}
