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

use crate::scheduler::publish_schedule::PublishSchedule;
use crate::scheduler::report::{ReportSink, WeightReport};
use crate::scheduler::{ScaleChannels, ScaleRequest, ScaleResponse, TriggerSource};
use crate::storage::ConfigStorage;
use crate::weight::calibration::{ScaleConfig, WeightReading, WeightScale};
use crate::weight::interface::StrainGaugeInterface;
use crate::weight::ScaleError;
use core::future::pending;
use embassy_futures::select::{select3, Either3};
use embassy_time::{Instant, Timer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionOrigin {
    /// A trigger or the period timer. Goes to the report sink.
    Publish { is_ack: bool },
    /// A `get` request. Goes back to the caller only.
    Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionCompleted {
    pub reading: WeightReading,
    pub origin: AcquisitionOrigin,
}

/// Owns the strain gauge and is the only place acquisitions happen. Publish triggers,
/// command requests and the period timer are served one at a time.
pub struct AcquisitionManager<'a, StrainGauge, Storage, Sink> {
    channels: &'a ScaleChannels,
    scale: WeightScale<StrainGauge>,
    storage: Storage,
    sink: Sink,
    schedule: PublishSchedule,
    module_id: u8,
}

impl<'a, StrainGauge, Storage, Sink> AcquisitionManager<'a, StrainGauge, Storage, Sink>
where
    StrainGauge: StrainGaugeInterface,
    StrainGauge::Error: Into<ScaleError>,
    Storage: ConfigStorage,
    Sink: ReportSink,
{
    pub fn new(
        channels: &'a ScaleChannels,
        scale: WeightScale<StrainGauge>,
        storage: Storage,
        sink: Sink,
        module_id: u8,
    ) -> Self {
        let config = scale.config();
        channels.publish_config(config);
        let schedule = PublishSchedule::new(config.publish_period_minutes, Instant::now());
        info!(
            "HX711 ready, publishing every {} minutes",
            config.publish_period_minutes
        );
        Self {
            channels,
            scale,
            storage,
            sink,
            schedule,
            module_id,
        }
    }

    pub fn config(&self) -> ScaleConfig {
        self.scale.config()
    }

    pub fn schedule(&self) -> &PublishSchedule {
        &self.schedule
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.run_once().await;
        }
    }

    /// Wait for the next trigger, request or deadline and serve it.
    pub async fn run_once(&mut self) {
        let channels = self.channels;
        let deadline = self.schedule.deadline();
        let period_timer = async {
            match deadline {
                Some(deadline) => Timer::at(deadline).await,
                None => pending::<()>().await,
            }
        };

        match select3(
            channels.triggers.receive(),
            channels.requests.receive(),
            period_timer,
        )
        .await
        {
            Either3::First(source) => self.publish(source),
            Either3::Second(request) => self.handle_request(request).await,
            Either3::Third(()) => self.publish(TriggerSource::Timer),
        }
    }

    fn publish(&mut self, source: TriggerSource) {
        debug!("Publish triggered by {:?}", source);
        self.schedule.begin_sampling(source);
        let result = self.scale.get_instantaneous_weight();
        let is_ack = self.schedule.begin_reporting();

        match result {
            Ok(reading) => self.dispatch(AcquisitionCompleted {
                reading,
                origin: AcquisitionOrigin::Publish { is_ack },
            }),
            Err(e) => warn!("Acquisition failed, nothing reported: {:?}", e),
        }

        self.schedule
            .rearm(self.scale.config().publish_period_minutes, Instant::now());
    }

    fn dispatch(&mut self, completed: AcquisitionCompleted) {
        let reading = completed.reading;
        info!("Weight: {} {}", reading.weight, reading.unit.suffix());
        match completed.origin {
            AcquisitionOrigin::Query => self.respond(Ok(ScaleResponse::Reading(reading))),
            AcquisitionOrigin::Publish { is_ack } => self.sink.deliver(WeightReport {
                module_id: self.module_id,
                weight: reading.weight,
                raw: reading.raw.value(),
                is_ack,
            }),
        }
    }

    fn respond(&self, response: Result<ScaleResponse, ScaleError>) {
        if self.channels.responses.try_send(response).is_err() {
            warn!("Response slot occupied, dropping {:?}", response);
        }
    }

    async fn handle_request(&mut self, request: ScaleRequest) {
        debug!("Handling request {:?}", request);
        let response = match request {
            ScaleRequest::Read => match self.scale.get_instantaneous_weight() {
                Ok(reading) => {
                    self.dispatch(AcquisitionCompleted {
                        reading,
                        origin: AcquisitionOrigin::Query,
                    });
                    return;
                }
                Err(e) => Err(e),
            },
            ScaleRequest::Zero => self.zero().await,
            ScaleRequest::Calibrate(grams) => self.calibrate(grams).await,
            ScaleRequest::SetPeriod(minutes) => self.set_period(minutes).await,
        };
        self.respond(response);
    }

    async fn zero(&mut self) -> Result<ScaleResponse, ScaleError> {
        let zero = self.scale.tare().await?;
        info!("Zero set to {} {}", zero.value, zero.unit.suffix());
        self.persist().await?;
        Ok(ScaleResponse::Zeroed(zero))
    }

    async fn calibrate(&mut self, known_weight_grams: u32) -> Result<ScaleResponse, ScaleError> {
        let factor = self.scale.calibrate(known_weight_grams).await.map_err(|e| {
            warn!("Calibration with {} g failed: {:?}", known_weight_grams, e);
            e
        })?;
        info!("Calibration done, {}.{} units/g", factor.0 / 10, factor.0 % 10);
        self.persist().await?;
        Ok(ScaleResponse::Calibrated(factor))
    }

    async fn set_period(&mut self, minutes: u8) -> Result<ScaleResponse, ScaleError> {
        self.scale.set_publish_period(minutes);
        self.schedule.reprogram(minutes, Instant::now());
        info!("Period set to {} minutes", minutes);
        self.persist().await?;
        Ok(ScaleResponse::PeriodSet(minutes))
    }

    /// The new values stay live even if they could not be written.
    async fn persist(&mut self) -> Result<(), ScaleError> {
        let config = self.scale.config();
        self.channels.publish_config(config);
        self.storage.save_config(&config).await.map_err(|e| {
            error!("Scale configuration not saved: {:?}", e);
            ScaleError::StorageFailed
        })
    }
}
