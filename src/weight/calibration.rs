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

//! Zero offset and scale factor handling.
//!
//! The scale factor is stored as raw units per tenth of a gram, so a weight in grams is
//! `(raw - zero_offset) * 10 / scale_factor`. All arithmetic is integer and truncating.

use crate::weight::interface::{RawSample, StrainGaugeInterface};
use crate::weight::ScaleError;
use core::fmt::{Display, Formatter};
use embassy_time::{Duration, Timer};

pub const DEFAULT_PUBLISH_PERIOD_MINUTES: u8 = 15;
pub const CALIBRATION_SAMPLES: usize = 10;
pub const DEFAULT_SAMPLE_PAUSE: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleConfig {
    /// 0 disables periodic publishing.
    pub publish_period_minutes: u8,
    /// Raw units per 0.1 g. 0 means uncalibrated and readings stay in raw units.
    pub scale_factor: u32,
    pub zero_offset: u32,
}

impl ScaleConfig {
    pub const DEFAULT: ScaleConfig = ScaleConfig {
        publish_period_minutes: DEFAULT_PUBLISH_PERIOD_MINUTES,
        scale_factor: 0,
        zero_offset: 0,
    };

    pub fn is_calibrated(&self) -> bool {
        self.scale_factor != 0
    }

    fn unit(&self) -> WeightUnit {
        if self.is_calibrated() {
            WeightUnit::Grams
        } else {
            WeightUnit::RawUnits
        }
    }

    /// Apply the scale factor to an offset-corrected value, if there is one.
    fn scale(&self, units: u32) -> u32 {
        if self.is_calibrated() {
            (units as u64 * 10 / self.scale_factor as u64) as u32
        } else {
            units
        }
    }

    pub fn compute_weight(&self, raw: RawSample) -> WeightReading {
        let above_zero = raw.value().saturating_sub(self.zero_offset);
        WeightReading {
            weight: self.scale(above_zero),
            raw,
            unit: self.unit(),
        }
    }

    /// The current zero offset expressed in the unit readings are reported in.
    pub fn zero_point(&self) -> ZeroPoint {
        ZeroPoint {
            value: self.scale(self.zero_offset),
            unit: self.unit(),
        }
    }

    pub fn units_per_gram(&self) -> UnitsPerGram {
        UnitsPerGram(self.scale_factor)
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WeightUnit {
    Grams,
    RawUnits,
}

impl WeightUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            WeightUnit::Grams => "g",
            WeightUnit::RawUnits => "units",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeightReading {
    pub weight: u32,
    pub raw: RawSample,
    pub unit: WeightUnit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZeroPoint {
    pub value: u32,
    pub unit: WeightUnit,
}

impl Display for ZeroPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.value, self.unit.suffix())
    }
}

/// A scale factor shown as units per gram with one decimal place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitsPerGram(pub u32);

impl Display for UnitsPerGram {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// Truncating mean of the samples.
pub fn zero_from_samples(samples: &[RawSample]) -> u32 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u64 = samples.iter().map(|s| s.value() as u64).sum();
    (sum / samples.len() as u64) as u32
}

/// Sum of the deflections above `zero_offset` divided by the reference weight.
pub fn scale_factor_from_samples(
    samples: &[RawSample],
    zero_offset: u32,
    known_weight_grams: u32,
) -> Result<u32, ScaleError> {
    if known_weight_grams == 0 {
        return Err(ScaleError::CalibrationDivideByZero);
    }

    let deflection: i64 = samples
        .iter()
        .map(|s| s.value() as i64 - zero_offset as i64)
        .sum();
    if deflection <= 0 {
        return Err(ScaleError::CalibrationOutOfRange);
    }

    let factor = deflection / known_weight_grams as i64;
    match u32::try_from(factor) {
        Ok(0) | Err(_) => Err(ScaleError::CalibrationOutOfRange),
        Ok(factor) => Ok(factor),
    }
}

pub struct WeightScale<StrainGauge> {
    strain_gauge: StrainGauge,
    config: ScaleConfig,
    sample_pause: Duration,
}

impl<StrainGauge> WeightScale<StrainGauge>
where
    StrainGauge: StrainGaugeInterface,
    StrainGauge::Error: Into<ScaleError>,
{
    pub fn new(mut strain_gauge: StrainGauge, config: ScaleConfig) -> Result<Self, ScaleError> {
        strain_gauge.initialize().map_err(Into::into)?;
        Ok(Self {
            strain_gauge,
            config,
            sample_pause: DEFAULT_SAMPLE_PAUSE,
        })
    }

    /// Pause between the samples taken by [`Self::tare`] and [`Self::calibrate`].
    pub fn with_sample_pause(mut self, sample_pause: Duration) -> Self {
        self.sample_pause = sample_pause;
        self
    }

    pub fn config(&self) -> ScaleConfig {
        self.config
    }

    fn acquire(&mut self) -> Result<RawSample, ScaleError> {
        let sample = self.strain_gauge.get_next_reading().map_err(Into::into);
        match sample {
            Ok(sample) => {
                trace!("Raw sample = {}", sample.value());
                Ok(sample)
            }
            Err(e) => {
                warn!("Strain gauge read failed: {:?}", e);
                Err(e)
            }
        }
    }

    async fn collect_samples(&mut self) -> Result<[RawSample; CALIBRATION_SAMPLES], ScaleError> {
        let mut samples = [RawSample::default(); CALIBRATION_SAMPLES];
        for (i, slot) in samples.iter_mut().enumerate() {
            if i != 0 && self.sample_pause.as_ticks() != 0 {
                Timer::after(self.sample_pause).await;
            }
            *slot = self.acquire()?;
        }
        Ok(samples)
    }

    pub fn get_instantaneous_weight(&mut self) -> Result<WeightReading, ScaleError> {
        let raw = self.acquire()?;
        let reading = self.config.compute_weight(raw);
        trace!("Reading = {} {}", reading.weight, reading.unit.suffix());
        Ok(reading)
    }

    pub async fn tare(&mut self) -> Result<ZeroPoint, ScaleError> {
        let samples = self.collect_samples().await?;
        self.config.zero_offset = zero_from_samples(&samples);
        trace!("Zero offset = {}", self.config.zero_offset);
        Ok(self.config.zero_point())
    }

    pub async fn calibrate(&mut self, known_weight_grams: u32) -> Result<UnitsPerGram, ScaleError> {
        if known_weight_grams == 0 {
            return Err(ScaleError::CalibrationDivideByZero);
        }
        let samples = self.collect_samples().await?;
        self.config.scale_factor =
            scale_factor_from_samples(&samples, self.config.zero_offset, known_weight_grams)?;
        trace!("Scale factor = {} units per 0.1 g", self.config.scale_factor);
        Ok(self.config.units_per_gram())
    }

    pub fn set_publish_period(&mut self, minutes: u8) {
        self.config.publish_period_minutes = minutes;
    }
}
