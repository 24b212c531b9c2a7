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

pub mod calibration;
pub mod interface;

use crate::scheduler::TriggerSource;
use crate::weight::calibration::{ScaleConfig, UnitsPerGram, WeightReading, ZeroPoint};
use core::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleError {
    /// The converter never reported a finished conversion.
    HardwareTimeout,
    /// A pin could not be driven or read.
    AcquisitionFailed,
    CalibrationDivideByZero,
    /// Reference load produced no usable positive deflection.
    CalibrationOutOfRange,
    /// The new configuration is live but could not be written to flash.
    StorageFailed,
}

impl Display for ScaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ScaleError::HardwareTimeout => "ADC not ready (timeout)",
            ScaleError::AcquisitionFailed => "ADC read failed",
            ScaleError::CalibrationDivideByZero => "calibration weight must be non-zero",
            ScaleError::CalibrationOutOfRange => "calibration reading out of range",
            ScaleError::StorageFailed => "failed to save configuration",
        };
        f.write_str(msg)
    }
}

impl<OutPinE, InPinE> From<interface::hx711::Error<OutPinE, InPinE>> for ScaleError {
    fn from(e: interface::hx711::Error<OutPinE, InPinE>) -> Self {
        match e {
            interface::hx711::Error::HardwareTimeout => ScaleError::HardwareTimeout,
            interface::hx711::Error::OutPin(_) | interface::hx711::Error::InPin(_) => {
                ScaleError::AcquisitionFailed
            }
        }
    }
}

/// Operations the command surfaces need from the scale. Implemented by
/// [`crate::scheduler::ScaleClient`], which forwards everything to the acquisition worker.
#[allow(async_fn_in_trait)]
pub trait WeighingSystem {
    /// Take one reading and return it without publishing it.
    async fn read_weight(&mut self) -> Result<WeightReading, ScaleError>;

    /// Average the unloaded scale and store the result as the new zero offset.
    async fn tare(&mut self) -> Result<ZeroPoint, ScaleError>;

    /// Derive the scale factor from a known weight placed on the scale.
    async fn calibrate(&mut self, known_weight_grams: u32) -> Result<UnitsPerGram, ScaleError>;

    /// Change the publishing period; 0 disables periodic publishing.
    async fn set_publish_period(&mut self, minutes: u8) -> Result<(), ScaleError>;

    /// Ask for an out of cycle publish. Returns false if the trigger was dropped.
    fn request_publish(&mut self, source: TriggerSource) -> bool;

    fn current_config(&self) -> ScaleConfig;
}
