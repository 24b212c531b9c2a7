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

//! HX711 load cell publisher.
//!
//! A single acquisition worker owns the converter. Everything else (timer, button, console,
//! remote commands) asks it for work through [`scheduler::ScaleChannels`]:
//!
//! ```text
//! button / send / poll ──► trigger queue ──┐
//! period timer ────────────────────────────┼──► AcquisitionManager ──► Hx711 ──► ScaleConfig
//! console / remote ──► request channel ────┘            │
//!                                                       └──► ReportSink (host callback)
//! ```

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod command;
pub mod hmi;
pub mod scheduler;
pub mod storage;
pub mod weight;

pub use scheduler::acquisition_manager::AcquisitionManager;
pub use scheduler::report::{ReportSink, WeightReport};
pub use scheduler::{ScaleChannels, ScaleClient, TriggerSource};
pub use weight::calibration::{ScaleConfig, WeightReading, WeightScale};
pub use weight::interface::hx711::Hx711;
pub use weight::interface::{RawSample, StrainGaugeInterface};
pub use weight::{ScaleError, WeighingSystem};

/// Module identifier used as the first byte of every report and reply.
pub const DEFAULT_MODULE_ID: u8 = 0x28;
