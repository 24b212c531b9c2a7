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

pub mod config_record;
pub mod storage_manager;

use crate::weight::calibration::ScaleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    SaveError,
    RetrieveError,
    EraseError,
}

/// Error types that can be handed to the logging macros on either back end.
#[cfg(feature = "defmt")]
pub trait LoggableError: core::fmt::Debug + defmt::Format {}
#[cfg(feature = "defmt")]
impl<T: core::fmt::Debug + defmt::Format> LoggableError for T {}

#[cfg(not(feature = "defmt"))]
pub trait LoggableError: core::fmt::Debug {}
#[cfg(not(feature = "defmt"))]
impl<T: core::fmt::Debug> LoggableError for T {}

/// Where the scale configuration record lives between power cycles.
#[allow(async_fn_in_trait)]
pub trait ConfigStorage {
    /// `Ok(None)` when no record has been written yet.
    async fn load_config(&mut self) -> Result<Option<ScaleConfig>, StorageError>;

    /// Replace the stored record in full.
    async fn save_config(&mut self, config: &ScaleConfig) -> Result<(), StorageError>;
}

/// Read the stored configuration, falling back to defaults if it is missing or unreadable.
pub async fn load_or_default<S: ConfigStorage>(storage: &mut S) -> ScaleConfig {
    match storage.load_config().await {
        Ok(Some(config)) => {
            debug!("Loaded scale configuration {:?}", config);
            config
        }
        Ok(None) => {
            warn!("No stored scale configuration, using defaults");
            ScaleConfig::DEFAULT
        }
        Err(e) => {
            warn!("Scale configuration unreadable ({:?}), using defaults", e);
            ScaleConfig::DEFAULT
        }
    }
}
