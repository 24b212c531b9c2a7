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

use crate::storage::{ConfigStorage, LoggableError, StorageError};
use crate::weight::calibration::ScaleConfig;
use core::ops::Range;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;
use sequential_storage::map::Value;

const DATA_BUFFER_SIZE: usize = 128;

/// Key/value store on a reserved flash range. The scale configuration is stored under the
/// module id, so several modules can share one range.
pub struct StorageManagerSequentialStorage<F> {
    flash: F,
    storage_range: Range<u32>,
    flash_cache: NoCache,
    config_key: u16,
}

impl<F> StorageManagerSequentialStorage<F>
where
    F: NorFlash,
    F::Error: LoggableError,
{
    pub fn new(flash: F, storage_range: Range<u32>, module_id: u8) -> Self {
        debug!(
            "Storage initialising. Flash address range: 0x{:x} to 0x{:x}",
            storage_range.start,
            storage_range.end,
        );
        Self {
            flash,
            storage_range,
            flash_cache: NoCache::new(),
            config_key: module_id as u16,
        }
    }

    pub fn release(self) -> F {
        self.flash
    }

    pub async fn clear_data(&mut self) -> Result<(), StorageError> {
        sequential_storage::erase_all(&mut self.flash, self.storage_range.clone())
            .await
            .map_err(|e| {
                warn!("Unable to erase storage. Error: {:?}", e);
                StorageError::EraseError
            })
    }

    async fn save_key_value_pair<'d, V: Value<'d>>(
        &mut self,
        key: u16,
        value: &V,
    ) -> Result<(), StorageError> {
        // must hold the largest serialised value, rounded up to the flash word size
        let mut data_buffer = [0; DATA_BUFFER_SIZE];

        map::store_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut self.flash_cache,
            &mut data_buffer,
            &key,
            value,
        )
        .await
        .map_err(|e| {
            error!("Unable to save key/value. Error {:?}", e);
            StorageError::SaveError
        })
    }

    async fn read_key_value_pair<V>(&mut self, key: u16) -> Result<Option<V>, StorageError>
    where
        for<'a> V: Value<'a>,
    {
        let mut data_buffer = [0; DATA_BUFFER_SIZE];

        map::fetch_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut self.flash_cache,
            &mut data_buffer,
            &key,
        )
        .await
        .map_err(|e| {
            warn!("Unable to read key value pair data. Error: {:?}", e);
            StorageError::RetrieveError
        })
    }
}

impl<F> ConfigStorage for StorageManagerSequentialStorage<F>
where
    F: NorFlash,
    F::Error: LoggableError,
{
    async fn load_config(&mut self) -> Result<Option<ScaleConfig>, StorageError> {
        self.read_key_value_pair::<ScaleConfig>(self.config_key).await
    }

    async fn save_config(&mut self, config: &ScaleConfig) -> Result<(), StorageError> {
        trace!("Saving scale configuration under key {}", self.config_key);
        self.save_key_value_pair(self.config_key, config).await
    }
}
