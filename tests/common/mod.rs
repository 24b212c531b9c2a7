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

#![allow(dead_code)]

use embassy_time::Duration;
use embedded_storage_async::nor_flash::{
    ErrorType, MultiwriteNorFlash, NorFlash, NorFlashErrorKind, ReadNorFlash,
};
use hx711_publisher::storage::{ConfigStorage, StorageError};
use hx711_publisher::{
    RawSample, ReportSink, ScaleChannels, ScaleConfig, ScaleError, StrainGaugeInterface,
    WeightReport, WeightScale,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Load cell whose output the test controls.
#[derive(Clone, Default)]
pub struct FakeGauge {
    pub raw: Rc<Cell<u32>>,
    pub fail: Rc<Cell<bool>>,
    pub reads: Rc<Cell<usize>>,
}

impl FakeGauge {
    pub fn reading(raw: u32) -> Self {
        let gauge = Self::default();
        gauge.raw.set(raw);
        gauge
    }
}

impl StrainGaugeInterface for FakeGauge {
    type Error = ScaleError;

    fn initialize(&mut self) -> Result<(), ScaleError> {
        Ok(())
    }

    fn get_next_reading(&mut self) -> Result<RawSample, ScaleError> {
        if self.fail.get() {
            return Err(ScaleError::HardwareTimeout);
        }
        self.reads.set(self.reads.get() + 1);
        Ok(RawSample::new(self.raw.get()))
    }

    fn power_down(&mut self) -> Result<(), ScaleError> {
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), ScaleError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink(pub Rc<RefCell<Vec<WeightReport>>>);

impl RecordingSink {
    pub fn reports(&self) -> Vec<WeightReport> {
        self.0.borrow().clone()
    }
}

impl ReportSink for RecordingSink {
    fn deliver(&mut self, report: WeightReport) {
        self.0.borrow_mut().push(report);
    }
}

/// Config store kept in RAM.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    pub saved: Rc<RefCell<Option<ScaleConfig>>>,
    pub fail_saves: Rc<Cell<bool>>,
}

impl ConfigStorage for MemoryStorage {
    async fn load_config(&mut self) -> Result<Option<ScaleConfig>, StorageError> {
        Ok(*self.saved.borrow())
    }

    async fn save_config(&mut self, config: &ScaleConfig) -> Result<(), StorageError> {
        if self.fail_saves.get() {
            return Err(StorageError::SaveError);
        }
        *self.saved.borrow_mut() = Some(*config);
        Ok(())
    }
}

pub fn scale(gauge: &FakeGauge, config: ScaleConfig) -> WeightScale<FakeGauge> {
    WeightScale::new(gauge.clone(), config)
        .unwrap()
        .with_sample_pause(Duration::from_ticks(0))
}

pub fn leak_channels() -> &'static ScaleChannels {
    Box::leak(Box::new(ScaleChannels::new()))
}

pub const PAGE_SIZE: usize = 1024;
pub const PAGES: usize = 4;

/// NOR flash in RAM. Writes can only clear bits, like the real part.
pub struct MemFlash {
    pub data: Vec<u8>,
    pub fail_writes: bool,
}

impl MemFlash {
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; PAGE_SIZE * PAGES],
            fail_writes: false,
        }
    }

    pub fn range() -> core::ops::Range<u32> {
        0..(PAGE_SIZE * PAGES) as u32
    }
}

impl ErrorType for MemFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for MemFlash {
    const READ_SIZE: usize = 1;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        bytes.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl NorFlash for MemFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = PAGE_SIZE;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from % PAGE_SIZE != 0 || to % PAGE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if to > self.data.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        self.data[from..to].fill(0xFF);
        Ok(())
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(NorFlashErrorKind::Other);
        }
        let start = offset as usize;
        if start % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if start + bytes.len() > self.data.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        for (cell, byte) in self.data[start..].iter_mut().zip(bytes) {
            *cell &= *byte;
        }
        Ok(())
    }
}

impl MultiwriteNorFlash for MemFlash {}
