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

//! Bit-banged HX711 driver.
//!
//! All waits are spin delays through [`DelayNs`]. The 25 clock pulses are issued inside a
//! critical section: holding SCK high for more than 60 µs puts the chip into power down and
//! corrupts the word, so nothing may preempt the transfer.
//!
//! Worst case duration of a successful read is roughly 2 ms of wake/settle time, the ready wait
//! (bounded by the ready timeout) and 25 × 4 µs of clocking.

use crate::weight::interface::{RawSample, StrainGaugeInterface};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

const WAKE_UP_DELAY_US: u32 = 1000;
const SETTLING_DELAY_US: u32 = 1000;
const CLK_HALF_PERIOD_US: u32 = 2;
const READY_POLL_INTERVAL_US: u32 = 10;
const VALID_DATA_BITS: usize = 24;
/// One extra pulse after the data selects channel A, gain 128 for the next conversion.
const GAIN_CLOCKS: usize = 1;

/// Default bound on the wait for DOUT to go low. At 10 SPS a conversion is due every 100 ms.
pub const DEFAULT_READY_TIMEOUT_US: u32 = 1_000_000;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
    /// DOUT never signalled a finished conversion within the ready timeout.
    HardwareTimeout,
}

pub struct Hx711<CLK, DATA, D> {
    clock_pin: CLK,
    data_pin: DATA,
    delay: D,
    ready_timeout_us: u32,
}

impl<CLK, DATA, D, ClkE, DataE> Hx711<CLK, DATA, D>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, delay: D) -> Self {
        Self {
            clock_pin,
            data_pin,
            delay,
            ready_timeout_us: DEFAULT_READY_TIMEOUT_US,
        }
    }

    pub fn with_ready_timeout_us(mut self, ready_timeout_us: u32) -> Self {
        self.ready_timeout_us = ready_timeout_us;
        self
    }

    /// Spin until DOUT goes low, polling every [`READY_POLL_INTERVAL_US`].
    fn wait_until_ready(&mut self) -> Result<(), Error<ClkE, DataE>> {
        let mut waited_us: u32 = 0;
        while self.data_pin.is_high().map_err(Error::InPin)? {
            if waited_us >= self.ready_timeout_us {
                return Err(Error::HardwareTimeout);
            }
            self.delay.delay_us(READY_POLL_INTERVAL_US);
            waited_us = waited_us.saturating_add(READY_POLL_INTERVAL_US);
        }
        Ok(())
    }

    fn clock_pulse(&mut self) -> Result<bool, Error<ClkE, DataE>> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        self.delay.delay_us(CLK_HALF_PERIOD_US);
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        let bit = self.data_pin.is_high().map_err(Error::InPin)?;
        self.delay.delay_us(CLK_HALF_PERIOD_US);
        Ok(bit)
    }

    /// Clock out the data word MSB first, then the gain selection pulse.
    fn shift_in_word(&mut self) -> Result<u32, Error<ClkE, DataE>> {
        critical_section::with(|_cs| {
            let mut data: u32 = 0;
            for _ in 0..VALID_DATA_BITS {
                let bit = self.clock_pulse()?;
                data <<= 1;
                if bit {
                    data |= 0x1;
                }
            }
            for _ in 0..GAIN_CLOCKS {
                self.clock_pulse()?;
            }
            Ok(data)
        })
    }

    fn read_raw(&mut self) -> Result<RawSample, Error<ClkE, DataE>> {
        self.power_up()?;

        if let Err(e) = self.wait_until_ready() {
            // leave the chip asleep rather than powered with nobody reading it
            self.power_down()?;
            return Err(e);
        }

        self.delay.delay_us(SETTLING_DELAY_US);
        let data = match self.shift_in_word() {
            Ok(data) => data,
            Err(e) => {
                self.power_down()?;
                return Err(e);
            }
        };
        self.delay.delay_us(SETTLING_DELAY_US);
        self.power_down()?;

        Ok(RawSample::from_adc_bits(data))
    }
}

impl<CLK, DATA, D, ClkE, DataE> StrainGaugeInterface for Hx711<CLK, DATA, D>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
{
    type Error = Error<ClkE, DataE>;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_down()
    }

    fn get_next_reading(&mut self) -> Result<RawSample, Self::Error> {
        self.read_raw()
    }

    fn power_down(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_high().map_err(Error::OutPin)
    }

    fn power_up(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        self.delay.delay_us(WAKE_UP_DELAY_US);
        Ok(())
    }
}
