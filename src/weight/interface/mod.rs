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

pub mod hx711;

const ADC_DATA_MASK: u32 = 0x00FF_FFFF;
const ADC_SIGN_BIT: u32 = 0x0080_0000;

/// One conversion result from the strain gauge ADC.
///
/// The chip shifts out a 24 bit two's complement word. Flipping bit 23 turns it into an offset
/// binary value so that it can be compared and subtracted as a plain unsigned magnitude, which
/// is what the zero offset and scale factor are expressed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(u32);

impl RawSample {
    pub const MAX: RawSample = RawSample(ADC_DATA_MASK);

    /// Build a sample from the 24 bits exactly as clocked out of the ADC.
    pub const fn from_adc_bits(bits: u32) -> Self {
        Self((bits & ADC_DATA_MASK) ^ ADC_SIGN_BIT)
    }

    /// Build a sample from an already adjusted value. Bits above 23 are discarded.
    pub const fn new(value: u32) -> Self {
        Self(value & ADC_DATA_MASK)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<RawSample> for u32 {
    fn from(sample: RawSample) -> Self {
        sample.value()
    }
}

pub trait StrainGaugeInterface {
    type Error;

    /// Initialise the gauge and leave it in its low power state until the first reading.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Gets next reading from the strain gauge. The gauge is woken for the conversion and put
    /// back to sleep afterwards. Blocks until the conversion is clocked out or the ready wait
    /// times out.
    fn get_next_reading(&mut self) -> Result<RawSample, Self::Error>;

    /// Power down the strain gauge
    fn power_down(&mut self) -> Result<(), Self::Error>;

    /// Power up the strain gauge
    fn power_up(&mut self) -> Result<(), Self::Error>;
}
