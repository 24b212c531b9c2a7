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

//! Text commands. A line may be prefixed with the module name (`hx711 cal 500`); the bare
//! module name prints the command list.

use crate::scheduler::TriggerSource;
use crate::weight::{ScaleError, WeighingSystem};
use core::fmt::Write;
use core::str::FromStr;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

pub const SHELL_NAME: &str = "hx711";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub command: &'a str,
    pub args: [Option<&'a str>; 2],
}

impl<'a> ParsedCommand<'a> {
    pub fn arg(&self, idx: usize) -> Option<&'a str> {
        self.args.get(idx).copied().flatten()
    }
}

/// Split on whitespace, dropping the optional module name prefix.
pub fn parse_line(line: &str) -> ParsedCommand<'_> {
    let mut parts = line.split_whitespace().peekable();
    if parts.peek() == Some(&SHELL_NAME) {
        parts.next();
    }

    let command = parts.next().unwrap_or("");
    let mut args = [None, None];
    for (i, arg) in parts.take(2).enumerate() {
        args[i] = Some(arg);
    }

    ParsedCommand { command, args }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ConsoleCommand {
    Get,
    Send,
    Zero,
    Cal,
    Period,
    Status,
    Help,
}

impl ConsoleCommand {
    pub fn usage(&self) -> &'static str {
        match self {
            ConsoleCommand::Get => "get - get results now",
            ConsoleCommand::Send => "send - send results now",
            ConsoleCommand::Zero => "zero - set zero",
            ConsoleCommand::Cal => "cal <grams> - calibrate with known weight",
            ConsoleCommand::Period => "period <minutes> - set publish period, 0 disables",
            ConsoleCommand::Status => "status - show current configuration",
            ConsoleCommand::Help => "help - list commands",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleError {
    UnknownCommand,
    InvalidValue,
    MissingArg,
    OutOfRange,
    /// Publish queue full.
    Busy,
    Scale(ScaleError),
}

impl ConsoleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "E01",
            Self::InvalidValue => "E02",
            Self::MissingArg => "E03",
            Self::OutOfRange => "E04",
            Self::Busy => "E05",
            Self::Scale(_) => "E06",
        }
    }
}

impl From<ScaleError> for ConsoleError {
    fn from(e: ScaleError) -> Self {
        ConsoleError::Scale(e)
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "{}: unknown command", self.code()),
            Self::InvalidValue => write!(f, "{}: invalid value", self.code()),
            Self::MissingArg => write!(f, "{}: missing argument", self.code()),
            Self::OutOfRange => write!(f, "{}: out of range", self.code()),
            Self::Busy => write!(f, "{}: publish queue full", self.code()),
            Self::Scale(e) => write!(f, "{}: {}", self.code(), e),
        }
    }
}

fn parse_arg<T: FromStr>(cmd: &ParsedCommand<'_>, idx: usize) -> Result<T, ConsoleError> {
    cmd.arg(idx)
        .ok_or(ConsoleError::MissingArg)?
        .parse::<T>()
        .map_err(|_| ConsoleError::InvalidValue)
}

/// Run one console line against the scale, writing the result to `out`.
pub async fn execute<WS: WeighingSystem>(
    line: &str,
    scale: &mut WS,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let cmd = parse_line(line);
    if cmd.command.is_empty() {
        if line.split_whitespace().next() == Some(SHELL_NAME) {
            print_help(out);
        }
        return Ok(());
    }

    let command = ConsoleCommand::from_str(cmd.command).map_err(|_| ConsoleError::UnknownCommand)?;
    match command {
        ConsoleCommand::Get => {
            let reading = scale.read_weight().await?;
            let _ = writeln!(out, "Weight: {} {}", reading.weight, reading.unit.suffix());
        }
        ConsoleCommand::Send => {
            if !scale.request_publish(TriggerSource::Send) {
                return Err(ConsoleError::Busy);
            }
            let _ = writeln!(out, "Publish requested");
        }
        ConsoleCommand::Zero => {
            let zero = scale.tare().await?;
            let _ = writeln!(out, "Zero set to {}", zero);
        }
        ConsoleCommand::Cal => {
            let grams: u32 = parse_arg(&cmd, 0)?;
            let factor = scale.calibrate(grams).await?;
            let _ = writeln!(out, "Calibration done, {} units/g", factor);
        }
        ConsoleCommand::Period => {
            let minutes: u32 = parse_arg(&cmd, 0)?;
            let minutes = u8::try_from(minutes).map_err(|_| ConsoleError::OutOfRange)?;
            scale.set_publish_period(minutes).await?;
            let _ = writeln!(out, "Period set to {} minutes", minutes);
        }
        ConsoleCommand::Status => {
            let config = scale.current_config();
            let _ = writeln!(out, "Period: {} minutes", config.publish_period_minutes);
            let _ = writeln!(out, "Zero: {} units", config.zero_offset);
            if config.is_calibrated() {
                let _ = writeln!(out, "Scale: {} units/g", config.units_per_gram());
            } else {
                let _ = writeln!(out, "Scale: uncalibrated");
            }
        }
        ConsoleCommand::Help => print_help(out),
    }
    Ok(())
}

fn print_help(out: &mut dyn Write) {
    for command in ConsoleCommand::iter() {
        let _ = writeln!(out, "[{}] {}", SHELL_NAME, command.usage());
    }
}

pub fn command_names() -> impl Iterator<Item = &'static str> {
    ConsoleCommand::iter().map(|c| c.into())
}
