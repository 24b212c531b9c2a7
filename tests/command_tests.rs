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

mod common;

use common::{leak_channels, scale, FakeGauge, MemoryStorage, RecordingSink};
use embassy_futures::block_on;
use embassy_futures::join::join;
use hx711_publisher::command::console::{self, ConsoleError};
use hx711_publisher::command::remote::{handle_remote_command, RemoteReply};
use hx711_publisher::scheduler::report::DataKind;
use hx711_publisher::weight::calibration::{UnitsPerGram, WeightUnit, ZeroPoint};
use hx711_publisher::{
    AcquisitionManager, RawSample, ScaleConfig, ScaleError, TriggerSource, WeighingSystem,
    WeightReading, DEFAULT_MODULE_ID,
};

/// Scale that answers immediately and remembers what it was asked to do.
struct FakeScale {
    config: ScaleConfig,
    publishes: Vec<TriggerSource>,
    queue_full: bool,
    fail_with: Option<ScaleError>,
}

impl FakeScale {
    fn new() -> Self {
        Self {
            config: ScaleConfig {
                publish_period_minutes: 15,
                scale_factor: 50,
                zero_offset: 1000,
            },
            publishes: Vec::new(),
            queue_full: false,
            fail_with: None,
        }
    }

    fn check(&self) -> Result<(), ScaleError> {
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl WeighingSystem for FakeScale {
    async fn read_weight(&mut self) -> Result<WeightReading, ScaleError> {
        self.check()?;
        Ok(self.config.compute_weight(RawSample::new(1500)))
    }

    async fn tare(&mut self) -> Result<ZeroPoint, ScaleError> {
        self.check()?;
        self.config.zero_offset = 1500;
        Ok(self.config.zero_point())
    }

    async fn calibrate(&mut self, known_weight_grams: u32) -> Result<UnitsPerGram, ScaleError> {
        if known_weight_grams == 0 {
            return Err(ScaleError::CalibrationDivideByZero);
        }
        self.check()?;
        self.config.scale_factor = 1234;
        Ok(self.config.units_per_gram())
    }

    async fn set_publish_period(&mut self, minutes: u8) -> Result<(), ScaleError> {
        self.config.publish_period_minutes = minutes;
        self.check()
    }

    fn request_publish(&mut self, source: TriggerSource) -> bool {
        if self.queue_full {
            return false;
        }
        self.publishes.push(source);
        true
    }

    fn current_config(&self) -> ScaleConfig {
        self.config
    }
}

fn run(line: &str, scale: &mut FakeScale) -> (Result<(), ConsoleError>, String) {
    let mut out = String::new();
    let result = block_on(console::execute(line, scale, &mut out));
    (result, out)
}

#[test]
fn get_prints_weight() {
    let mut scale = FakeScale::new();
    let (result, out) = run("hx711 get", &mut scale);
    assert_eq!(result, Ok(()));
    assert_eq!(out, "Weight: 100 g\n");
    assert!(scale.publishes.is_empty());
}

#[test]
fn uncalibrated_get_prints_units() {
    let mut scale = FakeScale::new();
    scale.config.scale_factor = 0;
    let (_, out) = run("get", &mut scale);
    assert_eq!(out, "Weight: 500 units\n");
}

#[test]
fn send_queues_local_publish() {
    let mut scale = FakeScale::new();
    let (result, _) = run("send", &mut scale);
    assert_eq!(result, Ok(()));
    assert_eq!(scale.publishes, [TriggerSource::Send]);

    scale.queue_full = true;
    assert_eq!(run("send", &mut scale).0, Err(ConsoleError::Busy));
}

#[test]
fn zero_reports_new_point() {
    let mut scale = FakeScale::new();
    let (_, out) = run("zero", &mut scale);
    assert_eq!(out, "Zero set to 300 g\n");

    scale.config.scale_factor = 0;
    let (_, out) = run("zero", &mut scale);
    assert_eq!(out, "Zero set to 1500 units\n");
}

#[test]
fn cal_reports_units_per_gram() {
    let mut scale = FakeScale::new();
    let (result, out) = run("cal 500", &mut scale);
    assert_eq!(result, Ok(()));
    assert_eq!(out, "Calibration done, 123.4 units/g\n");
}

#[test]
fn cal_argument_errors() {
    let mut scale = FakeScale::new();
    assert_eq!(run("cal", &mut scale).0, Err(ConsoleError::MissingArg));
    assert_eq!(run("cal heavy", &mut scale).0, Err(ConsoleError::InvalidValue));
    assert_eq!(
        run("cal 0", &mut scale).0,
        Err(ConsoleError::Scale(ScaleError::CalibrationDivideByZero))
    );
    assert_eq!(scale.config.scale_factor, 50);
}

#[test]
fn period_sets_minutes() {
    let mut scale = FakeScale::new();
    let (result, out) = run("hx711 period 30", &mut scale);
    assert_eq!(result, Ok(()));
    assert_eq!(out, "Period set to 30 minutes\n");
    assert_eq!(scale.config.publish_period_minutes, 30);

    assert_eq!(run("period 256", &mut scale).0, Err(ConsoleError::OutOfRange));
    assert_eq!(run("period -1", &mut scale).0, Err(ConsoleError::InvalidValue));
    assert_eq!(scale.config.publish_period_minutes, 30);
}

#[test]
fn status_shows_configuration() {
    let mut scale = FakeScale::new();
    let (_, out) = run("status", &mut scale);
    assert_eq!(out, "Period: 15 minutes\nZero: 1000 units\nScale: 5.0 units/g\n");
}

#[test]
fn bare_module_name_lists_commands() {
    let mut scale = FakeScale::new();
    let (result, out) = run("hx711", &mut scale);
    assert_eq!(result, Ok(()));
    assert!(out.starts_with("[hx711] get - get results now\n"));
    assert!(out.contains("[hx711] cal <grams> - calibrate with known weight\n"));
    assert_eq!(out.lines().count(), 7);
    assert_eq!(run("help", &mut scale).1, out);
}

#[test]
fn empty_and_unknown_lines() {
    let mut scale = FakeScale::new();
    assert_eq!(run("   ", &mut scale), (Ok(()), String::new()));
    assert_eq!(run("tare", &mut scale).0, Err(ConsoleError::UnknownCommand));
}

#[test]
fn scale_errors_pass_through() {
    let mut scale = FakeScale::new();
    scale.fail_with = Some(ScaleError::HardwareTimeout);
    assert_eq!(
        run("get", &mut scale).0,
        Err(ConsoleError::Scale(ScaleError::HardwareTimeout))
    );
}

fn reply(kind: DataKind) -> Option<RemoteReply> {
    Some(RemoteReply {
        module_id: DEFAULT_MODULE_ID,
        kind,
    })
}

#[test]
fn remote_empty_request_is_ignored() {
    let mut scale = FakeScale::new();
    assert_eq!(block_on(handle_remote_command(&[], &mut scale, DEFAULT_MODULE_ID)), None);
    assert!(scale.publishes.is_empty());
}

#[test]
fn remote_poll_triggers_without_reply() {
    let mut scale = FakeScale::new();
    assert_eq!(block_on(handle_remote_command(&[0], &mut scale, DEFAULT_MODULE_ID)), None);
    assert_eq!(scale.publishes, [TriggerSource::RemotePoll]);
}

#[test]
fn remote_period_sets_and_acks() {
    let mut scale = FakeScale::new();
    let result = block_on(handle_remote_command(&[1, 45], &mut scale, DEFAULT_MODULE_ID));
    assert_eq!(result, reply(DataKind::Ok));
    assert_eq!(result.unwrap().encode(), [DEFAULT_MODULE_ID, 2]);
    assert_eq!(scale.config.publish_period_minutes, 45);
}

#[test]
fn remote_period_with_wrong_length_is_rejected() {
    let mut scale = FakeScale::new();
    for request in [&[1u8][..], &[1, 5, 0][..]] {
        let result = block_on(handle_remote_command(request, &mut scale, DEFAULT_MODULE_ID));
        assert_eq!(result, reply(DataKind::Error));
    }
    assert_eq!(scale.config.publish_period_minutes, 15);
}

#[test]
fn remote_unknown_opcode_is_rejected() {
    let mut scale = FakeScale::new();
    let result = block_on(handle_remote_command(&[9, 1], &mut scale, DEFAULT_MODULE_ID));
    assert_eq!(result.map(|r| r.encode()), Some([DEFAULT_MODULE_ID, 1]));
    assert!(scale.publishes.is_empty());
}

#[test]
fn remote_period_storage_failure_replies_error() {
    let mut scale = FakeScale::new();
    scale.fail_with = Some(ScaleError::StorageFailed);
    let result = block_on(handle_remote_command(&[1, 2], &mut scale, DEFAULT_MODULE_ID));
    assert_eq!(result, reply(DataKind::Error));
}

#[test]
fn console_drives_the_acquisition_worker() {
    let channels = leak_channels();
    let gauge = FakeGauge::reading(2000);
    let storage = MemoryStorage::default();
    let sink = RecordingSink::default();
    let mut manager = AcquisitionManager::new(
        channels,
        scale(&gauge, ScaleConfig::DEFAULT),
        storage.clone(),
        sink.clone(),
        DEFAULT_MODULE_ID,
    );
    let mut client = channels.client();

    let mut out = String::new();
    let ((), result) = block_on(join(
        manager.run_once(),
        console::execute("hx711 zero", &mut client, &mut out),
    ));
    assert_eq!(result, Ok(()));
    assert_eq!(out, "Zero set to 2000 units\n");

    gauge.raw.set(2500);
    let mut out = String::new();
    let ((), result) = block_on(join(
        manager.run_once(),
        console::execute("hx711 get", &mut client, &mut out),
    ));
    assert_eq!(result, Ok(()));
    assert_eq!(out, "Weight: 500 units\n");
    assert!(sink.reports().is_empty());

    assert_eq!(
        block_on(handle_remote_command(&[0], &mut client, DEFAULT_MODULE_ID)),
        None
    );
    block_on(manager.run_once());
    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_ack);
    assert_eq!(reports[0].weight, 500);
    assert_eq!(storage.saved.borrow().unwrap().zero_offset, 2000);
    assert_eq!(
        manager.config().compute_weight(RawSample::new(2500)).unit,
        WeightUnit::RawUnits
    );
}
