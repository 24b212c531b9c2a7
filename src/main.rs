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

#![no_std]
#![no_main]

use core::fmt::Write as _;
use core::ops::Range;

use assign_resources::assign_resources;
use defmt::{error, info, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_rp::flash::{self, Flash};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUart};
use embassy_rp::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pubsub::PubSubChannel;
use embassy_time::Delay;
use embedded_io_async::{Read, Write};
use heapless::{String, Vec};
use static_cell::StaticCell;
#[allow(unused_imports)]
use {defmt_rtt as _, panic_probe as _};

use hx711_publisher::command::{console, remote};
use hx711_publisher::hmi::debouncer::{Debouncer, BUTTON_DEBOUNCE};
use hx711_publisher::hmi::inputs::connect_button_handler;
use hx711_publisher::scheduler::report::{
    ReportChannel, ReportChannelPublisher, ReportChannelSubscriber,
};
use hx711_publisher::storage::load_or_default;
use hx711_publisher::storage::storage_manager::StorageManagerSequentialStorage;
use hx711_publisher::{AcquisitionManager, Hx711, ScaleChannels, WeightScale, DEFAULT_MODULE_ID};

const FLASH_SIZE: usize = 2 * 1024 * 1024;
/// Last two erase blocks of the flash, kept out of the image by memory.x.
const CONFIG_STORAGE_RANGE: Range<u32> = 0x1F_E000..0x20_0000;

const CONSOLE_LINE_LEN: usize = 64;
const CONSOLE_OUTPUT_LEN: usize = 256;
const REMOTE_FRAME_LEN: usize = 16;

pub type RemoteFrame = Vec<u8, REMOTE_FRAME_LEN>;

static SCALE_CHANNELS: ScaleChannels = ScaleChannels::new();
static REPORT_CHANNEL: ReportChannel = PubSubChannel::new();
/// Entry point for the host link. Its transport pushes received command frames here and
/// `remote_command_task` answers them in order.
static REMOTE_REQUESTS: Channel<CriticalSectionRawMutex, RemoteFrame, 2> = Channel::new();

static UART_TX_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

assign_resources! {
    strain_gauge_io: StrainGaugeResources {
        clk_pin: PIN_14,
        data_pin: PIN_15,
    },
    config_flash: ConfigFlashResources {
        flash: FLASH,
        dma_channel: DMA_CH0,
    },
    connect_button: ConnectButtonResources {
        button_pin: PIN_6,
    },
    console_uart: ConsoleUartResources {
        uart: UART0,
        tx_pin: PIN_0,
        rx_pin: PIN_1,
    }
}

bind_interrupts!(struct UartIrqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let resources = split_resources! {p};

    let uart = BufferedUart::new(
        resources.console_uart.uart,
        UartIrqs,
        resources.console_uart.tx_pin,
        resources.console_uart.rx_pin,
        UART_TX_BUFFER.init([0; 64]),
        UART_RX_BUFFER.init([0; 64]),
        uart::Config::default(),
    );

    info!("Starting HX711 publisher, module id 0x{:x}", DEFAULT_MODULE_ID);

    spawner
        .spawn(acquisition_task(
            resources.strain_gauge_io,
            resources.config_flash,
            REPORT_CHANNEL.publisher().unwrap(),
        ))
        .unwrap();
    spawner
        .spawn(connect_button_task(resources.connect_button))
        .unwrap();
    spawner.spawn(console_task(uart)).unwrap();
    spawner.spawn(remote_command_task()).unwrap();
    spawner
        .spawn(report_task(REPORT_CHANNEL.subscriber().unwrap()))
        .unwrap();
}

#[embassy_executor::task]
async fn acquisition_task(
    strain_gauge_resources: StrainGaugeResources,
    flash_resources: ConfigFlashResources,
    report_publisher: ReportChannelPublisher<'static>,
) {
    let flash = BlockingAsync::new(Flash::<_, flash::Async, FLASH_SIZE>::new(
        flash_resources.flash,
        flash_resources.dma_channel,
    ));
    let mut storage =
        StorageManagerSequentialStorage::new(flash, CONFIG_STORAGE_RANGE, DEFAULT_MODULE_ID);
    let config = load_or_default(&mut storage).await;

    // clock high keeps the converter asleep until the first read
    let clk_pin_out = Output::new(strain_gauge_resources.clk_pin, Level::High);
    let data_pin = Input::new(strain_gauge_resources.data_pin, Pull::Up);
    let strain_gauge = Hx711::new(clk_pin_out, data_pin, Delay);

    let weight_scale = match WeightScale::new(strain_gauge, config) {
        Ok(scale) => scale,
        Err(e) => {
            error!("Strain gauge initialisation failed: {:?}", e);
            return;
        }
    };

    let mut acquisition_manager = AcquisitionManager::new(
        &SCALE_CHANNELS,
        weight_scale,
        storage,
        report_publisher,
        DEFAULT_MODULE_ID,
    );
    acquisition_manager.run().await;
}

#[embassy_executor::task]
async fn connect_button_task(button_resources: ConnectButtonResources) {
    let button = Debouncer::new(
        Input::new(button_resources.button_pin, Pull::Up),
        BUTTON_DEBOUNCE,
    );
    connect_button_handler(&SCALE_CHANNELS, button).await;
}

#[embassy_executor::task]
async fn console_task(mut uart: BufferedUart<'static, UART0>) {
    let mut scale = SCALE_CHANNELS.client();
    let mut line: String<CONSOLE_LINE_LEN> = String::new();
    let mut byte = [0u8; 1];

    let _ = uart
        .write_all(b"type 'hx711' for commands list\r\n> ")
        .await;

    loop {
        match uart.read(&mut byte).await {
            Ok(0) => continue,
            Ok(_) => {}
            Err(e) => {
                warn!("Console read error: {:?}", e);
                continue;
            }
        }

        match byte[0] {
            b'\r' | b'\n' => {
                let mut out: String<CONSOLE_OUTPUT_LEN> = String::new();
                let _ = out.push_str("\r\n");
                if let Err(e) = console::execute(&line, &mut scale, &mut out).await {
                    let _ = writeln!(out, "{}", e);
                }
                let _ = out.push_str("> ");
                line.clear();
                let _ = uart.write_all(out.as_bytes()).await;
            }
            0x08 | 0x7F => {
                if line.pop().is_some() {
                    let _ = uart.write_all(b"\x08 \x08").await;
                }
            }
            c if c.is_ascii_graphic() || c == b' ' => {
                if line.push(c as char).is_ok() {
                    let _ = uart.write_all(&byte).await;
                } else {
                    warn!("Console line too long");
                }
            }
            _ => {}
        }
    }
}

#[embassy_executor::task]
async fn remote_command_task() {
    let mut scale = SCALE_CHANNELS.client();
    loop {
        let frame = REMOTE_REQUESTS.receive().await;
        match remote::handle_remote_command(&frame, &mut scale, DEFAULT_MODULE_ID).await {
            Some(reply) => info!("Remote reply {:02x}", reply.encode()),
            None => info!("Remote request handled, no reply"),
        }
    }
}

#[embassy_executor::task]
async fn report_task(mut reports: ReportChannelSubscriber<'static>) {
    loop {
        let report = reports.next_message_pure().await;
        info!(
            "Report {:02x} ack: {}",
            report.encode(),
            report.is_ack
        );
    }
}
