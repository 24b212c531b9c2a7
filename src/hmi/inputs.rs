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

use crate::hmi::debouncer::Debouncer;
use crate::scheduler::{ScaleChannels, TriggerSource};
use embedded_hal_async::digital::Wait;

/// Each debounced press of the connect button queues an immediate publish.
pub async fn connect_button_handler<B>(channels: &ScaleChannels, mut button: Debouncer<B>) -> !
where
    B: Wait,
{
    loop {
        match button.wait_for_press().await {
            Ok(()) => {
                debug!("Connect button pressed");
                channels.trigger(TriggerSource::Button);
            }
            Err(_) => {
                warn!("Connect button input failed");
            }
        }
    }
}
