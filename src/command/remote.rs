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

//! Binary commands from the host. The first byte is the opcode.
//!
//! | opcode | payload     | reply                                  |
//! |--------|-------------|----------------------------------------|
//! | 0 POLL | none        | none now, report later with ack set    |
//! | 1 PERIOD | minutes (u8) | OK, or ERROR if the length is not 2 |
//! | other  |             | ERROR                                  |

use crate::scheduler::report::DataKind;
use crate::scheduler::TriggerSource;
use crate::weight::WeighingSystem;

pub const REMOTE_REPLY_LEN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RemoteOpcode {
    Poll = 0,
    Period = 1,
}

impl TryFrom<u8> for RemoteOpcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RemoteOpcode::Poll),
            1 => Ok(RemoteOpcode::Period),
            other => Err(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteReply {
    pub module_id: u8,
    pub kind: DataKind,
}

impl RemoteReply {
    fn ok(module_id: u8) -> Self {
        Self {
            module_id,
            kind: DataKind::Ok,
        }
    }

    fn error(module_id: u8) -> Self {
        Self {
            module_id,
            kind: DataKind::Error,
        }
    }

    pub fn encode(&self) -> [u8; REMOTE_REPLY_LEN] {
        [self.module_id, self.kind as u8]
    }
}

/// Handle one remote request. `None` means nothing is sent back now.
pub async fn handle_remote_command<WS: WeighingSystem>(
    request: &[u8],
    scale: &mut WS,
    module_id: u8,
) -> Option<RemoteReply> {
    let (&opcode, payload) = request.split_first()?;

    match RemoteOpcode::try_from(opcode) {
        Ok(RemoteOpcode::Poll) => {
            if !scale.request_publish(TriggerSource::RemotePoll) {
                warn!("Remote poll dropped");
            }
            None
        }
        Ok(RemoteOpcode::Period) => {
            let &[minutes] = payload else {
                warn!("PERIOD command with {} byte payload", payload.len());
                return Some(RemoteReply::error(module_id));
            };
            match scale.set_publish_period(minutes).await {
                Ok(()) => Some(RemoteReply::ok(module_id)),
                Err(e) => {
                    warn!("PERIOD command failed: {:?}", e);
                    Some(RemoteReply::error(module_id))
                }
            }
        }
        Err(unknown) => {
            warn!("Unknown remote opcode {}", unknown);
            Some(RemoteReply::error(module_id))
        }
    }
}
