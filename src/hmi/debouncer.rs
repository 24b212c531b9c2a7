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

use embassy_time::{Duration, Instant};
use embedded_hal_async::digital::Wait;

pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(500);

/// Accepts an edge only if more than `window` has passed since the last accepted one.
/// Rejected edges do not restart the window.
#[derive(Clone, Copy, Debug)]
pub struct EdgeDebouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl EdgeDebouncer {
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        let accepted = match self.last_accepted {
            None => true,
            Some(last) => now > last + self.window,
        };
        if accepted {
            self.last_accepted = Some(now);
        }
        accepted
    }
}

/// Active low push button on an interrupt capable input.
pub struct Debouncer<B> {
    input: B,
    edges: EdgeDebouncer,
}

impl<B: Wait> Debouncer<B> {
    pub fn new(input: B, debounce: Duration) -> Self {
        Self {
            input,
            edges: EdgeDebouncer::new(debounce),
        }
    }

    /// Wait for the next falling edge that falls outside the debounce window.
    pub async fn wait_for_press(&mut self) -> Result<(), B::Error> {
        loop {
            self.input.wait_for_falling_edge().await?;
            if self.edges.accept(Instant::now()) {
                return Ok(());
            }
            trace!("Button bounce ignored");
        }
    }
}
