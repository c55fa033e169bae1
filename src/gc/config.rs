// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the background garbage collector.

use std::time::Duration;

/// Configuration for [`GcThread`](super::GcThread).
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Pause between garbage collection passes.
    pub interval: Duration,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
        }
    }
}

impl GcConfig {
    /// Sets the pause between passes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
