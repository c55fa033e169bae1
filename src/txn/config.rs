// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the transaction manager.

use crate::time::Timestamp;

/// Configuration for [`TransactionManager`](super::TransactionManager) initialization.
#[derive(Debug, Clone)]
pub struct TransactionManagerConfig {
    /// Queue completed transactions for the garbage collector.
    ///
    /// When disabled, finished contexts are dropped from the manager and their
    /// lifetime is left to the caller.
    pub gc_enabled: bool,
    /// First timestamp the manager's clock issues.
    pub initial_timestamp: Timestamp,
}

impl Default for TransactionManagerConfig {
    fn default() -> Self {
        Self {
            gc_enabled: true,
            initial_timestamp: Timestamp::default(),
        }
    }
}

impl TransactionManagerConfig {
    /// Enables or disables handing completed transactions to the garbage collector.
    pub fn with_gc(mut self, enabled: bool) -> Self {
        self.gc_enabled = enabled;
        self
    }

    /// Sets the first timestamp the clock issues.
    pub fn with_initial_timestamp(mut self, ts: Timestamp) -> Self {
        self.initial_timestamp = ts;
        self
    }
}
