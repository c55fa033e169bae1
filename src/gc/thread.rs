// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Background thread running periodic garbage collection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{info, warn};

use super::{GarbageCollector, GcConfig};

/// Runs [`GarbageCollector::perform_gc`] every configured interval until stopped.
pub struct GcThread {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<GarbageCollector>>,
}

impl GcThread {
    /// Spawns the background thread.
    pub fn start(mut gc: GarbageCollector, config: GcConfig) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let interval = config.interval;

        let handle = std::thread::spawn(move || {
            while !shutdown_clone.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                gc.perform_gc();
            }
            gc
        });

        info!(?interval, "started gc thread");
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stops the thread and hands back its collector.
    ///
    /// Returns `None` if the thread panicked.
    pub fn stop(mut self) -> Option<GarbageCollector> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> Option<GarbageCollector> {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(gc) => Some(gc),
            Err(_) => {
                warn!("gc thread panicked");
                None
            }
        }
    }
}

impl Drop for GcThread {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
