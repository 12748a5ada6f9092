// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging bootstrap.
//!
//! Structured logs go to stderr, filtered by `WARDEN_LOG`. Debug mode
//! (the `debug` pool setting or a truthy `WARDEN_DEBUG`) adds a verbose
//! file layer writing to `<lockdir>/debug.log`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use warden_pool::PoolSettings;

pub fn init(settings: &PoolSettings) -> Option<WorkerGuard> {
    let debug = debug_enabled(settings);
    let filter = EnvFilter::try_from_env("WARDEN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if debug {
        if let Err(e) = std::fs::create_dir_all(&settings.lock_dir) {
            eprintln!(
                "warning: cannot create {} for debug logs: {e}",
                settings.lock_dir.display()
            );
        }
        let appender = tracing_appender::rolling::never(&settings.lock_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        None
    }
}

fn debug_enabled(settings: &PoolSettings) -> bool {
    if settings.debug {
        return true;
    }
    match std::env::var("WARDEN_DEBUG") {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            !value.is_empty() && value != "0" && value != "false"
        }
        Err(_) => false,
    }
}
