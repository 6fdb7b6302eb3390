// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forward `tracing` events to the browser console.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Layer writing each event to the matching `console` method
struct ConsoleLayer;

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        let max_level = if VERBOSE.load(Ordering::Relaxed) {
            Level::DEBUG
        } else {
            Level::INFO
        };
        if level > max_level {
            return;
        }

        let mut visitor = ConsoleVisitor::default();
        event.record(&mut visitor);
        let line = format!(
            "[{}] {}{}",
            event.metadata().target(),
            visitor.message,
            visitor.fields
        );

        match level {
            Level::ERROR => web_sys::console::error_1(&line.into()),
            Level::WARN => web_sys::console::warn_1(&line.into()),
            Level::INFO => web_sys::console::info_1(&line.into()),
            _ => web_sys::console::debug_1(&line.into()),
        }
    }
}

#[derive(Default)]
struct ConsoleVisitor {
    message: String,
    fields: String,
}

impl Visit for ConsoleVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

/// Include debug events from now on
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Install the console subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    set_verbose(verbose);
    let subscriber = tracing_subscriber::registry().with(ConsoleLayer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        web_sys::console::debug_1(&"Console logging already initialized".into());
    }
}
