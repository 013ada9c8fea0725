//! Scenario tests driven through `StubEngine`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::config::BridgeConfig;
use crate::core::{Compositor, StubEngine};

mod dispatch;
mod enumeration;
mod lifecycle;

fn setup() -> (Rc<StubEngine>, Compositor) {
    let engine = Rc::new(StubEngine::new());
    let compositor = Compositor::new(engine.clone(), BridgeConfig::for_tests());
    (engine, compositor)
}

/// Shared event log for handlers to push into.
fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}

/// One captured `tracing` event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    level: Level,
    target: String,
    message: String,
}

#[derive(Clone, Default)]
struct Capture {
    records: Arc<Mutex<Vec<Record>>>,
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        if let Ok(mut records) = self.records.lock() {
            records.push(Record {
                level: *metadata.level(),
                target: metadata.target().to_owned(),
                message: visitor.0,
            });
        }
    }
}

/// Run `f` with a subscriber that records every event on this thread, and
/// return the records whose target is `target` or below it.
fn capture_logs(target: &str, f: impl FnOnce()) -> Vec<Record> {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);

    let prefix = format!("{target}::");
    let records = capture.records.lock().map(|r| r.clone()).unwrap_or_default();
    records
        .into_iter()
        .filter(|record| record.target == target || record.target.starts_with(&prefix))
        .collect()
}
