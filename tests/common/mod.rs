//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use waypost::{Event, Shape};

/// Write `content` to a fresh file under the temp directory.
pub fn write_config(content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("waypost-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("waypost.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Collects events delivered to a handler.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records into this recorder.
    pub fn handler(&self) -> impl Fn(&Event) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &Event| events.lock().unwrap().push(event.clone())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn shapes(&self) -> Vec<Shape> {
        self.events().iter().map(Event::shape).collect()
    }
}

/// Ordered log of labels, for ordering assertions.
#[derive(Clone, Default)]
pub struct Trace {
    labels: Arc<Mutex<Vec<&'static str>>>,
}

impl Trace {
    pub fn mark(&self, label: &'static str) -> impl Fn(&Event) + Send + Sync + 'static {
        let labels = Arc::clone(&self.labels);
        move |_: &Event| labels.lock().unwrap().push(label)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.labels.lock().unwrap().clone()
    }
}
