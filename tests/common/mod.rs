#![allow(dead_code)]

use std::sync::Once;

pub mod fixtures;

pub use fixtures::{FlakyStore, IssueBuilder, RecordingListener, ScriptedClient};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        redquery::logging::init_test_logging();
    });
}
