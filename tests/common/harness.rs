//! tests/common/harness.rs
use smart_timers::{Action, FrameTime, Lifeline, Scheduler};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Once;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "smart_timers=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A callback that counts its invocations.
pub fn counting_action() -> (Action, Rc<Cell<u32>>) {
    let count = Rc::new(Cell::new(0));
    let counter = Rc::clone(&count);
    let action = Action::new(move || counter.set(counter.get() + 1));
    (action, count)
}

/// A test harness owning an isolated scheduler and a default owner.
pub struct TestHarness {
    pub scheduler: Scheduler,
    pub owner: Lifeline,
}

impl TestHarness {
    pub fn new() -> Self {
        init_tracing();
        Self {
            scheduler: Scheduler::default(),
            owner: Lifeline::new(),
        }
    }

    /// Ticks `frames` times with the same scaled and unscaled delta.
    pub fn run(&self, frames: usize, delta: f32) {
        let frame = FrameTime::uniform(delta);
        for _ in 0..frames {
            self.scheduler.tick(&frame);
        }
    }
}
