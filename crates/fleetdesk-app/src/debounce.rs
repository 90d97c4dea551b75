// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds back search input until it has been quiet for `delay`.
///
/// Callers pass the clock in so an event loop (or a test) decides when time
/// moves. The most recent input is always emitted eventually; inputs that are
/// replaced inside the window are never emitted.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
    settled: String,
}

#[derive(Debug, Clone)]
struct Pending {
    value: String,
    deadline: Instant,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            settled: String::new(),
        }
    }

    /// The last value that made it through.
    pub fn settled(&self) -> &str {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn input(&mut self, raw: &str, now: Instant) {
        self.pending = Some(Pending {
            value: raw.to_owned(),
            deadline: now + self.delay,
        });
    }

    /// Emits the pending value once its deadline has passed and it differs
    /// from the settled one.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if !due {
            return None;
        }
        self.settle()
    }

    /// Emits the pending value immediately, ignoring the deadline.
    pub fn flush(&mut self) -> Option<String> {
        self.settle()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    fn settle(&mut self) -> Option<String> {
        let pending = self.pending.take()?;
        if pending.value == self.settled {
            return None;
        }
        self.settled = pending.value.clone();
        Some(pending.value)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
