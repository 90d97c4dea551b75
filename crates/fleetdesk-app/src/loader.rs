// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::SentinelId;

pub const DEFAULT_LOOKAHEAD_PX: u32 = 200;

/// Where the sentinel sits relative to the bottom edge of the viewport.
/// Negative distances mean the sentinel is already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelObservation {
    pub sentinel: SentinelId,
    pub distance_px: i64,
}

impl SentinelObservation {
    pub const fn new(sentinel: SentinelId, distance_px: i64) -> Self {
        Self {
            sentinel,
            distance_px,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderDecision {
    Load,
    Detached,
    NotVisible,
    Exhausted,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollLoader {
    lookahead_px: u32,
    attached: Option<SentinelId>,
}

impl ScrollLoader {
    pub fn new(lookahead_px: u32) -> Self {
        Self {
            lookahead_px,
            attached: None,
        }
    }

    pub fn lookahead_px(&self) -> u32 {
        self.lookahead_px
    }

    pub fn attached(&self) -> Option<SentinelId> {
        self.attached
    }

    /// Watches `sentinel`, dropping whichever sentinel was watched before.
    pub fn attach(&mut self, sentinel: SentinelId) {
        self.attached = Some(sentinel);
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    pub fn is_visible(&self, observation: SentinelObservation) -> bool {
        self.attached == Some(observation.sentinel)
            && observation.distance_px <= i64::from(self.lookahead_px)
    }

    pub fn decide(
        &self,
        observation: SentinelObservation,
        has_more: bool,
        fetch_in_flight: bool,
    ) -> LoaderDecision {
        if self.attached != Some(observation.sentinel) {
            return LoaderDecision::Detached;
        }
        if !self.is_visible(observation) {
            return LoaderDecision::NotVisible;
        }
        if !has_more {
            return LoaderDecision::Exhausted;
        }
        if fetch_in_flight {
            return LoaderDecision::Busy;
        }
        LoaderDecision::Load
    }
}

impl Default for ScrollLoader {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD_PX)
    }
}
