// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.

//! Process-wide mutable state shared by all runs.

use crate::classify::ErrorType;
use chrono::{DateTime, Local};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Number of leading characters of an error text used as cache key
const CACHE_KEY_CHARS: usize = 100;

/// A ticket filed by this process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRecord {
    pub url: String,
    pub summary: String,
    pub created_at: DateTime<Local>,
}

impl TicketRecord {
    pub fn new(url: String, summary: &str) -> Self {
        Self {
            url,
            summary: summary.to_string(),
            created_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    prefix: String,
    error_type: ErrorType,
}

impl CacheKey {
    fn new(text: &str, error_type: ErrorType) -> Self {
        Self {
            prefix: text.chars().take(CACHE_KEY_CHARS).collect(),
            error_type,
        }
    }
}

/// Global cooldown between two enrichment calls
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_slot: Mutex::new(None),
        }
    }

    /// Reserve the next call slot, at least `interval` after the previous
    /// one, and sleep until it. Returns the time spent waiting.
    ///
    /// The slot is reserved under the lock; the sleep happens after releasing it.
    pub fn wait(&self) -> Duration {
        let now = Instant::now();
        let slot = {
            let mut last_slot = self
                .last_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = last_slot
                .and_then(|last| last.checked_add(self.interval))
                .map_or(now, |next| next.max(now));
            *last_slot = Some(slot);
            slot
        };

        let remaining = slot.saturating_duration_since(now);
        if !remaining.is_zero() {
            tracing::debug!("Throttling enrichment call for {remaining:?}");
            std::thread::sleep(remaining);
        }
        remaining
    }
}

/// Shared context injected into the analyzer
#[derive(Debug)]
pub struct SharedState {
    history: Mutex<VecDeque<TicketRecord>>,
    history_limit: usize,
    cache: DashMap<CacheKey, String>,
    cache_limit: usize,
    throttle: Throttle,
}

impl SharedState {
    pub fn new(history_limit: usize, cache_limit: usize, min_call_interval: Duration) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(history_limit.min(1024))),
            history_limit,
            cache: DashMap::new(),
            cache_limit,
            throttle: Throttle::new(min_call_interval),
        }
    }

    /// Append a ticket, evicting the oldest entries beyond the limit
    pub fn record_ticket(&self, record: TicketRecord) {
        let mut history = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        history.push_back(record);
        while history.len() > self.history_limit {
            history.pop_front();
        }
    }

    /// The last `n` tickets, oldest first
    pub fn recent_tickets(&self, n: usize) -> Vec<TicketRecord> {
        let history = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let skip = history.len().saturating_sub(n);
        history.iter().skip(skip).cloned().collect()
    }

    pub fn cached_report(&self, text: &str, error_type: ErrorType) -> Option<String> {
        self.cache
            .get(&CacheKey::new(text, error_type))
            .map(|entry| entry.value().clone())
    }

    /// Store a report, evicting arbitrary entries once `cache_limit` is reached.
    /// A limit of zero disables caching.
    pub fn cache_report(&self, text: &str, error_type: ErrorType, report: String) {
        if self.cache_limit == 0 {
            return;
        }

        let key = CacheKey::new(text, error_type);
        while !self.cache.contains_key(&key) && self.cache.len() >= self.cache_limit {
            let Some(victim) = self.cache.iter().next().map(|entry| entry.key().clone()) else {
                break;
            };
            self.cache.remove(&victim);
        }
        self.cache.insert(key, report);
    }

    pub fn cached_reports(&self) -> usize {
        self.cache.len()
    }

    pub const fn throttle(&self) -> &Throttle {
        &self.throttle
    }
}
