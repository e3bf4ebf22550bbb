// ABOUTME: In-process deep-link source with a listener registry and pluggable URL opener
// ABOUTME: Backs the CLI (stdin redirects) and tests (fired links, add/remove accounting)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::channel::{DeepLinkSource, EventHandler};
use crate::errors::ServiceResult;

type Opener = Box<dyn Fn(&str) -> ServiceResult<()> + Send + Sync>;

/// Listener registry that dispatches URLs to every handler of an event
pub struct LinkingHub {
    listeners: Mutex<HashMap<String, Vec<EventHandler>>>,
    opened: Mutex<Vec<String>>,
    opened_count: watch::Sender<usize>,
    added: AtomicUsize,
    removed: AtomicUsize,
    opener: Option<Opener>,
}

impl Default for LinkingHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkingHub {
    /// Hub whose `open_url` only records the URL
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            opened: Mutex::new(Vec::new()),
            opened_count: watch::Sender::new(0),
            added: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            opener: None,
        }
    }

    /// Hub that hands opened URLs to `opener` after recording them
    #[must_use]
    pub fn with_opener<F>(opener: F) -> Self
    where
        F: Fn(&str) -> ServiceResult<()> + Send + Sync + 'static,
    {
        Self {
            opener: Some(Box::new(opener)),
            ..Self::new()
        }
    }

    /// Deliver `url` to every listener of `event_name`; returns how many received it
    pub fn emit(&self, event_name: &str, url: &str) -> usize {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_name)
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            handler(url.to_owned());
        }
        debug!(event = event_name, listeners = handlers.len(), "Deep link emitted");
        handlers.len()
    }

    /// Number of handlers currently registered for `event_name`
    #[must_use]
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_name)
            .map_or(0, Vec::len)
    }

    /// Total `add_listener` calls
    #[must_use]
    pub fn added_count(&self) -> usize {
        self.added.load(Ordering::Acquire)
    }

    /// Total `remove_listener` calls
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.load(Ordering::Acquire)
    }

    /// URLs passed to `open_url`, in order
    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` URLs were opened and return the `count`-th
    pub async fn wait_for_opened(&self, count: usize) -> Option<String> {
        let mut receiver = self.opened_count.subscribe();
        receiver.wait_for(|opened| *opened >= count).await.ok()?;
        let index = count.checked_sub(1)?;
        self.opened_urls().get(index).cloned()
    }
}

impl DeepLinkSource for LinkingHub {
    fn add_listener(&self, event_name: &str, handler: EventHandler) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_name.to_owned())
            .or_default()
            .push(handler);
        self.added.fetch_add(1, Ordering::AcqRel);
    }

    fn remove_listener(&self, event_name: &str, handler: &EventHandler) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = listeners.get_mut(event_name) {
            handlers.retain(|h| !std::ptr::addr_eq(Arc::as_ptr(h), Arc::as_ptr(handler)));
            if handlers.is_empty() {
                listeners.remove(event_name);
            }
        }
        self.removed.fetch_add(1, Ordering::AcqRel);
    }

    fn open_url(&self, url: &str) -> ServiceResult<()> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());
        self.opened_count.send_modify(|count| *count += 1);
        info!("Opening authorization page");
        match &self.opener {
            Some(opener) => opener(url),
            None => Ok(()),
        }
    }
}
