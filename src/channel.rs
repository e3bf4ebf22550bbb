// ABOUTME: Single-consumer closeable event channel over an external listener registry
// ABOUTME: Adapts deep-link callbacks into awaited events and unsubscribes exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Event Channel
//!
//! The platform delivers deep links through a callback registry
//! ("add listener" / "remove listener"). [`EventChannel`] turns one such
//! registration into a queue a flow can await with [`EventChannel::take`].
//!
//! ## Lifecycle
//!
//! A channel is `Open` from [`EventChannel::open`] until the first call to
//! [`EventChannel::close`], which removes the listener from the source. Closing
//! again is a no-op, and dropping the channel closes it, so the listener is
//! removed exactly once whichever exit path runs first: explicit close on
//! completion, or drop when the owning flow is cancelled.
//!
//! ## Buffering
//!
//! Events arriving before `take` is awaited are queued without bound, in
//! arrival order. Unrelated deep links are therefore never lost while the
//! consumer is busy classifying the previous one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{FlowError, ServiceResult};

/// Callback registered with a deep-link source; receives the raw URL
pub type EventHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Shared handle to the process-wide deep-link source
pub type SharedDeepLinkSource = Arc<dyn DeepLinkSource>;

/// Platform notification source for incoming URLs
///
/// Handlers are identified by pointer: `remove_listener` must drop the exact
/// `Arc` that `add_listener` received.
pub trait DeepLinkSource: Send + Sync {
    /// Register `handler` for `event_name`
    fn add_listener(&self, event_name: &str, handler: EventHandler);

    /// Unregister a handler previously passed to `add_listener`
    fn remove_listener(&self, event_name: &str, handler: &EventHandler);

    /// Open `url` outside the application (browser, provider app)
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot open the URL
    fn open_url(&self, url: &str) -> ServiceResult<()>;
}

/// Event delivered through a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkEvent {
    /// URL the platform handed to the application
    pub url: String,
}

/// Lifecycle state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Registered and delivering events
    Open,
    /// Unregistered; `take` fails with [`FlowError::ChannelClosed`]
    Closed,
}

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Deep-link registration owned by a single flow
pub struct EventChannel {
    id: u64,
    event_name: String,
    source: SharedDeepLinkSource,
    handler: EventHandler,
    receiver: mpsc::UnboundedReceiver<DeepLinkEvent>,
    closed: Arc<AtomicBool>,
}

impl EventChannel {
    /// Register a listener for `event_name` on `source`
    #[must_use]
    pub fn open(source: SharedDeepLinkSource, event_name: &str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let handler_closed = Arc::clone(&closed);
        let handler: EventHandler = Arc::new(move |url: String| {
            // The source may still hold a clone of the handler after close
            if !handler_closed.load(Ordering::Acquire) {
                let _ = sender.send(DeepLinkEvent { url });
            }
        });

        source.add_listener(event_name, Arc::clone(&handler));

        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);
        debug!(channel_id = id, event = event_name, "Deep link channel opened");

        Self {
            id,
            event_name: event_name.to_owned(),
            source,
            handler,
            receiver,
            closed,
        }
    }

    /// Wait for the next event
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::ChannelClosed`] if the channel was closed. An open
    /// channel never fails; it waits until an event arrives.
    pub async fn take(&mut self) -> Result<DeepLinkEvent, FlowError> {
        if self.is_closed() {
            return Err(FlowError::ChannelClosed);
        }
        match self.receiver.recv().await {
            Some(event) if !self.is_closed() => Ok(event),
            _ => Err(FlowError::ChannelClosed),
        }
    }

    /// Close the channel and unregister its listener
    ///
    /// Returns `true` for the call that performed the close; later calls are
    /// no-ops and return `false`.
    pub fn close(&self) -> bool {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.source.remove_listener(&self.event_name, &self.handler);
        debug!(channel_id = self.id, event = %self.event_name, "Deep link channel closed");
        true
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ChannelState {
        if self.is_closed() {
            ChannelState::Closed
        } else {
            ChannelState::Open
        }
    }

    /// Whether the channel has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Process-unique identifier, for logs
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("id", &self.id)
            .field("event_name", &self.event_name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
