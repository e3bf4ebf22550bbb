// ABOUTME: Tests for the deep-link event channel lifecycle
// ABOUTME: Idempotent close, single unsubscribe on every exit path, and FIFO buffering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::Arc;
use stravels::channel::{ChannelState, DeepLinkEvent, EventChannel, SharedDeepLinkSource};
use stravels::errors::FlowError;
use stravels::linking::LinkingHub;

const EVENT: &str = "url";

fn hub() -> (Arc<LinkingHub>, SharedDeepLinkSource) {
    let hub = Arc::new(LinkingHub::new());
    let source: SharedDeepLinkSource = hub.clone();
    (hub, source)
}

#[test]
fn test_close_twice_unsubscribes_once() {
    let (hub, source) = hub();
    let channel = EventChannel::open(source, EVENT);
    assert_eq!(hub.listener_count(EVENT), 1);
    assert_eq!(channel.state(), ChannelState::Open);

    assert!(channel.close());
    assert!(!channel.close());
    assert_eq!(channel.state(), ChannelState::Closed);
    assert_eq!(hub.removed_count(), 1);
    assert_eq!(hub.listener_count(EVENT), 0);

    drop(channel);
    assert_eq!(hub.removed_count(), 1);
}

#[test]
fn test_drop_unsubscribes_open_channel() {
    let (hub, source) = hub();
    let channel = EventChannel::open(source, EVENT);
    drop(channel);
    assert_eq!(hub.added_count(), 1);
    assert_eq!(hub.removed_count(), 1);
    assert_eq!(hub.listener_count(EVENT), 0);
}

#[tokio::test]
async fn test_events_are_queued_in_arrival_order() {
    let (hub, source) = hub();
    let mut channel = EventChannel::open(source, EVENT);

    assert_eq!(hub.emit(EVENT, "stravels://first"), 1);
    assert_eq!(hub.emit(EVENT, "stravels://second"), 1);

    assert_eq!(
        channel.take().await.unwrap(),
        DeepLinkEvent {
            url: "stravels://first".to_owned()
        }
    );
    assert_eq!(channel.take().await.unwrap().url, "stravels://second");
}

#[tokio::test]
async fn test_take_after_close_fails_with_channel_closed() {
    let (hub, source) = hub();
    let mut channel = EventChannel::open(source, EVENT);
    hub.emit(EVENT, "stravels://buffered");
    channel.close();

    assert_eq!(channel.take().await, Err(FlowError::ChannelClosed));
    assert_eq!(hub.emit(EVENT, "stravels://late"), 0);
}

#[tokio::test]
async fn test_open_channel_waits_without_events() {
    let (hub, source) = hub();
    let mut channel = EventChannel::open(source, EVENT);

    let waited =
        tokio::time::timeout(std::time::Duration::from_millis(50), channel.take()).await;
    assert!(waited.is_err());
    assert!(!channel.is_closed());

    hub.emit(EVENT, "stravels://after-wait");
    assert_eq!(channel.take().await.unwrap().url, "stravels://after-wait");
}

#[tokio::test]
async fn test_other_events_are_not_delivered() {
    let (hub, source) = hub();
    let mut channel = EventChannel::open(source, EVENT);

    assert_eq!(hub.emit("notification", "stravels://elsewhere"), 0);
    hub.emit(EVENT, "stravels://mine");
    assert_eq!(channel.take().await.unwrap().url, "stravels://mine");
}

#[test]
fn test_channels_have_distinct_ids() {
    let (hub, source) = hub();
    let first = EventChannel::open(Arc::clone(&source), EVENT);
    let second = EventChannel::open(source, EVENT);
    assert_ne!(first.id(), second.id());
    assert_eq!(hub.listener_count(EVENT), 2);

    first.close();
    assert_eq!(hub.listener_count(EVENT), 1);
    assert!(!second.is_closed());
}
