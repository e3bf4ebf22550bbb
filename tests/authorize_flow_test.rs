// ABOUTME: Tests for the OAuth authorize flow state machine
// ABOUTME: Redirect handling, access denial, ignored links, channel cleanup ordering, and timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    await_state, settle, Fixture, CODE_REDIRECT, DENIED_REDIRECT, EVENT, REDIRECT,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stravels::errors::FlowError;
use stravels::flows::{AuthorizeSettings, AuthorizeState, Flow, FlowContext, FlowOutcome};
use stravels::linking::LinkingHub;
use stravels::notifications::{ActionSink, Notification, SharedSink};
use stravels::session::Phase;
use stravels::test_utils::{FacadeCall, FacadeOp, MockFacade, TEST_AUTH_URL};
use stravels_core::errors::ServiceError;
use stravels_core::models::AuthorizationCode;
use tokio::task::JoinHandle;

/// Records the hub's listener accounting at the moment each notification arrives
struct CloseOrderSink {
    hub: Arc<LinkingHub>,
    seen: Mutex<Vec<(String, usize, usize)>>,
}

impl ActionSink for CloseOrderSink {
    fn dispatch(&self, notification: Notification) {
        self.seen.lock().unwrap().push((
            notification.name(),
            self.hub.listener_count(EVENT),
            self.hub.removed_count(),
        ));
    }
}

fn spawn_flow(
    flow: &Arc<stravels::flows::AuthorizeFlow>,
    ctx: &FlowContext,
) -> JoinHandle<FlowOutcome> {
    let flow = Arc::clone(flow);
    let ctx = ctx.clone();
    tokio::spawn(async move { flow.run(&ctx).await })
}

#[tokio::test]
async fn test_redirect_with_code_succeeds_and_closes_channel_once() {
    let fx = Fixture::new(MockFacade::new());
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let task = spawn_flow(&flow, &fx.ctx());

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    assert_eq!(fx.hub.opened_urls(), vec![TEST_AUTH_URL.to_owned()]);
    assert_eq!(fx.hub.emit(EVENT, CODE_REDIRECT), 1);

    let outcome = task.await.unwrap();
    assert_eq!(
        outcome,
        FlowOutcome::Completed(Notification::AuthorizeSucceeded {
            code: AuthorizationCode::new("XYZ")
        })
    );
    assert_eq!(flow.state(), AuthorizeState::Succeeded);
    assert_eq!(fx.hub.added_count(), 1);
    assert_eq!(fx.hub.removed_count(), 1);
    assert_eq!(fx.hub.listener_count(EVENT), 0);
    assert_eq!(fx.sink.names(), vec!["AuthorizeSucceeded"]);
}

#[tokio::test]
async fn test_channel_is_closed_before_terminal_notification() {
    let fx = Fixture::new(MockFacade::new());
    let observer = Arc::new(CloseOrderSink {
        hub: Arc::clone(&fx.hub),
        seen: Mutex::new(Vec::new()),
    });
    let ctx = FlowContext::new(Arc::clone(&observer) as SharedSink);
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let task = spawn_flow(&flow, &ctx);

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    fx.hub.emit(EVENT, CODE_REDIRECT);
    task.await.unwrap();

    let seen = observer.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![("AuthorizeSucceeded".to_owned(), 0, 1)]);
    assert_eq!(fx.hub.removed_count(), 1);
}

#[tokio::test]
async fn test_access_denied_fails_without_code_exchange() {
    let fx = Fixture::new(MockFacade::new());
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let task = spawn_flow(&flow, &fx.ctx());

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    fx.hub.emit(EVENT, DENIED_REDIRECT);

    let outcome = task.await.unwrap();
    assert_eq!(
        outcome.notification(),
        Some(&Notification::AuthorizeFailed {
            error: FlowError::AccessDenied
        })
    );
    assert_eq!(flow.state(), AuthorizeState::Failed);
    assert_eq!(fx.facade.count(FacadeOp::ExchangeResponse), 0);
    assert_eq!(fx.hub.removed_count(), 1);
    assert_eq!(fx.store.phase(), Phase::LoggedOut);
    assert!(fx.store.token().is_none());
}

#[tokio::test]
async fn test_unrelated_links_keep_waiting() {
    let fx = Fixture::new(MockFacade::new());
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let task = spawn_flow(&flow, &fx.ctx());

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    for url in [
        "stravels://localhost/activities/42",
        "https://www.strava.com/athletes/1",
        "otherapp://localhost/auth/strava&code=NOPE",
    ] {
        fx.hub.emit(EVENT, url);
    }
    settle().await;

    assert_eq!(flow.state(), AuthorizeState::AwaitingRedirect);
    assert!(fx.sink.terminal().is_empty());
    assert_eq!(fx.facade.count(FacadeOp::ExchangeResponse), 0);
    assert_eq!(fx.hub.listener_count(EVENT), 1);

    fx.hub.emit(EVENT, CODE_REDIRECT);
    let outcome = task.await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        fx.facade.calls(),
        vec![
            FacadeCall::AuthorizationUrl,
            FacadeCall::ExchangeResponse(CODE_REDIRECT.to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_matching_redirect_without_code_is_a_validation_failure() {
    let fx = Fixture::new(MockFacade::new());
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let task = spawn_flow(&flow, &fx.ctx());

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    fx.hub.emit(EVENT, &format!("{REDIRECT}?state=abc"));

    let outcome = task.await.unwrap();
    match outcome.notification() {
        Some(Notification::AuthorizeFailed {
            error: FlowError::Validation(_),
        }) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(fx.facade.count(FacadeOp::ExchangeResponse), 1);
    assert_eq!(fx.hub.removed_count(), 1);
}

#[tokio::test]
async fn test_authorization_url_failure_closes_channel() {
    let fx = Fixture::new(
        MockFacade::new().with_authorization_url_error(ServiceError::network("offline")),
    );
    let flow = fx.authorize_flow(AuthorizeSettings::default());

    let outcome = flow.run(&fx.ctx()).await;
    assert_eq!(
        outcome.notification(),
        Some(&Notification::AuthorizeFailed {
            error: FlowError::Service(ServiceError::network("offline"))
        })
    );
    assert!(fx.hub.opened_urls().is_empty());
    assert_eq!(fx.hub.added_count(), 1);
    assert_eq!(fx.hub.removed_count(), 1);
}

#[tokio::test]
async fn test_redirect_timeout_fails_and_closes_channel() {
    let fx = Fixture::new(MockFacade::new());
    let flow = fx.authorize_flow(AuthorizeSettings {
        redirect_timeout: Some(Duration::from_millis(30)),
        ..AuthorizeSettings::default()
    });

    let outcome = flow.run(&fx.ctx()).await;
    match outcome.notification() {
        Some(Notification::AuthorizeFailed {
            error: FlowError::RedirectTimeout { .. },
        }) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(fx.hub.listener_count(EVENT), 0);
    assert_eq!(fx.hub.removed_count(), 1);
}

#[tokio::test]
async fn test_cancel_while_awaiting_redirect_emits_nothing() {
    let fx = Fixture::new(MockFacade::new());
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let ctx = fx.ctx();
    let task = {
        let flow = Arc::clone(&flow);
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.run_cancellable(flow.run(&ctx)).await })
    };

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    assert!(ctx.gate().cancel());
    let outcome = task.await.unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(fx.hub.removed_count(), 1);
    assert_eq!(fx.hub.listener_count(EVENT), 0);
    assert!(fx.sink.notifications().is_empty());

    // A late redirect reaches nobody
    assert_eq!(fx.hub.emit(EVENT, CODE_REDIRECT), 0);
}

#[tokio::test]
async fn test_cancel_during_exchange_suppresses_notification() {
    let fx = Fixture::new(MockFacade::new().stalling(FacadeOp::ExchangeResponse));
    let flow = Arc::new(fx.authorize_flow(AuthorizeSettings::default()));
    let ctx = fx.ctx();
    let task = {
        let flow = Arc::clone(&flow);
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.run_cancellable(flow.run(&ctx)).await })
    };

    await_state(&flow, AuthorizeState::AwaitingRedirect).await;
    fx.hub.emit(EVENT, CODE_REDIRECT);
    await_state(&flow, AuthorizeState::ExchangingCode).await;
    assert_eq!(fx.hub.removed_count(), 1);

    ctx.gate().cancel();
    assert!(task.await.unwrap().is_cancelled());
    assert!(fx.sink.terminal().is_empty());
    assert_eq!(fx.hub.removed_count(), 1);
}
