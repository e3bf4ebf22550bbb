// ABOUTME: Tests for the token exchange, logout, and paginated fetch flows
// ABOUTME: Success and failure notifications and their effect on session state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::Fixture;
use serde_json::json;
use stravels::errors::FlowError;
use stravels::flows::{Flow, FlowKind, LogoutFlow, PaginatedFetchFlow, TokenExchangeFlow};
use stravels::notifications::{ActionSink, Notification, Request};
use stravels::session::Phase;
use stravels::test_utils::{test_athlete, FacadeCall, MockFacade, TEST_TOKEN};
use stravels_core::errors::{ErrorCode, ServiceError};
use stravels_core::models::{AccessToken, AuthorizationCode, ResourceKind};

#[tokio::test]
async fn test_token_exchange_success_logs_in() {
    let fx = Fixture::new(MockFacade::new());
    let flow = TokenExchangeFlow::new(fx.shared_facade(), AuthorizationCode::new("XYZ"));
    assert_eq!(flow.kind(), FlowKind::TokenExchange);

    let outcome = flow.run(&fx.ctx()).await;
    assert_eq!(
        outcome.notification(),
        Some(&Notification::TokenExchangeSucceeded {
            token: AccessToken::new(TEST_TOKEN),
            user: test_athlete(),
        })
    );
    assert_eq!(
        fx.facade.calls(),
        vec![FacadeCall::ExchangeCode(AuthorizationCode::new("XYZ"))]
    );
    assert!(fx.store.is_logged_in());
    assert_eq!(fx.store.user(), Some(test_athlete()));
}

#[tokio::test]
async fn test_token_exchange_failure_leaves_session_logged_out() {
    let error = ServiceError::service(400, "invalid code");
    let fx = Fixture::new(MockFacade::new().with_exchange_error(error.clone()));
    fx.store.dispatch(Request::token_exchange("XYZ").notification());

    let outcome = TokenExchangeFlow::new(fx.shared_facade(), AuthorizationCode::new("XYZ"))
        .run(&fx.ctx())
        .await;

    assert_eq!(
        outcome.notification(),
        Some(&Notification::TokenExchangeFailed {
            error: FlowError::Service(error)
        })
    );
    assert_eq!(fx.store.phase(), Phase::LoggedOut);
    assert!(fx.store.token().is_none());
    assert!(fx.store.user().is_none());
    assert!(!fx.store.is_fetching());
}

#[tokio::test]
async fn test_logout_success_clears_session() {
    let fx = Fixture::new(MockFacade::new());
    fx.store.dispatch(Notification::TokenExchangeSucceeded {
        token: AccessToken::new(TEST_TOKEN),
        user: test_athlete(),
    });

    let outcome = LogoutFlow::new(fx.shared_facade()).run(&fx.ctx()).await;
    assert_eq!(outcome.notification(), Some(&Notification::LogoutSucceeded));
    assert_eq!(fx.store.phase(), Phase::LoggedOut);
    assert!(fx.store.token().is_none());
}

#[tokio::test]
async fn test_logout_failure_keeps_prior_phase() {
    let fx = Fixture::new(
        MockFacade::new().with_logout_error(ServiceError::network("connection reset")),
    );
    fx.store.dispatch(Notification::TokenExchangeSucceeded {
        token: AccessToken::new(TEST_TOKEN),
        user: test_athlete(),
    });
    fx.store.dispatch(Notification::LogoutRequested);

    let outcome = LogoutFlow::new(fx.shared_facade()).run(&fx.ctx()).await;
    assert_eq!(outcome.notification().map(Notification::name).as_deref(), Some("LogoutFailed"));
    assert!(fx.store.is_logged_in());
    assert!(!fx.store.is_fetching());
    assert_eq!(
        fx.store.error().map(|e| e.code()),
        Some(ErrorCode::NetworkFailure)
    );
}

#[tokio::test]
async fn test_fetch_without_page_requests_page_zero() {
    let fx = Fixture::new(MockFacade::new());
    let flow = PaginatedFetchFlow::new(fx.shared_facade(), ResourceKind::Activities, None);
    assert_eq!(flow.page(), 0);

    let outcome = flow.run(&fx.ctx()).await;
    assert!(outcome.is_success());
    assert_eq!(
        fx.facade.calls(),
        vec![FacadeCall::Fetch(ResourceKind::Activities, 0)]
    );
}

#[tokio::test]
async fn test_fetch_page_42_emits_payload() {
    let fx = Fixture::new(MockFacade::new().with_page(ResourceKind::Activities, json!("foo")));
    let flow = PaginatedFetchFlow::new(fx.shared_facade(), ResourceKind::Activities, Some(42));

    let outcome = flow.run(&fx.ctx()).await;
    let notification = outcome.notification().unwrap();
    assert_eq!(notification.name(), "ActivitiesFetchSucceeded");
    assert_eq!(
        notification,
        &Notification::FetchSucceeded {
            kind: ResourceKind::Activities,
            page: 42,
            payload: json!("foo"),
        }
    );
    assert_eq!(
        fx.facade.calls(),
        vec![FacadeCall::Fetch(ResourceKind::Activities, 42)]
    );
    assert_eq!(
        fx.store.resource(ResourceKind::Activities).pages.get(&42),
        Some(&json!("foo"))
    );
}

#[tokio::test]
async fn test_connections_fetch_failure() {
    let fx = Fixture::new(MockFacade::new().with_fetch_error(
        ResourceKind::Connections,
        ServiceError::rate_limited("15 minute limit reached"),
    ));
    fx.store
        .dispatch(Request::connections(Some(2)).notification());

    let outcome = PaginatedFetchFlow::new(fx.shared_facade(), ResourceKind::Connections, Some(2))
        .run(&fx.ctx())
        .await;

    let notification = outcome.notification().unwrap();
    assert_eq!(notification.name(), "ConnectionsFetchFailed");
    assert_eq!(
        notification.error().map(FlowError::code),
        Some(ErrorCode::RateLimitExceeded)
    );
    let resource = fx.store.resource(ResourceKind::Connections);
    assert!(!resource.is_fetching());
    assert!(resource.error.is_some());
    assert_eq!(fx.store.phase(), Phase::LoggedOut);
}
