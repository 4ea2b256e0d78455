use super::*;
use std::time::Duration;

use envelope::command::ServerGetStatusRequest;

fn client_with(limiter: RateLimiter) -> Client {
    Client::new(ClientOptions::new("127.0.0.1:1").rate_limiter(limiter)).expect("client builds")
}

/// An address nothing listens on.
async fn unused_host() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    addr.to_string()
}

#[test]
fn new_client_is_idle_with_no_requests() {
    let client = Client::new(ClientOptions::default()).expect("client builds");
    assert_eq!(client.state(), ConnectionState::Idle);
    assert_eq!(client.last_request_id(), 0);
    assert_eq!(client.limiter().burst(), crate::rate_limit::DEFAULT_BURST);
}

#[test]
fn caller_limiter_is_shared_not_copied() {
    let limiter = RateLimiter::new(Duration::from_secs(60), 3);
    let client = client_with(limiter.clone());
    assert!(client.limiter().try_acquire());
    assert!(limiter.try_acquire());
    assert!(client.limiter().try_acquire());
    assert!(!limiter.try_acquire());
}

#[test]
fn clients_do_not_share_default_limiters() {
    let a = Client::new(ClientOptions::default()).expect("client builds");
    let b = Client::new(ClientOptions::default()).expect("client builds");
    while a.limiter().try_acquire() {}
    assert!(b.limiter().try_acquire());
}

#[tokio::test(start_paused = true)]
async fn timeout_covers_the_limiter_wait() {
    let limiter = RateLimiter::new(Duration::from_secs(60), 1);
    let client = client_with(limiter.clone());
    assert!(limiter.try_acquire());

    let result = client
        .send_with_timeout(Method::ServerGetStatus, &ServerGetStatusRequest {}, Duration::from_secs(1))
        .await;

    assert!(matches!(result, Err(ClientError::Timeout)));
    // The abandoned reservation went back to the bucket.
    assert!(limiter.available() > -0.5);
}

#[tokio::test]
async fn close_without_a_stream_is_not_connected() {
    let client = client_with(RateLimiter::unlimited());
    assert!(matches!(client.close().await, Err(ClientError::NotConnected)));
    assert_eq!(client.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn failed_dial_returns_to_idle() {
    let host = unused_host().await;
    let client = Client::new(ClientOptions::new(host.clone()).connect_timeout(Duration::from_secs(2)))
        .expect("client builds");
    let mut states = client.watch_state();

    let err = client
        .listen(Notifications::default())
        .await
        .expect_err("nothing is listening");

    match err {
        ClientError::Dial { host: dialed, .. } => assert_eq!(dialed, host),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(client.state(), ConnectionState::Idle);
    assert!(states.has_changed().expect("sender alive"));
    assert_eq!(*states.borrow_and_update(), ConnectionState::Idle);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let host = unused_host().await;
    let client = Client::new(ClientOptions::new(host).rate_limiter(RateLimiter::unlimited()))
        .expect("client builds");

    let result = client.send(Method::ServerGetStatus, &ServerGetStatusRequest {}).await;

    assert!(matches!(result, Err(ClientError::Http(_))));
    assert_eq!(client.last_request_id(), 1);
}

#[test]
fn debug_output_names_the_host() {
    let client = client_with(RateLimiter::unlimited());
    let rendered = format!("{client:?}");
    assert!(rendered.contains("127.0.0.1:1"));
    assert!(rendered.contains("Idle"));
}
