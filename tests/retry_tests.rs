//! Retry behaviour driven through a scripted transport, so network failures
//! can be produced on demand.

use placefinder::{
    Client, Endpoint, Error, PlaceType, RawResponse, Result, RetryPredicate, RetryStrategy,
    Transport, TransportErrorKind, WireRequest,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

type Step = fn() -> Result<RawResponse>;

/// Plays back a fixed list of outcomes, then repeats `fallback` forever.
struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    attempts: AtomicUsize,
    requests: Mutex<Vec<WireRequest>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            attempts: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn always(step: Step) -> Self {
        Self::new(Vec::new(), step)
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &WireRequest) -> impl Future<Output = Result<RawResponse>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(self.fallback);
        async move { step() }
    }
}

fn ok() -> Result<RawResponse> {
    Ok(RawResponse::new(
        200,
        r#"{"status": "OK", "predictions": []}"#,
    ))
}

fn timeout() -> Result<RawResponse> {
    Err(Error::from((TransportErrorKind::Timeout, "request timed out")))
}

fn connection_reset() -> Result<RawResponse> {
    Err(Error::from((
        TransportErrorKind::ConnectionReset,
        "connection reset by peer",
    )))
}

fn dns_failure() -> Result<RawResponse> {
    Err(Error::from((TransportErrorKind::DnsFailure, "dns error")))
}

fn scripted_client(transport: ScriptedTransport, max_retries: usize) -> Client<ScriptedTransport> {
    Client::builder()
        .api_key("test-key")
        .retry_strategy(RetryStrategy::immediate(max_retries))
        .build_with_transport(transport)
        .unwrap()
}

#[tokio::test]
async fn test_recovers_after_connection_resets() {
    let transport = ScriptedTransport::new(
        vec![connection_reset as Step; 3],
        ok,
    );
    let client = Client::builder()
        .api_key("test-key")
        .build_with_transport(transport)
        .unwrap();

    let response = client
        .execute(Endpoint::details("ChIJN1t_tDeuEmsRUsoyG83frY4", "t"))
        .await
        .unwrap();

    assert_eq!(response.attempts, 4);
    assert!(response.was_retried());
    assert_eq!(client.transport().attempts(), 4);
}

#[tokio::test]
async fn test_persistent_timeouts_exhaust_default_ceiling() {
    let client = Client::builder()
        .api_key("test-key")
        .build_with_transport(ScriptedTransport::always(timeout))
        .unwrap();

    let result = client
        .execute(Endpoint::autocomplete("Paris", PlaceType::Cities, "t"))
        .await;

    match result {
        Err(Error::Exhausted {
            attempts,
            last_error,
        }) => {
            // 1 initial attempt + 10 retries
            assert_eq!(attempts, 11);
            assert_eq!(
                last_error.unwrap().transport_kind(),
                Some(TransportErrorKind::Timeout)
            );
        }
        _ => panic!("Expected Exhausted, got {:?}", result),
    }
    assert_eq!(client.transport().attempts(), 11);
}

#[tokio::test]
async fn test_attempts_never_exceed_ceiling() {
    for max_retries in [0, 1, 3, 7] {
        let client = scripted_client(ScriptedTransport::always(dns_failure), max_retries);

        let result = client.execute(Endpoint::details("abc", "t")).await;

        assert!(
            matches!(result, Err(Error::Exhausted { attempts, .. }) if attempts == max_retries + 1),
            "max_retries = {}: {:?}",
            max_retries,
            result
        );
        assert_eq!(client.transport().attempts(), max_retries + 1);
    }
}

#[tokio::test]
async fn test_zero_retries_allows_a_single_attempt() {
    let client = scripted_client(ScriptedTransport::always(ok), 0);

    let result = client.execute(Endpoint::details("abc", "t")).await;

    match result {
        Err(Error::Exhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 1);
            assert!(last_error.is_none());
        }
        _ => panic!("Expected Exhausted, got {:?}", result),
    }
    assert_eq!(client.transport().attempts(), 1);
}

#[tokio::test]
async fn test_success_after_last_retry_is_exhausted() {
    let client = scripted_client(ScriptedTransport::new(vec![timeout as Step; 2], ok), 2);

    let result = client.execute(Endpoint::details("abc", "t")).await;

    match result {
        Err(Error::Exhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(
                last_error.unwrap().transport_kind(),
                Some(TransportErrorKind::Timeout)
            );
        }
        _ => panic!("Expected Exhausted, got {:?}", result),
    }
    assert_eq!(client.transport().attempts(), 3);
}

#[tokio::test]
async fn test_final_failure_after_last_retry_is_exhausted() {
    let client = scripted_client(
        ScriptedTransport::new(vec![timeout as Step, timeout, not_found], ok),
        2,
    );

    let result = client.execute(Endpoint::details("abc", "t")).await;

    match result {
        Err(Error::Exhausted {
            attempts,
            last_error: Some(last_error),
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error.status().map(|s| s.as_u16()), Some(404));
        }
        _ => panic!("Expected Exhausted, got {:?}", result),
    }
    assert_eq!(client.transport().attempts(), 3);
}

#[tokio::test]
async fn test_success_before_ceiling_is_delivered() {
    let client = scripted_client(ScriptedTransport::new(vec![timeout as Step; 2], ok), 3);

    let response = client.execute(Endpoint::details("abc", "t")).await.unwrap();

    assert_eq!(response.attempts, 3);
}

fn not_found() -> Result<RawResponse> {
    Ok(RawResponse::new(404, "Not found"))
}

fn general_failure() -> Result<RawResponse> {
    Err(Error::General("certificate rejected".into()))
}

fn other_transport_failure() -> Result<RawResponse> {
    Err(Error::from((TransportErrorKind::Other, "request body failed")))
}

fn invalid_status() -> Result<RawResponse> {
    Ok(RawResponse::new(1000, "{}"))
}

fn server_error() -> Result<RawResponse> {
    Ok(RawResponse::new(500, "boom"))
}

fn missing_body() -> Result<RawResponse> {
    Ok(RawResponse {
        status: 200,
        headers: http::HeaderMap::new(),
        body: None,
    })
}

fn no_content() -> Result<RawResponse> {
    Ok(RawResponse::new(204, ""))
}

async fn first_error(step: Step) -> Error {
    // Followed by a success that must never be reached.
    let client = scripted_client(ScriptedTransport::new(vec![step], ok), 10);
    let error = client
        .execute(Endpoint::details("abc", "t"))
        .await
        .unwrap_err();
    assert_eq!(client.transport().attempts(), 1, "{:?}", error);
    error
}

#[tokio::test]
async fn test_non_retryable_failures_end_the_call() {
    assert!(matches!(first_error(general_failure).await, Error::General(_)));
    assert_eq!(
        first_error(other_transport_failure).await.transport_kind(),
        Some(TransportErrorKind::Other)
    );
    assert!(matches!(
        first_error(invalid_status).await,
        Error::InvalidResponseShape
    ));
    assert!(matches!(
        first_error(server_error).await,
        Error::UnexpectedStatus { .. }
    ));
    assert!(matches!(first_error(missing_body).await, Error::EmptyBody));
    assert!(matches!(first_error(no_content).await, Error::EmptyBody));
}

#[tokio::test]
async fn test_request_is_built_once_and_reused() {
    let client = scripted_client(
        ScriptedTransport::new(vec![timeout as Step, connection_reset], ok),
        10,
    );
    let endpoint = Endpoint::autocomplete("Main St", PlaceType::Address, "session-9")
        .with_countries(["us", "ca"]);

    client.execute(endpoint.clone()).await.unwrap();

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|request| *request == requests[0]));
    assert_eq!(
        requests[0].query_param("components"),
        Some("country:us|country:ca")
    );
    assert_eq!(requests[0], WireRequest::build(&endpoint, client.config()));
}

#[tokio::test]
async fn test_linear_backoff_waits_between_attempts() {
    let client = Client::builder()
        .api_key("test-key")
        .retry_strategy(RetryStrategy::Linear {
            delay: Duration::from_millis(20),
            max_retries: 3,
        })
        .build_with_transport(ScriptedTransport::new(vec![timeout as Step; 2], ok))
        .unwrap();

    let start = Instant::now();
    let response = client.execute(Endpoint::details("abc", "t")).await.unwrap();

    assert_eq!(response.attempts, 3);
    assert!(start.elapsed() >= Duration::from_millis(40));
}

struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _error: &Error, _attempt: usize) -> bool {
        false
    }
}

#[tokio::test]
async fn test_custom_predicate() {
    let client = Client::builder()
        .api_key("test-key")
        .retry_predicate(Box::new(NeverRetry))
        .build_with_transport(ScriptedTransport::always(timeout))
        .unwrap();

    let error = client
        .execute(Endpoint::details("abc", "t"))
        .await
        .unwrap_err();

    assert_eq!(error.transport_kind(), Some(TransportErrorKind::Timeout));
    assert_eq!(client.transport().attempts(), 1);
}

#[tokio::test]
async fn test_completion_invoked_once_with_exhaustion() {
    let client = scripted_client(ScriptedTransport::always(connection_reset), 3);
    let invocations = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = oneshot::channel();

    let counter = Arc::clone(&invocations);
    client.call(Endpoint::details("abc", "t"), move |outcome| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(outcome);
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("completion was not invoked")
        .unwrap();

    assert!(matches!(outcome, Err(Error::Exhausted { attempts: 4, .. })));
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(client.transport().attempts(), 4);

    let description = outcome.unwrap_err();
    assert_eq!(
        client.describe(&description).as_deref(),
        Some("Bad network conditions")
    );
}

#[tokio::test]
async fn test_calls_keep_separate_retry_counts() {
    let failing = scripted_client(ScriptedTransport::always(timeout), 2);
    let healthy = scripted_client(ScriptedTransport::new(vec![timeout as Step], ok), 2);

    let (failed, succeeded) = tokio::join!(
        failing.execute(Endpoint::details("a", "t")),
        healthy.execute(Endpoint::details("b", "t")),
    );

    assert!(matches!(failed, Err(Error::Exhausted { attempts: 3, .. })));
    assert_eq!(succeeded.unwrap().attempts, 2);

    // A second call on the same client starts from zero again.
    let again = failing.execute(Endpoint::details("a", "t")).await;
    assert!(matches!(again, Err(Error::Exhausted { attempts: 3, .. })));
    assert_eq!(failing.transport().attempts(), 6);
}
