//! Concurrency tests: many in-flight calls sharing one client and breaker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use resilient_client::http::TransportError;
use resilient_client::{CircuitBreakerConfig, CircuitState, Client, ClientConfig, Request, Response};

mod common;

#[tokio::test]
async fn test_load_performance() {
    let addr = common::start_fixed_backend(200, "Hello from backend").await;
    let client = Arc::new(Client::new(ClientConfig::default()).unwrap());
    let url = format!("http://{addr}/");

    let total_requests = 200;
    let concurrency = 20;
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let mut ok = 0;
            for _ in 0..(total_requests / concurrency) {
                if let Ok(resp) = client.execute(Request::get(url.as_str())).await {
                    if resp.status() == 200 {
                        ok += 1;
                    }
                }
            }
            ok
        }));
    }

    let mut succeeded = 0;
    for h in handles {
        succeeded += h.await.unwrap();
    }

    let duration = start.elapsed();
    println!(
        "{} requests in {:?} ({:.2} req/s)",
        total_requests,
        duration,
        total_requests as f64 / duration.as_secs_f64()
    );
    assert_eq!(succeeded, total_requests);
    assert_eq!(client.circuit_breaker().unwrap().state(), CircuitState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_share_breaker() {
    let transport = common::ScriptedTransport::new(|_| {
        Err(TransportError::Connect("connection refused".into()))
    });
    let client = Arc::new(
        Client::builder()
            .config(ClientConfig {
                retry: None,
                circuit_breaker: Some(CircuitBreakerConfig {
                    failure_threshold: 10,
                    success_threshold: 1,
                    timeout: Duration::from_secs(60),
                }),
                ..ClientConfig::default()
            })
            .transport(transport.clone())
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..50 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.execute(Request::get("/")).await.unwrap_err().code()
        }));
    }

    let mut open = 0;
    for h in handles {
        if h.await.unwrap() == "CIRCUIT_BREAKER_OPEN" {
            open += 1;
        }
    }

    // at least `failure_threshold` calls reached the transport before the trip
    assert!(transport.calls() >= 10);
    assert_eq!(transport.calls() + open, 50);
    assert_eq!(client.circuit_breaker().unwrap().state(), CircuitState::Open);
}

#[tokio::test]
async fn test_concurrent_successes_keep_breaker_closed() {
    let transport = common::ScriptedTransport::new(|n| {
        let status = if n % 2 == 0 { 200 } else { 503 };
        Ok(Response::from_status(status, ""))
    });
    let client = Arc::new(
        Client::builder()
            .config(ClientConfig::default())
            .transport(transport.clone())
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..32 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.execute(Request::get("/")).await.is_ok()
        }));
    }
    for h in handles {
        assert!(h.await.unwrap());
    }
    assert_eq!(client.circuit_breaker().unwrap().state(), CircuitState::Closed);
}
