//! Failure injection tests for the receiver.

use newrelic_receiver::{ConsumeError, NewRelicReceiver, ReceiverError};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_consumer_failure_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let (mut receiver, addr) = common::start_programmable_receiver(common::test_config(), move |_| {
        let seen = seen.clone();
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ConsumeError::Failed("exporter unavailable".into()))
        }
    })
    .await;
    let client = common::client();

    common::invoke(&client, addr, "connect", &common::connect_payload("svc-1", 1, "h1")).await;
    let payload = common::span_payload("svc-1", vec![common::span_entry(&"a".repeat(32), &"b".repeat(16), "server")]);
    let (status, body) = common::invoke(&client, addr, "span_event_data", &payload).await;

    assert_eq!(status, 500);
    assert_eq!(body, r#"{"status":"500 Internal Server Error"}"#);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "the receiver must not retry");

    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bad_identifier_drops_whole_batch() {
    let (mut receiver, addr, mut rx) = common::start_receiver(common::test_config()).await;
    let client = common::client();

    common::invoke(&client, addr, "connect", &common::connect_payload("svc-1", 1, "h1")).await;
    let payload = common::span_payload(
        "svc-1",
        vec![
            common::span_entry(&"a".repeat(32), &"b".repeat(16), "server"),
            common::span_entry("not-hex", &"c".repeat(16), "client"),
        ],
    );
    let (status, _) = common::invoke(&client, addr, "span_event_data", &payload).await;
    assert_eq!(status, 400);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err(), "no partial batch may be forwarded");

    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_payloads_do_not_poison_the_receiver() {
    let (mut receiver, addr, mut rx) = common::start_receiver(common::test_config()).await;
    let client = common::client();

    let bad_bodies = [
        json!({"not": "an array"}),
        json!([]),
        json!(["svc-1", {}]),
        json!(["svc-1", {}, [[{}, {}]]]),
        json!([{"pid": 1, "app_name": []}]),
    ];
    for body in &bad_bodies {
        let (status, _) = common::invoke(&client, addr, "span_event_data", body).await;
        assert_eq!(status, 400, "payload {body} should be rejected");
    }

    let res = client
        .post(common::invoke_url(addr, "connect"))
        .body("[{\"pid\": 1,")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert!(receiver.registry().is_empty());

    common::invoke(&client, addr, "connect", &common::connect_payload("svc-1", 1, "h1")).await;
    let payload = common::span_payload("svc-1", vec![common::span_entry(&"a".repeat(32), &"b".repeat(16), "server")]);
    let (status, _) = common::invoke(&client, addr, "span_event_data", &payload).await;
    assert_eq!(status, 200);
    assert!(rx.recv().await.is_some());

    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = common::test_config();
    config.limits.max_body_size = 64;
    let (mut receiver, addr, _rx) = common::start_receiver(config).await;

    let padding = "x".repeat(256);
    let (status, _) = common::invoke(&common::client(), addr, "connect", &common::connect_payload(&padding, 1, "h1")).await;
    assert_eq!(status, 413);
    assert!(receiver.registry().is_empty());

    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_graceful_shutdown_drains_in_flight_requests() {
    let (mut receiver, addr) = common::start_programmable_receiver(common::test_config(), |_| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok::<(), ConsumeError>(())
    })
    .await;
    let client = common::client();
    common::invoke(&client, addr, "connect", &common::connect_payload("svc-1", 1, "h1")).await;

    let in_flight = tokio::spawn({
        let client = client.clone();
        async move {
            let payload =
                common::span_payload("svc-1", vec![common::span_entry(&"a".repeat(32), &"b".repeat(16), "server")]);
            common::invoke(&client, addr, "span_event_data", &payload).await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    receiver.shutdown().await.expect("drain should finish in time");

    let (status, _) = in_flight.await.unwrap();
    assert_eq!(status, 200, "in-flight request should complete");

    let refused = client.post(common::invoke_url(addr, "preconnect")).send().await;
    assert!(refused.is_err(), "listener should be closed after shutdown");
}

#[tokio::test]
async fn test_shutdown_deadline_aborts_stuck_requests() {
    let mut config = common::test_config();
    config.timeouts.shutdown_secs = 1;
    let (mut receiver, addr) = common::start_programmable_receiver(config, |_| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<(), ConsumeError>(())
    })
    .await;
    let client = common::client();
    common::invoke(&client, addr, "connect", &common::connect_payload("svc-1", 1, "h1")).await;

    tokio::spawn(async move {
        let payload = common::span_payload("svc-1", vec![common::span_entry(&"a".repeat(32), &"b".repeat(16), "server")]);
        let _ = common::invoke(&client, addr, "span_event_data", &payload).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = receiver.shutdown().await.unwrap_err();
    assert!(matches!(err, ReceiverError::ShutdownTimeout(_)));
}

#[tokio::test]
async fn test_second_receiver_on_same_port_fails() {
    let (mut first, addr, _rx) = common::start_receiver(common::test_config()).await;

    let mut config = common::test_config();
    config.listener.bind_address = addr.to_string();
    let (consumer, _rx2) = newrelic_receiver::ChannelConsumer::new(1);
    let mut second = NewRelicReceiver::new(config, Arc::new(consumer));

    let err = second.start().await.unwrap_err();
    assert!(matches!(err, ReceiverError::Transport(_)), "unexpected error: {err}");
    assert!(second.local_addr().is_none());

    first.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_start_twice_and_idle_shutdown() {
    let (consumer, _rx) = newrelic_receiver::ChannelConsumer::new(1);
    let mut receiver = NewRelicReceiver::new(common::test_config(), Arc::new(consumer));

    // Never started: shutdown is a no-op.
    receiver.shutdown().await.unwrap();

    let addr = receiver.start().await.unwrap();
    let err = receiver.start().await.unwrap_err();
    assert!(matches!(err, ReceiverError::AlreadyRunning(a) if a == addr));

    receiver.shutdown().await.unwrap();
    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_fails_start() {
    let mut config = common::test_config();
    config.listener.max_concurrent_requests = 0;
    config.protocol.path = "agent_listener/invoke_raw_method".into();
    let (consumer, _rx) = newrelic_receiver::ChannelConsumer::new(1);
    let mut receiver = NewRelicReceiver::new(config, Arc::new(consumer));

    let err = receiver.start().await.unwrap_err();
    match err {
        ReceiverError::Config(settings) => {
            let fields: Vec<_> = settings.iter().map(|s| s.field).collect();
            assert_eq!(fields, ["listener.max_concurrent_requests", "protocol.path"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(receiver.local_addr().is_none());
    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_encoding_is_json_415() {
    let (mut receiver, addr, _rx) = common::start_receiver(common::test_config()).await;

    let res = common::client()
        .post(common::invoke_url(addr, "connect"))
        .header("content-encoding", "br")
        .body(vec![0x0b, 0x02, 0x80])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 415);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("application/json"));
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), r#"{"status":"415 Unsupported Media Type"}"#);
    assert!(receiver.registry().is_empty());

    receiver.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrency_limit_queues_requests() {
    let mut config = common::test_config();
    config.listener.max_concurrent_requests = 1;
    let release = Arc::new(tokio::sync::Notify::new());
    let gate = release.clone();
    let (mut receiver, addr) = common::start_programmable_receiver(config, move |_| {
        let gate = gate.clone();
        async move {
            gate.notified().await;
            Ok::<(), ConsumeError>(())
        }
    })
    .await;
    let client = common::client();
    common::invoke(&client, addr, "connect", &common::connect_payload("svc-1", 1, "h1")).await;

    let blocked = tokio::spawn({
        let client = client.clone();
        async move {
            let payload =
                common::span_payload("svc-1", vec![common::span_entry(&"a".repeat(32), &"b".repeat(16), "server")]);
            common::invoke(&client, addr, "span_event_data", &payload).await
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let queued = tokio::spawn({
        let client = client.clone();
        async move { common::invoke(&client, addr, "preconnect", &json!([])).await }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!queued.is_finished(), "second request should wait for a permit");

    release.notify_one();
    assert_eq!(blocked.await.unwrap().0, 200);
    let (status, _) = tokio::time::timeout(Duration::from_secs(2), queued)
        .await
        .expect("queued request never ran")
        .unwrap();
    assert_eq!(status, 200);

    receiver.shutdown().await.unwrap();
}
