mod common;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use agent_kafka::shared::utils::hash::derive_key;
use agent_kafka::{
    BrokerError, ClientConfig, Compression, Logger, OutboundRecord, PartitionerKind,
    ProducerConfig, ProducerError, RequiredAcks, SyncProducer,
};
use common::{Counters, FakeConnector, Failures, SendGate, UNREACHABLE};
use crossbeam_channel::{bounded, select};
use crossbeam_utils::sync::WaitGroup;
use proptest::prelude::*;
use parking_lot::Mutex;
use serde_json::json;
use tracing::level_filters::LevelFilter;

fn open(config: ProducerConfig, connector: &FakeConnector) -> SyncProducer {
    SyncProducer::with_connector(config, None, connector).unwrap()
}

#[test]
fn send_echoes_record_with_broker_position() {
    let connector = FakeConnector::new();
    let producer = open(
        ProducerConfig::new(["b1:9092"]).with_partition(-1),
        &connector,
    );

    assert_eq!(producer.config().required_acks, RequiredAcks::WaitForAll);

    let message = producer
        .send_message("t", Some(b"k"), Some(b"v"), None)
        .unwrap();
    assert_eq!(message.topic, "t");
    assert_eq!(message.key.as_deref(), Some(&b"k"[..]));
    assert_eq!(message.value, b"v");
    assert_eq!(message.partition, 1);
    assert_eq!(message.offset, 0);
    assert!(!producer.is_closed());

    let second = producer
        .send_message("t", Some(b"k"), Some(b"v2"), None)
        .unwrap();
    assert_eq!(second.offset, 1);
}

#[test]
fn factory_enables_return_successes_and_native_acks() {
    let connector = FakeConnector::new();
    let _producer = open(
        ProducerConfig::new(["b1:9092"]).with_partitioner(PartitionerKind::RoundRobin),
        &connector,
    );

    let settings = connector.recorded_settings().unwrap();
    assert!(settings.return_successes);
    assert_eq!(settings.native_acks, -1);
    assert_eq!(settings.partitioner, PartitionerKind::RoundRobin);
}

#[test]
fn metadata_is_echoed() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let message = producer
        .send_message("t", None, Some(b"v"), Some(json!({"request": 17})))
        .unwrap();
    assert_eq!(message.metadata, Some(json!({"request": 17})));
    assert_eq!(message.key, None);
}

#[test]
fn empty_key_is_replaced_by_value_digest() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let message = producer.send_bytes("t", b"", b"hello").unwrap();
    assert_eq!(
        message.key.as_deref(),
        Some(&b"5d41402abc4b2a76b9719d911017c592"[..])
    );
    assert_eq!(
        connector.sent()[0].key.as_deref(),
        Some(&b"5d41402abc4b2a76b9719d911017c592"[..])
    );
}

#[test]
fn explicit_key_is_kept() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let message = producer.send_bytes("t", b"user-1", b"hello").unwrap();
    assert_eq!(message.key.as_deref(), Some(&b"user-1"[..]));
}

#[test]
fn partition_override_wins() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]).with_partition(3), &connector);

    let message = producer
        .send_message("t", Some(b"k"), Some(b"v"), None)
        .unwrap();
    assert_eq!(message.partition, 3);

    let hinted = producer
        .send_record(OutboundRecord::new("t", "v").with_partition(6))
        .unwrap();
    assert_eq!(hinted.partition, 3);
}

#[test]
fn partition_hint_is_used_without_override() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let message = producer
        .send_record(OutboundRecord::new("t", "v").with_key("k").with_partition(6))
        .unwrap();
    assert_eq!(message.partition, 6);
}

#[test]
fn nil_value_never_reaches_broker() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let err = producer
        .send_message("t", Some(b"k"), None, None)
        .unwrap_err();
    assert!(matches!(err, ProducerError::EmptyPayload));
    assert_eq!(Counters::get(&connector.counters.send_attempts), 0);
}

#[test]
fn broker_failure_returns_partial_outcome() {
    let connector = FakeConnector::failing(Failures {
        send: true,
        ..Failures::default()
    });
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let err = producer
        .send_message("orders", Some(b"k"), Some(b"v"), Some(json!(1)))
        .unwrap_err();
    let message = err.message().expect("send failure carries the message");
    assert_eq!(message.topic, "orders");
    assert_eq!(message.key.as_deref(), Some(&b"k"[..]));
    assert_eq!(message.metadata, Some(json!(1)));
    assert_eq!((message.partition, message.offset), (-1, -1));
    assert!(matches!(
        err,
        ProducerError::SendFailed {
            source: BrokerError::Other(_),
            ..
        }
    ));
}

#[test]
fn close_is_idempotent_and_releases_wait_group() {
    let connector = FakeConnector::new();
    let wait_group = WaitGroup::new();
    let producer =
        SyncProducer::with_connector(ProducerConfig::new(["b1:9092"]), Some(&wait_group), &connector)
            .unwrap();

    producer.close().unwrap();
    producer.close().unwrap();

    assert!(producer.is_closed());
    producer.wait_for_close();
    assert_eq!(Counters::get(&connector.counters.producers_closed), 1);
    assert_eq!(Counters::get(&connector.counters.clients_closed), 1);

    let (done_tx, done_rx) = bounded::<()>(1);
    thread::spawn(move || {
        wait_group.wait();
        let _ = done_tx.send(());
    });
    assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn wait_group_is_held_until_close() {
    let connector = FakeConnector::new();
    let wait_group = WaitGroup::new();
    let producer = Arc::new(
        SyncProducer::with_connector(ProducerConfig::new(["b1:9092"]), Some(&wait_group), &connector)
            .unwrap(),
    );

    let (done_tx, done_rx) = bounded::<()>(1);
    thread::spawn(move || {
        wait_group.wait();
        let _ = done_tx.send(());
    });
    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    producer.close().unwrap();
    assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn failed_producer_close_still_signals() {
    let connector = FakeConnector::failing(Failures {
        producer_close: true,
        ..Failures::default()
    });
    let wait_group = WaitGroup::new();
    let producer =
        SyncProducer::with_connector(ProducerConfig::new(["b1:9092"]), Some(&wait_group), &connector)
            .unwrap();

    assert!(matches!(producer.close(), Err(ProducerError::CloseFailed(_))));
    assert!(producer.is_closed());
    assert!(producer.wait_for_close_timeout(Duration::from_secs(1)));
    // the client is left to its own drop once the producer close failed
    assert_eq!(Counters::get(&connector.counters.clients_closed), 0);

    producer.close().unwrap();
    wait_group.wait();
}

#[test]
fn failed_client_close_still_signals() {
    let connector = FakeConnector::failing(Failures {
        client_close: true,
        ..Failures::default()
    });
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    assert!(matches!(producer.close(), Err(ProducerError::CloseFailed(_))));
    assert!(producer.wait_for_close_timeout(Duration::from_secs(1)));
    assert_eq!(Counters::get(&connector.counters.producers_closed), 1);
    assert!(producer.close().is_ok());
}

#[test]
fn wait_for_close_blocks_until_close() {
    let connector = FakeConnector::new();
    let producer = Arc::new(open(ProducerConfig::new(["b1:9092"]), &connector));

    assert!(!producer.wait_for_close_timeout(Duration::from_millis(20)));

    let waiter = thread::spawn({
        let producer = Arc::clone(&producer);
        move || producer.wait_for_close()
    });
    thread::sleep(Duration::from_millis(20));
    assert!(!waiter.is_finished());

    producer.close().unwrap();
    waiter.join().unwrap();
}

#[test]
fn close_signal_works_with_select() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);
    let signal = producer.close_signal();
    let (_work_tx, work_rx) = bounded::<u32>(1);

    producer.close().unwrap();

    let closed = select! {
        recv(signal) -> msg => msg.is_err(),
        recv(work_rx) -> _ => false,
    };
    assert!(closed);
}

#[test]
fn sends_after_close_fail_in_backend() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);
    producer.close().unwrap();

    let err = producer.send_bytes("t", b"k", b"v").unwrap_err();
    assert!(matches!(
        err,
        ProducerError::SendFailed {
            source: BrokerError::Closed,
            ..
        }
    ));
}

#[test]
fn close_waits_for_in_flight_send() {
    let entered = Arc::new(Barrier::new(2));
    let (release_tx, release_rx) = bounded::<()>(0);
    let connector = FakeConnector::gated(SendGate {
        entered: Arc::clone(&entered),
        release: release_rx,
    });
    let producer = Arc::new(open(ProducerConfig::new(["b1:9092"]), &connector));

    let sender = {
        let producer = Arc::clone(&producer);
        thread::spawn(move || producer.send_bytes("t", b"k", b"v"))
    };
    entered.wait();

    let close_returned = Arc::new(AtomicBool::new(false));
    let closer = {
        let producer = Arc::clone(&producer);
        let close_returned = Arc::clone(&close_returned);
        thread::spawn(move || {
            let result = producer.close();
            close_returned.store(true, Ordering::SeqCst);
            result
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!close_returned.load(Ordering::SeqCst));
    assert_eq!(Counters::get(&connector.counters.producers_closed), 0);

    drop(release_tx);
    let message = sender.join().unwrap().unwrap();
    assert_eq!((message.topic.as_str(), message.offset), ("t", 0));

    closer.join().unwrap().unwrap();
    assert!(close_returned.load(Ordering::SeqCst));
    assert!(producer.is_closed());

    let err = producer.send_bytes("t", b"k", b"v").unwrap_err();
    assert!(matches!(
        err,
        ProducerError::SendFailed {
            source: BrokerError::Closed,
            ..
        }
    ));
}

#[test]
fn injected_logger_and_client_settings_are_used() {
    let logger = Logger::new("orders-producer");
    let client = ClientConfig {
        client_id: "edge-7".into(),
        compression: Compression::Gzip,
        ..ClientConfig::default()
    };
    let connector = FakeConnector::new();
    let producer = open(
        ProducerConfig::new(["b1:9092"])
            .with_logger(logger.clone())
            .with_client(client)
            .with_debug(true),
        &connector,
    );

    assert_eq!(logger.level(), LevelFilter::DEBUG);
    assert_eq!(
        producer.config().logger.as_ref().map(Logger::name),
        Some("orders-producer")
    );
    assert_eq!(producer.config().client.compression, Compression::Gzip);
    assert_eq!(*connector.client_ids.lock(), vec!["edge-7".to_string()]);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn nil_value_error_log_names_topic_and_key() {
    let connector = FakeConnector::new();
    let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, || {
        producer.send_message("audit", Some(b"user-42"), None, None)
    });

    assert!(matches!(result, Err(ProducerError::EmptyPayload)));
    let output = String::from_utf8(logs.0.lock().clone()).unwrap();
    assert!(output.contains("nil message can not be sent"));
    assert!(output.contains("audit"));
    assert!(output.contains("key=user-42"));
}

#[test]
fn unreachable_broker_leaks_nothing() {
    let connector = FakeConnector::new();
    let result = SyncProducer::with_connector(ProducerConfig::new([UNREACHABLE]), None, &connector);

    assert!(matches!(result, Err(ProducerError::BrokerUnavailable(_))));
    assert_eq!(Counters::get(&connector.counters.connect_attempts), 1);
    assert_eq!(Counters::get(&connector.counters.clients_opened), 0);
    assert_eq!(Counters::get(&connector.counters.producers_opened), 0);
}

#[test]
fn failed_producer_setup_closes_client() {
    let connector = FakeConnector::failing(Failures {
        producer_setup: true,
        ..Failures::default()
    });
    let wait_group = WaitGroup::new();
    let result =
        SyncProducer::with_connector(ProducerConfig::new(["b1:9092"]), Some(&wait_group), &connector);

    assert!(matches!(result, Err(ProducerError::BrokerUnavailable(_))));
    assert_eq!(Counters::get(&connector.counters.clients_opened), 1);
    assert_eq!(Counters::get(&connector.counters.clients_closed), 1);
    // no permit was taken
    wait_group.wait();
}

#[test]
fn invalid_config_never_connects() {
    let connector = FakeConnector::new();
    let mut config = ProducerConfig::new(["b1:9092"]);
    config.partitioner = None;

    let result = SyncProducer::with_connector(config, None, &connector);
    assert!(matches!(result, Err(ProducerError::InvalidConfig(_))));
    assert_eq!(Counters::get(&connector.counters.connect_attempts), 0);
}

#[test]
fn concurrent_sends_share_one_handle() {
    let connector = FakeConnector::new();
    let producer = Arc::new(open(ProducerConfig::new(["b1:9092"]), &connector));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let producer = Arc::clone(&producer);
            thread::spawn(move || {
                for i in 0..25 {
                    let value = format!("worker-{worker}-{i}");
                    producer.send_bytes("t", b"", value.as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut keys: Vec<_> = connector.sent().into_iter().filter_map(|r| r.key).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 200);
    assert_eq!(Counters::get(&connector.counters.send_attempts), 200);
    producer.close().unwrap();
}

proptest! {
    #[test]
    fn derived_key_is_md5_hex_of_value(value in proptest::collection::vec(any::<u8>(), 1..256)) {
        let connector = FakeConnector::new();
        let producer = open(ProducerConfig::new(["b1:9092"]), &connector);

        let message = producer.send_bytes("t", b"", &value).unwrap();
        let key = String::from_utf8(message.key.unwrap()).unwrap();
        prop_assert_eq!(key.len(), 32);
        prop_assert_eq!(&key, &key.to_lowercase());
        prop_assert_eq!(key, derive_key(&value));
    }

    #[test]
    fn override_applies_to_every_partitioner(
        partition in 0i32..64,
        kind in prop_oneof![
            Just(PartitionerKind::Hash),
            Just(PartitionerKind::Random),
            Just(PartitionerKind::Manual),
            Just(PartitionerKind::RoundRobin),
        ],
        key in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let connector = FakeConnector::new();
        let producer = open(
            ProducerConfig::new(["b1:9092"]).with_partitioner(kind).with_partition(partition),
            &connector,
        );

        let message = producer.send_bytes("t", &key, b"v").unwrap();
        prop_assert_eq!(message.partition, partition);
    }
}
