//! Counting broker doubles for producer tests.
#![allow(dead_code)]

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use agent_kafka::shared::kafka_message::client::{BrokerClient, Connector, SyncSender};
use agent_kafka::{BrokerError, ClientConfig, Delivery, OutboundRecord, ProducerSettings};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;

pub const PARTITIONS: u32 = 8;
pub const UNREACHABLE: &str = "unreachable:9092";

#[derive(Debug, Default)]
pub struct Counters {
    pub connect_attempts: AtomicUsize,
    pub clients_opened: AtomicUsize,
    pub clients_closed: AtomicUsize,
    pub producers_opened: AtomicUsize,
    pub producers_closed: AtomicUsize,
    pub send_attempts: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub producer_setup: bool,
    pub send: bool,
    pub producer_close: bool,
    pub client_close: bool,
}

/// Holds the first send inside the sender until `release` yields or disconnects.
///
/// `entered` is waited on once the send holds the sender's lock, so a test can
/// start a concurrent close while that send is in flight.
#[derive(Clone)]
pub struct SendGate {
    pub entered: Arc<Barrier>,
    pub release: Receiver<()>,
}

/// Connector whose clients and producers live in memory.
///
/// Sends land on the hinted partition or on `key length % PARTITIONS`, and
/// offsets count up from zero across the producer. Like the real backend,
/// a sender serialises `send` and `close` on one lock.
#[derive(Default)]
pub struct FakeConnector {
    pub counters: Arc<Counters>,
    pub failures: Failures,
    pub settings: Arc<Mutex<Option<ProducerSettings>>>,
    pub sent: Arc<Mutex<Vec<OutboundRecord>>>,
    pub gate: Option<SendGate>,
    pub client_ids: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: Failures) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn gated(gate: SendGate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn recorded_settings(&self) -> Option<ProducerSettings> {
        *self.settings.lock()
    }

    pub fn sent(&self) -> Vec<OutboundRecord> {
        self.sent.lock().clone()
    }
}

pub struct FakeClient {
    counters: Arc<Counters>,
    fail_close: bool,
}

impl BrokerClient for FakeClient {
    fn close(&self) -> Result<(), BrokerError> {
        self.counters.clients_closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(BrokerError::Other("client close failed".into()));
        }
        Ok(())
    }
}

pub struct FakeSender {
    counters: Arc<Counters>,
    failures: Failures,
    sent: Arc<Mutex<Vec<OutboundRecord>>>,
    next_offset: AtomicI64,
    closed: AtomicBool,
    in_flight: Mutex<()>,
    gate: Mutex<Option<SendGate>>,
}

impl SyncSender for FakeSender {
    fn send(&self, record: &OutboundRecord) -> Result<Delivery, BrokerError> {
        self.counters.send_attempts.fetch_add(1, Ordering::SeqCst);
        let _in_flight = self.in_flight.lock();
        if let Some(gate) = self.gate.lock().take() {
            gate.entered.wait();
            let _ = gate.release.recv();
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrokerError::Closed);
        }
        if self.failures.send {
            return Err(BrokerError::Other("leader not available".into()));
        }

        self.sent.lock().push(record.clone());
        let partition = record.partition.unwrap_or_else(|| {
            (record.key.as_ref().map_or(0, Vec::len) as u32 % PARTITIONS) as i32
        });
        Ok(Delivery {
            partition,
            offset: self.next_offset.fetch_add(1, Ordering::SeqCst),
        })
    }

    fn close(&self) -> Result<(), BrokerError> {
        let _in_flight = self.in_flight.lock();
        self.counters.producers_closed.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        if self.failures.producer_close {
            return Err(BrokerError::Other("producer close failed".into()));
        }
        Ok(())
    }
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    fn connect(&self, brokers: &[String], config: &ClientConfig) -> Result<FakeClient, BrokerError> {
        self.counters.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.client_ids.lock().push(config.client_id.clone());
        if brokers.iter().all(|broker| broker == UNREACHABLE) {
            return Err(BrokerError::Kafka("no host reachable".into()));
        }
        self.counters.clients_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeClient {
            counters: Arc::clone(&self.counters),
            fail_close: self.failures.client_close,
        })
    }

    fn producer(
        &self,
        _client: &FakeClient,
        config: &ClientConfig,
    ) -> Result<Box<dyn SyncSender>, BrokerError> {
        *self.settings.lock() = Some(config.producer);
        if self.failures.producer_setup {
            return Err(BrokerError::Other("producer setup failed".into()));
        }
        self.counters.producers_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSender {
            counters: Arc::clone(&self.counters),
            failures: self.failures,
            sent: Arc::clone(&self.sent),
            next_offset: AtomicI64::new(0),
            closed: AtomicBool::new(false),
            in_flight: Mutex::new(()),
            gate: Mutex::new(self.gate.clone()),
        }))
    }
}
