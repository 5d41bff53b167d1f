//! Shared harness for the auctioneer integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use gavel_auctioneer::{Auctioneer, AuctioneerError, Config, Signal};
use gavel_store::fake::FakeStore;
use gavel_types::fake::FakeRunner;
use gavel_types::{DesiredLrp, ExecutorPresence, LrpStartAuction, LrpStopAuction};

pub const MAX_ROUNDS_FOR_TEST: u32 = 10;

/// Config used by most tests: two concurrent start-auctions, ten
/// bidding rounds, shortest legal lock interval.
pub fn test_config() -> Config {
    Config {
        max_concurrent: 2,
        max_rounds: MAX_ROUNDS_FOR_TEST,
        lock_interval: Duration::from_secs(1),
        identity: Some("test-auctioneer".to_string()),
    }
}

pub fn executor(id: &str, stack: &str) -> ExecutorPresence {
    ExecutorPresence {
        executor_id: id.to_string(),
        stack: stack.to_string(),
    }
}

/// The canonical three-executor registry: two lucid64 reps and one
/// .Net rep.
pub fn registry() -> Vec<ExecutorPresence> {
    vec![
        executor("first-rep", "lucid64"),
        executor("second-rep", ".Net"),
        executor("third-rep", "lucid64"),
    ]
}

pub fn start_auction(process_guid: &str, stack: &str) -> LrpStartAuction {
    LrpStartAuction {
        desired_lrp: DesiredLrp {
            process_guid: process_guid.to_string(),
            stack: stack.to_string(),
            instances: 1,
            memory_mb: 128,
            disk_mb: 512,
        },
        instance_guid: format!("{process_guid}-instance"),
        index: 0,
        num_azs: 1,
    }
}

pub fn stop_auction(process_guid: &str) -> LrpStopAuction {
    LrpStopAuction {
        process_guid: process_guid.to_string(),
        index: 0,
        num_instances: 1,
        num_azs: 1,
    }
}

/// A running auctioneer wired to fakes.
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub runner: Arc<FakeRunner>,
    pub signals: mpsc::Sender<Signal>,
    pub ready: Option<oneshot::Receiver<()>>,
    pub handle: JoinHandle<Result<(), AuctioneerError>>,
}

impl Harness {
    pub fn start(runner: FakeRunner, config: Config) -> Self {
        Self::start_with_store(Arc::new(FakeStore::new()), runner, config)
    }

    pub fn start_with_store(store: Arc<FakeStore>, runner: FakeRunner, config: Config) -> Self {
        let runner = Arc::new(runner);
        let auctioneer = Auctioneer::new(Arc::clone(&store), Arc::clone(&runner), config);
        let (signal_tx, signal_rx) = mpsc::channel(1);
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(auctioneer.run(signal_rx, ready_tx));
        Self {
            store,
            runner,
            signals: signal_tx,
            ready: Some(ready_rx),
            handle,
        }
    }

    /// Tick the lock to `true` and wait for the ready signal.
    pub async fn acquire_lock(&mut self) {
        self.store.send_lock_state(true).await;
        self.wait_ready().await;
    }

    /// Whether the ready signal has not fired yet.
    pub fn ready_is_pending(&mut self) -> bool {
        match &mut self.ready {
            Some(ready) => matches!(ready.try_recv(), Err(oneshot::error::TryRecvError::Empty)),
            None => false,
        }
    }

    pub async fn wait_ready(&mut self) {
        let ready = self.ready.take().expect("ready already consumed");
        ready.await.expect("auctioneer dropped the ready signal");
    }

    /// TERM the auctioneer, acknowledge the lock release, and wait for
    /// a clean exit.
    pub async fn shutdown(self) {
        self.signals.send(Signal::Terminate).await.unwrap();
        let ack = self.store.expect_release().await;
        let _ = ack.send(());
        self.handle.await.unwrap().unwrap();
    }
}

/// Poll `condition` until it holds, failing the test after 5 seconds.
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if condition().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within 5s");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Assert `condition` holds continuously for `window`.
pub async fn consistently<F, Fut>(mut condition: F, window: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + window;
    while tokio::time::Instant::now() < deadline {
        assert!(condition().await, "condition violated during window");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Captures formatted `tracing` output so tests can assert on it.
///
/// Works with the default current-thread test runtime: `install` sets a
/// thread-local subscriber, and every task the test spawns is polled on
/// this thread.
#[derive(Clone, Default)]
pub struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(Arc::clone(&self.bytes))
    }
}
