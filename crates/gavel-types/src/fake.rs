//! A recording [`AuctionRunner`] double for tests.

use tokio::sync::{Mutex, Semaphore};

use crate::auction::{
    AuctionRunner, StartAuctionRequest, StartAuctionResult, StopAuctionRequest,
    StopAuctionResult,
};

#[derive(Default)]
struct Recorded {
    start_requests: Vec<StartAuctionRequest>,
    stop_requests: Vec<StopAuctionRequest>,
    start_error: Option<String>,
    stop_error: Option<String>,
}

/// Test double that records every auction request it receives.
///
/// By default every call succeeds immediately with a default result.
/// `fail_*` makes subsequent calls return an error; a gated runner
/// ([`FakeRunner::gated`]) blocks each call until the test hands it a
/// permit via [`FakeRunner::release_one`], which is how the tests pin
/// down concurrency limits without sleeping.
pub struct FakeRunner {
    recorded: Mutex<Recorded>,
    gate: Option<Semaphore>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            recorded: Mutex::new(Recorded::default()),
            gate: None,
        }
    }

    /// A runner whose calls block until [`FakeRunner::release_one`].
    pub fn gated() -> Self {
        Self {
            recorded: Mutex::new(Recorded::default()),
            gate: Some(Semaphore::new(0)),
        }
    }

    /// Let exactly one blocked (or future) auction through the gate.
    pub fn release_one(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Make every subsequent start-auction fail with `message`.
    pub async fn fail_start_auctions(&self, message: &str) {
        self.recorded.lock().await.start_error = Some(message.to_string());
    }

    /// Make every subsequent stop-auction fail with `message`.
    pub async fn fail_stop_auctions(&self, message: &str) {
        self.recorded.lock().await.stop_error = Some(message.to_string());
    }

    pub async fn start_auction_count(&self) -> usize {
        self.recorded.lock().await.start_requests.len()
    }

    pub async fn stop_auction_count(&self) -> usize {
        self.recorded.lock().await.stop_requests.len()
    }

    pub async fn start_requests(&self) -> Vec<StartAuctionRequest> {
        self.recorded.lock().await.start_requests.clone()
    }

    pub async fn stop_requests(&self) -> Vec<StopAuctionRequest> {
        self.recorded.lock().await.stop_requests.clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                // Consume the permit so each release admits one call.
                permit.forget();
            }
        }
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuctionRunner for FakeRunner {
    async fn run_lrp_start_auction(
        &self,
        request: StartAuctionRequest,
    ) -> anyhow::Result<StartAuctionResult> {
        let error = {
            let mut recorded = self.recorded.lock().await;
            recorded.start_requests.push(request);
            recorded.start_error.clone()
        };
        self.wait_for_gate().await;
        match error {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(StartAuctionResult::default()),
        }
    }

    async fn run_lrp_stop_auction(
        &self,
        request: StopAuctionRequest,
    ) -> anyhow::Result<StopAuctionResult> {
        let error = {
            let mut recorded = self.recorded.lock().await;
            recorded.stop_requests.push(request);
            recorded.stop_error.clone()
        };
        self.wait_for_gate().await;
        match error {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(StopAuctionResult::default()),
        }
    }
}
