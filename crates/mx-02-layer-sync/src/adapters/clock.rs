//! Wall-clock sleeps on the tokio timer.

use std::time::Duration;

use async_trait::async_trait;

use crate::ports::Clock;

/// Production clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
