use async_trait::async_trait;
use contract_core_api::{ContractEvent, EventPublisher};
use std::time::Duration;
use tracing::{error, info, warn};

/// Transport that hands one event to the notification/automation consumers.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &ContractEvent) -> anyhow::Result<()>;
}

/// Publishes through an `EventSink` with a fixed number of attempts and a
/// fixed backoff between them. Exhausted events are logged and dropped.
pub struct RetryingEventPublisher<S> {
    sink: S,
    attempts: u32,
    backoff: Duration,
}

impl<S: EventSink> RetryingEventPublisher<S> {
    pub fn new(sink: S, attempts: u32, backoff: Duration) -> Self {
        Self {
            sink,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[async_trait]
impl<S: EventSink> EventPublisher for RetryingEventPublisher<S> {
    async fn publish(&self, event: ContractEvent) {
        for attempt in 1..=self.attempts {
            match self.sink.deliver(&event).await {
                Ok(()) => return,
                Err(e) if attempt < self.attempts => {
                    warn!(
                        event_type = event.event_type(),
                        contract_id = %event.contract_id(),
                        attempt,
                        error = %e,
                        "event delivery failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => {
                    error!(
                        event_type = event.event_type(),
                        contract_id = %event.contract_id(),
                        attempts = self.attempts,
                        error = %e,
                        "event dropped after exhausting retries"
                    );
                }
            }
        }
    }
}

/// Writes every event to the log as its flat JSON payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn deliver(&self, event: &ContractEvent) -> anyhow::Result<()> {
        info!(
            event_type = event.event_type(),
            payload = %event.payload(),
            "contract event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct FlakySink {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl EventSink for FlakySink {
        async fn deliver(&self, _event: &ContractEvent) -> anyhow::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                anyhow::bail!("broker unavailable (call {call})");
            }
            Ok(())
        }
    }

    fn event() -> ContractEvent {
        ContractEvent::ContractTerminated {
            contract_id: Uuid::new_v4(),
            contract_number: "CC-1".to_string(),
            terminated_by: Uuid::new_v4(),
            reason: "sold".to_string(),
        }
    }

    #[tokio::test]
    async fn test_retries_until_delivered() {
        let sink = FlakySink {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let publisher = RetryingEventPublisher::new(sink, 3, Duration::from_millis(1));

        publisher.publish(event()).await;

        assert_eq!(publisher.sink().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_fixed_attempts() {
        let sink = FlakySink {
            failures_before_success: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let publisher = RetryingEventPublisher::new(sink, 3, Duration::from_millis(1));

        // Never propagates the failure
        publisher.publish(event()).await;

        assert_eq!(publisher.sink().calls.load(Ordering::SeqCst), 3);
    }
}
