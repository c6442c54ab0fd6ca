//! Delivery flow over the channels picked by the router.
//!
//! Sends to every resolved channel concurrently, then tries at most one
//! fallback per failed primary, skipping channels that were already
//! attempted.

use chrono::Utc;
use tracing::{info, warn};

use crate::engine::channels::{fallback_channel, resolve_channels};
use crate::models::dispatch::{ChannelAttempt, DispatchOutcome, DispatchRequest, DispatchStatus};
use crate::models::driver::{Channel, Driver};
use crate::traits::ChannelSender;

pub struct Dispatcher<S> {
    sender: S,
}

impl<S: ChannelSender> Dispatcher<S> {
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    pub async fn dispatch(
        &self,
        request: &DispatchRequest,
        driver: &Driver,
        message: &str,
    ) -> DispatchOutcome {
        let channels = resolve_channels(request, driver);

        if channels.is_empty() {
            warn!(
                driver_id = %driver.id,
                route_id = %request.route_id,
                "no channels available for dispatch"
            );
            return DispatchOutcome {
                status: DispatchStatus::Failed,
                attempts: Vec::new(),
            };
        }

        let mut attempts = futures::future::join_all(
            channels
                .iter()
                .map(|channel| self.attempt(*channel, driver, message)),
        )
        .await;

        let failed: Vec<Channel> = attempts
            .iter()
            .filter(|attempt| !attempt.success)
            .map(|attempt| attempt.channel)
            .collect();

        for failed_channel in failed {
            let Some(fallback) = fallback_channel(driver, failed_channel) else {
                continue;
            };
            if attempts.iter().any(|attempt| attempt.channel == fallback) {
                continue;
            }

            info!(
                driver_id = %driver.id,
                failed_channel = failed_channel.as_str(),
                fallback_channel = fallback.as_str(),
                "attempting fallback channel"
            );
            attempts.push(self.attempt(fallback, driver, message).await);
        }

        let successes = attempts.iter().filter(|attempt| attempt.success).count();
        let status = if successes == attempts.len() {
            DispatchStatus::Sent
        } else if successes > 0 {
            DispatchStatus::Partial
        } else {
            DispatchStatus::Failed
        };

        info!(
            driver_id = %driver.id,
            route_id = %request.route_id,
            attempts = attempts.len(),
            successes,
            "dispatch processing complete"
        );

        DispatchOutcome { status, attempts }
    }

    async fn attempt(&self, channel: Channel, driver: &Driver, message: &str) -> ChannelAttempt {
        match self.sender.send(channel, driver, message).await {
            Ok(provider_message_id) => ChannelAttempt {
                channel,
                success: true,
                provider_message_id: Some(provider_message_id),
                error: None,
                attempted_at: Utc::now(),
            },
            Err(err) => {
                warn!(
                    driver_id = %driver.id,
                    channel = channel.as_str(),
                    error = %err,
                    "channel delivery failed"
                );
                ChannelAttempt {
                    channel,
                    success: false,
                    provider_message_id: None,
                    error: Some(err.to_string()),
                    attempted_at: Utc::now(),
                }
            }
        }
    }
}
