use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use fleet_dispatch::engine::dispatch::Dispatcher;
use fleet_dispatch::error::SendError;
use fleet_dispatch::models::dispatch::{DispatchRequest, DispatchStatus};
use fleet_dispatch::models::driver::{Channel, Driver};
use fleet_dispatch::traits::ChannelSender;

fn driver(telegram: Option<&str>, email: Option<&str>, fallback_enabled: bool) -> Driver {
    Driver {
        id: Uuid::from_u128(1),
        name: "Dana".to_string(),
        telegram_chat_id: telegram.map(str::to_string),
        email: email.map(str::to_string),
        preferred_channel: None,
        fallback_enabled,
    }
}

fn request(channels: Option<Vec<Channel>>, multi_channel: Option<bool>) -> DispatchRequest {
    DispatchRequest {
        route_id: Uuid::from_u128(9),
        driver_id: Uuid::from_u128(1),
        channels,
        multi_channel,
    }
}

/// Sender that fails for a configured set of channels and records the order
/// of delivery attempts.
#[derive(Clone, Default)]
struct FakeSender {
    failing: Vec<Channel>,
    sent: Arc<Mutex<Vec<Channel>>>,
}

impl FakeSender {
    fn failing(channels: Vec<Channel>) -> Self {
        Self {
            failing: channels,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn attempted(&self) -> Vec<Channel> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSender for FakeSender {
    async fn send(
        &self,
        channel: Channel,
        _driver: &Driver,
        _message: &str,
    ) -> Result<String, SendError> {
        self.sent.lock().unwrap().push(channel);
        if self.failing.contains(&channel) {
            Err(SendError(format!("{} unavailable", channel.as_str())))
        } else {
            Ok(format!("msg-{}", channel.as_str()))
        }
    }
}

#[tokio::test]
async fn delivers_over_the_resolved_channel() {
    let sender = FakeSender::default();
    let dispatcher = Dispatcher::new(sender.clone());
    let d = driver(Some("123"), None, false);

    let outcome = dispatcher
        .dispatch(&request(None, None), &d, "route ready")
        .await;

    assert_eq!(outcome.status, DispatchStatus::Sent);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.attempts[0].channel, Channel::Telegram);
    assert_eq!(
        outcome.attempts[0].provider_message_id.as_deref(),
        Some("msg-telegram")
    );
    assert_eq!(sender.attempted(), vec![Channel::Telegram]);
}

#[tokio::test]
async fn falls_back_after_primary_failure() {
    let sender = FakeSender::failing(vec![Channel::Telegram]);
    let dispatcher = Dispatcher::new(sender.clone());
    let d = driver(Some("123"), Some("a@b.com"), true);

    let outcome = dispatcher
        .dispatch(&request(None, None), &d, "route ready")
        .await;

    assert_eq!(outcome.status, DispatchStatus::Partial);
    assert_eq!(sender.attempted(), vec![Channel::Telegram, Channel::Email]);
    assert!(!outcome.attempts[0].success);
    assert!(outcome.attempts[1].success);
    assert_eq!(
        outcome.attempts[0].error.as_deref(),
        Some("telegram unavailable")
    );
}

#[tokio::test]
async fn no_fallback_without_opt_in() {
    let sender = FakeSender::failing(vec![Channel::Telegram]);
    let dispatcher = Dispatcher::new(sender.clone());
    let d = driver(Some("123"), Some("a@b.com"), false);

    let outcome = dispatcher
        .dispatch(&request(None, None), &d, "route ready")
        .await;

    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert_eq!(sender.attempted(), vec![Channel::Telegram]);
}

#[tokio::test]
async fn multi_channel_sends_to_every_available_channel() {
    let sender = FakeSender::default();
    let dispatcher = Dispatcher::new(sender.clone());
    let d = driver(Some("123"), Some("a@b.com"), false);

    let outcome = dispatcher
        .dispatch(&request(None, Some(true)), &d, "route ready")
        .await;

    assert_eq!(outcome.status, DispatchStatus::Sent);
    assert_eq!(sender.attempted(), vec![Channel::Telegram, Channel::Email]);
}

#[tokio::test]
async fn fallback_skips_channels_already_attempted() {
    let sender = FakeSender::failing(vec![Channel::Telegram]);
    let dispatcher = Dispatcher::new(sender.clone());
    let d = driver(Some("123"), Some("a@b.com"), true);

    let outcome = dispatcher
        .dispatch(&request(None, Some(true)), &d, "route ready")
        .await;

    // email already received the message; no second attempt for telegram's
    // fallback
    assert_eq!(outcome.status, DispatchStatus::Partial);
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(sender.attempted(), vec![Channel::Telegram, Channel::Email]);
}

#[tokio::test]
async fn unreachable_driver_fails_without_attempts() {
    let sender = FakeSender::default();
    let dispatcher = Dispatcher::new(sender.clone());
    let d = driver(None, Some("   "), true);

    let outcome = dispatcher
        .dispatch(&request(None, None), &d, "route ready")
        .await;

    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert!(outcome.attempts.is_empty());
    assert!(sender.attempted().is_empty());
}
