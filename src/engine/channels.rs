//! Channel selection for driver dispatches.
//!
//! Pure decision functions: priority is request override, then multi-channel,
//! then driver preference, then the system default. Fallback picks the next
//! configured channel after a failed delivery.

use crate::models::dispatch::DispatchRequest;
use crate::models::driver::{Channel, Driver};

/// Order decides default and fallback tie-breaks.
pub const SUPPORTED_CHANNELS: [Channel; 2] = [Channel::Telegram, Channel::Email];

pub const DEFAULT_CHANNEL: Channel = Channel::Telegram;

/// Channels the driver has usable contact details for, in
/// `SUPPORTED_CHANNELS` order.
pub fn available_channels(driver: &Driver) -> Vec<Channel> {
    SUPPORTED_CHANNELS
        .into_iter()
        .filter(|channel| driver.has_channel_config(*channel))
        .collect()
}

/// Resolves the channel(s) a dispatch should use. Rules apply in order;
/// the first that produces a non-empty result wins.
pub fn resolve_channels(request: &DispatchRequest, driver: &Driver) -> Vec<Channel> {
    let available = available_channels(driver);
    if available.is_empty() {
        return Vec::new();
    }

    // Request override keeps the caller's order. If none of the requested
    // channels are configured, the override does not apply at all.
    if let Some(requested) = &request.channels {
        if !requested.is_empty() {
            let valid: Vec<Channel> = requested
                .iter()
                .copied()
                .filter(|channel| driver.has_channel_config(*channel))
                .collect();
            if !valid.is_empty() {
                return valid;
            }
        }
    }

    if request.multi_channel == Some(true) {
        return available;
    }

    if let Some(preferred) = driver.preferred_channel {
        if driver.has_channel_config(preferred) {
            return vec![preferred];
        }
    }

    if driver.has_channel_config(DEFAULT_CHANNEL) {
        return vec![DEFAULT_CHANNEL];
    }

    vec![available[0]]
}

/// Next configured channel to try after `failed`, or `None` when fallback is
/// disabled or no other channel is configured.
pub fn fallback_channel(driver: &Driver, failed: Channel) -> Option<Channel> {
    if !driver.fallback_enabled {
        return None;
    }

    available_channels(driver)
        .into_iter()
        .find(|channel| *channel != failed)
}
