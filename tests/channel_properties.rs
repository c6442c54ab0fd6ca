//! Property-based tests for dispatch channel selection.
//!
//! # Invariants tested
//!
//! - **Availability:** resolved channels are always a subset of the driver's
//!   configured channels, and empty exactly when nothing is configured.
//! - **Override precedence:** a usable request override wins over preference
//!   and multi-channel, preserving the caller's order.
//! - **Multi-channel completeness:** multi-channel returns every available
//!   channel, nothing more.
//! - **Fallback exclusion:** a fallback is never the channel that failed and
//!   requires the driver's opt-in.
//! - **Determinism:** identical inputs resolve identically.

use proptest::prelude::*;
use uuid::Uuid;

use fleet_dispatch::engine::channels::{
    DEFAULT_CHANNEL, SUPPORTED_CHANNELS, available_channels, fallback_channel, resolve_channels,
};
use fleet_dispatch::models::dispatch::DispatchRequest;
use fleet_dispatch::models::driver::{Channel, Driver};

fn channel_strategy() -> impl Strategy<Value = Channel> {
    prop_oneof![Just(Channel::Telegram), Just(Channel::Email)]
}

/// Contact fields mix absent, blank and usable values so the trim rule is
/// exercised everywhere.
fn contact_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        "[a-z0-9@.]{1,12}".prop_map(Some),
    ]
}

fn driver_strategy() -> impl Strategy<Value = Driver> {
    (
        contact_strategy(),
        contact_strategy(),
        proptest::option::of(channel_strategy()),
        any::<bool>(),
    )
        .prop_map(|(telegram_chat_id, email, preferred_channel, fallback_enabled)| Driver {
            id: Uuid::from_u128(1),
            name: "prop-driver".to_string(),
            telegram_chat_id,
            email,
            preferred_channel,
            fallback_enabled,
        })
}

fn request_strategy() -> impl Strategy<Value = DispatchRequest> {
    (
        proptest::option::of(proptest::collection::vec(channel_strategy(), 0..3)),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(channels, multi_channel)| DispatchRequest {
            route_id: Uuid::from_u128(9),
            driver_id: Uuid::from_u128(1),
            channels,
            multi_channel,
        })
}

fn override_applies(request: &DispatchRequest, driver: &Driver) -> bool {
    request.channels.as_ref().is_some_and(|channels| {
        channels
            .iter()
            .any(|channel| driver.has_channel_config(*channel))
    })
}

proptest! {
    #![proptest_config(ProptestConfig { max_global_rejects: 100_000, ..ProptestConfig::with_cases(256) })]

    /// Resolved channels are a subset of the available set, and the result
    /// is empty exactly when the driver has no configured channel.
    #[test]
    fn resolution_respects_availability(
        request in request_strategy(),
        driver in driver_strategy(),
    ) {
        let available = available_channels(&driver);
        let resolved = resolve_channels(&request, &driver);

        prop_assert_eq!(available.is_empty(), resolved.is_empty());
        for channel in &resolved {
            prop_assert!(available.contains(channel));
        }
    }

    /// A usable override returns exactly its available subset, in the
    /// caller's order, regardless of preference or multi-channel.
    #[test]
    fn override_takes_precedence(
        request in request_strategy(),
        driver in driver_strategy(),
    ) {
        prop_assume!(override_applies(&request, &driver));

        let requested = request.channels.clone().unwrap();
        let expected: Vec<Channel> = requested
            .iter()
            .copied()
            .filter(|channel| driver.has_channel_config(*channel))
            .collect();

        prop_assert_eq!(resolve_channels(&request, &driver), expected);
    }

    /// Without a usable override, multi-channel returns the full available
    /// set.
    #[test]
    fn multi_channel_is_complete(
        request in request_strategy(),
        driver in driver_strategy(),
    ) {
        prop_assume!(!override_applies(&request, &driver));

        let mut request = request;
        request.multi_channel = Some(true);

        prop_assert_eq!(resolve_channels(&request, &driver), available_channels(&driver));
    }

    /// An unconfigured preference never leaks into the result; resolution
    /// falls through to the default or first available channel.
    #[test]
    fn unusable_preference_falls_through(
        driver in driver_strategy(),
        preferred in channel_strategy(),
    ) {
        prop_assume!(!driver.has_channel_config(preferred));

        let mut driver = driver;
        driver.preferred_channel = Some(preferred);

        let request = DispatchRequest {
            route_id: Uuid::from_u128(9),
            driver_id: Uuid::from_u128(1),
            channels: None,
            multi_channel: None,
        };

        let available = available_channels(&driver);
        let resolved = resolve_channels(&request, &driver);

        prop_assert!(!resolved.contains(&preferred));
        if !available.is_empty() {
            let expected = if driver.has_channel_config(DEFAULT_CHANNEL) {
                vec![DEFAULT_CHANNEL]
            } else {
                vec![available[0]]
            };
            prop_assert_eq!(resolved, expected);
        }
    }

    /// A fallback is never the failed channel itself, requires opt-in, and
    /// needs a second configured channel to exist.
    #[test]
    fn fallback_excludes_the_failed_channel(
        driver in driver_strategy(),
        failed in channel_strategy(),
    ) {
        let available = available_channels(&driver);
        prop_assume!(available.contains(&failed));

        let fallback = fallback_channel(&driver, failed);

        prop_assert_ne!(fallback, Some(failed));
        if !driver.fallback_enabled || available.len() <= 1 {
            prop_assert_eq!(fallback, None);
        } else {
            let got = fallback.unwrap();
            prop_assert!(driver.has_channel_config(got));
        }
    }

    /// Repeated calls with identical inputs agree.
    #[test]
    fn resolution_is_deterministic(
        request in request_strategy(),
        driver in driver_strategy(),
        failed in channel_strategy(),
    ) {
        prop_assert_eq!(
            resolve_channels(&request, &driver),
            resolve_channels(&request, &driver)
        );
        prop_assert_eq!(
            fallback_channel(&driver, failed),
            fallback_channel(&driver, failed)
        );
    }
}

/// The worked example: an email override on a fully configured driver, then
/// a fallback after email fails.
#[test]
fn email_override_with_telegram_fallback() {
    let driver = Driver {
        id: Uuid::from_u128(1),
        name: "Dana".to_string(),
        telegram_chat_id: Some("123".to_string()),
        email: Some("a@b.com".to_string()),
        preferred_channel: Some(Channel::Email),
        fallback_enabled: true,
    };
    let request = DispatchRequest {
        route_id: Uuid::from_u128(9),
        driver_id: Uuid::from_u128(1),
        channels: Some(vec![Channel::Email]),
        multi_channel: None,
    };

    assert_eq!(resolve_channels(&request, &driver), vec![Channel::Email]);
    assert_eq!(
        fallback_channel(&driver, Channel::Email),
        Some(Channel::Telegram)
    );
}

#[test]
fn default_channel_is_first_supported() {
    assert_eq!(SUPPORTED_CHANNELS[0], DEFAULT_CHANNEL);
}
