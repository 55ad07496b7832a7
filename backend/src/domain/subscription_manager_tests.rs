//! Tests for the subscription manager.

use std::collections::BTreeMap;

use mockall::Sequence;
use rstest::rstest;

use super::*;
use crate::domain::ports::{HandlerError, MockNotificationHandler, MockSubscriptionBroker};

fn settings() -> SubscriptionSettings {
    SubscriptionSettings {
        settle_delay: Duration::from_secs(5),
        ..SubscriptionSettings::default()
    }
}

fn manager(
    broker: MockSubscriptionBroker,
    handler: MockNotificationHandler,
) -> SubscriptionManager<MockSubscriptionBroker, MockNotificationHandler> {
    SubscriptionManager::new(Arc::new(broker), Arc::new(handler), settings())
}

fn message(ack_id: &str, body: &[u8], cap: Option<&str>) -> ReceivedMessage {
    let mut attributes = BTreeMap::new();
    if let Some(cap) = cap {
        attributes.insert(CAP_ATTRIBUTE.to_owned(), cap.to_owned());
    }
    ReceivedMessage {
        ack_id: ack_id.to_owned(),
        message_id: format!("msg-{ack_id}"),
        data: body.to_vec(),
        attributes,
        publish_time: None,
    }
}

fn codes(raw: &str) -> PostalCodeFilter {
    parse_postal_code_list(raw).expect("valid list")
}

#[tokio::test(start_paused = true)]
async fn provision_tolerates_missing_subscription_and_renders_filter() {
    let mut seq = Sequence::new();
    let mut broker = MockSubscriptionBroker::new();
    broker
        .expect_delete_subscription()
        .withf(|name| name == DEFAULT_SUBSCRIPTION)
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|name| Err(SubscriptionBrokerError::not_found(name)));
    broker
        .expect_create_subscription()
        .withf(|name, topic, filter| {
            name == DEFAULT_SUBSCRIPTION
                && topic == DEFAULT_TOPIC
                && filter.to_string()
                    == r#"attributes:cap AND (attributes.cap = "20100" OR attributes.cap = "20200")"#
        })
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _, _| Ok(()));

    let manager = manager(broker, MockNotificationHandler::new());
    let started = tokio::time::Instant::now();
    manager
        .provision(&codes("20100,20200"))
        .await
        .expect("provisioned");

    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(manager.state(), SubscriberState::Provisioning);
}

#[tokio::test(start_paused = true)]
async fn unfiltered_subscription_requires_cap_presence() {
    let mut broker = MockSubscriptionBroker::new();
    broker.expect_delete_subscription().return_once(|_| Ok(()));
    broker
        .expect_create_subscription()
        .withf(|_, _, filter| filter.to_string() == "attributes:cap")
        .times(1)
        .return_once(|_, _, _| Ok(()));

    manager(broker, MockNotificationHandler::new())
        .provision(&PostalCodeFilter::any())
        .await
        .expect("provisioned");
}

#[rstest]
#[case(SubscriptionBrokerError::transport("connection reset"), false)]
#[case(SubscriptionBrokerError::already_exists(DEFAULT_SUBSCRIPTION), true)]
#[tokio::test(start_paused = true)]
async fn provisioning_failures_stop_the_run(
    #[case] failure: SubscriptionBrokerError,
    #[case] fails_on_create: bool,
) {
    let mut broker = MockSubscriptionBroker::new();
    let expected = failure.clone();
    if fails_on_create {
        broker.expect_delete_subscription().return_once(|_| Ok(()));
        broker
            .expect_create_subscription()
            .return_once(move |_, _, _| Err(failure));
    } else {
        broker
            .expect_delete_subscription()
            .return_once(move |_| Err(failure));
        broker.expect_create_subscription().times(0);
    }

    let manager = manager(broker, MockNotificationHandler::new());
    let err = manager
        .provision(&PostalCodeFilter::any())
        .await
        .expect_err("provisioning fails");

    assert_eq!(
        err,
        SubscriberError::SubscriptionProvisioningFailed {
            subscription: DEFAULT_SUBSCRIPTION.to_owned(),
            source: expected,
        }
    );
    assert_eq!(manager.state(), SubscriberState::Stopped);
}

/// Pull result that stops the loop once it is observed.
fn cancel_and_idle(
    cancel: CancellationToken,
) -> impl FnOnce(&str, usize) -> Result<Vec<ReceivedMessage>, SubscriptionBrokerError> + Send + 'static
{
    move |_, _| {
        cancel.cancel();
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn handled_deliveries_are_acknowledged_until_cancelled() {
    let cancel = CancellationToken::new();
    let mut seq = Sequence::new();
    let mut broker = MockSubscriptionBroker::new();
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| {
            Ok(vec![
                message("a", b"Via Roma", Some("20100")),
                message("b", b"Via Dante", Some("20121")),
            ])
        });
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(cancel_and_idle(cancel.clone()));
    broker
        .expect_acknowledge()
        .withf(|name, ack_id| name == DEFAULT_SUBSCRIPTION && (ack_id == "a" || ack_id == "b"))
        .times(2)
        .returning(|_, _| Ok(()));

    let mut handler = MockNotificationHandler::new();
    handler
        .expect_handle()
        .withf(|delivery| delivery.body == "Via Roma" && delivery.cap == "20100")
        .times(1)
        .return_once(|_| Ok(()));
    handler
        .expect_handle()
        .withf(|delivery| delivery.body == "Via Dante" && delivery.cap == "20121")
        .times(1)
        .return_once(|_| Ok(()));

    let manager = manager(broker, handler);
    let states = manager.subscribe_state();
    let acknowledged = manager.listen(cancel).await.expect("listen ends cleanly");

    assert_eq!(acknowledged, 2);
    assert_eq!(*states.borrow(), SubscriberState::Stopped);
}

#[tokio::test]
async fn pull_timeouts_are_retried_until_a_delivery_arrives() {
    let cancel = CancellationToken::new();
    let mut seq = Sequence::new();
    let mut broker = MockSubscriptionBroker::new();
    broker
        .expect_pull()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(SubscriptionBrokerError::timeout("deadline exceeded")));
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(vec![message("a", b"Via Roma", Some("20100"))]));
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(cancel_and_idle(cancel.clone()));
    broker
        .expect_acknowledge()
        .withf(|_, ack_id| ack_id == "a")
        .times(1)
        .return_once(|_, _| Ok(()));

    let mut handler = MockNotificationHandler::new();
    handler
        .expect_handle()
        .withf(|delivery| delivery.body == "Via Roma" && delivery.cap == "20100")
        .times(1)
        .return_once(|_| Ok(()));

    let manager = manager(broker, handler);
    let acknowledged = manager.listen(cancel).await.expect("listen ends cleanly");

    assert_eq!(acknowledged, 1);
    assert_eq!(manager.state(), SubscriberState::Stopped);
}

#[tokio::test]
async fn empty_pulls_keep_listening() {
    let cancel = CancellationToken::new();
    let mut seq = Sequence::new();
    let mut broker = MockSubscriptionBroker::new();
    broker
        .expect_pull()
        .times(3)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(Vec::new()));
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(cancel_and_idle(cancel.clone()));

    let manager = manager(broker, MockNotificationHandler::new());
    let acknowledged = manager.listen(cancel).await.expect("listen ends cleanly");

    assert_eq!(acknowledged, 0);
    assert_eq!(manager.state(), SubscriberState::Stopped);
}

#[tokio::test]
async fn failed_or_undecodable_deliveries_are_not_acknowledged() {
    let cancel = CancellationToken::new();
    let mut seq = Sequence::new();
    let mut broker = MockSubscriptionBroker::new();
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| {
            Ok(vec![
                message("bad-utf8", &[0xff, 0xfe], Some("20100")),
                message("no-cap", b"Via Roma", None),
                message("rejected", b"Via Roma", Some("20100")),
            ])
        });
    broker
        .expect_pull()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(cancel_and_idle(cancel.clone()));
    broker.expect_acknowledge().times(0);

    let mut handler = MockNotificationHandler::new();
    handler
        .expect_handle()
        .times(1)
        .return_once(|_| Err(HandlerError::failed("stdout closed")));

    let acknowledged = manager(broker, handler)
        .listen(cancel)
        .await
        .expect("listen ends cleanly");
    assert_eq!(acknowledged, 0);
}

#[tokio::test]
async fn cancellation_before_pull_stops_without_delivering() {
    let mut broker = MockSubscriptionBroker::new();
    broker.expect_pull().times(0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let manager = manager(broker, MockNotificationHandler::new());
    let acknowledged = manager.listen(cancel).await.expect("cancelled cleanly");

    assert_eq!(acknowledged, 0);
    assert_eq!(manager.state(), SubscriberState::Stopped);
}

#[tokio::test]
async fn cancellation_mid_batch_finishes_current_delivery_only() {
    let cancel = CancellationToken::new();
    let mut broker = MockSubscriptionBroker::new();
    broker.expect_pull().times(1).return_once(|_, _| {
        Ok(vec![
            message("a", b"Via Roma", Some("20100")),
            message("b", b"Via Dante", Some("20100")),
        ])
    });
    broker
        .expect_acknowledge()
        .withf(|_, ack_id| ack_id == "a")
        .times(1)
        .return_once(|_, _| Ok(()));

    let mut handler = MockNotificationHandler::new();
    let handler_cancel = cancel.clone();
    handler.expect_handle().times(1).return_once(move |_| {
        handler_cancel.cancel();
        Ok(())
    });

    let acknowledged = manager(broker, handler)
        .listen(cancel)
        .await
        .expect("cancelled cleanly");
    assert_eq!(acknowledged, 1);
}

#[tokio::test]
async fn non_timeout_pull_errors_are_fatal() {
    let mut broker = MockSubscriptionBroker::new();
    broker
        .expect_pull()
        .times(1)
        .return_once(|name, _| Err(SubscriptionBrokerError::not_found(name)));

    let manager = manager(broker, MockNotificationHandler::new());
    let err = manager
        .listen(CancellationToken::new())
        .await
        .expect_err("pull failed");

    assert!(matches!(err, SubscriberError::PullFailed { .. }));
    assert_eq!(manager.state(), SubscriberState::Stopped);
}

#[rstest]
#[case("20100", &[20100])]
#[case(" 20100 , 20200 ", &[20100, 20200])]
#[case("20100,20100,30100", &[20100, 30100])]
#[case("   ", &[])]
fn postal_code_lists_parse(#[case] raw: &str, #[case] expected: &[u32]) {
    let filter = codes(raw);
    let parsed: Vec<u32> = filter.postal_codes().iter().map(|code| code.get()).collect();
    assert_eq!(parsed, expected);
}

#[rstest]
#[case("20100,,20200", "")]
#[case("9999", "9999")]
#[case("20100,milano", "milano")]
fn invalid_postal_code_lists_abort(#[case] raw: &str, #[case] bad_entry: &str) {
    let err = parse_postal_code_list(raw).expect_err("invalid list");
    assert!(matches!(
        err,
        SubscriberError::InvalidPostalCode { ref entry, .. } if entry == bad_entry
    ));
}
