//! End-to-end checkout scenarios against recording doubles.

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use spruce_core::{CustomerId, Email};
use spruce_storefront::auth::Identity;
use spruce_storefront::checkout::{CheckoutError, CheckoutForm, CheckoutWorkflow, Route};
use spruce_storefront::documents::Collection;
use spruce_storefront::payments::{CardHandle, GatewayError};

use common::{GatewayScript, Scenario, cart_item, events};

fn identity() -> Identity {
    Identity {
        uid: CustomerId::new("u1"),
        display_name: Some("A B".to_string()),
        email: Email::parse("a@b.com").ok(),
    }
}

fn form(shipping: bool) -> CheckoutForm {
    let billing = spruce_core::AddressDraft {
        first_name: "Jo".into(),
        last_name: "Doe".into(),
        email: "jo@example.com".into(),
        phone: "123".into(),
        city: "Zagreb".into(),
        zip: "10000".into(),
        country: "HR".into(),
        line1: "Ilica 1".into(),
        line2: String::new(),
    };
    CheckoutForm {
        shipping: shipping.then(|| billing.clone()),
        billing,
        save_info: false,
        terms_accepted: true,
    }
}

async fn enter(scenario: &Scenario) -> CheckoutWorkflow {
    CheckoutWorkflow::enter(
        scenario.deps(),
        vec![cart_item("p1", 2)],
        CardHandle::new("pm_1"),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_successful_checkout_persists_one_order_after_confirm() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_1".to_string(),
    });
    scenario.identity.send_replace(Some(identity()));
    scenario.total.send_replace(Decimal::new(1999, 2));

    let workflow = enter(&scenario).await;
    workflow.submit(form(false).validate().unwrap()).await.unwrap();

    let orders = scenario.store.documents_in(&Collection::Orders);
    assert_eq!(orders.len(), 1);
    let order = &orders[0];

    assert_eq!(order["paymentIntentId"], "pi_1");
    assert_eq!(order["status"], "Ordered");
    assert_eq!(order["price"]["total"], 1999);
    assert_eq!(order["price"]["subTotal"], 1999);
    assert_eq!(order["customerId"], "u1");
    assert_eq!(order["customerName"], "A B");
    assert_eq!(order["email"], "a@b.com");
    assert_eq!(order["orderItems"][0]["id"], "p1");
    assert_eq!(order["orderItems"][0]["quantity"], 2);
    assert!(order.get("shipping").is_none());

    // Confirmation strictly precedes the order write.
    let log = events(&scenario.events);
    let confirm = log.iter().position(|e| e.starts_with("confirm:")).unwrap();
    let write = log.iter().position(|e| e.starts_with("set:orders/")).unwrap();
    assert!(confirm < write);

    assert_eq!(scenario.navigator.routes(), vec![Route::CheckoutSuccess]);
}

#[tokio::test]
async fn test_decline_persists_nothing_and_routes_to_error() {
    let scenario = Scenario::new(GatewayScript::Decline {
        message: "card_declined".to_string(),
    });
    scenario.total.send_replace(Decimal::new(1999, 2));

    let workflow = enter(&scenario).await;
    let err = workflow
        .submit(form(false).validate().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Gateway(GatewayError::Declined { message }) if message == "card_declined"
    ));
    assert!(scenario.store.documents_in(&Collection::Orders).is_empty());
    assert_eq!(scenario.navigator.routes(), vec![Route::CheckoutError]);
}

#[tokio::test]
async fn test_shipping_field_present_only_when_differs() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_1".to_string(),
    });
    scenario.total.send_replace(Decimal::ONE);

    let workflow = enter(&scenario).await;
    workflow.submit(form(true).validate().unwrap()).await.unwrap();

    let orders = scenario.store.documents_in(&Collection::Orders);
    assert_eq!(orders[0]["shipping"]["city"], "Zagreb");
}

#[tokio::test]
async fn test_guest_order_omits_customer_fields() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_9".to_string(),
    });
    scenario.total.send_replace(Decimal::ONE);

    let workflow = enter(&scenario).await;
    workflow.submit(form(false).validate().unwrap()).await.unwrap();

    let orders = scenario.store.documents_in(&Collection::Orders);
    let order = &orders[0];
    assert!(order.get("customerId").is_none());
    assert!(order.get("customerName").is_none());
    assert!(order.get("email").is_none());
    assert_eq!(order["billing"]["email"], "jo@example.com");
}

#[tokio::test]
async fn test_second_submit_is_rejected() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_1".to_string(),
    });
    scenario.total.send_replace(Decimal::ONE);

    let workflow = enter(&scenario).await;
    workflow.submit(form(false).validate().unwrap()).await.unwrap();
    let err = workflow
        .submit(form(false).validate().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::AlreadySubmitted));
    let log = events(&scenario.events);
    assert_eq!(log.iter().filter(|e| e.starts_with("confirm:")).count(), 1);
    assert_eq!(scenario.store.documents_in(&Collection::Orders).len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_carries_intent_id() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_7".to_string(),
    });
    scenario.total.send_replace(Decimal::ONE);
    scenario.store.fail_writes_to(&Collection::Orders);

    let workflow = enter(&scenario).await;
    let err = workflow
        .submit(form(false).validate().unwrap())
        .await
        .unwrap_err();

    match err {
        CheckoutError::Persistence {
            payment_intent_id, ..
        } => assert_eq!(payment_intent_id, "pi_7"),
        other => panic!("expected persistence error, got {other:?}"),
    }
    assert!(scenario.store.documents_in(&Collection::Orders).is_empty());
    assert_eq!(scenario.navigator.routes(), vec![Route::CheckoutError]);
}

#[tokio::test]
async fn test_save_info_merges_profile_defaults() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_1".to_string(),
    });
    scenario.identity.send_replace(Some(identity()));
    scenario.total.send_replace(Decimal::ONE);

    let workflow = enter(&scenario).await;
    let mut submitted = form(true);
    submitted.save_info = true;
    workflow.submit(submitted.validate().unwrap()).await.unwrap();

    // The upsert is fire-and-forget; let the spawned task run.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let log = events(&scenario.events);
    assert!(log.iter().any(|e| e == "update:customers/u1"));
    let profiles = scenario.store.documents_in(&Collection::Customers);
    assert_eq!(profiles[0]["shippingDiffers"], true);
    assert_eq!(profiles[0]["billing"]["city"], "Zagreb");
}

#[tokio::test]
async fn test_destroy_mid_flight_suppresses_navigation_and_loading() {
    let scenario = Scenario::new(GatewayScript::Hang);
    scenario.total.send_replace(Decimal::ONE);

    let workflow = enter(&scenario).await;
    let workflow = Arc::new(workflow);
    let loading: watch::Receiver<bool> = workflow.loading();

    let in_flight = {
        let workflow = Arc::clone(&workflow);
        tokio::spawn(async move { workflow.submit(form(false).validate().unwrap()).await })
    };

    // Wait until the submission is visibly in flight.
    let mut loading_rx = loading.clone();
    tokio::time::timeout(std::time::Duration::from_secs(1), async {
        while !*loading_rx.borrow_and_update() {
            loading_rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    workflow.destroy();
    let result = in_flight.await.unwrap();

    assert!(matches!(result, Err(CheckoutError::Destroyed)));
    assert!(scenario.navigator.routes().is_empty());
    // No late flip back to false either.
    assert!(*loading.borrow());
    assert!(scenario.store.documents_in(&Collection::Orders).is_empty());
}

#[tokio::test]
async fn test_entry_fetches_fresh_secret_for_snapshot() {
    let scenario = Scenario::new(GatewayScript::Succeed {
        payment_intent_id: "pi_1".to_string(),
    });
    scenario.total.send_replace(Decimal::ONE);

    let _workflow = enter(&scenario).await;
    let log = events(&scenario.events);
    assert_eq!(log, vec!["intent:1".to_string()]);
}
