mod common;

use common::strategies::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use order_pipeline::models::{calculate_shipping_cost, Order};
use order_pipeline::state_machine::{OrderEvent, OrderStatus};
use order_pipeline::validation::CreateOrderRequest;

proptest! {
    /// Property: shipping cost is the cent nearest to the exact value of
    /// `total * 0.02`, with exact midpoints on the even cent
    #[test]
    fn shipping_cost_is_nearest_cent_of_exact_product(total in order_total_strategy()) {
        let cost = calculate_shipping_cost(total);
        prop_assert!(cost >= 0.0);

        let cents = cost * 100.0;
        prop_assert!((cents - cents.round()).abs() < 1e-6, "{} is not whole cents", cost);
        let cents = cents.round() as i64;

        let exact = Decimal::from_f64_retain(total * 0.02).unwrap();
        let distance = (exact - Decimal::new(cents, 2)).abs();
        let half_cent = Decimal::new(5, 3);
        prop_assert!(
            distance < half_cent || (distance == half_cent && cents % 2 == 0),
            "total={} exact={} cost={}", total, exact, cost
        );
    }

    /// Property: valid create requests decode into the create event they describe
    #[test]
    fn valid_create_requests_decode_as_creates(
        order_id in order_id_strategy(),
        items_num in items_num_strategy(),
        total in order_total_strategy(),
    ) {
        let message = CreateOrderRequest {
            order_id: order_id.clone(),
            items_num,
            total_amount: total,
        }
        .into_message()
        .unwrap();
        let payload = message.to_json().unwrap();

        match OrderEvent::decode(payload.as_bytes()).unwrap() {
            OrderEvent::Create(new_order) => {
                prop_assert_eq!(&new_order.order_id, &order_id);
                prop_assert_eq!(new_order.items_num, items_num);
                let order = Order::create(new_order, "orders");
                prop_assert_eq!(order.status, OrderStatus::New);
                prop_assert_eq!(order.shipping_cost, calculate_shipping_cost(total));
            }
            other => prop_assert!(false, "expected a create event, got {:?}", other),
        }
    }

    /// Property: any status outside the known set is rejected at decode time
    #[test]
    fn unknown_statuses_are_rejected(status in "[a-z]{1,12}") {
        prop_assume!(!matches!(status.as_str(), "new" | "pending" | "confirmed"));

        let payload = json!({"orderId": "A1", "status": status}).to_string();
        let err = OrderEvent::decode(payload.as_bytes()).unwrap_err();
        prop_assert_eq!(err.kind(), "unexpected_status");
    }
}

#[test]
fn test_documented_shipping_examples() {
    assert_eq!(calculate_shipping_cost(150.0), 3.0);
    assert_eq!(calculate_shipping_cost(100.0), 2.0);
    assert_eq!(calculate_shipping_cost(99.995), 2.0);
    assert_eq!(calculate_shipping_cost(0.75), 0.01);
    assert_eq!(calculate_shipping_cost(6.25), 0.12);
}
