use proptest::prelude::*;

/// Order totals in cents, as a client would send them
pub fn order_total_strategy() -> impl Strategy<Value = f64> {
    (0u64..10_000_000).prop_map(|cents| cents as f64 / 100.0)
}

pub fn order_id_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{0,11}"
}

pub fn items_num_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000
}
