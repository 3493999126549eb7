mod common;

use chrono::NaiveDate;
use common::{assert_ledger_consistent, TestApp};
use proptest::prelude::*;
use std::collections::HashMap;
use video_store_api::{
    errors::ServiceError,
    services::{CustomerInput, VideoInput},
};

const CUSTOMERS: usize = 3;
const VIDEOS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    CheckOut(usize, usize),
    CheckIn(usize, usize),
    DeleteCustomer(usize),
    DeleteVideo(usize),
    Restock(usize, i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..CUSTOMERS, 0..VIDEOS).prop_map(|(c, v)| Op::CheckOut(c, v)),
        3 => (0..CUSTOMERS, 0..VIDEOS).prop_map(|(c, v)| Op::CheckIn(c, v)),
        1 => (0..CUSTOMERS).prop_map(Op::DeleteCustomer),
        1 => (0..VIDEOS).prop_map(Op::DeleteVideo),
        1 => (0..VIDEOS, 0..4i32).prop_map(|(v, total)| Op::Restock(v, total)),
    ]
}

/// Expected state, tracked independently of the database.
#[derive(Default)]
struct Model {
    customers: Vec<Option<i32>>,
    videos: Vec<Option<(i32, i32)>>,
    held: HashMap<(usize, usize), i32>,
}

impl Model {
    fn outstanding_for_video(&self, v: usize) -> i32 {
        self.held
            .iter()
            .filter(|((_, video), _)| *video == v)
            .map(|(_, n)| *n)
            .sum()
    }
}

async fn run_sequence(totals: Vec<i32>, ops: Vec<Op>) {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let mut model = Model::default();

    for i in 0..CUSTOMERS {
        let created = services
            .customers
            .create_customer(CustomerInput {
                name: format!("customer-{i}"),
                postal_code: "00000".into(),
                phone: "555".into(),
            })
            .await
            .unwrap();
        model.customers.push(Some(created.id));
    }
    for (i, total) in totals.iter().enumerate() {
        let created = services
            .videos
            .create_video(VideoInput {
                title: format!("video-{i}"),
                release_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
                total_inventory: *total,
            })
            .await
            .unwrap();
        model.videos.push(Some((created.id, *total)));
    }

    for op in ops {
        match op {
            Op::CheckOut(c, v) => {
                let (Some(cid), Some((vid, total))) = (model.customers[c], model.videos[v]) else {
                    continue;
                };
                let result = services.rentals.check_out(cid, vid).await;
                if model.outstanding_for_video(v) < total {
                    result.unwrap();
                    *model.held.entry((c, v)).or_default() += 1;
                } else {
                    assert!(matches!(result, Err(ServiceError::InventoryExhausted { .. })));
                }
            }
            Op::CheckIn(c, v) => {
                let (Some(cid), Some((vid, _))) = (model.customers[c], model.videos[v]) else {
                    continue;
                };
                let result = services.rentals.check_in(cid, vid).await;
                match model.held.get_mut(&(c, v)) {
                    Some(n) if *n > 0 => {
                        result.unwrap();
                        *n -= 1;
                    }
                    _ => assert!(matches!(
                        result,
                        Err(ServiceError::NoOutstandingRental { .. })
                    )),
                }
            }
            Op::DeleteCustomer(c) => {
                let Some(cid) = model.customers[c].take() else {
                    continue;
                };
                services.customers.delete_customer(cid).await.unwrap();
                model.held.retain(|(customer, _), _| *customer != c);
            }
            Op::DeleteVideo(v) => {
                let Some((vid, _)) = model.videos[v].take() else {
                    continue;
                };
                services.videos.delete_video(vid).await.unwrap();
                model.held.retain(|(_, video), _| *video != v);
            }
            Op::Restock(v, total) => {
                let Some((vid, _)) = model.videos[v] else {
                    continue;
                };
                let result = services
                    .videos
                    .update_video(
                        vid,
                        VideoInput {
                            title: format!("video-{v}"),
                            release_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
                            total_inventory: total,
                        },
                    )
                    .await;
                if total >= model.outstanding_for_video(v) {
                    result.unwrap();
                    model.videos[v] = Some((vid, total));
                } else {
                    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
                }
            }
        }

        assert_ledger_consistent(app.db()).await;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn counters_always_match_rental_rows(
        totals in prop::collection::vec(0..4i32, VIDEOS),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_sequence(totals, ops));
    }
}
