//! Random operation sequences against one employee.

mod common;

use common::{TODAY, date, world};
use futures::executor::block_on;
use leave_tracker::leave::{ApprovalScope, SubmitLeave};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Submit { offset: u64, extra_days: u64 },
    Approve(usize),
    Reject(usize),
    Cancel(usize),
    SetBalance(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u64..40, 1u64..6).prop_map(|(offset, extra_days)| Op::Submit { offset, extra_days }),
        3 => (0usize..8).prop_map(Op::Approve),
        1 => (0usize..8).prop_map(Op::Reject),
        2 => (0usize..8).prop_map(Op::Cancel),
        1 => (0u32..15).prop_map(Op::SetBalance),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balance_tracks_approvals_and_never_underflows(
        initial in 0u32..15,
        ops in prop::collection::vec(op(), 1..30),
    ) {
        let w = block_on(world(initial, ApprovalScope::Managed));
        let mut expected = i64::from(initial);
        let mut ids: Vec<u64> = Vec::new();

        for op in ops {
            match op {
                Op::Submit { offset, extra_days } => {
                    let start = date(TODAY) + chrono::Days::new(offset);
                    let end = start + chrono::Days::new(extra_days);
                    let submitted = block_on(w.service.submit(
                        w.employee,
                        SubmitLeave { start_date: start, end_date: end, leave_type: None },
                    ));
                    if let Ok(request) = submitted {
                        prop_assert!(i64::from(request.days()) <= expected);
                        ids.push(request.id);
                    }
                }
                Op::Approve(i) if !ids.is_empty() => {
                    let id = ids[i % ids.len()];
                    if let Ok(outcome) = block_on(w.service.approve(w.manager, id)) {
                        expected -= i64::from(outcome.days_approved);
                        prop_assert_eq!(i64::from(outcome.new_balance), expected);
                    }
                }
                Op::Reject(i) if !ids.is_empty() => {
                    let id = ids[i % ids.len()];
                    let _ = block_on(w.service.reject(w.manager, id, None));
                }
                Op::Cancel(i) if !ids.is_empty() => {
                    let id = ids[i % ids.len()];
                    if let Ok(outcome) = block_on(w.service.cancel(w.employee, id)) {
                        expected += i64::from(outcome.restored_days);
                        prop_assert_eq!(i64::from(outcome.balance), expected);
                    }
                }
                Op::SetBalance(balance) => {
                    block_on(w.service.set_balance(w.admin, w.employee.employee_id, balance)).unwrap();
                    expected = i64::from(balance);
                }
                _ => {}
            }

            prop_assert!(expected >= 0);
            let actual = block_on(w.balance(w.employee));
            prop_assert_eq!(i64::from(actual), expected);
        }

        // requests still holding dates never overlap
        let requests = block_on(w.service.my_requests(w.employee)).unwrap();
        let holding: Vec<_> = requests.iter().filter(|r| r.status.blocks_dates()).collect();
        for (i, a) in holding.iter().enumerate() {
            for b in &holding[i + 1..] {
                prop_assert!(a.end_date < b.start_date || b.end_date < a.start_date);
            }
        }
        prop_assert!(requests.iter().all(|r| r.end_date > r.start_date));
    }
}
