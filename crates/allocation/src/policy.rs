//! Allocation transition policy: pure decision logic, no I/O.
//!
//! Given the current allocation (or its absence) and an incoming event, decide
//! what to write, what guard to write it under, and what derived event to
//! emit. The store layer reports guard/capacity rejections as explicit
//! outcomes; the worker routes those back through the depletion branch here.

use chrono::{DateTime, Utc};

use stockflow_events::{
    OrderCreated, OutgoingEvent, PaymentAccepted, PaymentRejected, StockAllocated, StockDepleted,
};

use crate::allocation::{AllocationStatus, OrderAllocation};
use crate::command::AllocationTransition;

/// Decision for an incoming order-created event.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateDecision {
    /// No allocation exists yet: create it and emit the derived event.
    Create {
        allocation: OrderAllocation,
        emit: OutgoingEvent,
    },
    /// Idempotent replay: the allocation already exists. The derived event is
    /// still re-emitted; the event log's uniqueness guard absorbs duplicates.
    SkipCreate { emit: OutgoingEvent },
}

/// Decision for an incoming payment event.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionDecision {
    /// Nothing to do: the allocation is absent (event arrived before or
    /// without its allocation) or already in a terminal state.
    Skip,
    /// Issue the guarded status transition.
    Transition(AllocationTransition),
}

pub fn decide_on_order_created(
    existing: Option<&OrderAllocation>,
    event: &OrderCreated,
    now: DateTime<Utc>,
) -> CreateDecision {
    let emit = OutgoingEvent::StockAllocated(StockAllocated::from_order(event, now));
    match existing {
        None => CreateDecision::Create {
            allocation: OrderAllocation::from_order_created(event, now),
            emit,
        },
        Some(_) => CreateDecision::SkipCreate { emit },
    }
}

/// The capacity guard rejected the create: this order's stock ran out.
/// A business outcome, not a fault.
pub fn decide_on_insufficient_stock(event: &OrderCreated, now: DateTime<Utc>) -> OutgoingEvent {
    OutgoingEvent::StockDepleted(StockDepleted::from_order(event, now))
}

pub fn decide_on_payment_accepted(
    existing: Option<&OrderAllocation>,
    event: &PaymentAccepted,
    now: DateTime<Utc>,
) -> TransitionDecision {
    match existing {
        Some(allocation) if allocation.allocation_status == AllocationStatus::Allocated => {
            TransitionDecision::Transition(AllocationTransition {
                sku: event.sku.clone(),
                order_id: event.order_id.clone(),
                new_status: AllocationStatus::CompletedPaymentAccepted,
                expected_status: AllocationStatus::Allocated,
                updated_at: monotonic(now, allocation.updated_at),
                restore_units: None,
            })
        }
        // Absent, or already in a terminal state: treat as already handled.
        _ => TransitionDecision::Skip,
    }
}

pub fn decide_on_payment_rejected(
    existing: Option<&OrderAllocation>,
    event: &PaymentRejected,
    now: DateTime<Utc>,
) -> TransitionDecision {
    match existing {
        Some(allocation) if allocation.allocation_status == AllocationStatus::Allocated => {
            TransitionDecision::Transition(AllocationTransition {
                sku: event.sku.clone(),
                order_id: event.order_id.clone(),
                new_status: AllocationStatus::PaymentRejected,
                expected_status: AllocationStatus::Allocated,
                updated_at: monotonic(now, allocation.updated_at),
                // Compensating transaction: the reserved units go back to the
                // SKU's stock level, atomically with the status flip.
                restore_units: Some(allocation.units),
            })
        }
        _ => TransitionDecision::Skip,
    }
}

/// `updated_at` never regresses, even under clock skew.
fn monotonic(now: DateTime<Utc>, previous: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use stockflow_core::{OrderId, Price, Sku, Units, UserId};
    use stockflow_events::Event;

    fn order_created() -> OrderCreated {
        OrderCreated {
            order_id: OrderId::parse("ord-1").unwrap(),
            sku: Sku::parse("SKU-100").unwrap(),
            units: Units::parse(2).unwrap(),
            price: Price::parse(Decimal::new(1999, 2)).unwrap(),
            user_id: UserId::parse("user-1").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment_accepted() -> PaymentAccepted {
        let o = order_created();
        PaymentAccepted {
            order_id: o.order_id,
            sku: o.sku,
            units: o.units,
            price: o.price,
            user_id: o.user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment_rejected() -> PaymentRejected {
        let o = order_created();
        PaymentRejected {
            order_id: o.order_id,
            sku: o.sku,
            units: o.units,
            price: o.price,
            user_id: o.user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn allocation(status: AllocationStatus) -> OrderAllocation {
        let mut a = OrderAllocation::from_order_created(&order_created(), Utc::now());
        a.allocation_status = status;
        a
    }

    #[test]
    fn first_sight_of_an_order_creates_an_allocated_record() {
        let event = order_created();
        match decide_on_order_created(None, &event, Utc::now()) {
            CreateDecision::Create { allocation, emit } => {
                assert_eq!(allocation.allocation_status, AllocationStatus::Allocated);
                assert_eq!(allocation.order_id, event.order_id);
                assert_eq!(emit.event_name(), "STOCK_ALLOCATED");
            }
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn replayed_order_skips_the_create_but_still_emits() {
        let event = order_created();
        let existing = allocation(AllocationStatus::Allocated);
        match decide_on_order_created(Some(&existing), &event, Utc::now()) {
            CreateDecision::SkipCreate { emit } => {
                assert_eq!(emit.event_name(), "STOCK_ALLOCATED");
            }
            other => panic!("expected SkipCreate, got {other:?}"),
        }
    }

    #[test]
    fn insufficient_stock_maps_to_a_depleted_event() {
        let event = order_created();
        let emit = decide_on_insufficient_stock(&event, Utc::now());
        assert_eq!(emit.event_name(), "STOCK_DEPLETED");
    }

    #[test]
    fn payment_accepted_transitions_an_allocated_record() {
        let existing = allocation(AllocationStatus::Allocated);
        match decide_on_payment_accepted(Some(&existing), &payment_accepted(), Utc::now()) {
            TransitionDecision::Transition(cmd) => {
                assert_eq!(cmd.new_status, AllocationStatus::CompletedPaymentAccepted);
                assert_eq!(cmd.expected_status, AllocationStatus::Allocated);
                assert!(cmd.restore_units.is_none());
            }
            TransitionDecision::Skip => panic!("expected a transition"),
        }
    }

    #[test]
    fn payment_accepted_without_an_allocation_is_a_no_op() {
        assert_eq!(
            decide_on_payment_accepted(None, &payment_accepted(), Utc::now()),
            TransitionDecision::Skip
        );
    }

    #[test]
    fn payment_accepted_on_a_terminal_record_is_a_no_op() {
        for status in [
            AllocationStatus::CompletedPaymentAccepted,
            AllocationStatus::PaymentRejected,
            AllocationStatus::DeallocatedOrderCanceled,
        ] {
            let existing = allocation(status);
            assert_eq!(
                decide_on_payment_accepted(Some(&existing), &payment_accepted(), Utc::now()),
                TransitionDecision::Skip
            );
        }
    }

    #[test]
    fn payment_rejected_restores_the_allocated_units() {
        let existing = allocation(AllocationStatus::Allocated);
        match decide_on_payment_rejected(Some(&existing), &payment_rejected(), Utc::now()) {
            TransitionDecision::Transition(cmd) => {
                assert_eq!(cmd.new_status, AllocationStatus::PaymentRejected);
                assert_eq!(cmd.expected_status, AllocationStatus::Allocated);
                assert_eq!(cmd.restore_units, Some(existing.units));
            }
            TransitionDecision::Skip => panic!("expected a transition"),
        }
    }

    #[test]
    fn transition_timestamp_never_regresses() {
        let mut existing = allocation(AllocationStatus::Allocated);
        let future = Utc::now() + Duration::hours(1);
        existing.updated_at = future;

        match decide_on_payment_accepted(Some(&existing), &payment_accepted(), Utc::now()) {
            TransitionDecision::Transition(cmd) => assert_eq!(cmd.updated_at, future),
            TransitionDecision::Skip => panic!("expected a transition"),
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = AllocationStatus> {
            prop_oneof![
                Just(AllocationStatus::Allocated),
                Just(AllocationStatus::CompletedPaymentAccepted),
                Just(AllocationStatus::PaymentRejected),
                Just(AllocationStatus::DeallocatedOrderCanceled),
            ]
        }

        proptest! {
            #[test]
            fn payment_transitions_only_fire_from_allocated(status in any_status()) {
                let existing = allocation(status);
                let accepted = decide_on_payment_accepted(Some(&existing), &payment_accepted(), Utc::now());
                let rejected = decide_on_payment_rejected(Some(&existing), &payment_rejected(), Utc::now());

                if status == AllocationStatus::Allocated {
                    prop_assert!(matches!(accepted, TransitionDecision::Transition(_)));
                    prop_assert!(matches!(rejected, TransitionDecision::Transition(_)));
                } else {
                    prop_assert_eq!(accepted, TransitionDecision::Skip);
                    prop_assert_eq!(rejected, TransitionDecision::Skip);
                }
            }

            #[test]
            fn guards_always_expect_the_observed_status(status in any_status()) {
                let existing = allocation(status);
                if let TransitionDecision::Transition(cmd) =
                    decide_on_payment_accepted(Some(&existing), &payment_accepted(), Utc::now())
                {
                    prop_assert_eq!(cmd.expected_status, existing.allocation_status);
                }
            }
        }
    }
}
