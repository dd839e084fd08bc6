//! Public counter reconciliation
//!
//! Counter adjustments after a ledger commit are best-effort, so the
//! `reserved` columns of the public schedule can drift. Reconciliation
//! recounts seat-holding registrations and overwrites the slot and date
//! counters with the recounted values.
//!
//! Each date is recounted while holding the scope locks of the date and of
//! every slot under it, so a registration served by this process cannot
//! land between the recount and the overwrite.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};
use crate::database::traits::{RegistrationLedger, ScheduleCounterStore};
use crate::models::{CapacityScope, ReconcileReport};
use crate::services::scope_lock::ScopeLocks;
use crate::utils::errors::{PantryError, Result};
use crate::utils::logging::log_counter_reset;

#[derive(Clone)]
pub struct CounterReconciler {
    ledger: Arc<dyn RegistrationLedger>,
    counters: Arc<dyn ScheduleCounterStore>,
    locks: ScopeLocks,
}

impl CounterReconciler {
    pub fn new(
        ledger: Arc<dyn RegistrationLedger>,
        counters: Arc<dyn ScheduleCounterStore>,
        locks: ScopeLocks,
    ) -> Self {
        Self { ledger, counters, locks }
    }

    /// Recount every slot and date referenced by the ledger
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        // Group slots by owning date; slots without one are recounted alone
        let mut dates: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        let mut loose_slots = Vec::new();
        for (slot_id, _) in self.ledger.public_slot_seat_counts().await? {
            match self.counters.date_for_slot(slot_id).await? {
                Some(date_id) => dates.entry(date_id).or_default().push(slot_id),
                None => loose_slots.push(slot_id),
            }
        }
        let direct_dates: BTreeSet<i64> = self
            .ledger
            .public_date_seat_counts()
            .await?
            .into_iter()
            .map(|(date_id, _)| date_id)
            .collect();
        for date_id in direct_dates {
            dates.entry(date_id).or_default();
        }

        for (date_id, slot_ids) in dates {
            let mut scopes: Vec<CapacityScope> = slot_ids.iter().map(|id| CapacityScope::PublicSlot(*id)).collect();
            scopes.push(CapacityScope::PublicDate(date_id));
            let _guards = self.locks.acquire_all(scopes).await;

            let mut total = self.ledger.count_confirmed(&CapacityScope::PublicDate(date_id)).await?;
            for slot_id in slot_ids {
                if let Some(seats) = self.reset_slot(slot_id, &mut report).await? {
                    total += seats;
                }
            }

            let reserved = to_counter(total)?;
            let applied = self.counters.set_date_reserved(date_id, reserved).await?;
            log_counter_reset("date", date_id, reserved, applied);
            if applied {
                report.dates_updated += 1;
            }
        }

        for slot_id in loose_slots {
            let _guard = self.locks.acquire(CapacityScope::PublicSlot(slot_id)).await;
            self.reset_slot(slot_id, &mut report).await?;
        }

        info!(
            slots_updated = report.slots_updated,
            dates_updated = report.dates_updated,
            slots_missing = report.slots_missing,
            "Public schedule counters reconciled"
        );
        Ok(report)
    }

    /// Overwrite one slot with its recount. Caller holds the slot's lock.
    async fn reset_slot(&self, slot_id: i64, report: &mut ReconcileReport) -> Result<Option<i64>> {
        let seats = self.ledger.count_confirmed(&CapacityScope::PublicSlot(slot_id)).await?;
        let reserved = to_counter(seats)?;

        let applied = self.counters.set_slot_reserved(slot_id, reserved).await?;
        log_counter_reset("slot", slot_id, reserved, applied);
        if !applied {
            warn!(slot_id = slot_id, "Ledger references a missing public slot");
            report.slots_missing += 1;
            return Ok(None);
        }

        report.slots_updated += 1;
        Ok(Some(seats))
    }
}

fn to_counter(seats: i64) -> Result<i32> {
    i32::try_from(seats).map_err(|_| PantryError::bad_request(format!("Seat count {} out of range", seats)))
}
