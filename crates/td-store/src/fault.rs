//! Fault-injecting record store wrapper
//!
//! Wraps any [`RecordStore`] and fails selected calls, either
//! deterministically (`fail(op, table)`) or probabilistically with a
//! seeded RNG (`chaos(seed, rate)`). Failure-path and invariant tests are
//! built on this.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use td_core::RecordId;

use crate::store::{Filter, RecordStore, StoreError, StoreOp, StoreResult, Table};

struct Chaos {
    rng: StdRng,
    rate: f64,
}

pub struct FlakyRecordStore {
    inner: Arc<dyn RecordStore>,
    failures: Mutex<HashSet<(StoreOp, Table)>>,
    chaos: Mutex<Option<Chaos>>,
}

impl FlakyRecordStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashSet::new()),
            chaos: Mutex::new(None),
        }
    }

    /// Fail every `op` call against `table` until healed.
    pub fn fail(&self, op: StoreOp, table: Table) {
        self.failures
            .lock()
            .expect("failure set poisoned")
            .insert((op, table));
    }

    /// Stop failing `op` calls against `table`.
    pub fn heal(&self, op: StoreOp, table: Table) {
        self.failures
            .lock()
            .expect("failure set poisoned")
            .remove(&(op, table));
    }

    pub fn heal_all(&self) {
        self.failures.lock().expect("failure set poisoned").clear();
    }

    /// Fail roughly `rate` of all calls, reproducibly from `seed`.
    pub fn chaos(&self, seed: u64, rate: f64) {
        *self.chaos.lock().expect("chaos state poisoned") = Some(Chaos {
            rng: StdRng::seed_from_u64(seed),
            rate,
        });
    }

    fn trip(&self, op: StoreOp, table: Table) -> StoreResult<()> {
        if self
            .failures
            .lock()
            .expect("failure set poisoned")
            .contains(&(op, table))
        {
            return Err(Self::injected(op, table));
        }

        let mut chaos = self.chaos.lock().expect("chaos state poisoned");
        if let Some(chaos) = chaos.as_mut() {
            if chaos.rng.gen_bool(chaos.rate) {
                return Err(Self::injected(op, table));
            }
        }

        Ok(())
    }

    fn injected(op: StoreOp, table: Table) -> StoreError {
        match op {
            StoreOp::Select => StoreError::Backend(format!("injected fault: select on {table}")),
            _ => StoreError::Write {
                table,
                op,
                message: "injected fault".into(),
            },
        }
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        self.trip(StoreOp::Insert, table)?;
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: Table, id: RecordId, patch: Value) -> StoreResult<Value> {
        self.trip(StoreOp::Update, table)?;
        self.inner.update(table, id, patch).await
    }

    async fn select(&self, table: Table, filter: Filter) -> StoreResult<Vec<Value>> {
        self.trip(StoreOp::Select, table)?;
        self.inner.select(table, filter).await
    }

    async fn delete(&self, table: Table, id: RecordId) -> StoreResult<()> {
        self.trip(StoreOp::Delete, table)?;
        self.inner.delete(table, id).await
    }
}
