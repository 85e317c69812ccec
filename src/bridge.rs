//! Shot-to-transaction side channel
//!
//! A fire action becomes exactly one outbound submission. The bridge never
//! waits on it: the signer gets a `SettlementReporter` and reports back
//! through a channel whenever the network gets around to it. The session
//! drains that channel once per frame and merges results by shot id, so
//! confirmations may arrive in any order, after their record was trimmed
//! from the history, or after the session was reset.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::SubmitError;

/// Globally unique, monotonically increasing shot sequence id
pub type ShotId = u64;

/// Block explorer page for a transaction, `{}` replaced by the hash
pub const EXPLORER_TX_URL: &str = "https://sepolia.tea.xyz/tx/{}";

/// Transaction identifier returned by the signer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxHandle(pub String);

impl TxHandle {
    pub fn explorer_url(&self) -> String {
        EXPLORER_TX_URL.replace("{}", &self.0)
    }

    /// `0x1234...cdef` form for compact lists
    pub fn short(&self) -> String {
        let h = &self.0;
        if h.len() <= 14 || !h.is_ascii() {
            return h.clone();
        }
        format!("{}...{}", &h[..6], &h[h.len() - 4..])
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the signer is asked to submit
#[derive(Debug, Clone, PartialEq)]
pub struct ShotRequest {
    pub id: ShotId,
    /// Simulation clock time of the fire action
    pub fired_at_ms: f64,
}

impl ShotRequest {
    /// Transaction data attached to the submission
    pub fn payload(&self) -> String {
        serde_json::json!({
            "action": "shot",
            "timestamp": self.fired_at_ms,
        })
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotStatus {
    /// Fired, signer has not handed back a transaction yet
    Submitting,
    /// Transaction broadcast, waiting for confirmation
    Sent,
    Confirmed,
    /// Dropped: never retried, never confirmed
    Failed,
}

/// One entry in the recent-shots history
#[derive(Debug, Clone, PartialEq)]
pub struct ShotRecord {
    pub id: ShotId,
    pub handle: Option<TxHandle>,
    pub status: ShotStatus,
    pub fired_at_ms: f64,
}

impl ShotRecord {
    pub fn is_confirmed(&self) -> bool {
        self.status == ShotStatus::Confirmed
    }
}

/// Messages flowing from in-flight submissions back to the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Sent { id: ShotId, handle: TxHandle },
    Confirmed { id: ShotId },
    Failed { id: ShotId, error: SubmitError },
}

/// Continuation handed to the signer for one shot
///
/// Reports are fire-and-forget: if the bridge is gone they are dropped.
#[derive(Debug, Clone)]
pub struct SettlementReporter {
    id: ShotId,
    tx: Sender<Settlement>,
}

impl SettlementReporter {
    pub fn id(&self) -> ShotId {
        self.id
    }

    /// The transaction was broadcast and has a handle
    pub fn sent(&self, handle: TxHandle) {
        self.report(Settlement::Sent {
            id: self.id,
            handle,
        });
    }

    pub fn confirmed(self) {
        self.report(Settlement::Confirmed { id: self.id });
    }

    pub fn failed(self, error: SubmitError) {
        self.report(Settlement::Failed { id: self.id, error });
    }

    fn report(&self, settlement: Settlement) {
        if self.tx.send(settlement).is_err() {
            log::debug!("shot {} settled after teardown, ignored", self.id);
        }
    }
}

/// The external funded-signer capability
///
/// `submit` must return promptly; the outcome arrives later through the
/// reporter (possibly from another thread).
pub trait ShotSigner {
    fn submit(
        &mut self,
        request: ShotRequest,
        reporter: SettlementReporter,
    ) -> Result<(), SubmitError>;
}

/// Bounded, fire-ordered history of shot records
#[derive(Debug, Clone)]
pub struct ShotLedger {
    records: VecDeque<ShotRecord>,
    capacity: usize,
}

impl ShotLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append in fire order, trimming the oldest beyond capacity
    pub fn push(&mut self, record: ShotRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Update a record by id. Returns false if it was already trimmed.
    pub fn update(&mut self, id: ShotId, f: impl FnOnce(&mut ShotRecord)) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ShotId) -> Option<&ShotRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Up to `n` records, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ShotRecord> {
        self.records.iter().rev().take(n)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Per-session shot telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotStats {
    pub fired: u64,
    pub confirmed: u64,
    pub failed: u64,
}

pub struct ShotBridge {
    signer: Option<Box<dyn ShotSigner>>,
    next_id: ShotId,
    in_flight: HashSet<ShotId>,
    ledger: ShotLedger,
    stats: ShotStats,
    tx: Sender<Settlement>,
    rx: Receiver<Settlement>,
}

impl ShotBridge {
    pub fn new(history: usize) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            signer: None,
            next_id: 1,
            in_flight: HashSet::new(),
            ledger: ShotLedger::new(history),
            stats: ShotStats::default(),
            tx,
            rx,
        }
    }

    pub fn attach_signer(&mut self, signer: Box<dyn ShotSigner>) {
        self.signer = Some(signer);
    }

    pub fn detach_signer(&mut self) -> Option<Box<dyn ShotSigner>> {
        self.signer.take()
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Record a fire action and start its submission without waiting.
    ///
    /// A submission that fails right away is counted and dropped here; it
    /// never reaches the caller.
    pub fn submit_shot(&mut self, fired_at_ms: f64) -> ShotId {
        let id = self.next_id;
        self.next_id += 1;
        self.stats.fired += 1;
        self.in_flight.insert(id);
        self.ledger.push(ShotRecord {
            id,
            handle: None,
            status: ShotStatus::Submitting,
            fired_at_ms,
        });

        let request = ShotRequest { id, fired_at_ms };
        let reporter = SettlementReporter {
            id,
            tx: self.tx.clone(),
        };
        let started = match self.signer.as_mut() {
            Some(signer) => signer.submit(request, reporter),
            None => Err(SubmitError::Unavailable),
        };

        match started {
            Ok(()) => log::debug!("shot {} submitted ({} pending)", id, self.pending()),
            Err(error) => self.apply(Settlement::Failed { id, error }),
        }
        id
    }

    /// Merge every settlement that arrived since the last call.
    /// Returns how many messages were applied.
    pub fn pump(&mut self) -> usize {
        let arrived: Vec<Settlement> = self.rx.try_iter().collect();
        let count = arrived.len();
        for settlement in arrived {
            self.apply(settlement);
        }
        count
    }

    fn apply(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::Sent { id, handle } => {
                if !self.in_flight.contains(&id) {
                    return;
                }
                log::debug!("shot {} sent as {}", id, handle);
                self.ledger.update(id, |r| {
                    r.handle = Some(handle);
                    r.status = ShotStatus::Sent;
                });
            }
            Settlement::Confirmed { id } => {
                if !self.in_flight.remove(&id) {
                    return;
                }
                self.stats.confirmed += 1;
                log::debug!("shot {} confirmed", id);
                self.ledger.update(id, |r| r.status = ShotStatus::Confirmed);
            }
            Settlement::Failed { id, error } => {
                if !self.in_flight.remove(&id) {
                    return;
                }
                self.stats.failed += 1;
                log::warn!("shot {} dropped: {}", id, error);
                self.ledger.update(id, |r| r.status = ShotStatus::Failed);
            }
        }
    }

    /// Submissions started but not yet settled
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> ShotStats {
        self.stats
    }

    pub fn ledger(&self) -> &ShotLedger {
        &self.ledger
    }

    /// Forget the current session's shots. Ids keep counting up, so
    /// settlements still in flight are recognised as stale and ignored.
    pub fn reset(&mut self) {
        self.in_flight.clear();
        self.ledger.clear();
        self.stats = ShotStats::default();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Signer that parks every submission until the test settles it
    #[derive(Clone, Default)]
    pub struct ScriptedSigner {
        pub parked: Rc<RefCell<Vec<(ShotRequest, SettlementReporter)>>>,
        pub reject_next: Rc<RefCell<bool>>,
    }

    impl ScriptedSigner {
        pub fn count(&self) -> usize {
            self.parked.borrow().len()
        }

        /// Take the parked reporter for shot `id`
        pub fn take(&self, id: ShotId) -> SettlementReporter {
            let mut parked = self.parked.borrow_mut();
            let index = parked
                .iter()
                .position(|(req, _)| req.id == id)
                .expect("shot not parked");
            parked.remove(index).1
        }
    }

    impl ShotSigner for ScriptedSigner {
        fn submit(
            &mut self,
            request: ShotRequest,
            reporter: SettlementReporter,
        ) -> Result<(), SubmitError> {
            if self.reject_next.replace(false) {
                return Err(SubmitError::Rejected("insufficient funds".into()));
            }
            self.parked.borrow_mut().push((request, reporter));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedSigner;
    use super::*;

    fn bridge_with(history: usize) -> (ShotBridge, ScriptedSigner) {
        let signer = ScriptedSigner::default();
        let mut bridge = ShotBridge::new(history);
        bridge.attach_signer(Box::new(signer.clone()));
        (bridge, signer)
    }

    #[test]
    fn test_submit_is_optimistic_and_non_blocking() {
        let (mut bridge, signer) = bridge_with(10);
        let a = bridge.submit_shot(10.0);
        let b = bridge.submit_shot(20.0);

        assert_eq!(bridge.pending(), 2);
        assert_eq!(signer.count(), 2);
        assert_eq!(bridge.stats().fired, 2);
        let ids: Vec<ShotId> = bridge.ledger().recent(10).map(|r| r.id).collect();
        assert_eq!(ids, vec![b, a], "newest first, fire order preserved");
        assert!(
            bridge
                .ledger()
                .recent(10)
                .all(|r| r.status == ShotStatus::Submitting)
        );
    }

    #[test]
    fn test_out_of_order_confirmation() {
        let (mut bridge, signer) = bridge_with(10);
        let first = bridge.submit_shot(0.0);
        let second = bridge.submit_shot(1.0);

        let late = signer.take(first);
        let early = signer.take(second);
        early.sent(TxHandle("0xbbb".into()));
        early.confirmed();
        assert_eq!(bridge.pump(), 2);

        assert_eq!(bridge.pending(), 1);
        assert!(bridge.ledger().get(second).unwrap().is_confirmed());
        assert!(!bridge.ledger().get(first).unwrap().is_confirmed());

        late.sent(TxHandle("0xaaa".into()));
        late.confirmed();
        bridge.pump();
        assert_eq!(bridge.pending(), 0);
        assert_eq!(bridge.stats().confirmed, 2);
        let record = bridge.ledger().get(first).unwrap();
        assert_eq!(record.handle, Some(TxHandle("0xaaa".into())));
    }

    #[test]
    fn test_failure_is_swallowed_and_not_retried() {
        let (mut bridge, signer) = bridge_with(10);
        let id = bridge.submit_shot(0.0);
        signer
            .take(id)
            .failed(SubmitError::Rejected("nonce too low".into()));
        bridge.pump();

        assert_eq!(bridge.pending(), 0);
        assert_eq!(bridge.stats().failed, 1);
        assert_eq!(signer.count(), 0, "no retry");
        let record = bridge.ledger().get(id).unwrap();
        assert_eq!(record.status, ShotStatus::Failed);
        assert!(!record.is_confirmed());
    }

    #[test]
    fn test_immediate_rejection() {
        let (mut bridge, signer) = bridge_with(10);
        *signer.reject_next.borrow_mut() = true;
        let id = bridge.submit_shot(0.0);
        assert_eq!(bridge.pending(), 0);
        assert_eq!(bridge.stats().failed, 1);
        assert_eq!(bridge.ledger().get(id).unwrap().status, ShotStatus::Failed);
    }

    #[test]
    fn test_no_signer_counts_as_failure() {
        let mut bridge = ShotBridge::new(10);
        bridge.submit_shot(0.0);
        assert_eq!(bridge.pending(), 0);
        assert_eq!(bridge.stats().failed, 1);
    }

    #[test]
    fn test_settlement_after_trim() {
        let (mut bridge, signer) = bridge_with(3);
        let oldest = bridge.submit_shot(0.0);
        for i in 1..5 {
            bridge.submit_shot(i as f64);
        }
        assert_eq!(bridge.ledger().len(), 3);
        assert!(bridge.ledger().get(oldest).is_none());

        signer.take(oldest).confirmed();
        bridge.pump();
        assert_eq!(bridge.pending(), 4);
        assert_eq!(bridge.stats().confirmed, 1);
    }

    #[test]
    fn test_stale_settlement_after_reset() {
        let (mut bridge, signer) = bridge_with(10);
        let old = bridge.submit_shot(0.0);
        bridge.reset();
        assert_eq!(bridge.pending(), 0);

        let new = bridge.submit_shot(0.0);
        assert!(new > old);
        signer.take(old).confirmed();
        bridge.pump();
        assert_eq!(bridge.stats().confirmed, 0);
        assert_eq!(bridge.pending(), 1);
    }

    #[test]
    fn test_report_after_teardown_is_harmless() {
        let (mut bridge, signer) = bridge_with(10);
        let id = bridge.submit_shot(0.0);
        drop(bridge);
        signer.take(id).confirmed();
    }

    #[test]
    fn test_settlement_from_another_thread() {
        struct ThreadSigner;
        impl ShotSigner for ThreadSigner {
            fn submit(
                &mut self,
                _request: ShotRequest,
                reporter: SettlementReporter,
            ) -> Result<(), SubmitError> {
                std::thread::spawn(move || {
                    reporter.sent(TxHandle(format!("0x{:x}", reporter.id())));
                    reporter.confirmed();
                });
                Ok(())
            }
        }

        let mut bridge = ShotBridge::new(10);
        bridge.attach_signer(Box::new(ThreadSigner));
        bridge.submit_shot(0.0);
        bridge.submit_shot(1.0);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while bridge.pending() > 0 && std::time::Instant::now() < deadline {
            bridge.pump();
            std::thread::yield_now();
        }
        assert_eq!(bridge.pending(), 0);
        assert_eq!(bridge.stats().confirmed, 2);
    }

    #[test]
    fn test_payload() {
        let request = ShotRequest {
            id: 1,
            fired_at_ms: 1500.0,
        };
        let value: serde_json::Value = serde_json::from_str(&request.payload()).unwrap();
        assert_eq!(value["action"], "shot");
        assert_eq!(value["timestamp"], 1500.0);
    }

    #[test]
    fn test_handle_display_forms() {
        let handle = TxHandle("0xabcdef0123456789abcdef".into());
        assert_eq!(
            handle.explorer_url(),
            "https://sepolia.tea.xyz/tx/0xabcdef0123456789abcdef"
        );
        assert_eq!(handle.short(), "0xabcd...cdef");
        assert_eq!(TxHandle("0x12".into()).short(), "0x12");
    }
}
