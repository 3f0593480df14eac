use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

const SEQUENCE_SPAN: u64 = 1_000_000;

/// Issues gateway transaction ids of the form
/// `REF<epoch millis><6-digit sequence><4 hex random>` (26 chars).
///
/// The sequence makes ids unique within the process; the random suffix keeps
/// separate processes apart when their clocks and sequences line up.
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    sequence: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let millis = Utc::now().timestamp_millis();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) % SEQUENCE_SPAN;
        let suffix: u16 = rand::random();
        format!("REF{millis}{seq:06}{suffix:04x}")
    }
}
