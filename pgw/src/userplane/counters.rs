use atomic_counter::{AtomicCounter, RelaxedCounter};
use derive_deref::Deref;
use slog::{Logger, info, warn};
use std::sync::Arc;
use std::time::Duration;

pub mod counter_indices {
    pub const UL_RX_PKTS: usize = 0;
    pub const UL_RX_BYTES: usize = 1;
    pub const UL_TX_PKTS: usize = 2;
    pub const DL_RX_PKTS: usize = 3;
    pub const DL_RX_BYTES: usize = 4;
    pub const DL_TX_PKTS: usize = 5;

    // Drops.  These must stay at the end - see FIRST_DROP_IDX.
    pub const UL_DROP_UNKNOWN_TEID: usize = 6;
    pub const UL_DROP_UNKNOWN_PDN: usize = 7;
    pub const UL_DROP_RATE_LIMITED: usize = 8;
    pub const DL_DROP_UNKNOWN_IP: usize = 9;
    pub const DL_DROP_NO_DEFAULT_BEARER: usize = 10;
    pub const DL_DROP_RATE_LIMITED: usize = 11;

    pub const FIRST_DROP_IDX: usize = UL_DROP_UNKNOWN_TEID;
    pub const NUM_COUNTERS: usize = 12;
}

use counter_indices::*;

/// Userplane packet counters, indexed by the constants in `counter_indices`.
#[derive(Default, Deref)]
pub struct Counters([RelaxedCounter; NUM_COUNTERS]);

impl Counters {
    pub fn count(&self, idx: usize) -> usize {
        self.0[idx].get()
    }

    pub fn snapshot(&self) -> [usize; NUM_COUNTERS] {
        std::array::from_fn(|idx| self.0[idx].get())
    }
}

pub async fn dump_stats(logger: Logger, counters: Arc<Counters>, interval: Duration) {
    let mut last = [0usize; NUM_COUNTERS];

    loop {
        async_std::task::sleep(interval).await;
        let current = counters.snapshot();

        if current[UL_RX_PKTS] != last[UL_RX_PKTS] || current[DL_RX_PKTS] != last[DL_RX_PKTS] {
            info!(
                &logger,
                "UL pkts={} bytes={} fwd={} DL pkts={} bytes={} fwd={}",
                current[UL_RX_PKTS],
                current[UL_RX_BYTES],
                current[UL_TX_PKTS],
                current[DL_RX_PKTS],
                current[DL_RX_BYTES],
                current[DL_TX_PKTS]
            );
        }

        if current[FIRST_DROP_IDX..] != last[FIRST_DROP_IDX..] {
            warn!(
                &logger,
                "UL DROPS bad_teid={} no_pdn={} rate_limited={} DL DROPS bad_ip={} no_default_bearer={} rate_limited={}",
                current[UL_DROP_UNKNOWN_TEID],
                current[UL_DROP_UNKNOWN_PDN],
                current[UL_DROP_RATE_LIMITED],
                current[DL_DROP_UNKNOWN_IP],
                current[DL_DROP_NO_DEFAULT_BEARER],
                current[DL_DROP_RATE_LIMITED]
            );
        }

        last = current;
    }
}
