use super::counters::{Counters, counter_indices::*};
use super::{DataPlane, ForwardingSink, Packet, PacketHandler, TokenBucket};
use crate::data::{CpTeid, DpTeid, PdnConnection};
use crate::{ControlPlane, SessionListener};
use atomic_counter::AtomicCounter;
use dashmap::DashMap;
use slog::{Logger, debug, info, o};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Rates are in bytes per second and capacities in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub uplink_rate: u64,
    pub uplink_capacity: u64,
    pub downlink_rate: u64,
    pub downlink_capacity: u64,
}

/// Token buckets for every rate limited PDN connection.  Uplink packets are checked by
/// CP TEID, because they have already been resolved to a PDN connection, whereas
/// downlink packets are checked by their destination UE IP address.
#[derive(Default)]
struct RateLimiters {
    uplink: DashMap<CpTeid, Arc<TokenBucket>>,
    downlink: DashMap<Ipv4Addr, Arc<TokenBucket>>,
}

impl RateLimiters {
    fn insert(&self, pdn: &PdnConnection, config: &RateLimitConfig) {
        self.uplink.insert(
            pdn.cp_teid,
            Arc::new(TokenBucket::new(config.uplink_rate, config.uplink_capacity)),
        );
        self.downlink.insert(
            pdn.ue_ip_addr,
            Arc::new(TokenBucket::new(
                config.downlink_rate,
                config.downlink_capacity,
            )),
        );
    }

    fn remove(&self, pdn: &PdnConnection) {
        self.uplink.remove(&pdn.cp_teid);
        self.downlink.remove(&pdn.ue_ip_addr);
    }

    // The bucket is cloned out of the map so that the shard lock is not held while spending.
    fn uplink_bucket(&self, cp_teid: CpTeid) -> Option<Arc<TokenBucket>> {
        self.uplink.get(&cp_teid).map(|entry| entry.value().clone())
    }

    fn downlink_bucket(&self, ue_ip_addr: Ipv4Addr) -> Option<Arc<TokenBucket>> {
        self.downlink
            .get(&ue_ip_addr)
            .map(|entry| entry.value().clone())
    }
}

impl SessionListener for RateLimiters {
    fn pdn_connection_deleted(&self, pdn: &PdnConnection) {
        self.remove(pdn);
    }
}

/// A DataPlane that polices each PDN connection with an uplink and a downlink token bucket.
/// PDN connections with no rate limits set are not policed.
pub struct RateLimitedDataPlane<S: ForwardingSink> {
    data_plane: DataPlane<S>,
    limiters: Arc<RateLimiters>,
    logger: Logger,
}

impl<S: ForwardingSink> RateLimitedDataPlane<S> {
    /// Create the data plane and register with the control plane so that rate limits
    /// are deleted along with their PDN connection.
    pub fn new(control_plane: Arc<ControlPlane>, sink: S, logger: &Logger) -> Self {
        let limiters = Arc::new(RateLimiters::default());
        control_plane.add_listener(limiters.clone());
        RateLimitedDataPlane {
            data_plane: DataPlane::new(control_plane, sink, logger),
            limiters,
            logger: logger.new(o!("component" => "rl")),
        }
    }

    pub fn counters(&self) -> &Arc<Counters> {
        self.data_plane.counters()
    }

    pub fn sink(&self) -> &S {
        self.data_plane.sink()
    }

    /// Set or reset the rate limits of a PDN connection.  Both buckets start full.
    pub fn set_rate_limits(&self, cp_teid: CpTeid, config: &RateLimitConfig) {
        let control_plane = self.data_plane.control_plane();
        let Some(pdn) = control_plane.find_pdn_by_cp_teid(cp_teid) else {
            debug!(self.logger, "Rate limits not set for unknown PDN {cp_teid}");
            return;
        };
        self.limiters.insert(&pdn, config);

        // Catch a PDN connection deleted while the buckets were being installed.
        if control_plane.find_pdn_by_cp_teid(cp_teid).is_none() {
            self.limiters.remove(&pdn);
            return;
        }
        info!(
            self.logger,
            "Set rate limits for {}: {:?}", pdn, config; "cp_teid" => %cp_teid
        );
    }

    pub fn is_uplink_limited(&self, cp_teid: CpTeid) -> bool {
        self.limiters.uplink.contains_key(&cp_teid)
    }

    pub fn is_downlink_limited(&self, ue_ip_addr: Ipv4Addr) -> bool {
        self.limiters.downlink.contains_key(&ue_ip_addr)
    }

    pub fn delete_rate_limits(&self, cp_teid: CpTeid) {
        let Some(pdn) = self.data_plane.control_plane().find_pdn_by_cp_teid(cp_teid) else {
            return;
        };
        self.limiters.remove(&pdn);
        info!(self.logger, "Deleted rate limits for {}", pdn; "cp_teid" => %cp_teid);
    }
}

fn admit(bucket: Option<Arc<TokenBucket>>, packet: &Packet) -> bool {
    bucket.is_none_or(|bucket| bucket.try_spend(packet.len()))
}

impl<S: ForwardingSink> PacketHandler for RateLimitedDataPlane<S> {
    fn handle_uplink(&self, dp_teid: DpTeid, packet: Packet) {
        let Some(route) = self.data_plane.resolve_uplink(dp_teid, &packet) else {
            return;
        };
        if !admit(self.limiters.uplink_bucket(route.cp_teid), &packet) {
            self.counters()[UL_DROP_RATE_LIMITED].inc();
            return;
        }
        self.data_plane.forward_uplink(route, packet);
    }

    fn handle_downlink(&self, ue_ip_addr: Ipv4Addr, packet: Packet) {
        let Some(route) = self.data_plane.resolve_downlink(ue_ip_addr, &packet) else {
            return;
        };
        if !admit(self.limiters.downlink_bucket(ue_ip_addr), &packet) {
            self.counters()[DL_DROP_RATE_LIMITED].inc();
            return;
        }
        self.data_plane.forward_downlink(route, packet);
    }
}
