mod counters;
mod data_plane;
mod rate_limited_data_plane;
mod token_bucket;

use crate::data::DpTeid;
use std::net::Ipv4Addr;
use std::sync::Arc;

pub use counters::{Counters, counter_indices, dump_stats};
pub use data_plane::DataPlane;
pub use rate_limited_data_plane::{RateLimitConfig, RateLimitedDataPlane};
pub use token_bucket::TokenBucket;

/// An IP packet, without any tunnel encapsulation.
pub type Packet = Vec<u8>;

/// Transport towards the APN gateways and the SGW.  Implementations must not block.
pub trait ForwardingSink: Send + Sync {
    fn forward_packet_to_apn(&self, apn_gw: Ipv4Addr, packet: Packet);
    fn forward_packet_to_sgw(&self, sgw_addr: Ipv4Addr, sgw_dp_teid: DpTeid, packet: Packet);
}

impl<T: ForwardingSink + ?Sized> ForwardingSink for Arc<T> {
    fn forward_packet_to_apn(&self, apn_gw: Ipv4Addr, packet: Packet) {
        (**self).forward_packet_to_apn(apn_gw, packet)
    }
    fn forward_packet_to_sgw(&self, sgw_addr: Ipv4Addr, sgw_dp_teid: DpTeid, packet: Packet) {
        (**self).forward_packet_to_sgw(sgw_addr, sgw_dp_teid, packet)
    }
}

/// Entry points for packets arriving from the SGW (uplink) and from the APN gateways (downlink).
/// Unroutable packets are silently dropped.
pub trait PacketHandler: Send + Sync {
    fn handle_uplink(&self, dp_teid: DpTeid, packet: Packet);
    fn handle_downlink(&self, ue_ip_addr: Ipv4Addr, packet: Packet);
}
