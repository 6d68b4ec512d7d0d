use super::counters::{Counters, counter_indices::*};
use super::{ForwardingSink, Packet, PacketHandler};
use crate::ControlPlane;
use crate::data::{CpTeid, DpTeid};
use atomic_counter::AtomicCounter;
use slog::{Logger, debug, o};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Where an uplink packet goes once its bearer has been resolved.
pub(super) struct UplinkRoute {
    pub cp_teid: CpTeid,
    pub apn_gw: Ipv4Addr,
}

/// Where a downlink packet goes once its PDN connection and default bearer have been resolved.
pub(super) struct DownlinkRoute {
    pub sgw_addr: Ipv4Addr,
    pub sgw_dp_teid: DpTeid,
}

/// Routes packets between the SGW and the APN gateways by looking up bearers and
/// PDN connections in the control plane.  Holds no per-session state of its own.
pub struct DataPlane<S: ForwardingSink> {
    control_plane: Arc<ControlPlane>,
    sink: S,
    counters: Arc<Counters>,
    logger: Logger,
}

impl<S: ForwardingSink> DataPlane<S> {
    pub fn new(control_plane: Arc<ControlPlane>, sink: S, logger: &Logger) -> Self {
        DataPlane {
            control_plane,
            sink,
            counters: Arc::new(Counters::default()),
            logger: logger.new(o!("component" => "dp")),
        }
    }

    pub fn control_plane(&self) -> &Arc<ControlPlane> {
        &self.control_plane
    }

    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub(super) fn resolve_uplink(&self, dp_teid: DpTeid, packet: &Packet) -> Option<UplinkRoute> {
        self.counters[UL_RX_PKTS].inc();
        self.counters[UL_RX_BYTES].add(packet.len());

        let Some(bearer) = self.control_plane.find_bearer_by_dp_teid(dp_teid) else {
            self.counters[UL_DROP_UNKNOWN_TEID].inc();
            debug!(self.logger, "Drop uplink packet for unknown TEID {dp_teid}");
            return None;
        };

        // The PDN connection can vanish between the two lookups if it is being deleted.
        let Some(pdn) = self.control_plane.find_pdn_by_cp_teid(bearer.pdn) else {
            self.counters[UL_DROP_UNKNOWN_PDN].inc();
            debug!(self.logger, "Drop uplink packet for deleted PDN {}", bearer.pdn);
            return None;
        };

        Some(UplinkRoute {
            cp_teid: pdn.cp_teid,
            apn_gw: pdn.apn_gw,
        })
    }

    pub(super) fn resolve_downlink(
        &self,
        ue_ip_addr: Ipv4Addr,
        packet: &Packet,
    ) -> Option<DownlinkRoute> {
        self.counters[DL_RX_PKTS].inc();
        self.counters[DL_RX_BYTES].add(packet.len());

        let Some(pdn) = self.control_plane.find_pdn_by_ue_ip_addr(ue_ip_addr) else {
            self.counters[DL_DROP_UNKNOWN_IP].inc();
            debug!(self.logger, "Drop downlink packet for unknown UE {ue_ip_addr}");
            return None;
        };

        let Some(default_bearer) = pdn
            .default_bearer
            .and_then(|dp_teid| self.control_plane.find_bearer_by_dp_teid(dp_teid))
        else {
            self.counters[DL_DROP_NO_DEFAULT_BEARER].inc();
            debug!(self.logger, "Drop downlink packet - no default bearer for {}", pdn);
            return None;
        };

        Some(DownlinkRoute {
            sgw_addr: pdn.sgw_addr,
            sgw_dp_teid: default_bearer.sgw_dp_teid,
        })
    }

    pub(super) fn forward_uplink(&self, route: UplinkRoute, packet: Packet) {
        self.counters[UL_TX_PKTS].inc();
        self.sink.forward_packet_to_apn(route.apn_gw, packet);
    }

    pub(super) fn forward_downlink(&self, route: DownlinkRoute, packet: Packet) {
        self.counters[DL_TX_PKTS].inc();
        self.sink
            .forward_packet_to_sgw(route.sgw_addr, route.sgw_dp_teid, packet);
    }
}

impl<S: ForwardingSink> PacketHandler for DataPlane<S> {
    fn handle_uplink(&self, dp_teid: DpTeid, packet: Packet) {
        if let Some(route) = self.resolve_uplink(dp_teid, &packet) {
            self.forward_uplink(route, packet);
        }
    }

    fn handle_downlink(&self, ue_ip_addr: Ipv4Addr, packet: Packet) {
        if let Some(route) = self.resolve_downlink(ue_ip_addr, &packet) {
            self.forward_downlink(route, packet);
        }
    }
}
