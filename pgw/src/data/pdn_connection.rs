use super::{CpTeid, DpTeid};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// A snapshot of a PDN connection, as held by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdnConnection {
    pub cp_teid: CpTeid,
    pub apn_gw: Ipv4Addr,
    pub ue_ip_addr: Ipv4Addr,
    pub sgw_addr: Ipv4Addr,
    pub sgw_cp_teid: CpTeid,
    pub default_bearer: Option<DpTeid>,
    pub bearers: BTreeSet<DpTeid>,
}

impl std::fmt::Display for PdnConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.cp_teid, self.ue_ip_addr)
    }
}
