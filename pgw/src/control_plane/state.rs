use crate::data::{Bearer, CpTeid, DpTeid, PdnConnection};
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Everything guarded by the control plane lock.
///
/// `pdns` is the arena of PDN connections.  The UE address index and the bearers
/// refer to their PDN connection by CP TEID, never by holding a copy of it.
pub(super) struct State {
    pub apns: HashMap<String, Ipv4Addr>,
    pub pdns: HashMap<CpTeid, PdnConnection>,
    pub pdns_by_ue_ip_addr: HashMap<Ipv4Addr, CpTeid>,
    pub bearers: HashMap<DpTeid, Bearer>,
    pub rng: StdRng,
}

impl State {
    pub fn new(rng: StdRng) -> Self {
        State {
            apns: HashMap::new(),
            pdns: HashMap::new(),
            pdns_by_ue_ip_addr: HashMap::new(),
            bearers: HashMap::new(),
            rng,
        }
    }

    /// Remove a PDN connection, its bearers and its UE address index entry.  Returns the
    /// removed PDN connection.
    pub fn delete_pdn(&mut self, cp_teid: CpTeid) -> Option<PdnConnection> {
        let bearers = self.pdns.get(&cp_teid)?.bearers.clone();

        // Bearers first, then the address index, then the PDN itself.
        for dp_teid in bearers {
            self.delete_bearer(dp_teid);
        }
        let pdn = self.pdns.get(&cp_teid)?;
        self.pdns_by_ue_ip_addr.remove(&pdn.ue_ip_addr);
        self.pdns.remove(&cp_teid)
    }

    /// Remove a bearer from the index and from its PDN connection, clearing the
    /// PDN's default bearer if it was this one.
    pub fn delete_bearer(&mut self, dp_teid: DpTeid) -> Option<Bearer> {
        let bearer = self.bearers.remove(&dp_teid)?;
        if let Some(pdn) = self.pdns.get_mut(&bearer.pdn) {
            pdn.bearers.remove(&dp_teid);
            if pdn.default_bearer == Some(dp_teid) {
                pdn.default_bearer = None;
            }
        }
        Some(bearer)
    }
}
