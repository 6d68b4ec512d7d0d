use super::state::State;
use crate::data::{CpTeid, DpTeid};
use rand::Rng;
use std::net::Ipv4Addr;

// 0 is reserved by GTP.  All-ones is kept back too so that it can never match a live tunnel.
const MIN_TEID: u32 = 1;
const MAX_TEID: u32 = u32::MAX - 1;

// Host octets of a UE address avoid the network and broadcast values.
const MIN_UE_OCTET: u8 = 1;
const MAX_UE_OCTET: u8 = 254;

impl State {
    // Draw until unused.
    pub fn allocate_cp_teid(&mut self) -> CpTeid {
        let mut cp_teid = CpTeid(self.random_teid());
        while self.pdns.contains_key(&cp_teid) {
            cp_teid = CpTeid(self.random_teid());
        }
        cp_teid
    }

    pub fn allocate_dp_teid(&mut self) -> DpTeid {
        let mut dp_teid = DpTeid(self.random_teid());
        while self.bearers.contains_key(&dp_teid) {
            dp_teid = DpTeid(self.random_teid());
        }
        dp_teid
    }

    pub fn allocate_ue_ip_addr(&mut self, prefix: u8) -> Ipv4Addr {
        let mut ue_ip_addr = self.random_ue_ip_addr(prefix);
        while self.pdns_by_ue_ip_addr.contains_key(&ue_ip_addr) {
            ue_ip_addr = self.random_ue_ip_addr(prefix);
        }
        ue_ip_addr
    }

    fn random_teid(&mut self) -> u32 {
        self.rng.random_range(MIN_TEID..=MAX_TEID)
    }

    fn random_ue_ip_addr(&mut self, prefix: u8) -> Ipv4Addr {
        let mut octet = || self.rng.random_range(MIN_UE_OCTET..=MAX_UE_OCTET);
        Ipv4Addr::new(prefix, octet(), octet(), octet())
    }
}
