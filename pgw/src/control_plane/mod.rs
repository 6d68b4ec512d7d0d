//! control_plane - PDN connection and bearer directory
mod allocation;
mod state;

use crate::data::{Bearer, Config, CpTeid, DpTeid, PdnConnection};
use rand::SeedableRng;
use rand::rngs::StdRng;
use slog::{Logger, debug, info, o};
use state::State;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Notified after a PDN connection has been deleted from the control plane.
pub trait SessionListener: Send + Sync {
    fn pdn_connection_deleted(&self, pdn: &PdnConnection);
}

/// The session directory.  Owns the APN registry, the PDN connections (indexed by
/// CP TEID and by UE IP address) and the bearers (indexed by DP TEID).
///
/// All three indexes sit behind a single lock, so every lookup sees a consistent
/// snapshot, and every operation leaves the indexes consistent when it returns.
pub struct ControlPlane {
    state: Mutex<State>,
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
    ue_subnet_prefix: u8,
    logger: Logger,
}

impl ControlPlane {
    pub fn new(config: &Config, logger: &Logger) -> Self {
        Self::with_rng(config, StdRng::from_os_rng(), logger)
    }

    /// Create a control plane that draws TEIDs and UE addresses from the given generator.
    pub fn with_rng(config: &Config, rng: StdRng, logger: &Logger) -> Self {
        ControlPlane {
            state: Mutex::new(State::new(rng)),
            listeners: Mutex::new(vec![]),
            ue_subnet_prefix: config.ue_subnet_prefix,
            logger: logger.new(o!("component" => "cp")),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn add_apn(&self, apn_name: &str, apn_gw: Ipv4Addr) {
        self.lock().apns.insert(apn_name.to_string(), apn_gw);
        info!(self.logger, "Added APN {apn_name} with gateway {apn_gw}");
    }

    pub fn find_pdn_by_cp_teid(&self, cp_teid: CpTeid) -> Option<PdnConnection> {
        self.lock().pdns.get(&cp_teid).cloned()
    }

    pub fn find_pdn_by_ue_ip_addr(&self, ue_ip_addr: Ipv4Addr) -> Option<PdnConnection> {
        let state = self.lock();
        let cp_teid = state.pdns_by_ue_ip_addr.get(&ue_ip_addr)?;
        state.pdns.get(cp_teid).cloned()
    }

    pub fn find_bearer_by_dp_teid(&self, dp_teid: DpTeid) -> Option<Bearer> {
        self.lock().bearers.get(&dp_teid).cloned()
    }

    /// Create a PDN connection on the given APN.  Returns None if the APN is not known.
    pub fn create_pdn_connection(
        &self,
        apn: &str,
        sgw_addr: Ipv4Addr,
        sgw_cp_teid: CpTeid,
    ) -> Option<PdnConnection> {
        let mut state = self.lock();
        let Some(apn_gw) = state.apns.get(apn).copied() else {
            debug!(self.logger, "Rejected PDN connection for unknown APN {apn}");
            return None;
        };

        let cp_teid = state.allocate_cp_teid();
        let ue_ip_addr = state.allocate_ue_ip_addr(self.ue_subnet_prefix);

        let pdn = PdnConnection {
            cp_teid,
            apn_gw,
            ue_ip_addr,
            sgw_addr,
            sgw_cp_teid,
            default_bearer: None,
            bearers: Default::default(),
        };
        state.pdns.insert(cp_teid, pdn.clone());
        state.pdns_by_ue_ip_addr.insert(ue_ip_addr, cp_teid);
        drop(state);

        info!(
            self.logger,
            "Created PDN connection {} on APN {apn}, SGW {}-{}", pdn, sgw_addr, sgw_cp_teid
        );
        Some(pdn)
    }

    /// Delete a PDN connection together with all of its bearers.
    pub fn delete_pdn_connection(&self, cp_teid: CpTeid) {
        let Some(pdn) = self.lock().delete_pdn(cp_teid) else {
            return;
        };
        info!(self.logger, "Deleted PDN connection {}", pdn);

        // Clone the listener list so that no lock is held while they run.
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.pdn_connection_deleted(&pdn);
        }
    }

    /// Create a bearer in the given PDN connection.  Returns None if there is no such PDN connection.
    pub fn create_bearer(&self, cp_teid: CpTeid, sgw_dp_teid: DpTeid) -> Option<Bearer> {
        let mut state = self.lock();
        if !state.pdns.contains_key(&cp_teid) {
            debug!(self.logger, "Rejected bearer for unknown PDN {cp_teid}");
            return None;
        }

        let dp_teid = state.allocate_dp_teid();
        let bearer = Bearer {
            dp_teid,
            sgw_dp_teid,
            pdn: cp_teid,
        };
        if let Some(pdn) = state.pdns.get_mut(&cp_teid) {
            pdn.bearers.insert(dp_teid);
        }
        state.bearers.insert(dp_teid, bearer.clone());
        drop(state);

        info!(
            self.logger,
            "Created bearer {} in PDN {cp_teid}", bearer; "cp_teid" => %cp_teid
        );
        Some(bearer)
    }

    pub fn delete_bearer(&self, dp_teid: DpTeid) {
        if let Some(bearer) = self.lock().delete_bearer(dp_teid) {
            info!(
                self.logger,
                "Deleted bearer {}", bearer; "cp_teid" => %bearer.pdn
            );
        }
    }

    /// Make a bearer the default bearer of its PDN connection.  Fails if either is unknown,
    /// or if the bearer belongs to a different PDN connection.
    pub fn set_default_bearer(&self, cp_teid: CpTeid, dp_teid: DpTeid) -> bool {
        let mut state = self.lock();
        let owned = state
            .bearers
            .get(&dp_teid)
            .is_some_and(|bearer| bearer.pdn == cp_teid);
        if !owned {
            debug!(
                self.logger,
                "Bearer {dp_teid} is not a bearer of PDN {cp_teid}"
            );
            return false;
        }
        let Some(pdn) = state.pdns.get_mut(&cp_teid) else {
            return false;
        };
        pdn.default_bearer = Some(dp_teid);
        true
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
