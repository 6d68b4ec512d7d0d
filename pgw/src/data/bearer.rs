use super::{CpTeid, DpTeid};

/// A snapshot of a bearer.  `pdn` is the CP TEID of the owning PDN connection and
/// must be looked up through the control plane on each use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bearer {
    pub dp_teid: DpTeid,
    pub sgw_dp_teid: DpTeid,
    pub pdn: CpTeid,
}

impl std::fmt::Display for Bearer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}->{})", self.dp_teid, self.sgw_dp_teid)
    }
}
