use derive_deref::Deref;

/// Control-plane tunnel endpoint identifier.  Identifies a PDN connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deref)]
pub struct CpTeid(pub u32);

/// Data-plane tunnel endpoint identifier.  Identifies a bearer.  This is a separate
/// namespace from CpTeid - the same number may be live in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deref)]
pub struct DpTeid(pub u32);

impl std::fmt::Display for CpTeid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl std::fmt::Display for DpTeid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
