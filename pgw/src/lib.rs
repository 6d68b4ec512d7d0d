mod control_plane;
mod data;
mod pgw;
mod userplane;

pub use control_plane::{ControlPlane, SessionListener};
pub use data::apns::{self, ApnTable};
pub use data::{Bearer, Config, CpTeid, DpTeid, PdnConnection};
pub use pgw::{Pgw, PgwDataPlane};
pub use userplane::{
    Counters, counter_indices, DataPlane, ForwardingSink, Packet, PacketHandler, RateLimitConfig,
    RateLimitedDataPlane, TokenBucket,
};
