use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // First octet of allocated UE addresses.  The other three octets are random, each in 1-254.
    pub ue_subnet_prefix: u8,

    // How often the stats task logs the userplane counters.
    pub stats_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ue_subnet_prefix: 10,
            stats_interval: Duration::from_secs(5),
        }
    }
}
