use anyhow::{Result, bail};
use derive_deref::Deref;
use serde::Deserialize;
use slog::{Logger, error, info};
use std::collections::HashMap;
use std::fs;
use std::net::Ipv4Addr;

#[derive(Deserialize, Debug)]
struct ApnEntry {
    gateway: Ipv4Addr,
}

/// APN name to APN gateway address.
#[derive(Deref, Debug, Default)]
pub struct ApnTable(HashMap<String, Ipv4Addr>);

/// Load the APN table from file into memory.
pub fn load_apns_file(filename: &str, logger: &Logger) -> Result<ApnTable> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load APN file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    parse_apns(&contents, filename, logger)
}

pub fn parse_apns(contents: &str, filename: &str, logger: &Logger) -> Result<ApnTable> {
    let table: HashMap<String, ApnEntry> = toml::from_str(contents)?;
    let mut new_table = HashMap::new();
    for (key, value) in table.into_iter() {
        let Some(apn) = key.strip_prefix("apn-") else {
            bail!("Key {} in {filename} does not start with 'apn-'", key)
        };
        info!(logger, "Loaded APN {apn} with gateway {} from {filename}", value.gateway);
        new_table.insert(apn.to_string(), value.gateway);
    }
    Ok(ApnTable(new_table))
}
