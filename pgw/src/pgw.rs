use crate::userplane::dump_stats;
use crate::{ApnTable, Config, ControlPlane, ForwardingSink, RateLimitedDataPlane};
use async_std::sync::Mutex;
use async_std::task::JoinHandle;
use slog::{Logger, info, o};
use std::sync::Arc;
use stop_token::StopSource;
use stop_token::prelude::*;

pub type PgwDataPlane = RateLimitedDataPlane<Arc<dyn ForwardingSink>>;

/// A PDN gateway: the session directory plus a rate limited data plane that routes
/// through it.
#[derive(Clone)]
pub struct Pgw {
    config: Config,
    logger: Logger,
    control_plane: Arc<ControlPlane>,
    data_plane: Arc<PgwDataPlane>,
    stats_task: Arc<Mutex<Option<(StopSource, JoinHandle<()>)>>>,
}

impl Pgw {
    /// Create a PGW and start its stats task.
    pub fn start(
        config: Config,
        logger: Logger,
        apns: &ApnTable,
        sink: Arc<dyn ForwardingSink>,
    ) -> Self {
        let pgw = Self::new(config, logger, apns, sink);
        let stop_source = StopSource::new();
        let stats = dump_stats(
            pgw.logger.new(o!("component" => "stats")),
            pgw.data_plane.counters().clone(),
            pgw.config.stats_interval,
        )
        .timeout_at(stop_source.token());
        let handle = async_std::task::spawn(async move {
            let _ = stats.await;
        });
        Pgw {
            stats_task: Arc::new(Mutex::new(Some((stop_source, handle)))),
            ..pgw
        }
    }

    /// Create a PGW without a stats task.
    pub fn new(
        config: Config,
        logger: Logger,
        apns: &ApnTable,
        sink: Arc<dyn ForwardingSink>,
    ) -> Self {
        let control_plane = Arc::new(ControlPlane::new(&config, &logger));
        for (name, apn_gw) in apns.iter() {
            control_plane.add_apn(name, *apn_gw);
        }
        let data_plane = Arc::new(RateLimitedDataPlane::new(
            control_plane.clone(),
            sink,
            &logger,
        ));
        Pgw {
            config,
            logger,
            control_plane,
            data_plane,
            stats_task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn control_plane(&self) -> &ControlPlane {
        &self.control_plane
    }

    pub fn data_plane(&self) -> &PgwDataPlane {
        &self.data_plane
    }

    pub async fn graceful_shutdown(self) {
        info!(&self.logger, "Shutting down");
        if let Some((stop_source, handle)) = self.stats_task.lock().await.take() {
            drop(stop_source);
            handle.await;
        }
    }
}
