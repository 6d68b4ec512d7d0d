use async_std::task;
use pgw::{Config, Pgw, PacketHandler, apns};
use pgw_tests::{MockSink, framework::*};
use slog::o;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

const APNS: &str = r#"
[apn-internet]
gateway = "192.168.1.1"

[apn-ims]
gateway = "192.168.2.1"
"#;

#[async_std::test]
async fn start_route_and_shut_down() -> anyhow::Result<()> {
    let logger = init_logging();
    let apns = apns::parse_apns(APNS, "test-apns.toml", &logger)?;
    let sink = Arc::new(MockSink::new(&logger));
    let pgw = Pgw::start(
        Config {
            stats_interval: Duration::from_millis(10),
            ..Config::default()
        },
        logger.new(o!("pgw" => 1)),
        &apns,
        sink.clone(),
    );

    let internet = pgw
        .control_plane()
        .create_pdn_connection("internet", SGW_ADDR, SGW_CP_TEID)
        .unwrap();
    let ims = pgw
        .control_plane()
        .create_pdn_connection("ims", SGW_ADDR, SGW_CP_TEID)
        .unwrap();
    assert!(
        pgw.control_plane()
            .create_pdn_connection(APN, SGW_ADDR, SGW_CP_TEID)
            .is_none()
    );
    let internet_bearer = pgw
        .control_plane()
        .create_bearer(internet.cp_teid, SGW_DEFAULT_BEARER_TEID)
        .unwrap();
    let ims_bearer = pgw
        .control_plane()
        .create_bearer(ims.cp_teid, SGW_DED_BEARER_TEID)
        .unwrap();
    assert!(
        pgw.control_plane()
            .set_default_bearer(ims.cp_teid, ims_bearer.dp_teid)
    );

    pgw.data_plane().handle_uplink(internet_bearer.dp_teid, vec![1]);
    pgw.data_plane().handle_uplink(ims_bearer.dp_teid, vec![2]);
    pgw.data_plane().handle_downlink(ims.ue_ip_addr, vec![3]);

    assert_eq!(sink.to_apn(Ipv4Addr::new(192, 168, 1, 1)), vec![vec![1]]);
    assert_eq!(sink.to_apn(Ipv4Addr::new(192, 168, 2, 1)), vec![vec![2]]);
    assert_eq!(sink.to_sgw(SGW_ADDR, SGW_DED_BEARER_TEID), vec![vec![3]]);

    // Let the stats task run a few times before stopping it.
    task::sleep(Duration::from_millis(50)).await;
    pgw.graceful_shutdown().await;
    Ok(())
}

#[async_std::test]
async fn ue_addresses_use_configured_prefix() -> anyhow::Result<()> {
    let logger = init_logging();
    let apns = apns::parse_apns(APNS, "test-apns.toml", &logger)?;
    let pgw = Pgw::new(
        Config {
            ue_subnet_prefix: 100,
            ..Config::default()
        },
        logger,
        &apns,
        Arc::new(MockSink::new(&init_logging())),
    );
    for _ in 0..10 {
        let pdn = pgw
            .control_plane()
            .create_pdn_connection("internet", SGW_ADDR, SGW_CP_TEID)
            .unwrap();
        assert_eq!(pdn.ue_ip_addr.octets()[0], 100);
        assert_eq!(
            pgw.control_plane().find_pdn_by_ue_ip_addr(pdn.ue_ip_addr),
            Some(pdn)
        );
    }
    assert_eq!(pgw.config().ue_subnet_prefix, 100);
    Ok(())
}
