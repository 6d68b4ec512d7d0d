use async_std::task;
use pgw::{CpTeid, RateLimitConfig, counter_indices::*};
use pgw_tests::framework::*;
use std::time::Duration;

const KB: u64 = 1024;

fn limits(uplink_rate: u64, uplink_capacity: u64, downlink_rate: u64, downlink_capacity: u64) -> RateLimitConfig {
    RateLimitConfig {
        uplink_rate,
        uplink_capacity,
        downlink_rate,
        downlink_capacity,
    }
}

#[async_std::test]
async fn no_rate_limit_allows_all_packets() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 10);
    send_downlink(pgw.data_plane(), session.ue_ip_addr(), 1024, 10);

    assert_eq!(sink.to_apn(APN_GW).len(), 10);
    assert_eq!(sink.to_sgw(SGW_ADDR, SGW_DEFAULT_BEARER_TEID).len(), 10);
    Ok(())
}

#[async_std::test]
async fn uplink_rate_limit_low() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB, KB, KB * KB, 10 * KB));

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 5);

    // Only the first packet fits in the bucket.
    assert_eq!(sink.to_apn(APN_GW).len(), 1);
    assert_eq!(pgw.data_plane().counters().count(UL_DROP_RATE_LIMITED), 4);
    Ok(())
}

#[async_std::test]
async fn downlink_rate_limit_low() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB * KB, 10 * KB, KB, KB));

    send_downlink(pgw.data_plane(), session.ue_ip_addr(), 1024, 5);

    assert_eq!(sink.to_sgw(SGW_ADDR, SGW_DEFAULT_BEARER_TEID).len(), 1);
    assert_eq!(pgw.data_plane().counters().count(DL_DROP_RATE_LIMITED), 4);
    Ok(())
}

#[async_std::test]
async fn directions_are_limited_independently() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB, KB, KB * KB, 10 * KB));

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 5);
    send_downlink(pgw.data_plane(), session.ue_ip_addr(), 1024, 5);

    assert_eq!(sink.to_apn(APN_GW).len(), 1);
    assert_eq!(sink.to_sgw(SGW_ADDR, SGW_DEFAULT_BEARER_TEID).len(), 5);
    Ok(())
}

#[async_std::test]
async fn bearers_of_a_pdn_share_the_uplink_limit() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB, 2 * KB, KB, KB));

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 1);
    send_uplink(pgw.data_plane(), session.dedicated_bearer.dp_teid, 1024, 1);
    send_uplink(pgw.data_plane(), session.dedicated_bearer.dp_teid, 1024, 1);
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 1);

    assert_eq!(sink.to_apn(APN_GW).len(), 2);
    Ok(())
}

#[async_std::test]
async fn capacity_allows_multiple_packets() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB, 5 * KB, KB, 5 * KB));

    // 5 KB of capacity lets a burst of five 1 KB packets through...
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 5);
    assert_eq!(sink.to_apn(APN_GW).len(), 5);

    // ...but not a sixth.
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 1);
    assert_eq!(sink.to_apn(APN_GW).len(), 5);
    Ok(())
}

#[async_std::test]
async fn token_charged_over_time() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(10 * KB, KB, 10 * KB, KB));

    // First passes, second is dropped.
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 2);
    assert_eq!(sink.to_apn(APN_GW).len(), 1);

    // About 1.5 KB of tokens accrue in 150ms.
    task::sleep(Duration::from_millis(150)).await;

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 1);
    assert_eq!(sink.to_apn(APN_GW).len(), 2);
    Ok(())
}

#[async_std::test]
async fn long_idle_does_not_bank_tokens_beyond_capacity() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(100 * KB, KB, 100 * KB, KB));

    task::sleep(Duration::from_millis(200)).await;

    // 20 KB of refill time has passed, but the bucket holds only 1 KB.
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 3);
    assert_eq!(sink.to_apn(APN_GW).len(), 1);
    Ok(())
}

#[async_std::test]
async fn set_rate_limits_resets_the_buckets() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    let config = limits(KB, KB, KB, KB);
    pgw.data_plane().set_rate_limits(session.cp_teid(), &config);

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 2);
    assert_eq!(sink.to_apn(APN_GW).len(), 1);

    // Setting the limits again gives a fresh, full bucket.
    pgw.data_plane().set_rate_limits(session.cp_teid(), &config);
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 2);
    assert_eq!(sink.to_apn(APN_GW).len(), 2);
    Ok(())
}

#[async_std::test]
async fn rate_limits_for_unknown_pdn_are_ignored() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    let unknown = CpTeid(session.cp_teid().0.wrapping_add(1));
    pgw.data_plane().set_rate_limits(unknown, &limits(1, 1, 1, 1));
    pgw.data_plane().delete_rate_limits(unknown);

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 1024, 3);
    assert_eq!(sink.to_apn(APN_GW).len(), 3);
    Ok(())
}

#[async_std::test]
async fn delete_rate_limits() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB, KB, KB, KB));

    // A 2 KB packet never fits in a 1 KB bucket.
    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 2048, 1);
    assert_eq!(sink.to_apn(APN_GW).len(), 0);

    pgw.data_plane().delete_rate_limits(session.cp_teid());

    send_uplink(pgw.data_plane(), session.default_bearer.dp_teid, 2048, 5);
    send_downlink(pgw.data_plane(), session.ue_ip_addr(), 2048, 5);
    assert_eq!(sink.to_apn(APN_GW).len(), 5);
    assert_eq!(sink.to_sgw(SGW_ADDR, SGW_DEFAULT_BEARER_TEID).len(), 5);
    Ok(())
}

#[async_std::test]
async fn multiple_pdns_independent_limits() -> anyhow::Result<()> {
    let (pgw, sink, _logger) = init();
    let slow = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    let fast = establish_session(pgw.control_plane(), CpTeid(101))?;

    pgw.data_plane()
        .set_rate_limits(slow.cp_teid(), &limits(KB, KB, KB, KB));
    pgw.data_plane().set_rate_limits(
        fast.cp_teid(),
        &limits(100 * KB, 10 * KB, 100 * KB, 10 * KB),
    );

    for _ in 0..5 {
        send_uplink(pgw.data_plane(), slow.default_bearer.dp_teid, 1024, 1);
        send_uplink(pgw.data_plane(), fast.default_bearer.dp_teid, 1024, 1);
    }

    // The slow PDN gets 1 packet through, the fast one all 5.
    assert_eq!(sink.to_apn(APN_GW).len(), 6);
    assert_eq!(pgw.data_plane().counters().count(UL_DROP_RATE_LIMITED), 4);
    Ok(())
}

#[async_std::test]
async fn rate_limits_go_with_their_pdn() -> anyhow::Result<()> {
    let (pgw, _sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    let other = establish_session(pgw.control_plane(), CpTeid(101))?;
    let config = limits(KB, KB, KB, KB);
    pgw.data_plane().set_rate_limits(session.cp_teid(), &config);
    pgw.data_plane().set_rate_limits(other.cp_teid(), &config);
    assert!(pgw.data_plane().is_uplink_limited(session.cp_teid()));
    assert!(pgw.data_plane().is_downlink_limited(session.ue_ip_addr()));

    pgw.control_plane().delete_pdn_connection(session.cp_teid());

    // Nothing is left behind for a later PDN connection with the same UE address to inherit.
    assert!(!pgw.data_plane().is_uplink_limited(session.cp_teid()));
    assert!(!pgw.data_plane().is_downlink_limited(session.ue_ip_addr()));
    assert!(pgw.data_plane().is_uplink_limited(other.cp_teid()));
    assert!(pgw.data_plane().is_downlink_limited(other.ue_ip_addr()));
    Ok(())
}

#[async_std::test]
async fn delete_rate_limits_clears_both_directions() -> anyhow::Result<()> {
    let (pgw, _sink, _logger) = init();
    let session = establish_session(pgw.control_plane(), SGW_CP_TEID)?;
    pgw.data_plane()
        .set_rate_limits(session.cp_teid(), &limits(KB, KB, KB, KB));

    pgw.data_plane().delete_rate_limits(session.cp_teid());

    assert!(!pgw.data_plane().is_uplink_limited(session.cp_teid()));
    assert!(!pgw.data_plane().is_downlink_limited(session.ue_ip_addr()));
    Ok(())
}
