//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端测试：配置 -> 路由 -> 队列 -> sender（无需真实 broker）

#[cfg(test)]
mod contract_tests {
    use contracts::{OutputTarget, PacketKind, PayloadFormat};

    #[test]
    fn test_contract_defaults() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(PayloadFormat::default(), PayloadFormat::Json);
        assert_eq!(PacketKind::default(), PacketKind::Weather);
        assert_eq!(OutputTarget::Internet.to_string(), "aprs-is");
        assert_eq!(OutputTarget::Kiss.to_string(), "kiss");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BridgeConfig, OutputTarget};
    use dispatcher::{ax25_ui_frame, kiss_encode, Ax25Address, ConfiguredSender};
    use ingestion::{ChannelSource, Clock, RoutePlan, RouterOutcome};
    use supervisor::{build_plans, Supervisor, SupervisorSettings};
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    const WEATHER_SEGMENT: &str = ".../012g...t032r...p...P...h..b.....";

    fn fixed_clock() -> Clock {
        let at: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        Arc::new(move || at)
    }

    fn load(toml: &str) -> BridgeConfig {
        ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap()
    }

    fn plans(config: &BridgeConfig) -> Vec<RoutePlan> {
        build_plans(config)
            .unwrap()
            .into_iter()
            .map(|plan| plan.with_clock(fixed_clock()))
            .collect()
    }

    fn station_config(extra: &str) -> BridgeConfig {
        load(&format!(
            r#"
[aprs]
callsign = "N0CALL"
password = 12345
host = "127.0.0.1"
{extra}

[location]
latitude = 40.0
longitude = -105.0

[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/station1"
target = "is"
[mqtt.topics.fields]
wind_speed = "speed"
temperature_c = "temp"
humidity = "rh"
"#
        ))
    }

    /// Single topic, translated without any transport
    #[test]
    fn test_station_scenario_segment() {
        let config = station_config("");
        let plan = plans(&config).remove(0);

        let packet = plan.translate(br#"{"speed": 12, "temp": 0}"#).unwrap();
        assert_eq!(
            packet.as_str(),
            format!("@070905z4000.00N/10500.00W_{WEATHER_SEGMENT}wM2A")
        );
    }

    #[test]
    fn test_saturated_humidity() {
        let config = station_config("");
        let plan = plans(&config).remove(0);

        let packet = plan.translate(br#"{"rh": 100}"#).unwrap();
        assert!(packet.as_str().contains("h00b"), "{packet}");
    }

    /// Full pipeline into a local APRS-IS server
    #[tokio::test]
    async fn test_e2e_aprs_is_pipeline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            let mut received = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                received.push(line);
            }
            received
        });

        let config = station_config(&format!("port = {port}"));
        let mut supervisor = Supervisor::new(SupervisorSettings::from(&config.pipeline));
        let sender = ConfiguredSender::from_config(OutputTarget::Internet, &config, false).unwrap();
        supervisor.add_output(OutputTarget::Internet, sender).unwrap();

        let (source, handle) = ChannelSource::new("wx/station1");
        supervisor.add_route(plans(&config).remove(0), source).unwrap();

        handle.publish(r#"{"speed": 12, "temp": 0}"#);
        handle.publish("not json");
        handle.publish(r#"{"speed": 3, "temp": 20}"#);
        drop(handle);

        let report = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
            .await
            .unwrap();
        assert!(report.is_clean());
        assert!(report.drained);
        assert_eq!(report.messages_received(), 3);
        assert_eq!(report.messages_dropped(), 1);
        assert_eq!(report.packets_sent(), 2);
        assert_eq!(report.routers[0].counters.dropped_decode, 1);

        let received = server.await.unwrap();
        assert_eq!(received.len(), 3);
        assert!(received[0].starts_with("user N0CALL pass 12345 vers mqtt2aprs"));
        assert_eq!(
            received[1],
            format!("N0CALL>APRS,TCPIP*:@070905z4000.00N/10500.00W_{WEATHER_SEGMENT}wM2A")
        );
        assert!(received[2].contains("_.../003g...t068"), "{}", received[2]);
    }

    /// Two topics feeding the same output
    #[tokio::test]
    async fn test_e2e_shared_queue() {
        let config = load(
            r#"
[aprs]
callsign = "N0CALL"
password = 12345

[location]
latitude = 40.0
longitude = -105.0

[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/north"
target = "is"
[mqtt.topics.fields]
temperature_f = "t"

[[mqtt.topics]]
topic = "wx/south"
target = "is"
[mqtt.topics.fields]
temperature_f = "t"
"#,
        );

        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        let sender = ConfiguredSender::from_config(OutputTarget::Internet, &config, true).unwrap();
        supervisor.add_output(OutputTarget::Internet, sender).unwrap();

        let mut handles = Vec::new();
        for plan in plans(&config) {
            let (source, handle) = ChannelSource::new(plan.topic.clone());
            supervisor.add_route(plan, source).unwrap();
            handles.push(handle);
        }
        for handle in handles {
            handle.publish(r#"{"t": 50}"#);
        }

        let report = supervisor.run().await;
        assert_eq!(report.routers.len(), 2);
        assert!(report
            .routers
            .iter()
            .all(|r| r.outcome == RouterOutcome::Completed && r.counters.published == 1));
        assert_eq!(report.dispatchers.len(), 1);
        assert_eq!(report.dispatchers[0].counters.sent, 2);
        assert!(report.drained);
    }

    /// KISS output to a device file
    #[tokio::test]
    async fn test_e2e_kiss_device() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let config = load(&format!(
            r#"
[aprs]
callsign = "N0CALL"
ssid = 13
password = -1

[kiss]
path = "{}"

[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/rf"
target = "kiss"
[mqtt.topics.fields]
latitude = "pos.lat"
longitude = "pos.lon"
wind_dir = "dir"
"#,
            device.path().display()
        ));

        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        let sender = ConfiguredSender::from_config(OutputTarget::Kiss, &config, false).unwrap();
        supervisor.add_output(OutputTarget::Kiss, sender).unwrap();

        let plan = plans(&config).remove(0);
        let expected_packet = plan
            .translate(br#"{"pos": {"lat": 0.0, "lon": 0.0}, "dir": 90}"#)
            .unwrap();
        let (source, handle) = ChannelSource::new("wx/rf");
        supervisor.add_route(plan, source).unwrap();
        handle.publish(r#"{"pos": {"lat": 0.0, "lon": 0.0}, "dir": 90}"#);
        handle.publish(r#"{"dir": 90}"#);
        drop(handle);

        let report = supervisor.run().await;
        assert!(report.is_clean());
        assert_eq!(report.routers[0].counters.dropped_position, 1);
        assert_eq!(report.packets_sent(), 1);

        let expected = kiss_encode(&ax25_ui_frame(
            &Ax25Address::parse(encoder::TOCALL).unwrap(),
            &Ax25Address::parse("N0CALL-13").unwrap(),
            &[],
            expected_packet.as_bytes(),
        ));
        let written = std::fs::read(device.path()).unwrap();
        assert_eq!(written, expected);
        assert!(expected_packet.as_str().starts_with("@070905z0000.00N/00000.00E_090/"));
    }

    /// Replay file through the supervisor
    #[tokio::test]
    async fn test_e2e_replay() {
        let config = station_config("");
        let messages = ingestion::parse_replay(
            r#"
# recorded session
{"topic": "wx/station1", "payload": {"speed": 12, "temp": 0}}
{"topic": "wx/other", "payload": {"speed": 1}}
{"topic": "wx/station1", "payload": "{\"temp\": \"warm\"}"}
"#,
        )
        .unwrap();
        assert_eq!(messages.len(), 3);

        let plans = plans(&config);
        let mut sources =
            ingestion::replay_sources(messages, plans.iter().map(|p| p.topic.as_str()));

        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        let sender = ConfiguredSender::from_config(OutputTarget::Internet, &config, true).unwrap();
        supervisor.add_output(OutputTarget::Internet, sender).unwrap();
        for plan in plans {
            let source = sources.remove(&plan.topic).unwrap();
            supervisor.add_route(plan, source).unwrap();
        }

        let report = supervisor.run().await;
        assert!(report.is_clean());
        assert_eq!(report.messages_received(), 2);
        assert_eq!(report.routers[0].counters.dropped_extract, 1);
        assert_eq!(report.packets_sent(), 1);
    }

    /// Server down at startup: the output recovers once it comes up
    #[tokio::test]
    async fn test_e2e_server_comes_up_late() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = station_config(&format!("port = {port}"));

        let mut supervisor = Supervisor::new(SupervisorSettings {
            drain_timeout: Duration::from_secs(2),
        });
        let sender = ConfiguredSender::from_config(OutputTarget::Internet, &config, false).unwrap();
        supervisor.add_output(OutputTarget::Internet, sender).unwrap();
        let (source, handle) = ChannelSource::new("wx/station1");
        supervisor.add_route(plans(&config).remove(0), source).unwrap();

        // Startup connect is refused
        let run = tokio::spawn(supervisor.run());
        tokio::time::sleep(Duration::from_millis(100)).await;

        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            let mut received = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                received.push(line);
            }
            received
        });

        handle.publish(r#"{"speed": 12, "temp": 0}"#);
        drop(handle);

        let report = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.routers[0].outcome, RouterOutcome::Completed);
        assert!(!report.dispatchers[0].outcome.is_fault());
        assert_eq!(report.packets_sent(), 1);

        let received = server.await.unwrap();
        assert_eq!(received.len(), 2);
        assert!(received[0].starts_with("user N0CALL pass 12345"));
        assert!(received[1].ends_with(&format!("_{WEATHER_SEGMENT}wM2A")));
    }
}
