//! # Integration Tests
//!
//! End-to-end provisioning scenarios against the mock simulator.
//!
//! Covers:
//! - Built-in rig lifecycle (connect, provision, idle, teardown)
//! - Failure and interrupt at every spawn position
//! - Connection failures
//! - Rig files loaded through `config_loader`

#[cfg(test)]
mod contract_tests {
    use contracts::{RigSpec, SensorKind};

    #[test]
    fn test_builtin_rig_shape() {
        let rig = RigSpec::default_rig();
        assert_eq!(rig.actor_count(), 8);
        assert_eq!(rig.sensors_of_kind(SensorKind::Camera).count(), 5);
        assert_eq!(rig.sensors_of_kind(SensorKind::Lidar).count(), 1);
        assert_eq!(rig.sensors_of_kind(SensorKind::Gnss).count(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use actor_factory::{
        ActorFactory, ActorFactoryError, MockCarlaClient, MockConfig, ProvisionState,
        DESTROYED_LINE,
    };
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RigSpec;
    use std::future::Future;

    type TestFactory = ActorFactory<MockCarlaClient, Vec<u8>>;

    fn factory(config: MockConfig) -> TestFactory {
        ActorFactory::with_output(MockCarlaClient::with_config(config), Vec::new())
    }

    /// Resolves once the mock has spawned `count` actors
    fn after_spawns(factory: &TestFactory, count: usize) -> impl Future<Output = ()> {
        let mut spawned = factory.client().spawned_watch();
        async move {
            let _ = spawned.wait_for(|&n| n >= count).await;
        }
    }

    fn output_lines(factory: &TestFactory) -> Vec<String> {
        String::from_utf8(factory.output().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    const EXPECTED_CREATED: [&str; 8] = [
        "Created vehicle.nissan.patrol",
        "Created sensor.lidar.ray_cast",
        "Created sensor.camera.rgb front_color",
        "Created sensor.camera.rgb front",
        "Created sensor.camera.rgb right",
        "Created sensor.camera.rgb back",
        "Created sensor.camera.rgb left",
        "Created sensor.other.gnss",
    ];

    /// Full lifecycle: every actor created in order, held until the
    /// shutdown signal, then destroyed exactly once.
    #[tokio::test]
    async fn test_e2e_builtin_rig_until_interrupt() {
        let mut factory = factory(MockConfig::default());
        let rig = RigSpec::default_rig();

        // Interrupt arrives once the whole rig exists
        let shutdown = after_spawns(&factory, rig.actor_count());
        let held = factory.run(&rig, shutdown).await.unwrap();

        assert_eq!(held, 8);

        let lines = output_lines(&factory);
        assert_eq!(lines.len(), 9);
        assert_eq!(&lines[..8], EXPECTED_CREATED);
        assert_eq!(lines[8], DESTROYED_LINE);

        let spawned: Vec<_> = factory
            .client()
            .spawn_log()
            .iter()
            .map(|c| c.actor_id)
            .collect();
        let mut destroyed = factory.client().destroy_log();
        assert_eq!(destroyed.len(), 8);
        destroyed.reverse();
        assert_eq!(destroyed, spawned, "teardown must run newest first");

        assert_eq!(factory.client().actor_count(), 0);
        assert_eq!(factory.state(), ProvisionState::TornDown);
    }

    /// A failure at spawn N destroys exactly the N-1 actors before it.
    #[tokio::test]
    async fn test_e2e_failure_at_each_position() {
        let rig = RigSpec::default_rig();

        for n in 1..=rig.actor_count() {
            let mut factory = factory(MockConfig {
                fail_spawn_at: Some(n),
                ..Default::default()
            });

            let err = factory
                .run(&rig, std::future::pending())
                .await
                .unwrap_err();
            assert!(err.is_instantiation(), "n={n}: {err}");

            let lines = output_lines(&factory);
            assert_eq!(lines.len(), n, "n={n}: {lines:?}");
            assert_eq!(&lines[..n - 1], &EXPECTED_CREATED[..n - 1]);
            assert_eq!(lines[n - 1], DESTROYED_LINE);

            let destroyed = factory.client().destroy_log();
            assert_eq!(destroyed.len(), n - 1, "n={n}");
            let unique: std::collections::HashSet<_> = destroyed.iter().collect();
            assert_eq!(unique.len(), n - 1, "n={n}: duplicate destroy");
            assert_eq!(factory.client().actor_count(), 0);
        }
    }

    /// An interrupt after N spawns tears down exactly those N actors.
    #[tokio::test]
    async fn test_e2e_interrupt_at_each_position() {
        let rig = RigSpec::default_rig();

        for n in 1..=rig.actor_count() {
            let mut factory = factory(MockConfig::default());
            let shutdown = after_spawns(&factory, n);

            let created = factory.run(&rig, shutdown).await.unwrap();
            assert_eq!(created, n, "n={n}");

            let lines = output_lines(&factory);
            assert_eq!(lines.len(), n + 1, "n={n}: {lines:?}");
            assert_eq!(&lines[..n], &EXPECTED_CREATED[..n]);
            assert_eq!(lines[n], DESTROYED_LINE);

            assert_eq!(factory.client().spawn_log().len(), n, "n={n}");
            assert_eq!(factory.client().destroy_log().len(), n, "n={n}");
            assert_eq!(factory.client().actor_count(), 0);
            assert_eq!(factory.state(), ProvisionState::TornDown);
        }
    }

    /// Missing lidar blueprint: vehicle created, then torn down.
    #[tokio::test]
    async fn test_e2e_lidar_resolution_failure() {
        let mut factory = factory(MockConfig {
            missing_blueprints: vec!["sensor.lidar.ray_cast".into()],
            ..Default::default()
        });

        let err = factory
            .run(&RigSpec::default_rig(), std::future::pending())
            .await
            .unwrap_err();

        assert!(err.is_resolution(), "{err}");
        assert!(matches!(
            err,
            ActorFactoryError::BlueprintNotFound { ref blueprint } if blueprint == "sensor.lidar.ray_cast"
        ));
        assert_eq!(
            output_lines(&factory),
            vec!["Created vehicle.nissan.patrol", DESTROYED_LINE]
        );
        assert_eq!(factory.client().destroy_log().len(), 1);
    }

    /// Connection timeout: nothing created, nothing destroyed, no output.
    #[tokio::test]
    async fn test_e2e_connection_timeout() {
        let mut factory = factory(MockConfig {
            connect_error: Some("timed out after 2s".into()),
            ..Default::default()
        });

        let err = factory
            .run(&RigSpec::default_rig(), std::future::pending())
            .await
            .unwrap_err();

        assert!(err.is_connection());
        assert!(output_lines(&factory).is_empty());
        assert!(factory.client().spawn_log().is_empty());
        assert!(factory.client().destroy_log().is_empty());
    }

    /// Sensors are attached to the vehicle with their table poses.
    #[tokio::test]
    async fn test_e2e_mount_poses_reach_simulator() {
        let mut factory = factory(MockConfig::default());
        let rig = RigSpec::default_rig();
        let shutdown = after_spawns(&factory, rig.actor_count());
        factory.run(&rig, shutdown).await.unwrap();

        let calls = factory.client().spawn_log();
        let vehicle_id = calls[0].actor_id;
        assert_eq!(calls[0].parent, None);

        for (call, sensor) in calls[1..].iter().zip(&rig.sensors) {
            assert_eq!(call.parent, Some(vehicle_id));
            assert_eq!(call.transform, sensor.transform);
            assert_eq!(call.blueprint, sensor.blueprint);
        }

        let fovs: Vec<_> = calls
            .iter()
            .filter(|c| c.blueprint.id == "sensor.camera.rgb")
            .map(|c| c.blueprint.attribute("fov").unwrap().to_string())
            .collect();
        assert_eq!(fovs, ["52", "129", "129", "129", "129"]);
    }

    /// A rig file drives the same lifecycle.
    #[tokio::test]
    async fn test_e2e_rig_from_file_contents() {
        let content = r#"
[connection]
host = "sim.local"
port = 2000

[vehicle.blueprint]
id = "vehicle.tesla.model3"
[vehicle.spawn_point.location]
x = 12.0
y = -3.0
z = 0.5

[[sensors]]
kind = "camera"
[sensors.blueprint]
id = "sensor.camera.rgb"
[sensors.blueprint.attributes]
role_name = "dash"
[sensors.transform.location]
x = 1.2
z = 1.4
"#;
        let rig = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let mut factory = factory(MockConfig {
            spawn_points: Some(vec![]),
            ..Default::default()
        });

        let shutdown = after_spawns(&factory, 2);
        let held = factory.run(&rig, shutdown).await.unwrap();
        assert_eq!(held, 2);
        assert_eq!(
            output_lines(&factory),
            vec![
                "Created vehicle.tesla.model3",
                "Created sensor.camera.rgb dash",
                DESTROYED_LINE,
            ]
        );
    }
}
