//! ActorFactory 核心实现
//!
//! 按 `RigSpec` spawn 车辆和传感器，保持到 shutdown，然后全部销毁。

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;

use contracts::{
    ActorBlueprint, ActorId, ActorKind, ActorRecord, ConnectionConfig, ProvisionState, RigSpec,
    SensorDefinition, Transform, VehicleDefinition,
};
use observability::LifecycleStats;
use tracing::{debug, error, info, instrument, warn};

use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};
use crate::registry::ActorRegistry;

/// teardown 完成后输出的行
pub const DESTROYED_LINE: &str = "Destroyed actors";

/// Actor Factory
///
/// 负责 spawn 一辆车及其传感器，并在退出时销毁。
/// `Created ...` / `Destroyed actors` 写入 `out`（默认 stdout），
/// 诊断信息走 `tracing`。
pub struct ActorFactory<C: CarlaClient, W: Write = io::Stdout> {
    client: C,
    out: W,
    state: ProvisionState,
    stats: LifecycleStats,
}

impl<C: CarlaClient> ActorFactory<C> {
    pub fn new(client: C) -> Self {
        Self::with_output(client, io::stdout())
    }
}

impl<C: CarlaClient, W: Write> ActorFactory<C, W> {
    /// 创建输出到 `out` 的 ActorFactory
    pub fn with_output(client: C, out: W) -> Self {
        Self {
            client,
            out,
            state: ProvisionState::Disconnected,
            stats: LifecycleStats::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn state(&self) -> ProvisionState {
        self.state
    }

    pub fn stats(&self) -> &LifecycleStats {
        &self.stats
    }

    /// 连接、spawn、等待 `shutdown`、teardown
    ///
    /// 从一开始就监听 `shutdown`：连接或 spawn 期间触发时，当前调用完成后
    /// 停止 spawn，并销毁已创建的 actors。
    ///
    /// # 错误
    /// - 连接失败：直接返回，此时没有任何 actor
    /// - 之后的失败：先 teardown 已创建的 actors，再返回错误
    ///
    /// 返回已创建的 actor 数量。
    #[instrument(
        name = "actor_factory_run",
        skip(self, rig, shutdown),
        fields(host = %rig.connection.host, port = rig.connection.port)
    )]
    pub async fn run<F>(&mut self, rig: &RigSpec, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = ShutdownWatch::new(shutdown);
        if shutdown.requested().await {
            info!("shutdown requested before connecting");
            return Ok(0);
        }

        self.connect(&rig.connection).await?;

        let mut registry = ActorRegistry::new();
        let outcome = self.provision_until(rig, &mut registry, &mut shutdown).await;
        let created = registry.len();

        if let Ok(Provisioning::Complete) = outcome {
            self.idle(&mut shutdown).await;
        }
        self.teardown(registry).await;

        outcome.map(|_| created)
    }

    #[instrument(
        name = "actor_factory_connect",
        skip(self, connection),
        fields(host = %connection.host, port = connection.port)
    )]
    pub async fn connect(&mut self, connection: &ConnectionConfig) -> Result<()> {
        info!(timeout = ?connection.timeout(), "connecting to CARLA server");
        self.client.connect(connection).await?;
        self.transition(ProvisionState::Connected);
        Ok(())
    }

    /// 先 spawn 车辆，再按 rig 顺序 spawn 挂载在车上的传感器
    ///
    /// 每个 actor 创建后立即登记，出错时 `registry` 恰好包含失败前
    /// 创建的 actors。
    pub async fn provision(&mut self, rig: &RigSpec, registry: &mut ActorRegistry) -> Result<()> {
        let mut never = ShutdownWatch::new(std::future::pending::<()>());
        self.provision_until(rig, registry, &mut never)
            .await
            .map(|_| ())
    }

    /// 等待 shutdown
    async fn idle<F>(&mut self, shutdown: &mut ShutdownWatch<F>)
    where
        F: Future<Output = ()>,
    {
        self.transition(ProvisionState::Idling);
        info!("rig ready, waiting for shutdown signal");
        shutdown.wait().await;
        info!("shutdown requested");
    }

    /// 按创建的逆序销毁所有已登记的 actors
    ///
    /// 消耗 registry，同一 handle 不会被销毁两次。
    /// 单个销毁失败只记录日志，继续销毁剩余 actors。
    #[instrument(
        name = "actor_factory_teardown",
        skip(self, registry),
        fields(actor_count = registry.len())
    )]
    pub async fn teardown(&mut self, mut registry: ActorRegistry) {
        info!("starting teardown");

        for record in registry.drain_newest_first() {
            self.destroy_actor_safe(&record).await;
        }

        self.report(DESTROYED_LINE);
        self.transition(ProvisionState::TornDown);
        info!(stats = %self.stats, "teardown completed");
    }

    #[instrument(
        name = "actor_factory_provision",
        skip(self, rig, registry, shutdown),
        fields(vehicle = %rig.vehicle.blueprint.id, sensor_count = rig.sensors.len())
    )]
    async fn provision_until<F>(
        &mut self,
        rig: &RigSpec,
        registry: &mut ActorRegistry,
        shutdown: &mut ShutdownWatch<F>,
    ) -> Result<Provisioning>
    where
        F: Future<Output = ()>,
    {
        let vehicle_id = self.spawn_vehicle(&rig.vehicle, registry).await?;
        self.transition(ProvisionState::VehicleSpawned);

        for sensor in &rig.sensors {
            if shutdown.requested().await {
                warn!(created = registry.len(), "shutdown requested during provisioning");
                return Ok(Provisioning::Interrupted);
            }
            self.spawn_sensor(vehicle_id, sensor, registry).await?;
        }
        self.transition(ProvisionState::SensorsSpawned);

        if shutdown.requested().await {
            warn!(created = registry.len(), "shutdown requested during provisioning");
            return Ok(Provisioning::Interrupted);
        }

        info!(actors = registry.len(), "rig provisioned");
        Ok(Provisioning::Complete)
    }

    async fn spawn_vehicle(
        &mut self,
        vehicle: &VehicleDefinition,
        registry: &mut ActorRegistry,
    ) -> Result<ActorId> {
        let transform = match vehicle.spawn_point {
            Some(transform) => transform,
            None => self.first_spawn_point(&vehicle.blueprint.id).await?,
        };

        self.spawn_and_register(
            ActorKind::Vehicle,
            &vehicle.blueprint,
            transform,
            None,
            registry,
        )
        .await
    }

    async fn spawn_sensor(
        &mut self,
        vehicle_id: ActorId,
        sensor: &SensorDefinition,
        registry: &mut ActorRegistry,
    ) -> Result<ActorId> {
        self.spawn_and_register(
            ActorKind::Sensor(sensor.kind),
            &sensor.blueprint,
            sensor.transform,
            Some(vehicle_id),
            registry,
        )
        .await
    }

    /// 当前地图的第一个预定义 spawn point
    async fn first_spawn_point(&self, blueprint: &str) -> Result<Transform> {
        let points = self.client.spawn_points().await?;
        let point = points
            .first()
            .copied()
            .ok_or_else(|| ActorFactoryError::NoSpawnPoints {
                blueprint: blueprint.to_string(),
            })?;
        debug!(available = points.len(), location = ?point.location, "using first spawn point");
        Ok(point)
    }

    #[instrument(
        name = "actor_factory_spawn_actor",
        skip(self, blueprint, transform, registry),
        fields(kind = kind.as_str(), blueprint = %blueprint.id, role = ?blueprint.role_name())
    )]
    async fn spawn_and_register(
        &mut self,
        kind: ActorKind,
        blueprint: &ActorBlueprint,
        transform: Transform,
        parent: Option<ActorId>,
        registry: &mut ActorRegistry,
    ) -> Result<ActorId> {
        let spawned = match self.client.spawn_actor(blueprint, transform, parent).await {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!(error = %e, created = registry.len(), "spawn failed");
                self.stats.on_spawn_failure(kind);
                return Err(e);
            }
        };

        let record = ActorRecord {
            actor_id: spawned.actor_id,
            type_id: spawned.type_id,
            kind,
            role_name: blueprint.role_name().map(str::to_string),
        };
        let line = record.created_line();
        let actor_id = record.actor_id;

        registry.register(record);
        self.stats.on_spawned(kind);
        info!(actor_id, "actor spawned");
        self.report(&line);

        Ok(actor_id)
    }

    /// 销毁单个 actor（错误只记录，不返回）
    async fn destroy_actor_safe(&mut self, record: &ActorRecord) {
        debug!(actor = %record, "destroying actor");

        match self.client.destroy_actor(record.actor_id).await {
            Ok(()) => self.stats.on_destroyed(true),
            Err(e) => {
                error!(actor = %record, error = %e, "failed to destroy actor");
                self.stats.on_destroyed(false);
            }
        }
    }

    fn report(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!(error = %e, line, "failed to write report line");
        }
    }

    fn transition(&mut self, next: ProvisionState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}

/// spawn 阶段未出错时的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provisioning {
    Complete,
    Interrupted,
}

/// 可非阻塞检查的 shutdown future
///
/// resolve 之后不再 poll。
struct ShutdownWatch<F> {
    signal: Pin<Box<F>>,
    fired: bool,
}

impl<F: Future<Output = ()>> ShutdownWatch<F> {
    fn new(signal: F) -> Self {
        Self {
            signal: Box::pin(signal),
            fired: false,
        }
    }

    /// shutdown 是否已触发（不等待）
    async fn requested(&mut self) -> bool {
        if !self.fired {
            self.fired = tokio::select! {
                biased;
                _ = self.signal.as_mut() => true,
                _ = std::future::ready(()) => false,
            };
        }
        self.fired
    }

    async fn wait(&mut self) {
        if !self.fired {
            self.signal.as_mut().await;
            self.fired = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::{MockCarlaClient, MockConfig};

    fn factory(config: MockConfig) -> ActorFactory<MockCarlaClient, Vec<u8>> {
        ActorFactory::with_output(MockCarlaClient::with_config(config), Vec::new())
    }

    /// Resolves once the mock has spawned `count` actors
    fn after_spawns(
        factory: &ActorFactory<MockCarlaClient, Vec<u8>>,
        count: usize,
    ) -> impl Future<Output = ()> {
        let mut spawned = factory.client().spawned_watch();
        async move {
            let _ = spawned.wait_for(|&n| n >= count).await;
        }
    }

    fn lines<C: CarlaClient>(factory: &ActorFactory<C, Vec<u8>>) -> Vec<String> {
        String::from_utf8(factory.output().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_provision_success() {
        let mut factory = factory(MockConfig::default());
        let rig = RigSpec::default_rig();
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        factory.provision(&rig, &mut registry).await.unwrap();

        assert_eq!(registry.len(), 8);
        assert_eq!(factory.state(), ProvisionState::SensorsSpawned);
        assert_eq!(factory.client().actor_count(), 8);
        assert!(factory.client().destroy_log().is_empty());

        let vehicle_id = registry.vehicle().unwrap().actor_id;
        for call in &factory.client().spawn_log()[1..] {
            assert_eq!(call.parent, Some(vehicle_id));
        }

        factory.teardown(registry).await;
        assert_eq!(factory.client().actor_count(), 0);
    }

    #[tokio::test]
    async fn test_vehicle_uses_first_spawn_point() {
        let first = Transform::at(10.0, 20.0, 0.5).with_yaw(90.0);
        let mut factory = factory(MockConfig {
            spawn_points: Some(vec![first, Transform::at(-5.0, 0.0, 0.5)]),
            ..Default::default()
        });
        let rig = RigSpec::default_rig();
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        factory.provision(&rig, &mut registry).await.unwrap();

        let vehicle_call = &factory.client().spawn_log()[0];
        assert_eq!(vehicle_call.transform, first);
        assert_eq!(vehicle_call.parent, None);
        assert_eq!(vehicle_call.blueprint.role_name(), Some("hero"));

        factory.teardown(registry).await;
    }

    #[tokio::test]
    async fn test_explicit_spawn_point_skips_map_lookup() {
        let mut factory = factory(MockConfig {
            spawn_points: Some(vec![]),
            ..Default::default()
        });
        let mut rig = RigSpec::default_rig();
        let pose = Transform::at(1.0, 2.0, 0.3);
        rig.vehicle.spawn_point = Some(pose);
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        factory.provision(&rig, &mut registry).await.unwrap();
        assert_eq!(factory.client().spawn_log()[0].transform, pose);

        factory.teardown(registry).await;
    }

    #[tokio::test]
    async fn test_no_spawn_points() {
        let mut factory = factory(MockConfig {
            spawn_points: Some(vec![]),
            ..Default::default()
        });
        let rig = RigSpec::default_rig();
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        let err = factory.provision(&rig, &mut registry).await.unwrap_err();
        assert!(matches!(err, ActorFactoryError::NoSpawnPoints { .. }));
        assert!(registry.is_empty());

        factory.teardown(registry).await;
        assert_eq!(lines(&factory), vec![DESTROYED_LINE]);
    }

    #[tokio::test]
    async fn test_sensor_failure_keeps_prior_actors_registered() {
        // vehicle, lidar, then front_color camera fails
        let mut factory = factory(MockConfig {
            fail_spawn_at: Some(3),
            ..Default::default()
        });
        let rig = RigSpec::default_rig();
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        let err = factory.provision(&rig, &mut registry).await.unwrap_err();
        assert!(err.is_instantiation());
        assert_eq!(registry.len(), 2);
        assert_eq!(factory.stats().spawn_failures, 1);

        let created = registry.actor_ids();
        factory.teardown(registry).await;

        let mut destroyed = factory.client().destroy_log();
        assert_eq!(destroyed.len(), 2);
        destroyed.reverse();
        assert_eq!(destroyed, created);
        assert_eq!(factory.state(), ProvisionState::TornDown);
    }

    #[tokio::test]
    async fn test_teardown_continues_after_destroy_failure() {
        let mut factory = factory(MockConfig {
            // actor ids start at 1000; 1001 is the lidar
            fail_destroy: vec![1001],
            ..Default::default()
        });
        let rig = RigSpec::default_rig();
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        factory.provision(&rig, &mut registry).await.unwrap();
        factory.teardown(registry).await;

        assert_eq!(factory.client().destroy_log().len(), 8);
        assert_eq!(factory.stats().destroy_failures, 1);
        assert_eq!(factory.stats().destroyed, 7);
        assert_eq!(lines(&factory).last().map(String::as_str), Some(DESTROYED_LINE));
    }

    #[tokio::test]
    async fn test_run_connection_failure_creates_nothing() {
        let mut factory = factory(MockConfig {
            connect_error: Some("timed out after 2s".into()),
            ..Default::default()
        });

        let err = factory
            .run(&RigSpec::default_rig(), std::future::pending())
            .await
            .unwrap_err();

        assert!(err.is_connection());
        assert!(lines(&factory).is_empty());
        assert!(factory.client().destroy_log().is_empty());
        assert_eq!(factory.state(), ProvisionState::Disconnected);
    }

    #[tokio::test]
    async fn test_run_idles_until_shutdown() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut factory = factory(MockConfig::default());

        let rig = RigSpec::default_rig();
        let held = {
            let shutdown = async move {
                let _ = rx.await;
            };
            let run = factory.run(&rig, shutdown);
            tokio::pin!(run);

            // Nothing resolves the shutdown yet, so the run must still be pending.
            tokio::select! {
                biased;
                _ = &mut run => panic!("run returned before shutdown"),
                _ = tokio::task::yield_now() => {}
            }
            tx.send(()).unwrap();
            run.await.unwrap()
        };
        assert_eq!(held, 8);

        assert_eq!(factory.client().actor_count(), 0);
        assert_eq!(factory.state(), ProvisionState::TornDown);
    }

    #[tokio::test]
    async fn test_run_interrupted_during_provisioning() {
        let mut factory = factory(MockConfig::default());
        let rig = RigSpec::default_rig();

        // vehicle, lidar, front_color exist when the interrupt lands
        let shutdown = after_spawns(&factory, 3);
        let created = factory.run(&rig, shutdown).await.unwrap();
        assert_eq!(created, 3);

        let spawned: Vec<_> = factory
            .client()
            .spawn_log()
            .iter()
            .map(|c| c.actor_id)
            .collect();
        assert_eq!(spawned.len(), 3);

        let mut destroyed = factory.client().destroy_log();
        destroyed.reverse();
        assert_eq!(destroyed, spawned);
        assert_eq!(factory.client().actor_count(), 0);

        assert_eq!(
            lines(&factory),
            vec![
                "Created vehicle.nissan.patrol",
                "Created sensor.lidar.ray_cast",
                "Created sensor.camera.rgb front_color",
                DESTROYED_LINE,
            ]
        );
        assert_eq!(factory.state(), ProvisionState::TornDown);
    }

    #[tokio::test]
    async fn test_created_line_uses_reported_type_id() {
        let mut factory = factory(MockConfig {
            reported_type_ids: vec![(
                "vehicle.nissan.patrol".into(),
                "vehicle.nissan.patrol_2021".into(),
            )],
            ..Default::default()
        });
        let rig = RigSpec::default_rig();
        factory.connect(&rig.connection).await.unwrap();

        let mut registry = ActorRegistry::new();
        factory.provision(&rig, &mut registry).await.unwrap();
        assert_eq!(registry.vehicle().unwrap().type_id, "vehicle.nissan.patrol_2021");
        factory.teardown(registry).await;

        assert_eq!(lines(&factory)[0], "Created vehicle.nissan.patrol_2021");
    }

    #[tokio::test]
    async fn test_run_shutdown_before_connect() {
        let mut factory = factory(MockConfig::default());

        let created = factory
            .run(&RigSpec::default_rig(), async {})
            .await
            .unwrap();

        assert_eq!(created, 0);
        assert!(!factory.client().is_connected());
        assert!(factory.client().spawn_log().is_empty());
        assert!(lines(&factory).is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_watch_does_not_block() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut watch = ShutdownWatch::new(async move {
            let _ = rx.await;
        });

        assert!(!watch.requested().await);
        tx.send(()).unwrap();
        assert!(watch.requested().await);
        // Resolved futures are not polled again
        assert!(watch.requested().await);
        watch.wait().await;
    }
}
