//! Mock CARLA 客户端
//!
//! 用于测试的内存模拟器，通过 `MockConfig` 注入失败场景
//! （连接失败、blueprint 缺失、spawn 被拒、destroy 失败），
//! 并记录每次 spawn/destroy 调用。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use contracts::{ActorBlueprint, ActorId, ConnectionConfig, Transform};
use tokio::sync::watch;
use tracing::instrument;

use crate::client::{CarlaClient, SpawnedActor};
use crate::error::{ActorFactoryError, Result};

/// mock catalog 中的 blueprints
pub const MOCK_BLUEPRINTS: &[&str] = &[
    "vehicle.nissan.patrol",
    "vehicle.tesla.model3",
    "sensor.camera.rgb",
    "sensor.lidar.ray_cast",
    "sensor.other.gnss",
];

/// Mock 客户端配置
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// `connect` 以此消息失败
    pub connect_error: Option<String>,
    /// 从 catalog 中移除的 blueprints
    pub missing_blueprints: Vec<String>,
    /// 第 N 次 spawn 尝试失败（从 1 开始）
    pub fail_spawn_at: Option<usize>,
    /// 应该失败的 destroy actor IDs
    pub fail_destroy: Vec<ActorId>,
    /// 地图 spawn points，None 时只有原点一个
    pub spawn_points: Option<Vec<Transform>>,
    /// (blueprint, type id)：服务器返回的 type id 与 blueprint id 不同时使用
    pub reported_type_ids: Vec<(String, String)>,
}

/// 一次 spawn 调用记录
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnCall {
    pub actor_id: ActorId,
    pub blueprint: ActorBlueprint,
    pub transform: Transform,
    pub parent: Option<ActorId>,
}

/// Mock CARLA 客户端
pub struct MockCarlaClient {
    config: MockConfig,
    /// Actor ID 计数器
    next_actor_id: AtomicU32,
    /// spawn 尝试次数（含失败）
    spawn_attempts: AtomicUsize,
    /// 存活的 actors (actor_id -> blueprint)
    actors: Mutex<HashMap<ActorId, String>>,
    connected: Mutex<bool>,
    spawn_log: Mutex<Vec<SpawnCall>>,
    /// 所有 destroy 调用，按调用顺序，含重复
    destroy_log: Mutex<Vec<ActorId>>,
    /// 成功 spawn 计数，供测试在 spawn 过程中触发事件
    spawned: watch::Sender<usize>,
}

impl MockCarlaClient {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            next_actor_id: AtomicU32::new(1000), // 从 1000 开始，便于识别
            spawn_attempts: AtomicUsize::new(0),
            actors: Mutex::new(HashMap::new()),
            connected: Mutex::new(false),
            spawn_log: Mutex::new(Vec::new()),
            destroy_log: Mutex::new(Vec::new()),
            spawned: watch::Sender::new(0),
        }
    }

    /// 获取存活 actor 数量
    pub fn actor_count(&self) -> usize {
        self.actors.lock().unwrap().len()
    }

    pub fn actor_exists(&self, actor_id: ActorId) -> bool {
        self.actors.lock().unwrap().contains_key(&actor_id)
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    /// 按顺序的成功 spawn 记录
    pub fn spawn_log(&self) -> Vec<SpawnCall> {
        self.spawn_log.lock().unwrap().clone()
    }

    /// 订阅成功 spawn 计数
    pub fn spawned_watch(&self) -> watch::Receiver<usize> {
        self.spawned.subscribe()
    }

    /// 按顺序的 destroy 调用
    pub fn destroy_log(&self) -> Vec<ActorId> {
        self.destroy_log.lock().unwrap().clone()
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ActorFactoryError::NotConnected)
        }
    }

    fn in_catalog(&self, blueprint: &str) -> bool {
        MOCK_BLUEPRINTS.contains(&blueprint)
            && !self.config.missing_blueprints.iter().any(|b| b == blueprint)
    }
}

impl Default for MockCarlaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CarlaClient for MockCarlaClient {
    #[instrument(
        name = "mock_carla_connect",
        skip(self, connection),
        fields(host = %connection.host, port = connection.port)
    )]
    async fn connect(&mut self, connection: &ConnectionConfig) -> Result<()> {
        if let Some(message) = &self.config.connect_error {
            return Err(ActorFactoryError::connection(
                &connection.host,
                connection.port,
                message.clone(),
            ));
        }
        *self.connected.lock().unwrap() = true;
        Ok(())
    }

    #[instrument(name = "mock_carla_spawn_points", skip(self))]
    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.ensure_connected()?;
        Ok(self
            .config
            .spawn_points
            .clone()
            .unwrap_or_else(|| vec![Transform::default()]))
    }

    #[instrument(
        name = "mock_carla_spawn_actor",
        skip(self, blueprint, transform),
        fields(blueprint = %blueprint.id)
    )]
    async fn spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: Transform,
        parent: Option<ActorId>,
    ) -> Result<SpawnedActor> {
        self.ensure_connected()?;

        let attempt = self.spawn_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.in_catalog(&blueprint.id) {
            return Err(ActorFactoryError::BlueprintNotFound {
                blueprint: blueprint.id.clone(),
            });
        }

        if let Some(parent_id) = parent {
            if !self.actor_exists(parent_id) {
                return Err(ActorFactoryError::spawn(
                    &blueprint.id,
                    format!("parent actor {parent_id} not found"),
                ));
            }
        }

        if self.config.fail_spawn_at == Some(attempt) {
            return Err(ActorFactoryError::spawn(&blueprint.id, "mock failure"));
        }

        let actor_id = self.allocate_actor_id();
        self.actors
            .lock()
            .unwrap()
            .insert(actor_id, blueprint.id.clone());
        self.spawn_log.lock().unwrap().push(SpawnCall {
            actor_id,
            blueprint: blueprint.clone(),
            transform,
            parent,
        });
        self.spawned.send_modify(|count| *count += 1);

        let type_id = self
            .config
            .reported_type_ids
            .iter()
            .find(|(requested, _)| *requested == blueprint.id)
            .map_or_else(|| blueprint.id.clone(), |(_, reported)| reported.clone());

        Ok(SpawnedActor { actor_id, type_id })
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        self.destroy_log.lock().unwrap().push(actor_id);

        if self.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // 幂等：即使不存在也返回 Ok
        self.actors.lock().unwrap().remove(&actor_id);
        Ok(())
    }
}
