use crate::health::{ConnHealth, HealthSnapshot};
use glacier_core::config::ClusterConfig;
use glacier_core::transport::{HttpTransport, Transport};
use glacier_core::Conn;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

type CheckErrorFn = Box<dyn Fn(&Arc<Conn>) + Send + Sync>;
type ClusterDownFn = Box<dyn Fn() + Send + Sync>;

/// 集群：固定成员集上的健康检查与连接选择
/// 适用于 distributed/分片部署，把请求分散到多个入口主机以提升稳定性
///
/// 成员集在构造时固定；`check` 负责探测并发布可用集，
/// 选择操作读取最近一次发布的可用集，可与探测并发调用
pub struct Cluster {
    members: Vec<Member>,
    // 可用集保存构造顺序下标，读写都只在交换瞬间持锁
    active: RwLock<Vec<usize>>,
    fail_cb: RwLock<Option<CheckErrorFn>>,
    down_cb: RwLock<Option<ClusterDownFn>>,
}

struct Member {
    conn: Arc<Conn>,
    health: ConnHealth,
}

impl Cluster {
    /// 由连接列表创建集群
    /// 首次 `check` 之前没有任何可用连接
    pub fn new(conns: Vec<Arc<Conn>>) -> Self {
        let members = conns
            .into_iter()
            .map(|conn| Member {
                conn,
                health: ConnHealth::new(),
            })
            .collect();
        Self {
            members,
            active: RwLock::new(Vec::new()),
            fail_cb: RwLock::new(None),
            down_cb: RwLock::new(None),
        }
    }

    /// 由配置构造：每个主机一个共享 HttpTransport 的连接
    pub fn from_config(config: &ClusterConfig) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::with_timeout(
            Duration::from_secs(config.timeout_seconds),
        ));
        let conns = config
            .hosts
            .iter()
            .map(|host| {
                let conn = if let Some(user) = &config.user {
                    Conn::with_auth(
                        host,
                        transport.clone(),
                        user,
                        config.password.as_deref().unwrap_or_default(),
                    )
                } else {
                    Conn::new(host, transport.clone())
                };
                Arc::new(conn)
            })
            .collect();
        Self::new(conns)
    }

    /// 注册单个连接探测失败的回调，覆盖之前注册的
    /// 回调在探测循环内同步执行，必须立即返回，否则拖慢整轮检查
    pub fn on_check_error<F>(&self, f: F)
    where
        F: Fn(&Arc<Conn>) + Send + Sync + 'static,
    {
        *self.fail_cb.write() = Some(Box::new(f));
    }

    /// 注册整个集群探测失败的回调，覆盖之前注册的
    pub fn on_cluster_down<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.down_cb.write() = Some(Box::new(f));
    }

    /// 健康检查：按构造顺序探测每个成员恰好一次，然后发布新的可用集
    ///
    /// 单个探测失败不会中断本轮；全部失败时触发 `on_cluster_down`
    /// 并保留上一次发布的可用集，宁可用过期路由也不清空
    pub async fn check(&self) {
        let mut candidates = Vec::with_capacity(self.members.len());

        for (idx, member) in self.members.iter().enumerate() {
            let start = Instant::now();
            let result = member.conn.ping().await;
            let elapsed = start.elapsed();

            match result {
                Ok(()) => {
                    member.health.record_success(elapsed);
                    candidates.push(idx);
                    debug!("ping {} ok in {:?}", member.conn.host(), elapsed);
                }
                Err(err) => {
                    member.health.record_failure();
                    debug!("ping {} failed: {}", member.conn.host(), err);
                    if let Some(cb) = self.fail_cb.read().as_ref() {
                        cb(&member.conn);
                    }
                }
            }
        }

        if candidates.is_empty() {
            warn!(
                "health check failed for all {} connections, keeping previous active set",
                self.members.len()
            );
            if let Some(cb) = self.down_cb.read().as_ref() {
                cb();
            }
            return;
        }

        debug!(
            "health check done, {}/{} connections active",
            candidates.len(),
            self.members.len()
        );
        *self.active.write() = candidates;
    }

    /// 是否没有任何可用连接
    pub fn is_down(&self) -> bool {
        self.active.read().is_empty()
    }

    /// 随机返回一个可用连接，每次调用独立随机
    pub fn active_conn(&self) -> Option<Arc<Conn>> {
        let active = self.active.read();
        if active.is_empty() {
            return None;
        }
        let mut rng = rand::rng();
        let idx = active[rng.random_range(0..active.len())];
        Some(self.members[idx].conn.clone())
    }

    /// 返回平均延迟最低的可用连接
    /// 严格小于才替换，相同均值取最先构造的
    pub fn best_conn(&self) -> Option<Arc<Conn>> {
        let active = self.active.read();
        let (first, rest) = active.split_first()?;

        let mut best_idx = *first;
        let mut best_mean = self.members[best_idx].health.mean();
        for &idx in rest {
            let mean = self.members[idx].health.mean();
            if mean < best_mean {
                best_idx = idx;
                best_mean = mean;
            }
        }
        Some(self.members[best_idx].conn.clone())
    }

    /// 每个成员的当前平均延迟，按构造顺序，包含不可用连接
    /// 便于观察某个连接为何被排除
    pub fn rank_conn(&self) -> Vec<(Arc<Conn>, Duration)> {
        self.members
            .iter()
            .map(|member| (member.conn.clone(), member.health.mean()))
            .collect()
    }

    /// 每个成员的完整健康快照，按构造顺序
    pub fn health_snapshots(&self) -> Vec<(Arc<Conn>, HealthSnapshot)> {
        self.members
            .iter()
            .map(|member| (member.conn.clone(), member.health.snapshot()))
            .collect()
    }
}

#[cfg(test)]
impl Cluster {
    pub(crate) fn force_active(&self, idxs: Vec<usize>) {
        *self.active.write() = idxs;
    }

    pub(crate) fn health_of(&self, idx: usize) -> &ConnHealth {
        &self.members[idx].health
    }
}
