use crate::Cluster;
use async_trait::async_trait;
use glacier_core::{Conn, Query, Result, Transport};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const BAD_RESPONSE: &str = "Code: 9999, Error: ...";

struct MockTransport {
    response: RwLock<String>,
}

impl MockTransport {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: RwLock::new(response.to_string()),
        })
    }

    fn set_response(&self, response: &str) {
        *self.response.write() = response.to_string();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exec(&self, _conn: &Conn, _query: &Query, _read_only: bool) -> Result<String> {
        Ok(self.response.read().clone())
    }
}

fn active_host(conn: &Option<Arc<Conn>>) -> &str {
    conn.as_ref().map(|c| c.host()).unwrap_or("")
}

#[tokio::test]
async fn test_partial_cluster() {
    let bad = MockTransport::new(BAD_RESPONSE);
    let good = MockTransport::new("1");

    let conn1 = Arc::new(Conn::new("host1", bad));
    let conn2 = Arc::new(Conn::new("host2", good));

    let cluster = Cluster::new(vec![conn1, conn2.clone()]);

    assert!(cluster.is_down());
    assert!(cluster.active_conn().is_none());
    assert!(cluster.best_conn().is_none());

    let failed = Arc::new(Mutex::new(Vec::new()));
    let failed_in_cb = failed.clone();
    cluster.on_check_error(move |conn| failed_in_cb.lock().push(conn.host().to_string()));

    cluster.check().await;

    assert!(!cluster.is_down());
    assert_eq!(active_host(&cluster.active_conn()), "http://host2/");
    let selected = cluster.active_conn().unwrap();
    assert!(Arc::ptr_eq(&selected, &conn2));
    assert_eq!(failed.lock().as_slice(), &["http://host1/".to_string()]);
}

#[tokio::test]
async fn test_failed_cluster() {
    let bad = MockTransport::new(BAD_RESPONSE);

    let conn1 = Arc::new(Conn::new("host1", bad.clone()));
    let conn2 = Arc::new(Conn::new("host2", bad));

    let cluster = Cluster::new(vec![conn1, conn2]);

    let down_count = Arc::new(AtomicUsize::new(0));
    let down_in_cb = down_count.clone();
    cluster.on_cluster_down(move || {
        down_in_cb.fetch_add(1, Ordering::SeqCst);
    });

    cluster.check().await;

    assert_eq!(down_count.load(Ordering::SeqCst), 1);
    assert!(cluster.is_down());
    assert!(cluster.active_conn().is_none());
}

#[tokio::test]
async fn test_total_outage_keeps_previous_active_set() {
    let tr1 = MockTransport::new("1");
    let tr2 = MockTransport::new("1");

    let conn1 = Arc::new(Conn::new("host1", tr1.clone()));
    let conn2 = Arc::new(Conn::new("host2", tr2.clone()));

    let cluster = Cluster::new(vec![conn1, conn2]);
    cluster.check().await;
    assert!(!cluster.is_down());

    let down_count = Arc::new(AtomicUsize::new(0));
    let down_in_cb = down_count.clone();
    cluster.on_cluster_down(move || {
        down_in_cb.fetch_add(1, Ordering::SeqCst);
    });

    tr1.set_response(BAD_RESPONSE);
    tr2.set_response(BAD_RESPONSE);
    cluster.check().await;

    // 全部失败的一轮不清空路由，上一轮的可用集继续生效
    assert_eq!(down_count.load(Ordering::SeqCst), 1);
    assert!(!cluster.is_down());
    assert!(cluster.active_conn().is_some());
    assert!(cluster.best_conn().is_some());

    // 错误仍然被记录
    for (_, snapshot) in cluster.health_snapshots() {
        assert_eq!(snapshot.error_count, 1);
    }
}

#[tokio::test]
async fn test_active_conn_is_roughly_uniform() {
    let conns: Vec<_> = (0..3)
        .map(|i| Arc::new(Conn::new(format!("host{}", i), MockTransport::new("1"))))
        .collect();

    let cluster = Cluster::new(conns);
    cluster.check().await;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..300 {
        let conn = cluster.active_conn().unwrap();
        *counts.entry(conn.host().to_string()).or_insert(0) += 1;
    }

    assert_eq!(counts.len(), 3);
    for (_, count) in counts {
        assert!(count >= 50);
    }
}

#[test]
fn test_best_conn_prefers_lowest_mean() {
    let conns: Vec<_> = (0..3)
        .map(|i| Arc::new(Conn::new(format!("host{}", i), MockTransport::new("1"))))
        .collect();
    let cluster = Cluster::new(conns.clone());

    cluster.health_of(0).record_success(Duration::from_millis(10));
    cluster.health_of(1).record_success(Duration::from_millis(4));
    cluster.health_of(2).record_success(Duration::from_millis(20));
    cluster.force_active(vec![0, 1, 2]);

    let best = cluster.best_conn().unwrap();
    assert!(Arc::ptr_eq(&best, &conns[1]));
}

#[test]
fn test_best_conn_tie_keeps_earliest() {
    let conns: Vec<_> = (0..3)
        .map(|i| Arc::new(Conn::new(format!("host{}", i), MockTransport::new("1"))))
        .collect();
    let cluster = Cluster::new(conns.clone());

    cluster.health_of(0).record_success(Duration::from_millis(10));
    cluster.health_of(1).record_success(Duration::from_millis(10));
    cluster.health_of(2).record_success(Duration::from_millis(10));
    cluster.force_active(vec![0, 1, 2]);

    let best = cluster.best_conn().unwrap();
    assert!(Arc::ptr_eq(&best, &conns[0]));
}

#[test]
fn test_best_conn_single_member() {
    let conns: Vec<_> = (0..3)
        .map(|i| Arc::new(Conn::new(format!("host{}", i), MockTransport::new("1"))))
        .collect();
    let cluster = Cluster::new(conns.clone());

    cluster.force_active(vec![2]);
    let best = cluster.best_conn().unwrap();
    assert!(Arc::ptr_eq(&best, &conns[2]));
}

#[tokio::test]
async fn test_rank_conn_covers_all_members() {
    let bad = MockTransport::new(BAD_RESPONSE);
    let good = MockTransport::new("1");

    let conn1 = Arc::new(Conn::new("host1", bad));
    let conn2 = Arc::new(Conn::new("host2", good));

    let cluster = Cluster::new(vec![conn1.clone(), conn2.clone()]);
    cluster.check().await;

    let ranks = cluster.rank_conn();
    assert_eq!(ranks.len(), 2);
    // 构造顺序，与可用与否无关
    assert!(Arc::ptr_eq(&ranks[0].0, &conn1));
    assert!(Arc::ptr_eq(&ranks[1].0, &conn2));
    // 从未成功的连接均值为零
    assert_eq!(ranks[0].1, Duration::ZERO);
}

#[tokio::test]
async fn test_callback_registration_replaces_previous() {
    let bad = MockTransport::new(BAD_RESPONSE);
    let conn = Arc::new(Conn::new("host1", bad));
    let cluster = Cluster::new(vec![conn]);

    let first = Arc::new(AtomicUsize::new(0));
    let first_in_cb = first.clone();
    cluster.on_check_error(move |_| {
        first_in_cb.fetch_add(1, Ordering::SeqCst);
    });

    let second = Arc::new(AtomicUsize::new(0));
    let second_in_cb = second.clone();
    cluster.on_check_error(move |_| {
        second_in_cb.fetch_add(1, Ordering::SeqCst);
    });

    cluster.check().await;

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_check_updates_health_counts() {
    let good = MockTransport::new("1");
    let conn = Arc::new(Conn::new("host1", good.clone()));
    let cluster = Cluster::new(vec![conn]);

    cluster.check().await;
    cluster.check().await;

    let snapshot = cluster.health_snapshots()[0].1;
    assert_eq!(snapshot.success_count, 2);
    assert_eq!(snapshot.error_count, 0);

    good.set_response(BAD_RESPONSE);
    cluster.check().await;

    let snapshot = cluster.health_snapshots()[0].1;
    assert_eq!(snapshot.success_count, 2);
    assert_eq!(snapshot.error_count, 1);
}
