use parking_lot::Mutex;
use std::time::Duration;

/// 单个连接的探测统计
/// 平均延迟只统计成功探测，失败只累加错误计数；
/// 每条记录独立加锁，探测一个连接不会阻塞其他连接的读写
#[derive(Debug, Default)]
pub struct ConnHealth {
    inner: Mutex<HealthInner>,
}

#[derive(Debug, Default)]
struct HealthInner {
    success_count: u64,
    error_count: u64,
    last: Duration,
    // 均值用 f64 纳秒保存，避免整数增量均值的舍入误差累积
    mean_ns: f64,
}

/// 某一时刻的健康快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub success_count: u64,
    pub error_count: u64,
    pub last_latency: Duration,
    pub mean_latency: Duration,
}

impl ConnHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功探测，增量更新算术平均
    pub fn record_success(&self, latency: Duration) {
        let mut inner = self.inner.lock();
        let sample = latency.as_nanos() as f64;
        if inner.success_count == 0 {
            inner.mean_ns = sample;
        } else {
            let count = inner.success_count as f64;
            inner.mean_ns = (inner.mean_ns * count + sample) / (count + 1.0);
        }
        inner.success_count += 1;
        inner.last = latency;
    }

    /// 记录一次失败探测，延迟字段不变
    pub fn record_failure(&self) {
        self.inner.lock().error_count += 1;
    }

    /// 当前平均延迟，从未成功时为零
    pub fn mean(&self) -> Duration {
        Duration::from_nanos(self.inner.lock().mean_ns as u64)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let inner = self.inner.lock();
        HealthSnapshot {
            success_count: inner.success_count,
            error_count: inner.error_count,
            last_latency: inner.last,
            mean_latency: Duration::from_nanos(inner.mean_ns as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_starts_at_zero() {
        let health = ConnHealth::new();
        assert_eq!(health.mean(), Duration::ZERO);
    }

    #[test]
    fn test_mean_is_arithmetic_mean() {
        let health = ConnHealth::new();
        health.record_success(Duration::from_millis(10));
        health.record_success(Duration::from_millis(20));
        health.record_success(Duration::from_millis(60));
        assert_eq!(health.mean(), Duration::from_millis(30));
    }

    #[test]
    fn test_mean_is_order_independent() {
        let samples = [5u64, 40, 15, 100, 20];

        let forward = ConnHealth::new();
        for ms in samples {
            forward.record_success(Duration::from_millis(ms));
        }

        let backward = ConnHealth::new();
        for ms in samples.iter().rev() {
            backward.record_success(Duration::from_millis(*ms));
        }

        let diff = forward.mean().abs_diff(backward.mean());
        assert!(diff < Duration::from_micros(1));
    }

    #[test]
    fn test_failure_leaves_latency_untouched() {
        let health = ConnHealth::new();
        health.record_success(Duration::from_millis(10));
        health.record_failure();
        health.record_failure();

        let snapshot = health.snapshot();
        assert_eq!(snapshot.success_count, 1);
        assert_eq!(snapshot.error_count, 2);
        assert_eq!(snapshot.mean_latency, Duration::from_millis(10));
        assert_eq!(snapshot.last_latency, Duration::from_millis(10));
    }

    #[test]
    fn test_last_latency_tracks_most_recent_success() {
        let health = ConnHealth::new();
        health.record_success(Duration::from_millis(10));
        health.record_success(Duration::from_millis(30));
        assert_eq!(health.snapshot().last_latency, Duration::from_millis(30));
    }
}
