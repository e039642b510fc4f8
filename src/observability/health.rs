use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;

/// Health status of a service or dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, HealthStatus::Degraded)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy)
    }
}

/// Health status of a single dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyHealth {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: Option<f64>,
    pub message: Option<String>,
}

impl DependencyHealth {
    pub fn healthy(name: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    pub fn degraded(name: impl Into<String>, latency_ms: Option<f64>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            latency_ms,
            message: Some(message.into()),
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(message.into()),
        }
    }
}

/// Aggregated health check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedHealth {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: Vec<DependencyHealth>,
}

impl AggregatedHealth {
    pub fn new(version: String, uptime_seconds: u64, dependencies: Vec<DependencyHealth>) -> Self {
        let status = Self::aggregate_status(&dependencies);
        Self {
            status,
            version,
            uptime_seconds,
            dependencies,
        }
    }

    /// Worst dependency status wins.
    fn aggregate_status(dependencies: &[DependencyHealth]) -> HealthStatus {
        if dependencies.iter().any(|d| d.status.is_unhealthy()) {
            HealthStatus::Unhealthy
        } else if dependencies.iter().any(|d| d.status.is_degraded()) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Checks the reporting database. The service has no other dependency.
pub struct HealthChecker {
    pool: PgPool,
    slow_query_ms: f64,
    start_time: std::time::Instant,
}

impl HealthChecker {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            slow_query_ms: 100.0,
            start_time: std::time::Instant::now(),
        }
    }

    pub async fn check_all(&self) -> AggregatedHealth {
        AggregatedHealth::new(
            env!("CARGO_PKG_VERSION").to_string(),
            self.uptime_seconds(),
            vec![self.check_database().await],
        )
    }

    pub async fn check_database(&self) -> DependencyHealth {
        let start = std::time::Instant::now();

        match tokio::time::timeout(
            Duration::from_secs(5),
            sqlx::query("SELECT 1").fetch_one(&self.pool),
        )
        .await
        {
            Ok(Ok(_)) => {
                let latency = start.elapsed().as_secs_f64() * 1000.0;
                if latency > self.slow_query_ms {
                    DependencyHealth::degraded("database", Some(latency), "High latency detected")
                } else {
                    DependencyHealth::healthy("database", latency)
                }
            }
            Ok(Err(e)) => DependencyHealth::unhealthy("database", format!("Query failed: {}", e)),
            Err(_) => DependencyHealth::unhealthy("database", "Connection timeout"),
        }
    }

    /// A slow database still serves reports, so degraded counts as ready.
    pub async fn is_ready(&self) -> bool {
        !self.check_database().await.status.is_unhealthy()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(HealthStatus::Degraded.is_degraded());
        assert!(HealthStatus::Unhealthy.is_unhealthy());
        assert!(!HealthStatus::Degraded.is_healthy());
    }

    #[test]
    fn test_aggregated_health_takes_worst_status() {
        let health = AggregatedHealth::new(
            "0.1.0".to_string(),
            10,
            vec![DependencyHealth::healthy("database", 1.0)],
        );
        assert_eq!(health.status, HealthStatus::Healthy);

        let health = AggregatedHealth::new(
            "0.1.0".to_string(),
            10,
            vec![
                DependencyHealth::healthy("database", 1.0),
                DependencyHealth::degraded("database", Some(250.0), "slow"),
            ],
        );
        assert_eq!(health.status, HealthStatus::Degraded);

        let health = AggregatedHealth::new(
            "0.1.0".to_string(),
            10,
            vec![
                DependencyHealth::degraded("database", None, "slow"),
                DependencyHealth::unhealthy("database", "down"),
            ],
        );
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_health_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }
}
