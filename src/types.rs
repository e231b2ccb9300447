use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Which credentials the Kubernetes client is built from.
///
/// - `InCluster`: the service account mounted into the pod running jobphase
///   (default, matches running the scheduler itself as a cluster job).
/// - `Kubeconfig`: the local kubeconfig (`$KUBECONFIG` or `~/.kube/config`),
///   used when driving a cluster from a workstation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterContext {
    InCluster,
    Kubeconfig,
}

impl Default for ClusterContext {
    fn default() -> Self {
        ClusterContext::InCluster
    }
}

impl FromStr for ClusterContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incluster" | "in-cluster" => Ok(ClusterContext::InCluster),
            "kubeconfig" => Ok(ClusterContext::Kubeconfig),
            other => Err(format!(
                "invalid cluster_context: {other} (expected \"incluster\" or \"kubeconfig\")"
            )),
        }
    }
}

/// Parse a duration string such as `"500ms"`, `"5s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => secs_scaled(s, value, 60),
        "h" => secs_scaled(s, value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn secs_scaled(raw: &str, value: u64, factor: u64) -> Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{raw}' is too large"))
}
