// src/config/validate.rs

use std::collections::HashMap;
use std::sync::LazyLock;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{JobphaseError, Result};

/// RFC 1123 label: job names become Kubernetes object names and label values.
static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static regex is valid")
});

const MAX_NAME_LEN: usize = 63;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = JobphaseError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.phase))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_phases(cfg)?;
    validate_global_config(cfg)?;
    let phase_of = validate_job_names(cfg)?;
    validate_dependencies(cfg, &phase_of)?;
    validate_phase_dags(cfg)?;
    Ok(())
}

fn ensure_has_phases(cfg: &RawConfigFile) -> Result<()> {
    if cfg.phase.is_empty() {
        return Err(JobphaseError::ConfigError(
            "config must contain at least one [[phase]] section".to_string(),
        ));
    }

    if let Some(idx) = cfg.phase.iter().position(|p| p.job.is_empty()) {
        return Err(JobphaseError::ConfigError(format!(
            "phase {idx} has no [[phase.job]] entries"
        )));
    }

    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if !is_dns_label(&cfg.config.namespace) {
        return Err(JobphaseError::ConfigError(format!(
            "[config].namespace '{}' is not a valid namespace name",
            cfg.config.namespace
        )));
    }

    if cfg.config.refresh_interval.is_zero() {
        return Err(JobphaseError::ConfigError(
            "[config].refresh_interval must be greater than zero".to_string(),
        ));
    }

    if cfg.config.request_timeout.is_zero() {
        return Err(JobphaseError::ConfigError(
            "[config].request_timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Returns the phase index of every job name.
fn validate_job_names(cfg: &RawConfigFile) -> Result<HashMap<&str, usize>> {
    let mut phase_of = HashMap::new();

    for (idx, phase) in cfg.phase.iter().enumerate() {
        for job in phase.job.iter() {
            if !is_dns_label(&job.name) {
                return Err(JobphaseError::ConfigError(format!(
                    "job name '{}' must be a lowercase RFC 1123 label of at most {} characters",
                    job.name, MAX_NAME_LEN
                )));
            }

            if let Some(previous) = phase_of.insert(job.name.as_str(), idx) {
                return Err(JobphaseError::ConfigError(format!(
                    "job '{}' is defined twice (phases {} and {})",
                    job.name, previous, idx
                )));
            }
        }
    }

    Ok(phase_of)
}

fn validate_dependencies(cfg: &RawConfigFile, phase_of: &HashMap<&str, usize>) -> Result<()> {
    for (idx, phase) in cfg.phase.iter().enumerate() {
        for job in phase.job.iter() {
            for dep in job.depends_on.iter() {
                if dep == &job.name {
                    return Err(JobphaseError::ConfigError(format!(
                        "job '{}' cannot depend on itself",
                        job.name
                    )));
                }

                match phase_of.get(dep.as_str()) {
                    None => {
                        return Err(JobphaseError::ConfigError(format!(
                            "job '{}' has unknown dependency '{}' in `depends_on`",
                            job.name, dep
                        )));
                    }
                    // A later phase only starts once this one has finished,
                    // so the dependency could never be satisfied.
                    Some(&dep_phase) if dep_phase > idx => {
                        return Err(JobphaseError::ConfigError(format!(
                            "job '{}' (phase {}) depends on '{}' from later phase {}",
                            job.name, idx, dep, dep_phase
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
    }
    Ok(())
}

fn validate_phase_dags(cfg: &RawConfigFile) -> Result<()> {
    for (idx, phase) in cfg.phase.iter().enumerate() {
        // Edge direction: dep -> job, restricted to jobs of this phase.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for job in phase.job.iter() {
            graph.add_node(job.name.as_str());
        }

        for job in phase.job.iter() {
            for dep in job.depends_on.iter() {
                if graph.contains_node(dep.as_str()) {
                    graph.add_edge(dep.as_str(), job.name.as_str(), ());
                }
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(JobphaseError::ConfigError(format!(
                "dependency cycle in phase {} involving job '{}'",
                idx,
                cycle.node_id()
            )));
        }
    }
    Ok(())
}

fn is_dns_label(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && DNS_LABEL.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{ConfigSection, JobConfig, PhaseConfig};

    fn job(name: &str, deps: &[&str]) -> JobConfig {
        let mut job = JobConfig::new(name);
        job.depends_on = deps.iter().map(|d| d.to_string()).collect();
        job
    }

    fn raw(phases: Vec<Vec<JobConfig>>) -> RawConfigFile {
        RawConfigFile {
            config: ConfigSection::default(),
            phase: phases.into_iter().map(|job| PhaseConfig { job }).collect(),
        }
    }

    fn config_error(raw: RawConfigFile) -> String {
        match ConfigFile::try_from(raw) {
            Err(JobphaseError::ConfigError(msg)) => msg,
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn accepts_same_and_earlier_phase_dependencies() {
        let cfg = raw(vec![
            vec![job("a", &[]), job("b", &["a"])],
            vec![job("c", &["a", "b"])],
        ]);
        assert!(ConfigFile::try_from(cfg).is_ok());
    }

    #[test]
    fn rejects_forward_dependency() {
        let msg = config_error(raw(vec![vec![job("a", &["b"])], vec![job("b", &[])]]));
        assert!(msg.contains("later phase"), "{msg}");
    }

    #[test]
    fn rejects_cycle_inside_phase() {
        let msg = config_error(raw(vec![vec![job("a", &["b"]), job("b", &["a"])]]));
        assert!(msg.contains("cycle"), "{msg}");
    }

    #[test]
    fn rejects_duplicate_and_malformed_names() {
        let msg = config_error(raw(vec![vec![job("a", &[])], vec![job("a", &[])]]));
        assert!(msg.contains("defined twice"), "{msg}");

        let msg = config_error(raw(vec![vec![job("Bad_Name", &[])]]));
        assert!(msg.contains("RFC 1123"), "{msg}");
    }

    #[test]
    fn rejects_empty_phase_and_empty_model() {
        assert!(config_error(raw(Vec::new())).contains("at least one"));
        assert!(config_error(raw(vec![vec![job("a", &[])], vec![]])).contains("phase 1"));
    }

    #[test]
    fn rejects_zero_refresh_interval() {
        let mut cfg = raw(vec![vec![job("a", &[])]]);
        cfg.config.refresh_interval = std::time::Duration::ZERO;
        assert!(config_error(cfg).contains("refresh_interval"));
    }
}
