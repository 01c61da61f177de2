//! Placeholder templating for metric names and tags.
//!
//! Supported placeholders: `NODENAME` and `PID` (resolved at startup),
//! `WORKERNUM` and `WORKERFULLNAME` (resolved per worker) and `METRICNAME`
//! (resolved per generator instance, tags only).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::error::ConfigError;

static TAGS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[[:word:]]+=[[:word:]]+(,[[:word:]]+=[[:word:]]+)*$").expect("valid regex")
});

const NODENAME: &str = "NODENAME";
const PID: &str = "PID";
const WORKERNUM: &str = "WORKERNUM";
const WORKERFULLNAME: &str = "WORKERFULLNAME";
const METRICNAME: &str = "METRICNAME";

/// Startup-resolved templates, split by the stage at which they're completed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Templates {
    pub pid: u32,
    pub prefix: String,
    pub suffix: String,
    /// Tags with no per-worker placeholder
    pub shared_tags: String,
    /// Tags containing `WORKERNUM` or `WORKERFULLNAME`
    pub worker_tags: String,
    /// Tags containing `METRICNAME`
    pub metric_tags: String,
}

impl Templates {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            &config.tags,
            &config.prefix,
            &config.suffix,
            &config.node_name,
            std::process::id(),
        )
    }

    pub fn new(
        tags: &str,
        prefix: &str,
        suffix: &str,
        node_name: &str,
        pid: u32,
    ) -> Result<Self, ConfigError> {
        if !tags.is_empty() && !TAGS_RE.is_match(tags) {
            return Err(ConfigError::Tags(tags.to_string()));
        }

        let tags = tags
            .replace(NODENAME, node_name)
            .replace(PID, &pid.to_string());

        let mut templates = Self {
            pid,
            prefix: prefix.replace(NODENAME, node_name),
            suffix: suffix.replace(NODENAME, node_name),
            ..Default::default()
        };

        for tag in tags.split(',').filter(|t| !t.is_empty()) {
            let bucket = if tag.contains(METRICNAME) {
                &mut templates.metric_tags
            } else if tag.contains(WORKERNUM) || tag.contains(WORKERFULLNAME) {
                &mut templates.worker_tags
            } else {
                &mut templates.shared_tags
            };
            append_tag(bucket, tag);
        }

        Ok(templates)
    }

    /// Templates with the worker placeholders resolved for worker `id`
    pub fn for_worker(&self, id: usize) -> WorkerTemplates {
        let full_name = format!("worker-{}-{}", self.pid, id);
        let number = id.to_string();
        let resolve = |s: &str| {
            s.replace(WORKERFULLNAME, &full_name)
                .replace(WORKERNUM, &number)
        };

        WorkerTemplates {
            prefix: resolve(&self.prefix),
            suffix: resolve(&self.suffix),
            shared_tags: self.shared_tags.clone(),
            worker_tags: resolve(&self.worker_tags),
            metric_tags: resolve(&self.metric_tags),
            full_name,
        }
    }
}

/// Templates of one worker
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerTemplates {
    /// `worker-<pid>-<n>`
    pub full_name: String,
    pub prefix: String,
    pub suffix: String,
    shared_tags: String,
    worker_tags: String,
    metric_tags: String,
}

impl WorkerTemplates {
    pub fn metric_name(&self, base_name: &str) -> String {
        format!("{}{}{}", self.prefix, base_name, self.suffix)
    }

    /// Raw tag string of one generator instance: shared, worker then metric tags
    pub fn instance_tags(&self, metric_name: &str) -> String {
        let metric_tags = self.metric_tags.replace(METRICNAME, metric_name);
        let mut tags = String::new();
        for part in [&self.shared_tags, &self.worker_tags, &metric_tags] {
            if !part.is_empty() {
                append_tag(&mut tags, part);
            }
        }
        tags
    }
}

fn append_tag(list: &mut String, tag: &str) {
    if !list.is_empty() {
        list.push(',');
    }
    list.push_str(tag);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_tags() {
        for tags in ["a=b,", "a b=c", "a=b=c", "=b", "a=b;c=d", "zoné=1", "env=prod,é=x"] {
            assert!(
                matches!(
                    Templates::new(tags, "", "", "node", 1),
                    Err(ConfigError::Tags(_))
                ),
                "{tags}"
            );
        }
        assert!(Templates::new("", "", "", "node", 1).is_ok());
    }

    #[test]
    fn test_startup_substitution_and_classification() {
        let templates = Templates::new(
            "host=NODENAME,proc=PID,worker=WORKERNUM,thread=WORKERFULLNAME,series=METRICNAME,env=prod",
            "NODENAME.",
            "-WORKERNUM",
            "box1",
            4242,
        )
        .unwrap();

        assert_eq!(templates.prefix, "box1.");
        assert_eq!(templates.suffix, "-WORKERNUM");
        assert_eq!(templates.shared_tags, "host=box1,proc=4242,env=prod");
        assert_eq!(templates.worker_tags, "worker=WORKERNUM,thread=WORKERFULLNAME");
        assert_eq!(templates.metric_tags, "series=METRICNAME");
    }

    #[test]
    fn test_worker_substitution() {
        let templates = Templates::new(
            "env=prod,worker=WORKERNUM,thread=WORKERFULLNAME,series=METRICNAME",
            "tsgen.",
            "-WORKERNUM",
            "box1",
            77,
        )
        .unwrap();

        let worker = templates.for_worker(3);
        assert_eq!(worker.full_name, "worker-77-3");

        let name = worker.metric_name("jiggle");
        assert_eq!(name, "tsgen.jiggle-3");
        assert_eq!(
            worker.instance_tags(&name),
            "env=prod,worker=3,thread=worker-77-3,series=tsgen.jiggle-3"
        );
    }

    #[test]
    fn test_instance_tags_skip_empty_groups() {
        let templates = Templates::new("worker=WORKERNUM", "", "", "box1", 1).unwrap();
        assert_eq!(templates.for_worker(0).instance_tags("m"), "worker=0");

        let templates = Templates::new("", "p.", "", "box1", 1).unwrap();
        let worker = templates.for_worker(5);
        assert_eq!(worker.instance_tags("m"), "");
        assert_eq!(worker.metric_name("m"), "p.m");
    }
}
