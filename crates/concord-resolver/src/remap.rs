//! Rebuilding clusters from verdict groups

use concord_domain::{Cluster, GroupedEntries};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Every registry instance of the grouped input, by identifier
#[derive(Debug, Clone, Default)]
pub struct InstanceIndex {
    instances: HashMap<String, Value>,
}

impl InstanceIndex {
    /// Index every instance that carries an `_id` (or `id`)
    pub fn build(grouped: &GroupedEntries) -> Self {
        let mut instances = HashMap::new();
        for (key, cluster) in grouped {
            for instance in &cluster.instances {
                match Cluster::instance_id(instance) {
                    Some(id) => {
                        instances.insert(id.to_string(), instance.clone());
                    }
                    None => warn!("Instance without id in cluster {}", key),
                }
            }
        }
        Self { instances }
    }

    /// Number of indexed instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instance with this identifier
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.instances.get(id)
    }

    /// Cluster of one array per group, in the order of `groups`
    ///
    /// Unknown identifiers are logged and skipped; a group left empty is
    /// dropped.
    pub fn remap(&self, key: &str, groups: &[Vec<String>]) -> Cluster {
        let instances = groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter_map(|id| {
                        let instance = self.get(id).cloned();
                        if instance.is_none() {
                            warn!("Conflict {}: unknown entry id {} in verdict groups", key, id);
                        }
                        instance
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .map(Value::Array)
            .collect();
        Cluster { instances }
    }
}
