use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use anyhow::{anyhow, ensure};

/// The monitored validator set: labelled groups of validator indices with a
/// derived reverse lookup. Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    labels: BTreeMap<String, Vec<u64>>,
    index_to_label: HashMap<u64, String>,
}

impl ValidatorRegistry {
    pub fn new(labels: BTreeMap<String, Vec<u64>>) -> anyhow::Result<Self> {
        ensure!(
            labels.values().any(|indices| !indices.is_empty()),
            "Validator registry must contain at least one validator index"
        );

        let mut index_to_label = HashMap::new();
        for (label, indices) in &labels {
            for validator_index in indices {
                if let Some(existing) = index_to_label.insert(*validator_index, label.clone()) {
                    return Err(anyhow!(
                        "Validator {validator_index} is listed under both {existing} and {label}"
                    ));
                }
            }
        }

        Ok(Self {
            labels,
            index_to_label,
        })
    }

    /// Load the registry from a YAML file mapping labels to index lists:
    ///
    /// ```yaml
    /// alpha: [100, 200]
    /// bravo: [300]
    /// ```
    pub fn from_yaml_file<P: AsRef<Path> + std::fmt::Debug>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(&path)
            .map_err(|err| anyhow!("Failed to read validators file {path:?}: {err}"))?;
        let labels = serde_yaml::from_str::<BTreeMap<String, Vec<u64>>>(&contents)
            .map_err(|err| anyhow!("Failed to parse validators YAML: {err}"))?;
        Self::new(labels)
    }

    pub fn is_monitored(&self, validator_index: u64) -> bool {
        self.index_to_label.contains_key(&validator_index)
    }

    pub fn label_of(&self, validator_index: u64) -> Option<&str> {
        self.index_to_label
            .get(&validator_index)
            .map(String::as_str)
    }

    pub fn validator_count(&self) -> usize {
        self.index_to_label.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}
