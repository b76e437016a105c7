use crate::types::Properties;
use std::collections::HashSet;

/// Partition rule for legacy flat property maps.
///
/// Legacy events carry a single flat map with no sensitivity markers. Before
/// dispatch, the tracker runs the map through a policy that deterministically
/// splits it into a non-sensitive bucket (attributable to the user identity)
/// and a sensitive bucket (only ever dispatched anonymously). The concrete
/// rule table is host-application policy, not tracker logic.
pub trait PropertyPolicy: Send + Sync {
    fn partition(&self, properties: Properties) -> PartitionedProperties;
}

/// Output of a partition pass.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct PartitionedProperties {
    pub properties: Properties,
    pub sensitive_properties: Properties,
}

/// Default policy: every legacy property is non-sensitive.
#[derive(Copy, Clone, Debug, Default)]
pub struct NonSensitivePolicy;

impl PropertyPolicy for NonSensitivePolicy {
    fn partition(&self, properties: Properties) -> PartitionedProperties {
        PartitionedProperties {
            properties,
            sensitive_properties: Properties::new(),
        }
    }
}

/// Policy driven by an explicit table of sensitive key names.
#[derive(Clone, Debug, Default)]
pub struct SensitiveKeySet {
    keys: HashSet<String>,
}

impl SensitiveKeySet {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl PropertyPolicy for SensitiveKeySet {
    fn partition(&self, properties: Properties) -> PartitionedProperties {
        let mut split = PartitionedProperties::default();
        for (key, value) in properties {
            if self.keys.contains(&key) {
                split.sensitive_properties.insert(key, value);
            } else {
                split.properties.insert(key, value);
            }
        }
        split
    }
}
