//! # Router
//!
//! Groups the datums of one metric family by namespace, as PutMetricData takes a single
//! namespace per call

use super::datum::Datapoint;
use super::shaper::Routed;
use std::collections::BTreeMap;

/// Namespace to datums, in the order they were pushed
#[derive(Debug, Default)]
pub struct NamespaceGroups {
    groups: BTreeMap<String, Vec<Datapoint>>,
}

impl NamespaceGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, routed: Routed) {
        self.groups.entry(routed.namespace).or_default().push(routed.datapoint);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, namespace: &str) -> Option<&[Datapoint]> {
        self.groups.get(namespace).map(Vec::as_slice)
    }
}

impl Extend<Routed> for NamespaceGroups {
    fn extend<I: IntoIterator<Item = Routed>>(&mut self, iter: I) {
        for routed in iter {
            self.push(routed);
        }
    }
}

impl FromIterator<Routed> for NamespaceGroups {
    fn from_iter<I: IntoIterator<Item = Routed>>(iter: I) -> Self {
        let mut groups = Self::new();
        groups.extend(iter);
        groups
    }
}

impl IntoIterator for NamespaceGroups {
    type Item = (String, Vec<Datapoint>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<Datapoint>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
