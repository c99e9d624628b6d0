use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label → score mapping, kept in first-seen order.
///
/// Order matters: `argmax` breaks ties in favour of the label inserted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreVector(IndexMap<String, f64>);

impl ScoreVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, score: f64) {
        self.0.insert(label.into(), score);
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Label with the greatest score. NaN scores never win.
    pub fn argmax(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (label, score) in self.iter() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label, score)),
            }
        }
        best.map(|(label, _)| label)
    }
}

impl From<IndexMap<String, f64>> for ScoreVector {
    fn from(map: IndexMap<String, f64>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ScoreVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
