use std::collections::{HashMap, HashSet};

use crate::model::HistoricalProductRecord;

/// Case-insensitive name scoped to a product-type partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameTypeKey {
    name: String,
    product_type: String,
}

impl NameTypeKey {
    pub fn new(name: &str, product_type: &str) -> Self {
        Self {
            name: normalize_name(name),
            product_type: product_type.to_string(),
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// Current version by code and by (name, type).
pub struct CurrentIndex<'a> {
    by_code: HashMap<&'a str, &'a HistoricalProductRecord>,
    by_name: HashMap<NameTypeKey, Vec<&'a HistoricalProductRecord>>,
}

impl<'a> CurrentIndex<'a> {
    pub fn build(current: &'a [HistoricalProductRecord]) -> Self {
        let mut by_code = HashMap::new();
        let mut by_name: HashMap<NameTypeKey, Vec<&HistoricalProductRecord>> = HashMap::new();
        for rec in current {
            by_code.entry(rec.code.as_str()).or_insert(rec);
            by_name
                .entry(NameTypeKey::new(&rec.name, &rec.product_type))
                .or_default()
                .push(rec);
        }
        Self { by_code, by_name }
    }

    pub fn by_code(&self, code: &str) -> Option<&'a HistoricalProductRecord> {
        self.by_code.get(code).copied()
    }

    /// Records sharing the key, in snapshot order.
    pub fn by_name(&self, key: &NameTypeKey) -> &[&'a HistoricalProductRecord] {
        self.by_name.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// (name, type) → most recent code in any version other than the current
/// one(s). Built once per run.
#[derive(Debug, Default)]
pub struct PriorCodeIndex {
    latest: HashMap<NameTypeKey, String>,
}

impl PriorCodeIndex {
    /// `history` is oldest first, so later entries overwrite earlier ones.
    pub fn build(history: &[HistoricalProductRecord], current_versions: &HashSet<&str>) -> Self {
        let mut latest = HashMap::new();
        for rec in history {
            if current_versions.contains(rec.version_id.as_str()) {
                continue;
            }
            latest.insert(NameTypeKey::new(&rec.name, &rec.product_type), rec.code.clone());
        }
        Self { latest }
    }

    pub fn latest_code(&self, key: &NameTypeKey) -> Option<&str> {
        self.latest.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordStatus;

    fn rec(code: &str, name: &str, ty: &str, version: &str) -> HistoricalProductRecord {
        HistoricalProductRecord {
            code: code.into(),
            name: name.into(),
            product_type: ty.into(),
            version_id: version.into(),
            status: RecordStatus::Unchanged,
        }
    }

    #[test]
    fn keys_ignore_case_but_not_type() {
        assert_eq!(NameTypeKey::new("Apple ", "fruit"), NameTypeKey::new("apple", "fruit"));
        assert_ne!(NameTypeKey::new("Apple", "fruit"), NameTypeKey::new("Apple", "bakery"));
    }

    #[test]
    fn prior_index_keeps_latest_and_skips_current() {
        let history = vec![
            rec("10000", "Apple", "fruit", "v1"),
            rec("11000", "Apple", "fruit", "v2"),
            rec("12000", "Apple", "fruit", "v3"),
        ];
        let current: HashSet<&str> = ["v3"].into_iter().collect();
        let index = PriorCodeIndex::build(&history, &current);
        assert_eq!(index.latest_code(&NameTypeKey::new("APPLE", "fruit")), Some("11000"));
        assert_eq!(index.latest_code(&NameTypeKey::new("Apple", "veg")), None);
        assert_eq!(index.len(), 1);
    }
}
