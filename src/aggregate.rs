//! Grouping of premium rows under a resolved key.

use std::collections::HashMap;
use std::hash::Hash;

use crate::convert::PremiumRecord;

/// Keep the cheapest record per key, in first-seen key order.
///
/// On equal premiums the record seen first is kept.
pub fn min_per_group<K, I, F>(records: I, mut key: F) -> Vec<(K, PremiumRecord)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = PremiumRecord>,
    F: FnMut(&PremiumRecord) -> K,
{
    min_per_key(records.into_iter().map(|record| (key(&record), record)))
}

/// Same as [`min_per_group`] for records already paired with their key.
pub fn min_per_key<K, I>(pairs: I) -> Vec<(K, PremiumRecord)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, PremiumRecord)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, PremiumRecord)> = Vec::new();

    for (k, record) in pairs {
        match index.get(&k) {
            Some(&i) => {
                if record.monthly_premium < groups[i].1.monthly_premium {
                    groups[i].1 = record;
                }
            }
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, record));
            }
        }
    }

    groups
}

/// Stable ascending sort on the monthly premium.
pub fn sort_by_premium<K>(groups: &mut [(K, PremiumRecord)]) {
    groups.sort_by(|a, b| a.1.monthly_premium.total_cmp(&b.1.monthly_premium));
}
