//! Pure aggregation over a dataset snapshot.
//!
//! Every function here is a function of its arguments alone: callers extract
//! the scalars they need from the interaction state first, so the same inputs
//! always produce the same outputs.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

/// Sums `value` per distinct `key`, descending by total. Ties keep the
/// first-encountered group order.
pub fn sum_by_group<R, K, KF, VF>(records: &[R], key: KF, value: VF) -> Vec<(K, f64)>
where
    K: Clone + Eq + Hash,
    KF: Fn(&R) -> K,
    VF: Fn(&R) -> f64,
{
    group_fold(records, key, value, |total, v| total + v)
}

/// Maximum of `value` per distinct `key`, descending. Truncate the result to
/// rank the top N groups.
pub fn max_by_group<R, K, KF, VF>(records: &[R], key: KF, value: VF) -> Vec<(K, f64)>
where
    K: Clone + Eq + Hash,
    KF: Fn(&R) -> K,
    VF: Fn(&R) -> f64,
{
    group_fold(records, key, value, f64::max)
}

fn group_fold<R, K, KF, VF>(
    records: &[R],
    key: KF,
    value: VF,
    combine: fn(f64, f64) -> f64,
) -> Vec<(K, f64)>
where
    K: Clone + Eq + Hash,
    KF: Fn(&R) -> K,
    VF: Fn(&R) -> f64,
{
    let mut groups: Vec<(K, f64)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for record in records {
        let k = key(record);
        match index.get(&k) {
            Some(&i) => groups[i].1 = combine(groups[i].1, value(record)),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, value(record)));
            }
        }
    }
    groups.sort_by_key(|group| Reverse(OrderedFloat(group.1)));
    groups
}

/// Groups records per entity, each series ascending by year. Entities keep
/// their first-encountered order.
pub fn time_series_by_entity<'a, R, K, KF, YF>(
    records: &'a [R],
    key: KF,
    year: YF,
) -> Vec<(K, Vec<&'a R>)>
where
    K: Clone + Eq + Hash,
    KF: Fn(&R) -> K,
    YF: Fn(&R) -> u32,
{
    let mut series: Vec<(K, Vec<&R>)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for record in records {
        let k = key(record);
        match index.get(&k) {
            Some(&i) => series[i].1.push(record),
            None => {
                index.insert(k.clone(), series.len());
                series.push((k, vec![record]));
            }
        }
    }
    for (_, records) in &mut series {
        records.sort_by_key(|r| year(r));
    }
    series
}

/// `(min, max)` of `value` over all records, or `fallback` when there are no
/// records, so downstream scales never degenerate.
pub fn domain_extent<R, VF>(records: &[R], value: VF, fallback: (f64, f64)) -> (f64, f64)
where
    VF: Fn(&R) -> f64,
{
    let mut values = records.iter().map(value);
    let Some(first) = values.next() else {
        return fallback;
    };
    values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Records whose year equals `year`, preserving relative order.
pub fn filter_by_year<R, YF>(records: &[R], year_of: YF, year: u32) -> Vec<&R>
where
    YF: Fn(&R) -> u32,
{
    records.iter().filter(|r| year_of(r) == year).collect()
}
