//! Dataset aggregation queries.
//!
//! Each report is backed by exactly one query here. Every query walks the
//! full immutable dataset and computes its aggregate from scratch; nothing
//! is cached or shared between reports, so a bug in one query cannot leak
//! into another report's numbers.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::models::{Dataset, Status, SERVICE_UNKNOWN};

/// Overall traffic split between normal connections and attacks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSummary {
    pub total: usize,
    pub normal: usize,
    pub attacks: usize,
    pub perc_normal: f64,
    pub perc_attack: f64,
}

/// A distinct value and how many records carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Attack and normal volumes over positional record batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalTrend {
    /// Records per batch: `max(1, total / 100)`.
    pub batch_size: usize,
    /// Attack count per batch, indexed by batch id.
    pub attacks: Vec<usize>,
    /// Normal-connection count per batch, aligned with `attacks`.
    pub normals: Vec<usize>,
}

impl TemporalTrend {
    pub fn bins(&self) -> usize {
        self.attacks.len()
    }
}

/// One row of the protocol vs. outcome cross-tabulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOutcome {
    pub proto: String,
    pub normal: usize,
    pub attacks: usize,
}

impl ProtocolOutcome {
    pub fn total(&self) -> usize {
        self.normal + self.attacks
    }

    /// Share of this protocol's records that are attacks, as a percentage.
    /// A row only exists if at least one record used the protocol, so the
    /// division is always defined.
    pub fn perc_attack(&self) -> f64 {
        self.attacks as f64 / self.total() as f64 * 100.0
    }
}

/// A protocol's outcome mix with both shares normalized to its own volume,
/// so `normal_share + attack_share == 1.0` per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolMix {
    pub proto: String,
    pub normal_share: f64,
    pub attack_share: f64,
}

/// Count each status and its share of the dataset.
///
/// Percentages are undefined on an empty dataset; the loader rejects empty
/// inputs and the report orchestrator re-checks before calling in.
pub fn traffic_summary(dataset: &Dataset) -> TrafficSummary {
    debug_assert!(!dataset.is_empty(), "summary needs at least one record");

    let total = dataset.len();
    let attacks = dataset
        .records
        .iter()
        .filter(|r| r.status == Status::Attack)
        .count();
    let normal = total - attacks;

    TrafficSummary {
        total,
        normal,
        attacks,
        perc_normal: normal as f64 / total as f64 * 100.0,
        perc_attack: attacks as f64 / total as f64 * 100.0,
    }
}

/// Attack records per category, descending by count. Records without a
/// category land in the placeholder bucket from [`crate::models`]. Returns
/// an empty list when the dataset holds no attacks at all.
pub fn attack_category_counts(dataset: &Dataset) -> Vec<ValueCount> {
    let counts = count_in_order(
        dataset
            .records
            .iter()
            .filter(|r| r.status == Status::Attack)
            .map(|r| r.category_bucket()),
    );
    sorted_desc(counts)
}

/// The `k` most frequent protocols across all records.
pub fn protocol_counts(dataset: &Dataset, k: usize) -> Vec<ValueCount> {
    let counts = count_in_order(dataset.records.iter().map(|r| r.proto.as_str()));
    top_k(counts, k)
}

/// The `k` most frequent named services. Records whose service is the
/// unknown sentinel are left out entirely, so a dataset where every
/// service is unknown yields an empty list.
pub fn service_counts(dataset: &Dataset, k: usize) -> Vec<ValueCount> {
    let counts = count_in_order(
        dataset
            .records
            .iter()
            .filter(|r| r.service != SERVICE_UNKNOWN)
            .map(|r| r.service.as_str()),
    );
    top_k(counts, k)
}

/// Split the dataset into positional batches and count attacks and normal
/// connections in each. Records keep their file order; batch membership is
/// `index / batch_size`, so only the final batch can run short.
pub fn temporal_trend(dataset: &Dataset) -> TemporalTrend {
    let total = dataset.len();
    let batch_size = (total / 100).max(1);
    let bins = (total + batch_size - 1) / batch_size;

    let mut attacks = vec![0usize; bins];
    let mut normals = vec![0usize; bins];

    for (index, record) in dataset.records.iter().enumerate() {
        let bin = index / batch_size;
        match record.status {
            Status::Attack => attacks[bin] += 1,
            Status::Normal => normals[bin] += 1,
        }
    }

    TemporalTrend {
        batch_size,
        attacks,
        normals,
    }
}

/// Cross-tabulate protocol against outcome, sorted descending by attack
/// percentage. The sort is stable, so protocols with equal rates keep the
/// order in which they first appeared in the file.
pub fn protocol_outcomes(dataset: &Dataset) -> Vec<ProtocolOutcome> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<ProtocolOutcome> = Vec::new();

    for record in &dataset.records {
        let i = match index.get(record.proto.as_str()) {
            Some(&i) => i,
            None => {
                index.insert(record.proto.as_str(), rows.len());
                rows.push(ProtocolOutcome {
                    proto: record.proto.clone(),
                    normal: 0,
                    attacks: 0,
                });
                rows.len() - 1
            }
        };
        match record.status {
            Status::Attack => rows[i].attacks += 1,
            Status::Normal => rows[i].normal += 1,
        }
    }

    rows.sort_by(|a, b| {
        b.perc_attack()
            .partial_cmp(&a.perc_attack())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Outcome mix of the `k` highest-volume protocols, each row normalized by
/// its own record count and the rows sorted descending by attack share.
///
/// Membership is decided by raw frequency alone. A protocol seen once with
/// a 100% attack rate does not make the cut unless it is also among the
/// `k` busiest, which keeps the chart focused on traffic that matters.
pub fn top_protocol_mix(dataset: &Dataset, k: usize) -> Vec<ProtocolMix> {
    let top: Vec<String> = protocol_counts(dataset, k)
        .into_iter()
        .map(|c| c.value)
        .collect();

    let outcomes = protocol_outcomes(dataset);
    let by_proto: HashMap<&str, &ProtocolOutcome> =
        outcomes.iter().map(|o| (o.proto.as_str(), o)).collect();

    let mut rows: Vec<ProtocolMix> = top
        .iter()
        .filter_map(|proto| by_proto.get(proto.as_str()))
        .map(|o| {
            let total = o.total() as f64;
            ProtocolMix {
                proto: o.proto.clone(),
                normal_share: o.normal as f64 / total,
                attack_share: o.attacks as f64 / total,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.attack_share
            .partial_cmp(&a.attack_share)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Count occurrences while remembering the order in which values were
/// first seen. That order is what breaks ties after the stable sort.
fn count_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.to_string(), counts.len());
                counts.push(ValueCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts
}

fn sorted_desc(mut counts: Vec<ValueCount>) -> Vec<ValueCount> {
    counts.sort_by_key(|c| Reverse(c.count));
    counts
}

fn top_k(counts: Vec<ValueCount>, k: usize) -> Vec<ValueCount> {
    let mut sorted = sorted_desc(counts);
    sorted.truncate(k);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, MISSING_CATEGORY};

    fn rec(label: u8, attack_cat: Option<&str>, proto: &str, service: &str) -> Record {
        Record {
            label,
            status: Status::from_label(label).unwrap(),
            attack_cat: attack_cat.map(String::from),
            proto: proto.to_string(),
            service: service.to_string(),
        }
    }

    /// Three records: one normal tcp connection, one dos attack over
    /// tcp/http and one dos attack over udp.
    fn small_dataset() -> Dataset {
        Dataset {
            records: vec![
                rec(0, None, "tcp", "-"),
                rec(1, Some("dos"), "tcp", "http"),
                rec(1, Some("dos"), "udp", "-"),
            ],
        }
    }

    #[test]
    fn test_traffic_summary_counts() {
        let summary = traffic_summary(&small_dataset());

        assert_eq!(summary.total, 3);
        assert_eq!(summary.normal, 1);
        assert_eq!(summary.attacks, 2);
        assert!((summary.perc_normal - 100.0 / 3.0).abs() < 1e-9);
        assert!((summary.perc_attack - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_traffic_summary_percentages_sum_to_hundred() {
        let dataset = Dataset {
            records: vec![
                rec(0, None, "tcp", "dns"),
                rec(1, Some("exploits"), "tcp", "http"),
                rec(1, Some("fuzzers"), "udp", "-"),
                rec(0, None, "udp", "dns"),
                rec(1, Some("dos"), "icmp", "-"),
                rec(0, None, "arp", "-"),
                rec(1, Some("dos"), "tcp", "ftp"),
            ],
        };

        let summary = traffic_summary(&dataset);
        assert!((summary.perc_normal + summary.perc_attack - 100.0).abs() < 1e-9);
        assert_eq!(summary.normal + summary.attacks, summary.total);
    }

    #[test]
    fn test_attack_categories_sum_to_attack_count() {
        let dataset = small_dataset();
        let categories = attack_category_counts(&dataset);

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].value, "dos");
        assert_eq!(categories[0].count, 2);

        let summary = traffic_summary(&dataset);
        let total: usize = categories.iter().map(|c| c.count).sum();
        assert_eq!(total, summary.attacks);
    }

    #[test]
    fn test_attack_categories_empty_without_attacks() {
        let dataset = Dataset {
            records: vec![rec(0, None, "tcp", "http"), rec(0, None, "udp", "-")],
        };

        assert!(attack_category_counts(&dataset).is_empty());
    }

    #[test]
    fn test_attack_without_category_uses_placeholder() {
        let dataset = Dataset {
            records: vec![
                rec(1, None, "tcp", "http"),
                rec(1, Some("dos"), "tcp", "http"),
                rec(1, None, "udp", "-"),
            ],
        };

        let categories = attack_category_counts(&dataset);
        assert_eq!(categories[0].value, MISSING_CATEGORY);
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[1].value, "dos");
        assert_eq!(categories[1].count, 1);
    }

    #[test]
    fn test_protocol_counts_ranked_and_truncated() {
        let dataset = Dataset {
            records: vec![
                rec(0, None, "tcp", "-"),
                rec(0, None, "udp", "-"),
                rec(1, Some("dos"), "tcp", "-"),
                rec(0, None, "icmp", "-"),
                rec(1, Some("dos"), "tcp", "-"),
                rec(0, None, "udp", "-"),
                rec(0, None, "arp", "-"),
            ],
        };

        let top = protocol_counts(&dataset, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].value, "tcp");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].value, "udp");
        assert_eq!(top[1].count, 2);

        // Nothing excluded may outrank anything kept.
        let all = protocol_counts(&dataset, 10);
        let dropped_max = all[2..].iter().map(|c| c.count).max().unwrap();
        assert!(top.iter().all(|c| c.count >= dropped_max));
    }

    #[test]
    fn test_protocol_count_ties_keep_first_seen_order() {
        let dataset = Dataset {
            records: vec![
                rec(0, None, "udp", "-"),
                rec(0, None, "ospf", "-"),
                rec(0, None, "icmp", "-"),
                rec(0, None, "udp", "-"),
            ],
        };

        let top = protocol_counts(&dataset, 10);
        assert_eq!(top[0].value, "udp");
        assert_eq!(top[1].value, "ospf");
        assert_eq!(top[2].value, "icmp");
    }

    #[test]
    fn test_service_counts_skip_unknown_sentinel() {
        let services = service_counts(&small_dataset(), 5);

        assert_eq!(services.len(), 1);
        assert_eq!(services[0].value, "http");
        assert_eq!(services[0].count, 1);
    }

    #[test]
    fn test_service_counts_empty_when_all_unknown() {
        let dataset = Dataset {
            records: vec![rec(0, None, "tcp", "-"), rec(1, Some("dos"), "udp", "-")],
        };

        assert!(service_counts(&dataset, 5).is_empty());
    }

    #[test]
    fn test_temporal_one_record_per_bin_below_hundred() {
        let trend = temporal_trend(&small_dataset());

        assert_eq!(trend.batch_size, 1);
        assert_eq!(trend.bins(), 3);
        assert_eq!(trend.attacks, vec![0, 1, 1]);
        assert_eq!(trend.normals, vec![1, 0, 0]);
    }

    #[test]
    fn test_temporal_thousand_records_make_hundred_bins() {
        let records: Vec<Record> = (0..1000)
            .map(|i| {
                if i % 2 == 0 {
                    rec(0, None, "tcp", "-")
                } else {
                    rec(1, Some("dos"), "tcp", "-")
                }
            })
            .collect();
        let dataset = Dataset { records };

        let trend = temporal_trend(&dataset);
        assert_eq!(trend.batch_size, 10);
        assert_eq!(trend.bins(), 100);
        assert_eq!(trend.attacks.iter().sum::<usize>(), 500);
        assert_eq!(trend.normals.iter().sum::<usize>(), 500);
        for bin in 0..trend.bins() {
            assert_eq!(trend.attacks[bin] + trend.normals[bin], 10);
        }
    }

    #[test]
    fn test_temporal_short_final_batch() {
        // 250 records at batch size 2 leave a full final batch; 251 adds a
        // single-record bin at the end.
        let records: Vec<Record> = (0..251).map(|_| rec(0, None, "tcp", "-")).collect();
        let dataset = Dataset { records };

        let trend = temporal_trend(&dataset);
        assert_eq!(trend.batch_size, 2);
        assert_eq!(trend.bins(), 126);
        assert_eq!(trend.normals[125], 1);
        assert_eq!(trend.attacks[125], 0);
    }

    #[test]
    fn test_protocol_outcomes_sorted_by_attack_rate() {
        let rows = protocol_outcomes(&small_dataset());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].proto, "udp");
        assert_eq!(rows[0].attacks, 1);
        assert_eq!(rows[0].normal, 0);
        assert!((rows[0].perc_attack() - 100.0).abs() < 1e-9);

        assert_eq!(rows[1].proto, "tcp");
        assert_eq!(rows[1].attacks, 1);
        assert_eq!(rows[1].normal, 1);
        assert!((rows[1].perc_attack() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_outcome_rate_ties_keep_first_seen_order() {
        // udp, ospf and icmp all run at a 50% attack rate. arp enters
        // last at 100%, so the sort has to move it to the front while
        // the tied block stays in first-seen order.
        let dataset = Dataset {
            records: vec![
                rec(0, None, "udp", "-"),
                rec(1, Some("dos"), "udp", "-"),
                rec(0, None, "ospf", "-"),
                rec(1, Some("dos"), "ospf", "-"),
                rec(0, None, "icmp", "-"),
                rec(1, Some("dos"), "icmp", "-"),
                rec(1, Some("dos"), "arp", "-"),
            ],
        };

        let outcomes = protocol_outcomes(&dataset);
        let order: Vec<&str> = outcomes.iter().map(|o| o.proto.as_str()).collect();
        assert_eq!(order, ["arp", "udp", "ospf", "icmp"]);

        let mix = top_protocol_mix(&dataset, 15);
        let order: Vec<&str> = mix.iter().map(|m| m.proto.as_str()).collect();
        assert_eq!(order, ["arp", "udp", "ospf", "icmp"]);
    }

    #[test]
    fn test_protocol_mix_restricted_to_busiest() {
        let mut records = Vec::new();
        for _ in 0..4 {
            records.push(rec(0, None, "tcp", "-"));
        }
        for _ in 0..2 {
            records.push(rec(1, Some("dos"), "tcp", "-"));
        }
        for _ in 0..3 {
            records.push(rec(1, Some("dos"), "udp", "-"));
        }
        // Rare protocol with a 100% attack rate; frequency keeps it out.
        records.push(rec(1, Some("backdoor"), "sctp", "-"));
        let dataset = Dataset { records };

        let mix = top_protocol_mix(&dataset, 2);
        assert_eq!(mix.len(), 2);
        assert!(mix.iter().all(|m| m.proto != "sctp"));

        // udp is pure attack traffic, so it sorts above tcp.
        assert_eq!(mix[0].proto, "udp");
        assert!((mix[0].attack_share - 1.0).abs() < 1e-9);
        assert_eq!(mix[1].proto, "tcp");
        assert!((mix[1].attack_share - 2.0 / 6.0).abs() < 1e-9);

        // Yet the outcome cross-tab still ranks sctp first.
        let outcomes = protocol_outcomes(&dataset);
        assert_eq!(outcomes[0].proto, "sctp");
    }

    #[test]
    fn test_protocol_mix_rows_are_normalized() {
        let mix = top_protocol_mix(&small_dataset(), 15);

        assert_eq!(mix.len(), 2);
        for row in &mix {
            assert!((row.normal_share + row.attack_share - 1.0).abs() < 1e-9);
        }
    }
}
