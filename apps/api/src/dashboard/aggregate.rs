use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dashboard::filter::{apply_filters, DateRange, FilterCriteria};
use crate::models::decision::DecisionRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Decision,
    Celebration,
    Status,
}

impl GroupField {
    fn label_of(&self, record: &DecisionRecord) -> Option<&'static str> {
        match self {
            GroupField::Decision => Some(record.decisao.as_str()),
            GroupField::Celebration => record.celebracao.map(|c| c.as_str()),
            GroupField::Status => Some(record.status.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// `dd/MM`, the chart axis label.
    pub label: String,
    pub count: usize,
}

/// Counts records per distinct value of `field`, in first-seen order.
/// Records with no value for the field are skipped.
pub fn group_counts(records: &[&DecisionRecord], field: GroupField) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = Vec::new();
    let mut index: HashMap<&'static str, usize> = HashMap::new();

    for record in records {
        let Some(name) = field.label_of(record) else {
            continue;
        };
        match index.get(name) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(name, groups.len());
                groups.push(GroupCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    groups
}

/// Buckets records by decision day, ascending.
pub fn time_series(records: &[&DecisionRecord]) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        *days.entry(record.data_decisao).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(date, count)| DayBucket {
            date,
            label: date.format("%d/%m").to_string(),
            count,
        })
        .collect()
}

/// `count` divided by the inclusive day span of `range`, rounded to one decimal.
pub fn average_per_day(count: usize, range: &DateRange) -> f64 {
    let days = range.inclusive_days();
    if count == 0 || days == 0 {
        return 0.0;
    }
    (count as f64 / days as f64 * 10.0).round() / 10.0
}

// ────────────────────────────────────────────────────────────────────────────
// Dashboard view
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub decisoes: Vec<String>,
    pub cidades: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub total_records: usize,
    pub filtered_count: usize,
    pub average_per_day: f64,
    pub by_decision: Vec<GroupCount>,
    pub by_celebration: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub timeline: Vec<DayBucket>,
    pub options: FilterOptions,
    pub records: Vec<DecisionRecord>,
}

/// Derives everything the dashboard shows from the full record set.
pub fn build_dashboard(all: &[DecisionRecord], criteria: &FilterCriteria) -> DashboardView {
    let filtered = apply_filters(all, criteria);

    DashboardView {
        criteria: criteria.clone(),
        total_records: all.len(),
        filtered_count: filtered.len(),
        average_per_day: average_per_day(filtered.len(), &criteria.range),
        by_decision: group_counts(&filtered, GroupField::Decision),
        by_celebration: group_counts(&filtered, GroupField::Celebration),
        by_status: group_counts(&filtered, GroupField::Status),
        timeline: time_series(&filtered),
        options: filter_options(all),
        records: filtered.into_iter().cloned().collect(),
    }
}

fn filter_options(all: &[DecisionRecord]) -> FilterOptions {
    let mut decisoes: Vec<String> = Vec::new();
    let mut cidades: Vec<String> = Vec::new();
    for record in all {
        let decisao = record.decisao.as_str();
        if !decisoes.iter().any(|d| d == decisao) {
            decisoes.push(decisao.to_string());
        }
        if let Some(cidade) = record.cidade.as_deref().filter(|c| !c.trim().is_empty()) {
            if !cidades.iter().any(|c| c == cidade) {
                cidades.push(cidade.to_string());
            }
        }
    }
    FilterOptions { decisoes, cidades }
}
