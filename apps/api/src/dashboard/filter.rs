//! Record filtering for the dashboard, the export and the filtered listing.
//!
//! A record passes when its decision date is inside the inclusive range and it
//! matches every optional criterion that is set. Text criteria are
//! case-insensitive substring matches; everything else is equality.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::decision::{DecisionRecord, DecisionStatus, DecisionType, LabelError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// First day of the previous month through the last day of `today`'s month.
    pub fn default_for(today: NaiveDate) -> Self {
        let month_start = today.with_day(1).unwrap_or(today);
        let start = month_start
            .checked_sub_months(Months::new(1))
            .unwrap_or(month_start);
        let end = month_start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends. Zero when `end < start`.
    pub fn inclusive_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    pub range: DateRange,
    pub decisao: Option<DecisionType>,
    pub cidade: Option<String>,
    pub nome: Option<String>,
    pub status: Option<DecisionStatus>,
    pub deseja_gdc: Option<bool>,
}

impl FilterCriteria {
    #[cfg(test)]
    pub fn for_range(range: DateRange) -> Self {
        Self {
            range,
            decisao: None,
            cidade: None,
            nome: None,
            status: None,
            deseja_gdc: None,
        }
    }

    pub fn matches(&self, record: &DecisionRecord) -> bool {
        if !self.range.contains(record.data_decisao) {
            return false;
        }
        if let Some(decisao) = self.decisao {
            if record.decisao != decisao {
                return false;
            }
        }
        if let Some(cidade) = active_text(&self.cidade) {
            match &record.cidade {
                Some(value) if contains_ignore_case(value, cidade) => {}
                _ => return false,
            }
        }
        if let Some(nome) = active_text(&self.nome) {
            if !contains_ignore_case(&record.nome, nome) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(deseja_gdc) = self.deseja_gdc {
            if record.deseja_gdc != deseja_gdc {
                return false;
            }
        }
        true
    }
}

/// Keeps the records matching `criteria`, in input order.
pub fn apply_filters<'a>(
    records: &'a [DecisionRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a DecisionRecord> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn active_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Query string form
// ────────────────────────────────────────────────────────────────────────────

/// Filter parameters as they arrive in a query string. Blank values mean
/// "no filter", the way the select boxes send "Todas".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub decisao: Option<String>,
    pub cidade: Option<String>,
    pub nome: Option<String>,
    pub status: Option<String>,
    pub deseja_gdc: Option<bool>,
}

impl FilterQuery {
    /// True when the caller asked for anything beyond the default listing.
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && blank(&self.decisao)
            && blank(&self.cidade)
            && blank(&self.nome)
            && blank(&self.status)
            && self.deseja_gdc.is_none()
    }

    pub fn into_criteria(self, today: NaiveDate) -> Result<FilterCriteria, LabelError> {
        let default_range = DateRange::default_for(today);
        let decisao = parse_label(&self.decisao, DecisionType::from_label)?;
        let status = parse_label(&self.status, DecisionStatus::from_label)?;
        Ok(FilterCriteria {
            range: DateRange::new(
                self.start.unwrap_or(default_range.start),
                self.end.unwrap_or(default_range.end),
            ),
            decisao,
            cidade: self.cidade.filter(|v| !v.trim().is_empty()),
            nome: self.nome.filter(|v| !v.trim().is_empty()),
            status,
            deseja_gdc: self.deseja_gdc,
        })
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn parse_label<T>(
    value: &Option<String>,
    parse: fn(&str) -> Result<T, LabelError>,
) -> Result<Option<T>, LabelError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => parse(label).map(Some),
    }
}
