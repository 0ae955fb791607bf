//! Classification and filtering of lookup results.
//!
//! Categories are plain substring predicates over a record's text fields. A record may sit
//! in several categories (say `hmt` and `telecom`) or in none; either way it always shows
//! under `All`.

use crate::lookup::{LocationRecord, QueryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Country name that marks a record as domestic.
pub const HOME_COUNTRY: &str = "中国";

const MOBILE: &str = "移动";
const TELECOM: &str = "电信";
const UNICOM: &str = "联通";
const CARRIERS: [&str; 3] = [MOBILE, TELECOM, UNICOM];

/// Hong Kong, Macau, Taiwan.
const TERRITORIES: [&str; 3] = ["香港", "澳门", "台湾"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    /// No filter.
    #[default]
    All,
    Foreign,
    Mobile,
    Telecom,
    Unicom,
    /// Hong Kong / Macau / Taiwan.
    Hmt,
    Other,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 7] = [
        Self::All,
        Self::Foreign,
        Self::Mobile,
        Self::Telecom,
        Self::Unicom,
        Self::Hmt,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Foreign => "foreign",
            Self::Mobile => "mobile",
            Self::Telecom => "telecom",
            Self::Unicom => "unicom",
            Self::Hmt => "hmt",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "全部",
            Self::Foreign => "国外",
            Self::Mobile => "移动",
            Self::Telecom => "电信",
            Self::Unicom => "联通",
            Self::Hmt => "港澳台",
            Self::Other => "其他",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "none" | "" => Ok(Self::All),
            "foreign" => Ok(Self::Foreign),
            "mobile" => Ok(Self::Mobile),
            "telecom" => Ok(Self::Telecom),
            "unicom" => Ok(Self::Unicom),
            "hmt" => Ok(Self::Hmt),
            "other" => Ok(Self::Other),
            _ => Err(format!(
                "Unknown filter '{}'. Use one of: all, foreign, mobile, telecom, unicom, hmt, other.",
                s
            )),
        }
    }
}

fn in_territory(province: &str) -> bool {
    TERRITORIES.iter().any(|t| province.contains(t))
}

/// Whether `record` belongs to `category`.
pub fn matches(record: &LocationRecord, category: FilterCategory) -> bool {
    let isp = record.isp.to_lowercase();
    let country = record.country.as_str();
    let province = record.province.as_str();

    match category {
        FilterCategory::All => true,
        FilterCategory::Foreign => !country.is_empty() && country != HOME_COUNTRY,
        FilterCategory::Mobile => isp.contains(MOBILE),
        FilterCategory::Telecom => isp.contains(TELECOM),
        FilterCategory::Unicom => isp.contains(UNICOM),
        FilterCategory::Hmt => in_territory(province),
        FilterCategory::Other => {
            country == HOME_COUNTRY
                && !CARRIERS.iter().any(|c| isp.contains(c))
                && !in_territory(province)
        }
    }
}

/// Every concrete category the record falls into. `All` is implied and never included.
pub fn classify(record: &LocationRecord) -> BTreeSet<FilterCategory> {
    FilterCategory::ALL
        .into_iter()
        .filter(|c| *c != FilterCategory::All && matches(record, *c))
        .collect()
}

/// The ordered sub-sequence visible under `category`.
///
/// `All` returns the input unchanged. Any other category keeps only successful lookups
/// that match it.
pub fn apply_filter(results: &[QueryResult], category: FilterCategory) -> Vec<QueryResult> {
    if category == FilterCategory::All {
        return results.to_vec();
    }
    results
        .iter()
        .filter(|r| r.record().is_some_and(|rec| matches(rec, category)))
        .cloned()
        .collect()
}
