//! Data models for the map pipeline.
//!
//! This module contains the core data structures shared across the
//! pipeline stages: raw and normalized records, tier/region buckets,
//! and the normalization report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One fetched row, keyed by field name.
///
/// A `BTreeMap` keeps field keys sorted, so canonical serialization for
/// the change-detection fingerprint falls out of ordinary `serde_json`
/// encoding.
pub type RawRecord = BTreeMap<String, serde_json::Value>;

/// A normalized record: every field the map needs is present and numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Client name shown in the marker popup.
    pub name: String,
    /// Street address shown in the marker popup.
    pub address: String,
    /// Marker latitude in degrees.
    pub latitude: f64,
    /// Marker longitude in degrees.
    pub longitude: f64,
    /// Annual recurring revenue in dollars.
    pub arr_total: f64,
}

/// ARR value tier. Thresholds are inclusive upper bounds evaluated
/// top-down, so a value exactly on a boundary falls into the lower tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    UpTo10K,
    UpTo25K,
    UpTo50K,
    UpTo100K,
    Over100K,
}

/// All tiers in display order (lowest value first).
pub const ALL_TIERS: [Tier; 5] = [
    Tier::UpTo10K,
    Tier::UpTo25K,
    Tier::UpTo50K,
    Tier::UpTo100K,
    Tier::Over100K,
];

impl Tier {
    /// Classify an ARR value.
    pub fn of(arr: f64) -> Self {
        if arr <= 10_000.0 {
            Tier::UpTo10K
        } else if arr <= 25_000.0 {
            Tier::UpTo25K
        } else if arr <= 50_000.0 {
            Tier::UpTo50K
        } else if arr <= 100_000.0 {
            Tier::UpTo100K
        } else {
            Tier::Over100K
        }
    }

    /// Marker and legend swatch color.
    pub fn color(&self) -> &'static str {
        match self {
            Tier::UpTo10K => "green",
            Tier::UpTo25K => "yellow",
            Tier::UpTo50K => "orange",
            Tier::UpTo100K => "red",
            Tier::Over100K => "purple",
        }
    }

    /// Legend label.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::UpTo10K => "< $10K",
            Tier::UpTo25K => "$10K\u{2013}25K",
            Tier::UpTo50K => "$25K\u{2013}50K",
            Tier::UpTo100K => "$50K\u{2013}100K",
            Tier::Over100K => "> $100K",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// U.S. region, partitioned on longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    West,
    Central,
    East,
}

/// All regions in display order (west to east).
pub const ALL_REGIONS: [Region; 3] = [Region::West, Region::Central, Region::East];

/// Longitude boundaries between regions, also drawn as map dividers.
pub const REGION_BOUNDARIES: [f64; 2] = [-109.0, -90.0];

impl Region {
    /// Classify a longitude. Boundary values belong to Central.
    pub fn of(longitude: f64) -> Self {
        if longitude < -109.0 {
            Region::West
        } else if longitude <= -90.0 {
            Region::Central
        } else {
            Region::East
        }
    }

    /// Panel label.
    pub fn label(&self) -> &'static str {
        match self {
            Region::West => "West",
            Region::Central => "Central",
            Region::East => "East",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-bucket accumulator: client count and summed ARR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub count: usize,
    pub total: f64,
}

impl BucketStats {
    /// Fold one record's ARR into the bucket.
    pub fn add(&mut self, arr: f64) {
        self.count += 1;
        self.total += arr;
    }
}

/// Aggregated stats for all five ARR tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBreakdown {
    pub up_to_10k: BucketStats,
    pub up_to_25k: BucketStats,
    pub up_to_50k: BucketStats,
    pub up_to_100k: BucketStats,
    pub over_100k: BucketStats,
}

impl TierBreakdown {
    /// Stats for one tier.
    pub fn get(&self, tier: Tier) -> BucketStats {
        match tier {
            Tier::UpTo10K => self.up_to_10k,
            Tier::UpTo25K => self.up_to_25k,
            Tier::UpTo50K => self.up_to_50k,
            Tier::UpTo100K => self.up_to_100k,
            Tier::Over100K => self.over_100k,
        }
    }

    /// Mutable stats for one tier.
    pub fn get_mut(&mut self, tier: Tier) -> &mut BucketStats {
        match tier {
            Tier::UpTo10K => &mut self.up_to_10k,
            Tier::UpTo25K => &mut self.up_to_25k,
            Tier::UpTo50K => &mut self.up_to_50k,
            Tier::UpTo100K => &mut self.up_to_100k,
            Tier::Over100K => &mut self.over_100k,
        }
    }

    /// Total client count across all tiers.
    pub fn total_count(&self) -> usize {
        ALL_TIERS.iter().map(|t| self.get(*t).count).sum()
    }

    /// Total ARR across all tiers.
    pub fn total_arr(&self) -> f64 {
        ALL_TIERS.iter().map(|t| self.get(*t).total).sum()
    }
}

/// Aggregated stats for the three regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    pub west: BucketStats,
    pub central: BucketStats,
    pub east: BucketStats,
}

impl RegionBreakdown {
    /// Stats for one region.
    pub fn get(&self, region: Region) -> BucketStats {
        match region {
            Region::West => self.west,
            Region::Central => self.central,
            Region::East => self.east,
        }
    }

    /// Mutable stats for one region.
    pub fn get_mut(&mut self, region: Region) -> &mut BucketStats {
        match region {
            Region::West => &mut self.west,
            Region::Central => &mut self.central,
            Region::East => &mut self.east,
        }
    }

    /// Total client count across all regions.
    pub fn total_count(&self) -> usize {
        ALL_REGIONS.iter().map(|r| self.get(*r).count).sum()
    }
}

/// Why a row was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The field was absent from the row.
    #[error("missing field `{0}`")]
    Missing(String),
    /// The field was present but did not parse as a number.
    #[error("non-numeric value in field `{0}`: {1}")]
    NonNumeric(String, String),
}

/// Summary of a normalization pass: how many rows survived and why the
/// rest did not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizationReport {
    /// Rows in the raw input.
    pub input_rows: usize,
    /// Rows that survived coercion and filtering.
    pub kept: usize,
    /// Rows dropped for a missing or non-numeric field.
    pub dropped: usize,
    /// One human-readable reason per dropped row.
    #[serde(skip)]
    pub reasons: Vec<String>,
}

impl NormalizationReport {
    /// True when the output is empty or lost more than half the input.
    /// Usually a sign the source schema does not match expectations.
    pub fn looks_degenerate(&self) -> bool {
        self.input_rows > 0 && (self.kept == 0 || self.kept * 2 < self.input_rows)
    }
}
