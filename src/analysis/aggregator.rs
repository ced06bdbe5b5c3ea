//! Record aggregation into tier and region buckets.
//!
//! A single pass over the normalized relation; each record increments the
//! count and adds its ARR to the total of exactly one tier bucket and one
//! region bucket. Pure accumulation with no ordering dependency.

use crate::models::{Region, RegionBreakdown, SiteRecord, Tier, TierBreakdown};

/// Aggregate normalized records into the two breakdowns.
pub fn aggregate(records: &[SiteRecord]) -> (TierBreakdown, RegionBreakdown) {
    let mut tiers = TierBreakdown::default();
    let mut regions = RegionBreakdown::default();

    for record in records {
        tiers.get_mut(Tier::of(record.arr_total)).add(record.arr_total);
        regions
            .get_mut(Region::of(record.longitude))
            .add(record.arr_total);
    }

    (tiers, regions)
}
