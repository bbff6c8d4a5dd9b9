//! Dataset access port.

use std::path::Path;

use crate::domain::dataset::EnrichedRow;
use crate::domain::error::Result;
use crate::domain::price_point::PricePoint;
use crate::domain::strategy::Decision;

pub trait DataPort {
    /// Loads a price dataset, sorted by time with duplicate timestamps removed.
    fn load_points(&self, path: &Path) -> Result<Vec<PricePoint>>;

    /// Loads a decision log, one decision per replayed row.
    fn load_decisions(&self, path: &Path) -> Result<Vec<Decision>>;

    fn write_enriched(&self, path: &Path, rows: &[EnrichedRow]) -> Result<()>;
}
