pub mod insight;
pub mod reading;
pub mod stats;

pub use insight::Insight;
pub use reading::{NewReading, ParseUtilityError, Reading, ReadingPatch, UtilityFilter, UtilityType};
pub use stats::{ChartDataPoint, DateRange, Statistics};
