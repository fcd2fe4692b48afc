pub mod stats;

pub use stats::StatsReport;
