mod service;

pub use service::{
    Comparative, ComparisonReport, ReportPoint, ReportService, ReportSummary, SensorReport,
};
