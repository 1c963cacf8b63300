pub mod categorical;
pub mod cloud_encoder;
pub mod imputer;
pub mod pipeline;
pub mod quality;
pub mod taxonomy;
pub mod units;

pub use categorical::CategoricalEncoder;
pub use cloud_encoder::CloudLayerEncoder;
pub use imputer::{ImputationSummary, Imputer};
pub use pipeline::{CleaningReport, MetarCleaner};
pub use quality::{QualityChecker, QualityReport, RangeViolation, ViolationType};
