pub mod cloud;
pub mod frame;
pub mod observation;

pub use cloud::{AltitudeCategory, CloudCoverage, CloudLayer, FlightRules};
pub use frame::{Column, ColumnValues, FeatureFrame};
pub use observation::MetarObservation;
