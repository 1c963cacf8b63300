use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::models::{CloudLayer, ColumnValues, FeatureFrame};
use crate::utils::constants::{CLOUD_LAYER_PREFIX, COL_CLOUDS};

/// Numeric codes for one positional cloud slot: (type, altitude category).
pub type LayerCodes = (i64, i64);

/// Flattens each row's cloud layers into fixed per-slot integer columns.
///
/// Slots follow the order of the report, not altitude. The batch gets as many
/// slots as its most layered row; rows with fewer layers get 0 in the extra
/// slots.
pub struct CloudLayerEncoder;

impl CloudLayerEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn type_column(slot: usize) -> String {
        format!("{}{}_type", CLOUD_LAYER_PREFIX, slot)
    }

    pub fn altitude_column(slot: usize) -> String {
        format!("{}{}_altitude_category", CLOUD_LAYER_PREFIX, slot)
    }

    /// Encode one row's layers in report order.
    pub fn encode_layers(&self, layers: &[CloudLayer]) -> Vec<LayerCodes> {
        layers
            .iter()
            .map(|layer| (layer.coverage().code(), layer.altitude_category().code()))
            .collect()
    }

    /// Replace the `clouds` column with slot columns; returns the slot count.
    ///
    /// A frame without a `clouds` column is left untouched.
    pub fn apply(&self, frame: &mut FeatureFrame) -> Result<usize> {
        let layers = match frame.take_column(COL_CLOUDS) {
            Some(ColumnValues::Clouds(layers)) => layers,
            Some(other) => {
                debug!("Ignoring clouds column of kind {}", other.kind());
                return Ok(0);
            }
            None => return Ok(0),
        };

        let encoded: Vec<Vec<LayerCodes>> = layers
            .par_iter()
            .map(|row| self.encode_layers(row))
            .collect();

        let slots = encoded.iter().map(Vec::len).max().unwrap_or(0);

        for slot in 0..slots {
            let codes = |pick: fn(&LayerCodes) -> i64| -> ColumnValues {
                ColumnValues::Integer(
                    encoded
                        .iter()
                        .map(|row| Some(row.get(slot).map(pick).unwrap_or(0)))
                        .collect(),
                )
            };
            frame.push_column(&Self::type_column(slot + 1), codes(|c| c.0))?;
            frame.push_column(&Self::altitude_column(slot + 1), codes(|c| c.1))?;
        }

        debug!("Encoded cloud layers into {} slots", slots);
        Ok(slots)
    }
}

impl Default for CloudLayerEncoder {
    fn default() -> Self {
        Self::new()
    }
}
