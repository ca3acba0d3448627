//! Grouping of matched zones into selective and household collection.

use serde::Serialize;

use crate::model::{NOT_AVAILABLE, ScheduleResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One collection schedule ready for display.
pub struct CollectionSlot {
    /// Collection frequency.
    pub frequency: String,
    /// Raw shift code.
    pub shift: String,
    /// Translated shift label.
    pub shift_label: String,
    /// Time window of the collection.
    pub time_window: String,
    /// Operation type the slot was classified from.
    pub operation_type: String,
}

impl From<&ScheduleResult> for CollectionSlot {
    fn from(result: &ScheduleResult) -> Self {
        Self {
            frequency: result.frequency.clone(),
            shift: result.shift.clone(),
            shift_label: shift_label(&result.shift),
            time_window: result.time_window.clone(),
            operation_type: result.operation_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Schedules for a point, split by collection category.
pub struct AggregatedSchedule {
    /// Neighborhood of the first matched zone.
    pub neighborhood: String,
    /// Sector of the first matched zone.
    pub sector: String,
    /// Selective (recyclable) collection slots.
    pub selective: Vec<CollectionSlot>,
    /// General household collection slots.
    pub general: Vec<CollectionSlot>,
}

impl AggregatedSchedule {
    /// Whether no zone contributed a slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selective.is_empty() && self.general.is_empty()
    }
}

/// Partition results on whether their operation type contains `selective_marker`.
#[must_use]
pub fn aggregate(results: &[ScheduleResult], selective_marker: &str) -> AggregatedSchedule {
    let (selective, general): (Vec<&ScheduleResult>, Vec<&ScheduleResult>) = results
        .iter()
        .partition(|result| result.operation_type.contains(selective_marker));

    let first = results.first();
    AggregatedSchedule {
        neighborhood: first.map_or_else(|| NOT_AVAILABLE.to_owned(), |result| result.neighborhood.clone()),
        sector: first.map_or_else(|| NOT_AVAILABLE.to_owned(), |result| result.sector.clone()),
        selective: selective.into_iter().map(CollectionSlot::from).collect(),
        general: general.into_iter().map(CollectionSlot::from).collect(),
    }
}

/// Translate a shift code into a display label.
///
/// Unknown codes are returned unchanged.
#[must_use]
pub fn shift_label(shift: &str) -> String {
    let code = shift.to_uppercase();
    if code.contains("DIURNO") {
        "Morning".to_owned()
    } else if code.contains("NOTURNO") {
        "Evening".to_owned()
    } else if code.contains("VESPERTINO") {
        "Afternoon".to_owned()
    } else {
        shift.to_owned()
    }
}
