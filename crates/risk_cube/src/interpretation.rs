//! Decoding of the depth axis into default, close-out and MPOR flow values.
//!
//! Two simulation layouts are supported:
//!
//! ```text
//! Regular grid                       MPOR grid
//! dates:  d0   d1   d2   ...         valuation: v0   v1   ...
//!                                    close-out: c0   c1   ...
//! slot 0: npv  npv  npv              slot a:    V(v0) V(v1)
//! slot 1: flow flow flow             slot b:    V(c0) V(c1)
//!                                    slot c:    flow  flow
//! close-out(di) = npv(di+1)          close-out(vi) = slot b at i
//! ```

use chrono::NaiveDate;
use tracing::warn;

use crate::cube::ScenarioCube;
use crate::date_grid::DateGrid;
use crate::error::{check_index, Axis, CubeError};
use crate::scenario_data::{AggregationScenarioData, AggregationScenarioDataType};

/// Reads default-date and close-out values from a cube.
///
/// All values are returned from the perspective selected by `flip_view`:
/// when set, every value is negated.
pub trait CubeInterpretation: Send + Sync {
    /// Whether values are negated.
    fn flip_view(&self) -> bool;

    /// Whether close-out values come from the next grid date.
    fn is_regular_grid(&self) -> bool;

    /// Whether the cube carries an MPOR flow slot.
    fn has_mpor_flows(&self, cube: &dyn ScenarioCube) -> bool;

    /// Value at the default date.
    fn default_npv(
        &self,
        cube: &dyn ScenarioCube,
        id: usize,
        date: usize,
        sample: usize,
    ) -> Result<f64, CubeError>;

    /// Value at the close-out date following `date`.
    fn close_out_npv(
        &self,
        cube: &dyn ScenarioCube,
        id: usize,
        date: usize,
        sample: usize,
    ) -> Result<f64, CubeError>;

    /// Cash flows paid during the margin period of risk after `date`.
    ///
    /// A failed read is logged and treated as no flow.
    fn mpor_flows(&self, cube: &dyn ScenarioCube, id: usize, date: usize, sample: usize) -> f64;

    /// Calendar days between `date` and its close-out date.
    fn mpor_calendar_days(&self, cube: &dyn ScenarioCube, date: usize) -> Result<i64, CubeError>;

    /// Close-out date for `date`.
    fn close_out_date(&self, cube: &dyn ScenarioCube, date: usize) -> Result<NaiveDate, CubeError>;

    /// Scenario data observed at the default date.
    fn default_scenario_data(
        &self,
        data: &dyn AggregationScenarioData,
        kind: AggregationScenarioDataType,
        date: usize,
        sample: usize,
        qualifier: &str,
    ) -> Result<f64, CubeError> {
        data.get(date, sample, kind, qualifier)
    }

    /// Scenario data observed at the close-out date.
    fn close_out_scenario_data(
        &self,
        data: &dyn AggregationScenarioData,
        kind: AggregationScenarioDataType,
        date: usize,
        sample: usize,
        qualifier: &str,
    ) -> Result<f64, CubeError>;

    /// `-1` under flip view, else `1`.
    fn sign(&self) -> f64 {
        if self.flip_view() {
            -1.0
        } else {
            1.0
        }
    }
}

fn signed_flows(
    interpretation: &dyn CubeInterpretation,
    cube: &dyn ScenarioCube,
    id: usize,
    date: usize,
    sample: usize,
    flows_index: usize,
) -> f64 {
    match cube.get(id, date, sample, flows_index) {
        Ok(v) => interpretation.sign() * v,
        Err(e) => {
            warn!(id, date, sample, error = %e, "failed to read MPOR flows, using 0");
            0.0
        }
    }
}

/// Cube simulated on a plain date grid.
///
/// The close-out value for date `d` is the value stored at `d + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularCubeInterpretation {
    flip_view: bool,
    npv_index: usize,
    flows_index: usize,
}

impl RegularCubeInterpretation {
    /// Values in slot 0, flows in slot 1.
    pub fn new(flip_view: bool) -> Self {
        Self::with_indices(flip_view, 0, 1)
    }

    /// Explicit value and flow slots.
    pub fn with_indices(flip_view: bool, npv_index: usize, flows_index: usize) -> Self {
        Self {
            flip_view,
            npv_index,
            flows_index,
        }
    }
}

impl CubeInterpretation for RegularCubeInterpretation {
    fn flip_view(&self) -> bool {
        self.flip_view
    }

    fn is_regular_grid(&self) -> bool {
        true
    }

    fn has_mpor_flows(&self, cube: &dyn ScenarioCube) -> bool {
        cube.depth() > self.flows_index
    }

    fn default_npv(
        &self,
        cube: &dyn ScenarioCube,
        id: usize,
        date: usize,
        sample: usize,
    ) -> Result<f64, CubeError> {
        Ok(self.sign() * cube.get(id, date, sample, self.npv_index)?)
    }

    fn close_out_npv(
        &self,
        cube: &dyn ScenarioCube,
        id: usize,
        date: usize,
        sample: usize,
    ) -> Result<f64, CubeError> {
        Ok(self.sign() * cube.get(id, date + 1, sample, self.npv_index)?)
    }

    fn mpor_flows(&self, cube: &dyn ScenarioCube, id: usize, date: usize, sample: usize) -> f64 {
        signed_flows(self, cube, id, date, sample, self.flows_index)
    }

    fn mpor_calendar_days(&self, cube: &dyn ScenarioCube, date: usize) -> Result<i64, CubeError> {
        let dates = cube.dates();
        check_index(Axis::Date, date + 1, dates.len())?;
        Ok((dates[date + 1] - dates[date]).num_days())
    }

    fn close_out_date(&self, cube: &dyn ScenarioCube, date: usize) -> Result<NaiveDate, CubeError> {
        let dates = cube.dates();
        check_index(Axis::Date, date + 1, dates.len())?;
        Ok(dates[date + 1])
    }

    fn close_out_scenario_data(
        &self,
        data: &dyn AggregationScenarioData,
        kind: AggregationScenarioDataType,
        date: usize,
        sample: usize,
        qualifier: &str,
    ) -> Result<f64, CubeError> {
        data.get(date + 1, sample, kind, qualifier)
    }
}

/// Cube simulated on a valuation / close-out date grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MporGridCubeInterpretation {
    flip_view: bool,
    grid: DateGrid,
    default_index: usize,
    close_out_index: usize,
    flows_index: usize,
}

impl MporGridCubeInterpretation {
    /// Default values in slot 0, close-out values in slot 1, flows in slot 2.
    pub fn new(flip_view: bool, grid: DateGrid) -> Self {
        Self::with_indices(flip_view, grid, 0, 1, 2)
    }

    /// Explicit depth slots.
    pub fn with_indices(
        flip_view: bool,
        grid: DateGrid,
        default_index: usize,
        close_out_index: usize,
        flows_index: usize,
    ) -> Self {
        Self {
            flip_view,
            grid,
            default_index,
            close_out_index,
            flows_index,
        }
    }

    /// The valuation / close-out grid.
    pub fn grid(&self) -> &DateGrid {
        &self.grid
    }
}

impl CubeInterpretation for MporGridCubeInterpretation {
    fn flip_view(&self) -> bool {
        self.flip_view
    }

    fn is_regular_grid(&self) -> bool {
        false
    }

    fn has_mpor_flows(&self, cube: &dyn ScenarioCube) -> bool {
        cube.depth() > self.flows_index
    }

    fn default_npv(
        &self,
        cube: &dyn ScenarioCube,
        id: usize,
        date: usize,
        sample: usize,
    ) -> Result<f64, CubeError> {
        Ok(self.sign() * cube.get(id, date, sample, self.default_index)?)
    }

    fn close_out_npv(
        &self,
        cube: &dyn ScenarioCube,
        id: usize,
        date: usize,
        sample: usize,
    ) -> Result<f64, CubeError> {
        Ok(self.sign() * cube.get(id, date, sample, self.close_out_index)?)
    }

    fn mpor_flows(&self, cube: &dyn ScenarioCube, id: usize, date: usize, sample: usize) -> f64 {
        signed_flows(self, cube, id, date, sample, self.flows_index)
    }

    fn mpor_calendar_days(&self, _cube: &dyn ScenarioCube, date: usize) -> Result<i64, CubeError> {
        check_index(Axis::Date, date, self.grid.len())?;
        let valuation = self.grid.valuation_dates()[date];
        let close_out = self.grid.close_out_dates()[date];
        let days = (close_out - valuation).num_days();
        if days <= 0 {
            return Err(CubeError::NonPositiveMpor {
                index: date,
                valuation,
                close_out,
            });
        }
        Ok(days)
    }

    fn close_out_date(
        &self,
        _cube: &dyn ScenarioCube,
        date: usize,
    ) -> Result<NaiveDate, CubeError> {
        check_index(Axis::Date, date, self.grid.len())?;
        Ok(self.grid.close_out_dates()[date])
    }

    fn close_out_scenario_data(
        &self,
        _data: &dyn AggregationScenarioData,
        kind: AggregationScenarioDataType,
        _date: usize,
        _sample: usize,
        _qualifier: &str,
    ) -> Result<f64, CubeError> {
        match kind {
            AggregationScenarioDataType::Numeraire => Ok(1.0),
            _ => Err(CubeError::Unsupported(
                "close-out scenario data on an MPOR grid",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::DoublePrecisionCube;
    use crate::scenario_data::InMemoryAggregationScenarioData;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn regular_cube(depth: usize) -> DoublePrecisionCube {
        let c = DoublePrecisionCube::new(
            d(2024, 1, 1),
            ["T"],
            vec![d(2024, 1, 15), d(2024, 2, 1), d(2024, 3, 1)],
            2,
            depth,
        )
        .unwrap();
        for date in 0..3 {
            for s in 0..2 {
                c.set(10.0 * date as f64 + s as f64, 0, date, s, 0).unwrap();
                if depth > 1 {
                    c.set(-1.0, 0, date, s, 1).unwrap();
                }
            }
        }
        c
    }

    #[test]
    fn test_regular_close_out_reads_next_date() {
        let c = regular_cube(2);
        let interp = RegularCubeInterpretation::new(false);
        assert_eq!(interp.default_npv(&c, 0, 1, 1).unwrap(), 11.0);
        assert_eq!(interp.close_out_npv(&c, 0, 1, 1).unwrap(), 21.0);
        assert!(matches!(
            interp.close_out_npv(&c, 0, 2, 1),
            Err(CubeError::IndexOutOfRange { axis: Axis::Date, index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_regular_calendar_days() {
        let c = regular_cube(1);
        let interp = RegularCubeInterpretation::new(false);
        assert_eq!(interp.mpor_calendar_days(&c, 0).unwrap(), 17);
        assert_eq!(interp.mpor_calendar_days(&c, 1).unwrap(), 29);
        assert!(interp.mpor_calendar_days(&c, 2).is_err());
        assert_eq!(interp.close_out_date(&c, 1).unwrap(), d(2024, 3, 1));
    }

    #[test]
    fn test_flip_view_negates() {
        let c = regular_cube(2);
        let plain = RegularCubeInterpretation::new(false);
        let flipped = RegularCubeInterpretation::new(true);
        assert_eq!(
            flipped.default_npv(&c, 0, 2, 0).unwrap(),
            -plain.default_npv(&c, 0, 2, 0).unwrap()
        );
        assert_eq!(flipped.mpor_flows(&c, 0, 0, 0), 1.0);
        assert_eq!(plain.mpor_flows(&c, 0, 0, 0), -1.0);
    }

    #[test]
    fn test_missing_flow_slot_reads_zero() {
        let c = regular_cube(1);
        let interp = RegularCubeInterpretation::new(false);
        assert!(!interp.has_mpor_flows(&c));
        assert_eq!(interp.mpor_flows(&c, 0, 0, 0), 0.0);
        assert_eq!(interp.mpor_flows(&c, 5, 0, 0), 0.0);
    }

    #[test]
    fn test_mpor_grid_non_positive_span_is_fatal() {
        let c = regular_cube(3);
        let grid = DateGrid::new(
            vec![d(2024, 1, 15), d(2024, 2, 1), d(2024, 3, 1)],
            vec![d(2024, 1, 29), d(2024, 2, 1), d(2024, 2, 20)],
        )
        .unwrap();
        let interp = MporGridCubeInterpretation::new(false, grid);
        assert_eq!(interp.mpor_calendar_days(&c, 0).unwrap(), 14);
        assert!(matches!(
            interp.mpor_calendar_days(&c, 1),
            Err(CubeError::NonPositiveMpor { index: 1, .. })
        ));
        assert!(matches!(
            interp.mpor_calendar_days(&c, 2),
            Err(CubeError::NonPositiveMpor { index: 2, .. })
        ));
        assert!(interp.mpor_calendar_days(&c, 3).is_err());
    }

    #[test]
    fn test_scenario_data_offsets() {
        let mut data = InMemoryAggregationScenarioData::new(3, 1);
        for date in 0..3 {
            data.set(1.0 + date as f64, date, 0, AggregationScenarioDataType::FxSpot, "USD")
                .unwrap();
        }
        let kind = AggregationScenarioDataType::FxSpot;
        let regular = RegularCubeInterpretation::new(false);
        assert_eq!(regular.default_scenario_data(&data, kind, 1, 0, "USD").unwrap(), 2.0);
        assert_eq!(regular.close_out_scenario_data(&data, kind, 1, 0, "USD").unwrap(), 3.0);

        let grid = DateGrid::with_mpor(vec![d(2024, 1, 1)], 10).unwrap();
        let mpor = MporGridCubeInterpretation::new(false, grid);
        assert_eq!(mpor.default_scenario_data(&data, kind, 1, 0, "USD").unwrap(), 2.0);
        assert!(matches!(
            mpor.close_out_scenario_data(&data, kind, 1, 0, "USD"),
            Err(CubeError::Unsupported(_))
        ));
        assert_eq!(
            mpor.close_out_scenario_data(&data, AggregationScenarioDataType::Numeraire, 1, 0, "")
                .unwrap(),
            1.0
        );
    }
}
