use chrono::{DateTime, Utc};

use crate::error::{ResampleError, TemporalResolutionError, UnitConversionError};
use crate::tstype::TsType;
use crate::units::convert_unit;

use super::binning::group_by_period;
use super::{AggregationMethod, ResampleOneStep};

/// A single variable indexed by time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(times: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, ResampleError> {
        if times.len() != values.len() {
            return Err(ResampleError::invalid_input(format!(
                "time series has {} timestamps but {} values",
                times.len(),
                values.len()
            )));
        }
        Ok(Self { times, values })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<DateTime<Utc>>, Vec<f64>) {
        (self.times, self.values)
    }

    /// Resolution of the time index, from its most common spacing.
    pub fn infer_ts_type(&self) -> Result<TsType, TemporalResolutionError> {
        TsType::infer(&self.times)
    }

    /// Convert the values in place, see [`crate::units::convert_unit`].
    pub fn convert_unit(
        &mut self,
        from_unit: &str,
        to_unit: &str,
        var_name: Option<&str>,
        ts_type: Option<&TsType>,
    ) -> Result<f64, UnitConversionError> {
        convert_unit(&mut self.values, from_unit, to_unit, var_name, ts_type)
    }
}

impl ResampleOneStep for TimeSeries {
    fn resample_one_step(
        &self,
        freq: &TsType,
        how: AggregationMethod,
        min_num_obs: u32,
    ) -> Result<Self, ResampleError> {
        let (times, groups) = group_by_period(&self.times, freq)?;
        let values = groups
            .iter()
            .map(|rows| {
                let period_values: Vec<f64> = rows.iter().map(|&r| self.values[r]).collect();
                how.aggregate(&period_values, min_num_obs)
            })
            .collect();
        Ok(Self { times, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use rstest::{fixture, rstest};

    fn dt(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// Two days of hourly data with the value equal to the hour of day,
    /// where the second day only has its first four hours.
    #[fixture]
    fn hourly() -> TimeSeries {
        let t0 = dt("2021-06-01T00:00:00Z");
        let times = (0..28).map(|h| t0 + Duration::hours(h)).collect();
        let values = (0..28).map(|h| (h % 24) as f64).collect();
        TimeSeries::new(times, values).unwrap()
    }

    #[test]
    fn test_length_mismatch() {
        let err = TimeSeries::new(vec![dt("2021-01-01T00:00:00Z")], vec![]).unwrap_err();
        assert!(matches!(err, ResampleError::InvalidInput(_)));
    }

    #[rstest]
    fn test_daily_mean(hourly: TimeSeries) {
        let daily = hourly
            .resample_one_step(&"daily".parse().unwrap(), AggregationMethod::Mean, 0)
            .unwrap();
        assert_eq!(daily.times(), &[dt("2021-06-01T00:00:00Z"), dt("2021-06-02T00:00:00Z")]);
        assert_relative_eq!(daily.values()[0], 11.5);
        assert_relative_eq!(daily.values()[1], 1.5);
    }

    #[rstest]
    fn test_daily_min_num_obs_masks(hourly: TimeSeries) {
        let daily = hourly
            .resample_one_step(&"daily".parse().unwrap(), AggregationMethod::Max, 6)
            .unwrap();
        assert_eq!(daily.len(), 2);
        assert_relative_eq!(daily.values()[0], 23.0);
        assert!(daily.values()[1].is_nan());
    }

    #[rstest]
    fn test_multiplied_frequency(hourly: TimeSeries) {
        let out = hourly
            .resample_one_step(&"12hourly".parse().unwrap(), AggregationMethod::Count, 0)
            .unwrap();
        assert_eq!(out.values(), &[12.0, 12.0, 4.0]);
        assert_eq!(out.times()[2], dt("2021-06-02T00:00:00Z"));
    }

    #[rstest]
    fn test_infer(hourly: TimeSeries) {
        assert_eq!(hourly.infer_ts_type().unwrap(), "hourly".parse().unwrap());
    }

    #[rstest]
    fn test_convert_unit(mut hourly: TimeSeries) {
        hourly.convert_unit("mg m-3", "ug m-3", None, None).unwrap();
        assert_relative_eq!(hourly.values()[3], 3000.0);
    }
}
