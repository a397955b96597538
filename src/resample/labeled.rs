use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{ResampleError, UnitConversionError};
use crate::tstype::TsType;
use crate::units::convert_unit_array;

use super::binning::group_by_period;
use super::{AggregationMethod, ResampleOneStep};

/// Several variables (or stations) sharing one time index.
///
/// Time runs along axis 0 of `data`, the labels along axis 1.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    times: Vec<DateTime<Utc>>,
    labels: Vec<String>,
    data: Array2<f64>,
}

impl LabeledArray {
    pub fn new(
        times: Vec<DateTime<Utc>>,
        labels: Vec<String>,
        data: Array2<f64>,
    ) -> Result<Self, ResampleError> {
        let (nt, nl) = data.dim();
        if nt != times.len() || nl != labels.len() {
            return Err(ResampleError::invalid_input(format!(
                "array of shape ({nt}, {nl}) does not match {} timestamps and {} labels",
                times.len(),
                labels.len()
            )));
        }
        Ok(Self { times, labels, data })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// The values for one label, if it exists.
    pub fn column(&self, label: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.labels.iter().position(|l| l == label)?;
        Some(self.data.index_axis(Axis(1), idx))
    }

    /// Convert all values in place, see [`crate::units::convert_unit`].
    pub fn convert_unit(
        &mut self,
        from_unit: &str,
        to_unit: &str,
        var_name: Option<&str>,
        ts_type: Option<&TsType>,
    ) -> Result<f64, UnitConversionError> {
        convert_unit_array(&mut self.data, from_unit, to_unit, var_name, ts_type)
    }
}

impl ResampleOneStep for LabeledArray {
    fn resample_one_step(
        &self,
        freq: &TsType,
        how: AggregationMethod,
        min_num_obs: u32,
    ) -> Result<Self, ResampleError> {
        let (times, groups) = group_by_period(&self.times, freq)?;
        let data = Array2::from_shape_fn((groups.len(), self.labels.len()), |(i, j)| {
            let period_values: Vec<f64> = groups[i].iter().map(|&r| self.data[[r, j]]).collect();
            how.aggregate(&period_values, min_num_obs)
        });
        Ok(Self {
            times,
            labels: self.labels.clone(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use ndarray::Array2;

    fn dt(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn three_days() -> LabeledArray {
        let t0 = dt("2021-01-01T00:00:00Z");
        let times = (0..72).map(|h| t0 + Duration::hours(h)).collect();
        // first label is complete, second is missing most of the second day
        let data = Array2::from_shape_fn((72, 2), |(i, j)| {
            if j == 1 && (24..44).contains(&i) {
                f64::NAN
            } else {
                (j + 1) as f64
            }
        });
        LabeledArray::new(times, vec!["alert".to_string(), "zugspitze".to_string()], data).unwrap()
    }

    #[test]
    fn test_shape_check() {
        let times = vec![dt("2021-01-01T00:00:00Z")];
        let res = LabeledArray::new(times, vec!["a".to_string()], Array2::zeros((2, 1)));
        assert!(matches!(res, Err(ResampleError::InvalidInput(_))));
    }

    #[test]
    fn test_resample_columns_independently() {
        let arr = three_days();
        let daily = arr
            .resample_one_step(&"daily".parse().unwrap(), AggregationMethod::Mean, 6)
            .unwrap();
        assert_eq!(daily.data().dim(), (3, 2));
        assert_eq!(daily.labels(), arr.labels());

        let alert = daily.column("alert").unwrap();
        assert!(alert.iter().all(|v| (*v - 1.0).abs() < 1e-12));

        let zugspitze = daily.column("zugspitze").unwrap();
        assert_relative_eq!(zugspitze[0], 2.0);
        assert!(zugspitze[1].is_nan());
        assert_relative_eq!(zugspitze[2], 2.0);
    }

    #[test]
    fn test_convert_unit() {
        let mut arr = three_days();
        arr.convert_unit("ug m-3", "ng m-3", None, None).unwrap();
        assert_relative_eq!(arr.column("zugspitze").unwrap()[0], 2000.0);
        assert!(arr.column("nope").is_none());
    }
}
