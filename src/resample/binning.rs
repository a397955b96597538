//! Assignment of timestamps to output periods.
//!
//! Each base frequency numbers its periods with a plain integer (minutes, hours or days
//! since the Unix epoch, Monday-start weeks, months since year 0, years). A multiplied
//! frequency groups `mulfac` consecutive periods, counted from an origin near the first
//! timestamp: midnight of its day for sub-daily frequencies, its own period otherwise.
//!
//! Every period is labelled by its start. For weeks that means Monday through Sunday,
//! labelled by the Monday. This differs from pandas' `W-MON` (the alias reported by
//! [`TsBase::pandas_alias`]), which closes weeks on the right and labels them by the
//! Monday that ends them.
use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::error::ResampleError;
use crate::tstype::{TsBase, TsType};

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86400;
/// 1970-01-01 was a Thursday, so Monday-start weeks are offset by 3 days from the epoch.
const EPOCH_WEEKDAY_OFFSET: i64 = 3;

fn period_index(base: TsBase, t: DateTime<Utc>) -> i64 {
    let secs = t.timestamp();
    match base {
        TsBase::Minutely => secs.div_euclid(SECS_PER_MINUTE),
        TsBase::Hourly => secs.div_euclid(SECS_PER_HOUR),
        TsBase::Daily => secs.div_euclid(SECS_PER_DAY),
        TsBase::Weekly => (secs.div_euclid(SECS_PER_DAY) + EPOCH_WEEKDAY_OFFSET).div_euclid(7),
        TsBase::Monthly => t.year() as i64 * 12 + t.month0() as i64,
        TsBase::Yearly => t.year() as i64,
        // Rejected when the binner is constructed
        TsBase::Native => 0,
    }
}

fn period_start(base: TsBase, idx: i64) -> Option<DateTime<Utc>> {
    match base {
        TsBase::Minutely => DateTime::from_timestamp(idx * SECS_PER_MINUTE, 0),
        TsBase::Hourly => DateTime::from_timestamp(idx * SECS_PER_HOUR, 0),
        TsBase::Daily => DateTime::from_timestamp(idx * SECS_PER_DAY, 0),
        TsBase::Weekly => {
            DateTime::from_timestamp((idx * 7 - EPOCH_WEEKDAY_OFFSET) * SECS_PER_DAY, 0)
        }
        TsBase::Monthly => {
            let year = i32::try_from(idx.div_euclid(12)).ok()?;
            let month = idx.rem_euclid(12) as u32 + 1;
            Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
        }
        TsBase::Yearly => {
            let year = i32::try_from(idx).ok()?;
            Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
        }
        TsBase::Native => None,
    }
}

/// Maps timestamps to the number of the output period they fall in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PeriodBinner {
    base: TsBase,
    mulfac: i64,
    origin: i64,
}

impl PeriodBinner {
    pub(crate) fn new(freq: &TsType, first: DateTime<Utc>) -> Result<Self, ResampleError> {
        let base = freq.base();
        if base == TsBase::Native {
            return Err(ResampleError::UnsupportedFrequency(freq.to_string()));
        }

        let origin = match base {
            TsBase::Minutely | TsBase::Hourly => {
                let midnight = first.timestamp().div_euclid(SECS_PER_DAY) * SECS_PER_DAY;
                let midnight = DateTime::from_timestamp(midnight, 0).ok_or_else(|| {
                    ResampleError::invalid_input(format!("timestamp {first} out of range"))
                })?;
                period_index(base, midnight)
            }
            _ => period_index(base, first),
        };

        Ok(Self { base, mulfac: freq.mulfac() as i64, origin })
    }

    pub(crate) fn bin(&self, t: DateTime<Utc>) -> i64 {
        (period_index(self.base, t) - self.origin).div_euclid(self.mulfac)
    }

    /// Start time of output period `bin`.
    pub(crate) fn start(&self, bin: i64) -> Result<DateTime<Utc>, ResampleError> {
        period_start(self.base, self.origin + bin * self.mulfac).ok_or_else(|| {
            ResampleError::invalid_input(format!("period {bin} of {} is out of range", self.base))
        })
    }
}

/// Group row indices by output period.
///
/// Returns the start time of every period from the one containing the earliest
/// timestamp to the one containing the latest, and for each the rows that fall in it.
/// Periods without any rows are kept (with no indices) so that the output has no gaps.
pub(crate) fn group_by_period(
    times: &[DateTime<Utc>],
    freq: &TsType,
) -> Result<(Vec<DateTime<Utc>>, Vec<Vec<usize>>), ResampleError> {
    let Some(&first) = times.iter().min() else {
        return Ok((vec![], vec![]));
    };

    let binner = PeriodBinner::new(freq, first)?;
    let bins: Vec<i64> = times.iter().map(|&t| binner.bin(t)).collect();
    // min() above guarantees at least one element
    let first_bin = bins.iter().copied().min().unwrap_or(0);
    let last_bin = bins.iter().copied().max().unwrap_or(0);

    let nperiods = usize::try_from(last_bin - first_bin + 1)
        .map_err(|_| ResampleError::invalid_input("time index spans too many periods"))?;
    let mut groups = vec![vec![]; nperiods];
    for (row, b) in bins.iter().enumerate() {
        groups[(b - first_bin) as usize].push(row);
    }

    let starts = (first_bin..=last_bin)
        .map(|b| binner.start(b))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((starts, groups))
}
