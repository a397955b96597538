//! Temporal resolutions ("ts_types") and the ordering algebra between them.
//!
//! A [`TsType`] is a base frequency ([`TsBase`]) together with an integer
//! multiplication factor, so "3hourly" is the hourly base with a factor of 3.
//! Resolutions are ordered by the length of one period: a `TsType` that represents
//! fewer seconds is "less than" (finer than, i.e. a higher resolution than) one
//! that represents more seconds.
//!
//! Equality is by canonical string form, which is *not* the same thing as equal
//! duration. "24hourly" and "daily" describe the same period length but are neither
//! equal nor ordered with respect to each other; [`PartialOrd::partial_cmp`] returns
//! `None` for such pairs.
//!
//! Strings are accepted in three dialects:
//!
//! - the canonical tokens ("minutely", "hourly", "daily", "weekly", "monthly", "yearly", "native"),
//! - any of these with a leading integer ("3hourly"),
//! - pandas offset aliases ("H", "MS", "AS", "3D", ...).
use std::{cmp::Ordering, fmt::Display, str::FromStr, sync::OnceLock};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::error::TemporalResolutionError;
use crate::units::Unit;

/// Tolerance, in percent of one period, used when matching interval lengths to a frequency.
pub const TOL_SECS_PERCENT: f64 = 5.0;

static TS_TYPE_REGEX: OnceLock<regex::Regex> = OnceLock::new();

static CANONICAL_BASES: [TsBase; 6] = [
    TsBase::Minutely,
    TsBase::Hourly,
    TsBase::Daily,
    TsBase::Weekly,
    TsBase::Monthly,
    TsBase::Yearly,
];

/// Pandas offset aliases, both the legacy and current spellings.
static FROM_PANDAS: &[(&str, TsBase)] = &[
    ("T", TsBase::Minutely),
    ("min", TsBase::Minutely),
    ("H", TsBase::Hourly),
    ("h", TsBase::Hourly),
    ("D", TsBase::Daily),
    ("W", TsBase::Weekly),
    ("W-MON", TsBase::Weekly),
    ("MS", TsBase::Monthly),
    ("M", TsBase::Monthly),
    ("ME", TsBase::Monthly),
    ("AS", TsBase::Yearly),
    ("YS", TsBase::Yearly),
    ("A", TsBase::Yearly),
    ("Y", TsBase::Yearly),
];

/// The base frequencies a [`TsType`] can be built on.
///
/// The variants are declared finest to coarsest, with `Native` (the
/// resolution of the original data, whatever that is) last.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TsBase {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Native,
}

impl TsBase {
    /// The bases that have a defined period length, finest first.
    pub fn canonical() -> &'static [TsBase] {
        &CANONICAL_BASES
    }

    /// Position of this base in [`TsBase::canonical`], `None` for `Native`.
    pub fn canonical_index(&self) -> Option<usize> {
        CANONICAL_BASES.iter().position(|b| b == self)
    }

    /// Largest multiplication factor allowed on this base, `None` if unbounded.
    pub fn max_mulfac(&self) -> Option<u32> {
        match self {
            TsBase::Minutely => Some(360),
            TsBase::Hourly => Some(168),
            TsBase::Daily => Some(180),
            TsBase::Weekly => Some(104),
            TsBase::Monthly => Some(120),
            TsBase::Yearly | TsBase::Native => None,
        }
    }

    /// Pandas offset alias. Resampled weeks are labelled by their starting Monday,
    /// not by the closing Monday that pandas uses for `W-MON`.
    pub fn pandas_alias(&self) -> Option<&'static str> {
        match self {
            TsBase::Minutely => Some("T"),
            TsBase::Hourly => Some("H"),
            TsBase::Daily => Some("D"),
            TsBase::Weekly => Some("W-MON"),
            TsBase::Monthly => Some("MS"),
            TsBase::Yearly => Some("AS"),
            TsBase::Native => None,
        }
    }

    pub fn numpy_code(&self) -> Option<&'static str> {
        match self {
            TsBase::Minutely => Some("m"),
            TsBase::Hourly => Some("h"),
            TsBase::Daily => Some("D"),
            TsBase::Weekly => Some("W"),
            TsBase::Monthly => Some("M"),
            TsBase::Yearly => Some("Y"),
            TsBase::Native => None,
        }
    }

    /// The SI-style time unit for one period of this base, as used in rate units like "mg m-2 d-1".
    pub fn si_token(&self) -> Option<&'static str> {
        match self {
            TsBase::Minutely => Some("min"),
            TsBase::Hourly => Some("h"),
            TsBase::Daily => Some("d"),
            TsBase::Weekly => Some("week"),
            TsBase::Monthly => Some("month"),
            TsBase::Yearly => Some("yr"),
            TsBase::Native => None,
        }
    }

    fn from_pandas(alias: &str) -> Option<TsBase> {
        FROM_PANDAS
            .iter()
            .find(|(a, _)| *a == alias)
            .map(|(_, base)| *base)
    }
}

/// A temporal resolution: a base frequency and a positive multiplication factor.
///
/// Construct one from a string (`"3hourly".parse::<TsType>()`), from a base
/// (`TsType::from(TsBase::Daily)`) or with [`TsType::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TsType {
    base: TsBase,
    mulfac: u32,
}

impl TsType {
    pub fn new(base: TsBase, mulfac: u32) -> Result<Self, TemporalResolutionError> {
        check_mulfac(base, mulfac)?;
        Ok(Self { base, mulfac })
    }

    pub fn base(&self) -> TsBase {
        self.base
    }

    pub fn mulfac(&self) -> u32 {
        self.mulfac
    }

    /// Change the multiplication factor, checking it against the base's maximum.
    pub fn set_mulfac(&mut self, mulfac: u32) -> Result<(), TemporalResolutionError> {
        check_mulfac(self.base, mulfac)?;
        self.mulfac = mulfac;
        Ok(())
    }

    /// Returns `true` if `value` can be interpreted as a `TsType`.
    pub fn is_valid(value: &str) -> bool {
        value.parse::<TsType>().is_ok()
    }

    /// Pandas offset alias for this frequency, e.g. "3H" or "MS".
    pub fn to_pandas_freq(&self) -> Result<String, TemporalResolutionError> {
        let alias = self
            .base
            .pandas_alias()
            .ok_or_else(|| TemporalResolutionError::no_equivalent(self, "pandas"))?;
        if self.mulfac == 1 {
            Ok(alias.to_string())
        } else {
            Ok(format!("{}{alias}", self.mulfac))
        }
    }

    /// Datetime64 unit code, always including the multiplication factor (e.g. "1D").
    pub fn to_numpy_freq(&self) -> Result<String, TemporalResolutionError> {
        let code = self
            .base
            .numpy_code()
            .ok_or_else(|| TemporalResolutionError::no_equivalent(self, "numpy"))?;
        Ok(format!("{}{code}", self.mulfac))
    }

    pub fn datetime64_str(&self) -> Result<String, TemporalResolutionError> {
        Ok(format!("datetime64[{}]", self.to_numpy_freq()?))
    }

    /// SI time unit for one period, e.g. "d" or "3h".
    pub fn to_si(&self) -> Result<String, TemporalResolutionError> {
        let si = self
            .base
            .si_token()
            .ok_or_else(|| TemporalResolutionError::no_equivalent(self, "SI"))?;
        if self.mulfac > 1 {
            Ok(format!("{}{si}", self.mulfac))
        } else {
            Ok(si.to_string())
        }
    }

    /// The CF time unit word normally used for a time axis at this resolution.
    pub fn cf_base_unit(&self) -> Result<&'static str, TemporalResolutionError> {
        match self.base {
            TsBase::Minutely => Ok("minutes"),
            TsBase::Hourly => Ok("hours"),
            TsBase::Daily | TsBase::Weekly | TsBase::Monthly | TsBase::Yearly => Ok("days"),
            TsBase::Native => Err(TemporalResolutionError::no_equivalent(self, "CF")),
        }
    }

    /// Number of seconds in one period. Months and years use the udunits
    /// (tropical year) definitions, so these are calendar averages.
    pub fn num_secs(&self) -> Result<f64, TemporalResolutionError> {
        let si = self
            .base
            .si_token()
            .ok_or_else(|| TemporalResolutionError::UndefinedDuration(self.to_string()))?;
        // The SI tokens are all known time units, so this only fails if the unit table is broken.
        let period = Unit::parse(si)
            .and_then(|u| u.factor_to(&Unit::second()))
            .map_err(|_| TemporalResolutionError::UndefinedDuration(self.to_string()))?;
        Ok(period * self.mulfac as f64)
    }

    /// Tolerance in seconds when matching an interval to this frequency.
    pub fn tol_secs(&self) -> Result<f64, TemporalResolutionError> {
        Ok((self.num_secs()? * TOL_SECS_PERCENT / 100.0).ceil())
    }

    /// Whether an interval of `total_seconds` is within tolerance of one period.
    pub fn check_match_total_seconds(
        &self,
        total_seconds: f64,
    ) -> Result<bool, TemporalResolutionError> {
        let num_secs = self.num_secs()?;
        let tol = self.tol_secs()?;
        Ok(total_seconds >= num_secs - tol && total_seconds <= num_secs + tol)
    }

    /// Find the frequency that best matches an interval length.
    ///
    /// A direct match to one of the bases wins outright. Otherwise, every base shorter
    /// than the interval is scanned for a multiplication factor within tolerance, and
    /// the candidate closest in absolute seconds is returned. On ties the coarser base
    /// wins, so three days gives "3daily" rather than "72hourly".
    ///
    /// Non-finite and non-positive intervals never match.
    pub fn from_total_seconds(total_seconds: f64) -> Result<Self, TemporalResolutionError> {
        if !total_seconds.is_finite() || total_seconds <= 0.0 {
            return Err(TemporalResolutionError::NoMatchingFrequency(total_seconds));
        }

        let mut candidates = vec![];
        for &base in TsBase::canonical() {
            let tst = TsType::from(base);
            if tst.check_match_total_seconds(total_seconds)? {
                return Ok(tst);
            } else if tst.num_secs()? < total_seconds {
                candidates.push(tst);
            }
        }

        let mut best: Option<(f64, TsType)> = None;
        for cand in candidates {
            // Unbounded bases only need the nearest whole multiple
            let mulfacs = match cand.base.max_mulfac() {
                Some(max) => 1..=max,
                None => {
                    let n = (total_seconds / cand.num_secs()?).round();
                    if n >= 1.0 && n <= u32::MAX as f64 {
                        n as u32..=n as u32
                    } else {
                        continue;
                    }
                }
            };
            for mulfac in mulfacs {
                let tst = TsType { base: cand.base, mulfac };
                if !tst.check_match_total_seconds(total_seconds)? {
                    continue;
                }
                let diff = (total_seconds - tst.num_secs()?).abs();
                if best.map_or(true, |(best_diff, _)| diff <= best_diff) {
                    best = Some((diff, tst));
                }
            }
        }

        best.map(|(_, tst)| tst)
            .ok_or(TemporalResolutionError::NoMatchingFrequency(total_seconds))
    }

    /// Infer the resolution of a time index from its most common spacing.
    pub fn infer(times: &[DateTime<Utc>]) -> Result<Self, TemporalResolutionError> {
        let unique = times.iter().sorted().dedup().collect_vec();
        if unique.len() < 2 {
            return Err(TemporalResolutionError::TooFewTimestamps(unique.len()));
        }

        let counts = unique
            .windows(2)
            .map(|w| (*w[1] - *w[0]).num_seconds())
            .counts();
        // Ties go to the shorter step so that the result does not depend on hash order
        let (modal_step, _) = counts
            .into_iter()
            .max_by(|(s1, n1), (s2, n2)| n1.cmp(n2).then(s2.cmp(s1)))
            .ok_or(TemporalResolutionError::TooFewTimestamps(unique.len()))?;

        Self::from_total_seconds(modal_step as f64)
    }

    /// The next finer frequency. A multiplication factor above 1 is dropped first,
    /// so "3hourly" becomes "hourly".
    pub fn next_higher(&self) -> Result<Self, TemporalResolutionError> {
        let idx = self
            .base
            .canonical_index()
            .ok_or_else(|| TemporalResolutionError::no_neighbor(self, "finer"))?;
        if self.mulfac > 1 {
            return Ok(TsType::from(self.base));
        }
        if idx == 0 {
            return Err(TemporalResolutionError::no_neighbor(self, "finer"));
        }
        Ok(TsType::from(CANONICAL_BASES[idx - 1]))
    }

    /// The next coarser frequency.
    ///
    /// Yearly is extended by incrementing its multiplication factor. Frequencies with a
    /// factor above 1 move to the smallest multiple of the next base that is strictly
    /// longer than themselves, so "48hourly" becomes "3daily".
    pub fn next_lower(&self) -> Result<Self, TemporalResolutionError> {
        let idx = self
            .base
            .canonical_index()
            .ok_or_else(|| TemporalResolutionError::no_neighbor(self, "coarser"))?;

        if idx == CANONICAL_BASES.len() - 1 {
            let mulfac = self
                .mulfac
                .checked_add(1)
                .ok_or_else(|| TemporalResolutionError::no_neighbor(self, "coarser"))?;
            return TsType::new(self.base, mulfac);
        }

        let next_base = CANONICAL_BASES[idx + 1];
        if self.mulfac == 1 {
            return Ok(TsType::from(next_base));
        }

        let own_secs = self.num_secs()?;
        let next_secs = TsType::from(next_base).num_secs()?;
        let max_mulfac = next_base
            .max_mulfac()
            .unwrap_or_else(|| ((own_secs / next_secs).ceil() as u32).saturating_add(1));
        for mulfac in 1..=max_mulfac {
            let tst = TsType { base: next_base, mulfac };
            if tst.num_secs()? > own_secs {
                return Ok(tst);
            }
        }

        Err(TemporalResolutionError::no_neighbor(self, "coarser"))
    }
}

fn check_mulfac(base: TsBase, mulfac: u32) -> Result<(), TemporalResolutionError> {
    let max = base.max_mulfac();
    if mulfac == 0 || max.is_some_and(|m| mulfac > m) {
        return Err(TemporalResolutionError::MulfacOutOfBounds {
            base: base.to_string(),
            mulfac,
            max: max.unwrap_or(u32::MAX),
        });
    }
    Ok(())
}

impl From<TsBase> for TsType {
    fn from(base: TsBase) -> Self {
        Self { base, mulfac: 1 }
    }
}

impl FromStr for TsType {
    type Err = TemporalResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = TS_TYPE_REGEX.get_or_init(|| {
            regex::Regex::new(r"^(?<mulfac>\d+)?(?<base>.+)$")
                .expect("Could not compile ts_type regex")
        });

        let s = s.trim();
        let caps = re
            .captures(s)
            .ok_or_else(|| TemporalResolutionError::InvalidTsType(s.to_string()))?;

        let mulfac = match caps.name("mulfac") {
            Some(m) => m
                .as_str()
                .parse::<u32>()
                .map_err(|_| TemporalResolutionError::InvalidTsType(s.to_string()))?,
            None => 1,
        };

        let base_str = &caps["base"];
        let base = TsBase::from_str(base_str)
            .ok()
            .or_else(|| TsBase::from_pandas(base_str))
            .ok_or_else(|| TemporalResolutionError::InvalidTsType(s.to_string()))?;

        TsType::new(base, mulfac)
    }
}

impl TryFrom<&str> for TsType {
    type Error = TemporalResolutionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for TsType {
    type Error = TemporalResolutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TsType> for String {
    fn from(value: TsType) -> Self {
        value.to_string()
    }
}

impl Display for TsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.mulfac == 1 {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}{}", self.mulfac, self.base)
        }
    }
}

impl PartialOrd for TsType {
    /// Orders by period length. Distinct frequencies with the same period length
    /// (and anything compared with "native") are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        let self_secs = self.num_secs().ok()?;
        let other_secs = other.num_secs().ok()?;
        match self_secs.partial_cmp(&other_secs)? {
            Ordering::Equal => None,
            ord => Some(ord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use rstest::rstest;

    fn ts(s: &str) -> TsType {
        s.parse().unwrap()
    }

    #[rstest]
    #[case("daily", TsBase::Daily, 1)]
    #[case("3hourly", TsBase::Hourly, 3)]
    #[case("monthly", TsBase::Monthly, 1)]
    #[case("native", TsBase::Native, 1)]
    #[case("MS", TsBase::Monthly, 1)]
    #[case("AS", TsBase::Yearly, 1)]
    #[case("D", TsBase::Daily, 1)]
    #[case("3H", TsBase::Hourly, 3)]
    #[case("T", TsBase::Minutely, 1)]
    #[case("W-MON", TsBase::Weekly, 1)]
    #[case("15min", TsBase::Minutely, 15)]
    fn test_parse(#[case] s: &str, #[case] base: TsBase, #[case] mulfac: u32) {
        let tst = ts(s);
        assert_eq!(tst.base(), base);
        assert_eq!(tst.mulfac(), mulfac);
    }

    #[rstest]
    #[case("blaa")]
    #[case("")]
    #[case("3")]
    #[case("Daily")]
    #[case("169hourly")]
    #[case("361minutely")]
    #[case("0daily")]
    fn test_parse_invalid(#[case] s: &str) {
        assert!(s.parse::<TsType>().is_err(), "'{s}' should not parse");
        assert!(!TsType::is_valid(s));
    }

    #[test]
    fn test_mulfac_bounds() {
        let err = "181daily".parse::<TsType>().unwrap_err();
        assert_eq!(
            err,
            TemporalResolutionError::MulfacOutOfBounds {
                base: "daily".to_string(),
                mulfac: 181,
                max: 180,
            }
        );

        // yearly has no maximum
        assert_eq!(ts("500yearly").mulfac(), 500);

        let mut tst = ts("hourly");
        tst.set_mulfac(168).unwrap();
        assert_eq!(tst.to_string(), "168hourly");
        assert!(tst.set_mulfac(169).is_err());
        assert_eq!(tst.mulfac(), 168, "a rejected mulfac must not be stored");
    }

    #[rstest]
    #[case("daily", "daily")]
    #[case("1daily", "daily")]
    #[case("3hourly", "3hourly")]
    #[case("2MS", "2monthly")]
    fn test_display(#[case] s: &str, #[case] expected: &str) {
        assert_eq!(ts(s).to_string(), expected);
    }

    #[rstest]
    #[case("daily", "D", "1D", "d")]
    #[case("3hourly", "3H", "3h", "3h")]
    #[case("monthly", "MS", "1M", "month")]
    #[case("yearly", "AS", "1Y", "yr")]
    #[case("weekly", "W-MON", "1W", "week")]
    #[case("15minutely", "15T", "15m", "15min")]
    fn test_dialects(#[case] s: &str, #[case] pandas: &str, #[case] numpy: &str, #[case] si: &str) {
        let tst = ts(s);
        assert_eq!(tst.to_pandas_freq().unwrap(), pandas);
        assert_eq!(tst.to_numpy_freq().unwrap(), numpy);
        assert_eq!(tst.to_si().unwrap(), si);
    }

    #[test]
    fn test_native_has_no_dialects() {
        let native = ts("native");
        assert!(native.to_pandas_freq().is_err());
        assert!(native.to_numpy_freq().is_err());
        assert!(native.to_si().is_err());
        assert!(native.cf_base_unit().is_err());
        assert_eq!(
            native.num_secs().unwrap_err(),
            TemporalResolutionError::UndefinedDuration("native".to_string())
        );
    }

    #[test]
    fn test_datetime64_and_cf() {
        assert_eq!(ts("3hourly").datetime64_str().unwrap(), "datetime64[3h]");
        assert_eq!(ts("hourly").cf_base_unit().unwrap(), "hours");
        assert_eq!(ts("monthly").cf_base_unit().unwrap(), "days");
    }

    #[rstest]
    #[case("minutely", 60.0)]
    #[case("hourly", 3600.0)]
    #[case("3hourly", 10800.0)]
    #[case("daily", 86400.0)]
    #[case("weekly", 604800.0)]
    #[case("monthly", 2629743.831225)]
    #[case("yearly", 31556925.9747)]
    fn test_num_secs(#[case] s: &str, #[case] expected: f64) {
        assert_relative_eq!(ts(s).num_secs().unwrap(), expected, max_relative = 1e-9);
    }

    #[test]
    fn test_tolerance() {
        let daily = ts("daily");
        assert_eq!(daily.tol_secs().unwrap(), 4320.0);
        assert!(daily.check_match_total_seconds(86400.0).unwrap());
        assert!(daily.check_match_total_seconds(86400.0 + 4320.0).unwrap());
        assert!(daily.check_match_total_seconds(86400.0 - 4320.0).unwrap());
        assert!(!daily.check_match_total_seconds(86400.0 + 4321.0).unwrap());
    }

    #[rstest]
    fn test_from_total_seconds_round_trip(
        #[values("minutely", "hourly", "daily", "weekly", "monthly", "yearly")] base: &str,
        #[values(1, 2, 3, 5, 7, 12, 24, 100)] mulfac: u32,
    ) {
        let base: TsBase = base.parse().unwrap();
        if base.max_mulfac().is_some_and(|m| mulfac > m) {
            return;
        }
        let tst = TsType::new(base, mulfac).unwrap();
        let secs = tst.num_secs().unwrap();
        let back = TsType::from_total_seconds(secs).unwrap();
        assert_relative_eq!(back.num_secs().unwrap(), secs, epsilon = tst.tol_secs().unwrap());
    }

    #[rstest]
    #[case(86400.0, "daily")]
    #[case(3.0 * 86400.0, "3daily")]
    #[case(3.0 * 3600.0, "3hourly")]
    #[case(88000.0, "daily")]
    #[case(3.0 * 2629743.831225, "3monthly")]
    fn test_from_total_seconds(#[case] secs: f64, #[case] expected: &str) {
        assert_eq!(TsType::from_total_seconds(secs).unwrap(), ts(expected));
    }

    #[rstest]
    // shorter than a minute - nothing can match
    #[case(10.0)]
    #[case(1e18)]
    #[case(f64::INFINITY)]
    #[case(f64::NAN)]
    #[case(0.0)]
    #[case(-5.0)]
    fn test_from_total_seconds_no_match(#[case] secs: f64) {
        assert!(matches!(
            TsType::from_total_seconds(secs),
            Err(TemporalResolutionError::NoMatchingFrequency(_))
        ));
    }

    #[test]
    fn test_from_total_seconds_many_years() {
        let secs = TsType::new(TsBase::Yearly, 250).unwrap().num_secs().unwrap();
        assert_eq!(TsType::from_total_seconds(secs).unwrap(), ts("250yearly"));
    }

    #[test]
    fn test_next_lower_at_largest_factor() {
        let tst = TsType::new(TsBase::Yearly, u32::MAX).unwrap();
        assert!(matches!(tst.next_lower(), Err(TemporalResolutionError::NoNeighbor { .. })));
    }

    #[test]
    fn test_infer() {
        let times = (0..8)
            .map(|i| Utc.with_ymd_and_hms(2020, 1, 1, 3 * i, 0, 0).unwrap())
            .collect_vec();
        assert_eq!(TsType::infer(&times).unwrap(), ts("3hourly"));

        // a gap does not change the modal step
        let mut gappy = times.clone();
        gappy.remove(4);
        assert_eq!(TsType::infer(&gappy).unwrap(), ts("3hourly"));

        let err = TsType::infer(&times[..1]).unwrap_err();
        assert_eq!(err, TemporalResolutionError::TooFewTimestamps(1));
    }

    #[rstest]
    #[case("hourly", "minutely")]
    #[case("3hourly", "hourly")]
    #[case("monthly", "weekly")]
    #[case("yearly", "monthly")]
    fn test_next_higher(#[case] s: &str, #[case] expected: &str) {
        assert_eq!(ts(s).next_higher().unwrap(), ts(expected));
    }

    #[test]
    fn test_next_higher_at_finest() {
        assert!(ts("minutely").next_higher().is_err());
        assert!(ts("native").next_higher().is_err());
    }

    #[rstest]
    #[case("minutely", "hourly")]
    #[case("daily", "weekly")]
    #[case("monthly", "yearly")]
    #[case("yearly", "2yearly")]
    #[case("2yearly", "3yearly")]
    #[case("3hourly", "daily")]
    #[case("48hourly", "3daily")]
    #[case("10daily", "2weekly")]
    fn test_next_lower(#[case] s: &str, #[case] expected: &str) {
        assert_eq!(ts(s).next_lower().unwrap(), ts(expected));
    }

    #[test]
    fn test_ordering() {
        assert!(ts("hourly") < ts("daily"));
        assert!(ts("3hourly") < ts("daily"));
        assert!(ts("monthly") > ts("daily"));
        assert!(ts("daily") >= ts("daily"));
        assert!(ts("daily") <= ts("daily"));
        assert!(ts("2daily") > ts("daily"));

        let mut sorted = vec![ts("yearly"), ts("hourly"), ts("monthly"), ts("3hourly")];
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, vec![ts("hourly"), ts("3hourly"), ts("monthly"), ts("yearly")]);
    }

    #[test]
    fn test_equal_duration_is_not_equal() {
        // Equality is by canonical form while ordering is by duration, so two
        // spellings of the same period length are neither equal nor ordered.
        let a = ts("24hourly");
        let b = ts("daily");
        assert_eq!(a.num_secs().unwrap(), b.num_secs().unwrap());
        assert_ne!(a, b);
        assert!(!(a < b));
        assert!(!(a > b));
        assert_eq!(a.partial_cmp(&b), None);

        assert_eq!(ts("7daily").partial_cmp(&ts("weekly")), None);
        assert_eq!(ts("D"), ts("daily"));
    }

    #[test]
    fn test_native_is_unordered() {
        assert_eq!(ts("native").partial_cmp(&ts("daily")), None);
        assert_eq!(ts("native").partial_cmp(&ts("native")), Some(Ordering::Equal));
    }

    #[test]
    fn test_serde() {
        #[derive(Debug, Deserialize, Serialize, PartialEq)]
        struct Wrapper {
            ts_type: TsType,
        }

        let w: Wrapper = toml::from_str(r#"ts_type = "3hourly""#).unwrap();
        assert_eq!(w.ts_type, ts("3hourly"));
        assert_eq!(toml::to_string(&w).unwrap().trim(), r#"ts_type = "3hourly""#);

        assert!(toml::from_str::<Wrapper>(r#"ts_type = "weird""#).is_err());
    }
}
