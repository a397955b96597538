pub mod error;
pub mod tstype;
pub mod units;
pub mod variables;
pub mod config;
pub mod resample;
pub mod logging;

pub use tstype::{TsBase, TsType};
pub use units::{convert_unit, get_unit_conversion_fac};
pub use resample::{ResampleOptions, TimeResampler};
