pub mod period;

pub use period::{parse_instant, period_key, PeriodWindow, Range};
