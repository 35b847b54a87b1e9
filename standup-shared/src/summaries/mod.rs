/// Cross-user note aggregation
///
/// - [`period`]: `today`/`week`/`month` and their inclusive date windows
/// - [`aggregate`]: fetching notes for a set of users and grouping them

pub mod aggregate;
pub mod period;
