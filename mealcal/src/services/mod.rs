mod cache_sweeper;
mod calendar;
mod preferences;

pub use cache_sweeper::CacheSweeper;
pub use calendar::CalendarService;
pub use preferences::PreferenceService;
