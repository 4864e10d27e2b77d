pub mod calendar;
pub(crate) mod health;
pub mod meals;
pub mod periods;
pub mod preferences;
pub mod weekly_memos;

pub use health::health_check;
