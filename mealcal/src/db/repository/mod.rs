mod meals;
mod preferences;
mod weekly_memos;

pub use meals::MealRepository;
pub use preferences::PreferenceRepository;
pub use weekly_memos::WeeklyMemoRepository;
