//! Explicit, serializable calendar state.
//!
//! Everything a client needs to render the two-week grid lives here as plain
//! data: the loaded period (records keyed by natural key), whether it is
//! loading or failed, which cell is being edited, the current notice and the
//! theme. Responses are applied through methods so that late results for a
//! period the user has already navigated away from are dropped.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MealError;
use crate::models::{Meal, MealKey, Slot, Theme, WeeklyMemo};
use crate::period::{self, Period};

/// Meals and weekly memos for one period, at most one record per natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodView {
    pub period: Period,
    #[serde(serialize_with = "values_as_seq", deserialize_with = "meals_by_key")]
    meals: BTreeMap<MealKey, Meal>,
    #[serde(
        serialize_with = "values_as_seq",
        deserialize_with = "weekly_memos_by_week"
    )]
    weekly_memos: BTreeMap<NaiveDate, WeeklyMemo>,
}

/// One grid row: a date, its week, and the four slot cells in slot order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRow<'a> {
    pub date: NaiveDate,
    pub week_start: NaiveDate,
    pub meals: [Option<&'a Meal>; 4],
}

impl PeriodView {
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            meals: BTreeMap::new(),
            weekly_memos: BTreeMap::new(),
        }
    }

    /// Build a view from store results. Records outside the period are
    /// dropped; duplicates on a natural key keep the last one seen.
    pub fn new(
        period: Period,
        meals: impl IntoIterator<Item = Meal>,
        weekly_memos: impl IntoIterator<Item = WeeklyMemo>,
    ) -> Self {
        let mut view = Self::empty(period);
        for meal in meals {
            view.merge_meal(meal);
        }
        for memo in weekly_memos {
            view.merge_weekly_memo(memo);
        }
        view
    }

    /// Insert or replace the meal at its natural key. Returns `false` if the
    /// meal belongs to another period.
    pub fn merge_meal(&mut self, meal: Meal) -> bool {
        if !self.period.contains(meal.date) {
            return false;
        }
        self.meals.insert(meal.key(), meal);
        true
    }

    pub fn remove_meal(&mut self, id: &str) -> Option<Meal> {
        let key = self.meals.values().find(|m| m.id == id).map(Meal::key)?;
        self.meals.remove(&key)
    }

    pub fn merge_weekly_memo(&mut self, memo: WeeklyMemo) -> bool {
        if !self.period.week_starts().contains(&memo.week_start_date) {
            return false;
        }
        self.weekly_memos.insert(memo.week_start_date, memo);
        true
    }

    pub fn remove_weekly_memo(&mut self, id: &str) -> Option<WeeklyMemo> {
        let week = self
            .weekly_memos
            .values()
            .find(|m| m.id == id)
            .map(|m| m.week_start_date)?;
        self.weekly_memos.remove(&week)
    }

    pub fn meal(&self, date: NaiveDate, slot: Slot) -> Option<&Meal> {
        self.meals.get(&MealKey::new(date, slot))
    }

    pub fn weekly_memo(&self, week_start: NaiveDate) -> Option<&WeeklyMemo> {
        self.weekly_memos.get(&week_start)
    }

    /// Meals ordered by date, then slot.
    pub fn meals(&self) -> impl Iterator<Item = &Meal> {
        self.meals.values()
    }

    pub fn weekly_memos(&self) -> impl Iterator<Item = &WeeklyMemo> {
        self.weekly_memos.values()
    }

    pub fn meal_count(&self) -> usize {
        self.meals.len()
    }

    /// The 14 rows of the grid.
    pub fn days(&self) -> Vec<DayRow<'_>> {
        self.period
            .dates()
            .map(|date| DayRow {
                date,
                week_start: period::week_start(date),
                meals: Slot::ALL.map(|slot| self.meal(date, slot)),
            })
            .collect()
    }
}

fn values_as_seq<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.values())
}

fn meals_by_key<'de, D>(deserializer: D) -> Result<BTreeMap<MealKey, Meal>, D::Error>
where
    D: Deserializer<'de>,
{
    let meals = Vec::<Meal>::deserialize(deserializer)?;
    Ok(meals.into_iter().map(|m| (m.key(), m)).collect())
}

fn weekly_memos_by_week<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<NaiveDate, WeeklyMemo>, D::Error>
where
    D: Deserializer<'de>,
{
    let memos = Vec::<WeeklyMemo>::deserialize(deserializer)?;
    Ok(memos.into_iter().map(|m| (m.week_start_date, m)).collect())
}

/// Either the whole period or an error; never a partial view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    Ready(PeriodView),
    Failed { message: String },
}

impl ViewState {
    pub fn ready(&self) -> Option<&PeriodView> {
        match self {
            Self::Ready(view) => Some(view),
            _ => None,
        }
    }

    fn ready_mut(&mut self) -> Option<&mut PeriodView> {
        match self {
            Self::Ready(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarState {
    pub period_start: NaiveDate,
    pub theme: Theme,
    pub editing: Option<MealKey>,
    pub notice: Option<Notice>,
    pub view: ViewState,
}

impl CalendarState {
    pub fn new(today: NaiveDate, theme: Theme) -> Self {
        Self {
            period_start: period::current_period(today).start_date,
            theme,
            editing: None,
            notice: None,
            view: ViewState::Loading,
        }
    }

    pub fn period(&self) -> Period {
        period::period_containing(self.period_start)
    }

    pub fn previous(&mut self) -> NaiveDate {
        self.navigate(period::previous_period_start(self.period_start))
    }

    pub fn next(&mut self) -> NaiveDate {
        self.navigate(period::next_period_start(self.period_start))
    }

    pub fn today(&mut self, today: NaiveDate) -> NaiveDate {
        self.navigate(period::current_period(today).start_date)
    }

    /// Jump to the period containing `date`. Returns the start that must
    /// now be loaded.
    pub fn go_to(&mut self, date: NaiveDate) -> NaiveDate {
        self.navigate(period::period_containing(date).start_date)
    }

    fn navigate(&mut self, start: NaiveDate) -> NaiveDate {
        if start != self.period_start {
            self.period_start = start;
            self.view = ViewState::Loading;
            self.editing = None;
        }
        self.period_start
    }

    /// Apply the result of loading the period that started at
    /// `requested_start`. Returns `false` when the user has since moved to
    /// another period and the result was dropped.
    pub fn apply_loaded(
        &mut self,
        requested_start: NaiveDate,
        result: Result<PeriodView, MealError>,
    ) -> bool {
        if requested_start != self.period_start {
            tracing::debug!(
                requested = %requested_start,
                current = %self.period_start,
                "dropping result for superseded period"
            );
            return false;
        }

        self.view = match result {
            Ok(view) => ViewState::Ready(view),
            Err(error) => {
                tracing::warn!(error = %error, "period failed to load");
                ViewState::Failed {
                    message: error.to_string(),
                }
            }
        };
        true
    }

    /// Open the editor on a cell of the displayed period.
    pub fn open_editor(&mut self, key: MealKey) -> bool {
        if !self.period().contains(key.date) {
            return false;
        }
        self.editing = Some(key);
        true
    }

    pub fn close_editor(&mut self) {
        self.editing = None;
    }

    /// Meal under the editor, if the cell already has one.
    pub fn editing_meal(&self) -> Option<&Meal> {
        let key = self.editing?;
        self.view.ready()?.meal(key.date, key.slot)
    }

    pub fn apply_saved_meal(&mut self, meal: Meal) {
        if let Some(view) = self.view.ready_mut() {
            view.merge_meal(meal);
        }
        self.editing = None;
        self.notice = Some(Notice::success("Meal saved"));
    }

    pub fn apply_deleted_meal(&mut self, id: &str) {
        if let Some(view) = self.view.ready_mut() {
            view.remove_meal(id);
        }
        self.editing = None;
        self.notice = Some(Notice::success("Meal deleted"));
    }

    pub fn apply_saved_weekly_memo(&mut self, memo: WeeklyMemo) {
        if let Some(view) = self.view.ready_mut() {
            view.merge_weekly_memo(memo);
        }
        self.notice = Some(Notice::success("Weekly memo saved"));
    }

    pub fn apply_deleted_weekly_memo(&mut self, id: &str) {
        if let Some(view) = self.view.ready_mut() {
            view.remove_weekly_memo(id);
        }
        self.notice = Some(Notice::success("Weekly memo deleted"));
    }

    /// Surface a failed mutation. The editor stays open so the input is
    /// not lost.
    pub fn report_error(&mut self, error: &MealError) {
        self.notice = Some(Notice::error(error.to_string()));
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}
