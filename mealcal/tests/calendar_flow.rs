mod common;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{calendar, d, file_store_config, open_store};
use mealcal::models::{Lookup, Slot, UpsertMeal, UpsertWeeklyMemo};
use mealcal::period;
use mealcal::view::{CalendarState, ViewState};

#[tokio::test]
async fn upsert_on_natural_key_keeps_one_record() {
    let dir = TempDir::new().unwrap();
    let service = calendar(open_store(&file_store_config(&dir)).await);
    let date = d("2025-01-08");

    let soup = service
        .save_meal(UpsertMeal::new(date, Slot::Lunch, "soup"))
        .await
        .unwrap();
    let rice = service
        .save_meal(UpsertMeal::new(date, Slot::Lunch, "rice"))
        .await
        .unwrap();

    assert_eq!(soup.id, rice.id);
    assert_eq!(soup.created_at, rice.created_at);

    let meals = service.meals_in_range(date, date).await.unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].memo, "rice");
}

#[tokio::test]
async fn range_is_inclusive_and_ordered() {
    let dir = TempDir::new().unwrap();
    let service = calendar(open_store(&file_store_config(&dir)).await);
    let p = period::period_containing(d("2025-01-08"));

    for (date, slot) in [
        (p.end_date, Slot::Breakfast),
        (p.start_date, Slot::Other),
        (p.start_date, Slot::Breakfast),
        (p.start_date, Slot::Dinner),
        (period::next_period_start(p.start_date), Slot::Lunch),
    ] {
        service
            .save_meal(UpsertMeal::new(date, slot, "x"))
            .await
            .unwrap();
    }

    let meals = service.meals_in_range(p.start_date, p.end_date).await.unwrap();
    let keys: Vec<_> = meals.iter().map(|m| (m.date, m.slot)).collect();
    assert_eq!(
        keys,
        vec![
            (p.start_date, Slot::Breakfast),
            (p.start_date, Slot::Dinner),
            (p.start_date, Slot::Other),
            (p.end_date, Slot::Breakfast),
        ]
    );
}

#[tokio::test]
async fn deleted_meal_is_gone_from_later_reads() {
    let dir = TempDir::new().unwrap();
    let service = calendar(open_store(&file_store_config(&dir)).await);
    let date = d("2025-02-03");

    let meal = service
        .save_meal(UpsertMeal::new(date, Slot::Dinner, "stew"))
        .await
        .unwrap();
    service.delete_meal(&meal.id).await.unwrap();

    let view = service.load_period(date).await.unwrap();
    assert!(view.meal(date, Slot::Dinner).is_none());
    assert_eq!(view.meal_count(), 0);
}

#[tokio::test]
async fn weekly_memo_round_trip_and_absence() {
    let dir = TempDir::new().unwrap();
    let service = calendar(open_store(&file_store_config(&dir)).await);
    let monday = d("2025-01-13");

    assert_eq!(service.get_weekly_memo(monday).await.unwrap(), Lookup::Absent);

    service
        .save_weekly_memo(UpsertWeeklyMemo::new(monday, "rice x2"))
        .await
        .unwrap();
    let found = service.get_weekly_memo(monday).await.unwrap().into_option();
    assert_eq!(found.map(|m| m.memo), Some("rice x2".to_string()));
}

#[tokio::test]
async fn records_survive_reopening_the_store() {
    let dir = TempDir::new().unwrap();
    let config = file_store_config(&dir);
    let date = d("2025-03-04");

    {
        let service = calendar(open_store(&config).await);
        service
            .save_meal(UpsertMeal::new(date, Slot::Breakfast, "granola"))
            .await
            .unwrap();
    }

    let service = calendar(open_store(&config).await);
    let meals = service.meals_in_range(date, date).await.unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].memo, "granola");
}

#[tokio::test]
async fn state_ignores_a_load_that_finishes_after_navigation() {
    let dir = TempDir::new().unwrap();
    let service = calendar(open_store(&file_store_config(&dir)).await);
    let today = d("2025-01-08");
    service
        .save_meal(UpsertMeal::new(today, Slot::Lunch, "udon"))
        .await
        .unwrap();

    let mut state = CalendarState::new(today, Default::default());
    let first = state.period_start;
    let slow = service.load(state.period()).await;

    let second = state.next();
    let fresh = service.load(state.period()).await;

    assert!(!state.apply_loaded(first, slow));
    assert!(state.apply_loaded(second, fresh));
    match &state.view {
        ViewState::Ready(view) => {
            assert_eq!(view.period.start_date, second);
            assert_eq!(view.meal_count(), 0);
        }
        other => panic!("unexpected view: {other:?}"),
    }
}
