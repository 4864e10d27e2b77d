use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One of the four meal categories attachable to a date.
///
/// Declaration order is the fixed enumeration order used when sorting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Breakfast,
    Lunch,
    Dinner,
    Other,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Breakfast, Slot::Lunch, Slot::Dinner, Slot::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Other => "other",
        }
    }

    /// Position in the enumeration order, mirrored by the SQL sort expression.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Breakfast => 0,
            Self::Lunch => 1,
            Self::Dinner => 2,
            Self::Other => 3,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown meal slot: {s}")),
        }
    }
}

/// Natural key of a meal record. Orders by date, then slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MealKey {
    pub date: NaiveDate,
    pub slot: Slot,
}

impl MealKey {
    pub fn new(date: NaiveDate, slot: Slot) -> Self {
        Self { date, slot }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub date: NaiveDate,
    pub slot: Slot,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meal {
    pub fn key(&self) -> MealKey {
        MealKey::new(self.date, self.slot)
    }

    /// First line of the memo, as shown in a grid cell.
    pub fn headline(&self) -> &str {
        self.memo.lines().next().unwrap_or_default()
    }
}

/// Insert-or-update request keyed on `(date, slot)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMeal {
    pub date: NaiveDate,
    pub slot: Slot,
    pub memo: String,
    /// Used only when the upsert inserts a new row.
    pub id: Option<String>,
}

impl UpsertMeal {
    pub fn new(date: NaiveDate, slot: Slot, memo: impl Into<String>) -> Self {
        Self {
            date,
            slot,
            memo: memo.into(),
            id: None,
        }
    }

    pub fn key(&self) -> MealKey {
        MealKey::new(self.date, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trips_through_text() {
        for slot in Slot::ALL {
            assert_eq!(slot.as_str().parse::<Slot>().unwrap(), slot);
        }
        assert!("brunch".parse::<Slot>().is_err());
    }

    #[test]
    fn slot_order_matches_ordinal() {
        let mut slots = vec![Slot::Other, Slot::Lunch, Slot::Dinner, Slot::Breakfast];
        slots.sort();
        assert_eq!(slots, Slot::ALL.to_vec());
        assert!(Slot::ALL.windows(2).all(|w| w[0].ordinal() < w[1].ordinal()));
    }

    #[test]
    fn meal_key_orders_by_date_then_slot() {
        let d1 = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        assert!(MealKey::new(d1, Slot::Other) < MealKey::new(d2, Slot::Breakfast));
        assert!(MealKey::new(d1, Slot::Breakfast) < MealKey::new(d1, Slot::Lunch));
    }

    #[test]
    fn headline_is_first_line() {
        let now = Utc::now();
        let meal = Meal {
            id: "m1".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            slot: Slot::Dinner,
            memo: "pasta\nwith salad".into(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(meal.headline(), "pasta");
    }
}
