use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 4,
    "name": "Independence Day",
    "date": "2026-08-15",
    "day": "Saturday",
    "type": "HOLIDAY"
}))]
pub struct Holiday {
    pub id: u64,
    pub name: String,
    #[schema(format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Weekday label, e.g. `Monday`.
    pub day: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub holiday_type: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HolidayInput {
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(example = "2026-08-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Defaults to `HOLIDAY`.
    #[serde(rename = "type")]
    #[schema(example = "HOLIDAY")]
    pub holiday_type: Option<String>,
}

pub const DEFAULT_HOLIDAY_TYPE: &str = "HOLIDAY";

/// Full English weekday name for a date.
pub fn weekday_label(date: NaiveDate) -> &'static str {
    use chrono::Weekday::*;
    match date.weekday() {
        Mon => "Monday",
        Tue => "Tuesday",
        Wed => "Wednesday",
        Thu => "Thursday",
        Fri => "Friday",
        Sat => "Saturday",
        Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_label_uses_full_names() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
        assert_eq!(weekday_label(d), "Saturday");
        let d = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        assert_eq!(weekday_label(d), "Monday");
    }
}
