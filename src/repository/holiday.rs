use chrono::NaiveDate;
use sqlx::MySqlConnection;

use crate::model::holiday::Holiday;
use crate::service::calendar::HolidaySet;

pub async fn between(
    conn: &mut MySqlConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HolidaySet, sqlx::Error> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date FROM holidays
        WHERE date BETWEEN ? AND ?
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(HolidaySet::new(dates))
}

pub async fn list(conn: &mut MySqlConnection) -> Result<Vec<Holiday>, sqlx::Error> {
    sqlx::query_as::<_, Holiday>(
        r#"
        SELECT id, name, date, day, type, created_at
        FROM holidays
        ORDER BY date
        "#,
    )
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert(
    conn: &mut MySqlConnection,
    name: &str,
    date: NaiveDate,
    day: &str,
    holiday_type: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO holidays (name, date, day, type)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(date)
    .bind(day)
    .bind(holiday_type)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn delete(conn: &mut MySqlConnection, id: u64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
