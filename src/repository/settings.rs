use sqlx::MySqlConnection;

use crate::model::settings::CompanySettings;

/// Settings snapshot; defaults when the row has not been created yet.
pub async fn load(conn: &mut MySqlConnection) -> Result<CompanySettings, sqlx::Error> {
    let settings = sqlx::query_as::<_, CompanySettings>(
        r#"
        SELECT working_days_per_month, allow_manager_add_leave
        FROM company_settings
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(settings.unwrap_or_default())
}
