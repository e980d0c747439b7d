//! # Attendance Repository
//!
//! Staff attendance, keyed by (staff id, date).
//!
//! Check-in is a keyed upsert: punching in twice on the same day
//! overwrites the same row instead of creating a second one. Check-out
//! fills the `check_out` column on the existing row. Entirely outside
//! the checkout path.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mobimart_core::Attendance;

/// Repository for attendance records.
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
}

fn attendance_from_row(row: &SqliteRow) -> Result<Attendance, sqlx::Error> {
    Ok(Attendance {
        staff_id: row.try_get("staff_id")?,
        staff_name: row.try_get("staff_name")?,
        date: row.try_get("date")?,
        check_in: row.try_get::<DateTime<Utc>, _>("check_in")?,
        check_out: row.try_get::<Option<DateTime<Utc>>, _>("check_out")?,
        status: row.try_get("status")?,
    })
}

impl AttendanceRepository {
    /// Creates a new AttendanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AttendanceRepository { pool }
    }

    /// Records a check-in for (staff, date). Upsert: a repeat check-in
    /// on the same day replaces the earlier row.
    pub async fn check_in(&self, record: &Attendance) -> DbResult<()> {
        debug!(staff_id = %record.staff_id, date = %record.date, "Check-in");

        sqlx::query(
            r#"
            INSERT INTO attendance (staff_id, date, staff_name, check_in, check_out, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (staff_id, date) DO UPDATE SET
                staff_name = excluded.staff_name,
                check_in = excluded.check_in,
                check_out = excluded.check_out,
                status = excluded.status
            "#,
        )
        .bind(&record.staff_id)
        .bind(&record.date)
        .bind(&record.staff_name)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(&record.status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a check-out on an existing (staff, date) row.
    pub async fn check_out(
        &self,
        staff_id: &str,
        date: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE attendance SET check_out = ?3 WHERE staff_id = ?1 AND date = ?2")
                .bind(staff_id)
                .bind(date)
                .bind(at)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Attendance",
                format!("{staff_id}_{date}"),
            ));
        }

        Ok(())
    }

    /// Gets today's record for a staff member, if they punched in.
    pub async fn status_for(&self, staff_id: &str, date: &str) -> DbResult<Option<Attendance>> {
        let record = sqlx::query(
            "SELECT staff_id, date, staff_name, check_in, check_out, status \
             FROM attendance WHERE staff_id = ?1 AND date = ?2",
        )
        .bind(staff_id)
        .bind(date)
        .try_map(|row| attendance_from_row(&row))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists all attendance for a date (admin view).
    pub async fn list_for_date(&self, date: &str) -> DbResult<Vec<Attendance>> {
        let records = sqlx::query(
            "SELECT staff_id, date, staff_name, check_in, check_out, status \
             FROM attendance WHERE date = ?1 ORDER BY staff_name",
        )
        .bind(date)
        .try_map(|row| attendance_from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
