use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use futures::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

/// Read-through cache answering "is this date a holiday".
///
/// true  => date is a registered holiday
/// false => checked, not a holiday
#[derive(Clone)]
pub struct HolidayCalendar {
    cache: Cache<NaiveDate, bool>,
}

impl HolidayCalendar {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn cached(&self, date: NaiveDate) -> Option<bool> {
        self.cache.get(&date).await
    }

    pub async fn mark(&self, date: NaiveDate, is_holiday: bool) {
        self.cache.insert(date, is_holiday).await;
    }

    /// Forget what we know about `date`; the next lookup goes to the database.
    pub async fn invalidate(&self, date: NaiveDate) {
        self.cache.invalidate(&date).await;
    }

    pub async fn is_holiday(&self, pool: &MySqlPool, date: NaiveDate) -> Result<bool, sqlx::Error> {
        if let Some(hit) = self.cached(date).await {
            return Ok(hit);
        }

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM holidays WHERE date = ?")
            .bind(date)
            .fetch_one(pool)
            .await?;

        let is_holiday = count > 0;
        self.mark(date, is_holiday).await;
        Ok(is_holiday)
    }

    /// Load holidays from the start of the previous year onwards (batched).
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let since = NaiveDate::from_ymd_opt(Utc::now().year() - 1, 1, 1)
            .ok_or_else(|| anyhow::anyhow!("invalid warmup start date"))?;

        let mut stream = sqlx::query_as::<_, (NaiveDate,)>(
            "SELECT date FROM holidays WHERE date >= ? ORDER BY date",
        )
        .bind(since)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (date,) = row?;
            batch.push(date);
            total += 1;

            if batch.len() >= batch_size {
                self.mark_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.mark_batch(&batch).await;
        }

        tracing::info!(total, %since, "Holiday calendar warmup complete");
        Ok(())
    }

    async fn mark_batch(&self, dates: &[NaiveDate]) {
        let inserts: Vec<_> = dates.iter().map(|d| self.cache.insert(*d, true)).collect();
        futures::future::join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::overtime::overtime_multiplier;
    use rust_decimal::Decimal;

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new(Duration::from_secs(60))
    }

    #[actix_web::test]
    async fn unknown_dates_are_not_cached() {
        let cal = calendar();
        let day = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        assert_eq!(cal.cached(day).await, None);
    }

    #[actix_web::test]
    async fn deleting_a_holiday_reverts_the_multiplier() {
        let cal = calendar();
        // 2026-10-01 is a Thursday
        let day = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();

        cal.mark(day, true).await;
        let before = cal.cached(day).await.unwrap_or(false);
        assert_eq!(overtime_multiplier(day, before), Decimal::TWO);

        cal.invalidate(day).await;
        assert_eq!(cal.cached(day).await, None);

        // what the database answers once the row is gone
        cal.mark(day, false).await;
        let after = cal.cached(day).await.unwrap_or(false);
        assert_eq!(overtime_multiplier(day, after), Decimal::new(15, 1));
    }

    #[actix_web::test]
    async fn invalidate_drops_a_cached_miss() {
        let cal = calendar();
        let day = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();

        // a lookup that ran before the insert committed
        cal.mark(day, false).await;
        assert_eq!(cal.cached(day).await, Some(false));

        cal.invalidate(day).await;
        assert_eq!(cal.cached(day).await, None);
    }

    #[actix_web::test]
    async fn batch_marks_every_date() {
        let cal = calendar();
        let days: Vec<_> = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2026, 4, d).unwrap())
            .collect();
        cal.mark_batch(&days).await;
        for day in days {
            assert_eq!(cal.cached(day).await, Some(true));
        }
    }
}
