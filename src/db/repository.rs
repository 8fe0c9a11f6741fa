use crate::dates;
use crate::db::models::{PrecipitationReading, TemperatureReading, TemperatureStats};
use crate::error::Result;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

/// Read-only access to the `measurements` and `stations` tables.
///
/// Each public method acquires one pooled connection, runs every query for
/// that request on it, and checks it back in when the connection guard drops
/// on any exit path.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent observation date in the dataset, or `None` when the
    /// `measurements` table is empty. Also serves as the startup probe: it
    /// fails on a missing or mis-shaped dataset before the server binds.
    pub async fn latest_observation_date(&self) -> Result<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        Self::max_date(&mut conn).await
    }

    /// `(date, precipitation)` for the trailing 12 months, ordered by date
    /// ascending. Empty dataset yields an empty vec, not an error.
    pub async fn recent_precipitation(&self) -> Result<Vec<PrecipitationReading>> {
        let mut conn = self.pool.acquire().await?;

        let Some(latest) = Self::max_date(&mut conn).await? else {
            return Ok(Vec::new());
        };
        let cutoff = dates::trailing_year_start(&latest)?;
        debug!("Precipitation window: {} through {}", cutoff, latest);

        let readings = sqlx::query_as::<_, PrecipitationReading>(
            "SELECT date, precipitation FROM measurements WHERE date >= ?1 ORDER BY date ASC",
        )
        .bind(&cutoff)
        .fetch_all(&mut *conn)
        .await?;

        Ok(readings)
    }

    /// All station identifiers in storage order. The `stations` table holds
    /// one row per station, so no DISTINCT is needed.
    pub async fn station_ids(&self) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;

        let ids = sqlx::query_scalar::<_, String>("SELECT station_id FROM stations")
            .fetch_all(&mut *conn)
            .await?;

        Ok(ids)
    }

    /// Station with the most observation rows. Ties are broken arbitrarily
    /// (ordering is by descending count only).
    pub async fn most_active_station(&self) -> Result<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        Self::busiest_station(&mut conn).await
    }

    /// `(date, temperature)` for the most active station over the trailing
    /// 12 months, ordered by date ascending. Duplicate dates are preserved.
    pub async fn recent_temperatures(&self) -> Result<Vec<TemperatureReading>> {
        let mut conn = self.pool.acquire().await?;

        let Some(station) = Self::busiest_station(&mut conn).await? else {
            return Ok(Vec::new());
        };
        let Some(latest) = Self::max_date(&mut conn).await? else {
            return Ok(Vec::new());
        };
        let cutoff = dates::trailing_year_start(&latest)?;
        debug!(
            "Most active station {}, window {} through {}",
            station, cutoff, latest
        );

        let readings = sqlx::query_as::<_, TemperatureReading>(
            "SELECT date, temperature FROM measurements \
             WHERE station_id = ?1 AND date >= ?2 ORDER BY date ASC",
        )
        .bind(&station)
        .bind(&cutoff)
        .fetch_all(&mut *conn)
        .await?;

        Ok(readings)
    }

    /// MIN/AVG/MAX temperature over observations dated `start` or later.
    /// `None` when no rows match.
    pub async fn temperature_stats_from(&self, start: &str) -> Result<Option<TemperatureStats>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>)>(
            "SELECT MIN(temperature), ROUND(AVG(temperature), 1), MAX(temperature) \
             FROM measurements WHERE date >= ?1",
        )
        .bind(start)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Self::stats_from_row(row))
    }

    /// MIN/AVG/MAX temperature over observations with
    /// `start <= date <= end`, both bounds inclusive. `None` when no rows
    /// match, including when `start > end`.
    pub async fn temperature_stats_in_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Option<TemperatureStats>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>)>(
            "SELECT MIN(temperature), ROUND(AVG(temperature), 1), MAX(temperature) \
             FROM measurements WHERE date >= ?1 AND date <= ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Self::stats_from_row(row))
    }

    async fn max_date(conn: &mut PoolConnection<Sqlite>) -> Result<Option<String>> {
        let date = sqlx::query_scalar::<_, Option<String>>("SELECT MAX(date) FROM measurements")
            .fetch_one(&mut **conn)
            .await?;

        Ok(date)
    }

    async fn busiest_station(conn: &mut PoolConnection<Sqlite>) -> Result<Option<String>> {
        let station = sqlx::query_scalar::<_, String>(
            "SELECT station_id FROM measurements \
             GROUP BY station_id ORDER BY COUNT(*) DESC LIMIT 1",
        )
        .fetch_optional(&mut **conn)
        .await?;

        Ok(station)
    }

    // Aggregates over zero rows come back as a single all-NULL row. A NULL
    // MIN means "no data", never an error.
    fn stats_from_row(row: (Option<f64>, Option<f64>, Option<f64>)) -> Option<TemperatureStats> {
        match row {
            (Some(tmin), Some(tavg), Some(tmax)) => Some(TemperatureStats { tmin, tavg, tmax }),
            _ => None,
        }
    }
}
