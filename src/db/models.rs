use serde::Serialize;
use sqlx::FromRow;

/// One dated precipitation reading. `precipitation` is NULL in the dataset
/// for days a station reported no gauge value.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrecipitationReading {
    pub date: String,
    pub precipitation: Option<f64>,
}

/// One dated temperature observation from a single station.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemperatureReading {
    pub date: String,
    pub temperature: f64,
}

/// Aggregate temperature statistics over a filtered set of observations.
/// The average arrives already rounded to one decimal place by the query.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TemperatureStats {
    #[serde(rename = "TMIN")]
    pub tmin: f64,
    #[serde(rename = "TAVG")]
    pub tavg: f64,
    #[serde(rename = "TMAX")]
    pub tmax: f64,
}
