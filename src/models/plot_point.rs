use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CanonDb;
use crate::DramaturgError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlotPointType {
    Setup,
    Conflict,
    Twist,
    Climax,
    Resolution,
    Foreshadowing,
}

impl PlotPointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotPointType::Setup => "setup",
            PlotPointType::Conflict => "conflict",
            PlotPointType::Twist => "twist",
            PlotPointType::Climax => "climax",
            PlotPointType::Resolution => "resolution",
            PlotPointType::Foreshadowing => "foreshadowing",
        }
    }
}

/// Plot point as stored in database.
///
/// `(point_type, description)` compared as exact strings is the dedup key.
/// Plot points are never updated by the differ, only created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotPoint {
    pub id: RecordId,
    pub drama: RecordId,
    pub point_type: PlotPointType,
    pub description: String,
    pub episode: Option<RecordId>,
    pub resolved: bool,
    pub created_at: Datetime,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct PlotPointCreate {
    pub drama: RecordId,
    pub point_type: PlotPointType,
    pub description: String,
    pub episode: Option<RecordId>,
    pub resolved: bool,
}

pub async fn create_plot_point(
    db: &CanonDb,
    data: PlotPointCreate,
) -> Result<PlotPoint, DramaturgError> {
    let result: Option<PlotPoint> = db.create("plot_point").content(data).await?;
    result.ok_or_else(|| DramaturgError::Database("Failed to create plot point".into()))
}

pub async fn list_plot_points(
    db: &CanonDb,
    drama: &RecordId,
) -> Result<Vec<PlotPoint>, DramaturgError> {
    let mut response = db
        .query("SELECT * FROM plot_point WHERE drama = $drama ORDER BY created_at ASC")
        .bind(("drama", drama.clone()))
        .await?;
    let result: Vec<PlotPoint> = response.take(0)?;
    Ok(result)
}
