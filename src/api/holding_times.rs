use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_user_address, AppState};
use crate::domain::Address;
use crate::engine::{InsufficientDataWarning, StatisticsSnapshot};
use crate::error::AppError;
use crate::orchestration::{AnalysisOutcome, FillCounts};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingTimesQuery {
    pub user: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingTimesResponse {
    pub user: Address,
    pub fill_counts: FillCounts,
    #[serde(flatten)]
    pub stats: StatisticsSnapshot,
    pub warnings: Vec<InsufficientDataWarning>,
}

pub async fn get_holding_times(
    Query(params): Query<HoldingTimesQuery>,
    State(state): State<AppState>,
) -> Result<Json<HoldingTimesResponse>, AppError> {
    let user = parse_user_address(&params.user)?;

    let response = match state.analyzer.analyze(&user).await {
        AnalysisOutcome::Analyzed(analysis) => {
            let analysis = *analysis;
            HoldingTimesResponse {
                user: analysis.user,
                fill_counts: analysis.fill_counts,
                stats: analysis.stats,
                warnings: analysis.warnings,
            }
        }
        AnalysisOutcome::NoData { user } => HoldingTimesResponse {
            user,
            fill_counts: FillCounts::default(),
            stats: StatisticsSnapshot::default(),
            warnings: vec![InsufficientDataWarning::NoClosedLots],
        },
        AnalysisOutcome::Failed { error, .. } => return Err(error.into()),
    };

    Ok(Json(response))
}
