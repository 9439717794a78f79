use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_user_address, AppState};
use crate::domain::{Address, Decimal, TimeMs};
use crate::engine::{ScreeningMetrics, Thresholds};
use crate::error::AppError;
use crate::orchestration::AnalysisOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenQuery {
    pub user: String,
    pub min_recent_closes: Option<u32>,
    pub min_avg_daily_closes: Option<u32>,
    pub max_avg_holding_hours: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenResponse {
    pub user: Address,
    pub passes: bool,
    pub metrics: Option<ScreeningMetrics>,
}

fn thresholds_from_query(params: &ScreenQuery, base: &Thresholds) -> Result<Thresholds, AppError> {
    let max_avg_holding_hours = params
        .max_avg_holding_hours
        .as_deref()
        .map(Decimal::from_str_canonical)
        .transpose()
        .ok()
        .flatten()
        .filter(|d| !d.is_negative());

    if params.max_avg_holding_hours.is_some() && max_avg_holding_hours.is_none() {
        return Err(AppError::BadRequest("Invalid maxAvgHoldingHours".to_string()));
    }

    Ok(Thresholds {
        min_recent_closes: params.min_recent_closes.unwrap_or(base.min_recent_closes),
        min_avg_daily_closes: params
            .min_avg_daily_closes
            .unwrap_or(base.min_avg_daily_closes),
        max_avg_holding_hours: max_avg_holding_hours.unwrap_or(base.max_avg_holding_hours),
    })
}

pub async fn get_screen(
    Query(params): Query<ScreenQuery>,
    State(state): State<AppState>,
) -> Result<Json<ScreenResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    let thresholds = thresholds_from_query(&params, state.analyzer.thresholds())?;

    let response = match state
        .analyzer
        .analyze_with(&user, &thresholds, TimeMs::now())
        .await
    {
        AnalysisOutcome::Analyzed(analysis) => ScreenResponse {
            passes: analysis.passes(),
            user: analysis.user,
            metrics: analysis.verdict.metrics,
        },
        AnalysisOutcome::NoData { user } => ScreenResponse {
            user,
            passes: false,
            metrics: None,
        },
        AnalysisOutcome::Failed { error, .. } => return Err(error.into()),
    };

    Ok(Json(response))
}
