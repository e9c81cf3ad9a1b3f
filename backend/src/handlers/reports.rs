//! Report handlers: P&L, food cost, valuation, negative inventory, variance

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::ExcludedReasons;
use shared::types::{CogsMethod, Department, ReportPeriod, RevenueBasis};
use shared::validation::validate_period;

use crate::error::{AppError, AppResult};
use crate::services::reports::{negative_inventory_csv, variance_report_csv, ReportOptions};
use crate::services::{CostingService, NegativeInventoryService, ReportService, VarianceService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub department: Option<String>,
}

pub(crate) fn parse_period(query: &PeriodQuery) -> AppResult<ReportPeriod> {
    let (Some(date_from), Some(date_to)) = (query.date_from, query.date_to) else {
        return Err(AppError::Validation {
            field: "date_from".to_string(),
            message: "Both date_from and date_to are required".to_string(),
            message_id: "date_from dan date_to wajib diisi".to_string(),
        });
    };
    let period = ReportPeriod::new(date_from, date_to);
    validate_period(&period).map_err(|message| AppError::Validation {
        field: "date_from".to_string(),
        message: message.to_string(),
        message_id: "Awal periode tidak boleh setelah akhir periode".to_string(),
    })?;
    Ok(period)
}

pub(crate) fn parse_department(query: &PeriodQuery) -> AppResult<Option<Department>> {
    match query.department.as_deref() {
        None | Some("all") => Ok(None),
        Some("kitchen") => Ok(Some(Department::Kitchen)),
        Some("bar") => Ok(Some(Department::Bar)),
        Some(other) => Err(AppError::Validation {
            field: "department".to_string(),
            message: format!("Unknown department filter '{}'", other),
            message_id: format!("Filter departemen '{}' tidak dikenal", other),
        }),
    }
}

/// Report policy knobs from the loaded configuration
pub(crate) fn report_options(state: &AppState) -> ReportOptions {
    let reporting = &state.config.reporting;
    let excluded = ExcludedReasons {
        storage: reporting.excluded_storage_reasons.clone(),
        preparation: reporting.excluded_preparation_reasons.clone(),
    };
    ReportOptions {
        target_food_cost_percent: reporting.target_food_cost_percent,
        revenue_basis: if reporting.include_taxes_in_revenue {
            RevenueBasis::Gross
        } else {
            RevenueBasis::Net
        },
        cogs_method: if reporting.cogs_method == "cash" {
            CogsMethod::Cash
        } else {
            CogsMethod::Accrual
        },
        excluded_reasons: (!excluded.is_empty()).then_some(excluded),
    }
}

/// GET /reports/pl
pub async fn get_pl_report(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let service = ReportService::new(state.source.clone(), report_options(&state));
    let report = service.pl_report(period).await?;
    Ok(Json(report))
}

/// GET /reports/food-cost
pub async fn get_food_cost_dashboard(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let service = ReportService::new(state.source.clone(), report_options(&state));
    let dashboard = service.food_cost_dashboard(period).await?;
    Ok(Json(dashboard))
}

/// GET /reports/cogs
pub async fn get_cogs_breakdown(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let department = parse_department(&query)?;
    let service = ReportService::new(state.source.clone(), report_options(&state));
    let breakdown = service.cogs_kpi(period, department).await?;
    Ok(Json(breakdown))
}

/// GET /reports/valuation
pub async fn get_inventory_valuation(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let service = CostingService::new(state.source.clone());
    let valuation = service.inventory_valuation().await?;
    Ok(Json(valuation))
}

/// GET /reports/negative-inventory
pub async fn get_negative_inventory_report(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let service = NegativeInventoryService::new(state.source.clone());
    let report = service.report(period).await?;
    Ok(Json(report))
}

/// GET /reports/negative-inventory/csv
pub async fn export_negative_inventory_csv(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let service = NegativeInventoryService::new(state.source.clone());
    let report = service.report(period).await?;
    let csv = negative_inventory_csv(&report)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"negative_inventory.csv\"",
            ),
        ],
        csv,
    ))
}

/// GET /reports/variance
pub async fn get_variance_report(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let department = parse_department(&query)?;
    let service = VarianceService::new(state.source.clone());
    let report = service.report(period, department).await?;
    Ok(Json(report))
}

/// GET /reports/variance/v2
pub async fn get_variance_report_v2(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let department = parse_department(&query)?;
    let service = VarianceService::new(state.source.clone());
    let report = service.report_v2(period, department).await?;
    Ok(Json(report))
}

/// GET /reports/variance/csv
pub async fn export_variance_csv(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let department = parse_department(&query)?;
    let service = VarianceService::new(state.source.clone());
    let report = service.report(period, department).await?;
    let csv = variance_report_csv(&report)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"variance_report.csv\"",
            ),
        ],
        csv,
    ))
}

/// GET /reports/variance/:product_id
pub async fn get_product_variance_detail(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    let period = parse_period(&query)?;
    let service = VarianceService::new(state.source.clone());
    let detail = service.product_detail(product_id, period).await?;
    Ok(Json(detail))
}
