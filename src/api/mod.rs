use std::net::SocketAddr;
use std::str::FromStr;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, NaiveDate, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    ContributionSpec, ContributionType, DEFAULT_ANNUAL_RETURN_RATE, DEFAULT_INFLATION_RATE,
    Error as EngineError, HistoryEntry, ImpactRequest, Money, PayProfile, ProjectionPoint,
    ProjectionRequest, Rate, compute_impact, compute_per_paycheck, compute_projection, gross_pay,
    summarize_ytd, validate_contribution_inputs,
};

/// Highest percentage contribution the API accepts. The engine itself has no upper bound.
pub const MAX_PERCENTAGE_RATE: Decimal = dec!(100);

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PaycheckPayload {
    salary: Option<Decimal>,
    pay_frequency: Option<u32>,
    #[serde(rename = "type")]
    contribution_type: Option<String>,
    rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    current_savings: Option<Decimal>,
    annual_contribution: Option<Decimal>,
    annual_return_rate: Option<Decimal>,
    inflation_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImpactPayload {
    salary: Option<Decimal>,
    pay_frequency: Option<u32>,
    #[serde(rename = "type")]
    contribution_type: Option<String>,
    rate: Option<Decimal>,
    birth_date: Option<NaiveDate>,
    retirement_age: Option<u32>,
    as_of: Option<NaiveDate>,
    history: Vec<HistoryEntry>,
    annual_return_rate: Option<Decimal>,
    inflation_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct YtdPayload {
    year: Option<i32>,
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaycheckResponse {
    gross_pay: Money,
    employee: Money,
    employer: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    annual_return_rate: Rate,
    inflation_rate: Rate,
    projection: Vec<ProjectionPoint>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, PartialEq)]
enum ApiError {
    BadRequest(String),
    Unprocessable(String),
}

impl ApiError {
    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unprocessable(msg) => msg,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidArgument { .. } => ApiError::BadRequest(err.reason()),
            EngineError::Overflow { .. } => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        warn!("rejected request ({status}): {}", self.message());
        error_response(status, self.message())
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/paycheck",
            get(paycheck_get_handler).post(paycheck_post_handler),
        )
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/impact", post(impact_handler))
        .route("/api/ytd", post(ytd_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("nestegg HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/health");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn paycheck_get_handler(Query(payload): Query<PaycheckPayload>) -> Response {
    respond("GET /api/paycheck", paycheck_response_from_payload(payload))
}

async fn paycheck_post_handler(Json(payload): Json<PaycheckPayload>) -> Response {
    respond("POST /api/paycheck", paycheck_response_from_payload(payload))
}

async fn projection_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    respond("GET /api/projection", projection_response_from_payload(payload))
}

async fn projection_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    respond("POST /api/projection", projection_response_from_payload(payload))
}

async fn impact_handler(Json(payload): Json<ImpactPayload>) -> Response {
    let today = Utc::now().date_naive();
    respond(
        "POST /api/impact",
        impact_request_from_payload(payload, today)
            .and_then(|request| compute_impact(&request).map_err(ApiError::from)),
    )
}

async fn ytd_handler(Json(payload): Json<YtdPayload>) -> Response {
    let year = payload.year.unwrap_or_else(|| Utc::now().year());
    respond(
        "POST /api/ytd",
        summarize_ytd(&payload.history, year).map_err(ApiError::from),
    )
}

fn respond<T: Serialize>(route: &str, result: Result<T, ApiError>) -> Response {
    let response = match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    };
    info!("{route} -> {}", response.status());
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("missing field: {name}")))
}

// Salary, pay frequency and rate are checked before the type string is parsed, and the
// API limits apply last.
fn contribution_from_parts(
    profile: &PayProfile,
    contribution_type: Option<String>,
    rate: Option<Decimal>,
) -> Result<ContributionSpec, ApiError> {
    let contribution_type = required(contribution_type, "type")?;
    let rate = required(rate, "rate")?;
    validate_contribution_inputs(profile, rate)?;

    let contribution = ContributionSpec {
        kind: ContributionType::from_str(&contribution_type)?,
        rate,
    };
    enforce_contribution_policy(profile, &contribution)?;
    Ok(contribution)
}

fn enforce_contribution_policy(
    profile: &PayProfile,
    contribution: &ContributionSpec,
) -> Result<(), ApiError> {
    match contribution.kind {
        ContributionType::Fixed => {
            let gross = gross_pay(profile)?;
            if contribution.rate > gross {
                return Err(ApiError::BadRequest(format!(
                    "fixed contribution amount cannot exceed {gross:.2} (100% of your paycheck)"
                )));
            }
        }
        ContributionType::Percentage => {
            if contribution.rate > MAX_PERCENTAGE_RATE {
                return Err(ApiError::BadRequest(format!(
                    "percentage contribution cannot exceed {MAX_PERCENTAGE_RATE}%"
                )));
            }
        }
    }
    Ok(())
}

fn paycheck_response_from_payload(payload: PaycheckPayload) -> Result<PaycheckResponse, ApiError> {
    let profile = PayProfile {
        salary: required(payload.salary, "salary")?,
        pay_frequency: required(payload.pay_frequency, "payFrequency")?,
    };
    let contribution =
        contribution_from_parts(&profile, payload.contribution_type, payload.rate)?;
    let result = compute_per_paycheck(&profile, &contribution)?;

    Ok(PaycheckResponse {
        gross_pay: gross_pay(&profile)?,
        employee: result.employee,
        employer: result.employer,
    })
}

fn projection_response_from_payload(
    payload: ProjectionPayload,
) -> Result<ProjectionResponse, ApiError> {
    let request = ProjectionRequest {
        current_age: required(payload.current_age, "currentAge")?,
        retirement_age: required(payload.retirement_age, "retirementAge")?,
        current_savings: required(payload.current_savings, "currentSavings")?,
        annual_contribution: required(payload.annual_contribution, "annualContribution")?,
        annual_return_rate: payload
            .annual_return_rate
            .unwrap_or(DEFAULT_ANNUAL_RETURN_RATE),
        inflation_rate: payload.inflation_rate.unwrap_or(DEFAULT_INFLATION_RATE),
    };
    let projection = compute_projection(&request)?;

    Ok(ProjectionResponse {
        annual_return_rate: request.annual_return_rate,
        inflation_rate: request.inflation_rate,
        projection,
    })
}

fn impact_request_from_payload(
    payload: ImpactPayload,
    today: NaiveDate,
) -> Result<ImpactRequest, ApiError> {
    let profile = PayProfile {
        salary: required(payload.salary, "salary")?,
        pay_frequency: required(payload.pay_frequency, "payFrequency")?,
    };
    let contribution =
        contribution_from_parts(&profile, payload.contribution_type, payload.rate)?;

    Ok(ImpactRequest {
        profile,
        contribution,
        birth_date: required(payload.birth_date, "birthDate")?,
        retirement_age: required(payload.retirement_age, "retirementAge")?,
        as_of: payload.as_of.unwrap_or(today),
        history: payload.history,
        annual_return_rate: payload
            .annual_return_rate
            .unwrap_or(DEFAULT_ANNUAL_RETURN_RATE),
        inflation_rate: payload.inflation_rate.unwrap_or(DEFAULT_INFLATION_RATE),
    })
}

#[cfg(test)]
fn impact_from_json(
    json: &str,
    today: NaiveDate,
) -> Result<crate::core::ImpactResult, ApiError> {
    let payload = serde_json::from_str::<ImpactPayload>(json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API JSON payload: {e}")))?;
    let request = impact_request_from_payload(payload, today)?;
    Ok(compute_impact(&request)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn paycheck_payload(salary: Decimal, kind: &str, rate: Decimal) -> PaycheckPayload {
        PaycheckPayload {
            salary: Some(salary),
            pay_frequency: Some(26),
            contribution_type: Some(kind.to_string()),
            rate: Some(rate),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn paycheck_payload_parses_web_keys() {
        let json = r#"{"salary": 100000, "payFrequency": 26, "type": "PERCENTAGE", "rate": 10}"#;
        let payload = serde_json::from_str::<PaycheckPayload>(json).expect("json should parse");
        let response = paycheck_response_from_payload(payload).expect("valid payload");
        assert_eq!(response.gross_pay, dec!(3846.15));
        assert_eq!(response.employee, dec!(384.62));
        assert_eq!(response.employer, dec!(115.38));
    }

    #[test]
    fn paycheck_accepts_string_amounts_and_lowercase_type() {
        let json = r#"{"salary": "100000.00", "payFrequency": 26, "type": "fixed", "rate": "500"}"#;
        let payload = serde_json::from_str::<PaycheckPayload>(json).expect("json should parse");
        let response = paycheck_response_from_payload(payload).expect("valid payload");
        assert_eq!(response.employee, dec!(500.00));
        assert_eq!(response.employer, dec!(115.38));
    }

    #[test]
    fn paycheck_reports_missing_fields_by_wire_name() {
        let err = paycheck_response_from_payload(PaycheckPayload::default())
            .expect_err("must reject empty payload");
        assert_eq!(err, ApiError::BadRequest("missing field: salary".to_string()));

        let mut payload = paycheck_payload(dec!(100000), "FIXED", dec!(1));
        payload.pay_frequency = None;
        let err = paycheck_response_from_payload(payload).expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("missing field: payFrequency".to_string())
        );
    }

    #[test]
    fn paycheck_rejects_unknown_contribution_type() {
        let err = paycheck_response_from_payload(paycheck_payload(dec!(1), "BONUS", dec!(1)))
            .expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("invalid contribution type".to_string())
        );
    }

    #[test]
    fn paycheck_engine_reasons_come_before_api_policy() {
        let err =
            paycheck_response_from_payload(paycheck_payload(dec!(-50000), "FIXED", dec!(1000000)))
                .expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("salary must be non-negative".to_string())
        );
    }

    #[test]
    fn paycheck_numeric_checks_come_before_type_parsing() {
        let json = r#"{"salary": -50000, "payFrequency": 26, "type": "BONUS", "rate": 5}"#;
        let payload = serde_json::from_str::<PaycheckPayload>(json).expect("json should parse");
        let err = paycheck_response_from_payload(payload).expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("salary must be non-negative".to_string())
        );

        let mut payload = paycheck_payload(dec!(100000), "BONUS", dec!(-1));
        payload.pay_frequency = Some(0);
        let err = paycheck_response_from_payload(payload).expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("pay frequency must be positive".to_string())
        );

        let err = paycheck_response_from_payload(paycheck_payload(dec!(100000), "BONUS", dec!(-1)))
            .expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("contribution rate must be non-negative".to_string())
        );
    }

    #[test]
    fn impact_numeric_checks_come_before_type_parsing() {
        let json = r#"{"salary": -1, "payFrequency": 26, "type": "BONUS", "rate": 5, "birthDate": "1990-06-15", "retirementAge": 65}"#;
        let err = impact_from_json(json, today()).expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("salary must be non-negative".to_string())
        );
    }

    #[test]
    fn paycheck_rejects_fixed_amount_above_gross_pay() {
        let err = paycheck_response_from_payload(paycheck_payload(
            dec!(100000),
            "FIXED",
            dec!(3846.16),
        ))
        .expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest(
                "fixed contribution amount cannot exceed 3846.15 (100% of your paycheck)"
                    .to_string()
            )
        );

        let ok = paycheck_response_from_payload(paycheck_payload(
            dec!(100000),
            "FIXED",
            dec!(3846.15),
        ));
        assert!(ok.is_ok());
    }

    #[test]
    fn paycheck_rejects_percentage_above_api_limit() {
        let err = paycheck_response_from_payload(paycheck_payload(
            dec!(100000),
            "PERCENTAGE",
            dec!(100.01),
        ))
        .expect_err("must reject");
        assert!(err.message().contains("percentage contribution cannot exceed"));
    }

    #[test]
    fn projection_payload_applies_default_rates() {
        let json = r#"{
          "currentAge": 30,
          "retirementAge": 35,
          "currentSavings": 10000,
          "annualContribution": 5000
        }"#;
        let payload = serde_json::from_str::<ProjectionPayload>(json).expect("json should parse");
        let response = projection_response_from_payload(payload).expect("valid payload");
        assert_eq!(response.annual_return_rate, dec!(0.07));
        assert_eq!(response.inflation_rate, dec!(0.03));
        assert_eq!(response.projection.len(), 21);
    }

    #[test]
    fn projection_rejects_retirement_before_current_age() {
        let payload = ProjectionPayload {
            current_age: Some(65),
            retirement_age: Some(60),
            current_savings: Some(dec!(10000)),
            annual_contribution: Some(dec!(5000)),
            ..ProjectionPayload::default()
        };
        let err = projection_response_from_payload(payload).expect_err("must reject");
        assert_eq!(
            err,
            ApiError::BadRequest("retirement age must be greater than current age".to_string())
        );
    }

    #[test]
    fn projection_response_serialization_contains_expected_fields() {
        let payload = ProjectionPayload {
            current_age: Some(30),
            retirement_age: Some(31),
            current_savings: Some(dec!(100)),
            annual_contribution: Some(dec!(1200)),
            ..ProjectionPayload::default()
        };
        let response = projection_response_from_payload(payload).expect("valid payload");
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"annualReturnRate\""));
        assert!(json.contains("\"inflationRate\""));
        assert!(json.contains("\"projection\""));
        assert!(json.contains("\"quarter\""));
        assert!(json.contains("\"savings\""));
    }

    #[test]
    fn impact_json_defaults_as_of_to_today() {
        let json = r#"{
          "salary": 100000,
          "payFrequency": 26,
          "type": "PERCENTAGE",
          "rate": 10,
          "birthDate": "1990-06-15",
          "retirementAge": 65,
          "history": [
            {"date": "2025-01-03", "amount": "384.62", "employerMatch": "115.38"}
          ]
        }"#;
        let result = impact_from_json(json, today()).expect("valid payload");
        assert_eq!(result.current_age, 35);
        assert_eq!(result.current_savings, dec!(500.00));
        assert_eq!(result.annual_contribution, dec!(13000.00));
        assert_eq!(result.projection.len(), 121);
    }

    #[test]
    fn impact_json_requires_birth_date() {
        let json = r#"{"salary": 100000, "payFrequency": 26, "type": "FIXED", "rate": 100, "retirementAge": 65}"#;
        let err = impact_from_json(json, today()).expect_err("must reject");
        assert_eq!(err, ApiError::BadRequest("missing field: birthDate".to_string()));
    }

    #[test]
    fn overflow_maps_to_unprocessable() {
        let err = ApiError::from(EngineError::Overflow {
            context: "monthly balance",
        });
        assert_eq!(
            err,
            ApiError::Unprocessable("numeric overflow in monthly balance".to_string())
        );
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn paycheck_handler_returns_json_with_no_store() {
        let response = paycheck_post_handler(Json(paycheck_payload(
            dec!(100000),
            "PERCENTAGE",
            dec!(10),
        )))
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&header::HeaderValue::from_static("no-store"))
        );
        let body = body_json(response).await;
        assert_eq!(body["employee"], "384.62");
        assert_eq!(body["employer"], "115.38");
    }

    #[tokio::test]
    async fn paycheck_handler_maps_invalid_argument_to_bad_request() {
        let response =
            paycheck_post_handler(Json(paycheck_payload(dec!(-50000), "PERCENTAGE", dec!(5))))
                .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "salary must be non-negative");
    }

    #[tokio::test]
    async fn ytd_handler_sums_the_requested_year() {
        let payload = serde_json::from_str::<YtdPayload>(
            r#"{
              "year": 2025,
              "history": [
                {"date": "2024-12-20", "amount": 100, "employerMatch": 50},
                {"date": "2025-01-03", "amount": 384.62, "employerMatch": 115.38}
              ]
            }"#,
        )
        .expect("json should parse");
        let response = ytd_handler(Json(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["totalEmployee"], "384.62");
        assert_eq!(body["total"], "500.00");
        assert_eq!(body["entries"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn impact_overflow_maps_to_unprocessable() {
        let json = r#"{
          "salary": "79228162514264337593543950335",
          "payFrequency": 1,
          "type": "PERCENTAGE",
          "rate": 100,
          "birthDate": "1990-06-15",
          "retirementAge": 65
        }"#;
        let err = impact_from_json(json, today()).expect_err("must overflow");
        assert_eq!(
            err,
            ApiError::Unprocessable("numeric overflow in per-paycheck total".to_string())
        );
    }

    #[tokio::test]
    async fn ytd_handler_maps_overflow_to_unprocessable() {
        let payload = serde_json::from_str::<YtdPayload>(
            r#"{
              "year": 2025,
              "history": [
                {
                  "date": "2025-01-03",
                  "amount": "50000000000000000000000000000",
                  "employerMatch": "50000000000000000000000000000"
                }
              ]
            }"#,
        )
        .expect("json should parse");
        let response = ytd_handler(Json(payload)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "numeric overflow in ytd total");
    }

    #[tokio::test]
    async fn health_and_fallback_respond_with_json() {
        let body = body_json(health_handler().await).await;
        assert_eq!(body["status"], "ok");

        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}
