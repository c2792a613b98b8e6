use actix_files::Files;
use actix_web::http::StatusCode;
use actix_web::error::JsonPayloadError;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::catalog::{Catalog, Course, Requirement};
use crate::decode::{to_grid_rows, DecodeOptions, GridRow, SolverResponse};
use crate::error::PlannerError;
use crate::form::{CoursePlan, CoursePlanForm, SupplierForm, SupplierOrderRow};

pub struct AppState {
    pub catalog: Catalog,
    pub options: DecodeOptions,
    pub last_plan: Mutex<Option<CoursePlan>>,
}

impl AppState {
    pub fn new(catalog: Catalog, options: DecodeOptions) -> Self {
        AppState {
            catalog,
            options,
            last_plan: Mutex::new(None),
        }
    }

    // The guarded value is replaced whole, so a poisoned lock still holds a usable plan.
    fn last_plan(&self) -> MutexGuard<'_, Option<CoursePlan>> {
        self.last_plan.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResponseError for PlannerError {
    fn status_code(&self) -> StatusCode {
        match self {
            PlannerError::Validation(_) | PlannerError::Decode(_) | PlannerError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            PlannerError::Backend { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({"success": false, "error": self.to_string()}))
    }
}

type HandlerResult = Result<HttpResponse, PlannerError>;

#[derive(Serialize)]
pub struct CatalogResponse<'a> {
    courses: &'a [Course],
    requirements: &'a [Requirement],
}

#[derive(Serialize)]
pub struct CoursePlanRequestResponse {
    success: bool,
    payload: serde_json::Value,
    remaining: Vec<Requirement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeRequest {
    response: SolverResponse,
    slack_prefix: Option<String>,
    #[serde(default)]
    form: Option<CoursePlanForm>,
}

#[derive(Serialize)]
pub struct PlanResponse<'a> {
    plan: &'a CoursePlan,
    grid: Vec<GridRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSyncResponse {
    form: SupplierForm,
    order_slots: usize,
}

#[derive(Deserialize)]
pub struct SupplierDecodeRequest {
    form: SupplierForm,
    response: SolverResponse,
}

#[derive(Serialize)]
pub struct SupplierDecodeResponse {
    rows: Vec<SupplierOrderRow>,
}

async fn get_catalog(state: web::Data<AppState>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(CatalogResponse {
        courses: &state.catalog.courses,
        requirements: &state.catalog.requirements,
    }))
}

// Validates the planner form and returns the payload for the solver backend
async fn course_plan_request(
    form: web::Json<CoursePlanForm>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let form = form.into_inner();
    form.validate(&state.catalog)?;

    Ok(HttpResponse::Ok().json(CoursePlanRequestResponse {
        success: true,
        payload: form.build_request()?,
        remaining: state.catalog.remaining_requirements(&form.taken),
    }))
}

// Decodes a solver response and keeps it as the current plan
async fn course_plan_decode(
    req: web::Json<DecodeRequest>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let req = req.into_inner();
    let options = match req.slack_prefix {
        Some(slack_prefix) => DecodeOptions {
            slack_prefix,
            ..state.options.clone()
        },
        None => state.options.clone(),
    };
    let form = req.form.unwrap_or_default();
    let plan = form.handle_response(&req.response, &state.catalog, &options)?;

    let body = serde_json::to_value(PlanResponse {
        plan: &plan,
        grid: to_grid_rows(plan.rows()),
    })?;
    *state.last_plan() = Some(plan);

    Ok(HttpResponse::Ok().json(body))
}

async fn get_course_plan(state: web::Data<AppState>) -> HandlerResult {
    let plan = state.last_plan();

    if let Some(ref plan) = *plan {
        Ok(HttpResponse::Ok().json(PlanResponse {
            plan,
            grid: to_grid_rows(plan.rows()),
        }))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No plan available"})))
    }
}

// Mirrors the supplier count field into the supplier grid
async fn suppliers_sync(form: web::Json<SupplierForm>) -> HandlerResult {
    let mut form = form.into_inner();
    form.check_limits()?;
    form.sync_suppliers();
    let order_slots = form.order_slots();

    Ok(HttpResponse::Ok().json(SupplierSyncResponse { form, order_slots }))
}

async fn suppliers_decode(req: web::Json<SupplierDecodeRequest>) -> HandlerResult {
    let req = req.into_inner();
    req.form.check_limits()?;
    Ok(HttpResponse::Ok().json(SupplierDecodeResponse {
        rows: req.form.decode_orders(&req.response),
    }))
}

async fn index() -> HandlerResult {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

// Unreadable bodies get the same JSON error shape as handler errors
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, "rejected request body");
    PlannerError::Validation(err.to_string()).into()
}

/// Registers every page and API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/", web::get().to(index))
        .route("/api/catalog", web::get().to(get_catalog))
        .route("/api/course-plan", web::get().to(get_course_plan))
        .route("/api/course-plan/request", web::post().to(course_plan_request))
        .route("/api/course-plan/decode", web::post().to(course_plan_decode))
        .route("/api/suppliers/sync", web::post().to(suppliers_sync))
        .route("/api/suppliers/decode", web::post().to(suppliers_decode));
}

pub async fn start_server(port: u16, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);
    info!(port, "starting web server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
