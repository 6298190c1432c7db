use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use futures::StreamExt;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::use_cases::participant_rules::{validate_sheet, ParticipantRegistry};
use crate::domain::column_mapping::ColumnMapping;
use crate::domain::error::{AppError, Result};
use crate::domain::import_outcome::{ProcessResponse, ProcessedRow, SaveResponse};
use crate::domain::spreadsheet::SelectedFile;
use crate::infrastructure::collaborators::CSRF_HEADER;
use crate::infrastructure::config::{ImportConfig, MockServerConfig, PROCESS_PATH, SAVE_PATH};
use crate::infrastructure::spreadsheet::SpreadsheetReader;

const FILE_FIELD: &str = "excel_file";
const MAPPING_FIELD: &str = "column_mapping";
const ROWS_FIELD: &str = "participants_data";

pub struct MockServerState {
    csrf_token: String,
    reader: SpreadsheetReader,
    registry: Mutex<ParticipantRegistry>,
}

impl MockServerState {
    pub fn new(csrf_token: impl Into<String>) -> Self {
        Self {
            csrf_token: csrf_token.into(),
            reader: SpreadsheetReader::new(),
            registry: Mutex::new(ParticipantRegistry::new()),
        }
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn registered_count(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> MutexGuard<'_, ParticipantRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Local process/save endpoints with the participant rules and an in-memory registry.
pub struct MockServer {
    handle: ServerHandle,
    addr: SocketAddr,
    state: Arc<MockServerState>,
}

impl MockServer {
    /// Binds and spawns the server on the current tokio runtime.
    pub async fn start(config: &MockServerConfig) -> Result<Self> {
        let csrf_token = if config.csrf_token.trim().is_empty() {
            let generated = Uuid::new_v4().simple().to_string();
            warn!(csrf_token = %generated, "No CSRF token configured for the mock server, generated one");
            generated
        } else {
            config.csrf_token.clone()
        };

        let state = Arc::new(MockServerState::new(csrf_token));
        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .app_data(web::Data::new(server_state.clone()))
                .service(
                    web::resource(PROCESS_PATH)
                        .route(web::post().to(process_participants))
                        .default_service(web::to(method_not_allowed)),
                )
                .service(
                    web::resource(SAVE_PATH)
                        .route(web::post().to(save_participants))
                        .default_service(web::to(method_not_allowed)),
                )
        })
        .workers(2)
        .bind((config.host.as_str(), config.port))
        .map_err(|err| AppError::Internal(format!("Failed to bind mock server: {}", err)))?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .ok_or_else(|| AppError::Internal("Mock server has no bound address".to_string()))?;

        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);

        info!(%addr, "Mock server started");
        Ok(Self {
            handle,
            addr,
            state,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &Arc<MockServerState> {
        &self.state
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Import settings pointing at this server.
    pub fn import_config(&self) -> ImportConfig {
        ImportConfig {
            process_url: self.url(PROCESS_PATH),
            save_url: self.url(SAVE_PATH),
            csrf_token: self.state.csrf_token.clone(),
            ..Default::default()
        }
    }

    pub async fn stop(self) {
        let graceful = timeout(Duration::from_secs(2), self.handle.stop(true)).await;
        if graceful.is_err() {
            self.handle.stop(false).await;
            warn!("Mock server forced stop after timeout");
        } else {
            info!("Mock server stopped");
        }
    }
}

#[derive(Default)]
struct UploadForm {
    file: Option<SelectedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

async fn read_form(mut payload: Multipart) -> std::result::Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|err| err.to_string())?;
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk.map_err(|err| err.to_string())?);
        }

        if name == FILE_FIELD {
            let file_name = file_name.unwrap_or_else(|| "participantes.xlsx".to_string());
            form.file = Some(SelectedFile::new(file_name, bytes));
        } else {
            form.fields
                .insert(name, String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    Ok(form)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message.into() }))
}

fn csrf_rejection(req: &HttpRequest, state: &MockServerState) -> Option<HttpResponse> {
    let provided = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided == Some(state.csrf_token.as_str()) {
        return None;
    }
    warn!(path = %req.path(), "Rejected request without a valid CSRF token");
    Some(error_response(
        StatusCode::FORBIDDEN,
        "Token CSRF inválido o ausente.",
    ))
}

async fn process_participants(
    req: HttpRequest,
    payload: Multipart,
    data: web::Data<Arc<MockServerState>>,
) -> HttpResponse {
    if let Some(rejection) = csrf_rejection(&req, &data) {
        return rejection;
    }

    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Formulario inválido: {}", err),
            )
        }
    };

    let Some(file) = form.file.as_ref() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No se ha seleccionado ningún archivo.",
        );
    };

    let mapping: ColumnMapping =
        match serde_json::from_str(form.text(MAPPING_FIELD).unwrap_or("{}")) {
            Ok(mapping) => mapping,
            Err(err) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error al procesar el archivo: {}", err),
                )
            }
        };

    let table = match data.reader.read_first_sheet(file) {
        Ok(table) => table,
        Err(err) => {
            warn!(file_name = %file.file_name, error = %err, "Mock server could not read upload");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error al procesar el archivo: {}", err),
            );
        }
    };

    let outcome = validate_sheet(&table, &mapping);
    info!(
        file_name = %file.file_name,
        valid_rows = outcome.valid_row_count,
        total_rows = outcome.total_row_count,
        error_rows = outcome.error_row_count,
        "Mock process served"
    );

    HttpResponse::Ok().json(ProcessResponse::from(outcome))
}

async fn save_participants(
    req: HttpRequest,
    payload: Multipart,
    data: web::Data<Arc<MockServerState>>,
) -> HttpResponse {
    if let Some(rejection) = csrf_rejection(&req, &data) {
        return rejection;
    }

    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Formulario inválido: {}", err),
            )
        }
    };

    let rows: Vec<ProcessedRow> =
        match serde_json::from_str(form.text(ROWS_FIELD).unwrap_or("[]")) {
            Ok(rows) => rows,
            Err(err) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error al guardar participantes: {}", err),
                )
            }
        };

    let outcome = data.registry().register(&rows);
    info!(
        received = rows.len(),
        created = outcome.created_count,
        errors = outcome.error_messages.len(),
        "Mock save served"
    );

    HttpResponse::Ok().json(SaveResponse::from(outcome))
}

async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    debug!(method = %req.method(), path = %req.path(), "Mock server method not allowed");
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Método no permitido")
}
