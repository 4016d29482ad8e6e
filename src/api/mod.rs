use crate::chunker::{TextChunk, TextChunker};
use crate::config::ApiConfig;
use crate::context::ContextAssembler;
use crate::error::{AppError, AppResult};
use crate::llm::{LLMProvider, PromptMessage};
use crate::middleware::{RequestId, RequestIdValue};
use crate::pdf;
use crate::storage::UploadStore;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::dev::Server;
use actix_web::{web, App, HttpMessage, HttpRequest, HttpResponse, HttpServer};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared, read-only handles built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: UploadStore,
    pub chunker: TextChunker,
    pub assembler: ContextAssembler,
    pub llm: Arc<dyn LLMProvider>,
}

impl AppState {
    pub fn from_config(config: &ApiConfig, llm: Arc<dyn LLMProvider>) -> Result<Self, AppError> {
        let chunker = TextChunker::new(config.chunker)
            .map_err(|e| AppError::Internal(format!("invalid chunker config: {}", e)))?;
        Ok(Self {
            store: UploadStore::new(&config.upload_dir, config.max_upload_bytes),
            chunker,
            assembler: ContextAssembler::new(config.context_warn_chars),
            llm,
        })
    }
}

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub filename: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub filename: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub document: DocumentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    pub document: String,
    pub chunks_used: usize,
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestIdValue>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Non-empty trimmed value of an optional request field.
fn required<'a>(value: &'a Option<String>, missing: &str) -> AppResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::validation(missing))
}

async fn root_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("pdfchat backend is running (Actix Web)\n\nTry /health, POST /api/upload, POST /api/chat\n")
}

async fn health_check(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "model": state.llm.model_name(),
        "upload_dir": state.store.dir(),
        "max_upload_bytes": state.store.max_bytes(),
        "request_id": request_id(&req),
    }))
}

/// POST /api/upload
/// Multipart body with one `file` field. Same name overwrites.
async fn upload_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let request_id = request_id(&req);
    let max_bytes = state.store.max_bytes();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::validation(format!("Malformed upload: {}", e)))?;

        if field.name() != Some("file") || upload.is_some() {
            // drain fields we do not use
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::validation(format!("Malformed upload: {}", e)))?;
            }
            continue;
        }

        let declared = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("No filename provided"))?;
        let filename = UploadStore::validate_upload_name(&declared)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data =
                chunk.map_err(|e| AppError::validation(format!("Malformed upload: {}", e)))?;
            if (bytes.len() + data.len()) as u64 > max_bytes {
                warn!(request_id = %request_id, filename = %filename, max_bytes, "Upload rejected: too large");
                return Err(AppError::PayloadTooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&data);
        }
        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or_else(|| AppError::validation("No file provided"))?;

    let store = state.store.clone();
    let saved = web::block(move || store.save(&filename, &bytes))
        .await?
        .map_err(|e| {
            error!(request_id = %request_id, error = %e, "Upload write failed");
            AppError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename: saved.filename,
        path: saved.path,
    }))
}

/// POST /api/process-document
/// Confirmation step only: reports the document as ready without touching it.
async fn process_document(req: web::Json<ProcessRequest>) -> AppResult<HttpResponse> {
    let filename = required(&req.filename, "No filename provided")?;

    Ok(HttpResponse::Ok().json(ProcessResponse {
        success: true,
        message: "Document ready for questions".to_string(),
        document: DocumentStatus {
            filename: filename.to_string(),
            status: "ready".to_string(),
        },
    }))
}

/// Reads, extracts and chunks a stored PDF. Blocking; run it on the thread pool.
fn load_chunks(path: PathBuf, chunker: &TextChunker) -> AppResult<Vec<TextChunk>> {
    let pages = pdf::extract_pages(&path)?;
    if !pdf::has_text(&pages) {
        return Err(AppError::NoText);
    }
    let full_text = pdf::combine_pages(&pages);
    Ok(chunker.chunk(&full_text))
}

/// POST /api/chat
/// Re-reads the whole PDF on every turn; only the current message is sent.
async fn chat(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<ChatRequest>,
) -> AppResult<HttpResponse> {
    let request_id = request_id(&http_req);
    let message = required(&req.message, "No message provided")?;
    let filename = required(
        &req.filename,
        "No document loaded. Please upload a PDF first.",
    )?
    .to_string();

    let path = state.store.resolve(&filename)?;
    let chunker = state.chunker.clone();
    let chunks = web::block(move || load_chunks(path, &chunker)).await??;
    info!(request_id = %request_id, document = %filename, chunks = chunks.len(), "Document chunked");

    let system_prompt = state.assembler.system_prompt(&chunks);
    let messages = [
        PromptMessage::system(system_prompt),
        PromptMessage::user(message),
    ];

    let completion = state.llm.complete(&messages).await.map_err(|e| {
        error!(request_id = %request_id, error = %e, "Chat completion failed");
        AppError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        success: true,
        message: completion,
        document: filename,
        chunks_used: chunks.len(),
    }))
}

/// Routes shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .route("/", web::get().to(root_handler))
    .route("/health", web::get().to(health_check))
    .service(
        web::scope("/api")
            .route("/upload", web::post().to(upload_document))
            .route("/process-document", web::post().to(process_document))
            .route("/chat", web::post().to(chat)),
    );
}

pub fn start_api_server(config: &ApiConfig, state: AppState) -> std::io::Result<Server> {
    let bind_addr = config.bind_addr();
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .expose_headers(vec![crate::middleware::REQUEST_ID_HEADER])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(RequestId)
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run();

    info!(%bind_addr, "API server listening");
    Ok(server)
}
