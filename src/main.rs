use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipshare::attachment::blob::MemoryBlobStore;
use clipshare::attachment::handlers as attachment_handlers;
use clipshare::attachment::repository::InMemoryAttachmentRepository;
use clipshare::attachment::{AttachmentService, MAX_ATTACHMENT_BYTES};
use clipshare::files::{handlers as file_handlers, DiskFileStore};
use clipshare::room::registry::InMemoryRoomRegistry;
use clipshare::room::RoomService;
use clipshare::shared::AppState;
use clipshare::websockets::{
    websocket_handler, ConnectionManager, InMemoryConnectionManager, RoomBroadcaster,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipshare=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clipshare session server");

    // Create shared application state with dependency injection.
    // The in-memory registry is the single-process deployment; a durable
    // store-backed registry implements the same trait.
    let registry = Arc::new(InMemoryRoomRegistry::new());
    let rooms = Arc::new(RoomService::new(registry));

    let blobs = Arc::new(MemoryBlobStore::new());
    let attachments = Arc::new(AttachmentService::new(
        Arc::new(InMemoryAttachmentRepository::new()),
        blobs,
        Arc::clone(&rooms),
    ));

    let connections: Arc<dyn ConnectionManager> = Arc::new(InMemoryConnectionManager::new());
    let broadcaster = Arc::new(RoomBroadcaster::new(Arc::clone(&connections)));

    let upload_root =
        std::env::var("CLIPSHARE_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
    let files = Arc::new(DiskFileStore::new(PathBuf::from(upload_root)));

    let app_state = AppState::new(
        rooms,
        attachments,
        connections,
        broadcaster,
        Arc::clone(&files),
    );

    // build our application
    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route(
            "/api/attachments/upload-target",
            post(attachment_handlers::issue_upload_target),
        )
        .route(
            "/api/attachments",
            post(attachment_handlers::commit_attachment),
        )
        .route(
            "/api/attachments/:id",
            delete(attachment_handlers::delete_attachment),
        )
        .route(
            "/api/rooms/:code/attachments",
            get(attachment_handlers::list_attachments),
        )
        .route(
            "/api/blobs/:ref",
            put(attachment_handlers::put_blob).get(attachment_handlers::get_blob),
        )
        .route(
            "/api/files",
            get(file_handlers::list_files)
                .post(file_handlers::upload_file)
                .delete(file_handlers::delete_files),
        )
        // Uploaded files are also served statically, as the legacy
        // deployment did
        .nest_service("/uploads", ServeDir::new(files.root()))
        .layer(DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES as usize + 64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // run our app with hyper
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
