// tests/client_api.rs
//
// Cliente tipado contra um servidor axum em memória (127.0.0.1:0).

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use obrigacoes::{
    client::{forms::DecisionForm, ApiClient, ClientConfig, ClientError, NotificationFeed, Session},
    domain::approval::ApprovalAction,
    models::{
        auth::TokenPair,
        dispatch::{DispatchFilter, DispatchStatus},
        submission::UploadedFile,
    },
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn logged_in(api_url: &str) -> ApiClient {
    let session = Session::with_tokens(TokenPair { access: "acesso".into(), refresh: "renovacao".into() });
    ApiClient::with_session(ClientConfig::with_api_url(api_url), session).unwrap()
}

// ===== TRANSPORTE =====

#[tokio::test]
async fn html_error_page_is_reported_as_html_response() {
    let router = Router::new().route(
        "/api/states/",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                "<html><body>Not Found</body></html>",
            )
        }),
    );
    let client = logged_in(&serve(router).await);

    let err = client.states().await.unwrap_err();
    assert!(matches!(err, ClientError::HtmlResponse { status: 404 }));
    assert!(err.to_string().contains("HTML"));
}

#[tokio::test]
async fn unauthorized_invalidates_session_and_fires_callback() {
    let router = Router::new().route(
        "/api/me/",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Token inválido" }))) }),
    );
    let client = logged_in(&serve(router).await);

    let fired = Arc::new(AtomicUsize::new(0));
    client.session().on_invalidate({
        let fired = fired.clone();
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    });

    let err = client.me().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert!(!client.session().is_authenticated());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_login_surfaces_server_message() {
    let router = Router::new().route(
        "/api/auth/login/",
        post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Credenciais inválidas" }))) }),
    );
    let client = ApiClient::new(ClientConfig::with_api_url(serve(router).await)).unwrap();

    let err = client.login("ana", "errada").await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Credenciais inválidas");
        }
        other => panic!("erro inesperado: {other:?}"),
    }
}

#[tokio::test]
async fn field_errors_use_first_message() {
    let router = Router::new().route(
        "/api/companies/",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": { "cnpj": ["CNPJ inválido."] } })),
            )
        }),
    );
    let client = logged_in(&serve(router).await);

    let err = client.create_company(&Default::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "CNPJ inválido.");
}

#[tokio::test]
async fn unexpected_shape_is_a_decode_error() {
    let router = Router::new().route("/api/notifications/stats/", get(|| async { Json(json!([1, 2, 3])) }));
    let client = logged_in(&serve(router).await);

    let err = client.notification_stats().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { ref endpoint, .. } if endpoint == "notifications/stats/"));
}

#[tokio::test]
async fn mistyped_field_is_a_decode_error() {
    let router = Router::new().route(
        "/api/notifications/stats/",
        get(|| async { Json(json!({ "total": "x", "unread": 0, "read": 0 })) }),
    );
    let client = logged_in(&serve(router).await);

    let err = client.notification_stats().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
}

#[tokio::test]
async fn html_login_page_on_401_still_ends_session() {
    let router = Router::new().route(
        "/api/me/",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                "<html><body>Login</body></html>",
            )
        }),
    );
    let client = logged_in(&serve(router).await);

    let err = client.me().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn login_stores_tokens_in_session() {
    let router = Router::new().route(
        "/api/auth/login/",
        post(|| async { Json(json!({ "access": "a1", "refresh": "r1" })) }),
    );
    let client = ApiClient::new(ClientConfig::with_api_url(serve(router).await)).unwrap();

    client.login("ana", "segredo").await.unwrap();
    assert_eq!(client.session().access_token().as_deref(), Some("a1"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("r1"));
}

// ===== DECISÕES =====

#[tokio::test]
async fn rejection_without_comment_sends_nothing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/api/approvals/{id}/reject/",
            post(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::OK
            }),
        )
        .with_state(hits.clone());
    let client = logged_in(&serve(router).await);

    let form = DecisionForm::with_comment(ApprovalAction::Reject, "   ");
    let err = client.decide(10, &form).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ===== NOTIFICAÇÕES =====

fn notification(id: i64, is_read: bool) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "obligation_id": null,
        "type": "due_soon",
        "priority": "high",
        "title": "Vencimento próximo",
        "message": "DCTF vence em 3 dias",
        "is_read": is_read,
        "created_at": "2025-03-01T12:00:00Z",
        "read_at": null
    })
}

type Inbox = Arc<Mutex<Vec<bool>>>;

fn inbox_router(inbox: Inbox) -> Router {
    Router::new()
        .route(
            "/api/notifications/",
            get(|State(inbox): State<Inbox>| async move {
                let items: Vec<Value> = inbox
                    .lock()
                    .unwrap()
                    .iter()
                    .enumerate()
                    .map(|(i, read)| notification(i as i64 + 1, *read))
                    .collect();
                Json(Value::Array(items))
            }),
        )
        .route(
            "/api/notifications/stats/",
            get(|State(inbox): State<Inbox>| async move {
                let inbox = inbox.lock().unwrap();
                let read = inbox.iter().filter(|r| **r).count();
                Json(json!({ "total": inbox.len(), "unread": inbox.len() - read, "read": read }))
            }),
        )
        .route(
            "/api/notifications/{id}/read/",
            post(|State(inbox): State<Inbox>, Path(id): Path<usize>| async move {
                inbox.lock().unwrap()[id - 1] = true;
                Json(json!({ "status": "success" }))
            }),
        )
        .with_state(inbox)
}

#[tokio::test]
async fn feed_refetches_counts_after_mark_read() {
    let inbox: Inbox = Arc::new(Mutex::new(vec![false, false, true]));
    let client = logged_in(&serve(inbox_router(inbox)).await);

    let feed = NotificationFeed::start(client);
    let mut updates = feed.subscribe();
    updates.wait_for(|s| s.stats.total > 0).await.unwrap();
    assert_eq!(feed.snapshot().unread(), 2);

    feed.mark_read(1).await.unwrap();
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.stats.unread, 1);
    assert_eq!(snapshot.stats.read, 2);
    assert!(snapshot.notifications[0].is_read);
    assert!(snapshot.last_error.is_none());

    feed.shutdown().await;
}

/// Caixa de entrada cuja próxima listagem pode ser lenta: o estado é lido
/// no início da requisição e devolvido depois da espera.
#[derive(Clone, Default)]
struct SlowInbox {
    read: Arc<Mutex<Vec<bool>>>,
    slow_next: Arc<std::sync::atomic::AtomicBool>,
    list_calls: Arc<AtomicUsize>,
}

fn slow_inbox_router(inbox: SlowInbox) -> Router {
    Router::new()
        .route(
            "/api/notifications/",
            get(|State(inbox): State<SlowInbox>| async move {
                let items: Vec<Value> = inbox
                    .read
                    .lock()
                    .unwrap()
                    .iter()
                    .enumerate()
                    .map(|(i, read)| notification(i as i64 + 1, *read))
                    .collect();
                inbox.list_calls.fetch_add(1, Ordering::SeqCst);
                if inbox.slow_next.swap(false, Ordering::SeqCst) {
                    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
                }
                Json(Value::Array(items))
            }),
        )
        .route(
            "/api/notifications/stats/",
            get(|State(inbox): State<SlowInbox>| async move {
                let read = inbox.read.lock().unwrap().clone();
                let done = read.iter().filter(|r| **r).count();
                Json(json!({ "total": read.len(), "unread": read.len() - done, "read": done }))
            }),
        )
        .route(
            "/api/notifications/{id}/read/",
            post(|State(inbox): State<SlowInbox>, Path(id): Path<usize>| async move {
                inbox.read.lock().unwrap()[id - 1] = true;
                Json(json!({ "status": "success" }))
            }),
        )
        .with_state(inbox)
}

#[tokio::test]
async fn stale_poll_does_not_overwrite_read_mark() {
    let inbox = SlowInbox { read: Arc::new(Mutex::new(vec![false, false])), ..SlowInbox::default() };
    let client = logged_in(&serve(slow_inbox_router(inbox.clone())).await);

    let feed = NotificationFeed::start(client);
    feed.subscribe().wait_for(|s| s.stats.total > 0).await.unwrap();

    // Uma busca em segundo plano lê o estado antigo e fica presa na espera.
    inbox.slow_next.store(true, Ordering::SeqCst);
    let calls_before = inbox.list_calls.load(Ordering::SeqCst);
    feed.request_refresh();
    while inbox.list_calls.load(Ordering::SeqCst) == calls_before {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    feed.mark_read(1).await.unwrap();
    assert!(feed.snapshot().notifications[0].is_read);

    tokio::time::sleep(std::time::Duration::from_millis(450)).await;
    let snapshot = feed.snapshot();
    assert!(snapshot.notifications[0].is_read);
    assert_eq!(snapshot.stats.unread, 1);

    feed.shutdown().await;
}

// ===== IMPORTAÇÃO =====

#[tokio::test]
async fn import_summary_reports_partial_success() {
    let router = Router::new().route(
        "/api/imports/companies/",
        post(|| async {
            Json(json!({
                "created": 8,
                "total_processed": 10,
                "errors": ["Linha 3: CNPJ inválido (123)", "Linha 7: nome da empresa é obrigatório"]
            }))
        }),
    );
    let client = logged_in(&serve(router).await);
    let sheet = UploadedFile {
        filename: "empresas.csv".into(),
        content_type: Some("text/csv".into()),
        bytes: b"name,cnpj\n".to_vec(),
    };

    let summary = client.import_companies(&sheet).await.unwrap();
    assert_eq!(summary.created, 8);
    assert_eq!(summary.total_processed, 10);
    assert_eq!(summary.errors.len(), 2);
    assert_eq!(summary.banner(), "8 de 10 linhas importadas; 2 com erro.");
}

// ===== DESPACHOS =====

const DISPATCH_ID: &str = "5f0c6a53-8a0e-4f7e-9a51-1d2b3c4d5e6f";
const SUBTASK_ID: &str = "0b8e9f4c-2d3a-4b5c-8d7e-6f5a4b3c2d1e";

fn dispatch(done: bool) -> Value {
    let (progress, status) = if done { (100.0, "CONCLUIDO") } else { (0.0, "NAO_INICIADO") };
    json!([{
        "id": DISPATCH_ID,
        "company_id": 1,
        "company_name": "Empresa Alfa",
        "category": "FISCALIZACAO",
        "title": null,
        "responsible_id": null,
        "responsible_username": null,
        "start_date": "2025-03-01",
        "end_date": "2025-03-31",
        "progress_pct": progress,
        "status": status,
        "created_by": 1,
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": "2025-03-01T12:00:00Z",
        "subtasks": []
    }])
}

#[tokio::test]
async fn subtask_change_returns_refetched_dispatches() {
    let done = Arc::new(Mutex::new(false));
    let router = Router::new()
        .route(
            "/api/dispatches/",
            get(|State(done): State<Arc<Mutex<bool>>>| async move { Json(dispatch(*done.lock().unwrap())) }),
        )
        .route(
            "/api/dispatches/{id}/subtasks/{subtask_id}/",
            axum::routing::patch(|State(done): State<Arc<Mutex<bool>>>| async move {
                *done.lock().unwrap() = true;
                Json(json!({
                    "id": SUBTASK_ID,
                    "dispatch_id": DISPATCH_ID,
                    "name": "Reunir documentos",
                    "status": "CONCLUIDO",
                    "order": 0,
                    "created_at": "2025-03-01T12:00:00Z",
                    "updated_at": "2025-03-02T12:00:00Z"
                }))
            }),
        )
        .with_state(done);
    let client = logged_in(&serve(router).await);

    let dispatches = client
        .set_subtask_status(
            DISPATCH_ID.parse().unwrap(),
            SUBTASK_ID.parse().unwrap(),
            DispatchStatus::Concluido,
            &DispatchFilter::default(),
        )
        .await
        .unwrap();

    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].status, DispatchStatus::Concluido);
    assert_eq!(dispatches[0].progress_pct.to_string(), "100");
}

// ===== DOWNLOADS =====

#[tokio::test]
async fn download_uses_content_disposition_filename() {
    let router = Router::new().route(
        "/api/approvals/{id}/attachments/{attachment_id}/download/",
        get(|| async {
            Response::builder()
                .header(header::CONTENT_TYPE, "application/pdf")
                .header(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"recibo_marco.pdf\"; filename*=UTF-8''recibo_mar%C3%A7o.pdf",
                )
                .body(axum::body::Body::from("%PDF-1.4"))
                .unwrap()
                .into_response()
        }),
    );
    let client = logged_in(&serve(router).await);

    let download = client.download_attachment(3, 9).await.unwrap();
    assert_eq!(download.filename, "recibo_março.pdf");
    assert_eq!(download.content_type.as_deref(), Some("application/pdf"));

    let dir = tempfile::tempdir().unwrap();
    let path = download.save_to(dir.path()).await.unwrap();
    assert_eq!(tokio::fs::read(path).await.unwrap(), b"%PDF-1.4");
}
