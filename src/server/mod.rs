// HTTP surface: merge endpoints, health probe and static output files
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

mod error;
mod routes;

pub use error::ApiError;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let server = &state.workflow.config().server;
    let output_dir = server.output_dir.clone();
    let body_limit = server.body_limit_mb * 1024 * 1024;

    Router::new()
        .route("/health", get(routes::health))
        .route("/vdo/merge", post(routes::merge_videos))
        .route("/img/merge", post(routes::merge_images))
        .nest_service("/merge", ServeDir::new(output_dir))
        .layer(middleware::from_fn(hide_pending_outputs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Outputs still being rendered carry a leading dot and are never served
async fn hide_pending_outputs(request: Request, next: Next) -> Response {
    let hidden = request
        .uri()
        .path()
        .strip_prefix("/merge/")
        .is_some_and(|rest| rest.split('/').any(|segment| segment.starts_with('.')));

    if hidden {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Bind to a host name or address literal
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    Ok(TcpListener::bind((host, port)).await?)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let listener = bind(host, port).await?;
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::MergeError;
    use crate::media::{MediaCommand, MediaMetadata, MediaProcessorTrait, MockMediaProcessorTrait};
    use assert_fs::prelude::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    fn test_router(root: &assert_fs::TempDir, media: MockMediaProcessorTrait) -> Router {
        let mut config = Config::default();
        config.server.output_dir = root.path().join("merge");
        config.server.scratch_dir = Some(root.path().join("scratch"));
        let media: Arc<dyn MediaProcessorTrait> = Arc::new(media);
        build_router(AppState::new(config, media))
    }

    fn local(root: &assert_fs::TempDir, name: &str) -> String {
        let child = root.child(name);
        child.touch().unwrap();
        child.path().to_string_lossy().to_string()
    }

    fn touch_target(cmd: &MediaCommand) -> crate::error::Result<()> {
        std::fs::write(cmd.target().unwrap(), b"rendered")?;
        Ok(())
    }

    fn idle_engine() -> MockMediaProcessorTrait {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_execute_command().never();
        media.expect_probe().never();
        media
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let root = assert_fs::TempDir::new().unwrap();
        let app = test_router(&root, idle_engine());

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "OK");
        assert!(json["timestamp"].is_string());
        assert!(json["features"].as_array().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn missing_required_fields_return_400_without_engine() {
        let root = assert_fs::TempDir::new().unwrap();

        for body in [
            json!({"inputvdo": ["a.mp4"], "inputaud": "a.mp3"}),
            json!({"filename": "out.mp4", "inputaud": "a.mp3"}),
            json!({"filename": "out.mp4", "inputvdo": ["a.mp4"]}),
        ] {
            let app = test_router(&root, idle_engine());
            let (status, json) = post_json(app, "/vdo/merge", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(json["error"].as_str().unwrap().contains("Missing required fields"));
        }
    }

    #[tokio::test]
    async fn malformed_body_returns_400() {
        let root = assert_fs::TempDir::new().unwrap();
        let app = test_router(&root, idle_engine());

        let request = Request::builder()
            .method("POST")
            .uri("/img/merge")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_local_files_return_404_with_list() {
        let root = assert_fs::TempDir::new().unwrap();
        let clip = local(&root, "a.mp4");
        let missing_clip = root.child("b.mp4").path().to_string_lossy().to_string();
        let missing_subs = root.child("subs.srt").path().to_string_lossy().to_string();

        let app = test_router(&root, idle_engine());
        let (status, json) = post_json(
            app,
            "/vdo/merge",
            json!({
                "filename": "out.mp4",
                "inputvdo": [clip, missing_clip, "https://unreachable.invalid/c.mp4"],
                "inputaud": "https://unreachable.invalid/audio.mp3",
                "subtitle": missing_subs,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let missing: Vec<&str> = json["missing"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(missing.len(), 2);
        assert!(missing[0].ends_with("b.mp4"));
        assert!(missing[1].ends_with("subs.srt"));
    }

    #[tokio::test]
    async fn desktop_clip_merge_succeeds() {
        let root = assert_fs::TempDir::new().unwrap();
        let (a, b, audio) = (local(&root, "a.mp4"), local(&root, "b.mp4"), local(&root, "audio.mp3"));

        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let mut media = MockMediaProcessorTrait::new();
        media.expect_execute_command().times(2).returning(move |cmd| {
            seen.lock().unwrap().push(cmd.clone());
            touch_target(cmd)
        });
        media.expect_probe().times(1).returning(|_| {
            Ok(MediaMetadata { duration: 12.5 })
        });

        let app = test_router(&root, media);
        let (status, json) = post_json(
            app,
            "/vdo/merge",
            json!({"filename": "out.mp4", "inputvdo": [a, b], "inputaud": audio, "device": "pc"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["file"], "out.mp4");
        assert_eq!(json["url"], "/merge/out.mp4");
        assert_eq!(json["duration"], 12.5);
        assert_eq!(json["resolution"], "1920x1080");
        assert_eq!(json["inputs"]["videos"][0]["origin"], "local");
        assert_eq!(json["inputs"]["audio"]["origin"], "local");
        assert!(json["inputs"]["subtitle"].is_null());
        assert!(json["inputs"].get("images").is_none());

        let stages = stages.lock().unwrap();
        assert_eq!(stages[0].description, "Concatenation");
        assert_eq!(stages[1].description, "Composition");
        assert_eq!(stages[1].value_of("-vf"), Some("scale=1920:1080"));
        assert_eq!(stages[1].value_of("-filter_complex"), Some("[1:a]volume=1.0[aout]"));
        assert!(root.path().join("merge/out.mp4").exists());
    }

    #[tokio::test]
    async fn slideshow_with_music_indexes_audio_after_images() {
        let root = assert_fs::TempDir::new().unwrap();
        let images: Vec<String> = ["1.jpg", "2.jpg", "3.jpg"].iter().map(|n| local(&root, n)).collect();
        let (audio, music) = (local(&root, "audio.mp3"), local(&root, "music.mp3"));

        let mut media = MockMediaProcessorTrait::new();
        media.expect_execute_command().times(1).returning(|cmd| {
            assert_eq!(cmd.description, "Slideshow");
            let graph = cmd.value_of("-filter_complex").unwrap();
            assert!(graph.contains("[3:a]volume=1.0[a1];[4:a]volume=0.1[a2];[a1][a2]amix=inputs=2:duration=shortest[aout]"));
            touch_target(cmd)
        });
        media.expect_probe().returning(|_| {
            Ok(MediaMetadata { duration: 15.0 })
        });

        let app = test_router(&root, media);
        let (status, json) = post_json(
            app,
            "/img/merge",
            json!({"filename": "show.mp4", "inputvdo": images, "inputaud": audio, "inputbgm": music}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["resolution"], "1280x720");
        assert_eq!(json["inputs"]["images"].as_array().unwrap().len(), 3);
        assert_eq!(json["inputs"]["bgm"]["origin"], "local");
        assert!(json["inputs"].get("videos").is_none());
    }

    #[tokio::test]
    async fn unreachable_remote_fails_at_engine_with_500() {
        let root = assert_fs::TempDir::new().unwrap();
        let audio = local(&root, "audio.mp3");

        let mut media = MockMediaProcessorTrait::new();
        media.expect_execute_command().times(1).returning(|_| {
            Err(MergeError::Engine(
                "Concatenation failed: https://unreachable.invalid/a.mp4: Connection refused".to_string(),
            ))
        });
        media.expect_probe().never();

        let app = test_router(&root, media);
        let (status, json) = post_json(
            app,
            "/vdo/merge",
            json!({"filename": "out.mp4", "inputvdo": ["https://unreachable.invalid/a.mp4"], "inputaud": audio}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json["error"],
            "Concatenation failed: https://unreachable.invalid/a.mp4: Connection refused"
        );
    }

    #[tokio::test]
    async fn probe_failure_returns_500() {
        let root = assert_fs::TempDir::new().unwrap();
        let (image, audio) = (local(&root, "1.png"), local(&root, "audio.mp3"));

        let mut media = MockMediaProcessorTrait::new();
        media.expect_execute_command().returning(touch_target);
        media
            .expect_probe()
            .returning(|_| Err(MergeError::Probe("moov atom not found".to_string())));

        let app = test_router(&root, media);
        let (status, json) = post_json(
            app,
            "/img/merge",
            json!({"filename": "show.mp4", "inputvdo": [image], "inputaud": audio}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("moov atom not found"));
    }

    #[tokio::test]
    async fn rendered_files_are_served() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("merge/out.mp4").write_binary(b"video").unwrap();
        let app = test_router(&root, idle_engine());

        let request = Request::builder().uri("/merge/out.mp4").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"video");
    }

    #[tokio::test]
    async fn outputs_being_rendered_are_not_served() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("merge/.7f1c-out.mp4").write_binary(b"partial").unwrap();
        let app = test_router(&root, idle_engine());

        let request = Request::builder().uri("/merge/.7f1c-out.mp4").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn binds_to_host_names() {
        let listener = bind("localhost", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
