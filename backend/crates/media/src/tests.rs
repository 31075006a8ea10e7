//! Router-level tests for the media crate
//! Engines are replaced by in-process fakes; everything else is real.

#[cfg(test)]
mod router_tests {
    use crate::application::config::MediaConfig;
    use crate::domain::engines::{BackgroundRemover, DownloadPlan, EngineError, VideoExtractor};
    use crate::domain::entities::{RawFormat, RawVideoInfo};
    use crate::domain::value_objects::{DomainPolicy, PolicyMode, Quality};
    use crate::infra::artifact_store::ArtifactStore;
    use crate::infra::image_store::{ArtifactFormat, encode};
    use crate::infra::reaper::Reaper;
    use crate::presentation::handlers::MediaAppState;
    use crate::presentation::router::media_router;
    use axum::Router;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use platform::encoding::to_base64;
    use platform::rate_limit::{AdmissionController, RateLimitConfig};
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct FakeEngines {
        ready: bool,
        info: Option<RawVideoInfo>,
        /// Extension the fake downloader writes
        download_ext: &'static str,
        download_fails: bool,
    }

    impl Default for FakeEngines {
        fn default() -> Self {
            Self {
                ready: true,
                info: Some(sample_info()),
                download_ext: "mp4",
                download_fails: false,
            }
        }
    }

    impl BackgroundRemover for FakeEngines {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn remove_background(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
            tokio::fs::copy(input, output)
                .await
                .map(|_| ())
                .map_err(|source| EngineError::Spawn {
                    tool: "fake".to_string(),
                    source,
                })
        }
    }

    impl VideoExtractor for FakeEngines {
        async fn extract_info(&self, _url: &str) -> Result<RawVideoInfo, EngineError> {
            self.info.clone().ok_or_else(|| EngineError::Failed {
                tool: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "ERROR: Unsupported URL".to_string(),
            })
        }

        async fn download(&self, plan: &DownloadPlan) -> Result<(), EngineError> {
            if self.download_fails {
                return Err(EngineError::Failed {
                    tool: "fake".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "File is larger than max-filesize".to_string(),
                });
            }
            let template = plan.output_template.to_string_lossy().into_owned();
            let target = template.replace("%(ext)s", self.download_ext);
            tokio::fs::write(target, b"fake media bytes")
                .await
                .map_err(|source| EngineError::Spawn {
                    tool: "fake".to_string(),
                    source,
                })
        }
    }

    fn sample_info() -> RawVideoInfo {
        RawVideoInfo {
            title: Some("Clip".to_string()),
            thumbnail: Some("https://i.ytimg.com/x.jpg".to_string()),
            duration_string: Some("1:02".to_string()),
            extractor_key: Some("Youtube".to_string()),
            formats: vec![
                RawFormat {
                    format_id: Some("18".to_string()),
                    resolution: Some("640x360".to_string()),
                    ext: Some("mp4".to_string()),
                    vcodec: Some("avc1".to_string()),
                    filesize: Some(2_097_152.0),
                    ..Default::default()
                },
                RawFormat {
                    format_id: Some("140".to_string()),
                    resolution: Some("audio only".to_string()),
                    ext: Some("m4a".to_string()),
                    vcodec: Some("none".to_string()),
                    ..Default::default()
                },
            ],
        }
    }

    struct TestApp {
        router: Router,
        state: MediaAppState<FakeEngines>,
        _dir: tempfile::TempDir,
    }

    fn test_app_with(engines: FakeEngines, tweak: impl FnOnce(&mut MediaConfig)) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let mut config =
            MediaConfig::with_dirs(dir.path().join("uploads"), dir.path().join("outputs"));
        config.rate_limit = RateLimitConfig::new(0, 0, 0);
        config.public_base_url = Some("http://test.local".to_string());
        tweak(&mut config);

        std::fs::create_dir_all(&config.upload_dir).unwrap();
        std::fs::create_dir_all(&config.output_dir).unwrap();

        let config = Arc::new(config);
        let admission = Arc::new(AdmissionController::new(config.rate_limit.clone()));
        let state = MediaAppState {
            engines: Arc::new(engines),
            admission: admission.clone(),
            store: Arc::new(ArtifactStore::new(
                config.upload_dir.clone(),
                config.output_dir.clone(),
            )),
            reaper: Arc::new(Reaper::from_config(&config, admission)),
            config,
        };

        TestApp {
            router: media_router(state.clone()),
            state,
            _dir: dir,
        }
    }

    fn test_app() -> TestApp {
        test_app_with(FakeEngines::default(), |_| {})
    }

    fn from_ip(mut req: Request<Body>, ip: &str) -> Request<Body> {
        let addr: SocketAddr = format!("{ip}:40000").parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(file: &[u8], quality: &str) -> Request<Body> {
        let boundary = "azura-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(
            format!(
                "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"quality\"\r\n\r\n{quality}\r\n--{boundary}--\r\n"
            )
            .as_bytes(),
        );

        Request::post("/api/remove-bg")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let image =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 120, 200, 255])));
        encode(&image, ArtifactFormat::Png, Quality::Hd).unwrap()
    }

    fn data_url(image: DynamicImage) -> String {
        let bytes = encode(&image, ArtifactFormat::Png, Quality::Hd).unwrap();
        format!("data:image/png;base64,{}", to_base64(&bytes))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ------------------------------------------------------------------
    // Root / health
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_root_and_health() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["status"].as_str().unwrap().contains("Ready"));
        assert_eq!(body["model"], "u2netp");

        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_ready"], true);
        assert_eq!(body["tracked_clients"], 0);
    }

    // ------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_cooldown_rejects_second_request_per_client() {
        let app = test_app_with(FakeEngines::default(), |config| {
            config.rate_limit = RateLimitConfig::new(500, 10, 60);
        });
        let req = || json_request("/api/video-info", json!({"url": "https://youtu.be/abc"}));

        let first = app
            .router
            .clone()
            .oneshot(from_ip(req(), "1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .router
            .clone()
            .oneshot(from_ip(req(), "1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers().get(header::RETRY_AFTER).unwrap(), "1");
        let body = body_json(second).await;
        assert_eq!(body["detail"], "Too many requests");

        // Another client is unaffected
        let other = app
            .router
            .clone()
            .oneshot(from_ip(req(), "5.6.7.8"))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::OK);
        assert_eq!(app.state.admission.len(), 2);
    }

    #[tokio::test]
    async fn test_health_is_not_throttled() {
        let app = test_app_with(FakeEngines::default(), |config| {
            config.rate_limit = RateLimitConfig::new(60_000, 1, 60);
        });
        for _ in 0..3 {
            let response = app
                .router
                .clone()
                .oneshot(from_ip(
                    Request::get("/health").body(Body::empty()).unwrap(),
                    "1.2.3.4",
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    // ------------------------------------------------------------------
    // Remove background
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_remove_bg_writes_artifact() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(multipart_request(&png_bytes(64, 48), "Medium"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let filename = body["filename"].as_str().unwrap().to_string();
        assert!(filename.starts_with("rbg_") && filename.ends_with(".png"));
        assert_eq!(body["quality"], "Medium");
        assert_eq!(
            body["url"],
            format!("http://test.local/outputs/{filename}")
        );
        assert!(app.state.config.output_dir.join(&filename).exists());

        // Staging files are cleaned up straight away
        let staged = std::fs::read_dir(&app.state.config.upload_dir).unwrap().count();
        assert_eq!(staged, 0);

        // And the artifact is served statically
        let response = app
            .router
            .oneshot(
                Request::get(format!("/outputs/{filename}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_remove_bg_rejects_non_image() {
        let app = test_app();
        let response = app
            .router
            .oneshot(multipart_request(b"GIF89a not supported", "HD"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid image file");
    }

    #[tokio::test]
    async fn test_remove_bg_model_unavailable() {
        let engines = FakeEngines {
            ready: false,
            ..FakeEngines::default()
        };
        let app = test_app_with(engines, |_| {});
        let response = app
            .router
            .oneshot(multipart_request(&png_bytes(8, 8), "HD"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Model unavailable");
    }

    #[tokio::test]
    async fn test_remove_bg_body_limit() {
        let app = test_app_with(FakeEngines::default(), |config| {
            config.max_upload_bytes = 1024;
        });
        let response = app
            .router
            .oneshot(multipart_request(&vec![0xFF; 4096], "HD"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    // ------------------------------------------------------------------
    // Erase object
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_erase_object_writes_jpeg() {
        let app = test_app();

        let mut image = RgbImage::from_pixel(40, 30, Rgb([30, 60, 90]));
        let mut mask = GrayImage::new(40, 30);
        for y in 10..20 {
            for x in 15..25 {
                image.put_pixel(x, y, Rgb([250, 250, 0]));
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let response = app
            .router
            .oneshot(json_request(
                "/api/erase-object",
                json!({
                    "image": data_url(DynamicImage::ImageRgb8(image)),
                    "mask": data_url(DynamicImage::ImageLuma8(mask)),
                    "strength": 3,
                    "detail": 0,
                    "quality": "Low",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let url = body["url"].as_str().unwrap();
        let filename = url.rsplit('/').next().unwrap();
        assert!(filename.starts_with("magic_") && filename.ends_with(".jpg"));

        let written = std::fs::read(app.state.config.output_dir.join(filename)).unwrap();
        assert_eq!(&written[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_erase_object_bad_base64() {
        let app = test_app();
        let response = app
            .router
            .oneshot(json_request(
                "/api/erase-object",
                json!({"image": "data:image/png;base64,@@@", "mask": "data:image/png;base64,@@@"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_erase_object_missing_field() {
        let app = test_app();
        let response = app
            .router
            .oneshot(json_request("/api/erase-object", json!({"image": "abc"})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    // ------------------------------------------------------------------
    // Video info
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_video_info_lists_formats() {
        let app = test_app();
        let response = app
            .router
            .oneshot(json_request(
                "/api/video-info",
                json!({"url": "https://www.youtube.com/watch?v=abc"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["title"], "Clip");
        assert_eq!(body["duration"], "1:02");
        assert_eq!(body["source"], "Youtube");

        let formats = body["formats"].as_array().unwrap();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[0]["format_id"], "mp3");
        assert_eq!(formats[0]["size"], "~3MB");
        assert_eq!(formats[1]["format_id"], "18");
        assert_eq!(formats[1]["size"], "2.0MB");
    }

    #[tokio::test]
    async fn test_video_info_extractor_failure() {
        let engines = FakeEngines {
            info: None,
            ..FakeEngines::default()
        };
        let app = test_app_with(engines, |_| {});
        let response = app
            .router
            .oneshot(json_request(
                "/api/video-info",
                json!({"url": "https://youtu.be/missing"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Failed to fetch video info");
    }

    #[tokio::test]
    async fn test_video_info_domain_policy() {
        let log_only = test_app();
        let response = log_only
            .router
            .oneshot(json_request(
                "/api/video-info",
                json!({"url": "https://vimeo.com/1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let enforce = test_app_with(FakeEngines::default(), |config| {
            config.domain_policy = DomainPolicy::default().with_mode(PolicyMode::Enforce);
        });
        let response = enforce
            .router
            .oneshot(json_request(
                "/api/video-info",
                json!({"url": "https://vimeo.com/1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Unsupported domain");
    }

    // ------------------------------------------------------------------
    // Video download
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_video_download_streams_attachment() {
        let app = test_app();
        let response = app
            .router
            .oneshot(json_request(
                "/api/video-download",
                json!({"url": "https://youtu.be/abc", "format_id": "18"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"dl_"));
        assert!(disposition.ends_with(".mp4\""));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fake media bytes");
    }

    #[tokio::test]
    async fn test_video_download_falls_back_to_stem() {
        let engines = FakeEngines {
            download_ext: "webm",
            ..FakeEngines::default()
        };
        let app = test_app_with(engines, |_| {});
        let response = app
            .router
            .oneshot(json_request(
                "/api/video-download",
                json!({"url": "https://youtu.be/abc", "format_id": "best"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.ends_with(".webm\""));
    }

    #[tokio::test]
    async fn test_video_download_rejects_option_like_format() {
        let app = test_app();
        let response = app
            .router
            .oneshot(json_request(
                "/api/video-download",
                json!({"url": "https://youtu.be/abc", "format_id": "--exec=rm"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_video_download_failure_reports_configured_cap() {
        let engines = FakeEngines {
            download_fails: true,
            ..FakeEngines::default()
        };
        let app = test_app_with(engines, |config| config.max_video_bytes = 50 * 1024 * 1024);
        let response = app
            .router
            .oneshot(json_request(
                "/api/video-download",
                json!({"url": "https://youtu.be/abc", "format_id": "best"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Download failed (file may exceed 50MB)");
        assert!(!body.to_string().contains("max-filesize"));
    }
}

#[cfg(test)]
mod dto_tests {
    use crate::domain::entities::{FormatOption, VideoSummary};
    use crate::presentation::dto::{EraseRequest, VideoInfoResponse};

    #[test]
    fn test_erase_request_defaults() {
        let req: EraseRequest = serde_json::from_str(r#"{"image":"a","mask":"b"}"#).unwrap();
        assert_eq!(req.strength, 5);
        assert_eq!(req.detail, 2);
        assert_eq!(req.quality, "HD");
    }

    #[test]
    fn test_video_info_response_shape() {
        let summary = VideoSummary {
            title: Some("t".to_string()),
            thumbnail: None,
            duration: None,
            source: Some("TikTok".to_string()),
            formats: vec![FormatOption {
                format_id: "mp3".to_string(),
                resolution: "Audio MP3".to_string(),
                ext: "mp3".to_string(),
                size: "~3MB".to_string(),
                note: "High Quality Audio".to_string(),
            }],
        };
        let value = serde_json::to_value(VideoInfoResponse::from(summary)).unwrap();
        assert_eq!(value["thumbnail"], serde_json::Value::Null);
        assert_eq!(value["formats"][0]["resolution"], "Audio MP3");
        assert_eq!(value["formats"][0]["note"], "High Quality Audio");
    }
}
