use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{
    http::header::{self, ContentDisposition},
    post, web, HttpRequest, HttpResponse,
};
use futures::{Stream, StreamExt};

use crate::{
    app_state::AppState,
    errors::{AppError, AppResult},
    models::{
        domain::RawModelReply,
        dto::{request::ReplyRequestDto, response::ExtractTextResponse},
    },
    services::pdf_writer,
};

const UPLOAD_FIELD: &str = "file";

/// Extracts the plain text of an uploaded PDF.
///
/// The document is read from the `file` field of a `multipart/form-data`
/// form. Any other content type is taken as the raw PDF bytes.
#[post("/api/pdf")]
pub async fn extract_pdf(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let limit = state.config.max_upload_bytes;
    let upload = if is_multipart(&req) {
        read_file_field(Multipart::new(req.headers(), payload), limit).await?
    } else {
        Some(collect_limited(payload, limit).await?)
    };

    let body = match upload {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(AppError::NoFileProvided),
    };

    let extractor = Arc::clone(&state.extractor);
    let text = web::block(move || extractor.extract(&body))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ExtractTextResponse { text }))
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Returns the bytes of the `file` field, or `None` when the form has none.
async fn read_file_field(mut form: Multipart, limit: usize) -> AppResult<Option<Vec<u8>>> {
    while let Some(field) = form.next().await {
        let field = field.map_err(invalid_upload)?;
        if field.name() == Some(UPLOAD_FIELD) {
            return collect_limited(field, limit).await.map(Some);
        }
    }
    Ok(None)
}

async fn collect_limited<S, B, E>(mut stream: S, limit: usize) -> AppResult<Vec<u8>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(invalid_upload)?;
        if bytes.len() + chunk.as_ref().len() > limit {
            return Err(AppError::ValidationError(format!(
                "Upload exceeds {} bytes",
                limit
            )));
        }
        bytes.extend_from_slice(chunk.as_ref());
    }
    Ok(bytes)
}

fn invalid_upload(err: impl std::fmt::Display) -> AppError {
    AppError::ValidationError(format!("Invalid upload: {}", err))
}

/// Normalizes a model reply and sends it back as a PDF attachment.
#[post("/api/export")]
pub async fn export_pdf(
    state: web::Data<AppState>,
    request: web::Json<ReplyRequestDto>,
) -> Result<HttpResponse, AppError> {
    let ReplyRequestDto { mode, text } = request.into_inner();
    let artifact = state.normalizer.normalize(mode, &RawModelReply::new(text));
    let rendered = state.renderer.render(&artifact);
    let bytes = pdf_writer::write_pdf(&rendered)?;
    let file_name = artifact.export_file_name();

    log::info!(
        "Exported {} as '{}' ({} pages)",
        mode,
        file_name,
        rendered.pages.len()
    );

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition::attachment(file_name))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::{header, StatusCode},
        test, App,
    };
    use serde_json::json;

    use super::*;
    use crate::{
        config::Config,
        errors::ErrorResponse,
        services::pdf_extraction::MockTextExtractor,
        test_utils::{fixtures::sample_plan, test_helpers::assert_success_status},
    };

    fn state_with(extractor: MockTextExtractor) -> AppState {
        AppState::with_components(Config::test_config(), None, Arc::new(extractor))
    }

    #[actix_web::test]
    async fn test_extract_pdf_returns_text() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract()
            .withf(|bytes| bytes.starts_with(b"%PDF"))
            .times(1)
            .returning(|_| Ok("Chapter 1".to_string()));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(extractor)))
                .service(extract_pdf),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/pdf")
            .set_payload(&b"%PDF-1.7 ..."[..])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_success_status(resp.status());
        let body: ExtractTextResponse = test::read_body_json(resp).await;
        assert_eq!(body.text, "Chapter 1");
    }

    #[actix_web::test]
    async fn test_extract_pdf_without_body_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(MockTextExtractor::new())))
                .service(extract_pdf),
        )
        .await;
        let req = test::TestRequest::post().uri("/api/pdf").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "no file");
    }

    fn form_body(field_name: &str, contents: &str) -> String {
        format!(
            "--XyZ\r\n\
             Content-Disposition: form-data; name=\"{}\"; filename=\"notes.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             {}\r\n\
             --XyZ--\r\n",
            field_name, contents
        )
    }

    #[actix_web::test]
    async fn test_extract_pdf_reads_file_field_of_form() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract()
            .withf(|bytes| bytes == &b"%PDF-1.4 lecture"[..])
            .times(1)
            .returning(|_| Ok("Lecture notes".to_string()));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(extractor)))
                .service(extract_pdf),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/pdf")
            .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=XyZ"))
            .set_payload(form_body("file", "%PDF-1.4 lecture"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_success_status(resp.status());
        let body: ExtractTextResponse = test::read_body_json(resp).await;
        assert_eq!(body.text, "Lecture notes");
    }

    #[actix_web::test]
    async fn test_extract_pdf_form_without_file_field_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(MockTextExtractor::new())))
                .service(extract_pdf),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/pdf")
            .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=XyZ"))
            .set_payload(form_body("attachment", "%PDF-1.4 lecture"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "no file");
    }

    #[actix_web::test]
    async fn test_extract_pdf_failure_uses_parse_failed_envelope() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract()
            .returning(|_| Err(AppError::PdfExtraction("bad xref".to_string())));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(extractor)))
                .service(extract_pdf),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/pdf")
            .set_payload(&b"%PDF-broken"[..])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "parse failed");
        assert_eq!(body.detail.as_deref(), Some("bad xref"));
    }

    #[actix_web::test]
    async fn test_export_returns_pdf_attachment() {
        let reply = serde_json::to_string(&sample_plan()).expect("plan should serialize");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(MockTextExtractor::new())))
                .service(export_pdf),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/export")
            .set_json(json!({"mode": "planning", "text": reply}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_success_status(resp.status());
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/pdf")
        );
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();
        assert!(disposition.contains("Exam week.pdf"));

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn test_export_of_untitled_reply_uses_mode_file_name() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(MockTextExtractor::new())))
                .service(export_pdf),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/export")
            .set_json(json!({"mode": "fiche", "text": "{\"key_points\":[\"a\"]}"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_success_status(resp.status());
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();
        assert!(disposition.contains("fiche.pdf"));
    }
}
