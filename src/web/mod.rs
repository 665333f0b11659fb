use crate::commands::number::{number_pages, OUTPUT_NAME};
use crate::commands::split::{split_to_zip, ARCHIVE_NAME};
use crate::error::ToolError;
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;

const INDEX_TEMPLATE: &str = include_str!("index.html");
const INTERNAL_ERROR: &str = "Something went wrong while processing the PDF.";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Routes:
/// - `GET /` the upload form
/// - `POST /add_page_numbers` returns `numbered_document.pdf`
/// - `POST /split_pdf` returns `split_documents.zip`
///
/// Rejected uploads re-render the form with an error message.
pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add_page_numbers", post(add_page_numbers))
        .route("/split_pdf", post(split_pdf))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "serving PDF tools");

    axum::serve(listener, router(&config))
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn index() -> Html<String> {
    Html(render_index(None))
}

fn render_index(error: Option<&str>) -> String {
    let messages = error
        .map(|message| {
            format!(
                r#"<div class="message error">{}</div>"#,
                html_escape::encode_text(message)
            )
        })
        .unwrap_or_default();
    INDEX_TEMPLATE.replace("{{messages}}", &messages)
}

/// A message shown above the re-rendered form.
#[derive(Debug)]
struct FormError(String);

impl FormError {
    fn new(message: impl Into<String>) -> Self {
        FormError(message.into())
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        tracing::warn!(message = %self.0, "rejected upload");
        (StatusCode::BAD_REQUEST, Html(render_index(Some(self.0.as_str())))).into_response()
    }
}

impl From<ToolError> for FormError {
    fn from(err: ToolError) -> Self {
        let message = match &err {
            ToolError::InvalidRangeFormat(_) => {
                "Invalid page range format. Please use formats like \"1-3, 5, 8-10\"."
            }
            ToolError::NoMatchingPages => {
                "The specified page ranges are not valid for this document."
            }
            ToolError::EmptyDocument => "The uploaded PDF has no pages.",
            ToolError::UnreadableSource { .. } => "The uploaded file could not be read as a PDF.",
            _ => {
                tracing::error!(error = %err, "PDF processing failed");
                INTERNAL_ERROR
            }
        };
        FormError::new(message)
    }
}

struct Upload {
    file_name: String,
    bytes: Bytes,
    page_ranges: Option<String>,
}

fn upload_error(e: MultipartError) -> FormError {
    FormError::new(format!("The upload could not be read: {e}"))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, FormError> {
    let mut file = None;
    let mut page_ranges = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(upload_error)?;
                file = Some((file_name, bytes));
            }
            "page_ranges" => {
                page_ranges = Some(field.text().await.map_err(upload_error)?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file
        .filter(|(file_name, _)| !file_name.is_empty())
        .ok_or_else(|| FormError::new("No file was selected. Please upload a PDF."))?;

    if !file_name.to_lowercase().ends_with(".pdf") {
        return Err(FormError::new("Invalid file type. Please upload a PDF."));
    }

    Ok(Upload {
        file_name,
        bytes,
        page_ranges,
    })
}

/// PDF work is CPU-bound, so it runs off the async workers.
async fn run_blocking<T, F>(job: F) -> Result<T, FormError>
where
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(job).await.map_err(|e| {
        tracing::error!(error = %e, "PDF worker panicked");
        FormError::new(INTERNAL_ERROR)
    })?;
    result.map_err(FormError::from)
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn add_page_numbers(multipart: Multipart) -> Result<Response, FormError> {
    let Upload {
        file_name, bytes, ..
    } = read_upload(multipart).await?;

    let numbered = run_blocking(move || {
        let source = PdfDocument::from_bytes(file_name, &bytes)?;
        number_pages(&source)
    })
    .await?;

    tracing::info!(size = numbered.len(), "numbered pages");
    Ok(attachment(numbered, "application/pdf", OUTPUT_NAME))
}

async fn split_pdf(multipart: Multipart) -> Result<Response, FormError> {
    let Upload {
        file_name,
        bytes,
        page_ranges,
    } = read_upload(multipart).await?;
    let ranges = page_ranges
        .filter(|ranges| !ranges.trim().is_empty())
        .ok_or_else(|| FormError::new("Page ranges were not provided."))?;

    let archive = run_blocking(move || {
        let source = PdfDocument::from_bytes(file_name, &bytes)?;
        split_to_zip(&source, &ranges)
    })
    .await?;

    tracing::info!(files = archive.entries.len(), "split PDF");
    Ok(attachment(archive.bytes, "application/zip", ARCHIVE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{page_strings, page_texts, sample_pdf};
    use axum::body::Body;
    use axum::http::Request;
    use std::io::{Cursor, Read};
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdftools-test-boundary";

    fn pdf_bytes(pages: usize) -> Vec<u8> {
        PdfDocument::to_bytes(&mut sample_pdf(&vec![vec![]; pages])).unwrap()
    }

    fn form(uri: &str, file: Option<(&str, &[u8])>, ranges: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf_file\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(ranges) = ranges {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"page_ranges\"\r\n\r\n{ranges}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Response) {
        let response = router(&ServerConfig::default())
            .oneshot(request)
            .await
            .unwrap();
        (response.status(), response)
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_text(response: Response) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_both_forms() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, response) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"action="/add_page_numbers""#));
        assert!(html.contains(r#"action="/split_pdf""#));
        assert!(!html.contains("{{messages}}"));
    }

    #[tokio::test]
    async fn test_add_page_numbers_returns_numbered_pdf() {
        let pdf = pdf_bytes(3);
        let (status, response) =
            send(form("/add_page_numbers", Some(("report.pdf", pdf.as_slice())), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"numbered_document.pdf\""
        );

        let numbered = PdfDocument::from_bytes("numbered", &body_bytes(response).await).unwrap();
        assert_eq!(page_strings(&numbered.doc)[2], vec!["Page 3", "3"]);
    }

    #[tokio::test]
    async fn test_split_returns_zip_of_groups() {
        let pdf = pdf_bytes(10);
        let request = form("/split_pdf", Some(("book.pdf", pdf.as_slice())), Some("1-3, 5, 8-10"));
        let (status, response) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"split_documents.zip\""
        );

        let bytes = body_bytes(response).await;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "split_pages_1-3.pdf",
                "split_pages_5.pdf",
                "split_pages_8-10.pdf"
            ]
        );

        let mut pdf = Vec::new();
        archive
            .by_name("split_pages_5.pdf")
            .unwrap()
            .read_to_end(&mut pdf)
            .unwrap();
        let single = PdfDocument::from_bytes("single", &pdf).unwrap();
        assert_eq!(page_texts(&single.doc), vec!["Page 5"]);
    }

    #[tokio::test]
    async fn test_invalid_ranges_rerender_form() {
        let pdf = pdf_bytes(10);
        let (status, response) =
            send(form("/split_pdf", Some(("a.pdf", pdf.as_slice())), Some("5-2"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Invalid page range format"));
        assert!(html.contains(r#"action="/split_pdf""#));
    }

    #[tokio::test]
    async fn test_ranges_outside_document() {
        let pdf = pdf_bytes(2);
        let (status, response) =
            send(form("/split_pdf", Some(("a.pdf", pdf.as_slice())), Some("5-9"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body_text(response)
            .await
            .contains("The specified page ranges are not valid for this document."));
    }

    #[tokio::test]
    async fn test_missing_ranges() {
        let pdf = pdf_bytes(2);
        let (status, response) = send(form("/split_pdf", Some(("a.pdf", pdf.as_slice())), Some("  "))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body_text(response)
            .await
            .contains("Page ranges were not provided."));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (status, response) = send(form("/add_page_numbers", None, Some("1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("No file was selected"));
    }

    #[tokio::test]
    async fn test_wrong_file_type() {
        let (status, response) = send(form(
            "/add_page_numbers",
            Some(("notes.txt", &b"hello"[..])),
            None,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Invalid file type"));
    }

    #[tokio::test]
    async fn test_unreadable_pdf() {
        let (status, response) = send(form(
            "/add_page_numbers",
            Some(("broken.pdf", &b"this is not a pdf"[..])),
            None,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body_text(response)
            .await
            .contains("could not be read as a PDF"));
    }

    #[tokio::test]
    async fn test_numbering_pdf_without_pages() {
        let pdf = pdf_bytes(0);
        let (status, response) =
            send(form("/add_page_numbers", Some(("empty.pdf", pdf.as_slice())), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("The uploaded PDF has no pages."));
        assert!(!html.contains("page ranges are not valid"));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let html = render_index(Some("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }
}
