//! Self-contained HTML rendering of the page.
//!
//! Images are embedded as data URIs, so the file opens in any browser with
//! no server and no preview URLs.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt::Write as _;
use std::path::Path;

use crate::controller::AppController;
use crate::results::{ResultsView, EMPTY_RESULTS_MESSAGE};
use crate::view::{PageView, APP_TAGLINE, APP_TITLE, UPLOAD_HEADLINE, UPLOAD_SUBTITLE};

const STYLE: &str = "body{font-family:sans-serif;background:#f3f4f6;margin:0}\
nav{background:#2563eb;color:#fff;padding:1rem;display:flex;justify-content:space-between}\
main{max-width:56rem;margin:2rem auto;padding:0 1rem}\
.error{background:#fef2f2;border:1px solid #fecaca;color:#991b1b;padding:1rem;border-radius:.5rem}\
.images{display:grid;grid-template-columns:1fr 1fr;gap:1.5rem}\
.images img{width:100%;max-height:24rem;object-fit:contain}\
table{width:100%;background:#fff;border-collapse:collapse}\
th,td{padding:.75rem 1.5rem;text-align:left;border-bottom:1px solid #e5e7eb}\
.bar{background:#e5e7eb;height:.5rem;border-radius:9999px}\
.bar div{background:#2563eb;height:.5rem;border-radius:9999px}\
.empty{background:#f9fafb;padding:2rem;text-align:center;color:#6b7280}";

/// Render the current state as an HTML document.
pub fn render_html(controller: &AppController) -> String {
    let page = PageView::from_controller(controller);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(APP_TITLE));
    let _ = writeln!(html, "<style>{}</style>\n</head>\n<body>", STYLE);
    let _ = writeln!(
        html,
        "<nav><h1>{}</h1><p>{}</p></nav>\n<main>",
        escape_html(APP_TITLE),
        escape_html(APP_TAGLINE)
    );

    if page.shows_upload_prompt() {
        let _ = writeln!(
            html,
            "<h2>{}</h2>\n<p>{}</p>",
            escape_html(UPLOAD_HEADLINE),
            escape_html(UPLOAD_SUBTITLE)
        );
    } else {
        if let Some(name) = &page.file_name {
            let _ = writeln!(html, "<p>Selected: {}</p>", escape_html(name));
        }
        if let Some(error) = &page.error {
            let _ = writeln!(
                html,
                "<div class=\"error\"><strong>Error:</strong> {}</div>",
                escape_html(error)
            );
        }
        push_images(&mut html, controller, &page);
        if let Some(results) = &page.results {
            push_results(&mut html, results);
        }
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// Render and write to `path`.
pub fn write_html(controller: &AppController, path: &Path) -> Result<()> {
    std::fs::write(path, render_html(controller))
        .with_context(|| format!("write html report to {}", path.display()))
}

fn push_images(html: &mut String, controller: &AppController, page: &PageView) {
    let Some(preview) = &page.preview else {
        return;
    };
    html.push_str("<div class=\"images\">\n");
    if let Some((mime, bytes)) = controller.previews().resolve(&preview.original_url) {
        let _ = writeln!(
            html,
            "<div><h3>Original Image</h3><img alt=\"Original\" src=\"data:{};base64,{}\"></div>",
            escape_html(&mime),
            STANDARD.encode(&bytes)
        );
    }
    if let Some(uri) = &preview.annotated_data_uri {
        let _ = writeln!(
            html,
            "<div><h3>Detection Results</h3><img alt=\"Annotated\" src=\"{}\"></div>",
            escape_html(uri)
        );
    }
    html.push_str("</div>\n");
}

fn push_results(html: &mut String, results: &ResultsView) {
    if let ResultsView::Empty = results {
        let _ = writeln!(
            html,
            "<div class=\"empty\"><p>{}</p></div>",
            escape_html(EMPTY_RESULTS_MESSAGE)
        );
        return;
    }
    let _ = writeln!(html, "<h3>{}</h3>", escape_html(&results.heading()));
    html.push_str(
        "<table>\n<thead><tr><th>Object</th><th>Confidence</th><th>Bounding Box</th></tr></thead>\n<tbody>\n",
    );
    for row in results.rows() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}<div class=\"bar\"><div style=\"width:{:.1}%\"></div></div></td><td>{}</td></tr>",
            escape_html(&row.class_name),
            escape_html(&row.confidence_label),
            row.bar_fill * 100.0,
            escape_html(&row.bbox_label)
        );
    }
    html.push_str("</tbody>\n</table>\n");
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, DetectionResponse};
    use crate::upload::SelectedFile;

    fn png_file() -> SelectedFile {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 7, 7];
        SelectedFile::from_bytes("yard.png", None, png).unwrap()
    }

    #[test]
    fn idle_page_shows_upload_prompt() {
        let controller = AppController::default();
        let html = render_html(&controller);
        assert!(html.contains(UPLOAD_HEADLINE));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn result_page_embeds_images_and_rows() {
        let mut controller = AppController::default();
        controller.select_file(png_file()).unwrap();
        let request = controller.begin_detection().unwrap();
        controller.complete_detection(
            request.ticket,
            Ok(DetectionResponse {
                detections: vec![Detection {
                    class_name: "<cat>".to_string(),
                    confidence: 0.873,
                    bbox: [10.0, 20.0, 110.0, 220.0],
                }],
                annotated_image: Some("QUJD".to_string()),
            }),
        );

        let html = render_html(&controller);
        assert!(html.contains("src=\"data:image/png;base64,"));
        assert!(html.contains("src=\"data:image/jpeg;base64,QUJD\""));
        assert!(html.contains("&lt;cat&gt;"));
        assert!(html.contains("87.3%"));
        assert!(html.contains("[10, 20, 110, 220]"));
        assert!(html.contains("Detected Objects (1)"));
    }

    #[test]
    fn error_is_escaped() {
        let mut controller = AppController::default();
        controller.select_file(png_file()).unwrap();
        let request = controller.begin_detection().unwrap();
        controller.complete_detection(request.ticket, Err(anyhow::anyhow!("bad <gateway>")));
        let html = render_html(&controller);
        assert!(html.contains("<strong>Error:</strong> bad &lt;gateway&gt;"));
    }
}
