//! `multipart/form-data` encoding for a single file field.

use rand::RngCore;

const CRLF: &str = "\r\n";

/// An encoded form body and the `Content-Type` header that describes it.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    /// Encode one file part under `field`.
    pub fn single_file(field: &str, file_name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        let mut token = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut token);
        let boundary = format!("----visionguard{}", hex::encode(token));
        Self::with_boundary(boundary, field, file_name, mime_type, bytes)
    }

    fn with_boundary(
        boundary: String,
        field: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Self {
        let head = format!(
            "--{boundary}{CRLF}Content-Disposition: form-data; name=\"{field}\"; filename=\"{file}\"{CRLF}Content-Type: {mime}{CRLF}{CRLF}",
            boundary = boundary,
            field = escape_quoted(field),
            file = escape_quoted(file_name),
            mime = mime_type,
        );
        let tail = format!("{CRLF}--{boundary}--{CRLF}");

        let mut body = Vec::with_capacity(head.len() + bytes.len() + tail.len());
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(tail.as_bytes());
        Self { boundary, body }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Percent-encode the characters that would break a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_single_file_part() {
        let body = MultipartBody::with_boundary(
            "XYZ".to_string(),
            "file",
            "cat.png",
            "image/png",
            b"PIXELS",
        );
        let expected = "--XYZ\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\nContent-Type: image/png\r\n\r\nPIXELS\r\n--XYZ--\r\n";
        assert_eq!(body.as_bytes(), expected.as_bytes());
        assert_eq!(body.content_type(), "multipart/form-data; boundary=XYZ");
    }

    #[test]
    fn filename_quotes_and_newlines_are_escaped() {
        let body = MultipartBody::with_boundary(
            "B".to_string(),
            "file",
            "a\"b\r\nc.jpg",
            "image/jpeg",
            b"",
        );
        let text = String::from_utf8(body.as_bytes().to_vec()).unwrap();
        assert!(text.contains("filename=\"a%22b%0D%0Ac.jpg\""));
    }

    #[test]
    fn random_boundaries_differ() {
        let a = MultipartBody::single_file("file", "x.png", "image/png", b"1");
        let b = MultipartBody::single_file("file", "x.png", "image/png", b"1");
        assert_ne!(a.boundary(), b.boundary());
        assert!(!a.is_empty());
    }
}
