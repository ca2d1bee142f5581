use std::io::Write;
use tempfile::{Builder, NamedTempFile};
use tenfi::error::TenfiError;
use tenfi::loader::{DocumentLoader, FileLoader, PdfLoader};
use tenfi::models::{DocumentSource, LeaseMetadata};

fn temp_file_with(suffix: &str, contents: &[u8]) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_plain_text_lease_loads_with_metadata() {
    let file = temp_file_with(".txt", b"RESIDENTIAL LEASE\n\nRent is $1800/month.\n");
    let loader = FileLoader::new();

    let document = loader
        .load_document(
            DocumentSource::File(file.path().to_path_buf()),
            LeaseMetadata::default().with_location("Portland, OR"),
        )
        .unwrap();

    assert!(document.text.contains("Rent is $1800/month."));
    assert_eq!(document.location().as_deref(), Some("Portland, OR"));
    assert!(!document.is_empty());
}

#[test]
fn test_missing_file_is_an_extraction_error() {
    let loader = FileLoader::new();
    let err = loader
        .load(&DocumentSource::File("/definitely/not/here/lease.pdf".into()))
        .unwrap_err();

    assert!(err.is_extraction_error());
    assert!(matches!(err, TenfiError::Extraction(_)));
}

#[test]
fn test_empty_text_file_has_no_extractable_text() {
    let file = temp_file_with(".txt", b"\n\n   \n");
    let err = FileLoader::new()
        .load(&DocumentSource::File(file.path().to_path_buf()))
        .unwrap_err();

    assert!(matches!(err, TenfiError::NoExtractableText));
}

#[test]
fn test_pdf_extension_without_pdf_header_is_rejected() {
    let file = temp_file_with(".pdf", b"this is plain text pretending to be a pdf");
    let err = FileLoader::new()
        .load(&DocumentSource::File(file.path().to_path_buf()))
        .unwrap_err();

    assert!(matches!(err, TenfiError::Extraction(_)));
}

#[test]
fn test_truncated_pdf_is_an_extraction_error() {
    let file = temp_file_with(".pdf", b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog");
    let err = FileLoader::new()
        .load(&DocumentSource::File(file.path().to_path_buf()))
        .unwrap_err();

    assert!(err.is_extraction_error());
}

#[test]
fn test_non_utf8_bytes_are_unsupported() {
    let file = temp_file_with(".docx", &[0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe, 0x00, 0x81]);
    let err = FileLoader::new()
        .load(&DocumentSource::File(file.path().to_path_buf()))
        .unwrap_err();

    assert!(matches!(err, TenfiError::UnsupportedDocument(_)));
}

#[test]
fn test_pdf_header_detection() {
    assert!(PdfLoader::looks_like_pdf(b"%PDF-1.7 rest"));
    assert!(!PdfLoader::looks_like_pdf(b"%PD"));
    assert!(!PdfLoader::looks_like_pdf(b"Lease agreement"));
}

#[test]
fn test_text_pages_are_normalized() {
    let file = temp_file_with(".txt", "Page one   \n\x0c\n\nPage two\n".as_bytes());
    let text = FileLoader::new()
        .load(&DocumentSource::File(file.path().to_path_buf()))
        .unwrap();

    assert!(text.starts_with("Page one"));
    assert!(text.contains("Page two"));
    assert!(!text.contains('\x0c'));
}
