//! Page payload codec.
//!
//! diagrams.net stores each `<diagram>` body either as plain XML text or as a
//! percent-encoded, raw-deflated, base64 blob. Decoding accepts both (plus a
//! zlib-headered deflate stream from older exports); encoding reproduces the
//! representation the page originally used unless the caller forces plain
//! output for the whole run.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::DeflateEncoder;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::document::{self, XmlElement};
use crate::error::{DiaglotError, Result};

/// Representation a page payload was (or will be) stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEncoding {
    Compressed,
    Plain,
}

/// Characters left intact by JavaScript's `encodeURIComponent`, which is what
/// diagrams.net applies to page XML before deflating it.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A payload that starts with `<` is plain page XML; anything else is treated
/// as an encoded blob.
pub fn detect_encoding(payload: &str) -> PageEncoding {
    if payload.trim_start().starts_with('<') {
        PageEncoding::Plain
    } else {
        PageEncoding::Compressed
    }
}

/// Decode a page payload into its element tree.
pub fn decode(payload: &str, encoding: PageEncoding) -> Result<XmlElement> {
    let xml = match encoding {
        PageEncoding::Plain => payload.trim().to_string(),
        PageEncoding::Compressed => inflate_payload(payload)?,
    };
    document::parse(&xml)
        .map_err(|e| DiaglotError::MalformedPayload(format!("invalid page XML: {e}")))
}

/// Encode a page tree back into a payload. Never fails for well-formed trees.
pub fn encode(tree: &XmlElement, encoding: PageEncoding) -> String {
    let xml = tree.to_xml();
    match encoding {
        PageEncoding::Plain => xml,
        PageEncoding::Compressed => {
            let escaped = utf8_percent_encode(&xml, URI_COMPONENT).to_string();
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
            encoder
                .write_all(escaped.as_bytes())
                .expect("deflate to memory should not fail");
            let compressed = encoder
                .finish()
                .expect("deflate to memory should not fail");
            STANDARD.encode(compressed)
        }
    }
}

fn inflate_payload(payload: &str) -> Result<String> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let compressed = STANDARD
        .decode(compact)
        .map_err(|e| DiaglotError::MalformedPayload(format!("base64 decode failed: {e}")))?;

    // Raw deflate first (current exports), zlib-headered as a fallback.
    let mut inflated = Vec::new();
    if DeflateDecoder::new(&compressed[..])
        .read_to_end(&mut inflated)
        .is_err()
    {
        inflated.clear();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut inflated)
            .map_err(|e| DiaglotError::MalformedPayload(format!("deflate failed: {e}")))?;
    }

    let text = std::str::from_utf8(&inflated)
        .map_err(|e| DiaglotError::MalformedPayload(format!("payload is not UTF-8: {e}")))?;
    let decoded = percent_decode_str(text)
        .decode_utf8()
        .map_err(|e| DiaglotError::MalformedPayload(format!("percent decoding failed: {e}")))?;
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_XML: &str = r#"<mxGraphModel><root><mxCell id="0" /><mxCell id="1" value="Grüße &amp; mehr" /></root></mxGraphModel>"#;

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding("  <mxGraphModel>"), PageEncoding::Plain);
        assert_eq!(detect_encoding("eJxLTc7IBwAE"), PageEncoding::Compressed);
    }

    #[test]
    fn test_round_trip_plain() {
        let tree = decode(PAGE_XML, PageEncoding::Plain).unwrap();
        let payload = encode(&tree, PageEncoding::Plain);
        let reparsed = decode(&payload, PageEncoding::Plain).unwrap();
        assert_eq!(tree, reparsed);
    }

    #[test]
    fn test_round_trip_compressed() {
        let tree = document::parse(PAGE_XML).unwrap();
        let payload = encode(&tree, PageEncoding::Compressed);
        assert_eq!(detect_encoding(&payload), PageEncoding::Compressed);
        let reparsed = decode(&payload, PageEncoding::Compressed).unwrap();
        assert_eq!(tree, reparsed);
    }

    #[test]
    fn test_forced_plain_output_of_compressed_page() {
        let tree = document::parse(PAGE_XML).unwrap();
        let payload = encode(&tree, PageEncoding::Plain);
        assert!(payload.starts_with('<'));
        assert_eq!(document::parse(&payload).unwrap(), tree);
    }

    #[test]
    fn test_corrupt_payloads_are_malformed() {
        // Not base64.
        assert!(matches!(
            decode("!!!not-base64!!!", PageEncoding::Compressed),
            Err(DiaglotError::MalformedPayload(_))
        ));
        // Valid base64, not a deflate stream.
        let bogus = STANDARD.encode(b"definitely not deflate");
        assert!(matches!(
            decode(&bogus, PageEncoding::Compressed),
            Err(DiaglotError::MalformedPayload(_))
        ));
        // Plain payload that is not XML.
        assert!(matches!(
            decode("<broken", PageEncoding::Plain),
            Err(DiaglotError::MalformedPayload(_))
        ));
    }
}
