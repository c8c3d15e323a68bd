//! XML manifest parser.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use tracing::debug;
use walkdir::WalkDir;

use super::types::{EventRecord, Manifest, ManifestError, OffenceRecord};

/// Locate the manifest under `root`.
///
/// Any `.xml` file (extension compared case-insensitively) qualifies; the
/// shallowest one wins, ties broken by path.
pub fn find_manifest(root: &Path) -> Result<PathBuf, ManifestError> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .map(|entry| (entry.depth(), entry.into_path()))
        .min()
        .map(|(_, path)| path)
        .ok_or_else(|| ManifestError::Missing {
            root: root.to_path_buf(),
        })
}

/// Find and parse the manifest under `root`.
pub fn load_manifest(root: &Path) -> Result<Manifest, ManifestError> {
    let path = find_manifest(root)?;
    debug!(manifest = %path.display(), "Parsing manifest");

    let bytes = std::fs::read(&path).map_err(|e| ManifestError::Read {
        path: path.clone(),
        source: e,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        debug!(manifest = %path.display(), "Manifest is not valid UTF-8; invalid bytes replaced");
    }

    let offences = parse_offences(&text).map_err(|message| ManifestError::Malformed {
        path: path.clone(),
        message,
    })?;

    if offences.is_empty() {
        return Err(ManifestError::NoOffences { path });
    }

    Ok(Manifest { path, offences })
}

/// Parse every `offence` element below the document root, in document order.
pub fn parse_offences(xml: &str) -> Result<Vec<OffenceRecord>, String> {
    let xml = xml.trim_start_matches('\u{feff}');
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options).map_err(|e| e.to_string())?;

    let offences = doc
        .root_element()
        .descendants()
        .skip(1)
        .filter(|node| node.is_element() && node.has_tag_name("offence"))
        .enumerate()
        .map(|(i, node)| OffenceRecord {
            index: i + 1,
            vrm: attr(node, "vrm"),
            entrance: child_event(node, "entrance"),
            exit: child_event(node, "exit"),
        })
        .collect();

    Ok(offences)
}

fn child_event(offence: Node<'_, '_>, tag: &str) -> Option<EventRecord> {
    offence
        .children()
        .find(|child| child.is_element() && child.has_tag_name(tag))
        .map(|node| EventRecord {
            timestamp: attr(node, "timestamp"),
            overview: attr(node, "overview"),
            patch: attr(node, "patch"),
        })
}

/// Trimmed attribute value; blank counts as absent.
fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticketing::AttachmentCategory;
    use tempfile::TempDir;

    const TWO_OFFENCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<offences site="SITE01">
  <offence vrm=" AB12CDE ">
    <entrance timestamp="17/12/2025 00:55:06" overview="in_o.jpg" patch="in_p.jpg"/>
    <exit timestamp="17/12/2025 01:10:00" overview="out_o.jpg" patch=""/>
  </offence>
  <offence>
    <entrance timestamp="17/12/2025 02:00:00"/>
  </offence>
</offences>"#;

    #[test]
    fn test_parse_offences_in_document_order() {
        let offences = parse_offences(TWO_OFFENCES).unwrap();
        assert_eq!(offences.len(), 2);

        let first = &offences[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.vrm.as_deref(), Some("AB12CDE"));
        let entrance = first.entrance.as_ref().unwrap();
        assert_eq!(entrance.timestamp.as_deref(), Some("17/12/2025 00:55:06"));
        assert_eq!(entrance.image(AttachmentCategory::Patch), Some("in_p.jpg"));
        let exit = first.exit.as_ref().unwrap();
        assert_eq!(exit.overview.as_deref(), Some("out_o.jpg"));
        assert_eq!(exit.patch, None);
    }

    #[test]
    fn test_parse_keeps_incomplete_offences() {
        let offences = parse_offences(TWO_OFFENCES).unwrap();
        let second = &offences[1];
        assert_eq!(second.index, 2);
        assert!(second.vrm.is_none());
        assert!(second.entrance.is_some());
        assert!(second.exit.is_none());
    }

    #[test]
    fn test_parse_nested_offences() {
        let xml = r#"<batch><site><offence vrm="X1"/></site><offence vrm="X2"/></batch>"#;
        let offences = parse_offences(xml).unwrap();
        let vrms: Vec<_> = offences.iter().filter_map(|o| o.vrm.as_deref()).collect();
        assert_eq!(vrms, vec!["X1", "X2"]);
    }

    #[test]
    fn test_parse_malformed_xml() {
        assert!(parse_offences("<offences><offence></offences>").is_err());
    }

    #[test]
    fn test_find_manifest_case_insensitive() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("image.jpg"), b"img").unwrap();
        std::fs::write(temp.path().join("MANIFEST.XML"), TWO_OFFENCES).unwrap();

        let path = find_manifest(temp.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "MANIFEST.XML");
    }

    #[test]
    fn test_find_manifest_prefers_shallowest() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/aaa.xml"), "<x/>").unwrap();
        std::fs::write(temp.path().join("zzz.xml"), "<x/>").unwrap();

        let path = find_manifest(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("zzz.xml"));
    }

    #[test]
    fn test_load_manifest_missing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("image.jpg"), b"img").unwrap();

        let err = load_manifest(temp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Missing { .. }));
    }

    #[test]
    fn test_load_manifest_without_offences() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("batch.xml"), "<offences/>").unwrap();

        let err = load_manifest(temp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NoOffences { .. }));
    }

    #[test]
    fn test_load_manifest_with_bom() {
        let temp = TempDir::new().unwrap();
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(TWO_OFFENCES.as_bytes());
        std::fs::write(temp.path().join("batch.xml"), bytes).unwrap();

        let manifest = load_manifest(temp.path()).unwrap();
        assert_eq!(manifest.offences.len(), 2);
    }

    #[test]
    fn test_load_manifest_replaces_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<offences>\n  <offence vrm=\"CAF".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"1\"/>\n</offences>");
        std::fs::write(temp.path().join("batch.xml"), bytes).unwrap();

        let manifest = load_manifest(temp.path()).unwrap();
        assert_eq!(manifest.offences.len(), 1);
        assert_eq!(manifest.offences[0].vrm.as_deref(), Some("CAF\u{FFFD}1"));
    }
}
