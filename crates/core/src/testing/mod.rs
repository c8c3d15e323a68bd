//! Testing utilities and mock implementations.
//!
//! This module provides a mock ticketing client and fixtures for building
//! evidence archives on disk, so the whole pipeline can be exercised
//! without a remote system.
//!
//! # Example
//!
//! ```rust,ignore
//! use parkwarden_core::testing::{fixtures, MockTicketingClient};
//!
//! let client = MockTicketingClient::new();
//! let manifest = fixtures::manifest_xml(&[fixtures::OffenceSpec::complete("AB12CDE", "a")]);
//! let archive = fixtures::write_archive(inbox, "batch.zip", &manifest, &["a_in_o.jpg"]);
//! ```

mod mock_ticketing_client;

pub use mock_ticketing_client::MockTicketingClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use crate::config::SiteConfig;
    use crate::ticketing::TicketFields;

    /// Entrance timestamp used by [`OffenceSpec::complete`].
    pub const ENTRANCE_TIME: &str = "17/12/2025 00:55:06";
    /// Exit timestamp used by [`OffenceSpec::complete`].
    pub const EXIT_TIME: &str = "17/12/2025 01:10:00";

    /// Site configuration with recognisable values.
    pub fn site_config() -> SiteConfig {
        SiteConfig {
            site_code: "SITE01".to_string(),
            enforcement_type: "2".to_string(),
            ticket_type: "pcn".to_string(),
            badge_id: "B42".to_string(),
            primary_contravention: "87".to_string(),
        }
    }

    /// Ticket fields for a vehicle with fixed timestamps.
    pub fn ticket_fields(vrm: &str) -> TicketFields {
        TicketFields {
            enforcement_type: "2".to_string(),
            ticket_type: "pcn".to_string(),
            site_code: "SITE01".to_string(),
            contravention_datetime: "2025-12-17 01:10:00".to_string(),
            issued_datetime: "2025-12-18 09:00:00".to_string(),
            observed_from_datetime: "2025-12-17 00:55:06".to_string(),
            observed_to_datetime: "2025-12-17 01:10:00".to_string(),
            vrm: vrm.to_string(),
            primary_contravention: "87".to_string(),
            badge_id: "B42".to_string(),
        }
    }

    /// An entrance or exit element.
    #[derive(Debug, Clone)]
    pub struct EventSpec {
        pub timestamp: String,
        pub overview: Option<String>,
        pub patch: Option<String>,
    }

    /// An offence element. An empty `vrm` omits the attribute.
    #[derive(Debug, Clone)]
    pub struct OffenceSpec {
        pub vrm: String,
        pub entrance: Option<EventSpec>,
        pub exit: Option<EventSpec>,
    }

    impl OffenceSpec {
        /// Both events with both images, named `<prefix>_in_o.jpg`,
        /// `<prefix>_in_p.jpg`, `<prefix>_out_o.jpg` and `<prefix>_out_p.jpg`.
        pub fn complete(vrm: &str, prefix: &str) -> Self {
            Self {
                vrm: vrm.to_string(),
                entrance: Some(EventSpec {
                    timestamp: ENTRANCE_TIME.to_string(),
                    overview: Some(format!("{}_in_o.jpg", prefix)),
                    patch: Some(format!("{}_in_p.jpg", prefix)),
                }),
                exit: Some(EventSpec {
                    timestamp: EXIT_TIME.to_string(),
                    overview: Some(format!("{}_out_o.jpg", prefix)),
                    patch: Some(format!("{}_out_p.jpg", prefix)),
                }),
            }
        }
    }

    /// Render a manifest document.
    pub fn manifest_xml(offences: &[OffenceSpec]) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<offences>\n");
        for offence in offences {
            if offence.vrm.is_empty() {
                xml.push_str("  <offence>\n");
            } else {
                xml.push_str(&format!("  <offence vrm=\"{}\">\n", offence.vrm));
            }
            if let Some(event) = &offence.entrance {
                xml.push_str(&event_xml("entrance", event));
            }
            if let Some(event) = &offence.exit {
                xml.push_str(&event_xml("exit", event));
            }
            xml.push_str("  </offence>\n");
        }
        xml.push_str("</offences>\n");
        xml
    }

    fn event_xml(tag: &str, event: &EventSpec) -> String {
        let mut element = format!("    <{} timestamp=\"{}\"", tag, event.timestamp);
        if let Some(overview) = &event.overview {
            element.push_str(&format!(" overview=\"{}\"", overview));
        }
        if let Some(patch) = &event.patch {
            element.push_str(&format!(" patch=\"{}\"", patch));
        }
        element.push_str("/>\n");
        element
    }

    /// Write a zip file with the given entries.
    pub fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        std::fs::create_dir_all(dir).expect("Failed to create archive dir");
        let path = dir.join(name);
        let file = File::create(&path).expect("Failed to create archive");
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for (entry_name, content) in entries {
            zip.start_file(*entry_name, options)
                .expect("Failed to start zip entry");
            zip.write_all(content).expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish archive");
        path
    }

    /// Write an evidence archive: `manifest.xml` plus fake JPEG bytes per image.
    pub fn write_archive(dir: &Path, name: &str, manifest: &str, images: &[&str]) -> PathBuf {
        let image_bytes: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";
        let mut entries: Vec<(&str, &[u8])> = vec![("manifest.xml", manifest.as_bytes())];
        entries.extend(images.iter().map(|image| (*image, image_bytes)));
        write_zip(dir, name, &entries)
    }
}
