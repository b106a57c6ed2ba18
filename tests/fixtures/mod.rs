#![allow(dead_code)]

use docsign::identity::{SignRequest, StampData};
use docsign::pipeline::{DocumentSignRequest, SigningPipeline};
use docsign::utils::encoding::encode;
use docsign::SignerConfig;
use lopdf::{dictionary, Document, Object, Stream};

pub struct TestFixtures;

impl TestFixtures {
    pub fn pipeline() -> SigningPipeline {
        SigningPipeline::new(SignerConfig::default()).expect("default pipeline")
    }

    pub fn ivanov_request() -> SignRequest {
        SignRequest {
            surname: Some("Ivanov".into()),
            organization_name: Some(String::new()),
            city: Some("Moscow".into()),
            ..Default::default()
        }
    }

    pub fn stamp_data() -> StampData {
        StampData {
            organization_name: Some("OOO Romashka".into()),
            director: Some("Ivanov I.I.".into()),
            inn: Some("7700000000".into()),
            validity_period: Some("2025-2026".into()),
        }
    }

    /// Two pages that inherit MediaBox and Resources from the page tree
    /// root, with existing text on the first page.
    pub fn inherited_attributes_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let content_id = doc.add_object(Stream::new(
            lopdf::Dictionary::new(),
            b"BT /F1 12 Tf 72 720 Td (Existing page text) Tj ET".to_vec(),
        ));
        let first = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let second = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(first), Object::Reference(second)],
                "Count" => 2,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(842), Object::Integer(595)],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        doc.save_to(&mut output).expect("fixture pdf");
        output
    }

    pub fn document_request(document: Vec<u8>, private_key_base64: Option<String>) -> DocumentSignRequest {
        DocumentSignRequest {
            private_key_base64,
            certificate_base64: None,
            document_bytes: document,
            stamp: Self::stamp_data(),
        }
    }

    pub fn garbage_key() -> String {
        encode(b"definitely not a pkcs8 key")
    }
}
