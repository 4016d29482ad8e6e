// tests/common/mod.rs
// Shared fixtures: generated PDFs, multipart bodies and a scripted LLM.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfchat::api::AppState;
use pdfchat::chunker::{ChunkerConfig, TextChunker};
use pdfchat::context::ContextAssembler;
use pdfchat::llm::{LLMError, LLMProvider, PromptMessage};
use pdfchat::storage::UploadStore;
use tempfile::TempDir;

pub const BOUNDARY: &str = "----pdfchatTestBoundary7MA4YWxk";

/// Builds a PDF with one page per entry; each page holds the given lines.
pub fn build_pdf(pages: &[Vec<String>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 9.into()]),
            Operation::new("Td", vec![30.into(), 800.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Two pages of nine 100-character lines each, about 1800 characters.
pub fn sample_pdf() -> Vec<u8> {
    let line = |page: usize, n: usize| {
        let mut s = format!(
            "Page {} line {}: Rustaceans keep the borrow checker happy with clear ownership.",
            page, n
        );
        while s.len() < 100 {
            s.push_str(" ok");
        }
        s.truncate(100);
        s
    };
    let pages: Vec<Vec<String>> = (1..=2)
        .map(|p| (1..=9).map(|n| line(p, n)).collect())
        .collect();
    build_pdf(&pages)
}

/// A structurally valid PDF whose only page has no text.
pub fn blank_pdf() -> Vec<u8> {
    build_pdf(&[vec![]])
}

pub fn multipart_file(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            BOUNDARY, field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    (content_type(), body)
}

pub fn multipart_text(field: &str, value: &str) -> (String, Vec<u8>) {
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n--{}--\r\n",
        BOUNDARY, field, value, BOUNDARY
    );
    (content_type(), body.into_bytes())
}

fn content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub enum Script {
    /// Reply quoting the start of the document context.
    Quote,
    Fail(LLMError),
}

pub struct ScriptedProvider {
    script: Script,
    pub calls: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LLMError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match &self.script {
            Script::Quote => {
                let system = &messages[0].content;
                let context = system
                    .split("Context from document:\n")
                    .nth(1)
                    .unwrap_or_default();
                let quoted: String = context.chars().take(120).collect();
                Ok(format!("According to the document: {}", quoted))
            }
            Script::Fail(err) => Err(err.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub struct Fixture {
    pub tmp: TempDir,
    pub state: AppState,
    pub provider: Arc<ScriptedProvider>,
}

pub fn fixture(script: Script, max_upload_bytes: u64) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(script));
    let state = AppState {
        store: UploadStore::new(tmp.path().join("uploads"), max_upload_bytes),
        chunker: TextChunker::new(ChunkerConfig {
            chunk_size: 1000,
            overlap: 200,
        })
        .unwrap(),
        assembler: ContextAssembler::new(24_000),
        llm: provider.clone(),
    };
    Fixture {
        tmp,
        state,
        provider,
    }
}
