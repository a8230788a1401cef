//! Scripted model connector shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_docchat::{ChatConfig, ChatEngine, ChatError, GenerationOptions, ModelConnector, TextModel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How a scripted model behaves.
#[derive(Clone, Debug)]
pub enum Script {
    /// Answer every prompt with this text.
    Reply(String),
    /// Echo the prompt back, prefixed.
    Echo,
    /// Refuse construction.
    Unconstructible(String),
    /// Fail every call, probe included.
    Down(String),
    /// Answer the probe, fail the real prompt.
    FailsRealCall(String),
}

/// One recorded call: `(model, prompt)`.
pub type Call = (String, String);

#[derive(Clone, Default)]
pub struct FakeConnector {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, model: &str, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(model.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Prompts that were not the `test` probe.
    pub fn real_prompts(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|(_, prompt)| prompt != PROBE)
            .collect()
    }
}

pub const PROBE: &str = "test";

struct FakeModel {
    id: String,
    script: Script,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl TextModel for FakeModel {
    fn model_id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String, ChatError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.id.clone(), prompt.to_string()));
        let fail = |message: &str| ChatError::ModelCall {
            model: self.id.clone(),
            message: message.to_string(),
        };
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Echo => Ok(format!("ECHO[{prompt}]")),
            Script::Down(message) => Err(fail(message)),
            Script::FailsRealCall(_) if prompt == PROBE => Ok("ok".to_string()),
            Script::FailsRealCall(message) => Err(fail(message)),
            Script::Unconstructible(_) => unreachable!("never constructed"),
        }
    }
}

impl ModelConnector for FakeConnector {
    fn connect(&self, model_id: &str) -> Result<Arc<dyn TextModel>, ChatError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(model_id)
            .cloned()
            .unwrap_or_else(|| Script::Unconstructible(format!("404 models/{model_id} is not found")));
        if let Script::Unconstructible(hint) = script {
            return Err(ChatError::ProviderNotConfigured {
                provider: "fake".to_string(),
                hint,
            });
        }
        Ok(Arc::new(FakeModel {
            id: model_id.to_string(),
            script,
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Config with the default candidate list and a dummy key.
pub fn config() -> ChatConfig {
    ChatConfig::builder().api_key("test-key").build().unwrap()
}

/// Engine whose first default candidate answers with `reply`.
pub fn engine_replying(reply: &str) -> (ChatEngine, FakeConnector) {
    let connector = FakeConnector::new().with("gemini-1.5-flash", Script::Reply(reply.to_string()));
    (
        ChatEngine::new(config(), Arc::new(connector.clone())),
        connector,
    )
}

/// CSV text with `rows` data rows and `cols` columns.
pub fn csv(rows: usize, cols: usize) -> String {
    let mut out = (0..cols)
        .map(|c| format!("c{c}"))
        .collect::<Vec<_>>()
        .join(",");
    for r in 0..rows {
        out.push('\n');
        out.push_str(
            &(0..cols)
                .map(|c| format!("{}", r * 10 + c))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    out.push('\n');
    out
}

// ── XLSX fixtures ────────────────────────────────────────────────────────────

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Single-sheet workbook. Cells that parse as numbers are stored as numbers,
/// empty cells are left out, anything else is an inline string.
pub fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let at = format!("{}{}", char::from(b'A' + c as u8), r + 1);
            if cell.parse::<f64>().is_ok() {
                sheet.push_str(&format!(r#"<c r="{at}"><v>{cell}</v></c>"#));
            } else {
                sheet.push_str(&format!(
                    r#"<c r="{at}" t="inlineStr"><is><t>{cell}</t></is></c>"#
                ));
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in parts {
        writer.start_file(name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Inventory sheet: three columns, two rows, one empty cell.
pub fn inventory_xlsx() -> Vec<u8> {
    xlsx(&[
        &["name", "qty", "price"],
        &["widget", "4", "2.5"],
        &["gadget", "", "10"],
    ])
}
