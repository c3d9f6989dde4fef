//! Request boundary for the check-in service.
//!
//! Every failure is resolved here: input problems become 4xx, source
//! problems become 500 with the underlying message. Nothing below this layer
//! knows about HTTP.

use serde_json::{json, Value};

use stuffcheck_config::{open_source, Settings};
use stuffcheck_io::xlsx::read_first_sheet_from_bytes;
use stuffcheck_recon::{check_in, extract_with_layout, ItemRecord, ReferenceSource, SourceError};

pub const CHECK_IN_PATH: &str = "/api/check-in";
pub const EXTRACT_PATH: &str = "/api/extract";

pub const INVOICE_REQUIRED: &str = "Invoice title is required";

/// A parsed HTTP request. Only what the routes need.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, path: &str, body: impl Into<Vec<u8>>) -> Self {
        Self { method: method.to_string(), path: path.to_string(), body: body.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "application/json".to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    pub fn error(status: u16, message: impl AsRef<str>) -> Self {
        Self::json(status, &json!({ "error": message.as_ref() }))
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Body parsed back as JSON. Test helper for callers holding a response.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Check-in payload after lenient decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInPayload {
    pub invoice: String,
    pub items: Vec<ItemRecord>,
}

/// Decode a check-in body.
///
/// The invoice is read from `invoice` (or `invoiceTitle`) as a string or a
/// number and trimmed. A non-array `items` becomes empty; an item that does
/// not decode becomes a default record, which can only ever be `missing`.
pub fn decode_check_in(body: &[u8]) -> Result<CheckInPayload, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON body: {e}"))?;

    let invoice = ["invoice", "invoiceTitle"]
        .iter()
        .find_map(|key| match value.get(key) {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default();

    let items = match value.get("items") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| serde_json::from_value::<ItemRecord>(item.clone()).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };

    Ok(CheckInPayload { invoice, items })
}

type SourceOpener =
    Box<dyn Fn(&Settings) -> Result<Box<dyn ReferenceSource>, SourceError> + Send + Sync>;

/// Routes requests. Shared across connection threads; holds no per-request
/// state.
pub struct Handler {
    settings: Settings,
    opener: SourceOpener,
}

impl Handler {
    pub fn new(settings: Settings) -> Self {
        Self::with_opener(settings, |s: &Settings| open_source(&s.source))
    }

    /// Use a custom source factory instead of the configured file/URL.
    pub fn with_opener<F>(settings: Settings, opener: F) -> Self
    where
        F: Fn(&Settings) -> Result<Box<dyn ReferenceSource>, SourceError> + Send + Sync + 'static,
    {
        Self { settings, opener: Box::new(opener) }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn handle(&self, req: &Request) -> Response {
        let route: fn(&Self, &Request) -> Response = match req.path.as_str() {
            CHECK_IN_PATH => Self::check_in,
            EXTRACT_PATH => Self::extract,
            _ => return Response::error(404, format!("no route for {}", req.path)),
        };
        if req.method != "POST" {
            return Response::error(405, reason_phrase(405)).with_header("Allow", "POST");
        }
        route(self, req)
    }

    fn check_in(&self, req: &Request) -> Response {
        let payload = match decode_check_in(&req.body) {
            Ok(p) => p,
            Err(msg) => return Response::error(400, msg),
        };
        if payload.invoice.is_empty() {
            return Response::error(400, INVOICE_REQUIRED);
        }

        let result = (self.opener)(&self.settings).and_then(|mut source| {
            check_in(&self.settings.recon, source.as_mut(), &payload.invoice, &payload.items)
        });

        match result {
            Ok(report) => match serde_json::to_value(&report) {
                Ok(value) => Response::json(200, &value),
                Err(e) => Response::error(500, e.to_string()),
            },
            Err(e) => {
                log::error!("check-in for {:?} failed: {}", payload.invoice, e);
                Response::error(500, e.to_string())
            }
        }
    }

    fn extract(&self, req: &Request) -> Response {
        let grid = match read_first_sheet_from_bytes(req.body.clone()) {
            Ok(grid) => grid,
            Err(e) => {
                log::debug!("extract: unreadable upload ({} bytes): {}", req.body.len(), e);
                return Response::error(400, "request body is not a spreadsheet file");
            }
        };
        let doc = extract_with_layout(&grid, &self.settings.recon.layout);
        match serde_json::to_value(&doc) {
            Ok(value) => Response::json(200, &value),
            Err(e) => Response::error(500, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stuffcheck_recon::InMemorySource;

    const SHEET_IN: &str = "\
ULI PO,Customer PO,Material No,Brand,Code Color,Description,INV-01
U1,C1,M-100,Nike,R01,Runner,5
U2,C2,M-200,Nike,B02,Court,6
";

    fn memory_handler() -> Handler {
        Handler::with_opener(Settings::default(), |_: &Settings| {
            let src = InMemorySource::from_csv(SHEET_IN)?;
            Ok(Box::new(src) as Box<dyn ReferenceSource>)
        })
    }

    fn post(path: &str, body: &str) -> Request {
        Request::new("POST", path, body.as_bytes().to_vec())
    }

    #[test]
    fn test_decode_lenient_payload() {
        let p = decode_check_in(br#"{"invoice": "  INV-01 ", "items": {"not": "array"}}"#).unwrap();
        assert_eq!(p.invoice, "INV-01");
        assert!(p.items.is_empty());

        let body = br#"{"invoiceTitle": 4411, "items": [{"materialNo": "M-1"}, 7]}"#;
        let p = decode_check_in(body).unwrap();
        assert_eq!(p.invoice, "4411");
        assert_eq!(p.items.len(), 2);
        assert_eq!(p.items[0].material_no, "M-1");
        assert_eq!(p.items[1], ItemRecord::default());
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(decode_check_in(b"{invoice").is_err());
    }

    #[test]
    fn test_check_in_report() {
        let body = r#"{"invoice":"inv-01","items":[
            {"materialNo":"M-100","qty":5,"rowIndex":15},
            {"materialNo":"M-200","qty":7,"rowIndex":16},
            {"materialNo":"M-999","qty":1,"rowIndex":17}]}"#;
        let resp = memory_handler().handle(&post(CHECK_IN_PATH, body));
        assert_eq!(resp.status, 200);
        let v = resp.body_json().unwrap();
        assert_eq!(v["invoiceFound"], true);
        assert_eq!(v["summary"], "1 ok, 1 mismatch, 1 missing");
        assert_eq!(v["items"][1]["status"], "mismatch");
        assert_eq!(v["items"][2]["rowIndex"], 17);
    }

    #[test]
    fn test_unknown_invoice_is_not_an_error() {
        let resp =
            memory_handler().handle(&post(CHECK_IN_PATH, r#"{"invoice":"INV-100","items":[]}"#));
        assert_eq!(resp.status, 200);
        let v = resp.body_json().unwrap();
        assert_eq!(v["invoiceFound"], false);
        assert_eq!(v["items"], json!([]));
    }

    #[test]
    fn test_blank_invoice_is_400() {
        let resp = memory_handler().handle(&post(CHECK_IN_PATH, r#"{"invoice":"   ","items":[]}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body_json().unwrap()["error"], INVOICE_REQUIRED);
    }

    #[test]
    fn test_method_and_route() {
        let h = memory_handler();
        let resp = h.handle(&Request::new("GET", CHECK_IN_PATH, Vec::new()));
        assert_eq!(resp.status, 405);
        assert_eq!(resp.body_json().unwrap()["error"], "Method Not Allowed");
        assert!(resp.headers.iter().any(|(k, v)| *k == "Allow" && v == "POST"));

        assert_eq!(h.handle(&post("/api/nope", "{}")).status, 404);
    }

    #[test]
    fn test_unconfigured_source_is_500() {
        let resp = Handler::new(Settings::default())
            .handle(&post(CHECK_IN_PATH, r#"{"invoice":"INV-01","items":[]}"#));
        assert_eq!(resp.status, 500);
        let msg = resp.body_json().unwrap()["error"].as_str().unwrap().to_string();
        assert!(msg.contains("not configured"), "{msg}");
    }

    #[test]
    fn test_file_source_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        fs::write(&path, SHEET_IN).unwrap();
        let mut settings = Settings::default();
        settings.source.path = Some(path);

        let resp = Handler::new(settings).handle(&post(
            CHECK_IN_PATH,
            r#"{"invoice":"INV-01","items":[{"materialNo":"M-100","qty":"5","rowIndex":15}]}"#,
        ));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body_json().unwrap()["summary"], "1 ok, 0 mismatch, 0 missing");
    }

    #[test]
    fn test_extract_rejects_non_workbook() {
        let resp = memory_handler().handle(&post(EXTRACT_PATH, "not a workbook"));
        assert_eq!(resp.status, 400);
    }
}
