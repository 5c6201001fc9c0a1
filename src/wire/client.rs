use crate::config::{ReportPeriod, TallyConfig};
use crate::error::{Result, TallyError};
use crate::payload::Payload;
use crate::wire::decode::decode;
use crate::wire::envelope::{company_list_request, ReportRequest};
use crate::wire::sanitize::sanitize;
use crate::wire::transport::{HttpTransport, Transport};
use crate::wire::tree::parse;
use log::{debug, info, warn};
use regex::Regex;
use std::sync::OnceLock;

/// Plain-text markers Tally embeds in an otherwise well-formed response when it refuses a request.
pub const REJECTION_MARKERS: [&str; 2] = ["LINEERROR", "Unknown Request"];

fn line_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<LINEERROR>(.*?)</LINEERROR>").expect("static regex"))
}

/// Returns the rejection message if the response is an application-level refusal.
pub fn detect_rejection(text: &str) -> Option<String> {
    if let Some(caps) = line_error_re().captures(text) {
        let message = caps[1].trim();
        return Some(if message.is_empty() {
            "LINEERROR".to_string()
        } else {
            message.to_string()
        });
    }
    REJECTION_MARKERS
        .iter()
        .find(|marker| text.contains(*marker))
        .map(|_| text.trim().chars().take(200).collect())
}

/// Runs raw response bytes through decode → sanitize → rejection check → parse.
pub fn decode_response(raw: &[u8]) -> Result<Payload> {
    let text = decode(raw);
    if text.trim().is_empty() {
        return Err(TallyError::parse("Tally returned an empty response", &text));
    }

    let clean = sanitize(&text);
    if let Some(message) = detect_rejection(&clean) {
        return Err(TallyError::ReportRejected(message));
    }
    parse(&clean)
}

/// Fetches reports and company names from one Tally instance.
pub struct TallyClient<T: Transport = HttpTransport> {
    transport: T,
    period: Option<ReportPeriod>,
}

impl TallyClient<HttpTransport> {
    pub fn from_config(config: &TallyConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::from_config(config)?).with_period(config.period))
    }
}

impl<T: Transport> TallyClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            period: Some(ReportPeriod::default()),
        }
    }

    pub fn with_period(mut self, period: Option<ReportPeriod>) -> Self {
        self.period = period;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch_report(&self, report_name: &str, company_name: &str) -> Result<Payload> {
        let request = ReportRequest::new(report_name, company_name).with_period(self.period);
        self.fetch(&request).await
    }

    pub async fn fetch(&self, request: &ReportRequest) -> Result<Payload> {
        info!(
            "Fetching report '{}' for '{}'",
            request.report_name, request.company_name
        );
        let raw = self.transport.send(&request.to_bytes()).await?;
        debug!("Received {} bytes for '{}'", raw.len(), request.report_name);
        decode_response(&raw)
    }

    /// Names of the companies loaded in Tally. Any failure degrades to an empty list.
    pub async fn list_companies(&self) -> Vec<String> {
        let raw = match self.transport.send(&company_list_request()).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not reach Tally for the company list: {}", e);
                return Vec::new();
            }
        };
        match decode_response(&raw) {
            Ok(payload) => company_names(&payload),
            Err(e) => {
                warn!("Company list response was unusable: {}", e);
                Vec::new()
            }
        }
    }
}

/// Collects `COMPANY` names anywhere in a collection export, in document order, without duplicates.
pub fn company_names(payload: &Payload) -> Vec<String> {
    fn walk(node: &Payload, out: &mut Vec<String>) {
        match node {
            Payload::Node(entries) => {
                for (key, value) in entries {
                    if key == "COMPANY" {
                        for company in value.items() {
                            let name = company
                                .get("NAME")
                                .and_then(Payload::text)
                                .or_else(|| company.text())
                                .map(str::trim);
                            if let Some(name) = name.filter(|n| !n.is_empty()) {
                                if !out.iter().any(|existing| existing == name) {
                                    out.push(name.to_string());
                                }
                            }
                        }
                    } else {
                        walk(value, out);
                    }
                }
            }
            Payload::List(items) => items.iter().for_each(|item| walk(item, out)),
            Payload::Leaf(_) => {}
        }
    }

    let mut out = Vec::new();
    walk(payload, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::transport::StaticTransport;

    const COMPANIES: &str = r#"<ENVELOPE><BODY><DATA><COLLECTION>
        <COMPANY NAME="ACME Traders"><NAME TYPE="String">ACME Traders</NAME></COMPANY>
        <COMPANY NAME="Sharma &amp; Sons"/>
    </COLLECTION></DATA></BODY></ENVELOPE>"#;

    #[test]
    fn test_detect_rejection() {
        let text = "<ENVELOPE><BODY><DATA><LINEERROR>Could not find Report 'Foo'!</LINEERROR></DATA></BODY></ENVELOPE>";
        assert_eq!(
            detect_rejection(text),
            Some("Could not find Report 'Foo'!".to_string())
        );
        assert!(detect_rejection("<RESPONSE>Unknown Request, cannot be processed</RESPONSE>").is_some());
        assert_eq!(detect_rejection("<ENVELOPE><A>1</A></ENVELOPE>"), None);
    }

    #[tokio::test]
    async fn test_fetch_report_decodes_dirty_response() {
        let body = "<?xml version=\"1.0\"?><ENVELOPE><BSNAME><DSPDISPNAME>R&D &#4;Fund</DSPDISPNAME></BSNAME></ENVELOPE>";
        let client = TallyClient::new(StaticTransport::new(body));

        let payload = client.fetch_report("Balance Sheet", "ACME").await.unwrap();
        assert_eq!(
            payload.get_path(&["BSNAME", "DSPDISPNAME"]).and_then(Payload::as_leaf),
            Some("R&D Fund")
        );

        let sent = client.transport().requests();
        assert!(sent[0].contains("<REPORTNAME>Balance Sheet</REPORTNAME>"));
        assert!(sent[0].contains("<SVFROMDATE>20200401</SVFROMDATE>"));
    }

    #[tokio::test]
    async fn test_rejection_and_transport_errors_are_distinct() {
        let rejected = TallyClient::new(StaticTransport::new(
            "<ENVELOPE><LINEERROR>No such report</LINEERROR></ENVELOPE>",
        ));
        assert!(matches!(
            rejected.fetch_report("Foo", "ACME").await,
            Err(TallyError::ReportRejected(msg)) if msg == "No such report"
        ));

        let down = TallyClient::new(StaticTransport::failing("connection refused"));
        assert!(matches!(
            down.fetch_report("Day Book", "ACME").await,
            Err(TallyError::Transport(_))
        ));

        let empty = TallyClient::new(StaticTransport::new(Vec::new()));
        assert!(matches!(
            empty.fetch_report("Day Book", "ACME").await,
            Err(TallyError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_companies() {
        let client = TallyClient::new(StaticTransport::new(COMPANIES));
        assert_eq!(
            client.list_companies().await,
            vec!["ACME Traders".to_string(), "Sharma & Sons".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_companies_degrades_to_empty() {
        let down = TallyClient::new(StaticTransport::failing("timeout"));
        assert!(down.list_companies().await.is_empty());

        let garbage = TallyClient::new(StaticTransport::new("<A><B></A>"));
        assert!(garbage.list_companies().await.is_empty());
    }
}
