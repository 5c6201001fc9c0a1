//! Wire codec for Tally's HTTP/XML interface: request envelopes, transport,
//! encoding-tolerant decoding, character-reference sanitizing and the
//! XML → [`Payload`](crate::payload::Payload) conversion.

pub mod client;
pub mod decode;
pub mod envelope;
pub mod sanitize;
pub mod transport;
pub mod tree;

pub use client::{company_names, decode_response, detect_rejection, TallyClient};
pub use decode::{decode, detect_encoding, DetectedEncoding};
pub use envelope::{build_request, company_list_request, escape_xml, ReportRequest};
pub use sanitize::sanitize;
pub use transport::{HttpTransport, StaticTransport, Transport};
pub use tree::parse;
