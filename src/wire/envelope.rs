use crate::config::ReportPeriod;
use crate::utils::format_tally_date;

/// Escapes the five XML special characters. `&` goes first so later entities are not re-escaped.
pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// An "Export Data" request for one named report of one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub report_name: String,
    pub company_name: String,
    pub period: Option<ReportPeriod>,
}

impl ReportRequest {
    pub fn new(report_name: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            company_name: company_name.into(),
            period: None,
        }
    }

    pub fn with_period(mut self, period: Option<ReportPeriod>) -> Self {
        self.period = period;
        self
    }

    pub fn to_xml(&self) -> String {
        let report = escape_xml(&self.report_name);
        let company = escape_xml(&self.company_name);

        let period = match self.period {
            Some(p) => format!(
                "\n        <SVFROMDATE>{}</SVFROMDATE>\n        <SVTODATE>{}</SVTODATE>",
                format_tally_date(p.from),
                format_tally_date(p.to)
            ),
            None => String::new(),
        };

        format!(
            r#"<ENVELOPE>
  <HEADER>
    <TALLYREQUEST>Export Data</TALLYREQUEST>
  </HEADER>
  <BODY>
    <EXPORTDATA>
      <REQUESTDESC>
        <REPORTNAME>{report}</REPORTNAME>
        <STATICVARIABLES>
          <SVCurrentCompany>{company}</SVCurrentCompany>
          <SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>{period}
        </STATICVARIABLES>
      </REQUESTDESC>
    </EXPORTDATA>
  </BODY>
</ENVELOPE>"#
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

/// Builds the request body for `report_name`/`company_name` over the default wide period.
pub fn build_request(report_name: &str, company_name: &str) -> Vec<u8> {
    ReportRequest::new(report_name, company_name)
        .with_period(Some(ReportPeriod::default()))
        .to_bytes()
}

/// Collection export listing every company loaded in Tally.
pub fn company_list_request() -> Vec<u8> {
    r#"<ENVELOPE>
  <HEADER>
    <VERSION>1</VERSION>
    <TALLYREQUEST>Export</TALLYREQUEST>
    <TYPE>Collection</TYPE>
    <ID>List of Companies</ID>
  </HEADER>
  <BODY>
    <DESC>
      <STATICVARIABLES>
        <SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>
      </STATICVARIABLES>
      <TDL>
        <TDLMESSAGE>
          <COLLECTION NAME="List of Companies" ISMODIFY="No">
            <TYPE>Company</TYPE>
            <FETCH>Name</FETCH>
          </COLLECTION>
        </TDLMESSAGE>
      </TDL>
    </DESC>
  </BODY>
</ENVELOPE>"#
        .as_bytes()
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::tree::parse;
    use proptest::prelude::*;

    #[test]
    fn test_escape_all_five() {
        assert_eq!(
            escape_xml(r#"A&B <C> "D" 'E'"#),
            "A&amp;B &lt;C&gt; &quot;D&quot; &apos;E&apos;"
        );
        assert_eq!(escape_xml("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_period_is_optional() {
        let without = ReportRequest::new("Day Book", "ACME").to_xml();
        assert!(!without.contains("SVFROMDATE"));

        let with = String::from_utf8(build_request("Day Book", "ACME")).unwrap();
        assert!(with.contains("<SVFROMDATE>20200401</SVFROMDATE>"));
        assert!(with.contains("<SVTODATE>20300331</SVTODATE>"));
        assert!(with.contains("<SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>"));
    }

    #[test]
    fn test_company_list_request_is_well_formed() {
        let text = String::from_utf8(company_list_request()).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(
            parsed.get_path(&["HEADER", "ID"]).and_then(|p| p.as_leaf()),
            Some("List of Companies")
        );
    }

    proptest! {
        #[test]
        fn prop_request_round_trips_names(
            report in "[A-Za-z0-9&<>\"'/]{1,24}",
            company in "[A-Za-z0-9&<>\"'.]{1,24}",
        ) {
            let text = String::from_utf8(build_request(&report, &company)).unwrap();
            let parsed = parse(&text).unwrap();

            let desc = parsed.get_path(&["BODY", "EXPORTDATA", "REQUESTDESC"]).unwrap();
            prop_assert_eq!(desc.get("REPORTNAME").and_then(|p| p.as_leaf()), Some(report.as_str()));
            prop_assert_eq!(
                desc.get_path(&["STATICVARIABLES", "SVCurrentCompany"]).and_then(|p| p.as_leaf()),
                Some(company.as_str())
            );
        }
    }
}
