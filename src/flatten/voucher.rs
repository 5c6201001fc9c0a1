//! Ledger-message shaped payloads (Day Book and other voucher exports).

use crate::flatten::row::TableRow;
use crate::payload::Payload;
use crate::utils::{format_decimal, format_display_date, parse_amount, parse_tally_date};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub const VOUCHER_COLUMNS: [&str; 5] = ["Date", "Particulars", "Vch Type", "Vch No", "Amount"];

const MESSAGE_KEY: &str = "TALLYMESSAGE";
const VOUCHER_KEY: &str = "VOUCHER";
const CONTAINER_KEYS: [&str; 4] = ["REQUESTDATA", "IMPORTDATA", "BODY", "DATA"];
const PARTY_KEYS: [&str; 2] = ["PARTYNAME", "PARTYLEDGERNAME"];
const INVENTORY_KEYS: [&str; 2] = ["ALLINVENTORYENTRIES.LIST", "INVENTORYENTRIES.LIST"];
const LEDGER_KEYS: [&str; 2] = ["ALLLEDGERENTRIES.LIST", "LEDGERENTRIES.LIST"];
const UNKNOWN_PARTY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoucherRecord {
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub particulars: String,
    pub voucher_type: String,
    pub voucher_number: String,
    pub amount: Decimal,
}

impl VoucherRecord {
    pub fn from_voucher(voucher: &Payload) -> Self {
        let raw_date = field_text(voucher, "DATE").unwrap_or_default();
        let particulars = PARTY_KEYS
            .iter()
            .find_map(|key| field_text(voucher, key))
            .unwrap_or_else(|| UNKNOWN_PARTY.to_string());

        Self {
            date: parse_tally_date(&raw_date),
            raw_date,
            particulars,
            voucher_type: field_text(voucher, "VOUCHERTYPENAME").unwrap_or_default(),
            voucher_number: field_text(voucher, "VOUCHERNUMBER").unwrap_or_default(),
            amount: voucher_amount(voucher),
        }
    }

    /// `DD-MM-YYYY`, or the raw text when it is not an 8-digit date.
    pub fn date_display(&self) -> String {
        self.date
            .map(format_display_date)
            .unwrap_or_else(|| self.raw_date.clone())
    }

    pub fn amount_display(&self) -> String {
        format_decimal(self.amount)
    }

    pub fn to_row(&self) -> TableRow {
        let values = [
            self.date_display(),
            self.particulars.clone(),
            self.voucher_type.clone(),
            self.voucher_number.clone(),
            self.amount_display(),
        ];
        VOUCHER_COLUMNS.iter().copied().zip(values).collect()
    }
}

/// Non-empty text of a direct child, reading a mixed element's `content`.
fn field_text(node: &Payload, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Payload::text)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn entries<'a>(voucher: &'a Payload, keys: &[&str]) -> Vec<&'a Payload> {
    keys.iter()
        .filter_map(|key| voucher.get(key))
        .find(|p| !p.is_empty())
        .map(Payload::items)
        .unwrap_or_default()
}

fn entry_amount(entry: &Payload) -> Option<Decimal> {
    entry
        .get("AMOUNT")
        .and_then(Payload::text)
        .and_then(parse_amount)
        .map(|a| a.abs())
}

/// Sum of inventory amounts when the voucher has inventory entries, otherwise
/// the first non-zero ledger amount. Unparseable amounts are skipped and the
/// sum saturates at `Decimal::MAX`.
fn voucher_amount(voucher: &Payload) -> Decimal {
    let inventory = entries(voucher, &INVENTORY_KEYS);
    if !inventory.is_empty() {
        return inventory
            .into_iter()
            .filter_map(entry_amount)
            .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount));
    }
    entries(voucher, &LEDGER_KEYS)
        .into_iter()
        .filter_map(entry_amount)
        .find(|a| !a.is_zero())
        .unwrap_or(Decimal::ZERO)
}

/// The `TALLYMESSAGE` value at the top level or beneath any chain of container
/// keys. Containers are searched in order until one actually holds messages.
fn find_messages(payload: &Payload) -> Option<&Payload> {
    match payload {
        Payload::Node(_) => payload.get(MESSAGE_KEY).or_else(|| {
            CONTAINER_KEYS
                .iter()
                .filter_map(|key| payload.get(key))
                .find_map(find_messages)
        }),
        Payload::List(items) => items.iter().find_map(find_messages),
        Payload::Leaf(_) => None,
    }
}

/// One record per `VOUCHER` found in the messages; `None` when the payload has no such messages.
pub fn parse_vouchers(payload: &Payload) -> Option<Vec<VoucherRecord>> {
    let messages = find_messages(payload)?;
    let records: Vec<VoucherRecord> = messages
        .items()
        .into_iter()
        .filter_map(|message| message.get(VOUCHER_KEY))
        .flat_map(Payload::items)
        .filter(|voucher| !voucher.is_empty())
        .map(VoucherRecord::from_voucher)
        .collect();

    if records.is_empty() {
        None
    } else {
        Some(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::parse;
    use std::str::FromStr;

    const DAY_BOOK: &str = r#"
        <ENVELOPE>
          <HEADER><TALLYREQUEST>Import Data</TALLYREQUEST></HEADER>
          <BODY><IMPORTDATA><REQUESTDATA>
            <TALLYMESSAGE>
              <VOUCHER VCHTYPE="Sales" ACTION="Create">
                <DATE>20240415</DATE>
                <PARTYLEDGERNAME>Acme Traders</PARTYLEDGERNAME>
                <VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>
                <VOUCHERNUMBER>12</VOUCHERNUMBER>
                <ALLINVENTORYENTRIES.LIST><AMOUNT>1,200.50</AMOUNT></ALLINVENTORYENTRIES.LIST>
                <ALLINVENTORYENTRIES.LIST><AMOUNT>-800</AMOUNT></ALLINVENTORYENTRIES.LIST>
                <ALLLEDGERENTRIES.LIST><AMOUNT>-2000.50</AMOUNT></ALLLEDGERENTRIES.LIST>
              </VOUCHER>
            </TALLYMESSAGE>
            <TALLYMESSAGE>
              <VOUCHER>
                <DATE>2024-04-16</DATE>
                <PARTYNAME>Cash</PARTYNAME>
                <VOUCHERTYPENAME>Payment</VOUCHERTYPENAME>
                <VOUCHERNUMBER>3</VOUCHERNUMBER>
                <ALLLEDGERENTRIES.LIST><AMOUNT>0</AMOUNT></ALLLEDGERENTRIES.LIST>
                <ALLLEDGERENTRIES.LIST><AMOUNT>-15,000</AMOUNT></ALLLEDGERENTRIES.LIST>
                <ALLLEDGERENTRIES.LIST><AMOUNT>15000</AMOUNT></ALLLEDGERENTRIES.LIST>
              </VOUCHER>
            </TALLYMESSAGE>
            <TALLYMESSAGE><COMPANY><NAME>Skip me</NAME></COMPANY></TALLYMESSAGE>
          </REQUESTDATA></IMPORTDATA></BODY>
        </ENVELOPE>"#;

    #[test]
    fn test_parses_nested_day_book() {
        let payload = parse(DAY_BOOK).unwrap();
        let records = parse_vouchers(&payload).unwrap();
        assert_eq!(records.len(), 2);

        let sale = &records[0];
        assert_eq!(sale.date_display(), "15-04-2024");
        assert_eq!(sale.particulars, "Acme Traders");
        assert_eq!(sale.amount, Decimal::from_str("2000.50").unwrap());
        assert_eq!(sale.amount_display(), "2,000.50");

        let payment = &records[1];
        assert_eq!(payment.date, None);
        assert_eq!(payment.date_display(), "2024-04-16");
        assert_eq!(payment.particulars, "Cash");
        assert_eq!(payment.amount_display(), "15,000.00");
    }

    #[test]
    fn test_row_shape() {
        let payload = parse(DAY_BOOK).unwrap();
        let row = parse_vouchers(&payload).unwrap()[0].to_row();
        assert_eq!(row.columns().collect::<Vec<_>>(), VOUCHER_COLUMNS.to_vec());
        assert_eq!(row.get("Vch Type"), Some("Sales"));
        assert_eq!(row.get("Vch No"), Some("12"));
    }

    #[test]
    fn test_single_message_with_missing_fields() {
        let xml = r#"<ENVELOPE><TALLYMESSAGE><VOUCHER><PARTYNAME REMOTEID="x"></PARTYNAME>
            <VOUCHERNUMBER>1</VOUCHERNUMBER></VOUCHER></TALLYMESSAGE></ENVELOPE>"#;
        let records = parse_vouchers(&parse(xml).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].particulars, "Unknown");
        assert_eq!(records[0].amount, Decimal::ZERO);
        assert_eq!(records[0].date_display(), "");
    }

    #[test]
    fn test_several_vouchers_in_one_message() {
        let xml = r#"<ENVELOPE><BODY><DATA><TALLYMESSAGE>
            <VOUCHER><PARTYNAME>A</PARTYNAME><VOUCHERNUMBER>1</VOUCHERNUMBER></VOUCHER>
            <VOUCHER><PARTYNAME>B</PARTYNAME><VOUCHERNUMBER>2</VOUCHERNUMBER></VOUCHER>
        </TALLYMESSAGE></DATA></BODY></ENVELOPE>"#;
        let records = parse_vouchers(&parse(xml).unwrap()).unwrap();
        let parties: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.particulars.as_str(), r.voucher_number.as_str()))
            .collect();
        assert_eq!(parties, vec![("A", "1"), ("B", "2")]);
    }

    #[test]
    fn test_container_without_messages_is_skipped() {
        let xml = r#"<ENVELOPE>
            <REQUESTDATA><NOTE>first</NOTE></REQUESTDATA>
            <REQUESTDATA><NOTE>second</NOTE></REQUESTDATA>
            <BODY><TALLYMESSAGE><VOUCHER><PARTYNAME>Cash</PARTYNAME></VOUCHER></TALLYMESSAGE></BODY>
        </ENVELOPE>"#;
        let records = parse_vouchers(&parse(xml).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].particulars, "Cash");
    }

    #[test]
    fn test_inventory_sum_saturates() {
        let xml = r#"<ENVELOPE><TALLYMESSAGE><VOUCHER>
            <ALLINVENTORYENTRIES.LIST><AMOUNT>79228162514264337593543950335</AMOUNT></ALLINVENTORYENTRIES.LIST>
            <ALLINVENTORYENTRIES.LIST><AMOUNT>1</AMOUNT></ALLINVENTORYENTRIES.LIST>
        </VOUCHER></TALLYMESSAGE></ENVELOPE>"#;
        let records = parse_vouchers(&parse(xml).unwrap()).unwrap();
        assert_eq!(records[0].amount, Decimal::MAX);
    }

    #[test]
    fn test_non_voucher_payload() {
        let xml = "<ENVELOPE><DSPACCNAME><DSPDISPNAME>Cash</DSPDISPNAME></DSPACCNAME></ENVELOPE>";
        assert!(parse_vouchers(&parse(xml).unwrap()).is_none());
    }
}
