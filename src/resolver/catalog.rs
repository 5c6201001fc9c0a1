use serde::{Deserialize, Serialize};

/// Report used whenever nothing better can be determined.
pub const DEFAULT_REPORT: &str = "Balance Sheet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub id: String,
    /// Exact report name Tally expects in `REPORTNAME`.
    pub canonical_name: String,
    pub description: String,
}

impl ReportDescriptor {
    pub fn new(
        id: impl Into<String>,
        canonical_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            canonical_name: canonical_name.into(),
            description: description.into(),
        }
    }
}

/// The fixed descriptor set the resolver index is built from.
pub fn default_catalog() -> Vec<ReportDescriptor> {
    vec![
        ReportDescriptor::new(
            "bs_01",
            "Balance Sheet",
            "Balance Sheet. Financial statement of assets, liabilities, and equity. Shows net worth, debt, capital, and loans.",
        ),
        ReportDescriptor::new(
            "pl_01",
            "Profit & Loss A/c",
            "Profit and Loss A/c. P&L. Income statement. Shows revenue, sales, expenses, net profit, cost of sales, and gross profit.",
        ),
        ReportDescriptor::new(
            "stk_01",
            "Stock Summary",
            "Stock Summary. Inventory report. Shows closing stock, item quantities, stock value, inward outward goods, and stock valuation.",
        ),
        ReportDescriptor::new(
            "day_01",
            "Day Book",
            "Day Book. Daily ledger entries. Chronological list of all vouchers, sales, purchases, receipts, and payments for a specific day.",
        ),
        ReportDescriptor::new(
            "sale_01",
            "Sales Register",
            "Sales Register. List of all sales invoices and transactions. Shows monthly sales performance and trends.",
        ),
        ReportDescriptor::new(
            "tb_01",
            "Trial Balance",
            "Trial Balance. List of all ledger account balances (debit and credit). Used for audit and checking accounting accuracy.",
        ),
        ReportDescriptor::new(
            "br_01",
            "Bills Receivable",
            "Bills Receivable. Outstanding bills. Money owed to the business by customers (debtors). Pending payments.",
        ),
        ReportDescriptor::new(
            "bank_01",
            "Cash/Bank Book",
            "Cash and Bank Book. Group Summary for Bank Accounts. Shows cash in hand, bank balance, and liquidity.",
        ),
    ]
}

// Friendly name -> exact Tally report name.
const REPORT_ALIASES: [(&str, &str); 16] = [
    ("Balance Sheet", "Balance Sheet"),
    ("Profit & Loss", "Profit & Loss A/c"),
    ("Profit & Loss A/c", "Profit & Loss A/c"),
    ("ProfitAndLoss", "Profit & Loss A/c"),
    ("Stock Summary", "Stock Summary"),
    ("StockSummary", "Stock Summary"),
    ("Sales Register", "Sales Register"),
    ("SalesRegister", "Sales Register"),
    ("Day Book", "Day Book"),
    ("DayBook", "Day Book"),
    ("Bills Receivable", "Bills Receivable"),
    ("Trial Balance", "Trial Balance"),
    // Bank balances are usually reached through Group Summary in Tally.
    ("Cash/Bank Account", "Group Summary"),
    ("Cash/Bank Book", "Cash/Bank Book"),
    ("Cash Flow Summary", "Cash Flow"),
    ("Cash Flow", "Cash Flow"),
];

/// Maps a known friendly name (case-insensitive) to the exact Tally report name.
pub fn canonical_report_name(alias: &str) -> Option<&'static str> {
    let alias = alias.trim();
    REPORT_ALIASES
        .iter()
        .find(|(friendly, _)| friendly.eq_ignore_ascii_case(alias))
        .map(|(_, exact)| *exact)
}
