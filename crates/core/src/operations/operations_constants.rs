/// Ledger operation type labels, compared after lowercasing and dropping
/// everything that is not alphanumeric.
pub const OPERATION_LABELS_TRADE: &[&str] = &["purchasesell", "trade", "buy", "sell"];
pub const OPERATION_LABELS_PROFIT_LOSS: &[&str] = &["profitloss", "pnl", "income"];
pub const OPERATION_LABELS_DEPOSIT_WITHDRAWAL: &[&str] =
    &["depositwithdrawal", "deposit", "withdrawal"];

/// Tag marking a profit that was converted back into the asset.
pub const TAG_REINVESTING: &str = "reinvesting";

/// Tags marking a profit/loss row as rent income.
pub const RENT_TAGS: &[&str] = &["rent", "rental", "rental income", "rent income"];

/// Tags marking a row as an expense on a real asset.
pub const EXPENSE_TAGS: &[&str] = &[
    "expense",
    "expenses",
    "repair",
    "renovation",
    "maintenance",
    "tax",
    "insurance",
    "fee",
    "utilities",
];
