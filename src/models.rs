/// One normalized transaction parsed out of a `<STMTTRN>` block.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Issuer FITID. Empty when the block carried none.
    pub external_id: String,
    /// `YYYY-MM-DD`, built from the first 8 characters of DTPOSTED.
    pub posted_date: String,
    pub amount: f64,
    pub description: String,
    pub raw_type: String,
    pub check_number: Option<String>,
}

impl TransactionRecord {
    pub fn kind(&self) -> TransactionKind {
        TransactionKind::from_amount(self.amount)
    }
}

/// Parser output: transactions in document order plus the statement's ACCTID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub transactions: Vec<TransactionRecord>,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Only a strictly positive amount is a credit; zero falls to debit.
    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 {
            Self::Credit
        } else {
            Self::Debit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

/// Where imported rows land. Either, both, or neither reference may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTarget {
    pub account_id: Option<i64>,
    pub card_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub id: i64,
    pub filename: String,
    pub source_type: String,
    pub hash: String,
    pub inserted_count: i64,
    pub imported_at: String,
}

/// The two kinds of ledger an import can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Account,
    Card,
}

impl LedgerKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Account => "accounts",
            Self::Card => "cards",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Card => "card",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub id: i64,
    pub name: String,
    pub institution: Option<String>,
}
