use crate::error::{OfxloadError, Result};
use crate::models::{Statement, TransactionRecord};

pub const NO_DESCRIPTION: &str = "No description available";
const DEFAULT_TRN_TYPE: &str = "OTHER";

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Walks `<TAG>value` pairs in document order. `value` is everything between
/// the closing `>` and the next `<`, untrimmed.
struct Tags<'a> {
    rest: &'a str,
}

impl<'a> Tags<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Tags<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let open = self.rest.find('<')?;
            let after = &self.rest[open + 1..];
            let Some(stop) = after.find(|c: char| c == '<' || c == '>') else {
                self.rest = "";
                return None;
            };
            if after.as_bytes()[stop] == b'<' {
                // `<` never closed before another `<`: restart from the later one.
                self.rest = &after[stop..];
                continue;
            }
            let name = &after[..stop];
            let tail = &after[stop + 1..];
            let end = tail.find('<').unwrap_or(tail.len());
            self.rest = &tail[end..];
            return Some((name, &tail[..end]));
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Fields collected between `<STMTTRN>` and `</STMTTRN>`. First value wins.
#[derive(Debug, Default)]
struct RawBlock {
    trn_type: Option<String>,
    posted: Option<String>,
    amount: Option<String>,
    fit_id: Option<String>,
    memo: Option<String>,
    name: Option<String>,
    check_num: Option<String>,
}

impl RawBlock {
    fn offer(&mut self, tag: &str, value: &str) {
        let slot = match tag {
            "TRNTYPE" => &mut self.trn_type,
            "DTPOSTED" => &mut self.posted,
            "TRNAMT" => &mut self.amount,
            "FITID" => &mut self.fit_id,
            "MEMO" => &mut self.memo,
            "NAME" => &mut self.name,
            "CHECKNUM" => &mut self.check_num,
            _ => return,
        };
        if slot.is_some() {
            return;
        }
        let run = value.split('\n').next().unwrap_or("");
        if !run.is_empty() {
            *slot = Some(run.trim().to_string());
        }
    }

    /// `None` when the block lacks a posted date or an amount.
    fn into_record(self) -> Result<Option<TransactionRecord>> {
        let (Some(posted), Some(amount)) = (self.posted, self.amount) else {
            return Ok(None);
        };
        let description = [self.memo, self.name]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        Ok(Some(TransactionRecord {
            external_id: self.fit_id.unwrap_or_default(),
            posted_date: normalize_date(&posted),
            amount: parse_amount(&amount)?,
            description,
            raw_type: self.trn_type.unwrap_or_else(|| DEFAULT_TRN_TYPE.to_string()),
            check_number: self.check_num,
        }))
    }
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// `YYYYMMDD[hhmmss[.xxx][TZ]]` -> `YYYY-MM-DD`. No validation: short or
/// non-numeric input comes out as a short or non-numeric string.
pub fn normalize_date(raw: &str) -> String {
    let head: Vec<char> = raw.chars().take(8).collect();
    let piece = |from: usize, to: usize| -> String {
        head.iter().skip(from).take(to - from).collect()
    };
    format!("{}-{}-{}", piece(0, 4), piece(4, 6), piece(6, 8))
}

/// Comma is the decimal separator when present; dots are then grouping marks.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let normalized = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };
    match normalized.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(OfxloadError::InvalidAmount {
            raw: raw.to_string(),
        }),
    }
}

/// Latin-1: every byte is the code point of the same value.
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

pub fn parse(raw: &[u8]) -> Result<Statement> {
    parse_str(&decode_latin1(raw))
}

pub fn parse_str(text: &str) -> Result<Statement> {
    let mut statement = Statement::default();
    let mut block: Option<RawBlock> = None;
    let mut dropped = 0usize;

    for (tag, value) in Tags::new(text) {
        if tag == "ACCTID" && statement.account_id.is_none() {
            let run = value.split(char::is_whitespace).next().unwrap_or("");
            if !run.is_empty() {
                statement.account_id = Some(run.to_string());
            }
        }
        match tag {
            "STMTTRN" if block.is_none() => block = Some(RawBlock::default()),
            "/STMTTRN" => {
                let Some(finished) = block.take() else { continue };
                match finished.into_record()? {
                    Some(record) => statement.transactions.push(record),
                    None => dropped += 1,
                }
            }
            _ => {
                if let Some(current) = block.as_mut() {
                    current.offer(tag, value);
                }
            }
        }
    }

    if block.is_some() {
        tracing::debug!("unterminated STMTTRN block at end of input ignored");
    }
    if dropped > 0 {
        tracing::debug!(dropped, "STMTTRN blocks without DTPOSTED/TRNAMT skipped");
    }
    tracing::debug!(
        transactions = statement.transactions.len(),
        account_id = ?statement.account_id,
        "parsed OFX statement"
    );
    Ok(statement)
}
