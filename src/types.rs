//! Shared types for the betting ledger.
//!
//! Records here mirror what the persistence layer stores. The enums are
//! closed sets: their serialized strings are the exact values written to
//! and read from storage.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bookmaker account.
pub type BookmakerId = i64;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Settlement status of a bet. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

impl BetStatus {
    pub const ALL: &'static [BetStatus] = &[BetStatus::Pending, BetStatus::Won, BetStatus::Lost];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == BetStatus::Pending
    }

    /// Whether the bet has reached a terminal state.
    pub fn is_resolved(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BetStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown bet status: {s}"))
    }
}

/// Kind of wager. Decides both the liability and the payoff formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BetType {
    BackBet,
    LayBet,
    MugBet,
    FreeBet,
    Personal,
    Other,
}

impl BetType {
    pub const ALL: &'static [BetType] = &[
        BetType::BackBet,
        BetType::LayBet,
        BetType::MugBet,
        BetType::FreeBet,
        BetType::Personal,
        BetType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::BackBet => "backBet",
            BetType::LayBet => "layBet",
            BetType::MugBet => "mugBet",
            BetType::FreeBet => "freeBet",
            BetType::Personal => "personal",
            BetType::Other => "other",
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BetType::ALL
            .iter()
            .copied()
            .find(|bet_type| bet_type.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown bet type: {s}"))
    }
}

/// Direction of a cash movement against a bookmaker account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            _ => Err(anyhow::anyhow!("Unknown transaction type: {s}")),
        }
    }
}

/// Lifecycle of a promotional free-bet credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreebetStatus {
    Received,
    Pending,
    Rejected,
    Claiming,
    Other,
}

impl FreebetStatus {
    pub const ALL: &'static [FreebetStatus] = &[
        FreebetStatus::Received,
        FreebetStatus::Pending,
        FreebetStatus::Rejected,
        FreebetStatus::Claiming,
        FreebetStatus::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FreebetStatus::Received => "received",
            FreebetStatus::Pending => "pending",
            FreebetStatus::Rejected => "rejected",
            FreebetStatus::Claiming => "claiming",
            FreebetStatus::Other => "other",
        }
    }
}

impl fmt::Display for FreebetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FreebetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FreebetStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown freebet status: {s}"))
    }
}

/// Calendar bucket size for period rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Sortable label of the bucket containing `date`
    /// (`2024-03-15`, `2024-03` or `2024`).
    pub fn period_of(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Year => format!("{:04}", date.year()),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A bookmaker account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmaker {
    pub id: BookmakerId,
    pub name: String,
    /// Flat percentage (0–100) charged on winning profit.
    pub commission: Decimal,
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBookmaker {
    pub name: String,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub initial_balance: Decimal,
}

/// The inputs settlement is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetTerms {
    pub bet_type: BetType,
    pub stake: Decimal,
    /// Decimal (European) odds.
    pub odds: Decimal,
}

/// One wagering record.
///
/// `liability` and `result` are derived from `status` and the terms; they
/// are only ever written by `engine::settlement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: i64,
    pub bookmaker_id: BookmakerId,
    pub placed_on: NaiveDate,
    pub description: String,
    pub bet_type: BetType,
    pub status: BetStatus,
    pub stake: Decimal,
    pub odds: Decimal,
    pub liability: Decimal,
    pub result: Decimal,
}

impl Bet {
    pub fn terms(&self) -> BetTerms {
        BetTerms {
            bet_type: self.bet_type,
            stake: self.stake,
            odds: self.odds,
        }
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}] {} {:.2} @ {:.2} ({}) liability={:.2} result={:.2}",
            self.id,
            self.bet_type,
            self.description,
            self.stake,
            self.odds,
            self.status,
            self.liability,
            self.result,
        )
    }
}

/// A bet as submitted, before settlement fields are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBet {
    pub bookmaker_id: BookmakerId,
    pub placed_on: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub bet_type: BetType,
    pub stake: Decimal,
    pub odds: Decimal,
}

/// Deposit or withdrawal of real money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub bookmaker_id: BookmakerId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub made_on: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub bookmaker_id: BookmakerId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub made_on: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

/// Promotional credit. Tracked apart from bets; profit attribution goes
/// through `freeBet`-typed bets on the same bookmaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freebet {
    pub id: i64,
    pub bookmaker_id: BookmakerId,
    pub amount: Decimal,
    pub status: FreebetStatus,
    pub received_on: NaiveDate,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFreebet {
    pub bookmaker_id: BookmakerId,
    pub amount: Decimal,
    #[serde(default = "default_freebet_status")]
    pub status: FreebetStatus,
    pub received_on: NaiveDate,
    #[serde(default)]
    pub description: String,
}

fn default_freebet_status() -> FreebetStatus {
    FreebetStatus::Received
}

// ---------------------------------------------------------------------------
// Query scopes
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if start > end {
            anyhow::bail!("Window start {start} is after end {end}");
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BetFilter {
    pub bookmaker_id: Option<BookmakerId>,
    pub status: Option<BetStatus>,
    pub bet_type: Option<BetType>,
    pub window: Option<DateWindow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub bookmaker_id: Option<BookmakerId>,
    pub kind: Option<TransactionType>,
    pub window: Option<DateWindow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreebetFilter {
    pub bookmaker_id: Option<BookmakerId>,
    pub status: Option<FreebetStatus>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
