use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// The backend rotates refresh tokens, so `refresh` is usually present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProfileEnvelope {
    pub user: User,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// KYC

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    NotSubmitted,
    Pending,
    Verified,
    Rejected,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriversLicense,
    NationalId,
    UtilityBill,
    BankStatement,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Passport => "passport",
            DocumentType::DriversLicense => "drivers_license",
            DocumentType::NationalId => "national_id",
            DocumentType::UtilityBill => "utility_bill",
            DocumentType::BankStatement => "bank_statement",
        }
    }
}

/// A document picked for upload.
#[derive(Debug, Clone)]
pub struct KycDocument {
    pub document_type: DocumentType,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycDocumentStatus {
    pub status: KycStatus,
    pub document_type: Option<DocumentType>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycStatusResponse {
    pub status: KycStatus,
    #[serde(default)]
    pub documents: Vec<KycDocumentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycSubmission {
    pub id: i64,
    pub user: i64,
    pub user_name: String,
    pub user_email: String,
    pub status: KycStatus,
    pub document_type: Option<DocumentType>,
    pub document_file: Option<String>,
    pub document_file_url: Option<String>,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KycSubmissionsEnvelope {
    pub submissions: Vec<KycSubmission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycReviewRequest {
    pub action: ReviewAction,
    pub notes: String,
}

// Support

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Technical,
    Billing,
    Account,
    Kyc,
    Trading,
    General,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    WaitingForUser,
    Closed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub department: Department,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketResponse {
    pub message: String,
    pub ticket_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    pub id: i64,
    pub user: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_admin: bool,
    /// Only present in the admin listing.
    #[serde(default)]
    pub is_internal: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketOwner {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub ticket_id: String,
    pub department: Department,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<TicketReply>,
    /// Admin listing only.
    #[serde(default)]
    pub user: Option<TicketOwner>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TicketsEnvelope {
    pub tickets: Vec<SupportTicket>,
}

/// `ticket_id` here is the numeric primary key, not the `ST-` reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminReplyRequest {
    pub ticket_id: i64,
    pub message: String,
    #[serde(default)]
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

// Notifications

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    SupportTicket,
    SupportReply,
    KycUpdate,
    AccountUpdate,
    DepositConfirmed,
    General,
    System,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub support_ticket_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NotificationsEnvelope {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MarkReadRequest {
    pub notification_id: i64,
}

// Deposits and wallet

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinType {
    Bitcoin,
    Ethereum,
    Ripple,
    Stellar,
    Usdt,
    Bnb,
    BnbTiger,
}

impl CoinType {
    pub const ALL: [CoinType; 7] = [
        CoinType::Bitcoin,
        CoinType::Ethereum,
        CoinType::Ripple,
        CoinType::Stellar,
        CoinType::Usdt,
        CoinType::Bnb,
        CoinType::BnbTiger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "bitcoin",
            CoinType::Ethereum => "ethereum",
            CoinType::Ripple => "ripple",
            CoinType::Stellar => "stellar",
            CoinType::Usdt => "usdt",
            CoinType::Bnb => "bnb",
            CoinType::BnbTiger => "bnb_tiger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Pending,
    Confirmed,
    Rejected,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAddress {
    pub coin_type: CoinType,
    pub wallet_address: String,
}

/// `amount` is USD, sent as a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepositRequest {
    pub coin_type: CoinType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepositResponse {
    pub message: String,
    pub deposit_id: i64,
    pub status: DepositStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub id: i64,
    pub coin_type: CoinType,
    pub coin_display: String,
    pub amount: Option<String>,
    pub wallet_address: String,
    pub status: DepositStatus,
    pub status_display: String,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DepositsEnvelope {
    pub deposits: Vec<Deposit>,
}

/// Balances in USD, formatted by the backend with two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub bitcoin_balance: String,
    pub ethereum_balance: String,
    pub ripple_balance: String,
    pub stellar_balance: String,
    pub usdt_balance: String,
    pub bnb_balance: String,
    pub bnb_tiger_balance: String,
}

impl WalletBalance {
    pub fn balance(&self, coin: CoinType) -> &str {
        match coin {
            CoinType::Bitcoin => &self.bitcoin_balance,
            CoinType::Ethereum => &self.ethereum_balance,
            CoinType::Ripple => &self.ripple_balance,
            CoinType::Stellar => &self.stellar_balance,
            CoinType::Usdt => &self.usdt_balance,
            CoinType::Bnb => &self.bnb_balance,
            CoinType::BnbTiger => &self.bnb_tiger_balance,
        }
    }

    /// Sum of all balances in cents; unparsable entries count as zero.
    /// `None` if the sum does not fit in an `i64`.
    pub fn total_cents(&self) -> Option<i64> {
        CoinType::ALL.iter().try_fold(0i64, |total, coin| {
            total.checked_add(parse_cents(self.balance(*coin)).unwrap_or(0))
        })
    }
}

fn parse_cents(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() || frac.len() > 2 {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let frac: i64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<2}", frac).parse().ok()?
    };
    let cents = whole.checked_mul(100)?.checked_add(frac)?;
    Some(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WalletEnvelope {
    pub wallet: WalletBalance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCopyRequest {
    pub coin_type: CoinType,
    pub wallet_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCopyResponse {
    pub message: String,
    pub tracking_id: i64,
}

// Ledger resources

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub code: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Debit,
    Credit,
}

/// Amounts travel as decimal strings; the backend also accepts numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<i64>,
    pub account: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    pub entry_type: EntryType,
    pub amount: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub reference: String,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<JournalEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Django REST framework list shape. Unpaginated endpoints return a bare
/// array instead, which [`Page::from_value`] also accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T: serde::de::DeserializeOwned> Page<T> {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_array() {
            let results: Vec<T> = serde_json::from_value(value)?;
            Ok(Page {
                count: Some(results.len() as u64),
                next: None,
                previous: None,
                results,
            })
        } else {
            serde_json::from_value(value)
        }
    }
}
