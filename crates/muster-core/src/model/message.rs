use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Membership tiers supplied by the identity collaborator.
///
/// `Member` is the lowest tier and may not create broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Leader,
    Admin,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Leader => "leader",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may create organization-wide broadcasts.
    #[must_use]
    pub const fn can_broadcast(self) -> bool {
        !matches!(self, Self::Member)
    }
}

/// The five message classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Announcement,
    Assignment,
    RoleChange,
    AccountSecurity,
    Welcome,
}

impl MessageKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Assignment => "assignment",
            Self::RoleChange => "role_change",
            Self::AccountSecurity => "account_security",
            Self::Welcome => "welcome",
        }
    }

    /// Kinds that address exactly one user and record it in the dedicated
    /// `sole_recipient` field so renderers can personalize without scanning
    /// the recipient table.
    #[must_use]
    pub const fn is_account_security(self) -> bool {
        matches!(self, Self::AccountSecurity)
    }
}

/// Message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// All persisted fields for a message row.
///
/// The recipient set itself lives in the `message_recipients` table; the
/// `targeted_roles` / `excluded` fields are an audit snapshot of the
/// creation-time targeting request and are never re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFields {
    pub id: String,
    pub title: String,
    pub body: String,
    pub kind: MessageKind,
    pub priority: Priority,
    /// Creator user id; `None` for legacy rows.
    pub creator: Option<String>,
    /// When set, consuming surfaces render an anonymized creator.
    pub hide_creator: bool,
    /// Sole addressee of a single-recipient account-security message.
    pub sole_recipient: Option<String>,
    /// Audit snapshot of the role filter used at creation time.
    pub targeted_roles: Vec<Role>,
    /// Audit snapshot of the exclusion list used at creation time.
    pub excluded: Vec<String>,
    pub is_active: bool,
    pub created_at_us: i64,
    pub expires_at_us: Option<i64>,
}

impl Default for MessageFields {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            body: String::new(),
            kind: MessageKind::Announcement,
            priority: Priority::Normal,
            creator: None,
            hide_creator: false,
            sole_recipient: None,
            targeted_roles: Vec::new(),
            excluded: Vec::new(),
            is_active: true,
            created_at_us: 0,
            expires_at_us: None,
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "member" => Ok(Self::Member),
            "leader" => Ok(Self::Leader),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for MessageKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "announcement" => Ok(Self::Announcement),
            "assignment" => Ok(Self::Assignment),
            "role_change" | "role-change" => Ok(Self::RoleChange),
            "account_security" | "account-security" => Ok(Self::AccountSecurity),
            "welcome" => Ok(Self::Welcome),
            _ => Err(ParseEnumError {
                expected: "kind",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}
