//! Owned domain records
//!
//! Every domain module (debts/loans, deposits, digital accounts, family
//! vault, reminders, transactions, special messages) is a uniform owned
//! record: arbitrary business fields in a jsonb payload, an optional
//! object-storage attachment, and row-level scoping by the owning account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The domain tables addressable through the uniform record API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    DebtsLoans,
    DepositsInvestments,
    DigitalAccounts,
    FamilyMembers,
    FamilyDocuments,
    Reminders,
    Transactions,
    SpecialMessages,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::DebtsLoans,
        RecordKind::DepositsInvestments,
        RecordKind::DigitalAccounts,
        RecordKind::FamilyMembers,
        RecordKind::FamilyDocuments,
        RecordKind::Reminders,
        RecordKind::Transactions,
        RecordKind::SpecialMessages,
    ];

    /// Table name. Kinds are a closed enum, so interpolating this into SQL
    /// is safe.
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::DebtsLoans => "debts_loans",
            RecordKind::DepositsInvestments => "deposits_investments",
            RecordKind::DigitalAccounts => "digital_accounts",
            RecordKind::FamilyMembers => "family_members",
            RecordKind::FamilyDocuments => "family_documents",
            RecordKind::Reminders => "reminders",
            RecordKind::Transactions => "transactions",
            RecordKind::SpecialMessages => "special_messages",
        }
    }

    /// Object-storage bucket holding this kind's attachments
    pub fn bucket(self) -> &'static str {
        match self {
            RecordKind::DebtsLoans => "debts-loans-documents",
            RecordKind::DepositsInvestments => "deposits-investments-documents",
            RecordKind::DigitalAccounts => "digital-accounts-documents",
            RecordKind::FamilyMembers => "family-members-documents",
            RecordKind::FamilyDocuments => "family-vault-documents",
            RecordKind::Reminders => "reminders-documents",
            RecordKind::Transactions => "transactions-documents",
            RecordKind::SpecialMessages => "special-messages-documents",
        }
    }

    /// URL path slug
    pub fn slug(self) -> &'static str {
        match self {
            RecordKind::DebtsLoans => "debts-loans",
            RecordKind::DepositsInvestments => "deposits-investments",
            RecordKind::DigitalAccounts => "digital-accounts",
            RecordKind::FamilyMembers => "family-members",
            RecordKind::FamilyDocuments => "family-documents",
            RecordKind::Reminders => "reminders",
            RecordKind::Transactions => "transactions",
            RecordKind::SpecialMessages => "special-messages",
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("unknown record kind: {}", s))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Owned domain record row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub data: serde_json::Value,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New record creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
    pub data: serde_json::Value,
}

/// Record update payload
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRecord {
    pub data: serde_json::Value,
}

/// List query: pagination plus a substring filter over the payload text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_slug_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.slug().parse::<RecordKind>(), Ok(kind));
        }
        assert!("nominees".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_tables_and_buckets_are_distinct() {
        for (i, a) in RecordKind::ALL.into_iter().enumerate() {
            for b in RecordKind::ALL.into_iter().skip(i + 1) {
                assert_ne!(a.table(), b.table());
                assert_ne!(a.bucket(), b.bucket());
            }
        }
    }
}
