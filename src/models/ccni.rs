use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A charity on the Charity Commission for Northern Ireland register
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CcniCharity {
    pub reg_charity_number: i64,
    pub sub_charity_number: i64,
    pub charity_name: String,
    pub date_registered: Option<NaiveDate>,
    pub status: Option<String>,
    pub date_for_financial_year_ending: Option<NaiveDate>,
    pub total_income: Option<i64>,
    pub total_spending: Option<i64>,
    pub charitable_spending: Option<i64>,
    pub income_generation_and_governance: Option<i64>,
    pub retained_for_future_use: Option<i64>,
    pub public_address: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub company_number: Option<String>,
    pub in_latest_update: bool,
}

/// The three classification schemes used by the NI register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationType {
    What,
    Who,
    How,
}

impl ClassificationType {
    pub const ALL: [ClassificationType; 3] = [
        ClassificationType::What,
        ClassificationType::Who,
        ClassificationType::How,
    ];

    /// Stored value, which is also the register's column heading
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationType::What => "What the charity does",
            ClassificationType::Who => "Who the charity helps",
            ClassificationType::How => "How the charity works",
        }
    }

    /// Column name after header normalisation
    pub fn column(&self) -> &'static str {
        match self {
            ClassificationType::What => "what_the_charity_does",
            ClassificationType::Who => "who_the_charity_helps",
            ClassificationType::How => "how_the_charity_works",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharityClassification {
    pub charity_id: i64,
    pub classification_type: ClassificationType,
    pub classification: String,
    pub in_latest_update: bool,
}
