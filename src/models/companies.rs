use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A company from the Companies House basic company data snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub company_number: String,
    pub company_name: Option<String>,
    pub reg_address_care_of: Option<String>,
    pub reg_address_po_box: Option<String>,
    pub reg_address_address_line1: Option<String>,
    pub reg_address_address_line2: Option<String>,
    pub reg_address_post_town: Option<String>,
    pub reg_address_county: Option<String>,
    pub reg_address_country: Option<String>,
    pub reg_address_post_code: Option<String>,
    pub company_category: Option<String>,
    pub company_status: Option<String>,
    pub country_of_origin: Option<String>,
    pub dissolution_date: Option<NaiveDate>,
    pub incorporation_date: Option<NaiveDate>,
    pub accounts_account_ref_day: Option<i64>,
    pub accounts_account_ref_month: Option<i64>,
    pub accounts_next_due_date: Option<NaiveDate>,
    pub accounts_last_made_up_date: Option<NaiveDate>,
    pub accounts_account_category: Option<String>,
    pub returns_next_due_date: Option<NaiveDate>,
    pub returns_last_made_up_date: Option<NaiveDate>,
    pub mortgages_num_mort_charges: Option<i64>,
    pub mortgages_num_mort_outstanding: Option<i64>,
    pub mortgages_num_mort_part_satisfied: Option<i64>,
    pub mortgages_num_mort_satisfied: Option<i64>,
    pub limited_partnerships_num_gen_partners: Option<i64>,
    pub limited_partnerships_num_lim_partners: Option<i64>,
    pub uri: Option<String>,
    pub conf_stmt_next_due_date: Option<NaiveDate>,
    pub conf_stmt_last_made_up_date: Option<NaiveDate>,
    pub last_updated: Option<NaiveDateTime>,
    pub in_latest_update: bool,
}

/// A name the company was previously registered under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviousName {
    pub company_number: String,
    pub company_name: String,
    pub con_date: Option<NaiveDate>,
    pub in_latest_update: bool,
}

/// Standard Industrial Classification code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SicCode {
    pub code: String,
    pub title: Option<String>,
}

/// Link between a company and one of its SIC codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanySicCode {
    pub company_number: String,
    pub sic_code: String,
    pub in_latest_update: bool,
}

/// Company type values used by the Companies House API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyType {
    PrivateUnlimited,
    Ltd,
    Plc,
    OldPublicCompany,
    PrivateLimitedGuarantNscLimitedExemption,
    LimitedPartnership,
    PrivateLimitedGuarantNsc,
    ConvertedOrClosed,
    PrivateUnlimitedNsc,
    PrivateLimitedSharesSection30Exemption,
    ProtectedCellCompany,
    AssuranceCompany,
    OverseaCompany,
    Eeig,
    RegisteredSocietyNonJurisdictional,
    IndustrialAndProvidentSociety,
    NorthernIreland,
    NorthernIrelandOther,
    RoyalCharter,
    InvestmentCompanyWithVariableCapital,
    UnregisteredCompany,
    Llp,
    Other,
    EuropeanPublicLimitedLiabilityCompanySe,
    UkEstablishment,
    ScottishPartnership,
    CharitableIncorporatedOrganisation,
    ScottishCharitableIncorporatedOrganisation,
    FurtherEducationOrSixthFormCollegeCorporation,
    RegisteredOverseasEntity,
}

impl CompanyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::PrivateUnlimited => "private-unlimited",
            CompanyType::Ltd => "ltd",
            CompanyType::Plc => "plc",
            CompanyType::OldPublicCompany => "old-public-company",
            CompanyType::PrivateLimitedGuarantNscLimitedExemption => "private-limited-guarant-nsc-limited-exemption",
            CompanyType::LimitedPartnership => "limited-partnership",
            CompanyType::PrivateLimitedGuarantNsc => "private-limited-guarant-nsc",
            CompanyType::ConvertedOrClosed => "converted-or-closed",
            CompanyType::PrivateUnlimitedNsc => "private-unlimited-nsc",
            CompanyType::PrivateLimitedSharesSection30Exemption => "private-limited-shares-section-30-exemption",
            CompanyType::ProtectedCellCompany => "protected-cell-company",
            CompanyType::AssuranceCompany => "assurance-company",
            CompanyType::OverseaCompany => "oversea-company",
            CompanyType::Eeig => "eeig",
            CompanyType::RegisteredSocietyNonJurisdictional => "registered-society-non-jurisdictional",
            CompanyType::IndustrialAndProvidentSociety => "industrial-and-provident-society",
            CompanyType::NorthernIreland => "northern-ireland",
            CompanyType::NorthernIrelandOther => "northern-ireland-other",
            CompanyType::RoyalCharter => "royal-charter",
            CompanyType::InvestmentCompanyWithVariableCapital => "investment-company-with-variable-capital",
            CompanyType::UnregisteredCompany => "unregistered-company",
            CompanyType::Llp => "llp",
            CompanyType::Other => "other",
            CompanyType::EuropeanPublicLimitedLiabilityCompanySe => "european-public-limited-liability-company-se",
            CompanyType::UkEstablishment => "uk-establishment",
            CompanyType::ScottishPartnership => "scottish-partnership",
            CompanyType::CharitableIncorporatedOrganisation => "charitable-incorporated-organisation",
            CompanyType::ScottishCharitableIncorporatedOrganisation => "scottish-charitable-incorporated-organisation",
            CompanyType::FurtherEducationOrSixthFormCollegeCorporation => "further-education-or-sixth-form-college-corporation",
            CompanyType::RegisteredOverseasEntity => "registered-overseas-entity",
        }
    }

    /// Map a `CompanyCategory` label from the bulk CSV
    pub fn from_register_label(label: &str) -> Option<Self> {
        let company_type = match label {
            "Private Limited Company" => CompanyType::Ltd,
            "Public Limited Company" => CompanyType::Plc,
            "Old Public Company" => CompanyType::OldPublicCompany,
            "Private Unlimited Company" | "Private Unlimited" => CompanyType::PrivateUnlimited,
            "PRIV LTD SECT. 30 (Private limited company, section 30 of the Companies Act)" => {
                CompanyType::PrivateLimitedSharesSection30Exemption
            }
            "PRI/LBG/NSC (Private, Limited by guarantee, no share capital, use of 'Limited' exemption)" => {
                CompanyType::PrivateLimitedGuarantNscLimitedExemption
            }
            "PRI/LTD BY GUAR/NSC (Private, limited by guarantee, no share capital)" => {
                CompanyType::PrivateLimitedGuarantNsc
            }
            "Limited Partnership" => CompanyType::LimitedPartnership,
            "Limited Liability Partnership" => CompanyType::Llp,
            "Converted/Closed" => CompanyType::ConvertedOrClosed,
            "Protected Cell Company" => CompanyType::ProtectedCellCompany,
            "Assurance Company" => CompanyType::AssuranceCompany,
            "Overseas Company" => CompanyType::OverseaCompany,
            "European Economic Interest Grouping (EEIG)" => CompanyType::Eeig,
            "Registered Society" => CompanyType::RegisteredSocietyNonJurisdictional,
            "Industrial and Provident Society" => CompanyType::IndustrialAndProvidentSociety,
            "Northern Ireland Company" => CompanyType::NorthernIreland,
            "Other Northern Ireland Company" => CompanyType::NorthernIrelandOther,
            "Royal Charter Company" => CompanyType::RoyalCharter,
            "Investment Company with Variable Capital" => CompanyType::InvestmentCompanyWithVariableCapital,
            "Unregistered Company" => CompanyType::UnregisteredCompany,
            "Other company type" | "Other Company Type" => CompanyType::Other,
            "European Public Limited-Liability Company (SE)" => {
                CompanyType::EuropeanPublicLimitedLiabilityCompanySe
            }
            "UK Establishment" => CompanyType::UkEstablishment,
            "Scottish Partnership" => CompanyType::ScottishPartnership,
            "Charitable Incorporated Organisation" => CompanyType::CharitableIncorporatedOrganisation,
            "Scottish Charitable Incorporated Organisation" => {
                CompanyType::ScottishCharitableIncorporatedOrganisation
            }
            "Further Education and Sixth Form College Corps" => {
                CompanyType::FurtherEducationOrSixthFormCollegeCorporation
            }
            "Overseas Entity" => CompanyType::RegisteredOverseasEntity,
            _ => return None,
        };
        Some(company_type)
    }
}

/// Company status values used by the Companies House API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyStatus {
    Active,
    Dissolved,
    Liquidation,
    Receivership,
    Administration,
    VoluntaryArrangement,
    ConvertedClosed,
    InsolvencyProceedings,
    Registered,
    Removed,
    Closed,
    Open,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Dissolved => "dissolved",
            CompanyStatus::Liquidation => "liquidation",
            CompanyStatus::Receivership => "receivership",
            CompanyStatus::Administration => "administration",
            CompanyStatus::VoluntaryArrangement => "voluntary-arrangement",
            CompanyStatus::ConvertedClosed => "converted-closed",
            CompanyStatus::InsolvencyProceedings => "insolvency-proceedings",
            CompanyStatus::Registered => "registered",
            CompanyStatus::Removed => "removed",
            CompanyStatus::Closed => "closed",
            CompanyStatus::Open => "open",
        }
    }

    /// Map a `CompanyStatus` label from the bulk CSV
    pub fn from_register_label(label: &str) -> Option<Self> {
        let status = match label {
            "Active" | "Active - Proposal to Strike off" => CompanyStatus::Active,
            "Dissolved" => CompanyStatus::Dissolved,
            "Liquidation" => CompanyStatus::Liquidation,
            "Receivership"
            | "Receiver Action"
            | "ADMINISTRATIVE RECEIVER"
            | "RECEIVER MANAGER / ADMINISTRATIVE RECEIVER"
            | "Live but Receiver Manager on at least one charge" => CompanyStatus::Receivership,
            "In Administration"
            | "Administration Order"
            | "In Administration/Administrative Receiver"
            | "In Administration/Receiver Manager" => CompanyStatus::Administration,
            "Voluntary Arrangement" | "VOLUNTARY ARRANGEMENT / RECEIVER MANAGER" => {
                CompanyStatus::VoluntaryArrangement
            }
            "Converted / Closed" | "Converted/Closed" => CompanyStatus::ConvertedClosed,
            "Insolvency Proceedings" => CompanyStatus::InsolvencyProceedings,
            "Registered" => CompanyStatus::Registered,
            "Removed" => CompanyStatus::Removed,
            "Closed" => CompanyStatus::Closed,
            "Open" => CompanyStatus::Open,
            _ => return None,
        };
        Some(status)
    }
}

/// Accounts type values used by the Companies House API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Null,
    Full,
    Small,
    Medium,
    Group,
    Dormant,
    Interim,
    Initial,
    TotalExemptionFull,
    TotalExemptionSmall,
    PartialExemption,
    AuditExemptionSubsidiary,
    FilingExemptionSubsidiary,
    MicroEntity,
    NoAccountsTypeAvailable,
    AuditedAbridged,
    UnauditedAbridged,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Null => "null",
            AccountType::Full => "full",
            AccountType::Small => "small",
            AccountType::Medium => "medium",
            AccountType::Group => "group",
            AccountType::Dormant => "dormant",
            AccountType::Interim => "interim",
            AccountType::Initial => "initial",
            AccountType::TotalExemptionFull => "total-exemption-full",
            AccountType::TotalExemptionSmall => "total-exemption-small",
            AccountType::PartialExemption => "partial-exemption",
            AccountType::AuditExemptionSubsidiary => "audit-exemption-subsidiary",
            AccountType::FilingExemptionSubsidiary => "filing-exemption-subsidiary",
            AccountType::MicroEntity => "micro-entity",
            AccountType::NoAccountsTypeAvailable => "no-accounts-type-available",
            AccountType::AuditedAbridged => "audited-abridged",
            AccountType::UnauditedAbridged => "unaudited-abridged",
        }
    }

    /// Map an `Accounts.AccountCategory` label from the bulk CSV
    pub fn from_register_label(label: &str) -> Option<Self> {
        let account_type = match label {
            "FULL" => AccountType::Full,
            "SMALL" => AccountType::Small,
            "MEDIUM" => AccountType::Medium,
            "GROUP" => AccountType::Group,
            "DORMANT" => AccountType::Dormant,
            "INTERIM" => AccountType::Interim,
            "INITIAL" => AccountType::Initial,
            "TOTAL EXEMPTION FULL" => AccountType::TotalExemptionFull,
            "TOTAL EXEMPTION SMALL" => AccountType::TotalExemptionSmall,
            "PARTIAL EXEMPTION" => AccountType::PartialExemption,
            "AUDIT EXEMPTION SUBSIDIARY" => AccountType::AuditExemptionSubsidiary,
            "FILING EXEMPTION SUBSIDIARY" => AccountType::FilingExemptionSubsidiary,
            "MICRO ENTITY" => AccountType::MicroEntity,
            "NO ACCOUNTS FILED" | "ACCOUNTS TYPE NOT AVAILABLE" => AccountType::NoAccountsTypeAvailable,
            "AUDITED ABRIDGED" => AccountType::AuditedAbridged,
            "UNAUDITED ABRIDGED" => AccountType::UnauditedAbridged,
            _ => return None,
        };
        Some(account_type)
    }
}
