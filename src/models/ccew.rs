use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A charity from the Charity Commission for England & Wales public extract
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CcewCharity {
    pub organisation_number: i64,
    pub registered_charity_number: i64,
    pub linked_charity_number: Option<i64>,
    pub charity_name: Option<String>,
    pub charity_type: Option<String>,
    pub charity_registration_status: Option<String>,
    pub date_of_registration: Option<NaiveDate>,
    pub date_of_removal: Option<NaiveDate>,
    pub latest_income: Option<f64>,
    pub latest_expenditure: Option<f64>,
    pub charity_contact_postcode: Option<String>,
    pub charity_contact_web: Option<String>,
    pub charity_company_registration_number: Option<String>,
    pub charity_insolvent: Option<bool>,
    pub charity_in_administration: Option<bool>,
    pub charity_is_cio: Option<bool>,
    pub date_of_extract: Option<NaiveDate>,
    pub in_latest_update: bool,
}

/// One area a charity operates in
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharityAreaOfOperation {
    pub organisation_number: i64,
    pub registered_charity_number: i64,
    pub linked_charity_number: Option<i64>,
    pub geographic_area_type: Option<String>,
    pub geographic_area_description: Option<String>,
    pub parent_geographic_area_type: Option<String>,
    pub parent_geographic_area_description: Option<String>,
    pub welsh_ind: Option<bool>,
    pub date_of_extract: Option<NaiveDate>,
    pub in_latest_update: bool,
}
