use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geography code from the ONS Code History Database
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeoCode {
    pub geogcd: String,
    pub geognm: Option<String>,
    pub geognmw: Option<String>,
    pub si_id: Option<String>,
    pub si_title: Option<String>,
    pub oper_date: Option<NaiveDate>,
    pub term_date: Option<NaiveDate>,
    pub parentcd: Option<String>,
    pub entitycd: Option<String>,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub areaehect: Option<f64>,
    pub areachect: Option<f64>,
    pub areaihect: Option<f64>,
    pub arealhect: Option<f64>,
    pub in_latest_update: bool,
}
