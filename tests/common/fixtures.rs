//! Test data builders for the published file formats

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// Build an in-memory ZIP archive with one member per `(name, contents)`
pub fn build_zip<T: AsRef<[u8]>>(files: &[(&str, T)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip member");
        writer.write_all(contents.as_ref()).expect("write zip member");
    }
    writer.finish().expect("finish zip").into_inner()
}

fn to_csv(rows: &[Vec<String>], delimiter: u8) -> String {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).expect("write csv row");
    }
    String::from_utf8(writer.into_inner().expect("flush csv")).expect("utf8 csv")
}

/// Header of the basic company data CSV, spacing quirks included
pub fn company_headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "CompanyName",
        " CompanyNumber",
        "RegAddress.CareOf",
        "RegAddress.POBox",
        "RegAddress.AddressLine1",
        " RegAddress.AddressLine2",
        "RegAddress.PostTown",
        "RegAddress.County",
        "RegAddress.Country",
        "RegAddress.PostCode",
        "CompanyCategory",
        "CompanyStatus",
        "CountryOfOrigin",
        "DissolutionDate",
        "IncorporationDate",
        "Accounts.AccountRefDay",
        "Accounts.AccountRefMonth",
        "Accounts.NextDueDate",
        "Accounts.LastMadeUpDate",
        "Accounts.AccountCategory",
        "Returns.NextDueDate",
        "Returns.LastMadeUpDate",
        "Mortgages.NumMortCharges",
        "Mortgages.NumMortOutstanding",
        "Mortgages.NumMortPartSatisfied",
        "Mortgages.NumMortSatisfied",
        "SICCode.SicText_1",
        "SICCode.SicText_2",
        "SICCode.SicText_3",
        "SICCode.SicText_4",
        "LimitedPartnerships.NumGenPartners",
        "LimitedPartnerships.NumLimPartners",
        "URI",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    for n in 1..=10 {
        headers.push(format!("PreviousName_{}.CONDATE", n));
        headers.push(format!(" PreviousName_{}.CompanyName", n));
    }
    headers.push("ConfStmtNextDueDate".to_string());
    headers.push(" ConfStmtLastMadeUpDate".to_string());
    headers
}

/// One company in a test snapshot
#[derive(Debug, Clone)]
pub struct TestCompany {
    pub number: String,
    pub name: String,
    pub post_code: String,
    pub category: String,
    pub status: String,
    pub incorporated: String,
    pub sic_codes: Vec<String>,
    pub previous_names: Vec<(String, String)>,
}

impl TestCompany {
    pub fn new(number: &str, name: &str) -> Self {
        Self {
            number: number.to_string(),
            name: name.to_string(),
            post_code: "SW1A 1AA".to_string(),
            category: "Private Limited Company".to_string(),
            status: "Active".to_string(),
            incorporated: "05/03/2012".to_string(),
            sic_codes: Vec::new(),
            previous_names: Vec::new(),
        }
    }

    pub fn with_sic(mut self, sic: &str) -> Self {
        self.sic_codes.push(sic.to_string());
        self
    }

    pub fn with_previous_name(mut self, con_date: &str, name: &str) -> Self {
        self.previous_names.push((con_date.to_string(), name.to_string()));
        self
    }

    fn row(&self) -> Vec<String> {
        let headers = company_headers();
        let mut row = vec![String::new(); headers.len()];
        let mut set = |header: &str, value: &str| {
            let index = headers
                .iter()
                .position(|h| h.trim() == header)
                .expect("known header");
            row[index] = value.to_string();
        };

        set("CompanyName", &self.name);
        set("CompanyNumber", &self.number);
        set("RegAddress.AddressLine1", "1 Test Street");
        set("RegAddress.PostTown", "LONDON");
        set("RegAddress.PostCode", &self.post_code);
        set("CompanyCategory", &self.category);
        set("CompanyStatus", &self.status);
        set("CountryOfOrigin", "United Kingdom");
        set("IncorporationDate", &self.incorporated);
        set("Accounts.AccountRefDay", "31");
        set("Accounts.AccountRefMonth", "3");
        set("Accounts.AccountCategory", "TOTAL EXEMPTION FULL");
        set("Mortgages.NumMortCharges", "0");
        set("URI", &format!("http://business.data.gov.uk/id/company/{}", self.number));
        set("SICCode.SicText_1", "None Supplied");
        for (i, sic) in self.sic_codes.iter().enumerate() {
            set(&format!("SICCode.SicText_{}", i + 1), sic);
        }
        for (i, (con_date, name)) in self.previous_names.iter().enumerate() {
            set(&format!("PreviousName_{}.CONDATE", i + 1), con_date);
            set(&format!("PreviousName_{}.CompanyName", i + 1), name);
        }
        row
    }
}

/// A basic company data CSV file
pub fn companies_csv(companies: &[TestCompany]) -> String {
    let mut rows = vec![company_headers()];
    rows.extend(companies.iter().map(TestCompany::row));
    to_csv(&rows, b',')
}

/// `count` plain companies numbered from `start`
pub fn numbered_companies(start: usize, count: usize) -> Vec<TestCompany> {
    (start..start + count)
        .map(|i| TestCompany::new(&format!("{:08}", i), &format!("COMPANY {} LTD", i)))
        .collect()
}

const CHD_HEADER: &str = "GEOGCD,GEOGNM,GEOGNMW,SI_ID,SI_TITLE,OPER_DATE,TERM_DATE,PARENTCD,ENTITYCD,OWNER,STATUS,AREAEHECT,AREACHECT,AREAIHECT,AREALHECT";

/// A `ChangeHistory.csv` of 500 geographies, 417 of them live
pub fn change_history_csv() -> String {
    let mut csv = String::from(CHD_HEADER);
    csv.push('\n');
    for i in 0..500 {
        let line = match i {
            0 => "E04005721,Skidbrooke with Saltfleet Haven,,,,01/04/1974 00:00:00,,E07000140,E04,ONS,live,1330.25,1330.25,0,1330.25"
                .to_string(),
            499 => "E33003018,,,,,01/01/2011 00:00:00,01/05/2019 00:00:00,,E33,ONS,terminated,,,,".to_string(),
            _ => {
                let status = if i < 417 { "live" } else { "terminated" };
                let term_date = if i < 417 { "" } else { "01/04/2023 00:00:00" };
                format!(
                    "E0500{:04},Ward {},,SI_{},,01/04/2009 00:00:00,{},E08000001,E05,ONS,{},{}.5,{}.5,0,{}.5",
                    i, i, i, term_date, status, i, i, i
                )
            }
        };
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

/// The CHD download: the change history alongside the other published members
pub fn chd_zip() -> Vec<u8> {
    build_zip(&[
        ("Code_History_Database_(May_2023)_UK/Changes.csv", "GEOGCD_P,GEOGCD\n".to_string()),
        ("Code_History_Database_(May_2023)_UK/ChangeHistory.csv", change_history_csv()),
        ("Code_History_Database_(May_2023)_UK/User Guide.txt", "Read me".to_string()),
    ])
}

const CCNI_HEADER: [&str; 19] = [
    "Reg charity number",
    "Sub charity number",
    "Charity name",
    "Date registered",
    "Status",
    "Date for financial year ending",
    "Total income",
    "Total spending",
    "Charitable spending",
    "Income generation and governance",
    "Retained for future use",
    "Public address",
    "Website",
    "Email",
    "Telephone",
    "Company number",
    "What the charity does",
    "Who the charity helps",
    "How the charity works",
];

/// One NI register row: number, sub number, name, `what` classifications
pub fn ccni_row(number: &str, sub_number: &str, name: &str, what: &str) -> Vec<String> {
    [
        number,
        sub_number,
        name,
        "01/09/2015",
        "Registered",
        "31/03/2023",
        "£12,345",
        "£10,000",
        "9000",
        "1000",
        "0",
        "1 Main Street, Belfast, BT1 1AA",
        "https://example.org",
        "info@example.org",
        "028 9000 0000",
        "0",
        what,
        "Children or young people;Older people",
        "Provides services",
    ]
    .iter()
    .map(|v| v.to_string())
    .collect()
}

pub fn ccni_csv(rows: &[Vec<String>]) -> String {
    let mut all = vec![CCNI_HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
    all.extend(rows.iter().cloned());
    format!("\u{feff}{}", to_csv(&all, b','))
}

/// Tab-delimited, unquoted extract text with a byte-order mark
fn ccew_text(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut text = format!("\u{feff}{}\r\n", header.join("\t"));
    for row in rows {
        text.push_str(&row.join("\t"));
        text.push_str("\r\n");
    }
    text
}

const CCEW_CHARITY_HEADER: [&str; 17] = [
    "date_of_extract",
    "organisation_number",
    "registered_charity_number",
    "linked_charity_number",
    "charity_name",
    "charity_type",
    "charity_registration_status",
    "date_of_registration",
    "date_of_removal",
    "latest_income",
    "latest_expenditure",
    "charity_contact_postcode",
    "charity_contact_web",
    "charity_company_registration_number",
    "charity_insolvent",
    "charity_in_administration",
    "charity_is_cio",
];

pub fn ccew_charity_row(organisation_number: i64, name: &str, status: &str) -> Vec<String> {
    vec![
        "2024-01-15 00:00:00".to_string(),
        organisation_number.to_string(),
        (organisation_number + 1_000_000).to_string(),
        "0".to_string(),
        name.to_string(),
        "Other".to_string(),
        status.to_string(),
        "1990-03-01 00:00:00".to_string(),
        String::new(),
        "12345.67".to_string(),
        "11000".to_string(),
        "CF10 1AA".to_string(),
        String::new(),
        String::new(),
        "False".to_string(),
        "False".to_string(),
        "True".to_string(),
    ]
}

pub fn ccew_charity_zip(rows: &[Vec<String>]) -> Vec<u8> {
    build_zip(&[("publicextract.charity.txt", ccew_text(&CCEW_CHARITY_HEADER, rows))])
}

const CCEW_AREA_HEADER: [&str; 9] = [
    "date_of_extract",
    "organisation_number",
    "registered_charity_number",
    "linked_charity_number",
    "geographic_area_type",
    "geographic_area_description",
    "parent_geographic_area_type",
    "parent_geographic_area_description",
    "welsh_ind",
];

pub fn ccew_area_row(organisation_number: i64, area_type: &str, description: &str, welsh: bool) -> Vec<String> {
    vec![
        "2024-01-15".to_string(),
        organisation_number.to_string(),
        (organisation_number + 1_000_000).to_string(),
        "0".to_string(),
        area_type.to_string(),
        description.to_string(),
        "Country".to_string(),
        if welsh { "Wales" } else { "England" }.to_string(),
        if welsh { "True" } else { "False" }.to_string(),
    ]
}

pub fn ccew_area_zip(rows: &[Vec<String>]) -> Vec<u8> {
    build_zip(&[(
        "publicextract.charity_area_of_operation.txt",
        ccew_text(&CCEW_AREA_HEADER, rows),
    )])
}
