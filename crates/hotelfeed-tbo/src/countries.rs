//! Country roster for the ingestion run
//!
//! The roster is part of the build; enabling a market is a code change and
//! a redeploy, not runtime configuration.

pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub enabled: bool,
}

pub static COUNTRIES: &[Country] = &[
    Country { code: "AE", name: "United Arab Emirates", enabled: true },
    Country { code: "SA", name: "Saudi Arabia", enabled: true },
    Country { code: "QA", name: "Qatar", enabled: true },
    Country { code: "OM", name: "Oman", enabled: true },
    Country { code: "BH", name: "Bahrain", enabled: true },
    Country { code: "KW", name: "Kuwait", enabled: true },
    Country { code: "EG", name: "Egypt", enabled: false },
    Country { code: "JO", name: "Jordan", enabled: false },
    Country { code: "IN", name: "India", enabled: false },
];

/// Countries included in the current run.
pub fn enabled() -> impl Iterator<Item = &'static Country> {
    COUNTRIES.iter().filter(|c| c.enabled)
}
