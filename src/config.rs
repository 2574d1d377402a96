//! Store configuration.

/// Business settings for a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Currency codes accepted in the `Currency` field (exact match).
    pub currencies: Vec<String>,
    /// `Field id` expected on the header line.
    pub header_marker: String,
    /// `Field id` written on appended transactions.
    pub transaction_marker: String,
    /// `Field id` expected on the footer line.
    pub footer_marker: String,
}

impl Config {
    /// Replaces the accepted currency codes.
    pub fn with_currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = currencies.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            currencies: ["USD", "EUR", "PLN"].map(String::from).to_vec(),
            header_marker: "01".to_string(),
            transaction_marker: "02".to_string(),
            footer_marker: "03".to_string(),
        }
    }
}
