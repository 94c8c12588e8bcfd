use chrono::NaiveDate;

use motoreal_config::Config;

/// Money and date rendering driven by the active configuration.
#[derive(Debug, Clone)]
pub struct CliFormatters {
    currency: String,
    day_first: bool,
}

impl CliFormatters {
    pub fn from_config(config: &Config) -> Self {
        Self {
            currency: config.currency.clone(),
            day_first: config.locale.eq_ignore_ascii_case("pt-BR"),
        }
    }

    pub fn money(&self, amount: f64) -> String {
        format!("{amount:.2} {}", self.currency)
    }

    pub fn date(&self, date: NaiveDate) -> String {
        if self.day_first {
            date.format("%d/%m/%Y").to_string()
        } else {
            date.format("%Y-%m-%d").to_string()
        }
    }
}

pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_locale_prints_day_first() {
        let formatters = CliFormatters::from_config(&Config::default());
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(formatters.date(date), "10/03/2025");
        assert_eq!(formatters.money(1234.5), "1234.50 BRL");

        let mut config = Config::default();
        config.locale = "en-US".into();
        config.currency = "USD".into();
        let formatters = CliFormatters::from_config(&config);
        assert_eq!(formatters.date(date), "2025-03-10");
        assert_eq!(formatters.money(-3.0), "-3.00 USD");
    }
}
