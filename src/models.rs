use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Currency sections every snapshot may carry, keyed by lowercased code.
pub const CURRENCY_CODES: [&str; 5] = ["usd", "rub", "eur", "gbp", "kzt"];

/// Which portion of the snapshot a refresh trigger should regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Exchange,
    News,
    Savings,
    Metals,
    Reliability,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::Exchange,
        Scope::News,
        Scope::Savings,
        Scope::Metals,
        Scope::Reliability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Exchange => "exchange",
            Scope::News => "news",
            Scope::Savings => "savings",
            Scope::Metals => "metals",
            Scope::Reliability => "reliability",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown refresh scope '{}'", s))
    }
}

/// Execution context that decides the candidate fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    LocalDev,
    Deployed,
}

impl Environment {
    /// Classify the host name the front end is served from.
    pub fn from_host(host: &str) -> Self {
        let host = host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_ascii_lowercase();

        let is_local = matches!(host.as_str(), "localhost" | "127.0.0.1" | "::1" | "0.0.0.0")
            || host.ends_with(".localhost");

        if is_local {
            Environment::LocalDev
        } else {
            Environment::Deployed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::LocalDev => "local-development",
            Environment::Deployed => "deployed",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "local-development" | "local_development" | "dev" | "development" => {
                Ok(Environment::LocalDev)
            }
            "deployed" | "production" | "prod" => Ok(Environment::Deployed),
            other => Err(anyhow!("Unknown environment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankQuote {
    pub name: String,
    pub buy: f64,
    pub sell: f64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub is_mock: bool,
}

/// One currency section: central-bank reference rate, daily history and bank quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRates {
    pub cbu: f64,
    pub cbu_last_updated: String,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
    #[serde(default)]
    pub banks: Vec<BankQuote>,
}

impl CurrencyRates {
    pub fn empty() -> Self {
        CurrencyRates {
            cbu: 0.0,
            cbu_last_updated: "N/A".to_string(),
            history: Vec::new(),
            banks: Vec::new(),
        }
    }

    pub fn bank(&self, name: &str) -> Option<&BankQuote> {
        self.banks.iter().find(|b| b.name == name)
    }

    /// Bank paying the most when you sell them currency.
    pub fn best_buy(&self) -> Option<&BankQuote> {
        self.banks
            .iter()
            .filter(|b| b.buy > 0.0)
            .max_by(|a, b| a.buy.total_cmp(&b.buy))
    }

    /// Cheapest bank to buy currency from. Zero quotes mean "not selling".
    pub fn best_sell(&self) -> Option<&BankQuote> {
        self.banks
            .iter()
            .filter(|b| b.sell > 0.0)
            .min_by(|a, b| a.sell.total_cmp(&b.sell))
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.history.last()
    }

    fn duplicate_bank_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.banks
            .iter()
            .filter(|b| !seen.insert(b.name.as_str()))
            .map(|b| b.name.as_str())
            .collect()
    }
}

/// The full JSON document written by the scraper.
///
/// Held as an insertion-ordered object so every key, array order and numeric
/// type survives untouched; typed views are decoded on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).context("Snapshot is not valid JSON")?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(anyhow!(
                    "Snapshot must be a JSON object, got {}",
                    json_kind(&other)
                ))
            }
        };

        let snapshot = Snapshot(map);
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Every present currency section must have the common shape.
    fn validate(&self) -> Result<()> {
        for code in CURRENCY_CODES {
            if let Some(rates) = self.currency(code)? {
                let dupes = rates.duplicate_bank_names();
                if !dupes.is_empty() {
                    tracing::warn!(currency = code, banks = ?dupes, "Duplicate bank names in snapshot");
                }
            }
        }
        Ok(())
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.0.get("last_updated").and_then(Value::as_str)
    }

    /// Decode a currency section. `Ok(None)` when absent or null.
    pub fn currency(&self, code: &str) -> Result<Option<CurrencyRates>> {
        match self.0.get(code) {
            None | Some(Value::Null) => Ok(None),
            Some(section) => CurrencyRates::deserialize(section)
                .map(Some)
                .with_context(|| format!("Malformed '{}' section", code)),
        }
    }

    pub fn section(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub(crate) fn from_map_unchecked(map: Map<String, Value>) -> Self {
        Snapshot(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "last_updated": "2025-01-10 09:30",
            "usd": {
                "cbu": 12850.5,
                "cbu_last_updated": "2025-01-10",
                "history": [
                    { "date": "2025-01-08", "rate": 12840.0 },
                    { "date": "2025-01-09", "rate": 12845.0 },
                    { "date": "2025-01-10", "rate": 12850.5 }
                ],
                "banks": [
                    { "name": "NBU", "buy": 12700, "sell": 12750, "featured": true },
                    { "name": "Kapitalbank", "buy": 12720, "sell": 12790, "logo": "https://example.com/k.png" },
                    { "name": "Hamkorbank", "buy": 12690, "sell": 0, "is_mock": true }
                ]
            },
            "weather": { "city": "Tashkent", "aqi": 42 },
            "news": { "last_updated": "N/A", "items": [] },
            "rub": null
        })
    }

    #[test]
    fn test_scope_parse_and_display() {
        assert_eq!("news".parse::<Scope>().unwrap(), Scope::News);
        assert_eq!(" Metals ".parse::<Scope>().unwrap(), Scope::Metals);
        assert!("all".parse::<Scope>().is_err());
        assert_eq!(Scope::default(), Scope::Exchange);
        assert_eq!(Scope::Reliability.to_string(), "reliability");
    }

    #[test]
    fn test_scope_serializes_lowercase() {
        let body = serde_json::to_value(json!({ "scope": Scope::Savings })).unwrap();
        assert_eq!(body, json!({ "scope": "savings" }));
    }

    #[test]
    fn test_environment_from_host() {
        assert_eq!(Environment::from_host("localhost"), Environment::LocalDev);
        assert_eq!(Environment::from_host("127.0.0.1"), Environment::LocalDev);
        assert_eq!(Environment::from_host("[::1]"), Environment::LocalDev);
        assert_eq!(Environment::from_host("app.localhost"), Environment::LocalDev);
        assert_eq!(Environment::from_host("brklyn498.github.io"), Environment::Deployed);
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::LocalDev);
        assert_eq!("Deployed".parse::<Environment>().unwrap(), Environment::Deployed);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_parse_keeps_key_order_and_numbers() {
        let raw = serde_json::to_vec(&sample()).unwrap();
        let snapshot = Snapshot::from_slice(&raw).unwrap();

        let keys: Vec<&str> = snapshot.keys().collect();
        assert_eq!(keys, vec!["last_updated", "usd", "weather", "news", "rub"]);

        let buy = &snapshot.section("usd").unwrap()["banks"][0]["buy"];
        assert!(buy.is_u64());
        assert_eq!(buy.as_u64(), Some(12700));

        let reencoded = serde_json::to_vec(&snapshot).unwrap();
        assert_eq!(reencoded, raw);
    }

    #[test]
    fn test_currency_views() {
        let snapshot = Snapshot::from_value(sample()).unwrap();
        let usd = snapshot.currency("usd").unwrap().unwrap();

        assert_eq!(usd.banks.len(), 3);
        assert_eq!(usd.bank("NBU").unwrap().sell, 12750.0);
        assert!(usd.bank("NBU").unwrap().featured);
        assert!(usd.bank("Hamkorbank").unwrap().is_mock);
        assert_eq!(usd.best_buy().unwrap().name, "Kapitalbank");
        assert_eq!(usd.best_sell().unwrap().name, "NBU");
        assert_eq!(usd.latest().unwrap().date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());

        assert!(snapshot.currency("rub").unwrap().is_none());
        assert!(snapshot.currency("gbp").unwrap().is_none());
        assert_eq!(snapshot.last_updated(), Some("2025-01-10 09:30"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(Snapshot::from_slice(b"[1, 2, 3]").is_err());
        assert!(Snapshot::from_slice(b"{ not json").is_err());
    }

    #[test]
    fn test_rejects_string_quotes() {
        let bad = json!({
            "usd": {
                "cbu": 12850.0,
                "cbu_last_updated": "2025-01-10",
                "history": [],
                "banks": [ { "name": "NBU", "buy": "12700", "sell": "12750" } ]
            }
        });
        assert!(Snapshot::from_value(bad).is_err());
    }

    #[test]
    fn test_duplicate_bank_names_are_tolerated() {
        let doc = json!({
            "eur": {
                "cbu": 13400.0,
                "cbu_last_updated": "2025-01-10",
                "banks": [
                    { "name": "NBU", "buy": 13300, "sell": 13500 },
                    { "name": "NBU", "buy": 13310, "sell": 13490 }
                ]
            }
        });
        let snapshot = Snapshot::from_value(doc).unwrap();
        let eur = snapshot.currency("eur").unwrap().unwrap();
        assert_eq!(eur.duplicate_bank_names(), vec!["NBU"]);
        assert!(eur.history.is_empty());
    }
}
