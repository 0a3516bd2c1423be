use crate::adapters::amadeus::DEFAULT_AMADEUS_HOST;
use crate::adapters::telegram::DEFAULT_TELEGRAM_API;
use crate::core::filter::DeparturePreference;
use crate::core::pipeline::PipelineSettings;
use crate::core::ranking::DEFAULT_RESULTS_LIMIT;
use crate::core::report::ReportOptions;
use crate::core::search::SearchPlan;
use crate::utils::error::{FareError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    pub search: SearchSection,
    #[serde(default)]
    pub filters: FilterSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub notifier: NotifierSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub origins: Vec<String>,
    /// 單一目的地的簡寫，會併入 `destinations`
    pub destination: Option<String>,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub outbound_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub return_dates: Vec<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSection {
    pub max_stops: Option<u32>,
    pub max_total_duration_hours: Option<f64>,
    #[serde(default)]
    pub departure_preferences: Vec<DeparturePreference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_results_limit")]
    pub results_limit: usize,
    pub price_threshold: Option<f64>,
    #[serde(default = "default_true")]
    pub include_diagnostics: bool,
    #[serde(default = "default_max_diagnostic_lines")]
    pub max_diagnostic_lines: usize,
    #[serde(default = "default_max_error_chars")]
    pub max_error_chars: usize,
    #[serde(default = "default_true")]
    pub notify_on_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    #[serde(default = "default_provider_host")]
    pub host: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierSection {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    #[serde(default = "default_telegram_api")]
    pub telegram_api_base: String,
}

fn default_adults() -> u32 {
    1
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_max_results() -> u32 {
    50
}

fn default_request_delay_ms() -> u64 {
    200
}

fn default_title() -> String {
    "Fare report".to_string()
}

fn default_results_limit() -> usize {
    DEFAULT_RESULTS_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_max_diagnostic_lines() -> usize {
    10
}

fn default_max_error_chars() -> usize {
    200
}

fn default_provider_host() -> String {
    DEFAULT_AMADEUS_HOST.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            results_limit: default_results_limit(),
            price_threshold: None,
            include_diagnostics: true,
            max_diagnostic_lines: default_max_diagnostic_lines(),
            max_error_chars: default_max_error_chars(),
            notify_on_empty: true,
        }
    }
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            host: default_provider_host(),
            api_key: None,
            api_secret: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for NotifierSection {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_base: default_telegram_api(),
        }
    }
}

/// 空字串或未替換的 `${VAR}` 視為未設定
fn resolved(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with("${"))
}

impl FareConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FareError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FareError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AMADEUS_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FareError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 以環境變數覆蓋機密與主機設定
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("AMADEUS_HOST") {
            self.provider.host = host;
        }
        if let Some(key) = get("AMADEUS_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(secret) = get("AMADEUS_API_SECRET") {
            self.provider.api_secret = Some(secret);
        }
        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            self.notifier.telegram_bot_token = Some(token);
        }
        if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
            self.notifier.telegram_chat_id = Some(chat_id);
        }
    }

    pub fn destinations(&self) -> Vec<String> {
        let mut destinations = self.search.destinations.clone();
        if let Some(single) = &self.search.destination {
            if !destinations.contains(single) {
                destinations.insert(0, single.clone());
            }
        }
        destinations
    }

    pub fn credentials(&self) -> Result<(&str, &str)> {
        let key = resolved(&self.provider.api_key).ok_or_else(|| FareError::MissingConfigError {
            field: "provider.api_key (AMADEUS_API_KEY)".to_string(),
        })?;
        let secret =
            resolved(&self.provider.api_secret).ok_or_else(|| FareError::MissingConfigError {
                field: "provider.api_secret (AMADEUS_API_SECRET)".to_string(),
            })?;
        Ok((key, secret))
    }

    /// Telegram 需要 token 與 chat id 都有設定
    pub fn telegram(&self) -> Option<(&str, &str)> {
        Some((
            resolved(&self.notifier.telegram_bot_token)?,
            resolved(&self.notifier.telegram_chat_id)?,
        ))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_seconds)
    }

    pub fn search_plan(&self) -> SearchPlan {
        SearchPlan {
            origins: self.search.origins.clone(),
            destinations: self.destinations(),
            outbound_dates: self.search.outbound_dates.clone(),
            return_dates: self.search.return_dates.clone(),
            adults: self.search.adults,
            children: self.search.children,
            currency: self.search.currency.clone(),
            max_stops: self.filters.max_stops,
            max_duration_hours: self.filters.max_total_duration_hours,
            max_results: self.search.max_results,
            request_delay: Duration::from_millis(self.search.request_delay_ms),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            title: self.report.title.clone(),
            include_diagnostics: self.report.include_diagnostics,
            max_diagnostic_lines: self.report.max_diagnostic_lines,
            max_error_chars: self.report.max_error_chars,
            price_threshold: self.report.price_threshold,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            plan: self.search_plan(),
            preferences: self.filters.departure_preferences.clone(),
            results_limit: self.report.results_limit,
            report: self.report_options(),
            notify_on_empty: self.report.notify_on_empty,
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty("search.origins", &self.search.origins)?;
        for origin in &self.search.origins {
            validation::validate_code("search.origins", origin)?;
        }

        let destinations = self.destinations();
        validation::validate_non_empty("search.destinations", &destinations)?;
        for destination in &destinations {
            validation::validate_code("search.destinations", destination)?;
        }

        validation::validate_non_empty("search.outbound_dates", &self.search.outbound_dates)?;
        validation::validate_positive_number("search.adults", self.search.adults as usize, 1)?;
        validation::validate_positive_number("search.max_results", self.search.max_results as usize, 1)?;
        validation::validate_code("search.currency", &self.search.currency)?;

        if let Some(hours) = self.filters.max_total_duration_hours {
            validation::validate_positive_f64("filters.max_total_duration_hours", hours)?;
        }
        for pref in &self.filters.departure_preferences {
            validation::validate_code("filters.departure_preferences.origin", &pref.origin)?;
            validation::validate_range(
                "filters.departure_preferences.earliest_hour",
                pref.earliest_hour,
                0,
                23,
            )?;
        }

        validation::validate_positive_number("report.results_limit", self.report.results_limit, 1)?;
        validation::validate_positive_number(
            "report.max_diagnostic_lines",
            self.report.max_diagnostic_lines,
            1,
        )?;
        if let Some(threshold) = self.report.price_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(FareError::InvalidConfigValueError {
                    field: "report.price_threshold".to_string(),
                    value: threshold.to_string(),
                    reason: "Value must be a non-negative amount".to_string(),
                });
            }
        }

        validation::validate_url("provider.host", &self.provider.host)?;
        validation::validate_positive_number(
            "provider.timeout_seconds",
            self.provider.timeout_seconds as usize,
            1,
        )?;
        if self.telegram().is_some() {
            validation::validate_url("notifier.telegram_api_base", &self.notifier.telegram_api_base)?;
        }

        Ok(())
    }
}

impl Validate for FareConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
