use crate::core::report::truncate_chars;
use crate::domain::model::SearchQuery;
use crate::domain::ports::{SearchProvider, SearchResponse};
use crate::utils::error::{FareError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_AMADEUS_HOST: &str = "https://api.amadeus.com";

const MAX_ERROR_DETAIL_CHARS: usize = 500;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Amadeus Self-Service flight offers API
pub struct AmadeusProvider {
    client: Client,
    host: String,
    token: String,
}

impl AmadeusProvider {
    /// 以 client credentials 取得 access token；每次執行只取一次
    pub async fn authenticate(
        host: &str,
        api_key: &str,
        api_secret: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let host = host.trim_end_matches('/').to_string();
        let url = format!("{}/v1/security/oauth2/token", host);

        tracing::debug!("Requesting access token from: {}", url);
        let response = client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", api_key),
                ("client_secret", api_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FareError::AuthError {
                message: format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    truncate_chars(&error_detail(&body), MAX_ERROR_DETAIL_CHARS)
                ),
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!("🔑 Authenticated with {}", host);
        Ok(Self::with_token(client, host, token.access_token))
    }

    pub fn with_token(client: Client, host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn query_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("originLocationCode", query.origin.clone()),
            ("destinationLocationCode", query.destination.clone()),
            ("departureDate", query.departure_date.format("%Y-%m-%d").to_string()),
        ];
        if let Some(return_date) = query.return_date {
            params.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
        }
        params.push(("adults", query.adults.to_string()));
        if query.children > 0 {
            params.push(("children", query.children.to_string()));
        }
        params.push(("currencyCode", query.currency.clone()));
        params.push(("max", query.max_results.to_string()));
        if query.max_stops == Some(0) {
            params.push(("nonStop", "true".to_string()));
        }
        params
    }
}

/// 從錯誤回應中取出可讀的訊息，優先使用 `errors[0]`
fn error_detail(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let first_error = parsed
        .as_ref()
        .and_then(|json| json.get("errors"))
        .and_then(|errors| errors.as_array())
        .and_then(|errors| errors.first());

    if let Some(error) = first_error {
        let text = |key: &str| error.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let code = error
            .get("code")
            .map(|c| c.as_str().map_or_else(|| c.to_string(), str::to_string));
        let message = text("detail").or_else(|| text("title"));
        return match (code, message) {
            (Some(code), Some(message)) => format!("[{}] {}", code, message),
            (None, Some(message)) => message,
            (Some(code), None) => format!("[{}]", code),
            (None, None) => error.to_string(),
        };
    }

    if let Some(description) = parsed
        .as_ref()
        .and_then(|json| json.get("error_description"))
        .and_then(|v| v.as_str())
    {
        return description.to_string();
    }

    body.trim().to_string()
}

#[async_trait::async_trait]
impl SearchProvider for AmadeusProvider {
    async fn search(&self, query: &SearchQuery) -> SearchResponse {
        let url = format!("{}/v2/shopping/flight-offers", self.host);
        let params = Self::query_params(query);

        tracing::debug!("Making API request to: {} for {}", url, query.label());
        let response = match self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SearchResponse::failure(None, e.to_string()),
        };

        let status = response.status().as_u16();
        tracing::debug!("API response status: {}", status);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return SearchResponse::failure(Some(status), e.to_string()),
        };

        if !(200..300).contains(&status) {
            return SearchResponse::failure(
                Some(status),
                truncate_chars(&error_detail(&body), MAX_ERROR_DETAIL_CHARS),
            );
        }

        let json: serde_json::Value = match serde_json::from_str(&body) {
            Ok(json) => json,
            Err(e) => {
                return SearchResponse::failure(Some(status), format!("invalid JSON body: {}", e))
            }
        };

        // 2xx 也可能帶著供應商錯誤
        if json
            .get("errors")
            .and_then(|e| e.as_array())
            .is_some_and(|e| !e.is_empty())
        {
            return SearchResponse::failure(
                Some(status),
                truncate_chars(&error_detail(&body), MAX_ERROR_DETAIL_CHARS),
            );
        }

        let offers = json
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();
        SearchResponse::success(status, offers)
    }
}
