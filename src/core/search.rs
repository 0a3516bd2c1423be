use crate::domain::model::SearchQuery;
use crate::domain::ports::{SearchProvider, SearchResponse};
use crate::utils::error::{FareError, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

/// 已解析的搜尋設定，產生 origin × destination × outbound × return 的所有組合
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub outbound_dates: Vec<NaiveDate>,
    /// 空集合代表只搜尋單程
    pub return_dates: Vec<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    pub currency: String,
    pub max_stops: Option<u32>,
    pub max_duration_hours: Option<f64>,
    pub max_results: u32,
    pub request_delay: Duration,
}

impl SearchPlan {
    /// 沒有任何組合可以搜尋時直接中止，不呼叫供應商
    pub fn ensure_runnable(&self) -> Result<()> {
        let required = [
            ("search.origins", self.origins.is_empty()),
            ("search.destinations", self.destinations.is_empty()),
            ("search.outbound_dates", self.outbound_dates.is_empty()),
        ];
        for (field, missing) in required {
            if missing {
                return Err(FareError::MissingConfigError {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn combinations(&self) -> Vec<SearchQuery> {
        let return_dates: Vec<Option<NaiveDate>> = if self.return_dates.is_empty() {
            vec![None]
        } else {
            self.return_dates.iter().copied().map(Some).collect()
        };

        let mut queries = Vec::new();
        for origin in &self.origins {
            for destination in &self.destinations {
                for departure_date in &self.outbound_dates {
                    for return_date in &return_dates {
                        queries.push(SearchQuery {
                            origin: origin.clone(),
                            destination: destination.clone(),
                            departure_date: *departure_date,
                            return_date: *return_date,
                            adults: self.adults,
                            children: self.children,
                            currency: self.currency.clone(),
                            max_stops: self.max_stops,
                            max_duration_hours: self.max_duration_hours,
                            max_results: self.max_results,
                        });
                    }
                }
            }
        }
        queries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinationResult {
    pub query: Arc<SearchQuery>,
    pub response: SearchResponse,
}

/// 依序呼叫供應商；單一組合失敗只會被記錄，不會中止其餘組合
pub async fn run_searches<P>(plan: &SearchPlan, provider: &P) -> Result<Vec<CombinationResult>>
where
    P: SearchProvider + ?Sized,
{
    plan.ensure_runnable()?;

    let queries = plan.combinations();
    let total = queries.len();
    tracing::info!("🔎 Searching {} combinations", total);

    let mut results = Vec::with_capacity(total);
    for (index, query) in queries.into_iter().enumerate() {
        if index > 0 && !plan.request_delay.is_zero() {
            tokio::time::sleep(plan.request_delay).await;
        }

        tracing::debug!("[{}/{}] Searching {}", index + 1, total, query.label());
        let response = provider.search(&query).await;

        match &response.error {
            None => tracing::debug!(
                "[{}/{}] {} returned {} offers",
                index + 1,
                total,
                query.label(),
                response.offers.len()
            ),
            Some(detail) => tracing::warn!(
                "⚠️ Search failed for {} (HTTP {}): {}",
                query.label(),
                response
                    .http_status
                    .map_or_else(|| "n/a".to_string(), |s| s.to_string()),
                detail
            ),
        }

        results.push(CombinationResult {
            query: Arc::new(query),
            response,
        });
    }

    Ok(results)
}
