use crate::core::filter::{filter_combination, DeparturePreference};
use crate::core::ranking::{select_cheapest, Selection, DEFAULT_RESULTS_LIMIT};
use crate::core::report::{render_report, visible_offers, CombinationDiagnostic, ReportOptions};
use crate::core::search::{run_searches, CombinationResult, SearchPlan};
use crate::domain::ports::{Notifier, Pipeline, SearchProvider};
use crate::utils::error::Result;

/// 一次執行所需的全部設定，由 config 層解析後傳入
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub plan: SearchPlan,
    pub preferences: Vec<DeparturePreference>,
    pub results_limit: usize,
    pub report: ReportOptions,
    pub notify_on_empty: bool,
}

impl PipelineSettings {
    pub fn new(plan: SearchPlan) -> Self {
        Self {
            plan,
            preferences: Vec::new(),
            results_limit: DEFAULT_RESULTS_LIMIT,
            report: ReportOptions::default(),
            notify_on_empty: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub selection: Selection,
    pub diagnostics: Vec<CombinationDiagnostic>,
}

impl RankedResult {
    pub fn failures(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.failed()).count()
    }
}

pub struct FarePipeline<P: SearchProvider, N: Notifier> {
    settings: PipelineSettings,
    provider: P,
    notifier: N,
}

impl<P: SearchProvider, N: Notifier> FarePipeline<P, N> {
    pub fn new(settings: PipelineSettings, provider: P, notifier: N) -> Self {
        Self {
            settings,
            provider,
            notifier,
        }
    }
}

#[async_trait::async_trait]
impl<P: SearchProvider, N: Notifier> Pipeline for FarePipeline<P, N> {
    type Extracted = Vec<CombinationResult>;
    type Transformed = RankedResult;

    async fn extract(&self) -> Result<Vec<CombinationResult>> {
        run_searches(&self.settings.plan, &self.provider).await
    }

    async fn transform(&self, data: Vec<CombinationResult>) -> Result<RankedResult> {
        let mut diagnostics = Vec::with_capacity(data.len());
        let mut evaluated = Vec::new();

        for result in &data {
            let filtered = filter_combination(
                &result.query,
                &result.response.offers,
                &self.settings.preferences,
            );
            diagnostics.push(CombinationDiagnostic::new(result, &filtered));
            evaluated.extend(filtered.evaluated);
        }

        let selection = select_cheapest(evaluated, self.settings.results_limit);
        tracing::info!(
            "🔧 Ranked {} offers across {} combinations",
            selection.len(),
            diagnostics.len()
        );

        Ok(RankedResult {
            selection,
            diagnostics,
        })
    }

    async fn load(&self, result: RankedResult) -> Result<String> {
        let report = render_report(&result.selection, &result.diagnostics, &self.settings.report);

        let nothing_to_say = visible_offers(&result.selection, &self.settings.report).is_empty()
            && result.failures() == 0;
        if nothing_to_say && !self.settings.notify_on_empty {
            tracing::info!("📭 No qualifying offers; notification skipped");
            return Ok(report);
        }

        // 通知失敗只記錄，不影響這次搜尋的結果
        if let Err(e) = self.notifier.send(&report).await {
            tracing::warn!("⚠️ Failed to send notification: {}", e);
            tracing::warn!("💡 {}", e.recovery_suggestion());
        }

        Ok(report)
    }
}
