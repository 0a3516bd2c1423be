use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct FareEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> FareEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 依序執行 extract → transform → load，回傳報表內容
    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting fare search");

        let searched = self.pipeline.extract().await?;
        tracing::info!("📥 Search phase finished in {:?}", started.elapsed());

        let ranked = self.pipeline.transform(searched).await?;

        let report = self.pipeline.load(ranked).await?;
        tracing::info!("✅ Fare search completed in {:?}", started.elapsed());

        Ok(report)
    }
}
