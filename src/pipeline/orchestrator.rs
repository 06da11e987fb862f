// file: src/pipeline/orchestrator.rs
// description: coordinates query embedding, index retrieval, normalization and analysis
// reference: linear search pipeline over injectable service handles

use crate::analysis::AnalysisGenerator;
use crate::config::{Config, SearchConfig};
use crate::embeddings::{EmbeddingProvider, init_embedder};
use crate::error::Result;
use crate::index::{VectorIndex, init_index};
use crate::models::CompanyRecord;
use crate::parser::ResultNormalizer;
use crate::pipeline::outcome::{PipelineOutput, PipelineStage, RunStats, StatusSignal};
use crate::pipeline::progress::StageObserver;
use crate::utils::{OperationTimer, Validator};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const SLOW_ANALYSIS_THRESHOLD: Duration = Duration::from_secs(30);

/// A service handle, or the reason it could not be constructed.
type Service<T> = std::result::Result<Arc<T>, String>;

#[derive(Default)]
struct RunState {
    companies: Vec<CompanyRecord>,
    analysis: Option<String>,
    retrieval_error: Option<String>,
    stats: RunStats,
}

/// Holds the process-wide embedder and index handles. Runs share them
/// read-only and keep no state between calls.
pub struct SearchPipeline {
    embedder: Service<dyn EmbeddingProvider>,
    index: Service<dyn VectorIndex>,
    analyzer: AnalysisGenerator,
    normalizer: ResultNormalizer,
    settings: SearchConfig,
}

impl SearchPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        analyzer: AnalysisGenerator,
        settings: SearchConfig,
    ) -> Self {
        Self::from_initialization(Ok(embedder), Ok(index), analyzer, settings)
    }

    /// Accepts construction results as-is; a failed handle is reported once
    /// here and every later run short-circuits with `StatusSignal::Unavailable`.
    pub fn from_initialization(
        embedder: Result<Arc<dyn EmbeddingProvider>>,
        index: Result<Arc<dyn VectorIndex>>,
        analyzer: AnalysisGenerator,
        settings: SearchConfig,
    ) -> Self {
        let embedder = embedder.map_err(|e| {
            error!("Embedding provider failed to initialize: {}", e);
            e.to_string()
        });
        let index = index.map_err(|e| {
            error!("Vector index client failed to initialize: {}", e);
            e.to_string()
        });

        if let (Ok(embedder), Ok(index)) = (&embedder, &index)
            && let Some(index_dimension) = index.dimension()
            && index_dimension != embedder.dimension()
        {
            warn!(
                "Embedding model {} produces {} dimensions but index {} expects {}",
                embedder.model_name(),
                embedder.dimension(),
                index.name(),
                index_dimension
            );
        }

        Self {
            embedder,
            index,
            analyzer,
            normalizer: ResultNormalizer::new(),
            settings,
        }
    }

    /// Builds every service from configuration.
    pub async fn initialize(config: &Config) -> Self {
        let embedder = init_embedder(&config.embedding).await;
        let index = init_index(&config.index).await;

        Self::from_initialization(
            embedder,
            index,
            AnalysisGenerator::from_config(&config.analysis),
            config.search.clone(),
        )
    }

    pub fn initialization_error(&self) -> Option<String> {
        let failures: Vec<&str> = [self.embedder.as_ref().err(), self.index.as_ref().err()]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        }
    }

    pub async fn run(&self, query: &str) -> PipelineOutput {
        self.run_observed(query, None).await
    }

    /// Always reaches `Done`; per-query failures are folded into the output.
    pub async fn run_observed(
        &self,
        query: &str,
        observer: Option<&dyn StageObserver>,
    ) -> PipelineOutput {
        let started = Instant::now();
        let mut state = RunState::default();

        let status = self.execute(query, &mut state, observer).await;

        state.stats.total_ms = started.elapsed().as_millis() as u64;
        enter(observer, PipelineStage::Done);
        info!(
            "Search finished with {:?}: {} companies in {} ms",
            status,
            state.companies.len(),
            state.stats.total_ms
        );

        PipelineOutput {
            query: query.to_string(),
            companies: state.companies,
            analysis: state.analysis,
            status,
            retrieval_error: state.retrieval_error,
            stats: state.stats,
        }
    }

    async fn execute(
        &self,
        query: &str,
        state: &mut RunState,
        observer: Option<&dyn StageObserver>,
    ) -> StatusSignal {
        enter(observer, PipelineStage::Idle);

        if Validator::validate_query(query).is_err() {
            return StatusSignal::EmptyQuery;
        }

        let (embedder, index) = match (&self.embedder, &self.index) {
            (Ok(embedder), Ok(index)) => (embedder, index),
            _ => {
                return StatusSignal::Unavailable(
                    self.initialization_error().unwrap_or_default(),
                );
            }
        };

        enter(observer, PipelineStage::Embedding);
        let timer = OperationTimer::new("embedding");
        let embedded = embedder.embed(query).await;
        state.stats.embedding_ms = timer.finish().as_millis() as u64;

        let vector = match embedded {
            Ok(vector) => vector,
            Err(e) => {
                warn!("{}", e);
                return StatusSignal::EmbeddingFailed(e.to_string());
            }
        };

        enter(observer, PipelineStage::Retrieving);
        let top_k = self.settings.top_k;
        let timer = OperationTimer::new("retrieval");
        let retrieved = index
            .search(&vector, top_k, &self.settings.namespace)
            .await;
        state.stats.retrieval_ms = timer.finish().as_millis() as u64;

        let mut matches = match retrieved {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Search failed, continuing with no matches: {}", e);
                state.retrieval_error = Some(e.to_string());
                Vec::new()
            }
        };

        if matches.len() > top_k {
            warn!(
                "Index returned {} matches for top_k {}, truncating",
                matches.len(),
                top_k
            );
            matches.truncate(top_k);
        }
        state.stats.matches_retrieved = matches.len();

        enter(observer, PipelineStage::Normalizing);
        state.companies = self.normalizer.normalize(&matches);
        state.stats.records_kept = state.companies.len();

        if state.companies.is_empty() {
            return StatusSignal::NoMatches;
        }

        enter(observer, PipelineStage::Analyzing);
        let timer = OperationTimer::new("analysis");
        let analysis = self.analyzer.analyze(query, &state.companies).await;
        timer.warn_if_slow(SLOW_ANALYSIS_THRESHOLD);
        state.stats.analysis_ms = timer.finish().as_millis() as u64;
        state.stats.analysis_invoked = true;
        state.analysis = Some(analysis);

        StatusSignal::Success
    }
}

fn enter(observer: Option<&dyn StageObserver>, stage: PipelineStage) {
    debug!("Pipeline stage: {:?}", stage);
    if let Some(observer) = observer {
        observer.on_stage(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ANALYSIS_ERROR_PREFIX, ChatCompletion};
    use crate::error::PipelineError;
    use crate::models::{NOT_AVAILABLE, RawMatch};
    use crate::pipeline::progress::StageLog;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeEmbedder {
        fn working() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::embedding(text, "model crashed"));
            }
            Ok(vec![0.25; 4])
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    struct FakeIndex {
        calls: AtomicUsize,
        matches: Vec<RawMatch>,
        failure: Option<String>,
        requests: Mutex<Vec<(usize, String)>>,
    }

    impl FakeIndex {
        fn returning(matches: Vec<RawMatch>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                matches,
                failure: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                matches: Vec::new(),
                failure: Some(message.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        async fn search(
            &self,
            _vector: &[f32],
            top_k: usize,
            namespace: &str,
        ) -> Result<Vec<RawMatch>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((top_k, namespace.to_string()));
            match &self.failure {
                Some(message) => Err(PipelineError::Query(message.clone())),
                None => Ok(self.matches.clone()),
            }
        }

        fn dimension(&self) -> Option<usize> {
            Some(4)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct FakeChat {
        calls: AtomicUsize,
        failure: Option<String>,
    }

    impl FakeChat {
        fn echoing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failure: None,
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failure: Some(message.to_string()),
            })
        }
    }

    #[async_trait]
    impl ChatCompletion for FakeChat {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(message) => Err(PipelineError::Analysis(message.clone())),
                None => Ok(format!("Comparative analysis for prompt: {}", user)),
            }
        }

        fn model(&self) -> &str {
            "fake-chat"
        }
    }

    fn company_match(ticker: &str, name: &str, score: f32) -> RawMatch {
        let metadata = match json!({
            "Ticker": ticker,
            "Name": name,
            "Business Summary": format!("{} designs and operates data centers.", name),
            "City": "Ashburn",
            "State": "VA",
            "Country": "United States",
            "Industry": "REIT - Specialty",
            "Sector": "Real Estate"
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        RawMatch::new(ticker, score, Some(metadata))
    }

    fn pipeline(
        embedder: Arc<FakeEmbedder>,
        index: Arc<FakeIndex>,
        chat: Arc<FakeChat>,
    ) -> SearchPipeline {
        SearchPipeline::new(
            embedder,
            index,
            AnalysisGenerator::new(chat, "New York Stock Exchange (NYSE)"),
            SearchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_data_center_query_returns_ranked_companies_and_analysis() {
        let embedder = FakeEmbedder::working();
        let index = FakeIndex::returning(vec![
            company_match("EQIX", "Equinix", 0.93),
            company_match("DLR", "Digital Realty Trust", 0.89),
        ]);
        let chat = FakeChat::echoing();
        let log = StageLog::new();

        let output = pipeline(embedder.clone(), index.clone(), chat.clone())
            .run_observed("companies that build data centers", Some(&log))
            .await;

        assert_eq!(output.status, StatusSignal::Success);
        assert_eq!(
            output
                .companies
                .iter()
                .map(|c| c.ticker.as_str())
                .collect::<Vec<_>>(),
            vec!["EQIX", "DLR"]
        );
        let analysis = output.analysis.unwrap();
        assert!(analysis.contains("Equinix"));
        assert!(analysis.contains("Digital Realty Trust"));
        assert_eq!(
            log.stages(),
            vec![
                PipelineStage::Idle,
                PipelineStage::Embedding,
                PipelineStage::Retrieving,
                PipelineStage::Normalizing,
                PipelineStage::Analyzing,
                PipelineStage::Done,
            ]
        );
        assert_eq!(
            index.requests.lock().unwrap().clone(),
            vec![(5, "stock-descriptions".to_string())]
        );
        assert!(output.stats.analysis_invoked);
        assert_eq!(output.stats.matches_retrieved, 2);
        assert_eq!(output.stats.records_kept, 2);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let embedder = FakeEmbedder::working();
        let index = FakeIndex::returning(vec![company_match("EQIX", "Equinix", 0.9)]);
        let chat = FakeChat::echoing();
        let log = StageLog::new();

        let output = pipeline(embedder.clone(), index.clone(), chat.clone())
            .run_observed("", Some(&log))
            .await;

        assert_eq!(output.status, StatusSignal::EmptyQuery);
        assert!(output.companies.is_empty());
        assert!(output.analysis.is_none());
        assert_eq!(log.stages(), vec![PipelineStage::Idle, PipelineStage::Done]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_matches_skips_analysis() {
        let chat = FakeChat::echoing();

        let output = pipeline(
            FakeEmbedder::working(),
            FakeIndex::returning(Vec::new()),
            chat.clone(),
        )
        .run("quantum computing startups")
        .await;

        assert_eq!(output.status, StatusSignal::NoMatches);
        assert!(output.analysis.is_none());
        assert!(output.retrieval_error.is_none());
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
        assert!(!output.stats.analysis_invoked);
    }

    #[tokio::test]
    async fn test_matches_without_metadata_count_as_no_matches() {
        let chat = FakeChat::echoing();
        let index = FakeIndex::returning(vec![
            RawMatch::new("A", 0.9, None),
            RawMatch::new("B", 0.8, Some(Map::new())),
        ]);

        let output = pipeline(FakeEmbedder::working(), index, chat.clone())
            .run("anything")
            .await;

        assert_eq!(output.status, StatusSignal::NoMatches);
        assert_eq!(output.stats.matches_retrieved, 2);
        assert_eq!(output.stats.records_kept, 0);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_auth_error_becomes_analysis_text() {
        let chat = FakeChat::failing("401 Unauthorized: invalid api key");
        let index = FakeIndex::returning(vec![company_match("EQIX", "Equinix", 0.9)]);

        let output = pipeline(FakeEmbedder::working(), index, chat)
            .run("companies that build data centers")
            .await;

        assert_eq!(output.status, StatusSignal::Success);
        assert_eq!(
            output.analysis.as_deref(),
            Some("Error generating analysis: 401 Unauthorized: invalid api key")
        );
        assert!(output.analysis.unwrap().starts_with(ANALYSIS_ERROR_PREFIX));
    }

    #[tokio::test]
    async fn test_result_set_never_exceeds_top_k() {
        let matches: Vec<RawMatch> = (0..8)
            .map(|i| {
                company_match(
                    &format!("T{}", i),
                    &format!("Company {}", i),
                    1.0 - i as f32 / 10.0,
                )
            })
            .collect();
        let settings = SearchConfig {
            top_k: 3,
            ..SearchConfig::default()
        };
        let search = SearchPipeline::new(
            FakeEmbedder::working(),
            FakeIndex::returning(matches),
            AnalysisGenerator::new(FakeChat::echoing(), "NYSE"),
            settings,
        );

        let output = search.run("chip makers").await;

        assert_eq!(output.companies.len(), 3);
        assert_eq!(output.companies[0].ticker, "T0");
        assert_eq!(output.companies[2].ticker, "T2");
    }

    #[tokio::test]
    async fn test_embedding_failure_stops_before_retrieval() {
        let index = FakeIndex::returning(vec![company_match("EQIX", "Equinix", 0.9)]);
        let chat = FakeChat::echoing();

        let output = pipeline(FakeEmbedder::failing(), index.clone(), chat.clone())
            .run("data centers")
            .await;

        match &output.status {
            StatusSignal::EmbeddingFailed(cause) => assert!(cause.contains("model crashed")),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(output.companies.is_empty());
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_but_is_recorded() {
        let chat = FakeChat::echoing();

        let output = pipeline(
            FakeEmbedder::working(),
            FakeIndex::failing("connection reset"),
            chat.clone(),
        )
        .run("data centers")
        .await;

        assert_eq!(output.status, StatusSignal::NoMatches);
        assert!(output.retrieval_error.unwrap().contains("connection reset"));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialization_failure_blocks_every_run() {
        let embedder = FakeEmbedder::working();
        let chat = FakeChat::echoing();
        let embedder_handle: Arc<dyn EmbeddingProvider> = embedder.clone();
        let search = SearchPipeline::from_initialization(
            Ok(embedder_handle),
            Err(PipelineError::Initialization(
                "Pinecone API key is not set".to_string(),
            )),
            AnalysisGenerator::new(chat.clone(), "NYSE"),
            SearchConfig::default(),
        );

        assert!(search.initialization_error().is_some());

        for _ in 0..2 {
            let output = search.run("data centers").await;
            match output.status {
                StatusSignal::Unavailable(cause) => assert!(cause.contains("Pinecone API key")),
                other => panic!("unexpected status {:?}", other),
            }
        }
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_surface_as_not_available() {
        let mut metadata = Map::new();
        metadata.insert("Name".to_string(), json!("Vertiv"));
        let index = FakeIndex::returning(vec![RawMatch::new("VRT", 0.8, Some(metadata))]);

        let output = pipeline(FakeEmbedder::working(), index, FakeChat::echoing())
            .run("data center cooling")
            .await;

        let record = &output.companies[0];
        assert_eq!(record.name, "Vertiv");
        assert_eq!(record.ticker, NOT_AVAILABLE);
        assert_eq!(record.sector, NOT_AVAILABLE);
    }
}
