use onboarding_buddy::config::{AppConfig, GraphBackend, VectorBackend};
use onboarding_buddy::embed::{Embedder, EmbeddingClient};
use onboarding_buddy::graph::MemoryDirectory;
use onboarding_buddy::ingest::IngestPipeline;
use onboarding_buddy::llm::LLMProvider;
use onboarding_buddy::vector::{MemoryVectorStore, SemanticSearch};
use onboarding_buddy::{build_services, MetadataFilter, PolicySearch};
use std::sync::Arc;

fn mock_config(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.graph.backend = GraphBackend::Memory;
    config.graph.seed_file = Some(dir.join("directory.json"));
    config.vector.backend = VectorBackend::Memory;
    config.vector.snapshot_path = Some(dir.join("state").join("vectors.json"));
    config.embedding.provider = LLMProvider::Mock;
    config.embedding.dimensions = 256;
    config.generation.provider = LLMProvider::Mock;
    config.generation.model = "mock".to_string();
    config
}

fn write_documents(dir: &std::path::Path) {
    std::fs::write(
        dir.join("leave.txt"),
        "Interns receive one paid leave day for every completed month. \
         Full-time employees receive twenty days of paid leave each year.",
    )
    .unwrap();
    std::fs::write(
        dir.join("STIPEND.TXT"),
        "The internship stipend is credited on the last working day of each month.",
    )
    .unwrap();
    std::fs::write(dir.join("README.md"), "not a policy").unwrap();
    std::fs::create_dir(dir.join("archive.txt")).unwrap();
}

#[tokio::test]
async fn test_ingest_directory_then_search() {
    let docs = tempfile::tempdir().unwrap();
    write_documents(docs.path());

    let embedder: Arc<dyn Embedder> = Arc::new(
        EmbeddingClient::new(&onboarding_buddy::config::EmbeddingConfig {
            provider: LLMProvider::Mock,
            dimensions: 256,
            ..Default::default()
        })
        .unwrap(),
    );
    let store = Arc::new(MemoryVectorStore::new());
    let registry = Arc::new(MemoryDirectory::default());

    let report = IngestPipeline::new(embedder.clone(), store.clone())
        .with_registry(registry.clone())
        .with_chunking(8, 4)
        .with_concurrency(2)
        .ingest_directory(docs.path())
        .await
        .unwrap();

    let names: Vec<&str> = report.documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, ["STIPEND.TXT", "leave.txt"]);
    assert_eq!(report.documents[0].policy_type, "STIPEND");
    // 13 words, windows of 8 every 4 words
    assert_eq!(report.documents[0].chunks, 4);
    let total: usize = report.documents.iter().map(|d| d.chunks).sum();
    assert_eq!(report.uploaded, total);
    assert_eq!(store.len().await, total);

    let documents = registry.documents().await;
    assert_eq!(documents.len(), 2);
    assert_eq!(documents["leave"].filename, "leave.txt");

    let search = SemanticSearch::new(embedder, store);
    let hits = search
        .search("when is the internship stipend credited", Some(&MetadataFilter::policy_type("STIPEND")))
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|c| c.source_file == "STIPEND.TXT"));
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let embedder: Arc<dyn Embedder> = Arc::new(
        EmbeddingClient::new(&onboarding_buddy::config::EmbeddingConfig {
            provider: LLMProvider::Mock,
            dimensions: 16,
            ..Default::default()
        })
        .unwrap(),
    );
    let pipeline = IngestPipeline::new(embedder, Arc::new(MemoryVectorStore::new()));
    let missing = tempfile::tempdir().unwrap().path().join("nope");
    assert!(pipeline.ingest_directory(&missing).await.is_err());
}

#[tokio::test]
async fn test_services_ingest_persist_and_answer() {
    let root = tempfile::tempdir().unwrap();
    let docs = root.path().join("documents");
    std::fs::create_dir(&docs).unwrap();
    write_documents(&docs);
    std::fs::write(
        root.path().join("directory.json"),
        r#"{ "employees": [{ "id": "EMP001", "name": "Asha", "employment_type": "intern" }] }"#,
    )
    .unwrap();

    let config = mock_config(root.path());
    let services = build_services(&config).await.unwrap();
    let report = services.ingest(&docs).await.unwrap();
    assert!(report.uploaded > 0);
    assert!(root.path().join("state").join("vectors.json").exists());

    let answer = services
        .orchestrator
        .answer_question("EMP001", "How many leave days do interns get?", true)
        .await
        .unwrap();
    assert_eq!(answer.answer, "[mock] grounded answer for: How many leave days do interns get?");
    let context = answer.debug_context.unwrap();
    assert!(!context.is_empty() && context.len() <= 5);

    // a fresh process sees the persisted vectors
    let reloaded = build_services(&config).await.unwrap();
    let again = reloaded
        .orchestrator
        .answer_question("EMP001", "How many leave days do interns get?", true)
        .await
        .unwrap();
    assert_eq!(again.debug_context.unwrap(), context);
}

#[tokio::test]
async fn test_reingest_across_restarts_keeps_one_copy() {
    let root = tempfile::tempdir().unwrap();
    let docs = root.path().join("documents");
    std::fs::create_dir(&docs).unwrap();
    write_documents(&docs);
    std::fs::write(
        root.path().join("directory.json"),
        r#"{ "employees": [{ "id": "EMP001", "name": "Asha", "employment_type": "intern" }] }"#,
    )
    .unwrap();
    let config = mock_config(root.path());

    let mut counts = Vec::new();
    let mut last = None;
    for _ in 0..3 {
        // each iteration is a fresh process reloading the snapshot
        let services = build_services(&config).await.unwrap();
        services.ingest(&docs).await.unwrap();
        counts.push(services.memory_store.as_ref().unwrap().len().await);
        last = Some(services);
    }
    assert_eq!(counts[0], counts[1]);
    assert_eq!(counts[1], counts[2]);

    let answer = last
        .unwrap()
        .orchestrator
        .answer_question("EMP001", "How many leave days do interns get?", true)
        .await
        .unwrap();
    let context = answer.debug_context.unwrap();
    let mut unique = context.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), context.len());
}
