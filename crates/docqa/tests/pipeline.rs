//! End-to-end tests of the question answering pipeline with mock services

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docqa::{
    config::RagConfig,
    providers::{EmbeddingProvider, HashingEmbedder, LlmProvider},
    DocumentIndex, Error, Result, Session, MISSING_DOCUMENT_MESSAGE,
};

const WARRANTY_DOC: &str =
    "The warranty period is 12 months from purchase date. Returns are accepted within 30 days.";

/// Deterministic embedder that counts calls and can be told to fail
struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingEmbedder {
    fn working() -> Self {
        Self {
            inner: HashingEmbedder::new(128).unwrap(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::working()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("embedding service unavailable"));
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Answers "12 months" when the warranty clause is in the prompt
struct ScriptedLlm {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedLlm {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.fail {
            return Err(Error::generation("model overloaded"));
        }
        if prompt.contains("12 months from purchase date") {
            Ok("12 months".to_string())
        } else {
            Ok("I don't know.".to_string())
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

fn session(embedder: Arc<CountingEmbedder>, llm: Arc<ScriptedLlm>) -> Session {
    Session::with_providers(RagConfig::default(), embedder, llm).unwrap()
}

#[tokio::test]
async fn test_warranty_question_end_to_end() {
    let embedder = Arc::new(CountingEmbedder::working());
    let llm = Arc::new(ScriptedLlm::new());
    let session = session(embedder.clone(), llm.clone());

    let index = session.build_index(WARRANTY_DOC).await.unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.chunks().next().unwrap().content, WARRANTY_DOC);

    let state = session
        .ask_with_context(&index, "How long is the warranty?")
        .await
        .unwrap();
    assert_eq!(state.context().unwrap(), &[WARRANTY_DOC.to_string()]);
    assert_eq!(state.answer(), Some("12 months"));

    let answer = session
        .ask(Some(&index), "How long is the warranty?")
        .await
        .unwrap();
    assert_eq!(answer, "12 months");
}

#[tokio::test]
async fn test_missing_document_returns_guard_message() {
    let embedder = Arc::new(CountingEmbedder::working());
    let llm = Arc::new(ScriptedLlm::new());
    let session = session(embedder.clone(), llm.clone());

    let answer = session.ask(None, "anything").await.unwrap();

    assert_eq!(answer, MISSING_DOCUMENT_MESSAGE);
    assert_eq!(answer, "Please upload a contract PDF.");
    assert_eq!(embedder.calls(), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_embedding_failure_produces_no_index() {
    let embedder = Arc::new(CountingEmbedder::failing());
    let llm = Arc::new(ScriptedLlm::new());
    let session = session(embedder.clone(), llm.clone());

    let result = session.build_index(WARRANTY_DOC).await;

    let err = result.unwrap_err();
    assert!(err.is_embedding_failure());
    assert_eq!(embedder.calls(), 1);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_same_question_twice_gives_same_answer() {
    let embedder = Arc::new(CountingEmbedder::working());
    let llm = Arc::new(ScriptedLlm::new());
    let session = session(embedder, llm.clone());

    let first_index = session.build_index(WARRANTY_DOC).await.unwrap();
    let first = session.ask(Some(&first_index), "How long is the warranty?").await.unwrap();

    let second_index = session.build_index(WARRANTY_DOC).await.unwrap();
    let second = session.ask(Some(&second_index), "How long is the warranty?").await.unwrap();

    assert_eq!(first, second);
    let prompts = llm.prompts.lock();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn test_identical_chunk_ranks_first() {
    let embedder = HashingEmbedder::new(256).unwrap();
    let question = "Who is responsible for roof repairs?";
    let chunks = vec![
        docqa::Chunk::new(0, "Rent is payable on the first of each month.".to_string(), 0, 44),
        docqa::Chunk::new(1, "Pets require written approval.".to_string(), 44, 74),
        docqa::Chunk::new(2, question.to_string(), 74, 110),
        docqa::Chunk::new(3, "The deposit is two months of rent.".to_string(), 110, 144),
    ];
    let index = DocumentIndex::build(&embedder, chunks).await.unwrap();

    let results = index.query(&embedder, question, 4).await.unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].chunk.content, question);
    for pair in results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn test_single_chunk_index_always_answers_with_it() {
    let embedder = HashingEmbedder::new(64).unwrap();
    let chunks = vec![docqa::Chunk::new(0, "Only clause.".to_string(), 0, 12)];
    let index = DocumentIndex::build(&embedder, chunks).await.unwrap();

    for question in ["Only clause?", "zebra migration patterns", "12345"] {
        let results = index.query(&embedder, question, 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.index, 0);
    }
}

#[tokio::test]
async fn test_generation_failure_keeps_index_usable() {
    let embedder = Arc::new(CountingEmbedder::working());
    let failing = Session::with_providers(
        RagConfig::default(),
        embedder.clone(),
        Arc::new(ScriptedLlm::failing()),
    )
    .unwrap();

    let index = failing.build_index(WARRANTY_DOC).await.unwrap();
    let err = failing
        .ask(Some(&index), "How long is the warranty?")
        .await
        .unwrap_err();
    assert!(err.is_generation_failure());
    assert!(!err.is_embedding_failure());

    let working = session(embedder, Arc::new(ScriptedLlm::new()));
    let answer = working
        .ask(Some(&index), "How long is the warranty?")
        .await
        .unwrap();
    assert_eq!(answer, "12 months");
}

#[tokio::test]
async fn test_long_document_retrieves_top_k_chunks() {
    let embedder = Arc::new(CountingEmbedder::working());
    let llm = Arc::new(ScriptedLlm::new());
    let session = session(embedder, llm.clone());

    let filler = "This section describes general obligations of both parties. ".repeat(40);
    let text = format!("{}{}", filler, WARRANTY_DOC);
    let index = session.build_index(&text).await.unwrap();
    assert!(index.len() > 4);

    let state = session
        .ask_with_context(&index, "How long is the warranty period from purchase date?")
        .await
        .unwrap();

    let context = state.context().unwrap();
    assert_eq!(context.len(), 4);
    assert!(context[0].contains("warranty"));
}

#[tokio::test]
async fn test_whitespace_document_answers_without_context() {
    let embedder = Arc::new(CountingEmbedder::working());
    let llm = Arc::new(ScriptedLlm::new());
    let session = session(embedder.clone(), llm.clone());

    let index = session.build_index(" \n\t \n").await.unwrap();
    assert!(index.is_empty());

    let state = session.ask_with_context(&index, "Anything?").await.unwrap();
    assert!(state.context().unwrap().is_empty());
    assert_eq!(state.answer(), Some("I don't know."));
    assert_eq!(embedder.calls(), 0);
    assert_eq!(llm.calls(), 1);
}
