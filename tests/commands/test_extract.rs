//! Tests for extract command

use std::path::PathBuf;

use tempfile::tempdir;
use txt2kg::commands::{collect_documents, ingest, SourceDocument};
use txt2kg::{DocKey, KgExtractor, KnowledgeStore, LanguageModel};

struct FixedLlm(&'static str);

impl LanguageModel for FixedLlm {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn complete(&self, _prompt: &str) -> txt2kg::Result<String> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_extract_directory_and_jsonl_into_one_store() {
    let dir = tempdir().expect("tempdir");
    let corpus = dir.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("01.txt"), "Paris is the capital of France.").unwrap();
    std::fs::write(corpus.join("02.txt"), "Berlin is the capital of Germany.").unwrap();

    let jsonl = dir.path().join("qa.jsonl");
    std::fs::write(
        &jsonl,
        "{\"text\": \"Rome is in Italy.\", \"question\": \"Where is Rome?\", \"answer\": \"Italy\"}\n",
    )
    .unwrap();

    let docs = collect_documents(&[corpus], Some(&jsonl)).unwrap();
    assert_eq!(docs.len(), 3);

    let output = dir.path().join("kg.json");
    let mut kg = KgExtractor::new(FixedLlm("('x', 'rel', 'y')"), 512);
    let summary = ingest(&mut kg, docs, &output).await.unwrap();

    assert_eq!(summary.documents, 3);
    assert_eq!(summary.triples, 3);

    let store = KnowledgeStore::from_file(&output).unwrap();
    assert!(store.contains_key(&DocKey::Id(0)));
    assert!(store.contains_key(&DocKey::Id(1)));
    assert!(store.contains_key(&DocKey::qa("Where is Rome?", "Italy")));
    assert_eq!(store.next_doc_id(), 3);
}

#[tokio::test]
async fn test_extract_resume_continues_numbering() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("kg.json");

    let first = vec![SourceDocument {
        label: "a".into(),
        text: "first".into(),
        qa: None,
    }];
    let mut kg = KgExtractor::new(FixedLlm("('a', 'r', 'b')"), 512);
    ingest(&mut kg, first, &output).await.unwrap();

    let resumed = KnowledgeStore::from_file(&output).unwrap();
    let mut kg = KgExtractor::new(FixedLlm("('c', 'r', 'd')"), 512).with_store(resumed);
    let second = vec![SourceDocument {
        label: "b".into(),
        text: "second".into(),
        qa: None,
    }];
    let summary = ingest(&mut kg, second, &output).await.unwrap();

    assert_eq!(summary.keys, vec![DocKey::Id(1)]);
    assert_eq!(KnowledgeStore::from_file(&output).unwrap().len(), 2);
}

/// Fails every chunk containing `fail_on`.
struct FlakyLlm {
    fail_on: Option<&'static str>,
}

impl LanguageModel for FlakyLlm {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn complete(&self, prompt: &str) -> txt2kg::Result<String> {
        if let Some(marker) = self.fail_on {
            if prompt.contains(marker) {
                return Err(txt2kg::Error::LlmError("503 upstream".to_string()));
            }
        }
        Ok("('s', 'r', 'o')".to_string())
    }
}

fn mixed_documents() -> Vec<SourceDocument> {
    let plain = |label: &str, text: &str| SourceDocument {
        label: label.into(),
        text: text.into(),
        qa: None,
    };
    let qa = |label: &str, text: &str, q: &str, a: &str| SourceDocument {
        label: label.into(),
        text: text.into(),
        qa: Some((q.into(), a.into())),
    };
    vec![
        plain("notes/a.txt", "alpha"),
        qa("qa.jsonl:1", "first answer", "Q1", "A1"),
        qa("qa.jsonl:2", "second answer", "Q2", "A2"),
        plain("notes/b.txt", "beta"),
    ]
}

#[tokio::test]
async fn test_extract_resume_after_failure_stores_each_document_once() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("kg.json");

    let mut kg = KgExtractor::new(
        FlakyLlm {
            fail_on: Some("second answer"),
        },
        512,
    );
    let err = ingest(&mut kg, mixed_documents(), &output).await.unwrap_err();
    assert!(format!("{err:#}").contains("qa.jsonl:2"));
    assert_eq!(KnowledgeStore::from_file(&output).unwrap().len(), 2);

    let saved = KnowledgeStore::from_file(&output).unwrap();
    let mut kg = KgExtractor::new(FlakyLlm { fail_on: None }, 512).with_store(saved);
    let summary = ingest(&mut kg, mixed_documents(), &output).await.unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.documents, 2);

    let store = KnowledgeStore::from_file(&output).unwrap();
    assert_eq!(store.len(), 4);
    let keys: Vec<DocKey> = store.keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            DocKey::Id(0),
            DocKey::Id(3),
            DocKey::qa("Q1", "A1"),
            DocKey::qa("Q2", "A2"),
        ]
    );
    for doc in mixed_documents() {
        assert!(store.source_key(&doc.label).is_some(), "{}", doc.label);
    }
}

#[tokio::test]
async fn test_extract_rerun_of_finished_output_is_a_no_op() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("kg.json");

    let mut kg = KgExtractor::new(FlakyLlm { fail_on: None }, 512);
    ingest(&mut kg, mixed_documents(), &output).await.unwrap();
    let first = KnowledgeStore::from_file(&output).unwrap();

    // any model call now would fail
    let mut kg = KgExtractor::new(FlakyLlm { fail_on: Some("") }, 512).with_store(first.clone());
    let summary = ingest(&mut kg, mixed_documents(), &output).await.unwrap();

    assert_eq!(summary.skipped, 4);
    assert_eq!(summary.documents, 0);
    assert_eq!(KnowledgeStore::from_file(&output).unwrap(), first);
}

#[tokio::test]
async fn test_extract_duplicate_qa_stops_run() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("kg.json");
    let qa = Some(("Q?".to_string(), "A".to_string()));

    let docs = vec![
        SourceDocument {
            label: "first".into(),
            text: "one".into(),
            qa: qa.clone(),
        },
        SourceDocument {
            label: "again".into(),
            text: "two".into(),
            qa,
        },
    ];

    let mut kg = KgExtractor::new(FixedLlm("('a', 'r', 'b')"), 512);
    let err = ingest(&mut kg, docs, &output).await.unwrap_err();

    assert!(format!("{err:#}").contains("already present"));
    let store = KnowledgeStore::from_file(&output).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get(&DocKey::qa("Q?", "A")).map(<[_]>::len),
        Some(1)
    );
}

#[test]
fn test_extract_missing_input_errors() {
    let missing = PathBuf::from("/definitely/not/here.txt");
    assert!(collect_documents(&[missing], None).is_err());
}
