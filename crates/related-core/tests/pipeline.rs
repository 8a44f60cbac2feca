// related-core/tests/pipeline.rs
//! End-to-end runs over on-disk content trees with the hashing model.

use std::fs;
use std::path::Path;

use related_core::embedding::HASHING_MODEL;
use related_core::{
    load_corpus, output_path, EmbeddingConfig, EmbeddingModel, RelatedConfig, RelatedContentEngine,
    RelatedContentMap, RelatedError,
};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn page(title: &str, body: &str) -> String {
    format!("+++\ntitle = \"{}\"\n+++\n\n{}\n", title, body)
}

fn hashing_engine(config: RelatedConfig) -> RelatedContentEngine {
    RelatedContentEngine::new(
        config,
        EmbeddingConfig {
            model: HASHING_MODEL.to_string(),
            ..EmbeddingConfig::default()
        },
    )
    .unwrap()
}

fn site(content: &Path) {
    let en = content.join("en");
    write(&en, "_index.md", &page("Home", "Welcome to the documentation home page."));
    write(
        &en,
        "guides/_index.md",
        &page("Guides", "Guides for installing and configuring the toolchain setup."),
    );
    write(
        &en,
        "guides/setup.md",
        &page("Setup", "Installing and configuring the toolchain setup, step by step."),
    );
    write(&en, "guides/faq.md", &page("FAQ", "Frequently asked questions about billing and accounts."));
    write(&en, "blog/p1.md", &page("P1", "Rust ownership and borrowing explained with examples."));
    write(&en, "blog/p2.md", &page("P2", "Borrowing rules in Rust and how ownership moves."));
    write(&en, "blog/p3.md", &page("P3", "Async Rust with tokio runtimes and futures."));
    write(&en, "blog/p4.md", &page("P4", "Cooking pasta with fresh tomatoes and basil."));
    write(&en, "blog/p5.md", &page("P5", "Travel notes from a winter trip to the mountains."));
    write(
        &en,
        "author/jane.md",
        &page("Jane", "Jane writes about installing and configuring the toolchain setup."),
    );
}

fn read_map(path: &Path) -> RelatedContentMap {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_generates_mapping_for_language() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    let output = dir.path().join("data").join("related_content");
    site(&content);

    let engine = hashing_engine(RelatedConfig {
        exclusions: vec!["author".to_string()],
        ..RelatedConfig::default()
    });
    let report = engine
        .process_language("en", &content, &output, |_| {})
        .unwrap();

    assert_eq!(report.documents, 9);
    assert_eq!(report.excluded, 1);
    assert_eq!(report.subjects, 8);
    assert!(report.collisions.is_empty());
    assert_eq!(report.output.as_deref(), Some(output_path(&output, "en").as_path()));

    let map = read_map(&output.join("en.yaml"));
    assert_eq!(map.sections().collect::<Vec<_>>(), vec!["blog", "guides"]);

    let setup = map.get("guides", "setup").unwrap();
    assert_eq!(setup[0].file, "guides");

    let identities = [
        ("blog", "p1", "blog/p1"),
        ("blog", "p2", "blog/p2"),
        ("blog", "p3", "blog/p3"),
        ("blog", "p4", "blog/p4"),
        ("blog", "p5", "blog/p5"),
        ("guides", "guides", "guides"),
        ("guides", "setup", "guides/setup"),
        ("guides", "faq", "guides/faq"),
    ];
    for (section, slug, identity) in identities {
        let entries = map.get(section, slug).unwrap();
        assert_eq!(entries.len(), 3, "{}/{}", section, slug);
        for entry in entries {
            assert_ne!(entry.file, identity);
            assert!(!entry.file.starts_with("author"));
            assert_ne!(entry.file, "guides/_index");
        }
    }
}

#[test]
fn test_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    site(&content);
    let engine = hashing_engine(RelatedConfig::default());

    let first_dir = dir.path().join("first");
    let second_dir = dir.path().join("second");
    engine.process_language("en", &content, &first_dir, |_| {}).unwrap();
    engine.process_language("en", &content, &second_dir, |_| {}).unwrap();

    assert_eq!(
        fs::read(first_dir.join("en.yaml")).unwrap(),
        fs::read(second_dir.join("en.yaml")).unwrap()
    );
}

#[test]
fn test_text_after_cap_does_not_change_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let shared = "lorem ipsum dolor sit amet ".repeat(50);
    write(dir.path(), "blog/a.md", &format!("{} ending one", shared));
    write(dir.path(), "blog/b.md", &format!("{} a completely different ending", shared));

    let corpus = load_corpus(dir.path(), &RelatedConfig::default());
    let texts: Vec<&str> = corpus.documents.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(texts[0].chars().count(), 1000);
    assert_eq!(texts[0], texts[1]);

    let model = EmbeddingModel::new(EmbeddingConfig {
        model: HASHING_MODEL.to_string(),
        ..EmbeddingConfig::default()
    });
    let vectors = model.initialize().unwrap().embed_batch(&texts).unwrap();
    assert_eq!(vectors[0], vectors[1]);
}

#[test]
fn test_empty_corpus_writes_nothing_and_keeps_old_output() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    let output = dir.path().join("out");
    fs::create_dir_all(content.join("de")).unwrap();
    write(&output, "de.yaml", "blog: {}\n");

    let engine = hashing_engine(RelatedConfig::default());
    let report = engine.process_language("de", &content, &output, |_| {}).unwrap();

    assert_eq!(report.documents, 0);
    assert!(report.output.is_none());
    assert!(!engine.model.is_initialized());
    assert_eq!(fs::read_to_string(output.join("de.yaml")).unwrap(), "blog: {}\n");
}

#[test]
fn test_root_only_corpus_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    let output = dir.path().join("out");
    write(&content.join("fr"), "_index.md", &page("Accueil", "Bienvenue"));
    write(&content.join("fr"), "about.md", &page("A propos", "Qui sommes-nous"));

    let engine = hashing_engine(RelatedConfig::default());
    let report = engine.process_language("fr", &content, &output, |_| {}).unwrap();

    assert_eq!(report.documents, 2);
    assert_eq!(report.subjects, 0);
    assert!(report.output.is_none());
    assert!(!output.join("fr.yaml").exists());
}

#[test]
fn test_model_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    let output = dir.path().join("out");
    site(&content);

    let model = EmbeddingModel::from_loader("missing-model", || anyhow::bail!("no weights"));
    let engine = RelatedContentEngine::with_model(RelatedConfig::default(), model).unwrap();
    let err = engine
        .process_language("en", &content, &output, |_| {})
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RelatedError>(),
        Some(RelatedError::ModelLoad { .. })
    ));
    assert!(!output.join("en.yaml").exists());
}

#[test]
fn test_slug_collision_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    let output = dir.path().join("out");
    let en = content.join("en");
    write(&en, "blog/one.md", "+++\nslug = \"same\"\n+++\nFirst post about gardens");
    write(&en, "blog/two.md", "+++\nslug = \"same\"\n+++\nSecond post about gardens");
    write(&en, "blog/three.md", "Third post about gardens");

    let engine = hashing_engine(RelatedConfig::default());
    let report = engine.process_language("en", &content, &output, |_| {}).unwrap();

    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].kept, "blog/one.md");
    assert_eq!(report.collisions[0].dropped, "blog/two.md");

    let map = read_map(&output.join("en.yaml"));
    let entries = map.get("blog", "same").unwrap();
    assert!(entries.iter().all(|e| e.file != "blog/one"));
}

#[test]
fn test_failed_write_leaves_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    let output = dir.path().join("out");
    site(&content);
    write(&output, "en.yaml", "blog: {}\n");
    fs::create_dir_all(output.join(".en.yaml.tmp")).unwrap();

    let engine = hashing_engine(RelatedConfig::default());
    let result = engine.process_language("en", &content, &output, |_| {});

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(output.join("en.yaml")).unwrap(), "blog: {}\n");
}
