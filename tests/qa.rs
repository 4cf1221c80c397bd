mod common;

use common::{ScriptedModel, StaticSource, pipelines_with};
use diagramsmith::pipeline::GenerationRequest;
use diagramsmith::progress::MemorySink;

#[tokio::test]
async fn answer_accumulates_all_fragments() {
    let model = ScriptedModel::new(&[&["The answer ", "is 42."]]);
    let source = StaticSource::new(Some("main"), "src/lib.rs", "# widget");
    let (_, qa) = pipelines_with(source, model.clone());

    let answer = qa
        .answer("acme", "widget", "What is the answer?", None, None)
        .await
        .unwrap();

    assert_eq!(answer, "The answer is 42.");
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn question_and_context_ride_in_one_message() {
    let model = ScriptedModel::new(&[&["ok"]]);
    let source = StaticSource::new(Some("main"), "src/lib.rs\ndocs/intro.md", "# widget docs");
    let (_, qa) = pipelines_with(source, model.clone());

    qa.answer("acme", "widget", "Where are the docs?", None, None)
        .await
        .unwrap();

    let prompt = model.prompts().pop().unwrap();
    assert!(prompt.contains("Answer the question based on the provided context."));
    assert!(prompt.contains("Question: Where are the docs?"));
    assert!(prompt.contains("File Tree:\nsrc/lib.rs\ndocs/intro.md"));
    assert!(prompt.contains("README:\n# widget docs"));
}

#[tokio::test]
async fn generation_and_qa_share_one_context_fetch() {
    let model = ScriptedModel::new(&[
        &["explained"],
        &["<component_mapping>m</component_mapping>"],
        &["flowchart TD"],
        &["answered"],
    ]);
    let source = StaticSource::new(Some("main"), "src/lib.rs", "# widget");
    let (generation, qa) = pipelines_with(source.clone(), model);

    let request = GenerationRequest {
        owner: "acme".into(),
        repo: "widget".into(),
        ..Default::default()
    };
    generation.run(&request, &MemorySink::new()).await.unwrap();
    qa.answer("acme", "widget", "anything?", None, None)
        .await
        .unwrap();

    assert_eq!(source.fetch_count(), 1);
}
