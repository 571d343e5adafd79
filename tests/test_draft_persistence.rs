// ABOUTME: Draft persistence tests - filesystem store, debounce, resume

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use listwise::assist::{
    GenerationBackend, GenerationError, GenerationRequest, GenerationResponse,
};
use listwise::backend::{ListingBackend, SubmitError, SubmitReceipt};
use listwise::config::EngineConfig;
use listwise::draft::{DraftStore, DraftWriter, FsDraftStore};
use listwise::wizard::{StepDescriptor, StepRegistry, WizardController, WizardSession};

struct NullGeneration;

#[async_trait]
impl GenerationBackend for NullGeneration {
    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        Err(GenerationError::Service {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

struct AcceptingBackend;

#[async_trait]
impl ListingBackend for AcceptingBackend {
    async fn submit_listing(
        &self,
        _form_data: &listwise::wizard::FormData,
    ) -> Result<SubmitReceipt, SubmitError> {
        Ok(SubmitReceipt {
            id: "lst_1".to_string(),
        })
    }
}

fn two_step_flow() -> StepRegistry {
    StepRegistry::new(vec![
        StepDescriptor::form("basics", "Basics", ["title"]),
        StepDescriptor::review("review", "Review"),
    ])
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_writer_debounces_onto_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsDraftStore::new(dir.path().join("drafts")));
    let writer = DraftWriter::spawn(store.clone(), Duration::from_millis(500));

    let mut session = WizardSession::new();
    session.set_field("title", json!("Townhouse"));
    writer.schedule_save(session.snapshot());
    session.set_field("title", json!("Townhouse with patio"));
    writer.schedule_save(session.snapshot());

    tokio::time::sleep(Duration::from_millis(600)).await;

    let record = store.load(session.draft_id).unwrap().unwrap();
    assert_eq!(
        record.form_data.get("title"),
        Some(&json!("Townhouse with patio"))
    );
}

#[tokio::test]
async fn test_controller_flow_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsDraftStore::new(dir.path().join("drafts")));
    let config = EngineConfig::default();

    let draft_id = {
        let mut controller = WizardController::new(
            two_step_flow(),
            &config,
            store.clone(),
            Arc::new(NullGeneration),
            Arc::new(AcceptingBackend),
        );
        controller.update_field("title", json!("Townhouse"));
        controller.go_next();
        controller.flush_draft().await.unwrap();
        controller.draft_id()
        // Controller dropped here, like a process exit
    };

    let restored = WizardController::resume(
        draft_id,
        two_step_flow(),
        &config,
        store,
        Arc::new(NullGeneration),
        Arc::new(AcceptingBackend),
    )
    .unwrap();

    assert_eq!(restored.current_index(), 1);
    assert_eq!(restored.field("title"), Some(&json!("Townhouse")));
    assert_eq!(restored.progress(), 0.5);
}

#[tokio::test]
async fn test_submitted_flow_removes_draft_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsDraftStore::new(dir.path().join("drafts")));

    let mut controller = WizardController::new(
        two_step_flow(),
        &EngineConfig::default(),
        store.clone(),
        Arc::new(NullGeneration),
        Arc::new(AcceptingBackend),
    );
    controller.update_field("title", json!("Townhouse"));
    controller.go_next();
    controller.go_next();
    controller.flush_draft().await.unwrap();
    assert!(store.load(controller.draft_id()).unwrap().is_some());

    controller.submit().await;
    controller.flush_draft().await.unwrap();

    assert!(store.load(controller.draft_id()).unwrap().is_none());
}
