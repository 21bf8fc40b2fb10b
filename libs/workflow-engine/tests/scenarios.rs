//! End-to-end scenario coverage spanning the pipeline engine, the state
//! machine engine, and the workflow-call/sub-workflow coordinator together,
//! rather than any one collaborator in isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use wovra_domain::workflow::{TransitionDefinition, WorkflowDefinition};
use wovra_engine::app::{AppHandle, PipelineRegistry, PluginRegistry};
use wovra_engine::context::PipelineContext;
use wovra_engine::external::ServiceRegistry;
use wovra_engine::machine::{StateMachineEngine, WorkflowEngineConfig};
use wovra_engine::pipeline::Pipeline;
use wovra_engine::step::{PipelineStep, StepError, StepResult};
use wovra_engine::steps::set::factory as set_factory;
use wovra_engine::steps::sub_workflow::factory as sub_workflow_factory;
use wovra_engine::steps::workflow_call::factory as workflow_call_factory;

fn app_handle() -> AppHandle {
    AppHandle::new(Arc::new(ServiceRegistry::new()))
}

/// Records whether it ran via a shared flag, for assertions that can't
/// observe an async sub-workflow's side effect through its own output.
struct FlagStep {
    name: String,
    flag: Arc<AtomicBool>,
}

#[async_trait]
impl PipelineStep for FlagStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _cancel: &CancellationToken, _pc: &PipelineContext) -> Result<StepResult, StepError> {
        self.flag.store(true, Ordering::SeqCst);
        Ok(StepResult::empty())
    }
}

/// S-C: three auto transitions chained off a single triggering transition,
/// each guarded true, all taken in one `trigger_transition` call.
#[tokio::test]
async fn s_c_auto_chain_runs_to_completion_and_records_full_history() {
    let def = WorkflowDefinition {
        id: "order".to_string(),
        initial_state: "pending".to_string(),
        states: vec![
            "pending".to_string(),
            "paid".to_string(),
            "fulfilled".to_string(),
            "shipped".to_string(),
            "archived".to_string(),
        ],
        transitions: vec![
            TransitionDefinition {
                name: "pay".to_string(),
                sources: vec!["pending".to_string()],
                target: "paid".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "auto_fulfill".to_string(),
                sources: vec!["paid".to_string()],
                target: "fulfilled".to_string(),
                pipeline: None,
                guard: Some("{{ .paid_ok }} == true".to_string()),
                auto: true,
            },
            TransitionDefinition {
                name: "auto_ship".to_string(),
                sources: vec!["fulfilled".to_string()],
                target: "shipped".to_string(),
                pipeline: None,
                guard: Some("{{ .paid_ok }} == true".to_string()),
                auto: true,
            },
            TransitionDefinition {
                name: "auto_archive".to_string(),
                sources: vec!["shipped".to_string()],
                target: "archived".to_string(),
                pipeline: None,
                guard: Some("{{ .paid_ok }} == true".to_string()),
                auto: true,
            },
        ],
    };

    let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
    engine.register_definition(def).await.unwrap();
    engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

    let cancel = CancellationToken::new();
    let pipelines = PipelineRegistry::new();
    engine
        .trigger_transition(&cancel, "ord_1", "pay", json!({"paid_ok": true}), &pipelines)
        .await
        .unwrap();

    let instance = engine.get_instance("ord_1").await.unwrap();
    assert_eq!(instance.current_state, "archived");
    assert_eq!(instance.history.len(), 4);
    assert!(instance.completed);
}

/// S-D: step `a` jumps to step `c`; `b` never runs.
#[tokio::test]
async fn s_d_next_step_skips_the_intervening_step() {
    let app = app_handle();
    let a = set_factory("a", &json!({"values": {"ran": "a"}}), &app).unwrap();
    let b = set_factory("b", &json!({"values": {"ran": "b"}}), &app).unwrap();
    let c = set_factory("c", &json!({"values": {"ran": "c"}}), &app).unwrap();

    // `set` has no jump_to knob of its own, so wrap `a` to redirect to `c`.
    struct Jumper(Box<dyn PipelineStep>);
    #[async_trait]
    impl PipelineStep for Jumper {
        fn name(&self) -> &str {
            self.0.name()
        }
        async fn execute(&self, cancel: &CancellationToken, pc: &PipelineContext) -> Result<StepResult, StepError> {
            let result = self.0.execute(cancel, pc).await?;
            Ok(StepResult {
                output: result.output,
                stop: result.stop,
                next_step: Some("c".to_string()),
            })
        }
    }

    let pipeline = Pipeline::new("p", vec![Box::new(Jumper(a)), b, c]);
    let cancel = CancellationToken::new();
    let pc = app
        .engine
        .execute(&cancel, &pipeline, json!({}), json!({}))
        .await
        .unwrap();

    assert!(pc.step_outputs().contains_key("a"));
    assert!(!pc.step_outputs().contains_key("b"));
    assert!(pc.step_outputs().contains_key("c"));
}

/// S-E: a sync `workflow_call` step maps caller input into the child's
/// trigger data and maps the child's output back to the caller.
#[tokio::test]
async fn s_e_sync_workflow_call_maps_input_and_output() {
    let app = app_handle();

    let child = Pipeline::new(
        "charge",
        vec![set_factory(
            "record_payment",
            &json!({"values": {"payment": {"id": "pay_123"}}}),
            &app,
        )
        .unwrap()],
    );
    app.pipelines.register(child).await;

    let step = workflow_call_factory(
        "charge_call",
        &json!({
            "workflow": "charge",
            "mode": "sync",
            "input_mapping": {"total": "{{ .order_total }}"},
            "output_mapping": {"payment_id": "payment.id"},
        }),
        &app,
    )
    .unwrap();

    let pc = PipelineContext::new(json!({"order_total": "99.99"}), json!({}));
    let cancel = CancellationToken::new();
    let result = step.execute(&cancel, &pc).await.unwrap();

    assert_eq!(result.output["payment_id"], json!("pay_123"));
}

/// S-F: an async `sub_workflow` dispatch returns immediately with a
/// dispatch acknowledgement; the child's side effect lands shortly after.
#[tokio::test]
async fn s_f_async_sub_workflow_dispatches_then_runs_side_effect() {
    let app = app_handle();
    let ran = Arc::new(AtomicBool::new(false));

    let child = Pipeline::new(
        "notify",
        vec![Box::new(FlagStep {
            name: "mark_ran".to_string(),
            flag: Arc::clone(&ran),
        })],
    );
    app.plugins.register("notify", child).await;

    let step = sub_workflow_factory(
        "notify_call",
        &json!({"workflow": "plugin:notify", "mode": "async"}),
        &app,
    )
    .unwrap();

    let pc = PipelineContext::new(json!({}), json!({}));
    let cancel = CancellationToken::new();

    let started = std::time::Instant::now();
    let result = step.execute(&cancel, &pc).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(200));

    assert_eq!(result.output["dispatched"], json!(true));
    assert_eq!(result.output["mode"], json!("async"));
    assert_eq!(result.output["workflow"], json!("plugin:notify"));

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while !ran.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(ran.load(Ordering::SeqCst), "child pipeline side effect did not run within 2s");
}

/// Unused but kept for parity with `AppHandle`'s full field set in case a
/// future scenario needs the plugin registry directly.
#[allow(dead_code)]
fn _unused_plugin_registry() -> PluginRegistry {
    PluginRegistry::new()
}
