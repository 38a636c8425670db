//! Integration tests for the orchestrator with fake stage functions.

use std::sync::Arc;

use tradeflow_core::fakes::{sample_shipment, Delivery, FixedStages, RecordingObservers};
use tradeflow_core::{
    AgentKind, AgentStatus, Document, FindingStatus, ObserverError, Orchestrator, PipelineError,
    ProcessingEvent, RiskLevel, Severity, SharedEventStore, ShipmentRecord, ShipmentStatus,
    SYSTEM_AGENT,
};

const COMPLETION_ACTIONS: [&str; 7] = [
    "Document Intake Complete",
    "Validation Complete",
    "Classification Complete",
    "Duty Calculation Complete",
    "Compliance Checks Complete",
    "Risk Assessment Complete",
    "Route Optimization Complete",
];

fn shipment_with_documents(id: &str) -> ShipmentRecord {
    let mut shipment = sample_shipment(id);
    shipment.attach(Document::from_upload(id, "commercial_invoice.pdf"));
    shipment.attach(Document::from_upload(id, "packing_list.pdf"));
    shipment
}

fn recorded(stages: FixedStages) -> (Orchestrator, RecordingObservers, Arc<FixedStages>) {
    let stages = Arc::new(stages);
    let mut orchestrator = Orchestrator::new(stages.clone());
    let observers = RecordingObservers::new();
    observers.attach(&mut orchestrator);
    (orchestrator, observers, stages)
}

fn find<'a>(events: &'a [ProcessingEvent], action: &str) -> &'a ProcessingEvent {
    events
        .iter()
        .find(|e| e.action == action)
        .unwrap_or_else(|| panic!("no event {action:?}"))
}

/// Test: documented example (2 documents, one compliance warning, low risk)
#[tokio::test]
async fn test_warning_finding_clears_with_error_summary() {
    let (mut orchestrator, observers, _) = recorded(FixedStages::new().with_compliance(&[
        FindingStatus::Passed,
        FindingStatus::Passed,
        FindingStatus::Passed,
        FindingStatus::Warning,
    ]));

    let record = orchestrator
        .process_shipment(shipment_with_documents("ship-ex"))
        .await
        .expect("run failed");

    assert_eq!(record.status, ShipmentStatus::Cleared);
    let events = observers.events();
    let summary = find(&events, "Compliance Checks Complete");
    assert_eq!(summary.severity, Severity::Error);
    assert_eq!(summary.detail, "3/4 compliance checks passed");

    let terminal = events.last().unwrap();
    assert_eq!(terminal.action, "Processing Completed");
    assert_eq!(terminal.agent_name, SYSTEM_AGENT);
    assert_eq!(terminal.stage, AgentKind::Route);
    assert_eq!(terminal.severity, Severity::Success);
    assert_eq!(terminal.data.as_ref().unwrap()["final_status"], "cleared");
}

/// Test: stages run in the fixed order and each runs once
#[tokio::test]
async fn test_stages_run_in_fixed_order() {
    let (mut orchestrator, observers, stages) = recorded(FixedStages::new());
    orchestrator
        .process_shipment(shipment_with_documents("ship-order"))
        .await
        .unwrap();

    assert_eq!(
        stages.calls(),
        [
            AgentKind::DocumentIntake,
            AgentKind::DocumentIntake,
            AgentKind::Validation,
            AgentKind::Validation,
            AgentKind::HsCode,
            AgentKind::Duty,
            AgentKind::Compliance,
            AgentKind::Risk,
            AgentKind::Route,
        ]
    );

    let mut stage_order: Vec<AgentKind> = observers
        .events()
        .iter()
        .filter(|e| e.agent_name != SYSTEM_AGENT)
        .map(|e| e.stage)
        .collect();
    stage_order.dedup();
    assert_eq!(stage_order, AgentKind::PIPELINE);

    let events = observers.events();
    assert_eq!(events.first().unwrap().action, "Processing Started");
    assert_eq!(events.first().unwrap().stage, AgentKind::DocumentIntake);
}

/// Test: one patch per stage, each published right after its completion event
#[tokio::test]
async fn test_patch_follows_each_stage_completion() {
    let (mut orchestrator, observers, _) = recorded(FixedStages::new());
    orchestrator
        .process_shipment(shipment_with_documents("ship-patches"))
        .await
        .unwrap();

    let timeline = observers.timeline();
    let mut last_event: Option<&ProcessingEvent> = None;
    let mut patches_seen = 0;
    for delivery in &timeline {
        match delivery {
            Delivery::Event(e) => last_event = Some(e),
            Delivery::Patch(patch) => {
                let before = last_event.expect("patch before any event");
                if patches_seen < 7 {
                    assert_eq!(before.stage, AgentKind::PIPELINE[patches_seen]);
                    assert_eq!(before.action, COMPLETION_ACTIONS[patches_seen]);
                    assert!(patch.status.is_none());
                } else {
                    assert_eq!(before.action, "Route Optimization Complete");
                    assert_eq!(patch.status, Some(ShipmentStatus::Cleared));
                    assert!(patch.updated_at.is_some());
                }
                patches_seen += 1;
            }
            Delivery::Agents(_) => {}
        }
    }
    assert_eq!(patches_seen, 8);

    let patches = observers.patches();
    assert!(patches[0].intake_report.is_some());
    assert!(patches[0].documents.is_none());
    assert_eq!(patches[1].documents.as_ref().map(Vec::len), Some(2));
    assert!(patches[2].hs_code.is_some());
    assert!(patches[3].duty.is_some());
    assert!(patches[4].compliance.is_some());
    assert!(patches[5].risk.is_some());
    assert!(patches[6].route.is_some());
}

/// Test: every agent's progress is non-decreasing within a run
#[tokio::test]
async fn test_agent_progress_is_monotonic() {
    let (mut orchestrator, observers, _) = recorded(FixedStages::new());
    orchestrator
        .process_shipment(shipment_with_documents("ship-progress"))
        .await
        .unwrap();

    let snapshots = observers.agent_snapshots();
    assert!(!snapshots.is_empty());
    for kind in AgentKind::PIPELINE {
        let series: Vec<f64> = snapshots
            .iter()
            .filter_map(|s| s.iter().find(|a| a.kind == kind).map(|a| a.progress))
            .collect();
        assert!(
            series.windows(2).all(|w| w[0] <= w[1]),
            "{kind} progress went backwards: {series:?}"
        );
        assert_eq!(series.last(), Some(&100.0));
    }

    for agent in orchestrator.tracker().agents() {
        if agent.kind == AgentKind::Learning {
            assert_eq!(agent.status, AgentStatus::Idle);
            assert!(agent.metrics.is_none());
        } else {
            assert_eq!(agent.status, AgentStatus::Completed);
            assert_eq!(agent.metrics.map(|m| m.total_processed), Some(1));
        }
    }
}

/// Test: a failed compliance rule rejects but later stages still run
#[tokio::test]
async fn test_compliance_failure_rejects_after_all_stages() {
    let (mut orchestrator, observers, stages) = recorded(
        FixedStages::new()
            .with_compliance(&[FindingStatus::Passed, FindingStatus::Failed])
            .with_risk_level(RiskLevel::Critical),
    );
    let record = orchestrator
        .process_shipment(shipment_with_documents("ship-rej"))
        .await
        .unwrap();

    assert_eq!(record.status, ShipmentStatus::Rejected);
    assert!(record.risk.is_some());
    assert!(record.route.is_some());
    assert!(stages.calls().contains(&AgentKind::Route));

    let events = observers.events();
    assert_eq!(
        find(&events, "Sanctions Screening Check").severity,
        Severity::Error
    );
    assert_eq!(events.last().unwrap().severity, Severity::Error);
}

/// Test: an invalid document holds the shipment for review
#[tokio::test]
async fn test_invalid_document_pending_review() {
    let shipment = shipment_with_documents("ship-inv");
    let bad = shipment.documents[0].id.clone();
    let (mut orchestrator, observers, _) =
        recorded(FixedStages::new().with_invalid_document(&bad));

    let record = orchestrator.process_shipment(shipment).await.unwrap();

    assert_eq!(record.status, ShipmentStatus::PendingReview);
    assert!(record.documents[0].is_invalid());
    let events = observers.events();
    let issues = find(&events, "Validation Issues Found");
    assert_eq!(issues.severity, Severity::Warning);
    assert_eq!(issues.data.as_ref().unwrap()["errors"].as_array().map(Vec::len), Some(2));
    let summary = find(&events, "Validation Complete");
    assert_eq!(summary.severity, Severity::Warning);
    assert_eq!(summary.detail, "1/2 documents validated successfully");
    assert_eq!(events.last().unwrap().severity, Severity::Warning);
}

/// Test: high risk with clean documents holds for review
#[tokio::test]
async fn test_high_risk_pending_review() {
    let (mut orchestrator, observers, _) =
        recorded(FixedStages::new().with_risk_level(RiskLevel::High));
    let record = orchestrator
        .process_shipment(shipment_with_documents("ship-risk"))
        .await
        .unwrap();

    assert_eq!(record.status, ShipmentStatus::PendingReview);
    let events = observers.events();
    let summary = find(&events, "Risk Assessment Complete");
    assert_eq!(summary.severity, Severity::Warning);
    assert_eq!(summary.detail, "Risk Level: HIGH (Score: 60.0/100)");
    assert!(events
        .iter()
        .filter(|e| e.action == "Risk Factor Analyzed")
        .all(|e| e.severity == Severity::Warning));
}

/// Test: a zero-document shipment still runs every stage and clears
#[tokio::test]
async fn test_zero_documents_clear() {
    let (mut orchestrator, observers, _) = recorded(FixedStages::new());
    let record = orchestrator
        .process_shipment(sample_shipment("ship-empty"))
        .await
        .unwrap();

    assert_eq!(record.status, ShipmentStatus::Cleared);
    assert_eq!(record.intake_report.map(|r| r.documents_processed), Some(0));
    assert_eq!(observers.patches().len(), 8);
    assert_eq!(
        find(&observers.events(), "Validation Complete").severity,
        Severity::Success
    );
}

/// Test: a stage failure aborts the run after marking the agent
#[tokio::test]
async fn test_stage_failure_aborts_run() {
    let (mut orchestrator, observers, stages) =
        recorded(FixedStages::new().failing_at(AgentKind::Compliance));

    let err = orchestrator
        .process_shipment(shipment_with_documents("ship-fail"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::StageFailed {
            stage: AgentKind::Compliance,
            ..
        }
    ));
    assert_eq!(observers.patches().len(), 4);
    assert!(!stages.calls().contains(&AgentKind::Risk));

    let events = observers.events();
    let last = events.last().unwrap();
    assert_eq!(last.action, "Stage Failed");
    assert_eq!(last.stage, AgentKind::Compliance);
    assert_eq!(last.severity, Severity::Error);
    assert!(!events.iter().any(|e| e.action == "Processing Completed"));

    let tracker = orchestrator.tracker();
    assert_eq!(
        tracker.agent(AgentKind::Compliance).map(|a| a.status),
        Some(AgentStatus::Error)
    );
    assert_eq!(
        tracker.agent(AgentKind::Risk).map(|a| a.status),
        Some(AgentStatus::Idle)
    );
}

/// Test: a failing observer aborts the run
#[tokio::test]
async fn test_failing_observer_aborts_run() {
    let stages = Arc::new(FixedStages::new());
    let mut orchestrator = Orchestrator::new(stages.clone());
    orchestrator.on_shipment_update(|patch| {
        if patch.hs_code.is_some() {
            Err(ObserverError::Rejected("dashboard disconnected".into()))
        } else {
            Ok(())
        }
    });

    let err = orchestrator
        .process_shipment(shipment_with_documents("ship-obs"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Observer(_)));
    assert!(!stages.calls().contains(&AgentKind::Duty));
}

/// Test: a finalized shipment is refused
#[tokio::test]
async fn test_cleared_shipment_is_refused() {
    let (mut orchestrator, observers, _) = recorded(FixedStages::new());
    let mut shipment = sample_shipment("ship-cleared");
    shipment.status = ShipmentStatus::Cleared;

    let err = orchestrator.process_shipment(shipment).await.unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyFinalized { .. }));
    assert!(observers.timeline().is_empty());
}

/// Test: an event store fed by the event channel retains the whole run
#[tokio::test]
async fn test_event_store_subscription() {
    let store = SharedEventStore::with_capacity(100);
    let mut orchestrator = Orchestrator::new(Arc::new(FixedStages::new()));
    orchestrator.on_event(store.listener());

    orchestrator
        .process_shipment(shipment_with_documents("ship-store"))
        .await
        .unwrap();

    // system 2, intake 6, validation 6, classification 2, duty 2,
    // compliance 6, risk 6, route 2
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 32);
    assert_eq!(snapshot.for_shipment("ship-store").count(), 32);
    assert_eq!(snapshot.recent(1)[0].action, "Processing Completed");
}

/// Test: independent orchestrators run concurrently without interference
#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let cases = [
        (RiskLevel::Low, ShipmentStatus::Cleared),
        (RiskLevel::Medium, ShipmentStatus::Cleared),
        (RiskLevel::High, ShipmentStatus::PendingReview),
        (RiskLevel::Critical, ShipmentStatus::PendingReview),
    ];

    let handles: Vec<_> = cases
        .iter()
        .enumerate()
        .map(|(i, (level, _))| {
            let level = *level;
            tokio::spawn(async move {
                let mut orchestrator =
                    Orchestrator::new(Arc::new(FixedStages::new().with_risk_level(level)));
                let record = orchestrator
                    .process_shipment(shipment_with_documents(&format!("ship-{i}")))
                    .await?;
                Ok::<_, PipelineError>((record, orchestrator.into_tracker()))
            })
        })
        .collect();

    for (handle, (_, expected)) in handles.into_iter().zip(cases.iter()) {
        let (record, tracker) = handle.await.expect("task panicked").expect("run failed");
        assert_eq!(record.status, *expected);
        assert!(tracker
            .agents()
            .iter()
            .filter(|a| a.kind != AgentKind::Learning)
            .all(|a| a.metrics.map(|m| m.total_processed) == Some(1)));
    }
}
