//! Stage Runner: wraps one stage function with agent-state transitions,
//! progress milestones and start/complete audit events.
//!
//! Every stage follows the same lifecycle:
//! 1. a starting event, then the agent enters `processing` at progress 0
//! 2. the stage function is awaited (per document for intake and validation,
//!    reporting `done / total * 100` progress after each item; single-call
//!    stages report 50 first)
//! 3. on success the agent enters `completed` at 100 with `last_run` stamped,
//!    a success event summarises the result, and a patch is returned
//! 4. on failure the agent enters `error`, an error event is emitted and
//!    [`PipelineError::StageFailed`] is returned

use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::domain::{
    AgentKind, AgentUpdate, EventDraft, FactorImpact, FindingStatus, IntakeReport, RiskLevel,
    Severity, ShipmentPatch, ShipmentRecord, ValidationStatus,
};
use crate::error::{PipelineError, PipelineResult, StageError, StageResult};
use crate::logger::EventLogger;
use crate::metrics::METRICS;
use crate::obs;
use crate::stages::StageFunctions;
use crate::tracker::AgentStateTracker;

/// Progress after `done` of `total` items.
fn progress_of(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

pub struct StageRunner<'a> {
    stages: &'a dyn StageFunctions,
    tracker: &'a mut AgentStateTracker,
    logger: &'a EventLogger,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        stages: &'a dyn StageFunctions,
        tracker: &'a mut AgentStateTracker,
        logger: &'a EventLogger,
    ) -> Self {
        Self {
            stages,
            tracker,
            logger,
        }
    }

    /// Run the stage of `kind` against the shipment snapshot.
    ///
    /// `Learning` has no stage function and yields an empty patch.
    pub async fn run(
        &mut self,
        kind: AgentKind,
        shipment: &ShipmentRecord,
    ) -> PipelineResult<ShipmentPatch> {
        match kind {
            AgentKind::DocumentIntake => self.run_intake(shipment).await,
            AgentKind::Validation => self.run_validation(shipment).await,
            AgentKind::HsCode => self.run_classification(shipment).await,
            AgentKind::Duty => self.run_duty(shipment).await,
            AgentKind::Compliance => self.run_compliance(shipment).await,
            AgentKind::Risk => self.run_risk(shipment).await,
            AgentKind::Route => self.run_route(shipment).await,
            AgentKind::Learning => Ok(ShipmentPatch::default()),
        }
    }

    pub async fn run_intake(&mut self, shipment: &ShipmentRecord) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::DocumentIntake;
        let stages = self.stages;
        let total = shipment.documents.len();
        let name = self.agent_name(kind);

        let started = self.begin(
            shipment,
            kind,
            "Starting Document Analysis",
            format!("Analyzing {total} documents"),
            "Extracting data from documents",
        )?;

        let mut fields_extracted = 0;
        for (i, doc) in shipment.documents.iter().enumerate() {
            self.emit(
                EventDraft::new(
                    &shipment.id,
                    kind,
                    &name,
                    "Processing Document",
                    format!("Extracting data from {}: {}", doc.doc_type, doc.file_name),
                )
                .data(json!({ "document_type": doc.doc_type, "document_name": doc.file_name })),
            )?;

            let result = stages.extract_document(doc).await;
            let extraction = self.settle(&shipment.id, kind, started, result)?;
            let count = extraction.field_count();
            fields_extracted += count;

            self.emit(
                EventDraft::new(
                    &shipment.id,
                    kind,
                    &name,
                    "Data Extracted",
                    format!("Successfully extracted {count} fields from {}", doc.file_name),
                )
                .severity(Severity::Success)
                .data(json!({ "fields_extracted": count })),
            )?;
            self.tracker
                .set_agent_state(kind, AgentUpdate::progress(progress_of(i + 1, total)))?;
        }

        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Document Intake Complete",
                format!("All {total} documents processed successfully"),
            )
            .severity(Severity::Success)
            .data(json!({ "documents_processed": total, "fields_extracted": fields_extracted })),
        )?;

        Ok(ShipmentPatch::intake(IntakeReport {
            documents_processed: total,
            fields_extracted,
        }))
    }

    pub async fn run_validation(
        &mut self,
        shipment: &ShipmentRecord,
    ) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::Validation;
        let stages = self.stages;
        let total = shipment.documents.len();
        let name = self.agent_name(kind);

        let started = self.begin(
            shipment,
            kind,
            "Starting Validation",
            "Checking document completeness and accuracy".to_string(),
            "Validating document completeness",
        )?;

        let mut documents = shipment.documents.clone();
        for (i, doc) in documents.iter_mut().enumerate() {
            self.emit(EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Validating Document",
                format!("Checking {} for completeness and accuracy", doc.doc_type),
            ))?;

            let result = stages.validate_document(doc).await;
            let outcome = self.settle(&shipment.id, kind, started, result)?;
            doc.apply_validation(&outcome);

            let draft = if outcome.valid {
                EventDraft::new(
                    &shipment.id,
                    kind,
                    &name,
                    "Validation Passed",
                    format!("{} passed all validation checks", doc.file_name),
                )
                .severity(Severity::Success)
            } else {
                EventDraft::new(
                    &shipment.id,
                    kind,
                    &name,
                    "Validation Issues Found",
                    format!(
                        "{} has {} validation errors",
                        doc.file_name,
                        outcome.errors.len()
                    ),
                )
                .severity(Severity::Warning)
                .data(json!({ "errors": outcome.errors }))
            };
            self.emit(draft)?;
            self.tracker
                .set_agent_state(kind, AgentUpdate::progress(progress_of(i + 1, total)))?;
        }

        let valid = documents
            .iter()
            .filter(|d| d.validation_status == ValidationStatus::Valid)
            .count();
        let severity = if valid == total {
            Severity::Success
        } else {
            Severity::Warning
        };
        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Validation Complete",
                format!("{valid}/{total} documents validated successfully"),
            )
            .severity(severity)
            .data(json!({ "valid_documents": valid, "total_documents": total })),
        )?;

        Ok(ShipmentPatch::documents(documents))
    }

    pub async fn run_classification(
        &mut self,
        shipment: &ShipmentRecord,
    ) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::HsCode;
        let stages = self.stages;
        let name = self.agent_name(kind);

        let started = self.begin(
            shipment,
            kind,
            "Starting Classification",
            format!("Classifying: {}", shipment.goods.description),
            "Classifying goods with AI",
        )?;
        self.halfway(kind)?;

        let result = stages.classify(&shipment.goods.description).await;
        let hs = self.settle(&shipment.id, kind, started, result)?;

        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Classification Complete",
                format!(
                    "Classified as {} - {} ({:.1}% confidence)",
                    hs.code, hs.description, hs.confidence
                ),
            )
            .severity(Severity::Success)
            .data(json!({ "hs_code": hs.code, "confidence": hs.confidence })),
        )?;

        Ok(ShipmentPatch::hs_code(hs))
    }

    pub async fn run_duty(&mut self, shipment: &ShipmentRecord) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::Duty;
        let stages = self.stages;
        let name = self.agent_name(kind);
        let origin = shipment.exporter.country.as_str();
        let destination = shipment.importer.country.as_str();

        let started = self.begin(
            shipment,
            kind,
            "Calculating Duties",
            format!("Computing duties for {origin} → {destination}"),
            "Calculating duties and taxes",
        )?;
        self.halfway(kind)?;

        let hs_code = shipment
            .hs_code
            .as_ref()
            .map(|h| h.code.as_str())
            .unwrap_or_default();
        let result = stages
            .calculate_duty(hs_code, shipment.goods.value, origin, destination)
            .await;
        let duty = self.settle(&shipment.id, kind, started, result)?;

        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Duty Calculation Complete",
                format!(
                    "Total duties: {:.2} {} (Duty: {:.2}, Tax: {:.2})",
                    duty.total_amount, duty.currency, duty.duty_amount, duty.tax_amount
                ),
            )
            .severity(Severity::Success)
            .data(json!({ "total_amount": duty.total_amount, "currency": duty.currency })),
        )?;

        Ok(ShipmentPatch::duty(duty))
    }

    pub async fn run_compliance(
        &mut self,
        shipment: &ShipmentRecord,
    ) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::Compliance;
        let stages = self.stages;
        let name = self.agent_name(kind);

        let started = self.begin(
            shipment,
            kind,
            "Starting Compliance Checks",
            "Checking regulatory requirements and restrictions".to_string(),
            "Checking regulatory compliance",
        )?;
        self.halfway(kind)?;

        let result = stages.check_compliance(shipment).await;
        let findings = self.settle(&shipment.id, kind, started, result)?;

        for finding in &findings {
            self.emit(
                EventDraft::new(
                    &shipment.id,
                    kind,
                    &name,
                    format!("{} Check", finding.rule),
                    format!("{}: {}", finding.message, finding.status),
                )
                .severity(finding.status.event_severity())
                .data(json!({ "rule": finding.rule, "status": finding.status })),
            )?;
        }

        // Summary is success only when every finding passed; a warning counts
        // against it just like a failure.
        let passed = findings
            .iter()
            .filter(|f| f.status == FindingStatus::Passed)
            .count();
        let severity = if passed == findings.len() {
            Severity::Success
        } else {
            Severity::Error
        };
        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Compliance Checks Complete",
                format!("{passed}/{} compliance checks passed", findings.len()),
            )
            .severity(severity)
            .data(json!({ "passed": passed, "total": findings.len() })),
        )?;

        Ok(ShipmentPatch::compliance(findings))
    }

    pub async fn run_risk(&mut self, shipment: &ShipmentRecord) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::Risk;
        let stages = self.stages;
        let name = self.agent_name(kind);

        let started = self.begin(
            shipment,
            kind,
            "Analyzing Risk Factors",
            "Evaluating shipment risk".to_string(),
            "Calculating risk score",
        )?;
        self.halfway(kind)?;

        let result = stages.score_risk(shipment).await;
        let risk = self.settle(&shipment.id, kind, started, result)?;

        for (label, score) in risk.factors.labelled() {
            let impact = FactorImpact::from_score(score);
            let severity = if impact == FactorImpact::High {
                Severity::Warning
            } else {
                Severity::Info
            };
            self.emit(
                EventDraft::new(
                    &shipment.id,
                    kind,
                    &name,
                    "Risk Factor Analyzed",
                    format!("{label}: {score:.1}% (Impact: {})", impact.as_str()),
                )
                .severity(severity)
                .data(json!({ "factor": label, "score": score, "impact": impact })),
            )?;
        }

        let severity = match risk.level {
            RiskLevel::Low => Severity::Success,
            RiskLevel::Medium => Severity::Info,
            RiskLevel::High | RiskLevel::Critical => Severity::Warning,
        };
        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Risk Assessment Complete",
                format!(
                    "Risk Level: {} (Score: {:.1}/100)",
                    risk.level.as_str().to_uppercase(),
                    risk.overall
                ),
            )
            .severity(severity)
            .data(json!({ "risk_level": risk.level, "risk_score": risk.overall })),
        )?;

        Ok(ShipmentPatch::risk(risk))
    }

    pub async fn run_route(&mut self, shipment: &ShipmentRecord) -> PipelineResult<ShipmentPatch> {
        let kind = AgentKind::Route;
        let stages = self.stages;
        let name = self.agent_name(kind);
        let origin = shipment.exporter.country.as_str();
        let destination = shipment.importer.country.as_str();

        let started = self.begin(
            shipment,
            kind,
            "Optimizing Route",
            format!("Searching routes from {origin} to {destination}"),
            "Optimizing shipment route",
        )?;
        self.halfway(kind)?;

        let result = stages
            .optimize_route(origin, destination, shipment.goods.weight)
            .await;
        let route = self.settle(&shipment.id, kind, started, result)?;

        self.finish(
            kind,
            started,
            EventDraft::new(
                &shipment.id,
                kind,
                &name,
                "Route Optimization Complete",
                format!(
                    "Optimal route: {} ({} days, cost {:.2})",
                    route.path.join(" → "),
                    route.estimated_days,
                    route.estimated_cost
                ),
            )
            .severity(Severity::Success)
            .data(json!({
                "path": route.path,
                "days": route.estimated_days,
                "cost": route.estimated_cost,
            })),
        )?;

        Ok(ShipmentPatch::route(route))
    }

    fn agent_name(&self, kind: AgentKind) -> String {
        self.tracker
            .agent(kind)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| kind.display_name().to_string())
    }

    fn emit(&self, draft: EventDraft) -> PipelineResult<()> {
        self.logger.emit(draft)?;
        Ok(())
    }

    fn begin(
        &mut self,
        shipment: &ShipmentRecord,
        kind: AgentKind,
        action: &str,
        detail: String,
        task: &str,
    ) -> PipelineResult<Instant> {
        obs::emit_stage_started(&shipment.id, kind);
        let name = self.agent_name(kind);
        self.emit(EventDraft::new(&shipment.id, kind, name, action, detail))?;
        self.tracker
            .set_agent_state(kind, AgentUpdate::processing(task))?;
        Ok(Instant::now())
    }

    fn halfway(&mut self, kind: AgentKind) -> PipelineResult<()> {
        self.tracker
            .set_agent_state(kind, AgentUpdate::progress(50.0))?;
        Ok(())
    }

    fn finish(
        &mut self,
        kind: AgentKind,
        started: Instant,
        draft: EventDraft,
    ) -> PipelineResult<()> {
        let elapsed = started.elapsed();
        let shipment_id = draft.shipment_id.clone();
        self.tracker
            .set_agent_state(kind, AgentUpdate::completed(Utc::now()))?;
        self.tracker.record_outcome(kind, true, elapsed)?;
        self.emit(draft)?;
        METRICS.inc_stages_executed();
        obs::emit_stage_completed(&shipment_id, kind, elapsed.as_millis() as u64);
        Ok(())
    }

    /// Pass a stage result through, or record the failure and convert it.
    ///
    /// The stage error is always the one returned. An observer that fails
    /// while the failure is being recorded is logged and otherwise ignored.
    fn settle<T>(
        &mut self,
        shipment_id: &str,
        kind: AgentKind,
        started: Instant,
        result: StageResult<T>,
    ) -> PipelineResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(source) => {
                if let Err(observer) = self.mark_failed(shipment_id, kind, started, &source) {
                    warn!(
                        shipment_id = %shipment_id,
                        stage = %kind,
                        error = %observer,
                        "observer failed while recording stage failure"
                    );
                }
                Err(PipelineError::StageFailed { stage: kind, source })
            }
        }
    }

    fn mark_failed(
        &mut self,
        shipment_id: &str,
        kind: AgentKind,
        started: Instant,
        source: &StageError,
    ) -> PipelineResult<()> {
        obs::emit_stage_failed(shipment_id, kind, source);
        METRICS.inc_stage_failures();
        self.tracker
            .set_agent_state(kind, AgentUpdate::failed(Utc::now()))?;
        self.tracker.record_outcome(kind, false, started.elapsed())?;
        let name = self.agent_name(kind);
        self.emit(
            EventDraft::new(
                shipment_id,
                kind,
                &name,
                "Stage Failed",
                format!("{name} failed: {source}"),
            )
            .severity(Severity::Error)
            .data(json!({ "error": source.to_string() })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentStatus, Document};
    use crate::error::ObserverError;
    use crate::fakes::{sample_shipment, FixedStages};
    use std::sync::{Arc, Mutex};

    fn shipment_with_docs(n: usize) -> ShipmentRecord {
        let mut shipment = sample_shipment("ship-r");
        for i in 0..n {
            shipment.attach(Document::from_upload("ship-r", format!("invoice-{i}.pdf")));
        }
        shipment
    }

    #[test]
    fn test_progress_of() {
        assert_eq!(progress_of(0, 0), 100.0);
        assert_eq!(progress_of(1, 4), 25.0);
        assert_eq!(progress_of(4, 4), 100.0);
    }

    #[tokio::test]
    async fn test_intake_reports_per_document_progress() {
        let stages = FixedStages::new();
        let mut tracker = AgentStateTracker::standard();
        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&progress);
        tracker.subscribe(move |agents| {
            let intake = agents
                .iter()
                .find(|a| a.kind == AgentKind::DocumentIntake)
                .expect("intake agent");
            sink.lock().unwrap().push(intake.progress);
            Ok(())
        });
        let logger = EventLogger::new();
        let shipment = shipment_with_docs(4);

        let patch = StageRunner::new(&stages, &mut tracker, &logger)
            .run(AgentKind::DocumentIntake, &shipment)
            .await
            .unwrap();

        // processing(0), four items, completed(100), metrics(100)
        assert_eq!(
            *progress.lock().unwrap(),
            [0.0, 25.0, 50.0, 75.0, 100.0, 100.0, 100.0]
        );
        let report = patch.intake_report.expect("intake report");
        assert_eq!(report.documents_processed, 4);
        assert_eq!(report.fields_extracted, 4 * stages.extraction().field_count());
        assert!(patch.documents.is_none());
    }

    #[tokio::test]
    async fn test_validation_marks_each_document() {
        let shipment = shipment_with_docs(3);
        let bad_id = shipment.documents[1].id.clone();
        let stages = FixedStages::new().with_invalid_document(&bad_id);
        let mut tracker = AgentStateTracker::standard();
        let logger = EventLogger::new();

        let patch = StageRunner::new(&stages, &mut tracker, &logger)
            .run_validation(&shipment)
            .await
            .unwrap();

        let documents = patch.documents.expect("documents patch");
        assert_eq!(documents[0].validation_status, ValidationStatus::Valid);
        assert_eq!(documents[1].validation_status, ValidationStatus::Invalid);
        assert_eq!(documents[2].validation_status, ValidationStatus::Valid);
        assert!(!documents[1].validation_errors.as_ref().unwrap().is_empty());
        // The snapshot itself is untouched.
        assert_eq!(shipment.documents[1].validation_status, ValidationStatus::Pending);
    }

    #[tokio::test]
    async fn test_single_call_stage_completes_agent() {
        let stages = FixedStages::new();
        let mut tracker = AgentStateTracker::standard();
        let logger = EventLogger::new();
        let shipment = sample_shipment("ship-c");

        let patch = StageRunner::new(&stages, &mut tracker, &logger)
            .run(AgentKind::HsCode, &shipment)
            .await
            .unwrap();

        assert!(patch.hs_code.is_some());
        let agent = tracker.agent(AgentKind::HsCode).unwrap();
        assert_eq!(agent.status, AgentStatus::Completed);
        assert_eq!(agent.progress, 100.0);
        assert!(agent.last_run.is_some());
        assert_eq!(agent.metrics.map(|m| m.total_processed), Some(1));
    }

    #[tokio::test]
    async fn test_failure_marks_agent_error() {
        let stages = FixedStages::new().failing_at(AgentKind::Duty);
        let mut tracker = AgentStateTracker::standard();
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut logger = EventLogger::new();
        let sink = Arc::clone(&events);
        logger.subscribe(move |e| {
            sink.lock().unwrap().push(e.clone());
            Ok(())
        });
        let shipment = sample_shipment("ship-f");

        let err = StageRunner::new(&stages, &mut tracker, &logger)
            .run(AgentKind::Duty, &shipment)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StageFailed {
                stage: AgentKind::Duty,
                ..
            }
        ));
        let agent = tracker.agent(AgentKind::Duty).unwrap();
        assert_eq!(agent.status, AgentStatus::Error);
        assert_eq!(agent.progress, 50.0);
        assert_eq!(agent.metrics.map(|m| m.success_rate), Some(0.0));

        let events = events.lock().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.action, "Stage Failed");
        assert_eq!(last.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_stage_error_survives_failing_observer() {
        let stages = FixedStages::new().failing_at(AgentKind::Duty);
        let mut tracker = AgentStateTracker::standard();
        let mut logger = EventLogger::new();
        logger.subscribe(|e| {
            if e.action == "Stage Failed" {
                Err(ObserverError::Rejected("feed closed".into()))
            } else {
                Ok(())
            }
        });

        let err = StageRunner::new(&stages, &mut tracker, &logger)
            .run(AgentKind::Duty, &sample_shipment("ship-fo"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StageFailed {
                stage: AgentKind::Duty,
                source: StageError::Unavailable(_),
            }
        ));
        assert_eq!(
            tracker.agent(AgentKind::Duty).map(|a| a.status),
            Some(AgentStatus::Error)
        );
    }

    #[tokio::test]
    async fn test_learning_is_a_no_op() {
        let stages = FixedStages::new();
        let mut tracker = AgentStateTracker::standard();
        let logger = EventLogger::new();
        let patch = StageRunner::new(&stages, &mut tracker, &logger)
            .run(AgentKind::Learning, &sample_shipment("ship-l"))
            .await
            .unwrap();
        assert!(patch.is_empty());
        assert!(stages.calls().is_empty());
    }
}
