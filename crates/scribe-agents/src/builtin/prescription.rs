//! Prescription draft agent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use scribe_core::DocumentId;
use scribe_core::types::{AgentResult, GeneratedDocument};

use crate::agent::{AgentError, AgentHandler};
use crate::context::SegmentContext;

/// Produces a `prescription_draft` document from medication entities.
///
/// Activation normally comes via the `MedicationName` entity path; if the
/// agent fires on intent alone and the segment carries no medication
/// entities, processing fails (there is nothing to draft).
pub struct PrescriptionAgent;

#[async_trait]
impl AgentHandler for PrescriptionAgent {
    fn name(&self) -> &str {
        "prescription"
    }

    async fn process(&self, ctx: Arc<SegmentContext>) -> Result<AgentResult, AgentError> {
        let medications: Vec<_> = ctx.entities_in("MedicationName").collect();
        if medications.is_empty() {
            return Err(AgentError::Generation(
                "no medication entities in segment".into(),
            ));
        }

        let mut lines = Vec::new();
        for medication in &medications {
            lines.push(format!("Medication: {}", medication.text));
        }
        for dosage in ctx.entities_in("Dosage") {
            lines.push(format!("Dosage: {}", dosage.text));
        }
        for frequency in ctx.entities_in("Frequency") {
            lines.push(format!("Frequency: {}", frequency.text));
        }

        #[allow(clippy::cast_precision_loss)]
        let confidence =
            medications.iter().map(|e| e.confidence).sum::<f64>() / medications.len() as f64;

        let document = GeneratedDocument {
            id: DocumentId::new(),
            session_id: ctx.segment.session_id.clone(),
            doc_type: "prescription_draft".into(),
            content: lines.join("\n"),
            generated_by: self.name().into(),
            created_at: Utc::now(),
        };

        Ok(AgentResult {
            documents: vec![document],
            actions: Vec::new(),
            confidence,
            error: None,
        })
    }
}
