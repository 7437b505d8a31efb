//! The validation workflow: the only sanctioned path through the status
//! state machine.
//!
//! The workflow composes the pure [`ValidationEngine`] with an
//! [`IntelStore`]. It owns status legality (the store's status write is a
//! dumb audited update) and the supersession rule: at most one `validated`
//! point per (dimension, subject, period) key.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  point::{Confidence, DataPoint},
  rules::{RuleFailure, ValidationEngine},
  status::ValidationStatus,
  store::{DataPointQuery, IntelStore},
  Error, Result,
};

// ─── Batch results ───────────────────────────────────────────────────────────

/// Per-point outcome of [`ValidationWorkflow::auto_validate`].
#[derive(Debug, Clone)]
pub enum AutoOutcome {
  Validated,
  /// The engine rejected the point; it is left in `in_review` for a human.
  Failed(Vec<RuleFailure>),
}

/// Summary of one [`ValidationWorkflow::auto_validate`] run.
#[derive(Debug, Clone, Default)]
pub struct AutoValidateReport {
  pub outcomes: Vec<(Uuid, AutoOutcome)>,
}

impl AutoValidateReport {
  pub fn validated(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|(_, o)| matches!(o, AutoOutcome::Validated))
      .count()
  }

  pub fn failed(&self) -> usize {
    self.outcomes.len() - self.validated()
  }
}

/// Summary of one staleness sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
  pub examined: usize,
  pub outdated: Vec<Uuid>,
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Drives data points through `pending -> in_review -> validated | rejected`
/// and retires validated points to `outdated`.
pub struct ValidationWorkflow<'a, S> {
  store:  &'a S,
  engine: ValidationEngine,
}

impl<'a, S: IntelStore> ValidationWorkflow<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self { store, engine: ValidationEngine::default() }
  }

  pub fn with_engine(store: &'a S, engine: ValidationEngine) -> Self {
    Self { store, engine }
  }

  async fn fetch(&self, id: Uuid) -> Result<DataPoint> {
    self.store.data_point(id).await?.ok_or(Error::NotFound(id))
  }

  fn check_transition(
    point: &DataPoint,
    to: ValidationStatus,
  ) -> Result<()> {
    if point.status.can_transition(to) {
      Ok(())
    } else {
      Err(Error::InvalidTransition { from: point.status, to })
    }
  }

  /// Take a pending point into review.
  pub async fn claim_for_review(
    &self,
    id: Uuid,
    actor: &str,
  ) -> Result<DataPoint> {
    let point = self.fetch(id).await?;
    Self::check_transition(&point, ValidationStatus::InReview)?;
    debug!(%id, actor, "claiming data point for review");
    self
      .store
      .set_status(id, ValidationStatus::InReview, actor, None)
      .await
  }

  /// Validate an in-review point.
  ///
  /// Runs every rule; a non-advisory failure aborts with the complete defect
  /// list and leaves the point in `in_review`. On success any previously
  /// validated point sharing the (dimension, subject, period) key is retired
  /// to `outdated` first, then this point becomes `validated`.
  pub async fn validate_item(
    &self,
    id: Uuid,
    actor: &str,
  ) -> Result<DataPoint> {
    let point = self.fetch(id).await?;
    Self::check_transition(&point, ValidationStatus::Validated)?;

    let dimension = self
      .store
      .dimension(&point.dimension)
      .await?
      .ok_or_else(|| Error::UnknownDimension(point.dimension.clone()))?;

    let report = self.engine.evaluate(&point, &dimension);
    if !report.passed() {
      let failures = report.failures();
      warn!(%id, failures = failures.len(), "validation rejected data point");
      return Err(Error::ValidationFailed(failures));
    }

    self.supersede_previous(&point, actor).await?;

    info!(%id, actor, dimension = %point.dimension, "data point validated");
    self
      .store
      .set_status(id, ValidationStatus::Validated, actor, None)
      .await
  }

  /// Reject an in-review point. A non-empty reason is mandatory.
  pub async fn reject_item(
    &self,
    id: Uuid,
    actor: &str,
    reason: &str,
  ) -> Result<DataPoint> {
    if reason.trim().is_empty() {
      return Err(Error::MissingReason);
    }
    let point = self.fetch(id).await?;
    Self::check_transition(&point, ValidationStatus::Rejected)?;
    info!(%id, actor, reason, "data point rejected");
    self
      .store
      .set_status(
        id,
        ValidationStatus::Rejected,
        actor,
        Some(reason.to_string()),
      )
      .await
  }

  /// Retire every validated point sharing `point`'s key.
  async fn supersede_previous(
    &self,
    point: &DataPoint,
    actor: &str,
  ) -> Result<()> {
    let mut query =
      DataPointQuery::by_key(&point.dimension, &point.subject, point.period);
    query.status = Some(ValidationStatus::Validated);

    for previous in self.store.data_points(&query).await? {
      if previous.point_id == point.point_id {
        continue;
      }
      debug!(
        superseded = %previous.point_id,
        by = %point.point_id,
        "retiring superseded data point"
      );
      self
        .store
        .set_status(
          previous.point_id,
          ValidationStatus::Outdated,
          actor,
          Some(format!("superseded by {}", point.point_id)),
        )
        .await?;
    }
    Ok(())
  }

  /// Retire validated points older than the engine's recency window.
  ///
  /// The recency rule is advisory at validation time; the sweep is where it
  /// has teeth. Only `validated` points are examined: rejected and outdated
  /// points are terminal, pending points are not yet trusted.
  pub async fn sweep_stale(&self, actor: &str) -> Result<SweepReport> {
    let validated = self
      .store
      .data_points(&DataPointQuery::by_status(ValidationStatus::Validated))
      .await?;

    let mut report = SweepReport { examined: validated.len(), ..Default::default() };
    for point in validated {
      let dimension = self
        .store
        .dimension(&point.dimension)
        .await?
        .ok_or_else(|| Error::UnknownDimension(point.dimension.clone()))?;
      if self.engine.evaluate(&point, &dimension).stale_eligible() {
        self
          .store
          .set_status(
            point.point_id,
            ValidationStatus::Outdated,
            actor,
            Some("retired by staleness sweep".to_string()),
          )
          .await?;
        report.outdated.push(point.point_id);
      }
    }

    info!(
      examined = report.examined,
      outdated = report.outdated.len(),
      "staleness sweep complete"
    );
    Ok(report)
  }

  /// Run high-confidence pending points through claim-then-validate.
  ///
  /// Only `Confidence::High` points are eligible; medium and lower stay
  /// `pending` for a human reviewer. Points the engine rejects stay in
  /// `in_review` with their defect list in the report; one bad point never
  /// aborts the batch.
  pub async fn auto_validate(&self, actor: &str) -> Result<AutoValidateReport> {
    let mut query = DataPointQuery::by_status(ValidationStatus::Pending);
    query.confidence = Some(Confidence::High);
    query.oldest_first = true;
    let pending = self.store.data_points(&query).await?;
    let mut report = AutoValidateReport::default();

    for point in pending {
      let id = point.point_id;
      self.claim_for_review(id, actor).await?;
      match self.validate_item(id, actor).await {
        Ok(_) => report.outcomes.push((id, AutoOutcome::Validated)),
        Err(Error::ValidationFailed(failures)) => {
          report.outcomes.push((id, AutoOutcome::Failed(failures)));
        }
        Err(other) => return Err(other),
      }
    }

    info!(
      validated = report.validated(),
      failed = report.failed(),
      "auto-validation pass complete"
    );
    Ok(report)
  }

  /// Pending points, oldest first.
  pub async fn pending_queue(&self) -> Result<Vec<DataPoint>> {
    let mut query = DataPointQuery::by_status(ValidationStatus::Pending);
    query.oldest_first = true;
    self.store.data_points(&query).await
  }

  /// In-review points, oldest first.
  pub async fn review_queue(&self) -> Result<Vec<DataPoint>> {
    let mut query = DataPointQuery::by_status(ValidationStatus::InReview);
    query.oldest_first = true;
    self.store.data_points(&query).await
  }
}
