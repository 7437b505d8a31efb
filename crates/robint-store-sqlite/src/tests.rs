//! Integration tests for `SqliteStore` against an in-memory database.

use robint_core::{
  detect::{ChangeDetector, ChangeKind, Significance},
  ingest::{Finding, FindingSource, Ingestor},
  period::Period,
  point::{Confidence, DataPointPatch, NewDataPoint, Value},
  source::NewSource,
  status::ValidationStatus,
  store::{ChangeLogFilter, DataPointQuery, IntelStore},
  subject::Subject,
  workflow::ValidationWorkflow,
  Error,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory().await.expect("in-memory store");
  s.seed_defaults().await.expect("seed");
  s
}

async fn source_id(s: &SqliteStore) -> Uuid {
  s.add_source(NewSource::new("IFR World Robotics").with_url("https://ifr.org/wr"))
    .await
    .unwrap()
    .source_id
}

fn market_size(subject: Subject, period: Period, value: f64, src: Uuid) -> NewDataPoint {
  NewDataPoint::new("market_size", subject, Value::Number(value), period)
    .with_source(src)
}

/// Create, claim, and validate one point; returns its id.
async fn validated(
  s: &SqliteStore,
  subject: Subject,
  period: Period,
  value: f64,
  src: Uuid,
) -> Uuid {
  let point = s
    .create_data_point(market_size(subject, period, value, src))
    .await
    .unwrap();
  let wf = ValidationWorkflow::new(s);
  wf.claim_for_review(point.point_id, "ana").await.unwrap();
  wf.validate_item(point.point_id, "ana").await.unwrap();
  point.point_id
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seeding_is_idempotent() {
  let s = store().await;

  let first = s.statistics().await.unwrap();
  assert!(first.sectors > 0);
  assert!(first.dimensions > 0);
  assert!(first.technologies > 0);

  let again = s.seed_defaults().await.unwrap();
  assert_eq!(again.sectors, 0);
  assert_eq!(again.subcategories, 0);
  assert_eq!(again.dimensions, 0);
  assert_eq!(again.technologies, 0);

  let second = s.statistics().await.unwrap();
  assert_eq!(first.sectors, second.sectors);
  assert_eq!(first.subcategories, second.subcategories);
}

#[tokio::test]
async fn seeded_sector_carries_subcategories() {
  let s = store().await;
  let sector = s.sector("Mobile Robotics").await.unwrap().unwrap();
  assert!(sector.subcategories.iter().any(|c| c == "Drones/UAVs"));
  assert!(s.sector("Underwater Robotics").await.unwrap().is_none());
}

// ─── Referential integrity ───────────────────────────────────────────────────

#[tokio::test]
async fn unknown_dimension_is_rejected_without_a_row() {
  let s = store().await;
  let src = source_id(&s).await;
  let before = s.statistics().await.unwrap().data_points;

  let err = s
    .create_data_point(NewDataPoint::new(
      "sharpness",
      Subject::sector("Mobile Robotics"),
      Value::Number(1.0),
      Period::annual(2025),
    ).with_source(src))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownDimension(name) if name == "sharpness"));

  assert_eq!(s.statistics().await.unwrap().data_points, before);
}

#[tokio::test]
async fn unknown_subject_and_source_are_rejected() {
  let s = store().await;
  let src = source_id(&s).await;

  let err = s
    .create_data_point(market_size(
      Subject::sector("Underwater Robotics"),
      Period::annual(2025),
      1.0,
      src,
    ))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownSector(_)));

  let err = s
    .create_data_point(market_size(
      Subject::subcategory("Mobile Robotics", "Submarines"),
      Period::annual(2025),
      1.0,
      src,
    ))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownSubcategory { .. }));

  let err = s
    .create_data_point(market_size(
      Subject::sector("Mobile Robotics"),
      Period::annual(2025),
      1.0,
      Uuid::new_v4(),
    ))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownSource(_)));
}

#[tokio::test]
async fn value_kind_must_match_dimension() {
  let s = store().await;
  let src = source_id(&s).await;

  let err = s
    .create_data_point(
      NewDataPoint::new(
        "market_size",
        Subject::sector("Mobile Robotics"),
        Value::Text("forty billion".into()),
        Period::annual(2025),
      )
      .with_source(src),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::KindMismatch { .. }));
}

// ─── State machine ───────────────────────────────────────────────────────────

#[tokio::test]
async fn illegal_transitions_fail_closed() {
  let s = store().await;
  let src = source_id(&s).await;
  let wf = ValidationWorkflow::new(&s);

  let point = s
    .create_data_point(market_size(
      Subject::sector("Mobile Robotics"),
      Period::annual(2025),
      40.0,
      src,
    ))
    .await
    .unwrap();

  // pending -> validated skips review.
  let err = wf.validate_item(point.point_id, "ana").await.unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { .. }));

  wf.claim_for_review(point.point_id, "ana").await.unwrap();
  let err = wf.claim_for_review(point.point_id, "ana").await.unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { .. }));

  wf.reject_item(point.point_id, "ana", "figure is a projection")
    .await
    .unwrap();
  let err = wf.claim_for_review(point.point_id, "ana").await.unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn rejection_requires_a_reason() {
  let s = store().await;
  let src = source_id(&s).await;
  let wf = ValidationWorkflow::new(&s);

  let point = s
    .create_data_point(market_size(
      Subject::sector("Mobile Robotics"),
      Period::annual(2025),
      40.0,
      src,
    ))
    .await
    .unwrap();
  wf.claim_for_review(point.point_id, "ana").await.unwrap();

  let err = wf.reject_item(point.point_id, "ana", "  ").await.unwrap_err();
  assert!(matches!(err, Error::MissingReason));

  // Still in review, so a proper rejection goes through.
  wf.reject_item(point.point_id, "ana", "duplicate of earlier entry")
    .await
    .unwrap();
}

#[tokio::test]
async fn validation_gate_blocks_rule_failures() {
  let s = store().await;
  let wf = ValidationWorkflow::new(&s);

  // No source, confidence medium: has_source must fail.
  let point = s
    .create_data_point(NewDataPoint::new(
      "market_size",
      Subject::sector("Mobile Robotics"),
      Value::Number(40.0),
      Period::annual(2025),
    ))
    .await
    .unwrap();
  wf.claim_for_review(point.point_id, "ana").await.unwrap();

  let err = wf.validate_item(point.point_id, "ana").await.unwrap_err();
  let Error::ValidationFailed(failures) = err else {
    panic!("expected ValidationFailed");
  };
  assert!(failures.iter().any(|f| f.rule == "has_source"));

  // The point stays in review for correction.
  let current = s.data_point(point.point_id).await.unwrap().unwrap();
  assert_eq!(current.status, ValidationStatus::InReview);
}

#[tokio::test]
async fn validated_point_records_analyst_and_timestamp() {
  let s = store().await;
  let src = source_id(&s).await;
  let id = validated(
    &s,
    Subject::sector("Mobile Robotics"),
    Period::annual(2025),
    40.0,
    src,
  )
  .await;

  let point = s.data_point(id).await.unwrap().unwrap();
  assert_eq!(point.status, ValidationStatus::Validated);
  assert_eq!(point.validated_by.as_deref(), Some("ana"));
  assert!(point.validated_at.is_some());
}

// ─── Supersession & staleness ────────────────────────────────────────────────

#[tokio::test]
async fn supersession_retires_prior_validated_point() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  let old = validated(&s, subject.clone(), Period::annual(2025), 40.0, src).await;
  let before = s.statistics().await.unwrap().data_points;

  let new = validated(&s, subject, Period::annual(2025), 42.5, src).await;

  let old_point = s.data_point(old).await.unwrap().unwrap();
  assert_eq!(old_point.status, ValidationStatus::Outdated);
  let new_point = s.data_point(new).await.unwrap().unwrap();
  assert_eq!(new_point.status, ValidationStatus::Validated);

  // Row count changed only by the new insert: nothing was deleted.
  assert_eq!(s.statistics().await.unwrap().data_points, before + 1);
}

#[tokio::test]
async fn different_periods_do_not_supersede() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  let y2024 = validated(&s, subject.clone(), Period::annual(2024), 40.0, src).await;
  let y2025 = validated(&s, subject, Period::annual(2025), 45.2, src).await;

  for id in [y2024, y2025] {
    let point = s.data_point(id).await.unwrap().unwrap();
    assert_eq!(point.status, ValidationStatus::Validated);
  }
}

#[tokio::test]
async fn staleness_sweep_retires_old_validated_points() {
  let s = store().await;
  let src = source_id(&s).await;
  let wf = ValidationWorkflow::new(&s);

  let stale = validated(
    &s,
    Subject::sector("Industrial Robotics"),
    Period::annual(2015),
    12.0,
    src,
  )
  .await;
  let fresh = validated(
    &s,
    Subject::sector("Mobile Robotics"),
    Period::annual(2025),
    40.0,
    src,
  )
  .await;

  let report = wf.sweep_stale("sweeper").await.unwrap();
  assert_eq!(report.examined, 2);
  assert_eq!(report.outdated, vec![stale]);

  let stale_point = s.data_point(stale).await.unwrap().unwrap();
  assert_eq!(stale_point.status, ValidationStatus::Outdated);
  let fresh_point = s.data_point(fresh).await.unwrap().unwrap();
  assert_eq!(fresh_point.status, ValidationStatus::Validated);
}

// ─── Change detection ────────────────────────────────────────────────────────

#[tokio::test]
async fn year_over_year_market_size_growth_is_significant() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  validated(&s, subject.clone(), Period::annual(2024), 40.0, src).await;
  validated(&s, subject.clone(), Period::annual(2025), 45.2, src).await;

  let records = ChangeDetector::new(&s)
    .year_over_year(Period::annual(2025))
    .await
    .unwrap();
  assert_eq!(records.len(), 1);

  let record = &records[0];
  assert_eq!(record.dimension, "market_size");
  assert_eq!(record.subject, subject);
  assert_eq!(record.kind, ChangeKind::Delta);
  assert!((record.delta.unwrap() - 5.2).abs() < 1e-9);
  assert!((record.percent_delta.unwrap() - 13.0).abs() < 0.01);
  assert_eq!(record.significance, Significance::Significant);
}

#[tokio::test]
async fn zero_old_value_reports_no_percentage() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Agricultural Robotics");

  validated(&s, subject.clone(), Period::annual(2024), 0.0, src).await;
  validated(&s, subject, Period::annual(2025), 5.0, src).await;

  let records = ChangeDetector::new(&s)
    .year_over_year(Period::annual(2025))
    .await
    .unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].delta, Some(5.0));
  assert_eq!(records[0].percent_delta, None);
  assert_eq!(records[0].significance, Significance::Minor);
}

#[tokio::test]
async fn unvetted_points_never_produce_trends() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  validated(&s, subject.clone(), Period::annual(2024), 40.0, src).await;
  // 2025 exists but is only pending.
  s.create_data_point(market_size(subject, Period::annual(2025), 99.0, src))
    .await
    .unwrap();

  let records = ChangeDetector::new(&s)
    .year_over_year(Period::annual(2025))
    .await
    .unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].kind, ChangeKind::RemovedKey);
}

#[tokio::test]
async fn outdated_point_stands_in_for_an_empty_period() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  let old = validated(&s, subject.clone(), Period::annual(2024), 40.0, src).await;
  // The 2024 record ages out; no validated 2024 point remains.
  s.set_status(old, ValidationStatus::Outdated, "sweeper", None)
    .await
    .unwrap();
  validated(&s, subject.clone(), Period::annual(2025), 45.2, src).await;

  let records = ChangeDetector::new(&s)
    .year_over_year(Period::annual(2025))
    .await
    .unwrap();
  assert_eq!(records.len(), 1, "the trend line must survive the sweep");
  assert_eq!(records[0].kind, ChangeKind::Delta);
  assert!((records[0].percent_delta.unwrap() - 13.0).abs() < 0.01);
}

#[tokio::test]
async fn validated_point_outranks_outdated_in_same_period() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  // 38.0 is superseded by 40.0 within 2024.
  validated(&s, subject.clone(), Period::annual(2024), 38.0, src).await;
  validated(&s, subject.clone(), Period::annual(2024), 40.0, src).await;
  validated(&s, subject, Period::annual(2025), 45.2, src).await;

  let records = ChangeDetector::new(&s)
    .year_over_year(Period::annual(2025))
    .await
    .unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(
    records[0].old_value.as_ref().and_then(|v| v.as_number()),
    Some(40.0)
  );
}

#[tokio::test]
async fn change_records_order_by_percent_magnitude_with_key_events_last() {
  let s = store().await;
  let src = source_id(&s).await;

  async fn put(
    s: &SqliteStore,
    dimension: &str,
    subject: Subject,
    period: Period,
    value: f64,
    src: Uuid,
  ) {
    let point = s
      .create_data_point(
        NewDataPoint::new(dimension, subject, Value::Number(value), period)
          .with_source(src),
      )
      .await
      .unwrap();
    let wf = ValidationWorkflow::new(s);
    wf.claim_for_review(point.point_id, "ana").await.unwrap();
    wf.validate_item(point.point_id, "ana").await.unwrap();
  }

  let mobile = Subject::sector("Mobile Robotics");
  let service = Subject::sector("Service Robotics");
  let agri = Subject::sector("Agricultural Robotics");

  // +25%, +15%, two ties at +5%, and one key event with no percentage.
  put(&s, "market_size", mobile.clone(), Period::annual(2024), 40.0, src).await;
  put(&s, "market_size", mobile.clone(), Period::annual(2025), 50.0, src).await;
  put(&s, "adoption_rate", mobile.clone(), Period::annual(2024), 10.0, src).await;
  put(&s, "adoption_rate", mobile, Period::annual(2025), 11.5, src).await;
  put(&s, "market_size", service.clone(), Period::annual(2024), 20.0, src).await;
  put(&s, "market_size", service.clone(), Period::annual(2025), 21.0, src).await;
  put(&s, "adoption_rate", service.clone(), Period::annual(2024), 20.0, src).await;
  put(&s, "adoption_rate", service, Period::annual(2025), 21.0, src).await;
  put(&s, "unit_shipments", agri, Period::annual(2025), 900.0, src).await;

  let records = ChangeDetector::new(&s)
    .year_over_year(Period::annual(2025))
    .await
    .unwrap();

  let keys: Vec<_> = records
    .iter()
    .map(|r| (r.dimension.as_str(), r.subject.name()))
    .collect();
  assert_eq!(
    keys,
    vec![
      ("market_size", "Mobile Robotics"),   // +25%
      ("adoption_rate", "Mobile Robotics"), // +15%
      ("adoption_rate", "Service Robotics"), // +5%, dimension breaks the tie
      ("market_size", "Service Robotics"),  // +5%
      ("unit_shipments", "Agricultural Robotics"), // new key, no percentage
    ]
  );
  assert_eq!(records[4].kind, ChangeKind::NewKey);
  assert!(records[4].percent_delta.is_none());
  assert_eq!(records[4].significance, Significance::Significant);
}

// ─── Audit ledger ────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_mutation_appends_one_ledger_row() {
  let s = store().await;
  let src = source_id(&s).await;
  let wf = ValidationWorkflow::new(&s);

  let point = s
    .create_data_point(market_size(
      Subject::sector("Mobile Robotics"),
      Period::annual(2025),
      40.0,
      src,
    ))
    .await
    .unwrap();
  wf.claim_for_review(point.point_id, "ana").await.unwrap();
  wf.validate_item(point.point_id, "ana").await.unwrap();

  let patch = DataPointPatch {
    confidence: Some(Confidence::High),
    ..Default::default()
  };
  s.update_data_point(point.point_id, patch, "ana", "second source confirms")
    .await
    .unwrap();

  let filter = ChangeLogFilter {
    data_point_id: Some(point.point_id),
    ..Default::default()
  };
  let entries = s.changes(&filter).await.unwrap();
  // insert + two status changes + one update.
  assert_eq!(entries.len(), 4);

  // Latest-first: the update tops the list, the insert closes it.
  assert!(entries[0].before.is_some() && entries[0].after.is_some());
  assert_eq!(entries[0].reason.as_deref(), Some("second source confirms"));
  let insert = entries.last().unwrap();
  assert!(insert.before.is_none());
  assert!(insert.after.is_some());

  for entry in &entries[..entries.len() - 1] {
    assert!(entry.before.is_some(), "non-insert entries carry both snapshots");
    assert!(entry.after.is_some());
  }
}

#[tokio::test]
async fn empty_patch_writes_nothing() {
  let s = store().await;
  let src = source_id(&s).await;

  let point = s
    .create_data_point(market_size(
      Subject::sector("Mobile Robotics"),
      Period::annual(2025),
      40.0,
      src,
    ))
    .await
    .unwrap();

  let unchanged = s
    .update_data_point(point.point_id, DataPointPatch::default(), "ana", "noop")
    .await
    .unwrap();
  assert_eq!(unchanged.updated_at, point.updated_at);

  let filter = ChangeLogFilter {
    data_point_id: Some(point.point_id),
    ..Default::default()
  };
  assert_eq!(s.changes(&filter).await.unwrap().len(), 1);
}

// ─── Query ordering ──────────────────────────────────────────────────────────

#[tokio::test]
async fn data_points_order_latest_first_and_stable() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  for period in [
    Period::annual(2023),
    Period::quarterly(2024, 2).unwrap(),
    Period::annual(2024),
    Period::monthly(2024, 7).unwrap(),
  ] {
    s.create_data_point(market_size(subject.clone(), period, 1.0, src))
      .await
      .unwrap();
  }

  let query = DataPointQuery {
    dimension: Some("market_size".into()),
    ..Default::default()
  };
  let first = s.data_points(&query).await.unwrap();
  let periods: Vec<_> = first.iter().map(|p| p.period).collect();
  assert_eq!(
    periods,
    vec![
      Period::monthly(2024, 7).unwrap(),   // 2024, Q3
      Period::quarterly(2024, 2).unwrap(), // 2024, Q2
      Period::annual(2024),                // 2024, no quarter
      Period::annual(2023),
    ]
  );

  let second = s.data_points(&query).await.unwrap();
  let ids = |points: &[robint_core::point::DataPoint]| {
    points.iter().map(|p| p.point_id).collect::<Vec<_>>()
  };
  assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn review_queues_are_fifo() {
  let s = store().await;
  let src = source_id(&s).await;
  let wf = ValidationWorkflow::new(&s);
  let subject = Subject::sector("Mobile Robotics");

  let a = s
    .create_data_point(market_size(subject.clone(), Period::annual(2023), 1.0, src))
    .await
    .unwrap();
  let b = s
    .create_data_point(market_size(subject.clone(), Period::annual(2025), 2.0, src))
    .await
    .unwrap();
  let c = s
    .create_data_point(market_size(subject, Period::annual(2024), 3.0, src))
    .await
    .unwrap();

  let queue = wf.pending_queue().await.unwrap();
  let ids: Vec<_> = queue.iter().map(|p| p.point_id).collect();
  assert_eq!(ids, vec![a.point_id, b.point_id, c.point_id]);
}

#[tokio::test]
async fn exact_period_filter_overrides_year() {
  let s = store().await;
  let src = source_id(&s).await;
  let subject = Subject::sector("Mobile Robotics");

  s.create_data_point(market_size(subject.clone(), Period::annual(2024), 38.0, src))
    .await
    .unwrap();
  s.create_data_point(market_size(subject, Period::annual(2025), 40.0, src))
    .await
    .unwrap();

  // A disagreeing year filter must not leak into an exact-period query.
  let query = DataPointQuery {
    year: Some(2024),
    period: Some(Period::annual(2025)),
    ..Default::default()
  };
  let points = s.data_points(&query).await.unwrap();
  assert_eq!(points.len(), 1);
  assert_eq!(points[0].period, Period::annual(2025));
}

#[tokio::test]
async fn sector_filter_includes_subcategories() {
  let s = store().await;
  let src = source_id(&s).await;

  s.create_data_point(market_size(
    Subject::sector("Mobile Robotics"),
    Period::annual(2025),
    40.0,
    src,
  ))
  .await
  .unwrap();
  s.create_data_point(market_size(
    Subject::subcategory("Mobile Robotics", "Drones/UAVs"),
    Period::annual(2025),
    12.0,
    src,
  ))
  .await
  .unwrap();
  s.create_data_point(market_size(
    Subject::sector("Service Robotics"),
    Period::annual(2025),
    20.0,
    src,
  ))
  .await
  .unwrap();

  let query = DataPointQuery {
    sector: Some("Mobile Robotics".into()),
    ..Default::default()
  };
  assert_eq!(s.data_points(&query).await.unwrap().len(), 2);
}

#[test]
fn out_of_range_period_columns_fail_to_decode() {
  let raw = crate::encode::RawDataPoint {
    point_id:       "0cc2a0f0-9182-4b7f-b2a5-83d0dba6af12".into(),
    dimension:      "market_size".into(),
    subject_kind:   "sector".into(),
    subject_sector: None,
    subject_name:   "Mobile Robotics".into(),
    value_json:     r#"{"kind":"number","value":40.0}"#.into(),
    year:           2025,
    quarter:        Some(257), // hand-edited garbage
    month:          None,
    confidence:     "medium".into(),
    status:         "pending".into(),
    source_id:      None,
    validated_by:   None,
    validated_at:   None,
    notes:          None,
    created_at:     "2025-01-01T00:00:00+00:00".into(),
    updated_at:     "2025-01-01T00:00:00+00:00".into(),
  };

  let err = raw.into_point().unwrap_err();
  assert!(matches!(err, crate::Error::Decode(_)), "got: {err}");
}

// ─── Sources & ingestion ─────────────────────────────────────────────────────

#[tokio::test]
async fn sources_deduplicate_by_url() {
  let s = store().await;

  let first = s
    .get_or_create_source(NewSource::new("IFR").with_url("https://ifr.org/wr"))
    .await
    .unwrap();
  let second = s
    .get_or_create_source(
      NewSource::new("IFR World Robotics 2025").with_url("https://ifr.org/wr"),
    )
    .await
    .unwrap();
  assert_eq!(first.source_id, second.source_id);

  let other = s
    .get_or_create_source(NewSource::new("IFR").with_url("https://ifr.org/other"))
    .await
    .unwrap();
  assert_ne!(first.source_id, other.source_id);
}

#[tokio::test]
async fn ingest_batch_collects_per_item_failures() {
  let s = store().await;
  let ingestor = Ingestor::new(&s);

  let good = Finding {
    dimension:  "market_size".into(),
    subject:    Subject::sector("Mobile Robotics"),
    value:      serde_json::json!(40.0),
    year:       2025,
    quarter:    None,
    month:      None,
    confidence: Confidence::Medium,
    source:     Some(FindingSource {
      name:        "IFR".into(),
      url:         Some("https://ifr.org/wr".into()),
      source_type: Default::default(),
      reliability: Some(0.9),
    }),
    notes:      None,
  };
  let bad = Finding {
    dimension: "sharpness".into(),
    ..good.clone()
  };

  let report = ingestor.ingest_batch(vec![good, bad]).await.unwrap();
  assert_eq!(report.created.len(), 1);
  assert_eq!(report.failed.len(), 1);
  assert_eq!(report.failed[0].0, 1);
  assert!(matches!(report.failed[0].1, Error::UnknownDimension(_)));

  let point = s.data_point(report.created[0]).await.unwrap().unwrap();
  assert_eq!(point.status, ValidationStatus::Pending);
  assert!(point.source_id.is_some());
}

#[tokio::test]
async fn auto_validate_only_touches_high_confidence_points() {
  let s = store().await;
  let src = source_id(&s).await;
  let wf = ValidationWorkflow::new(&s);

  let clean = s
    .create_data_point(
      market_size(Subject::sector("Mobile Robotics"), Period::annual(2025), 40.0, src)
        .with_confidence(Confidence::High),
    )
    .await
    .unwrap();
  // Out-of-bounds market size: the engine must hold this one back.
  s.create_data_point(
    market_size(Subject::sector("Service Robotics"), Period::annual(2025), 5000.0, src)
      .with_confidence(Confidence::High),
  )
  .await
  .unwrap();
  // Medium confidence: the machine may not validate this one at all.
  let manual = s
    .create_data_point(market_size(
      Subject::sector("Industrial Robotics"),
      Period::annual(2025),
      16.0,
      src,
    ))
    .await
    .unwrap();

  let report = wf.auto_validate("bot").await.unwrap();
  assert_eq!(report.validated(), 1);
  assert_eq!(report.failed(), 1);

  let validated = s.data_point(clean.point_id).await.unwrap().unwrap();
  assert_eq!(validated.status, ValidationStatus::Validated);

  // The medium-confidence point is left exactly where it was.
  let untouched = s.data_point(manual.point_id).await.unwrap().unwrap();
  assert_eq!(untouched.status, ValidationStatus::Pending);

  let pending: Vec<_> = wf.pending_queue().await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].point_id, manual.point_id);
  assert_eq!(wf.review_queue().await.unwrap().len(), 1);
}
