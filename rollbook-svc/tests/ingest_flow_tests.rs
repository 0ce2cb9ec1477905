//! End-to-end ingestion tests: parse, validate, dedupe, chunked insert

mod helpers;

use rollbook_common::events::{EventBus, RollbookEvent};
use rollbook_svc::db;
use rollbook_svc::models::{
    BatchStatus, IngestFailure, IngestMode, RecordStatus, RowDisposition,
};
use rollbook_svc::services::ingestor::{self, IngestError, IngestRequest};
use rollbook_svc::services::spreadsheet::{FormatError, EXPECTED_HEADERS};

use helpers::{build_workbook, row_with, submitter, template_row, test_pool, valid_workbook};

fn request(bytes: Vec<u8>, mode: IngestMode) -> IngestRequest {
    IngestRequest {
        file_bytes: bytes,
        file_name: Some("voters.xlsx".to_string()),
        batch_name: "August drive".to_string(),
        mode,
    }
}

#[tokio::test]
async fn large_upload_inserts_every_row_in_chunks() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let ctx = submitter("sub1");

    let result = ingestor::ingest(
        &pool,
        &bus,
        request(valid_workbook(120), IngestMode::Submit),
        &ctx,
    )
    .await
    .unwrap();

    assert_eq!(result.total_parsed, 120);
    assert_eq!(result.total_inserted, 120);
    assert_eq!(result.total_errors, 0);
    assert_eq!(result.total_duplicates, 0);
    assert!(result.failure.is_none());
    assert!(result.accounts_for_all_rows());
    assert_eq!(result.batch_status, BatchStatus::Submitted);

    // 120 rows at a chunk size of 100 means two progress events
    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RollbookEvent::IngestProgress {
            inserted_so_far, ..
        } = event
        {
            progress.push(inserted_so_far);
        }
    }
    assert_eq!(progress, vec![100, 120]);

    let batch = db::batches::get(&pool, result.batch_id).await.unwrap().unwrap();
    assert_eq!(batch.total_records, 120);
    assert_eq!(batch.pending_records, 120);
    assert_eq!(batch.status, BatchStatus::Submitted);

    let pending = db::voters::list(&pool, Some(RecordStatus::Pending), None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 120);
    assert!(pending.iter().all(|r| r.batch_id == Some(result.batch_id)));
    assert!(pending.iter().all(|r| r.submitted_at.is_some()));
}

#[tokio::test]
async fn missing_header_aborts_before_any_persistence() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let ctx = submitter("sub1");

    let headers: Vec<&str> = EXPECTED_HEADERS
        .iter()
        .copied()
        .filter(|h| *h != "VoterID")
        .collect();
    let rows = vec![vec!["x".to_string(); headers.len()]];
    let bytes = build_workbook(&headers, &rows);

    let result = ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx).await;

    match result {
        Err(IngestError::Format(FormatError::MissingHeaders { missing })) => {
            assert_eq!(missing, vec!["VoterID".to_string()]);
        }
        other => panic!("expected MissingHeaders, got {:?}", other.is_ok()),
    }

    // Nothing was created: no batch, no records
    assert!(db::batches::list(&pool).await.unwrap().is_empty());
    assert!(db::voters::list(&pool, None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn in_batch_duplicate_keeps_first_occurrence() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let ctx = submitter("sub1");

    let rows = vec![
        template_row("VIDAAA0001", "First", "9000000001"),
        template_row("VIDAAA0001", "Second", "9000000001"),
    ];
    let bytes = build_workbook(&EXPECTED_HEADERS, &rows);

    let result = ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx)
        .await
        .unwrap();

    assert_eq!(result.total_parsed, 2);
    assert_eq!(result.total_inserted, 1);
    assert_eq!(result.total_duplicates, 1);

    let outcome = result
        .per_row_outcome
        .iter()
        .find(|o| o.row == 3)
        .unwrap();
    assert_eq!(
        outcome.disposition,
        RowDisposition::Duplicate { at_commit: false }
    );

    let records = db::voters::list(&pool, None, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "First");
}

#[tokio::test]
async fn store_collision_is_reported_as_duplicate() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let ctx = submitter("sub1");

    // Seed the first upload, then collide with it from a second one
    let bytes = build_workbook(
        &EXPECTED_HEADERS,
        &[template_row("VIDBBB0001", "Seeded", "9000000011")],
    );
    ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx)
        .await
        .unwrap();

    let bytes = build_workbook(
        &EXPECTED_HEADERS,
        &[
            template_row("VIDBBB0001", "Colliding", "9000000011"),
            template_row("VIDBBB0002", "Fresh", "9000000012"),
        ],
    );
    let result = ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx)
        .await
        .unwrap();

    assert_eq!(result.total_inserted, 1);
    assert_eq!(result.total_duplicates, 1);
    assert!(result.failure.is_none());
}

#[tokio::test]
async fn submit_mode_gates_rows_with_validation_errors() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let ctx = submitter("sub1");

    let rows = vec![
        row_with("VIDCCC0001", "Valid", "9000000021", "34"),
        row_with("VIDCCC0002", "Underage", "9000000022", "17"),
    ];
    let bytes = build_workbook(&EXPECTED_HEADERS, &rows);

    let result = ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx)
        .await
        .unwrap();

    assert_eq!(result.total_parsed, 2);
    assert_eq!(result.total_inserted, 1);
    assert_eq!(result.total_errors, 1);
    assert_eq!(result.validation_errors.len(), 1);
    assert_eq!(result.validation_errors[0].row, 3);
    assert_eq!(result.validation_errors[0].field, "Age");
    assert_eq!(
        result.validation_errors[0].message,
        "Age must be between 18 and 120"
    );

    let outcome = result.per_row_outcome.iter().find(|o| o.row == 3).unwrap();
    assert_eq!(outcome.disposition, RowDisposition::ValidationFailed);

    let records = db::voters::list(&pool, None, None).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn draft_mode_persists_invalid_rows_as_drafts() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let ctx = submitter("sub1");

    let rows = vec![
        row_with("VIDDDD0001", "Valid", "9000000031", "34"),
        row_with("VIDDDD0002", "Underage", "9000000032", "17"),
    ];
    let bytes = build_workbook(&EXPECTED_HEADERS, &rows);

    let result = ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Draft), &ctx)
        .await
        .unwrap();

    // The invalid row still lands; its errors are reported alongside
    assert_eq!(result.total_inserted, 2);
    assert_eq!(result.total_errors, 1);
    assert_eq!(result.batch_status, BatchStatus::Draft);

    let records = db::voters::list(&pool, Some(RecordStatus::Draft), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.submitted_at.is_none()));

    let batch = db::batches::get(&pool, result.batch_id).await.unwrap().unwrap();
    assert_eq!(batch.pending_records, 0);
    assert_eq!(batch.status, BatchStatus::Draft);
}

#[tokio::test]
async fn commit_time_duplicate_aborts_and_batch_reflects_committed_rows() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let ctx = submitter("sub1");

    // Seed a record the second upload will collide with
    let bytes = build_workbook(
        &EXPECTED_HEADERS,
        &[template_row("VIDFFF0001", "Seeded", "9000000051")],
    );
    ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx)
        .await
        .unwrap();

    // Draft mode: the invalid row bypasses the advisory pre-check, so
    // its identity collision surfaces only at commit time and rolls the
    // whole chunk back
    let rows = vec![
        row_with("VIDFFF0002", "Fresh", "9000000052", "34"),
        row_with("VIDFFF0001", "Colliding", "9000000051", "17"),
    ];
    let bytes = build_workbook(&EXPECTED_HEADERS, &rows);
    let result = ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Draft), &ctx)
        .await
        .unwrap();

    assert_eq!(result.total_inserted, 0);
    assert_eq!(
        result.failure,
        Some(IngestFailure::DuplicateAtCommit {
            chunk_index: 0,
            row: 3,
        })
    );

    let row2 = result.per_row_outcome.iter().find(|o| o.row == 2).unwrap();
    assert_eq!(row2.disposition, RowDisposition::SkippedAborted);
    let row3 = result.per_row_outcome.iter().find(|o| o.row == 3).unwrap();
    assert_eq!(
        row3.disposition,
        RowDisposition::Duplicate { at_commit: true }
    );

    // The batch row was created for 2 rows but none committed; its
    // totals must reflect what actually landed
    let batch = db::batches::get(&pool, result.batch_id).await.unwrap().unwrap();
    assert_eq!(batch.total_records, 0);
    assert_eq!(batch.pending_records, 0);

    // Only the seeded record exists
    assert_eq!(db::voters::list(&pool, None, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn completion_event_carries_final_totals() {
    let pool = test_pool().await;
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let ctx = submitter("sub1");

    let rows = vec![
        template_row("VIDEEE0001", "One", "9000000041"),
        template_row("VIDEEE0001", "Dup", "9000000041"),
    ];
    let bytes = build_workbook(&EXPECTED_HEADERS, &rows);

    ingestor::ingest(&pool, &bus, request(bytes, IngestMode::Submit), &ctx)
        .await
        .unwrap();

    let mut completed = None;
    while let Ok(event) = rx.try_recv() {
        if let RollbookEvent::IngestCompleted {
            total_inserted,
            total_duplicates,
            aborted,
            ..
        } = event
        {
            completed = Some((total_inserted, total_duplicates, aborted));
        }
    }
    assert_eq!(completed, Some((1, 1, false)));
}
