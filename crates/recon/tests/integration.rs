use shelfline_core::{CellPos, NormalizedRow};
use shelfline_recon::{
    finalize, reconcile, ConflictResolution, HistoricalProductRecord, IncomingRow, ReconError, ReconInput,
    ReconciliationOutcome, RecordStatus, ResolutionDecision,
};

fn rec(code: &str, name: &str, ty: &str, version: &str) -> HistoricalProductRecord {
    HistoricalProductRecord {
        code: code.into(),
        name: name.into(),
        product_type: ty.into(),
        version_id: version.into(),
        status: RecordStatus::Unchanged,
    }
}

fn incoming(rows: &[(&str, &str)]) -> Vec<IncomingRow> {
    rows.iter().map(|(c, n)| IncomingRow::new(*c, *n, "fruit")).collect()
}

/// Current version is the last one in `history`.
fn run(rows: &[(&str, &str)], history: Vec<HistoricalProductRecord>) -> shelfline_recon::ReconResult {
    let current_version = history.last().map(|r| r.version_id.clone());
    let current = history
        .iter()
        .filter(|r| Some(&r.version_id) == current_version.as_ref())
        .cloned()
        .collect();
    reconcile(&ReconInput {
        incoming: incoming(rows),
        current,
        history,
        target_version: "v9".into(),
        duplicates_skipped: 0,
    })
    .unwrap()
}

// -------------------------------------------------------------------------
// Classification
// -------------------------------------------------------------------------

#[test]
fn first_upload_is_all_unchanged() {
    let result = run(&[("10000", "Apple"), ("20000", "Pear")], Vec::new());
    assert!(result.meta.first_upload);
    assert_eq!(result.summary.unchanged, 2);
    assert_eq!(result.summary.conflicts, 0);
    assert_eq!(result.summary.code_changed, 0);
    assert_eq!(result.summary.new, 0);
    assert!(result.removed.is_empty());
}

#[test]
fn same_code_same_name_is_unchanged() {
    let result = run(&[("10000", "Apple")], vec![rec("10000", "Apple", "fruit", "v1")]);
    assert_eq!(result.rows[0].outcome, ReconciliationOutcome::Unchanged);
}

#[test]
fn same_code_other_name_is_conflict() {
    let result = run(&[("10000", "Pear")], vec![rec("10000", "Apple", "fruit", "v1")]);
    assert_eq!(
        result.rows[0].outcome,
        ReconciliationOutcome::Conflict {
            incoming_name: "Pear".into(),
            existing_name: "Apple".into(),
        }
    );
    // Blocked until resolved
    assert!(result.produced.is_empty());
    assert_eq!(result.conflicts().len(), 1);
}

#[test]
fn same_name_new_code_is_code_changed() {
    let result = run(&[("20000", "Apple")], vec![rec("10000", "Apple", "fruit", "v1")]);
    assert_eq!(
        result.rows[0].outcome,
        ReconciliationOutcome::CodeChanged { old_code: "10000".into() }
    );
    // The old code is carried forward, not removed
    assert!(result.removed.is_empty());
    assert_eq!(result.produced[0].status, RecordStatus::CodeChanged);
}

#[test]
fn missing_current_record_is_removed() {
    let result = run(
        &[("10000", "Apple")],
        vec![rec("10000", "Apple", "fruit", "v1"), rec("20000", "Banana", "fruit", "v1")],
    );
    assert_eq!(result.removed.len(), 1);
    assert_eq!(result.removed[0].name, "Banana");
    assert_eq!(result.summary.removed, 1);
}

#[test]
fn removal_is_scoped_to_incoming_partitions() {
    let result = run(
        &[("10000", "Apple")],
        vec![rec("10000", "Apple", "fruit", "v1"), rec("50000", "Rye", "bakery", "v1")],
    );
    assert!(result.removed.is_empty());
}

#[test]
fn earlier_version_supplies_old_code() {
    let history = vec![
        rec("10000", "Apple", "fruit", "v1"),
        rec("11000", "Apple", "fruit", "v2"),
        rec("30000", "Fig", "fruit", "v3"),
    ];
    let result = run(&[("12000", "apple"), ("30000", "Fig"), ("40000", "Kiwi")], history);
    assert_eq!(
        result.rows[0].outcome,
        ReconciliationOutcome::CodeChanged { old_code: "11000".into() }
    );
    assert_eq!(result.rows[1].outcome, ReconciliationOutcome::Unchanged);
    assert_eq!(result.rows[2].outcome, ReconciliationOutcome::New);
}

#[test]
fn names_are_partitioned_by_type() {
    let history = vec![rec("10000", "Apple", "bakery", "v1")];
    let result = run(&[("20000", "Apple")], history);
    assert_eq!(result.rows[0].outcome, ReconciliationOutcome::New);
}

#[test]
fn reconciliation_is_repeatable() {
    let history = vec![rec("10000", "Apple", "fruit", "v1"), rec("20000", "Banana", "fruit", "v1")];
    let a = run(&[("10000", "Pear"), ("30000", "Banana")], history.clone());
    let b = run(&[("10000", "Pear"), ("30000", "Banana")], history);
    assert_eq!(a.rows, b.rows);
    assert_eq!(a.removed, b.removed);
    assert_eq!(a.summary, b.summary);
}

#[test]
fn parsed_rows_feed_the_engine() {
    let rows = vec![NormalizedRow {
        code: "04011".into(),
        display_name: "Rye bread".into(),
        source_position: CellPos::new(1, 0),
        image_position: None,
    }];
    let result = reconcile(&ReconInput {
        incoming: IncomingRow::from_rows(&rows, "bakery"),
        target_version: "v1".into(),
        duplicates_skipped: 2,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(result.produced[0].product_type, "bakery");
    assert_eq!(result.summary.duplicates_skipped, 2);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["rows"][0]["outcome"]["kind"], "unchanged");
    assert_eq!(json["meta"]["target_version"], "v1");
}

// -------------------------------------------------------------------------
// Resolution + publication gate
// -------------------------------------------------------------------------

fn conflicted() -> shelfline_recon::ReconResult {
    run(
        &[("10000", "Pear"), ("30000", "Fig")],
        vec![rec("10000", "Apple", "fruit", "v1")],
    )
}

#[test]
fn replace_keeps_incoming_name() {
    let records = finalize(
        &conflicted(),
        &[ConflictResolution::new("10000", ResolutionDecision::Replace)],
    )
    .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "Pear");
    assert_eq!(records[0].status, RecordStatus::Unchanged);
    assert_eq!(records[1].name, "Fig");
    assert_eq!(records[1].status, RecordStatus::New);
}

#[test]
fn ignore_keeps_existing_name() {
    let records = finalize(
        &conflicted(),
        &[ConflictResolution::new("10000", ResolutionDecision::Ignore)],
    )
    .unwrap();
    assert_eq!(records[0].name, "Apple");
    assert_eq!(records[0].status, RecordStatus::Unchanged);
    assert_eq!(records[0].version_id, "v9");
}

#[test]
fn unresolved_conflicts_block_finalization() {
    let err = finalize(&conflicted(), &[]).unwrap_err();
    assert_eq!(err, ReconError::UnresolvedConflicts { codes: vec!["10000".into()] });
    assert_eq!(err.to_string(), "1 unresolved conflict(s): 10000");
}

#[test]
fn bad_resolutions_are_rejected() {
    let result = conflicted();

    let unknown = finalize(&result, &[ConflictResolution::new("30000", ResolutionDecision::Replace)]);
    assert_eq!(unknown.unwrap_err(), ReconError::UnknownConflict { code: "30000".into() });

    let twice = finalize(
        &result,
        &[
            ConflictResolution::new("10000", ResolutionDecision::Replace),
            ConflictResolution::new("10000", ResolutionDecision::Ignore),
        ],
    );
    assert_eq!(twice.unwrap_err(), ReconError::DuplicateResolution { code: "10000".into() });

    let keep_both = finalize(&result, &[ConflictResolution::new("10000", ResolutionDecision::KeepBoth)]);
    assert_eq!(keep_both.unwrap_err(), ReconError::KeepBothUnsupported { code: "10000".into() });
}
