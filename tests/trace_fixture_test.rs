//! End-to-end tests over a captured LTE RRC trace
//!
//! The fixture covers every body shape the router knows (metadata only,
//! decoded PDU, further-decoding section, unroutable tail, broken root line)
//! plus two handovers with their completions.

use std::path::PathBuf;

use rrcscope::{
    analyze, parse_file, parse_lines, process_lines, AnomalyCategory, AnomalyKind, Cell,
    EntryIndex, HandoverKind, TrackerConfig,
};
use serde_json::json;

const TRACE: &str = include_str!("fixtures/lte_handover_trace.txt");

/// 2025-12-17 20:34:00.000 UTC
const MINUTE_MS: i64 = 1_766_003_640_000;

const RECONF: &str = "DL_DCCH / RRCConnectionReconfiguration";

fn trace_lines() -> Vec<String> {
    TRACE.lines().map(str::to_string).collect()
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/lte_handover_trace.txt")
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_fixture_entries_and_anomalies() {
    let log = parse_lines(trace_lines());

    assert_eq!(log.entries.len(), 11);
    assert!(log
        .entries
        .windows(2)
        .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));

    let categories: Vec<_> = log.anomalies.iter().map(|a| a.category()).collect();
    assert_eq!(
        categories,
        vec![
            AnomalyCategory::RoutingStall,
            AnomalyCategory::StructuralParseFailure
        ]
    );
    assert_eq!(log.anomalies.as_slice()[0].timestamp_ms, Some(MINUTE_MS + 1_012));
    assert_eq!(log.anomalies.as_slice()[1].timestamp_ms, Some(MINUTE_MS + 12_000));
}

#[test]
fn test_parse_file_matches_in_memory() {
    let from_file = parse_file(&fixture_path()).unwrap();
    let in_memory = parse_lines(trace_lines());
    assert_eq!(from_file.entries, in_memory.entries);
}

#[test]
fn test_diagnostic_entry_keeps_unroutable_tail() {
    let log = parse_lines(trace_lines());
    let entry = &log.entries[0];

    assert_eq!(entry.log_code, "0x1FF0");
    assert_eq!(entry.log_subname, "Log Config");
    let body = entry.body.as_ref().unwrap();
    assert_eq!(body.metadata_value("Status"), Some("Success"));
    assert_eq!(body.metadata_value("Operation"), Some("Set Mask"));
    assert_eq!(
        body.unparsed_tail,
        vec!["Log Codes Enabled:", "   0xB0C0", "   0xB193"]
    );
    assert_eq!(
        log.anomalies.as_slice()[0].kind,
        AnomalyKind::RoutingStall {
            remaining: 3,
            first_line: "Log Codes Enabled:".to_string(),
        }
    );
}

#[test]
fn test_sib1_pdu_and_further_decoding() {
    let log = parse_lines(trace_lines());
    let entry = &log.entries[1];
    let body = entry.body.as_ref().unwrap();

    assert_eq!(
        body.metadata_value("RRC Release Number.Major.minor"),
        Some("15.8.0 (Rel 15, ASN 8)")
    );
    assert_eq!(body.metadata_value("Msg Length"), Some("28"));
    assert_eq!(body.metadata_value("Physical Cell ID"), Some("241"));

    let pdu = entry.pdu().unwrap();
    let sib1 = pdu
        .get("BCCH-DL-SCH-Message")
        .and_then(|m| m.get("message"))
        .and_then(|m| m.get("c1"))
        .and_then(|m| m.get("systemInformationBlockType1"))
        .unwrap();
    assert_eq!(sib1.get("freqBandIndicator").and_then(|v| v.as_str()), Some("13"));
    assert_eq!(sib1.find_values("q-RxLevMin")[0].as_str(), Some("-64"));

    let mcc: Vec<_> = sib1.find_values("mcc")[0]
        .elements()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(mcc, vec!["3", "1", "0"]);

    let further = body.section("Further Decoding").unwrap();
    assert_eq!(further.first_key(), Some("SystemInformationBlockType1-v890-IEs"));
    let bands: Vec<_> = further.find_values("multiBandInfoList")[0]
        .elements()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(bands, vec!["66"]);
}

#[test]
fn test_paging_record_collapses_to_structure() {
    let log = parse_lines(trace_lines());
    let entry = &log.entries[2];
    assert_eq!(entry.log_subname, "PCCH / Paging");

    let records = entry.pdu().unwrap().find_values("pagingRecordList");
    assert_eq!(records.len(), 1);
    assert_eq!(
        serde_json::to_value(records[0]).unwrap(),
        json!({
            "ue-Identity": {
                "s-TMSI": {
                    "mmec": "'00101010'B",
                    "m-TMSI": "'11110000 11010000 00110011 00011110'B"
                }
            },
            "cn-Domain": "ps"
        })
    );
}

#[test]
fn test_entry_without_subname() {
    let log = parse_lines(trace_lines());
    let entry = &log.entries[3];

    assert_eq!(entry.log_code, "0xB193");
    assert_eq!(entry.log_subname, "");
    assert_eq!(entry.display_name(), "LTE ML1 Serving Cell Meas Response");
    let body = entry.body.as_ref().unwrap();
    assert!(body.sections.is_empty());
    assert_eq!(body.metadata_value("Inst RSRQ Rx[0]"), Some("-10.31 dB"));
}

#[test]
fn test_broken_root_line_keeps_metadata() {
    let log = parse_lines(trace_lines());
    let entry = &log.entries[8];

    assert_eq!(entry.timestamp_ms, MINUTE_MS + 12_000);
    assert!(entry.pdu().is_none());
    let body = entry.body.as_ref().unwrap();
    assert_eq!(body.metadata_value("Freq"), Some("5230"));
    assert_eq!(body.unparsed_tail[0], "Interpreted PDU:");
}

#[test]
fn test_entry_index_groups_by_code_and_name() {
    let index: EntryIndex = parse_lines(trace_lines()).entries.into_iter().collect();

    assert_eq!(index.len(), 11);
    assert_eq!(index.codes().collect::<Vec<_>>(), vec!["0x1FF0", "0xB0C0", "0xB193"]);
    assert_eq!(index.get("0xB0C0", RECONF).len(), 4);
    assert_eq!(
        index
            .get("0xB0C0", "UL_DCCH / RRCConnectionReconfigurationComplete")
            .len(),
        3
    );
    assert!(index.get("0xB0C0", "DL_DCCH / RRCConnectionRelease").is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Mobility
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_handover_report() {
    let report = process_lines(trace_lines(), &TrackerConfig::default(), None).unwrap();

    assert_eq!(report.entries_parsed, 11);
    assert_eq!(report.entries_tracked, 11);

    let events = &report.state.events;
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].begin_ts, MINUTE_MS + 4_165);
    assert_eq!(events[0].end_ts, Some(MINUTE_MS + 4_215));
    assert_eq!(events[0].kind, HandoverKind::IntraSecondaryGroup);
    assert_eq!(events[0].added_cell_ids, vec![171, 305]);
    assert!(events[0].removed_cell_ids.is_empty());

    assert_eq!(events[1].begin_ts, MINUTE_MS + 10_500);
    assert_eq!(events[1].end_ts, Some(MINUTE_MS + 10_538));
    assert_eq!(events[1].kind, HandoverKind::IntraFrequency);
    assert_eq!(events[1].added_cell_ids, vec![17]);
    assert_eq!(events[1].removed_cell_ids, vec![171]);

    // Target frequency comes from the entry's own Freq field
    assert_eq!(report.state.primary, Some(Cell::primary(17, 5230)));
    assert_eq!(report.state.secondaries.len(), 1);
    assert_eq!(report.state.secondaries[&2], Cell::secondary(2, 305, 1000));

    assert_eq!(report.state.completed_durations_ms(), vec![50, 38]);
    assert_eq!(report.state.average_handover_ms(), Some(44.0));

    assert_eq!(report.anomalies.len(), 3);
    let last = report.anomalies.as_slice().last().unwrap();
    assert_eq!(last.timestamp_ms, Some(MINUTE_MS + 12_900));
    assert_eq!(last.kind, AnomalyKind::UntrackedCellRelease { index: 5 });
}

#[test]
fn test_stats_summary() {
    let report = process_lines(trace_lines(), &TrackerConfig::default(), None).unwrap();
    let text = report.state.to_string();

    assert!(text.contains("PCell(physCellId, dlCarrierFreq): 17, 5230"));
    assert!(text.contains("\n2, 305, 1000\n"));
    assert!(text.ends_with("HO Events: 2 (avg 44.0 ms)"));
}

#[test]
fn test_report_serializes_to_json() {
    let report = process_lines(trace_lines(), &TrackerConfig::default(), None).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["entries_parsed"], 11);
    assert_eq!(value["state"]["events"][0]["kind"], "intraSCG");
    assert_eq!(value["state"]["events"][1]["kind"], "intraLTE");
    assert_eq!(value["state"]["events"][1]["removed_cell_ids"], json!([171]));
    assert_eq!(value["anomalies"][0]["kind"], "routing_stall");
    assert_eq!(value["anomalies"][2]["kind"], "untracked_cell_release");
    assert_eq!(value["anomalies"][2]["index"], 5);
}

#[test]
fn test_window_excludes_first_handover() {
    let window = MINUTE_MS + 10_000..MINUTE_MS + 60_000;
    let report = process_lines(trace_lines(), &TrackerConfig::default(), Some(window)).unwrap();

    assert_eq!(report.entries_parsed, 11);
    assert_eq!(report.entries_tracked, 5);
    assert_eq!(report.state.events.len(), 1);
    assert_eq!(report.state.primary, Some(Cell::primary(17, 5230)));

    // Neither SCell add was seen, so both releases hit untracked indices
    let untracked: Vec<_> = report
        .anomalies
        .iter()
        .filter_map(|a| match a.kind {
            AnomalyKind::UntrackedCellRelease { index } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(untracked, vec![1, 5]);
    assert!(report.state.events[0].removed_cell_ids.is_empty());
}

#[test]
fn test_analyze_with_default_config() {
    let report = analyze(&fixture_path(), None).unwrap();
    assert_eq!(report.state.events.len(), 2);
    assert_eq!(report.anomalies.len(), 3);
}

#[test]
fn test_analyze_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("tracker.toml");
    std::fs::write(
        &config_path,
        r#"
[[messages]]
log_code = "0xb0c0"
subname = "DL_DCCH / RRCConnectionReconfiguration"
role = "reconfiguration"
"#,
    )
    .unwrap();

    // Without completions the first event is force-closed by the second
    let report = analyze(&fixture_path(), Some(config_path.as_path())).unwrap();
    let events = &report.state.events;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].end_ts, Some(MINUTE_MS + 10_500));
    assert!(events[1].is_open());
    assert_eq!(report.state.average_handover_ms(), Some(6_335.0));

    assert_eq!(
        report
            .anomalies
            .iter()
            .map(|a| a.kind.clone())
            .filter(|k| matches!(k, AnomalyKind::IncompleteHandover { .. }))
            .collect::<Vec<_>>(),
        vec![AnomalyKind::IncompleteHandover {
            begin_ts: MINUTE_MS + 4_165
        }]
    );
}

#[test]
fn test_analyze_missing_trace_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyze(&dir.path().join("absent.txt"), None).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_analysis_anomalies_are_logged_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let subscriber = rrcscope::core::logging::file_subscriber(dir.path()).unwrap();

    let report =
        tracing::subscriber::with_default(subscriber, || analyze(&fixture_path(), None)).unwrap();
    assert_eq!(report.anomalies.len(), 3);

    let mut logged = String::new();
    for file in std::fs::read_dir(dir.path()).unwrap() {
        logged.push_str(&std::fs::read_to_string(file.unwrap().path()).unwrap());
    }
    let warnings: Vec<_> = logged.lines().filter(|l| l.contains(" WARN ")).collect();
    assert_eq!(warnings.len(), 3);
    assert!(warnings[2].contains("release of untracked secondary cell 5"));
}
