use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ot_trace::*;
use proptest::prelude::*;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn triples(episode: &Episode) -> Vec<(usize, f64, f64)> {
    episode
        .records()
        .iter()
        .map(|r| (r.iteration, r.absolute, r.relative))
        .collect()
}

#[test]
fn restart_at_one_splits_nonlinear_episodes() {
    let text = "NL: NLBGS1; 0.5 0.4\nNL: NLBGS2; 0.3 0.2\nNL: NLBGS1; 0.1 0.05\n";
    let episodes = segment(text.lines(), SolverKind::Nonlinear).expect("well-formed log");

    assert_eq!(episodes.len(), 2);
    assert_eq!(triples(&episodes[0]), [(1, 0.5, 0.4), (2, 0.3, 0.2)]);
    assert_eq!(triples(&episodes[1]), [(1, 0.1, 0.05)]);
}

#[test]
fn no_matching_lines_is_one_empty_episode() {
    let text = "Optimization terminated successfully\n\n   Current function value: -27.33\n";
    let episodes = segment(text.lines(), SolverKind::Nonlinear).expect("valid, just empty");
    assert_eq!(episodes.len(), 1);
    assert!(episodes[0].is_empty());

    let none: [&str; 0] = [];
    let episodes = segment(none, SolverKind::Linear).expect("valid, just empty");
    assert_eq!(episodes, vec![Episode::default()]);
}

#[test]
fn malformed_matching_line_aborts_the_parse() {
    let text = "NL: NLBGS 1 ; 1.0 1.0\nNL: NLBGS 2 ; oops 0.5\nNL: NLBGS 3 ; 0.1 0.1\n";
    let err = segment(text.lines(), SolverKind::Nonlinear).unwrap_err();
    match err {
        TraceError::Parse { line_no, line, .. } => {
            assert_eq!(line_no, 2);
            assert!(line.contains("oops"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn interleaved_solvers_are_read_independently() {
    let text = "\
=======
cycle
=======
NL: NLBGS 1 ; 2.35 1
|  LN: LNBGS 0 ; 1.0 1.0
|  LN: LNBGS 1 ; 0.01 0.01
NL: NLBGS 2 ; 0.21 0.09
|  LN: LNBGS 0 ; 0.5 1.0
NL: NLBGS Converged in 2 iterations
";
    let nl = segment(text.lines(), SolverKind::Nonlinear).unwrap();
    assert_eq!(nl.len(), 1);
    assert_eq!(nl[0].len(), 2);

    let ln = segment(text.lines(), SolverKind::Linear).unwrap();
    assert_eq!(ln.len(), 2);
    assert_eq!(ln[0].len(), 2);
    assert_eq!(ln[1].last().map(|r| r.absolute), Some(0.5));
}

#[test]
fn log_file_is_streamed_from_disk() {
    let dir = unique_temp_dir("ot_trace_log");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("run.out");
    fs::write(
        &path,
        "NL: NLBGS 1 ; 3 1\nstep\nNL: NLBGS 2 ; 1.5 0.5\nNL: NLBGS 1 ; 2 1\n",
    )
    .expect("failed to write log");

    let episodes = read_residual_log(&path, SolverKind::Nonlinear).expect("failed to read log");
    assert_eq!(episodes.len(), 2);

    let series = episodes_to_series(&episodes).expect("series");
    assert_eq!(series.len(), 3);
    assert_eq!(series.column("relative"), Some(vec![1.0, 0.5, 1.0]));
}

#[test]
fn invalid_utf8_on_a_skipped_line_is_tolerated() {
    let dir = unique_temp_dir("ot_trace_log_bytes");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("run.out");
    let mut bytes = b"NL: NLBGS 1 ; 1.0 1.0\r\n".to_vec();
    bytes.extend_from_slice(b"banner \xff\xfe junk\n");
    bytes.extend_from_slice(b"NL: NLBGS 2 ; 0.5 0.5");
    fs::write(&path, bytes).expect("failed to write log");

    let episodes = read_residual_log(&path, SolverKind::Nonlinear).expect("bytes are replaced");
    assert_eq!(episodes.len(), 1);
    assert_eq!(triples(&episodes[0]), [(1, 1.0, 1.0), (2, 0.5, 0.5)]);
}

#[test]
fn unreadable_log_is_an_error() {
    let dir = unique_temp_dir("ot_trace_log_unreadable");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let blocker = dir.join("not_a_dir");
    fs::write(&blocker, "").expect("failed to write file");

    let err = read_residual_log(&blocker.join("run.out"), SolverKind::Nonlinear).unwrap_err();
    assert!(matches!(err, TraceError::Io(_)));
}

#[test]
fn missing_log_reads_as_empty() {
    let path = unique_temp_dir("ot_trace_missing").join("never_written.out");
    let episodes = read_residual_log(&path, SolverKind::Nonlinear).expect("missing is not an error");
    assert_eq!(episodes.len(), 1);
    assert!(episodes[0].is_empty());
    assert!(episodes_to_series(&episodes).expect("series").is_empty());
}

fn kind_strategy() -> impl Strategy<Value = SolverKind> {
    prop_oneof![Just(SolverKind::Nonlinear), Just(SolverKind::Linear)]
}

/// Episode lengths plus residual values, rendered as solver output.
fn render(kind: SolverKind, lengths: &[usize]) -> Vec<String> {
    let start = kind.start_iteration();
    let mut lines = vec!["model setup".to_string()];
    for (e, len) in lengths.iter().enumerate() {
        for i in 0..*len {
            let abs = 1.0 / ((e + i + 1) as f64);
            lines.push(format!("{} {} ; {:e} {:e}", kind.prefix(), start + i, abs, abs / 2.0));
        }
        lines.push("| solver converged".to_string());
    }
    lines
}

proptest! {
    #[test]
    fn episodes_start_at_the_solver_start_value(
        kind in kind_strategy(),
        lengths in prop::collection::vec(1usize..12, 1..8),
    ) {
        let episodes = segment(render(kind, &lengths), kind).unwrap();
        prop_assert_eq!(episodes.len(), lengths.len());
        for (episode, len) in episodes.iter().zip(&lengths) {
            prop_assert_eq!(episode.first_iteration(), Some(kind.start_iteration()));
            prop_assert_eq!(episode.len(), *len);
        }
    }

    #[test]
    fn resegmenting_concatenated_records_is_identity(
        kind in kind_strategy(),
        lengths in prop::collection::vec(1usize..12, 1..8),
    ) {
        let episodes = segment(render(kind, &lengths), kind).unwrap();
        let flat: Vec<ResidualRecord> = episodes
            .iter()
            .flat_map(|e| e.records().iter().copied())
            .collect();
        prop_assert_eq!(segment_records(flat, kind), episodes);
    }
}
