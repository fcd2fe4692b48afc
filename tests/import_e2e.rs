use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

const HEADER: &str = "AnnotSV_ID\tSV_chrom\tSV_start\tSV_end\tSV_type\tAnnotation_mode\tSamples_ID\tGene_name\tTx\tTx_version\tTx_start\tTx_end\tOverlapped_tx_length\tOverlapped_CDS_length\tOverlapped_CDS_percent\tFrameshift\tExon_count\tLocation\tLocation2\tDist_nearest_SS\tNearest_SS_type\tIntersect_start\tIntersect_end\tACMG_class";

const COHORT_ROWS: &[&str] = &[
    "1_100_200_DEL_1\t1\t100\t200\tDEL\tfull\tS1,S2\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t4",
    "1_100_200_DEL_1\t1\t100\t200\tDEL\tsplit\tS1,S2\tBRCA1\tNM_007294\t4\t110\t190\t80\t60\t75.0\tyes\t10\ttxStart-exon10\texon5-exon10\t-12\tdonor\t110\t190\t4",
    "2_500_900_DUP_1\t2\t500\t900\tDUP\tfull\tS2\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t3",
    "2_500_900_DUP_1\t2\t500\t900\tDUP\tsplit\tS2\tTP53\tNM_000546\t6\t510\t890\t100\t90\t50.0\tno\t5\ttxStart-txEnd\t\t30\tacceptor\t510\t890\t3",
];

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svbase"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("command runs")
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = run_cli(dir, args);
    assert!(
        output.status.success(),
        "command failed: args={args:?}\nstdout={}\nstderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json stdout")
}

fn write_table(dir: &Path, rows: &[&str]) {
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(dir.join("annotations.tsv"), body).expect("write fixture");
}

#[test]
fn import_normalizes_a_small_cohort() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_table(dir, COHORT_ROWS);
    let _ = run_json(dir, &["--create"]);

    let payload = run_json(dir, &["--import", "annotations.tsv"]);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["action"], "import");
    assert_eq!(payload["rows"]["total"], 4);
    assert_eq!(payload["rows"]["full"], 2);
    assert_eq!(payload["rows"]["split"], 2);
    assert_eq!(payload["rows"]["skipped"], 0);
    assert_eq!(payload["new"]["samples"], 2);
    assert_eq!(payload["new"]["genes"], 2);
    assert_eq!(payload["new"]["svs"], 2);
    assert_eq!(payload["new"]["sample_links"], 3);
    assert_eq!(payload["new"]["gene_links"], 2);
    assert_eq!(payload["new"]["tx_links"], 2);

    let stats = &payload["stats"];
    assert_eq!(stats["totals"]["svs"], 2);
    assert_eq!(stats["totals"]["transcripts"], 2);
    assert_eq!(stats["top_samples"][0]["sample_id"], "S2");
    assert_eq!(stats["top_samples"][0]["sv_count"], 2);
    assert_eq!(stats["top_genes"][0]["gene_name"], "BRCA1");
    assert_eq!(stats["frameshift_svs"].as_array().expect("rows").len(), 1);
    assert_eq!(stats["frameshift_svs"][0]["annotsv_id"], "1_100_200_DEL_1");

    // one variant seen by one sample, one seen by two
    assert_eq!(stats["samples_per_sv"][0]["samples_per_sv"], 1);
    assert_eq!(stats["samples_per_sv"][0]["sv_count"], 1);
    assert_eq!(stats["samples_per_sv"][1]["samples_per_sv"], 2);
    assert_eq!(stats["samples_per_sv"][1]["sv_count"], 1);
}

#[test]
fn importing_the_same_file_twice_adds_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_table(dir, COHORT_ROWS);
    let _ = run_json(dir, &["--create"]);

    let first = run_json(dir, &["--import", "annotations.tsv"]);
    let second = run_json(dir, &["--import", "annotations.tsv"]);

    for key in [
        "samples",
        "genes",
        "svs",
        "sample_links",
        "gene_links",
        "tx_links",
    ] {
        assert_eq!(second["new"][key], 0, "expected no new {key}");
    }
    assert_eq!(first["stats"]["totals"], second["stats"]["totals"]);
}

#[test]
fn an_unrecognized_mode_fails_the_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_table(
        dir,
        &[
            COHORT_ROWS[0],
            "9_1_2_INS_1\t9\t1\t2\tINS\tweird\tS3\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t",
        ],
    );
    let _ = run_json(dir, &["--create"]);

    let output = run_cli(dir, &["--import", "annotations.tsv"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let payload: Value =
        serde_json::from_str(stderr.lines().last().expect("payload")).expect("json stderr");
    assert_eq!(payload["error"]["code"], "bad_annotation_mode");
    let message = payload["error"]["message"].as_str().expect("message");
    assert!(message.contains("weird"), "message was: {message}");
    assert!(message.contains("line 3"), "message was: {message}");
}

#[test]
fn progress_goes_to_stderr_and_the_report_to_stdout() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_table(dir, COHORT_ROWS);
    let _ = run_json(dir, &["--create"]);

    let output = run_cli(dir, &["--import", "annotations.tsv"]);
    assert!(output.status.success());

    // stdout stays machine-readable: exactly one JSON document
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    let _: Value = serde_json::from_str(stdout.trim()).expect("json stdout");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for pass in ["pass 1/4", "pass 2/4", "pass 3/4", "pass 4/4"] {
        assert!(stderr.contains(pass), "missing {pass} in: {stderr}");
    }
}
