use std::path::Path;
use std::process::Command;

fn ontoguide() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ontoguide"));
    cmd.env_remove("ONTOGUIDE_CONFIG")
        .env_remove("ONTOGUIDE_CATALOG")
        .env_remove("ONTOGUIDE_DESCRIPTIONS")
        .env_remove("ONTOGUIDE_OUTPUT_DIR")
        .env_remove("ONTOGUIDE_ROBOT_BIN");
    cmd
}

fn write_inputs(dir: &Path) {
    std::fs::write(
        dir.join("catalog.csv"),
        "Metric,1 (Worst),5 (Best)\nANOnto,< 0.2,> 0.8\nNOMOnto,> 12,< 2\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("scores.json"),
        r#"{"name": "pizza", "metrics": {"ANOnto": 0.05, "NOMOnto": 3}}"#,
    )
    .unwrap();
}

#[test]
fn normalize_iri_prints_expansion_and_validity() {
    let output = ontoguide()
        .args(["normalize-iri", "obo:GO_0008150", "has space"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("obo:GO_0008150 -> http://purl.obolibrary.org/obo/GO_0008150 (valid)"));
    assert!(stdout.contains("has space -> has space (invalid)"));
}

#[test]
fn classify_lists_worst_metric() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = ontoguide()
        .arg("--catalog")
        .arg(dir.path().join("catalog.csv"))
        .arg("classify")
        .arg(dir.path().join("scores.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ANOnto"));
    assert!(stdout.contains("Selected: ANOnto"));
    assert!(!stdout.contains("NOMOnto"));
}

#[test]
fn classify_shows_metric_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    std::fs::write(
        dir.path().join("descriptions.csv"),
        "Metric_Name,Description\nAN,Annotation richness per class\n",
    )
    .unwrap();

    let output = ontoguide()
        .arg("--catalog")
        .arg(dir.path().join("catalog.csv"))
        .arg("--descriptions")
        .arg(dir.path().join("descriptions.csv"))
        .arg("classify")
        .arg(dir.path().join("scores.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Annotation richness per class"));

    let output = ontoguide()
        .arg("--catalog")
        .arg(dir.path().join("catalog.csv"))
        .arg("--descriptions")
        .arg(dir.path().join("missing.csv"))
        .arg("classify")
        .arg(dir.path().join("scores.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No description available"));
}

#[test]
fn summarize_emits_json() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = ontoguide()
        .arg("--catalog")
        .arg(dir.path().join("catalog.csv"))
        .arg("summarize")
        .arg(dir.path().join("scores.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["ontology"], "pizza");
    assert_eq!(summary["worst"][0]["name"], "ANOnto");
    assert_eq!(summary["worst"][0]["description"], "No description available");
}

#[test]
fn extract_fails_for_missing_ontology() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = ontoguide()
        .arg("--catalog")
        .arg(dir.path().join("catalog.csv"))
        .arg("extract")
        .arg(dir.path().join("missing.owl"))
        .arg(dir.path().join("scores.json"))
        .arg(dir.path().join("seeds.json"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}
