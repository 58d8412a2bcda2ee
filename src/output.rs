//! This module is in charge of outputting the final analysis results to the
//! standard output and to disk

use crate::{cutflow::CutStage, results::AnalysisResults};
use eyre::WrapErr;
use serde_json::json;
use std::{
    fs,
    io::{self, Write},
    path::Path,
    time::Duration,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Every accepted event fills this efficiency curve exactly once
const EFFICIENCY_SUMMARY_VARIABLE: &str = "lead_tau_pt";

/// Output the analysis results to the console and to disk
pub fn dump_results(
    results: &AnalysisResults,
    elapsed_time: Duration,
    path: &Path,
) -> eyre::Result<()> {
    // Print out a summary on stdout
    write_summary(&mut io::stdout().lock(), results, elapsed_time)?;

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;

    // Write the results file next to its final location, then move it in
    // place, so that an interrupted run never leaves a truncated file behind
    let document = results_document(results, &timestamp, elapsed_time);
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);
    fs::write(tmp_path, serde_json::to_string_pretty(&document)?)
        .wrap_err_with(|| format!("Failed to write {}", tmp_path.display()))?;
    fs::rename(tmp_path, path)
        .wrap_err_with(|| format!("Failed to move results to {}", path.display()))?;
    log::info!("Results written to {}", path.display());
    Ok(())
}

/// Build the JSON document holding every histogram and counter
fn results_document(
    results: &AnalysisResults,
    timestamp: &str,
    elapsed_time: Duration,
) -> serde_json::Value {
    // Fixed histograms are stored under their own name
    let mut histograms = serde_json::Map::new();
    let mut store = |name: &str, hist: serde_json::Value| {
        histograms.insert(name.to_owned(), hist);
    };
    let cutflow = results.cutflow.histogram();
    store(cutflow.name(), json!(cutflow));
    for scan in [&results.l1_scan, &results.off_scan] {
        store(scan.symmetric().name(), json!(scan.symmetric()));
        store(scan.asymmetric().name(), json!(scan.asymmetric()));
    }
    store(results.map_l1taus.name(), json!(&results.map_l1taus));
    for hist in results.agreement.histograms() {
        store(hist.name(), json!(hist));
    }

    json!({
        "timestamp": timestamp,
        "elapsed_seconds": elapsed_time.as_secs_f64(),
        "events": results.events,
        "agreement_events": results.agreement_events,
        "histograms": histograms,
        "kinematics": &results.book,
        "efficiencies": &results.efficiencies,
        "chains": results.agreement.chains(),
        "disagreements": results.agreement.disagreements(),
    })
}

/// Print a human-readable summary of the run
fn write_summary(
    out: &mut impl Write,
    results: &AnalysisResults,
    elapsed_time: Duration,
) -> io::Result<()> {
    writeln!(out, "---------------------------------------------")?;
    write_item(out, "Processed events", results.events)?;
    write_item(out, "Elapsed time (s)", elapsed_time.as_secs_f64())?;
    if results.cutflow.count(CutStage::Init).is_some_and(|count| count > 0.) {
        writeln!(out, "---------------------------------------------")?;
        for stage in CutStage::ALL {
            if let Some(count) = results.cutflow.count(stage) {
                write_item(out, stage.label(), count)?;
            }
        }
    }
    let chains = results.agreement.chains();
    if !chains.is_empty() {
        writeln!(out, "---------------------------------------------")?;
        write_item(out, "Compared events", results.agreement_events)?;
        writeln!(
            out,
            " {:<43}|{:>9}|{:>9}|{:>9}",
            "Chain", "TDT", "EMU", "DIFF"
        )?;
        for chain in chains {
            writeln!(
                out,
                " {:<43}|{:>9}|{:>9}|{:>9}",
                chain.name, chain.decision_fires, chain.emulation_fires, chain.disagreements
            )?;
        }
    }
    if !results.efficiencies.is_empty() {
        writeln!(out, "---------------------------------------------")?;
        writeln!(out, " Accepted events passing each chain")?;
        for curves in &results.efficiencies {
            if let Some(curve) = curves.get(EFFICIENCY_SUMMARY_VARIABLE) {
                let (passed, total) = (curve.passed().entries(), curve.total().entries());
                write_item(out, curves.chain(), format!("{passed} / {total}"))?;
            }
        }
    }
    writeln!(out, "---------------------------------------------")
}

/// Key-value output that uses fixed-size columns for better readability
fn write_item(out: &mut impl Write, key: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(out, " {key:<31}: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Configuration, objects::EventInfo};

    fn sample_results() -> AnalysisResults {
        let mut cfg = Configuration::default();
        cfg.stages.agreement = true;
        cfg.agreement.chains = vec!["L1_TAU12".to_owned()];
        cfg.agreement.efficiency_chains = vec!["L1_TAU12".to_owned()];
        let mut results = AnalysisResults::new(&cfg);
        results.events = 2;
        results.agreement_events = 2;
        results.cutflow.begin_event();
        results.cutflow.pass(CutStage::Taus);
        results.l1_scan.scan(30000., 20000.);
        let info = EventInfo::default();
        results.agreement.record(&info, "L1_TAU12", Some(true), true);
        results.agreement.record(&info, "L1_TAU12", Some(false), true);
        results
    }

    #[test]
    fn summary_lists_cuts_and_chains() {
        let mut out = Vec::new();
        write_summary(&mut out, &sample_results(), Duration::from_millis(1500)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(" Processed events               : 2\n"));
        assert!(text.contains(" taus_pt                        : 0\n"));
        assert!(text.contains(&format!(
            " {:<43}|{:>9}|{:>9}|{:>9}",
            "L1_TAU12", 1, 2, 1
        )));
        assert!(text.contains(" L1_TAU12                       : 0 / 0\n"));
    }

    #[test]
    fn results_are_written_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trigval.json");
        dump_results(&sample_results(), Duration::from_secs(3), &path).unwrap();
        assert!(!dir.path().join("trigval.json.tmp").exists());

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["events"], 2);
        assert_eq!(document["elapsed_seconds"], 3.0);
        assert!(document["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(document["chains"][0]["disagreements"], 1);
        assert_eq!(document["disagreements"][0]["chain"], "L1_TAU12");
        let histograms = &document["histograms"];
        assert_eq!(histograms["h_TDT_fires"]["counts"], json!([1.]));
        assert_eq!(histograms["h_EMU_fires"]["counts"], json!([2.]));
        assert_eq!(histograms["l1_symmetric"]["labels"][0], "2TAU12");
        assert!(histograms["l1_asymmetric"].is_object());
        assert!(histograms["off_symmetric"].is_object());
        assert!(histograms["map_l1taus"].is_object());
        assert!(histograms["cutflow"].is_object());
        assert!(document["kinematics"]["tau1_pt"].is_object());
    }
}
