//! Bookkeeping of the agreement between the online trigger decision and its
//! offline emulation

use crate::{histogram::LabeledHistogram, objects::EventInfo};
use serde::Serialize;

/// Run-scoped counters of one trigger chain
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChainRecord {
    pub name: String,
    /// Number of events in which the chain was compared
    pub evaluated: u64,
    /// Number of events in which the recorded decision fired
    pub decision_fires: u64,
    /// Number of events in which the emulation fired
    pub emulation_fires: u64,
    /// Number of events in which both disagree
    pub disagreements: u64,
}
//
impl ChainRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    fn merge(&mut self, other: &Self) {
        self.evaluated += other.evaluated;
        self.decision_fires += other.decision_fires;
        self.emulation_fires += other.emulation_fires;
        self.disagreements += other.disagreements;
    }
}

/// A chain for which the recorded decision and the emulation disagree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Disagreement {
    pub run_number: u32,
    pub event_number: u64,
    pub lumi_block: u32,
    pub chain: String,
    pub decision: bool,
    pub emulation: bool,
}

/// Per-chain comparison of recorded and emulated trigger decisions
///
/// Chains keep their declaration order, which is also the order of every
/// report. Chains that were not declared are appended when first recorded.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriggerAgreementTracker {
    chains: Vec<ChainRecord>,
    disagreements: Vec<Disagreement>,
}
//
impl TriggerAgreementTracker {
    /// Start tracking a list of chains
    pub fn new<S: AsRef<str>>(chains: &[S]) -> Self {
        Self {
            chains: chains
                .iter()
                .map(|name| ChainRecord::new(name.as_ref().trim()))
                .collect(),
            disagreements: Vec::new(),
        }
    }

    /// Compare the decisions of one chain in one event
    ///
    /// `decision` is None when the chain is not part of the trigger
    /// configuration, in which case the chain counts as not fired. Returns
    /// whether the two decisions disagree.
    ///
    pub fn record(
        &mut self,
        info: &EventInfo,
        chain: &str,
        decision: Option<bool>,
        emulation: bool,
    ) -> bool {
        let chain = chain.trim();
        let decision = decision.unwrap_or_else(|| {
            log::debug!("Chain {chain} is not part of the trigger configuration");
            false
        });

        let record = self.chain_mut(chain);
        record.evaluated += 1;
        record.decision_fires += u64::from(decision);
        record.emulation_fires += u64::from(emulation);
        let differs = decision != emulation;
        if differs {
            record.disagreements += 1;
            self.disagreements.push(Disagreement {
                run_number: info.run_number,
                event_number: info.event_number,
                lumi_block: info.lumi_block,
                chain: chain.to_owned(),
                decision,
                emulation,
            });
        }
        differs
    }

    /// Counters of every chain, in declaration order
    pub fn chains(&self) -> &[ChainRecord] {
        &self.chains
    }

    /// Counters of one chain
    pub fn chain(&self, name: &str) -> Option<&ChainRecord> {
        self.chains.iter().find(|record| record.name == name)
    }

    /// Every disagreement seen so far, in event order
    pub fn disagreements(&self) -> &[Disagreement] {
        &self.disagreements
    }

    /// Integrate the results of a later batch of events
    pub fn merge(&mut self, other: &Self) {
        for record in &other.chains {
            self.chain_mut(&record.name).merge(record);
        }
        self.disagreements.extend_from_slice(&other.disagreements);
    }

    /// Counters as labeled histograms: recorded fires, emulated fires and
    /// disagreements
    pub fn histograms(&self) -> [LabeledHistogram; 3] {
        let labels: Vec<String> = self.chains.iter().map(|r| r.name.clone()).collect();
        let build = |name: &str, count: fn(&ChainRecord) -> u64| {
            let mut hist = LabeledHistogram::new(name, labels.clone());
            for (idx, record) in self.chains.iter().enumerate() {
                hist.fill_index(idx, count(record) as f64);
            }
            hist
        };
        [
            build("h_TDT_fires", |r| r.decision_fires),
            build("h_EMU_fires", |r| r.emulation_fires),
            build("h_TDT_Emulation_differences", |r| r.disagreements),
        ]
    }

    fn chain_mut(&mut self, name: &str) -> &mut ChainRecord {
        let idx = match self.chains.iter().position(|record| record.name == name) {
            Some(idx) => idx,
            None => {
                self.chains.push(ChainRecord::new(name));
                self.chains.len() - 1
            }
        };
        &mut self.chains[idx]
    }
}

fn table_rule() -> String {
    format!("\t +{}+{}+{}+", "-".repeat(44), "-".repeat(7), "-".repeat(11))
}

/// Table of the chains which disagree in one event
pub fn disagreement_table(disagreements: &[Disagreement]) -> Vec<String> {
    let mut lines = vec![
        "\t -- Chains with differences --".to_owned(),
        table_rule(),
        "\t |                                      Chain |  TDT  | EMULATION |".to_owned(),
    ];
    lines.extend(disagreements.iter().map(|d| {
        format!(
            "\t |{:>43} |   {}   |     {}     |",
            d.chain,
            u8::from(d.decision),
            u8::from(d.emulation)
        )
    }));
    lines.push(table_rule());
    lines
}

/// Log the disagreements of one event
pub fn log_disagreements(info: &EventInfo, disagreements: &[Disagreement]) {
    if disagreements.is_empty() {
        return;
    }
    log::warn!(
        "event number {} -- lumi block {}",
        info.event_number,
        info.lumi_block
    );
    for line in disagreement_table(disagreements) {
        log::info!("{line}");
    }
}
