//! Access to the online trigger decision and to its offline emulation

mod emulator;
mod hlt;
mod l1;

pub use self::emulator::{EmulationDecisions, EmulationInputs, TrigEmulator};

use crate::store::EventRecord;
use serde::Deserialize;
use std::{collections::BTreeMap, str::FromStr};

/// Condition under which a recorded chain decision is queried
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCondition {
    /// Final physics decision (after prescale and veto)
    Physics,
    /// Raw decision, before prescales are applied
    BeforePrescale,
    /// Decision after the dead-time veto
    AfterVeto,
}
//
impl FromStr for DecisionCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "physics" => Ok(Self::Physics),
            "before_prescale" => Ok(Self::BeforePrescale),
            "after_veto" => Ok(Self::AfterVeto),
            other => Err(format!(
                "unknown decision condition \"{other}\", expected physics, before_prescale \
                 or after_veto"
            )),
        }
    }
}

/// Decision bits recorded for one chain
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ChainBits {
    #[serde(default)]
    pub physics: bool,
    #[serde(default)]
    pub before_prescale: bool,
    #[serde(default)]
    pub after_veto: bool,
}
//
impl ChainBits {
    /// Select the bit matching a decision condition
    pub fn passed(&self, condition: DecisionCondition) -> bool {
        match condition {
            DecisionCondition::Physics => self.physics,
            DecisionCondition::BeforePrescale => self.before_prescale,
            DecisionCondition::AfterVeto => self.after_veto,
        }
    }
}

/// Online trigger decision of one event
///
/// Only chains which are part of the trigger configuration of the run are
/// present in the map.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TriggerRecord {
    #[serde(default)]
    pub chains: BTreeMap<String, ChainBits>,
}

/// Source of the online trigger decision
pub trait DecisionOracle: Sync {
    /// Decision of a chain for an event, or None if the chain is not part of
    /// the trigger configuration
    fn is_passed(
        &self,
        event: &EventRecord,
        chain: &str,
        condition: DecisionCondition,
    ) -> Option<bool>;
}

/// Decision oracle which reads back the decision recorded with each event
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordedDecisions;
//
impl DecisionOracle for RecordedDecisions {
    fn is_passed(
        &self,
        event: &EventRecord,
        chain: &str,
        condition: DecisionCondition,
    ) -> Option<bool> {
        event
            .trigger
            .chains
            .get(chain.trim())
            .map(|bits| bits.passed(condition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with(chain: &str, bits: ChainBits) -> EventRecord {
        let mut event = EventRecord::default();
        event.trigger.chains.insert(chain.to_owned(), bits);
        event
    }

    #[test]
    fn recorded_decisions_follow_the_condition() {
        let bits = ChainBits {
            physics: false,
            before_prescale: true,
            after_veto: true,
        };
        let event = event_with("L1_TAU12", bits);
        let oracle = RecordedDecisions;
        assert_eq!(
            oracle.is_passed(&event, "L1_TAU12", DecisionCondition::BeforePrescale),
            Some(true)
        );
        assert_eq!(
            oracle.is_passed(&event, " L1_TAU12 ", DecisionCondition::Physics),
            Some(false)
        );
    }

    #[test]
    fn unconfigured_chains_are_reported_as_absent() {
        let event = event_with("L1_TAU12", ChainBits::default());
        assert_eq!(
            RecordedDecisions.is_passed(&event, "L1_TAU60", DecisionCondition::Physics),
            None
        );
    }

    #[test]
    fn parse_conditions() {
        assert_eq!(
            "after_veto".parse::<DecisionCondition>(),
            Ok(DecisionCondition::AfterVeto)
        );
        assert!("resurrected".parse::<DecisionCondition>().is_err());
    }
}
