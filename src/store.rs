//! Event records and the files that they are read from
//!
//! Each input file holds one JSON event record per line. A record maps
//! container keys to typed containers, and carries the trigger decision
//! which was recorded online for this event.

use crate::{
    error::AnalysisError,
    objects::{EmTauRoI, EnergySumRoI, EventInfo, Jet, JetRoI, MuonRoI, TauJet, TruthTau},
    trigger::TriggerRecord,
};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

/// Typed collection of detector objects
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", content = "items")]
pub enum Container {
    EventInfo(EventInfo),
    TauJets(Vec<TauJet>),
    Jets(Vec<Jet>),
    EmTauRoIs(Vec<EmTauRoI>),
    JetRoIs(Vec<JetRoI>),
    MuonRoIs(Vec<MuonRoI>),
    EnergySum(EnergySumRoI),
    TruthTaus(Vec<TruthTau>),
}

/// Something which can be retrieved from an event record
pub trait Retrieve: Sized {
    /// Name of the container kind, for error reporting
    const KIND: &'static str;

    /// Extract the payload of a container, if it has the right kind
    fn unpack(container: &Container) -> Option<&Self>;
}

macro_rules! retrieve_impls {
    ($($variant:ident => $payload:ty),* $(,)?) => {
        impl Container {
            /// Name of this container's kind
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Container::$variant(_) => stringify!($variant),)*
                }
            }
        }

        $(
            impl Retrieve for $payload {
                const KIND: &'static str = stringify!($variant);

                fn unpack(container: &Container) -> Option<&Self> {
                    match container {
                        Container::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }
        )*
    };
}

retrieve_impls! {
    EventInfo => EventInfo,
    TauJets => Vec<TauJet>,
    Jets => Vec<Jet>,
    EmTauRoIs => Vec<EmTauRoI>,
    JetRoIs => Vec<JetRoI>,
    MuonRoIs => Vec<MuonRoI>,
    EnergySum => EnergySumRoI,
    TruthTaus => Vec<TruthTau>,
}

/// Everything that was recorded for one event
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Detector object containers, by key
    #[serde(default)]
    pub containers: BTreeMap<String, Container>,

    /// Online trigger decision
    #[serde(default)]
    pub trigger: TriggerRecord,
}
//
impl EventRecord {
    /// Retrieve a container by key
    pub fn retrieve<T: Retrieve>(&self, key: &str) -> Result<&T, AnalysisError> {
        let container = self
            .containers
            .get(key)
            .ok_or_else(|| AnalysisError::MissingInput {
                key: key.to_owned(),
            })?;
        T::unpack(container).ok_or_else(|| AnalysisError::WrongContainer {
            key: key.to_owned(),
            expected: T::KIND,
            found: container.kind(),
        })
    }
}

/// Split a comma-separated list of input file names
///
/// Whitespace inside the list is dropped, and so are empty entries.
///
pub fn split_names(files: &str) -> Vec<PathBuf> {
    files
        .split(',')
        .map(|name| name.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|name| !name.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Reader of JSON-lines event files
pub struct EventReader {
    files: Vec<PathBuf>,
}
//
impl EventReader {
    /// Prepare to read the given files, in order
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    /// Read every event of every file, stopping after `max_events` if set
    pub fn read(&self, max_events: Option<usize>) -> Result<Vec<EventRecord>> {
        let limit = max_events.unwrap_or(usize::MAX);
        let mut events = Vec::new();
        for path in &self.files {
            if events.len() >= limit {
                break;
            }
            let before = events.len();
            Self::read_file(path, limit, &mut events)
                .wrap_err_with(|| format!("Failed to read events from {}", path.display()))?;
            log::info!(
                "Read {} events from {}",
                events.len() - before,
                path.display()
            );
        }
        Ok(events)
    }

    /// Append the events of one file
    fn read_file(path: &Path, limit: usize, events: &mut Vec<EventRecord>) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for (line_idx, line) in reader.lines().enumerate() {
            if events.len() >= limit {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str::<EventRecord>(&line)
                .wrap_err_with(|| format!("Malformed event record on line {}", line_idx + 1))?;
            events.push(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORD: &str = r#"{"containers": {
        "EventInfo": {"type": "EventInfo", "items": {"run_number": 284500, "event_number": 17, "lumi_block": 3}},
        "TauJets": {"type": "TauJets", "items": [{"pt": 45000, "eta": 0.3, "phi": 0.1, "n_tracks": 1, "id": "medium"}]}
    }, "trigger": {"chains": {"L1_TAU12": {"before_prescale": true}}}}"#;

    #[test]
    fn retrieve_typed_containers() {
        let event: EventRecord = serde_json::from_str(RECORD).unwrap();
        let info = event.retrieve::<EventInfo>("EventInfo").unwrap();
        assert_eq!(info.event_number, 17);
        let taus = event.retrieve::<Vec<TauJet>>("TauJets").unwrap();
        assert_eq!(taus.len(), 1);
    }

    #[test]
    fn retrieval_failures_name_the_key() {
        let event: EventRecord = serde_json::from_str(RECORD).unwrap();
        assert_eq!(
            event.retrieve::<Vec<Jet>>("AntiKt4LCTopoJets"),
            Err(AnalysisError::MissingInput {
                key: "AntiKt4LCTopoJets".to_owned()
            })
        );
        assert_eq!(
            event.retrieve::<Vec<Jet>>("TauJets"),
            Err(AnalysisError::WrongContainer {
                key: "TauJets".to_owned(),
                expected: "Jets",
                found: "TauJets",
            })
        );
    }

    #[test]
    fn split_file_lists() {
        assert_eq!(
            split_names("a.json, b.json,\n c.json,"),
            vec![
                PathBuf::from("a.json"),
                PathBuf::from("b.json"),
                PathBuf::from("c.json")
            ]
        );
        assert!(split_names("").is_empty());
    }

    #[test]
    fn read_files_in_order_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        {
            let mut file = File::create(&path).unwrap();
            for _ in 0..3 {
                writeln!(file, "{}", RECORD.replace('\n', " ")).unwrap();
            }
            writeln!(file).unwrap();
        }
        let reader = EventReader::new(vec![path.clone(), path]);
        assert_eq!(reader.read(None).unwrap().len(), 6);
        assert_eq!(reader.read(Some(4)).unwrap().len(), 4);
    }

    #[test]
    fn malformed_records_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"containers\": 3}\n").unwrap();
        let err = EventReader::new(vec![path]).read(None).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }
}
