use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use nback_core::{TrialPair, TrialRow};

/// The full trial specification for one run, already grouped into
/// (stimulus, fixation) pairs. Loaded once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TrialSequence {
    pairs: Vec<TrialPair>,
}

impl TrialSequence {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening trial fixture {}", path.display()))?;
        let sequence = Self::from_reader(file)
            .with_context(|| format!("parsing trial fixture {}", path.display()))?;
        info!(
            "loaded {} trial pairs from {}",
            sequence.len(),
            path.display()
        );
        Ok(sequence)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for (i, record) in csv.deserialize::<TrialRow>().enumerate() {
            let row = record.with_context(|| format!("fixture row {}", i + 1))?;
            rows.push(row);
        }

        if rows.len() % 2 != 0 {
            bail!(
                "fixture has {} rows; rows must pair up as (stimulus, fixation)",
                rows.len()
            );
        }

        let mut pairs = Vec::with_capacity(rows.len() / 2);
        let mut iter = rows.into_iter();
        while let (Some(stimulus), Some(fixation)) = (iter.next(), iter.next()) {
            pairs.push(TrialPair { stimulus, fixation });
        }

        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[TrialPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
