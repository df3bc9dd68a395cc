// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only NDJSON log of finalized metrics samples, rotated daily
//! (spec §6.5, §A.5). `MetricsCollector` only ever keeps the retention
//! window in memory; this is the on-disk complement a restart can't lose.

use std::path::PathBuf;

use parking_lot::Mutex;
use rigwatch_model::MetricsSample;

pub struct MetricsLog {
    dir: PathBuf,
    open: Mutex<Option<(u64, std::fs::File)>>,
}

impl MetricsLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, open: Mutex::new(None) }
    }

    /// Append one finalized sample, rotating to a new file at the day
    /// boundary implied by `sample.timestamp`.
    pub fn append(&self, sample: &MetricsSample) -> std::io::Result<()> {
        use std::io::Write;

        let day = sample.timestamp / 86_400_000;
        let mut open = self.open.lock();
        if open.as_ref().map(|(d, _)| *d) != Some(day) {
            let path = self.dir.join(format!("metrics-{day}.ndjson"));
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            *open = Some((day, file));
        }
        let Some((_, file)) = open.as_mut() else {
            return Ok(());
        };
        let line = serde_json::to_string(sample)?;
        writeln!(file, "{line}")
    }
}
