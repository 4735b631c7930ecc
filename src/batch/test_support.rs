//! Fakes shared by the batch tests.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::format::{AudioFormat, Bitrate};
use crate::job::{Job, JobRequest};
use crate::transform::{AudioTransform, TransformError, TransformParams, TransformResult};

/// Deterministic stand-in for a codec: copies the input and appends the
/// gain, failing for the configured file names.
#[derive(Default)]
pub(crate) struct FakeTransform {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Barrier>>,
    gated: AtomicBool,
}

impl FakeTransform {
    pub(crate) fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Block the first call on `barrier` twice: once to announce that work
    /// has started, once to wait for permission to finish.
    pub(crate) fn gated(barrier: Arc<Barrier>) -> Self {
        Self {
            gate: Some(barrier),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl AudioTransform for FakeTransform {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        params: &TransformParams,
    ) -> TransformResult<u64> {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.lock().push(name.clone());

        if let Some(gate) = &self.gate {
            if !self.gated.swap(true, Ordering::SeqCst) {
                gate.wait();
                gate.wait();
            }
        }

        if self.failing.contains(&name) {
            return Err(TransformError::decode(input, "corrupt frame header"));
        }

        let mut bytes = fs::read(input).map_err(|e| TransformError::io(input, e))?;
        bytes.extend_from_slice(format!("|gain={}|{}", params.gain_db, params.bitrate).as_bytes());
        fs::write(output, &bytes).map_err(|e| TransformError::io(output, e))?;
        Ok(bytes.len() as u64)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// A temp folder with `input/<name>` files (content = name) and a job
/// targeting an existing `out/`, +6 dB, 192k, mp3.
pub(crate) fn job_with_files(names: &[&str]) -> (TempDir, Job) {
    let dir = tempfile::tempdir().expect("tempdir");
    let request = request_with_files(&dir, names);
    let job = Job::from_request(&request).expect("valid job");
    fs::create_dir_all(job.output_folder()).expect("output dir");
    (dir, job)
}

pub(crate) fn request_with_files(dir: &TempDir, names: &[&str]) -> JobRequest {
    let input = dir.path().join("input");
    fs::create_dir_all(&input).expect("input dir");
    for name in names {
        fs::write(input.join(name), name.as_bytes()).expect("input file");
    }
    JobRequest::new(input, dir.path().join("out"))
        .gain_db(6.0)
        .bitrate(Bitrate::parse("192k").expect("bitrate"))
        .format(AudioFormat::Mp3)
}
