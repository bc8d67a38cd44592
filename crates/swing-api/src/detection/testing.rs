//! Test doubles for the detection pipeline.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use swing_models::SwingAnalysis;
use swing_vision::{EncodedImage, VisionClient, VisionError, VisionResult};
use tokio::sync::Semaphore;

/// Base64 of a minimal JPEG header, enough to pass format sniffing.
pub fn jpeg_base64() -> String {
    STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'])
}

enum Script {
    Results(Mutex<VecDeque<SwingAnalysis>>),
    Fail(String),
}

/// Vision client returning scripted verdicts.
///
/// When built with [`ScriptedVision::gated`], every call blocks until
/// [`ScriptedVision::release`] grants it a permit, which keeps an analysis
/// in flight for as long as a test needs.
pub struct ScriptedVision {
    script: Script,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    batches: Mutex<Vec<usize>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedVision {
    fn with_script(script: Script, gated: bool) -> Self {
        Self {
            script,
            gate: gated.then(|| Semaphore::new(0)),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `result`.
    pub fn always(result: SwingAnalysis) -> Self {
        Self::sequence(vec![result])
    }

    /// Answer with each result in turn, repeating the last one.
    pub fn sequence(results: Vec<SwingAnalysis>) -> Self {
        Self::with_script(Script::Results(Mutex::new(results.into())), false)
    }

    /// Like [`ScriptedVision::sequence`], but each call waits for a permit.
    pub fn gated(results: Vec<SwingAnalysis>) -> Self {
        Self::with_script(Script::Results(Mutex::new(results.into())), true)
    }

    /// Fail every call with a provider error.
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Fail(message.to_string()), false)
    }

    /// Let one blocked call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn last_batch_size(&self) -> Option<usize> {
        self.batches.lock().unwrap().last().copied()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    fn next_result(&self) -> VisionResult<SwingAnalysis> {
        match &self.script {
            Script::Fail(message) => Err(VisionError::RequestFailed(message.clone())),
            Script::Results(results) => {
                let mut results = results.lock().unwrap();
                let result = if results.len() > 1 {
                    results.pop_front()
                } else {
                    results.front().cloned()
                };
                result.ok_or_else(|| VisionError::invalid_response("script exhausted"))
            }
        }
    }
}

#[async_trait]
impl VisionClient for ScriptedVision {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    async fn analyze_images(&self, images: &[EncodedImage], prompt: &str) -> VisionResult<SwingAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(images.len());
        self.prompts.lock().unwrap().push(prompt.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_result()
    }
}
