//! Microphone capture via getUserMedia + MediaRecorder
//!
//! The recording itself is discarded; only the stop event matters.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{MediaRecorder, MediaStream, MediaStreamConstraints};

use super::PlatformError;

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// An open microphone stream plus the active recorder, if any
pub struct Microphone {
    stream: MediaStream,
    recorder: Option<MediaRecorder>,
    on_stop: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl Microphone {
    /// Ask for microphone permission and open the stream
    pub async fn open() -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or(PlatformError::NoWindow)?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|_| PlatformError::MicrophoneUnavailable)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|_| PlatformError::MicrophoneUnavailable)?;

        let stream = JsFuture::from(promise).await.map_err(|e| {
            log::error!("getUserMedia rejected: {}", describe(&e));
            PlatformError::MicrophoneDenied
        })?;
        let stream: MediaStream = stream
            .dyn_into()
            .map_err(|_| PlatformError::MicrophoneUnavailable)?;

        log::info!("Microphone initialized");
        Ok(Self {
            stream,
            recorder: None,
            on_stop: None,
        })
    }

    /// Stop without reporting completion (page teardown)
    pub fn cancel(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.set_onstop(None);
            if let Err(e) = recorder.stop() {
                log::warn!("Recorder cancel failed: {}", describe(&e));
            }
        }
        self.on_stop = None;
    }

    /// Start a recording; `on_complete` runs once the recorder has stopped
    pub fn start(&mut self, mut on_complete: impl FnMut() + 'static) -> Result<(), PlatformError> {
        if self.recorder.is_some() {
            return Ok(());
        }
        let recorder = MediaRecorder::new_with_media_stream(&self.stream)
            .map_err(|e| PlatformError::Recorder(describe(&e)))?;

        let on_stop = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            log::info!("Recorder stopped");
            on_complete();
        });
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));
        recorder
            .start()
            .map_err(|e| PlatformError::Recorder(describe(&e)))?;

        log::info!("Recording started");
        self.recorder = Some(recorder);
        self.on_stop = Some(on_stop);
        Ok(())
    }

    /// Stop the active recording (the completion callback fires afterwards)
    pub fn stop(&mut self) -> Result<(), PlatformError> {
        let Some(recorder) = self.recorder.take() else {
            return Ok(());
        };
        recorder
            .stop()
            .map_err(|e| PlatformError::Recorder(describe(&e)))
    }
}
