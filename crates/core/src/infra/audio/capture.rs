use std::io::Cursor;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use super::{AudioRecorder, RecordingError};
use crate::domain::types::Attachment;

pub const RECORDING_FILE_NAME: &str = "recording.wav";
pub const RECORDING_MIME: &str = "audio/wav";

/// 録音済みの mono PCM
struct CapturedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

struct ActiveCapture {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<Result<CapturedAudio, RecordingError>>,
}

/// cpal によるマイク録音
///
/// **注意**: cpal::Stream は Send ではないため、stream は専用スレッド上で
/// 生成・保持し、停止シグナルを受けたらそのスレッドで drop する。
pub struct MicrophoneRecorder {
    active: Mutex<Option<ActiveCapture>>,
}

impl MicrophoneRecorder {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }
}

impl Default for MicrophoneRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioRecorder for MicrophoneRecorder {
    fn start(&self) -> Result<(), RecordingError> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), RecordingError>>();

        let handle = std::thread::Builder::new()
            .name("fir-mic-capture".into())
            .spawn(move || capture_thread(ready_tx, stop_rx))
            .map_err(|e| RecordingError::Device(format!("Failed to spawn capture thread: {e}")))?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(RecordingError::Device("Capture thread exited".into())));
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }

        *active = Some(ActiveCapture { stop_tx, handle });
        Ok(())
    }

    fn stop(&self) -> Result<Attachment, RecordingError> {
        let capture = self.active.lock().take().ok_or(RecordingError::NotRecording)?;
        let _ = capture.stop_tx.send(());
        let audio = capture
            .handle
            .join()
            .map_err(|_| RecordingError::Device("Capture thread panicked".into()))??;

        log::info!(
            "Recording stopped: {} samples at {}Hz",
            audio.samples.len(),
            audio.sample_rate
        );
        let bytes = encode_wav(&audio.samples, audio.sample_rate)?;
        Ok(Attachment::new(RECORDING_FILE_NAME, RECORDING_MIME, bytes))
    }

    fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

fn classify(message: String) -> RecordingError {
    if message.to_lowercase().contains("permission") {
        RecordingError::PermissionDenied(message)
    } else {
        RecordingError::Device(message)
    }
}

fn capture_thread(
    ready_tx: mpsc::Sender<Result<(), RecordingError>>,
    stop_rx: mpsc::Receiver<()>,
) -> Result<CapturedAudio, RecordingError> {
    let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
    let opened = open_stream(samples.clone());

    let (stream, sample_rate) = match opened {
        Ok(v) => v,
        Err(e) => {
            let _ = ready_tx.send(Err(e.clone()));
            return Err(e);
        }
    };
    let _ = ready_tx.send(Ok(()));

    // 停止シグナル（または送信側の drop）まで待つ
    let _ = stop_rx.recv();
    drop(stream);

    let samples = std::mem::take(&mut *samples.lock());
    Ok(CapturedAudio {
        samples,
        sample_rate,
    })
}

fn open_stream(samples: Arc<Mutex<Vec<f32>>>) -> Result<(cpal::Stream, u32), RecordingError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(RecordingError::NoDevice)?;

    let supported_config = device
        .default_input_config()
        .map_err(|e| classify(e.to_string()))?;

    let sample_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels();
    let sample_format = supported_config.sample_format();

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                samples.lock().extend(to_mono(data, channels));
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _info: &cpal::InputCallbackInfo| {
                let f32_data: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                samples.lock().extend(to_mono(&f32_data, channels));
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        ),
        format => {
            return Err(RecordingError::Device(format!(
                "Unsupported sample format: {:?}",
                format
            )));
        }
    }
    .map_err(|e| classify(e.to_string()))?;

    stream.play().map_err(|e| classify(e.to_string()))?;

    log::info!(
        "Audio capture started: {}Hz, {} channels, {:?}",
        sample_rate,
        channels,
        sample_format
    );

    Ok((stream, sample_rate))
}

/// ステレオ → モノ変換（チャンネル平均）
fn to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// mono f32 PCM を 16bit WAV にエンコードする
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, RecordingError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let encoding = |e: hound::Error| RecordingError::Encoding(e.to_string());

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(encoding)?;
        for &s in samples {
            let value = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).map_err(encoding)?;
        }
        writer.finalize().map_err(encoding)?;
    }
    Ok(cursor.into_inner())
}
