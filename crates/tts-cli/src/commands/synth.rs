//! Synthesis commands: `synth` and `clone`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::info;

use super::client::ApiClient;

/// Synthesis options.
#[derive(Debug, Clone)]
pub struct SynthOptions {
    pub text: String,
    pub output: PathBuf,
    pub model: Option<String>,
    pub lang: Option<String>,
    /// Use `POST /tts/{model}` with a form body instead of the JSON endpoint.
    pub form: bool,
}

/// Voice cloning options.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    pub text: String,
    pub voice: PathBuf,
    pub output: PathBuf,
    pub model: Option<String>,
    pub lang: Option<String>,
}

/// Input text, or the contents of a file when prefixed with `@`.
pub fn read_input(input: &str) -> Result<String> {
    match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read text from {path}")),
        None => Ok(input.to_string()),
    }
}

/// Run the synth command.
pub async fn run(client: &ApiClient, options: SynthOptions) -> Result<()> {
    let text = read_input(&options.text)?;
    let start = Instant::now();

    let audio = if options.form {
        let model = options.model.as_deref().unwrap_or("turbo");
        let mut fields = vec![("text", text.as_str())];
        if let Some(lang) = options.lang.as_deref() {
            fields.push(("language_id", lang));
        }
        client.post_form(&format!("/tts/{model}"), &fields).await?
    } else {
        let mut body = json!({ "text": text });
        if let Some(model) = &options.model {
            body["model_type"] = json!(model);
        }
        if let Some(lang) = &options.lang {
            body["language_id"] = json!(lang);
        }
        client.post_json("/tts", &body).await?
    };

    let duration_ms = audio_duration_ms(&audio)?;
    save(&options.output, &audio)?;
    info!(
        bytes = audio.len(),
        duration_ms,
        elapsed_ms = start.elapsed().as_millis() as u64,
        output = %options.output.display(),
        "Synthesis complete"
    );
    Ok(())
}

/// Run the clone command.
pub async fn run_clone(client: &ApiClient, options: CloneOptions) -> Result<()> {
    let text = read_input(&options.text)?;
    let voice = std::fs::read(&options.voice)
        .with_context(|| format!("failed to read voice file {}", options.voice.display()))?;
    let file_name = options
        .voice
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "voice.wav".to_string());

    let mut form = Form::new().text("text", text).part(
        "voice_file",
        Part::bytes(voice).file_name(file_name).mime_str("audio/wav")?,
    );
    if let Some(model) = options.model {
        form = form.text("model_type", model);
    }
    if let Some(lang) = options.lang {
        form = form.text("language_id", lang);
    }

    let start = Instant::now();
    let audio = client.post_multipart("/tts/with-voice", form).await?;

    let duration_ms = audio_duration_ms(&audio)?;
    save(&options.output, &audio)?;
    info!(
        bytes = audio.len(),
        duration_ms,
        elapsed_ms = start.elapsed().as_millis() as u64,
        output = %options.output.display(),
        "Voice clone complete"
    );
    Ok(())
}

/// Playback length of a WAV response; fails when the body is not a WAV file.
fn audio_duration_ms(audio: &[u8]) -> Result<f32> {
    let decoded = audio_codec::decode_wav(audio).context("server returned invalid WAV audio")?;
    Ok(decoded.duration_ms())
}

fn save(path: &Path, audio: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, audio).with_context(|| format!("failed to write {}", path.display()))
}
