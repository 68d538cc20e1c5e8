use crate::foundation::core::{BoundingBox, ImagePayload, SeaState};
use crate::foundation::error::{AugmentError, AugmentResult};
use crate::service::api::{
    AnimationPoll, BlockReason, EditOutcome, GenerativeService, OperationHandle, ServiceError,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

/// Program invoked by [`CommandService`] for every call.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CommandServiceConfig {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed before the operation name.
    #[serde(default)]
    pub args: Vec<String>,
}

/// [`GenerativeService`] that delegates every call to an external helper program.
///
/// For each call the helper is spawned as `<program> <args..> <op>`, receives one JSON request on
/// stdin and must print one JSON response on stdout. Images cross the boundary as files inside a
/// scratch directory owned by the service. A non-zero exit status is reported as
/// [`ServiceError::Api`] carrying the helper's stderr, so rate-limit markers in that text are
/// classified the same way as for any other backend.
pub struct CommandService {
    cfg: CommandServiceConfig,
    scratch: PathBuf,
    next_file: AtomicU64,
}

#[derive(serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    EditImage {
        image: &'a Path,
        mime_type: &'a str,
        prompt: &'a str,
        want_bounding_box: bool,
        output: &'a Path,
    },
    CheckPreservation {
        original: &'a Path,
        candidate: &'a Path,
        mime_type: &'a str,
    },
    ClassifySeaState {
        image: &'a Path,
        mime_type: &'a str,
    },
    EvaluateHardExample {
        image: &'a Path,
        mime_type: &'a str,
    },
    RequestAnimation {
        image: &'a Path,
        mime_type: &'a str,
    },
    PollAnimation {
        handle: &'a str,
    },
    FetchAnimation {
        uri: &'a str,
        output: &'a Path,
    },
}

impl Request<'_> {
    fn op_name(&self) -> &'static str {
        match self {
            Self::EditImage { .. } => "edit_image",
            Self::CheckPreservation { .. } => "check_preservation",
            Self::ClassifySeaState { .. } => "classify_sea_state",
            Self::EvaluateHardExample { .. } => "evaluate_hard_example",
            Self::RequestAnimation { .. } => "request_animation",
            Self::PollAnimation { .. } => "poll_animation",
            Self::FetchAnimation { .. } => "fetch_animation",
        }
    }
}

#[derive(serde::Deserialize, Debug, Default)]
#[serde(default)]
struct Response {
    image: Option<PathBuf>,
    mime_type: Option<String>,
    bounding_box: Option<BoundingBox>,
    finish_reason: Option<String>,
    blocked_category: Option<String>,
    text: Option<String>,
    preserved: Option<bool>,
    sea_state: Option<u8>,
    is_hard_example: Option<bool>,
    handle: Option<String>,
    done: Option<bool>,
    uri: Option<String>,
    failure: Option<String>,
    error: Option<serde_json::Value>,
}

/// Scratch file removed when dropped.
struct ScratchFile(PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl CommandService {
    /// Create a service and its scratch directory.
    pub fn new(cfg: CommandServiceConfig) -> AugmentResult<Self> {
        if cfg.program.trim().is_empty() {
            return Err(AugmentError::validation("service program must be non-empty"));
        }
        let scratch = std::env::temp_dir().join(format!(
            "sea_augment_service_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&scratch).map_err(|e| {
            AugmentError::validation(format!(
                "create service scratch dir '{}': {e}",
                scratch.display()
            ))
        })?;
        Ok(Self {
            cfg,
            scratch,
            next_file: AtomicU64::new(0),
        })
    }

    fn scratch_path(&self, ext: &str) -> ScratchFile {
        let n = self.next_file.fetch_add(1, Ordering::Relaxed);
        ScratchFile(self.scratch.join(format!("{n:08}.{ext}")))
    }

    fn stage(&self, payload: &ImagePayload) -> Result<ScratchFile, ServiceError> {
        let file = self.scratch_path(payload.file_extension());
        std::fs::write(&file.0, payload.bytes.as_slice())
            .map_err(|e| ServiceError::Transport(format!("stage '{}': {e}", file.0.display())))?;
        Ok(file)
    }

    fn invoke(&self, req: &Request<'_>) -> Result<Response, ServiceError> {
        let body = serde_json::to_vec(req)
            .map_err(|e| ServiceError::Protocol(format!("encode request: {e}")))?;

        let mut child = Command::new(&self.cfg.program)
            .args(&self.cfg.args)
            .arg(req.op_name())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ServiceError::Transport(format!("failed to spawn '{}': {e}", self.cfg.program))
            })?;

        {
            let mut stdin = child.stdin.take().ok_or_else(|| {
                ServiceError::Transport("failed to open service stdin (unexpected)".to_string())
            })?;
            stdin
                .write_all(&body)
                .map_err(|e| ServiceError::Transport(format!("write request: {e}")))?;
        }

        let out = child
            .wait_with_output()
            .map_err(|e| ServiceError::Transport(format!("wait for service: {e}")))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("service helper exited with {}", out.status)
            } else {
                stderr
            };
            return Err(ServiceError::api(message));
        }

        let resp: Response = serde_json::from_slice(&out.stdout)
            .map_err(|e| ServiceError::Protocol(format!("parse {} response: {e}", req.op_name())))?;
        if let Some(error) = resp.error.as_ref() {
            return Err(api_error_from_body(error));
        }
        Ok(resp)
    }
}

impl Drop for CommandService {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.scratch);
    }
}

fn api_error_from_body(error: &serde_json::Value) -> ServiceError {
    let code = error
        .get("code")
        .and_then(|c| c.as_u64())
        .and_then(|c| u16::try_from(c).ok());
    ServiceError::Api {
        code,
        message: serde_json::json!({ "error": error }).to_string(),
    }
}

fn read_output(path: &Path) -> Result<Vec<u8>, ServiceError> {
    std::fs::read(path)
        .map_err(|e| ServiceError::Protocol(format!("read output '{}': {e}", path.display())))
}

fn require<T>(value: Option<T>, field: &str, op: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::Protocol(format!("{op} response is missing '{field}'")))
}

impl GenerativeService for CommandService {
    fn edit_image(
        &self,
        image: &ImagePayload,
        prompt: &str,
        want_bounding_box: bool,
    ) -> Result<EditOutcome, ServiceError> {
        let input = self.stage(image)?;
        let output = self.scratch_path(image.file_extension());
        let resp = self.invoke(&Request::EditImage {
            image: &input.0,
            mime_type: &image.mime_type,
            prompt,
            want_bounding_box,
            output: &output.0,
        })?;

        let Some(path) = resp.image else {
            let reason = match (resp.finish_reason, resp.text) {
                (Some(reason), _) => BlockReason::from_finish_reason(&reason, resp.blocked_category),
                (None, Some(text)) => BlockReason::TextOnly(text),
                (None, None) => BlockReason::NoImage,
            };
            return Ok(EditOutcome::blocked(reason));
        };
        let bytes = read_output(&path)?;
        let mime_type = resp.mime_type.unwrap_or_else(|| image.mime_type.clone());
        let bounding_box = if want_bounding_box {
            resp.bounding_box
        } else {
            None
        };
        Ok(EditOutcome::image(
            ImagePayload::new(mime_type, bytes),
            bounding_box,
        ))
    }

    fn check_preservation(
        &self,
        original: &ImagePayload,
        candidate: &ImagePayload,
    ) -> Result<bool, ServiceError> {
        let a = self.stage(original)?;
        let b = self.stage(candidate)?;
        let resp = self.invoke(&Request::CheckPreservation {
            original: &a.0,
            candidate: &b.0,
            mime_type: &original.mime_type,
        })?;
        require(resp.preserved, "preserved", "check_preservation")
    }

    fn classify_sea_state(&self, image: &ImagePayload) -> Result<Option<SeaState>, ServiceError> {
        let input = self.stage(image)?;
        let resp = self.invoke(&Request::ClassifySeaState {
            image: &input.0,
            mime_type: &image.mime_type,
        })?;
        Ok(resp.sea_state.and_then(SeaState::from_level))
    }

    fn evaluate_hard_example(&self, image: &ImagePayload) -> Result<bool, ServiceError> {
        let input = self.stage(image)?;
        let resp = self.invoke(&Request::EvaluateHardExample {
            image: &input.0,
            mime_type: &image.mime_type,
        })?;
        require(resp.is_hard_example, "is_hard_example", "evaluate_hard_example")
    }

    fn request_animation(&self, image: &ImagePayload) -> Result<OperationHandle, ServiceError> {
        let input = self.stage(image)?;
        let resp = self.invoke(&Request::RequestAnimation {
            image: &input.0,
            mime_type: &image.mime_type,
        })?;
        require(resp.handle, "handle", "request_animation").map(OperationHandle)
    }

    fn poll_animation(&self, handle: &OperationHandle) -> Result<AnimationPoll, ServiceError> {
        let resp = self.invoke(&Request::PollAnimation { handle: &handle.0 })?;
        Ok(AnimationPoll {
            done: resp.done.unwrap_or(false),
            result_uri: resp.uri,
            error: resp.failure,
        })
    }

    fn fetch_animation_bytes(&self, uri: &str) -> Result<Vec<u8>, ServiceError> {
        let output = self.scratch_path("mp4");
        self.invoke(&Request::FetchAnimation {
            uri,
            output: &output.0,
        })?;
        read_output(&output.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/command.rs"]
mod tests;
