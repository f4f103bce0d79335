//! Native messaging host for the browser extension
//!
//! Reads length-prefixed JSON requests on stdin, turns the referenced image
//! into a bounded payload and hands it to `snaptag --process-file` as a
//! temporary file. stdout carries the protocol, so logs go to stderr.

use anyhow::Context;
use delivery::{
    read_json, write_json, DeliveryError, ImageDelivery, NativeRequest, NativeResponse, Payload,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
const APP_NAME: &str = "snaptag.exe";
#[cfg(not(target_os = "windows"))]
const APP_NAME: &str = "snaptag";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let delivery = ImageDelivery::default();
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&mut stdin.lock(), &mut stdout.lock(), |request| {
        handle_request(&delivery, &request)
    })
}

/// Answer requests until the browser closes the pipe
fn serve<R, W, F>(reader: &mut R, writer: &mut W, mut handler: F) -> anyhow::Result<()>
where
    R: Read,
    W: Write,
    F: FnMut(NativeRequest) -> NativeResponse,
{
    loop {
        let response = match read_json::<NativeRequest, _>(reader) {
            Ok(Some(request)) => handler(request),
            Ok(None) => {
                log::info!("Extension closed the connection");
                return Ok(());
            }
            Err(DeliveryError::Json(e)) => NativeResponse::error(format!("Invalid JSON: {}", e)),
            Err(e) => return Err(e).context("Failed to read request"),
        };

        log::debug!("Responding {:?}", response);
        write_json(writer, &response).context("Failed to write response")?;
    }
}

fn handle_request(delivery: &ImageDelivery, request: &NativeRequest) -> NativeResponse {
    match process(delivery, request) {
        Ok(message) => NativeResponse::ok(message),
        Err(e) => {
            log::error!("{:#}", e);
            NativeResponse::error(format!("{:#}", e))
        }
    }
}

fn process(delivery: &ImageDelivery, request: &NativeRequest) -> anyhow::Result<String> {
    let payload = delivery.prepare_request(request)?;
    let path = write_temp(&payload)?;

    let app = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(locate_app))
        .with_context(|| format!("Could not find {}", APP_NAME))?;

    log::info!("Launching {:?} for {:?}", app, path);
    let spawned = Command::new(&app)
        .arg("--process-file")
        .arg(&path)
        .arg("--delete-after")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn();

    if let Err(e) = spawned {
        let _ = std::fs::remove_file(&path);
        return Err(e).with_context(|| format!("Failed to launch {:?}", app));
    }

    Ok(format!("Tagging {}x{} image", payload.width, payload.height))
}

fn write_temp(payload: &Payload) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!(
        "snaptag_{}.{}",
        uuid::Uuid::new_v4().simple(),
        payload.extension()
    ));
    std::fs::write(&path, &payload.bytes).with_context(|| format!("Failed to write temp file {:?}", path))?;
    Ok(path)
}

/// Find the main executable next to the host, one level up, or on the system path
fn locate_app(exe_dir: &Path) -> Option<PathBuf> {
    let mut candidates = vec![exe_dir.join(APP_NAME)];
    if let Some(parent) = exe_dir.parent() {
        candidates.push(parent.join(APP_NAME));
    }
    #[cfg(not(target_os = "windows"))]
    candidates.extend([
        PathBuf::from("/usr/bin").join(APP_NAME),
        PathBuf::from("/usr/local/bin").join(APP_NAME),
    ]);

    candidates.into_iter().find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery::{read_message, write_message, ResponseStatus};
    use std::io::Cursor;

    fn framed(bodies: &[&[u8]]) -> Cursor<Vec<u8>> {
        let mut out = Vec::new();
        for body in bodies {
            write_message(&mut out, body).unwrap();
        }
        Cursor::new(out)
    }

    fn responses(bytes: Vec<u8>) -> Vec<NativeResponse> {
        let mut reader = Cursor::new(bytes);
        let mut out = Vec::new();
        while let Some(body) = read_message(&mut reader).unwrap() {
            out.push(serde_json::from_slice(&body).unwrap());
        }
        out
    }

    #[test]
    fn answers_each_request_then_stops_at_eof() {
        let mut input = framed(&[br#"{"url":"https://a/1.png"}"#, b"not json", br#"{}"#]);
        let mut output = Vec::new();
        let mut seen = Vec::new();

        serve(&mut input, &mut output, |request| {
            seen.push(request.url.clone());
            NativeResponse::ok("queued")
        })
        .unwrap();

        assert_eq!(seen, vec![Some("https://a/1.png".to_string()), None]);
        let replies = responses(output);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], NativeResponse::ok("queued"));
        assert_eq!(replies[1].status, ResponseStatus::Error);
        assert!(replies[1].message.starts_with("Invalid JSON"));
    }

    #[test]
    fn blob_and_empty_requests_are_errors() {
        let delivery = ImageDelivery::default();

        let blob = handle_request(&delivery, &NativeRequest::from_url("blob:https://a/b"));
        assert_eq!(blob.status, ResponseStatus::Error);
        assert!(blob.message.contains("blob"));

        let empty = handle_request(&delivery, &NativeRequest::default());
        assert_eq!(empty.status, ResponseStatus::Error);
    }

    #[test]
    fn finds_app_next_to_or_above_host() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        assert!(locate_app(&bin).map_or(true, |p| !p.starts_with(dir.path())));

        std::fs::write(dir.path().join(APP_NAME), b"").unwrap();
        assert_eq!(locate_app(&bin), Some(dir.path().join(APP_NAME)));

        std::fs::write(bin.join(APP_NAME), b"").unwrap();
        assert_eq!(locate_app(&bin), Some(bin.join(APP_NAME)));
    }
}
