//! Claude CLI連携
//!
//! 画像を一時フォルダに書き出し、`claude -p` にファイルパス付きの
//! プロンプトを渡して属性JSONを得る

use super::{ImagePayload, VisionCapability};
use async_trait::async_trait;
use shop_lens_common::{build_combined_prompt, ExtractionError};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

pub struct ClaudeCliVision {
    model: String,
    timeout: Duration,
}

impl ClaudeCliVision {
    pub fn new(model: String, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    async fn run_claude_cli(&self, prompt: &str) -> Result<String, ExtractionError> {
        // Windowsではcmd /c経由（改行・引用符はcmdで壊れるため置換）
        #[cfg(windows)]
        let mut command = {
            let escaped = prompt.replace('\n', " ").replace('"', "\\\"");
            let mut c = Command::new("cmd");
            c.args(["/c", "claude", "-p", escaped.as_str()]);
            c
        };

        #[cfg(not(windows))]
        let mut command = {
            let mut c = Command::new("claude");
            c.args(["-p", prompt]);
            c
        };

        command.args(["--model", self.model.as_str(), "--output-format", "text"]);
        command.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ExtractionError::Capability(format!("Claude CLIがタイムアウトしました ({}秒)", self.timeout.as_secs())))?
            .map_err(|e| ExtractionError::Capability(format!("Claude CLI実行エラー: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Capability(format!(
                "Claude CLI failed (code {:?}): {}",
                output.status.code(),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// 画像を一時ファイルに書き出す（ファイル名は内容ハッシュ）
fn write_temp_image(image: &ImagePayload) -> Result<PathBuf, ExtractionError> {
    let temp_dir = std::env::temp_dir().join("shop-lens");
    let extension = match image.mime_type.as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    };
    let path = temp_dir.join(format!("{}.{}", image.content_hash(), extension));

    std::fs::create_dir_all(&temp_dir)
        .and_then(|_| std::fs::write(&path, &image.bytes))
        .map_err(|e| ExtractionError::Capability(format!("一時ファイル作成エラー: {}", e)))?;

    Ok(path)
}

#[async_trait]
impl VisionCapability for ClaudeCliVision {
    fn name(&self) -> &str {
        "claude"
    }

    async fn describe(&self, image: &ImagePayload, instruction: &str) -> Result<String, ExtractionError> {
        let path = write_temp_image(image)?;
        let image_reference = path.display().to_string().replace('\\', "/");
        let prompt = build_combined_prompt(&image_reference, instruction);

        let result = self.run_claude_cli(&prompt).await;
        std::fs::remove_file(&path).ok();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_temp_image_uses_hash_name() {
        let image = ImagePayload {
            file_name: "q.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![9, 8, 7],
        };
        let path = write_temp_image(&image).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        assert!(path
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .starts_with(&image.content_hash()[..16]));
        std::fs::remove_file(path).ok();
    }
}
