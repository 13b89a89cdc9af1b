use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use heron::models::message::Message;

pub fn ensure_session_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let session_dir = home_dir.join(".config").join("heron").join("sessions");

    if !session_dir.exists() {
        fs::create_dir_all(&session_dir)?;
    }

    Ok(session_dir)
}

pub fn session_path(name: &str) -> Result<PathBuf> {
    Ok(ensure_session_dir()?.join(format!("{}.jsonl", name)))
}

/// Write the whole history to the session file, one JSON message per line.
pub fn persist_messages(session_file: &Path, messages: &[Message]) -> Result<()> {
    let file = File::create(session_file)?;
    let mut writer = BufWriter::new(file);

    for message in messages {
        serde_json::to_writer(&mut writer, &message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn load_messages(session_file: &Path) -> Result<Vec<Message>> {
    let reader = BufReader::new(File::open(session_file)?);
    let mut messages = Vec::new();

    for line in reader.lines() {
        messages.push(serde_json::from_str::<Message>(&line?)?);
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron::errors::ToolError;
    use heron::models::tool::ToolCall;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[test]
    fn test_round_trip_text_message() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let messages = vec![
            Message::user().with_text("Hello, world!"),
            Message::assistant().with_text("Hi!"),
        ];

        persist_messages(temp_file.path(), &messages)?;
        let loaded = load_messages(temp_file.path())?;

        assert_eq!(messages, loaded);
        Ok(())
    }

    #[test]
    fn test_round_trip_tool_traffic() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let messages = vec![
            Message::assistant()
                .with_tool_request("call_9", Ok(ToolCall::new("add", json!({"a": 1, "b": 2})))),
            Message::user().with_tool_response("call_9", Ok("3".to_string())),
            Message::user().with_tool_response(
                "call_10",
                Err(ToolError::NotFound("missing".to_string())),
            ),
        ];

        persist_messages(temp_file.path(), &messages)?;
        let loaded = load_messages(temp_file.path())?;

        assert_eq!(messages, loaded);
        Ok(())
    }

    #[test]
    fn test_persist_overwrites_previous_contents() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        persist_messages(
            temp_file.path(),
            &[
                Message::user().with_text("one"),
                Message::assistant().with_text("two"),
            ],
        )?;
        persist_messages(temp_file.path(), &[Message::user().with_text("only")])?;

        let loaded = load_messages(temp_file.path())?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text(), "only");
        Ok(())
    }
}
