use crate::error::{ReconcileError, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

#[derive(Serialize)]
struct Outcome<'a> {
    line: usize,
    op: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Writes one JSON object per executed journal line.
pub struct OutcomeWriter<W: Write> {
    sink: W,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write_ok(&mut self, line: usize, op: &str, result: &Value) -> Result<()> {
        self.write(&Outcome {
            line,
            op,
            ok: true,
            result: Some(result),
            error: None,
        })
    }

    pub fn write_err(&mut self, line: usize, op: &str, error: &ReconcileError) -> Result<()> {
        self.write(&Outcome {
            line,
            op,
            ok: false,
            result: None,
            error: Some(error.to_string()),
        })
    }

    fn write(&mut self, outcome: &Outcome<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.sink, outcome)?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_writer_output_lines() {
        let mut buffer = Vec::new();
        {
            let mut writer = OutcomeWriter::new(&mut buffer);
            writer.write_ok(1, "mark_day", &json!("P")).unwrap();
            writer
                .write_err(2, "get_leave", &ReconcileError::not_found("leave request x"))
                .unwrap();
            writer.flush().unwrap();
        }

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines[0], json!({"line": 1, "op": "mark_day", "ok": true, "result": "P"}));
        assert_eq!(lines[1]["ok"], false);
        assert!(lines[1]["error"].as_str().unwrap().contains("leave request x"));
        assert!(lines[1].get("result").is_none());
    }
}
