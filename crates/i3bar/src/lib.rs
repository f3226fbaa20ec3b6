use std::io::{self, Write};

use gpmdp_status_renderer::StatusBlock;
use serde_json::json;

const PROTOCOL_VERSION: u32 = 1;
const BLOCK_NAME: &str = "gpmdp";

/// Streams the i3bar protocol: a version header, an opening bracket, then an
/// endless JSON array of one-block status lines.
pub struct BarWriter<W: Write> {
    out: W,
    first: bool,
}

impl<W: Write> BarWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, first: true }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", json!({ "version": PROTOCOL_VERSION }))?;
        writeln!(self.out, "[")?;
        self.out.flush()
    }

    pub fn write_status(&mut self, block: &StatusBlock) -> io::Result<()> {
        let frame = json!([{
            "name": BLOCK_NAME,
            "full_text": block.text,
            "color": block.color,
        }]);
        if self.first {
            self.first = false;
            writeln!(self.out, "{frame}")?;
        } else {
            writeln!(self.out, ",{frame}")?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::BarWriter;
    use gpmdp_status_renderer::StatusBlock;

    fn block(text: &str) -> StatusBlock {
        StatusBlock {
            text: text.to_string(),
            color: "#00FF00".to_string(),
        }
    }

    #[test]
    fn header_announces_protocol_version_one() {
        let mut writer = BarWriter::new(Vec::new());
        writer.write_header().unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let mut lines = out.lines();
        let header: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(header["version"], 1);
        assert_eq!(lines.next(), Some("["));
    }

    #[test]
    fn frames_carry_name_text_and_color() {
        let mut writer = BarWriter::new(Vec::new());
        writer.write_status(&block("\u{266B} X Z/Y (15.0%)")).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let frame: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(frame[0]["name"], "gpmdp");
        assert_eq!(frame[0]["full_text"], "\u{266B} X Z/Y (15.0%)");
        assert_eq!(frame[0]["color"], "#00FF00");
    }

    #[test]
    fn frames_after_the_first_are_comma_separated() {
        let mut writer = BarWriter::new(Vec::new());
        writer.write_status(&block("a")).unwrap();
        writer.write_status(&block("b")).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let mut lines = out.lines();
        let first = lines.next().unwrap();
        let second = lines.next().unwrap();
        assert!(!first.starts_with(','));
        assert!(second.starts_with(','));

        let parsed: serde_json::Value =
            serde_json::from_str(second.trim_start_matches(',')).unwrap();
        assert_eq!(parsed[0]["full_text"], "b");
    }

    #[test]
    fn terminated_stream_parses_as_one_json_array() {
        let mut writer = BarWriter::new(Vec::new());
        writer.write_header().unwrap();
        writer.write_status(&block("a")).unwrap();
        writer.write_status(&block("b")).unwrap();
        let mut out = writer.into_inner();
        out.extend_from_slice(b"]");
        let text = String::from_utf8(out).unwrap();
        let body = text.split_once('\n').unwrap().1;
        let frames: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(frames.as_array().map(|frames| frames.len()), Some(2));
    }
}
