//! Minimal CSV writer for report exports

/// Quote a field when it contains the delimiter, a quote or a line break.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Accumulates rows into a CRLF-terminated CSV document.
#[derive(Debug, Default)]
pub struct CsvWriter {
    buf: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let line = fields
            .into_iter()
            .map(|f| escape_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        self.buf.push_str(&line);
        self.buf.push_str("\r\n");
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_fields() {
        assert_eq!(escape_field("Mesa 1"), "Mesa 1");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("dijo \"hola\""), "\"dijo \"\"hola\"\"\"");
        assert_eq!(escape_field("l1\nl2"), "\"l1\nl2\"");
    }

    #[test]
    fn writes_rows() {
        let mut w = CsvWriter::new();
        w.write_row(["ID", "Mesa"]);
        w.write_row(["1".to_string(), "Terraza, 2".to_string()]);
        assert_eq!(w.finish(), "ID,Mesa\r\n1,\"Terraza, 2\"\r\n");
    }
}
