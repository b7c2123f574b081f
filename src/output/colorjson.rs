use console::Style;
use serde_json::{Map, Value};

/// Colors used when rendering JSON values
#[derive(Debug, Clone)]
pub struct Palette {
    pub key: Style,
    pub string: Style,
    pub number: Style,
    pub boolean: Style,
    pub null: Style,
}

impl Palette {
    pub fn new(invert: bool, no_color: bool) -> Self {
        let key = if invert {
            Style::new().black()
        } else {
            Style::new().white()
        };

        let palette = Self {
            key,
            string: Style::new().green(),
            number: Style::new().cyan(),
            boolean: Style::new().yellow(),
            null: Style::new().magenta(),
        };

        if no_color {
            palette.plain()
        } else {
            palette
        }
    }

    fn plain(self) -> Self {
        Self {
            key: self.key.force_styling(false),
            string: self.string.force_styling(false),
            number: self.number.force_styling(false),
            boolean: self.boolean.force_styling(false),
            null: self.null.force_styling(false),
        }
    }
}

/// Renders JSON with sorted keys and per-type colors.
///
/// `indent == 0` produces a single line; otherwise each member goes on its
/// own line indented by `indent` spaces per level.
#[derive(Debug, Clone)]
pub struct ColorJson {
    pub palette: Palette,
    pub indent: usize,
    /// Write string contents as-is instead of JSON-escaping them
    pub raw_strings: bool,
}

impl ColorJson {
    pub fn render(&self, value: &Value) -> String {
        let mut buf = String::new();
        self.write_value(value, &mut buf, 0);
        buf
    }

    fn write_value(&self, value: &Value, buf: &mut String, depth: usize) {
        match value {
            Value::Object(map) => self.write_object(map, buf, depth),
            Value::Array(items) => self.write_array(items, buf, depth),
            Value::String(s) => {
                let text = self.quote(s);
                buf.push_str(&self.palette.string.apply_to(text).to_string());
            }
            Value::Number(n) => {
                buf.push_str(&self.palette.number.apply_to(n).to_string());
            }
            Value::Bool(b) => {
                buf.push_str(&self.palette.boolean.apply_to(b).to_string());
            }
            Value::Null => {
                buf.push_str(&self.palette.null.apply_to("null").to_string());
            }
        }
    }

    fn write_object(&self, map: &Map<String, Value>, buf: &mut String, depth: usize) {
        if map.is_empty() {
            buf.push_str("{}");
            return;
        }

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();

        buf.push('{');
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                buf.push(',');
                if self.indent == 0 {
                    buf.push(' ');
                }
            }
            self.write_break(buf, depth + 1);
            let quoted = self.quote(key);
            buf.push_str(&self.palette.key.apply_to(quoted).to_string());
            buf.push_str(": ");
            self.write_value(&map[key.as_str()], buf, depth + 1);
        }
        self.write_break(buf, depth);
        buf.push('}');
    }

    fn write_array(&self, items: &[Value], buf: &mut String, depth: usize) {
        if items.is_empty() {
            buf.push_str("[]");
            return;
        }

        buf.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                buf.push(',');
                if self.indent == 0 {
                    buf.push(' ');
                }
            }
            self.write_break(buf, depth + 1);
            self.write_value(item, buf, depth + 1);
        }
        self.write_break(buf, depth);
        buf.push(']');
    }

    fn write_break(&self, buf: &mut String, depth: usize) {
        if self.indent > 0 {
            buf.push('\n');
            buf.push_str(&" ".repeat(self.indent * depth));
        }
    }

    fn quote(&self, s: &str) -> String {
        if self.raw_strings {
            format!("\"{}\"", s)
        } else {
            // Serializing a str cannot fail
            serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
        }
    }
}
