//! Streaming XML parser with handlers keyed by element path.
//!
//! Handlers are registered against full element paths from the document
//! root (`["mame", "machine", "rom"]`). Several paths may share one handler,
//! which is how `<dipswitch>` and `<configuration>` end up in the same table.
//! Handlers are plain function pointers over a caller-supplied state type,
//! so the state is borrowed mutably by exactly one handler at a time.

use std::hash::BuildHasherDefault;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashMap as FastHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHasher;

use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// What to do with an element after its begin handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Process the element and its children normally.
    Continue,
    /// Ignore the element's children and its end handler.
    Skip,
}

/// Called on an element's start tag.
pub type BeginHandler<S> = fn(&mut S, &Attributes) -> Result<Control>;

/// Called on an element's end tag with its accumulated text.
pub type EndHandler<S> = fn(&mut S, String) -> Result<()>;

struct Handlers<S> {
    begin: Option<BeginHandler<S>>,
    end: Option<EndHandler<S>>,
}

// Function pointers are Copy regardless of S.
impl<S> Clone for Handlers<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Handlers<S> {}

impl<S> Default for Handlers<S> {
    fn default() -> Self {
        Self { begin: None, end: None }
    }
}

/// An open element.
struct Frame<S> {
    end: Option<EndHandler<S>>,
    text: String,
}

/// Attributes of one element, unescaped.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    fn from_start(e: &BytesStart<'_>, position: u64) -> Result<Self> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| xml_error(position, format!("malformed attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| xml_error(position, e.to_string()))?
                .into_owned();
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    /// Build an attribute set directly.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }

    /// Raw attribute text.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Boolean attribute (`yes`/`no`, `true`/`false`, `1`/`0`).
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            "yes" | "true" | "1" => Some(true),
            "no" | "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn get_u8(&self, name: &str) -> Option<u8> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name)?.trim().parse().ok()
    }

    /// Unsigned attribute in the given radix; a `0x` prefix is accepted for radix 16.
    pub fn get_u64_radix(&self, name: &str, radix: u32) -> Option<u64> {
        let text = self.get(name)?.trim();
        let digits = match radix {
            16 => text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(text),
            _ => text,
        };
        u64::from_str_radix(digits, radix).ok()
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name)?.trim().parse().ok()
    }

    /// Attribute parsed by a lookup function such as an enum's `from_attr`.
    pub fn get_with<T>(&self, name: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        self.get(name).and_then(parse)
    }
}

fn xml_error(position: u64, message: impl std::fmt::Display) -> Error {
    Error::Xml {
        message: format!("{message} (at byte {position})"),
    }
}

/// Path-keyed streaming parser.
pub struct XmlParser<S> {
    handlers: FxHashMap<Vec<String>, Handlers<S>>,
}

impl<S> Default for XmlParser<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> XmlParser<S> {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    fn entry(&mut self, path: &[&str]) -> &mut Handlers<S> {
        let key: Vec<String> = path.iter().map(|s| (*s).to_owned()).collect();
        self.handlers.entry(key).or_default()
    }

    /// Register a begin handler for each of `paths`.
    pub fn on_begin(&mut self, paths: &[&[&str]], handler: BeginHandler<S>) -> &mut Self {
        for path in paths {
            self.entry(path).begin = Some(handler);
        }
        self
    }

    /// Register an end handler for each of `paths`.
    pub fn on_end(&mut self, paths: &[&[&str]], handler: EndHandler<S>) -> &mut Self {
        for path in paths {
            self.entry(path).end = Some(handler);
        }
        self
    }

    /// Stream `input`, dispatching to the registered handlers.
    ///
    /// `abort` is polled at every start tag. When it is raised the parse
    /// stops with [`Error::Cancelled`], and a parse error seen while it is
    /// raised is reported as a cancellation as well, since a killed producer
    /// leaves truncated XML behind.
    pub fn parse<R: BufRead>(&self, input: R, state: &mut S, abort: Option<&AtomicBool>) -> Result<()> {
        let aborted = || abort.is_some_and(|flag| flag.load(Ordering::Relaxed));
        match self.parse_events(input, state, &aborted) {
            Err(Error::Xml { .. }) if aborted() => Err(Error::Cancelled),
            other => other,
        }
    }

    fn parse_events<R: BufRead>(
        &self,
        input: R,
        state: &mut S,
        aborted: &dyn Fn() -> bool,
    ) -> Result<()> {
        let mut reader = Reader::from_reader(input);

        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut frames: Vec<Frame<S>> = Vec::new();
        let mut skip_depth = 0usize;
        let mut seen_root = false;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| xml_error(reader.buffer_position() as u64, e))?;

            match event {
                Event::Start(e) => {
                    if aborted() {
                        return Err(Error::Cancelled);
                    }
                    seen_root = true;
                    self.start(&e, position, &mut path, &mut frames, &mut skip_depth, state)?;
                }
                Event::Empty(e) => {
                    if aborted() {
                        return Err(Error::Cancelled);
                    }
                    seen_root = true;
                    self.start(&e, position, &mut path, &mut frames, &mut skip_depth, state)?;
                    Self::end(&mut path, &mut frames, &mut skip_depth, state)?;
                }
                Event::End(_) => {
                    Self::end(&mut path, &mut frames, &mut skip_depth, state)?;
                }
                Event::Text(e) => {
                    if let Some(frame) = frames.last_mut().filter(|f| f.end.is_some() && skip_depth == 0) {
                        let text = e.unescape().map_err(|e| xml_error(position, e))?;
                        frame.text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(frame) = frames.last_mut().filter(|f| f.end.is_some() && skip_depth == 0) {
                        frame.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !path.is_empty() || skip_depth > 0 {
            return Err(xml_error(
                reader.buffer_position() as u64,
                format!("unexpected end of document inside <{}>", path.join("/")),
            ));
        }
        if !seen_root {
            return Err(xml_error(0, "no root element found"));
        }
        Ok(())
    }

    fn start(
        &self,
        e: &BytesStart<'_>,
        position: u64,
        path: &mut Vec<String>,
        frames: &mut Vec<Frame<S>>,
        skip_depth: &mut usize,
        state: &mut S,
    ) -> Result<()> {
        if *skip_depth > 0 {
            *skip_depth += 1;
            return Ok(());
        }

        path.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
        let handlers = self.handlers.get(path.as_slice()).copied().unwrap_or_default();

        let control = match handlers.begin {
            Some(begin) => begin(state, &Attributes::from_start(e, position)?)?,
            None => Control::Continue,
        };

        match control {
            Control::Continue => frames.push(Frame {
                end: handlers.end,
                text: String::new(),
            }),
            Control::Skip => {
                path.pop();
                *skip_depth = 1;
            }
        }
        Ok(())
    }

    fn end(
        path: &mut Vec<String>,
        frames: &mut Vec<Frame<S>>,
        skip_depth: &mut usize,
        state: &mut S,
    ) -> Result<()> {
        if *skip_depth > 0 {
            *skip_depth -= 1;
            return Ok(());
        }
        path.pop();
        match frames.pop() {
            Some(Frame { end: Some(end), text }) => end(state, text),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        events: Vec<String>,
    }

    fn begin_item(log: &mut Log, attrs: &Attributes) -> Result<Control> {
        log.events.push(format!("item {}", attrs.get("id").unwrap_or("?")));
        Ok(Control::Continue)
    }

    fn end_label(log: &mut Log, text: String) -> Result<()> {
        log.events.push(format!("label {text}"));
        Ok(())
    }

    fn begin_secret(log: &mut Log, _: &Attributes) -> Result<Control> {
        log.events.push("secret".into());
        Ok(Control::Skip)
    }

    fn parser() -> XmlParser<Log> {
        let mut parser = XmlParser::new();
        parser
            .on_begin(&[&["root", "item"], &["root", "legacy"]], begin_item)
            .on_end(&[&["root", "item", "label"], &["root", "secret", "label"]], end_label)
            .on_begin(&[&["root", "secret"]], begin_secret);
        parser
    }

    fn run(xml: &str) -> Result<Vec<String>> {
        let mut log = Log::default();
        parser().parse(xml.as_bytes(), &mut log, None)?;
        Ok(log.events)
    }

    #[test]
    fn test_dispatch_and_aliases() {
        let events = run(r#"<root><item id="1"/><legacy id="2"></legacy><other id="3"/></root>"#).unwrap();
        assert_eq!(events, ["item 1", "item 2"]);
    }

    #[test]
    fn test_path_must_match_from_root() {
        let events = run(r#"<root><wrap><item id="1"/></wrap></root>"#).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_text_content_unescaped() {
        let events = run(r#"<root><item id="1"><label>Tom &amp; Jerry</label></item></root>"#).unwrap();
        assert_eq!(events, ["item 1", "label Tom & Jerry"]);
    }

    #[test]
    fn test_text_content_kept_verbatim() {
        let events = run("<root><item id=\"1\"><label>  A <!-- c --> B  </label></item></root>").unwrap();
        assert_eq!(events, ["item 1", "label   A  B  "]);
    }

    #[test]
    fn test_empty_element_end_gets_empty_text() {
        let events = run(r#"<root><item id="1"><label/></item></root>"#).unwrap();
        assert_eq!(events, ["item 1", "label "]);
    }

    #[test]
    fn test_skip_subtree() {
        let events = run(r#"<root><secret><label>hidden</label><x><y/></x></secret><item id="9"/></root>"#).unwrap();
        assert_eq!(events, ["secret", "item 9"]);
    }

    #[test]
    fn test_escaped_attribute() {
        let attrs = {
            let mut log = Log::default();
            parser()
                .parse(r#"<root><item id="a&quot;b"/></root>"#.as_bytes(), &mut log, None)
                .unwrap();
            log.events
        };
        assert_eq!(attrs, ["item a\"b"]);
    }

    #[test]
    fn test_mismatched_tags_is_xml_error() {
        let result = run(r#"<root><item id="1"></root>"#);
        assert!(matches!(result, Err(Error::Xml { .. })));
    }

    #[test]
    fn test_truncated_document_is_xml_error() {
        let result = run(r#"<root><item id="1"/>"#);
        match result {
            Err(Error::Xml { message }) => assert!(message.contains("<root>")),
            other => panic!("expected XML error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_document_is_xml_error() {
        assert!(matches!(run(""), Err(Error::Xml { .. })));
    }

    #[test]
    fn test_abort_is_cancellation() {
        let abort = AtomicBool::new(true);
        let mut log = Log::default();
        let result = parser().parse(r#"<root><item id="1"/></root>"#.as_bytes(), &mut log, Some(&abort));
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(log.events.is_empty());
    }

    #[test]
    fn test_parse_error_while_aborted_is_cancellation() {
        let abort = AtomicBool::new(true);
        let mut log = Log::default();
        let result = parser().parse("<root".as_bytes(), &mut log, Some(&abort));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_parse_error_without_abort_is_not_cancellation() {
        let abort = AtomicBool::new(false);
        let mut log = Log::default();
        let result = parser().parse(r#"<root><item id="1"></root>"#.as_bytes(), &mut log, Some(&abort));
        assert!(matches!(result, Err(Error::Xml { .. })));
    }

    #[test]
    fn test_typed_accessors() {
        let attrs = Attributes::from_pairs([
            ("size", "1024"),
            ("bad", "12x"),
            ("offset", "0x1f"),
            ("flag", "yes"),
            ("refresh", "59.94"),
        ]);
        assert_eq!(attrs.get_u32("size"), Some(1024));
        assert_eq!(attrs.get_u32("bad"), None);
        assert_eq!(attrs.get_u32("missing"), None);
        assert_eq!(attrs.get_u64_radix("offset", 16), Some(0x1f));
        assert_eq!(attrs.get_bool("flag"), Some(true));
        assert_eq!(attrs.get_bool("size"), None);
        assert_eq!(attrs.get_f32("refresh"), Some(59.94));
        assert_eq!(attrs.get_u8("size"), None);
    }
}
