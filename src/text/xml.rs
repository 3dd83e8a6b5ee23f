//! XML form of a `TextChunk`: one `<segment author="ID">` child per
//! segment. Text is always written as UTF-8, whatever the chunk's own
//! encoding is.

use Error;
use UserId;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use std::str;
use super::{Encoding, TextChunk};

const SEGMENT: &str = "segment";
const AUTHOR: &str = "author";

impl TextChunk {
    /// Writes the chunk's segments as children of whatever element
    /// the writer is currently inside.
    pub fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        for segment in &self.segments {
            let text = self.encoding.decode(&segment.text)?;
            let author = segment.author.to_string();

            let mut start = BytesStart::new(SEGMENT);
            start.push_attribute((AUTHOR, author.as_str()));

            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(SEGMENT)))?;
        }
        Ok(())
    }

    /// Returns the chunk as a standalone XML element named `element`.
    pub fn to_xml(&self, element: &str) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Start(BytesStart::new(element)))?;
        self.write_xml(&mut writer)?;
        writer.write_event(Event::End(BytesEnd::new(element)))?;
        String::from_utf8(writer.into_inner()).map_err(|_| Error::Encoding("UTF-8"))
    }

    /// Reads segments until the end tag of the enclosing element. The
    /// start tag of the enclosing element must already have been read.
    pub fn read_xml(reader: &mut Reader<&[u8]>, encoding: Encoding) -> Result<TextChunk, Error> {
        let mut chunk = TextChunk::new(encoding);

        loop {
            match reader.read_event()? {
                Event::Start(ref start) => {
                    let author = segment_author(start)?;
                    let text = read_segment_text(reader)?;
                    let bytes = encoding.encode(&text)?;
                    let length = encoding.char_count(&bytes).ok_or(Error::Encoding(encoding.name()))?;
                    chunk.push_segment(author, bytes, length);
                }
                Event::Empty(ref start) => {
                    segment_author(start)?;
                }
                Event::Text(ref text) => {
                    try_assert!(text.unescape()?.trim().is_empty(), Error::InvalidXml("text outside of a segment".into()));
                }
                Event::End(_) => return Ok(chunk),
                Event::Eof => return Err(Error::UnexpectedEof),
                _ => (),
            }
        }
    }

    /// Parses a chunk from a standalone XML element, as written by
    /// `to_xml`. The element name is not checked.
    pub fn from_xml(xml: &str, encoding: Encoding) -> Result<TextChunk, Error> {
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event()? {
                Event::Start(_) => return TextChunk::read_xml(&mut reader, encoding),
                Event::Empty(_) => return Ok(TextChunk::new(encoding)),
                Event::Eof => return Err(Error::UnexpectedEof),
                _ => (),
            }
        }
    }
}

fn segment_author(start: &BytesStart) -> Result<UserId, Error> {
    if start.name().as_ref() != SEGMENT.as_bytes() {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        return Err(Error::InvalidXml(format!("unexpected element <{}>", name)))
    }

    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() != AUTHOR.as_bytes() { continue }

        let value = attribute.unescape_value()?;
        return match value.parse() {
            Ok(author) => Ok(author),
            Err(_) => Err(Error::InvalidAuthor(value.into_owned())),
        }
    }

    Err(Error::MissingAttribute(AUTHOR))
}

fn read_segment_text(reader: &mut Reader<&[u8]>) -> Result<String, Error> {
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Text(ref event) => text.push_str(&event.unescape()?),
            Event::CData(ref event) => {
                let cdata = str::from_utf8(event).map_err(|_| Error::Encoding("UTF-8"))?;
                text.push_str(cdata);
            }
            Event::End(_) => return Ok(text),
            Event::Start(_) | Event::Empty(_) => return Err(Error::InvalidXml("nested element in segment".into())),
            Event::Eof => return Err(Error::UnexpectedEof),
            _ => (),
        }
    }
}
