// src/pipeline/render.rs

//! RSS 2.0 rendering.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{AppError, Result};
use crate::models::ChannelMeta;
use crate::pipeline::assemble::RenderEntry;

const GENERATOR: &str = concat!("rss-creator/", env!("CARGO_PKG_VERSION"));
const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// Order in which a renderer writes the entries it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionOrder {
    AsGiven,
    Reversed,
}

/// Serializes a channel and its entries into feed bytes.
pub trait FeedRenderer: Send + Sync {
    fn render(&self, channel: &ChannelMeta, entries: &[RenderEntry]) -> Result<Vec<u8>>;

    fn emission_order(&self) -> EmissionOrder {
        EmissionOrder::AsGiven
    }
}

/// RSS 2.0 document writer with Dublin Core creators.
#[derive(Debug, Clone, Default)]
pub struct RssRenderer {
    build_time: Option<DateTime<Utc>>,
}

impl RssRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix `lastBuildDate` instead of using the current time.
    pub fn with_build_time(mut self, build_time: DateTime<Utc>) -> Self {
        self.build_time = Some(build_time);
        self
    }
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(AppError::render)
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

impl FeedRenderer for RssRenderer {
    fn render(&self, channel: &ChannelMeta, entries: &[RenderEntry]) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        let build_time = self.build_time.unwrap_or_else(Utc::now);

        write(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:dc", DC_NAMESPACE));
        write(&mut writer, Event::Start(rss))?;
        write(&mut writer, Event::Start(BytesStart::new("channel")))?;

        text_element(&mut writer, "title", &channel.title)?;
        text_element(&mut writer, "link", &channel.link)?;
        text_element(&mut writer, "description", &channel.description)?;
        if let Some(language) = &channel.language {
            text_element(&mut writer, "language", language)?;
        }
        text_element(&mut writer, "generator", GENERATOR)?;
        text_element(&mut writer, "lastBuildDate", &build_time.to_rfc2822())?;

        for entry in entries {
            write_item(&mut writer, entry)?;
        }

        write(&mut writer, Event::End(BytesEnd::new("channel")))?;
        write(&mut writer, Event::End(BytesEnd::new("rss")))?;

        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn write_item(writer: &mut XmlWriter, entry: &RenderEntry) -> Result<()> {
    write(writer, Event::Start(BytesStart::new("item")))?;

    text_element(writer, "title", &entry.title)?;
    text_element(writer, "link", &entry.link)?;
    if let Some(description) = &entry.description {
        text_element(writer, "description", description)?;
    }

    // RSS <author> must be an email address
    if let Some(author) = &entry.author {
        let element = if author.contains('@') { "author" } else { "dc:creator" };
        text_element(writer, element, author)?;
    }

    for category in &entry.categories {
        text_element(writer, "category", category)?;
    }

    let mut guid = BytesStart::new("guid");
    let permalink = entry.guid == entry.link;
    guid.push_attribute(("isPermaLink", if permalink { "true" } else { "false" }));
    write(writer, Event::Start(guid))?;
    write(writer, Event::Text(BytesText::new(&entry.guid)))?;
    write(writer, Event::End(BytesEnd::new("guid")))?;

    if let Some(published) = &entry.published {
        text_element(writer, "pubDate", &published.to_rfc2822())?;
    }

    write(writer, Event::End(BytesEnd::new("item")))
}
