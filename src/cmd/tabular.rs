/*!
tabular.rs - summary report for `show`.

ShowData::from_meta decodes the handful of known metadata fields into a
typed record. Each field is decoded on its own; every mismatch (missing
key, wrong kind) is collected so the resulting ShapeError names all the
offending fields at once. Nothing is rendered unless the whole record
decodes.

Report layout (tab aligned):

  Name / Owner / Revision
  Summary / Supported Series / Tags / Subordinate   (charms only)
  Promulgated / Home page / Bugs url / Read / Write
  Terms                                             (only when non-empty)
  CHANNEL  CURRENT
  <one row per published channel>
*/

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

use crate::cmd::format::TabWriter;

/* ---- Errors ---- */

/// One field that did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Error)]
#[error("unexpected metadata shape: {}", join_fields(.fields))]
pub struct ShapeError {
    pub fields: Vec<FieldError>,
}

impl ShapeError {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/* ---- Wire shapes ---- */

#[derive(Debug, Default, Deserialize)]
struct IdRevision {
    #[serde(rename = "Revision")]
    revision: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Promulgated {
    #[serde(rename = "Promulgated")]
    promulgated: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Owner {
    #[serde(rename = "User")]
    user: String,
}

#[derive(Debug, Default, Deserialize)]
struct IdName {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Perm {
    #[serde(rename = "Read")]
    read: Vec<String>,
    #[serde(rename = "Write")]
    write: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Published {
    #[serde(rename = "Info")]
    info: Vec<ChannelInfo>,
}

/// One published channel of the entity.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelInfo {
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Current")]
    pub current: bool,
}

// Tags and SupportedSeries are omitted by the store when empty.
#[derive(Debug, Default, Deserialize)]
struct CharmMetadata {
    #[serde(rename = "Summary")]
    summary: String,
    #[serde(rename = "SupportedSeries", default)]
    supported_series: Option<Vec<String>>,
    #[serde(rename = "Tags", default)]
    tags: Option<Vec<String>>,
    #[serde(rename = "Subordinate")]
    subordinate: bool,
}

/* ---- Projection ---- */

/// Charm-only part of the report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CharmSummary {
    pub summary: String,
    pub supported_series: Vec<String>,
    pub tags: Vec<String>,
    pub subordinate: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShowData {
    pub name: String,
    pub owner: String,
    pub revision: i64,
    pub promulgated: bool,
    pub home_page: String,
    pub bugs_url: String,
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub terms: Vec<String>,
    pub channels: Vec<ChannelInfo>,
    pub charm: CharmSummary,
    pub bundle: bool,
}

/// Collects per-field decode failures instead of stopping at the first.
struct FieldDecoder<'a> {
    meta: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldDecoder<'a> {
    fn required<T: DeserializeOwned + Default>(&mut self, key: &str) -> T {
        match self.meta.get(key) {
            Some(v) => self.decode(key, v),
            None => {
                self.errors.push(FieldError::new(key, "missing"));
                T::default()
            }
        }
    }

    /// Absent and `null` both mean "not there".
    fn optional<T: DeserializeOwned + Default>(&mut self, key: &str) -> Option<T> {
        match self.meta.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => Some(self.decode(key, v)),
        }
    }

    fn decode<T: DeserializeOwned + Default>(&mut self, key: &str, v: &Value) -> T {
        match T::deserialize(v) {
            Ok(t) => t,
            Err(e) => {
                self.errors.push(FieldError::new(key, e.to_string()));
                T::default()
            }
        }
    }
}

impl ShowData {
    pub fn from_meta(meta: &Map<String, Value>) -> Result<Self, ShapeError> {
        let mut d = FieldDecoder {
            meta,
            errors: Vec::new(),
        };

        let revision: IdRevision = d.required("id-revision");
        let promulgated: Promulgated = d.required("promulgated");
        let owner: Owner = d.required("owner");
        let bugs_url: String = d.required("bugs-url");
        let home_page: String = d.required("homepage");
        let terms: Option<Vec<String>> = d.optional("terms");
        let name: IdName = d.required("id-name");
        let perm: Perm = d.required("perm");
        let published: Published = d.required("published");
        let charm: Option<CharmMetadata> = d.optional("charm-metadata");
        let bundle = meta.contains_key("bundle-metadata");

        if !d.errors.is_empty() {
            return Err(ShapeError::new(d.errors));
        }

        let charm = charm
            .map(|c| CharmSummary {
                summary: c.summary,
                supported_series: c.supported_series.unwrap_or_default(),
                tags: c.tags.unwrap_or_default(),
                subordinate: c.subordinate,
            })
            .unwrap_or_default();

        Ok(ShowData {
            name: name.name,
            owner: owner.user,
            revision: revision.revision,
            promulgated: promulgated.promulgated,
            home_page,
            bugs_url,
            read: perm.read,
            write: perm.write,
            terms: terms.unwrap_or_default(),
            channels: published.info,
            charm,
            bundle,
        })
    }

    /// Write the aligned report to `out`.
    pub fn render<W: Write>(&self, out: W) -> io::Result<W> {
        let mut tw = TabWriter::new(out, 0, 8, 8, '\t');
        writeln!(tw, "Name\t{}", self.name)?;
        writeln!(tw, "Owner\t{}", self.owner)?;
        writeln!(tw, "Revision\t{}", self.revision)?;
        if !self.bundle {
            writeln!(tw, "Summary\t{}", self.charm.summary)?;
            let series = self.charm.supported_series.join(", ");
            writeln!(tw, "Supported Series\t{series}")?;
            writeln!(tw, "Tags\t{}", self.charm.tags.join(", "))?;
            writeln!(tw, "Subordinate\t{}", self.charm.subordinate)?;
        }
        writeln!(tw, "Promulgated\t{}", self.promulgated)?;
        writeln!(tw, "Home page\t{}", self.home_page)?;
        writeln!(tw, "Bugs url\t{}", self.bugs_url)?;
        writeln!(tw, "Read\t{}", self.read.join(", "))?;
        writeln!(tw, "Write\t{}", self.write.join(", "))?;
        if !self.terms.is_empty() {
            writeln!(tw, "Terms\t{}", self.terms.join(", "))?;
        }
        writeln!(tw, " \t ")?;
        writeln!(tw, "CHANNEL\tCURRENT")?;
        for c in &self.channels {
            writeln!(tw, "{}\t{}\t", c.channel, c.current)?;
        }
        tw.flush()?;
        Ok(tw.into_inner())
    }
}

/// Decode and render the summary report into a byte buffer.
pub fn format_summary(meta: &Map<String, Value>) -> anyhow::Result<Vec<u8>> {
    let data = ShowData::from_meta(meta)?;
    Ok(data.render(Vec::new())?)
}

/* ---- Tests ---- */
