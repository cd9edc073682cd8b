//! MASL (Metadata for Arbitrary Structures & Links), the metadata system
//! from DASL.
//!
//! A document operates in one of two modes. In **single mode** the top-level
//! record carries the resource fields itself. In **bundle mode** the record
//! carries a map of path to resource, with paths required to begin with `/`.
//!
//! Well-known fields use the HTTP-header and Web App Manifest names exactly;
//! anything else round-trips through the `attributes` bucket in canonical
//! order.

use core::fmt;
use std::collections::BTreeMap;

use crate::cid::Cid;
use crate::codec::{Decode, Encode, IsEmpty};
use crate::de::ValueRef;
use crate::encode::{Encoder, MapEncoder};
use crate::value::{Value, ValueMap};
use crate::Error;

/// An icon entry in a Web App Manifest.
///
/// In bundle mode, `src` references a path in the resources map (e.g.
/// `/icon.png`). In single mode, `src` must be empty as there is no
/// resources map to reference.
#[derive(Debug, Clone, Default, PartialEq, crate::Encode, crate::Decode)]
pub struct Icon {
    /// Resource path of the image.
    pub src: String,
    /// Image dimensions (e.g. `512x512` or `192x192 512x512`).
    #[cbor(omitempty)]
    pub sizes: String,
    /// Icon usage context (e.g. `any`, `maskable`, `monochrome`).
    #[cbor(omitempty)]
    pub purpose: String,
}

/// A screenshot entry in a Web App Manifest.
#[derive(Debug, Clone, Default, PartialEq, crate::Encode, crate::Decode)]
pub struct Screenshot {
    /// Resource path of the image.
    pub src: String,
    /// Image dimensions (e.g. `1280x720`).
    #[cbor(omitempty)]
    pub sizes: String,
    /// Accessible description of the screenshot.
    #[cbor(omitempty)]
    pub label: String,
    /// Display format (e.g. `wide`, `narrow`).
    #[cbor(rename = "form_factor", omitempty)]
    pub form_factor: String,
    /// Target platform (e.g. `windows`, `macos`, `android`).
    #[cbor(omitempty)]
    pub platform: String,
}

/// Metadata for a single resource in a MASL document.
///
/// The `src` field identifies the resource content by CID. HTTP response
/// header fields control how the resource is served; Web App Manifest fields
/// carry application metadata. Unknown map keys encountered while decoding
/// are preserved in `attributes` and re-emitted alongside the declared
/// fields.
#[derive(Debug, Clone, Default, PartialEq, crate::Encode, crate::Decode)]
pub struct Resource {
    /// Content CID.
    #[cbor(omitzero)]
    pub src: Cid,
    /// Application name.
    #[cbor(omitempty)]
    pub name: String,

    // HTTP response headers
    /// MIME type (e.g. `text/html`).
    #[cbor(rename = "content-type", omitempty)]
    pub content_type: String,
    /// Content-Disposition header value.
    #[cbor(rename = "content-disposition", omitempty)]
    pub content_disposition: String,
    /// Compression format (e.g. `gzip`, `br`).
    #[cbor(rename = "content-encoding", omitempty)]
    pub content_encoding: String,
    /// Language code (e.g. `en`, `fr`).
    #[cbor(rename = "content-language", omitempty)]
    pub content_language: String,
    /// CSP directives.
    #[cbor(rename = "content-security-policy", omitempty)]
    pub content_security_policy: String,
    /// Link header value.
    #[cbor(omitempty)]
    pub link: String,
    /// Permissions-Policy header value.
    #[cbor(rename = "permissions-policy", omitempty)]
    pub permissions_policy: String,
    /// Referrer-Policy header value.
    #[cbor(rename = "referrer-policy", omitempty)]
    pub referrer_policy: String,
    /// Service-Worker-Allowed header value.
    #[cbor(rename = "service-worker-allowed", omitempty)]
    pub service_worker_allowed: String,
    /// Path to the source map; must reference an existing resource in a
    /// bundle.
    #[cbor(omitempty)]
    pub sourcemap: String,
    /// Path to speculation rules; must reference an existing resource in a
    /// bundle.
    #[cbor(rename = "speculation-rules", omitempty)]
    pub speculation_rules: String,
    /// Supports-Loading-Mode header value.
    #[cbor(rename = "supports-loading-mode", omitempty)]
    pub supports_loading_mode: String,
    /// X-Content-Type-Options header value.
    #[cbor(rename = "x-content-type-options", omitempty)]
    pub x_content_type_options: String,

    // Web App Manifest fields
    /// Background color.
    #[cbor(rename = "background_color", omitempty)]
    pub background_color: String,
    /// App categories (e.g. `productivity`).
    #[cbor(omitempty)]
    pub categories: Vec<String>,
    /// Application description.
    #[cbor(omitempty)]
    pub description: String,
    /// Icon assets.
    #[cbor(omitempty)]
    pub icons: Vec<Icon>,
    /// Application identifier.
    #[cbor(omitempty)]
    pub id: String,
    /// Screenshot assets.
    #[cbor(omitempty)]
    pub screenshots: Vec<Screenshot>,
    /// Short application name.
    #[cbor(rename = "short_name", omitempty)]
    pub short_name: String,
    /// Theme color.
    #[cbor(rename = "theme_color", omitempty)]
    pub theme_color: String,

    /// Additional metadata not covered by the well-known fields.
    #[cbor(unknown)]
    pub attributes: ValueMap,
}

/// A MASL document, in single mode or bundle mode.
///
/// A document is a resource plus document-level fields: the embedded
/// [`Resource`]'s fields share the document's key namespace on the wire, so
/// `content-type` appears at the top level whether the document is used as a
/// bare resource or not.
///
/// Bundle mode is indicated by a present `resources` map; single mode
/// documents have `resources == None` and describe one resource directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// The document's own resource fields (single mode), flattened into the
    /// top-level map.
    pub resource: Resource,

    /// Bundle-mode resources, keyed by path. Paths must begin with `/`.
    pub resources: Option<BTreeMap<String, Resource>>,

    /// CAR format version; must be 0 or 1.
    pub version: i64,
    /// Root CIDs for CAR files.
    pub roots: Vec<Cid>,

    /// AT Protocol type identifier, typically `ing.dasl.masl`.
    pub type_: String,

    /// CID of the previous document version.
    pub prev: Cid,
}

impl Document {
    /// Returns true if this document operates in bundle mode.
    #[must_use]
    pub const fn is_bundle(&self) -> bool {
        self.resources.is_some()
    }

    /// Validates the document, reporting the first rule it breaks.
    ///
    /// # Errors
    ///
    /// Returns the reason the document is invalid.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.version != 0 && self.version != 1 {
            return Err(DocumentError::BadVersion(self.version));
        }
        if !self.type_.is_empty() && self.type_ != "ing.dasl.masl" {
            return Err(DocumentError::BadType(self.type_.clone()));
        }
        match &self.resources {
            Some(resources) => self.validate_bundle(resources),
            None => self.validate_single(),
        }
    }

    /// Reports whether the document is valid.
    ///
    /// The coarse boolean form of [`Document::validate`].
    #[must_use]
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate_bundle(
        &self,
        resources: &BTreeMap<String, Resource>,
    ) -> Result<(), DocumentError> {
        for (path, resource) in resources {
            if !path.starts_with('/') {
                return Err(DocumentError::BadPath(path.clone()));
            }
            if !resource.src.defined() {
                return Err(DocumentError::MissingSrc(path.clone()));
            }
            for reference in [&resource.sourcemap, &resource.speculation_rules] {
                if !reference.is_empty() && !resources.contains_key(reference.as_str()) {
                    return Err(DocumentError::DanglingReference(reference.clone()));
                }
            }
        }

        for icon in &self.resource.icons {
            if !icon.src.is_empty() && !resources.contains_key(icon.src.as_str()) {
                return Err(DocumentError::DanglingReference(icon.src.clone()));
            }
        }
        for screenshot in &self.resource.screenshots {
            if !screenshot.src.is_empty() && !resources.contains_key(screenshot.src.as_str()) {
                return Err(DocumentError::DanglingReference(screenshot.src.clone()));
            }
        }
        Ok(())
    }

    fn validate_single(&self) -> Result<(), DocumentError> {
        for icon in &self.resource.icons {
            if !icon.src.is_empty() {
                return Err(DocumentError::SrcInSingleMode(icon.src.clone()));
            }
        }
        for screenshot in &self.resource.screenshots {
            if !screenshot.src.is_empty() {
                return Err(DocumentError::SrcInSingleMode(screenshot.src.clone()));
            }
        }
        Ok(())
    }
}

// The embedded resource is flattened into the document's key namespace, so
// Document carries its own map impls instead of a derive.
impl Encode for Document {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.map(|m| {
            self.resource.encode_fields(m)?;
            if let Some(resources) = &self.resources {
                m.value_entry("resources", resources)?;
            }
            if self.version != 0 {
                m.value_entry("version", &self.version)?;
            }
            if !self.roots.is_empty() {
                m.value_entry("roots", &self.roots)?;
            }
            if !self.type_.is_empty() {
                m.value_entry("$type", &self.type_)?;
            }
            if self.prev.defined() {
                m.value_entry("prev", &self.prev)?;
            }
            Ok(())
        })
    }
}

impl<'de> Decode<'de> for Document {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        let mut doc = Self::default();
        let mut resource_fields = ResourceFields::default();

        let mut map = value.map()?;
        while let Some((key, item)) = map.next()? {
            match key {
                "resources" => doc.resources = Some(Decode::decode(item)?),
                "version" => doc.version = Decode::decode(item)?,
                "roots" => doc.roots = Decode::decode(item)?,
                "$type" => doc.type_ = Decode::decode(item)?,
                "prev" => doc.prev = Decode::decode(item)?,
                _ => resource_fields.bind(key, item)?,
            }
        }
        doc.resource = resource_fields.finish();
        Ok(doc)
    }
}

impl Resource {
    // Emits this resource's entries into an enclosing map builder, honoring
    // the same omit rules as the derived impl.
    fn encode_fields(&self, m: &mut MapEncoder) -> Result<(), Error> {
        if self.src.defined() {
            m.value_entry("src", &self.src)?;
        }
        macro_rules! put {
            ($key:literal, $field:expr) => {
                if !$field.is_empty_value() {
                    m.value_entry($key, &$field)?;
                }
            };
        }
        put!("name", self.name);
        put!("content-type", self.content_type);
        put!("content-disposition", self.content_disposition);
        put!("content-encoding", self.content_encoding);
        put!("content-language", self.content_language);
        put!("content-security-policy", self.content_security_policy);
        put!("link", self.link);
        put!("permissions-policy", self.permissions_policy);
        put!("referrer-policy", self.referrer_policy);
        put!("service-worker-allowed", self.service_worker_allowed);
        put!("sourcemap", self.sourcemap);
        put!("speculation-rules", self.speculation_rules);
        put!("supports-loading-mode", self.supports_loading_mode);
        put!("x-content-type-options", self.x_content_type_options);
        put!("background_color", self.background_color);
        put!("categories", self.categories);
        put!("description", self.description);
        put!("icons", self.icons);
        put!("id", self.id);
        put!("screenshots", self.screenshots);
        put!("short_name", self.short_name);
        put!("theme_color", self.theme_color);
        for (k, v) in self.attributes.iter() {
            m.value_entry(k, v)?;
        }
        Ok(())
    }
}

// Accumulates resource fields while the document decoder walks the shared
// key namespace.
#[derive(Default)]
struct ResourceFields {
    resource: Resource,
}

impl ResourceFields {
    fn bind(&mut self, key: &str, item: ValueRef<'_>) -> Result<(), Error> {
        let r = &mut self.resource;
        match key {
            "src" => r.src = Decode::decode(item)?,
            "name" => r.name = Decode::decode(item)?,
            "content-type" => r.content_type = Decode::decode(item)?,
            "content-disposition" => r.content_disposition = Decode::decode(item)?,
            "content-encoding" => r.content_encoding = Decode::decode(item)?,
            "content-language" => r.content_language = Decode::decode(item)?,
            "content-security-policy" => r.content_security_policy = Decode::decode(item)?,
            "link" => r.link = Decode::decode(item)?,
            "permissions-policy" => r.permissions_policy = Decode::decode(item)?,
            "referrer-policy" => r.referrer_policy = Decode::decode(item)?,
            "service-worker-allowed" => r.service_worker_allowed = Decode::decode(item)?,
            "sourcemap" => r.sourcemap = Decode::decode(item)?,
            "speculation-rules" => r.speculation_rules = Decode::decode(item)?,
            "supports-loading-mode" => r.supports_loading_mode = Decode::decode(item)?,
            "x-content-type-options" => r.x_content_type_options = Decode::decode(item)?,
            "background_color" => r.background_color = Decode::decode(item)?,
            "categories" => r.categories = Decode::decode(item)?,
            "description" => r.description = Decode::decode(item)?,
            "icons" => r.icons = Decode::decode(item)?,
            "id" => r.id = Decode::decode(item)?,
            "screenshots" => r.screenshots = Decode::decode(item)?,
            "short_name" => r.short_name = Decode::decode(item)?,
            "theme_color" => r.theme_color = Decode::decode(item)?,
            _ => {
                r.attributes
                    .insert(key.to_owned(), Value::decode(item)?)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Resource {
        self.resource
    }
}

/// The reason a document failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    /// CAR version must be 0 or 1.
    BadVersion(i64),
    /// AT Protocol type must be empty or `ing.dasl.masl`.
    BadType(String),
    /// Bundle resource paths must begin with `/`.
    BadPath(String),
    /// Bundle resources must carry a `src` CID.
    MissingSrc(String),
    /// A sourcemap, speculation-rules, icon, or screenshot path does not
    /// reference an existing bundle entry.
    DanglingReference(String),
    /// Single-mode icons and screenshots must not carry a `src`.
    SrcInSingleMode(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadVersion(v) => write!(f, "masl: version must be 0 or 1, got {v}"),
            Self::BadType(t) => write!(f, "masl: $type must be empty or ing.dasl.masl, got {t:?}"),
            Self::BadPath(p) => write!(f, "masl: resource path must start with '/': {p:?}"),
            Self::MissingSrc(p) => write!(f, "masl: bundle resource {p:?} has no src"),
            Self::DanglingReference(p) => {
                write!(f, "masl: reference to missing resource {p:?}")
            }
            Self::SrcInSingleMode(p) => {
                write!(f, "masl: single-mode document references path {p:?}")
            }
        }
    }
}

impl std::error::Error for DocumentError {}
