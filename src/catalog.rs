//! Photo catalog: the viewer's read side of the manifest.
//!
//! Every [`PhotoCatalog::list_all`] call fetches the manifest afresh; nothing
//! is cached here. The result is always a usable list: a missing manifest,
//! invalid JSON, or a wrong shape all read as "no photos", and individual bad
//! entries are dropped (see [`Manifest::parse_lenient`]).

use crate::fetch::Fetcher;
use crate::manifest::{ImageDescriptor, Manifest, MetaField};
use crate::naming::{natural_cmp, parse_file_name};
use crate::paths::{decode_id, encode_id, public_url};

/// One photo as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Percent-encoded relative path.
    pub id: String,
    pub url: String,
    pub thumb_url: Option<String>,
    /// File name without the featured marker.
    pub file_name: String,
    pub is_featured: bool,
    pub date: Option<String>,
    pub fields: Vec<MetaField>,
}

impl Photo {
    /// Record for a validated relative path, without thumbnail or metadata.
    fn from_path(rel_path: &str, images_base: &str) -> Self {
        let parsed = parse_file_name(rel_path);
        Self {
            id: encode_id(rel_path),
            url: public_url(images_base, rel_path),
            thumb_url: None,
            file_name: parsed.display_name,
            is_featured: parsed.featured,
            date: None,
            fields: Vec::new(),
        }
    }

    fn from_descriptor(descriptor: ImageDescriptor, images_base: &str) -> Self {
        let mut photo = Self::from_path(&descriptor.path, images_base);
        photo.thumb_url = descriptor.thumb.map(|t| public_url(images_base, &t));
        photo.date = descriptor.date;
        photo.fields = descriptor.fields;
        photo
    }

    /// The URL the gallery loads for this tile: the thumbnail when the
    /// manifest had one, otherwise the original.
    pub fn tile_source(&self) -> &str {
        self.thumb_url.as_deref().unwrap_or(&self.url)
    }
}

/// Reads photos through a [`Fetcher`].
pub struct PhotoCatalog<F: Fetcher> {
    fetcher: F,
    manifest_url: String,
    images_base: String,
}

impl<F: Fetcher> PhotoCatalog<F> {
    /// `manifest_url` like `./images-manifest.json`, `images_base` like `./images/`.
    pub fn new(fetcher: F, manifest_url: impl Into<String>, images_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            manifest_url: manifest_url.into(),
            images_base: images_base.into(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// Every valid photo, sorted by file name (numeric-aware). Never fails.
    pub fn list_all(&self) -> Vec<Photo> {
        let manifest = match self
            .fetcher
            .fetch(&self.manifest_url)
            .ok()
            .and_then(|bytes| Manifest::parse_lenient(&bytes).ok())
        {
            Some(m) => m,
            None => return Vec::new(),
        };

        let mut photos: Vec<Photo> = manifest
            .images
            .into_iter()
            .map(|d| Photo::from_descriptor(d, &self.images_base))
            .collect();
        photos.sort_by(|a, b| natural_cmp(&a.file_name, &b.file_name));
        photos
    }

    /// Rebuild a record from its id alone: no fetch, no thumbnail, no metadata.
    pub fn get_by_id(&self, id: &str) -> Option<Photo> {
        let rel = decode_id(id)?;
        Some(Photo::from_path(&rel, &self.images_base))
    }

    /// The full record for `id` from a fresh manifest read.
    ///
    /// Ids are compared by the path they decode to, so `!a.jpg` and
    /// `%21a.jpg` name the same photo.
    pub fn find(&self, id: &str) -> Option<Photo> {
        let rel = decode_id(id)?;
        self.list_all()
            .into_iter()
            .find(|p| decode_id(&p.id).as_deref() == Some(rel.as_str()))
    }
}
