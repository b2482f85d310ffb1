//! Ordered collections of images

use crate::raster::Image;
use chrono::{DateTime, Utc};

/// An ordered collection of [`Image`]s.
///
/// The order is not necessarily temporal, but operations with temporal
/// semantics (date filtering, compositing) read each image's acquisition
/// timestamp.
#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    images: Vec<Image>,
}

impl ImageSequence {
    /// Create a sequence from a list of images
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    /// Create an empty sequence
    pub fn empty() -> Self {
        Self { images: Vec::new() }
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the sequence holds no images
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The images, in order
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// The first image, if any
    pub fn first(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Iterate over the images in order
    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    /// Consume the sequence, returning the images
    pub fn into_images(self) -> Vec<Image> {
        self.images
    }

    /// Keep only images matching a predicate, preserving order
    pub fn filter<F>(&self, pred: F) -> Self
    where
        F: Fn(&Image) -> bool,
    {
        Self {
            images: self.images.iter().filter(|i| pred(i)).cloned().collect(),
        }
    }

    /// Keep only images acquired in the half-open interval `[start, end)`
    pub fn filter_date(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.filter(|img| img.acquired() >= start && img.acquired() < end)
    }

    /// Concatenate two sequences, this one first
    pub fn concat(&self, other: &ImageSequence) -> Self {
        let mut images = self.images.clone();
        images.extend(other.images.iter().cloned());
        Self { images }
    }
}

impl From<Vec<Image>> for ImageSequence {
    fn from(images: Vec<Image>) -> Self {
        Self::new(images)
    }
}

impl<'a> IntoIterator for &'a ImageSequence {
    type Item = &'a Image;
    type IntoIter = std::slice::Iter<'a, Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}
