//! File categorization for media organization.
//!
//! Every file maps to exactly one [`Category`], decided by its extension or,
//! for unwanted files, its full name. Matching is case-insensitive and driven
//! entirely by configuration.
//!
//! # Examples
//!
//! ```
//! use mediatidy::config::OrganizerConfig;
//! use mediatidy::file_category::{Category, PathClassifier};
//! use std::path::Path;
//!
//! let classifier = PathClassifier::from_config(&OrganizerConfig::default());
//! assert_eq!(classifier.classify(Path::new("IMG_0001.JPG")), Category::Image);
//! assert_eq!(classifier.classify(Path::new("clip.mov")), Category::Video);
//! assert_eq!(classifier.classify(Path::new("Thumbs.db")), Category::Unwanted);
//! assert_eq!(classifier.classify(Path::new("notes.txt")), Category::Unclassified);
//! ```

use crate::config::OrganizerConfig;
use crate::walker::lowercase_extension;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Photos and other still images.
    Image,
    /// Video clips.
    Video,
    /// Clutter such as thumbnail caches and temporary files.
    Unwanted,
    /// Anything else.
    Unclassified,
}

impl Category {
    /// Returns the folder used for this category when categories are kept apart.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediatidy::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "Images");
    /// assert_eq!(Category::Video.dir_name(), "Videos");
    /// assert_eq!(Category::Unclassified.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "Images",
            Category::Video => "Videos",
            Category::Unwanted => "Unwanted_Files",
            Category::Unclassified => "Other",
        }
    }

    /// True for the categories that take part in date sorting and deduplication.
    pub fn is_media(&self) -> bool {
        matches!(self, Category::Image | Category::Video)
    }
}

/// Maps file paths to categories.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    extension_map: HashMap<String, Category>,
    unwanted_names: HashSet<String>,
}

impl PathClassifier {
    /// Builds a classifier from the configured extension and name sets.
    pub fn from_config(config: &OrganizerConfig) -> Self {
        let mut classifier = Self {
            extension_map: HashMap::new(),
            unwanted_names: HashSet::new(),
        };
        for ext in &config.unwanted_extensions {
            classifier.add_extension_mapping(ext, Category::Unwanted);
        }
        for ext in &config.video_extensions {
            classifier.add_extension_mapping(ext, Category::Video);
        }
        for ext in &config.image_extensions {
            classifier.add_extension_mapping(ext, Category::Image);
        }
        for name in &config.unwanted_files {
            classifier.unwanted_names.insert(name.to_lowercase());
        }
        classifier
    }

    /// Adds a file extension to category mapping.
    ///
    /// A later mapping for the same extension replaces the earlier one.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map
            .insert(ext.trim_start_matches('.').to_lowercase(), category);
    }

    /// Maps a bare extension (with or without the dot) to a category.
    pub fn extension_to_category(&self, ext: &str) -> Category {
        self.extension_map
            .get(&ext.trim_start_matches('.').to_lowercase())
            .copied()
            .unwrap_or(Category::Unclassified)
    }

    /// Determines the category of a file.
    ///
    /// An exact unwanted file name wins over the extension; otherwise the
    /// extension decides, defaulting to [`Category::Unclassified`].
    pub fn classify(&self, path: &Path) -> Category {
        if let Some(name) = path.file_name()
            && self
                .unwanted_names
                .contains(&name.to_string_lossy().to_lowercase())
        {
            return Category::Unwanted;
        }

        match lowercase_extension(path) {
            Some(ext) => self.extension_to_category(&ext),
            None => Category::Unclassified,
        }
    }

    pub fn is_media(&self, path: &Path) -> bool {
        self.classify(path).is_media()
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::from_config(&OrganizerConfig::default())
    }
}
