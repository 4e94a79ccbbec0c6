/// Category tags and the extension/MIME tables behind them.
///
/// The rule classifier, the ensemble voters and the extension-only `type`
/// mode all consult the same tables so a file never lands in two different
/// places depending on which path classified it.
///
/// # Examples
///
/// ```
/// use dirsmith::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.mime_to_category("image/png"), Some(Category::Images));
/// assert_eq!(mapper.extension_to_category("conf"), Some(Category::Config));
/// assert_eq!(mapper.mime_to_category("text/plain"), Some(Category::Documents));
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Broad category assigned to every classified file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Source code in a recognized language
    Code,
    /// Text documents, PDFs, office files
    Documents,
    /// Raster and vector images
    Images,
    /// Audio files
    Audio,
    /// Video files
    Videos,
    /// Compressed archives
    Archives,
    /// Configuration files and dotfiles
    Config,
    /// Structured data (JSON, CSV, XML, YAML, SQL)
    Data,
    /// Temporary files, swap files, stray backups
    System,
    /// Anything the pipeline could not place
    Misc,
}

impl Category {
    /// All categories in registration order.
    pub const ALL: [Category; 10] = [
        Category::Code,
        Category::Documents,
        Category::Images,
        Category::Audio,
        Category::Videos,
        Category::Archives,
        Category::Config,
        Category::Data,
        Category::System,
        Category::Misc,
    ];

    /// Returns the top-level directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsmith::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "images");
    /// assert_eq!(Category::Misc.dir_name(), "misc");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Code => "code",
            Category::Documents => "documents",
            Category::Images => "images",
            Category::Audio => "audio",
            Category::Videos => "videos",
            Category::Archives => "archives",
            Category::Config => "config",
            Category::Data => "data",
            Category::System => "system",
            Category::Misc => "misc",
        }
    }

    /// The category whose directory name is `name`.
    ///
    /// ```
    /// use dirsmith::file_category::Category;
    ///
    /// assert_eq!(Category::from_dir_name("archives"), Some(Category::Archives));
    /// assert_eq!(Category::from_dir_name("2024"), None);
    /// ```
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|category| category.dir_name() == name)
    }

    /// Returns a human-readable description of this category.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Code => "Source code files",
            Category::Documents => "Document files",
            Category::Images => "Image files",
            Category::Audio => "Audio files",
            Category::Videos => "Video files",
            Category::Archives => "Archive files",
            Category::Config => "Configuration files",
            Category::Data => "Data files",
            Category::System => "Temporary and system files",
            Category::Misc => "Unclassified files",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Archive extensions recognized by the rule classifier.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "tar", "gz", "tgz", "bz2", "tbz2", "xz", "txz", "7z", "rar", "zst", "lz4", "cab",
];

/// Data extensions recognized by the rule classifier.
pub const DATA_EXTENSIONS: &[&str] = &["json", "csv", "tsv", "xml", "yaml", "sql"];

/// Maps MIME types and file extensions to categories.
#[derive(Debug, Clone)]
pub struct FileMapper {
    mime_map: HashMap<String, Category>,
    mime_prefix_map: Vec<(String, Category)>,
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with all standard mappings.
    pub fn new() -> Self {
        let mut mapper = Self {
            mime_map: HashMap::new(),
            mime_prefix_map: Vec::new(),
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        self.add_mime_prefix("image/", Category::Images);
        self.add_mime_prefix("audio/", Category::Audio);
        self.add_mime_prefix("video/", Category::Videos);
        self.add_mime_prefix("font/", Category::Misc);
        self.add_mime_prefix("text/", Category::Documents);

        for mime in [
            "application/pdf",
            "application/msword",
            "application/rtf",
            "application/vnd.oasis.opendocument.text",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/vnd.ms-powerpoint",
            "application/epub+zip",
        ] {
            self.add_mime_mapping(mime, Category::Documents);
        }
        for mime in [
            "application/zip",
            "application/gzip",
            "application/x-tar",
            "application/x-bzip2",
            "application/x-xz",
            "application/x-7z-compressed",
            "application/x-rar-compressed",
            "application/vnd.rar",
            "application/zstd",
        ] {
            self.add_mime_mapping(mime, Category::Archives);
        }
        for mime in [
            "application/json",
            "application/xml",
            "text/xml",
            "text/csv",
            "text/tab-separated-values",
            "application/sql",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/x-sqlite3",
            "application/vnd.sqlite3",
        ] {
            self.add_mime_mapping(mime, Category::Data);
        }
        for mime in [
            "application/javascript",
            "text/javascript",
            "text/x-python",
            "text/x-rust",
            "text/x-c",
            "text/x-shellscript",
            "application/x-sh",
        ] {
            self.add_mime_mapping(mime, Category::Code);
        }
        for mime in ["application/toml", "text/x-toml"] {
            self.add_mime_mapping(mime, Category::Config);
        }

        let tables: [(&[&str], Category); 9] = [
            (
                &[
                    "rs", "py", "js", "mjs", "ts", "tsx", "jsx", "go", "java", "kt", "c", "h",
                    "cpp", "cc", "hpp", "cs", "rb", "php", "swift", "scala", "lua", "pl", "sh",
                    "bash", "zsh", "r", "hs", "ex", "exs", "dart",
                ],
                Category::Code,
            ),
            (
                &[
                    "pdf", "doc", "docx", "odt", "rtf", "txt", "text", "md", "markdown", "rst",
                    "tex", "epub", "ppt", "pptx", "odp", "html", "log",
                ],
                Category::Documents,
            ),
            (
                &[
                    "jpg", "png", "gif", "webp", "bmp", "tiff", "svg", "ico", "heic", "heif",
                    "raw", "cr2", "nef", "psd",
                ],
                Category::Images,
            ),
            (
                &["mp3", "wav", "flac", "ogg", "aac", "m4a", "wma", "opus"],
                Category::Audio,
            ),
            (
                &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "3gp", "m4v"],
                Category::Videos,
            ),
            (ARCHIVE_EXTENSIONS, Category::Archives),
            (
                &[
                    "conf", "cfg", "ini", "toml", "env", "properties", "plist", "rc",
                    "editorconfig",
                ],
                Category::Config,
            ),
            (
                &[
                    "json", "csv", "tsv", "xml", "yaml", "sql", "db", "sqlite", "parquet",
                    "xls", "xlsx", "ods", "ndjson",
                ],
                Category::Data,
            ),
            (
                &["tmp", "temp", "swp", "swo", "bak", "old", "lock", "cache", "part", "crdownload"],
                Category::System,
            ),
        ];
        for (extensions, category) in tables {
            for ext in extensions {
                self.add_extension_mapping(ext, category);
            }
        }
    }

    /// Adds an exact MIME type to category mapping.
    pub fn add_mime_mapping(&mut self, mime: &str, category: Category) {
        self.mime_map.insert(mime.to_lowercase(), category);
    }

    /// Adds a MIME prefix mapping, consulted after exact matches.
    pub fn add_mime_prefix(&mut self, prefix: &str, category: Category) {
        self.mime_prefix_map.push((prefix.to_lowercase(), category));
    }

    /// Adds a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Maps a MIME type to a category, exact entries first, then prefixes.
    ///
    /// ```
    /// use dirsmith::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.mime_to_category("application/json"), Some(Category::Data));
    /// assert_eq!(mapper.mime_to_category("unknown/type"), None);
    /// ```
    pub fn mime_to_category(&self, mime_type: &str) -> Option<Category> {
        let mime = mime_type.to_lowercase();
        if let Some(category) = self.mime_map.get(&mime) {
            return Some(*category);
        }
        self.mime_prefix_map
            .iter()
            .find(|(prefix, _)| mime.starts_with(prefix.as_str()))
            .map(|(_, category)| *category)
    }

    /// Maps a file extension to a category.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Determines a category from extension first, then MIME type.
    ///
    /// The MIME lookup only decides when the extension is missing or not in
    /// the table, so `type` mode still places extensionless files by content.
    pub fn categorize(&self, mime_type: Option<&str>, ext: Option<&str>) -> Category {
        if let Some(extension) = ext
            && let Some(category) = self.extension_to_category(extension)
        {
            return category;
        }

        if let Some(mime) = mime_type
            && let Some(category) = self.mime_to_category(mime)
        {
            return category;
        }

        Category::Misc
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
