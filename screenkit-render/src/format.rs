use std::fmt;

/// Paginated output formats the formatting engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Pdf,
    Pcl,
    PostScript,
}

impl OutputFormat {
    pub const DEFAULT_MIME: &'static str = "application/pdf";

    /// Map a MIME type to an output format; parameters such as `; charset=` are ignored
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.hp-pcl" => Some(Self::Pcl),
            "application/postscript" => Some(Self::PostScript),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Pcl => "application/vnd.hp-PCL",
            Self::PostScript => "application/postscript",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
