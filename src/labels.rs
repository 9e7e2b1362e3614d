use crate::model::relative_path;

/// Names and icons for resource locations
pub trait LabelProvider {
    /// Last path segment
    fn get_name(&self, uri: &str) -> String;
    /// Path relative to the repository root
    fn get_long_name(&self, uri: &str) -> String;
    fn get_icon(&self, uri: &str, is_folder: bool) -> &'static str;
}

/// Labels derived purely from the path
#[derive(Debug, Clone)]
pub struct PathLabels {
    root_uri: String,
}

impl PathLabels {
    pub fn new(root_uri: impl Into<String>) -> Self {
        Self {
            root_uri: root_uri.into(),
        }
    }
}

impl LabelProvider for PathLabels {
    fn get_name(&self, uri: &str) -> String {
        uri.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(uri)
            .to_string()
    }

    fn get_long_name(&self, uri: &str) -> String {
        relative_path(&self.root_uri, uri).to_string()
    }

    fn get_icon(&self, uri: &str, is_folder: bool) -> &'static str {
        if is_folder {
            return "▸";
        }
        let extension = uri.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match extension {
            "rs" | "c" | "h" | "cpp" | "go" | "py" | "js" | "ts" | "java" => "λ",
            "md" | "txt" | "rst" => "¶",
            "json" | "toml" | "yaml" | "yml" | "xml" | "lock" => "≡",
            "png" | "jpg" | "jpeg" | "gif" | "svg" => "▣",
            _ => "·",
        }
    }
}
