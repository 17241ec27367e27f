//! Template source resolution.

/// A module-like wrapper exposing its template under `default`, as produced
/// by loaders that bundle templates as modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceModule {
    pub default: String,
}

impl SourceModule {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
        }
    }
}

/// Anything a template can be constructed from: a string or a [`SourceModule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource(String);

impl TemplateSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for TemplateSource {
    fn from(source: &str) -> Self {
        TemplateSource(source.to_string())
    }
}

impl From<String> for TemplateSource {
    fn from(source: String) -> Self {
        TemplateSource(source)
    }
}

impl From<&String> for TemplateSource {
    fn from(source: &String) -> Self {
        TemplateSource(source.clone())
    }
}

impl From<SourceModule> for TemplateSource {
    fn from(module: SourceModule) -> Self {
        TemplateSource(module.default)
    }
}

impl From<&SourceModule> for TemplateSource {
    fn from(module: &SourceModule) -> Self {
        TemplateSource(module.default.clone())
    }
}
