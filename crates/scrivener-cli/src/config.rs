//! Configuration management for the CLI.
//!
//! Values are layered: built-in defaults, then the TOML file, then the
//! environment (including `.env`), then command-line flags.

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use scrivener_domain::{Category, FieldKind, FieldSpec, SchemaRegistry};
use scrivener_extractor::{ExtractorConfig, PromptSet};
use scrivener_llm::openai::DEFAULT_BASE_URL;
use scrivener_pipeline::PipelineConfig;
use scrivener_store::WorkbookLayout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory
pub const LOCAL_CONFIG: &str = "scrivener.toml";

/// Default model name
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const REDACTED: &str = "********";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model endpoint and credentials
    pub llm: LlmSettings,

    /// Input and output locations
    pub paths: PathSettings,

    /// Truncation, timeouts, retries and temperature
    pub extractor: ExtractorConfig,

    /// Worker count and directory walk
    pub pipeline: PipelineConfig,

    /// Workbook file and sheet names
    pub workbooks: WorkbookSettings,

    /// Category description overrides, keyed by category key
    pub categories: BTreeMap<String, String>,

    /// Prompt template overrides
    pub prompts: PromptSettings,

    /// Field list overrides, keyed by category key
    pub schemas: BTreeMap<String, Vec<FieldSettings>>,
}

/// Model endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    pub model: String,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory scanned for documents
    pub input_dir: PathBuf,

    /// Directory holding the workbooks
    pub output_dir: PathBuf,

    /// Directory of template workbooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,

    /// Run log; defaults to `run.log` in the output directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_log: Option<PathBuf>,
}

/// Workbook naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookSettings {
    /// Sheet rows are appended to
    pub sheet_name: String,

    /// File name per category key
    pub files: BTreeMap<String, String>,
}

/// Prompt template overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Classification template (`{categories}`, `{content}`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,

    /// Extraction template per category key (`{fields}`, `{format}`, `{content}`)
    pub extraction: BTreeMap<String, String>,
}

/// One field of a schema override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    /// Column name
    pub name: String,

    /// `text`, `date`, `number`, `choice`, `title` or `file_stem`
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Whether the model must supply it
    #[serde(default)]
    pub required: bool,

    /// Description shown to the model
    #[serde(default)]
    pub description: String,

    /// Allowed values of a choice field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Value used when a choice matches nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

fn default_kind() -> String {
    "text".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            template_dir: Some(PathBuf::from("template")),
            run_log: None,
        }
    }
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            sheet_name: scrivener_store::DEFAULT_SHEET_NAME.to_string(),
            files: BTreeMap::new(),
        }
    }
}

impl FieldSettings {
    /// Convert to a schema field.
    pub fn to_spec(&self) -> Result<FieldSpec> {
        let kind = match self.kind.trim().to_ascii_lowercase().as_str() {
            "text" => FieldKind::Text,
            "date" => FieldKind::Date,
            "number" => FieldKind::Number,
            "title" => FieldKind::Title,
            "file_stem" => FieldKind::FileStem,
            "choice" if self.options.is_empty() => {
                return Err(CliError::Config(format!("choice field '{}' has no options", self.name)));
            }
            "choice" => FieldKind::Choice {
                options: self.options.clone(),
                fallback: self.fallback.clone(),
            },
            other => {
                return Err(CliError::Config(format!("field '{}' has unknown kind '{}'", self.name, other)));
            }
        };
        let spec = FieldSpec::new(self.name.clone(), kind, self.description.clone());
        Ok(if self.required { spec.required() } else { spec })
    }
}

impl Config {
    /// Locate the configuration file.
    ///
    /// An explicit path must exist. Otherwise `./scrivener.toml`, then
    /// `<config dir>/scrivener/config.toml`; `None` means defaults only.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CliError::Config(format!("config file {} not found", path.display())));
            }
            return Ok(Some(path.to_path_buf()));
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Ok(Some(local));
        }
        Ok(dirs::config_dir()
            .map(|dir| dir.join("scrivener").join("config.toml"))
            .filter(|path| path.is_file()))
    }

    /// Load configuration from a file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Overlay environment variables read through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = var("MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(timeout) = var("REQUEST_TIMEOUT") {
            self.extractor.llm_timeout_secs = parse_env("REQUEST_TIMEOUT", &timeout)?;
        }
        if let Some(dir) = var("DATA_DIR") {
            self.paths.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("TEMPLATE_DIR") {
            self.paths.template_dir = Some(PathBuf::from(dir));
        }
        if let Some(workers) = var("MAX_WORKERS") {
            self.pipeline.workers = parse_env("MAX_WORKERS", &workers)?;
        }
        Ok(())
    }

    /// Overlay `run` flags.
    pub fn apply_run_args(&mut self, args: &RunArgs) {
        if let Some(input) = &args.input {
            self.paths.input_dir = input.clone();
        }
        if let Some(output) = &args.output {
            self.paths.output_dir = output.clone();
        }
        if let Some(dir) = &args.template_dir {
            self.paths.template_dir = Some(dir.clone());
        }
        if let Some(log) = &args.run_log {
            self.paths.run_log = Some(log.clone());
        }
        if let Some(workers) = args.workers {
            self.pipeline.workers = workers;
        }
        if args.recursive {
            self.pipeline.recursive = true;
        }
    }

    /// Check everything a run needs.
    pub fn validate_for_run(&self) -> Result<()> {
        if self.llm.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(CliError::Config(
                "no API key: set OPENAI_API_KEY or llm.api_key".to_string(),
            ));
        }
        if !(self.llm.base_url.starts_with("http://") || self.llm.base_url.starts_with("https://")) {
            return Err(CliError::Config(format!("llm.base_url '{}' is not an http(s) URL", self.llm.base_url)));
        }
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("llm.model is empty".to_string()));
        }
        self.validate()
    }

    /// Check the settings every command relies on.
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate().map_err(CliError::Config)?;
        self.pipeline.validate().map_err(CliError::Config)?;
        self.layout()?;
        self.registry()?;
        self.prompt_set()?;
        Ok(())
    }

    /// Schema registry with overrides applied.
    pub fn registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::builtin();
        for (key, fields) in &self.schemas {
            let category = known_category(key, "schemas")?;
            let specs = fields.iter().map(FieldSettings::to_spec).collect::<Result<Vec<_>>>()?;
            registry = registry
                .with_schema(category, specs)
                .map_err(|e| CliError::Config(format!("schemas.{}: {}", key, e)))?;
        }
        Ok(registry)
    }

    /// Prompt templates with overrides applied.
    pub fn prompt_set(&self) -> Result<PromptSet> {
        let mut prompts = PromptSet::default();
        if let Some(template) = &self.prompts.classification {
            prompts = prompts.with_classification_template(template.clone());
        }
        for (key, template) in &self.prompts.extraction {
            let category = known_category(key, "prompts.extraction")?;
            prompts = prompts.with_extraction_template(category, template.clone());
        }
        for (key, description) in &self.categories {
            let category = known_category(key, "categories")?;
            prompts = prompts.with_description(category, description.clone());
        }
        prompts.validate().map_err(CliError::Config)?;
        Ok(prompts)
    }

    /// Workbook layout with overrides applied.
    pub fn layout(&self) -> Result<WorkbookLayout> {
        let mut layout =
            WorkbookLayout::new(self.paths.output_dir.clone()).with_sheet_name(self.workbooks.sheet_name.clone());
        if let Some(dir) = &self.paths.template_dir {
            layout = layout.with_template_dir(dir.clone());
        }
        for (key, name) in &self.workbooks.files {
            let category = known_category(key, "workbooks.files")?;
            layout = layout.with_file_name(category, name.clone());
        }
        layout.validate().map_err(CliError::Config)?;
        Ok(layout)
    }

    /// Run log location.
    pub fn run_log_path(&self) -> PathBuf {
        self.paths
            .run_log
            .clone()
            .unwrap_or_else(|| self.paths.output_dir.join("run.log"))
    }

    /// Copy with the API key masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.llm.api_key.is_some() {
            copy.llm.api_key = Some(REDACTED.to_string());
        }
        copy
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

fn known_category(key: &str, section: &str) -> Result<Category> {
    Category::parse(key)
        .filter(Category::is_known)
        .ok_or_else(|| CliError::Config(format!("{}: unknown category '{}'", section, key)))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("{} must be a positive integer, got '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.paths.input_dir, PathBuf::from("data"));
        assert_eq!(config.pipeline.workers, 1);
        assert_eq!(config.run_log_path(), PathBuf::from("output/run.log"));
        assert!(config.validate().is_ok());
        assert!(config.validate_for_run().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            model = "qwen-plus"

            [pipeline]
            workers = 4

            [extractor]
            max_text_length = 8000
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.model, "qwen-plus");
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.extractor.max_text_length, 8000);
        assert_eq!(config.extractor.transport_retries, 1);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: Config = toml::from_str("[llm]\nmodel = \"from-file\"").unwrap();
        config
            .apply_env(env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("MODEL_NAME", "from-env"),
                ("REQUEST_TIMEOUT", "30"),
                ("OUTPUT_DIR", "out"),
                ("MAX_WORKERS", "3"),
                ("DATA_DIR", "  "),
            ]))
            .unwrap();
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.extractor.llm_timeout_secs, 30);
        assert_eq!(config.paths.output_dir, PathBuf::from("out"));
        assert_eq!(config.paths.input_dir, PathBuf::from("data"));
        assert_eq!(config.pipeline.workers, 3);
        assert!(config.validate_for_run().is_ok());
    }

    #[test]
    fn test_bad_env_number_is_config_error() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("MAX_WORKERS", "many")])).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_flags_override_env() {
        let mut config = Config::default();
        config.apply_env(env(&[("DATA_DIR", "env-data")])).unwrap();
        config.apply_run_args(&RunArgs {
            input: Some(PathBuf::from("flag-data")),
            workers: Some(2),
            recursive: true,
            ..RunArgs::default()
        });
        assert_eq!(config.paths.input_dir, PathBuf::from("flag-data"));
        assert_eq!(config.pipeline.workers, 2);
        assert!(config.pipeline.recursive);
    }

    #[test]
    fn test_schema_override() {
        let config: Config = toml::from_str(
            r#"
            [[schemas.meeting_material]]
            name = "Title"
            required = true
            description = "Meeting title"

            [[schemas.meeting_material]]
            name = "Level"
            kind = "choice"
            options = ["市级", "区级"]
            fallback = "区级"
            "#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        let schema = registry.schema_for(Category::MeetingMaterial).unwrap();
        assert_eq!(schema.field_names(), vec!["Title", "Level"]);
        assert!(schema.field("Title").unwrap().required);
        assert_eq!(schema.field("Level").unwrap().kind, FieldKind::choice(&["市级", "区级"], Some("区级")));
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let unknown: Config = toml::from_str("[categories]\nunknown = \"x\"").unwrap();
        assert!(unknown.validate().is_err());

        let bad_kind: Config = toml::from_str("[[schemas.policy_document]]\nname = \"A\"\nkind = \"blob\"").unwrap();
        assert!(bad_kind.registry().is_err());

        let bad_prompt: Config = toml::from_str("[prompts]\nclassification = \"no placeholders\"").unwrap();
        assert!(bad_prompt.prompt_set().is_err());

        let bad_file: Config = toml::from_str("[workbooks.files]\npolicy_document = \"p.csv\"").unwrap();
        assert!(bad_file.layout().is_err());
    }

    #[test]
    fn test_redacted_toml_hides_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let text = config.redacted().to_toml().unwrap();
        assert!(!text.contains("sk-secret"));
        assert!(text.contains(REDACTED));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
    }

    #[test]
    fn test_discover_explicit_missing_file() {
        assert!(Config::discover(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("c.toml");
        fs::write(&path, "[paths]\noutput_dir = \"xl\"").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("xl"));
    }
}
