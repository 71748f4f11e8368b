//! Where each category's workbook lives

use scrivener_domain::Category;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default sheet name of newly created workbooks
pub const DEFAULT_SHEET_NAME: &str = "YS";

/// Paths and names of the per-category workbooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookLayout {
    output_dir: PathBuf,
    template_dir: Option<PathBuf>,
    sheet_name: String,
    file_names: BTreeMap<Category, String>,
}

impl WorkbookLayout {
    /// Layout with the default file and sheet names
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let file_names = Category::KNOWN
            .into_iter()
            .map(|c| (c, default_file_name(c).to_string()))
            .collect();
        Self {
            output_dir: output_dir.into(),
            template_dir: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            file_names,
        }
    }

    /// Seed new workbooks from same-named files in `dir`
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Name of the sheet rows are appended to
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Override a category's workbook file name
    pub fn with_file_name(mut self, category: Category, name: impl Into<String>) -> Self {
        if category.is_known() {
            self.file_names.insert(category, name.into());
        }
        self
    }

    /// Check names are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.sheet_name.trim().is_empty() || self.sheet_name.chars().count() > 31 {
            return Err("sheet_name must be 1 to 31 characters".to_string());
        }
        if self.sheet_name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
            return Err(format!("sheet_name '{}' contains a character Excel forbids", self.sheet_name));
        }
        let mut seen = std::collections::HashSet::new();
        for (category, name) in &self.file_names {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(format!("workbook file name for {} must be a plain file name", category));
            }
            if !name.to_ascii_lowercase().ends_with(".xlsx") {
                return Err(format!("workbook file name '{}' must end in .xlsx", name));
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("workbook file name '{}' is used by two categories", name));
            }
        }
        Ok(())
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Template directory, if any
    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    /// Sheet name
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Workbook file name of a category; `None` for Unknown
    pub fn file_name(&self, category: Category) -> Option<&str> {
        self.file_names.get(&category).map(String::as_str)
    }

    /// Workbook path of a category; `None` for Unknown
    pub fn path_for(&self, category: Category) -> Option<PathBuf> {
        self.file_name(category).map(|name| self.output_dir.join(name))
    }

    /// Template path of a category, when a template directory is set
    pub fn template_for(&self, category: Category) -> Option<PathBuf> {
        let dir = self.template_dir.as_ref()?;
        self.file_name(category).map(|name| dir.join(name))
    }
}

fn default_file_name(category: Category) -> &'static str {
    match category {
        Category::MeetingMaterial => "2办会材料信息.xlsx",
        Category::OfficialDocument => "3办文材料信息.xlsx",
        Category::PolicyDocument => "4政策文件信息.xlsx",
        Category::Unknown => "",
    }
}
