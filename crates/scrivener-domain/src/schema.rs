//! Field schemas - the contract between extraction and persistence
//!
//! Each known [`Category`] owns an ordered list of [`FieldSpec`]s. The
//! field extractor asks the model for exactly these fields and the
//! persister writes them in exactly this order, followed by the
//! [`SOURCE_COLUMN`].

use crate::Category;
use std::collections::{BTreeMap, HashSet};

/// Header of the workbook column holding the source identity
pub const SOURCE_COLUMN: &str = "SourceDocument";

/// How a field's value is obtained and validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, stored as returned
    Text,

    /// Calendar date, normalised to `YYYY-MM-DD`
    Date,

    /// Numeric value, normalised to a plain decimal
    Number,

    /// Closed vocabulary
    Choice {
        /// Canonical options
        options: Vec<String>,
        /// Option used when the reply matches nothing
        fallback: Option<String>,
    },

    /// Document title; cleared when it merely repeats the file name
    Title,

    /// Source file name without extension; never asked of the model
    FileStem,
}

impl FieldKind {
    /// Build a choice kind from string slices
    pub fn choice(options: &[&str], fallback: Option<&str>) -> Self {
        FieldKind::Choice {
            options: options.iter().map(|o| o.to_string()).collect(),
            fallback: fallback.map(str::to_string),
        }
    }

    /// Short name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Choice { .. } => "choice",
            FieldKind::Title => "title",
            FieldKind::FileStem => "file_stem",
        }
    }

    /// Whether the model is asked to produce this field
    pub fn is_model_sourced(&self) -> bool {
        !matches!(self, FieldKind::FileStem)
    }
}

/// A single named, typed column of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column key, also the JSON key requested from the model
    pub name: String,

    /// Value kind
    pub kind: FieldKind,

    /// Whether the field is expected to be non-empty
    pub required: bool,

    /// Guidance for the model
    pub description: String,
}

impl FieldSpec {
    /// Create an optional field
    pub fn new(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered field set of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    category: Category,
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Create a schema, rejecting empty, duplicated or reserved field names
    pub fn new(category: Category, fields: Vec<FieldSpec>) -> Result<Self, String> {
        if !category.is_known() {
            return Err(format!("category {} cannot have a schema", category));
        }
        if fields.is_empty() {
            return Err(format!("schema for {} has no fields", category));
        }
        let mut seen = HashSet::new();
        for field in &fields {
            let name = field.name.trim();
            if name.is_empty() {
                return Err(format!("schema for {} has a field with an empty name", category));
            }
            if name != field.name {
                return Err(format!("field name '{}' has surrounding whitespace", field.name));
            }
            if name == SOURCE_COLUMN {
                return Err(format!("field name '{}' is reserved", SOURCE_COLUMN));
            }
            if !seen.insert(name.to_string()) {
                return Err(format!("schema for {} declares '{}' twice", category, name));
            }
        }
        Ok(Self { category, fields })
    }

    /// Category this schema belongs to
    pub fn category(&self) -> Category {
        self.category
    }

    /// Fields in declared order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declared order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Fields the model is asked for
    pub fn model_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind.is_model_sourced())
    }

    /// Required fields the model is asked for
    pub fn required_model_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.model_fields().filter(|f| f.required)
    }

    /// Workbook header: field names followed by the source column
    pub fn header(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.name.clone())
            .chain(std::iter::once(SOURCE_COLUMN.to_string()))
            .collect()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields (never true for a constructed schema)
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Static mapping from category to schema
///
/// Total over the known categories; `Unknown` has no schema. Immutable once
/// built: overrides are applied at startup through [`SchemaRegistry::with_schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    schemas: BTreeMap<Category, FieldSchema>,
}

impl SchemaRegistry {
    /// Registry with the built-in schemas for every known category
    pub fn builtin() -> Self {
        let schemas = Category::KNOWN
            .into_iter()
            .map(|category| (category, builtin_schema(category)))
            .collect();
        Self { schemas }
    }

    /// Replace the schema of one category
    pub fn with_schema(mut self, category: Category, fields: Vec<FieldSpec>) -> Result<Self, String> {
        let schema = FieldSchema::new(category, fields)?;
        self.schemas.insert(category, schema);
        Ok(self)
    }

    /// Schema for a category; `None` for `Unknown`
    pub fn schema_for(&self, category: Category) -> Option<&FieldSchema> {
        self.schemas.get(&category)
    }

    /// All schemas in category order
    pub fn schemas(&self) -> impl Iterator<Item = &FieldSchema> {
        self.schemas.values()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

const TOPICS: &[&str] = &[
    "社会服务与治理",
    "食品药品安全",
    "教育",
    "卫生健康与医疗",
    "商务",
    "经济与金融",
    "环境保护与生态文明",
    "创新创业发展",
    "农业农村发展",
    "工业和信息化",
    "文化与旅游",
    "城市建设与规划",
    "国家能源发展与规划",
    "网络与信息安全",
    "国际交流与合作",
    "交通管理与规划",
    "其他",
];

const LEVELS: &[&str] = &["科级", "处级", "局级（地厅级）", "省部级", "国家级"];

const LEVEL_NOTE: &str = "Administrative level. Chongqing is a municipality directly under the \
    central government: city level counts as 省部级, district level as 局级（地厅级）, district \
    departments as 处级, streets and towns as 科级.";

const TITLE_NOTE: &str = "Full title of the document as written at the top of the body. Titles \
    can wrap over several lines (especially in PDFs); join them without extra spaces and never \
    abbreviate. Empty when the document has no explicit title.";

fn topic_field() -> FieldSpec {
    FieldSpec::new(
        "Topic",
        FieldKind::choice(TOPICS, Some("其他")),
        "Subject area. Must be exactly one of the listed options; use 其他 when none fits.",
    )
    .required()
}

fn common_head(categories: &[&str], category_note: &str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("PolicyCategory", FieldKind::choice(categories, None), category_note).required(),
        FieldSpec::new("PolicyFileName", FieldKind::FileStem, "Source file name without extension."),
    ]
}

fn issuing_authority() -> FieldSpec {
    FieldSpec::new("IssuingAuthority", FieldKind::Text, "Issuing organisation.").required()
}

fn effective_date() -> FieldSpec {
    FieldSpec::new("EffectiveDate", FieldKind::Date, "Date the document was written, YYYY-MM-DD.").required()
}

fn builtin_schema(category: Category) -> FieldSchema {
    let fields = match category {
        Category::MeetingMaterial => {
            let mut fields = common_head(
                &["会议通知", "会议方案", "会议纪要", "其他"],
                "Kind of meeting document.",
            );
            fields.extend([
                issuing_authority(),
                effective_date(),
                FieldSpec::new("Position", FieldKind::choice(LEVELS, None), LEVEL_NOTE),
                topic_field(),
                FieldSpec::new("Refrence", FieldKind::Text, "Referenced material, empty if none."),
                FieldSpec::new("Remarks", FieldKind::Title, TITLE_NOTE),
            ]);
            fields
        }
        Category::OfficialDocument => {
            let mut fields = common_head(
                &["工作总结", "工作报告", "工作要点", "交流谈话", "工作调研", "工作要求", "其他"],
                "Kind of administrative document.",
            );
            fields.extend([
                issuing_authority(),
                effective_date(),
                FieldSpec::new("Position", FieldKind::choice(LEVELS, None), LEVEL_NOTE),
                FieldSpec::new(
                    "ObjectOriented",
                    FieldKind::Text,
                    "Audience of the document; vague audiences such as 各有关单位 become 各区级单位、镇街.",
                ),
                topic_field(),
                FieldSpec::new("Refrence", FieldKind::Text, "Referenced material, empty if none."),
                FieldSpec::new(
                    "Language",
                    FieldKind::choice(
                        &[
                            "决议", "决定", "命令", "公报", "公告", "通告", "意见", "通知", "通报",
                            "报告", "请示", "批复", "议案", "函", "纪要", "其他",
                        ],
                        None,
                    ),
                    "Official document genre (公文文种).",
                ),
                FieldSpec::new("Remarks", FieldKind::Title, TITLE_NOTE),
            ]);
            fields
        }
        Category::PolicyDocument => {
            let mut fields = common_head(
                &[
                    "党内法规与党建制度",
                    "国务院文件",
                    "国家各部委规章",
                    "地方法规",
                    "政府规章",
                    "行政规范性文件",
                    "政策解读",
                    "其他文件",
                ],
                "Kind of policy document.",
            );
            fields.extend([
                FieldSpec::new("DocumentNumber", FieldKind::Text, "Official document number (文号)."),
                issuing_authority(),
                effective_date(),
                FieldSpec::new("ImplementationDate", FieldKind::Date, "Date the policy takes effect, YYYY-MM-DD, empty if none."),
                FieldSpec::new("ValidUntil", FieldKind::Date, "Expiry date, YYYY-MM-DD, empty if none."),
                FieldSpec::new("ResponsibleDepartment", FieldKind::Text, "Department responsible; use the issuing department."),
                FieldSpec::new("CollaborativeDepartment", FieldKind::Text, "Co-operating departments, empty if none."),
                FieldSpec::new("ApplicableObject", FieldKind::Text, "Who the policy applies to."),
                FieldSpec::new(
                    "Fields",
                    FieldKind::Text,
                    "Policy areas, any of: 经济发展与财政、民生与社会服务、农业农村、资源环境与城乡建设、\
                     公共安全与监督、文化科教与旅游、重大项目建设.",
                ),
                FieldSpec::new("Remarks", FieldKind::Title, TITLE_NOTE),
            ]);
            fields
        }
        Category::Unknown => Vec::new(),
    };
    FieldSchema { category, fields }
}
