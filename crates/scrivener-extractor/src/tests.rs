//! Integration tests for classification and extraction

#[cfg(test)]
mod tests {
    use crate::{Classifier, Extraction, ExtractionFailure, ExtractorConfig, FieldExtractor, PromptSet};
    use proptest::prelude::*;
    use scrivener_domain::{Category, Document, FieldKind, FieldSpec, SchemaRegistry, SourceId};
    use scrivener_llm::{LlmError, MockProvider};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            retry_backoff_ms: 0,
            ..ExtractorConfig::default()
        }
    }

    fn pipeline(llm: &MockProvider, registry: SchemaRegistry) -> (Classifier<MockProvider>, FieldExtractor<MockProvider>) {
        let llm = Arc::new(llm.clone());
        let prompts = Arc::new(PromptSet::default());
        (
            Classifier::new(llm.clone(), prompts.clone(), config()),
            FieldExtractor::new(llm, Arc::new(registry), prompts, config()),
        )
    }

    fn document(name: &str, text: &str) -> Document {
        Document::new(PathBuf::from(name), SourceId::new(name), text.to_string(), text.len() as u64, None)
    }

    const POLICY_REPLY: &str = r#"```json
{
  "PolicyCategory": "行政规范性文件",
  "DocumentNumber": "渝府发〔2024〕3号",
  "IssuingAuthority": "重庆市人民政府",
  "EffectiveDate": "2024/01/15",
  "ImplementationDate": "2024年2月1日",
  "ValidUntil": "",
  "ResponsibleDepartment": "市发展改革委",
  "CollaborativeDepartment": ["市财政局", "市商务委"],
  "ApplicableObject": "本市企业",
  "Fields": ["经济发展与财政"],
  "Remarks": "关于促进民营经济发展的若干措施",
  "Extra": "ignored"
}
```"#;

    #[tokio::test]
    async fn test_full_classify_then_extract_flow() {
        let llm = MockProvider::default();
        llm.add_response("Reply with exactly one category", "PolicyDocument");
        llm.add_response("Return ONLY a JSON object", POLICY_REPLY);
        let registry = SchemaRegistry::builtin();
        let (classifier, extractor) = pipeline(&llm, registry.clone());

        let doc = document("policies/促进民营经济.docx", "重庆市人民政府关于促进民营经济发展的若干措施……");
        let classification = classifier.classify(&doc.text).await.unwrap();
        assert_eq!(classification.category, Category::PolicyDocument);

        let Extraction::Record(record) = extractor.extract(&doc, classification.category).await.unwrap() else {
            panic!("expected a record");
        };
        let schema = registry.schema_for(Category::PolicyDocument).unwrap();
        assert!(record.conforms_to(schema));
        assert_eq!(record.source.as_str(), "policies/促进民营经济.docx");
        assert_eq!(record.get("PolicyFileName").unwrap().value, "促进民营经济");
        assert_eq!(record.get("EffectiveDate").unwrap().value, "2024-01-15");
        assert_eq!(record.get("ImplementationDate").unwrap().value, "2024-02-01");
        assert_eq!(record.get("CollaborativeDepartment").unwrap().value, "市财政局、市商务委");
        assert_eq!(record.get("Remarks").unwrap().value, "关于促进民营经济发展的若干措施");
        assert!(record.get("Extra").is_none());
        assert!(record.flagged_fields().is_empty());
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_every_category_yields_its_schema() {
        let registry = SchemaRegistry::builtin();
        let llm = MockProvider::new(r#"{"PolicyCategory": "其他", "IssuingAuthority": "区政府", "EffectiveDate": "2024-01-01", "Topic": "其他"}"#);
        let (_, extractor) = pipeline(&llm, registry.clone());

        for category in Category::KNOWN {
            let result = extractor.extract(&document("a.pdf", "text"), category).await.unwrap();
            let Extraction::Record(record) = result else {
                panic!("expected a record for {}", category);
            };
            assert!(record.conforms_to(registry.schema_for(category).unwrap()));
            assert_eq!(record.category, category);
        }
    }

    #[tokio::test]
    async fn test_reply_without_required_fields_fails() {
        let llm = MockProvider::new(r#"{"Refrence": "无", "Remarks": "标题"}"#);
        let (_, extractor) = pipeline(&llm, SchemaRegistry::builtin());
        let result = extractor
            .extract(&document("a.docx", "text"), Category::OfficialDocument)
            .await
            .unwrap();
        assert_eq!(result, Extraction::Failed(ExtractionFailure::NoRequiredFields));
    }

    #[tokio::test]
    async fn test_schema_override_is_used() {
        let registry = SchemaRegistry::builtin()
            .with_schema(
                Category::MeetingMaterial,
                vec![
                    FieldSpec::new("Title", FieldKind::Text, "Meeting title").required(),
                    FieldSpec::new("Attendees", FieldKind::Number, "Head count"),
                ],
            )
            .unwrap();
        let llm = MockProvider::new(r#"{"Title": "季度例会", "Attendees": "1,200"}"#);
        let (_, extractor) = pipeline(&llm, registry);

        let Extraction::Record(record) = extractor
            .extract(&document("m.docx", "text"), Category::MeetingMaterial)
            .await
            .unwrap()
        else {
            panic!("expected a record");
        };
        assert_eq!(record.fields().len(), 2);
        assert_eq!(record.get("Attendees").unwrap().value, "1200");
        assert!(llm.prompts()[0].contains("- Title (required): Meeting title"));
    }

    #[tokio::test]
    async fn test_one_transient_failure_then_success() {
        let llm = MockProvider::new("MeetingMaterial");
        llm.fail_next(LlmError::Timeout);
        let (classifier, _) = pipeline(&llm, SchemaRegistry::builtin());
        let result = classifier.classify("会议通知").await.unwrap();
        assert_eq!(result.category, Category::MeetingMaterial);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_two_transient_failures_give_unknown() {
        let llm = MockProvider::new("MeetingMaterial");
        llm.fail_next(LlmError::RateLimited);
        llm.fail_next(LlmError::RateLimited);
        let (classifier, _) = pipeline(&llm, SchemaRegistry::builtin());
        let result = classifier.classify("会议通知").await.unwrap();
        assert_eq!(result.category, Category::Unknown);
        assert!(result.rationale.unwrap().contains("Rate limit"));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_model_not_available_is_not_retried() {
        let llm = MockProvider::new("MeetingMaterial");
        llm.fail_next(LlmError::ModelNotAvailable("m".into()));
        let (classifier, _) = pipeline(&llm, SchemaRegistry::builtin());
        let result = classifier.classify("会议通知").await.unwrap();
        assert_eq!(result.category, Category::Unknown);
        assert_eq!(llm.call_count(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn classify_is_closed_over_any_reply(reply in ".*") {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let llm = MockProvider::new(reply.clone());
            let (classifier, _) = pipeline(&llm, SchemaRegistry::builtin());
            let result = runtime.block_on(classifier.classify("some document")).unwrap();

            prop_assert!(Category::ALL.contains(&result.category));
            if result.category == Category::Unknown {
                prop_assert!(result.rationale.is_some());
            } else {
                prop_assert!(result.category.as_str().eq_ignore_ascii_case(reply.trim()));
            }
        }
    }
}
