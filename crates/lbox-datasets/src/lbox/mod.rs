//! LBox Open legal judgment prediction tasks.
//!
//! Korean court rulings from the LBox Open benchmark
//! (Hwang et al., 2022, "A multi-task benchmark for Korean legal language
//! understanding and judgement prediction"). Three tasks share one adapter:
//! - `legal_binary`: is the case civil (민사) or criminal (형사)?
//! - `ljp_civil`: which of 4 civil case names applies?
//! - `ljp_criminal`: which of 7 criminal case names applies?
//!
//! Each candidate label is scored as a continuation of the prompt and the
//! highest log-likelihood wins.

mod config;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use eval_harness::{
    ACC, Aggregation, DatasetDict, DocResult, Error, MACRO_F1, RawRecord, Request, Result, Task,
    TaskMetadata, argmax,
};
use serde::{Deserialize, Serialize};

pub use config::{
    ALL_TASKS, DATASET_PATH, LEGAL_BINARY, LJP_CIVIL, LJP_CRIMINAL, Label, PromptTemplate,
    TaskConfig,
};

/// A case record ready for prompting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDocument {
    /// The facts of the case.
    pub query: String,
    /// Candidate labels, scored in this order.
    pub choices: Vec<String>,
    /// Gold label key as found in the raw record.
    pub gold: String,
}

/// Case classification over one LBox Open dataset configuration.
pub struct CaseClassificationTask {
    config: &'static TaskConfig,
    metadata: TaskMetadata,
    label_map: BTreeMap<&'static str, usize>,
    dataset: DatasetDict,
    training: OnceLock<Vec<CaseDocument>>,
}

impl CaseClassificationTask {
    /// Create a task over an already loaded dataset.
    pub fn new(config: &'static TaskConfig, dataset: DatasetDict) -> Self {
        let metadata = TaskMetadata::new(config.name)
            .with_version(config.version)
            .with_dataset_path(config.dataset_path)
            .with_dataset_name(config.dataset_name);
        Self {
            config,
            metadata,
            label_map: config.label_map(),
            dataset,
            training: OnceLock::new(),
        }
    }

    pub fn legal_binary(dataset: DatasetDict) -> Self {
        Self::new(&LEGAL_BINARY, dataset)
    }

    pub fn ljp_civil(dataset: DatasetDict) -> Self {
        Self::new(&LJP_CIVIL, dataset)
    }

    pub fn ljp_criminal(dataset: DatasetDict) -> Self {
        Self::new(&LJP_CRIMINAL, dataset)
    }

    pub fn config(&self) -> &'static TaskConfig {
        self.config
    }

    /// Normalize a raw record. The gold label is carried through unchecked.
    pub fn process_doc(&self, raw: &RawRecord) -> Result<CaseDocument> {
        let gold = self.string_field(raw, self.config.label_field)?;
        Ok(CaseDocument {
            query: self.string_field(raw, "facts")?.to_string(),
            choices: self.config.choices(),
            gold: gold.to_string(),
        })
    }

    /// Index of the document's gold label in the label dictionary.
    pub fn gold_index(&self, doc: &CaseDocument) -> Result<usize> {
        self.label_map
            .get(doc.gold.as_str())
            .copied()
            .ok_or_else(|| self.unknown_label(&doc.gold))
    }

    fn process_split(&self, split: &str) -> Result<Vec<CaseDocument>> {
        self.dataset
            .split(split)?
            .iter()
            .map(|raw| self.process_doc(raw))
            .collect()
    }

    fn string_field<'a>(&self, raw: &'a RawRecord, field: &str) -> Result<&'a str> {
        raw.get(field).and_then(|v| v.as_str()).ok_or_else(|| {
            Error::InvalidRecord(format!(
                "{}: missing string field `{}`",
                self.config.name, field
            ))
        })
    }

    fn unknown_label(&self, label: &str) -> Error {
        Error::UnknownLabel {
            task: self.config.name.to_string(),
            label: label.to_string(),
        }
    }
}

impl Task for CaseClassificationTask {
    type Doc = CaseDocument;

    fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    fn has_training_docs(&self) -> bool {
        true
    }

    fn has_validation_docs(&self) -> bool {
        true
    }

    fn has_test_docs(&self) -> bool {
        true
    }

    fn training_docs(&self) -> Result<&[CaseDocument]> {
        if let Some(docs) = self.training.get() {
            return Ok(docs);
        }
        let docs = self.process_split("train")?;
        Ok(self.training.get_or_init(|| docs))
    }

    fn validation_docs(&self) -> Result<Vec<CaseDocument>> {
        self.process_split(self.config.validation_split)
    }

    fn test_docs(&self) -> Result<Vec<CaseDocument>> {
        self.process_split("test")
    }

    fn doc_to_text(&self, doc: &CaseDocument) -> String {
        self.config.prompt.render(&doc.query)
    }

    fn doc_to_target(&self, doc: &CaseDocument) -> Result<String> {
        let verbalizer = self
            .config
            .verbalize(&doc.gold)
            .ok_or_else(|| self.unknown_label(&doc.gold))?;
        Ok(format!(" {verbalizer}"))
    }

    fn construct_requests(&self, doc: &CaseDocument, ctx: &str) -> Vec<Request> {
        doc.choices
            .iter()
            .map(|choice| Request::loglikelihood(ctx, format!(" {choice}")))
            .collect()
    }

    fn process_results(&self, doc: &CaseDocument, results: &[f64]) -> Result<DocResult> {
        if results.len() != doc.choices.len() {
            return Err(Error::ResponseMismatch {
                expected: doc.choices.len(),
                actual: results.len(),
            });
        }
        let pred = argmax(results).ok_or(Error::ResponseMismatch {
            expected: doc.choices.len(),
            actual: 0,
        })?;
        let gold = self.gold_index(doc)?;
        Ok(DocResult::classification(gold, pred))
    }

    fn aggregation(&self) -> BTreeMap<&'static str, Aggregation> {
        BTreeMap::from([(ACC, Aggregation::Mean), (MACRO_F1, Aggregation::MacroF1)])
    }

    fn higher_is_better(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([(ACC, true), (MACRO_F1, true)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_harness::MetricSample;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn binary_doc(casetype: &str) -> CaseDocument {
        CaseClassificationTask::legal_binary(DatasetDict::new())
            .process_doc(&json!({"facts": "Y", "casetype": casetype}))
            .unwrap()
    }

    fn sample(result: &DocResult, metric: &str) -> MetricSample {
        *result.get(metric).unwrap()
    }

    #[test]
    fn test_binary_prompt_and_targets() {
        let task = CaseClassificationTask::legal_binary(DatasetDict::new());

        let civil = binary_doc("civil");
        let criminal = binary_doc("criminal");
        assert_eq!(task.doc_to_text(&civil), "문장: Y ");
        assert_eq!(task.doc_to_target(&criminal).unwrap(), " 형사");
        assert_eq!(task.doc_to_target(&civil).unwrap(), " 민사");
    }

    #[test]
    fn test_binary_requests() {
        let task = CaseClassificationTask::legal_binary(DatasetDict::new());
        let requests = task.construct_requests(&binary_doc("civil"), "문장: Y ");

        assert_eq!(
            requests,
            vec![
                Request::loglikelihood("문장: Y ", " 민사"),
                Request::loglikelihood("문장: Y ", " 형사"),
            ]
        );
    }

    #[test]
    fn test_binary_criminal_scenario() {
        let task = CaseClassificationTask::legal_binary(DatasetDict::new());
        let result = task
            .process_results(&binary_doc("criminal"), &[-2.0, -1.0])
            .unwrap();

        assert_eq!(sample(&result, ACC), MetricSample::Bool(true));
        assert_eq!(sample(&result, MACRO_F1), MetricSample::Pair(1, 1));
    }

    #[test]
    fn test_binary_prediction_is_strict() {
        let task = CaseClassificationTask::legal_binary(DatasetDict::new());
        let doc = binary_doc("criminal");

        for (civil, criminal) in [(-1.0, -1.0), (-0.5, -3.0), (-4.0, -4.0), (0.0, 0.0)] {
            let result = task.process_results(&doc, &[civil, criminal]).unwrap();
            assert_eq!(sample(&result, MACRO_F1), MetricSample::Pair(1, 0));
        }
        for (civil, criminal) in [(-1.0, -0.999), (-3.0, -0.5)] {
            let result = task.process_results(&doc, &[civil, criminal]).unwrap();
            assert_eq!(sample(&result, MACRO_F1), MetricSample::Pair(1, 1));
        }
    }

    #[test]
    fn test_civil_scenario() {
        let task = CaseClassificationTask::ljp_civil(DatasetDict::new());
        let doc = task
            .process_doc(&json!({"facts": "X", "casename": "대여금"}))
            .unwrap();

        assert_eq!(
            doc,
            CaseDocument {
                query: "X".into(),
                choices: vec![
                    "구상금".into(),
                    "대여금".into(),
                    "부당이득금".into(),
                    "손해배상(기)".into()
                ],
                gold: "대여금".into(),
            }
        );
        assert_eq!(task.gold_index(&doc).unwrap(), 1);
        assert_eq!(task.doc_to_text(&doc), "X");
        assert_eq!(task.doc_to_target(&doc).unwrap(), " 대여금");
    }

    #[test]
    fn test_criminal_last_label() {
        let task = CaseClassificationTask::ljp_criminal(DatasetDict::new());
        let doc = task
            .process_doc(&json!({"facts": "Z", "casename": "폭행"}))
            .unwrap();
        assert_eq!(task.gold_index(&doc).unwrap(), 6);
        assert_eq!(doc.choices.len(), 7);
    }

    #[test]
    fn test_multiple_choice_ties_pick_lowest_index() {
        let task = CaseClassificationTask::ljp_criminal(DatasetDict::new());
        let doc = task
            .process_doc(&json!({"facts": "Z", "casename": "사기"}))
            .unwrap();

        let scores = [-9.0, -2.0, -3.0, -2.0, -2.0, -8.0, -2.0];
        let result = task.process_results(&doc, &scores).unwrap();
        assert_eq!(sample(&result, MACRO_F1), MetricSample::Pair(4, 1));
        assert_eq!(sample(&result, ACC), MetricSample::Bool(false));

        let scores = [-9.0, -2.0, -3.0, -2.0, -1.0, -8.0, -2.0];
        let result = task.process_results(&doc, &scores).unwrap();
        assert_eq!(sample(&result, MACRO_F1), MetricSample::Pair(4, 4));
    }

    #[test]
    fn test_multiple_choice_requests_follow_choice_order() {
        let task = CaseClassificationTask::ljp_civil(DatasetDict::new());
        let doc = task
            .process_doc(&json!({"facts": "X", "casename": "구상금"}))
            .unwrap();
        let continuations: Vec<String> = task
            .construct_requests(&doc, "X")
            .into_iter()
            .map(|r| r.continuation)
            .collect();
        assert_eq!(
            continuations,
            vec![" 구상금", " 대여금", " 부당이득금", " 손해배상(기)"]
        );
    }

    #[test]
    fn test_process_doc_is_pure() {
        let task = CaseClassificationTask::ljp_civil(DatasetDict::new());
        let raw = json!({"facts": "X", "casename": "손해배상(기)"});
        let first = task.process_doc(&raw).unwrap();
        assert_eq!(first, task.process_doc(&raw).unwrap());
    }

    #[test]
    fn test_unknown_label_is_fatal() {
        let task = CaseClassificationTask::ljp_civil(DatasetDict::new());
        let doc = task
            .process_doc(&json!({"facts": "X", "casename": "사기"}))
            .unwrap();

        assert!(matches!(
            task.gold_index(&doc),
            Err(Error::UnknownLabel { ref label, .. }) if label == "사기"
        ));
        assert!(task.process_results(&doc, &[0.0; 4]).is_err());
        assert!(task.doc_to_target(&doc).is_err());

        let binary = CaseClassificationTask::legal_binary(DatasetDict::new());
        let doc = binary_doc("administrative");
        assert!(matches!(
            binary.process_results(&doc, &[-1.0, -2.0]),
            Err(Error::UnknownLabel { .. })
        ));
    }

    #[test]
    fn test_missing_field_is_invalid_record() {
        let task = CaseClassificationTask::ljp_civil(DatasetDict::new());
        assert!(matches!(
            task.process_doc(&json!({"facts": "X"})),
            Err(Error::InvalidRecord(_))
        ));
        assert!(matches!(
            task.process_doc(&json!({"casename": "대여금"})),
            Err(Error::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_wrong_score_count() {
        let task = CaseClassificationTask::ljp_civil(DatasetDict::new());
        let doc = task
            .process_doc(&json!({"facts": "X", "casename": "대여금"}))
            .unwrap();
        assert!(matches!(
            task.process_results(&doc, &[-1.0, -2.0]),
            Err(Error::ResponseMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_splits() {
        let dataset = DatasetDict::new()
            .with_split("train", vec![json!({"facts": "t", "casetype": "civil"})])
            .with_split("valid", vec![json!({"facts": "v", "casetype": "criminal"})])
            .with_split("test", vec![json!({"facts": "x", "casetype": "civil"})]);
        let binary = CaseClassificationTask::legal_binary(dataset.clone());

        assert!(binary.has_training_docs());
        assert!(binary.has_validation_docs());
        assert!(binary.has_test_docs());
        assert_eq!(binary.validation_docs().unwrap()[0].query, "v");
        assert_eq!(binary.test_docs().unwrap()[0].query, "x");

        // The LJP tasks read `validation`, which this dataset lacks.
        let civil = CaseClassificationTask::ljp_civil(dataset);
        assert!(matches!(
            civil.validation_docs(),
            Err(Error::MissingSplit(ref s)) if s == "validation"
        ));
    }

    #[test]
    fn test_training_docs_are_memoized() {
        let dataset = DatasetDict::new().with_split(
            "train",
            vec![
                json!({"facts": "a", "casename": "대여금"}),
                json!({"facts": "b", "casename": "구상금"}),
            ],
        );
        let task = CaseClassificationTask::ljp_civil(dataset);

        let first = task.training_docs().unwrap();
        let second = task.training_docs().unwrap();
        assert_eq!(first.len(), 2);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_missing_train_split() {
        let task = CaseClassificationTask::ljp_criminal(DatasetDict::new());
        assert!(matches!(task.training_docs(), Err(Error::MissingSplit(_))));
    }

    #[test]
    fn test_fewshot_context() {
        let example = json!({"facts": "피고인은 음주 상태로 운전하였다.", "casetype": "criminal"});
        let dataset = DatasetDict::new().with_split("train", vec![example]);
        let task = CaseClassificationTask::legal_binary(dataset);
        let doc = binary_doc("civil");
        let mut rng = StdRng::seed_from_u64(1234);

        let ctx = task.fewshot_context(&doc, 1, &mut rng, None).unwrap();
        assert_eq!(
            ctx,
            "문장: 피고인은 음주 상태로 운전하였다.  형사\n\n문장: Y "
        );
    }

    fn finite_score() -> impl Strategy<Value = f64> {
        prop_oneof![
            -50.0f64..0.0,
            any::<f64>().prop_filter("finite", |v| v.is_finite()),
        ]
    }

    /// Score pairs where about a third are exact ties.
    fn score_pair() -> impl Strategy<Value = (f64, f64)> {
        prop_oneof![
            2 => (finite_score(), finite_score()),
            1 => finite_score().prop_map(|s| (s, s)),
        ]
    }

    proptest! {
        /// Property: legal_binary predicts criminal exactly when criminal scores strictly higher
        #[test]
        fn prop_binary_prediction_is_strict((civil, criminal) in score_pair()) {
            let task = CaseClassificationTask::legal_binary(DatasetDict::new());
            let result = task
                .process_results(&binary_doc("civil"), &[civil, criminal])
                .unwrap();
            let MetricSample::Pair(gold, pred) = sample(&result, MACRO_F1) else {
                panic!("macro_f1 sample is not a pair");
            };
            prop_assert_eq!(gold, 0);
            prop_assert_eq!(pred == 1, criminal > civil);
        }

        /// Property: normalizing a record twice gives the same document
        #[test]
        fn prop_process_doc_is_idempotent(facts in any::<String>()) {
            let task = CaseClassificationTask::legal_binary(DatasetDict::new());
            let raw = json!({"facts": facts.as_str(), "casetype": "criminal"});
            let doc = task.process_doc(&raw).unwrap();
            prop_assert_eq!(&doc, &task.process_doc(&raw).unwrap());
            prop_assert_eq!(&doc.query, &facts);
        }

        /// Property: the binary prompt wraps the facts verbatim
        #[test]
        fn prop_binary_prompt_wraps_facts(facts in any::<String>()) {
            let task = CaseClassificationTask::legal_binary(DatasetDict::new());
            let raw = json!({"facts": facts.as_str(), "casetype": "civil"});
            let doc = task.process_doc(&raw).unwrap();
            prop_assert_eq!(task.doc_to_text(&doc), format!("문장: {facts} "));
        }
    }
}
