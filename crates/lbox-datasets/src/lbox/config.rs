//! Per-task configuration records for the LBox Open tasks.

use std::collections::BTreeMap;

/// Hub identifier of the LBox Open benchmark.
pub const DATASET_PATH: &str = "lbox/lbox_open";

/// How a document's query becomes prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// The query as is.
    Verbatim,
    /// `문장: {query} `
    Sentence,
}

impl PromptTemplate {
    pub fn render(&self, query: &str) -> String {
        match self {
            Self::Verbatim => query.to_string(),
            Self::Sentence => format!("문장: {query} "),
        }
    }
}

/// A class: its key in the raw data and the text the model is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub key: &'static str,
    pub verbalizer: &'static str,
}

impl Label {
    const fn new(key: &'static str, verbalizer: &'static str) -> Self {
        Self { key, verbalizer }
    }

    /// A label scored on its own key.
    const fn verbatim(key: &'static str) -> Self {
        Self::new(key, key)
    }
}

/// Everything that distinguishes one case-classification task from another.
///
/// `labels` is the single source for both the ordered candidate list and the
/// label dictionary: a label's index is its position.
#[derive(Debug)]
pub struct TaskConfig {
    pub name: &'static str,
    pub version: u32,
    pub dataset_path: &'static str,
    pub dataset_name: &'static str,
    pub validation_split: &'static str,
    /// Raw-record field holding the gold label.
    pub label_field: &'static str,
    pub prompt: PromptTemplate,
    pub labels: &'static [Label],
}

impl TaskConfig {
    /// Candidate continuations in label order (without the leading space).
    pub fn choices(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|l| l.verbalizer.to_string())
            .collect()
    }

    /// Label dictionary: key to index.
    pub fn label_map(&self) -> BTreeMap<&'static str, usize> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.key, i))
            .collect()
    }

    pub fn verbalize(&self, key: &str) -> Option<&'static str> {
        self.labels
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.verbalizer)
    }
}

/// Civil (민사) vs criminal (형사) case type.
pub static LEGAL_BINARY: TaskConfig = TaskConfig {
    name: "legal_binary",
    version: 0,
    dataset_path: DATASET_PATH,
    dataset_name: "casename_classification",
    validation_split: "valid",
    label_field: "casetype",
    prompt: PromptTemplate::Sentence,
    labels: &[Label::new("civil", "민사"), Label::new("criminal", "형사")],
};

/// Civil case name, 4 classes.
pub static LJP_CIVIL: TaskConfig = TaskConfig {
    name: "ljp_civil",
    version: 0,
    dataset_path: DATASET_PATH,
    dataset_name: "ljp_civil",
    validation_split: "validation",
    label_field: "casename",
    prompt: PromptTemplate::Verbatim,
    labels: &[
        Label::verbatim("구상금"),
        Label::verbatim("대여금"),
        Label::verbatim("부당이득금"),
        Label::verbatim("손해배상(기)"),
    ],
};

/// Criminal case name, 7 classes.
pub static LJP_CRIMINAL: TaskConfig = TaskConfig {
    name: "ljp_criminal",
    version: 0,
    dataset_path: DATASET_PATH,
    dataset_name: "ljp_criminal",
    validation_split: "validation",
    label_field: "casename",
    prompt: PromptTemplate::Verbatim,
    labels: &[
        Label::verbatim("강제추행"),
        Label::verbatim("공무집행방해"),
        Label::verbatim("교통사고처리특례법위반(치상)"),
        Label::verbatim("도로교통법위반(음주운전)"),
        Label::verbatim("사기"),
        Label::verbatim("상해"),
        Label::verbatim("폭행"),
    ],
};

/// Every registered task, in listing order.
pub static ALL_TASKS: [&TaskConfig; 3] = [&LEGAL_BINARY, &LJP_CIVIL, &LJP_CRIMINAL];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_prompt_templates() {
        assert_eq!(PromptTemplate::Verbatim.render("사실"), "사실");
        assert_eq!(PromptTemplate::Sentence.render("사실"), "문장: 사실 ");
    }

    #[test]
    fn test_label_map_covers_choices_exactly() {
        for config in [&LJP_CIVIL, &LJP_CRIMINAL] {
            let choices = config.choices();
            let label_map = config.label_map();

            assert_eq!(
                label_map.len(),
                choices.len(),
                "{}: duplicate key",
                config.name
            );
            for (i, choice) in choices.iter().enumerate() {
                assert_eq!(label_map.get(choice.as_str()), Some(&i), "{}", config.name);
            }
            let keys: BTreeSet<&str> = label_map.keys().copied().collect();
            let choice_set: BTreeSet<&str> = choices.iter().map(String::as_str).collect();
            assert_eq!(keys, choice_set, "{}", config.name);
        }
    }

    #[test]
    fn test_class_counts() {
        assert_eq!(LEGAL_BINARY.labels.len(), 2);
        assert_eq!(LJP_CIVIL.labels.len(), 4);
        assert_eq!(LJP_CRIMINAL.labels.len(), 7);
    }

    #[test]
    fn test_binary_dictionary() {
        let label_map = LEGAL_BINARY.label_map();
        assert_eq!(label_map.get("civil"), Some(&0));
        assert_eq!(label_map.get("criminal"), Some(&1));
        assert_eq!(label_map.get("민사"), None);
        assert_eq!(LEGAL_BINARY.verbalize("civil"), Some("민사"));
        assert_eq!(LEGAL_BINARY.verbalize("criminal"), Some("형사"));
    }

    #[test]
    fn test_registration_metadata() {
        let names: Vec<&str> = ALL_TASKS.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["legal_binary", "ljp_civil", "ljp_criminal"]);
        for config in ALL_TASKS {
            assert_eq!(config.version, 0);
            assert_eq!(config.dataset_path, "lbox/lbox_open");
        }
        assert_eq!(LEGAL_BINARY.validation_split, "valid");
        assert_eq!(LJP_CIVIL.validation_split, "validation");
    }
}
