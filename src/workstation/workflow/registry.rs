// SPDX-License-Identifier: MIT

//! Node variant registry: declared kind name → node variant

use super::error::WorkflowError;
use super::node::Variant;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static VARIANTS: Lazy<HashMap<&'static str, Variant>> = Lazy::new(|| {
    HashMap::from([
        ("dashscope_chat", Variant::Model),
        ("openai_chat", Variant::Model),
        ("post_api_chat", Variant::Model),
        ("post_api_dall_e", Variant::Model),
        ("echo_chat", Variant::Model),
        ("Message", Variant::Message),
        ("DialogAgent", Variant::DialogAgent),
        ("UserAgent", Variant::UserAgent),
        ("DictDialogAgent", Variant::DictDialogAgent),
        ("ReActAgent", Variant::ReActAgent),
        ("Placeholder", Variant::Placeholder),
        ("MsgHub", Variant::MsgHub),
        ("SequentialPipeline", Variant::Sequential),
        ("ForLoopPipeline", Variant::ForLoop),
        ("WhileLoopPipeline", Variant::WhileLoop),
        ("IfElsePipeline", Variant::IfElse),
        ("SwitchPipeline", Variant::Switch),
        ("CopyNode", Variant::Copy),
        ("BingSearchService", Variant::BingSearch),
        ("GoogleSearchService", Variant::GoogleSearch),
        ("PythonService", Variant::Python),
        ("ReadTextService", Variant::ReadText),
        ("WriteTextService", Variant::WriteText),
    ])
});

/// Resolve a kind name
pub fn lookup(kind: &str) -> Result<Variant, WorkflowError> {
    VARIANTS
        .get(kind)
        .copied()
        .ok_or_else(|| WorkflowError::UnknownKind(kind.to_string()))
}

/// All registered kind names, sorted
pub fn known_kinds() -> Vec<&'static str> {
    let mut kinds: Vec<&'static str> = VARIANTS.keys().copied().collect();
    kinds.sort_unstable();
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workstation::workflow::node::NodeKind;

    #[test]
    fn test_lookup_known_kinds() {
        assert_eq!(lookup("openai_chat").unwrap().kind(), NodeKind::Model);
        assert_eq!(lookup("ReActAgent").unwrap(), Variant::ReActAgent);
        assert_eq!(lookup("CopyNode").unwrap().kind(), NodeKind::Copy);
        assert_eq!(lookup("MsgHub").unwrap().kind(), NodeKind::Pipeline);
        assert_eq!(lookup("PythonService").unwrap().kind(), NodeKind::Service);
    }

    #[test]
    fn test_lookup_unknown_kind() {
        let err = lookup("TeleportAgent").err().unwrap();
        assert!(matches!(err, WorkflowError::UnknownKind(ref k) if k == "TeleportAgent"));
    }

    #[test]
    fn test_known_kinds_sorted() {
        let kinds = known_kinds();
        assert_eq!(kinds.len(), 23);
        assert!(kinds.windows(2).all(|w| w[0] < w[1]));
    }
}
