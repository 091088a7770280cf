//! Prompt assembly under a fixed length budget.
//!
//! ## Layout
//!
//! ```text
//! <instructions>
//!
//! Here are examples of PDFs and their corresponding LaTeX outlines:   ┐
//! === Example 1 ===                                                   │ only when at
//! PDF Content: …                                                      │ least one
//! LaTeX Outline: ```latex … ```                                       │ example fits
//! === Example 2 (LaTeX structure only) === …                          ┘
//! New Document Content:
//! <target text>
//!
//! <final directive>
//! ```
//!
//! ## Fitting the budget
//!
//! Instructions and target text are never shortened; only examples give way.
//! Whole examples are dropped from the end first. If not even the first one
//! fits, its source and outline are cut in proportion to their lengths, and
//! if that would leave less than [`MIN_EXAMPLE_BODY_CHARS`] of text the
//! prompt goes out zero-shot. Lengths are counted in chars, and the same
//! inputs always produce the same prompt.

use crate::error::OutlineError;
use crate::output::{ExamplePair, PromptSpec};
use crate::pipeline::extract::truncate_chars;
use crate::prompts::{
    example_header, outline_only_header, outline_section, source_section, target_section,
    BUDGET_TRUNCATED_MARKER, EXAMPLES_INTRO, FINAL_DIRECTIVE,
};
use tracing::{debug, warn};

/// Smallest amount of example text worth keeping after truncation.
pub const MIN_EXAMPLE_BODY_CHARS: usize = 64;

/// An assembled prompt plus what the budget did to the examples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub text: String,
    /// Leading examples included (whole or truncated).
    pub examples_used: usize,
    /// Whether the single included example was shortened.
    pub example_truncated: bool,
}

impl BuiltPrompt {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Build the prompt for `spec`, never exceeding `budget_chars`.
///
/// # Errors
/// - `EmptyExtraction` if the target text is blank
/// - `PromptBudgetExceeded` if instructions, target and directive alone
///   are longer than the budget
pub fn build_prompt(spec: &PromptSpec, budget_chars: usize) -> Result<BuiltPrompt, OutlineError> {
    if spec.target_text.trim().is_empty() {
        return Err(OutlineError::EmptyExtraction {
            document: "the target document".to_string(),
        });
    }

    let head = format!("{}\n\n", spec.instructions);
    let tail = format!("{}{}", target_section(&spec.target_text), FINAL_DIRECTIVE);
    let fixed = char_len(&head) + char_len(&tail);
    if fixed > budget_chars {
        return Err(OutlineError::PromptBudgetExceeded {
            required: fixed,
            budget: budget_chars,
        });
    }

    let (examples, example_truncated) = fit_examples(&spec.examples, budget_chars - fixed);
    let examples_used = examples.len();
    if examples_used < spec.examples.len() {
        warn!(
            "Prompt budget of {} chars fits {}/{} examples",
            budget_chars,
            examples_used,
            spec.examples.len()
        );
    }

    let mut text = head;
    if !examples.is_empty() {
        text.push_str(EXAMPLES_INTRO);
        for block in &examples {
            text.push_str(block);
        }
    }
    text.push_str(&tail);

    let built = BuiltPrompt {
        text,
        examples_used,
        example_truncated,
    };
    debug!(
        "Built prompt: {} chars, {} example(s), truncated={}",
        built.char_len(),
        examples_used,
        example_truncated
    );
    debug_assert!(built.char_len() <= budget_chars);
    Ok(built)
}

/// Render the example blocks that fit in `room` chars (intro included).
fn fit_examples(examples: &[ExamplePair], room: usize) -> (Vec<String>, bool) {
    if examples.is_empty() {
        return (Vec::new(), false);
    }
    let intro = char_len(EXAMPLES_INTRO);
    if room <= intro {
        return (Vec::new(), false);
    }
    let mut left = room - intro;

    let mut blocks = Vec::new();
    for (i, example) in examples.iter().enumerate() {
        let block = render_example(
            i + 1,
            example.source_text.as_deref(),
            &example.outline_text,
        );
        let len = char_len(&block);
        if len > left {
            break;
        }
        left -= len;
        blocks.push(block);
    }
    if !blocks.is_empty() {
        return (blocks, false);
    }

    match truncate_example(&examples[0], left) {
        Some(block) => (vec![block], true),
        None => (Vec::new(), false),
    }
}

/// Shrink the first example to fit `room` chars, or give up.
fn truncate_example(example: &ExamplePair, room: usize) -> Option<String> {
    let frame = char_len(&render_example(
        1,
        example.source_text.as_ref().map(|_| ""),
        "",
    ));
    let body = room.checked_sub(frame)?;
    if body < MIN_EXAMPLE_BODY_CHARS {
        return None;
    }

    let outline_len = char_len(&example.outline_text);
    let source = example.source_text.as_deref().map(|source| {
        let source_len = char_len(source);
        let share = body * source_len / (source_len + outline_len).max(1);
        truncate_chars(source, share, BUDGET_TRUNCATED_MARKER)
    });
    let outline_room = body - source.as_deref().map(char_len).unwrap_or(0);
    let outline = truncate_chars(&example.outline_text, outline_room, BUDGET_TRUNCATED_MARKER);

    Some(render_example(1, source.as_deref(), &outline))
}

fn render_example(index: usize, source: Option<&str>, outline: &str) -> String {
    match source {
        Some(source) => format!(
            "{}{}{}",
            example_header(index),
            source_section(source),
            outline_section(outline)
        ),
        None => format!("{}{}", outline_only_header(index), outline_section(outline)),
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{DEFAULT_INSTRUCTIONS, TARGET_LABEL};

    fn spec(examples: Vec<ExamplePair>, target: &str) -> PromptSpec {
        PromptSpec {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            examples,
            target_text: target.to_string(),
            model_name: "llama3.2:3b".to_string(),
        }
    }

    fn pair(base: &str, source: Option<&str>, outline: &str) -> ExamplePair {
        ExamplePair {
            base_name: base.to_string(),
            source_text: source.map(str::to_string),
            outline_text: outline.to_string(),
        }
    }

    fn zero_shot_len(target: &str) -> usize {
        build_prompt(&spec(vec![], target), usize::MAX)
            .unwrap()
            .char_len()
    }

    #[test]
    fn empty_target_is_an_extraction_error() {
        let err = build_prompt(&spec(vec![], "  \n "), 100_000).unwrap_err();
        assert!(matches!(err, OutlineError::EmptyExtraction { .. }));
    }

    #[test]
    fn zero_shot_layout() {
        let p = build_prompt(&spec(vec![], "Hello World"), 100_000).unwrap();
        assert!(p.text.starts_with(DEFAULT_INSTRUCTIONS));
        assert!(!p.text.contains(EXAMPLES_INTRO));
        assert!(p.text.contains(&format!("{TARGET_LABEL}Hello World")));
        assert!(p.text.ends_with(FINAL_DIRECTIVE));
        assert_eq!(p.examples_used, 0);
    }

    #[test]
    fn examples_appear_in_order_before_target() {
        let examples = vec![
            pair("ex1", Some("first source"), "\\section{One}"),
            pair("ex2", None, "\\section{Two}"),
        ];
        let p = build_prompt(&spec(examples, "target body"), 100_000).unwrap();
        let one = p.text.find("\\section{One}").unwrap();
        let two = p.text.find("\\section{Two}").unwrap();
        let target = p.text.find("target body").unwrap();
        assert!(one < two && two < target);
        assert!(p.text.contains("=== Example 1 ===\nPDF Content:\nfirst source"));
        assert!(p.text.contains("=== Example 2 (LaTeX structure only) ==="));
        assert_eq!(p.examples_used, 2);
        assert!(!p.example_truncated);
    }

    #[test]
    fn budget_too_small_for_fixed_parts_fails() {
        let target = "x".repeat(500);
        let needed = zero_shot_len(&target);
        let err = build_prompt(&spec(vec![], &target), needed - 1).unwrap_err();
        match err {
            OutlineError::PromptBudgetExceeded { required, budget } => {
                assert_eq!(required, needed);
                assert_eq!(budget, needed - 1);
            }
            other => panic!("expected PromptBudgetExceeded, got {other:?}"),
        }
    }

    #[test]
    fn later_examples_are_dropped_first() {
        let examples = vec![
            pair("a", Some(&"a".repeat(300)), "\\section{A}"),
            pair("b", Some(&"b".repeat(300)), "\\section{B}"),
            pair("c", Some(&"c".repeat(300)), "\\section{C}"),
        ];
        let base = zero_shot_len("doc");
        let budget = base + 900;
        let p = build_prompt(&spec(examples, "doc"), budget).unwrap();
        assert_eq!(p.examples_used, 2);
        assert!(!p.example_truncated);
        assert!(p.text.contains("\\section{A}"));
        assert!(p.text.contains("\\section{B}"));
        assert!(!p.text.contains("\\section{C}"));
        assert!(p.char_len() <= budget);
    }

    #[test]
    fn oversized_first_example_is_truncated() {
        let examples = vec![pair("big", Some(&"s".repeat(5_000)), &"o".repeat(5_000))];
        let budget = zero_shot_len("doc") + 1_000;
        let p = build_prompt(&spec(examples, "doc"), budget).unwrap();
        assert_eq!(p.examples_used, 1);
        assert!(p.example_truncated);
        assert!(p.text.contains(BUDGET_TRUNCATED_MARKER));
        assert!(p.text.contains("doc"));
        assert!(p.char_len() <= budget);
    }

    #[test]
    fn hopeless_example_goes_zero_shot() {
        let examples = vec![pair("big", Some(&"s".repeat(5_000)), "\\section{A}")];
        let budget = zero_shot_len("doc") + 150;
        let p = build_prompt(&spec(examples, "doc"), budget).unwrap();
        assert_eq!(p.examples_used, 0);
        assert!(!p.text.contains(EXAMPLES_INTRO));
    }

    #[test]
    fn budget_is_never_exceeded() {
        let examples = vec![
            pair("a", Some(&"é".repeat(2_000)), &"\\section{A}\n".repeat(40)),
            pair("b", None, &"\\subsection{B}\n".repeat(80)),
        ];
        let target = "Hello World ".repeat(50);
        let base = zero_shot_len(&target);
        for extra in [0, 10, 63, 64, 200, 500, 1_000, 2_500, 4_000, 10_000] {
            let budget = base + extra;
            let p = build_prompt(&spec(examples.clone(), &target), budget).unwrap();
            assert!(
                p.char_len() <= budget,
                "budget {budget} exceeded: {}",
                p.char_len()
            );
            assert!(p.text.starts_with(DEFAULT_INSTRUCTIONS));
            assert!(p.text.contains(&target), "target must never be cut");
        }
    }

    #[test]
    fn building_is_deterministic() {
        let examples = vec![pair("a", Some(&"x".repeat(3_000)), &"y".repeat(3_000))];
        let budget = zero_shot_len("doc") + 2_000;
        let a = build_prompt(&spec(examples.clone(), "doc"), budget).unwrap();
        let b = build_prompt(&spec(examples, "doc"), budget).unwrap();
        assert_eq!(a, b);
    }
}
