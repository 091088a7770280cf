//! Prompt text for few-shot LaTeX outline generation.
//!
//! Every fixed string that ends up in a prompt lives here so the
//! [`crate::pipeline::prompt`] builder only deals with layout and length,
//! and tests can assert on the exact labels.
//!
//! Callers can override the instructions via
//! [`crate::config::OutlineConfig::instructions`]; the labels and the final
//! directive are fixed because the builder's length accounting relies on them.

/// Default instructions placed at the top of every prompt.
pub const DEFAULT_INSTRUCTIONS: &str = r#"You are an assistant that writes well-structured LaTeX document outlines. You output only valid LaTeX, with no explanations and no Markdown formatting.

An outline is the hierarchical structure of a document and nothing more:

1. STRUCTURE
   - Use only \section{} and \subsection{} commands with short, faithful titles
   - Follow the order in which topics appear in the document

2. WHAT TO LEAVE OUT
   - Code blocks, verbatim text, \begin{verbatim}
   - Figures, tables, captions, \begin{figure}, \begin{table}
   - Body prose, summaries, or explanations

3. OUTPUT FORMAT
   - A complete document: \documentclass{...}, \begin{document}, \end{document}
   - Match the preamble and style of the examples when examples are given"#;

/// Heading placed before the first example block.
pub const EXAMPLES_INTRO: &str =
    "Here are examples of PDFs and their corresponding LaTeX outlines:\n\n";

/// Label introducing the target document's text.
pub const TARGET_LABEL: &str = "New Document Content:\n";

/// Final instruction closing every prompt.
pub const FINAL_DIRECTIVE: &str = "Now create a LaTeX outline for the new document above. \
Follow the style of the examples exactly, use only \\section{} and \\subsection{} commands, \
and output only the LaTeX document.\n\nGenerate the LaTeX outline:";

/// Appended to an example source cut by the loader's per-example cap.
pub const SOURCE_TRUNCATED_MARKER: &str = "\n[... content truncated ...]";

/// Appended to target text cut by `max_target_chars`.
pub const TARGET_TRUNCATED_MARKER: &str = "\n\n[... document continues ...]";

/// Appended to example text the prompt builder had to shorten to fit the budget.
pub const BUDGET_TRUNCATED_MARKER: &str = "\n[... truncated ...]";

/// Header of a paired example block (1-indexed).
pub fn example_header(index: usize) -> String {
    format!("=== Example {index} ===\n")
}

/// Header of an example without a source document (1-indexed).
pub fn outline_only_header(index: usize) -> String {
    format!("=== Example {index} (LaTeX structure only) ===\n")
}

/// Wrap example source text in its labelled section.
pub fn source_section(source: &str) -> String {
    format!("PDF Content:\n{source}\n\n")
}

/// Wrap example outline text in its labelled, fenced section.
pub fn outline_section(outline: &str) -> String {
    format!("LaTeX Outline:\n```latex\n{outline}\n```\n\n")
}

/// Wrap the target text in its labelled section.
pub fn target_section(target: &str) -> String {
    format!("{TARGET_LABEL}{target}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instructions_restrict_commands() {
        assert!(DEFAULT_INSTRUCTIONS.contains("\\section{}"));
        assert!(DEFAULT_INSTRUCTIONS.contains("\\subsection{}"));
        assert!(DEFAULT_INSTRUCTIONS.contains("\\documentclass"));
    }

    #[test]
    fn example_sections_are_labelled() {
        assert_eq!(example_header(2), "=== Example 2 ===\n");
        assert!(outline_only_header(1).contains("structure only"));
        assert!(outline_section("\\section{A}").contains("```latex\n\\section{A}\n```"));
        assert!(source_section("abc").starts_with("PDF Content:\n"));
    }

    #[test]
    fn target_section_uses_label() {
        let s = target_section("Hello World");
        assert!(s.starts_with(TARGET_LABEL));
        assert!(s.contains("Hello World"));
    }
}
