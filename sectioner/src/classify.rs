//! @ai:module:intent Classify a single source line into a lexical category
//! @ai:module:layer domain
//! @ai:module:public_api LineCategory, classify, PRIMITIVE_TYPES
//! @ai:module:stateless true

use regex::Regex;
use std::sync::LazyLock;

/// Primitive type keywords that may open a declaration or a procedure signature.
pub const PRIMITIVE_TYPES: [&str; 18] = [
    "char",
    "unsigned char",
    "signed char",
    "int",
    "unsigned int",
    "short",
    "unsigned short",
    "long",
    "unsigned long",
    "unsigned long long",
    "float",
    "double",
    "long double",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "void",
];

/// @ai:intent Lexical category of one trimmed source line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCategory {
    IfOpen,
    IfClose,
    Directive,
    LineComment,
    InlineBlockComment,
    BlockCommentOpen,
    BlockCommentClose,
    ProcedureSignature,
    VariableDecl,
    AsmBraceOpen,
    AsmParenOpen,
    AsmFloorOpen,
    AsmFloorClose,
}

impl LineCategory {
    /// @ai:intent Get category name as string
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            LineCategory::IfOpen => "if-open",
            LineCategory::IfClose => "if-close",
            LineCategory::Directive => "directive",
            LineCategory::LineComment => "line-comment",
            LineCategory::InlineBlockComment => "inline-block-comment",
            LineCategory::BlockCommentOpen => "block-comment-open",
            LineCategory::BlockCommentClose => "block-comment-close",
            LineCategory::ProcedureSignature => "procedure-signature",
            LineCategory::VariableDecl => "variable-decl",
            LineCategory::AsmBraceOpen => "asm-brace-open",
            LineCategory::AsmParenOpen => "asm-paren-open",
            LineCategory::AsmFloorOpen => "asm-floor-open",
            LineCategory::AsmFloorClose => "asm-floor-close",
        }
    }
}

// Scanned top to bottom, first match wins.
static PATTERNS: LazyLock<Vec<(LineCategory, Regex)>> = LazyLock::new(|| {
    let types = PRIMITIVE_TYPES.join("|");
    let table = [
        (
            LineCategory::IfOpen,
            r"^#(if|ifdef|if defined|ifndef|if !defined)".to_string(),
        ),
        (LineCategory::IfClose, r"^#endif".to_string()),
        (
            LineCategory::Directive,
            r"^#(define|include|pragma|error|warning|undef|line)".to_string(),
        ),
        (LineCategory::LineComment, r"^//".to_string()),
        (LineCategory::InlineBlockComment, r"^/\*(.*)\*/$".to_string()),
        (LineCategory::BlockCommentOpen, r"^/\*".to_string()),
        (LineCategory::BlockCommentClose, r"\*/$".to_string()),
        (
            LineCategory::ProcedureSignature,
            format!(r"^({types})\s+\w+\s*\("),
        ),
        (
            LineCategory::VariableDecl,
            format!(r"^({types})\s+\w+\s*(=|[^(])"),
        ),
        (
            LineCategory::AsmBraceOpen,
            r"^(asm|__asm__)\s*(volatile|__volatile__)?\s*\{".to_string(),
        ),
        (
            LineCategory::AsmParenOpen,
            r"^(asm|__asm__)\s*(volatile|__volatile__)?\s*\(".to_string(),
        ),
        (LineCategory::AsmFloorOpen, r"^__asm".to_string()),
        (LineCategory::AsmFloorClose, r"^__endasm\s*;".to_string()),
    ];

    table
        .into_iter()
        .map(|(category, pattern)| {
            let re = Regex::new(&pattern).expect("Invalid regex pattern");
            (category, re)
        })
        .collect()
});

/// @ai:intent Classify one line using the ordered pattern table
/// @ai:pre none; surrounding whitespace is stripped before matching
/// @ai:post result is the first matching category, or None
/// @ai:example ("#include <stdio.h>") -> Some(Directive)
/// @ai:example ("  // note") -> Some(LineComment)
/// @ai:example ("return 0;") -> None
/// @ai:effects pure
pub fn classify(line: &str) -> Option<LineCategory> {
    let trimmed = line.trim();
    PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_directives() {
        assert_eq!(classify("#ifdef DEBUG"), Some(LineCategory::IfOpen));
        assert_eq!(classify("#if !defined(X)"), Some(LineCategory::IfOpen));
        assert_eq!(classify("#ifndef HEADER_H"), Some(LineCategory::IfOpen));
        assert_eq!(classify("#endif"), Some(LineCategory::IfClose));
    }

    #[test]
    fn test_plain_directives() {
        assert_eq!(classify("#include <stdint.h>"), Some(LineCategory::Directive));
        assert_eq!(classify("#define N 10"), Some(LineCategory::Directive));
        assert_eq!(classify("#pragma once"), Some(LineCategory::Directive));
        assert_eq!(classify("#else"), None);
    }

    #[test]
    fn test_comments() {
        assert_eq!(classify("   // hello"), Some(LineCategory::LineComment));
        assert_eq!(classify("/* one line */"), Some(LineCategory::InlineBlockComment));
        assert_eq!(classify("/* opens"), Some(LineCategory::BlockCommentOpen));
        assert_eq!(classify(" * closes */"), Some(LineCategory::BlockCommentClose));
    }

    #[test]
    fn test_procedure_wins_over_variable() {
        assert_eq!(
            classify("int main(void) {"),
            Some(LineCategory::ProcedureSignature)
        );
        assert_eq!(
            classify("unsigned char read_port (uint8_t p)"),
            Some(LineCategory::ProcedureSignature)
        );
    }

    #[test]
    fn test_variable_declarations() {
        assert_eq!(classify("int counter = 0;"), Some(LineCategory::VariableDecl));
        assert_eq!(classify("uint16_t addr;"), Some(LineCategory::VariableDecl));
        assert_eq!(classify("long double x;"), Some(LineCategory::VariableDecl));
        assert_eq!(classify("static int hidden;"), None);
    }

    #[test]
    fn test_inline_assembly_openers() {
        assert_eq!(classify("asm volatile {"), Some(LineCategory::AsmBraceOpen));
        assert_eq!(classify("__asm__ (\"nop\");"), Some(LineCategory::AsmParenOpen));
        assert_eq!(classify("__asm"), Some(LineCategory::AsmFloorOpen));
        assert_eq!(classify("__endasm ;"), Some(LineCategory::AsmFloorClose));
    }

    #[test]
    fn test_first_match_wins_for_comment_with_braces() {
        assert_eq!(
            classify("// int main(void) {"),
            Some(LineCategory::LineComment)
        );
        assert_eq!(
            classify("/* int x = 1; */"),
            Some(LineCategory::InlineBlockComment)
        );
    }

    #[test]
    fn test_unmatched_lines() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("}"), None);
        assert_eq!(classify("x = x + 1;"), None);
    }
}
