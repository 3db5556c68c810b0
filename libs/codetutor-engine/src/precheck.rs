//! Quick static checks run before execution
//!
//! Warnings only. Nothing here blocks a run; the messages let the UI point
//! at the obvious mistake before a full compile round-trip.

use codetutor_common::Language;
use regex::Regex;
use std::sync::OnceLock;

/// Human-readable warnings for common structural mistakes
pub fn check_common_issues(language: &str, source: &str) -> Vec<String> {
    match Language::from_str(language) {
        Some(Language::Java) => check_java(source),
        Some(Language::CSharp) => check_csharp(source),
        Some(Language::Python) => check_python(source),
        _ => Vec::new(),
    }
}

fn check_java(source: &str) -> Vec<String> {
    static CLASS: OnceLock<Regex> = OnceLock::new();
    let class = CLASS.get_or_init(|| Regex::new(r"class\s+\w+").expect("class pattern is valid"));

    let mut issues = Vec::new();
    if !source.contains("public static void main") {
        issues.push(
            "Missing main method. Java programs need: public static void main(String[] args)"
                .to_string(),
        );
    }
    if !class.is_match(source) {
        issues.push("Missing class declaration. Java code must be inside a class.".to_string());
    }
    issues
}

fn check_csharp(source: &str) -> Vec<String> {
    if source.contains("static void Main") {
        return Vec::new();
    }
    vec!["Missing Main method. C# programs need: static void Main(string[] args)".to_string()]
}

/// Flags a line indented deeper than the previous code line when that
/// line does not open a block (`:`) or continue an expression
fn check_python(source: &str) -> Vec<String> {
    let mut issues = Vec::new();
    let mut previous: Option<(usize, &str)> = None;

    for (index, line) in source.lines().enumerate() {
        let code = line.trim_end();
        let content = code.trim_start();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        let indent = code.len() - content.len();

        let allowed = match previous {
            None => indent == 0,
            Some((prev_indent, prev)) => indent <= prev_indent || opens_block(prev),
        };
        if !allowed {
            issues.push(format!("Unexpected indentation on line {}", index + 1));
        }
        previous = Some((indent, content));
    }
    issues
}

fn opens_block(line: &str) -> bool {
    line.ends_with(':') || line.ends_with(['(', '[', '{', ',', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_missing_main_and_class() {
        let issues = check_common_issues("java", "System.out.println(1);");
        assert_eq!(issues.len(), 2);
        assert!(issues[0].starts_with("Missing main method"));
        assert!(issues[1].starts_with("Missing class declaration"));

        let ok = "public class Main {\n  public static void main(String[] args) {}\n}";
        assert!(check_common_issues("java", ok).is_empty());
    }

    #[test]
    fn test_csharp_missing_main() {
        assert_eq!(check_common_issues("c#", "Console.WriteLine(1);").len(), 1);
        assert!(check_common_issues("csharp", "static void Main() {}").is_empty());
    }

    #[test]
    fn test_python_unexpected_indentation() {
        let source = "x = 1\n    print(x)\n";
        assert_eq!(
            check_common_issues("python", source),
            vec!["Unexpected indentation on line 2".to_string()]
        );
    }

    #[test]
    fn test_python_blocks_are_fine() {
        let source = "def f(n):\n    if n > 1:\n        return n\n    return 1\n\n# done\nprint(f(\n    3,\n))\n";
        assert!(check_common_issues("py", source).is_empty());
    }

    #[test]
    fn test_other_languages_have_no_checks() {
        assert!(check_common_issues("rust", "fn main() {").is_empty());
        assert!(check_common_issues("cobol", "").is_empty());
    }
}
