//! Best-effort test input injection
//!
//! Test-case input is never piped to the child's stdin (the runner closes
//! it). Instead the candidate source is rewritten so the usual
//! read-a-line call returns the declared lines:
//!
//! | Language   | Rewrite |
//! |------------|---------|
//! | python     | prelude defining `input()` over a list of lines |
//! | javascript | prelude defining `readline()` |
//! | java       | `MockInput` class, `new Scanner(System.in)` replaced |
//! | csharp     | `MockConsole` class, `Console.ReadLine()` replaced |
//! | rust       | prelude defining `read_line()` |
//!
//! Java and C# keep the learner's leading `package`/`import`/`using` lines
//! at the top of the file, above the injected class.
//!
//! Every other language gets its source back unchanged and the input is
//! silently not applied. Programs reading input some other way (e.g.
//! `sys.stdin.read()`) see no input either.

use codetutor_common::Language;
use std::borrow::Cow;

/// Split declared input into lines, dropping empty ones
pub fn input_lines(input: &str) -> Vec<&str> {
    input
        .split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .collect()
}

/// Rewrite `source` so it reads `input` instead of stdin where supported
pub fn inject_input<'a>(language: &str, source: &'a str, input: &str) -> Cow<'a, str> {
    let lines = input_lines(input);
    match Language::from_str(language) {
        Some(Language::Python) => Cow::Owned(python(source, &lines)),
        Some(Language::JavaScript) => Cow::Owned(javascript(source, &lines)),
        Some(Language::Java) => Cow::Owned(java(source, &lines)),
        Some(Language::CSharp) => Cow::Owned(csharp(source, &lines)),
        Some(Language::Rust) => Cow::Owned(rust(source, &lines)),
        _ => Cow::Borrowed(source),
    }
}

/// JSON string literal, valid in Python, JavaScript, Java and C# sources
fn quoted(line: &str) -> String {
    serde_json::Value::String(line.to_string()).to_string()
}

fn quoted_list(lines: &[&str]) -> String {
    lines.iter().map(|l| quoted(l)).collect::<Vec<_>>().join(", ")
}

fn python(source: &str, lines: &[&str]) -> String {
    format!(
        "_test_inputs = [{inputs}]\n\
         _test_input_index = 0\n\
         def input(prompt=''):\n\
         \x20   global _test_input_index\n\
         \x20   if _test_input_index < len(_test_inputs):\n\
         \x20       val = _test_inputs[_test_input_index]\n\
         \x20       _test_input_index += 1\n\
         \x20       return val\n\
         \x20   return ''\n\n\
         {source}",
        inputs = quoted_list(lines),
        source = source
    )
}

fn javascript(source: &str, lines: &[&str]) -> String {
    format!(
        "const _testInputs = [{inputs}];\n\
         let _testInputIndex = 0;\n\
         const readline = () => {{\n\
         \x20 if (_testInputIndex < _testInputs.length) {{\n\
         \x20   return _testInputs[_testInputIndex++];\n\
         \x20 }}\n\
         \x20 return '';\n\
         }};\n\n\
         {source}",
        inputs = quoted_list(lines),
        source = source
    )
}

/// Split off leading directive lines, together with blank and `//` comment
/// lines between them, so injected code can go after them
fn split_directives(source: &str, is_directive: fn(&str) -> bool) -> (String, &str) {
    let mut end = 0;
    let mut directive_end = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        if is_directive(trimmed) {
            end += line.len();
            directive_end = end;
        } else if trimmed.is_empty() || trimmed.starts_with("//") {
            end += line.len();
        } else {
            break;
        }
    }

    let (head, body) = source.split_at(directive_end);
    let mut head = head.to_string();
    if !head.is_empty() && !head.ends_with('\n') {
        head.push('\n');
    }
    (head, body)
}

fn is_java_directive(line: &str) -> bool {
    line.starts_with("package ") || line.starts_with("import ")
}

/// `using X;` / `using static X;` / `using A = B;`, not `using (...)` statements
fn is_csharp_directive(line: &str) -> bool {
    line.starts_with("using ")
        && line.ends_with(';')
        && !line.contains('(')
        && !line.starts_with("using var ")
}

fn java(source: &str, lines: &[&str]) -> String {
    let (directives, body) = split_directives(source, is_java_directive);
    let joined = quoted(&lines.join("\n"));
    format!(
        "{directives}\
         import java.io.ByteArrayInputStream;\n\
         import java.util.Scanner;\n\
         class MockInput {{\n\
         \x20   static final String INPUT = {joined};\n\
         \x20   static Scanner getScanner() {{\n\
         \x20       return new Scanner(new ByteArrayInputStream(INPUT.getBytes()));\n\
         \x20   }}\n\
         }}\n\n\
         {source}",
        directives = directives,
        joined = joined,
        source = body.replace("new Scanner(System.in)", "MockInput.getScanner()")
    )
}

fn csharp(source: &str, lines: &[&str]) -> String {
    let (directives, body) = split_directives(source, is_csharp_directive);
    format!(
        "{directives}\
         using System;\n\
         class MockConsole {{\n\
         \x20   static string[] inputs = new string[] {{ {inputs} }};\n\
         \x20   static int index = 0;\n\
         \x20   public static string ReadLine() {{\n\
         \x20       return index < inputs.Length ? inputs[index++] : \"\";\n\
         \x20   }}\n\
         }}\n\n\
         {source}",
        directives = directives,
        inputs = quoted_list(lines),
        source = body.replace("Console.ReadLine()", "MockConsole.ReadLine()")
    )
}

fn rust(source: &str, lines: &[&str]) -> String {
    // Debug formatting of &str is a valid Rust string literal
    let inputs = lines
        .iter()
        .map(|l| format!("{:?}", l))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "const TEST_INPUT: &[&str] = &[{inputs}];\n\
         static TEST_INPUT_INDEX: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);\n\
         #[allow(dead_code)]\n\
         fn read_line() -> String {{\n\
         \x20   let index = TEST_INPUT_INDEX.fetch_add(1, std::sync::atomic::Ordering::SeqCst);\n\
         \x20   TEST_INPUT.get(index).map(|line| line.to_string()).unwrap_or_default()\n\
         }}\n\n\
         {source}",
        inputs = inputs,
        source = source
    )
}
